//! Kind-to-handler dispatch over the pool's inbound stream (§4.3).
//!
//! The pool itself stays oblivious to what a `Message` means; this module
//! is the seam where a node wires each message kind to the component that
//! owns it (2PC coordinator, XT queue, superblock controller). Kept as a
//! plain dispatch loop rather than a trait-object registry: the set of
//! kinds is fixed by the wire protocol, not user-extensible.

use crate::pool::Inbound;
use crate::wire::{Block, CircMessage, Decided, Message, Rollback, StartInstance, StartPeriod, Vote};
use sp_types::{SequencerIdentity, XtRequest};
use tokio::sync::mpsc;

/// Callbacks a node registers to receive each inbound message kind. Left
/// unimplemented variants are simply never called; `sp-node` is expected to
/// wire every field once the consensus/queue/superblock crates exist. The SP
/// only ever sends `StartInstance`/`StartPeriod`/`Rollback`, never receives
/// them, but the handlers stay symmetric since the wire protocol is shared
/// with the sequencer side.
pub struct RouterHandlers {
    pub on_xt_request: Box<dyn Fn(SequencerIdentity, XtRequest) + Send + Sync>,
    pub on_vote: Box<dyn Fn(SequencerIdentity, Vote) + Send + Sync>,
    pub on_decided: Box<dyn Fn(SequencerIdentity, Decided) + Send + Sync>,
    pub on_circ: Box<dyn Fn(SequencerIdentity, CircMessage) + Send + Sync>,
    pub on_start_instance: Box<dyn Fn(SequencerIdentity, StartInstance) + Send + Sync>,
    pub on_start_period: Box<dyn Fn(SequencerIdentity, StartPeriod) + Send + Sync>,
    pub on_rollback: Box<dyn Fn(SequencerIdentity, Rollback) + Send + Sync>,
    pub on_block: Box<dyn Fn(SequencerIdentity, Block) + Send + Sync>,
}

/// Drains `inbound` and dispatches each message to the matching handler
/// until the channel closes (i.e. the pool has shut down).
pub async fn run(mut inbound: mpsc::UnboundedReceiver<Inbound>, handlers: RouterHandlers) {
    while let Some(Inbound { from, message }) = inbound.recv().await {
        match message {
            Message::XtRequest(req) => (handlers.on_xt_request)(from, req),
            Message::Vote(v) => (handlers.on_vote)(from, v),
            Message::Decided(d) => (handlers.on_decided)(from, d),
            Message::Circ(c) => (handlers.on_circ)(from, c),
            Message::StartInstance(s) => (handlers.on_start_instance)(from, s),
            Message::StartPeriod(s) => (handlers.on_start_period)(from, s),
            Message::Rollback(r) => (handlers.on_rollback)(from, r),
            Message::Block(b) => (handlers.on_block)(from, b),
            Message::Ping | Message::Pong => {
                // Liveness traffic is already consumed by the pool's reader task.
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sp_types::{ChainId, XtId};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[tokio::test]
    async fn dispatches_to_the_matching_handler() {
        let (tx, rx) = mpsc::unbounded_channel();
        let votes_seen = Arc::new(AtomicUsize::new(0));
        let votes_seen2 = votes_seen.clone();

        let handlers = RouterHandlers {
            on_xt_request: Box::new(|_, _| {}),
            on_vote: Box::new(move |_, _| {
                votes_seen2.fetch_add(1, Ordering::SeqCst);
            }),
            on_decided: Box::new(|_, _| {}),
            on_circ: Box::new(|_, _| {}),
            on_start_instance: Box::new(|_, _| {}),
            on_start_period: Box::new(|_, _| {}),
            on_rollback: Box::new(|_, _| {}),
            on_block: Box::new(|_, _| {}),
        };

        let identity = SequencerIdentity::new("seq-a", [9u8; sp_types::PUBKEY_LEN]);
        tx.send(Inbound {
            from: identity.clone(),
            message: Message::Vote(Vote {
                sender_chain_id: ChainId::new(b"rollup-a".to_vec()),
                xt_id: XtId([1u8; 32]),
                vote: true,
            }),
        })
        .unwrap();
        drop(tx);

        run(rx, handlers).await;
        assert_eq!(votes_seen.load(Ordering::SeqCst), 1);
    }
}
