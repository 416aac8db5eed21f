//! The bounded FIFO that feeds submitted `XTRequest`s into the 2PC
//! coordinator (§4.5). Single lock, O(1) amortized operations, expired
//! entries are swept lazily on any access rather than by a background timer
//! (§5: "single lock; operations are O(1) amortized; `RemoveExpired` sweeps
//! under lock").

use crate::error::QueueError;
use sp_telemetry::sinks::metrics;
use sp_types::{QueuedXtRequest, SequencerIdentity, XtId, XtRequest};
use std::collections::{HashSet, VecDeque};
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::{debug, warn};

#[derive(Debug)]
struct Inner {
    items: VecDeque<QueuedXtRequest>,
}

impl Inner {
    fn sweep_expired(&mut self) -> usize {
        let now = Instant::now();
        let before = self.items.len();
        self.items.retain(|item| !item.is_expired(now));
        let removed = before - self.items.len();
        if removed > 0 {
            debug!(removed, "swept expired queue entries");
            metrics().inc_expired(removed as u64);
        }
        removed
    }

    fn contains(&self, xt_id: XtId) -> bool {
        self.items.iter().any(|item| item.request.xt_id() == xt_id)
    }
}

/// Bounded FIFO of cross-transaction requests awaiting a 2PC instance
/// (§3: default bound 1000).
pub struct XtQueue {
    inner: Mutex<Inner>,
    max_size: usize,
    expiration: Duration,
}

impl XtQueue {
    pub fn new(max_size: usize, expiration: Duration) -> Self {
        Self {
            inner: Mutex::new(Inner {
                items: VecDeque::new(),
            }),
            max_size,
            expiration,
        }
    }

    /// Enqueues `request`. A request whose `XTID` is already present in the
    /// queue is an idempotent no-op (§3, §4.5 dedup). Fails with
    /// `QueueFull` once `max_size` live entries are held (§8 invariant 6).
    pub async fn enqueue(
        &self,
        request: XtRequest,
        submitted_by: SequencerIdentity,
    ) -> Result<(), QueueError> {
        let mut inner = self.inner.lock().await;
        inner.sweep_expired();

        let xt_id = request.xt_id();
        if inner.contains(xt_id) {
            return Ok(());
        }
        if inner.items.len() >= self.max_size {
            warn!(max_size = self.max_size, "queue full, rejecting submission");
            metrics().inc_enqueue_rejected();
            return Err(QueueError::QueueFull);
        }
        inner
            .items
            .push_back(QueuedXtRequest::new(request, submitted_by, self.expiration));
        metrics().set_queue_depth(inner.items.len() as i64);
        Ok(())
    }

    /// Returns the head of the queue without removing it.
    pub async fn peek(&self) -> Option<QueuedXtRequest> {
        let mut inner = self.inner.lock().await;
        inner.sweep_expired();
        inner.items.front().cloned()
    }

    /// Removes and returns the head of the queue.
    pub async fn dequeue(&self) -> Option<QueuedXtRequest> {
        let mut inner = self.inner.lock().await;
        inner.sweep_expired();
        let item = inner.items.pop_front();
        metrics().set_queue_depth(inner.items.len() as i64);
        item
    }

    /// Drains up to `budget` entries from the head, for the superblock
    /// controller's per-period snapshot (§4.7 step 1).
    pub async fn drain_up_to(&self, budget: usize) -> Vec<QueuedXtRequest> {
        let mut inner = self.inner.lock().await;
        inner.sweep_expired();
        let n = budget.min(inner.items.len());
        let drained = inner.items.drain(..n).collect();
        metrics().set_queue_depth(inner.items.len() as i64);
        drained
    }

    /// Re-appends `item` at the tail with a fresh deadline, for processing
    /// that failed and should be retried later (§4.5 `Requeue`).
    pub async fn requeue(&self, item: QueuedXtRequest) -> Result<(), QueueError> {
        let mut inner = self.inner.lock().await;
        inner.sweep_expired();
        if inner.items.len() >= self.max_size {
            return Err(QueueError::QueueFull);
        }
        inner.items.push_back(QueuedXtRequest::new(
            item.request,
            item.submitted_by,
            self.expiration,
        ));
        Ok(())
    }

    /// Sweeps and returns the count of entries removed for having expired.
    pub async fn remove_expired(&self) -> usize {
        self.inner.lock().await.sweep_expired()
    }

    pub async fn size(&self) -> usize {
        let mut inner = self.inner.lock().await;
        inner.sweep_expired();
        inner.items.len()
    }

    #[cfg(test)]
    async fn ids(&self) -> HashSet<XtId> {
        self.inner
            .lock()
            .await
            .items
            .iter()
            .map(|item| item.request.xt_id())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sp_types::{ChainId, TxGroup};

    fn request(tag: u8) -> XtRequest {
        XtRequest {
            groups: vec![TxGroup {
                chain_id: ChainId::from("A"),
                raw_txs: vec![vec![tag]],
            }],
        }
    }

    fn identity() -> SequencerIdentity {
        SequencerIdentity::new("seq-a", [0u8; sp_types::PUBKEY_LEN])
    }

    // Scenario E: bound of 2, three submissions back to back.
    #[tokio::test]
    async fn scenario_e_overflow_rejects_without_corrupting_size() {
        let queue = XtQueue::new(2, Duration::from_secs(60));
        queue.enqueue(request(1), identity()).await.unwrap();
        queue.enqueue(request(2), identity()).await.unwrap();
        let err = queue.enqueue(request(3), identity()).await.unwrap_err();
        assert_eq!(err, QueueError::QueueFull);
        assert_eq!(queue.size().await, 2);
    }

    #[tokio::test]
    async fn duplicate_xt_id_is_a_no_op() {
        let queue = XtQueue::new(10, Duration::from_secs(60));
        queue.enqueue(request(1), identity()).await.unwrap();
        queue.enqueue(request(1), identity()).await.unwrap();
        assert_eq!(queue.size().await, 1);
    }

    #[tokio::test]
    async fn dequeue_is_fifo() {
        let queue = XtQueue::new(10, Duration::from_secs(60));
        queue.enqueue(request(1), identity()).await.unwrap();
        queue.enqueue(request(2), identity()).await.unwrap();
        let first = queue.dequeue().await.unwrap();
        assert_eq!(first.request, request(1));
        assert_eq!(queue.size().await, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn expired_entries_are_swept_on_access() {
        let queue = XtQueue::new(10, Duration::from_millis(10));
        queue.enqueue(request(1), identity()).await.unwrap();
        tokio::time::advance(Duration::from_millis(20)).await;
        assert_eq!(queue.size().await, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn remove_expired_reports_the_count_removed() {
        let queue = XtQueue::new(10, Duration::from_millis(10));
        queue.enqueue(request(1), identity()).await.unwrap();
        queue.enqueue(request(2), identity()).await.unwrap();
        tokio::time::advance(Duration::from_millis(20)).await;
        assert_eq!(queue.remove_expired().await, 2);
    }

    #[tokio::test]
    async fn requeue_appends_at_tail_with_fresh_deadline() {
        let queue = XtQueue::new(10, Duration::from_secs(60));
        queue.enqueue(request(1), identity()).await.unwrap();
        queue.enqueue(request(2), identity()).await.unwrap();
        let first = queue.dequeue().await.unwrap();
        queue.requeue(first).await.unwrap();
        let ids: Vec<_> = queue.ids().await.into_iter().collect();
        assert_eq!(ids.len(), 2);
        // requeued item is now behind item 2
        let head = queue.peek().await.unwrap();
        assert_eq!(head.request, request(2));
    }

    #[tokio::test]
    async fn drain_up_to_budget_respects_queue_order_and_size() {
        let queue = XtQueue::new(10, Duration::from_secs(60));
        for i in 1..=5u8 {
            queue.enqueue(request(i), identity()).await.unwrap();
        }
        let drained = queue.drain_up_to(3).await;
        assert_eq!(drained.len(), 3);
        assert_eq!(drained[0].request, request(1));
        assert_eq!(queue.size().await, 2);
    }
}
