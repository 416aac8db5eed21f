//! Orchestrates one period at a time: draining the queue into 2PC
//! instances, sealing, assembling a superblock, requesting proofs, and
//! publishing (§4.7). Per-period state is grouped into a single arena and
//! replaced wholesale at the next period boundary or a rollback (§9 "Graph
//! of per-period entities").

use crate::error::ControllerError;
use crate::l1::{L1Error, L1Publisher};
use crate::proof_collector::ProofCollector;
use crate::transport::SuperblockTransport;
use sha2::{Digest, Sha256};
use sp_consensus::Coordinator;
use sp_queue::XtQueue;
use sp_telemetry::sinks::metrics;
use sp_types::{ChainBlockRef, ChainId, ProofState, Superblock, SuperblockStatus, XtId, XtRequest};
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::{info, warn};

struct PeriodState {
    period_id: u64,
    superblock_number: u64,
    next_seq_no: u64,
    pending_xt_ids: BTreeSet<XtId>,
    committed_xt_ids: Vec<XtId>,
    chain_blocks: HashMap<ChainId, ChainBlockRef>,
    superblock: Option<Superblock>,
    sealed_at: Option<Instant>,
}

impl PeriodState {
    fn new(period_id: u64, superblock_number: u64) -> Self {
        Self {
            period_id,
            superblock_number,
            next_seq_no: 0,
            pending_xt_ids: BTreeSet::new(),
            committed_xt_ids: Vec::new(),
            chain_blocks: HashMap::new(),
            superblock: None,
            sealed_at: None,
        }
    }
}

pub struct SuperblockController {
    queue: Arc<XtQueue>,
    coordinator: Arc<Coordinator>,
    collector: Arc<ProofCollector>,
    transport: Arc<dyn SuperblockTransport>,
    registered_chains: BTreeSet<ChainId>,
    consensus_timeout: Duration,
    period_budget: usize,
    current: Mutex<Option<PeriodState>>,
    last_finalized: Mutex<(u64, [u8; 32])>,
}

impl SuperblockController {
    pub fn new(
        queue: Arc<XtQueue>,
        coordinator: Arc<Coordinator>,
        collector: Arc<ProofCollector>,
        transport: Arc<dyn SuperblockTransport>,
        registered_chains: BTreeSet<ChainId>,
        consensus_timeout: Duration,
        period_budget: usize,
    ) -> Self {
        Self {
            queue,
            coordinator,
            collector,
            transport,
            registered_chains,
            consensus_timeout,
            period_budget,
            current: Mutex::new(None),
            last_finalized: Mutex::new((0, [0u8; 32])),
        }
    }

    /// Step 1: snapshot the queue head up to the period budget and open a
    /// 2PC instance for each request.
    pub async fn begin_period(&self, period_id: u64, superblock_number: u64) {
        info!(period_id, superblock_number, "beginning period");
        *self.current.lock().await = Some(PeriodState::new(period_id, superblock_number));

        let drained = self.queue.drain_up_to(self.period_budget).await;
        for queued in drained {
            self.start_instance(queued.request).await;
        }
    }

    async fn start_instance(&self, request: XtRequest) {
        let xt_id = request.xt_id();
        match self
            .coordinator
            .start_transaction(xt_id, request.clone(), self.consensus_timeout)
            .await
        {
            Ok(()) => {
                let mut guard = self.current.lock().await;
                if let Some(state) = guard.as_mut() {
                    let seq_no = state.next_seq_no;
                    state.next_seq_no += 1;
                    state.pending_xt_ids.insert(xt_id);
                    let period_id = state.period_id;
                    drop(guard);
                    self.transport
                        .send_start_instance(seq_no, period_id, xt_id, &request);
                }
            }
            Err(e) => {
                warn!(%xt_id, error = %e, "could not start 2PC instance, likely a duplicate submission");
            }
        }
    }

    /// Step 2: the controller's half of the coordinator's decision
    /// callback. Call this from whatever closure is registered with
    /// `Coordinator::set_broadcast_callback`.
    pub async fn on_decision(&self, xt_id: XtId, commit: bool) {
        let mut guard = self.current.lock().await;
        let Some(state) = guard.as_mut() else { return };
        if !state.pending_xt_ids.remove(&xt_id) {
            return;
        }
        if commit {
            state.committed_xt_ids.push(xt_id);
        }
    }

    /// Step 3: seal cutover — tell sequencers to finalize and return their
    /// per-chain blocks.
    pub async fn enter_sealing(&self) {
        let mut guard = self.current.lock().await;
        let Some(state) = guard.as_mut() else { return };
        state.sealed_at = Some(Instant::now());
        self.transport
            .broadcast_start_period(state.period_id, state.superblock_number);
        metrics().inc_periods_sealed();
    }

    /// A sequencer's finalized L2 block for the current period (§6.1
    /// `Block`). Rejects chains outside the registered rollup set.
    pub async fn submit_block(
        &self,
        chain_id: ChainId,
        encoded_block: Vec<u8>,
        included_xt_ids: Vec<XtId>,
    ) -> Result<(), ControllerError> {
        if !self.registered_chains.contains(&chain_id) {
            return Err(ControllerError::UnregisteredChain(chain_id));
        }
        let mut guard = self.current.lock().await;
        let state = guard.as_mut().ok_or(ControllerError::NoOpenPeriod)?;
        let block_hash = {
            let digest = Sha256::digest(&encoded_block);
            let mut out = [0u8; 32];
            out.copy_from_slice(&digest);
            out
        };
        state.chain_blocks.insert(
            chain_id.clone(),
            ChainBlockRef {
                chain_id,
                block_hash,
                encoded_block,
                included_xt_ids,
            },
        );
        Ok(())
    }

    /// Step 4: assemble the superblock from whatever chain blocks have
    /// arrived, deterministically ordered by `ChainId` byte order.
    pub async fn assemble_superblock(&self) -> Result<Superblock, ControllerError> {
        let mut guard = self.current.lock().await;
        let state = guard.as_mut().ok_or(ControllerError::NoOpenPeriod)?;

        let mut chain_blocks: Vec<ChainBlockRef> = state.chain_blocks.values().cloned().collect();
        chain_blocks.sort_by(|a, b| a.chain_id.cmp(&b.chain_id));
        let merkle_root = Superblock::compute_merkle_root(&chain_blocks);

        let superblock = Superblock {
            period_id: state.period_id,
            superblock_number: state.superblock_number,
            chain_blocks,
            merkle_root,
            included_xt_ids: state.committed_xt_ids.clone(),
            proof: None,
            status: SuperblockStatus::Pending,
        };
        state.superblock = Some(superblock.clone());
        Ok(superblock)
    }

    /// Step 5: marks the superblock's proof status as tracked and advances
    /// it from `collecting` to `proving` once proof jobs have been
    /// requested for every chain (§4.8 `UpdateStatus`).
    pub async fn begin_proof_collection(&self, superblock: &Superblock) {
        let hash = superblock.merkle_root;
        self.collector
            .ensure_tracked(hash, superblock.superblock_number)
            .await;
        let _ = self
            .collector
            .update_status(hash, |status| status.state = ProofState::Proving)
            .await;
    }

    /// Checks whether every chain in `superblock` has submitted a proof and,
    /// if so, advances the status to `published` and records how long
    /// collection took since sealing (§4.7 step 6, §4.8). Returns whether
    /// the superblock is now ready to publish.
    pub async fn try_finalize_proofs(&self, superblock: &Superblock) -> bool {
        let hash = superblock.merkle_root;
        let Some(status) = self.collector.status(hash).await else {
            return false;
        };
        if status.received.len() < superblock.chain_blocks.len() {
            return false;
        }
        if status.state == ProofState::Published {
            return true;
        }
        let _ = self
            .collector
            .update_status(hash, |status| status.state = ProofState::Published)
            .await;
        let sealed_at = self.current.lock().await.as_ref().and_then(|s| s.sealed_at);
        if let Some(sealed_at) = sealed_at {
            metrics().observe_proof_collection_seconds(sealed_at.elapsed().as_secs_f64());
        }
        true
    }

    /// Step 6: publish once every registered chain's proof has been
    /// collected. Retries internally per §7 ("L1 publish failure: retry
    /// with backoff; after N attempts, mark failed"); the caller supplies
    /// the already-encoded calldata blob.
    pub async fn publish(
        &self,
        l1: &dyn L1Publisher,
        superblock: &mut Superblock,
        calldata: &[u8],
        max_attempts: u32,
    ) {
        let mut attempt = 0;
        loop {
            match l1.publish_calldata(calldata).await {
                Ok(()) => {
                    superblock.status = SuperblockStatus::Submitted;
                    metrics().inc_superblocks_published();
                    return;
                }
                Err(L1Error::PublishFailed(reason)) => {
                    attempt += 1;
                    metrics().inc_publish_failures();
                    if attempt >= max_attempts {
                        warn!(reason, attempt, "giving up on L1 publish");
                        superblock.status = SuperblockStatus::RolledBack;
                        return;
                    }
                    let backoff = Duration::from_millis(200 * (1u64 << attempt.min(8)));
                    tokio::time::sleep(backoff).await;
                }
            }
        }
    }

    pub fn proof_collector(&self) -> &ProofCollector {
        &self.collector
    }

    /// The currently open period, if any, for a reconnecting sequencer to
    /// be caught up against (§4.3 "Reconnect replay").
    pub async fn current_period_id(&self) -> Option<u64> {
        self.current.lock().await.as_ref().map(|s| s.period_id)
    }

    /// Broadcasts a rollback directive and force-aborts any in-flight
    /// instance from the rolled-back period (§4.7 "Rollback").
    pub async fn rollback(
        &self,
        period_id: u64,
        last_final_superblock_number: u64,
        last_final_superblock_hash: [u8; 32],
    ) {
        self.transport.broadcast_rollback(
            period_id,
            last_final_superblock_number,
            last_final_superblock_hash,
        );
        metrics().inc_rollbacks();
        *self.last_finalized.lock().await = (last_final_superblock_number, last_final_superblock_hash);

        let pending: Vec<XtId> = {
            let guard = self.current.lock().await;
            match guard.as_ref() {
                Some(state) if state.period_id == period_id => {
                    state.pending_xt_ids.iter().copied().collect()
                }
                _ => Vec::new(),
            }
        };
        self.coordinator.force_abort(&pending).await;
        *self.current.lock().await = None;
    }
}
