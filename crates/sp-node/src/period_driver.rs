//! Drives `SuperblockController` through one full period lifecycle per
//! boundary emitted by `PeriodRunner`: open the period, let the 2PC
//! instances and blocks accumulate, seal at the last slot's cutover
//! instant, wait out a grace window for straggling blocks, assemble, wait
//! for proofs, and publish.
//!
//! Each period's tail (everything after `begin_period`) runs as its own
//! spawned task so a slow publish never delays the next period's opening.

use sp_clock::{PeriodClock, SlotClock};
use sp_prover_client::ProverClient;
use sp_superblock::{L1Publisher, SuperblockController};
use sp_types::PeriodInfo;
use std::sync::Arc;
use std::time::{Duration, SystemTime};
use tokio_util::sync::CancellationToken;

/// How long after sealing to keep accepting `Block` submissions before
/// assembling regardless of how many chains have reported in.
const BLOCK_GRACE_PERIOD: Duration = Duration::from_secs(6);
/// Upper bound on how long to wait for every registered chain's proof
/// before publishing with whatever has arrived.
const PROOF_WAIT_TIMEOUT: Duration = Duration::from_secs(60);
const PROOF_POLL_INTERVAL: Duration = Duration::from_millis(500);
const PUBLISH_MAX_ATTEMPTS: u32 = 5;

/// The instant within a period at which sealing should begin: the seal
/// cutover fraction of the period's *final* slot, not the period as a
/// whole (the cutover fraction is a per-slot concept).
fn seal_instant(period_clock: &PeriodClock, slot_clock: &SlotClock, period_id: u64) -> SystemTime {
    let next_period_start = period_clock.period_start_time(period_id + 1);
    let slot_duration = slot_clock.config().slot_duration;
    let lead = slot_duration.mul_f64(1.0 - slot_clock.config().seal_cutover);
    next_period_start
        .checked_sub(lead)
        .unwrap_or(next_period_start)
}

pub struct PeriodDriver {
    controller: Arc<SuperblockController>,
    period_clock: PeriodClock,
    slot_clock: SlotClock,
    l1: Arc<dyn L1Publisher>,
    prover: Option<ProverClient>,
}

impl PeriodDriver {
    pub fn new(
        controller: Arc<SuperblockController>,
        period_clock: PeriodClock,
        slot_clock: SlotClock,
        l1: Arc<dyn L1Publisher>,
        prover: Option<ProverClient>,
    ) -> Self {
        Self {
            controller,
            period_clock,
            slot_clock,
            l1,
            prover,
        }
    }

    /// Called from `PeriodRunner::run`'s callback for every emitted
    /// boundary, including catch-up replays after downtime.
    pub fn on_period(&self, info: PeriodInfo, cancel: CancellationToken) {
        let controller = self.controller.clone();
        let period_clock = self.period_clock;
        let slot_clock = self.slot_clock;
        let l1 = self.l1.clone();
        let prover = self.prover.clone();
        let period_id = info.period_id;

        tokio::spawn(async move {
            controller.begin_period(period_id, period_id).await;

            let seal_at = seal_instant(&period_clock, &slot_clock, period_id);
            let delay = seal_at
                .duration_since(SystemTime::now())
                .unwrap_or(Duration::ZERO);
            tokio::select! {
                _ = cancel.cancelled() => return,
                _ = tokio::time::sleep(delay) => {}
            }

            controller.enter_sealing().await;
            tokio::select! {
                _ = cancel.cancelled() => return,
                _ = tokio::time::sleep(BLOCK_GRACE_PERIOD) => {}
            }

            let mut superblock = match controller.assemble_superblock().await {
                Ok(sb) => sb,
                Err(e) => {
                    tracing::warn!(period_id, error = %e, "could not assemble superblock");
                    return;
                }
            };

            controller.begin_proof_collection(&superblock).await;
            if let Some(prover) = &prover {
                request_proofs(prover, &superblock);
            }
            wait_for_proofs(&controller, &superblock, cancel.clone()).await;

            let calldata = bincode::serialize(&superblock).unwrap_or_default();
            controller
                .publish(l1.as_ref(), &mut superblock, &calldata, PUBLISH_MAX_ATTEMPTS)
                .await;
            tracing::info!(
                period_id,
                superblock_number = superblock.superblock_number,
                status = ?superblock.status,
                "period finished"
            );
        });
    }
}

/// Kicks off one proving job per chain block in the just-assembled
/// superblock. Fire-and-forget: results come back asynchronously through
/// the HTTP ingress's proof submission endpoint, not this call (§4.8,
/// §6.2).
fn request_proofs(prover: &ProverClient, superblock: &sp_types::Superblock) {
    for block in &superblock.chain_blocks {
        let prover = prover.clone();
        let input = serde_json::json!({
            "chainId": block.chain_id.to_string(),
            "blockHash": hex::encode(block.block_hash),
            "superblockNumber": superblock.superblock_number,
        });
        tokio::spawn(async move {
            if let Err(e) = prover.submit_proof("op-succinct", input).await {
                tracing::warn!(error = %e, "failed to submit proof job to prover");
            }
        });
    }
}

/// Polls this superblock's own proof status, by hash, until every one of
/// its chain blocks has a proof recorded or the timeout elapses, whichever
/// comes first (§4.7 step 6, §4.8).
async fn wait_for_proofs(
    controller: &SuperblockController,
    superblock: &sp_types::Superblock,
    cancel: CancellationToken,
) {
    if superblock.chain_blocks.is_empty() {
        return;
    }
    let deadline = SystemTime::now() + PROOF_WAIT_TIMEOUT;
    loop {
        if controller.try_finalize_proofs(superblock).await || SystemTime::now() >= deadline {
            return;
        }
        tokio::select! {
            _ = cancel.cancelled() => return,
            _ = tokio::time::sleep(PROOF_POLL_INTERVAL) => {}
        }
    }
}
