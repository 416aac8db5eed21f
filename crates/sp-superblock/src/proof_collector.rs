//! Per-superblock-hash aggregation of per-chain proof submissions (§4.8).
//! One lock on the hash→status map for lookup/creation, one lock per
//! status; mutators take only the per-status lock (§5).

use crate::error::ProofError;
use sp_types::{ProofState, ProofStatus, ProofSubmission};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::SystemTime;
use tokio::sync::Mutex;

fn validate(submission: &ProofSubmission) -> Result<(), ProofError> {
    if submission.superblock_hash == [0u8; 32] {
        return Err(ProofError::ZeroHash);
    }
    if submission.l1_head != submission.aggregation_outputs.l1_head {
        return Err(ProofError::L1HeadMismatch);
    }
    if submission.prover_address != submission.aggregation_outputs.prover_address {
        return Err(ProofError::ProverAddressMismatch);
    }
    if submission.l2_start_block > submission.aggregation_outputs.l2_block_number {
        return Err(ProofError::StartBlockAfterAggregation);
    }
    if submission.verifying_key.is_empty() {
        return Err(ProofError::EmptyVerifyingKey);
    }
    Ok(())
}

#[derive(Clone, Copy, Debug, Default)]
pub struct ProofCollectorStats {
    pub total: usize,
    pub collecting: usize,
    pub proving: usize,
    pub published: usize,
    pub failed: usize,
}

pub struct ProofCollector {
    statuses: Mutex<HashMap<[u8; 32], Arc<Mutex<ProofStatus>>>>,
}

impl Default for ProofCollector {
    fn default() -> Self {
        Self::new()
    }
}

impl ProofCollector {
    pub fn new() -> Self {
        Self {
            statuses: Mutex::new(HashMap::new()),
        }
    }

    /// Validates and records `submission` (§4.8 `Submit`). Initializes a
    /// fresh `collecting` status on the first submission for a hash.
    pub async fn submit(
        &self,
        submission: ProofSubmission,
        superblock_number: u64,
    ) -> Result<(), ProofError> {
        validate(&submission)?;

        let entry = {
            let mut statuses = self.statuses.lock().await;
            statuses
                .entry(submission.superblock_hash)
                .or_insert_with(|| {
                    Arc::new(Mutex::new(ProofStatus::new(
                        superblock_number,
                        submission.superblock_hash,
                    )))
                })
                .clone()
        };

        let mut status = entry.lock().await;
        status.received.insert(submission.chain_id, SystemTime::now());
        Ok(())
    }

    /// Creates a `collecting` status for `hash` if none exists yet. Lets the
    /// controller start tracking a superblock before any chain has submitted
    /// a proof for it, so a later `update_status` call has something to act on.
    pub async fn ensure_tracked(&self, hash: [u8; 32], superblock_number: u64) {
        self.statuses
            .lock()
            .await
            .entry(hash)
            .or_insert_with(|| Arc::new(Mutex::new(ProofStatus::new(superblock_number, hash))));
    }

    /// Applies `mutate` to the status for `hash` under its own lock (§4.8
    /// `UpdateStatus`), used by the controller to advance
    /// collecting → proving → published.
    pub async fn update_status(
        &self,
        hash: [u8; 32],
        mutate: impl FnOnce(&mut ProofStatus),
    ) -> Result<(), ProofError> {
        let entry = self
            .statuses
            .lock()
            .await
            .get(&hash)
            .cloned()
            .ok_or(ProofError::UnknownSuperblock)?;
        let mut status = entry.lock().await;
        mutate(&mut status);
        Ok(())
    }

    pub async fn status(&self, hash: [u8; 32]) -> Option<ProofStatus> {
        let entry = self.statuses.lock().await.get(&hash).cloned()?;
        let status = entry.lock().await.clone();
        Some(status)
    }

    pub async fn stats(&self) -> ProofCollectorStats {
        let statuses = self.statuses.lock().await;
        let mut stats = ProofCollectorStats::default();
        for entry in statuses.values() {
            let status = entry.lock().await;
            stats.total += 1;
            match status.state {
                ProofState::Collecting => stats.collecting += 1,
                ProofState::Proving => stats.proving += 1,
                ProofState::Published => stats.published += 1,
                ProofState::Failed => stats.failed += 1,
            }
        }
        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sp_types::{AggregationOutputs, ChainId};

    fn submission(chain: &str, superblock_hash: [u8; 32]) -> ProofSubmission {
        ProofSubmission {
            chain_id: ChainId::from(chain),
            superblock_hash,
            l1_head: [7u8; 32],
            pre_root: [1u8; 32],
            post_root: [2u8; 32],
            l2_start_block: 100,
            l2_block_number: 200,
            rollup_config_hash: [3u8; 32],
            prover_address: [9u8; 20],
            aggregation_outputs: AggregationOutputs {
                l1_head: [7u8; 32],
                prover_address: [9u8; 20],
                l2_block_number: 200,
            },
            verifying_key: vec![1, 2, 3],
            proof: vec![4, 5, 6],
        }
    }

    #[tokio::test]
    async fn first_submission_initializes_collecting_status() {
        let collector = ProofCollector::new();
        let sub = submission("A", [1u8; 32]);
        collector.submit(sub, 42).await.unwrap();
        let status = collector.status([1u8; 32]).await.unwrap();
        assert_eq!(status.state, ProofState::Collecting);
        assert_eq!(status.received.len(), 1);
        assert_eq!(status.superblock_number, 42);
    }

    #[tokio::test]
    async fn distinct_chains_accumulate_in_received() {
        let collector = ProofCollector::new();
        collector.submit(submission("A", [2u8; 32]), 1).await.unwrap();
        collector.submit(submission("B", [2u8; 32]), 1).await.unwrap();
        let status = collector.status([2u8; 32]).await.unwrap();
        assert_eq!(status.received.len(), 2);
    }

    // §8 invariant 10.
    #[tokio::test]
    async fn rejects_l1_head_mismatch() {
        let collector = ProofCollector::new();
        let mut sub = submission("A", [3u8; 32]);
        sub.l1_head = [0xFFu8; 32];
        let err = collector.submit(sub, 1).await.unwrap_err();
        assert_eq!(err, ProofError::L1HeadMismatch);
    }

    #[tokio::test]
    async fn rejects_prover_address_mismatch() {
        let collector = ProofCollector::new();
        let mut sub = submission("A", [4u8; 32]);
        sub.prover_address = [0xAAu8; 20];
        let err = collector.submit(sub, 1).await.unwrap_err();
        assert_eq!(err, ProofError::ProverAddressMismatch);
    }

    #[tokio::test]
    async fn rejects_zero_hash() {
        let collector = ProofCollector::new();
        let sub = submission("A", [0u8; 32]);
        let err = collector.submit(sub, 1).await.unwrap_err();
        assert_eq!(err, ProofError::ZeroHash);
    }

    #[tokio::test]
    async fn rejects_empty_verifying_key() {
        let collector = ProofCollector::new();
        let mut sub = submission("A", [5u8; 32]);
        sub.verifying_key.clear();
        let err = collector.submit(sub, 1).await.unwrap_err();
        assert_eq!(err, ProofError::EmptyVerifyingKey);
    }

    #[tokio::test]
    async fn update_status_advances_state_under_its_own_lock() {
        let collector = ProofCollector::new();
        collector.submit(submission("A", [6u8; 32]), 1).await.unwrap();
        collector
            .update_status([6u8; 32], |status| status.state = ProofState::Proving)
            .await
            .unwrap();
        let status = collector.status([6u8; 32]).await.unwrap();
        assert_eq!(status.state, ProofState::Proving);
    }

    #[tokio::test]
    async fn stats_count_by_state() {
        let collector = ProofCollector::new();
        collector.submit(submission("A", [10u8; 32]), 1).await.unwrap();
        collector.submit(submission("A", [11u8; 32]), 1).await.unwrap();
        collector
            .update_status([11u8; 32], |s| s.state = ProofState::Published)
            .await
            .unwrap();
        let stats = collector.stats().await;
        assert_eq!(stats.total, 2);
        assert_eq!(stats.collecting, 1);
        assert_eq!(stats.published, 1);
    }
}
