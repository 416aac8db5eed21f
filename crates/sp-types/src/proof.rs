use crate::chain::ChainId;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::SystemTime;

/// A per-chain proof submission for one superblock (§3, §4.8, §6.3).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ProofSubmission {
    pub chain_id: ChainId,
    pub superblock_hash: [u8; 32],
    pub l1_head: [u8; 32],
    pub pre_root: [u8; 32],
    pub post_root: [u8; 32],
    pub l2_start_block: u64,
    pub l2_block_number: u64,
    pub rollup_config_hash: [u8; 32],
    pub prover_address: [u8; 20],
    pub aggregation_outputs: AggregationOutputs,
    pub verifying_key: Vec<u8>,
    pub proof: Vec<u8>,
}

/// The subset of a prover's aggregated public outputs that §4.8 validates
/// a submission against.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AggregationOutputs {
    pub l1_head: [u8; 32],
    pub prover_address: [u8; 20],
    pub l2_block_number: u64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProofState {
    Collecting,
    Proving,
    Published,
    Failed,
}

impl ProofState {
    pub fn as_str(self) -> &'static str {
        match self {
            ProofState::Collecting => "collecting",
            ProofState::Proving => "proving",
            ProofState::Published => "published",
            ProofState::Failed => "failed",
        }
    }
}

/// Aggregates received chain submissions for one superblock hash (§4.8).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ProofStatus {
    pub superblock_number: u64,
    pub superblock_hash: [u8; 32],
    pub state: ProofState,
    pub received: HashMap<ChainId, SystemTime>,
}

impl ProofStatus {
    pub fn new(superblock_number: u64, superblock_hash: [u8; 32]) -> Self {
        Self {
            superblock_number,
            superblock_hash,
            state: ProofState::Collecting,
            received: HashMap::new(),
        }
    }
}
