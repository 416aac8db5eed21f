use crate::chain::ChainId;
use crate::xt::XtId;
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SuperblockStatus {
    Pending,
    Submitted,
    Confirmed,
    Finalized,
    RolledBack,
}

/// A reference to one rollup's finalized L2 block within a superblock.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ChainBlockRef {
    pub chain_id: ChainId,
    pub block_hash: [u8; 32],
    pub encoded_block: Vec<u8>,
    pub included_xt_ids: Vec<XtId>,
}

/// One per period: the period-level aggregate across all rollups, the unit
/// published to L1 (§3, §4.7).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Superblock {
    pub period_id: u64,
    pub superblock_number: u64,
    /// Deterministic ordering of chains by `ChainId` byte order (§4.7 step 4).
    pub chain_blocks: Vec<ChainBlockRef>,
    pub merkle_root: [u8; 32],
    pub included_xt_ids: Vec<XtId>,
    pub proof: Option<Vec<u8>>,
    pub status: SuperblockStatus,
}

impl Superblock {
    /// Merkle root over the ordered chain block hashes. A simple balanced
    /// binary tree is sufficient here: the root is a commitment, not a
    /// structure callers need to produce inclusion proofs against in this
    /// phase.
    pub fn compute_merkle_root(chain_blocks: &[ChainBlockRef]) -> [u8; 32] {
        use sha2::{Digest, Sha256};

        if chain_blocks.is_empty() {
            return [0u8; 32];
        }
        let mut layer: Vec<[u8; 32]> = chain_blocks.iter().map(|b| b.block_hash).collect();
        while layer.len() > 1 {
            let mut next = Vec::with_capacity(layer.len().div_ceil(2));
            for pair in layer.chunks(2) {
                let mut hasher = Sha256::new();
                hasher.update(pair[0]);
                hasher.update(pair.get(1).unwrap_or(&pair[0]));
                let digest = hasher.finalize();
                let mut node = [0u8; 32];
                node.copy_from_slice(&digest);
                next.push(node);
            }
            layer = next;
        }
        layer[0]
    }
}
