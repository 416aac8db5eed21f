//! JSON shapes for the §6.3 proof-submission ingress. Byte fields travel
//! as hex strings on the wire; conversion to `sp_types::ProofSubmission`
//! is where malformed hex or wrong-length fields become a 400.

use crate::error::AppError;
use serde::{Deserialize, Serialize};
use sp_types::{AggregationOutputs, ChainId, ProofState, ProofStatus, ProofSubmission};
use std::collections::HashMap;
use std::time::SystemTime;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregationOutputsDto {
    pub l1_head: String,
    pub prover_address: String,
    pub l2_block_number: u64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProofSubmissionDto {
    pub superblock_number: u64,
    pub superblock_hash: String,
    #[serde(rename = "chainID")]
    pub chain_id: String,
    pub prover_address: String,
    pub l1_head: String,
    pub pre_root: String,
    pub post_root: String,
    pub l2_start_block: u64,
    pub l2_block_number: u64,
    pub rollup_config_hash: String,
    pub aggregation_outputs: AggregationOutputsDto,
    pub agg_vk: String,
    pub proof: String,
}

fn decode_fixed<const N: usize>(field: &str, hex_str: &str) -> Result<[u8; N], AppError> {
    let bytes = hex::decode(hex_str.trim_start_matches("0x"))
        .map_err(|e| AppError::BadRequest(format!("{field}: invalid hex: {e}")))?;
    bytes
        .try_into()
        .map_err(|v: Vec<u8>| AppError::BadRequest(format!("{field}: expected {N} bytes, got {}", v.len())))
}

fn decode_bytes(field: &str, hex_str: &str) -> Result<Vec<u8>, AppError> {
    hex::decode(hex_str.trim_start_matches("0x"))
        .map_err(|e| AppError::BadRequest(format!("{field}: invalid hex: {e}")))
}

impl ProofSubmissionDto {
    pub fn into_submission(self) -> Result<(ProofSubmission, u64), AppError> {
        let submission = ProofSubmission {
            chain_id: ChainId::new(self.chain_id.into_bytes()),
            superblock_hash: decode_fixed("superblockHash", &self.superblock_hash)?,
            l1_head: decode_fixed("l1Head", &self.l1_head)?,
            pre_root: decode_fixed("preRoot", &self.pre_root)?,
            post_root: decode_fixed("postRoot", &self.post_root)?,
            l2_start_block: self.l2_start_block,
            l2_block_number: self.l2_block_number,
            rollup_config_hash: decode_fixed("rollupConfigHash", &self.rollup_config_hash)?,
            prover_address: decode_fixed("proverAddress", &self.prover_address)?,
            aggregation_outputs: AggregationOutputs {
                l1_head: decode_fixed("aggregationOutputs.l1Head", &self.aggregation_outputs.l1_head)?,
                prover_address: decode_fixed(
                    "aggregationOutputs.proverAddress",
                    &self.aggregation_outputs.prover_address,
                )?,
                l2_block_number: self.aggregation_outputs.l2_block_number,
            },
            verifying_key: decode_bytes("aggVk", &self.agg_vk)?,
            proof: decode_bytes("proof", &self.proof)?,
        };
        Ok((submission, self.superblock_number))
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProofStatusDto {
    pub superblock_number: u64,
    pub superblock_hash: String,
    pub state: &'static str,
    pub received: HashMap<String, u64>,
}

impl From<ProofStatus> for ProofStatusDto {
    fn from(status: ProofStatus) -> Self {
        let received = status
            .received
            .into_iter()
            .map(|(chain_id, ts)| {
                let unix_secs = ts
                    .duration_since(SystemTime::UNIX_EPOCH)
                    .map(|d| d.as_secs())
                    .unwrap_or(0);
                (String::from_utf8_lossy(chain_id.as_bytes()).into_owned(), unix_secs)
            })
            .collect();
        Self {
            superblock_number: status.superblock_number,
            superblock_hash: hex::encode(status.superblock_hash),
            state: proof_state_str(status.state),
            received,
        }
    }
}

fn proof_state_str(state: ProofState) -> &'static str {
    state.as_str()
}
