//! The on-chain settlement contracts and the L1 RPC client are out of
//! scope (§1 Non-goals). This stand-in logs the calldata it would have
//! published and always succeeds, so the rest of the pipeline (proof
//! collection, retries, status transitions) can run end to end without a
//! real L1 connection.

use async_trait::async_trait;
use sp_superblock::{L1Error, L1Publisher};

pub struct LoggingL1Publisher;

#[async_trait]
impl L1Publisher for LoggingL1Publisher {
    async fn publish_calldata(&self, blob: &[u8]) -> Result<(), L1Error> {
        tracing::info!(target: "l1", bytes = blob.len(), "publishing superblock calldata (no-op stand-in)");
        Ok(())
    }
}
