//! The settlement-layer publish boundary. The on-chain contracts and the
//! L1 RPC/event client are explicitly out of scope (§1); the controller
//! only needs somewhere to hand a signed calldata blob and later learn
//! whether it landed.

use async_trait::async_trait;

#[derive(Debug, thiserror::Error)]
pub enum L1Error {
    #[error("publish failed: {0}")]
    PublishFailed(String),
}

#[async_trait]
pub trait L1Publisher: Send + Sync {
    async fn publish_calldata(&self, blob: &[u8]) -> Result<(), L1Error>;
}
