//! HTTP client for the external zero-knowledge prover service (§6.2).

pub mod client;
pub mod error;
pub mod types;

pub use client::ProverClient;
pub use error::ProverError;
pub use types::{ProofJobAccepted, ProofJobState, ProofJobStatus, ProofResult};
