//! Superblock assembly and publish pipeline (§4.7–§4.8): draining the
//! cross-transaction queue into 2PC instances, sealing a period,
//! aggregating per-chain blocks into a superblock, collecting proofs, and
//! publishing to L1.

pub mod controller;
pub mod error;
pub mod l1;
pub mod proof_collector;
pub mod transport;

pub use controller::SuperblockController;
pub use error::{ControllerError, ProofError};
pub use l1::{L1Error, L1Publisher};
pub use proof_collector::{ProofCollector, ProofCollectorStats};
pub use transport::SuperblockTransport;
