//! Core data model for the Shared Publisher coordination engine: chain
//! identities, cross-transaction requests and their 2PC state, slot/period
//! parameters, superblocks, and proof submissions. No networking, no I/O —
//! just the shapes and the canonical codec everything else agrees on.

pub mod chain;
pub mod codec;
pub mod identity;
pub mod proof;
pub mod slot;
pub mod superblock;
pub mod xt;

pub use chain::ChainId;
pub use identity::{SequencerIdentity, TrustedSet, PUBKEY_LEN};
pub use proof::{AggregationOutputs, ProofState, ProofStatus, ProofSubmission};
pub use slot::{PeriodConfig, PeriodInfo, SlotConfig};
pub use superblock::{ChainBlockRef, Superblock, SuperblockStatus};
pub use xt::{Decision, QueuedXtRequest, TxGroup, XtId, XtInstance, XtRequest};
