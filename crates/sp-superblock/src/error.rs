use sp_types::ChainId;
use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ProofError {
    #[error("superblock hash must be non-zero")]
    ZeroHash,
    #[error("submission l1Head does not match its own aggregation outputs' l1Head")]
    L1HeadMismatch,
    #[error("submission proverAddress does not match its own aggregation outputs' proverAddress")]
    ProverAddressMismatch,
    #[error("l2StartBlock is after the aggregation's l2BlockNumber")]
    StartBlockAfterAggregation,
    #[error("verifying key must not be empty")]
    EmptyVerifyingKey,
    #[error("no status tracked for this superblock hash")]
    UnknownSuperblock,
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ControllerError {
    #[error("chain {0} is not in the registered rollup set")]
    UnregisteredChain(ChainId),
    #[error("no period is currently open")]
    NoOpenPeriod,
}
