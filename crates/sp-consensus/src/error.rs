use sp_types::XtId;
use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConsensusError {
    #[error("xtID {0} already has an active instance")]
    AlreadyActive(XtId),
    #[error("no active instance for xtID {0}")]
    InstanceNotFound(XtId),
    #[error("chain is not a participant of this instance")]
    NotParticipant,
    #[error("conflicting vote: chain already voted the other way")]
    ConflictingVote,
}
