//! The three event kinds a durable WAL must log, in order, per instance
//! (§9 "Durability"): creation, each accepted vote, then the decision —
//! logged before it is broadcast.

use serde::{Deserialize, Serialize};
use sp_types::{ChainId, XtId, XtRequest};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum WalRecord {
    InstanceCreated { xt_id: XtId, request: XtRequest },
    VoteRecorded { xt_id: XtId, chain_id: ChainId, vote: bool },
    DecisionEmitted { xt_id: XtId, commit: bool },
}
