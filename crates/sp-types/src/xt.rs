use crate::chain::ChainId;
use crate::codec::canonical_hash;
use crate::identity::SequencerIdentity;
use parity_scale_codec::{Decode, Encode};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::time::{Duration, Instant};

/// Deterministic content hash of an `XTRequest`'s canonical encoding. Any
/// honest party computes the same ID for the same request (§3).
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Encode, Decode, Serialize, Deserialize)]
pub struct XtId(pub [u8; 32]);

impl fmt::Debug for XtId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "XtId({})", hex::encode(self.0))
    }
}

impl fmt::Display for XtId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(self.0))
    }
}

/// A single chain's ordered raw transactions within a cross-transaction bundle.
#[derive(Clone, Debug, PartialEq, Eq, Encode, Decode, Serialize, Deserialize)]
pub struct TxGroup {
    pub chain_id: ChainId,
    pub raw_txs: Vec<Vec<u8>>,
}

/// A user-submitted bundle requiring atomic execution across the chains it
/// names. `xt_id()` is the deterministic hash of its canonical encoding.
#[derive(Clone, Debug, PartialEq, Eq, Encode, Decode, Serialize, Deserialize)]
pub struct XtRequest {
    pub groups: Vec<TxGroup>,
}

impl XtRequest {
    pub fn xt_id(&self) -> XtId {
        XtId(canonical_hash(self))
    }

    pub fn participants(&self) -> BTreeSet<ChainId> {
        self.groups.iter().map(|g| g.chain_id.clone()).collect()
    }
}

/// A queued, not-yet-started cross-transaction request.
#[derive(Clone, Debug)]
pub struct QueuedXtRequest {
    pub request: XtRequest,
    pub submitted_by: SequencerIdentity,
    pub enqueued_at: Instant,
    pub expires_at: Instant,
}

impl QueuedXtRequest {
    pub fn new(request: XtRequest, submitted_by: SequencerIdentity, expiration: Duration) -> Self {
        let now = Instant::now();
        Self {
            request,
            submitted_by,
            enqueued_at: now,
            expires_at: now + expiration,
        }
    }

    pub fn is_expired(&self, now: Instant) -> bool {
        now >= self.expires_at
    }
}

/// The terminal decision of a 2PC instance. Monotonic: once not
/// `Undecided`, it never changes (§3, §8 invariant 1).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Decision {
    Undecided,
    Commit,
    Abort,
}

impl Decision {
    pub fn is_terminal(self) -> bool {
        !matches!(self, Decision::Undecided)
    }
}

/// Per-cross-transaction 2PC state (§3).
#[derive(Debug)]
pub struct XtInstance {
    pub xt_id: XtId,
    pub request: XtRequest,
    pub participants: BTreeSet<ChainId>,
    pub started_at: Instant,
    pub votes: HashMap<ChainId, bool>,
    pub decision: Decision,
    pub timeout: Duration,
}

impl XtInstance {
    pub fn new(xt_id: XtId, request: XtRequest, timeout: Duration) -> Self {
        let participants = request.participants();
        Self {
            xt_id,
            request,
            participants,
            started_at: Instant::now(),
            votes: HashMap::new(),
            decision: Decision::Undecided,
            timeout,
        }
    }

    pub fn deadline(&self) -> Instant {
        self.started_at + self.timeout
    }
}
