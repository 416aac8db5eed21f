use parity_scale_codec::{Decode, Encode};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Length of a compressed secp256k1 public key.
pub const PUBKEY_LEN: usize = 33;

/// A trusted sequencer's identity: a compressed secp256k1 public key plus a
/// human-readable label. The set of trusted identities is fixed at boot
/// (§3 Non-goals: no dynamic membership).
#[derive(Clone, PartialEq, Eq, Hash, Encode, Decode, Serialize, Deserialize)]
pub struct SequencerIdentity {
    pub label: String,
    pub pubkey: [u8; PUBKEY_LEN],
}

impl SequencerIdentity {
    pub fn new(label: impl Into<String>, pubkey: [u8; PUBKEY_LEN]) -> Self {
        Self {
            label: label.into(),
            pubkey,
        }
    }
}

impl fmt::Debug for SequencerIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "SequencerIdentity(\"{}\", {})",
            self.label,
            hex::encode(self.pubkey)
        )
    }
}

impl fmt::Display for SequencerIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label)
    }
}

/// A fixed, boot-time set of trusted sequencer identities, keyed by
/// compressed public key for O(1) handshake verification lookups.
#[derive(Clone, Debug, Default)]
pub struct TrustedSet {
    by_pubkey: std::collections::HashMap<[u8; PUBKEY_LEN], SequencerIdentity>,
}

impl TrustedSet {
    pub fn new(identities: impl IntoIterator<Item = SequencerIdentity>) -> Self {
        let by_pubkey = identities.into_iter().map(|id| (id.pubkey, id)).collect();
        Self { by_pubkey }
    }

    pub fn lookup(&self, pubkey: &[u8; PUBKEY_LEN]) -> Option<&SequencerIdentity> {
        self.by_pubkey.get(pubkey)
    }

    pub fn contains(&self, pubkey: &[u8; PUBKEY_LEN]) -> bool {
        self.by_pubkey.contains_key(pubkey)
    }

    pub fn len(&self) -> usize {
        self.by_pubkey.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_pubkey.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &SequencerIdentity> {
        self.by_pubkey.values()
    }
}
