//! Canonical, deterministic binary codec for anything that is hashed,
//! signed, or sent on the wire.
//!
//! Centralizing this in one place guarantees every component computes the
//! same bytes for the same value, which matters most for `XTID`: any two
//! honest parties must derive the identical hash from the identical
//! request.

use parity_scale_codec::{Decode, DecodeAll, Encode};
use sha2::{Digest, Sha256};

pub fn to_bytes_canonical<T: Encode>(v: &T) -> Vec<u8> {
    v.encode()
}

pub fn from_bytes_canonical<T: Decode>(b: &[u8]) -> Result<T, String> {
    T::decode_all(&mut &*b).map_err(|e| format!("canonical decode failed: {e}"))
}

/// SHA-256 over the canonical encoding of `v`.
pub fn canonical_hash<T: Encode>(v: &T) -> [u8; 32] {
    let bytes = to_bytes_canonical(v);
    let digest = Sha256::digest(&bytes);
    let mut out = [0u8; 32];
    out.copy_from_slice(&digest);
    out
}
