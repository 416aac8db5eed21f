//! One-shot ECDSA challenge-response handshake, exchanged immediately
//! after TCP accept and before any framed application message (§4.2).
//!
//! This is a distinct pre-framing exchange: it still rides on top of the
//! same length-prefixed framing as application messages, just with a small
//! dedicated max size and its own message shapes, so a sequencer never
//! needs two different wire parsers.

use crate::frame::{read_frame, write_frame};
use parity_scale_codec::{Decode, Encode};
use sp_types::{SequencerIdentity, TrustedSet, PUBKEY_LEN};
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncWrite};

/// Handshake frames are tiny; no legitimate client needs anywhere near this.
const HANDSHAKE_MAX_FRAME: u32 = 4096;

/// Default allowed clock skew between client and server (§4.2, §8 invariant 8).
pub const DEFAULT_MAX_SKEW: Duration = Duration::from_secs(30);

#[derive(Error, Debug)]
pub enum HandshakeError {
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed handshake payload: {0}")]
    Decode(String),
    #[error("signature does not verify")]
    InvalidSignature,
    #[error("clock skew {0:?} exceeds maximum of {1:?}")]
    ClockSkew(Duration, Duration),
    #[error("public key is not in the trusted set")]
    Untrusted,
    #[error("server rejected the handshake")]
    Rejected,
}

#[derive(Clone, Debug, Encode, Decode)]
pub struct HandshakeRequest {
    pub timestamp_ns: u64,
    pub nonce: [u8; 16],
    pub pubkey: [u8; PUBKEY_LEN],
    /// Compact (r, s) ECDSA signature over `timestamp_ns ‖ nonce`.
    pub sig: [u8; 64],
}

impl HandshakeRequest {
    pub fn preimage(timestamp_ns: u64, nonce: &[u8; 16]) -> Vec<u8> {
        let mut buf = Vec::with_capacity(8 + 16);
        buf.extend_from_slice(&timestamp_ns.to_be_bytes());
        buf.extend_from_slice(nonce);
        buf
    }
}

#[derive(Clone, Debug, Encode, Decode)]
pub struct HandshakeResponse {
    pub accepted: bool,
    pub session_id: [u8; 16],
}

async fn write_handshake<W: AsyncWrite + Unpin, T: Encode>(
    io: &mut W,
    msg: &T,
) -> Result<(), HandshakeError> {
    write_frame(io, &msg.encode()).await.map_err(|e| match e {
        crate::error::NetError::Io(e) => HandshakeError::Io(e),
        other => HandshakeError::Decode(other.to_string()),
    })
}

async fn read_handshake<R: AsyncRead + Unpin, T: Decode>(io: &mut R) -> Result<T, HandshakeError> {
    let bytes = read_frame(io, HANDSHAKE_MAX_FRAME)
        .await
        .map_err(|e| match e {
            crate::error::NetError::Io(e) => HandshakeError::Io(e),
            other => HandshakeError::Decode(other.to_string()),
        })?;
    sp_types::codec::from_bytes_canonical(&bytes).map_err(HandshakeError::Decode)
}

/// Client side of the handshake (§4.2 step 1 + reading the server's reply).
pub async fn client_handshake<S: AsyncRead + AsyncWrite + Unpin>(
    io: &mut S,
    keypair: &sp_crypto::KeyPair,
) -> Result<[u8; 16], HandshakeError> {
    let timestamp_ns = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos() as u64;
    let mut nonce = [0u8; 16];
    rand::Rng::fill(&mut rand::thread_rng(), &mut nonce);

    let preimage = HandshakeRequest::preimage(timestamp_ns, &nonce);
    let sig = keypair.sign(&preimage);

    let req = HandshakeRequest {
        timestamp_ns,
        nonce,
        pubkey: keypair.public_key_compressed(),
        sig: sig.serialize_compact(),
    };
    write_handshake(io, &req).await?;

    let resp: HandshakeResponse = read_handshake(io).await?;
    if !resp.accepted {
        return Err(HandshakeError::Rejected);
    }
    Ok(resp.session_id)
}

/// Server side of the handshake (§4.2 step 2-3). Returns the verified
/// identity on success; the caller is responsible for closing the
/// connection on any `Err`.
pub async fn server_handshake<S: AsyncRead + AsyncWrite + Unpin>(
    io: &mut S,
    trusted: &TrustedSet,
    max_skew: Duration,
    enforce_trusted: bool,
) -> Result<SequencerIdentity, HandshakeError> {
    let req: HandshakeRequest = read_handshake(io).await?;

    let result = verify_handshake_request(&req, trusted, max_skew, enforce_trusted);

    let accepted = result.is_ok();
    let mut session_id = [0u8; 16];
    if accepted {
        rand::Rng::fill(&mut rand::thread_rng(), &mut session_id);
    }
    write_handshake(
        io,
        &HandshakeResponse {
            accepted,
            session_id,
        },
    )
    .await?;

    result
}

/// Pure verification logic, split out so it can be unit-tested without I/O.
///
/// The signature must always check out; `enforce_trusted` only controls
/// whether the pubkey must also be a member of `trusted` (§6.4 `auth.enabled`).
/// When enforcement is off, an unrecognized but self-consistent key is
/// accepted under an identity synthesized from its own hex encoding.
fn verify_handshake_request(
    req: &HandshakeRequest,
    trusted: &TrustedSet,
    max_skew: Duration,
    enforce_trusted: bool,
) -> Result<SequencerIdentity, HandshakeError> {
    let identity = match trusted.lookup(&req.pubkey).cloned() {
        Some(identity) => identity,
        None if enforce_trusted => return Err(HandshakeError::Untrusted),
        None => SequencerIdentity::new(hex::encode(req.pubkey), req.pubkey),
    };

    let now_ns = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos() as u64;
    let skew = Duration::from_nanos(now_ns.abs_diff(req.timestamp_ns));
    if skew > max_skew {
        return Err(HandshakeError::ClockSkew(skew, max_skew));
    }

    let sig = sp_crypto::signature_from_compact(&req.sig)
        .map_err(|_| HandshakeError::InvalidSignature)?;
    let preimage = HandshakeRequest::preimage(req.timestamp_ns, &req.nonce);
    sp_crypto::verify(&req.pubkey, &preimage, &sig).map_err(|_| HandshakeError::InvalidSignature)?;

    Ok(identity)
}

#[cfg(test)]
mod tests {
    use super::*;
    use sp_crypto::KeyPair;

    fn trusted_with(kp: &KeyPair) -> TrustedSet {
        TrustedSet::new([SequencerIdentity::new(
            "seq-a",
            kp.public_key_compressed(),
        )])
    }

    #[test]
    fn accepts_fresh_trusted_request() {
        let kp = KeyPair::generate();
        let trusted = trusted_with(&kp);
        let timestamp_ns = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_nanos() as u64;
        let nonce = [1u8; 16];
        let preimage = HandshakeRequest::preimage(timestamp_ns, &nonce);
        let sig = kp.sign(&preimage);
        let req = HandshakeRequest {
            timestamp_ns,
            nonce,
            pubkey: kp.public_key_compressed(),
            sig: sig.serialize_compact(),
        };
        let identity = verify_handshake_request(&req, &trusted, DEFAULT_MAX_SKEW, true).unwrap();
        assert_eq!(identity.label, "seq-a");
    }

    #[test]
    fn rejects_untrusted_key() {
        let kp = KeyPair::generate();
        let stranger = KeyPair::generate();
        let trusted = trusted_with(&kp);
        let timestamp_ns = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_nanos() as u64;
        let nonce = [2u8; 16];
        let preimage = HandshakeRequest::preimage(timestamp_ns, &nonce);
        let sig = stranger.sign(&preimage);
        let req = HandshakeRequest {
            timestamp_ns,
            nonce,
            pubkey: stranger.public_key_compressed(),
            sig: sig.serialize_compact(),
        };
        let err = verify_handshake_request(&req, &trusted, DEFAULT_MAX_SKEW, true).unwrap_err();
        assert!(matches!(err, HandshakeError::Untrusted));
    }

    #[test]
    fn accepts_untrusted_key_when_enforcement_disabled() {
        let kp = KeyPair::generate();
        let stranger = KeyPair::generate();
        let trusted = trusted_with(&kp);
        let timestamp_ns = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_nanos() as u64;
        let nonce = [9u8; 16];
        let preimage = HandshakeRequest::preimage(timestamp_ns, &nonce);
        let sig = stranger.sign(&preimage);
        let req = HandshakeRequest {
            timestamp_ns,
            nonce,
            pubkey: stranger.public_key_compressed(),
            sig: sig.serialize_compact(),
        };
        let identity = verify_handshake_request(&req, &trusted, DEFAULT_MAX_SKEW, false).unwrap();
        assert_eq!(identity.pubkey, stranger.public_key_compressed());
    }

    #[test]
    fn rejects_clock_skew_beyond_30s() {
        let kp = KeyPair::generate();
        let trusted = trusted_with(&kp);
        let now_ns = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_nanos() as u64;
        let stale_ns = now_ns.saturating_sub(Duration::from_secs(60).as_nanos() as u64);
        let nonce = [3u8; 16];
        let preimage = HandshakeRequest::preimage(stale_ns, &nonce);
        let sig = kp.sign(&preimage);
        let req = HandshakeRequest {
            timestamp_ns: stale_ns,
            nonce,
            pubkey: kp.public_key_compressed(),
            sig: sig.serialize_compact(),
        };
        let err = verify_handshake_request(&req, &trusted, DEFAULT_MAX_SKEW, true).unwrap_err();
        assert!(matches!(err, HandshakeError::ClockSkew(_, _)));
    }

    #[test]
    fn rejects_tampered_signature() {
        let kp = KeyPair::generate();
        let trusted = trusted_with(&kp);
        let timestamp_ns = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_nanos() as u64;
        let nonce = [4u8; 16];
        let preimage = HandshakeRequest::preimage(timestamp_ns, &nonce);
        let mut sig = kp.sign(&preimage).serialize_compact();
        sig[0] ^= 0xFF;
        let req = HandshakeRequest {
            timestamp_ns,
            nonce,
            pubkey: kp.public_key_compressed(),
            sig,
        };
        let err = verify_handshake_request(&req, &trusted, DEFAULT_MAX_SKEW, true).unwrap_err();
        assert!(matches!(err, HandshakeError::InvalidSignature));
    }
}
