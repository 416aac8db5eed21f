//! ECDSA (secp256k1) signing and verification used by the connection
//! handshake (§4.2). A compressed public key here is exactly a
//! `sp_types::SequencerIdentity::pubkey`.

pub mod error;

pub use error::CryptoError;

use secp256k1::ecdsa::Signature;
use secp256k1::{Message, PublicKey, Secp256k1, SecretKey};
use sha2::{Digest, Sha256};
use sp_types::PUBKEY_LEN;

/// An operator or sequencer's secp256k1 signing key pair.
#[derive(Clone)]
pub struct KeyPair {
    secret: SecretKey,
    public: PublicKey,
}

impl KeyPair {
    pub fn generate() -> Self {
        let secp = Secp256k1::new();
        let mut rng = rand::thread_rng();
        let (secret, public) = secp.generate_keypair(&mut rng);
        Self { secret, public }
    }

    pub fn from_secret_bytes(bytes: &[u8]) -> Result<Self, CryptoError> {
        let secret = SecretKey::from_slice(bytes).map_err(|_| CryptoError::InvalidSecretKey)?;
        let public = PublicKey::from_secret_key(&Secp256k1::new(), &secret);
        Ok(Self { secret, public })
    }

    pub fn public_key_compressed(&self) -> [u8; PUBKEY_LEN] {
        self.public.serialize()
    }

    /// Signs the SHA-256 digest of `message`.
    pub fn sign(&self, message: &[u8]) -> Signature {
        let digest = Sha256::digest(message);
        let msg = Message::from_digest_slice(&digest).expect("sha256 digest is 32 bytes");
        Secp256k1::signing_only().sign_ecdsa(&msg, &self.secret)
    }
}

/// Verifies `signature` over the SHA-256 digest of `message` against a
/// compressed public key.
pub fn verify(
    pubkey: &[u8; PUBKEY_LEN],
    message: &[u8],
    signature: &Signature,
) -> Result<(), CryptoError> {
    let public = PublicKey::from_slice(pubkey).map_err(|_| CryptoError::InvalidPublicKey)?;
    let digest = Sha256::digest(message);
    let msg = Message::from_digest_slice(&digest).expect("sha256 digest is 32 bytes");
    Secp256k1::verification_only()
        .verify_ecdsa(&msg, signature, &public)
        .map_err(|_| CryptoError::InvalidSignature)
}

pub fn signature_from_compact(bytes: &[u8]) -> Result<Signature, CryptoError> {
    Signature::from_compact(bytes).map_err(|e| CryptoError::MalformedSignature(e.to_string()))
}
