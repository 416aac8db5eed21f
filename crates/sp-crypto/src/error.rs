use thiserror::Error;

#[derive(Error, Debug)]
pub enum CryptoError {
    #[error("invalid secret key material")]
    InvalidSecretKey,
    #[error("invalid public key material")]
    InvalidPublicKey,
    #[error("signature does not verify")]
    InvalidSignature,
    #[error("malformed signature encoding: {0}")]
    MalformedSignature(String),
}
