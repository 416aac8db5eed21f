use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("trusted sequencer public key must be {expected} bytes, got {actual}")]
    BadPublicKeyLength { expected: usize, actual: usize },
    #[error("trusted sequencer public key is not valid hex: {0}")]
    BadPublicKeyHex(#[from] hex::FromHexError),
    #[error("node private key is invalid: {0}")]
    InvalidPrivateKey(#[from] sp_crypto::CryptoError),
}
