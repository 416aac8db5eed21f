use thiserror::Error;

#[derive(Error, Debug)]
pub enum WalError {
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serialization error: {0}")]
    Encode(#[from] bincode::Error),
    #[error("wal lock poisoned")]
    Poisoned,
}
