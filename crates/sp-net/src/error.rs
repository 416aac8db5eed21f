use thiserror::Error;

#[derive(Error, Debug)]
pub enum NetError {
    #[error("frame of {len} bytes exceeds configured maximum of {max} bytes")]
    FrameTooLarge { len: u32, max: u32 },
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed payload: {0}")]
    Decode(String),
    #[error("handshake failed: {0}")]
    Handshake(#[from] crate::handshake::HandshakeError),
    #[error("connection closed")]
    Closed,
    #[error("max connections ({0}) reached")]
    TooManyConnections(usize),
}
