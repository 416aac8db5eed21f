//! Frame codec, connection handshake, connection pool, and message router
//! for the Shared Publisher's sequencer-facing wire protocol (§4.1-§4.3).

pub mod error;
pub mod frame;
pub mod handshake;
pub mod pool;
pub mod router;
pub mod wire;

pub use error::NetError;
pub use handshake::{client_handshake, server_handshake, HandshakeError};
pub use pool::{ConnectionPool, Inbound, PoolConfig};
pub use router::{run as run_router, RouterHandlers};
pub use wire::{Block, CircMessage, Decided, Message, Rollback, StartInstance, StartPeriod, Vote};
