//! Pluggable write-ahead log for 2PC durability (§3, §9).

pub mod error;
pub mod record;
pub mod wal;

pub use error::WalError;
pub use record::WalRecord;
pub use wal::{FileWal, NullWal, WalIterator, WriteAheadLog};
