//! Bounded FIFO queue of pending cross-transaction requests (§4.5).

pub mod error;
pub mod queue;

pub use error::QueueError;
pub use queue::XtQueue;
