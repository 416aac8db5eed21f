//! Observability for the publisher: structured logging initialization, a
//! Prometheus metrics registry, and abstract sinks that decouple the core
//! coordination crates from the concrete metrics backend.

pub mod http;
pub mod init;
pub mod prometheus;
pub mod sinks;

pub use sinks::metrics;
