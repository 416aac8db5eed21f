//! Abstract metrics traits, decoupling the coordination logic in
//! `sp-consensus`/`sp-queue`/`sp-net`/`sp-superblock` from the Prometheus
//! backend. Each domain gets its own narrow trait; `MetricsSink` is the
//! union a concrete backend implements.

use once_cell::sync::OnceCell;

#[derive(Debug, Clone, Copy)]
pub struct NopSink;

pub static SINK: OnceCell<&'static dyn MetricsSink> = OnceCell::new();
static NOP_SINK: NopSink = NopSink;

pub fn metrics() -> &'static dyn MetricsSink {
    SINK.get().copied().unwrap_or(&NOP_SINK)
}

/// Connection pool and handshake metrics (§4.2, §4.3).
pub trait NetMetricsSink: Send + Sync + std::fmt::Debug {
    fn inc_connections_accepted(&self);
    fn inc_connections_rejected(&self, reason: &'static str);
    fn set_connected_peers(&self, count: i64);
    fn inc_handshake_failures(&self, reason: &'static str);
}
impl NetMetricsSink for NopSink {
    fn inc_connections_accepted(&self) {}
    fn inc_connections_rejected(&self, _reason: &'static str) {}
    fn set_connected_peers(&self, _count: i64) {}
    fn inc_handshake_failures(&self, _reason: &'static str) {}
}

/// 2PC coordinator metrics (§4.4).
pub trait ConsensusMetricsSink: Send + Sync + std::fmt::Debug {
    fn inc_instances_started(&self);
    fn inc_decisions(&self, commit: bool);
    fn inc_timeouts(&self);
    fn inc_conflicting_votes(&self);
}
impl ConsensusMetricsSink for NopSink {
    fn inc_instances_started(&self) {}
    fn inc_decisions(&self, _commit: bool) {}
    fn inc_timeouts(&self) {}
    fn inc_conflicting_votes(&self) {}
}

/// Pending-transaction queue metrics (§4.5).
pub trait QueueMetricsSink: Send + Sync + std::fmt::Debug {
    fn set_queue_depth(&self, depth: i64);
    fn inc_enqueue_rejected(&self);
    fn inc_expired(&self, count: u64);
}
impl QueueMetricsSink for NopSink {
    fn set_queue_depth(&self, _depth: i64) {}
    fn inc_enqueue_rejected(&self) {}
    fn inc_expired(&self, _count: u64) {}
}

/// Superblock assembly and proof pipeline metrics (§4.7, §4.8).
pub trait SuperblockMetricsSink: Send + Sync + std::fmt::Debug {
    fn inc_periods_sealed(&self);
    fn inc_superblocks_published(&self);
    fn inc_publish_failures(&self);
    fn inc_rollbacks(&self);
    fn observe_proof_collection_seconds(&self, duration_secs: f64);
}
impl SuperblockMetricsSink for NopSink {
    fn inc_periods_sealed(&self) {}
    fn inc_superblocks_published(&self) {}
    fn inc_publish_failures(&self) {}
    fn inc_rollbacks(&self) {}
    fn observe_proof_collection_seconds(&self, _duration_secs: f64) {}
}

pub trait MetricsSink:
    NetMetricsSink + ConsensusMetricsSink + QueueMetricsSink + SuperblockMetricsSink
{
}

impl<T> MetricsSink for T where
    T: NetMetricsSink + ConsensusMetricsSink + QueueMetricsSink + SuperblockMetricsSink
{
}
