//! Prometheus-backed implementation of the sink traits. `install()` must
//! run exactly once at node startup before any sink method is called.

use crate::sinks::*;
use once_cell::sync::OnceCell;
use prometheus::{
    exponential_buckets, register_gauge, register_histogram, register_int_counter,
    register_int_counter_vec, Gauge, Histogram, IntCounter, IntCounterVec,
};

static NET_CONNECTIONS_ACCEPTED_TOTAL: OnceCell<IntCounter> = OnceCell::new();
static NET_CONNECTIONS_REJECTED_TOTAL: OnceCell<IntCounterVec> = OnceCell::new();
static NET_CONNECTED_PEERS: OnceCell<Gauge> = OnceCell::new();
static NET_HANDSHAKE_FAILURES_TOTAL: OnceCell<IntCounterVec> = OnceCell::new();

static CONSENSUS_INSTANCES_STARTED_TOTAL: OnceCell<IntCounter> = OnceCell::new();
static CONSENSUS_DECISIONS_TOTAL: OnceCell<IntCounterVec> = OnceCell::new();
static CONSENSUS_TIMEOUTS_TOTAL: OnceCell<IntCounter> = OnceCell::new();
static CONSENSUS_CONFLICTING_VOTES_TOTAL: OnceCell<IntCounter> = OnceCell::new();

static QUEUE_DEPTH: OnceCell<Gauge> = OnceCell::new();
static QUEUE_ENQUEUE_REJECTED_TOTAL: OnceCell<IntCounter> = OnceCell::new();
static QUEUE_EXPIRED_TOTAL: OnceCell<IntCounter> = OnceCell::new();

static SUPERBLOCK_PERIODS_SEALED_TOTAL: OnceCell<IntCounter> = OnceCell::new();
static SUPERBLOCK_PUBLISHED_TOTAL: OnceCell<IntCounter> = OnceCell::new();
static SUPERBLOCK_PUBLISH_FAILURES_TOTAL: OnceCell<IntCounter> = OnceCell::new();
static SUPERBLOCK_ROLLBACKS_TOTAL: OnceCell<IntCounter> = OnceCell::new();
static SUPERBLOCK_PROOF_COLLECTION_SECONDS: OnceCell<Histogram> = OnceCell::new();

#[derive(Debug, Clone, Copy)]
pub struct PrometheusSink;

macro_rules! get_metric {
    ($metric:ident) => {
        $metric
            .get()
            .expect("prometheus sink not initialized, call telemetry::prometheus::install() first")
    };
}

impl NetMetricsSink for PrometheusSink {
    fn inc_connections_accepted(&self) {
        get_metric!(NET_CONNECTIONS_ACCEPTED_TOTAL).inc();
    }
    fn inc_connections_rejected(&self, reason: &'static str) {
        get_metric!(NET_CONNECTIONS_REJECTED_TOTAL)
            .with_label_values(&[reason])
            .inc();
    }
    fn set_connected_peers(&self, count: i64) {
        get_metric!(NET_CONNECTED_PEERS).set(count as f64);
    }
    fn inc_handshake_failures(&self, reason: &'static str) {
        get_metric!(NET_HANDSHAKE_FAILURES_TOTAL)
            .with_label_values(&[reason])
            .inc();
    }
}

impl ConsensusMetricsSink for PrometheusSink {
    fn inc_instances_started(&self) {
        get_metric!(CONSENSUS_INSTANCES_STARTED_TOTAL).inc();
    }
    fn inc_decisions(&self, commit: bool) {
        let label = if commit { "commit" } else { "abort" };
        get_metric!(CONSENSUS_DECISIONS_TOTAL)
            .with_label_values(&[label])
            .inc();
    }
    fn inc_timeouts(&self) {
        get_metric!(CONSENSUS_TIMEOUTS_TOTAL).inc();
    }
    fn inc_conflicting_votes(&self) {
        get_metric!(CONSENSUS_CONFLICTING_VOTES_TOTAL).inc();
    }
}

impl QueueMetricsSink for PrometheusSink {
    fn set_queue_depth(&self, depth: i64) {
        get_metric!(QUEUE_DEPTH).set(depth as f64);
    }
    fn inc_enqueue_rejected(&self) {
        get_metric!(QUEUE_ENQUEUE_REJECTED_TOTAL).inc();
    }
    fn inc_expired(&self, count: u64) {
        get_metric!(QUEUE_EXPIRED_TOTAL).inc_by(count);
    }
}

impl SuperblockMetricsSink for PrometheusSink {
    fn inc_periods_sealed(&self) {
        get_metric!(SUPERBLOCK_PERIODS_SEALED_TOTAL).inc();
    }
    fn inc_superblocks_published(&self) {
        get_metric!(SUPERBLOCK_PUBLISHED_TOTAL).inc();
    }
    fn inc_publish_failures(&self) {
        get_metric!(SUPERBLOCK_PUBLISH_FAILURES_TOTAL).inc();
    }
    fn inc_rollbacks(&self) {
        get_metric!(SUPERBLOCK_ROLLBACKS_TOTAL).inc();
    }
    fn observe_proof_collection_seconds(&self, duration_secs: f64) {
        get_metric!(SUPERBLOCK_PROOF_COLLECTION_SECONDS).observe(duration_secs);
    }
}

/// Registers every collector against the default registry. Must be called
/// exactly once before `sinks::metrics()` is used.
#[allow(clippy::expect_used)]
pub fn install() -> Result<&'static dyn MetricsSink, prometheus::Error> {
    NET_CONNECTIONS_ACCEPTED_TOTAL
        .set(register_int_counter!(
            "sp_net_connections_accepted_total",
            "Total inbound sequencer connections accepted."
        )?)
        .expect("static already initialized");
    NET_CONNECTIONS_REJECTED_TOTAL
        .set(register_int_counter_vec!(
            "sp_net_connections_rejected_total",
            "Total inbound connections rejected, by reason.",
            &["reason"]
        )?)
        .expect("static already initialized");
    NET_CONNECTED_PEERS
        .set(register_gauge!(
            "sp_net_connected_peers",
            "Current number of authenticated sequencer connections."
        )?)
        .expect("static already initialized");
    NET_HANDSHAKE_FAILURES_TOTAL
        .set(register_int_counter_vec!(
            "sp_net_handshake_failures_total",
            "Total handshake failures, by reason.",
            &["reason"]
        )?)
        .expect("static already initialized");

    CONSENSUS_INSTANCES_STARTED_TOTAL
        .set(register_int_counter!(
            "sp_consensus_instances_started_total",
            "Total 2PC instances started."
        )?)
        .expect("static already initialized");
    CONSENSUS_DECISIONS_TOTAL
        .set(register_int_counter_vec!(
            "sp_consensus_decisions_total",
            "Total 2PC decisions reached, by outcome.",
            &["outcome"]
        )?)
        .expect("static already initialized");
    CONSENSUS_TIMEOUTS_TOTAL
        .set(register_int_counter!(
            "sp_consensus_timeouts_total",
            "Total 2PC instances aborted by timeout."
        )?)
        .expect("static already initialized");
    CONSENSUS_CONFLICTING_VOTES_TOTAL
        .set(register_int_counter!(
            "sp_consensus_conflicting_votes_total",
            "Total votes rejected as conflicting with a prior vote."
        )?)
        .expect("static already initialized");

    QUEUE_DEPTH
        .set(register_gauge!(
            "sp_queue_depth",
            "Current number of pending cross-transaction requests."
        )?)
        .expect("static already initialized");
    QUEUE_ENQUEUE_REJECTED_TOTAL
        .set(register_int_counter!(
            "sp_queue_enqueue_rejected_total",
            "Total enqueue attempts rejected because the queue was full."
        )?)
        .expect("static already initialized");
    QUEUE_EXPIRED_TOTAL
        .set(register_int_counter!(
            "sp_queue_expired_total",
            "Total queued requests swept for exceeding their expiration."
        )?)
        .expect("static already initialized");

    SUPERBLOCK_PERIODS_SEALED_TOTAL
        .set(register_int_counter!(
            "sp_superblock_periods_sealed_total",
            "Total periods that reached seal cutover."
        )?)
        .expect("static already initialized");
    SUPERBLOCK_PUBLISHED_TOTAL
        .set(register_int_counter!(
            "sp_superblock_published_total",
            "Total superblocks successfully published to L1."
        )?)
        .expect("static already initialized");
    SUPERBLOCK_PUBLISH_FAILURES_TOTAL
        .set(register_int_counter!(
            "sp_superblock_publish_failures_total",
            "Total superblocks that exhausted publish retries."
        )?)
        .expect("static already initialized");
    SUPERBLOCK_ROLLBACKS_TOTAL
        .set(register_int_counter!(
            "sp_superblock_rollbacks_total",
            "Total periods rolled back."
        )?)
        .expect("static already initialized");
    SUPERBLOCK_PROOF_COLLECTION_SECONDS
        .set(register_histogram!(
            "sp_superblock_proof_collection_seconds",
            "Wall-clock time from period seal to every chain's proof collected.",
            exponential_buckets(0.5, 2.0, 12)?
        )?)
        .expect("static already initialized");

    static SINK: PrometheusSink = PrometheusSink;
    Ok(&SINK)
}
