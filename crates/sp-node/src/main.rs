//! Entry point for the publisher node: loads configuration, wires the wire
//! protocol, 2PC coordinator, queue, clock, storage, prover client, and
//! superblock controller together, and runs until `ctrl_c`.

mod l1;
mod opts;
mod period_driver;
mod transport;

use clap::Parser;
use l1::LoggingL1Publisher;
use opts::NodeOpts;
use period_driver::PeriodDriver;
use sp_clock::{PeriodClock, PeriodRunner, SlotClock};
use sp_config::Config;
use sp_consensus::Coordinator;
use sp_net::{ConnectionPool, Message, PoolConfig, RouterHandlers};
use sp_queue::XtQueue;
use sp_storage::NullWal;
use sp_superblock::{ProofCollector, SuperblockController};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use transport::PoolTransport;

/// How long to wait for in-flight work to wind down after `ctrl_c` before
/// returning anyway (§5 default shutdown budget).
const SHUTDOWN_GRACE: std::time::Duration = std::time::Duration::from_secs(30);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    sp_telemetry::init::init_tracing()?;

    let opts = NodeOpts::parse();
    let mut config = Config::load(&opts.config)?;
    if let Some(listen_addr) = opts.listen_addr {
        config.server.listen_addr = listen_addr;
    }
    if let Some(metrics_port) = opts.metrics_port {
        config.metrics.port = metrics_port;
    }

    let trusted = config.trusted_set()?;
    tracing::info!(trusted_sequencers = trusted.len(), "loaded configuration");

    match config.node_keypair() {
        Ok(Some(keypair)) => {
            tracing::info!(
                pubkey = %hex::encode(keypair.public_key_compressed()),
                "loaded node identity"
            );
        }
        Ok(None) => {}
        Err(e) => return Err(e.into()),
    }

    let cancel = CancellationToken::new();

    if config.metrics.enabled {
        match sp_telemetry::prometheus::install() {
            Ok(sink) => {
                let _ = sp_telemetry::sinks::SINK.set(sink);
            }
            Err(e) => tracing::warn!(error = %e, "failed to install prometheus metrics"),
        }
        let metrics_addr = format!("0.0.0.0:{}", config.metrics.port).parse()?;
        let metrics_cancel = cancel.clone();
        tokio::spawn(sp_telemetry::http::run_server(metrics_addr, metrics_cancel));
    }

    // §9: WAL is a pluggable durability seam; no default persistent
    // implementation is wired up here since the in-memory coordinator
    // registry is itself a Non-goal boundary for this binary (the crate's
    // FileWal is available for operators who want to enable it).
    let _wal: Arc<dyn sp_storage::WriteAheadLog> = Arc::new(NullWal::default());

    let queue = Arc::new(XtQueue::new(
        config.queue.max_size,
        config.queue.request_expiration(),
    ));
    let coordinator = Coordinator::new(sp_consensus::DEFAULT_GC_GRACE);
    let collector = Arc::new(ProofCollector::new());

    let pool_config = PoolConfig {
        max_connections: config.server.max_connections,
        enforce_trusted: config.auth.enabled,
        ..PoolConfig::default()
    };
    let ping_interval = pool_config.ping_interval;
    let (pool, inbound_rx) = ConnectionPool::new(pool_config, trusted);

    let registered_chains = config.chains.registered_set();
    let transport = Arc::new(PoolTransport::new(pool.clone()));
    let controller = Arc::new(SuperblockController::new(
        queue.clone(),
        coordinator.clone(),
        collector.clone(),
        transport,
        registered_chains,
        config.consensus.timeout(),
        config.queue.max_size,
    ));

    {
        let controller = controller.clone();
        let pool = pool.clone();
        coordinator
            .set_broadcast_callback(Arc::new(move |xt_id, commit| {
                let controller = controller.clone();
                let pool = pool.clone();
                tokio::spawn(async move {
                    controller.on_decision(xt_id, commit).await;
                    pool.broadcast(Message::Decided(sp_net::Decided { xt_id, commit }), None)
                        .await;
                });
            }))
            .await;
    }

    // Replay in-flight and just-decided instances to a sequencer that
    // (re)connects mid-period, so a dropped connection doesn't strand it
    // without a vote request or a decision it missed.
    {
        let coordinator = coordinator.clone();
        let controller = controller.clone();
        let pool_for_closure = pool.clone();
        pool.set_on_connect(Arc::new(move |identity: sp_types::SequencerIdentity| {
            let coordinator = coordinator.clone();
            let controller = controller.clone();
            let pool = pool_for_closure.clone();
            tokio::spawn(async move {
                let period_id = controller.current_period_id().await.unwrap_or(0);
                for (xt_id, xt_request) in coordinator.active_instances().await {
                    let msg = Message::StartInstance(sp_net::StartInstance {
                        instance_id: xt_id,
                        period_id,
                        seq_no: 0,
                        xt_request,
                    });
                    if let Err(e) = pool.send_to(&identity.pubkey, msg).await {
                        tracing::warn!(error = %e, "could not replay in-flight instance to reconnected peer");
                    }
                }
                for (xt_id, commit) in coordinator.recently_decided().await {
                    let msg = Message::Decided(sp_net::Decided { xt_id, commit });
                    if let Err(e) = pool.send_to(&identity.pubkey, msg).await {
                        tracing::warn!(error = %e, "could not replay decision to reconnected peer");
                    }
                }
            });
        }))
        .await;
    }

    let handlers = {
        let queue = queue.clone();
        let coordinator = coordinator.clone();
        let controller = controller.clone();
        RouterHandlers {
            on_xt_request: Box::new(move |from, req| {
                let queue = queue.clone();
                tokio::spawn(async move {
                    if let Err(e) = queue.enqueue(req, from).await {
                        tracing::warn!(error = %e, "rejected xt request");
                    }
                });
            }),
            on_vote: Box::new(move |_from, vote| {
                let coordinator = coordinator.clone();
                tokio::spawn(async move {
                    if let Err(e) = coordinator
                        .record_vote(vote.xt_id, vote.sender_chain_id, vote.vote)
                        .await
                    {
                        tracing::warn!(error = %e, "rejected vote");
                    }
                });
            }),
            on_decided: Box::new(|_, _| {
                tracing::debug!("ignoring inbound Decided; this node only ever sends it");
            }),
            on_circ: Box::new({
                let pool = pool.clone();
                move |_from, circ| {
                    let pool = pool.clone();
                    tokio::spawn(async move {
                        let to = circ.to_pubkey;
                        if let Err(e) = pool.send_to(&to, Message::Circ(circ)).await {
                            tracing::warn!(error = %e, "could not forward circ message");
                        }
                    });
                }
            }),
            on_start_instance: Box::new(|_, _| {
                tracing::debug!("ignoring inbound StartInstance; this node only ever sends it");
            }),
            on_start_period: Box::new(|_, _| {
                tracing::debug!("ignoring inbound StartPeriod; this node only ever sends it");
            }),
            on_rollback: Box::new(|_, _| {
                tracing::debug!("ignoring inbound Rollback; this node only ever sends it");
            }),
            on_block: Box::new(move |_from, block| {
                let controller = controller.clone();
                tokio::spawn(async move {
                    if let Err(e) = controller
                        .submit_block(block.chain_id, block.encoded_block, block.included_xt_ids)
                        .await
                    {
                        tracing::warn!(error = %e, "rejected block submission");
                    }
                });
            }),
        }
    };

    let listener = tokio::net::TcpListener::bind(&config.server.listen_addr).await?;
    tracing::info!(addr = %config.server.listen_addr, "listening for sequencer connections");

    tokio::spawn(pool.clone().serve(listener, cancel.clone()));
    tokio::spawn(pool.clone().reap_loop(ping_interval, cancel.clone()));
    tokio::spawn(sp_net::run_router(inbound_rx, handlers));
    tokio::spawn(
        coordinator
            .clone()
            .gc_loop(sp_consensus::DEFAULT_GC_GRACE, cancel.clone()),
    );

    let prover_client = config
        .proofs
        .enabled
        .then(|| sp_prover_client::ProverClient::new(config.proofs.prover_base_url.clone()));

    let http_state = sp_http::HttpState {
        collector: collector.clone(),
    };
    let http_addr: std::net::SocketAddr = config.server.http_listen_addr.parse()?;
    tokio::spawn(sp_http::run(http_addr, http_state, cancel.clone()));

    let slot_clock = SlotClock::new(config.slot.to_slot_config());
    let period_clock = PeriodClock::new(slot_clock, config.period.to_period_config());
    let driver = PeriodDriver::new(
        controller.clone(),
        period_clock,
        slot_clock,
        Arc::new(LoggingL1Publisher),
        prover_client,
    );
    let runner = PeriodRunner::new(period_clock);
    let runner_cancel = cancel.clone();
    let driver_cancel = runner_cancel.clone();
    tokio::spawn(async move {
        runner
            .run(
                move |info| driver.on_period(info, driver_cancel.clone()),
                runner_cancel,
            )
            .await;
    });

    tokio::signal::ctrl_c().await?;
    tracing::info!("shutdown signal received, draining in-flight work");
    cancel.cancel();
    tokio::time::sleep(SHUTDOWN_GRACE).await;
    Ok(())
}

#[cfg(test)]
mod tests {
    use sp_config::Config;
    use std::io::Write;

    #[test]
    fn loads_a_minimal_config_file_with_overrides_applied() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
            [server]
            listen_addr = "127.0.0.1:9000"

            [chains]
            registered = ["rollup-a", "rollup-b"]
            "#
        )
        .unwrap();

        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.server.listen_addr, "127.0.0.1:9000");
        assert_eq!(config.chains.registered_set().len(), 2);
        assert!(config.metrics.enabled);
    }
}
