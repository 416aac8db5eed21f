//! Connection pool: accept loop, per-connection reader/writer tasks,
//! broadcast fan-out, liveness pings, and reaping of stale peers (§4.3).
//!
//! Each accepted connection gets its own bounded outbound queue so one slow
//! sequencer can never block delivery to the others; `broadcast` and
//! `send_to` are both best-effort against those queues (§4.3, §5: a full
//! outbound queue drops the connection rather than applying backpressure to
//! the caller).

use crate::error::NetError;
use crate::frame::{read_frame, write_frame, DEFAULT_MAX_FRAME};
use crate::handshake::{server_handshake, DEFAULT_MAX_SKEW};
use crate::wire::Message;
use sp_telemetry::sinks::metrics;
use sp_types::{SequencerIdentity, TrustedSet, PUBKEY_LEN};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{mpsc, Mutex};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Invoked once per newly accepted, non-duplicate connection, after the
/// handshake has verified its identity, so a reconnecting sequencer can be
/// caught up on in-flight state (§4.3, "Reconnect replay").
pub type OnConnect = Arc<dyn Fn(SequencerIdentity) + Send + Sync>;

/// A message delivered by a connected peer, handed off to whatever
/// higher-level component (consensus, queue, superblock controller)
/// owns the corresponding receiver.
#[derive(Debug)]
pub struct Inbound {
    pub from: SequencerIdentity,
    pub message: Message,
}

#[derive(Clone, Debug)]
pub struct PoolConfig {
    /// Maximum simultaneously open connections (§4.3, §6.4 `server.maxConnections`).
    pub max_connections: usize,
    /// Per-connection outbound queue depth before the connection is dropped.
    pub outbound_queue_capacity: usize,
    /// Interval at which an idle writer sends a liveness `Ping`.
    pub ping_interval: Duration,
    /// A connection silent for longer than this is reaped.
    pub liveness_timeout: Duration,
    pub max_frame: u32,
    /// Whether the handshake must additionally verify the peer's pubkey is
    /// in the trusted set (§6.4 `auth.enabled`). The signature check itself
    /// is never skipped.
    pub enforce_trusted: bool,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            max_connections: 1000,
            outbound_queue_capacity: 256,
            ping_interval: Duration::from_secs(5),
            liveness_timeout: Duration::from_secs(20),
            max_frame: DEFAULT_MAX_FRAME,
            enforce_trusted: true,
        }
    }
}

struct Connection {
    identity: SequencerIdentity,
    outbound_tx: mpsc::Sender<Message>,
    last_seen_unix_ms: Arc<AtomicI64>,
    cancel: CancellationToken,
}

/// Owns every live connection to a sequencer, keyed by its verified
/// compressed public key.
pub struct ConnectionPool {
    config: PoolConfig,
    trusted: TrustedSet,
    connections: Mutex<HashMap<[u8; PUBKEY_LEN], Connection>>,
    inbound_tx: mpsc::UnboundedSender<Inbound>,
    on_connect: Mutex<Option<OnConnect>>,
}

fn now_unix_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as i64
}

impl ConnectionPool {
    pub fn new(config: PoolConfig, trusted: TrustedSet) -> (Arc<Self>, mpsc::UnboundedReceiver<Inbound>) {
        let (inbound_tx, inbound_rx) = mpsc::unbounded_channel();
        let pool = Arc::new(Self {
            config,
            trusted,
            connections: Mutex::new(HashMap::new()),
            inbound_tx,
            on_connect: Mutex::new(None),
        });
        (pool, inbound_rx)
    }

    /// Registers the callback fired after a connection's handshake verifies,
    /// replacing any previously set one.
    pub async fn set_on_connect(&self, callback: OnConnect) {
        *self.on_connect.lock().await = Some(callback);
    }

    pub async fn connection_count(&self) -> usize {
        self.connections.lock().await.len()
    }

    pub async fn connected_identities(&self) -> Vec<SequencerIdentity> {
        self.connections
            .lock()
            .await
            .values()
            .map(|c| c.identity.clone())
            .collect()
    }

    /// Runs the accept loop until `cancel` fires. Intended to be spawned as
    /// its own task.
    pub async fn serve(self: Arc<Self>, listener: TcpListener, cancel: CancellationToken) {
        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    info!("connection pool accept loop shutting down");
                    return;
                }
                accepted = listener.accept() => {
                    let (stream, addr) = match accepted {
                        Ok(pair) => pair,
                        Err(e) => {
                            warn!(error = %e, "accept failed");
                            continue;
                        }
                    };
                    if self.connection_count().await >= self.config.max_connections {
                        warn!(%addr, "rejecting connection: pool at max_connections");
                        continue;
                    }
                    let pool = self.clone();
                    let child_cancel = cancel.child_token();
                    tokio::spawn(async move {
                        if let Err(e) = pool.handle_connection(stream, child_cancel).await {
                            debug!(%addr, error = %e, "connection closed");
                        }
                    });
                }
            }
        }
    }

    async fn handle_connection(
        self: Arc<Self>,
        mut stream: TcpStream,
        cancel: CancellationToken,
    ) -> Result<(), NetError> {
        let identity = match server_handshake(
            &mut stream,
            &self.trusted,
            DEFAULT_MAX_SKEW,
            self.config.enforce_trusted,
        )
        .await
        {
            Ok(identity) => identity,
            Err(e) => {
                metrics().inc_handshake_failures(handshake_failure_reason(&e));
                return Err(e.into());
            }
        };

        {
            let mut conns = self.connections.lock().await;
            if conns.contains_key(&identity.pubkey) {
                warn!(identity = %identity, "rejecting duplicate connection for already-connected identity");
                metrics().inc_connections_rejected("duplicate_identity");
                return Err(NetError::Closed);
            }
            let (outbound_tx, outbound_rx) = mpsc::channel(self.config.outbound_queue_capacity);
            let last_seen_unix_ms = Arc::new(AtomicI64::new(now_unix_ms()));
            conns.insert(
                identity.pubkey,
                Connection {
                    identity: identity.clone(),
                    outbound_tx,
                    last_seen_unix_ms: last_seen_unix_ms.clone(),
                    cancel: cancel.clone(),
                },
            );
            let (read_half, write_half) = tokio::io::split(stream);
            let reader_pool = self.clone();
            let reader_identity = identity.clone();
            let reader_cancel = cancel.clone();
            let writer_cancel = cancel.clone();
            let max_frame = self.config.max_frame;
            let ping_interval = self.config.ping_interval;
            tokio::spawn(async move {
                reader_pool
                    .reader_task(read_half, reader_identity, last_seen_unix_ms, max_frame, reader_cancel)
                    .await;
            });
            tokio::spawn(async move {
                writer_task(write_half, outbound_rx, ping_interval, writer_cancel).await;
            });
            metrics().inc_connections_accepted();
            metrics().set_connected_peers(conns.len() as i64);
        }

        info!(identity = %identity, "sequencer connected");
        if let Some(callback) = self.on_connect.lock().await.as_ref() {
            callback(identity);
        }
        Ok(())
    }

    async fn reader_task<R: AsyncRead + Unpin>(
        self: Arc<Self>,
        mut read_half: R,
        identity: SequencerIdentity,
        last_seen_unix_ms: Arc<AtomicI64>,
        max_frame: u32,
        cancel: CancellationToken,
    ) {
        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                frame = read_frame(&mut read_half, max_frame) => {
                    let bytes = match frame {
                        Ok(bytes) => bytes,
                        Err(e) => {
                            debug!(identity = %identity, error = %e, "read failed, dropping connection");
                            break;
                        }
                    };
                    last_seen_unix_ms.store(now_unix_ms(), Ordering::Relaxed);
                    match Message::decode_from_slice(&bytes) {
                        Ok(Message::Ping) | Ok(Message::Pong) => continue,
                        Ok(message) => {
                            let _ = self.inbound_tx.send(Inbound { from: identity.clone(), message });
                        }
                        Err(e) => {
                            debug!(identity = %identity, error = %e, "malformed message, dropping connection");
                            break;
                        }
                    }
                }
            }
        }
        self.remove(&identity.pubkey).await;
    }

    async fn remove(&self, pubkey: &[u8; PUBKEY_LEN]) {
        if let Some(conn) = self.connections.lock().await.remove(pubkey) {
            conn.cancel.cancel();
            info!(identity = %conn.identity, "sequencer disconnected");
            let remaining = self.connections.lock().await.len();
            metrics().set_connected_peers(remaining as i64);
        }
    }

    /// Sends `msg` to every connected sequencer except `exclude`, if given.
    /// A full or closed per-peer queue drops that peer rather than blocking
    /// the broadcaster. Returns the identities sending failed for, so the
    /// caller can decide whether that matters (§4.3).
    pub async fn broadcast(
        &self,
        msg: Message,
        exclude: Option<&[u8; PUBKEY_LEN]>,
    ) -> HashSet<SequencerIdentity> {
        let targets: Vec<(SequencerIdentity, mpsc::Sender<Message>)> = self
            .connections
            .lock()
            .await
            .values()
            .filter(|c| exclude != Some(&c.identity.pubkey))
            .map(|c| (c.identity.clone(), c.outbound_tx.clone()))
            .collect();
        let mut failed = HashSet::new();
        for (identity, tx) in targets {
            if tx.try_send(msg.clone()).is_err() {
                warn!(identity = %identity, "outbound queue full or closed, dropping from broadcast");
                self.remove(&identity.pubkey).await;
                failed.insert(identity);
            }
        }
        failed
    }

    /// Sends `msg` to a single sequencer by its compressed public key.
    pub async fn send_to(&self, pubkey: &[u8; PUBKEY_LEN], msg: Message) -> Result<(), NetError> {
        let tx = {
            let conns = self.connections.lock().await;
            conns
                .get(pubkey)
                .map(|c| c.outbound_tx.clone())
                .ok_or(NetError::Closed)?
        };
        tx.try_send(msg).map_err(|_| NetError::Closed)
    }

    /// Reaps any connection that has not been heard from within
    /// `liveness_timeout`. Intended to be polled periodically by the caller.
    pub async fn reap_stale(&self) {
        let timeout_ms = self.config.liveness_timeout.as_millis() as i64;
        let now = now_unix_ms();
        let stale: Vec<[u8; PUBKEY_LEN]> = self
            .connections
            .lock()
            .await
            .iter()
            .filter(|(_, c)| now - c.last_seen_unix_ms.load(Ordering::Relaxed) > timeout_ms)
            .map(|(pubkey, _)| *pubkey)
            .collect();
        for pubkey in stale {
            warn!(pubkey = %hex::encode(pubkey), "reaping stale connection");
            self.remove(&pubkey).await;
        }
    }

    /// Runs `reap_stale` on a fixed tick until `cancel` fires.
    pub async fn reap_loop(self: Arc<Self>, period: Duration, cancel: CancellationToken) {
        let mut ticker = tokio::time::interval(period);
        loop {
            tokio::select! {
                _ = cancel.cancelled() => return,
                _ = ticker.tick() => self.reap_stale().await,
            }
        }
    }
}

fn handshake_failure_reason(e: &crate::handshake::HandshakeError) -> &'static str {
    use crate::handshake::HandshakeError;
    match e {
        HandshakeError::Io(_) => "io",
        HandshakeError::Decode(_) => "decode",
        HandshakeError::InvalidSignature => "invalid_signature",
        HandshakeError::ClockSkew(_, _) => "clock_skew",
        HandshakeError::Untrusted => "untrusted",
        HandshakeError::Rejected => "rejected",
    }
}

async fn writer_task<W: AsyncWrite + Unpin>(
    mut write_half: W,
    mut outbound_rx: mpsc::Receiver<Message>,
    ping_interval: Duration,
    cancel: CancellationToken,
) {
    let mut ticker = tokio::time::interval(ping_interval);
    loop {
        tokio::select! {
            _ = cancel.cancelled() => return,
            maybe_msg = outbound_rx.recv() => {
                let Some(msg) = maybe_msg else { return };
                if write_frame(&mut write_half, &msg.encode_to_vec()).await.is_err() {
                    return;
                }
            }
            _ = ticker.tick() => {
                if write_frame(&mut write_half, &Message::Ping.encode_to_vec()).await.is_err() {
                    return;
                }
            }
        }
    }
}
