//! Wires `sp_superblock::SuperblockTransport` onto the wire protocol's
//! connection pool. Each trait method is synchronous (the controller never
//! awaits a send), so sends are fire-and-forget tasks onto the pool's
//! async API, mirroring how `Coordinator`'s sync `BroadcastFn` is bridged
//! to the pool elsewhere in this binary.

use sp_net::{ConnectionPool, Message, Rollback, StartInstance, StartPeriod};
use sp_superblock::SuperblockTransport;
use sp_types::{XtId, XtRequest};
use std::sync::Arc;

pub struct PoolTransport {
    pool: Arc<ConnectionPool>,
}

impl PoolTransport {
    pub fn new(pool: Arc<ConnectionPool>) -> Self {
        Self { pool }
    }
}

impl SuperblockTransport for PoolTransport {
    fn send_start_instance(&self, seq_no: u64, period_id: u64, xt_id: XtId, request: &XtRequest) {
        let pool = self.pool.clone();
        let msg = Message::StartInstance(StartInstance {
            instance_id: xt_id,
            period_id,
            seq_no,
            xt_request: request.clone(),
        });
        tokio::spawn(async move {
            pool.broadcast(msg, None).await;
        });
    }

    fn broadcast_start_period(&self, period_id: u64, superblock_number: u64) {
        let pool = self.pool.clone();
        let msg = Message::StartPeriod(StartPeriod {
            period_id,
            superblock_number,
        });
        tokio::spawn(async move {
            pool.broadcast(msg, None).await;
        });
    }

    fn broadcast_rollback(
        &self,
        period_id: u64,
        last_final_superblock_number: u64,
        last_final_superblock_hash: [u8; 32],
    ) {
        let pool = self.pool.clone();
        let msg = Message::Rollback(Rollback {
            period_id,
            last_final_superblock_number,
            last_final_superblock_hash,
        });
        tokio::spawn(async move {
            pool.broadcast(msg, None).await;
        });
    }
}
