//! The seam between the controller and the sequencer-facing transport
//! (§9 "Callbacks / broadcast sink"): the controller only knows it can
//! address one sequencer or all of them, never how that's wired to a
//! socket.

use sp_types::{XtId, XtRequest};

pub trait SuperblockTransport: Send + Sync {
    fn send_start_instance(&self, seq_no: u64, period_id: u64, xt_id: XtId, request: &XtRequest);
    fn broadcast_start_period(&self, period_id: u64, superblock_number: u64);
    fn broadcast_rollback(
        &self,
        period_id: u64,
        last_final_superblock_number: u64,
        last_final_superblock_hash: [u8; 32],
    );
}
