use serde::{Deserialize, Serialize};
use std::time::{Duration, SystemTime};

/// Wall-clock parameters for the slot/period driver (§3, §6.4 `slot.*`).
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct SlotConfig {
    pub genesis_time: SystemTime,
    pub slot_duration: Duration,
    /// In-slot fraction, in `[0, 1]`, past which a slot is "sealing" rather
    /// than "building" (default 0.90).
    pub seal_cutover: f64,
}

impl Default for SlotConfig {
    fn default() -> Self {
        Self {
            genesis_time: SystemTime::now(),
            slot_duration: Duration::from_secs(12),
            seal_cutover: 0.90,
        }
    }
}

/// `period = epochs_per_period * slots_per_epoch` slots (§3, §6.4 `period.*`).
/// Ethereum-style defaults: 32 slots/epoch, 12 s/slot.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct PeriodConfig {
    pub slots_per_epoch: u64,
    pub epochs_per_period: u64,
}

impl Default for PeriodConfig {
    fn default() -> Self {
        Self {
            slots_per_epoch: 32,
            epochs_per_period: 10,
        }
    }
}

impl PeriodConfig {
    pub fn slots_per_period(&self) -> u64 {
        self.slots_per_epoch * self.epochs_per_period
    }
}

/// Emitted by the period runner at each period boundary (§4.6).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PeriodInfo {
    pub period_id: u64,
    pub started_at: SystemTime,
    pub duration: Duration,
}
