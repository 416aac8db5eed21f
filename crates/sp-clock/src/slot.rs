//! Pure slot-math functions of the wall clock (§4.6). No state beyond the
//! immutable config; safe to call from any number of tasks without a lock
//! (§5: "Slot functions are lock-free beyond reading immutable config").

use sp_types::SlotConfig;
use std::time::{Duration, SystemTime};

#[derive(Clone, Copy, Debug)]
pub struct SlotClock {
    config: SlotConfig,
}

impl SlotClock {
    pub fn new(config: SlotConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SlotConfig {
        &self.config
    }

    /// `max(0, floor((now - genesis)/slotDur) + 1)`; slots are 1-indexed
    /// past genesis, 0 before it (§4.6).
    pub fn current_slot(&self, now: SystemTime) -> u64 {
        match now.duration_since(self.config.genesis_time) {
            Ok(elapsed) => {
                (elapsed.as_secs_f64() / self.config.slot_duration.as_secs_f64()).floor() as u64 + 1
            }
            Err(_) => 0,
        }
    }

    /// Wall-clock instant at which slot `slot` (1-indexed) began. Only
    /// meaningful for `slot >= 1`.
    pub fn slot_start_time(&self, slot: u64) -> SystemTime {
        debug_assert!(slot >= 1, "slot 0 has no start time; it precedes genesis");
        self.config.genesis_time + self.config.slot_duration * (slot.saturating_sub(1)) as u32
    }

    /// `min(1, max(0, (now - slotStart)/slotDur))` for the slot containing
    /// `now`. Always `0` before genesis.
    pub fn progress(&self, now: SystemTime) -> f64 {
        let slot = self.current_slot(now);
        if slot == 0 {
            return 0.0;
        }
        let slot_start = self.slot_start_time(slot);
        let elapsed = now
            .duration_since(slot_start)
            .unwrap_or(Duration::ZERO)
            .as_secs_f64();
        (elapsed / self.config.slot_duration.as_secs_f64()).clamp(0.0, 1.0)
    }

    /// `Progress() >= sealCutover` — the slot has entered its sealing
    /// sub-phase.
    pub fn is_seal_time(&self, now: SystemTime) -> bool {
        self.progress(now) >= self.config.seal_cutover
    }

    /// Wall-clock instant of the boundary starting the slot after the one
    /// containing `now`.
    pub fn next_slot_boundary(&self, now: SystemTime) -> SystemTime {
        let slot = self.current_slot(now);
        if slot == 0 {
            self.config.genesis_time
        } else {
            self.slot_start_time(slot + 1)
        }
    }
}
