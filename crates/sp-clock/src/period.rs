//! The period runner: fires a callback at each period boundary, catching
//! up on any periods skipped while the process was down before resuming
//! real-time cadence (§4.6).

use crate::slot::SlotClock;
use sp_types::{PeriodConfig, PeriodInfo};
use std::time::{Duration, SystemTime};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Pure period math built on top of a [`SlotClock`]. Kept separate from
/// [`PeriodRunner`] so the catch-up logic can be unit-tested without
/// waiting on a real clock.
#[derive(Clone, Copy, Debug)]
pub struct PeriodClock {
    slot_clock: SlotClock,
    period_config: PeriodConfig,
}

impl PeriodClock {
    pub fn new(slot_clock: SlotClock, period_config: PeriodConfig) -> Self {
        Self {
            slot_clock,
            period_config,
        }
    }

    pub fn period_id_for_slot(&self, slot: u64) -> Option<u64> {
        if slot == 0 {
            None
        } else {
            Some((slot - 1) / self.period_config.slots_per_period())
        }
    }

    pub fn period_start_slot(&self, period_id: u64) -> u64 {
        period_id * self.period_config.slots_per_period() + 1
    }

    pub fn period_duration(&self) -> Duration {
        self.slot_clock.config().slot_duration * self.period_config.slots_per_period() as u32
    }

    pub fn period_start_time(&self, period_id: u64) -> SystemTime {
        self.slot_clock.slot_start_time(self.period_start_slot(period_id))
    }

    pub fn period_info(&self, period_id: u64) -> PeriodInfo {
        PeriodInfo {
            period_id,
            started_at: self.period_start_time(period_id),
            duration: self.period_duration(),
        }
    }

    pub fn current_period_id(&self, now: SystemTime) -> Option<u64> {
        self.period_id_for_slot(self.slot_clock.current_slot(now))
    }

    /// Every period that should have fired by `now` but hasn't yet, given
    /// `last_emitted` (`None` if the runner has not emitted anything yet).
    /// Empty before genesis.
    pub fn pending_periods(&self, now: SystemTime, last_emitted: Option<u64>) -> Vec<PeriodInfo> {
        let Some(target) = self.current_period_id(now) else {
            return Vec::new();
        };
        let start = match last_emitted {
            Some(last) if last >= target => return Vec::new(),
            Some(last) => last + 1,
            None => 0,
        };
        (start..=target).map(|id| self.period_info(id)).collect()
    }
}

/// Drives [`PeriodClock`] against the real wall clock, sleeping between
/// boundaries and catching up immediately on resume.
pub struct PeriodRunner {
    clock: PeriodClock,
}

impl PeriodRunner {
    pub fn new(clock: PeriodClock) -> Self {
        Self { clock }
    }

    /// Runs until `cancel` fires, invoking `on_period` once per boundary
    /// (in order, with no gaps, even across downtime).
    pub async fn run<F>(&self, mut on_period: F, cancel: CancellationToken)
    where
        F: FnMut(PeriodInfo) + Send,
    {
        let mut last_emitted: Option<u64> = None;
        loop {
            let pending = self.clock.pending_periods(SystemTime::now(), last_emitted);
            if pending.len() > 1 {
                warn!(count = pending.len(), "catching up on missed period boundaries");
            }
            for info in pending {
                last_emitted = Some(info.period_id);
                debug!(period_id = info.period_id, "period boundary reached");
                on_period(info);
            }

            let next_period_id = last_emitted.map_or(0, |id| id + 1);
            let target_time = self.clock.period_start_time(next_period_id);
            let delay = target_time
                .duration_since(SystemTime::now())
                .unwrap_or(Duration::ZERO);

            tokio::select! {
                _ = cancel.cancelled() => return,
                _ = tokio::time::sleep(delay) => {}
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sp_types::SlotConfig;
    use std::sync::{Arc, Mutex};

    fn period_clock(slot_duration: Duration, slots_per_period: u64) -> (PeriodClock, SystemTime) {
        let genesis = SystemTime::UNIX_EPOCH + Duration::from_secs(1_700_000_000);
        let slot_clock = SlotClock::new(SlotConfig {
            genesis_time: genesis,
            slot_duration,
            seal_cutover: 0.9,
        });
        let period_config = PeriodConfig {
            slots_per_epoch: slots_per_period,
            epochs_per_period: 1,
        };
        (PeriodClock::new(slot_clock, period_config), genesis)
    }

    #[test]
    fn period_start_when_now_equals_genesis_fires_period_zero() {
        let (clock, genesis) = period_clock(Duration::from_secs(1), 4);
        let pending = clock.pending_periods(genesis, None);
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].period_id, 0);
        assert_eq!(pending[0].started_at, genesis);
    }

    #[test]
    fn before_genesis_nothing_is_pending() {
        let (clock, genesis) = period_clock(Duration::from_secs(1), 4);
        let before = genesis - Duration::from_millis(1);
        assert!(clock.pending_periods(before, None).is_empty());
    }

    #[test]
    fn skipped_periods_fire_in_order_on_resume() {
        let (clock, genesis) = period_clock(Duration::from_secs(1), 4);
        // period length = 4s; jump 10s ahead = 2 whole periods have elapsed.
        let now = genesis + Duration::from_secs(10);
        let pending = clock.pending_periods(now, None);
        let ids: Vec<u64> = pending.iter().map(|p| p.period_id).collect();
        assert_eq!(ids, vec![0, 1, 2]);
    }

    #[test]
    fn already_caught_up_emits_nothing_more() {
        let (clock, genesis) = period_clock(Duration::from_secs(1), 4);
        let now = genesis + Duration::from_secs(10);
        assert!(clock.pending_periods(now, Some(2)).is_empty());
    }

    #[tokio::test]
    async fn runner_emits_genesis_period_promptly_and_then_cancels() {
        // Genesis pinned just behind the real wall clock so the first
        // iteration fires immediately without a multi-year catch-up sweep.
        let genesis = SystemTime::now() - Duration::from_millis(5);
        let slot_clock = SlotClock::new(SlotConfig {
            genesis_time: genesis,
            slot_duration: Duration::from_millis(20),
            seal_cutover: 0.9,
        });
        let clock = PeriodClock::new(
            slot_clock,
            PeriodConfig {
                slots_per_epoch: 2,
                epochs_per_period: 1,
            },
        );
        let seen = Arc::new(Mutex::new(Vec::new()));
        let seen2 = seen.clone();
        let cancel = CancellationToken::new();
        let cancel2 = cancel.clone();

        let runner = PeriodRunner::new(clock);
        let handle = tokio::spawn(async move {
            runner
                .run(
                    move |info| {
                        seen2.lock().unwrap().push(info.period_id);
                    },
                    cancel2,
                )
                .await;
        });

        tokio::time::sleep(Duration::from_millis(50)).await;
        cancel.cancel();
        handle.await.unwrap();

        let seen = seen.lock().unwrap();
        assert!(!seen.is_empty());
        assert_eq!(seen[0], 0);
        assert!(seen.windows(2).all(|w| w[1] == w[0] + 1));
    }
}
