//! The per-cross-transaction 2PC state machine (§4.4).
//!
//! Lock discipline follows §5 exactly: a registry lock guards lookup and
//! creation only; each instance has its own lock for votes/decision, and
//! the registry lock is always released before an instance lock is taken.
//! The coordinator knows nothing about the transport — it is parameterized
//! by a broadcast callback injected at construction (§9 "Callbacks /
//! broadcast sink"), so it can be driven and unit-tested without a network.

use crate::error::ConsensusError;
use sp_telemetry::sinks::metrics;
use sp_types::{ChainId, Decision, XtId, XtInstance, XtRequest};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::{debug, warn};

/// Called once, exactly when an instance transitions out of `Undecided`.
pub type BroadcastFn = Arc<dyn Fn(XtId, bool) + Send + Sync>;

/// Default per-instance decision deadline (§3).
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(180);
/// Default grace period before a terminal instance is garbage-collected (§3).
pub const DEFAULT_GC_GRACE: Duration = Duration::from_secs(300);

struct Entry {
    instance: Mutex<XtInstance>,
    decided_at: Mutex<Option<Instant>>,
}

pub struct Coordinator {
    registry: Mutex<HashMap<XtId, Arc<Entry>>>,
    broadcast: Mutex<Option<BroadcastFn>>,
    gc_grace: Duration,
}

impl Coordinator {
    pub fn new(gc_grace: Duration) -> Arc<Self> {
        Arc::new(Self {
            registry: Mutex::new(HashMap::new()),
            broadcast: Mutex::new(None),
            gc_grace,
        })
    }

    /// Registers the sink the coordinator calls after reaching a decision
    /// (§4.4 `SetBroadcastCallback`).
    pub async fn set_broadcast_callback(&self, f: BroadcastFn) {
        *self.broadcast.lock().await = Some(f);
    }

    /// Creates a new instance and arms its timeout timer. Fails if `xt_id`
    /// already has an active (or not-yet-GC'd terminal) instance.
    pub async fn start_transaction(
        self: &Arc<Self>,
        xt_id: XtId,
        request: XtRequest,
        timeout: Duration,
    ) -> Result<(), ConsensusError> {
        let mut registry = self.registry.lock().await;
        if registry.contains_key(&xt_id) {
            return Err(ConsensusError::AlreadyActive(xt_id));
        }
        let instance = XtInstance::new(xt_id, request, timeout);
        let entry = Arc::new(Entry {
            instance: Mutex::new(instance),
            decided_at: Mutex::new(None),
        });
        registry.insert(xt_id, entry.clone());
        drop(registry);
        metrics().inc_instances_started();

        let coordinator = self.clone();
        tokio::spawn(async move {
            tokio::time::sleep(timeout).await;
            coordinator.fire_timeout(xt_id, entry).await;
        });

        Ok(())
    }

    async fn fire_timeout(&self, xt_id: XtId, entry: Arc<Entry>) {
        let decided = {
            let mut instance = entry.instance.lock().await;
            if instance.decision != Decision::Undecided {
                None
            } else {
                instance.decision = Decision::Abort;
                Some(false)
            }
        };
        if let Some(commit) = decided {
            debug!(%xt_id, "instance timed out, deciding abort");
            *entry.decided_at.lock().await = Some(Instant::now());
            metrics().inc_timeouts();
            self.notify(xt_id, commit).await;
        }
    }

    /// Records a vote and returns the instance's decision after applying it
    /// (§4.4 decision algorithm, §8 invariants 1-5).
    pub async fn record_vote(
        &self,
        xt_id: XtId,
        chain_id: ChainId,
        vote: bool,
    ) -> Result<Decision, ConsensusError> {
        let entry = {
            let registry = self.registry.lock().await;
            registry
                .get(&xt_id)
                .cloned()
                .ok_or(ConsensusError::InstanceNotFound(xt_id))?
        };

        let outcome = {
            let mut instance = entry.instance.lock().await;

            if instance.decision != Decision::Undecided {
                return Ok(instance.decision);
            }
            if !instance.participants.contains(&chain_id) {
                return Err(ConsensusError::NotParticipant);
            }
            if let Some(&existing) = instance.votes.get(&chain_id) {
                if existing == vote {
                    return Ok(instance.decision);
                }
                metrics().inc_conflicting_votes();
                return Err(ConsensusError::ConflictingVote);
            }

            instance.votes.insert(chain_id, vote);

            if !vote {
                instance.decision = Decision::Abort;
            } else if instance.votes.len() == instance.participants.len() {
                instance.decision = Decision::Commit;
            }

            instance.decision
        };

        if outcome.is_terminal() {
            *entry.decided_at.lock().await = Some(Instant::now());
            self.notify(xt_id, outcome == Decision::Commit).await;
        }

        Ok(outcome)
    }

    async fn notify(&self, xt_id: XtId, commit: bool) {
        metrics().inc_decisions(commit);
        if let Some(cb) = self.broadcast.lock().await.as_ref() {
            cb(xt_id, commit);
        } else {
            warn!(%xt_id, "instance decided with no broadcast callback registered");
        }
    }

    pub async fn get_state(&self, xt_id: XtId) -> Option<Decision> {
        let entry = self.registry.lock().await.get(&xt_id).cloned()?;
        let decision = entry.instance.lock().await.decision;
        Some(decision)
    }

    /// All instances not yet decided.
    pub async fn get_active(&self) -> Vec<XtId> {
        let registry = self.registry.lock().await;
        let mut active = Vec::new();
        for (xt_id, entry) in registry.iter() {
            if entry.instance.lock().await.decision == Decision::Undecided {
                active.push(*xt_id);
            }
        }
        active
    }

    /// All not-yet-decided instances together with the request that opened
    /// them, so a reconnecting sequencer can be replayed `StartInstance`
    /// for each one (§4.3 "Reconnect replay").
    pub async fn active_instances(&self) -> Vec<(XtId, XtRequest)> {
        let registry = self.registry.lock().await;
        let mut active = Vec::new();
        for (xt_id, entry) in registry.iter() {
            let instance = entry.instance.lock().await;
            if instance.decision == Decision::Undecided {
                active.push((*xt_id, instance.request.clone()));
            }
        }
        active
    }

    /// All terminally-decided instances still in the registry (i.e. not yet
    /// garbage-collected), for replaying a `Decided` to a reconnecting
    /// sequencer that may have missed the original broadcast.
    pub async fn recently_decided(&self) -> Vec<(XtId, bool)> {
        let registry = self.registry.lock().await;
        let mut decided = Vec::new();
        for (xt_id, entry) in registry.iter() {
            let instance = entry.instance.lock().await;
            match instance.decision {
                Decision::Commit => decided.push((*xt_id, true)),
                Decision::Abort => decided.push((*xt_id, false)),
                Decision::Undecided => {}
            }
        }
        decided
    }

    /// Force-aborts every undecided instance whose id is in `xt_ids`
    /// (§4.7 rollback: "in-flight 2PC instances in the rolled-back period
    /// are force-aborted").
    pub async fn force_abort(&self, xt_ids: &[XtId]) {
        for &xt_id in xt_ids {
            let entry = self.registry.lock().await.get(&xt_id).cloned();
            let Some(entry) = entry else { continue };
            let decided = {
                let mut instance = entry.instance.lock().await;
                if instance.decision == Decision::Undecided {
                    instance.decision = Decision::Abort;
                    true
                } else {
                    false
                }
            };
            if decided {
                *entry.decided_at.lock().await = Some(Instant::now());
                self.notify(xt_id, false).await;
            }
        }
    }

    /// Removes terminal instances older than `gc_grace` from the registry
    /// (§3 "garbage-collected after a grace period").
    pub async fn gc_sweep(&self) {
        let candidates: Vec<XtId> = {
            let registry = self.registry.lock().await;
            registry.keys().copied().collect()
        };
        let mut to_remove = Vec::new();
        for xt_id in candidates {
            let entry = {
                let registry = self.registry.lock().await;
                match registry.get(&xt_id) {
                    Some(e) => e.clone(),
                    None => continue,
                }
            };
            let decided_at = *entry.decided_at.lock().await;
            if let Some(decided_at) = decided_at {
                if decided_at.elapsed() >= self.gc_grace {
                    to_remove.push(xt_id);
                }
            }
        }
        if !to_remove.is_empty() {
            let mut registry = self.registry.lock().await;
            for xt_id in to_remove {
                registry.remove(&xt_id);
            }
        }
    }

    /// Runs `gc_sweep` on a fixed tick until cancelled by dropping the
    /// returned handle's corresponding task.
    pub async fn gc_loop(self: Arc<Self>, period: Duration, cancel: tokio_util::sync::CancellationToken) {
        let mut ticker = tokio::time::interval(period);
        loop {
            tokio::select! {
                _ = cancel.cancelled() => return,
                _ = ticker.tick() => self.gc_sweep().await,
            }
        }
    }
}
