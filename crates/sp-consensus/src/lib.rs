//! The two-phase commit coordinator that turns votes from sequencers into
//! irrevocable commit/abort decisions for cross-rollup transactions (§4.4).

pub mod coordinator;
pub mod error;

pub use coordinator::{BroadcastFn, Coordinator, DEFAULT_GC_GRACE, DEFAULT_TIMEOUT};
pub use error::ConsensusError;

#[cfg(test)]
mod tests {
    use super::*;
    use sp_types::{ChainId, Decision, TxGroup, XtRequest};
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    fn sample_request() -> XtRequest {
        XtRequest {
            groups: vec![
                TxGroup {
                    chain_id: ChainId::from("A"),
                    raw_txs: vec![b"tx1".to_vec()],
                },
                TxGroup {
                    chain_id: ChainId::from("B"),
                    raw_txs: vec![b"tx2".to_vec()],
                },
            ],
        }
    }

    fn capturing_sink() -> (BroadcastFn, Arc<Mutex<Vec<(sp_types::XtId, bool)>>>) {
        let captured = Arc::new(Mutex::new(Vec::new()));
        let captured2 = captured.clone();
        let cb: BroadcastFn = Arc::new(move |xt_id, commit| {
            captured2.lock().unwrap().push((xt_id, commit));
        });
        (cb, captured)
    }

    // Scenario A: happy-path commit.
    #[tokio::test]
    async fn scenario_a_happy_path_commit() {
        let coordinator = Coordinator::new(DEFAULT_GC_GRACE);
        let (cb, captured) = capturing_sink();
        coordinator.set_broadcast_callback(cb).await;

        let request = sample_request();
        let xt_id = request.xt_id();
        coordinator
            .start_transaction(xt_id, request, Duration::from_secs(180))
            .await
            .unwrap();

        let d1 = coordinator
            .record_vote(xt_id, ChainId::from("A"), true)
            .await
            .unwrap();
        assert_eq!(d1, Decision::Undecided);

        let d2 = coordinator
            .record_vote(xt_id, ChainId::from("B"), true)
            .await
            .unwrap();
        assert_eq!(d2, Decision::Commit);

        assert_eq!(coordinator.get_state(xt_id).await, Some(Decision::Commit));
        assert_eq!(captured.lock().unwrap().as_slice(), &[(xt_id, true)]);
    }

    // Scenario B: abort on NO, then a late conflicting vote is rejected.
    #[tokio::test]
    async fn scenario_b_abort_on_no_then_conflicting_vote_rejected() {
        let coordinator = Coordinator::new(DEFAULT_GC_GRACE);
        let (cb, captured) = capturing_sink();
        coordinator.set_broadcast_callback(cb).await;

        let request = sample_request();
        let xt_id = request.xt_id();
        coordinator
            .start_transaction(xt_id, request, Duration::from_secs(180))
            .await
            .unwrap();

        coordinator
            .record_vote(xt_id, ChainId::from("A"), true)
            .await
            .unwrap();
        let decision = coordinator
            .record_vote(xt_id, ChainId::from("B"), false)
            .await
            .unwrap();
        assert_eq!(decision, Decision::Abort);
        assert_eq!(captured.lock().unwrap().as_slice(), &[(xt_id, false)]);

        let err = coordinator
            .record_vote(xt_id, ChainId::from("B"), true)
            .await;
        // Once terminal, any vote (even a flip) just replays the decision,
        // it never mutates or errors as a fresh conflict.
        assert_eq!(err, Ok(Decision::Abort));
    }

    // Scenario B-variant: a conflicting vote arriving before the instance is
    // terminal is rejected without mutating state (§8 invariant 5).
    #[tokio::test]
    async fn conflicting_vote_before_decision_is_rejected() {
        let coordinator = Coordinator::new(DEFAULT_GC_GRACE);
        let request = sample_request();
        let xt_id = request.xt_id();
        coordinator
            .start_transaction(xt_id, request, Duration::from_secs(180))
            .await
            .unwrap();

        coordinator
            .record_vote(xt_id, ChainId::from("A"), true)
            .await
            .unwrap();
        let err = coordinator
            .record_vote(xt_id, ChainId::from("A"), false)
            .await
            .unwrap_err();
        assert_eq!(err, ConsensusError::ConflictingVote);
        assert_eq!(
            coordinator.get_state(xt_id).await,
            Some(Decision::Undecided)
        );
    }

    // Scenario C: timeout abort when one participant never votes.
    #[tokio::test(start_paused = true)]
    async fn scenario_c_timeout_abort() {
        let coordinator = Coordinator::new(DEFAULT_GC_GRACE);
        let (cb, captured) = capturing_sink();
        coordinator.set_broadcast_callback(cb).await;

        let request = sample_request();
        let xt_id = request.xt_id();
        let timeout = Duration::from_secs(5);
        coordinator
            .start_transaction(xt_id, request, timeout)
            .await
            .unwrap();

        coordinator
            .record_vote(xt_id, ChainId::from("A"), true)
            .await
            .unwrap();

        tokio::time::advance(timeout + Duration::from_millis(1)).await;
        tokio::task::yield_now().await;

        assert_eq!(coordinator.get_state(xt_id).await, Some(Decision::Abort));
        assert_eq!(captured.lock().unwrap().as_slice(), &[(xt_id, false)]);
    }

    // Scenario D: duplicate StartTransaction for the same xtID is rejected.
    #[tokio::test]
    async fn scenario_d_duplicate_start_transaction_rejected() {
        let coordinator = Coordinator::new(DEFAULT_GC_GRACE);
        let request = sample_request();
        let xt_id = request.xt_id();
        coordinator
            .start_transaction(xt_id, request.clone(), Duration::from_secs(180))
            .await
            .unwrap();

        let err = coordinator
            .start_transaction(xt_id, request, Duration::from_secs(180))
            .await
            .unwrap_err();
        assert_eq!(err, ConsensusError::AlreadyActive(xt_id));
    }

    #[tokio::test]
    async fn vote_from_non_participant_is_rejected() {
        let coordinator = Coordinator::new(DEFAULT_GC_GRACE);
        let request = sample_request();
        let xt_id = request.xt_id();
        coordinator
            .start_transaction(xt_id, request, Duration::from_secs(180))
            .await
            .unwrap();

        let err = coordinator
            .record_vote(xt_id, ChainId::from("stranger-chain"), true)
            .await
            .unwrap_err();
        assert_eq!(err, ConsensusError::NotParticipant);
        assert_eq!(
            coordinator.get_state(xt_id).await,
            Some(Decision::Undecided)
        );
    }

    #[tokio::test]
    async fn repeated_identical_vote_is_a_no_op() {
        let coordinator = Coordinator::new(DEFAULT_GC_GRACE);
        let request = sample_request();
        let xt_id = request.xt_id();
        coordinator
            .start_transaction(xt_id, request, Duration::from_secs(180))
            .await
            .unwrap();

        coordinator
            .record_vote(xt_id, ChainId::from("A"), true)
            .await
            .unwrap();
        let second = coordinator
            .record_vote(xt_id, ChainId::from("A"), true)
            .await
            .unwrap();
        assert_eq!(second, Decision::Undecided);
    }

    #[tokio::test]
    async fn vote_on_unknown_instance_errors() {
        let coordinator = Coordinator::new(DEFAULT_GC_GRACE);
        let bogus = sp_types::XtId([0u8; 32]);
        let err = coordinator
            .record_vote(bogus, ChainId::from("A"), true)
            .await
            .unwrap_err();
        assert_eq!(err, ConsensusError::InstanceNotFound(bogus));
    }

    #[tokio::test]
    async fn force_abort_rolls_back_only_undecided_instances() {
        let coordinator = Coordinator::new(DEFAULT_GC_GRACE);

        let committed_request = sample_request();
        let committed_id = committed_request.xt_id();
        coordinator
            .start_transaction(committed_id, committed_request, Duration::from_secs(180))
            .await
            .unwrap();
        coordinator
            .record_vote(committed_id, ChainId::from("A"), true)
            .await
            .unwrap();
        coordinator
            .record_vote(committed_id, ChainId::from("B"), true)
            .await
            .unwrap();
        assert_eq!(
            coordinator.get_state(committed_id).await,
            Some(Decision::Commit)
        );

        let pending_request = XtRequest {
            groups: vec![TxGroup {
                chain_id: ChainId::from("C"),
                raw_txs: vec![b"tx3".to_vec()],
            }],
        };
        let pending_id = pending_request.xt_id();
        coordinator
            .start_transaction(pending_id, pending_request, Duration::from_secs(180))
            .await
            .unwrap();

        coordinator
            .force_abort(&[committed_id, pending_id])
            .await;

        // Already-decided commit is immutable even under a rollback sweep.
        assert_eq!(
            coordinator.get_state(committed_id).await,
            Some(Decision::Commit)
        );
        assert_eq!(coordinator.get_state(pending_id).await, Some(Decision::Abort));
    }

    #[tokio::test(start_paused = true)]
    async fn gc_sweep_removes_terminal_instances_after_grace() {
        let coordinator = Coordinator::new(Duration::from_secs(1));
        let request = sample_request();
        let xt_id = request.xt_id();
        coordinator
            .start_transaction(xt_id, request, Duration::from_secs(180))
            .await
            .unwrap();
        coordinator
            .record_vote(xt_id, ChainId::from("A"), false)
            .await
            .unwrap();
        assert_eq!(coordinator.get_state(xt_id).await, Some(Decision::Abort));

        tokio::time::advance(Duration::from_secs(2)).await;
        coordinator.gc_sweep().await;

        assert_eq!(coordinator.get_state(xt_id).await, None);
    }
}
