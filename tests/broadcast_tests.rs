//! Integration tests for the broadcast cycle
mod common;

use std::sync::Arc;
use std::time::Duration;

use buddi::broadcast::{BroadcastEngine, BroadcastError, CycleResult};
use common::{store_at, RecordingTransport};

const A: &str = "+15550000001";
const B: &str = "+15550000002";
const C: &str = "+15550000003";

#[tokio::test]
async fn test_partial_failure_still_succeeds() {
    let (store, clock) = store_at(0);
    let transport = Arc::new(RecordingTransport::default());
    transport.fail_for(B);
    let engine = BroadcastEngine::new(store.clone(), transport.clone());

    store.record_activity(A, "roast");
    store.record_activity(B, "advice");
    clock.advance_millis(10);

    let cycle = engine.record_event_and_broadcast(C, "roast", Some("bob"), "hi").await;
    let outcome = cycle.outcome().unwrap();
    assert!(cycle.is_success());
    assert_eq!(outcome.broadcast_count, 2);
    assert_eq!(outcome.recipients, vec![A.to_string(), B.to_string(), C.to_string()]);
    assert_eq!(transport.sent_to(A), vec!["hi".to_string()]);
    assert_eq!(transport.sent_to(C), vec!["hi".to_string()]);
    // the failed recipient is tried once and never retried
    assert_eq!(transport.attempts_for(B), 1);
    assert!(transport.sent_to(B).is_empty());

    match &cycle {
        CycleResult::Completed { group, .. } => {
            assert!(group.is_group_chat);
            assert_eq!(group.group_size, 3);
            assert_eq!(group.active_members, 3);
        }
        CycleResult::Failed { .. } => panic!("cycle should complete"),
    }

    let stats = engine.stats();
    assert_eq!(stats.cycles, 1);
    assert_eq!(stats.deliveries_succeeded, 2);
    assert_eq!(stats.deliveries_failed, 1);
}

#[tokio::test(start_paused = true)]
async fn test_deliveries_run_concurrently() {
    let (store, _clock) = store_at(0);
    let transport = Arc::new(RecordingTransport::default());
    for recipient in [A, B, C] {
        transport.delay_for(recipient, Duration::from_millis(200));
    }
    transport.fail_for(B);
    let engine = BroadcastEngine::new(store.clone(), transport.clone());

    store.record_activity(A, "roast");
    store.record_activity(B, "roast");

    let started = tokio::time::Instant::now();
    let cycle = engine.record_event_and_broadcast(C, "roast", None, "hi").await;
    let elapsed = started.elapsed();

    // one slow delivery's worth of time, not three
    assert!(elapsed >= Duration::from_millis(200));
    assert!(elapsed < Duration::from_millis(400), "took {:?}", elapsed);
    assert_eq!(cycle.outcome().unwrap().broadcast_count, 2);
    for recipient in [A, B, C] {
        assert_eq!(transport.attempts_for(recipient), 1);
    }
}

#[tokio::test]
async fn test_lone_sender_receives_own_reply() {
    let (store, _clock) = store_at(0);
    let transport = Arc::new(RecordingTransport::default());
    let engine = BroadcastEngine::new(store.clone(), transport.clone());

    let cycle = engine.record_event_and_broadcast(A, "advice", None, "hey").await;
    let outcome = cycle.outcome().unwrap();
    assert_eq!(outcome.broadcast_count, 1);
    assert_eq!(outcome.recipients, vec![A.to_string()]);
    assert!(store.is_active(A));
    assert_eq!(store.get_history(A).len(), 1);
}

#[tokio::test]
async fn test_all_deliveries_failing_is_unsuccessful() {
    let (store, _clock) = store_at(0);
    let transport = Arc::new(RecordingTransport::failing_everyone());
    let engine = BroadcastEngine::new(store.clone(), transport);

    store.record_activity(A, "roast");
    let cycle = engine.record_event_and_broadcast(B, "roast", None, "hi").await;

    let outcome = cycle.outcome().unwrap();
    assert_eq!(outcome.broadcast_count, 0);
    assert!(!outcome.success);
    assert!(!cycle.is_success());
    assert_eq!(engine.stats().failed_cycles, 1);
}

#[tokio::test]
async fn test_empty_sender_is_rejected_before_state_changes() {
    let (store, _clock) = store_at(0);
    let transport = Arc::new(RecordingTransport::default());
    let engine = BroadcastEngine::new(store.clone(), transport.clone());

    let cycle = engine.record_event_and_broadcast("", "roast", None, "hi").await;
    assert_eq!(
        cycle,
        CycleResult::Failed {
            error: BroadcastError::InvalidSender
        }
    );
    assert_eq!(store.stats().active_users, 0);
    assert!(transport.sent().is_empty());
}

#[tokio::test]
async fn test_group_stats_orders_by_recency() {
    let (store, clock) = store_at(0);
    let transport = Arc::new(RecordingTransport::default());
    let engine = BroadcastEngine::new(store.clone(), transport);

    engine.record_event_and_broadcast(A, "roast", None, "1").await;
    clock.advance_millis(5);
    engine.record_event_and_broadcast(B, "advice", None, "2").await;

    let stats = engine.group_stats();
    assert_eq!(stats.active_members, 2);
    assert_eq!(stats.conversation_logs, 2);
    assert_eq!(stats.recent_activity[0].id, B);
    assert_eq!(stats.recent_activity[0].last_command, "advice");
    assert_eq!(stats.recent_activity[1].id, A);
}
