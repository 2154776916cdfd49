//! Dispatch Flow
//!
//! Pending queue -> dispatcher -> SQLite ledger -> completion, with the same
//! ledger feeding the balancer's load figures.

use std::sync::Arc;
use std::time::Duration;

use switchboard_core::application::{
    shutdown_channel, CapabilityRegistry, Dispatcher, LoadBalancer, RequestProcessor,
};
use switchboard_core::domain::{AgentType, Category, Priority, QueueItem};
use switchboard_core::port::id_provider::SequentialIdProvider;
use switchboard_core::port::time_provider::mocks::ManualClock;
use switchboard_core::port::{AssignmentLedger, LedgerEntry, LedgerState};
use switchboard_infra_sqlite::{
    create_pool, run_migrations, SqliteAssignmentLedger, SqliteLoadSource,
};

const NOW: i64 = 1_700_000_000_000;

struct Harness {
    processor: Arc<RequestProcessor>,
    ledger: Arc<SqliteAssignmentLedger>,
    dispatcher: Dispatcher,
    clock: Arc<ManualClock>,
}

async fn harness() -> Harness {
    let pool = create_pool(":memory:").await.unwrap();
    run_migrations(&pool).await.unwrap();

    let clock = Arc::new(ManualClock::new(NOW));
    let balancer = Arc::new(LoadBalancer::new(
        Arc::new(CapabilityRegistry::standard()),
        Arc::new(SqliteLoadSource::new(pool.clone())),
    ));
    let processor = Arc::new(RequestProcessor::new(
        balancer,
        clock.clone(),
        Arc::new(SequentialIdProvider::new("req")),
    ));
    let ledger = Arc::new(SqliteAssignmentLedger::new(pool));
    let dispatcher = Dispatcher::new(processor.clone(), ledger.clone(), clock.clone());

    Harness {
        processor,
        ledger,
        dispatcher,
        clock,
    }
}

#[tokio::test]
async fn test_dispatch_respects_capacity_and_completion() {
    let h = harness().await;

    // Consulting capacity is 3
    for i in 0..5 {
        h.processor
            .process_request(
                format!("k{}", i),
                "c1",
                Category::Consulting,
                Priority::Medium,
            )
            .await
            .unwrap();
    }

    let dispatched = h.dispatcher.dispatch_round().await.unwrap();
    assert_eq!(dispatched, 3, "Stops at agent capacity");
    assert_eq!(
        h.ledger
            .count_in_progress(AgentType::Consulting)
            .await
            .unwrap(),
        3
    );
    assert_eq!(h.processor.pending_count(), 2);
    assert!(!h.processor.balancer().is_available(AgentType::Consulting).await);

    h.clock.advance(60_000);
    assert!(h.ledger.record_finished("k0", NOW + 60_000).await.unwrap());
    assert!(h.processor.balancer().is_available(AgentType::Consulting).await);

    assert_eq!(h.dispatcher.dispatch_round().await.unwrap(), 1);
    let k3 = h.ledger.find("k3").await.unwrap().unwrap();
    assert_eq!(k3.state, LedgerState::InProgress);
    assert_eq!(k3.started_at, NOW + 60_000);

    let k0 = h.ledger.find("k0").await.unwrap().unwrap();
    assert_eq!(k0.state, LedgerState::Done);

    println!("✅ Dispatcher fills capacity and refills after completion");
}

#[tokio::test]
async fn test_dispatch_order_follows_priority() {
    let h = harness().await;

    for (id, priority) in [
        ("low", Priority::Low),
        ("high", Priority::High),
        ("urgent", Priority::Urgent),
    ] {
        h.processor
            .process_request(id, "c1", Category::DataAnalysis, priority)
            .await
            .unwrap();
        h.clock.advance(1);
    }

    for expected in ["urgent", "high", "low"] {
        assert!(h.dispatcher.dispatch_once().await.unwrap());
        assert!(
            h.ledger.find(expected).await.unwrap().is_some(),
            "{} should be dispatched next",
            expected
        );
    }
    assert!(!h.dispatcher.dispatch_once().await.unwrap(), "Queue drained");

    println!("✅ Dispatch order is URGENT, HIGH, LOW");
}

#[tokio::test]
async fn test_saturated_agent_keeps_new_work_queued() {
    let h = harness().await;

    // Fill Technical (capacity 5) through the dispatcher
    for i in 0..5 {
        h.processor
            .process_request(format!("t{}", i), "c1", Category::Development, Priority::High)
            .await
            .unwrap();
    }
    assert_eq!(h.dispatcher.dispatch_round().await.unwrap(), 5);
    assert_eq!(h.processor.pending_count(), 0);

    // Pending queue is empty again, so position restarts at 1
    let a = h
        .processor
        .process_request("t5", "c1", Category::Development, Priority::High)
        .await
        .unwrap();
    assert_eq!(a.assigned_agent, AgentType::Technical);
    assert_eq!(a.queue_position, 1);

    // Saturated agent keeps the item queued
    assert_eq!(h.dispatcher.dispatch_round().await.unwrap(), 0);
    assert_eq!(h.processor.pending_count(), 1);

    println!("✅ Saturated agent holds new work in the queue");
}

#[tokio::test]
async fn test_id_already_in_ledger_does_not_starve_the_queue() {
    let h = harness().await;

    // "dup" already ran once; a later pending copy collides on the primary key
    let earlier = QueueItem::new("dup", "c1", Category::Support, Priority::Low, AgentType::Support, NOW);
    h.ledger
        .record_started(&LedgerEntry::started(&earlier, NOW))
        .await
        .unwrap();

    h.processor
        .process_request("dup", "c1", Category::Support, Priority::Urgent)
        .await
        .unwrap();
    h.processor
        .process_request("other", "c1", Category::Content, Priority::Low)
        .await
        .unwrap();

    assert_eq!(h.dispatcher.dispatch_round().await.unwrap(), 1);
    assert!(h.ledger.find("other").await.unwrap().is_some());
    assert_eq!(h.processor.pending_count(), 0, "Colliding item is dropped");

    let dup = h.ledger.find("dup").await.unwrap().unwrap();
    assert_eq!(dup.priority, Priority::Low, "Original ledger row untouched");

    println!("✅ Ledger conflict drops the item instead of blocking others");
}

#[tokio::test]
async fn test_background_loop_dispatches_and_stops() {
    let h = harness().await;
    let dispatcher = Arc::new(h.dispatcher);

    h.processor
        .process_request("bg", "c1", Category::Marketing, Priority::Urgent)
        .await
        .unwrap();

    let (tx, token) = shutdown_channel();
    let runner = dispatcher.clone();
    let handle = tokio::spawn(async move { runner.run(token).await });

    let mut dispatched = false;
    for _ in 0..50 {
        if h.ledger.find("bg").await.unwrap().is_some() {
            dispatched = true;
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    assert!(dispatched, "Background loop should pick up the item");

    tx.shutdown();
    let result = tokio::time::timeout(Duration::from_secs(2), handle)
        .await
        .expect("Dispatcher should stop")
        .expect("Task should not panic");
    assert!(result.is_ok());

    println!("✅ Background dispatcher runs and shuts down cleanly");
}
