//! RPC Round Trip
//!
//! SDK client against a live JSON-RPC server backed by the SQLite ledger.

use std::sync::Arc;

use switchboard_api_rpc::{RpcServer, RpcServerConfig};
use switchboard_core::application::{
    CapabilityRegistry, Dispatcher, LoadBalancer, RequestProcessor,
};
use switchboard_core::port::id_provider::SequentialIdProvider;
use switchboard_core::port::time_provider::mocks::ManualClock;
use switchboard_core::port::AssignmentLedger;
use switchboard_infra_sqlite::{
    create_pool, run_migrations, SqliteAssignmentLedger, SqliteLoadSource,
};
use switchboard_sdk::{QueueListRequest, SdkError, SubmitWorkRequest, SwitchboardClient};

const NOW: i64 = 1_700_000_000_000;
const HOUR: i64 = 3_600_000;

struct Harness {
    client: SwitchboardClient,
    dispatcher: Dispatcher,
    _handle: jsonrpsee::server::ServerHandle,
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
    let ledger: Arc<dyn AssignmentLedger> = Arc::new(SqliteAssignmentLedger::new(pool));

    let server = RpcServer::new(
        RpcServerConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
        },
        processor.clone(),
        ledger.clone(),
        clock.clone(),
    );
    let (addr, handle) = server.start().await.unwrap();

    let client = SwitchboardClient::connect(format!("http://{}", addr))
        .await
        .unwrap();

    Harness {
        client,
        dispatcher: Dispatcher::new(processor, ledger, clock),
        _handle: handle,
    }
}

fn rpc_code(result: switchboard_sdk::Result<impl std::fmt::Debug>) -> i32 {
    match result {
        Err(e @ SdkError::Rpc { .. }) => e.rpc_code().unwrap_or_default(),
        other => panic!("expected an RPC error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_submit_and_list_over_rpc() {
    let h = harness().await;

    let a = h
        .client
        .submit(SubmitWorkRequest::new("acme", "SUPPORT", "MEDIUM"))
        .await
        .unwrap();
    assert_eq!(a.request_id, "req-1");
    assert_eq!(a.assigned_agent, "SUPPORT");
    assert_eq!(a.queue_position, 1);
    assert_eq!(a.estimated_start_at, NOW + 2 * HOUR);

    for priority in ["LOW", "URGENT", "MEDIUM"] {
        h.client
            .submit(SubmitWorkRequest::new("acme", "DATA_ANALYSIS", priority))
            .await
            .unwrap();
    }

    let analytics = h
        .client
        .queue_list(QueueListRequest {
            agent: Some("ANALYTICS".to_string()),
            priority: None,
        })
        .await
        .unwrap();
    let priorities: Vec<_> = analytics.items.iter().map(|i| i.priority.as_str()).collect();
    assert_eq!(priorities, vec!["URGENT", "MEDIUM", "LOW"]);
    assert_eq!(analytics.total_pending, 4);

    let everything = h.client.queue_list(QueueListRequest::default()).await.unwrap();
    assert_eq!(everything.items.len(), 4);

    println!("✅ Submit + queue listing over JSON-RPC");
}

#[tokio::test]
async fn test_validation_errors_over_rpc() {
    let h = harness().await;

    let code = rpc_code(
        h.client
            .submit(SubmitWorkRequest::new("acme", "ASTROLOGY", "LOW"))
            .await,
    );
    assert_eq!(code, 4000);

    let code = rpc_code(
        h.client
            .submit(SubmitWorkRequest::new("", "SUPPORT", "LOW"))
            .await,
    );
    assert_eq!(code, 4000);

    let code = rpc_code(h.client.cancel("nope").await);
    assert_eq!(code, 4001);

    println!("✅ Bad input rejected with 4000/4001");
}

#[tokio::test]
async fn test_lifecycle_cancel_dispatch_complete() {
    let h = harness().await;

    h.client
        .submit(SubmitWorkRequest::new("acme", "MARKETING", "HIGH").with_request_id("keep"))
        .await
        .unwrap();
    h.client
        .submit(SubmitWorkRequest::new("acme", "MARKETING", "LOW").with_request_id("drop"))
        .await
        .unwrap();

    let duplicate = rpc_code(
        h.client
            .submit(SubmitWorkRequest::new("acme", "MARKETING", "LOW").with_request_id("keep"))
            .await,
    );
    assert_eq!(duplicate, 4002);

    assert!(h.client.cancel("drop").await.unwrap().cancelled);

    assert!(h.dispatcher.dispatch_once().await.unwrap());
    let load = h.client.system_load().await.unwrap();
    assert_eq!(load.total_capacity, 45);
    assert_eq!(load.current_load, 1);
    assert_eq!(load.total_pending, 0);
    let marketing = load.agents.iter().find(|a| a.agent == "MARKETING").unwrap();
    assert_eq!(marketing.current_load, Some(1));

    // In flight: no longer cancellable
    assert_eq!(rpc_code(h.client.cancel("keep").await), 4002);

    let done = h.client.complete("keep").await.unwrap();
    assert_eq!(done.agent, "MARKETING");
    assert_eq!(rpc_code(h.client.complete("keep").await), 4002);

    let load = h.client.system_load().await.unwrap();
    assert_eq!(load.current_load, 0);

    println!("✅ Cancel, dispatch and complete over JSON-RPC");
}

#[tokio::test]
async fn test_agents_listing_over_rpc() {
    let h = harness().await;

    let all = h.client.agents_list(None).await.unwrap();
    assert_eq!(all.agents.len(), 8);
    let capacity: u32 = all.agents.iter().map(|a| a.max_concurrent).sum();
    assert_eq!(capacity, 45);

    let writers = h
        .client
        .agents_list(Some("writing".to_string()))
        .await
        .unwrap();
    assert!(!writers.agents.is_empty());
    assert!(writers.agents.iter().all(|a| a
        .skills
        .iter()
        .any(|s| s.to_lowercase().contains("writing"))));

    println!("✅ Agent directory over JSON-RPC");
}
