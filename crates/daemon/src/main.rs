//! Switchboard Routing Daemon - Main Entry Point
//! JSON-RPC server + dispatcher loop over a SQLite assignment ledger

mod config;
mod simulated_load;

use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use config::{DaemonConfig, LoadSourceKind};
use simulated_load::SimulatedLoadSource;
use switchboard_api_rpc::{RpcServer, RpcServerConfig};
use switchboard_core::application::{
    shutdown_channel, CapabilityRegistry, Dispatcher, LoadBalancer, RequestProcessor,
};
use switchboard_core::port::id_provider::UuidProvider;
use switchboard_core::port::time_provider::SystemTimeProvider;
use switchboard_core::port::{AssignmentLedger, LoadSource};
use switchboard_infra_sqlite::{
    create_pool, run_migrations, SqliteAssignmentLedger, SqliteLoadSource,
};

const VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Initialize logging
    let log_format =
        std::env::var("SWITCHBOARD_LOG_FORMAT").unwrap_or_else(|_| "pretty".to_string());

    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("switchboard=info"))
        .context("Failed to create env filter")?;

    match log_format.as_str() {
        "json" => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt::layer().json())
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt::layer().pretty())
                .init();
        }
    }

    info!("Switchboard daemon v{} starting...", VERSION);

    // 2. Load configuration
    let config = DaemonConfig::from_env()?;
    info!(
        db_path = %config.db_path.display(),
        load_source = ?config.load_source,
        load_timeout_ms = config.load_timeout.as_millis() as u64,
        dispatch = config.dispatch_enabled,
        "Configuration loaded"
    );

    // 3. Initialize database
    if let Some(parent) = config.db_path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    let db_url = config.db_path.to_string_lossy();
    let pool = create_pool(&db_url)
        .await
        .map_err(|e| anyhow::anyhow!("DB pool creation failed: {}", e))?;
    run_migrations(&pool)
        .await
        .map_err(|e| anyhow::anyhow!("Migration failed: {}", e))?;

    // 4. Setup dependencies (DI wiring)
    let time_provider = Arc::new(SystemTimeProvider);
    let registry = Arc::new(CapabilityRegistry::standard());
    let ledger: Arc<dyn AssignmentLedger> = Arc::new(SqliteAssignmentLedger::new(pool.clone()));

    let load_source: Arc<dyn LoadSource> = match config.load_source {
        LoadSourceKind::Sqlite => Arc::new(SqliteLoadSource::new(pool.clone())),
        LoadSourceKind::Simulated => {
            warn!("Using simulated agent load; figures are random");
            Arc::new(SimulatedLoadSource::new(&registry, config.simulated_seed))
        }
    };

    let balancer = Arc::new(LoadBalancer::with_timeout(
        registry.clone(),
        load_source,
        config.load_timeout,
    ));
    let processor = Arc::new(RequestProcessor::new(
        balancer,
        time_provider.clone(),
        Arc::new(UuidProvider),
    ));

    info!(
        agents = registry.list_all().len(),
        total_capacity = registry.total_capacity(),
        default_agent = %registry.default_agent(),
        "Capability registry loaded"
    );

    // 5. Start JSON-RPC server
    let rpc_config = RpcServerConfig {
        host: config.rpc_host.clone(),
        port: config.rpc_port,
    };
    let rpc_server = RpcServer::new(
        rpc_config,
        processor.clone(),
        ledger.clone(),
        time_provider.clone(),
    );
    let (rpc_addr, rpc_handle) = rpc_server
        .start()
        .await
        .map_err(|e| anyhow::anyhow!("RPC server start failed: {}", e))?;

    // 6. Start dispatcher (pending queue -> ledger)
    let (shutdown_tx, shutdown_rx) = shutdown_channel();
    let dispatcher_handle = if config.dispatch_enabled {
        let dispatcher = Dispatcher::new(processor.clone(), ledger, time_provider);
        Some(tokio::spawn(async move {
            if let Err(e) = dispatcher.run(shutdown_rx).await {
                tracing::error!(error = ?e, "Dispatcher failed");
            }
        }))
    } else {
        info!("Dispatcher disabled; items stay queued until cancelled");
        None
    };

    info!(rpc_addr = %rpc_addr, "✅ System ready. Waiting for work...");
    info!("Press Ctrl+C to shutdown");

    // 7. Wait for shutdown signal
    tokio::signal::ctrl_c().await?;

    info!("Shutdown signal received. Exiting gracefully...");

    // 8. Graceful shutdown
    shutdown_tx.shutdown();
    rpc_handle
        .stop()
        .map_err(|e| anyhow::anyhow!("RPC server stop failed: {}", e))?;
    if let Some(handle) = dispatcher_handle {
        let _ = tokio::time::timeout(std::time::Duration::from_secs(5), handle).await;
    }

    let abandoned = processor.pending_count();
    if abandoned > 0 {
        warn!(pending = abandoned, "Pending work items dropped on shutdown");
    }
    pool.close().await;

    info!("Shutdown complete.");

    Ok(())
}
