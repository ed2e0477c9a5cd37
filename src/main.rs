//! Dynamic Timers - HTTP front end for a replicated timer store
//!
//! This is the main entry point for the dynamic-timers server.

use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;

use dynamic_timers::{
    api::create_router,
    config::Config,
    host::{Host, TokioHost},
    replication::Peer,
    state::{AppState, TimerStore},
    tasks::replication_task,
    utils::shutdown_signal,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::parse();

    // Initialize tracing with appropriate log level
    tracing_subscriber::fmt()
        .with_env_filter(format!("dynamic_timers={},tower_http=info", config.log_level()))
        .init();

    info!("Starting dynamic-timers server v{}", env!("CARGO_PKG_VERSION"));
    info!("Configuration: host={}, port={}, role={:?}, preregistered={}",
          config.host, config.port, config.role, config.timers.len());

    // Create the store, this process's own peer and the board following it
    let host: Arc<dyn Host> = Arc::new(TokioHost::new(config.role));
    let store = TimerStore::new(Arc::clone(&host));
    let peer = Arc::new(Peer::new("local", Arc::clone(&host)));
    let state = Arc::new(AppState::new(store, peer, config.port, config.host.clone()));

    // Feed every published snapshot into the local peer
    let replication_peer = Arc::clone(&state.peer);
    let snapshots = state.store.subscribe();
    tokio::spawn(async move {
        replication_task(replication_peer, snapshots).await;
    });

    if !config.timers.is_empty() {
        state.store.register_many(config.timers.iter().cloned());
        if config.autostart {
            state.store.start_many(config.timers.iter().map(|spec| spec.id.clone()));
        }
    }

    // Create HTTP router with all endpoints
    let app = create_router(Arc::clone(&state));

    // Bind to the specified address
    let addr = config.address();
    let listener = TcpListener::bind(&addr).await?;

    info!("Server running on http://{}", addr);
    info!("Endpoints:");
    info!("  GET    /timers                - Snapshot with remaining times");
    info!("  POST   /timers                - Register a timer");
    info!("  POST   /timers/bulk           - Register many timers");
    info!("  POST   /timers/start|pause|resume - Bulk transitions");
    info!("  POST   /timers/:id/start|pause|resume - Single transitions");
    info!("  DELETE /timers/:id            - Remove a timer");
    info!("  GET    /timers/:id/remaining  - Remaining time query");
    info!("  GET    /board                 - Local countdown board");
    info!("  GET    /events                - Lifecycle event stream (SSE)");
    info!("  GET    /status                - Store and server status");
    info!("  GET    /health                - Health check");

    // Setup graceful shutdown
    let server = axum::serve(listener, app);

    tokio::select! {
        result = server => {
            if let Err(e) = result {
                tracing::error!("Server error: {}", e);
            }
        }
        _ = shutdown_signal() => {
            info!("Shutdown signal received");
        }
    }

    info!("Server shutdown complete");
    Ok(())
}
