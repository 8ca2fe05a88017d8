//! Pomodoro Keeper - A persistent Pomodoro timer with an HTTP control surface
//! 
//! This is the main entry point for the pomodoro-keeper server.

use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;

use pomodoro_keeper::{
    config::Config,
    state::{AppState, CompletionLog, TimerEngine},
    store::FileStore,
    api::create_router,
    tasks::Ticker,
    utils::shutdown_signal,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::parse();

    // Initialize tracing with appropriate log level
    tracing_subscriber::fmt()
        .with_env_filter(format!("pomodoro_keeper={},tower_http=info", config.log_level()))
        .init();

    let durations = config.durations()?;
    let tick = config.tick()?;

    info!("Starting pomodoro-keeper server v{}", env!("CARGO_PKG_VERSION"));
    let store = FileStore::new(config.data_dir());
    info!("Configuration: host={}, port={}, key={}, data_dir={}, durations={}s/{}s/{}s",
          config.host, config.port, config.storage_key, store.data_dir().display(),
          durations.work, durations.short_break, durations.long_break);

    // Build the engine; this restores any session left by a previous run
    let completions = CompletionLog::new();
    let hook_log = completions.clone();
    let engine = Arc::new(
        TimerEngine::builder(config.storage_key.clone())
            .durations(durations)
            .store(Arc::new(store))
            .credit_missed_completions(config.credit_missed)
            .on_complete(move |mode| hook_log.record(mode))
            .build(),
    );
    let restored = engine.state();
    info!("Session {}: mode={}, remaining={}, running={}, completed={}",
          engine.storage_key(), restored.mode, restored.display(),
          restored.is_running, restored.completed_count);

    // Start the polling tick
    let ticker = Ticker::spawn(Arc::clone(&engine), tick);

    let state = Arc::new(AppState::new(engine, completions, config.port, config.host.clone()));
    let app = create_router(state);

    // Bind to the specified address
    let addr = config.address();
    let listener = TcpListener::bind(&addr).await?;

    info!("Server running on http://{}", addr);
    info!("Endpoints:");
    info!("  POST /start       - Start or resume the countdown");
    info!("  POST /pause       - Pause the countdown");
    info!("  POST /reset       - Reset the current mode");
    info!("  POST /mode/:mode  - Switch to work, shortBreak or longBreak");
    info!("  POST /clear       - Forget the stored session");
    info!("  GET  /status      - Current timer state");
    info!("  GET  /health      - Health check");

    // Setup graceful shutdown
    let server = axum::serve(listener, app).with_graceful_shutdown(shutdown_signal());
    if let Err(e) = server.await {
        tracing::error!("Server error: {}", e);
    }

    info!("Shutdown signal received, stopping ticker");
    ticker.shutdown().await;

    info!("Server shutdown complete");
    Ok(())
}
