//! Signal handling for graceful shutdown

use signal_hook_tokio::Signals;
use futures::stream::StreamExt;
use tracing::{info, warn};

/// Wait for SIGTERM or SIGINT, falling back to Ctrl-C if signal registration fails.
/// Never resolves when no shutdown source can be installed.
pub async fn shutdown_signal() {
    let mut signals = match Signals::new([
        signal_hook::consts::SIGTERM,
        signal_hook::consts::SIGINT,
    ]) {
        Ok(signals) => signals,
        Err(e) => {
            warn!("Failed to register signal handlers: {}, waiting for Ctrl-C", e);
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!("Failed to listen for Ctrl-C: {}, running until killed", e);
                std::future::pending::<()>().await;
            }
            return;
        }
    };

    let handle = signals.handle();
    if let Some(signal) = signals.next().await {
        info!("Received signal: {}", signal);
    }
    handle.close();
}
