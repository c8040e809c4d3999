//! Headless studio client: opens the telemetry feeds, logs connection
//! health periodically, and tears everything down on Ctrl-C.

use studio_sync::application::SyncContext;
use studio_sync::config::AppConfig;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load_validated()?;
    config.logging.init();

    let context = SyncContext::from_config(&config).await?;
    let feeds = context.open_feeds();

    let mut ticker = tokio::time::interval(config.socket.health_log_interval());
    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let health = context.registry.health_status();
                tracing::info!(
                    total = health.total,
                    connected = feeds.connected_count(),
                    all_connected = health.all_connected(),
                    popouts = context.windows.popout_count(),
                    "Connection health"
                );
                for (state, count) in &health.by_state {
                    tracing::debug!(state = %state, count, "Connections by state");
                }
            }
            result = &mut shutdown => {
                if let Err(e) = result {
                    tracing::error!(error = %e, "Failed to listen for ctrl-c");
                }
                break;
            }
        }
    }

    tracing::info!("Shutting down");
    feeds.close(&context.registry);
    context.shutdown();
    Ok(())
}
