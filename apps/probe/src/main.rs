mod config;
mod main_lib;

use config::Config;
use main_lib::{build_manager, fetch_and_report, init_tracing};
use quotewatch_failover::CancellationToken;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env();
    init_tracing();
    let manager = build_manager(&config)?;

    let shutdown = CancellationToken::new();
    let monitor = manager.start_health_monitor(shutdown.clone());

    match config.watch_interval {
        None => fetch_and_report(&manager, &config.symbols).await?,
        Some(every) => {
            tracing::info!(
                "Watching {} every {}s, Ctrl-C to stop",
                config.symbols.join(","),
                every.as_secs()
            );
            let mut ticker = tokio::time::interval(every);
            loop {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => break,
                    _ = ticker.tick() => fetch_and_report(&manager, &config.symbols).await?,
                }
            }
        }
    }

    shutdown.cancel();
    monitor.await?;
    Ok(())
}
