use std::sync::Arc;

use anyhow::{anyhow, Context};
use quotewatch_failover::{
    FailoverConfig, FailoverManager, FetchResult, HttpJsonSource, SourceClient,
};
use serde_json::json;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;

pub fn init_tracing() {
    let log_format = std::env::var("QW_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);

    if log_format.eq_ignore_ascii_case("json") {
        registry
            .with(fmt::layer().json().with_current_span(false))
            .init();
    } else {
        registry
            .with(fmt::layer().with_target(true).with_line_number(true))
            .init();
    }
}

/// Load the failover configuration and wire one HTTP client per source.
pub fn build_manager(config: &Config) -> anyhow::Result<FailoverManager> {
    let failover_config = FailoverConfig::from_path(&config.failover_config_path).with_context(|| {
        format!(
            "loading failover config from {}",
            config.failover_config_path.display()
        )
    })?;
    tracing::info!(
        "Loaded {} source(s) from {}",
        failover_config.sources.len(),
        config.failover_config_path.display()
    );

    let http = reqwest::Client::builder()
        .user_agent(config.user_agent.as_str())
        .build()
        .context("building HTTP client")?;

    let clients = failover_config
        .sources
        .iter()
        .map(|source| {
            let endpoint = source
                .endpoint
                .clone()
                .ok_or_else(|| anyhow!("source '{}' has no endpoint configured", source.name))?;
            Ok(Arc::new(HttpJsonSource::with_client(
                source.name.clone(),
                endpoint,
                http.clone(),
            )) as Arc<dyn SourceClient>)
        })
        .collect::<anyhow::Result<Vec<_>>>()?;

    Ok(FailoverManager::new(failover_config, clients)?)
}

/// One JSON line per fetch result.
pub fn render_result(result: &FetchResult) -> serde_json::Value {
    match result {
        Ok(quote) => json!({ "ok": true, "quote": quote }),
        Err(err) => json!({
            "ok": false,
            "symbol": err.symbol(),
            "code": err.code(),
            "message": err.to_string(),
            "attempts": err.attempts(),
        }),
    }
}

pub async fn fetch_and_report(manager: &FailoverManager, symbols: &[String]) -> anyhow::Result<()> {
    let results = manager.fetch_quotes(symbols).await;
    let failed = results.iter().filter(|r| r.is_err()).count();

    for result in &results {
        println!("{}", serde_json::to_string(&render_result(result))?);
    }
    if failed > 0 {
        tracing::warn!("{}/{} symbol(s) could not be fetched", failed, results.len());
    }

    println!(
        "{}",
        serde_json::to_string_pretty(&json!({ "sources": manager.source_status() }))?
    );
    Ok(())
}
