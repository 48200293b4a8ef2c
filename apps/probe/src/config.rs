use std::path::PathBuf;
use std::time::Duration;

pub struct Config {
    pub failover_config_path: PathBuf,
    pub symbols: Vec<String>,
    /// Repeat the fetch on this interval until interrupted; one shot when unset.
    pub watch_interval: Option<Duration>,
    pub user_agent: String,
}

impl Config {
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();
        let failover_config_path = std::env::var("QW_CONFIG")
            .unwrap_or_else(|_| "./quotewatch.json".into())
            .into();
        let symbols = std::env::var("QW_SYMBOLS")
            .unwrap_or_else(|_| "NIFTY,BANKNIFTY".into())
            .split(',')
            .map(|s| s.trim().to_uppercase())
            .filter(|s| !s.is_empty())
            .collect();
        let watch_interval = std::env::var("QW_WATCH_INTERVAL_SECS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs);
        let user_agent = std::env::var("QW_USER_AGENT")
            .unwrap_or_else(|_| format!("quotewatch-probe/{}", env!("CARGO_PKG_VERSION")));
        Self {
            failover_config_path,
            symbols,
            watch_interval,
            user_agent,
        }
    }
}
