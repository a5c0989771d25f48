use crate::errors::{Result, StockApiError};
use std::time::Duration;

pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8000";
pub const DEFAULT_PROVIDER_URL: &str = "https://query2.finance.yahoo.com";
/// About a century of daily bars; larger windows overflow date arithmetic
pub const MAX_LOOKBACK_DAYS: i64 = 36_500;
pub const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36";

#[derive(Debug, Clone)]
pub struct Config {
    pub bind_addr: String,
    pub fetch_timeout: Duration,
    pub lookback_days: i64,
    pub tail_rows: usize,
    pub provider_base_url: String,
    pub user_agent: String,
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}

impl Config {
    pub fn new() -> Self {
        Self {
            bind_addr: DEFAULT_BIND_ADDR.to_string(),
            fetch_timeout: Duration::from_secs(30),
            lookback_days: 365,
            tail_rows: 30,
            provider_base_url: DEFAULT_PROVIDER_URL.to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }

    /// Load overrides from `STOCK_API_*` environment variables.
    ///
    /// Unset variables keep their defaults; set but unparsable values are
    /// reported as [`StockApiError::ConfigError`].
    pub fn from_env() -> Result<Self> {
        let mut config = Self::new();

        if let Ok(addr) = std::env::var("STOCK_API_ADDR") {
            config = config.with_bind_addr(&addr);
        }
        if let Ok(secs) = std::env::var("STOCK_API_FETCH_TIMEOUT_SECS") {
            config = config.with_fetch_timeout(Duration::from_secs(parse_env("STOCK_API_FETCH_TIMEOUT_SECS", &secs)?));
        }
        if let Ok(days) = std::env::var("STOCK_API_LOOKBACK_DAYS") {
            config = config.with_lookback_days(parse_env("STOCK_API_LOOKBACK_DAYS", &days)?);
        }
        if let Ok(rows) = std::env::var("STOCK_API_TAIL_ROWS") {
            config = config.with_tail_rows(parse_env("STOCK_API_TAIL_ROWS", &rows)?);
        }
        if let Ok(url) = std::env::var("STOCK_API_PROVIDER_URL") {
            config = config.with_provider_base_url(&url);
        }
        if let Ok(agent) = std::env::var("STOCK_API_USER_AGENT") {
            config = config.with_user_agent(&agent);
        }

        config.validate()?;
        Ok(config)
    }

    pub fn with_bind_addr(mut self, addr: &str) -> Self {
        self.bind_addr = addr.to_string();
        self
    }

    pub fn with_fetch_timeout(mut self, timeout: Duration) -> Self {
        self.fetch_timeout = timeout;
        self
    }

    pub fn with_lookback_days(mut self, days: i64) -> Self {
        self.lookback_days = days;
        self
    }

    pub fn with_tail_rows(mut self, rows: usize) -> Self {
        self.tail_rows = rows;
        self
    }

    pub fn with_provider_base_url(mut self, url: &str) -> Self {
        self.provider_base_url = url.trim_end_matches('/').to_string();
        self
    }

    pub fn with_user_agent(mut self, agent: &str) -> Self {
        self.user_agent = agent.to_string();
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.fetch_timeout.is_zero() {
            return Err(StockApiError::ConfigError("fetch timeout must be greater than 0".to_string()));
        }
        if self.lookback_days <= 0 || self.lookback_days > MAX_LOOKBACK_DAYS {
            return Err(StockApiError::ConfigError(format!(
                "lookback days must be between 1 and {}",
                MAX_LOOKBACK_DAYS
            )));
        }
        if self.tail_rows == 0 {
            return Err(StockApiError::ConfigError("tail rows must be greater than 0".to_string()));
        }
        Ok(())
    }
}

fn parse_env<T: std::str::FromStr>(key: &str, value: &str) -> Result<T> {
    value
        .trim()
        .parse::<T>()
        .map_err(|_| StockApiError::ConfigError(format!("invalid value for {}: {:?}", key, value)))
}
