use thiserror::Error;

#[derive(Error, Debug)]
pub enum StockApiError {
    #[error("HTTP request error: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("JSON parsing error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Date parsing error: {0}")]
    DateError(#[from] chrono::ParseError),

    /// `Open` / `Close` 缺失时由处理流水线抛出
    #[error("Missing required column: {0}")]
    MissingColumn(String),

    #[error("Data not available for {symbol}: {reason}")]
    DataUnavailable { symbol: String, reason: String },

    #[error("Fetching {symbol} timed out after {secs}s")]
    Timeout { symbol: String, secs: u64 },

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Unknown error: {0}")]
    Unknown(String),
}

pub type Result<T> = std::result::Result<T, StockApiError>;

// 用于从字符串创建错误
impl From<String> for StockApiError {
    fn from(s: String) -> Self {
        StockApiError::Unknown(s)
    }
}

// 用于从&str创建错误
impl From<&str> for StockApiError {
    fn from(s: &str) -> Self {
        StockApiError::Unknown(s.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = StockApiError::MissingColumn("Open".to_string());
        assert_eq!(err.to_string(), "Missing required column: Open");

        let err = StockApiError::DataUnavailable {
            symbol: "INFY.NS".to_string(),
            reason: "Bad Request".to_string(),
        };
        assert_eq!(err.to_string(), "Data not available for INFY.NS: Bad Request");

        let err = StockApiError::Timeout { symbol: "TCS.NS".to_string(), secs: 30 };
        assert_eq!(err.to_string(), "Fetching TCS.NS timed out after 30s");
    }

    #[test]
    fn test_from_str() {
        let err: StockApiError = "boom".into();
        assert!(matches!(err, StockApiError::Unknown(ref s) if s == "boom"));
    }
}
