use crate::models::table::RawTable;
use crate::errors::Result;
use async_trait::async_trait;

/// Base trait for daily price sources
#[async_trait]
pub trait PriceSource {
    /// Short identifier used in logs
    fn source_name(&self) -> &'static str;

    /// Fetch the trailing daily bars for a symbol.
    /// An unknown symbol yields an empty table rather than an error.
    async fn fetch(&self, symbol: &str) -> Result<RawTable>;
}
