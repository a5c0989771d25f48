use crate::config::Config;
use crate::errors::{Result, StockApiError};
use crate::models::stock::{Comparison, DerivedRecord, PriceTable, Summary};
use crate::services::{processing, reporting};
use crate::sources::base::PriceSource;
use log::{info, warn};
use std::sync::Arc;

/// 股票服务：抓取 -> 清洗 -> 汇总，每个请求独立构建数据表
pub struct StockService {
    config: Config,
    source: Arc<dyn PriceSource + Send + Sync>,
}

impl StockService {
    pub fn new(config: Config, source: Arc<dyn PriceSource + Send + Sync>) -> Self {
        Self { config, source }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Fetch and process one symbol. Only the fetch is time-bounded.
    pub async fn load(&self, symbol: &str) -> Result<PriceTable> {
        info!("Loading {} from {}", symbol, self.source.source_name());

        let raw = tokio::time::timeout(self.config.fetch_timeout, self.source.fetch(symbol))
            .await
            .map_err(|_| {
                warn!("Fetch for {} exceeded {:?}", symbol, self.config.fetch_timeout);
                StockApiError::Timeout {
                    symbol: symbol.to_string(),
                    secs: self.config.fetch_timeout.as_secs(),
                }
            })??;

        let table = processing::process(&raw)?;
        if table.is_empty() {
            warn!("No usable rows for {}", symbol);
        } else {
            info!("Loaded {} records for {}", table.len(), symbol);
        }
        Ok(table)
    }

    /// The most recent `tail_rows` records in ascending date order
    pub async fn recent(&self, symbol: &str) -> Result<Vec<DerivedRecord>> {
        let mut records = self.load(symbol).await?.into_records();
        let start = records.len().saturating_sub(self.config.tail_rows);
        Ok(records.split_off(start))
    }

    pub async fn summary(&self, symbol: &str) -> Result<Summary> {
        let table = self.load(symbol).await?;
        Ok(reporting::summarize(&table))
    }

    pub async fn compare(&self, symbol1: &str, symbol2: &str) -> Result<Comparison> {
        let (first, second) = tokio::try_join!(self.load(symbol1), self.load(symbol2))?;
        Ok(reporting::compare(&first, &second))
    }
}
