use crate::config::Config;
use crate::errors::{Result, StockApiError};
use crate::models::stock::{columns, DATE_FORMAT};
use crate::models::table::{Cell, Column, RawTable};
use crate::sources::base::PriceSource;
use async_trait::async_trait;
use chrono::{DateTime, Duration, FixedOffset, NaiveDate, Utc};
use chrono_tz::Tz;
use log::{debug, info, warn};
use reqwest::{Client, StatusCode, Url};
use serde::Deserialize;

/// Yahoo Finance v8 chart API response.
#[derive(Debug, Deserialize)]
pub struct ChartResponse {
    chart: ChartResult,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    result: Option<Vec<ChartData>>,
    error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
struct ChartError {
    code: String,
    description: String,
}

#[derive(Debug, Deserialize)]
struct ChartData {
    #[serde(default)]
    meta: ChartMeta,
    timestamp: Option<Vec<i64>>,
    #[serde(default)]
    indicators: Indicators,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChartMeta {
    exchange_timezone_name: Option<String>,
    gmtoffset: Option<i32>,
}

#[derive(Debug, Default, Deserialize)]
struct Indicators {
    #[serde(default)]
    quote: Vec<QuoteData>,
    adjclose: Option<Vec<AdjCloseData>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct QuoteData {
    open: Vec<Option<f64>>,
    high: Vec<Option<f64>>,
    low: Vec<Option<f64>>,
    close: Vec<Option<f64>>,
    volume: Vec<Option<f64>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct AdjCloseData {
    adjclose: Vec<Option<f64>>,
}

/// 交易所时区，用于把时间戳换算成交易日
#[derive(Debug, Clone, Copy)]
enum ExchangeZone {
    Named(Tz),
    Offset(FixedOffset),
    Utc,
}

impl ExchangeZone {
    fn from_meta(meta: &ChartMeta) -> Self {
        if let Some(tz) = meta.exchange_timezone_name.as_deref().and_then(|n| n.parse::<Tz>().ok()) {
            return ExchangeZone::Named(tz);
        }
        match meta.gmtoffset.and_then(FixedOffset::east_opt) {
            Some(offset) => ExchangeZone::Offset(offset),
            None => ExchangeZone::Utc,
        }
    }

    fn trading_day(&self, ts: i64) -> Option<NaiveDate> {
        let utc = DateTime::<Utc>::from_timestamp(ts, 0)?;
        Some(match self {
            ExchangeZone::Named(tz) => utc.with_timezone(tz).date_naive(),
            ExchangeZone::Offset(offset) => utc.with_timezone(offset).date_naive(),
            ExchangeZone::Utc => utc.date_naive(),
        })
    }
}

/// Daily bars from Yahoo Finance, one trailing window per request
pub struct YahooSource {
    client: Client,
    base_url: String,
    lookback_days: i64,
}

impl YahooSource {
    pub fn new(config: &Config) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.fetch_timeout)
            .user_agent(config.user_agent.as_str())
            .build()
            .map_err(StockApiError::RequestError)?;

        Ok(Self {
            client,
            base_url: config.provider_base_url.clone(),
            lookback_days: config.lookback_days,
        })
    }

    /// Chart endpoint for `symbol`; the symbol is one percent-encoded path segment
    fn chart_url(&self, symbol: &str) -> Result<Url> {
        let mut url = Url::parse(&self.base_url)
            .map_err(|e| StockApiError::ConfigError(format!("invalid provider url {:?}: {}", self.base_url, e)))?;
        url.path_segments_mut()
            .map_err(|_| StockApiError::ConfigError(format!("provider url cannot be a base: {}", self.base_url)))?
            .pop_if_empty()
            .extend(["v8", "finance", "chart"])
            .push(symbol);
        Ok(url)
    }

    /// `(period1, period2)` unix seconds covering the lookback window ending at `now`
    pub fn window(&self, now: DateTime<Utc>) -> Result<(i64, i64)> {
        let start = Duration::try_days(self.lookback_days)
            .and_then(|span| now.checked_sub_signed(span))
            .ok_or_else(|| StockApiError::ConfigError(format!("lookback of {} days is out of range", self.lookback_days)))?;
        Ok((start.timestamp(), now.timestamp()))
    }

    /// Turn a chart response into a two-level-header table.
    ///
    /// Columns follow the provider's download layout: `(Date, "")`
    /// first, then `(field, symbol)` for `Adj Close`, `Close`, `High`,
    /// `Low`, `Open`, `Volume`. Missing values become [`Cell::Null`] and
    /// are left for the processing pipeline to drop.
    pub fn parse_chart(symbol: &str, resp: ChartResponse) -> Result<RawTable> {
        let data = match resp.chart.result.and_then(|r| r.into_iter().next()) {
            Some(data) => data,
            None => {
                return match resp.chart.error {
                    Some(err) if err.code != "Not Found" => Err(StockApiError::DataUnavailable {
                        symbol: symbol.to_string(),
                        reason: format!("{}: {}", err.code, err.description),
                    }),
                    _ => {
                        warn!("No chart data for {}", symbol);
                        Ok(RawTable::new())
                    }
                };
            }
        };

        let Some(timestamps) = data.timestamp else {
            warn!("No trading days in range for {}", symbol);
            return Ok(RawTable::new());
        };

        let zone = ExchangeZone::from_meta(&data.meta);
        let quote = data.indicators.quote.into_iter().next().unwrap_or_default();
        let adj_close = data
            .indicators
            .adjclose
            .and_then(|v| v.into_iter().next())
            .unwrap_or_default()
            .adjclose;

        let dates: Vec<Cell> = timestamps
            .iter()
            .map(|&ts| {
                zone.trading_day(ts)
                    .map(|d| Cell::Text(d.format(DATE_FORMAT).to_string()))
                    .unwrap_or(Cell::Null)
            })
            .collect();

        let n = timestamps.len();
        let prices = |values: &[Option<f64>]| -> Vec<Cell> {
            (0..n).map(|i| Cell::from(values.get(i).copied().flatten())).collect()
        };
        let volumes: Vec<Cell> = (0..n)
            .map(|i| match quote.volume.get(i).copied().flatten() {
                Some(v) if v.fract() == 0.0 => Cell::Int(v as i64),
                other => other.into(),
            })
            .collect();

        debug!("Parsed {} bars for {}", n, symbol);

        Ok(RawTable::new()
            .with_column(Column::multi(&[columns::DATE, ""], dates))
            .with_column(Column::multi(&[columns::ADJ_CLOSE, symbol], prices(&adj_close)))
            .with_column(Column::multi(&[columns::CLOSE, symbol], prices(&quote.close)))
            .with_column(Column::multi(&[columns::HIGH, symbol], prices(&quote.high)))
            .with_column(Column::multi(&[columns::LOW, symbol], prices(&quote.low)))
            .with_column(Column::multi(&[columns::OPEN, symbol], prices(&quote.open)))
            .with_column(Column::multi(&[columns::VOLUME, symbol], volumes)))
    }
}

#[async_trait]
impl PriceSource for YahooSource {
    fn source_name(&self) -> &'static str {
        "yahoo"
    }

    async fn fetch(&self, symbol: &str) -> Result<RawTable> {
        let (period1, period2) = self.window(Utc::now())?;
        info!("Fetching {} days of daily bars for {}", self.lookback_days, symbol);

        let response = self
            .client
            .get(self.chart_url(symbol)?)
            .query(&[
                ("period1", period1.to_string()),
                ("period2", period2.to_string()),
                ("interval", "1d".to_string()),
                ("includeAdjustedClose", "true".to_string()),
            ])
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;

        if status == StatusCode::NOT_FOUND {
            warn!("Symbol {} not found upstream", symbol);
            return Ok(RawTable::new());
        }

        let chart: ChartResponse = match serde_json::from_str(&text) {
            Ok(chart) => chart,
            Err(_) if !status.is_success() => {
                return Err(StockApiError::DataUnavailable {
                    symbol: symbol.to_string(),
                    reason: format!("HTTP status {}", status),
                });
            }
            Err(e) => return Err(e.into()),
        };

        let table = Self::parse_chart(symbol, chart)?;
        info!("成功获取 {} 条 {} 日线记录", table.num_rows(), symbol);
        Ok(table)
    }
}
