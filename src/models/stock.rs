use crate::models::table::{Cell, Column, RawTable};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize, Serializer};
use std::collections::BTreeMap;

/// Canonical column names, as the provider labels its fields
pub mod columns {
    pub const DATE: &str = "Date";
    pub const OPEN: &str = "Open";
    pub const HIGH: &str = "High";
    pub const LOW: &str = "Low";
    pub const CLOSE: &str = "Close";
    pub const ADJ_CLOSE: &str = "Adj Close";
    pub const VOLUME: &str = "Volume";
    pub const DAILY_RETURN: &str = "Daily_Return";
    pub const MA_7: &str = "MA_7";
    pub const VOLATILITY: &str = "Volatility";

    pub const DERIVED: [&str; 3] = [DAILY_RETURN, MA_7, VOLATILITY];
}

pub const DATE_FORMAT: &str = "%Y-%m-%d";

fn serialize_date<S: Serializer>(date: &NaiveDate, serializer: S) -> std::result::Result<S::Ok, S::Error> {
    serializer.serialize_str(&date.format(DATE_FORMAT).to_string())
}

/// 日线数据 + 衍生指标
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DerivedRecord {
    #[serde(rename = "Date", serialize_with = "serialize_date")]
    pub date: NaiveDate,
    #[serde(rename = "Open")]
    pub open: f64,
    #[serde(rename = "High")]
    pub high: Option<f64>,
    #[serde(rename = "Low")]
    pub low: Option<f64>,
    #[serde(rename = "Close")]
    pub close: f64,
    #[serde(rename = "Volume")]
    pub volume: Option<i64>,
    /// Pass-through columns such as `Adj Close`
    #[serde(flatten)]
    pub extra: BTreeMap<String, Cell>,
    #[serde(rename = "Daily_Return")]
    pub daily_return: Option<f64>,
    #[serde(rename = "MA_7")]
    pub ma_7: Option<f64>,
    #[serde(rename = "Volatility")]
    pub volatility: Option<f64>,
}

impl DerivedRecord {
    fn cell(&self, column: &str) -> Cell {
        match column {
            columns::DATE => Cell::Text(self.date.format(DATE_FORMAT).to_string()),
            columns::OPEN => Cell::Float(self.open),
            columns::HIGH => self.high.into(),
            columns::LOW => self.low.into(),
            columns::CLOSE => Cell::Float(self.close),
            columns::VOLUME => self.volume.into(),
            columns::DAILY_RETURN => self.daily_return.into(),
            columns::MA_7 => self.ma_7.into(),
            columns::VOLATILITY => self.volatility.into(),
            other => self.extra.get(other).cloned().unwrap_or(Cell::Null),
        }
    }
}

/// Cleaned, chronologically ordered price series for one symbol.
///
/// Dates are unique and strictly increasing. `columns` records which
/// columns the source actually carried, so reporting can tell an absent
/// `High` apart from a present one.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PriceTable {
    columns: Vec<String>,
    records: Vec<DerivedRecord>,
}

impl PriceTable {
    pub fn new(columns: Vec<String>, records: Vec<DerivedRecord>) -> Self {
        Self { columns, records }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c == name)
    }

    pub fn records(&self) -> &[DerivedRecord] {
        &self.records
    }

    pub fn into_records(self) -> Vec<DerivedRecord> {
        self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// The last `n` records, still in ascending date order.
    pub fn tail(&self, n: usize) -> &[DerivedRecord] {
        let start = self.records.len().saturating_sub(n);
        &self.records[start..]
    }

    /// Flat-header raw form of this table, suitable for re-processing.
    pub fn to_raw(&self) -> RawTable {
        self.columns.iter().fold(RawTable::new(), |table, name| {
            let values = self.records.iter().map(|r| r.cell(name)).collect();
            table.with_column(Column::flat(name, values))
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    #[serde(rename = "52_week_high")]
    pub week_52_high: Option<f64>,
    #[serde(rename = "52_week_low")]
    pub week_52_low: Option<f64>,
    pub average_close: Option<f64>,
}

impl Summary {
    pub fn empty() -> Self {
        Self {
            week_52_high: None,
            week_52_low: None,
            average_close: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Performer {
    #[serde(rename = "stock_1")]
    Stock1,
    #[serde(rename = "stock_2")]
    Stock2,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comparison {
    pub stock_1_avg_return: Option<f64>,
    pub stock_2_avg_return: Option<f64>,
    pub better_performer: Option<Performer>,
}

impl Comparison {
    pub fn empty() -> Self {
        Self {
            stock_1_avg_return: None,
            stock_2_avg_return: None,
            better_performer: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Company {
    pub symbol: String,
    pub name: String,
}

/// 支持查询的公司列表
pub fn known_companies() -> Vec<Company> {
    [
        ("INFY.NS", "Infosys"),
        ("TCS.NS", "Tata Consultancy Services"),
        ("RELIANCE.NS", "Reliance Industries"),
        ("HDFCBANK.NS", "HDFC Bank"),
    ]
    .iter()
    .map(|(symbol, name)| Company {
        symbol: symbol.to_string(),
        name: name.to_string(),
    })
    .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(day: u32, close: f64) -> DerivedRecord {
        DerivedRecord {
            date: NaiveDate::from_ymd_opt(2024, 3, day).unwrap(),
            open: 100.0,
            high: Some(110.0),
            low: None,
            close,
            volume: Some(1200),
            extra: BTreeMap::from([(columns::ADJ_CLOSE.to_string(), Cell::Float(99.5))]),
            daily_return: Some(0.05),
            ma_7: None,
            volatility: None,
        }
    }

    #[test]
    fn test_record_json_keys() {
        let json = serde_json::to_value(record(4, 105.0)).unwrap();
        assert_eq!(json["Date"], "2024-03-04");
        assert_eq!(json["Open"], 100.0);
        assert_eq!(json["Adj Close"], 99.5);
        assert_eq!(json["Daily_Return"], 0.05);
        assert!(json["MA_7"].is_null());
        assert!(json["Low"].is_null());
        assert_eq!(json["Volume"], 1200);
    }

    #[test]
    fn test_tail_keeps_order() {
        let table = PriceTable::new(
            vec![columns::DATE.into(), columns::CLOSE.into()],
            (1..=5).map(|d| record(d, d as f64)).collect(),
        );
        let tail = table.tail(2);
        assert_eq!(tail.len(), 2);
        assert_eq!(tail[0].close, 4.0);
        assert_eq!(tail[1].close, 5.0);
        assert_eq!(table.tail(50).len(), 5);
    }

    #[test]
    fn test_to_raw_emits_known_columns_only() {
        let table = PriceTable::new(
            vec![columns::DATE.into(), columns::OPEN.into(), columns::ADJ_CLOSE.into()],
            vec![record(1, 101.0)],
        );
        let raw = table.to_raw();
        assert_eq!(raw.column_names(), vec!["Date", "Open", "Adj Close"]);
        assert_eq!(raw.columns[0].values[0], Cell::Text("2024-03-01".into()));
        assert_eq!(raw.columns[2].values[0], Cell::Float(99.5));
    }

    #[test]
    fn test_summary_and_comparison_json() {
        let summary = Summary { week_52_high: Some(12.0), week_52_low: Some(4.0), average_close: Some(8.0) };
        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["52_week_high"], 12.0);
        assert_eq!(json["average_close"], 8.0);

        let json = serde_json::to_value(Comparison::empty()).unwrap();
        assert!(json["better_performer"].is_null());

        let json = serde_json::to_value(Performer::Stock2).unwrap();
        assert_eq!(json, "stock_2");
    }

    #[test]
    fn test_known_companies() {
        let companies = known_companies();
        assert_eq!(companies.len(), 4);
        assert_eq!(companies[0].symbol, "INFY.NS");
        assert_eq!(companies[3].name, "HDFC Bank");
    }
}
