use crate::errors::{Result, StockApiError};
use crate::models::stock::{columns, DerivedRecord, PriceTable};
use crate::models::table::{Cell, RawTable};
use crate::util;
use chrono::NaiveDate;
use log::debug;
use std::collections::BTreeMap;

/// Trailing window used for `MA_7` and `Volatility`
pub const WINDOW: usize = 7;

const FIXED_COLUMNS: [&str; 6] = [
    columns::DATE,
    columns::OPEN,
    columns::HIGH,
    columns::LOW,
    columns::CLOSE,
    columns::VOLUME,
];

/// Working copy of a raw table with single-level column names.
#[derive(Debug, Clone)]
struct FlatTable {
    index: Option<(String, Vec<Cell>)>,
    names: Vec<String>,
    columns: Vec<Vec<Cell>>,
}

impl FlatTable {
    fn position(&self, name: &str) -> Option<usize> {
        self.names.iter().position(|n| n == name)
    }

    fn column(&self, name: &str) -> Option<&[Cell]> {
        self.position(name).map(|i| self.columns[i].as_slice())
    }
}

/// A row that survived date parsing, keyed by its position in the source
#[derive(Debug, Clone, Copy)]
struct DatedRow {
    position: usize,
    date: NaiveDate,
}

#[derive(Debug, Clone)]
struct CleanRow {
    date: NaiveDate,
    open: f64,
    high: Option<f64>,
    low: Option<f64>,
    close: f64,
    volume: Option<i64>,
    extra: BTreeMap<String, Cell>,
}

/// Clean a raw provider table and derive `Daily_Return`, `MA_7` and `Volatility`.
///
/// The input is never modified. An empty input yields an empty table;
/// the only error is [`StockApiError::MissingColumn`] when `Open` or
/// `Close` is absent. Rows with unparsable dates or prices are dropped.
pub fn process(raw: &RawTable) -> Result<PriceTable> {
    if raw.is_empty() {
        debug!("Empty input table, skipping processing");
        return Ok(PriceTable::new(raw.column_names(), Vec::new()));
    }

    let table = flatten_headers(raw);
    let table = resolve_date_column(table);
    let dated = parse_dates(&table);
    let rows = coerce_required(&table, &dated)?;
    let rows = sort_chronologically(rows);
    let records = derive_metrics(rows);

    debug!("Processed {} raw rows into {} records", raw.num_rows(), records.len());
    Ok(PriceTable::new(output_columns(&table), records))
}

fn flatten_headers(raw: &RawTable) -> FlatTable {
    if raw.is_multi_level() {
        debug!("Flattening multi-level headers to their first level");
    }
    FlatTable {
        index: raw
            .index
            .as_ref()
            .map(|c| (c.header.flatten(), c.values.clone())),
        names: raw.column_names(),
        columns: raw.columns.iter().map(|c| c.values.clone()).collect(),
    }
}

/// Make sure a column named `Date` exists if anything can serve as one.
///
/// Order: an exact `Date` column, then the promoted index, then the
/// first column (in column order) whose name contains "date" ignoring
/// case. When several columns match only the first one is renamed.
fn resolve_date_column(mut table: FlatTable) -> FlatTable {
    if table.position(columns::DATE).is_some() {
        return table;
    }

    if let Some((name, values)) = table.index.take() {
        let name = if name.is_empty() { "index".to_string() } else { name };
        debug!("Promoting index column {:?} to data column", name);
        table.names.insert(0, name);
        table.columns.insert(0, values);
        if table.position(columns::DATE).is_some() {
            return table;
        }
    }

    if let Some(pos) = table.names.iter().position(|n| n.to_lowercase().contains("date")) {
        debug!("Using column {:?} as {}", table.names[pos], columns::DATE);
        table.names[pos] = columns::DATE.to_string();
    }

    table
}

fn parse_dates(table: &FlatTable) -> Vec<DatedRow> {
    let Some(values) = table.column(columns::DATE) else {
        debug!("No date column found, dropping all rows");
        return Vec::new();
    };

    let rows: Vec<DatedRow> = values
        .iter()
        .enumerate()
        .filter_map(|(position, cell)| util::cell_to_date(cell).map(|date| DatedRow { position, date }))
        .collect();

    if rows.len() < values.len() {
        debug!("Dropped {} rows with unparsable dates", values.len() - rows.len());
    }
    rows
}

fn coerce_required(table: &FlatTable, dated: &[DatedRow]) -> Result<Vec<CleanRow>> {
    let open = table
        .column(columns::OPEN)
        .ok_or_else(|| StockApiError::MissingColumn(columns::OPEN.to_string()))?;
    let close = table
        .column(columns::CLOSE)
        .ok_or_else(|| StockApiError::MissingColumn(columns::CLOSE.to_string()))?;
    let high = table.column(columns::HIGH);
    let low = table.column(columns::LOW);
    let volume = table.column(columns::VOLUME);

    let extra_columns: Vec<(&String, &Vec<Cell>)> = table
        .names
        .iter()
        .zip(&table.columns)
        .filter(|(name, _)| {
            !FIXED_COLUMNS.contains(&name.as_str()) && !columns::DERIVED.contains(&name.as_str())
        })
        .collect();

    let rows: Vec<CleanRow> = dated
        .iter()
        .filter_map(|row| {
            // 列长度不一致时，缺失的单元格按空值处理
            let i = row.position;
            let open = open.get(i).and_then(util::cell_to_f64)?;
            let close = close.get(i).and_then(util::cell_to_f64)?;

            let mut extra = BTreeMap::new();
            for (name, values) in &extra_columns {
                extra
                    .entry((*name).clone())
                    .or_insert_with(|| values.get(i).cloned().unwrap_or(Cell::Null));
            }

            Some(CleanRow {
                date: row.date,
                open,
                high: high.and_then(|c| c.get(i)).and_then(util::cell_to_f64),
                low: low.and_then(|c| c.get(i)).and_then(util::cell_to_f64),
                close,
                volume: volume.and_then(|c| c.get(i)).and_then(util::cell_to_i64),
                extra,
            })
        })
        .collect();

    if rows.len() < dated.len() {
        debug!("Dropped {} rows with non-numeric Open/Close", dated.len() - rows.len());
    }
    Ok(rows)
}

/// Stable ascending sort; a repeated date keeps its last row.
fn sort_chronologically(mut rows: Vec<CleanRow>) -> Vec<CleanRow> {
    rows.sort_by_key(|r| r.date);

    let mut unique: Vec<CleanRow> = Vec::with_capacity(rows.len());
    for row in rows {
        match unique.last_mut() {
            Some(last) if last.date == row.date => *last = row,
            _ => unique.push(row),
        }
    }
    unique
}

fn derive_metrics(rows: Vec<CleanRow>) -> Vec<DerivedRecord> {
    let returns: Vec<Option<f64>> = rows
        .iter()
        .map(|r| {
            let value = (r.close - r.open) / r.open;
            value.is_finite().then_some(value)
        })
        .collect();
    let closes: Vec<Option<f64>> = rows.iter().map(|r| Some(r.close)).collect();

    // 波动率基于未取整的日收益率
    let ma_7 = util::rolling(&closes, WINDOW, util::mean);
    let volatility = util::rolling(&returns, WINDOW, util::sample_std);

    rows.into_iter()
        .zip(returns)
        .zip(ma_7.into_iter().zip(volatility))
        .map(|((row, daily_return), (ma_7, volatility))| DerivedRecord {
            date: row.date,
            open: row.open,
            high: row.high,
            low: row.low,
            close: row.close,
            volume: row.volume,
            extra: row.extra,
            daily_return: daily_return.map(|v| util::round_to(v, 4)),
            ma_7: ma_7.map(|v| util::round_to(v, 2)),
            volatility: volatility.map(|v| util::round_to(v, 4)),
        })
        .collect()
}

fn output_columns(table: &FlatTable) -> Vec<String> {
    let mut names: Vec<String> = Vec::with_capacity(table.names.len() + columns::DERIVED.len());
    for name in table.names.iter().map(String::as_str).chain(columns::DERIVED) {
        if !names.iter().any(|n| n == name) {
            names.push(name.to_string());
        }
    }
    names
}
