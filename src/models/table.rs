use serde::{Deserialize, Serialize};

/// 原始表格中的单元格
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Cell {
    Null,
    Int(i64),
    Float(f64),
    Text(String),
}

impl From<f64> for Cell {
    fn from(v: f64) -> Self {
        Cell::Float(v)
    }
}

impl From<i64> for Cell {
    fn from(v: i64) -> Self {
        Cell::Int(v)
    }
}

impl From<&str> for Cell {
    fn from(v: &str) -> Self {
        Cell::Text(v.to_string())
    }
}

impl From<String> for Cell {
    fn from(v: String) -> Self {
        Cell::Text(v)
    }
}

impl<T: Into<Cell>> From<Option<T>> for Cell {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Cell::Null)
    }
}

/// Column header as delivered by a data source.
///
/// Providers may label a single-symbol download with a `(field, symbol)`
/// pair; the first level is always the field name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColumnHeader {
    Flat(String),
    Multi(Vec<String>),
}

impl ColumnHeader {
    pub fn flatten(&self) -> String {
        match self {
            ColumnHeader::Flat(name) => name.clone(),
            ColumnHeader::Multi(levels) => levels.first().cloned().unwrap_or_default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub header: ColumnHeader,
    pub values: Vec<Cell>,
}

impl Column {
    pub fn flat(name: &str, values: Vec<Cell>) -> Self {
        Self {
            header: ColumnHeader::Flat(name.to_string()),
            values,
        }
    }

    pub fn multi(levels: &[&str], values: Vec<Cell>) -> Self {
        Self {
            header: ColumnHeader::Multi(levels.iter().map(|s| s.to_string()).collect()),
            values,
        }
    }
}

/// Untyped, column-oriented table as returned by a [`PriceSource`](crate::sources::base::PriceSource).
///
/// Column set and header shape are not guaranteed: the pipeline in
/// [`processing`](crate::services::processing) is responsible for
/// turning this into a [`PriceTable`](crate::models::stock::PriceTable).
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RawTable {
    /// Row labels kept apart from the data columns
    pub index: Option<Column>,
    pub columns: Vec<Column>,
}

impl RawTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_index(mut self, column: Column) -> Self {
        self.index = Some(column);
        self
    }

    pub fn with_column(mut self, column: Column) -> Self {
        self.columns.push(column);
        self
    }

    pub fn num_rows(&self) -> usize {
        self.columns
            .first()
            .or(self.index.as_ref())
            .map(|c| c.values.len())
            .unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.num_rows() == 0
    }

    pub fn is_multi_level(&self) -> bool {
        self.columns
            .iter()
            .any(|c| matches!(c.header, ColumnHeader::Multi(_)))
    }

    pub fn column_names(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.header.flatten()).collect()
    }
}
