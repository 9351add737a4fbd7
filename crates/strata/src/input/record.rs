//! Typed record view over parsed tabular data.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::{Result, StrataError};

/// A single cell in a record.
///
/// Numbers are always finite; the parser maps non-finite input to [`CellValue::Null`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CellValue {
    Null,
    Number(f64),
    Text(String),
}

impl CellValue {
    /// Returns true for the null variant.
    pub fn is_null(&self) -> bool {
        matches!(self, CellValue::Null)
    }

    /// Returns the numeric payload, if any.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            CellValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Canonical string form, used for uniqueness counting and frequency keys.
    pub fn canonical(&self) -> String {
        match self {
            CellValue::Null => "null".to_string(),
            CellValue::Number(n) => format_number(*n),
            CellValue::Text(s) => s.clone(),
        }
    }

    /// Build a cell from an arbitrary JSON value (used by record-array payloads).
    ///
    /// Non-finite numbers collapse to null; booleans and compound values are
    /// carried as their text rendering.
    pub fn from_json(value: &serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => CellValue::Null,
            serde_json::Value::Number(n) => match n.as_f64() {
                Some(f) if f.is_finite() => CellValue::Number(f),
                _ => CellValue::Null,
            },
            serde_json::Value::String(s) => CellValue::Text(s.clone()),
            serde_json::Value::Bool(b) => CellValue::Text(b.to_string()),
            other => CellValue::Text(other.to_string()),
        }
    }
}

/// Format a number without a trailing `.0` for integral values.
fn format_number(n: f64) -> String {
    if n == n.trunc() && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}

/// Read-only random-access view over a sequence of records.
///
/// The column set and order come from the first record and are identical for
/// every row; missing values appear as [`CellValue::Null`].
#[derive(Debug, Clone)]
pub struct RecordView {
    columns: Vec<String>,
    index: IndexMap<String, usize>,
    rows: Vec<Vec<CellValue>>,
}

impl RecordView {
    /// Create a view from pre-shaped rows. Every row must already have one
    /// cell per column.
    pub fn new(columns: Vec<String>, rows: Vec<Vec<CellValue>>) -> Result<Self> {
        if columns.is_empty() {
            return Err(StrataError::EmptyData("no columns".to_string()));
        }
        for (i, row) in rows.iter().enumerate() {
            if row.len() != columns.len() {
                return Err(StrataError::Parse(format!(
                    "row {} has {} cells, expected {}",
                    i,
                    row.len(),
                    columns.len()
                )));
            }
        }
        let index = columns
            .iter()
            .enumerate()
            .map(|(i, c)| (c.clone(), i))
            .collect();
        Ok(Self {
            columns,
            index,
            rows,
        })
    }

    /// Build a view from a sequence of name-to-value records, as delivered by
    /// the compare endpoint. The first record fixes the column set; later
    /// records may omit columns (null) but may not introduce new ones.
    pub fn from_records(records: &[IndexMap<String, serde_json::Value>]) -> Result<Self> {
        let first = records
            .first()
            .ok_or_else(|| StrataError::EmptyData("no records".to_string()))?;

        let columns: Vec<String> = first.keys().cloned().collect();
        let mut rows = Vec::with_capacity(records.len());

        for (i, record) in records.iter().enumerate() {
            for key in record.keys() {
                if !first.contains_key(key) {
                    return Err(StrataError::Parse(format!(
                        "record {} has unknown column '{}'",
                        i, key
                    )));
                }
            }
            let row: Vec<CellValue> = columns
                .iter()
                .map(|col| {
                    record
                        .get(col)
                        .map(CellValue::from_json)
                        .unwrap_or(CellValue::Null)
                })
                .collect();
            rows.push(row);
        }

        Self::new(columns, rows)
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// True when the view holds no records.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Column names in first-record order.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Number of columns.
    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// Iterate the cells of a column in original row order.
    pub fn column_cells(&self, name: &str) -> Option<impl Iterator<Item = &CellValue>> {
        let idx = *self.index.get(name)?;
        Some(self.rows.iter().map(move |row| &row[idx]))
    }

    /// Get a specific cell.
    pub fn cell(&self, row: usize, column: &str) -> Option<&CellValue> {
        let idx = *self.index.get(column)?;
        self.rows.get(row).map(|r| &r[idx])
    }

    /// Build a new view containing only the given row indices, in the order
    /// supplied. Indices must be in bounds.
    pub fn subset(&self, indices: &[usize]) -> Self {
        let rows = indices.iter().map(|&i| self.rows[i].clone()).collect();
        Self {
            columns: self.columns.clone(),
            index: self.index.clone(),
            rows,
        }
    }
}
