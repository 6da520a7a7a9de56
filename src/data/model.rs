use std::collections::BTreeSet;
use std::fmt;

use crate::error::{DashboardError, Result};

// ---------------------------------------------------------------------------
// CellValue – a single cell of the table
// ---------------------------------------------------------------------------

/// A dynamically-typed cell value mirroring common spreadsheet dtypes.
/// Used in `BTreeSet`s downstream so `CellValue` must be `Ord`.
#[derive(Debug, Clone)]
pub enum CellValue {
    String(String),
    Integer(i64),
    Float(f64),
    Bool(bool),
    Null,
}

// -- Manual Eq/Ord so we can put CellValue in BTreeSet --
// Equality goes through `cmp` so it agrees with `Hash` on float bits.

impl PartialEq for CellValue {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == std::cmp::Ordering::Equal
    }
}

impl Eq for CellValue {}

impl PartialOrd for CellValue {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for CellValue {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        use CellValue::*;
        fn discriminant(v: &CellValue) -> u8 {
            match v {
                Null => 0,
                Bool(_) => 1,
                Integer(_) => 2,
                Float(_) => 3,
                String(_) => 4,
            }
        }
        let da = discriminant(self);
        let db = discriminant(other);
        if da != db {
            return da.cmp(&db);
        }
        match (self, other) {
            (Null, Null) => std::cmp::Ordering::Equal,
            (Bool(a), Bool(b)) => a.cmp(b),
            (Integer(a), Integer(b)) => a.cmp(b),
            (Float(a), Float(b)) => a.total_cmp(b),
            (String(a), String(b)) => a.cmp(b),
            _ => std::cmp::Ordering::Equal,
        }
    }
}

impl std::hash::Hash for CellValue {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            CellValue::String(s) => s.hash(state),
            CellValue::Integer(i) => i.hash(state),
            CellValue::Float(f) => f.to_bits().hash(state),
            CellValue::Bool(b) => b.hash(state),
            CellValue::Null => {}
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::String(s) => write!(f, "{s}"),
            CellValue::Integer(i) => write!(f, "{i}"),
            CellValue::Float(v) => write!(f, "{v:.4}"),
            CellValue::Bool(b) => write!(f, "{b}"),
            CellValue::Null => write!(f, "<null>"),
        }
    }
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        CellValue::String(s.to_string())
    }
}

impl From<i64> for CellValue {
    fn from(i: i64) -> Self {
        CellValue::Integer(i)
    }
}

impl CellValue {
    /// Guess the type of a raw text field.
    ///
    /// Order matters: integers win over floats so `"30"` stays an integer.
    pub fn guess(s: &str) -> Self {
        if s.is_empty() {
            return CellValue::Null;
        }
        if let Ok(i) = s.parse::<i64>() {
            return CellValue::Integer(i);
        }
        if let Ok(f) = s.parse::<f64>() {
            return CellValue::Float(f);
        }
        if s == "true" || s == "false" {
            return CellValue::Bool(s == "true");
        }
        CellValue::String(s.to_string())
    }

    /// Text written to delimited output. Unlike `Display` this is lossless:
    /// floats keep full precision and a decimal point, nulls are empty.
    ///
    /// Strings are written verbatim and retyped by [`guess`](Self::guess) when
    /// read back, so `String("007")` returns as `Integer(7)` and `String("")`
    /// as `Null`. Cells that came from a parser survive unchanged.
    pub fn to_field(&self) -> String {
        match self {
            CellValue::String(s) => s.clone(),
            CellValue::Integer(i) => i.to_string(),
            CellValue::Float(v) => format!("{v:?}"),
            CellValue::Bool(b) => b.to_string(),
            CellValue::Null => String::new(),
        }
    }

    /// Try to interpret the value as an `f64` for range predicates.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            CellValue::Float(v) => Some(*v),
            CellValue::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, CellValue::Null)
    }
}

// ---------------------------------------------------------------------------
// Record – one row of the table
// ---------------------------------------------------------------------------

static NULL: CellValue = CellValue::Null;

/// One row, with cells positionally aligned to [`Table::columns`].
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub values: Vec<CellValue>,
}

impl Record {
    pub fn new(values: Vec<CellValue>) -> Self {
        Record { values }
    }

    pub fn get(&self, idx: usize) -> &CellValue {
        self.values.get(idx).unwrap_or(&NULL)
    }
}

// ---------------------------------------------------------------------------
// Table – ordered rows over a fixed set of named columns
// ---------------------------------------------------------------------------

/// An ordered sequence of rows sharing one fixed set of named columns.
///
/// Row positions are implicit: a derived table always numbers its rows
/// contiguously from zero.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Table {
    /// Column names in file order.
    pub columns: Vec<String>,
    /// All rows.
    pub rows: Vec<Record>,
}

impl Table {
    /// Build a table, padding short rows with nulls and truncating long ones
    /// so every row has exactly one cell per column.
    pub fn new(columns: Vec<String>, rows: Vec<Record>) -> Self {
        let width = columns.len();
        let rows = rows
            .into_iter()
            .map(|mut r| {
                r.values.resize(width, CellValue::Null);
                r
            })
            .collect();
        Table { columns, rows }
    }

    /// A table with the same columns and the given rows.
    pub fn with_rows(&self, rows: Vec<Record>) -> Self {
        Table {
            columns: self.columns.clone(),
            rows,
        }
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the table has no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Position of a column, or `MissingColumn`.
    pub fn column_index(&self, column: &str) -> Result<usize> {
        self.columns
            .iter()
            .position(|c| c == column)
            .ok_or_else(|| DashboardError::MissingColumn(column.to_string()))
    }

    /// Fail with the first absent column among `required`.
    pub fn require_columns<S: AsRef<str>>(&self, required: &[S]) -> Result<()> {
        for col in required {
            self.column_index(col.as_ref())?;
        }
        Ok(())
    }

    /// Iterate over the values of one column.
    pub fn column_values<'a>(
        &'a self,
        column: &str,
    ) -> Result<impl Iterator<Item = &'a CellValue> + 'a> {
        let idx = self.column_index(column)?;
        Ok(self.rows.iter().map(move |r| r.get(idx)))
    }

    /// Sorted set of distinct values of a column.
    pub fn unique_values(&self, column: &str) -> Result<BTreeSet<CellValue>> {
        Ok(self.column_values(column)?.cloned().collect())
    }

    /// Minimum and maximum of the numeric cells of a column.
    /// Non-numeric cells are skipped; `None` if there are no numeric cells.
    pub fn numeric_bounds(&self, column: &str) -> Result<Option<(f64, f64)>> {
        let bounds = self
            .column_values(column)?
            .filter_map(CellValue::as_f64)
            .filter(|v| !v.is_nan())
            .fold(None, |acc: Option<(f64, f64)>, v| match acc {
                None => Some((v, v)),
                Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
            });
        Ok(bounds)
    }

    /// The first `n` rows.
    pub fn head(&self, n: usize) -> Table {
        self.with_rows(self.rows.iter().take(n).cloned().collect())
    }
}
