//! Column-oriented feature storage.
//!
//! Rows are keyed by (ticker, date); every feature column is nullable.
//! `None` marks values that cannot be computed — insufficient history,
//! undefined forward targets. Zero is always a real value, never a
//! placeholder for "missing".

use chrono::NaiveDate;
use ndarray::Array2;
use std::collections::HashMap;
use thiserror::Error;

/// Errors raised by table construction and export.
#[derive(Debug, Error)]
pub enum TableError {
    #[error("column '{0}' already exists")]
    DuplicateColumn(String),

    #[error("column '{name}' has {got} values, table has {expected} rows")]
    LengthMismatch {
        name: String,
        expected: usize,
        got: usize,
    },

    #[error("unknown column '{0}'")]
    UnknownColumn(String),

    #[error("column '{name}' is undefined at row {row}")]
    UndefinedValue { name: String, row: usize },

    #[error("cannot append a table with a different column set")]
    ColumnSetMismatch,

    #[error("row mask has {got} entries, table has {expected} rows")]
    MaskMismatch { expected: usize, got: usize },
}

/// A table of named nullable numeric columns keyed by (ticker, date).
#[derive(Debug, Clone, Default)]
pub struct FeatureTable {
    tickers: Vec<String>,
    dates: Vec<NaiveDate>,
    names: Vec<String>,
    columns: HashMap<String, Vec<Option<f64>>>,
}

impl FeatureTable {
    /// Create an empty table over the given row keys.
    pub fn new(tickers: Vec<String>, dates: Vec<NaiveDate>) -> Self {
        debug_assert_eq!(tickers.len(), dates.len());
        Self {
            tickers,
            dates,
            names: Vec::new(),
            columns: HashMap::new(),
        }
    }

    pub fn n_rows(&self) -> usize {
        self.tickers.len()
    }

    /// Column names in insertion order.
    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn tickers(&self) -> &[String] {
        &self.tickers
    }

    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.contains_key(name)
    }

    /// Add a nullable column.
    pub fn add_column(&mut self, name: &str, values: Vec<Option<f64>>) -> Result<(), TableError> {
        if self.columns.contains_key(name) {
            return Err(TableError::DuplicateColumn(name.to_string()));
        }
        if values.len() != self.n_rows() {
            return Err(TableError::LengthMismatch {
                name: name.to_string(),
                expected: self.n_rows(),
                got: values.len(),
            });
        }
        self.names.push(name.to_string());
        self.columns.insert(name.to_string(), values);
        Ok(())
    }

    /// Add a column with no missing values.
    pub fn add_dense_column(&mut self, name: &str, values: Vec<f64>) -> Result<(), TableError> {
        self.add_column(name, values.into_iter().map(Some).collect())
    }

    pub fn column(&self, name: &str) -> Result<&[Option<f64>], TableError> {
        self.columns
            .get(name)
            .map(|v| v.as_slice())
            .ok_or_else(|| TableError::UnknownColumn(name.to_string()))
    }

    /// Keep only rows where the mask is true.
    pub fn retain_rows(&mut self, keep: &[bool]) -> Result<(), TableError> {
        if keep.len() != self.n_rows() {
            return Err(TableError::MaskMismatch {
                expected: self.n_rows(),
                got: keep.len(),
            });
        }
        self.tickers = filtered(&self.tickers, keep);
        self.dates = filtered(&self.dates, keep);
        for values in self.columns.values_mut() {
            *values = filtered(values, keep);
        }
        Ok(())
    }

    /// Append another table with the identical column set. An empty table
    /// takes the other's columns wholesale, so per-partition blocks can be
    /// folded into one result.
    pub fn append(&mut self, other: FeatureTable) -> Result<(), TableError> {
        if self.n_rows() == 0 && self.names.is_empty() {
            *self = other;
            return Ok(());
        }
        if self.names != other.names {
            return Err(TableError::ColumnSetMismatch);
        }
        self.tickers.extend(other.tickers);
        self.dates.extend(other.dates);
        for (name, values) in other.columns {
            match self.columns.get_mut(&name) {
                Some(col) => col.extend(values),
                None => return Err(TableError::ColumnSetMismatch),
            }
        }
        Ok(())
    }

    /// Export the named columns as a dense row-major matrix. Any remaining
    /// undefined value is an error: callers drop undefined rows first.
    pub fn to_matrix(&self, names: &[String]) -> Result<Array2<f64>, TableError> {
        let cols: Vec<&[Option<f64>]> = names
            .iter()
            .map(|n| self.column(n))
            .collect::<Result<_, _>>()?;

        let mut data = Vec::with_capacity(self.n_rows() * names.len());
        for row in 0..self.n_rows() {
            for (j, col) in cols.iter().enumerate() {
                data.push(col[row].ok_or_else(|| TableError::UndefinedValue {
                    name: names[j].clone(),
                    row,
                })?);
            }
        }

        Array2::from_shape_vec((self.n_rows(), names.len()), data).map_err(|_| {
            TableError::LengthMismatch {
                name: "<matrix>".to_string(),
                expected: self.n_rows() * names.len(),
                got: 0,
            }
        })
    }
}

fn filtered<T: Clone>(values: &[T], keep: &[bool]) -> Vec<T> {
    values
        .iter()
        .zip(keep)
        .filter(|(_, &k)| k)
        .map(|(v, _)| v.clone())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
    }

    fn small_table() -> FeatureTable {
        let mut t = FeatureTable::new(
            vec!["A".to_string(), "A".to_string(), "B".to_string()],
            vec![day(1), day(2), day(1)],
        );
        t.add_column("x", vec![Some(1.0), None, Some(3.0)]).unwrap();
        t.add_dense_column("y", vec![10.0, 20.0, 30.0]).unwrap();
        t
    }

    #[test]
    fn test_add_column_length_checked() {
        let mut t = small_table();
        let err = t.add_column("z", vec![Some(1.0)]).unwrap_err();
        assert!(matches!(err, TableError::LengthMismatch { .. }));
    }

    #[test]
    fn test_duplicate_column_rejected() {
        let mut t = small_table();
        let err = t.add_dense_column("x", vec![0.0, 0.0, 0.0]).unwrap_err();
        assert!(matches!(err, TableError::DuplicateColumn(_)));
    }

    #[test]
    fn test_retain_rows_filters_keys_and_columns() {
        let mut t = small_table();
        t.retain_rows(&[true, false, true]).unwrap();

        assert_eq!(t.n_rows(), 2);
        assert_eq!(t.tickers(), &["A".to_string(), "B".to_string()]);
        assert_eq!(t.column("x").unwrap(), &[Some(1.0), Some(3.0)]);
    }

    #[test]
    fn test_to_matrix_rejects_undefined() {
        let t = small_table();
        let err = t.to_matrix(&["x".to_string()]).unwrap_err();
        assert!(matches!(err, TableError::UndefinedValue { row: 1, .. }));
    }

    #[test]
    fn test_to_matrix_row_major() {
        let mut t = small_table();
        t.retain_rows(&[true, false, true]).unwrap();
        let m = t.to_matrix(&["x".to_string(), "y".to_string()]).unwrap();

        assert_eq!(m.shape(), &[2, 2]);
        assert_eq!(m[[0, 0]], 1.0);
        assert_eq!(m[[0, 1]], 10.0);
        assert_eq!(m[[1, 0]], 3.0);
    }

    #[test]
    fn test_append_requires_same_columns() {
        let mut t = small_table();
        let mut other = FeatureTable::new(vec!["C".to_string()], vec![day(5)]);
        other.add_dense_column("x", vec![9.0]).unwrap();

        let err = t.append(other).unwrap_err();
        assert!(matches!(err, TableError::ColumnSetMismatch));
    }

    #[test]
    fn test_append_into_empty() {
        let mut t = FeatureTable::default();
        t.append(small_table()).unwrap();
        assert_eq!(t.n_rows(), 3);
        assert_eq!(t.names(), &["x".to_string(), "y".to_string()]);
    }
}
