use std::borrow::Cow;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised while assembling a [`Dataset`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DatasetError {
    #[error("column '{0}' appears more than once")]
    DuplicateColumn(String),

    #[error("column '{column}' has {found} rows, expected {expected}")]
    RaggedColumn {
        column: String,
        expected: usize,
        found: usize,
    },
}

/// Declared type of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnKind {
    /// Text / category values.
    Categorical,
    /// Continuous or integer values.
    Numeric,
}

/// Cells of a single column. `None` marks a missing cell.
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnData {
    Text(Vec<Option<String>>),
    Number(Vec<Option<f64>>),
}

impl ColumnData {
    /// Returns the declared kind of this column.
    #[must_use]
    pub const fn kind(&self) -> ColumnKind {
        match self {
            Self::Text(_) => ColumnKind::Categorical,
            Self::Number(_) => ColumnKind::Numeric,
        }
    }

    /// Returns the number of rows.
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::Text(values) => values.len(),
            Self::Number(values) => values.len(),
        }
    }

    /// Returns true if the column has no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns true if the cell is missing (or out of range).
    #[must_use]
    pub fn is_missing(&self, row: usize) -> bool {
        match self {
            Self::Text(values) => values.get(row).is_none_or(Option::is_none),
            Self::Number(values) => values.get(row).is_none_or(Option::is_none),
        }
    }

    /// Renders a cell as text. Numbers use their shortest display form.
    #[must_use]
    pub fn text(&self, row: usize) -> Option<Cow<'_, str>> {
        match self {
            Self::Text(values) => values.get(row)?.as_deref().map(Cow::Borrowed),
            Self::Number(values) => values.get(row)?.map(|v| Cow::Owned(v.to_string())),
        }
    }

    /// Reads a cell as a number. Text cells are parsed after trimming.
    #[must_use]
    pub fn number(&self, row: usize) -> Option<f64> {
        match self {
            Self::Text(values) => values.get(row)?.as_deref()?.trim().parse().ok(),
            Self::Number(values) => *values.get(row)?,
        }
    }

    fn select(&self, rows: &[usize]) -> Self {
        match self {
            Self::Text(values) => Self::Text(
                rows.iter()
                    .map(|&i| values.get(i).cloned().flatten())
                    .collect(),
            ),
            Self::Number(values) => {
                Self::Number(rows.iter().map(|&i| values.get(i).copied().flatten()).collect())
            }
        }
    }
}

/// A named column.
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub data: ColumnData,
}

impl Column {
    /// Creates a text column.
    pub fn text<S: Into<String>>(name: S, values: Vec<Option<String>>) -> Self {
        Self {
            name: name.into(),
            data: ColumnData::Text(values),
        }
    }

    /// Creates a numeric column.
    pub fn numeric<S: Into<String>>(name: S, values: Vec<Option<f64>>) -> Self {
        Self {
            name: name.into(),
            data: ColumnData::Number(values),
        }
    }

    /// Returns the declared kind of this column.
    #[must_use]
    pub const fn kind(&self) -> ColumnKind {
        self.data.kind()
    }
}

/// Column-oriented table of listings.
///
/// Columns keep their insertion order; every column has the same row count.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    columns: Vec<Column>,
    n_rows: usize,
}

impl Dataset {
    /// Builds a dataset from columns of equal length.
    ///
    /// # Errors
    ///
    /// Returns an error if a column name repeats or the lengths differ.
    pub fn new(columns: Vec<Column>) -> Result<Self, DatasetError> {
        let n_rows = columns.first().map_or(0, |c| c.data.len());

        for (idx, column) in columns.iter().enumerate() {
            if columns[..idx].iter().any(|c| c.name == column.name) {
                return Err(DatasetError::DuplicateColumn(column.name.clone()));
            }
            if column.data.len() != n_rows {
                return Err(DatasetError::RaggedColumn {
                    column: column.name.clone(),
                    expected: n_rows,
                    found: column.data.len(),
                });
            }
        }

        Ok(Self { columns, n_rows })
    }

    /// Returns the number of rows.
    #[must_use]
    pub const fn n_rows(&self) -> usize {
        self.n_rows
    }

    /// Returns true if there are no rows.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.n_rows == 0
    }

    /// Returns the columns in order.
    #[must_use]
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// Returns the column names in order.
    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|c| c.name.as_str())
    }

    /// Returns true if a column with this name exists.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.column(name).is_some()
    }

    #[must_use]
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn column_mut(&mut self, name: &str) -> Option<&mut Column> {
        self.columns.iter_mut().find(|c| c.name == name)
    }

    /// Removes a column, returning it if it existed.
    pub fn drop_column(&mut self, name: &str) -> Option<Column> {
        let idx = self.columns.iter().position(|c| c.name == name)?;
        Some(self.columns.remove(idx))
    }

    /// Replaces the column with the same name in place, or appends it.
    ///
    /// # Errors
    ///
    /// Returns an error if the column length differs from the dataset.
    pub fn put_column(&mut self, column: Column) -> Result<(), DatasetError> {
        if !self.columns.is_empty() && column.data.len() != self.n_rows {
            return Err(DatasetError::RaggedColumn {
                column: column.name,
                expected: self.n_rows,
                found: column.data.len(),
            });
        }
        if self.columns.is_empty() {
            self.n_rows = column.data.len();
        }

        match self.columns.iter_mut().find(|c| c.name == column.name) {
            Some(existing) => *existing = column,
            None => self.columns.push(column),
        }
        Ok(())
    }

    /// Returns a new dataset holding only the given rows, in the given order.
    #[must_use]
    pub fn select_rows(&self, rows: &[usize]) -> Self {
        let columns = self
            .columns
            .iter()
            .map(|c| Column {
                name: c.name.clone(),
                data: c.data.select(rows),
            })
            .collect();
        Self {
            columns,
            n_rows: rows.len(),
        }
    }

    /// Returns a new dataset holding only the rows for which `keep` is true.
    #[must_use]
    pub fn filter_rows<F: Fn(usize) -> bool>(&self, keep: F) -> Self {
        let rows: Vec<usize> = (0..self.n_rows).filter(|&i| keep(i)).collect();
        self.select_rows(&rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Dataset {
        Dataset::new(vec![
            Column::text(
                "Brand",
                vec![Some("Toyota".into()), None, Some("Audi".into())],
            ),
            Column::numeric("Price", vec![Some(10_000.0), Some(20_000.0), None]),
        ])
        .expect("valid dataset")
    }

    #[test]
    fn test_new_rejects_ragged_columns() {
        let err = Dataset::new(vec![
            Column::text("A", vec![None]),
            Column::numeric("B", vec![None, None]),
        ])
        .unwrap_err();

        assert_eq!(
            err,
            DatasetError::RaggedColumn {
                column: "B".into(),
                expected: 1,
                found: 2
            }
        );
    }

    #[test]
    fn test_new_rejects_duplicate_columns() {
        let err = Dataset::new(vec![
            Column::text("A", vec![None]),
            Column::text("A", vec![None]),
        ])
        .unwrap_err();
        assert_eq!(err, DatasetError::DuplicateColumn("A".into()));
    }

    #[test]
    fn test_filter_rows_keeps_order() {
        let data = sample();
        let filtered = data.filter_rows(|i| i != 1);

        assert_eq!(filtered.n_rows(), 2);
        let brand = &filtered.column("Brand").unwrap().data;
        assert_eq!(brand.text(0).as_deref(), Some("Toyota"));
        assert_eq!(brand.text(1).as_deref(), Some("Audi"));
    }

    #[test]
    fn test_cell_access() {
        let data = sample();
        let price = &data.column("Price").unwrap().data;

        assert_eq!(price.kind(), ColumnKind::Numeric);
        assert_eq!(price.text(0).as_deref(), Some("10000"));
        assert!(price.is_missing(2));
        assert!(price.is_missing(99));
        assert_eq!(price.number(1), Some(20_000.0));
    }

    #[test]
    fn test_put_column_replaces_in_place() {
        let mut data = sample();
        data.put_column(Column::numeric("Brand", vec![Some(1.0), Some(2.0), Some(3.0)]))
            .unwrap();

        let names: Vec<_> = data.column_names().collect();
        assert_eq!(names, ["Brand", "Price"]);
        assert_eq!(data.column("Brand").unwrap().kind(), ColumnKind::Numeric);

        assert!(data.put_column(Column::text("Short", vec![None])).is_err());
    }
}
