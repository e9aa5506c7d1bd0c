use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

use crate::FeatureValue;

/// A single schema-ordered record ready to be scored.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureRow {
    columns: Vec<String>,
    values: Vec<FeatureValue>,
}

impl FeatureRow {
    /// Pairs column names with values. Both must have the same length.
    #[must_use]
    pub fn new(columns: Vec<String>, values: Vec<FeatureValue>) -> Self {
        debug_assert_eq!(columns.len(), values.len());
        Self { columns, values }
    }

    #[must_use]
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    #[must_use]
    pub fn values(&self) -> &[FeatureValue] {
        &self.values
    }

    /// Looks up a cell by column name.
    #[must_use]
    pub fn get(&self, column: &str) -> Option<&FeatureValue> {
        let idx = self.columns.iter().position(|c| c == column)?;
        self.values.get(idx)
    }

    /// Iterates `(column, value)` pairs in column order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &FeatureValue)> {
        self.columns
            .iter()
            .map(String::as_str)
            .zip(self.values.iter())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Serializes as a JSON object whose keys keep column order.
impl Serialize for FeatureRow {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.len()))?;
        for (column, value) in self.iter() {
            map.serialize_entry(column, value)?;
        }
        map.end()
    }
}

/// A batch of feature rows sharing one column list.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FeatureFrame {
    columns: Vec<String>,
    rows: Vec<Vec<FeatureValue>>,
}

impl FeatureFrame {
    /// Creates an empty frame with the given columns.
    #[must_use]
    pub const fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    /// Appends a row. The row must have one value per column.
    pub fn push(&mut self, row: Vec<FeatureValue>) {
        debug_assert_eq!(row.len(), self.columns.len());
        self.rows.push(row);
    }

    #[must_use]
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    #[must_use]
    pub fn rows(&self) -> &[Vec<FeatureValue>] {
        &self.rows
    }

    #[must_use]
    pub fn row(&self, index: usize) -> Option<&[FeatureValue]> {
        self.rows.get(index).map(Vec::as_slice)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Returns a new frame holding the given rows, in the given order.
    #[must_use]
    pub fn select(&self, indices: &[usize]) -> Self {
        Self {
            columns: self.columns.clone(),
            rows: indices
                .iter()
                .filter_map(|&i| self.rows.get(i).cloned())
                .collect(),
        }
    }
}

impl From<FeatureRow> for FeatureFrame {
    fn from(row: FeatureRow) -> Self {
        Self {
            columns: row.columns,
            rows: vec![row.values],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row() -> FeatureRow {
        FeatureRow::new(
            vec!["Mileage_km".into(), "Brand".into()],
            vec![
                FeatureValue::Number(0.0),
                FeatureValue::Category("Toyota".into()),
            ],
        )
    }

    #[test]
    fn test_row_serializes_in_column_order() {
        let json = serde_json::to_string(&row()).unwrap();
        assert_eq!(json, r#"{"Mileage_km":0.0,"Brand":"Toyota"}"#);
    }

    #[test]
    fn test_row_lookup() {
        let row = row();
        assert_eq!(row.get("Brand"), Some(&FeatureValue::Category("Toyota".into())));
        assert_eq!(row.get("Colour"), None);
    }

    #[test]
    fn test_frame_select() {
        let mut frame = FeatureFrame::new(vec!["x".into()]);
        for i in 0..5 {
            frame.push(vec![FeatureValue::Number(f64::from(i))]);
        }

        let picked = frame.select(&[4, 0, 9]);
        assert_eq!(picked.len(), 2);
        assert_eq!(picked.row(0), Some(&[FeatureValue::Number(4.0)][..]));
        assert_eq!(picked.columns(), frame.columns());
    }

    #[test]
    fn test_frame_from_row() {
        let frame = FeatureFrame::from(row());
        assert_eq!(frame.len(), 1);
        assert_eq!(frame.columns(), ["Mileage_km", "Brand"]);
    }
}
