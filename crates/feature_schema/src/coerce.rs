//! Type coercion shared by training-time and request-time row building.
//!
//! Both paths go through [`coerce_cell`], so a value is normalised the same
//! way whether it came from a dataset cell or from a form field. Coercion
//! never fails: unusable values fall back to [`NO_DATA`] or `0`.

use listing_structs::{ColumnData, ColumnKind, FeatureValue, FieldValue, NO_DATA};

/// Text placeholders that mean "no value", compared case-insensitively.
const ABSENT_LITERALS: &[&str] = &["nan", "none", "null", "[nie wybrano]"];

/// Returns true for blank text and absence placeholders such as `"None"`.
#[must_use]
pub fn is_absent_literal(text: &str) -> bool {
    let trimmed = text.trim();
    trimmed.is_empty()
        || ABSENT_LITERALS
            .iter()
            .any(|literal| trimmed.eq_ignore_ascii_case(literal))
}

/// Coerces a value into a category string.
#[must_use]
pub fn coerce_categorical(value: &FieldValue) -> String {
    match value {
        FieldValue::Text(text) if !is_absent_literal(text) => text.clone(),
        FieldValue::Number(number) if number.is_finite() => number.to_string(),
        FieldValue::Flag(flag) => (if *flag { "True" } else { "False" }).to_string(),
        _ => NO_DATA.to_string(),
    }
}

/// Coerces a value into a finite number, `0` when missing or unparsable.
#[must_use]
pub fn coerce_numeric(value: &FieldValue) -> f64 {
    let parsed = match value {
        FieldValue::Number(number) => Some(*number),
        FieldValue::Text(text) => text.trim().parse::<f64>().ok(),
        FieldValue::Flag(flag) => Some(f64::from(u8::from(*flag))),
        FieldValue::Missing => None,
    };
    parsed.filter(|v| v.is_finite()).unwrap_or(0.0)
}

pub(crate) fn coerce_cell(kind: ColumnKind, value: &FieldValue) -> FeatureValue {
    match kind {
        ColumnKind::Categorical => FeatureValue::Category(coerce_categorical(value)),
        ColumnKind::Numeric => FeatureValue::Number(coerce_numeric(value)),
    }
}

/// Reads a dataset cell as if it had been typed into a form.
pub(crate) fn field_value_at(data: &ColumnData, row: usize) -> FieldValue {
    match data {
        ColumnData::Text(values) => values
            .get(row)
            .cloned()
            .flatten()
            .map_or(FieldValue::Missing, FieldValue::Text),
        ColumnData::Number(values) => values
            .get(row)
            .copied()
            .flatten()
            .map_or(FieldValue::Missing, FieldValue::Number),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_categorical_coercion() {
        assert_eq!(coerce_categorical(&"Toyota".into()), "Toyota");
        assert_eq!(coerce_categorical(&FieldValue::Number(5.0)), "5");
        assert_eq!(coerce_categorical(&FieldValue::Number(1.6)), "1.6");
        assert_eq!(coerce_categorical(&FieldValue::Flag(true)), "True");
        assert_eq!(coerce_categorical(&FieldValue::Missing), NO_DATA);
        assert_eq!(coerce_categorical(&FieldValue::Number(f64::NAN)), NO_DATA);
    }

    #[test]
    fn test_absence_placeholders_become_sentinel() {
        for literal in ["", "   ", "nan", "NaN", "None", "null", "[nie wybrano]"] {
            assert_eq!(coerce_categorical(&literal.into()), NO_DATA, "{literal:?}");
        }
        assert_eq!(coerce_categorical(&NO_DATA.into()), NO_DATA);
    }

    #[test]
    fn test_numeric_coercion() {
        assert_eq!(coerce_numeric(&FieldValue::Number(150_000.0)), 150_000.0);
        assert_eq!(coerce_numeric(&" 1600 ".into()), 1600.0);
        assert_eq!(coerce_numeric(&"1.4e3".into()), 1400.0);
        assert_eq!(coerce_numeric(&"abc".into()), 0.0);
        assert_eq!(coerce_numeric(&FieldValue::Missing), 0.0);
        assert_eq!(coerce_numeric(&"inf".into()), 0.0);
        assert_eq!(coerce_numeric(&FieldValue::Number(f64::NAN)), 0.0);
        assert_eq!(coerce_numeric(&FieldValue::Flag(true)), 1.0);
    }

    #[test]
    fn test_dataset_cells_read_like_form_fields() {
        let text = ColumnData::Text(vec![Some("Audi".into()), None]);
        let numbers = ColumnData::Number(vec![None, Some(3.0)]);

        assert_eq!(field_value_at(&text, 0), FieldValue::Text("Audi".into()));
        assert_eq!(field_value_at(&text, 1), FieldValue::Missing);
        assert_eq!(field_value_at(&numbers, 0), FieldValue::Missing);
        assert_eq!(field_value_at(&numbers, 1), FieldValue::Number(3.0));
    }
}
