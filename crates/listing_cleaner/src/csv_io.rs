//! CSV loading and writing for listing datasets.

use std::borrow::Cow;
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

use anyhow::{Context, Result};
use listing_structs::{Column, Dataset};
use tracing::debug;

/// Cell literals read as missing, besides empty cells.
const MISSING_LITERALS: &[&str] = &["nan", "NaN", "NA", "N/A", "null"];

fn is_missing(cell: &str) -> bool {
    let trimmed = cell.trim();
    trimmed.is_empty() || MISSING_LITERALS.contains(&trimmed)
}

/// Reads a CSV file with a header row.
///
/// A column is numeric when every non-missing cell parses as a number,
/// otherwise it is a text column.
///
/// # Errors
///
/// Returns an error if the file cannot be opened or is not valid CSV.
pub fn read_csv(path: &Path) -> Result<Dataset> {
    let file = File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
    read_csv_from(file).with_context(|| format!("Failed to read CSV {}", path.display()))
}

/// Reads CSV data with a header row from any reader.
///
/// # Errors
///
/// Returns an error if the data is not valid CSV.
pub fn read_csv_from<R: Read>(reader: R) -> Result<Dataset> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_reader(reader);

    let headers: Vec<String> = reader
        .headers()
        .context("Missing CSV header row")?
        .iter()
        .map(str::to_string)
        .collect();

    let mut raw: Vec<Vec<Option<String>>> = vec![Vec::new(); headers.len()];
    for (line, record) in reader.records().enumerate() {
        let record = record.with_context(|| format!("Malformed CSV record {}", line + 1))?;
        for (idx, cells) in raw.iter_mut().enumerate() {
            let cell = record.get(idx).filter(|c| !is_missing(c));
            cells.push(cell.map(str::to_string));
        }
    }

    let columns = headers
        .into_iter()
        .zip(raw)
        .map(|(name, cells)| infer_column(name, cells))
        .collect();

    let dataset = Dataset::new(columns)?;
    debug!(
        rows = dataset.n_rows(),
        columns = dataset.columns().len(),
        "Loaded CSV"
    );
    Ok(dataset)
}

fn infer_column(name: String, cells: Vec<Option<String>>) -> Column {
    let parsed: Option<Vec<Option<f64>>> = cells
        .iter()
        .map(|cell| match cell {
            Some(text) => text.trim().parse::<f64>().ok().map(Some),
            None => Some(None),
        })
        .collect();

    match parsed {
        Some(numbers) => Column::numeric(name, numbers),
        None => Column::text(name, cells),
    }
}

/// Writes a dataset as CSV with a header row. Missing cells are left empty.
///
/// # Errors
///
/// Returns an error if the file cannot be created or written.
pub fn write_csv(dataset: &Dataset, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    let file =
        File::create(path).with_context(|| format!("Failed to create {}", path.display()))?;
    write_csv_to(dataset, file).with_context(|| format!("Failed to write {}", path.display()))
}

/// Writes a dataset as CSV to any writer.
///
/// # Errors
///
/// Returns an error if writing fails.
pub fn write_csv_to<W: Write>(dataset: &Dataset, writer: W) -> Result<()> {
    let mut writer = csv::Writer::from_writer(writer);
    writer.write_record(dataset.column_names())?;

    for row in 0..dataset.n_rows() {
        let record = dataset
            .columns()
            .iter()
            .map(|c| c.data.text(row).map(Cow::into_owned).unwrap_or_default());
        writer.write_record(record)?;
    }

    writer.flush()?;
    Ok(())
}
