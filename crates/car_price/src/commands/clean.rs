//! Clean command - turns a raw listing export into the training CSV.

use std::path::Path;

use anyhow::Result;
use listing_cleaner::{CleanConfig, clean_listings, read_csv, write_csv};
use tracing::info;

/// Runs the clean command.
///
/// # Errors
///
/// Returns an error if the input cannot be read or the output cannot be written.
pub fn run(input: &Path, output: &Path, eur_rate: f64) -> Result<()> {
    info!(input = %input.display(), eur_rate, "Cleaning listings");

    let raw = read_csv(input)?;
    let (cleaned, report) = clean_listings(raw, &CleanConfig::default().with_eur_rate(eur_rate))?;
    write_csv(&cleaned, output)?;

    info!(
        output = %output.display(),
        rows = cleaned.n_rows(),
        columns = cleaned.columns().len(),
        dropped = ?report.dropped_columns,
        eur_converted = report.eur_converted,
        "Cleaning complete"
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::TempDir;

    use super::*;

    #[test]
    fn test_clean_writes_training_csv() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("raw.csv");
        let output = dir.path().join("out").join("cleaned.csv");
        fs::write(
            &input,
            "Index,Price,Currency,Offer_location,Doors_number,Vehicle_version\n\
             0,10000,EUR,\"Warszawa, Mazowieckie\",5,1.6 TDI\n\
             1,30000,PLN,Atlantis,,\n",
        )
        .unwrap();

        run(&input, &output, 4.5).unwrap();

        let cleaned = read_csv(&output).unwrap();
        assert!(!cleaned.contains("Vehicle_version"));
        let price = cleaned.column("Price").unwrap();
        assert_eq!(price.data.number(0), Some(45_000.0));
        assert_eq!(price.data.number(1), Some(30_000.0));
        let region = cleaned.column("Offer_location").unwrap();
        assert_eq!(region.data.text(0).as_deref(), Some("mazowieckie"));
    }

    #[test]
    fn test_missing_input_is_an_error() {
        let dir = TempDir::new().unwrap();
        assert!(run(&dir.path().join("nope.csv"), &dir.path().join("o.csv"), 4.6).is_err());
    }
}
