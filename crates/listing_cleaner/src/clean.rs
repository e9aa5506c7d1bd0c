//! Column fixes applied to raw listing exports before training.

use std::sync::LazyLock;

use anyhow::Result;
use listing_structs::{Column, ColumnData, Dataset, NO_DATA};
use regex::Regex;
use tracing::info;

use crate::region::extract_region;

const LOCATION_COLUMN: &str = "Offer_location";
const DOORS_COLUMN: &str = "Doors_number";
const CURRENCY_COLUMN: &str = "Currency";
const PRICE_COLUMN: &str = "Price";

static DIGITS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d+").expect("valid digits pattern"));

/// Settings for [`clean_listings`].
#[derive(Debug, Clone)]
pub struct CleanConfig {
    /// PLN per EUR used to convert prices.
    pub eur_rate: f64,
    /// Columns removed when present.
    pub drop_columns: Vec<String>,
    /// Columns whose missing cells are filled with [`NO_DATA`].
    pub fill_columns: Vec<String>,
}

impl Default for CleanConfig {
    fn default() -> Self {
        Self {
            eur_rate: 4.6,
            drop_columns: [
                "Vehicle_version",
                "CO2_emissions",
                "First_registration_date",
                "Vehicle_generation",
            ]
            .map(String::from)
            .to_vec(),
            fill_columns: ["Origin_country", "First_owner", "Drive"]
                .map(String::from)
                .to_vec(),
        }
    }
}

impl CleanConfig {
    #[must_use]
    pub fn with_eur_rate(mut self, eur_rate: f64) -> Self {
        self.eur_rate = eur_rate;
        self
    }
}

/// Summary of what [`clean_listings`] changed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CleanReport {
    /// Columns that were present and removed.
    pub dropped_columns: Vec<String>,
    /// Fill columns that were absent from the data.
    pub absent_fill_columns: Vec<String>,
    /// Number of rows converted from EUR to PLN.
    pub eur_converted: usize,
}

/// Cleans a raw listing dataset.
///
/// Folds `Offer_location` into voivodeships, drops unused columns, fills
/// key categorical gaps, turns `Doors_number` into a number and converts
/// EUR prices to PLN.
///
/// # Errors
///
/// Returns an error if a rebuilt column does not match the row count.
pub fn clean_listings(mut dataset: Dataset, config: &CleanConfig) -> Result<(Dataset, CleanReport)> {
    let mut report = CleanReport::default();
    let n_rows = dataset.n_rows();

    if let Some(column) = dataset.column(LOCATION_COLUMN) {
        let regions = (0..n_rows)
            .map(|row| Some(extract_region(column.data.text(row).as_deref())))
            .collect();
        dataset.put_column(Column::text(LOCATION_COLUMN, regions))?;
    }

    for name in &config.drop_columns {
        if dataset.drop_column(name).is_some() {
            report.dropped_columns.push(name.clone());
        }
    }
    if report.dropped_columns.is_empty() {
        info!("No listed columns to drop");
    } else {
        info!(columns = ?report.dropped_columns, "Dropped columns");
    }

    for name in &config.fill_columns {
        let Some(column) = dataset.column(name) else {
            info!(column = %name, "Fill column not present in data");
            report.absent_fill_columns.push(name.clone());
            continue;
        };
        let filled = (0..n_rows)
            .map(|row| {
                Some(
                    column
                        .data
                        .text(row)
                        .map_or_else(|| NO_DATA.to_string(), |t| t.into_owned()),
                )
            })
            .collect();
        dataset.put_column(Column::text(name.clone(), filled))?;
    }

    if let Some(column) = dataset.column(DOORS_COLUMN) {
        let doors = (0..n_rows)
            .map(|row| Some(leading_number(column.data.text(row).as_deref()).unwrap_or(0.0)))
            .collect();
        dataset.put_column(Column::numeric(DOORS_COLUMN, doors))?;
    }

    report.eur_converted = convert_eur_prices(&mut dataset, config.eur_rate)?;

    Ok((dataset, report))
}

/// Parses the first run of digits in a cell, if any.
fn leading_number(text: Option<&str>) -> Option<f64> {
    DIGITS.find(text?)?.as_str().parse().ok()
}

fn convert_eur_prices(dataset: &mut Dataset, eur_rate: f64) -> Result<usize> {
    let (Some(currency), Some(price)) = (
        dataset.column(CURRENCY_COLUMN),
        dataset.column(PRICE_COLUMN),
    ) else {
        info!("No Currency/Price columns, skipping currency conversion");
        return Ok(0);
    };

    let mut prices: Vec<Option<f64>> =
        (0..dataset.n_rows()).map(|row| price.data.number(row)).collect();
    let mut currencies: Vec<Option<String>> = (0..dataset.n_rows())
        .map(|row| currency.data.text(row).map(|t| t.into_owned()))
        .collect();

    let eur_rows: Vec<usize> = currencies
        .iter()
        .enumerate()
        .filter(|(_, c)| c.as_deref().is_some_and(|c| c.to_uppercase() == "EUR"))
        .map(|(row, _)| row)
        .collect();
    info!(count = eur_rows.len(), "Listings priced in EUR before conversion");

    for &row in &eur_rows {
        if let Some(value) = prices[row].as_mut() {
            *value *= eur_rate;
        }
        currencies[row] = Some("PLN".to_string());
    }

    dataset.put_column(Column::numeric(PRICE_COLUMN, prices))?;
    dataset.put_column(Column {
        name: CURRENCY_COLUMN.to_string(),
        data: ColumnData::Text(currencies),
    })?;
    info!(eur_rate, "Converted EUR prices to PLN");

    Ok(eur_rows.len())
}

#[cfg(test)]
mod tests {
    use listing_structs::ColumnKind;

    use super::*;
    use crate::read_csv_from;

    const RAW: &str = "\
Index,Price,Currency,Vehicle_brand,Doors_number,Drive,Vehicle_version,Offer_location
0,30000,PLN,Toyota,5,Front wheels,1.6 VVT-i,\"Warszawa, Mazowieckie\"
1,10000,eur,Audi,3-door,,2.0 TDI,Atlantis
2,,EUR,Fiat,,4x4,,
";

    fn cleaned() -> (Dataset, CleanReport) {
        let raw = read_csv_from(RAW.as_bytes()).unwrap();
        clean_listings(raw, &CleanConfig::default()).unwrap()
    }

    #[test]
    fn test_location_is_folded_into_regions() {
        let (data, _) = cleaned();
        let location = &data.column("Offer_location").unwrap().data;

        assert_eq!(location.text(0).as_deref(), Some("mazowieckie"));
        assert_eq!(location.text(1).as_deref(), Some(NO_DATA));
        assert_eq!(location.text(2).as_deref(), Some(NO_DATA));
    }

    #[test]
    fn test_columns_dropped_and_filled() {
        let (data, report) = cleaned();

        assert!(!data.contains("Vehicle_version"));
        assert_eq!(report.dropped_columns, ["Vehicle_version"]);
        assert_eq!(report.absent_fill_columns, ["Origin_country", "First_owner"]);

        let drive = &data.column("Drive").unwrap().data;
        assert_eq!(drive.text(1).as_deref(), Some(NO_DATA));
        assert_eq!(drive.text(2).as_deref(), Some("4x4"));
    }

    #[test]
    fn test_doors_become_numbers() {
        let (data, _) = cleaned();
        let doors = &data.column("Doors_number").unwrap();

        assert_eq!(doors.kind(), ColumnKind::Numeric);
        assert_eq!(doors.data.number(0), Some(5.0));
        assert_eq!(doors.data.number(1), Some(3.0));
        assert_eq!(doors.data.number(2), Some(0.0));
    }

    #[test]
    fn test_eur_prices_converted() {
        let (data, report) = cleaned();

        assert_eq!(report.eur_converted, 2);
        let price = &data.column("Price").unwrap().data;
        assert_eq!(price.number(0), Some(30_000.0));
        assert!((price.number(1).unwrap() - 46_000.0).abs() < 1e-9);
        assert!(price.is_missing(2));

        let currency = &data.column("Currency").unwrap().data;
        for row in 0..3 {
            assert_eq!(currency.text(row).as_deref(), Some("PLN"));
        }
    }

    #[test]
    fn test_custom_rate() {
        let raw = read_csv_from(RAW.as_bytes()).unwrap();
        let (data, _) = clean_listings(raw, &CleanConfig::default().with_eur_rate(4.0)).unwrap();

        let price = &data.column("Price").unwrap().data;
        assert!((price.number(1).unwrap() - 40_000.0).abs() < 1e-9);
    }
}
