//! Listing cleaner crate.
//!
//! Turns raw listing exports into the typed [`Dataset`] the training
//! pipeline consumes: CSV loading, free-text location folding into
//! voivodeships, and the column fixes applied before training.

mod clean;
mod csv_io;
mod region;

pub use clean::{CleanConfig, CleanReport, clean_listings};
pub use csv_io::{read_csv, read_csv_from, write_csv, write_csv_to};
pub use region::{VOIVODESHIPS, extract_region, normalize_location};

#[doc(no_inline)]
pub use listing_structs::Dataset;
