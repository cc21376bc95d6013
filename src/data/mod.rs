//! Data module - CSV loading and filtering

mod loader;
mod processor;

pub use loader::{load_data_cached, DataLoader, DEFAULT_ROW_CAP};
pub use processor::{DataProcessor, InjuryCategory, ProcessorError, StreetRanking};

/// Normalized column names shared with the chart code.
pub mod columns {
    pub use super::loader::{LATITUDE, LONGITUDE, ON_STREET_NAME, TIMESTAMP};
}

#[cfg(test)]
pub(crate) mod test_support {
    use polars::prelude::DataFrame;
    use std::path::PathBuf;

    pub fn fixture_path() -> PathBuf {
        PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/collisions.csv")
    }

    /// The fixture as seen by the dashboard: 10 rows with coordinates.
    pub fn fixture_frame() -> DataFrame {
        super::loader::load_data(&fixture_path(), 100).unwrap()
    }
}
