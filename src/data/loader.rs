//! CSV Data Loader Module
//! Reads the collision CSV with Polars and normalizes it into the dashboard layout.

use once_cell::sync::Lazy;
use polars::prelude::*;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};
use thiserror::Error;
use tracing::{debug, info};

/// Source column holding the crash date (`MM/DD/YYYY`).
pub const DATE_COL: &str = "CRASH_DATE";
/// Source column holding the crash time of day (`HH:MM`).
pub const TIME_COL: &str = "CRASH_TIME";
pub const LATITUDE_COL: &str = "LATITUDE";
pub const LONGITUDE_COL: &str = "LONGITUDE";

/// Name of the merged date/time column before normalization.
const COMBINED_COL: &str = "CRASH_DATE_CRASH_TIME";
const TIMESTAMP_FORMAT: &str = "%m/%d/%Y %H:%M";

/// Normalized column names consumed by the dashboard.
pub const TIMESTAMP: &str = "date/time";
pub const LATITUDE: &str = "latitude";
pub const LONGITUDE: &str = "longitude";
pub const INJURED_PERSONS: &str = "injured_persons";
pub const ON_STREET_NAME: &str = "on_street_name";

/// Rows read by default.
pub const DEFAULT_ROW_CAP: usize = 100_000;

const REQUIRED_COLUMNS: [&str; 4] = [DATE_COL, TIME_COL, LATITUDE_COL, LONGITUDE_COL];

#[derive(Error, Debug)]
pub enum LoaderError {
    #[error("Failed to load CSV: {0}")]
    CsvError(#[from] PolarsError),
    #[error("CSV file not found: {}", .0.display())]
    NotFound(PathBuf),
    #[error("CSV is missing required column {0}")]
    MissingColumn(&'static str),
    #[error("Row cap must be at least 1")]
    InvalidRowCap,
}

type CacheKey = (PathBuf, usize);

/// Loaded collections keyed by (source file, row cap). Lives until process exit.
static LOAD_CACHE: Lazy<Mutex<HashMap<CacheKey, DataFrame>>> =
    Lazy::new(|| Mutex::new(HashMap::new()));

fn cache() -> MutexGuard<'static, HashMap<CacheKey, DataFrame>> {
    LOAD_CACHE.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Read at most `n_rows` rows and normalize them.
///
/// `CRASH_DATE` and `CRASH_TIME` are merged into a single datetime column
/// named `date/time` (placed first), rows without a latitude or longitude
/// are dropped, and every column name is lowercased.
pub fn load_data(path: &Path, n_rows: usize) -> Result<DataFrame, LoaderError> {
    if n_rows == 0 {
        return Err(LoaderError::InvalidRowCap);
    }
    if !path.is_file() {
        return Err(LoaderError::NotFound(path.to_path_buf()));
    }

    info!(path = %path.display(), n_rows, "reading collision CSV");

    let raw = LazyCsvReader::new(path)
        .with_has_header(true)
        .with_n_rows(Some(n_rows))
        .with_infer_schema_length(Some(10000))
        .with_ignore_errors(true)
        .finish()?
        .collect()?;

    let read_rows = raw.height();
    {
        let names = raw.get_column_names();
        for required in REQUIRED_COLUMNS {
            if !names.iter().any(|name| name.as_str() == required) {
                return Err(LoaderError::MissingColumn(required));
            }
        }
    }

    let timestamp = concat_str(
        [
            col(DATE_COL).cast(DataType::String),
            col(TIME_COL).cast(DataType::String),
        ],
        " ",
        false,
    )
    .str()
    .to_datetime(
        Some(TimeUnit::Milliseconds),
        None,
        StrptimeOptions {
            format: Some(TIMESTAMP_FORMAT.into()),
            strict: true,
            exact: true,
            cache: true,
        },
        lit("raise"),
    )
    .alias(COMBINED_COL);

    let mut df = raw
        .lazy()
        .with_column(timestamp)
        .filter(
            col(LATITUDE_COL)
                .is_not_null()
                .and(col(LONGITUDE_COL).is_not_null()),
        )
        .collect()?
        .drop_many([DATE_COL, TIME_COL]);

    let lowered: Vec<String> = df
        .get_column_names()
        .iter()
        .map(|name| name.to_lowercase())
        .collect();
    df.set_column_names(lowered)?;
    df.rename(&COMBINED_COL.to_lowercase(), TIMESTAMP.into())?;

    let mut order: Vec<PlSmallStr> = vec![TIMESTAMP.into()];
    order.extend(
        df.get_column_names()
            .into_iter()
            .filter(|name| name.as_str() != TIMESTAMP)
            .cloned(),
    );
    let df = df.select(order)?;

    info!(
        read_rows,
        kept_rows = df.height(),
        dropped = read_rows - df.height(),
        "collision data normalized"
    );
    Ok(df)
}

/// Memoized [`load_data`]: repeated calls with the same file and row cap
/// return the collection loaded the first time. Failures are not cached.
pub fn load_data_cached(path: &Path, n_rows: usize) -> Result<DataFrame, LoaderError> {
    let source = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());
    let key = (source, n_rows);

    if let Some(df) = cache().get(&key) {
        debug!(path = %path.display(), n_rows, "collision data served from cache");
        return Ok(df.clone());
    }

    let df = load_data(path, n_rows)?;
    cache().insert(key, df.clone());
    Ok(df)
}

/// Holds the loaded collision collection for the lifetime of the dashboard.
pub struct DataLoader {
    df: Option<DataFrame>,
    file_path: Option<PathBuf>,
    row_cap: usize,
}

impl Default for DataLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl DataLoader {
    pub fn new() -> Self {
        Self {
            df: None,
            file_path: None,
            row_cap: DEFAULT_ROW_CAP,
        }
    }

    /// Get list of column names from the loaded collection.
    pub fn get_columns(&self) -> Vec<String> {
        self.df
            .as_ref()
            .map(|df| {
                df.get_column_names()
                    .iter()
                    .map(|s| s.to_string())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Largest `injured_persons` value in the collection.
    pub fn max_injured(&self) -> Option<i64> {
        let df = self.df.as_ref()?;
        df.column(INJURED_PERSONS)
            .ok()?
            .cast(&DataType::Int64)
            .ok()?
            .i64()
            .ok()?
            .max()
    }

    pub fn get_row_count(&self) -> usize {
        self.df.as_ref().map(|df| df.height()).unwrap_or(0)
    }

    pub fn get_dataframe(&self) -> Option<&DataFrame> {
        self.df.as_ref()
    }

    pub fn get_file_path(&self) -> Option<&PathBuf> {
        self.file_path.as_ref()
    }

    pub fn row_cap(&self) -> usize {
        self.row_cap
    }

    /// Install a collection loaded on a background thread.
    pub fn set_dataframe(&mut self, df: DataFrame, file_path: PathBuf, row_cap: usize) {
        self.df = Some(df);
        self.file_path = Some(file_path);
        self.row_cap = row_cap;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::test_support::fixture_path;
    use std::io::Write;

    #[test]
    fn drops_rows_without_coordinates() {
        let df = load_data(&fixture_path(), 100).unwrap();
        assert_eq!(df.height(), 10);

        let lat = df.column(LATITUDE).unwrap();
        let lon = df.column(LONGITUDE).unwrap();
        assert_eq!(lat.null_count(), 0);
        assert_eq!(lon.null_count(), 0);

        let streets: Vec<String> = df
            .column(ON_STREET_NAME)
            .unwrap()
            .str()
            .unwrap()
            .into_iter()
            .flatten()
            .map(str::to_string)
            .collect();
        assert!(!streets.iter().any(|s| s == "QUEENS BOULEVARD"));
        assert!(!streets.iter().any(|s| s == "NORTHERN BOULEVARD"));
    }

    #[test]
    fn column_names_are_lowercase_with_timestamp_first() {
        let df = load_data(&fixture_path(), 100).unwrap();
        let names: Vec<String> = df
            .get_column_names()
            .iter()
            .map(|s| s.to_string())
            .collect();

        assert_eq!(names[0], TIMESTAMP);
        assert!(names.iter().all(|n| *n == n.to_lowercase()));
        assert!(!names.iter().any(|n| n == "crash_date" || n == "crash_time"));
        assert!(names.iter().any(|n| n == INJURED_PERSONS));
        assert!(matches!(
            df.column(TIMESTAMP).unwrap().dtype(),
            DataType::Datetime(_, _)
        ));
    }

    #[test]
    fn row_cap_bounds_the_collection() {
        for cap in [1, 3, 5, 12, 500] {
            let df = load_data(&fixture_path(), cap).unwrap();
            assert!(df.height() <= cap, "cap {cap} gave {} rows", df.height());
        }
        // The third source row has no latitude.
        assert_eq!(load_data(&fixture_path(), 3).unwrap().height(), 2);
    }

    #[test]
    fn zero_row_cap_is_rejected() {
        assert!(matches!(
            load_data(&fixture_path(), 0),
            Err(LoaderError::InvalidRowCap)
        ));
    }

    #[test]
    fn missing_file_is_reported() {
        let err = load_data(Path::new("/nonexistent/collisions.csv"), 10).unwrap_err();
        assert!(matches!(err, LoaderError::NotFound(_)));
    }

    #[test]
    fn missing_coordinate_column_is_reported() {
        let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
        writeln!(file, "CRASH_DATE,CRASH_TIME,LATITUDE,ON_STREET_NAME").unwrap();
        writeln!(file, "01/05/2019,09:05,40.67,BROADWAY").unwrap();
        file.flush().unwrap();

        let err = load_data(file.path(), 10).unwrap_err();
        assert!(matches!(err, LoaderError::MissingColumn(LONGITUDE_COL)));
    }

    #[test]
    fn malformed_dates_propagate() {
        let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
        writeln!(file, "CRASH_DATE,CRASH_TIME,LATITUDE,LONGITUDE").unwrap();
        writeln!(file, "not a date,09:05,40.67,-73.94").unwrap();
        file.flush().unwrap();

        assert!(matches!(
            load_data(file.path(), 10),
            Err(LoaderError::CsvError(_))
        ));
    }

    #[test]
    fn cached_load_returns_same_collection() {
        let first = load_data_cached(&fixture_path(), 7).unwrap();
        let second = load_data_cached(&fixture_path(), 7).unwrap();
        assert!(first.equals_missing(&second));
        assert!(cache().contains_key(&(fixture_path().canonicalize().unwrap(), 7)));
    }

    #[test]
    fn loader_reports_injury_maximum() {
        let mut loader = DataLoader::new();
        let df = load_data_cached(&fixture_path(), 100).unwrap();
        loader.set_dataframe(df, fixture_path(), 100);
        assert_eq!(loader.get_row_count(), 10);
        assert_eq!(loader.max_injured(), Some(5));
        assert_eq!(loader.row_cap(), 100);
    }
}
