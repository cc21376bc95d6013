//! Command line and environment configuration.

use crate::data::DEFAULT_ROW_CAP;
use clap::Parser;
use std::path::PathBuf;

/// Dataset loaded when no source is configured.
pub const DEFAULT_DATA_FILE: &str = "Motor_Vehicle_Collisions_-_Crashes.csv";

#[derive(Parser, Debug, Clone)]
#[command(name = "collision-dashboard")]
#[command(about = "Interactive dashboard for NYC motor vehicle collisions")]
pub struct Cli {
    /// Collision CSV to load
    #[arg(long, env = "COLLISIONS_CSV", default_value = DEFAULT_DATA_FILE)]
    pub data: PathBuf,

    /// Maximum number of CSV rows to read
    #[arg(
        long,
        env = "COLLISIONS_ROWS",
        default_value_t = DEFAULT_ROW_CAP,
        value_parser = parse_row_cap
    )]
    pub rows: usize,

    /// Log level (e.g. "info", "debug")
    #[arg(long)]
    pub log_level: Option<String>,
}

fn parse_row_cap(s: &str) -> Result<usize, String> {
    let rows: usize = s
        .parse()
        .map_err(|_| format!("`{s}` is not a row count"))?;
    if rows == 0 {
        return Err("row cap must be at least 1".to_string());
    }
    Ok(rows)
}
