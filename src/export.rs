//! Export Module
//! Writes the current dashboard state to JSON and the minute chart to PNG.

use crate::charts::{DashboardView, RenderError, StaticChartRenderer};
use crate::data::{DataProcessor, InjuryCategory, StreetRanking};
use serde::Serialize;
use std::fs;
use std::path::Path;
use thiserror::Error;
use tracing::info;

pub const PNG_WIDTH: u32 = 1200;
pub const PNG_HEIGHT: u32 = 600;

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Render(#[from] RenderError),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MinuteCount {
    pub minute: usize,
    pub crashes: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryRanking {
    pub category: InjuryCategory,
    pub streets: Vec<StreetRanking>,
}

/// Serializable summary of what the dashboard currently shows.
#[derive(Debug, Clone, Serialize)]
pub struct DashboardSnapshot {
    pub source: String,
    pub row_cap: usize,
    pub loaded_rows: usize,
    pub min_injured: u32,
    pub injured_locations: usize,
    pub hour: u32,
    pub hour_window: String,
    pub hour_collisions: usize,
    /// `[latitude, longitude]`
    pub midpoint: Option<[f64; 2]>,
    pub minute_histogram: Vec<MinuteCount>,
    pub top_streets: Vec<CategoryRanking>,
}

impl DashboardSnapshot {
    pub fn from_view(
        view: &DashboardView,
        source: &Path,
        row_cap: usize,
        loaded_rows: usize,
    ) -> Self {
        Self {
            source: source.display().to_string(),
            row_cap,
            loaded_rows,
            min_injured: view.min_injured,
            injured_locations: view.injured_points.len(),
            hour: view.hour,
            hour_window: DataProcessor::hour_window_label(view.hour),
            hour_collisions: view.hour_rows,
            midpoint: view.midpoint.map(|(lat, lon)| [lat, lon]),
            minute_histogram: view
                .minute_hist
                .iter()
                .enumerate()
                .map(|(minute, &crashes)| MinuteCount { minute, crashes })
                .collect(),
            top_streets: view
                .streets
                .iter()
                .map(|(category, streets)| CategoryRanking {
                    category: *category,
                    streets: streets.clone(),
                })
                .collect(),
        }
    }

    /// Write the snapshot as pretty-printed JSON.
    pub fn write_json(&self, path: &Path) -> Result<(), ExportError> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        info!(path = %path.display(), "dashboard snapshot exported");
        Ok(())
    }
}

/// Render the minute chart of `view` and write it as a PNG file.
pub fn write_minute_chart_png(view: &DashboardView, path: &Path) -> Result<(), ExportError> {
    let png = StaticChartRenderer::render_minute_histogram_png(
        &view.minute_hist,
        view.hour,
        PNG_WIDTH,
        PNG_HEIGHT,
    )?;
    fs::write(path, png)?;
    info!(path = %path.display(), hour = view.hour, "minute chart exported");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::charts::RawTable;
    use crate::stats::MINUTES_PER_HOUR;

    fn sample_view() -> DashboardView {
        let mut minute_hist = [0u32; MINUTES_PER_HOUR];
        minute_hist[5] = 2;
        minute_hist[17] = 1;

        DashboardView {
            min_injured: 1,
            hour: 9,
            injured_points: vec![[-73.9442, 40.6782], [-73.9712, 40.7831]],
            hour_rows: 3,
            midpoint: Some((40.7171, -73.9685)),
            hex_bins: Vec::new(),
            minute_hist,
            streets: vec![(
                InjuryCategory::Pedestrians,
                vec![StreetRanking {
                    street: "FLATBUSH AVENUE".to_string(),
                    injured: 3,
                }],
            )],
            raw_preview: RawTable::default(),
        }
    }

    #[test]
    fn snapshot_mirrors_view() {
        let snapshot =
            DashboardSnapshot::from_view(&sample_view(), Path::new("crashes.csv"), 100_000, 10);

        assert_eq!(snapshot.hour_window, "9:00 and 10:00");
        assert_eq!(snapshot.injured_locations, 2);
        assert_eq!(snapshot.minute_histogram.len(), MINUTES_PER_HOUR);
        assert_eq!(
            snapshot
                .minute_histogram
                .iter()
                .map(|m| m.crashes as usize)
                .sum::<usize>(),
            snapshot.hour_collisions
        );
    }

    #[test]
    fn snapshot_json_round_trips_through_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("snapshot.json");
        let snapshot =
            DashboardSnapshot::from_view(&sample_view(), Path::new("crashes.csv"), 100_000, 10);
        snapshot.write_json(&path).unwrap();

        let value: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value["hour"], 9);
        assert_eq!(value["top_streets"][0]["category"], "pedestrians");
        assert_eq!(value["top_streets"][0]["streets"][0]["street"], "FLATBUSH AVENUE");
        assert_eq!(value["minute_histogram"][5]["crashes"], 2);
    }

    #[test]
    fn json_export_to_missing_directory_fails() {
        let snapshot =
            DashboardSnapshot::from_view(&sample_view(), Path::new("crashes.csv"), 100_000, 10);
        let err = snapshot
            .write_json(Path::new("/nonexistent/dir/snapshot.json"))
            .unwrap_err();
        assert!(matches!(err, ExportError::Io(_)));
    }
}
