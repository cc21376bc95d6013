//! Collision Dashboard Main Application
//! Main window with control panel and dashboard page.

use crate::charts::{DashboardView, RawTable, RAW_PREVIEW_ROWS};
use crate::config::Cli;
use crate::data::{load_data_cached, DataLoader, DataProcessor, ProcessorError};
use crate::export::{self, DashboardSnapshot};
use crate::gui::{ChartViewer, ControlPanel, ControlPanelAction};
use crate::stats::{StatsCalculator, HEX_RADIUS_M};
use egui::SidePanel;
use polars::prelude::*;
use std::path::PathBuf;
use std::sync::mpsc::{channel, Receiver, TryRecvError};
use std::thread;
use tracing::{error, info, warn};

/// Rows per dangerous-streets ranking
const TOP_STREETS: usize = 5;

/// CSV loading result from background thread
enum LoadResult {
    Complete {
        df: DataFrame,
        path: PathBuf,
        row_cap: usize,
    },
    Error(String),
}

/// Main application window.
pub struct DashboardApp {
    loader: DataLoader,
    control_panel: ControlPanel,
    chart_viewer: ChartViewer,

    // Async CSV loading
    load_rx: Option<Receiver<LoadResult>>,
    is_loading: bool,

    /// (min_injured, hour) the current view was computed for
    view_key: Option<(u32, u32)>,
}

impl DashboardApp {
    pub fn new(_cc: &eframe::CreationContext<'_>, cli: &Cli) -> Self {
        let mut app = Self {
            loader: DataLoader::new(),
            control_panel: ControlPanel::new(cli.data.clone(), cli.rows),
            chart_viewer: ChartViewer::new(),
            load_rx: None,
            is_loading: false,
            view_key: None,
        };
        app.start_load(cli.data.clone(), cli.rows);
        app
    }

    /// Load a CSV on a background thread
    fn start_load(&mut self, path: PathBuf, row_cap: usize) {
        if self.is_loading {
            return;
        }

        self.chart_viewer.clear();
        self.view_key = None;
        self.control_panel.settings.csv_path = Some(path.clone());
        self.control_panel.settings.row_cap = row_cap;
        self.control_panel.set_progress(0.0, "Loading CSV file...");
        self.is_loading = true;

        let (tx, rx) = channel();
        self.load_rx = Some(rx);

        thread::spawn(move || {
            let result = match load_data_cached(&path, row_cap) {
                Ok(df) => LoadResult::Complete { df, path, row_cap },
                Err(e) => {
                    error!(path = %path.display(), "failed to load collisions: {e}");
                    LoadResult::Error(e.to_string())
                }
            };
            let _ = tx.send(result);
        });
    }

    /// Handle CSV file selection
    fn handle_browse_csv(&mut self) {
        if let Some(path) = rfd::FileDialog::new()
            .add_filter("CSV Files", &["csv"])
            .pick_file()
        {
            let row_cap = self.control_panel.settings.row_cap;
            self.start_load(path, row_cap);
        }
    }

    /// Check for CSV loading results
    fn check_load_results(&mut self) {
        let Some(rx) = self.load_rx.take() else {
            return;
        };

        match rx.try_recv() {
            Ok(LoadResult::Complete { df, path, row_cap }) => {
                let rows = df.height();
                self.loader.set_dataframe(df, path, row_cap);
                let columns = self.loader.get_columns().len();
                self.control_panel.update_loaded(rows, columns);
                self.control_panel.set_progress(
                    100.0,
                    &format!("Loaded {} rows, {} columns", rows, columns),
                );
                if let Some(max) = self.loader.max_injured() {
                    info!(max_injured = max, "largest injured_persons value");
                }
                self.is_loading = false;
            }
            Ok(LoadResult::Error(error)) => {
                self.control_panel
                    .set_progress(0.0, &format!("Error: {}", error));
                self.is_loading = false;
            }
            Err(TryRecvError::Empty) => {
                // Still loading; put receiver back
                self.load_rx = Some(rx);
            }
            Err(TryRecvError::Disconnected) => {
                self.control_panel
                    .set_progress(0.0, "Error: loader thread exited unexpectedly");
                self.is_loading = false;
            }
        }
    }

    /// Compute everything the page shows for the current widget values.
    fn build_view(
        df: &DataFrame,
        min_injured: u32,
        hour: u32,
    ) -> Result<DashboardView, ProcessorError> {
        let injured = DataProcessor::filter_injured(df, min_injured)?;
        let injured_points = StatsCalculator::coordinates(&injured)?
            .into_iter()
            .map(|(lat, lon)| [lon, lat])
            .collect();

        let hour_df = DataProcessor::filter_hour(df, hour)?;
        let hour_points = StatsCalculator::coordinates(&hour_df)?;
        let midpoint = StatsCalculator::midpoint(&hour_df)?;
        let hex_bins = StatsCalculator::hexbin(&hour_points, HEX_RADIUS_M);
        let minute_hist = StatsCalculator::minute_histogram(&hour_df)?;

        // Rankings use the full collection, not the hour selection.
        let streets = DataProcessor::top_streets_all(df, TOP_STREETS)?;

        Ok(DashboardView {
            min_injured,
            hour,
            injured_points,
            hour_rows: hour_df.height(),
            midpoint,
            hex_bins,
            minute_hist,
            streets,
            raw_preview: RawTable::from_frame(&hour_df, RAW_PREVIEW_ROWS),
        })
    }

    /// Recompute the view when the relevant widgets changed.
    fn refresh_view(&mut self) {
        let Some(df) = self.loader.get_dataframe() else {
            return;
        };
        let widgets = &self.chart_viewer.widgets;
        let key = (widgets.min_injured, widgets.hour);
        if self.view_key == Some(key) {
            return;
        }

        match Self::build_view(df, key.0, key.1) {
            Ok(view) => self.chart_viewer.view = Some(view),
            Err(e) => {
                warn!("failed to filter collisions: {e}");
                self.control_panel
                    .set_progress(0.0, &format!("Error: {}", e));
            }
        }
        self.view_key = Some(key);
    }

    fn handle_export_json(&mut self) {
        let Some(view) = self.chart_viewer.view.as_ref() else {
            self.control_panel.set_progress(0.0, "Nothing to export");
            return;
        };

        let Some(output_path) = rfd::FileDialog::new()
            .add_filter("JSON", &["json"])
            .set_file_name("collisions_snapshot.json")
            .save_file()
        else {
            return;
        };

        let source = self.loader.get_file_path().cloned().unwrap_or_default();
        let snapshot = DashboardSnapshot::from_view(
            view,
            &source,
            self.loader.row_cap(),
            self.loader.get_row_count(),
        );

        match snapshot.write_json(&output_path) {
            Ok(()) => self
                .control_panel
                .set_progress(100.0, &format!("Exported {}", output_path.display())),
            Err(e) => self
                .control_panel
                .set_progress(0.0, &format!("Error: {}", e)),
        }
    }

    fn handle_export_png(&mut self) {
        let Some(view) = self.chart_viewer.view.as_ref() else {
            self.control_panel.set_progress(0.0, "Nothing to export");
            return;
        };

        let Some(output_path) = rfd::FileDialog::new()
            .add_filter("PNG Image", &["png"])
            .set_file_name(format!("collisions_minute_{:02}.png", view.hour))
            .save_file()
        else {
            return;
        };

        match export::write_minute_chart_png(view, &output_path) {
            Ok(()) => {
                self.control_panel
                    .set_progress(100.0, &format!("Exported {}", output_path.display()));
                if let Err(e) = open::that(&output_path) {
                    warn!("could not open exported chart: {e}");
                }
            }
            Err(e) => self
                .control_panel
                .set_progress(0.0, &format!("Error: {}", e)),
        }
    }
}

impl eframe::App for DashboardApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.check_load_results();
        self.refresh_view();

        if self.is_loading {
            ctx.request_repaint();
        }

        SidePanel::left("control_panel")
            .min_width(280.0)
            .max_width(320.0)
            .show(ctx, |ui| {
                egui::ScrollArea::vertical().show(ui, |ui| {
                    match self.control_panel.show(ui, self.is_loading) {
                        ControlPanelAction::BrowseCsv => self.handle_browse_csv(),
                        ControlPanelAction::ExportJson => self.handle_export_json(),
                        ControlPanelAction::ExportPng => self.handle_export_png(),
                        ControlPanelAction::None => {}
                    }
                });
            });

        egui::CentralPanel::default().show(ctx, |ui| {
            self.chart_viewer.show(ui);
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::test_support::fixture_frame;
    use crate::data::InjuryCategory;

    #[test]
    fn view_reflects_widget_values() {
        let df = fixture_frame();
        let view = DashboardApp::build_view(&df, 2, 9).unwrap();

        assert_eq!(view.injured_points.len(), 5);
        assert_eq!(view.hour_rows, 3);
        assert_eq!(view.minute_hist[5], 2);
        assert_eq!(view.minute_hist[17], 1);
        assert_eq!(view.hex_bins.iter().map(|b| b.count).sum::<usize>(), 3);
        assert_eq!(view.raw_preview.total_rows, 3);
        assert!(view.midpoint.is_some());
    }

    #[test]
    fn rankings_ignore_hour_selection() {
        let df = fixture_frame();
        let view = DashboardApp::build_view(&df, 0, 3).unwrap();

        assert_eq!(view.hour_rows, 0);
        assert_eq!(view.midpoint, None);
        assert!(view.hex_bins.is_empty());
        assert_eq!(view.streets_for(InjuryCategory::Pedestrians).len(), 5);
    }

    #[test]
    fn injury_points_are_longitude_first() {
        let df = fixture_frame();
        let view = DashboardApp::build_view(&df, 5, 0).unwrap();
        assert_eq!(view.injured_points, vec![[-74.1502, 40.5795]]);
    }
}
