//! Control Panel Widget
//! Left side panel with the data source, exports and load status.

use egui::{Color32, RichText};
use std::path::PathBuf;

/// Data source settings
#[derive(Default, Clone)]
pub struct SourceSettings {
    pub csv_path: Option<PathBuf>,
    pub row_cap: usize,
}

/// Left side control panel with file selection and export controls.
pub struct ControlPanel {
    pub settings: SourceSettings,
    pub loaded_rows: usize,
    pub column_count: usize,
    pub progress: f32,
    pub status: String,
    pub export_enabled: bool,
}

impl Default for ControlPanel {
    fn default() -> Self {
        Self {
            settings: SourceSettings::default(),
            loaded_rows: 0,
            column_count: 0,
            progress: 0.0,
            status: "Ready".to_string(),
            export_enabled: false,
        }
    }
}

impl ControlPanel {
    pub fn new(csv_path: PathBuf, row_cap: usize) -> Self {
        Self {
            settings: SourceSettings {
                csv_path: Some(csv_path),
                row_cap,
            },
            ..Self::default()
        }
    }

    /// Record the shape of a freshly loaded collection
    pub fn update_loaded(&mut self, rows: usize, columns: usize) {
        self.loaded_rows = rows;
        self.column_count = columns;
        self.export_enabled = rows > 0;
    }

    /// Draw the control panel
    pub fn show(&mut self, ui: &mut egui::Ui, is_loading: bool) -> ControlPanelAction {
        let mut action = ControlPanelAction::None;

        ui.vertical_centered(|ui| {
            ui.add_space(5.0);
            ui.label(
                RichText::new("🚗 NYC Collisions")
                    .size(22.0)
                    .color(Color32::from_rgb(100, 149, 237)),
            );
        });
        ui.add_space(10.0);
        ui.separator();
        ui.add_space(5.0);

        // ===== Data Source Section =====
        ui.label(RichText::new("📁 Data Source").size(14.0).strong());
        ui.add_space(5.0);

        egui::Frame::none()
            .fill(ui.visuals().widgets.noninteractive.bg_fill)
            .rounding(5.0)
            .inner_margin(8.0)
            .show(ui, |ui| {
                ui.horizontal(|ui| {
                    let path_text = self
                        .settings
                        .csv_path
                        .as_ref()
                        .and_then(|p| p.file_name())
                        .map(|n| n.to_string_lossy().to_string())
                        .unwrap_or_else(|| "No file selected".to_string());

                    ui.label(RichText::new(&path_text).size(12.0));

                    ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                        ui.add_enabled_ui(!is_loading, |ui| {
                            if ui.button("📂 Browse").clicked() {
                                action = ControlPanelAction::BrowseCsv;
                            }
                        });
                    });
                });
            });

        ui.add_space(8.0);
        egui::Grid::new("source_info")
            .num_columns(2)
            .spacing([12.0, 4.0])
            .show(ui, |ui| {
                ui.label("Row cap:");
                ui.label(self.settings.row_cap.to_string());
                ui.end_row();
                ui.label("Loaded rows:");
                ui.label(self.loaded_rows.to_string());
                ui.end_row();
                ui.label("Columns:");
                ui.label(self.column_count.to_string());
                ui.end_row();
            });

        ui.add_space(15.0);
        ui.separator();
        ui.add_space(10.0);

        // ===== Export Section =====
        ui.label(RichText::new("💾 Export").size(14.0).strong());
        ui.add_space(5.0);

        ui.vertical_centered(|ui| {
            ui.add_enabled_ui(self.export_enabled && !is_loading, |ui| {
                let json_label = RichText::new("📄 Snapshot (JSON)").size(14.0);
                let json_button = egui::Button::new(json_label)
                    .min_size(egui::vec2(180.0, 30.0));
                if ui.add(json_button).clicked() {
                    action = ControlPanelAction::ExportJson;
                }

                ui.add_space(6.0);

                let png_label = RichText::new("🖼 Minute Chart (PNG)").size(14.0);
                let png_button = egui::Button::new(png_label)
                    .min_size(egui::vec2(180.0, 30.0));
                if ui.add(png_button).clicked() {
                    action = ControlPanelAction::ExportPng;
                }
            });
        });

        ui.add_space(15.0);
        ui.separator();
        ui.add_space(10.0);

        // ===== Status Section =====
        ui.label(RichText::new("📊 Status").size(14.0).strong());
        ui.add_space(5.0);

        ui.add(
            egui::ProgressBar::new(self.progress / 100.0)
                .show_percentage()
                .animate(is_loading),
        );

        ui.add_space(5.0);

        let status_color = if self.status.contains("Error") {
            Color32::from_rgb(220, 53, 69)
        } else if self.status.starts_with("Loaded") || self.status.starts_with("Exported") {
            Color32::from_rgb(40, 167, 69)
        } else {
            Color32::GRAY
        };
        ui.label(RichText::new(&self.status).size(11.0).color(status_color));

        action
    }

    /// Set progress and status
    pub fn set_progress(&mut self, progress: f32, status: &str) {
        self.progress = progress;
        self.status = status.to_string();
    }
}

/// Actions triggered by control panel
#[derive(Debug, Clone, PartialEq)]
pub enum ControlPanelAction {
    None,
    BrowseCsv,
    ExportJson,
    ExportPng,
}
