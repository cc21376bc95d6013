//! Chart Viewer Widget
//! Central scrollable page: the dashboard sections with their widgets and charts.

use crate::charts::{ChartPlotter, DashboardView};
use crate::data::{DataProcessor, InjuryCategory};
use egui::{Color32, ComboBox, RichText, ScrollArea};

/// Upper bound of the injured-persons slider
pub const MAX_INJURED_SLIDER: u32 = 19;
const SECTION_SPACING: f32 = 20.0;

/// Values of the page widgets. Any change triggers a recompute of the view.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WidgetState {
    pub min_injured: u32,
    pub hour: u32,
    pub category: InjuryCategory,
    pub show_raw: bool,
}

/// Scrollable dashboard page.
#[derive(Default)]
pub struct ChartViewer {
    pub widgets: WidgetState,
    pub view: Option<DashboardView>,
}

impl ChartViewer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.view = None;
    }

    /// Draw the page. Widget edits are applied to `self.widgets` directly.
    pub fn show(&mut self, ui: &mut egui::Ui) {
        ScrollArea::vertical()
            .auto_shrink([false, false])
            .show(ui, |ui| {
                ui.heading(
                    RichText::new("Motor Vehicle Collisions in New York City")
                        .size(28.0)
                        .strong(),
                );
                ui.label(
                    RichText::new(
                        "A dashboard to visualise and analyse vehicle collisions in NYC.",
                    )
                    .size(16.0),
                );
                ui.add_space(SECTION_SPACING);

                let Some(view) = self.view.as_ref() else {
                    ui.centered_and_justified(|ui| {
                        ui.label(RichText::new("No Data").size(20.0));
                    });
                    return;
                };

                // ===== Injuries map =====
                ui.label(
                    RichText::new("Where are the most people injured in NYC?")
                        .size(20.0)
                        .strong(),
                );
                ui.add(
                    egui::Slider::new(&mut self.widgets.min_injured, 0..=MAX_INJURED_SLIDER)
                        .text("Number of people injured in vehicle collisions"),
                );
                ui.label(
                    RichText::new(format!("{} locations", view.injured_points.len()))
                        .size(11.0)
                        .color(Color32::GRAY),
                );
                ChartPlotter::draw_injury_map(ui, &view.injured_points);
                ui.add_space(SECTION_SPACING);

                // ===== Time of day =====
                ui.label(
                    RichText::new("How many collisions occur during a given time of day?")
                        .size(20.0)
                        .strong(),
                );
                ui.add(egui::Slider::new(&mut self.widgets.hour, 0..=23).text("Hour to look at"));

                let window = DataProcessor::hour_window_label(view.hour);
                ui.label(format!(
                    "Vehicle collisions between {} ({} collisions)",
                    window, view.hour_rows
                ));
                ChartPlotter::draw_density_map(ui, &view.hex_bins, view.midpoint);
                ui.add_space(SECTION_SPACING);

                ui.label(
                    RichText::new(format!("Breakdown by minute between {}", window))
                        .size(16.0)
                        .strong(),
                );
                ChartPlotter::draw_minute_chart(ui, &view.minute_hist);
                ui.add_space(SECTION_SPACING);

                // ===== Dangerous streets =====
                ui.label(
                    RichText::new("Top 5 dangerous streets by affected type of people")
                        .size(20.0)
                        .strong(),
                );
                ComboBox::from_label("Affected type of people")
                    .selected_text(self.widgets.category.label())
                    .show_ui(ui, |ui| {
                        for category in InjuryCategory::ALL {
                            ui.selectable_value(
                                &mut self.widgets.category,
                                category,
                                category.label(),
                            );
                        }
                    });
                ui.add_space(5.0);
                let category = self.widgets.category;
                ChartPlotter::draw_streets_table(ui, category, view.streets_for(category));
                ui.add_space(SECTION_SPACING);

                // ===== Raw data =====
                ui.checkbox(&mut self.widgets.show_raw, "Show Raw Data");
                if self.widgets.show_raw {
                    ui.label(RichText::new("Raw Data").size(16.0).strong());
                    ChartPlotter::draw_raw_table(ui, &view.raw_preview);
                }
            });
    }
}
