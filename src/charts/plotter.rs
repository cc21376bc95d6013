//! Chart Plotter Module
//! Draws the dashboard maps, bar chart and tables using egui_plot.

use crate::data::{InjuryCategory, StreetRanking};
use crate::stats::{HexBin, MINUTES_PER_HOUR};
use egui::{Color32, RichText};
use egui_plot::{Bar, BarChart, Legend, Plot, PlotPoints, Points, Polygon};
use polars::prelude::*;

/// Map point color
pub const POINT_COLOR: Color32 = Color32::from_rgb(231, 76, 60);
/// Bar color for the minute breakdown
pub const BAR_COLOR: Color32 = Color32::from_rgb(99, 110, 250);

/// Density color ramp, low to high elevation.
pub const DENSITY_PALETTE: [Color32; 6] = [
    Color32::from_rgb(1, 152, 189),
    Color32::from_rgb(73, 227, 206),
    Color32::from_rgb(216, 254, 181),
    Color32::from_rgb(254, 237, 177),
    Color32::from_rgb(254, 173, 84),
    Color32::from_rgb(209, 55, 78),
];

/// Initial map centre when there is nothing to average.
pub const NYC_CENTER: (f64, f64) = (40.7128, -74.0060);
/// Half-width, in degrees of latitude, of the initial density map view.
const MAP_HALF_SPAN: f64 = 0.08;
const MAP_HEIGHT: f32 = 380.0;

/// Rows shown in the raw data table
pub const RAW_PREVIEW_ROWS: usize = 100;

/// A frame rendered to strings for display.
#[derive(Clone, Debug, Default)]
pub struct RawTable {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
    pub total_rows: usize,
}

impl RawTable {
    /// Stringify the first `limit` rows of `df`.
    pub fn from_frame(df: &DataFrame, limit: usize) -> Self {
        let preview = df.head(Some(limit));
        let columns = preview
            .get_column_names()
            .iter()
            .map(|s| s.to_string())
            .collect();

        let rows = (0..preview.height())
            .map(|i| {
                preview
                    .get_columns()
                    .iter()
                    .map(|col| match col.get(i) {
                        Ok(val) if !val.is_null() => val.to_string().trim_matches('"').to_string(),
                        _ => String::new(),
                    })
                    .collect()
            })
            .collect();

        Self {
            columns,
            rows,
            total_rows: df.height(),
        }
    }
}

/// Everything the page needs for one combination of widget values.
#[derive(Clone, Debug)]
pub struct DashboardView {
    pub min_injured: u32,
    pub hour: u32,
    /// Injury map points as `[longitude, latitude]`.
    pub injured_points: Vec<[f64; 2]>,
    pub hour_rows: usize,
    pub midpoint: Option<(f64, f64)>,
    pub hex_bins: Vec<HexBin>,
    pub minute_hist: [u32; MINUTES_PER_HOUR],
    pub streets: Vec<(InjuryCategory, Vec<StreetRanking>)>,
    pub raw_preview: RawTable,
}

impl DashboardView {
    pub fn streets_for(&self, category: InjuryCategory) -> &[StreetRanking] {
        self.streets
            .iter()
            .find(|(c, _)| *c == category)
            .map(|(_, rows)| rows.as_slice())
            .unwrap_or_default()
    }
}

/// Creates the interactive dashboard charts.
pub struct ChartPlotter;

impl ChartPlotter {
    /// Color for a density bin given the largest elevation on the map.
    pub fn density_color(elevation: f64, max_elevation: f64) -> Color32 {
        if max_elevation <= 0.0 {
            return DENSITY_PALETTE[0];
        }
        let last = DENSITY_PALETTE.len() - 1;
        let idx = ((elevation / max_elevation) * last as f64).round() as usize;
        DENSITY_PALETTE[idx.min(last)]
    }

    /// Scatter map of collision locations.
    pub fn draw_injury_map(ui: &mut egui::Ui, points: &[[f64; 2]]) {
        let aspect = Self::map_aspect(NYC_CENTER.0);

        Plot::new("injury_map")
            .height(MAP_HEIGHT)
            .data_aspect(aspect)
            .allow_scroll(false)
            .x_axis_label("Longitude")
            .y_axis_label("Latitude")
            .label_formatter(|_name, value| format!("lat {:.4}\nlon {:.4}", value.y, value.x))
            .show(ui, |plot_ui| {
                if points.is_empty() {
                    return;
                }
                plot_ui.points(
                    Points::new(PlotPoints::from(points.to_vec()))
                        .radius(2.0)
                        .color(POINT_COLOR.gamma_multiply(0.7))
                        .name("Collisions"),
                );
            });
    }

    /// Hexagon density map centred on the midpoint of the selected hour.
    pub fn draw_density_map(ui: &mut egui::Ui, bins: &[HexBin], midpoint: Option<(f64, f64)>) {
        let (center_lat, center_lon) = midpoint.unwrap_or(NYC_CENTER);
        let aspect = Self::map_aspect(center_lat);
        let max_elevation = bins.iter().map(|b| b.elevation).fold(0.0, f64::max);

        Plot::new("density_map")
            .height(MAP_HEIGHT)
            .data_aspect(aspect)
            .allow_scroll(false)
            .include_x(center_lon - MAP_HALF_SPAN * aspect as f64)
            .include_x(center_lon + MAP_HALF_SPAN * aspect as f64)
            .include_y(center_lat - MAP_HALF_SPAN)
            .include_y(center_lat + MAP_HALF_SPAN)
            .x_axis_label("Longitude")
            .y_axis_label("Latitude")
            .show(ui, |plot_ui| {
                for bin in bins {
                    let color = Self::density_color(bin.elevation, max_elevation);
                    plot_ui.polygon(
                        Polygon::new(PlotPoints::from(bin.corners.clone()))
                            .fill_color(color.gamma_multiply(0.8))
                            .stroke(egui::Stroke::new(0.5, color))
                            .name(format!("{} collisions", bin.count)),
                    );
                }
            });
    }

    /// Bar chart of crashes per minute.
    pub fn draw_minute_chart(ui: &mut egui::Ui, hist: &[u32; MINUTES_PER_HOUR]) {
        let bars: Vec<Bar> = hist
            .iter()
            .enumerate()
            .map(|(minute, &crashes)| {
                Bar::new(minute as f64, crashes as f64)
                    .width(0.8)
                    .name(format!("minute {minute}"))
            })
            .collect();

        Plot::new("minute_chart")
            .height(400.0)
            .allow_scroll(false)
            .allow_drag(false)
            .include_y(0.0)
            .x_axis_label("minute")
            .y_axis_label("crashes")
            .legend(Legend::default())
            .label_formatter(|_name, value| {
                format!("minute={:.0}\ncrashes={:.0}", value.x.round(), value.y)
            })
            .show(ui, |plot_ui| {
                plot_ui.bar_chart(BarChart::new(bars).color(BAR_COLOR).name("crashes"));
            });
    }

    /// Dangerous streets for one category.
    pub fn draw_streets_table(
        ui: &mut egui::Ui,
        category: InjuryCategory,
        rows: &[StreetRanking],
    ) {
        if rows.is_empty() {
            ui.label(RichText::new("No injuries recorded").color(Color32::GRAY));
            return;
        }

        egui::Grid::new(ui.make_persistent_id(format!("streets_{}", category.column())))
            .striped(true)
            .min_col_width(80.0)
            .spacing([16.0, 4.0])
            .show(ui, |ui| {
                ui.label(RichText::new(crate::data::columns::ON_STREET_NAME).strong());
                ui.label(RichText::new(category.column()).strong());
                ui.end_row();

                for row in rows {
                    ui.label(&row.street);
                    ui.label(row.injured.to_string());
                    ui.end_row();
                }
            });
    }

    /// Scrollable table of raw rows.
    pub fn draw_raw_table(ui: &mut egui::Ui, table: &RawTable) {
        ui.label(
            RichText::new(format!(
                "Showing {} of {} rows",
                table.rows.len(),
                table.total_rows
            ))
            .size(11.0)
            .color(Color32::GRAY),
        );

        egui::ScrollArea::both()
            .id_salt("raw_data")
            .max_height(320.0)
            .show(ui, |ui| {
                egui::Grid::new("raw_table")
                    .striped(true)
                    .spacing([12.0, 2.0])
                    .show(ui, |ui| {
                        for name in &table.columns {
                            ui.label(RichText::new(name).strong().size(11.0));
                        }
                        ui.end_row();

                        for row in &table.rows {
                            for cell in row {
                                ui.label(RichText::new(cell).size(11.0));
                            }
                            ui.end_row();
                        }
                    });
            });
    }

    /// Plot units per degree so that map distances look right at `latitude`.
    fn map_aspect(latitude: f64) -> f32 {
        (1.0 / latitude.to_radians().cos()) as f32
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::test_support::fixture_frame;
    use crate::data::DataProcessor;

    #[test]
    fn density_color_spans_palette() {
        assert_eq!(ChartPlotter::density_color(0.0, 4000.0), DENSITY_PALETTE[0]);
        assert_eq!(ChartPlotter::density_color(4000.0, 4000.0), DENSITY_PALETTE[5]);
        assert_eq!(ChartPlotter::density_color(10.0, 0.0), DENSITY_PALETTE[0]);
    }

    #[test]
    fn raw_table_previews_rows() {
        let df = fixture_frame();
        let hour = DataProcessor::filter_hour(&df, 9).unwrap();
        let table = RawTable::from_frame(&hour, 2);

        assert_eq!(table.total_rows, 3);
        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.columns[0], "date/time");
        assert!(table.rows.iter().all(|r| r.len() == table.columns.len()));

        let street_idx = table
            .columns
            .iter()
            .position(|c| c == "on_street_name")
            .unwrap();
        assert_eq!(table.rows[0][street_idx], "ATLANTIC AVENUE");
    }
}
