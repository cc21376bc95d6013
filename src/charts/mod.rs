//! Charts module - Chart rendering

mod plotter;
mod renderer;

pub use plotter::{ChartPlotter, DashboardView, RawTable, RAW_PREVIEW_ROWS};
pub use renderer::{RenderError, StaticChartRenderer};
