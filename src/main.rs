//! NYC Collisions Dashboard
//!
//! Loads a CSV of motor vehicle collision records and explores it with
//! interactive maps, a per-minute breakdown and a dangerous-streets ranking.

mod charts;
mod config;
mod data;
mod export;
mod gui;
mod stats;

use clap::Parser;
use config::Cli;
use eframe::egui;
use gui::DashboardApp;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

/// Initialize logging, preferring an explicit level over `RUST_LOG`.
fn init_logging(log_level: Option<&str>) {
    let filter = match log_level {
        Some(level) => EnvFilter::new(level),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
    };
    fmt::Subscriber::builder().with_env_filter(filter).init();
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.log_level.as_deref());
    info!(data = %cli.data.display(), rows = cli.rows, "starting dashboard");

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1400.0, 900.0])
            .with_min_inner_size([1000.0, 700.0])
            .with_title("Motor Vehicle Collisions in New York City"),
        ..Default::default()
    };

    eframe::run_native(
        "Collision Dashboard",
        options,
        Box::new(move |cc| Ok(Box::new(DashboardApp::new(cc, &cli)))),
    )
    .map_err(|e| anyhow::anyhow!("dashboard exited with error: {e}"))
}
