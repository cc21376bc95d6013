//! Static Chart Renderer
//! Renders the per-minute breakdown to a PNG image with plotters.

use crate::data::DataProcessor;
use crate::stats::MINUTES_PER_HOUR;
use image::{ImageFormat, RgbImage};
use plotters::prelude::*;
use std::io::Cursor;
use thiserror::Error;

const BAR_COLOR: RGBColor = RGBColor(99, 110, 250);

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("Histogram must have 60 bins, got {0}")]
    InvalidHistogram(usize),
    #[error("Image size must be non-zero")]
    EmptyImage,
    #[error("Drawing failed: {0}")]
    Draw(String),
    #[error("PNG encoding failed: {0}")]
    Encode(#[from] image::ImageError),
}

fn draw_err<E: std::fmt::Display>(err: E) -> RenderError {
    RenderError::Draw(err.to_string())
}

pub struct StaticChartRenderer;

impl StaticChartRenderer {
    /// Render the minute histogram of `hour` as PNG bytes.
    pub fn render_minute_histogram_png(
        hist: &[u32],
        hour: u32,
        width: u32,
        height: u32,
    ) -> Result<Vec<u8>, RenderError> {
        if hist.len() != MINUTES_PER_HOUR {
            return Err(RenderError::InvalidHistogram(hist.len()));
        }
        if width == 0 || height == 0 {
            return Err(RenderError::EmptyImage);
        }

        let mut buffer = vec![0u8; width as usize * height as usize * 3];
        {
            let root =
                BitMapBackend::with_buffer(&mut buffer, (width, height)).into_drawing_area();
            root.fill(&WHITE).map_err(draw_err)?;

            let y_max = Self::y_axis_max(hist);
            let mut chart = ChartBuilder::on(&root)
                .caption(
                    format!(
                        "Breakdown by minute between {}",
                        DataProcessor::hour_window_label(hour)
                    ),
                    ("sans-serif", 22),
                )
                .margin(15)
                .x_label_area_size(40)
                .y_label_area_size(50)
                .build_cartesian_2d(
                    (0u32..MINUTES_PER_HOUR as u32 - 1).into_segmented(),
                    0u32..y_max,
                )
                .map_err(draw_err)?;

            chart
                .configure_mesh()
                .disable_x_mesh()
                .x_desc("minute")
                .y_desc("crashes")
                .draw()
                .map_err(draw_err)?;

            chart
                .draw_series(
                    Histogram::vertical(&chart)
                        .style(BAR_COLOR.filled())
                        .margin(2)
                        .data(hist.iter().enumerate().map(|(m, &c)| (m as u32, c))),
                )
                .map_err(draw_err)?;

            root.present().map_err(draw_err)?;
        }

        Self::encode_png(width, height, buffer)
    }

    /// Upper bound of the count axis with some headroom above the tallest bar.
    fn y_axis_max(hist: &[u32]) -> u32 {
        let max = hist.iter().copied().max().unwrap_or(0);
        max + max / 10 + 1
    }

    /// Encode a packed RGB buffer as PNG.
    fn encode_png(width: u32, height: u32, buffer: Vec<u8>) -> Result<Vec<u8>, RenderError> {
        let img = RgbImage::from_raw(width, height, buffer).ok_or(RenderError::EmptyImage)?;
        let mut bytes = Vec::new();
        img.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)?;
        Ok(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_wrong_bin_count() {
        let err = StaticChartRenderer::render_minute_histogram_png(&[1, 2, 3], 9, 800, 400)
            .unwrap_err();
        assert!(matches!(err, RenderError::InvalidHistogram(3)));
    }

    #[test]
    fn rejects_empty_image() {
        let hist = [0u32; MINUTES_PER_HOUR];
        assert!(matches!(
            StaticChartRenderer::render_minute_histogram_png(&hist, 9, 0, 400),
            Err(RenderError::EmptyImage)
        ));
    }

    #[test]
    fn y_axis_leaves_headroom() {
        assert_eq!(StaticChartRenderer::y_axis_max(&[0; 60]), 1);
        let mut hist = [0u32; MINUTES_PER_HOUR];
        hist[17] = 40;
        assert_eq!(StaticChartRenderer::y_axis_max(&hist), 45);
    }

    #[test]
    fn encodes_png_signature() {
        let bytes = StaticChartRenderer::encode_png(2, 2, vec![255; 12]).unwrap();
        assert_eq!(&bytes[..8], b"\x89PNG\r\n\x1a\n");
    }

    #[test]
    fn short_buffer_is_rejected() {
        assert!(StaticChartRenderer::encode_png(4, 4, vec![0; 3]).is_err());
    }
}
