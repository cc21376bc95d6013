//! Statistics Calculator Module
//! Aggregations behind the charts: per-minute histogram, map midpoint and
//! hexagonal density bins.

use crate::data::columns::{LATITUDE, LONGITUDE, TIMESTAMP};
use polars::prelude::*;
use serde::Serialize;
use statrs::statistics::Statistics;
use std::collections::HashMap;

/// Number of minute bins in an hour.
pub const MINUTES_PER_HOUR: usize = 60;

/// Hexagon radius used by the density map, in meters.
pub const HEX_RADIUS_M: f64 = 100.0;
/// Elevation range bins are mapped into before scaling.
pub const ELEVATION_RANGE: (f64, f64) = (0.0, 1000.0);
pub const ELEVATION_SCALE: f64 = 4.0;

const METERS_PER_DEGREE: f64 = 111_320.0;

/// One hexagonal cell of the density map.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HexBin {
    pub latitude: f64,
    pub longitude: f64,
    pub count: usize,
    pub elevation: f64,
    /// Corner positions as `[longitude, latitude]`.
    pub corners: Vec<[f64; 2]>,
}

/// Local equirectangular projection around a reference point.
#[derive(Debug, Clone, Copy)]
struct Projection {
    lat0: f64,
    lon0: f64,
    cos_lat0: f64,
}

impl Projection {
    fn new(lat0: f64, lon0: f64) -> Self {
        Self {
            lat0,
            lon0,
            cos_lat0: lat0.to_radians().cos(),
        }
    }

    fn to_meters(&self, lat: f64, lon: f64) -> (f64, f64) {
        (
            (lon - self.lon0) * self.cos_lat0 * METERS_PER_DEGREE,
            (lat - self.lat0) * METERS_PER_DEGREE,
        )
    }

    fn to_degrees(&self, x: f64, y: f64) -> (f64, f64) {
        (
            self.lat0 + y / METERS_PER_DEGREE,
            self.lon0 + x / (self.cos_lat0 * METERS_PER_DEGREE),
        )
    }
}

/// Handles the aggregations used by the dashboard charts.
pub struct StatsCalculator;

impl StatsCalculator {
    /// Count collisions per minute of the hour.
    ///
    /// The bins sum to the number of rows with a timestamp.
    pub fn minute_histogram(df: &DataFrame) -> PolarsResult<[u32; MINUTES_PER_HOUR]> {
        let minutes = df
            .clone()
            .lazy()
            .select([col(TIMESTAMP)
                .dt()
                .minute()
                .cast(DataType::Int32)
                .alias("minute")])
            .collect()?;

        let mut hist = [0u32; MINUTES_PER_HOUR];
        for minute in minutes.column("minute")?.i32()?.into_iter().flatten() {
            if let Some(bin) = usize::try_from(minute)
                .ok()
                .and_then(|m| hist.get_mut(m))
            {
                *bin += 1;
            }
        }
        Ok(hist)
    }

    /// Coordinate pairs as `(latitude, longitude)`.
    pub fn coordinates(df: &DataFrame) -> PolarsResult<Vec<(f64, f64)>> {
        let lat = df.column(LATITUDE)?.cast(&DataType::Float64)?;
        let lon = df.column(LONGITUDE)?.cast(&DataType::Float64)?;

        Ok(lat
            .f64()?
            .into_iter()
            .zip(lon.f64()?.into_iter())
            .filter_map(|(lat, lon)| Some((lat?, lon?)))
            .collect())
    }

    /// Mean latitude and longitude, or `None` for an empty frame.
    pub fn midpoint(df: &DataFrame) -> PolarsResult<Option<(f64, f64)>> {
        Ok(Self::midpoint_of(&Self::coordinates(df)?))
    }

    fn midpoint_of(points: &[(f64, f64)]) -> Option<(f64, f64)> {
        if points.is_empty() {
            return None;
        }
        let lat = points.iter().map(|p| p.0).mean();
        let lon = points.iter().map(|p| p.1).mean();
        Some((lat, lon))
    }

    /// Aggregate points into pointy-top hexagons of circumradius `radius_m`.
    ///
    /// Bins are ordered by descending count, then by grid position.
    pub fn hexbin(points: &[(f64, f64)], radius_m: f64) -> Vec<HexBin> {
        let Some((lat0, lon0)) = Self::midpoint_of(points) else {
            return Vec::new();
        };
        if radius_m <= 0.0 {
            return Vec::new();
        }

        let proj = Projection::new(lat0, lon0);
        let mut counts: HashMap<(i64, i64), usize> = HashMap::new();

        for &(lat, lon) in points {
            let (x, y) = proj.to_meters(lat, lon);
            let q = (3f64.sqrt() / 3.0 * x - y / 3.0) / radius_m;
            let r = (2.0 / 3.0 * y) / radius_m;
            *counts.entry(Self::axial_round(q, r)).or_default() += 1;
        }

        let min = counts.values().copied().min().unwrap_or(0);
        let max = counts.values().copied().max().unwrap_or(0);

        let mut cells: Vec<((i64, i64), usize)> = counts.into_iter().collect();
        cells.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));

        cells
            .into_iter()
            .map(|((q, r), count)| {
                let cx = radius_m * 3f64.sqrt() * (q as f64 + r as f64 / 2.0);
                let cy = radius_m * 1.5 * r as f64;
                let (latitude, longitude) = proj.to_degrees(cx, cy);

                let corners = (0..6)
                    .map(|i| {
                        let angle = (60.0 * i as f64 - 30.0).to_radians();
                        let (lat, lon) = proj.to_degrees(
                            cx + radius_m * angle.cos(),
                            cy + radius_m * angle.sin(),
                        );
                        [lon, lat]
                    })
                    .collect();

                HexBin {
                    latitude,
                    longitude,
                    count,
                    elevation: Self::elevation(count, min, max),
                    corners,
                }
            })
            .collect()
    }

    /// Linear map of a bin count into the scaled elevation range.
    fn elevation(count: usize, min: usize, max: usize) -> f64 {
        let (low, high) = ELEVATION_RANGE;
        let ratio = if max > min {
            (count - min) as f64 / (max - min) as f64
        } else {
            1.0
        };
        (low + ratio * (high - low)) * ELEVATION_SCALE
    }

    /// Round fractional axial coordinates to the containing hexagon.
    fn axial_round(q: f64, r: f64) -> (i64, i64) {
        let s = -q - r;
        let (mut rq, mut rr, rs) = (q.round(), r.round(), s.round());
        let (dq, dr, ds) = ((rq - q).abs(), (rr - r).abs(), (rs - s).abs());

        if dq > dr && dq > ds {
            rq = -rr - rs;
        } else if dr > ds {
            rr = -rq - rs;
        }
        (rq as i64, rr as i64)
    }
}
