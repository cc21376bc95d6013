//! Data Processor Module
//! Derives the filtered views the dashboard renders. Every operation returns
//! a new DataFrame; the loaded collection is never modified.

use super::loader::{INJURED_PERSONS, LATITUDE, LONGITUDE, ON_STREET_NAME, TIMESTAMP};
use polars::prelude::*;
use rayon::prelude::*;
use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProcessorError {
    #[error("Polars error: {0}")]
    PolarsError(#[from] PolarsError),
    #[error("Hour must be between 0 and 23, got {0}")]
    InvalidHour(u32),
}

/// Type of people affected by a collision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum InjuryCategory {
    Pedestrians,
    Cyclists,
    Motorists,
}

impl Default for InjuryCategory {
    fn default() -> Self {
        InjuryCategory::Pedestrians
    }
}

impl InjuryCategory {
    pub const ALL: [InjuryCategory; 3] = [
        InjuryCategory::Pedestrians,
        InjuryCategory::Cyclists,
        InjuryCategory::Motorists,
    ];

    /// Injury count column for this category.
    pub fn column(self) -> &'static str {
        match self {
            InjuryCategory::Pedestrians => "injured_pedestrians",
            InjuryCategory::Cyclists => "injured_cyclists",
            InjuryCategory::Motorists => "injured_motorists",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            InjuryCategory::Pedestrians => "Pedestrians",
            InjuryCategory::Cyclists => "Cyclists",
            InjuryCategory::Motorists => "Motorists",
        }
    }
}

/// One row of a dangerous-streets ranking.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StreetRanking {
    pub street: String,
    pub injured: i64,
}

/// Filtering and ranking operations over the collision collection.
pub struct DataProcessor;

impl DataProcessor {
    /// Coordinates of collisions with at least `min_injured` injured persons.
    ///
    /// Output columns: [latitude, longitude]
    pub fn filter_injured(df: &DataFrame, min_injured: u32) -> Result<DataFrame, ProcessorError> {
        let filtered = df
            .clone()
            .lazy()
            .filter(
                col(INJURED_PERSONS)
                    .cast(DataType::Int64)
                    .gt_eq(lit(i64::from(min_injured))),
            )
            .select([col(LATITUDE), col(LONGITUDE)])
            .filter(col(LATITUDE).is_not_null().and(col(LONGITUDE).is_not_null()))
            .collect()?;
        Ok(filtered)
    }

    /// Collisions whose timestamp falls within `hour` (0-23). All columns are kept.
    pub fn filter_hour(df: &DataFrame, hour: u32) -> Result<DataFrame, ProcessorError> {
        if hour > 23 {
            return Err(ProcessorError::InvalidHour(hour));
        }

        let filtered = df
            .clone()
            .lazy()
            .filter(
                col(TIMESTAMP)
                    .dt()
                    .hour()
                    .cast(DataType::Int32)
                    .eq(lit(hour as i32)),
            )
            .collect()?;
        Ok(filtered)
    }

    /// Streets with the most injured people of `category`.
    ///
    /// Only collisions with at least one injury of that type are considered.
    /// Rows are sorted descending by injury count (ties keep source order),
    /// rows with a missing street or count are dropped, then the first
    /// `limit` are returned.
    ///
    /// Output columns: [on_street_name, <category column>]
    pub fn top_streets(
        df: &DataFrame,
        category: InjuryCategory,
        limit: usize,
    ) -> Result<DataFrame, ProcessorError> {
        let count_col = category.column();
        let ranked = df
            .clone()
            .lazy()
            .select([
                col(ON_STREET_NAME).cast(DataType::String),
                col(count_col).cast(DataType::Int64),
            ])
            .filter(col(count_col).gt_eq(lit(1i64)))
            .sort(
                [count_col],
                SortMultipleOptions::default()
                    .with_order_descending(true)
                    .with_maintain_order(true),
            )
            .filter(col(ON_STREET_NAME).is_not_null().and(col(count_col).is_not_null()))
            .limit(limit as IdxSize)
            .collect()?;
        Ok(ranked)
    }

    /// Rankings for every injury category, computed in parallel.
    pub fn top_streets_all(
        df: &DataFrame,
        limit: usize,
    ) -> Result<Vec<(InjuryCategory, Vec<StreetRanking>)>, ProcessorError> {
        InjuryCategory::ALL
            .par_iter()
            .map(|&category| -> Result<_, ProcessorError> {
                let ranked = Self::top_streets(df, category, limit)?;
                Ok((category, Self::street_rows(&ranked, category)?))
            })
            .collect()
    }

    /// Convert a frame produced by [`DataProcessor::top_streets`] into rows.
    pub fn street_rows(
        ranked: &DataFrame,
        category: InjuryCategory,
    ) -> Result<Vec<StreetRanking>, ProcessorError> {
        let streets = ranked.column(ON_STREET_NAME)?.str()?;
        let counts = ranked.column(category.column())?.i64()?;

        Ok(streets
            .into_iter()
            .zip(counts.into_iter())
            .filter_map(|(street, injured)| {
                Some(StreetRanking {
                    street: street?.to_string(),
                    injured: injured?,
                })
            })
            .collect())
    }

    /// Caption for the selected hour window, e.g. `"23:00 and 0:00"`.
    pub fn hour_window_label(hour: u32) -> String {
        format!("{}:00 and {}:00", hour, (hour + 1) % 24)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::test_support::fixture_frame;

    #[test]
    fn injured_threshold_zero_keeps_every_row() {
        let df = fixture_frame();
        let filtered = DataProcessor::filter_injured(&df, 0).unwrap();
        assert_eq!(filtered.height(), df.height());
        assert_eq!(filtered.width(), 2);
    }

    #[test]
    fn injured_threshold_above_maximum_is_empty() {
        let df = fixture_frame();
        assert_eq!(DataProcessor::filter_injured(&df, 5).unwrap().height(), 1);
        assert_eq!(DataProcessor::filter_injured(&df, 6).unwrap().height(), 0);
        assert_eq!(DataProcessor::filter_injured(&df, 19).unwrap().height(), 0);
    }

    #[test]
    fn injured_threshold_is_inclusive() {
        let df = fixture_frame();
        // Counts among rows with coordinates: 2,1,0,4,1,2,5,1,0,2
        assert_eq!(DataProcessor::filter_injured(&df, 2).unwrap().height(), 5);
    }

    #[test]
    fn hour_filter_matches_timestamp_hour() {
        let df = fixture_frame();
        assert_eq!(DataProcessor::filter_hour(&df, 9).unwrap().height(), 3);
        assert_eq!(DataProcessor::filter_hour(&df, 14).unwrap().height(), 4);
        assert_eq!(DataProcessor::filter_hour(&df, 3).unwrap().height(), 0);

        let filtered = DataProcessor::filter_hour(&df, 0).unwrap();
        assert_eq!(filtered.height(), 1);
        assert_eq!(filtered.width(), df.width());
    }

    #[test]
    fn hour_out_of_range_is_rejected() {
        let df = fixture_frame();
        assert!(matches!(
            DataProcessor::filter_hour(&df, 24),
            Err(ProcessorError::InvalidHour(24))
        ));
    }

    #[test]
    fn top_pedestrian_streets_sorted_descending_and_stable() {
        let df = fixture_frame();
        let ranked = DataProcessor::top_streets(&df, InjuryCategory::Pedestrians, 5).unwrap();
        let rows = DataProcessor::street_rows(&ranked, InjuryCategory::Pedestrians).unwrap();

        let expected = [
            ("FLATBUSH AVENUE", 3),
            ("BROADWAY", 2),
            ("ATLANTIC AVENUE", 1),
            ("7 AVENUE", 1),
            ("ATLANTIC AVENUE", 1),
        ];
        assert_eq!(rows.len(), expected.len());
        for (row, (street, injured)) in rows.iter().zip(expected) {
            assert_eq!(row.street, street);
            assert_eq!(row.injured, injured);
        }
    }

    #[test]
    fn top_streets_drop_missing_street_names() {
        let df = fixture_frame();
        let ranked = DataProcessor::top_streets(&df, InjuryCategory::Cyclists, 5).unwrap();
        let rows = DataProcessor::street_rows(&ranked, InjuryCategory::Cyclists).unwrap();
        assert_eq!(
            rows,
            vec![StreetRanking {
                street: "BROADWAY".to_string(),
                injured: 1
            }]
        );
    }

    #[test]
    fn top_streets_respect_limit() {
        let df = fixture_frame();
        let ranked = DataProcessor::top_streets(&df, InjuryCategory::Pedestrians, 2).unwrap();
        assert_eq!(ranked.height(), 2);
    }

    #[test]
    fn all_rankings_cover_each_category() {
        let df = fixture_frame();
        let all = DataProcessor::top_streets_all(&df, 5).unwrap();
        assert_eq!(all.len(), 3);

        let motorists = all
            .iter()
            .find(|(c, _)| *c == InjuryCategory::Motorists)
            .map(|(_, rows)| rows.clone())
            .unwrap();
        assert_eq!(motorists[0].street, "HYLAN BOULEVARD");
        assert_eq!(motorists[0].injured, 5);
        assert_eq!(motorists.len(), 3);
    }

    #[test]
    fn hour_window_wraps_at_midnight() {
        assert_eq!(DataProcessor::hour_window_label(9), "9:00 and 10:00");
        assert_eq!(DataProcessor::hour_window_label(23), "23:00 and 0:00");
    }
}
