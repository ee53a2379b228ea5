#![allow(dead_code)]

pub mod mock_registry;
pub mod mock_transport;
pub mod mock_weather;

use chrono::{FixedOffset, TimeZone};
use surfwatch::core::WaveSample;

/// Builds samples for one local day at UTC+2, one per entry.
pub fn samples(hours: &[u32], heights: &[f64], periods: &[f64]) -> Vec<WaveSample> {
    assert_eq!(hours.len(), heights.len());
    assert_eq!(hours.len(), periods.len());
    let offset = FixedOffset::east_opt(2 * 3600).unwrap();
    hours
        .iter()
        .zip(heights)
        .zip(periods)
        .map(|((&hour, &height), &period)| WaveSample {
            timestamp: offset.with_ymd_and_hms(2025, 3, 14, hour, 0, 0).unwrap(),
            wave_height: Some(height),
            wave_period: Some(period),
        })
        .collect()
}

/// A series with a solid qualifying morning.
pub fn good_day() -> Vec<WaveSample> {
    samples(&[8, 9, 10, 11], &[2.2, 2.4, 2.1, 1.9], &[12.0, 12.5, 13.0, 12.0])
}

/// A small, flat series that never qualifies.
pub fn flat_day() -> Vec<WaveSample> {
    samples(&[8, 9, 10, 11], &[0.6, 0.7, 0.8, 0.7], &[7.0, 7.5, 8.0, 8.0])
}
