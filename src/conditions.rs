//! Surf condition evaluation
//!
//! Turns a location's hourly wave series into a yes/no verdict using the
//! "N consecutive qualifying daylight hours" rule. Only samples whose local
//! hour falls inside the daylight window take part; a daylight sample that
//! misses either threshold breaks the streak, while night samples are
//! ignored entirely.

use crate::core::{Location, Verdict, WaveSample};
use anyhow::{bail, Result};
use chrono::Timelike;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Tunable thresholds for the surf heuristic.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct SurfThresholds {
    /// Wave height must be strictly greater than this (meters).
    pub min_wave_height: f64,
    /// Wave period must be strictly greater than this (seconds).
    pub min_wave_period: f64,
    /// First local hour of the daylight window (inclusive).
    pub daylight_start_hour: u32,
    /// Last local hour of the daylight window (inclusive).
    pub daylight_end_hour: u32,
    /// Length of the streak that makes a location qualify.
    pub required_consecutive_hours: u32,
}

impl Default for SurfThresholds {
    fn default() -> Self {
        Self {
            min_wave_height: 1.5,
            min_wave_period: 10.0,
            daylight_start_hour: 8,
            daylight_end_hour: 18,
            required_consecutive_hours: 3,
        }
    }
}

impl SurfThresholds {
    /// Checks that the thresholds describe a usable window.
    pub fn validate(&self) -> Result<()> {
        if self.daylight_start_hour > 23 || self.daylight_end_hour > 23 {
            bail!(
                "daylight hours must be within 0..=23, got {}..={}",
                self.daylight_start_hour,
                self.daylight_end_hour
            );
        }
        if self.daylight_start_hour > self.daylight_end_hour {
            bail!(
                "daylight_start_hour ({}) is after daylight_end_hour ({})",
                self.daylight_start_hour,
                self.daylight_end_hour
            );
        }
        if self.required_consecutive_hours == 0 {
            bail!("required_consecutive_hours must be at least 1");
        }
        if !self.min_wave_height.is_finite() || !self.min_wave_period.is_finite() {
            bail!("wave thresholds must be finite numbers");
        }
        Ok(())
    }

    fn is_daylight(&self, hour: u32) -> bool {
        (self.daylight_start_hour..=self.daylight_end_hour).contains(&hour)
    }

    fn is_qualifying(&self, sample: &WaveSample) -> bool {
        match (sample.wave_height, sample.wave_period) {
            (Some(height), Some(period)) if height.is_finite() && period.is_finite() => {
                height > self.min_wave_height && period > self.min_wave_period
            }
            _ => false,
        }
    }
}

/// Applies [`SurfThresholds`] to wave series.
#[derive(Debug, Clone, Default)]
pub struct ConditionEvaluator {
    thresholds: SurfThresholds,
}

impl ConditionEvaluator {
    /// Creates an evaluator, rejecting thresholds that can never be met.
    pub fn new(thresholds: SurfThresholds) -> Result<Self> {
        thresholds.validate()?;
        Ok(Self { thresholds })
    }

    pub fn thresholds(&self) -> &SurfThresholds {
        &self.thresholds
    }

    /// Returns `true` once the series contains the required number of
    /// consecutive qualifying daylight samples.
    pub fn evaluate(&self, samples: &[WaveSample]) -> bool {
        let required = self.thresholds.required_consecutive_hours;
        let mut consecutive_hours = 0u32;

        for (i, sample) in samples.iter().enumerate() {
            if i > 0 && sample.timestamp < samples[i - 1].timestamp {
                warn!(
                    index = i,
                    timestamp = %sample.timestamp,
                    "Wave samples are out of order; evaluating in given order"
                );
            }

            let hour = sample.timestamp.hour();
            if !self.thresholds.is_daylight(hour) {
                continue;
            }

            if self.thresholds.is_qualifying(sample) {
                consecutive_hours += 1;
                if consecutive_hours >= required {
                    debug!(
                        completed_at = %sample.timestamp,
                        hours = consecutive_hours,
                        "Qualifying daylight window found"
                    );
                    return true;
                }
            } else {
                consecutive_hours = 0;
            }
        }

        false
    }

    /// Evaluates `samples` and pairs the outcome with its location.
    pub fn evaluate_location(&self, location: &Location, samples: &[WaveSample]) -> Verdict {
        Verdict {
            location: location.clone(),
            qualifies: self.evaluate(samples),
        }
    }
}
