//! Marine weather client for the Open-Meteo API
//!
//! Requests hourly `wave_height` and `wave_period` with `timezone=auto`, so
//! the returned wall-clock times are already in the spot's local timezone.
//! The three parallel arrays in the response are zipped into
//! [`WaveSample`]s after checking they line up.

use crate::config::WeatherConfig;
use crate::core::{Location, WaveSample, WeatherProvider};
use crate::error::FetchError;
use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, NaiveDateTime, TimeZone};
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, instrument};

const TIME_FORMAT: &str = "%Y-%m-%dT%H:%M";

/// Shape of the Open-Meteo marine response, limited to what we read.
#[derive(Debug, Deserialize)]
struct MarineResponse {
    #[serde(default)]
    utc_offset_seconds: i32,
    hourly: HourlySeries,
}

#[derive(Debug, Deserialize)]
struct HourlySeries {
    time: Vec<String>,
    wave_height: Vec<Option<f64>>,
    wave_period: Vec<Option<f64>>,
}

/// Parses a raw Open-Meteo marine JSON body into wave samples.
///
/// # Returns
/// * `Ok(Vec<WaveSample>)` in provider order
/// * `Err(FetchError)` if the JSON is malformed, the arrays differ in
///   length, or a timestamp cannot be read
pub fn parse_marine_response(text: &str) -> Result<Vec<WaveSample>, FetchError> {
    let response: MarineResponse =
        serde_json::from_str(text).map_err(|e| FetchError::Decode(e.to_string()))?;
    into_samples(response)
}

fn into_samples(response: MarineResponse) -> Result<Vec<WaveSample>, FetchError> {
    let HourlySeries {
        time,
        wave_height,
        wave_period,
    } = response.hourly;

    if time.len() != wave_height.len() || time.len() != wave_period.len() {
        return Err(FetchError::LengthMismatch {
            times: time.len(),
            heights: wave_height.len(),
            periods: wave_period.len(),
        });
    }

    let offset = FixedOffset::east_opt(response.utc_offset_seconds).ok_or_else(|| {
        FetchError::Decode(format!(
            "utc_offset_seconds out of range: {}",
            response.utc_offset_seconds
        ))
    })?;

    time.into_iter()
        .zip(wave_height)
        .zip(wave_period)
        .map(|((raw_time, wave_height), wave_period)| {
            Ok(WaveSample {
                timestamp: parse_local_time(&raw_time, &offset)?,
                wave_height,
                wave_period,
            })
        })
        .collect()
}

/// Interprets an offset-less `YYYY-MM-DDTHH:MM` string as local time at `offset`.
fn parse_local_time(raw: &str, offset: &FixedOffset) -> Result<DateTime<FixedOffset>, FetchError> {
    let naive = NaiveDateTime::parse_from_str(raw, TIME_FORMAT).map_err(|e| {
        FetchError::InvalidTimestamp {
            value: raw.to_string(),
            reason: e.to_string(),
        }
    })?;
    offset
        .from_local_datetime(&naive)
        .single()
        .ok_or_else(|| FetchError::InvalidTimestamp {
            value: raw.to_string(),
            reason: "ambiguous local time".to_string(),
        })
}

/// Fetches wave series from the Open-Meteo marine endpoint.
pub struct OpenMeteoClient {
    client: reqwest::Client,
    base_url: String,
}

impl OpenMeteoClient {
    /// Creates a new client from the weather configuration.
    pub fn from_config(config: &WeatherConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl WeatherProvider for OpenMeteoClient {
    #[instrument(skip(self, location), fields(location = %location.name))]
    async fn fetch(&self, location: &Location) -> Result<Vec<WaveSample>, FetchError> {
        let url = format!("{}/v1/marine", self.base_url);
        let response = self
            .client
            .get(&url)
            .query(&[
                ("latitude", location.latitude.to_string()),
                ("longitude", location.longitude.to_string()),
                ("hourly", "wave_height,wave_period".to_string()),
                ("timezone", "auto".to_string()),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
            });
        }

        let body = response.text().await?;
        let samples = parse_marine_response(&body)?;
        debug!(count = samples.len(), "Fetched wave samples");
        Ok(samples)
    }
}
