//! Core domain types and collaborator traits for SurfWatch
//!
//! This module defines the data flowing through an evaluation cycle and the
//! trait contracts for the external services the cycle talks to: the marine
//! weather provider, the device token registry and the push transport.

use crate::error::{FetchError, RegistryError, TransportError};
use async_trait::async_trait;
use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// A named surf spot.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Location {
    /// Unique, human-readable name (e.g., "Muizenberg")
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
}

impl Location {
    pub fn new(name: impl Into<String>, latitude: f64, longitude: f64) -> Self {
        Self {
            name: name.into(),
            latitude,
            longitude,
        }
    }
}

/// One hourly marine measurement for a location.
///
/// The timestamp carries the location's own UTC offset, so `hour()` on it
/// yields the local wall-clock hour.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WaveSample {
    pub timestamp: DateTime<FixedOffset>,
    /// Significant wave height in meters, `None` when the provider had no value
    pub wave_height: Option<f64>,
    /// Wave period in seconds, `None` when the provider had no value
    pub wave_period: Option<f64>,
}

/// The outcome of evaluating one location for the current cycle.
#[derive(Debug, Clone, PartialEq)]
pub struct Verdict {
    pub location: Location,
    pub qualifies: bool,
}

/// An opaque push-delivery target.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(transparent)]
pub struct RecipientToken(String);

impl RecipientToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Tokens that are empty or only whitespace are unusable.
    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Display for RecipientToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RecipientToken {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// A single multicast message addressed to every recipient.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NotificationBatch {
    pub title: String,
    pub body: String,
    pub tokens: BTreeSet<RecipientToken>,
}

/// Per-token delivery counts as reported by the push transport.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MulticastResponse {
    pub success_count: usize,
    pub failure_count: usize,
}

/// The result of a dispatch attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum DeliveryResult {
    /// The batch reached the transport; individual tokens may still have failed.
    Delivered {
        success_count: usize,
        failure_count: usize,
    },
    /// The registry had no usable tokens, so nothing was sent.
    NoRecipients,
    /// The registry read or the transport call failed as a whole.
    Failed { reason: String },
}

/// Everything one evaluate-then-dispatch pass produced.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CycleReport {
    /// Names of qualifying locations, in discovery order.
    pub qualifying_locations: Vec<String>,
    /// Names of locations whose data could not be fetched this cycle.
    pub failed_locations: Vec<String>,
    /// `None` when no location qualified and dispatch was skipped.
    pub dispatch_result: Option<DeliveryResult>,
}

// =============================================================================
// Collaborator Traits
// =============================================================================

/// Fetches the hourly wave series for a location
#[async_trait]
pub trait WeatherProvider: Send + Sync {
    /// Returns the samples for `location`, ordered by time, with timestamps
    /// already localized to the location's timezone.
    ///
    /// # Returns
    /// * `Ok(Vec<WaveSample>)` on success, possibly empty
    /// * `Err(FetchError)` for transport failures, timeouts or malformed data
    async fn fetch(&self, location: &Location) -> Result<Vec<WaveSample>, FetchError>;
}

/// Lists the device tokens of all registered users
#[async_trait]
pub trait TokenRegistry: Send + Sync {
    /// Returns every registered token. Entries may be blank; callers filter.
    async fn list_tokens(&self) -> Result<Vec<RecipientToken>, RegistryError>;
}

/// Delivers one notification to many devices in a single call
#[async_trait]
pub trait PushTransport: Send + Sync {
    /// A short name for logging (e.g., "fcm").
    fn name(&self) -> &str;

    /// Sends `batch` to all of its tokens.
    ///
    /// # Returns
    /// * `Ok(MulticastResponse)` with per-token success and failure counts
    /// * `Err(TransportError)` if the call as a whole failed
    async fn send_multicast(
        &self,
        batch: &NotificationBatch,
    ) -> Result<MulticastResponse, TransportError>;
}
