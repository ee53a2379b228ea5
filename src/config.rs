//! Configuration management for SurfWatch
//!
//! This module defines the main `Config` struct and its sub-structs,
//! responsible for holding all application settings. It uses the `figment`
//! crate to load configuration from a `surfwatch.toml` file and merge it
//! with environment variables and command-line arguments.

use crate::cli::Cli;
use crate::conditions::SurfThresholds;
use crate::core::Location;
use anyhow::{bail, Result};
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::PathBuf;

pub const DEFAULT_CONFIG_PATH: &str = "surfwatch.toml";

/// The main configuration struct for the application.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct Config {
    /// The logging level for the application.
    pub log_level: String,
    /// Maximum number of weather fetches in flight at once.
    pub concurrency: usize,
    /// The surf spots checked every cycle.
    pub locations: Vec<Location>,
    /// Thresholds for the good-surf heuristic.
    pub conditions: SurfThresholds,
    /// Configuration for the marine weather provider.
    pub weather: WeatherConfig,
    /// Credentials shared by the registry and the push transport.
    pub auth: AuthConfig,
    /// Configuration for the device token registry.
    pub registry: RegistryConfig,
    /// Configuration for push delivery.
    pub push: PushConfig,
    /// Configuration for the recurring check.
    pub schedule: ScheduleConfig,
    /// Configuration for the liveness/metrics HTTP server.
    pub server: ServerConfig,
}

/// Configuration for the marine weather provider.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct WeatherConfig {
    /// Base URL of the Open-Meteo marine API.
    pub base_url: String,
    /// Per-request timeout in milliseconds.
    pub timeout_ms: u64,
}

/// Where Google API access tokens come from.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub enum AuthKind {
    /// Send requests without an `Authorization` header.
    None,
    /// Use `auth.access_token` as-is. OAuth access tokens expire after about
    /// an hour, so this only suits one-shot runs and local emulators.
    Static,
    /// Fetch and refresh tokens from the GCE metadata server, using the
    /// service account attached to the instance.
    Metadata,
}

/// Credentials for Firestore and FCM.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct AuthConfig {
    pub kind: AuthKind,
    /// Bearer token used when `kind = "Static"`.
    pub access_token: Option<String>,
    /// Token endpoint of the metadata server.
    pub metadata_url: String,
    /// Seconds before expiry at which a cached token is refreshed.
    pub refresh_margin_seconds: u64,
    /// Per-request timeout in milliseconds.
    pub timeout_ms: u64,
}

/// Which token registry backend to use.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub enum RegistryKind {
    /// A fixed list of tokens taken from `registry.tokens`.
    Static,
    /// The Firestore `users` collection, read over REST.
    Firestore,
}

/// Configuration for the device token registry.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct RegistryConfig {
    pub kind: RegistryKind,
    /// Firestore project id.
    pub project_id: String,
    /// Collection holding one document per user.
    pub collection: String,
    /// Document field containing the device token.
    pub token_field: String,
    /// Base URL of the Firestore REST API.
    pub base_url: String,
    /// Page size used when listing documents.
    pub page_size: u32,
    /// Tokens served by the static registry.
    pub tokens: Vec<String>,
    /// Per-request timeout in milliseconds.
    pub timeout_ms: u64,
}

/// Configuration for push delivery.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct PushConfig {
    /// Base URL of the FCM HTTP v1 API.
    pub base_url: String,
    /// Firebase project that owns the messaging sender.
    pub project_id: String,
    /// Per-request timeout in milliseconds.
    pub timeout_ms: u64,
    /// Largest number of per-token sends in flight at once.
    pub max_concurrent_sends: usize,
    /// Notification title.
    pub title: String,
    /// Notification body; `{locations}` is replaced with the spot names.
    pub body_template: String,
}

/// Configuration for the recurring check.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct ScheduleConfig {
    /// Run a cycle as soon as the service starts.
    pub run_on_startup: bool,
    /// Seconds between cycles; `None` disables the recurring check.
    pub interval_seconds: Option<u64>,
}

/// Configuration for the liveness/metrics HTTP server.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct ServerConfig {
    pub enabled: bool,
    /// Socket address to bind, e.g. "0.0.0.0:3000".
    pub listen_address: String,
    /// Install the Prometheus recorder and expose `/metrics`.
    pub prometheus: bool,
}

impl Config {
    /// Loads the application configuration by layering sources.
    ///
    /// Defaults are overridden by the TOML file, then by `SURFWATCH_`
    /// environment variables (`__` separates nested keys), then by CLI
    /// arguments.
    pub fn load(cli: &Cli) -> Result<Self> {
        let config_path = cli
            .config
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH));

        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(config_path))
            // e.g., SURFWATCH_AUTH__ACCESS_TOKEN=...
            .merge(Env::prefixed("SURFWATCH_").split("__"))
            .merge(cli.clone())
            .extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Rejects configurations the service cannot run with.
    pub fn validate(&self) -> Result<()> {
        self.conditions.validate()?;
        if self.concurrency == 0 {
            bail!("concurrency must be at least 1");
        }
        if self.locations.is_empty() {
            bail!("at least one location must be configured");
        }
        let mut seen = HashSet::new();
        for location in &self.locations {
            if !seen.insert(location.name.as_str()) {
                bail!("duplicate location name: {}", location.name);
            }
        }
        if self.push.max_concurrent_sends == 0 {
            bail!("push.max_concurrent_sends must be at least 1");
        }
        if self.auth.kind == AuthKind::Static && self.auth.access_token.is_none() {
            bail!("auth.access_token is required when auth.kind = \"Static\"");
        }
        if self.schedule.interval_seconds == Some(0) {
            bail!("schedule.interval_seconds must be greater than zero");
        }
        Ok(())
    }
}

fn default_locations() -> Vec<Location> {
    vec![
        Location::new("Muizenberg", -34.108856, 18.471152),
        Location::new("Strand", -34.120811, 18.828540),
        Location::new("Kommetjie", -34.136238, 18.327791),
        Location::new("Big Bay", -33.794006, 18.456511),
        Location::new("Melkbosstrand", -33.724069, 18.440003),
    ]
}

// Provide a default implementation for tests and easy setup.
impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            concurrency: 4,
            locations: default_locations(),
            conditions: SurfThresholds::default(),
            weather: WeatherConfig {
                base_url: "https://marine-api.open-meteo.com".to_string(),
                timeout_ms: 10_000,
            },
            auth: AuthConfig {
                kind: AuthKind::Metadata,
                access_token: None,
                metadata_url: "http://metadata.google.internal/computeMetadata/v1/instance/service-accounts/default/token".to_string(),
                refresh_margin_seconds: 60,
                timeout_ms: 5_000,
            },
            registry: RegistryConfig {
                kind: RegistryKind::Firestore,
                project_id: "surfspot-884c9".to_string(),
                collection: "users".to_string(),
                token_field: "fcmToken".to_string(),
                base_url: "https://firestore.googleapis.com".to_string(),
                page_size: 300,
                tokens: vec![],
                timeout_ms: 10_000,
            },
            push: PushConfig {
                base_url: "https://fcm.googleapis.com".to_string(),
                project_id: "surfspot-884c9".to_string(),
                timeout_ms: 10_000,
                max_concurrent_sends: 10,
                title: "🌊 Best Surf Spots Today!".to_string(),
                body_template: "🏄‍♂️ Great conditions at: {locations}. Time to surf!".to_string(),
            },
            schedule: ScheduleConfig {
                run_on_startup: true,
                interval_seconds: None,
            },
            server: ServerConfig {
                enabled: true,
                listen_address: "0.0.0.0:3000".to_string(),
                prometheus: true,
            },
        }
    }
}
