//! Command-Line Interface (CLI) argument parsing.
//!
//! This module defines the command-line arguments for the application using the
//! `clap` crate. These arguments are parsed at startup and then merged with
//! the configuration from the `surfwatch.toml` file and environment variables.

use clap::Parser;
use figment::{
    value::{Dict, Map, Value},
    Error, Metadata, Profile, Provider,
};
use std::path::PathBuf;

/// Checks surf spots for good swell and notifies subscribed devices.
#[derive(Parser, Debug, Default, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to the TOML configuration file.
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Logging level (e.g., "debug", "info").
    #[arg(long, value_name = "LEVEL")]
    pub log_level: Option<String>,

    /// Seconds between surf checks.
    #[arg(long, value_name = "SECONDS")]
    pub interval_seconds: Option<u64>,

    /// Address for the liveness server, e.g. "0.0.0.0:3000".
    #[arg(long, value_name = "ADDR")]
    pub listen_address: Option<String>,

    /// Run a single check, print the report as JSON and exit.
    #[arg(long)]
    pub once: bool,
}

impl Provider for Cli {
    fn metadata(&self) -> Metadata {
        Metadata::named("Command-Line Arguments")
    }

    fn data(&self) -> Result<Map<Profile, Dict>, Error> {
        let mut dict = Dict::new();

        if let Some(level) = &self.log_level {
            dict.insert("log_level".into(), Value::from(level.clone()));
        }

        if let Some(interval) = self.interval_seconds {
            let mut schedule = Dict::new();
            schedule.insert("interval_seconds".into(), Value::from(interval));
            dict.insert("schedule".into(), Value::from(schedule));
        }

        if let Some(addr) = &self.listen_address {
            let mut server = Dict::new();
            server.insert("listen_address".into(), Value::from(addr.clone()));
            dict.insert("server".into(), Value::from(server));
        }

        let mut map = Map::new();
        map.insert(Profile::Default, dict);
        Ok(map)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_cli_provides_nothing() {
        let data = Cli::default().data().unwrap();
        assert!(data[&Profile::Default].is_empty());
    }

    #[test]
    fn test_cli_parses_flags() {
        let cli = Cli::parse_from([
            "surfwatch",
            "--config",
            "/etc/surfwatch.toml",
            "--interval-seconds",
            "3600",
            "--once",
        ]);
        assert_eq!(cli.config, Some(PathBuf::from("/etc/surfwatch.toml")));
        assert_eq!(cli.interval_seconds, Some(3600));
        assert!(cli.once);
    }
}
