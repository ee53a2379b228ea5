//! SurfWatch - Good Surf Notifier
//!
//! Checks the marine forecast for each configured surf spot and pushes a
//! notification to subscribed devices when conditions are good.

use anyhow::Result;
use clap::Parser;
use surfwatch::{app::App, cli::Cli, config::Config};
use tokio::sync::watch;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

fn init_tracing(default_level: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration by layering sources: defaults, file, environment, and CLI args.
    let mut config = Config::load(&cli).unwrap_or_else(|err| {
        init_tracing("info");
        error!("Failed to load configuration: {:#}", err);
        std::process::exit(1);
    });

    init_tracing(&config.log_level);

    info!("SurfWatch starting up...");
    info!("-------------------- Configuration --------------------");
    info!("Log Level: {}", config.log_level);
    info!(
        "Locations: {}",
        config
            .locations
            .iter()
            .map(|l| l.name.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    );
    info!(
        "Thresholds: height > {}m, period > {}s, {} consecutive hours between {}:00 and {}:00",
        config.conditions.min_wave_height,
        config.conditions.min_wave_period,
        config.conditions.required_consecutive_hours,
        config.conditions.daylight_start_hour,
        config.conditions.daylight_end_hour
    );
    info!("Weather API: {}", config.weather.base_url);
    info!("Token Registry: {:?}", config.registry.kind);
    info!("Push Project: {} via {}", config.push.project_id, config.push.base_url);
    info!("Credentials: {:?}", config.auth.kind);
    match config.schedule.interval_seconds {
        Some(seconds) => info!("Check Interval: {}s", seconds),
        None => info!("Check Interval: startup only"),
    }
    info!("-------------------------------------------------------");

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    if cli.once {
        config.server.enabled = false;
        let app = App::builder(config)
            .without_scheduler()
            .build(shutdown_rx)
            .await?;
        let report = app.surf_check().run_cycle().await;
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    let app = App::builder(config).build(shutdown_rx).await?;

    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => info!("Shutdown signal received. Shutting down gracefully..."),
            Err(e) => error!("Failed to listen for shutdown signal: {}", e),
        }
        let _ = shutdown_tx.send(true);
    });

    app.run().await
}
