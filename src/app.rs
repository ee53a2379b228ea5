//! The main application logic, decoupled from the entry point.

use crate::{
    auth::AccessTokenSource,
    conditions::ConditionEvaluator,
    config::{Config, RegistryKind},
    core::{PushTransport, TokenRegistry, WeatherProvider},
    cycle::SurfCheck,
    internal_metrics,
    notification::{
        FcmClient, FirestoreTokenRegistry, MessageTemplate, NotificationDispatcher,
        StaticTokenRegistry,
    },
    scheduler::Scheduler,
    server::LivenessServer,
    task_manager::TaskManager,
    weather::OpenMeteoClient,
};
use anyhow::{Context, Result};
use std::{net::SocketAddr, sync::Arc};
use tokio::net::TcpListener;
use tokio::sync::watch;
use tracing::{debug, info, instrument, warn};

/// A handle to the running application, containing all its task handles.
pub struct App {
    task_manager: TaskManager,
    surf_check: Arc<SurfCheck>,
    server_addr: Option<SocketAddr>,
}

impl App {
    /// Creates a new `AppBuilder` to construct an `App`.
    pub fn builder(config: Config) -> AppBuilder {
        AppBuilder::new(config)
    }

    /// The address the liveness server bound to, if it is running.
    pub fn server_addr(&self) -> Option<SocketAddr> {
        self.server_addr
    }

    /// The cycle runner, for one-off checks.
    pub fn surf_check(&self) -> Arc<SurfCheck> {
        self.surf_check.clone()
    }

    /// Waits for the shutdown signal and then gracefully shuts down all tasks.
    pub async fn run(self) -> Result<()> {
        let mut shutdown_rx = self.task_manager.get_shutdown_rx();
        shutdown_rx.changed().await.ok();
        info!("Shutdown signal received. Waiting for tasks to complete...");

        self.task_manager.shutdown().await;

        info!("All tasks shut down.");
        Ok(())
    }
}

/// Builder for the main application.
///
/// Constructs the collaborators from configuration, while letting tests
/// substitute any of them.
pub struct AppBuilder {
    config: Config,
    weather_override: Option<Arc<dyn WeatherProvider>>,
    registry_override: Option<Arc<dyn TokenRegistry>>,
    transport_override: Option<Arc<dyn PushTransport>>,
    start_scheduler: bool,
}

impl AppBuilder {
    /// Creates a new `AppBuilder` with the given configuration.
    pub fn new(config: Config) -> Self {
        Self {
            config,
            weather_override: None,
            registry_override: None,
            transport_override: None,
            start_scheduler: true,
        }
    }

    /// Overrides the weather provider for testing.
    pub fn weather_override(mut self, provider: Arc<dyn WeatherProvider>) -> Self {
        self.weather_override = Some(provider);
        self
    }

    /// Overrides the token registry for testing.
    pub fn registry_override(mut self, registry: Arc<dyn TokenRegistry>) -> Self {
        self.registry_override = Some(registry);
        self
    }

    /// Overrides the push transport for testing.
    pub fn transport_override(mut self, transport: Arc<dyn PushTransport>) -> Self {
        self.transport_override = Some(transport);
        self
    }

    /// Skips spawning the scheduler; used for single-shot runs.
    pub fn without_scheduler(mut self) -> Self {
        self.start_scheduler = false;
        self
    }

    /// Builds and initializes all application components, returning a runnable `App`.
    #[instrument(skip_all)]
    pub async fn build(self, shutdown_rx: watch::Receiver<bool>) -> Result<App> {
        let config = self.config;
        config.validate()?;
        let task_manager = TaskManager::new(shutdown_rx);

        // =========================================================================
        // 1. Collaborators
        // =========================================================================
        let provider = match self.weather_override {
            Some(provider) => provider,
            None => {
                debug!(base_url = %config.weather.base_url, "Initializing Open-Meteo client");
                Arc::new(OpenMeteoClient::from_config(&config.weather)?) as Arc<dyn WeatherProvider>
            }
        };

        debug!(kind = ?config.auth.kind, "Initializing access token source");
        let credentials = Arc::new(AccessTokenSource::from_config(&config.auth)?);

        let registry = match self.registry_override {
            Some(registry) => registry,
            None => match config.registry.kind {
                RegistryKind::Firestore => {
                    debug!(
                        project_id = %config.registry.project_id,
                        collection = %config.registry.collection,
                        "Initializing Firestore token registry"
                    );
                    Arc::new(FirestoreTokenRegistry::from_config(
                        &config.registry,
                        credentials.clone(),
                    )?)
                        as Arc<dyn TokenRegistry>
                }
                RegistryKind::Static => {
                    debug!(count = config.registry.tokens.len(), "Using static token registry");
                    Arc::new(StaticTokenRegistry::new(config.registry.tokens.clone()))
                        as Arc<dyn TokenRegistry>
                }
            },
        };

        let transport = match self.transport_override {
            Some(transport) => transport,
            None => Arc::new(FcmClient::from_config(&config.push, credentials)?)
                as Arc<dyn PushTransport>,
        };

        // =========================================================================
        // 2. Core
        // =========================================================================
        let evaluator = ConditionEvaluator::new(config.conditions.clone())?;
        let dispatcher = NotificationDispatcher::new(
            registry,
            transport,
            MessageTemplate::from(&config.push),
        );
        let surf_check = Arc::new(SurfCheck::new(
            config.locations.clone(),
            provider,
            evaluator,
            dispatcher,
            config.concurrency,
        ));

        // =========================================================================
        // 3. Liveness Server
        // =========================================================================
        let server_addr = if config.server.enabled {
            let prom_handle = if config.server.prometheus {
                match internal_metrics::install_prometheus_recorder() {
                    Ok(handle) => Some(handle),
                    Err(e) => {
                        warn!("Prometheus metrics disabled: {}", e);
                        None
                    }
                }
            } else {
                None
            };

            let listener = TcpListener::bind(&config.server.listen_address)
                .await
                .with_context(|| {
                    format!("failed to bind {}", config.server.listen_address)
                })?;
            let addr = listener.local_addr()?;
            info!("Server running on http://{}", addr);
            let server = LivenessServer::new(listener, prom_handle, task_manager.get_shutdown_rx());
            task_manager.spawn("LivenessServer", server.run());
            Some(addr)
        } else {
            None
        };

        // =========================================================================
        // 4. Scheduler
        // =========================================================================
        if self.start_scheduler {
            let scheduler = Scheduler::new(
                surf_check.clone(),
                config.schedule.clone(),
                task_manager.get_shutdown_rx(),
            );
            task_manager.spawn("Scheduler", scheduler.run());
        }

        Ok(App {
            task_manager,
            surf_check,
            server_addr,
        })
    }
}
