//! Drives [`SurfCheck`] on a recurring timer.
//!
//! Cycles run inside a single loop and each one is awaited to completion
//! before the next tick is considered, so two cycles can never overlap.
//! Ticks missed while a long cycle runs are skipped rather than queued.

use crate::config::ScheduleConfig;
use crate::core::CycleReport;
use crate::cycle::SurfCheck;
use std::sync::Arc;
use tokio::sync::watch;
use tokio::time::{interval_at, Duration, Instant, MissedTickBehavior};
use tracing::{debug, info};

pub struct Scheduler {
    check: Arc<SurfCheck>,
    config: ScheduleConfig,
    shutdown_rx: watch::Receiver<bool>,
}

impl Scheduler {
    pub fn new(
        check: Arc<SurfCheck>,
        config: ScheduleConfig,
        shutdown_rx: watch::Receiver<bool>,
    ) -> Self {
        Self {
            check,
            config,
            shutdown_rx,
        }
    }

    /// Runs until shutdown is signalled, or until the startup check is done
    /// when no interval is configured. A cycle in progress is abandoned
    /// when shutdown arrives.
    pub async fn run(mut self) {
        if self.config.run_on_startup {
            info!("Running startup surf check");
            match self.run_until_shutdown().await {
                Some(report) => log_report(&report),
                None => {
                    info!("Scheduler received shutdown signal during startup check. Exiting.");
                    return;
                }
            }
        }

        let Some(seconds) = self.config.interval_seconds else {
            info!("No check interval configured; scheduler finished.");
            return;
        };

        let period = Duration::from_secs(seconds);
        let mut timer = interval_at(Instant::now() + period, period);
        timer.set_missed_tick_behavior(MissedTickBehavior::Skip);
        info!("Surf check scheduled every {}s", seconds);

        loop {
            tokio::select! {
                biased;
                _ = self.shutdown_rx.changed() => {
                    info!("Scheduler received shutdown signal. Exiting.");
                    break;
                }
                _ = timer.tick() => {
                    debug!("[Heartbeat] 'Scheduler' tick.");
                    match self.run_until_shutdown().await {
                        Some(report) => log_report(&report),
                        None => {
                            info!("Scheduler received shutdown signal mid-cycle. Exiting.");
                            break;
                        }
                    }
                }
            }
        }
    }

    /// Runs one cycle, or returns `None` if shutdown is signalled first.
    async fn run_until_shutdown(&mut self) -> Option<CycleReport> {
        tokio::select! {
            biased;
            _ = self.shutdown_rx.changed() => None,
            report = self.check.run_cycle() => Some(report),
        }
    }
}

fn log_report(report: &CycleReport) {
    debug!(
        qualifying = ?report.qualifying_locations,
        failed = ?report.failed_locations,
        dispatch = ?report.dispatch_result,
        "Surf check finished"
    );
}
