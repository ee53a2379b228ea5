//! One evaluate-then-dispatch pass over every configured location.

use crate::conditions::ConditionEvaluator;
use crate::core::{CycleReport, Location, Verdict, WeatherProvider};
use crate::error::FetchError;
use crate::notification::NotificationDispatcher;
use futures::stream::{self, StreamExt};
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info, instrument};

/// Evaluates all locations and notifies subscribers when any qualify.
pub struct SurfCheck {
    locations: Vec<Location>,
    provider: Arc<dyn WeatherProvider>,
    evaluator: ConditionEvaluator,
    dispatcher: NotificationDispatcher,
    concurrency: usize,
}

impl SurfCheck {
    pub fn new(
        locations: Vec<Location>,
        provider: Arc<dyn WeatherProvider>,
        evaluator: ConditionEvaluator,
        dispatcher: NotificationDispatcher,
        concurrency: usize,
    ) -> Self {
        Self {
            locations,
            provider,
            evaluator,
            dispatcher,
            concurrency: concurrency.max(1),
        }
    }

    pub fn locations(&self) -> &[Location] {
        &self.locations
    }

    /// Runs one full cycle.
    ///
    /// Fetches may overlap, but results keep the configured location order
    /// and dispatch only starts after every fetch has settled. Failures are
    /// folded into the returned report; this never errors.
    #[instrument(skip(self), fields(locations = self.locations.len()))]
    pub async fn run_cycle(&self) -> CycleReport {
        let start = Instant::now();
        metrics::counter!("surf_cycles_total").increment(1);

        let fetches: Vec<_> = self
            .locations
            .iter()
            .map(|location| async move { (location, self.evaluate(location).await) })
            .collect();
        let outcomes: Vec<(&Location, Result<Verdict, FetchError>)> = stream::iter(fetches)
            .buffered(self.concurrency)
            .collect()
            .await;

        let mut report = CycleReport::default();
        for (location, outcome) in outcomes {
            match outcome {
                Ok(verdict) => {
                    metrics::counter!("surf_locations_evaluated_total", "status" => "ok")
                        .increment(1);
                    if verdict.qualifies {
                        info!(
                            "🏄 {} has at least {} consecutive hours of good surf.",
                            location.name,
                            self.evaluator.thresholds().required_consecutive_hours
                        );
                        metrics::counter!("surf_locations_qualifying_total").increment(1);
                        report.qualifying_locations.push(location.name.clone());
                    }
                }
                Err(e) => {
                    metrics::counter!("surf_locations_evaluated_total", "status" => "failed")
                        .increment(1);
                    error!(location = %location.name, error = %e, "Error fetching data");
                    report.failed_locations.push(location.name.clone());
                }
            }
        }

        if report.qualifying_locations.is_empty() {
            info!("No ideal surf conditions detected.");
        } else {
            info!(
                "🏄 Best Surf Locations Today: {}",
                report.qualifying_locations.join(", ")
            );
            let result = self.dispatcher.dispatch(&report.qualifying_locations).await;
            report.dispatch_result = Some(result);
        }

        metrics::histogram!("surf_cycle_duration_seconds").record(start.elapsed().as_secs_f64());
        report
    }

    async fn evaluate(&self, location: &Location) -> Result<Verdict, FetchError> {
        let samples = self.provider.fetch(location).await?;
        Ok(self.evaluator.evaluate_location(location, &samples))
    }
}
