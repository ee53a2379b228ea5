//! Fans a cycle's qualifying locations out to every registered device as a
//! single multicast push.

use crate::config::PushConfig;
use crate::core::{
    DeliveryResult, NotificationBatch, PushTransport, RecipientToken, TokenRegistry,
};
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::{error, info, instrument, warn};

const LOCATIONS_PLACEHOLDER: &str = "{locations}";

/// Title and body used to compose the notification.
#[derive(Debug, Clone, PartialEq)]
pub struct MessageTemplate {
    pub title: String,
    pub body_template: String,
}

impl MessageTemplate {
    /// Renders the body with the location names joined in the given order.
    pub fn render_body(&self, locations: &[String]) -> String {
        self.body_template
            .replace(LOCATIONS_PLACEHOLDER, &locations.join(", "))
    }
}

impl From<&PushConfig> for MessageTemplate {
    fn from(config: &PushConfig) -> Self {
        Self {
            title: config.title.clone(),
            body_template: config.body_template.clone(),
        }
    }
}

/// Resolves recipients and submits one batch per cycle.
pub struct NotificationDispatcher {
    registry: Arc<dyn TokenRegistry>,
    transport: Arc<dyn PushTransport>,
    template: MessageTemplate,
}

impl NotificationDispatcher {
    pub fn new(
        registry: Arc<dyn TokenRegistry>,
        transport: Arc<dyn PushTransport>,
        template: MessageTemplate,
    ) -> Self {
        Self {
            registry,
            transport,
            template,
        }
    }

    /// Notifies every registered device about `locations`.
    ///
    /// Never returns an error: registry and transport failures are logged
    /// and reported as [`DeliveryResult::Failed`].
    #[instrument(skip(self, locations), fields(count = locations.len()))]
    pub async fn dispatch(&self, locations: &[String]) -> DeliveryResult {
        if locations.is_empty() {
            warn!("dispatch called without qualifying locations; nothing to send");
            return DeliveryResult::NoRecipients;
        }

        let tokens = match self.registry.list_tokens().await {
            Ok(tokens) => collect_tokens(tokens),
            Err(e) => {
                error!(error = %e, "Failed to read device tokens");
                metrics::counter!("surf_notifications_total", "status" => "failed").increment(1);
                return DeliveryResult::Failed {
                    reason: e.to_string(),
                };
            }
        };

        if tokens.is_empty() {
            info!("No device tokens found. No notifications sent.");
            metrics::counter!("surf_notifications_total", "status" => "no_recipients")
                .increment(1);
            return DeliveryResult::NoRecipients;
        }

        let batch = NotificationBatch {
            title: self.template.title.clone(),
            body: self.template.render_body(locations),
            tokens,
        };

        info!(
            transport = self.transport.name(),
            recipients = batch.tokens.len(),
            "Sending surf notification"
        );
        match self.transport.send_multicast(&batch).await {
            Ok(response) => {
                info!(
                    success = response.success_count,
                    failure = response.failure_count,
                    "Sent {} notifications.",
                    response.success_count
                );
                metrics::counter!("surf_notifications_total", "status" => "delivered")
                    .increment(1);
                metrics::counter!("surf_push_tokens_total", "outcome" => "success")
                    .increment(response.success_count as u64);
                metrics::counter!("surf_push_tokens_total", "outcome" => "failure")
                    .increment(response.failure_count as u64);
                DeliveryResult::Delivered {
                    success_count: response.success_count,
                    failure_count: response.failure_count,
                }
            }
            Err(e) => {
                error!(error = %e, "Error sending notifications");
                metrics::counter!("surf_notifications_total", "status" => "failed").increment(1);
                DeliveryResult::Failed {
                    reason: e.to_string(),
                }
            }
        }
    }
}

/// Drops blank tokens and deduplicates the rest.
fn collect_tokens(tokens: Vec<RecipientToken>) -> BTreeSet<RecipientToken> {
    tokens.into_iter().filter(|t| !t.is_blank()).collect()
}
