//! A client for sending notifications through the FCM HTTP v1 API.
//!
//! HTTP v1 accepts one recipient per request, so a batch is fanned out as
//! one `messages:send` call per token, with a bounded number in flight. The
//! per-token outcomes are summed into a single [`MulticastResponse`].

use crate::auth::AccessTokenSource;
use crate::config::PushConfig;
use crate::core::{MulticastResponse, NotificationBatch, PushTransport, RecipientToken};
use crate::error::TransportError;
use anyhow::Result;
use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use reqwest::StatusCode;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, instrument};

/// Result of sending to one token.
#[derive(Debug)]
enum SendOutcome {
    Delivered,
    /// FCM refused this token (unregistered or malformed).
    Rejected,
    /// The request itself failed; says nothing about the token.
    Failed(TransportError),
}

/// Sends notification batches through FCM.
pub struct FcmClient {
    client: reqwest::Client,
    send_url: String,
    credentials: Arc<AccessTokenSource>,
    max_concurrent_sends: usize,
}

impl FcmClient {
    /// Creates a new `FcmClient` from the push configuration.
    pub fn from_config(config: &PushConfig, credentials: Arc<AccessTokenSource>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()?;
        let send_url = format!(
            "{}/v1/projects/{}/messages:send",
            config.base_url.trim_end_matches('/'),
            config.project_id
        );
        Ok(Self {
            client,
            send_url,
            credentials,
            max_concurrent_sends: config.max_concurrent_sends.max(1),
        })
    }

    async fn send_one(
        &self,
        bearer: Option<&str>,
        token: &RecipientToken,
        batch: &NotificationBatch,
    ) -> SendOutcome {
        let payload = json!({
            "message": {
                "token": token.as_str(),
                "notification": {
                    "title": batch.title,
                    "body": batch.body,
                },
            }
        });

        let mut request = self.client.post(&self.send_url).json(&payload);
        if let Some(bearer) = bearer {
            request = request.bearer_auth(bearer);
        }

        let res = match request.send().await {
            Ok(res) => res,
            Err(e) => return SendOutcome::Failed(e.into()),
        };
        let status = res.status();
        if status.is_success() {
            return SendOutcome::Delivered;
        }

        let body = res.text().await.unwrap_or_default();
        match status {
            StatusCode::NOT_FOUND | StatusCode::BAD_REQUEST => {
                debug!(status = %status, body = %body, "Token rejected by FCM");
                SendOutcome::Rejected
            }
            _ => {
                error!(status = %status, body = %body, "Failed to send push notification");
                SendOutcome::Failed(TransportError::Status {
                    status: status.as_u16(),
                    body,
                })
            }
        }
    }
}

#[async_trait]
impl PushTransport for FcmClient {
    fn name(&self) -> &str {
        "fcm"
    }

    /// Sends the batch to every token and sums the outcomes.
    ///
    /// Errors only when no send was accepted and no token was rejected,
    /// meaning FCM could not be used at all.
    #[instrument(skip(self, batch), fields(count = batch.tokens.len()))]
    async fn send_multicast(
        &self,
        batch: &NotificationBatch,
    ) -> Result<MulticastResponse, TransportError> {
        if batch.tokens.is_empty() {
            return Ok(MulticastResponse::default());
        }

        let bearer = self.credentials.token().await?;
        let sends: Vec<_> = batch
            .tokens
            .iter()
            .map(|token| self.send_one(bearer.as_deref(), token, batch))
            .collect();
        let outcomes: Vec<SendOutcome> = stream::iter(sends)
            .buffer_unordered(self.max_concurrent_sends)
            .collect()
            .await;

        let mut total = MulticastResponse::default();
        let mut rejected = 0usize;
        let mut last_error = None;
        for outcome in outcomes {
            match outcome {
                SendOutcome::Delivered => total.success_count += 1,
                SendOutcome::Rejected => {
                    rejected += 1;
                    total.failure_count += 1;
                }
                SendOutcome::Failed(e) => {
                    total.failure_count += 1;
                    last_error = Some(e);
                }
            }
        }

        match last_error {
            Some(e) if total.success_count == 0 && rejected == 0 => Err(e),
            _ => {
                info!(
                    success = total.success_count,
                    failure = total.failure_count,
                    rejected,
                    "Push batch completed"
                );
                Ok(total)
            }
        }
    }
}
