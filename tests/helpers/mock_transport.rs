//! A push transport that records every batch it is handed.

use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use surfwatch::core::{MulticastResponse, NotificationBatch, PushTransport};
use surfwatch::error::TransportError;

#[derive(Clone, Default)]
pub struct MockPushTransport {
    pub sent_batches: Arc<Mutex<Vec<NotificationBatch>>>,
    /// Tokens the fake backend reports as unregistered.
    stale_tokens: HashSet<String>,
    fail: bool,
    /// When set, the counter's value is captured at each send.
    observed: Option<Arc<AtomicUsize>>,
    pub observed_at_send: Arc<Mutex<Vec<usize>>>,
}

impl MockPushTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn with_stale_tokens<I: IntoIterator<Item = &'static str>>(mut self, tokens: I) -> Self {
        self.stale_tokens = tokens.into_iter().map(String::from).collect();
        self
    }

    pub fn observing(mut self, counter: Arc<AtomicUsize>) -> Self {
        self.observed = Some(counter);
        self
    }

    pub fn get_sent_batches(&self) -> Vec<NotificationBatch> {
        self.sent_batches.lock().unwrap().clone()
    }
}

#[async_trait]
impl PushTransport for MockPushTransport {
    fn name(&self) -> &str {
        "mock"
    }

    async fn send_multicast(
        &self,
        batch: &NotificationBatch,
    ) -> Result<MulticastResponse, TransportError> {
        if let Some(counter) = &self.observed {
            self.observed_at_send
                .lock()
                .unwrap()
                .push(counter.load(Ordering::SeqCst));
        }
        self.sent_batches.lock().unwrap().push(batch.clone());

        if self.fail {
            return Err(TransportError::Status {
                status: 500,
                body: "internal".to_string(),
            });
        }

        let failure_count = batch
            .tokens
            .iter()
            .filter(|t| self.stale_tokens.contains(t.as_str()))
            .count();
        Ok(MulticastResponse {
            success_count: batch.tokens.len() - failure_count,
            failure_count,
        })
    }
}
