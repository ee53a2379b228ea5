//! A scripted weather provider for cycle tests.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use surfwatch::core::{Location, WaveSample, WeatherProvider};
use surfwatch::error::FetchError;

/// What the provider returns for a given location.
#[derive(Clone, Debug)]
pub enum MockResponse {
    Samples(Vec<WaveSample>),
    LengthMismatch,
    Timeout,
}

#[derive(Clone, Default)]
pub struct MockWeatherProvider {
    responses: Arc<Mutex<HashMap<String, MockResponse>>>,
    delays: Arc<Mutex<HashMap<String, Duration>>>,
    pub fetched: Arc<Mutex<Vec<String>>>,
    pub completed: Arc<AtomicUsize>,
}

impl MockWeatherProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_samples(self, location: &str, samples: Vec<WaveSample>) -> Self {
        self.set(location, MockResponse::Samples(samples))
    }

    pub fn with_response(self, location: &str, response: MockResponse) -> Self {
        self.set(location, response)
    }

    /// Delays the response for `location`, to exercise slow fetches.
    pub fn with_delay(self, location: &str, delay: Duration) -> Self {
        self.delays
            .lock()
            .unwrap()
            .insert(location.to_string(), delay);
        self
    }

    fn set(self, location: &str, response: MockResponse) -> Self {
        self.responses
            .lock()
            .unwrap()
            .insert(location.to_string(), response);
        self
    }

    pub fn fetch_count(&self) -> usize {
        self.fetched.lock().unwrap().len()
    }
}

#[async_trait]
impl WeatherProvider for MockWeatherProvider {
    async fn fetch(&self, location: &Location) -> Result<Vec<WaveSample>, FetchError> {
        self.fetched.lock().unwrap().push(location.name.clone());

        let delay = self.delays.lock().unwrap().get(&location.name).copied();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let response = self
            .responses
            .lock()
            .unwrap()
            .get(&location.name)
            .cloned()
            .unwrap_or(MockResponse::Samples(vec![]));
        self.completed.fetch_add(1, Ordering::SeqCst);

        match response {
            MockResponse::Samples(samples) => Ok(samples),
            MockResponse::LengthMismatch => Err(FetchError::LengthMismatch {
                times: 24,
                heights: 23,
                periods: 24,
            }),
            MockResponse::Timeout => Err(FetchError::Timeout),
        }
    }
}
