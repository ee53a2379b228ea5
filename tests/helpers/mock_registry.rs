//! A token registry that returns a fixed list or a fixed failure.

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use surfwatch::core::{RecipientToken, TokenRegistry};
use surfwatch::error::RegistryError;

#[derive(Clone, Debug)]
pub struct MockTokenRegistry {
    tokens: Vec<RecipientToken>,
    fail: bool,
    pub calls: Arc<AtomicUsize>,
}

impl MockTokenRegistry {
    pub fn with_tokens<I, S>(tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            tokens: tokens.into_iter().map(RecipientToken::new).collect(),
            fail: false,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn failing() -> Self {
        Self {
            tokens: vec![],
            fail: true,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TokenRegistry for MockTokenRegistry {
    async fn list_tokens(&self) -> Result<Vec<RecipientToken>, RegistryError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(RegistryError::Status {
                status: 503,
                body: "unavailable".to_string(),
            });
        }
        Ok(self.tokens.clone())
    }
}
