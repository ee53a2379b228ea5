//! Device token registries.
//!
//! `FirestoreTokenRegistry` pages through the users collection over the
//! Firestore REST API and pulls each user's token field out of the document.
//! `StaticTokenRegistry` serves a fixed list from configuration.

use crate::auth::AccessTokenSource;
use crate::config::RegistryConfig;
use crate::core::{RecipientToken, TokenRegistry};
use crate::error::RegistryError;
use anyhow::Result;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, instrument};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListDocumentsResponse {
    #[serde(default)]
    documents: Vec<Document>,
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Document {
    #[serde(default)]
    fields: HashMap<String, Value>,
}

impl Document {
    /// Returns the field's value if it is a Firestore `stringValue`.
    fn string_field(&self, field: &str) -> Option<&str> {
        self.fields
            .get(field)
            .and_then(|v| v.get("stringValue"))
            .and_then(Value::as_str)
    }
}

/// Lists tokens from a Firestore collection.
pub struct FirestoreTokenRegistry {
    client: reqwest::Client,
    documents_url: String,
    token_field: String,
    credentials: Arc<AccessTokenSource>,
    page_size: u32,
}

impl FirestoreTokenRegistry {
    /// Creates a new registry from the registry configuration.
    pub fn from_config(
        config: &RegistryConfig,
        credentials: Arc<AccessTokenSource>,
    ) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()?;
        let documents_url = format!(
            "{}/v1/projects/{}/databases/(default)/documents/{}",
            config.base_url.trim_end_matches('/'),
            config.project_id,
            config.collection
        );
        Ok(Self {
            client,
            documents_url,
            token_field: config.token_field.clone(),
            credentials,
            page_size: config.page_size.max(1),
        })
    }

    async fn fetch_page(
        &self,
        page_token: Option<&str>,
    ) -> Result<ListDocumentsResponse, RegistryError> {
        let mut query = vec![("pageSize", self.page_size.to_string())];
        if let Some(token) = page_token {
            query.push(("pageToken", token.to_string()));
        }

        let mut request = self.client.get(&self.documents_url).query(&query);
        if let Some(access_token) = self.credentials.token().await? {
            request = request.bearer_auth(access_token);
        }

        let res = request.send().await?;
        let status = res.status();
        if !status.is_success() {
            let body = res.text().await.unwrap_or_default();
            return Err(RegistryError::Status {
                status: status.as_u16(),
                body,
            });
        }

        res.json::<ListDocumentsResponse>()
            .await
            .map_err(|e| RegistryError::Decode(e.to_string()))
    }
}

#[async_trait]
impl TokenRegistry for FirestoreTokenRegistry {
    #[instrument(skip(self))]
    async fn list_tokens(&self) -> Result<Vec<RecipientToken>, RegistryError> {
        let mut tokens = Vec::new();
        let mut page_token: Option<String> = None;
        let mut pages = 0usize;

        loop {
            let page = self.fetch_page(page_token.as_deref()).await?;
            pages += 1;
            tokens.extend(
                page.documents
                    .iter()
                    .filter_map(|doc| doc.string_field(&self.token_field))
                    .map(RecipientToken::from),
            );

            match page.next_page_token {
                Some(next) if !next.is_empty() => page_token = Some(next),
                _ => break,
            }
        }

        debug!(pages, count = tokens.len(), "Listed device tokens");
        Ok(tokens)
    }
}

/// A registry backed by a fixed list of tokens.
#[derive(Debug, Clone, Default)]
pub struct StaticTokenRegistry {
    tokens: Vec<RecipientToken>,
}

impl StaticTokenRegistry {
    pub fn new<I, S>(tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            tokens: tokens.into_iter().map(RecipientToken::new).collect(),
        }
    }
}

#[async_trait]
impl TokenRegistry for StaticTokenRegistry {
    async fn list_tokens(&self) -> Result<Vec<RecipientToken>, RegistryError> {
        Ok(self.tokens.clone())
    }
}
