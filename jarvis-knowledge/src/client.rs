//! HTTP knowledge source: `GET {base_url}/knowledge?intent=..&q=..`.
//!
//! The endpoint answers with JSON. An object carrying an `answer` field is
//! unwrapped; any other body is used as-is. A 404 means "nothing known".

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde_json::Value;
use tracing::{debug, warn};

use jarvis_core::config::KnowledgeConfig;

use crate::error::{KnowledgeError, Result};
use crate::source::KnowledgeSource;
use crate::types::KnowledgeQuery;

/// Knowledge served by an HTTP JSON endpoint.
#[derive(Debug, Clone)]
pub struct HttpKnowledge {
    http: Client,
    base_url: String,
    timeout_ms: u64,
    max_retries: u32,
}

impl HttpKnowledge {
    /// Create a client for `base_url`.
    ///
    /// # Errors
    /// Returns `KnowledgeError::Unavailable` for an empty URL or if the HTTP
    /// client cannot be built.
    pub fn new(base_url: impl Into<String>, timeout_ms: u64, max_retries: u32) -> Result<Self> {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        if base_url.is_empty() {
            return Err(KnowledgeError::Unavailable("no base_url configured".into()));
        }
        let http = Client::builder()
            .timeout(Duration::from_millis(timeout_ms))
            .build()
            .map_err(|e| KnowledgeError::Unavailable(e.to_string()))?;
        Ok(Self {
            http,
            base_url,
            timeout_ms,
            max_retries,
        })
    }

    /// Create a client from the `[knowledge]` config section.
    ///
    /// # Errors
    /// See [`HttpKnowledge::new`].
    pub fn from_config(config: &KnowledgeConfig) -> Result<Self> {
        Self::new(config.base_url.clone(), config.timeout_ms, config.max_retries)
    }

    /// Endpoint base URL.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn attempt(&self, query: &KnowledgeQuery) -> Result<Value> {
        let url = format!("{}/knowledge", self.base_url);
        let key = query.key();
        let resp = self
            .http
            .get(&url)
            .query(&[("intent", query.intent.as_str()), ("q", key.as_str())])
            .send()
            .await
            .map_err(|e| self.classify(e))?;

        match resp.status() {
            StatusCode::NOT_FOUND => Err(KnowledgeError::NotFound(key)),
            status if status.is_success() => {
                let body: Value = resp
                    .json()
                    .await
                    .map_err(|e| KnowledgeError::Parse(e.to_string()))?;
                Ok(match body {
                    Value::Object(mut map) if map.contains_key("answer") => {
                        map.remove("answer").unwrap_or(Value::Null)
                    }
                    other => other,
                })
            }
            status if status.is_server_error() => {
                Err(KnowledgeError::Unavailable(format!("HTTP {status}")))
            }
            status => Err(KnowledgeError::RequestFailed(format!("HTTP {status}"))),
        }
    }

    fn classify(&self, err: reqwest::Error) -> KnowledgeError {
        match KnowledgeError::from(err) {
            KnowledgeError::Timeout(_) => KnowledgeError::Timeout(self.timeout_ms),
            other => other,
        }
    }
}

#[async_trait]
impl KnowledgeSource for HttpKnowledge {
    fn name(&self) -> &str {
        "http"
    }

    async fn acquire(&self, query: &KnowledgeQuery) -> Result<Value> {
        let mut last_error = KnowledgeError::Unavailable("no attempt made".into());

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                debug!(attempt = attempt + 1, of = self.max_retries + 1, "Retrying knowledge request");
            }

            let start = Instant::now();
            match self.attempt(query).await {
                Ok(value) => {
                    debug!(
                        intent = %query.intent,
                        elapsed_us = start.elapsed().as_micros(),
                        "Knowledge acquired"
                    );
                    return Ok(value);
                }
                Err(e) if e.is_transient() => {
                    warn!(intent = %query.intent, error = %e, "Knowledge request failed");
                    last_error = e;
                }
                Err(e) => return Err(e),
            }
        }

        Err(last_error)
    }
}
