//! Consumer-side mirror of store documents.
//!
//! # Responsibilities
//! - Register defaults with the store and cache the merged result
//! - Keep the owning service running on its defaults when the store is down
//!
//! # Design Decisions
//! - Failures are never returned to the caller; they are logged and counted
//! - Fallback results are not cached, so the next call retries the store
//! - A cached document is re-registered when a caller brings keys it lacks
//! - Entries never expire; `clear_cache` is the only invalidation

use std::collections::BTreeMap;
use std::time::Duration;

use dashmap::DashMap;
use thiserror::Error;
use url::Url;

use crate::observability::metrics;
use crate::settings::ClientSettings;
use crate::store::Domain;

/// Errors raised while talking to the store. They stay inside this module.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("invalid store URL: {0}")]
    Url(#[from] url::ParseError),

    #[error("store URL cannot carry path segments: {0}")]
    BaseUrl(String),

    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("store returned status {0}")]
    Status(reqwest::StatusCode),
}

impl ClientError {
    fn reason(&self) -> &'static str {
        match self {
            ClientError::Url(_) | ClientError::BaseUrl(_) => "url",
            ClientError::Request(e) if e.is_timeout() => "timeout",
            ClientError::Request(e) if e.is_connect() => "connect",
            ClientError::Request(e) if e.is_decode() => "decode",
            ClientError::Request(_) => "request",
            ClientError::Status(_) => "status",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct CacheKey {
    domain: Domain,
    category: String,
    locale: Option<String>,
}

/// Remote configuration cache that degrades to caller-supplied defaults.
#[derive(Debug, Clone)]
pub struct ConfigClientCache {
    http: reqwest::Client,
    base_url: Url,
    entries: std::sync::Arc<DashMap<CacheKey, BTreeMap<String, String>>>,
}

impl ConfigClientCache {
    /// Build a client for the store at `settings.store_url`.
    pub fn new(settings: &ClientSettings) -> Result<Self, ClientError> {
        let base_url = Url::parse(&settings.store_url)?;
        if base_url.cannot_be_a_base() {
            return Err(ClientError::BaseUrl(settings.store_url.clone()));
        }
        let timeout = Duration::from_millis(settings.timeout_ms);
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .connect_timeout(timeout)
            .build()?;

        tracing::info!(store_url = %base_url, timeout_ms = settings.timeout_ms, "Config client initialized");
        Ok(Self {
            http,
            base_url,
            entries: Default::default(),
        })
    }

    /// Merged configuration for a document, or `defaults` if the store
    /// cannot be reached.
    pub async fn fetch(
        &self,
        domain: Domain,
        category: &str,
        locale: Option<&str>,
        defaults: &BTreeMap<String, String>,
    ) -> BTreeMap<String, String> {
        let key = CacheKey {
            domain,
            category: category.to_string(),
            locale: locale.map(str::to_string),
        };
        let cached = self.entries.get(&key).map(|entry| entry.value().clone());
        if let Some(cached) = &cached {
            if defaults.keys().all(|k| cached.contains_key(k)) {
                return cached.clone();
            }
            tracing::debug!(domain = %domain, category, "New default keys, registering with store");
        }

        match self.register(&key, defaults).await {
            Ok(values) => {
                self.entries.insert(key, values.clone());
                values
            }
            Err(e) => {
                tracing::warn!(
                    domain = %domain,
                    category,
                    locale = ?locale,
                    error = %e,
                    "Config store unavailable, using defaults"
                );
                metrics::record_client_fallback(e.reason());
                let mut values = defaults.clone();
                values.extend(cached.unwrap_or_default());
                values
            }
        }
    }

    /// Single value from a document, registering `default` for it.
    pub async fn get(
        &self,
        domain: Domain,
        category: &str,
        locale: Option<&str>,
        key: &str,
        default: &str,
    ) -> String {
        let defaults = BTreeMap::from([(key.to_string(), default.to_string())]);
        self.fetch(domain, category, locale, &defaults)
            .await
            .remove(key)
            .unwrap_or_else(|| default.to_string())
    }

    /// Drop every cached document.
    pub fn clear_cache(&self) {
        self.entries.clear();
        tracing::info!("Config client cache cleared");
    }

    pub fn cached_documents(&self) -> usize {
        self.entries.len()
    }

    fn document_url(&self, key: &CacheKey) -> Result<Url, ClientError> {
        let mut url = self.base_url.clone();
        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|_| ClientError::BaseUrl(self.base_url.to_string()))?;
            segments
                .pop_if_empty()
                .push("config")
                .push(key.domain.wire_name())
                .push(&key.category);
            if let Some(locale) = &key.locale {
                segments.push(locale);
            }
        }
        Ok(url)
    }

    async fn register(
        &self,
        key: &CacheKey,
        defaults: &BTreeMap<String, String>,
    ) -> Result<BTreeMap<String, String>, ClientError> {
        let url = self.document_url(key)?;
        let response = self.http.post(url).json(defaults).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ClientError::Status(status));
        }
        Ok(response.json().await?)
    }
}
