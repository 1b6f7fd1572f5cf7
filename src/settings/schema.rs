//! Service settings schema.
//!
//! All types derive Serde traits for deserialization from a TOML file, and
//! every section falls back to its defaults so a minimal file is valid.

use serde::{Deserialize, Serialize};

/// Root settings for the dynconf service.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ServiceSettings {
    /// Listener configuration (bind address, body limit).
    pub listener: ListenerSettings,

    /// Where documents are persisted.
    pub storage: StorageSettings,

    /// Timeout configuration.
    pub timeouts: TimeoutSettings,

    /// Settings used by consumers of the store.
    pub client: ClientSettings,

    /// Observability settings.
    pub observability: ObservabilitySettings,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerSettings {
    /// Bind address (e.g., "0.0.0.0:8085").
    pub bind_address: String,

    /// Maximum accepted request body in bytes.
    pub max_body_bytes: usize,
}

impl Default for ListenerSettings {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8085".to_string(),
            max_body_bytes: 1024 * 1024,
        }
    }
}

/// Storage configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct StorageSettings {
    /// Root directory; documents live under `{root}/{domain}/...`.
    pub root: String,
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            root: "./data/config".to_string(),
        }
    }
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutSettings {
    /// Request timeout in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutSettings {
    fn default() -> Self {
        Self { request_secs: 10 }
    }
}

/// Settings for `ConfigClientCache`.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ClientSettings {
    /// Base URL of the store (e.g., "http://config-store:8085").
    pub store_url: String,

    /// Per-call timeout in milliseconds; on expiry defaults are used.
    pub timeout_ms: u64,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            store_url: "http://127.0.0.1:8085".to_string(),
            timeout_ms: 3000,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilitySettings {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Emit logs as JSON lines.
    pub json_logs: bool,

    /// Enable the Prometheus endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilitySettings {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            json_logs: false,
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9095".to_string(),
        }
    }
}
