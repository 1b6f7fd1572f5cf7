//! Dynamic configuration store.
//!
//! Services declare configuration keys with defaults; unknown keys are
//! seeded into durable storage the first time they are requested and
//! merged, cached values are served afterwards over a small HTTP API.

pub mod client;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod settings;
pub mod store;

pub use client::ConfigClientCache;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use settings::ServiceSettings;
pub use store::{ConfigHandle, ConfigKey, ConfigStore, Domain};
