//! Client side of the configuration store.
//!
//! # Data Flow
//! ```text
//! service startup / request
//!     → cache.rs (local hit? return it)
//!     → POST /config/{domain}/{category}[/{locale}] with defaults
//!     → success: cache merged map | failure: return defaults
//! ```

pub mod cache;

pub use cache::{ClientError, ConfigClientCache};
