//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (main.rs):
//!     Load settings → Validate → Init logging/metrics → Open store → Bind listener
//!
//! Shutdown (shutdown.rs):
//!     Signal received (signals.rs) → trigger → server stops accepting → drain → exit
//! ```
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - Documents are written synchronously on save, so nothing needs flushing at exit

pub mod shutdown;
pub mod signals;

pub use shutdown::Shutdown;
