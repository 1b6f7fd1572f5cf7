//! HTTP API subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, request ID, trace span, timeout, metrics)
//!     → handlers.rs (parse domain/category/locale, call the store)
//!     → error.rs (StoreError → status code + JSON error body)
//!     → Send to client
//! ```

pub mod error;
pub mod handlers;
pub mod server;

pub use server::{AppState, HttpServer};
