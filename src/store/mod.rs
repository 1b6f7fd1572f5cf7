//! Configuration storage subsystem.
//!
//! # Data Flow
//! ```text
//! get_or_create(key, defaults)
//!     → engine.rs (cache lookup, disk read on miss)
//!     → format.rs (LineFormat for translations, TreeFormat otherwise)
//!     → codec.rs (dot-path keys ↔ nested tree)
//!     → merge missing defaults, persist, refresh cache
//! ```
//!
//! # Design Decisions
//! - One explicitly constructed `ConfigStore` per process, shared via `Arc`
//! - Reads never fail; a broken file is an empty document
//! - Defaults only ever add keys, they never replace stored values
//! - Registration through a `ConfigHandle` is persisted only on `save`

pub mod codec;
pub mod engine;
pub mod error;
pub mod format;
pub mod handle;
pub mod types;

pub use codec::ValueTree;
pub use engine::ConfigStore;
pub use error::{FormatError, StoreError, StoreResult};
pub use format::{DocumentFormat, LineFormat, TreeFormat};
pub use handle::ConfigHandle;
pub use types::{ConfigKey, Document, Domain};
