//! Lead conversation context store for Jurify agents.
//!
//! Provides a bounded, TTL-expiring map of per-lead JSON context shared
//! across stateless agent turns:
//! - Shallow-merge writes with expiry checked before merging
//! - Lazy expiry on read plus a periodic background sweep
//! - Oldest-write eviction when the store is full

pub mod config;
pub mod error;
pub mod metrics;
pub mod runtime;
pub mod store;
pub mod time;

pub use crate::config::StoreConfig;
pub use error::StoreError;
pub use metrics::StoreStats;
pub use runtime::ContextRuntime;
pub use store::{ContextMap, ContextStore, SweepHandle};
pub use time::{Clock, ManualClock, SystemClock};
