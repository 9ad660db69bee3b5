// src/lib.rs
// Public library surface for the binary and integration tests.

pub mod api;
pub mod app;
pub mod config;
pub mod favorites;
pub mod filter;
pub mod ingest;
pub mod kv;
pub mod metrics;
pub mod model;
pub mod scheduler;
pub mod sort;

// ---- Re-exports for stable public API ----
pub use crate::api::router;
pub use crate::app::TrendApp;
pub use crate::model::{FilterSpec, SortMode, Source, TrendItem};
pub use crate::scheduler::{RefreshOutcome, RefreshScheduler, RefreshStatus};
