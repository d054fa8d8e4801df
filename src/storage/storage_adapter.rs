//! Storage adapters.
//!
//! An adapter wraps a store (or another adapter) and has the same interface as a store.
//!  - [`UsageLogStorageAdapter`] logs every storage call through the [`log`] facade.
//!  - [`PerformanceMetricsStorageAdapter`] counts requests and bytes transferred.

mod performance_metrics;
mod usage_log;

pub use performance_metrics::PerformanceMetricsStorageAdapter;
pub use usage_log::UsageLogStorageAdapter;
