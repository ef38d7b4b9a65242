//! `MetricsLogger` drivers (`in_memory`, `timescaledb`) and the
//! process-level Prometheus `registry`.

pub mod in_memory;
pub mod registry;
#[cfg(feature = "timescaledb")]
pub mod timescaledb;

pub use in_memory::InMemoryMetricsLogger;
pub use registry::ServerMetrics;
#[cfg(feature = "timescaledb")]
pub use timescaledb::TimescaleDbMetricsLogger;
