//! The `MetricsLogger` capability: append float metrics keyed by
//! `(parent_id, key)` with a `(step, wallclock)` pair, and read them back
//! in logged order. Concrete drivers (in-memory, TimescaleDB) are
//! collaborators, not part of the core.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::ModelBoxResult;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MetricPoint {
    pub step: u64,
    pub wallclock: u64,
    pub value: f64,
}

#[async_trait]
pub trait MetricsLogger: Send + Sync {
    async fn log_metrics(&self, parent_id: &str, key: &str, points: Vec<MetricPoint>) -> ModelBoxResult<()>;

    /// Returns points in the order they were logged, under the
    /// single-writer-per-(parent_id, key) assumption.
    async fn get_metrics(&self, parent_id: &str, key: &str) -> ModelBoxResult<Vec<MetricPoint>>;
}
