//! An in-process `MetricsLogger` for the single-replica / test
//! deployment: points are appended to a per-`(parent_id, key)` `Vec`
//! under a `DashMap`, preserving log order under the single-writer
//! assumption the trait documents.

use async_trait::async_trait;
use dashmap::DashMap;

use modelbox_core::error::ModelBoxResult;
use modelbox_core::{MetricPoint, MetricsLogger};

#[derive(Default)]
pub struct InMemoryMetricsLogger {
    points: DashMap<(String, String), Vec<MetricPoint>>,
}

impl InMemoryMetricsLogger {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl MetricsLogger for InMemoryMetricsLogger {
    async fn log_metrics(&self, parent_id: &str, key: &str, points: Vec<MetricPoint>) -> ModelBoxResult<()> {
        self.points
            .entry((parent_id.to_string(), key.to_string()))
            .or_default()
            .extend(points);
        Ok(())
    }

    async fn get_metrics(&self, parent_id: &str, key: &str) -> ModelBoxResult<Vec<MetricPoint>> {
        Ok(self
            .points
            .get(&(parent_id.to_string(), key.to_string()))
            .map(|entry| entry.clone())
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn points_come_back_in_the_order_they_were_logged() {
        let logger = InMemoryMetricsLogger::new();
        logger
            .log_metrics("ckpt-1", "loss", vec![MetricPoint { step: 0, wallclock: 100, value: 1.0 }])
            .await
            .unwrap();
        logger
            .log_metrics("ckpt-1", "loss", vec![MetricPoint { step: 1, wallclock: 101, value: 0.5 }])
            .await
            .unwrap();

        let points = logger.get_metrics("ckpt-1", "loss").await.unwrap();
        assert_eq!(points.len(), 2);
        assert_eq!(points[0].step, 0);
        assert_eq!(points[1].step, 1);
    }

    #[tokio::test]
    async fn distinct_keys_under_the_same_parent_do_not_mix() {
        let logger = InMemoryMetricsLogger::new();
        logger
            .log_metrics("ckpt-1", "loss", vec![MetricPoint { step: 0, wallclock: 100, value: 1.0 }])
            .await
            .unwrap();
        logger
            .log_metrics("ckpt-1", "accuracy", vec![MetricPoint { step: 0, wallclock: 100, value: 0.9 }])
            .await
            .unwrap();

        assert_eq!(logger.get_metrics("ckpt-1", "loss").await.unwrap().len(), 1);
        assert_eq!(logger.get_metrics("ckpt-1", "accuracy").await.unwrap().len(), 1);
        assert!(logger.get_metrics("ckpt-1", "unknown").await.unwrap().is_empty());
    }
}
