//! A `MetricsLogger` against a TimescaleDB (plain Postgres wire-compatible)
//! `metrics` hypertable. Grounded in
//! `server/storage/logging/timescaledb.go`'s `TimescaleDbLogger`: one
//! `INSERT` per logged point, keyed by `(parent_id, name)`, read back with
//! a single `SELECT ... WHERE parent_id = $1` ordered by insertion.

use async_trait::async_trait;
use tokio_postgres::NoTls;

use modelbox_core::error::{ModelBoxError, ModelBoxResult};
use modelbox_core::{MetricPoint, MetricsLogger};

pub struct TimescaleDbMetricsLogger {
    client: tokio_postgres::Client,
}

impl TimescaleDbMetricsLogger {
    /// Connects and spawns the driver's background I/O task, the usual
    /// `tokio-postgres` split between `Client` and `Connection`.
    pub async fn connect(config: &str) -> ModelBoxResult<Self> {
        let (client, connection) = tokio_postgres::connect(config, NoTls)
            .await
            .map_err(|e| ModelBoxError::StorageUnavailable(format!("unable to connect to timescaledb: {e}")))?;
        tokio::spawn(async move {
            if let Err(e) = connection.await {
                log::error!("timescaledb connection error: {e}");
            }
        });
        Ok(Self { client })
    }

    pub async fn create_schema(&self) -> ModelBoxResult<()> {
        self.client
            .batch_execute(
                "CREATE TABLE IF NOT EXISTS metrics (
                    time TIMESTAMPTZ NOT NULL DEFAULT now(),
                    parent_id TEXT NOT NULL,
                    name TEXT NOT NULL,
                    double_value DOUBLE PRECISION NOT NULL,
                    step BIGINT NOT NULL,
                    wallclock BIGINT NOT NULL
                )",
            )
            .await
            .map_err(|e| ModelBoxError::StorageUnavailable(format!("unable to create metrics table: {e}")))
    }
}

#[async_trait]
impl MetricsLogger for TimescaleDbMetricsLogger {
    async fn log_metrics(&self, parent_id: &str, key: &str, points: Vec<MetricPoint>) -> ModelBoxResult<()> {
        for point in points {
            self.client
                .execute(
                    "INSERT INTO metrics(parent_id, name, double_value, step, wallclock) VALUES($1, $2, $3, $4, $5)",
                    &[&parent_id, &key, &point.value, &(point.step as i64), &(point.wallclock as i64)],
                )
                .await
                .map_err(|e| ModelBoxError::StorageUnavailable(format!("unable to log metric: {e}")))?;
        }
        Ok(())
    }

    async fn get_metrics(&self, parent_id: &str, key: &str) -> ModelBoxResult<Vec<MetricPoint>> {
        let rows = self
            .client
            .query(
                "SELECT double_value, step, wallclock FROM metrics WHERE parent_id = $1 AND name = $2 ORDER BY time ASC",
                &[&parent_id, &key],
            )
            .await
            .map_err(|e| ModelBoxError::StorageUnavailable(format!("unable to retrieve metrics: {e}")))?;

        Ok(rows
            .into_iter()
            .map(|row| {
                let step: i64 = row.get(1);
                let wallclock: i64 = row.get(2);
                MetricPoint {
                    step: step as u64,
                    wallclock: wallclock as u64,
                    value: row.get(0),
                }
            })
            .collect())
    }
}
