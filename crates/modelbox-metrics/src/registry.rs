//! The process-level Prometheus `Registry` and the counters/gauges the
//! scheduler, RPC frontends, and membership loop publish through it.
//! `modelbox-rpc`'s scrape listener (`GET /metrics`) renders whatever this
//! registry has accumulated; this crate only owns the metric objects.

use prometheus::{Encoder, IntCounter, IntCounterVec, IntGauge, Opts, Registry, TextEncoder};

use modelbox_core::error::{ModelBoxError, ModelBoxResult};

pub struct ServerMetrics {
    registry: Registry,
    pub scheduler_ticks_total: IntCounter,
    pub actions_created_total: IntCounter,
    pub action_instances_created_total: IntCounter,
    pub dead_agents_evicted_total: IntCounter,
    pub rpc_requests_total: IntCounterVec,
    pub live_cluster_members: IntGauge,
}

impl ServerMetrics {
    pub fn new() -> ModelBoxResult<Self> {
        let registry = Registry::new();

        let scheduler_ticks_total =
            IntCounter::new("modelbox_scheduler_ticks_total", "Scheduler tick loop iterations")
                .map_err(registry_error)?;
        let actions_created_total =
            IntCounter::new("modelbox_actions_created_total", "Actions created from fired triggers")
                .map_err(registry_error)?;
        let action_instances_created_total = IntCounter::new(
            "modelbox_action_instances_created_total",
            "ActionInstances materialized by the scheduler",
        )
        .map_err(registry_error)?;
        let dead_agents_evicted_total = IntCounter::new(
            "modelbox_dead_agents_evicted_total",
            "Agents dropped from the live roster for a stale heartbeat",
        )
        .map_err(registry_error)?;
        let rpc_requests_total = IntCounterVec::new(
            Opts::new("modelbox_rpc_requests_total", "RPC calls received, by method and status"),
            &["method", "status"],
        )
        .map_err(registry_error)?;
        let live_cluster_members =
            IntGauge::new("modelbox_live_cluster_members", "Members returned by the last GetMembers call")
                .map_err(registry_error)?;

        registry.register(Box::new(scheduler_ticks_total.clone())).map_err(registry_error)?;
        registry.register(Box::new(actions_created_total.clone())).map_err(registry_error)?;
        registry
            .register(Box::new(action_instances_created_total.clone()))
            .map_err(registry_error)?;
        registry.register(Box::new(dead_agents_evicted_total.clone())).map_err(registry_error)?;
        registry.register(Box::new(rpc_requests_total.clone())).map_err(registry_error)?;
        registry.register(Box::new(live_cluster_members.clone())).map_err(registry_error)?;

        Ok(Self {
            registry,
            scheduler_ticks_total,
            actions_created_total,
            action_instances_created_total,
            dead_agents_evicted_total,
            rpc_requests_total,
            live_cluster_members,
        })
    }

    /// Renders the registered metric families in the Prometheus text
    /// exposition format, for the `GET /metrics` scrape handler.
    pub fn gather(&self) -> ModelBoxResult<String> {
        let metric_families = self.registry.gather();
        let mut buf = Vec::new();
        TextEncoder::new()
            .encode(&metric_families, &mut buf)
            .map_err(|e| ModelBoxError::StorageUnavailable(format!("unable to encode metrics: {e}")))?;
        String::from_utf8(buf).map_err(|e| ModelBoxError::StorageUnavailable(format!("non-utf8 metrics output: {e}")))
    }
}

impl Default for ServerMetrics {
    fn default() -> Self {
        Self::new().expect("metric registration is infallible for distinct, valid metric names")
    }
}

fn registry_error(e: prometheus::Error) -> ModelBoxError {
    ModelBoxError::StorageUnavailable(format!("prometheus registration: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gathered_output_reflects_incremented_counters() {
        let metrics = ServerMetrics::new().unwrap();
        metrics.scheduler_ticks_total.inc();
        metrics.rpc_requests_total.with_label_values(&["get_metadata", "ok"]).inc();

        let rendered = metrics.gather().unwrap();
        assert!(rendered.contains("modelbox_scheduler_ticks_total 1"));
        assert!(rendered.contains("modelbox_rpc_requests_total"));
    }
}
