//! The `Agent`: builds every backend from `ServerConfig`, starts the
//! scheduler tick loop, joins cluster membership, starts the Prometheus
//! listener, and blocks until a termination signal arrives. Grounded in
//! `server/agent.go`'s `Agent`/`NewAgent`/`StartAndBlock`/`handleSignals`.
//!
//! The gRPC/grpc-web/admin listeners `agent.go` binds up front (so a
//! port conflict fails fast at startup, before anything else runs) are a
//! codegen concern this workspace doesn't carry — see the `modelbox-rpc`
//! module doc. `ModelStore`/`AdminService` are still built here, fully
//! able to serve requests the moment a transport is wired to them; until
//! then `modelbox client` talks to them in-process (see `client.rs`).

use std::sync::Arc;

use tokio::sync::oneshot;
use tokio::task::JoinHandle;

use modelbox_core::{ClusterMembership, MetadataStore, Scheduler};
use modelbox_domain::ClusterMember;
use modelbox_rpc::{AdminService, ModelStore};

use crate::wiring;

pub struct Agent {
    pub metadata: Arc<dyn MetadataStore>,
    pub model_store: Arc<ModelStore>,
    pub admin_service: Arc<AdminService>,
    membership: Arc<dyn ClusterMembership>,
    server_metrics: Arc<modelbox_metrics::ServerMetrics>,
    prometheus_addr: String,
    scheduler: Arc<Scheduler>,
    scheduler_handle: Option<JoinHandle<()>>,
    scheduler_stop: Option<oneshot::Sender<()>>,
    prom_handle: Option<JoinHandle<()>>,
}

impl Agent {
    pub async fn new(config: &modelbox_core::ServerConfig) -> anyhow::Result<Self> {
        let metadata = wiring::build_metadata_store(config)?;
        let blobs = wiring::build_blob_store(config).await?;
        let metrics_logger = wiring::build_metrics_logger(config).await?;

        log::info!(
            "using metadata backend: {:?}, artifacts backend: {:?}, metrics backend: {:?}",
            config.metadata_storage,
            config.artifact_storage,
            config.metrics_storage
        );

        let self_member = ClusterMember::new(
            hostname(),
            config.grpc_listen_addr.clone(),
            config.http_listen_addr.clone(),
            modelbox_core::now_epoch(),
        );
        let membership = wiring::build_membership(config, self_member)?;
        log::info!("cluster membership backend: {:?}", config.cluster_membership);

        let server_metrics = Arc::new(modelbox_metrics::ServerMetrics::new()?);

        let model_store = Arc::new(ModelStore::new(
            metadata.clone(),
            blobs,
            metrics_logger,
            membership.clone(),
        ));
        let admin_service = Arc::new(AdminService::new(metadata.clone()));

        let triggers = wiring::build_trigger_evaluator();
        let scheduler = Arc::new(Scheduler::new(
            metadata.clone(),
            triggers,
            config.scheduler_tick_duration(),
            config.agent_stale_threshold(),
        ));

        Ok(Self {
            metadata,
            model_store,
            admin_service,
            membership,
            server_metrics,
            prometheus_addr: config.prometheus_addr.clone(),
            scheduler,
            scheduler_handle: None,
            scheduler_stop: None,
            prom_handle: None,
        })
    }

    /// Joins the cluster, starts the scheduler and the Prometheus
    /// listener, then blocks on signals exactly as `Agent.StartAndBlock`
    /// does, returning the process exit code.
    pub async fn start_and_block(mut self) -> i32 {
        if let Err(e) = self.membership.join().await {
            log::error!("unable to join cluster membership: {e}");
        }

        let (handle, stop) = self.scheduler.clone().spawn();
        self.scheduler_handle = Some(handle);
        self.scheduler_stop = Some(stop);

        let prom_addr = self.prometheus_addr.clone();
        let prom_metrics = self.server_metrics.clone();
        self.prom_handle = Some(tokio::spawn(async move {
            if let Err(e) = modelbox_rpc::prometheus_server::serve(&prom_addr, prom_metrics).await {
                log::error!("prometheus server exited: {e}");
            }
        }));

        self.handle_signals().await
    }

    async fn handle_signals(mut self) -> i32 {
        use tokio::signal::unix::{signal, SignalKind};

        let mut sigint = signal(SignalKind::interrupt()).expect("install SIGINT handler");
        let mut sigterm = signal(SignalKind::terminate()).expect("install SIGTERM handler");
        let mut sighup = signal(SignalKind::hangup()).expect("install SIGHUP handler");
        let mut sigpipe = signal(SignalKind::pipe()).expect("install SIGPIPE handler");

        loop {
            tokio::select! {
                _ = sigint.recv() => break,
                _ = sigterm.recv() => break,
                _ = sighup.recv() => {
                    log::info!("SIGHUP received; config reload is not supported, ignoring");
                    continue;
                }
                _ = sigpipe.recv() => continue,
            }
        }

        self.shutdown().await;
        0
    }

    async fn shutdown(mut self) {
        if let Some(stop) = self.scheduler_stop.take() {
            let _ = stop.send(());
        }
        if let Some(handle) = self.scheduler_handle.take() {
            let _ = handle.await;
        }

        if let Err(e) = self.membership.leave().await {
            log::error!("error leaving cluster membership: {e}");
        }

        if let Some(handle) = self.prom_handle.take() {
            handle.abort();
        }

        if let Err(e) = self.metadata.close().await {
            log::error!("error closing storage: {e}");
        }
    }
}

fn hostname() -> String {
    hostname_from_env().unwrap_or_else(|| "localhost".to_string())
}

fn hostname_from_env() -> Option<String> {
    std::env::var("HOSTNAME").ok().filter(|h| !h.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use modelbox_domain::{Experiment, Framework};
    use modelbox_rpc::dto::{CreateExperimentRequest, GetExperimentRequest};
    use modelbox_rpc::ModelStoreService;

    fn test_config(dir: &std::path::Path) -> modelbox_core::ServerConfig {
        let mut config = modelbox_core::ServerConfig::default();
        config.filesystem = Some(modelbox_core::config::FilesystemArtifactConfig {
            base_dir: dir.join("blobs").to_string_lossy().into_owned(),
        });
        config.prometheus_addr = "127.0.0.1:0".to_string();
        config
    }

    #[tokio::test]
    async fn new_wires_a_fully_functional_model_store_over_the_ephemeral_backend() {
        let dir = tempfile::tempdir().unwrap();
        let config = test_config(dir.path());
        let agent = Agent::new(&config).await.unwrap();

        let experiment = Experiment::new("exp-1", "alice", "default", "ext-1", Framework::Pytorch, 0);
        let created = agent
            .model_store
            .create_experiment(CreateExperimentRequest {
                experiment: experiment.clone(),
                metadata: Default::default(),
            })
            .await
            .unwrap();
        assert!(!created.exists);

        let fetched = agent
            .model_store
            .get_experiment(GetExperimentRequest { id: created.id })
            .await
            .unwrap();
        assert_eq!(fetched.name, experiment.name);
    }

    #[tokio::test]
    async fn shutdown_stops_the_scheduler_and_closes_the_store_without_joining_yet() {
        let dir = tempfile::tempdir().unwrap();
        let config = test_config(dir.path());
        let agent = Agent::new(&config).await.unwrap();

        // Exercise the shutdown path directly, without start_and_block's
        // signal wait: the scheduler/prom handles are still `None`, so
        // only membership.leave() and metadata.close() actually run.
        agent.shutdown().await;
    }
}
