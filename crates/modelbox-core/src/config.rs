//! Server configuration surface. Concrete loading (TOML file, env
//! overlay) is a collaborator outside the core; this module only defines
//! the shape and sane defaults, mirroring the enumerated config keys.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_AGENT_STALE_THRESHOLD, DEFAULT_LEASE_INTERVAL, DEFAULT_SCHEDULER_TICK,
    DEFAULT_STALE_HEARTBEAT,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactStorageKind {
    Filesystem,
    S3,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetadataStorageKind {
    Mysql,
    Postgres,
    Sqlite3,
    Ephemeral,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricsStorageKind {
    Timescaledb,
    Inmemory,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClusterMembershipKind {
    Static,
    Mysql,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FilesystemArtifactConfig {
    pub base_dir: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct S3ArtifactConfig {
    pub bucket: String,
    pub region: String,
    pub endpoint: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SqlBackendConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub database: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SqlClusterMembershipConfig {
    pub lease_interval_secs: u64,
    pub stale_heartbeat_duration_secs: u64,
}

impl Default for SqlClusterMembershipConfig {
    fn default() -> Self {
        Self {
            lease_interval_secs: DEFAULT_LEASE_INTERVAL.as_secs(),
            stale_heartbeat_duration_secs: DEFAULT_STALE_HEARTBEAT.as_secs(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub artifact_storage: ArtifactStorageKind,
    pub metadata_storage: MetadataStorageKind,
    pub metrics_storage: MetricsStorageKind,
    pub cluster_membership: ClusterMembershipKind,

    pub grpc_listen_addr: String,
    pub http_listen_addr: String,
    pub admin_listen_addr: String,
    pub prometheus_addr: String,

    pub filesystem: Option<FilesystemArtifactConfig>,
    pub s3: Option<S3ArtifactConfig>,
    pub mysql: Option<SqlBackendConfig>,
    pub postgres: Option<SqlBackendConfig>,
    pub sqlite3: Option<SqlBackendConfig>,

    pub sql_cluster_membership: SqlClusterMembershipConfig,

    pub scheduler_tick_duration_secs: u64,
    pub agent_stale_threshold_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            artifact_storage: ArtifactStorageKind::Filesystem,
            metadata_storage: MetadataStorageKind::Ephemeral,
            metrics_storage: MetricsStorageKind::Inmemory,
            cluster_membership: ClusterMembershipKind::Static,
            grpc_listen_addr: "0.0.0.0:8085".to_string(),
            http_listen_addr: "0.0.0.0:8086".to_string(),
            admin_listen_addr: "0.0.0.0:8087".to_string(),
            prometheus_addr: "0.0.0.0:9090".to_string(),
            filesystem: Some(FilesystemArtifactConfig {
                base_dir: "./data/blobs".to_string(),
            }),
            s3: None,
            mysql: None,
            postgres: None,
            sqlite3: None,
            sql_cluster_membership: SqlClusterMembershipConfig::default(),
            scheduler_tick_duration_secs: DEFAULT_SCHEDULER_TICK.as_secs(),
            agent_stale_threshold_secs: DEFAULT_AGENT_STALE_THRESHOLD.as_secs(),
        }
    }
}

impl ServerConfig {
    pub fn scheduler_tick_duration(&self) -> Duration {
        Duration::from_secs(self.scheduler_tick_duration_secs)
    }

    pub fn agent_stale_threshold(&self) -> Duration {
        Duration::from_secs(self.agent_stale_threshold_secs)
    }
}
