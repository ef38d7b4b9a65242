//! Translates a loaded `ServerConfig` into the concrete backend the agent
//! runs against, one capability trait at a time. Grounded in
//! `server/storage/storage.go`'s `NewMetadataStorage`,
//! `server/storage/artifacts/artifacts.go`'s `NewBlobStorageBuilder`, and
//! `server/membership/membership.go`'s `NewClusterMembership` — each a
//! small `switch` on a config-driven backend kind, returning an interface.

use std::sync::Arc;

use modelbox_core::config::{ArtifactStorageKind, ClusterMembershipKind, MetadataStorageKind, MetricsStorageKind};
use modelbox_core::{BlobStore, ClusterMembership, MetadataStore, MetricsLogger, TriggerEvaluator};
use modelbox_domain::ClusterMember;
use modelbox_persistence::{build_pool, DbConfig};

/// A `database.url`-shaped string built straight from `SqlBackendConfig`,
/// since the persistence layer's pool builder (like its teacher) takes a
/// single DSN rather than discrete host/port/user fields.
fn dsn(cfg: &modelbox_core::config::SqlBackendConfig, driver: &str) -> String {
    format!(
        "{driver}://{}:{}@{}:{}/{}",
        cfg.user, cfg.password, cfg.host, cfg.port, cfg.database
    )
}

pub fn build_metadata_store(config: &modelbox_core::ServerConfig) -> anyhow::Result<Arc<dyn MetadataStore>> {
    match config.metadata_storage {
        MetadataStorageKind::Ephemeral => {
            let dir = std::env::temp_dir().join("modelbox-ephemeral").join(format!(
                "{}",
                modelbox_core::now_epoch()
            ));
            let store = modelbox_persistence::EmbeddedKvMetadataStore::open(dir.join("modelbox.sled"))?;
            Ok(Arc::new(store))
        }
        #[cfg(feature = "postgres")]
        MetadataStorageKind::Postgres => {
            let cfg = config
                .postgres
                .as_ref()
                .ok_or_else(|| anyhow::anyhow!("metadata_storage=postgres requires a [postgres] config section"))?;
            let db = DbConfig {
                url: dsn(cfg, "postgres"),
                min_connections: 2,
                max_connections: 16,
            };
            let pool = build_pool::<diesel::pg::PgConnection>(&db)?;
            Ok(Arc::new(modelbox_persistence::backends::PgMetadataStore::new(pool)))
        }
        #[cfg(not(feature = "postgres"))]
        MetadataStorageKind::Postgres => {
            anyhow::bail!("this build was compiled without the postgres feature")
        }
        #[cfg(feature = "mysql")]
        MetadataStorageKind::Mysql => {
            let cfg = config
                .mysql
                .as_ref()
                .ok_or_else(|| anyhow::anyhow!("metadata_storage=mysql requires a [mysql] config section"))?;
            let db = DbConfig {
                url: dsn(cfg, "mysql"),
                min_connections: 2,
                max_connections: 16,
            };
            let pool = build_pool::<diesel::mysql::MysqlConnection>(&db)?;
            Ok(Arc::new(modelbox_persistence::backends::MysqlMetadataStore::new(pool)))
        }
        #[cfg(not(feature = "mysql"))]
        MetadataStorageKind::Mysql => {
            anyhow::bail!("this build was compiled without the mysql feature")
        }
        #[cfg(feature = "sqlite")]
        MetadataStorageKind::Sqlite3 => {
            let cfg = config
                .sqlite3
                .as_ref()
                .ok_or_else(|| anyhow::anyhow!("metadata_storage=sqlite3 requires a [sqlite3] config section"))?;
            let db = DbConfig {
                url: cfg.database.clone(),
                min_connections: 1,
                max_connections: 4,
            };
            let pool = build_pool::<diesel::sqlite::SqliteConnection>(&db)?;
            Ok(Arc::new(modelbox_persistence::backends::SqliteMetadataStore::new(pool)))
        }
        #[cfg(not(feature = "sqlite"))]
        MetadataStorageKind::Sqlite3 => {
            anyhow::bail!("this build was compiled without the sqlite feature")
        }
    }
}

/// Issues the backend's schema bootstrap (`create_schema` in
/// `MetadataStore`), used by `modelbox server create-schema` and by
/// `server start` against the ephemeral/sqlite backends where there is no
/// separate migration step to run by hand first.
pub async fn create_schema(store: &Arc<dyn MetadataStore>) -> anyhow::Result<()> {
    store.create_schema().await?;
    Ok(())
}

pub async fn build_blob_store(config: &modelbox_core::ServerConfig) -> anyhow::Result<Arc<dyn BlobStore>> {
    match config.artifact_storage {
        ArtifactStorageKind::Filesystem => {
            let cfg = config.filesystem.clone().unwrap_or_default();
            let base_dir = if cfg.base_dir.is_empty() { "./data/blobs".to_string() } else { cfg.base_dir };
            let store = modelbox_blobstore::LocalFsBlobStore::new(base_dir).await?;
            Ok(Arc::new(store))
        }
        ArtifactStorageKind::S3 => {
            let cfg = config
                .s3
                .as_ref()
                .ok_or_else(|| anyhow::anyhow!("artifact_storage=s3 requires an [s3] config section"))?;
            let store = modelbox_blobstore::S3BlobStore::new(cfg.bucket.clone(), cfg.region.clone(), cfg.endpoint.clone()).await;
            Ok(Arc::new(store))
        }
    }
}

pub fn build_membership(
    config: &modelbox_core::ServerConfig,
    self_member: ClusterMember,
) -> anyhow::Result<Arc<dyn ClusterMembership>> {
    match config.cluster_membership {
        ClusterMembershipKind::Static => Ok(Arc::new(modelbox_membership::StaticMembership::new(vec![self_member]))),
        #[cfg(feature = "mysql")]
        ClusterMembershipKind::Mysql => {
            let cfg = config
                .mysql
                .as_ref()
                .ok_or_else(|| anyhow::anyhow!("cluster_membership=mysql requires a [mysql] config section"))?;
            let db = DbConfig {
                url: dsn(cfg, "mysql"),
                min_connections: 1,
                max_connections: 4,
            };
            let pool = build_pool::<diesel::mysql::MysqlConnection>(&db)?;
            let membership = modelbox_membership::MysqlClusterMembership::new(
                pool,
                self_member,
                std::time::Duration::from_secs(config.sql_cluster_membership.lease_interval_secs),
                std::time::Duration::from_secs(config.sql_cluster_membership.stale_heartbeat_duration_secs),
            );
            Ok(Arc::new(membership))
        }
        #[cfg(not(feature = "mysql"))]
        ClusterMembershipKind::Mysql => {
            anyhow::bail!("this build was compiled without the mysql feature")
        }
    }
}

pub async fn build_metrics_logger(config: &modelbox_core::ServerConfig) -> anyhow::Result<Arc<dyn MetricsLogger>> {
    match config.metrics_storage {
        MetricsStorageKind::Inmemory => Ok(Arc::new(modelbox_metrics::InMemoryMetricsLogger::new())),
        #[cfg(feature = "timescaledb")]
        MetricsStorageKind::Timescaledb => {
            // TimescaleDB is wire-compatible Postgres; it reuses the
            // metadata backend's [postgres] DSN rather than a dedicated
            // config section (see DESIGN.md).
            let cfg = config
                .postgres
                .as_ref()
                .ok_or_else(|| anyhow::anyhow!("metrics_storage=timescaledb requires a [postgres] config section"))?;
            let conninfo = format!(
                "host={} port={} user={} password={} dbname={}",
                cfg.host, cfg.port, cfg.user, cfg.password, cfg.database
            );
            let logger = modelbox_metrics::TimescaleDbMetricsLogger::connect(&conninfo).await?;
            Ok(Arc::new(logger))
        }
        #[cfg(not(feature = "timescaledb"))]
        MetricsStorageKind::Timescaledb => {
            anyhow::bail!("this build was compiled without the timescaledb feature")
        }
    }
}

pub fn build_trigger_evaluator() -> Arc<dyn TriggerEvaluator> {
    Arc::new(modelbox_triggers::RhaiTriggerEvaluator::new())
}

#[cfg(test)]
mod tests {
    use super::*;
    use modelbox_core::ServerConfig;

    fn ephemeral_config() -> ServerConfig {
        ServerConfig::default()
    }

    #[test]
    fn ephemeral_metadata_storage_needs_no_config_section() {
        let config = ephemeral_config();
        let store = build_metadata_store(&config).unwrap();
        drop(store);
    }

    #[tokio::test]
    async fn default_config_builds_a_filesystem_blob_store_under_its_base_dir() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = ephemeral_config();
        config.filesystem = Some(modelbox_core::config::FilesystemArtifactConfig {
            base_dir: dir.path().join("blobs").to_string_lossy().into_owned(),
        });
        build_blob_store(&config).await.unwrap();
    }

    #[cfg(feature = "postgres")]
    #[test]
    fn postgres_metadata_storage_without_a_config_section_is_rejected() {
        let mut config = ephemeral_config();
        config.metadata_storage = MetadataStorageKind::Postgres;
        config.postgres = None;
        let err = build_metadata_store(&config).unwrap_err();
        assert!(err.to_string().contains("[postgres]"));
    }

    #[tokio::test]
    async fn static_membership_is_seeded_with_exactly_the_local_member() {
        let config = ephemeral_config();
        let member = ClusterMember::new("host-a", "10.0.0.1:8085", "10.0.0.1:8086", 0);
        let membership = build_membership(&config, member.clone()).unwrap();
        let members = membership.get_members().await.unwrap();
        assert_eq!(members.len(), 1);
        assert_eq!(members[0].hostname, member.hostname);
    }
}
