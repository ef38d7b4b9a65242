//! SQL-lease `ClusterMembership`: a heartbeat loop renews this process's
//! row in `cluster_members` on an interval, and `get_members` returns
//! every row whose heartbeat is within the staleness window. Grounded in
//! `server/membership/sql.go`'s `SQLMembership` (`heartBeat`/`renewOnce`
//! loop gated by a stop channel, `Join` starts it, `Leave` closes it) and
//! its per-dialect `queryRegistry.renewHeartbeat()` upsert.
//!
//! The teacher's Go version runs one connection per process and issues a
//! named-parameter upsert through `sqlx`; here the upsert is a raw
//! `diesel::sql_query` (Diesel has no single portable upsert DSL across
//! Postgres/MySQL/SQLite) while `get_members` uses the ordinary typed
//! query DSL, since a plain `WHERE heartbeat_time >= ?` has no dialect
//! variance.

use std::time::Duration;

use diesel::prelude::*;

use modelbox_core::error::{ModelBoxError, ModelBoxResult};
use modelbox_core::{now_epoch, ClusterMembership};
use modelbox_domain::ClusterMember;
use modelbox_persistence::rows::ClusterMemberRow;
use modelbox_persistence::schema::cluster_members::dsl as cm;

macro_rules! impl_sql_cluster_membership {
    ($store:ident, $conn:ty, $upsert_sql:expr) => {
        pub struct $store {
            pool: diesel::r2d2::Pool<diesel::r2d2::ConnectionManager<$conn>>,
            member: ClusterMember,
            heartbeat_interval: Duration,
            stale_duration: Duration,
            stop: tokio::sync::Mutex<Option<tokio::sync::oneshot::Sender<()>>>,
        }

        impl $store {
            pub fn new(
                pool: diesel::r2d2::Pool<diesel::r2d2::ConnectionManager<$conn>>,
                member: ClusterMember,
                heartbeat_interval: Duration,
                stale_duration: Duration,
            ) -> Self {
                Self {
                    pool,
                    member,
                    heartbeat_interval,
                    stale_duration,
                    stop: tokio::sync::Mutex::new(None),
                }
            }

            async fn renew_once(
                pool: &diesel::r2d2::Pool<diesel::r2d2::ConnectionManager<$conn>>,
                member: &ClusterMember,
                now: u64,
            ) -> ModelBoxResult<()> {
                let pool = pool.clone();
                let member = member.clone();
                tokio::task::spawn_blocking(move || -> Result<(), diesel::result::Error> {
                    let mut conn = pool.get().map_err(|e| {
                        diesel::result::Error::QueryBuilderError(format!("pool checkout: {e}").into())
                    })?;
                    diesel::sql_query($upsert_sql)
                        .bind::<diesel::sql_types::Text, _>(member.id.clone())
                        .bind::<diesel::sql_types::Text, _>(member.hostname.clone())
                        .bind::<diesel::sql_types::Text, _>(member.rpc_addr.clone())
                        .bind::<diesel::sql_types::Text, _>(member.http_addr.clone())
                        .bind::<diesel::sql_types::BigInt, _>(now as i64)
                        .execute(&mut conn)?;
                    Ok(())
                })
                .await
                .map_err(|e| ModelBoxError::StorageUnavailable(format!("renew heartbeat task panicked: {e}")))?
                .map_err(|e| ModelBoxError::StorageUnavailable(format!("unable to renew heartbeat: {e}")))
            }
        }

        #[async_trait::async_trait]
        impl ClusterMembership for $store {
            async fn join(&self) -> ModelBoxResult<()> {
                let (tx, mut rx) = tokio::sync::oneshot::channel();
                *self.stop.lock().await = Some(tx);

                let pool = self.pool.clone();
                let member = self.member.clone();
                let interval = self.heartbeat_interval;
                log::info!("starting cluster membership. heartbeat frequency: {interval:?}");

                tokio::spawn(async move {
                    let mut ticker = tokio::time::interval(interval);
                    ticker.tick().await; // first tick fires immediately; skip it, mirroring time.After
                    loop {
                        tokio::select! {
                            _ = &mut rx => {
                                log::info!("stopping to renew leases");
                                return;
                            }
                            _ = ticker.tick() => {
                                if let Err(e) = $store::renew_once(&pool, &member, now_epoch()).await {
                                    log::error!("unable to renew heartbeat: {e}");
                                }
                            }
                        }
                    }
                });
                Ok(())
            }

            async fn leave(&self) -> ModelBoxResult<()> {
                if let Some(tx) = self.stop.lock().await.take() {
                    let _ = tx.send(());
                }
                Ok(())
            }

            async fn get_members(&self) -> ModelBoxResult<Vec<ClusterMember>> {
                let pool = self.pool.clone();
                let threshold = now_epoch().saturating_sub(self.stale_duration.as_secs()) as i64;
                tokio::task::spawn_blocking(move || -> Result<Vec<ClusterMemberRow>, diesel::result::Error> {
                    let mut conn = pool.get().map_err(|e| {
                        diesel::result::Error::QueryBuilderError(format!("pool checkout: {e}").into())
                    })?;
                    cm::cluster_members
                        .filter(cm::heartbeat_time.ge(threshold))
                        .load::<ClusterMemberRow>(&mut conn)
                })
                .await
                .map_err(|e| ModelBoxError::StorageUnavailable(format!("get_members task panicked: {e}")))?
                .map_err(|e| ModelBoxError::StorageUnavailable(format!("unable to list cluster members: {e}")))
                .map(|rows| rows.into_iter().map(ClusterMember::from).collect())
            }
        }
    };
}

#[cfg(feature = "postgres")]
impl_sql_cluster_membership!(
    PgClusterMembership,
    diesel::pg::PgConnection,
    "INSERT INTO cluster_members (id, hostname, rpc_addr, http_addr, heartbeat_time) \
     VALUES ($1, $2, $3, $4, $5) \
     ON CONFLICT (id) DO UPDATE SET heartbeat_time = excluded.heartbeat_time"
);

#[cfg(feature = "mysql")]
impl_sql_cluster_membership!(
    MysqlClusterMembership,
    diesel::mysql::MysqlConnection,
    "INSERT INTO cluster_members (id, hostname, rpc_addr, http_addr, heartbeat_time) \
     VALUES (?, ?, ?, ?, ?) \
     ON DUPLICATE KEY UPDATE heartbeat_time = VALUES(heartbeat_time)"
);

#[cfg(feature = "sqlite")]
impl_sql_cluster_membership!(
    SqliteClusterMembership,
    diesel::sqlite::SqliteConnection,
    "INSERT INTO cluster_members (id, hostname, rpc_addr, http_addr, heartbeat_time) \
     VALUES (?1, ?2, ?3, ?4, ?5) \
     ON CONFLICT (id) DO UPDATE SET heartbeat_time = excluded.heartbeat_time"
);
