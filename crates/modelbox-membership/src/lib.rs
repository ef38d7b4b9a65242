//! `ClusterMembership` drivers: a fixed roster (`static_membership`) and a
//! SQL-lease heartbeat table (`sql`), mirroring
//! `server/membership/{static,sql}.go`.

pub mod sql;
pub mod static_membership;

pub use static_membership::StaticMembership;

#[cfg(feature = "postgres")]
pub use sql::PgClusterMembership;
#[cfg(feature = "mysql")]
pub use sql::MysqlClusterMembership;
#[cfg(feature = "sqlite")]
pub use sql::SqliteClusterMembership;
