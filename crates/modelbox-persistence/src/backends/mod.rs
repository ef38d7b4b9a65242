//! One module per SQL backend, each a thin instantiation of
//! `sql_store::impl_sql_metadata_store!` over its concrete Diesel
//! connection type.

#[cfg(feature = "postgres")]
pub mod postgres;
#[cfg(feature = "mysql")]
pub mod mysql;
#[cfg(feature = "sqlite")]
pub mod sqlite;

#[cfg(feature = "postgres")]
pub use postgres::PgMetadataStore;
#[cfg(feature = "mysql")]
pub use mysql::MysqlMetadataStore;
#[cfg(feature = "sqlite")]
pub use sqlite::SqliteMetadataStore;
