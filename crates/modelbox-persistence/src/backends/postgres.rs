//! Postgres `MetadataStore`, instantiating the shared macro body over
//! `PgConnection` and `diesel_migrations`' embedded-migration runner.

use diesel::pg::PgConnection;

use crate::query_registry::PostgresRegistry;
use crate::sql_store::impl_sql_metadata_store;

impl_sql_metadata_store!(
    PgMetadataStore,
    PgConnection,
    PostgresRegistry,
    crate::migrations::run_pending_pg_migrations
);
