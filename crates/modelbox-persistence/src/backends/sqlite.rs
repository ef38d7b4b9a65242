//! SQLite `MetadataStore`, instantiating the shared macro body over
//! `SqliteConnection` and the literal `schema_ver_1.sql` bootstrap. The
//! default deployment for a single-replica / embedded setup (see
//! `EmbeddedKvMetadataStore` in `embedded` for the non-SQL alternative).

use diesel::sqlite::SqliteConnection;

use crate::query_registry::SqliteRegistry;
use crate::sql_store::impl_sql_metadata_store;

impl_sql_metadata_store!(
    SqliteMetadataStore,
    SqliteConnection,
    SqliteRegistry,
    crate::migrations::create_sqlite_schema
);
