//! MySQL `MetadataStore`, instantiating the shared macro body over
//! `MysqlConnection` and the literal `schema_ver_1.sql` bootstrap.

use diesel::mysql::MysqlConnection;

use crate::query_registry::MysqlRegistry;
use crate::sql_store::impl_sql_metadata_store;

impl_sql_metadata_store!(
    MysqlMetadataStore,
    MysqlConnection,
    MysqlRegistry,
    crate::migrations::create_mysql_schema
);
