//! Schema bootstrap. The Postgres backend uses `diesel_migrations`'
//! embedded migration format (matching how this workspace's other
//! Postgres-backed crate does it); MySQL and SQLite apply the literal
//! `schema_ver_N.sql` files named by the persisted-state contract via
//! `batch_execute`, since neither driver here carries a diesel migrations
//! feature.

use diesel::connection::SimpleConnection;
use diesel::pg::PgConnection;
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};

use crate::error::PersistenceError;

pub const PG_MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations/postgres");

pub fn run_pending_pg_migrations(conn: &mut PgConnection) -> Result<(), PersistenceError> {
    conn.run_pending_migrations(PG_MIGRATIONS)
        .map(|_| ())
        .map_err(|e| PersistenceError::Unknown(format!("migration error: {e}")))
}

pub const MYSQL_SCHEMA_VER_1: &str = include_str!("../migrations/mysql/schema_ver_1.sql");
pub const SQLITE_SCHEMA_VER_1: &str = include_str!("../migrations/sqlite3/schema_ver_1.sql");

/// Applies every `schema_ver_N.sql` in order. Each statement is written
/// `CREATE TABLE IF NOT EXISTS`, so re-running on an already-migrated
/// database is a no-op.
pub fn apply_schema_files(conn: &mut impl SimpleConnection, files: &[&str]) -> Result<(), PersistenceError> {
    for sql in files {
        conn.batch_execute(sql)
            .map_err(|e| PersistenceError::Unknown(format!("schema apply error: {e}")))?;
    }
    Ok(())
}

#[cfg(feature = "mysql")]
pub fn create_mysql_schema(conn: &mut diesel::mysql::MysqlConnection) -> Result<(), PersistenceError> {
    apply_schema_files(conn, &[MYSQL_SCHEMA_VER_1])
}

#[cfg(feature = "sqlite")]
pub fn create_sqlite_schema(conn: &mut diesel::sqlite::SqliteConnection) -> Result<(), PersistenceError> {
    apply_schema_files(conn, &[SQLITE_SCHEMA_VER_1])
}
