//! The three dialect quirks a SQL backend needs to vary: duplicate-key
//! recognition, metadata upsert syntax, and bind-parameter style. Every
//! other operation is identical Diesel query-builder code shared across
//! backends; only these three are backend-specific enough to warrant a
//! registry.

use diesel::result::{DatabaseErrorKind, Error as DieselError};

pub trait QueryRegistry: Send + Sync {
    /// True if `err` represents a unique-index collision (an idempotent
    /// create observing a row that already exists).
    fn is_duplicate(&self, err: &DieselError) -> bool {
        matches!(
            err,
            DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _)
        )
    }

    /// Raw upsert SQL for a single metadata row, in this dialect's
    /// conflict-resolution syntax. Bound positionally in `(id, parent_id,
    /// key, value)` order.
    fn upsert_metadata_sql(&self) -> &'static str;

    /// Human-readable dialect name, surfaced by `MetadataStore::backend`.
    fn dialect(&self) -> &'static str;
}

#[derive(Debug, Clone, Default)]
pub struct PostgresRegistry;

impl QueryRegistry for PostgresRegistry {
    fn upsert_metadata_sql(&self) -> &'static str {
        "INSERT INTO metadata (id, parent_id, key, value) VALUES ($1, $2, $3, $4) \
         ON CONFLICT (id) DO UPDATE SET value = EXCLUDED.value"
    }

    fn dialect(&self) -> &'static str {
        "postgres"
    }
}

#[derive(Debug, Clone, Default)]
pub struct MysqlRegistry;

impl QueryRegistry for MysqlRegistry {
    fn upsert_metadata_sql(&self) -> &'static str {
        "INSERT INTO metadata (id, parent_id, key, value) VALUES (?, ?, ?, ?) \
         ON DUPLICATE KEY UPDATE value = VALUES(value)"
    }

    fn dialect(&self) -> &'static str {
        "mysql"
    }
}

#[derive(Debug, Clone, Default)]
pub struct SqliteRegistry;

impl QueryRegistry for SqliteRegistry {
    fn upsert_metadata_sql(&self) -> &'static str {
        "INSERT INTO metadata (id, parent_id, key, value) VALUES (?1, ?2, ?3, ?4) \
         ON CONFLICT (id) DO UPDATE SET value = excluded.value"
    }

    fn dialect(&self) -> &'static str {
        "sqlite3"
    }
}
