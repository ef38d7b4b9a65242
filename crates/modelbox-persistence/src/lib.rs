//! SQL and embedded-KV `MetadataStore` implementations.
//!
//! Modules:
//! - `schema` / `rows`: hand-written Diesel schema and the row structs
//!   that convert to and from `modelbox-domain` types.
//! - `query_registry`: the three dialect quirks (duplicate-key detection,
//!   metadata upsert syntax, bind style) a SQL backend needs to vary.
//! - `sql_store`: the shared `MetadataStore` body, generated once per
//!   concrete Diesel connection type by `backends::{postgres,mysql,sqlite}`.
//! - `embedded`: a `sled`-backed `MetadataStore` for the single-replica /
//!   no-external-database deployment.
//! - `migrations` / `config`: schema bootstrap and `DATABASE_URL` loading.

pub mod backends;
pub mod config;
pub mod embedded;
pub mod error;
pub mod migrations;
pub mod query_registry;
pub mod rows;
pub mod schema;
pub mod sql_store;

pub use config::{build_pool, init_dotenv, DbConfig};
pub use embedded::EmbeddedKvMetadataStore;
pub use error::PersistenceError;
