//! Connection configuration loaded from environment variables, following
//! the `DATABASE_URL` convention plus optional pool sizing.

use diesel::r2d2::{ConnectionManager, Pool};
use diesel::Connection;
use dotenvy::dotenv;
use once_cell::sync::Lazy;
use std::env;

use crate::error::PersistenceError;

static DOTENV_LOADED: Lazy<()> = Lazy::new(|| {
    let _ = dotenv();
});

pub fn init_dotenv() {
    Lazy::force(&DOTENV_LOADED);
}

#[derive(Debug, Clone)]
pub struct DbConfig {
    pub url: String,
    pub min_connections: u32,
    pub max_connections: u32,
}

impl DbConfig {
    pub fn from_env(url_var: &str) -> Self {
        init_dotenv();
        let url = env::var(url_var).unwrap_or_else(|_| panic!("{url_var} not set"));
        let min_connections = env::var("DATABASE_MIN_CONNECTIONS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(2);
        let max_connections = env::var("DATABASE_MAX_CONNECTIONS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(16);
        Self { url, min_connections, max_connections }
    }
}

/// Builds a pooled connection for any Diesel backend from a `DbConfig`.
/// Shared by the CLI's `server start`/`create-schema` wiring across all
/// three SQL dialects; the connection type is the only thing that varies.
pub fn build_pool<C>(cfg: &DbConfig) -> Result<Pool<ConnectionManager<C>>, PersistenceError>
where
    C: Connection + 'static,
{
    let manager = ConnectionManager::<C>::new(&cfg.url);
    Pool::builder()
        .min_idle(Some(cfg.min_connections))
        .max_size(cfg.max_connections)
        .build(manager)
        .map_err(|e| PersistenceError::TransientIo(format!("pool build error: {e}")))
}
