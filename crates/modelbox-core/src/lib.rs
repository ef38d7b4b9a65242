//! modelbox-core: the backend-agnostic contracts and orchestration.
//!
//! - `traits`: capability interfaces (`MetadataStore`, `BlobStore`,
//!   `TriggerEvaluator`, `ClusterMembership`, `MetricsLogger`) implemented
//!   by concrete backend crates.
//! - `scheduler`: the action scheduler's tick loop.
//! - `error`: the shared `ModelBoxError` taxonomy.
//! - `config`: the server configuration shape.
//! - `constants`: default intervals and size thresholds.

pub mod config;
pub mod constants;
pub mod error;
pub mod scheduler;
pub mod traits;

pub use config::ServerConfig;
pub use error::{ModelBoxError, ModelBoxResult};
pub use scheduler::{Scheduler, TickReport};
pub use traits::{
    BlobReader, BlobStore, BlobWriter, ClusterMembership, CreateResult, MetadataStore, MetricPoint,
    MetricsLogger, TriggerEvaluator,
};

/// Current wallclock as epoch seconds, the unit every entity timestamp and
/// the mutation log use.
pub fn now_epoch() -> u64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("system clock before unix epoch")
        .as_secs()
}
