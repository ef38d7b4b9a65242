use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::ids::IdHasher;

/// A snapshot produced during training, parented by an Experiment and keyed
/// by epoch. Metrics are append-only once attached.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Checkpoint {
    pub id: String,
    pub experiment_id: String,
    pub epoch: u64,
    pub metrics: BTreeMap<String, f32>,
    pub created_at: u64,
    pub updated_at: u64,
}

impl Checkpoint {
    pub fn new(
        experiment_id: impl Into<String>,
        epoch: u64,
        metrics: BTreeMap<String, f32>,
        now: u64,
    ) -> Self {
        let experiment_id = experiment_id.into();
        let id = Self::derive_id(&experiment_id, epoch);
        Self {
            id,
            experiment_id,
            epoch,
            metrics,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn derive_id(experiment_id: &str, epoch: u64) -> String {
        IdHasher::new()
            .feed_str(experiment_id)
            .feed_u64(epoch)
            .finish()
    }
}
