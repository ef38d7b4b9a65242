use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::ids::IdHasher;
use crate::metadata::MetadataValue;
use crate::trigger::Trigger;

/// A user-defined unit of work triggered by an artifact mutation. Identity
/// folds in `trigger.payload` and `params`, so two actions with the same
/// name/parent/arch but a different script or parameter set are distinct.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Action {
    pub id: String,
    pub parent_id: String,
    pub name: String,
    pub arch: String,
    pub trigger: Trigger,
    pub params: BTreeMap<String, MetadataValue>,
    pub created_at: u64,
    pub updated_at: u64,
    pub finished_at: u64,
}

impl Action {
    pub fn new(
        name: impl Into<String>,
        parent_id: impl Into<String>,
        arch: impl Into<String>,
        trigger: Trigger,
        params: BTreeMap<String, MetadataValue>,
        now: u64,
    ) -> Self {
        let name = name.into();
        let parent_id = parent_id.into();
        let arch = arch.into();
        let id = Self::derive_id(&name, &parent_id, &arch, &trigger.payload, &params);
        Self {
            id,
            parent_id,
            name,
            arch,
            trigger,
            params,
            created_at: now,
            updated_at: now,
            finished_at: 0,
        }
    }

    pub fn derive_id(
        name: &str,
        parent_id: &str,
        arch: &str,
        trigger_payload: &str,
        params: &BTreeMap<String, MetadataValue>,
    ) -> String {
        let params_json = serde_json::to_value(params).expect("params always serialize");
        IdHasher::new()
            .feed_str(name)
            .feed_str(parent_id)
            .feed_str(arch)
            .feed_str(trigger_payload)
            .feed_json(&params_json)
            .finish()
    }
}
