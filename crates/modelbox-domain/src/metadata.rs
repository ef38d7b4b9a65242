//! Dynamic metadata values and the metadata row that attaches them to a
//! parent entity.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::ids::IdHasher;

/// A metadata value is a tagged variant rather than a fixed column type,
/// mirroring the protocol runtime's own structured-value type instead of
/// inventing an ad-hoc schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum MetadataValue {
    Null,
    Bool(bool),
    Number(f64),
    Str(String),
    List(Vec<MetadataValue>),
    Struct(BTreeMap<String, MetadataValue>),
}

impl MetadataValue {
    pub fn as_json(&self) -> serde_json::Value {
        serde_json::to_value(self).expect("MetadataValue always serializes")
    }

    pub fn from_json(v: serde_json::Value) -> serde_json::Result<Self> {
        serde_json::from_value(v)
    }
}

/// One key/value row attached to a parent entity. Many rows share a
/// `parent_id`; `id` is content-addressed by `(parent_id, key)` so repeated
/// `UpdateMetadata` calls upsert in place rather than accumulating rows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetadataRow {
    pub id: String,
    pub parent_id: String,
    pub key: String,
    pub value: MetadataValue,
}

impl MetadataRow {
    pub fn new(parent_id: impl Into<String>, key: impl Into<String>, value: MetadataValue) -> Self {
        let parent_id = parent_id.into();
        let key = key.into();
        let id = IdHasher::new()
            .feed_str(&parent_id)
            .feed_str(&key)
            .finish();
        Self {
            id,
            parent_id,
            key,
            value,
        }
    }
}

pub type MetadataMap = BTreeMap<String, MetadataValue>;
