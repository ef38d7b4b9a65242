use serde::{Deserialize, Serialize};

use crate::ids::IdHasher;
use crate::metadata::MetadataMap;

/// A user-emitted timeline entry attached to a parent entity (distinct from
/// [`crate::change_event::ChangeEvent`], which is the system mutation log).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub id: String,
    pub parent_id: String,
    pub name: String,
    pub source: String,
    pub wallclock: u64,
    pub metadata: MetadataMap,
}

impl Event {
    pub fn new(
        parent_id: impl Into<String>,
        name: impl Into<String>,
        source: impl Into<String>,
        wallclock: u64,
        metadata: MetadataMap,
    ) -> Self {
        let parent_id = parent_id.into();
        let name = name.into();
        let source = source.into();
        let metadata_json = serde_json::to_value(&metadata).expect("metadata always serializes");
        let id = IdHasher::new()
            .feed_str(&parent_id)
            .feed_str(&name)
            .feed_str(&source)
            .feed_u64(wallclock)
            .feed_json(&metadata_json)
            .finish();
        Self {
            id,
            parent_id,
            name,
            source,
            wallclock,
            metadata,
        }
    }
}
