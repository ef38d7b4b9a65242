use serde::{Deserialize, Serialize};

use crate::ids::IdHasher;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelVersion {
    pub id: String,
    pub name: String,
    pub model_id: String,
    pub version: String,
    pub description: String,
    pub framework: String,
    pub unique_tags: Vec<String>,
    pub created_at: u64,
    pub updated_at: u64,
}

impl ModelVersion {
    pub fn new(
        name: impl Into<String>,
        model_id: impl Into<String>,
        version: impl Into<String>,
        description: impl Into<String>,
        framework: impl Into<String>,
        unique_tags: Vec<String>,
        now: u64,
    ) -> Self {
        let name = name.into();
        let model_id = model_id.into();
        let version = version.into();
        let id = Self::derive_id(&model_id, &version, &name);
        Self {
            id,
            name,
            model_id,
            version,
            description: description.into(),
            framework: framework.into(),
            unique_tags,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn derive_id(model_id: &str, version: &str, name: &str) -> String {
        IdHasher::new()
            .feed_str(model_id)
            .feed_str(version)
            .feed_str(name)
            .finish()
    }
}
