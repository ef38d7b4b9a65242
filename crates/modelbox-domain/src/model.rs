use serde::{Deserialize, Serialize};

use crate::ids::IdHasher;

/// A registry entry for a deployable artifact family. Versions are obtained
/// by indexed lookup on `model_id`, never held as a child collection here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Model {
    pub id: String,
    pub name: String,
    pub owner: String,
    pub namespace: String,
    pub task: String,
    pub description: String,
    pub created_at: u64,
    pub updated_at: u64,
}

impl Model {
    pub fn new(
        name: impl Into<String>,
        owner: impl Into<String>,
        namespace: impl Into<String>,
        task: impl Into<String>,
        description: impl Into<String>,
        now: u64,
    ) -> Self {
        let name = name.into();
        let namespace = namespace.into();
        let id = Self::derive_id(&name, &namespace);
        Self {
            id,
            name,
            owner: owner.into(),
            namespace,
            task: task.into(),
            description: description.into(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn derive_id(name: &str, namespace: &str) -> String {
        IdHasher::new().feed_str(name).feed_str(namespace).finish()
    }
}
