use serde::{Deserialize, Serialize};

use crate::ids::IdHasher;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Framework {
    Unknown,
    Pytorch,
    Keras,
}

impl Default for Framework {
    fn default() -> Self {
        Framework::Unknown
    }
}

/// A named training run under a namespace. Identity is `(name, namespace)`:
/// creating the same pair twice is a no-op that returns the existing id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Experiment {
    pub id: String,
    pub name: String,
    pub owner: String,
    pub namespace: String,
    pub external_id: String,
    pub framework: Framework,
    pub created_at: u64,
    pub updated_at: u64,
}

impl Experiment {
    pub fn new(
        name: impl Into<String>,
        owner: impl Into<String>,
        namespace: impl Into<String>,
        external_id: impl Into<String>,
        framework: Framework,
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
            external_id: external_id.into(),
            framework,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn derive_id(name: &str, namespace: &str) -> String {
        IdHasher::new().feed_str(name).feed_str(namespace).finish()
    }
}
