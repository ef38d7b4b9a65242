use serde::{Deserialize, Serialize};

use crate::ids::IdHasher;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileType {
    Checkpoint,
    Model,
    Text,
    Image,
    Audio,
    Video,
}

/// Artifact metadata for an uploaded blob. `id` is content-addressed over
/// `(parent_id, type, checksum)`: two uploads that land on the same tuple
/// collapse onto the same row, which is how the upload path implements
/// idempotent duplicate-file detection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct File {
    pub id: String,
    pub parent_id: String,
    pub file_type: FileType,
    pub path: String,
    pub checksum: String,
    pub created_at: u64,
    pub updated_at: u64,
}

impl File {
    pub fn new(
        parent_id: impl Into<String>,
        file_type: FileType,
        checksum: impl Into<String>,
        path: impl Into<String>,
        now: u64,
    ) -> Self {
        let parent_id = parent_id.into();
        let checksum = checksum.into();
        let id = Self::derive_id(&parent_id, file_type, &checksum);
        Self {
            id,
            parent_id,
            file_type,
            path: path.into(),
            checksum,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn derive_id(parent_id: &str, file_type: FileType, checksum: &str) -> String {
        let type_tag = match file_type {
            FileType::Checkpoint => "checkpoint",
            FileType::Model => "model",
            FileType::Text => "text",
            FileType::Image => "image",
            FileType::Audio => "audio",
            FileType::Video => "video",
        };
        IdHasher::new()
            .feed_str(parent_id)
            .feed_str(type_tag)
            .feed_str(checksum)
            .finish()
    }
}
