use serde::{Deserialize, Serialize};

use crate::ids::IdHasher;

/// Monotone ordinal: an update is only accepted if `new as u8 > old as u8`.
/// `pending → finished` (skipping `running`) is a valid forward transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    Pending = 0,
    Running = 1,
    Finished = 2,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Unknown,
    Success,
    Failure,
}

impl Default for Outcome {
    fn default() -> Self {
        Outcome::Unknown
    }
}

/// One execution attempt of an Action, driven through the status state
/// machine `pending -> running -> finished` (or directly `pending ->
/// finished`). `id` is keyed by `(action_id, attempt)`, so retries get a
/// fresh row rather than overwriting the prior attempt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionInstance {
    pub id: String,
    pub action_id: String,
    pub attempt: u32,
    pub status: Status,
    pub outcome: Outcome,
    pub outcome_reason: String,
    pub created_at: u64,
    pub updated_at: u64,
    pub finished_at: u64,
}

impl ActionInstance {
    pub fn new(action_id: impl Into<String>, attempt: u32, now: u64) -> Self {
        let action_id = action_id.into();
        let id = Self::derive_id(&action_id, attempt);
        Self {
            id,
            action_id,
            attempt,
            status: Status::Pending,
            outcome: Outcome::Unknown,
            outcome_reason: String::new(),
            created_at: now,
            updated_at: now,
            finished_at: 0,
        }
    }

    pub fn derive_id(action_id: &str, attempt: u32) -> String {
        IdHasher::new()
            .feed_str(action_id)
            .feed_u64(attempt as u64)
            .finish()
    }

    /// Applies a status update in place if and only if it advances the
    /// ordinal. Returns `false` (and leaves `self` untouched) on a
    /// stale/equal-or-regressive update, matching the `updated=false`
    /// contract for stale-update.
    pub fn apply_update(
        &mut self,
        new_status: Status,
        outcome: Outcome,
        outcome_reason: impl Into<String>,
        now: u64,
    ) -> bool {
        if new_status <= self.status {
            return false;
        }
        self.status = new_status;
        self.outcome = outcome;
        self.outcome_reason = outcome_reason.into();
        self.updated_at = now;
        if new_status == Status::Finished {
            self.finished_at = now;
        }
        true
    }
}
