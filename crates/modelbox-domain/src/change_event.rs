use serde::{Deserialize, Serialize};

/// Kinds of row written to the append-only mutation log. Scheduler
/// dispatch and the RPC `WatchNamespace` feed both switch on this.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    ExperimentCreated,
    ModelCreated,
    ModelVersionCreated,
    ActionCreated,
    ActionInstanceCreated,
    ActionInstancePending,
    ActionInstanceRunning,
    ActionInstanceSuccess,
    ActionInstanceFailure,
}

impl EventType {
    /// Whether this event type is one the scheduler evaluates triggers
    /// against (as opposed to action-instance lifecycle bookkeeping).
    pub fn is_trigger_source(self) -> bool {
        matches!(
            self,
            EventType::ExperimentCreated | EventType::ModelCreated | EventType::ModelVersionCreated
        )
    }

    /// Maps an accepted `ActionInstance` status transition to the
    /// `ChangeEvent` subtype it must write. `Finished` splits on outcome;
    /// an `Unknown` outcome at `Finished` is treated as failure, since a
    /// terminal instance with no recorded outcome is not a success.
    pub fn for_action_instance_transition(
        status: crate::action_instance::Status,
        outcome: crate::action_instance::Outcome,
    ) -> Self {
        use crate::action_instance::{Outcome, Status};
        match status {
            Status::Pending => EventType::ActionInstancePending,
            Status::Running => EventType::ActionInstanceRunning,
            Status::Finished => match outcome {
                Outcome::Success => EventType::ActionInstanceSuccess,
                Outcome::Failure | Outcome::Unknown => EventType::ActionInstanceFailure,
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObjectType {
    Model,
    ModelVersion,
    Experiment,
    Action,
    ActionInstance,
}

/// A row in the append-only mutation log. `mutation_id` is assigned by the
/// backend at insert time and is monotonic across the whole store, not
/// per-namespace; `processed_at = 0` means the scheduler has not consumed
/// this row yet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangeEvent {
    pub mutation_id: u64,
    pub mutation_time: u64,
    pub event_type: EventType,
    pub object_id: String,
    pub object_type: ObjectType,
    pub parent_id: String,
    pub namespace: String,
    pub processed_at: u64,
    pub payload: Option<serde_json::Value>,
}

impl ChangeEvent {
    /// Builds the unpersisted shape of a change-event row; the backend
    /// assigns `mutation_id` and `mutation_time` at insert time.
    pub fn draft(
        event_type: EventType,
        object_id: impl Into<String>,
        object_type: ObjectType,
        parent_id: impl Into<String>,
        namespace: impl Into<String>,
        payload: Option<serde_json::Value>,
    ) -> Self {
        Self {
            mutation_id: 0,
            mutation_time: 0,
            event_type,
            object_id: object_id.into(),
            object_type,
            parent_id: parent_id.into(),
            namespace: namespace.into(),
            processed_at: 0,
            payload,
        }
    }

    pub fn is_unprocessed(&self) -> bool {
        self.processed_at == 0
    }
}
