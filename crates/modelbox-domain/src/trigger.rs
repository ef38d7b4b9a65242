use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriggerType {
    Script,
}

/// A script attached to a parent (model/experiment) that maps a
/// [`crate::change_event::ChangeEvent`] to an action name. Evaluation lives
/// behind the `TriggerEvaluator` capability, not in this crate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trigger {
    pub payload: String,
    #[serde(rename = "type")]
    pub trigger_type: TriggerType,
}

impl Trigger {
    pub fn script(payload: impl Into<String>) -> Self {
        Self {
            payload: payload.into(),
            trigger_type: TriggerType::Script,
        }
    }
}
