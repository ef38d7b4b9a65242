//! A non-scripting `TriggerEvaluator` alternative: the trigger payload is
//! a small JSON document instead of a script, matched against the
//! change-event's `event_type`/`namespace`/`object_type` fields. Exists to
//! demonstrate that `rhai` is a drop-in strategy behind the capability, not
//! a hard dependency of the scheduler — `spec.md` calls this out explicitly
//! ("declarative expression, JSON-path ... are drop-in replacements").

use async_trait::async_trait;
use serde::Deserialize;

use modelbox_core::error::{ModelBoxError, ModelBoxResult};
use modelbox_core::TriggerEvaluator;
use modelbox_domain::change_event::{ChangeEvent, EventType, ObjectType};
use modelbox_domain::Trigger;

/// `{"rules": [{"event_type": "experiment_created", "namespace": "ns", "action": "export"}, ...], "default": "noop"}`
/// Rules are tried in order; the first whose present fields all match the
/// event wins. `default` is used when no rule matches, and is itself
/// mandatory when `rules` could plausibly miss — a trigger with no
/// matching rule and no default is a trigger-evaluation error.
#[derive(Debug, Deserialize)]
struct DeclarativePayload {
    #[serde(default)]
    rules: Vec<Rule>,
    default: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Rule {
    event_type: Option<EventType>,
    object_type: Option<ObjectType>,
    namespace: Option<String>,
    action: String,
}

impl Rule {
    fn matches(&self, event: &ChangeEvent) -> bool {
        self.event_type.map_or(true, |t| t == event.event_type)
            && self.object_type.map_or(true, |t| t == event.object_type)
            && self.namespace.as_deref().map_or(true, |ns| ns == event.namespace)
    }
}

pub struct DeclarativeTriggerEvaluator;

impl DeclarativeTriggerEvaluator {
    pub fn new() -> Self {
        Self
    }
}

impl Default for DeclarativeTriggerEvaluator {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TriggerEvaluator for DeclarativeTriggerEvaluator {
    async fn get_action(&self, event: &ChangeEvent, trigger: &Trigger) -> ModelBoxResult<String> {
        let payload: DeclarativePayload = serde_json::from_str(&trigger.payload)
            .map_err(|e| ModelBoxError::TriggerEvaluation(format!("invalid declarative trigger payload: {e}")))?;

        if let Some(rule) = payload.rules.iter().find(|r| r.matches(event)) {
            return Ok(rule.action.clone());
        }
        payload
            .default
            .ok_or_else(|| ModelBoxError::TriggerEvaluation("no rule matched and no default action".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use modelbox_domain::change_event::ObjectType;

    fn event(namespace: &str) -> ChangeEvent {
        ChangeEvent::draft(
            EventType::ModelCreated,
            "model-1",
            ObjectType::Model,
            "model-1",
            namespace,
            None,
        )
    }

    #[tokio::test]
    async fn first_matching_rule_wins() {
        let evaluator = DeclarativeTriggerEvaluator::new();
        let trigger = Trigger::script(
            r#"{"rules":[{"namespace":"prod","action":"export"},{"event_type":"model_created","action":"quantize"}]}"#,
        );
        let action = evaluator.get_action(&event("staging"), &trigger).await.unwrap();
        assert_eq!(action, "quantize");
    }

    #[tokio::test]
    async fn falls_back_to_default_when_nothing_matches() {
        let evaluator = DeclarativeTriggerEvaluator::new();
        let trigger = Trigger::script(r#"{"rules":[{"namespace":"prod","action":"export"}],"default":"noop"}"#);
        let action = evaluator.get_action(&event("staging"), &trigger).await.unwrap();
        assert_eq!(action, "noop");
    }

    #[tokio::test]
    async fn no_match_and_no_default_is_an_error() {
        let evaluator = DeclarativeTriggerEvaluator::new();
        let trigger = Trigger::script(r#"{"rules":[{"namespace":"prod","action":"export"}]}"#);
        let err = evaluator.get_action(&event("staging"), &trigger).await.unwrap_err();
        assert!(matches!(err, ModelBoxError::TriggerEvaluation(_)));
    }
}
