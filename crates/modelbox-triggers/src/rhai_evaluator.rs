//! Sandboxed-scripting `TriggerEvaluator`. Grounded in
//! `server/scheduler/trigger_evaluator.go`'s `otto`-based evaluator: bind
//! the change-event under `changeEvent`, run the trigger payload, and
//! require the result to be a string action name. `rhai` stands in for
//! `otto` — both are embeddable, sandboxed-by-default scripting engines;
//! `rhai` is the actively maintained choice for an async Rust server.

use async_trait::async_trait;
use rhai::{Dynamic, Engine, Scope};

use modelbox_core::error::{ModelBoxError, ModelBoxResult};
use modelbox_core::TriggerEvaluator;
use modelbox_domain::change_event::ChangeEvent;
use modelbox_domain::Trigger;

/// Wraps one `rhai::Engine`. The engine itself holds no per-call state —
/// every evaluation builds a fresh `Scope` — so a single instance is safe
/// to share across concurrent calls, satisfying the "stateless between
/// invocations" requirement without needing a fresh interpreter per call.
pub struct RhaiTriggerEvaluator {
    engine: Engine,
}

impl RhaiTriggerEvaluator {
    pub fn new() -> Self {
        Self {
            engine: Engine::new(),
        }
    }
}

impl Default for RhaiTriggerEvaluator {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TriggerEvaluator for RhaiTriggerEvaluator {
    async fn get_action(&self, event: &ChangeEvent, trigger: &Trigger) -> ModelBoxResult<String> {
        let event_json = serde_json::to_value(event)
            .map_err(|e| ModelBoxError::TriggerEvaluation(format!("couldn't serialize change event: {e}")))?;
        let event_dynamic: Dynamic = rhai::serde::to_dynamic(&event_json)
            .map_err(|e| ModelBoxError::TriggerEvaluation(format!("couldn't bind change event: {e}")))?;

        let mut scope = Scope::new();
        scope.push("changeEvent", event_dynamic);

        let result: Dynamic = self
            .engine
            .eval_with_scope(&mut scope, &trigger.payload)
            .map_err(|e| ModelBoxError::TriggerEvaluation(format!("unable to evaluate trigger: {e}")))?;

        result
            .into_string()
            .map_err(|ty| ModelBoxError::TriggerEvaluation(format!("trigger returned {ty}, expected a string action name")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use modelbox_domain::change_event::ObjectType;

    fn event() -> ChangeEvent {
        let mut e = ChangeEvent::draft(
            modelbox_domain::change_event::EventType::ExperimentCreated,
            "exp-1",
            ObjectType::Experiment,
            "exp-1",
            "ns",
            None,
        );
        e.mutation_id = 42;
        e
    }

    #[tokio::test]
    async fn returns_the_scripts_string_result() {
        let evaluator = RhaiTriggerEvaluator::new();
        let trigger = Trigger::script(r#""export""#);
        let action = evaluator.get_action(&event(), &trigger).await.unwrap();
        assert_eq!(action, "export");
    }

    #[tokio::test]
    async fn can_branch_on_the_bound_change_event() {
        let evaluator = RhaiTriggerEvaluator::new();
        let trigger = Trigger::script(r#"if changeEvent.namespace == "ns" { "export" } else { "noop" }"#);
        let action = evaluator.get_action(&event(), &trigger).await.unwrap();
        assert_eq!(action, "export");
    }

    #[tokio::test]
    async fn a_non_string_result_is_a_trigger_evaluation_error() {
        let evaluator = RhaiTriggerEvaluator::new();
        let trigger = Trigger::script("42");
        let err = evaluator.get_action(&event(), &trigger).await.unwrap_err();
        assert!(matches!(err, ModelBoxError::TriggerEvaluation(_)));
    }

    #[tokio::test]
    async fn a_script_runtime_error_is_a_trigger_evaluation_error() {
        let evaluator = RhaiTriggerEvaluator::new();
        let trigger = Trigger::script("this is not valid rhai (");
        let err = evaluator.get_action(&event(), &trigger).await.unwrap_err();
        assert!(matches!(err, ModelBoxError::TriggerEvaluation(_)));
    }
}
