//! The `TriggerEvaluator` capability: maps a `ChangeEvent` + `Trigger` to
//! an action name through a sandboxed scripting strategy. One interpreter
//! instance (or an explicit reset) per call — evaluators must be stateless
//! between invocations.

use async_trait::async_trait;
use modelbox_domain::change_event::ChangeEvent;
use modelbox_domain::Trigger;

use crate::error::ModelBoxResult;

#[async_trait]
pub trait TriggerEvaluator: Send + Sync {
    async fn get_action(&self, event: &ChangeEvent, trigger: &Trigger) -> ModelBoxResult<String>;
}
