//! `TriggerEvaluator` strategies: `rhai`-based sandboxed scripting (the
//! default, matching the teacher's scripting evaluator) and a declarative
//! JSON-rule alternative demonstrating the capability is swappable.

pub mod declarative;
pub mod rhai_evaluator;

pub use declarative::DeclarativeTriggerEvaluator;
pub use rhai_evaluator::RhaiTriggerEvaluator;
