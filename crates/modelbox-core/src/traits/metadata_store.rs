//! The `MetadataStore` capability: the transactional catalog for every
//! entity plus the append-only mutation log. One concrete impl per backend
//! lives in `modelbox-persistence`; this crate only names the contract.

use async_trait::async_trait;
use modelbox_domain::{
    Action, ActionInstance, Agent, Checkpoint, Experiment, File, MetadataMap, Model, ModelVersion,
    Outcome, Status, Trigger,
};
use modelbox_domain::change_event::ChangeEvent;
use modelbox_domain::event::Event;

use crate::error::ModelBoxResult;

/// Result of any idempotent create: `exists=true` means the row already
/// existed under this identity and no new row (or ChangeEvent) was written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateResult {
    pub id: String,
    pub exists: bool,
}

impl CreateResult {
    pub fn created(id: impl Into<String>) -> Self {
        Self { id: id.into(), exists: false }
    }

    pub fn existing(id: impl Into<String>) -> Self {
        Self { id: id.into(), exists: true }
    }
}

#[async_trait]
pub trait MetadataStore: Send + Sync {
    async fn ping(&self) -> ModelBoxResult<()>;
    async fn create_schema(&self) -> ModelBoxResult<()>;
    fn backend(&self) -> &'static str;
    async fn close(&self) -> ModelBoxResult<()>;

    async fn create_experiment(&self, experiment: Experiment, meta: MetadataMap) -> ModelBoxResult<CreateResult>;
    async fn get_experiment(&self, id: &str) -> ModelBoxResult<Experiment>;
    async fn list_experiments(&self, namespace: &str) -> ModelBoxResult<Vec<Experiment>>;

    /// Maintenance-only op, not exposed over the public RPC surface: the
    /// core's own lifecycle rule is that experiments are never deleted
    /// (spec §3), so every backend implements this as a no-op that
    /// reports success without removing the row, matching the original
    /// ephemeral storage's own `DeleteExperiment`.
    async fn delete_experiment(&self, id: &str) -> ModelBoxResult<()>;

    async fn create_checkpoint(
        &self,
        checkpoint: Checkpoint,
        files: Vec<File>,
    ) -> ModelBoxResult<CreateResult>;
    async fn list_checkpoints(&self, experiment_id: &str) -> ModelBoxResult<Vec<Checkpoint>>;
    async fn get_checkpoint(&self, id: &str) -> ModelBoxResult<(Checkpoint, Vec<File>)>;

    async fn create_model(&self, model: Model, meta: MetadataMap) -> ModelBoxResult<CreateResult>;
    async fn get_model(&self, id: &str) -> ModelBoxResult<Model>;
    async fn list_models(&self, namespace: &str) -> ModelBoxResult<Vec<Model>>;

    async fn create_model_version(
        &self,
        version: ModelVersion,
        meta: MetadataMap,
        files: Vec<File>,
    ) -> ModelBoxResult<CreateResult>;
    async fn get_model_version(&self, id: &str) -> ModelBoxResult<ModelVersion>;
    async fn list_model_versions(&self, model_id: &str) -> ModelBoxResult<Vec<ModelVersion>>;

    /// Inserts File rows; a row whose id already exists is reported back as
    /// `exists=true` rather than as an error (the `duplicate-file` kind).
    async fn write_files(&self, files: Vec<File>) -> ModelBoxResult<Vec<CreateResult>>;
    async fn get_file(&self, id: &str) -> ModelBoxResult<File>;
    async fn get_files(&self, parent_id: &str) -> ModelBoxResult<Vec<File>>;

    async fn update_metadata(&self, parent_id: &str, updates: MetadataMap) -> ModelBoxResult<()>;
    async fn list_metadata(&self, parent_id: &str) -> ModelBoxResult<MetadataMap>;

    async fn log_event(&self, event: Event) -> ModelBoxResult<()>;
    async fn list_events(&self, parent_id: &str) -> ModelBoxResult<Vec<Event>>;

    async fn create_trigger(&self, parent_id: &str, trigger: Trigger) -> ModelBoxResult<()>;
    async fn get_triggers(&self, parent_id: &str) -> ModelBoxResult<Vec<Trigger>>;

    async fn list_changes(&self, namespace: &str, since: u64) -> ModelBoxResult<Vec<ChangeEvent>>;
    async fn get_unprocessed_change_events(&self) -> ModelBoxResult<Vec<ChangeEvent>>;

    /// Marks a trigger-source event processed once its triggers have all
    /// been evaluated without error. Never called for an event with no
    /// triggers attached — see the scheduler's tick algorithm.
    async fn mark_change_event_processed(&self, mutation_id: u64, processed_at: u64) -> ModelBoxResult<()>;

    async fn create_action(&self, action: Action) -> ModelBoxResult<CreateResult>;
    async fn get_action(&self, id: &str) -> ModelBoxResult<(Action, Vec<ActionInstance>)>;

    /// Batch form of `get_action`, used by `ListActions`. Ids with no
    /// matching row are silently omitted rather than failing the batch.
    async fn list_actions(&self, ids: &[String]) -> ModelBoxResult<Vec<(Action, Vec<ActionInstance>)>>;

    /// Atomically inserts `instance`, sets `triggering_event.processed_at`,
    /// and appends an `action_instance_created` ChangeEvent.
    async fn create_action_instance(
        &self,
        instance: ActionInstance,
        triggering_event_mutation_id: u64,
        now: u64,
    ) -> ModelBoxResult<()>;

    /// Applies a status transition if monotone; returns `updated=false` on
    /// a stale/regressive update instead of an error.
    async fn update_action_instance(
        &self,
        instance_id: &str,
        new_status: Status,
        outcome: Outcome,
        outcome_reason: &str,
        now: u64,
    ) -> ModelBoxResult<bool>;

    async fn get_runnable_action_instances(&self, arch: &str) -> ModelBoxResult<Vec<ActionInstance>>;

    async fn register_agent(&self, agent: Agent, now: u64) -> ModelBoxResult<String>;
    async fn heartbeat(&self, agent_id: &str, t: u64) -> ModelBoxResult<()>;
    async fn get_dead_agents(&self, now: u64, stale_threshold_secs: u64) -> ModelBoxResult<Vec<Agent>>;
}
