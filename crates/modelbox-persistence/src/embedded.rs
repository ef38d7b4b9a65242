//! A single-process, embedded-KV `MetadataStore`, for the ephemeral /
//! single-replica deployment that doesn't want an external database.
//! Grounded in the original bbolt-backed ephemeral storage: one `sled`
//! tree per entity kind plus a full-scan-and-filter approach to listing,
//! swapping bbolt's single-file B-tree for `sled`'s equivalent and
//! msgpack encoding for `serde_json` (already the encoding every other
//! part of this codebase uses for the same values).
//!
//! `sled`'s own API is synchronous and lock-free; every method here calls
//! it directly rather than through `spawn_blocking`, since lookups are
//! in-memory-page operations rather than a blocking network round trip.

use async_trait::async_trait;
use modelbox_core::{CreateResult, ModelBoxError, ModelBoxResult, MetadataStore};
use modelbox_domain::change_event::{ChangeEvent, EventType, ObjectType};
use modelbox_domain::event::Event;
use modelbox_domain::{
    Action, ActionInstance, Agent, Checkpoint, Experiment, File, MetadataMap, MetadataRow, Model,
    ModelVersion, Outcome, Status, Trigger,
};
use serde::{de::DeserializeOwned, Serialize};

fn to_mbox_err(e: sled::Error) -> ModelBoxError {
    ModelBoxError::StorageUnavailable(format!("sled: {e}"))
}

fn encode<T: Serialize>(v: &T) -> ModelBoxResult<Vec<u8>> {
    serde_json::to_vec(v).map_err(|e| ModelBoxError::Validation(format!("encode error: {e}")))
}

fn decode<T: DeserializeOwned>(bytes: &[u8]) -> ModelBoxResult<T> {
    serde_json::from_slice(bytes).map_err(|e| ModelBoxError::Validation(format!("decode error: {e}")))
}

/// Embedded, single-process `MetadataStore` backed by a `sled::Db`. Every
/// entity kind is its own tree, keyed by the entity's content-addressed
/// `id`; `mutation_events` is additionally keyed to preserve ascending
/// `mutation_id` order under `sled`'s own byte-lexicographic iteration.
pub struct EmbeddedKvMetadataStore {
    db: sled::Db,
    experiments: sled::Tree,
    checkpoints: sled::Tree,
    models: sled::Tree,
    model_versions: sled::Tree,
    blobs: sled::Tree,
    metadata: sled::Tree,
    triggers: sled::Tree,
    events: sled::Tree,
    mutation_events: sled::Tree,
    actions: sled::Tree,
    action_instances: sled::Tree,
    agents: sled::Tree,
}

impl EmbeddedKvMetadataStore {
    pub fn open(path: impl AsRef<std::path::Path>) -> ModelBoxResult<Self> {
        let db = sled::open(path).map_err(to_mbox_err)?;
        Ok(Self {
            experiments: db.open_tree("experiments").map_err(to_mbox_err)?,
            checkpoints: db.open_tree("checkpoints").map_err(to_mbox_err)?,
            models: db.open_tree("models").map_err(to_mbox_err)?,
            model_versions: db.open_tree("model_versions").map_err(to_mbox_err)?,
            blobs: db.open_tree("blobs").map_err(to_mbox_err)?,
            metadata: db.open_tree("metadata").map_err(to_mbox_err)?,
            triggers: db.open_tree("triggers").map_err(to_mbox_err)?,
            events: db.open_tree("events").map_err(to_mbox_err)?,
            mutation_events: db.open_tree("mutation_events").map_err(to_mbox_err)?,
            actions: db.open_tree("actions").map_err(to_mbox_err)?,
            action_instances: db.open_tree("action_instances").map_err(to_mbox_err)?,
            agents: db.open_tree("agents").map_err(to_mbox_err)?,
            db,
        })
    }

    fn put<T: Serialize>(&self, tree: &sled::Tree, key: &str, value: &T) -> ModelBoxResult<()> {
        tree.insert(key.as_bytes(), encode(value)?).map_err(to_mbox_err)?;
        Ok(())
    }

    fn get<T: DeserializeOwned>(&self, tree: &sled::Tree, key: &str) -> ModelBoxResult<T> {
        let bytes = tree
            .get(key.as_bytes())
            .map_err(to_mbox_err)?
            .ok_or_else(|| ModelBoxError::NotFound(key.to_string()))?;
        decode(&bytes)
    }

    fn scan<T: DeserializeOwned>(&self, tree: &sled::Tree) -> ModelBoxResult<Vec<T>> {
        let mut out = Vec::new();
        for entry in tree.iter() {
            let (_, v) = entry.map_err(to_mbox_err)?;
            out.push(decode(&v)?);
        }
        Ok(out)
    }

    fn next_mutation_id(&self) -> ModelBoxResult<u64> {
        self.db.generate_id().map_err(to_mbox_err)
    }

    fn append_change_event(&self, mut change: ChangeEvent) -> ModelBoxResult<ChangeEvent> {
        change.mutation_id = self.next_mutation_id()?;
        change.mutation_time = modelbox_core::now_epoch();
        self.put(
            &self.mutation_events,
            &format!("{:020}", change.mutation_id),
            &change,
        )?;
        Ok(change)
    }
}

#[async_trait]
impl MetadataStore for EmbeddedKvMetadataStore {
    async fn ping(&self) -> ModelBoxResult<()> {
        Ok(())
    }

    async fn create_schema(&self) -> ModelBoxResult<()> {
        // Trees are created lazily by `open_tree` in `open`; nothing
        // further to provision for an embedded KV store.
        Ok(())
    }

    fn backend(&self) -> &'static str {
        "embedded_kv"
    }

    async fn close(&self) -> ModelBoxResult<()> {
        self.db.flush_async().await.map_err(to_mbox_err)?;
        Ok(())
    }

    async fn create_experiment(&self, experiment: Experiment, meta: MetadataMap) -> ModelBoxResult<CreateResult> {
        if self.experiments.contains_key(experiment.id.as_bytes()).map_err(to_mbox_err)? {
            return Ok(CreateResult::existing(experiment.id));
        }
        let id = experiment.id.clone();
        let namespace = experiment.namespace.clone();
        self.put(&self.experiments, &id, &experiment)?;
        for (k, v) in meta {
            let row = MetadataRow::new(id.clone(), k, v);
            self.put(&self.metadata, &row.id, &row)?;
        }
        self.append_change_event(ChangeEvent::draft(
            EventType::ExperimentCreated,
            id.clone(),
            ObjectType::Experiment,
            id.clone(),
            namespace,
            None,
        ))?;
        Ok(CreateResult::created(id))
    }

    async fn get_experiment(&self, id: &str) -> ModelBoxResult<Experiment> {
        self.get(&self.experiments, id)
    }

    async fn list_experiments(&self, namespace: &str) -> ModelBoxResult<Vec<Experiment>> {
        let mut all: Vec<Experiment> = self.scan(&self.experiments)?;
        all.retain(|e| e.namespace == namespace);
        all.sort_by_key(|e| e.created_at);
        Ok(all)
    }

    async fn delete_experiment(&self, _id: &str) -> ModelBoxResult<()> {
        Ok(())
    }

    async fn create_checkpoint(&self, checkpoint: Checkpoint, files: Vec<File>) -> ModelBoxResult<CreateResult> {
        if self.checkpoints.contains_key(checkpoint.id.as_bytes()).map_err(to_mbox_err)? {
            return Ok(CreateResult::existing(checkpoint.id));
        }
        let id = checkpoint.id.clone();
        self.put(&self.checkpoints, &id, &checkpoint)?;
        for file in &files {
            if !self.blobs.contains_key(file.id.as_bytes()).map_err(to_mbox_err)? {
                self.put(&self.blobs, &file.id, file)?;
            }
        }
        Ok(CreateResult::created(id))
    }

    async fn list_checkpoints(&self, experiment_id: &str) -> ModelBoxResult<Vec<Checkpoint>> {
        let mut all: Vec<Checkpoint> = self.scan(&self.checkpoints)?;
        all.retain(|c| c.experiment_id == experiment_id);
        all.sort_by_key(|c| c.epoch);
        Ok(all)
    }

    async fn get_checkpoint(&self, id: &str) -> ModelBoxResult<(Checkpoint, Vec<File>)> {
        let checkpoint: Checkpoint = self.get(&self.checkpoints, id)?;
        let mut files: Vec<File> = self.scan(&self.blobs)?;
        files.retain(|f| f.parent_id == id);
        Ok((checkpoint, files))
    }

    async fn create_model(&self, model: Model, meta: MetadataMap) -> ModelBoxResult<CreateResult> {
        if self.models.contains_key(model.id.as_bytes()).map_err(to_mbox_err)? {
            return Ok(CreateResult::existing(model.id));
        }
        let id = model.id.clone();
        let namespace = model.namespace.clone();
        self.put(&self.models, &id, &model)?;
        for (k, v) in meta {
            let row = MetadataRow::new(id.clone(), k, v);
            self.put(&self.metadata, &row.id, &row)?;
        }
        self.append_change_event(ChangeEvent::draft(
            EventType::ModelCreated,
            id.clone(),
            ObjectType::Model,
            id.clone(),
            namespace,
            None,
        ))?;
        Ok(CreateResult::created(id))
    }

    async fn get_model(&self, id: &str) -> ModelBoxResult<Model> {
        self.get(&self.models, id)
    }

    async fn list_models(&self, namespace: &str) -> ModelBoxResult<Vec<Model>> {
        let mut all: Vec<Model> = self.scan(&self.models)?;
        all.retain(|m| m.namespace == namespace);
        all.sort_by_key(|m| m.created_at);
        Ok(all)
    }

    async fn create_model_version(
        &self,
        version: ModelVersion,
        meta: MetadataMap,
        files: Vec<File>,
    ) -> ModelBoxResult<CreateResult> {
        if self.model_versions.contains_key(version.id.as_bytes()).map_err(to_mbox_err)? {
            return Ok(CreateResult::existing(version.id));
        }
        let id = version.id.clone();
        let model_id = version.model_id.clone();
        let namespace = self.get::<Model>(&self.models, &model_id)?.namespace;
        self.put(&self.model_versions, &id, &version)?;
        for (k, v) in meta {
            let row = MetadataRow::new(id.clone(), k, v);
            self.put(&self.metadata, &row.id, &row)?;
        }
        for file in &files {
            if !self.blobs.contains_key(file.id.as_bytes()).map_err(to_mbox_err)? {
                self.put(&self.blobs, &file.id, file)?;
            }
        }
        self.append_change_event(ChangeEvent::draft(
            EventType::ModelVersionCreated,
            id.clone(),
            ObjectType::ModelVersion,
            model_id,
            namespace,
            None,
        ))?;
        Ok(CreateResult::created(id))
    }

    async fn get_model_version(&self, id: &str) -> ModelBoxResult<ModelVersion> {
        self.get(&self.model_versions, id)
    }

    async fn list_model_versions(&self, model_id: &str) -> ModelBoxResult<Vec<ModelVersion>> {
        let mut all: Vec<ModelVersion> = self.scan(&self.model_versions)?;
        all.retain(|v| v.model_id == model_id);
        all.sort_by_key(|v| v.created_at);
        Ok(all)
    }

    async fn write_files(&self, files: Vec<File>) -> ModelBoxResult<Vec<CreateResult>> {
        let mut results = Vec::with_capacity(files.len());
        for file in files {
            if self.blobs.contains_key(file.id.as_bytes()).map_err(to_mbox_err)? {
                results.push(CreateResult::existing(file.id));
                continue;
            }
            self.put(&self.blobs, &file.id, &file)?;
            results.push(CreateResult::created(file.id));
        }
        Ok(results)
    }

    async fn get_file(&self, id: &str) -> ModelBoxResult<File> {
        self.get(&self.blobs, id)
    }

    async fn get_files(&self, parent_id: &str) -> ModelBoxResult<Vec<File>> {
        let mut all: Vec<File> = self.scan(&self.blobs)?;
        all.retain(|f| f.parent_id == parent_id);
        Ok(all)
    }

    async fn update_metadata(&self, parent_id: &str, updates: MetadataMap) -> ModelBoxResult<()> {
        for (k, v) in updates {
            let row = MetadataRow::new(parent_id, k, v);
            self.put(&self.metadata, &row.id, &row)?;
        }
        Ok(())
    }

    async fn list_metadata(&self, parent_id: &str) -> ModelBoxResult<MetadataMap> {
        let rows: Vec<MetadataRow> = self.scan(&self.metadata)?;
        Ok(rows
            .into_iter()
            .filter(|r| r.parent_id == parent_id)
            .map(|r| (r.key, r.value))
            .collect())
    }

    async fn log_event(&self, event: Event) -> ModelBoxResult<()> {
        self.put(&self.events, &event.id, &event)
    }

    async fn list_events(&self, parent_id: &str) -> ModelBoxResult<Vec<Event>> {
        let mut all: Vec<Event> = self.scan(&self.events)?;
        all.retain(|e| e.parent_id == parent_id);
        all.sort_by_key(|e| e.wallclock);
        Ok(all)
    }

    async fn create_trigger(&self, parent_id: &str, trigger: Trigger) -> ModelBoxResult<()> {
        let id = modelbox_domain::ids::IdHasher::new()
            .feed_str(parent_id)
            .feed_str(&trigger.payload)
            .finish();
        #[derive(serde::Serialize, serde::Deserialize)]
        struct Stored {
            parent_id: String,
            trigger: Trigger,
        }
        self.put(
            &self.triggers,
            &id,
            &Stored { parent_id: parent_id.to_string(), trigger },
        )
    }

    async fn get_triggers(&self, parent_id: &str) -> ModelBoxResult<Vec<Trigger>> {
        #[derive(serde::Serialize, serde::Deserialize)]
        struct Stored {
            parent_id: String,
            trigger: Trigger,
        }
        let all: Vec<Stored> = self.scan(&self.triggers)?;
        Ok(all
            .into_iter()
            .filter(|s| s.parent_id == parent_id)
            .map(|s| s.trigger)
            .collect())
    }

    async fn list_changes(&self, namespace: &str, since: u64) -> ModelBoxResult<Vec<ChangeEvent>> {
        let mut all: Vec<ChangeEvent> = self.scan(&self.mutation_events)?;
        all.retain(|c| c.namespace == namespace && c.mutation_id > since);
        all.sort_by_key(|c| c.mutation_id);
        Ok(all)
    }

    async fn get_unprocessed_change_events(&self) -> ModelBoxResult<Vec<ChangeEvent>> {
        let mut all: Vec<ChangeEvent> = self.scan(&self.mutation_events)?;
        all.retain(|c| c.is_unprocessed());
        all.sort_by_key(|c| c.mutation_id);
        Ok(all)
    }

    async fn mark_change_event_processed(&self, mutation_id: u64, processed_at: u64) -> ModelBoxResult<()> {
        let key = format!("{:020}", mutation_id);
        let mut change: ChangeEvent = self.get(&self.mutation_events, &key)?;
        change.processed_at = processed_at;
        self.put(&self.mutation_events, &key, &change)
    }

    async fn create_action(&self, action: Action) -> ModelBoxResult<CreateResult> {
        if self.actions.contains_key(action.id.as_bytes()).map_err(to_mbox_err)? {
            return Ok(CreateResult::existing(action.id));
        }
        let id = action.id.clone();
        let parent_id = action.parent_id.clone();
        self.put(&self.actions, &id, &action)?;
        self.append_change_event(ChangeEvent::draft(
            EventType::ActionCreated,
            id.clone(),
            ObjectType::Action,
            parent_id,
            String::new(),
            None,
        ))?;
        Ok(CreateResult::created(id))
    }

    async fn get_action(&self, id: &str) -> ModelBoxResult<(Action, Vec<ActionInstance>)> {
        let action: Action = self.get(&self.actions, id)?;
        let mut instances: Vec<ActionInstance> = self.scan(&self.action_instances)?;
        instances.retain(|i| i.action_id == id);
        instances.sort_by_key(|i| i.attempt);
        Ok((action, instances))
    }

    async fn list_actions(&self, ids: &[String]) -> ModelBoxResult<Vec<(Action, Vec<ActionInstance>)>> {
        let mut all_instances: Vec<ActionInstance> = self.scan(&self.action_instances)?;
        all_instances.sort_by_key(|i| i.attempt);
        let mut out = Vec::with_capacity(ids.len());
        for id in ids {
            let action: Action = match self.get(&self.actions, id) {
                Ok(a) => a,
                Err(_) => continue,
            };
            let instances = all_instances.iter().filter(|i| &i.action_id == id).cloned().collect();
            out.push((action, instances));
        }
        Ok(out)
    }

    async fn create_action_instance(
        &self,
        instance: ActionInstance,
        triggering_event_mutation_id: u64,
        now: u64,
    ) -> ModelBoxResult<()> {
        let action_id = instance.action_id.clone();
        let instance_id = instance.id.clone();
        self.put(&self.action_instances, &instance_id, &instance)?;
        self.mark_change_event_processed(triggering_event_mutation_id, now).await?;
        self.append_change_event(ChangeEvent::draft(
            EventType::ActionInstanceCreated,
            instance_id,
            ObjectType::ActionInstance,
            action_id,
            String::new(),
            None,
        ))?;
        Ok(())
    }

    async fn update_action_instance(
        &self,
        instance_id: &str,
        new_status: Status,
        outcome: Outcome,
        outcome_reason: &str,
        now: u64,
    ) -> ModelBoxResult<bool> {
        let mut instance: ActionInstance = self.get(&self.action_instances, instance_id)?;
        let applied = instance.apply_update(new_status, outcome, outcome_reason, now);
        if applied {
            self.put(&self.action_instances, instance_id, &instance)?;
            self.append_change_event(ChangeEvent::draft(
                EventType::for_action_instance_transition(instance.status, instance.outcome),
                instance.id.clone(),
                ObjectType::ActionInstance,
                instance.action_id.clone(),
                String::new(),
                None,
            ))?;
        }
        Ok(applied)
    }

    async fn get_runnable_action_instances(&self, arch: &str) -> ModelBoxResult<Vec<ActionInstance>> {
        let actions: Vec<Action> = self.scan(&self.actions)?;
        let matching_action_ids: std::collections::HashSet<String> = actions
            .into_iter()
            .filter(|a| a.arch == arch)
            .map(|a| a.id)
            .collect();
        let mut instances: Vec<ActionInstance> = self.scan(&self.action_instances)?;
        instances.retain(|i| i.status == Status::Pending && matching_action_ids.contains(&i.action_id));
        instances.sort_by_key(|i| i.created_at);
        Ok(instances)
    }

    async fn register_agent(&self, agent: Agent, now: u64) -> ModelBoxResult<String> {
        #[derive(serde::Serialize, serde::Deserialize)]
        struct Stored {
            agent: Agent,
            heartbeat_time: u64,
        }
        let id = agent.id.clone();
        self.put(&self.agents, &id, &Stored { agent, heartbeat_time: now })?;
        Ok(id)
    }

    async fn heartbeat(&self, agent_id: &str, t: u64) -> ModelBoxResult<()> {
        #[derive(serde::Serialize, serde::Deserialize)]
        struct Stored {
            agent: Agent,
            heartbeat_time: u64,
        }
        let mut stored: Stored = self.get(&self.agents, agent_id)?;
        stored.heartbeat_time = t;
        self.put(&self.agents, agent_id, &stored)
    }

    async fn get_dead_agents(&self, now: u64, stale_threshold_secs: u64) -> ModelBoxResult<Vec<Agent>> {
        #[derive(serde::Serialize, serde::Deserialize)]
        struct Stored {
            agent: Agent,
            heartbeat_time: u64,
        }
        let all: Vec<Stored> = self.scan(&self.agents)?;
        let cutoff = now.saturating_sub(stale_threshold_secs);
        Ok(all
            .into_iter()
            .filter(|s| s.heartbeat_time < cutoff)
            .map(|s| s.agent)
            .collect())
    }
}
