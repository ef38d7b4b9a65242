//! Diesel row structs for every table in `schema`, plus the conversions to
//! and from the `modelbox-domain` types the rest of the codebase speaks.
//! JSON-shaped domain fields (metrics, tags, params, metadata, payload) are
//! serialized to a `String` column on the way in and parsed back on the
//! way out; see `schema`'s module doc for why these columns are `Text`.

use diesel::prelude::*;
use modelbox_domain::change_event::{ChangeEvent, EventType, ObjectType};
use modelbox_domain::event::Event;
use modelbox_domain::metadata::{MetadataMap, MetadataRow as DomainMetadataRow};
use modelbox_domain::{
    Action, ActionInstance, Agent, Checkpoint, ClusterMember, Experiment, File, FileType, Model,
    ModelVersion, Outcome, Status, Trigger, TriggerType,
};
use std::collections::BTreeMap;

use crate::schema::*;

fn framework_tag(f: modelbox_domain::Framework) -> &'static str {
    match f {
        modelbox_domain::Framework::Unknown => "unknown",
        modelbox_domain::Framework::Pytorch => "pytorch",
        modelbox_domain::Framework::Keras => "keras",
    }
}

fn framework_from_tag(s: &str) -> modelbox_domain::Framework {
    match s {
        "pytorch" => modelbox_domain::Framework::Pytorch,
        "keras" => modelbox_domain::Framework::Keras,
        _ => modelbox_domain::Framework::Unknown,
    }
}

#[derive(Queryable, Insertable, Debug, Clone)]
#[diesel(table_name = experiments)]
pub struct ExperimentRow {
    pub id: String,
    pub name: String,
    pub owner: String,
    pub namespace: String,
    pub external_id: String,
    pub framework: String,
    pub created_at: i64,
    pub updated_at: i64,
}

impl From<&Experiment> for ExperimentRow {
    fn from(e: &Experiment) -> Self {
        Self {
            id: e.id.clone(),
            name: e.name.clone(),
            owner: e.owner.clone(),
            namespace: e.namespace.clone(),
            external_id: e.external_id.clone(),
            framework: framework_tag(e.framework).to_string(),
            created_at: e.created_at as i64,
            updated_at: e.updated_at as i64,
        }
    }
}

impl From<ExperimentRow> for Experiment {
    fn from(r: ExperimentRow) -> Self {
        Self {
            id: r.id,
            name: r.name,
            owner: r.owner,
            namespace: r.namespace,
            external_id: r.external_id,
            framework: framework_from_tag(&r.framework),
            created_at: r.created_at as u64,
            updated_at: r.updated_at as u64,
        }
    }
}

#[derive(Queryable, Insertable, Debug, Clone)]
#[diesel(table_name = checkpoints)]
pub struct CheckpointRow {
    pub id: String,
    pub experiment_id: String,
    pub epoch: i64,
    pub metrics: String,
    pub created_at: i64,
    pub updated_at: i64,
}

impl From<&Checkpoint> for CheckpointRow {
    fn from(c: &Checkpoint) -> Self {
        Self {
            id: c.id.clone(),
            experiment_id: c.experiment_id.clone(),
            epoch: c.epoch as i64,
            metrics: serde_json::to_string(&c.metrics).expect("metrics always serialize"),
            created_at: c.created_at as i64,
            updated_at: c.updated_at as i64,
        }
    }
}

impl From<CheckpointRow> for Checkpoint {
    fn from(r: CheckpointRow) -> Self {
        Self {
            id: r.id,
            experiment_id: r.experiment_id,
            epoch: r.epoch as u64,
            metrics: serde_json::from_str(&r.metrics).unwrap_or_default(),
            created_at: r.created_at as u64,
            updated_at: r.updated_at as u64,
        }
    }
}

#[derive(Queryable, Insertable, Debug, Clone)]
#[diesel(table_name = models)]
pub struct ModelRow {
    pub id: String,
    pub name: String,
    pub owner: String,
    pub namespace: String,
    pub task: String,
    pub description: String,
    pub created_at: i64,
    pub updated_at: i64,
}

impl From<&Model> for ModelRow {
    fn from(m: &Model) -> Self {
        Self {
            id: m.id.clone(),
            name: m.name.clone(),
            owner: m.owner.clone(),
            namespace: m.namespace.clone(),
            task: m.task.clone(),
            description: m.description.clone(),
            created_at: m.created_at as i64,
            updated_at: m.updated_at as i64,
        }
    }
}

impl From<ModelRow> for Model {
    fn from(r: ModelRow) -> Self {
        Self {
            id: r.id,
            name: r.name,
            owner: r.owner,
            namespace: r.namespace,
            task: r.task,
            description: r.description,
            created_at: r.created_at as u64,
            updated_at: r.updated_at as u64,
        }
    }
}

#[derive(Queryable, Insertable, Debug, Clone)]
#[diesel(table_name = model_versions)]
pub struct ModelVersionRow {
    pub id: String,
    pub name: String,
    pub model_id: String,
    pub version: String,
    pub description: String,
    pub framework: String,
    pub unique_tags: String,
    pub created_at: i64,
    pub updated_at: i64,
}

impl From<&ModelVersion> for ModelVersionRow {
    fn from(v: &ModelVersion) -> Self {
        Self {
            id: v.id.clone(),
            name: v.name.clone(),
            model_id: v.model_id.clone(),
            version: v.version.clone(),
            description: v.description.clone(),
            framework: v.framework.clone(),
            unique_tags: serde_json::to_string(&v.unique_tags).expect("tags always serialize"),
            created_at: v.created_at as i64,
            updated_at: v.updated_at as i64,
        }
    }
}

impl From<ModelVersionRow> for ModelVersion {
    fn from(r: ModelVersionRow) -> Self {
        Self {
            id: r.id,
            name: r.name,
            model_id: r.model_id,
            version: r.version,
            description: r.description,
            framework: r.framework,
            unique_tags: serde_json::from_str(&r.unique_tags).unwrap_or_default(),
            created_at: r.created_at as u64,
            updated_at: r.updated_at as u64,
        }
    }
}

fn file_type_tag(t: FileType) -> &'static str {
    match t {
        FileType::Checkpoint => "checkpoint",
        FileType::Model => "model",
        FileType::Text => "text",
        FileType::Image => "image",
        FileType::Audio => "audio",
        FileType::Video => "video",
    }
}

fn file_type_from_tag(s: &str) -> FileType {
    match s {
        "model" => FileType::Model,
        "image" => FileType::Image,
        "audio" => FileType::Audio,
        "video" => FileType::Video,
        "checkpoint" => FileType::Checkpoint,
        _ => FileType::Text,
    }
}

#[derive(Queryable, Insertable, Debug, Clone)]
#[diesel(table_name = blobs)]
pub struct BlobRow {
    pub id: String,
    pub parent_id: String,
    pub file_type: String,
    pub path: String,
    pub checksum: String,
    pub created_at: i64,
    pub updated_at: i64,
}

impl From<&File> for BlobRow {
    fn from(f: &File) -> Self {
        Self {
            id: f.id.clone(),
            parent_id: f.parent_id.clone(),
            file_type: file_type_tag(f.file_type).to_string(),
            path: f.path.clone(),
            checksum: f.checksum.clone(),
            created_at: f.created_at as i64,
            updated_at: f.updated_at as i64,
        }
    }
}

impl From<BlobRow> for File {
    fn from(r: BlobRow) -> Self {
        Self {
            id: r.id,
            parent_id: r.parent_id,
            file_type: file_type_from_tag(&r.file_type),
            path: r.path,
            checksum: r.checksum,
            created_at: r.created_at as u64,
            updated_at: r.updated_at as u64,
        }
    }
}

#[derive(Queryable, Insertable, Debug, Clone)]
#[diesel(table_name = metadata)]
pub struct MetadataRowSql {
    pub id: String,
    pub parent_id: String,
    pub key: String,
    pub value: String,
}

impl From<&DomainMetadataRow> for MetadataRowSql {
    fn from(r: &DomainMetadataRow) -> Self {
        Self {
            id: r.id.clone(),
            parent_id: r.parent_id.clone(),
            key: r.key.clone(),
            value: serde_json::to_string(&r.value).expect("metadata value always serializes"),
        }
    }
}

pub fn metadata_map_from_rows(rows: Vec<MetadataRowSql>) -> MetadataMap {
    let mut map = BTreeMap::new();
    for row in rows {
        if let Ok(v) = serde_json::from_str(&row.value) {
            map.insert(row.key, v);
        }
    }
    map
}

#[derive(Queryable, Insertable, Debug, Clone)]
#[diesel(table_name = mutation_events)]
pub struct MutationEventInsert {
    pub mutation_time: i64,
    pub event_type: String,
    pub object_id: String,
    pub object_type: String,
    pub parent_id: String,
    pub namespace: String,
    pub processed_at: i64,
    pub payload: Option<String>,
}

#[derive(Queryable, Debug, Clone)]
pub struct MutationEventRow {
    pub mutation_id: i64,
    pub mutation_time: i64,
    pub event_type: String,
    pub object_id: String,
    pub object_type: String,
    pub parent_id: String,
    pub namespace: String,
    pub processed_at: i64,
    pub payload: Option<String>,
}

fn event_type_tag(t: EventType) -> &'static str {
    match t {
        EventType::ExperimentCreated => "experiment_created",
        EventType::ModelCreated => "model_created",
        EventType::ModelVersionCreated => "model_version_created",
        EventType::ActionCreated => "action_created",
        EventType::ActionInstanceCreated => "action_instance_created",
        EventType::ActionInstancePending => "action_instance_pending",
        EventType::ActionInstanceRunning => "action_instance_running",
        EventType::ActionInstanceSuccess => "action_instance_success",
        EventType::ActionInstanceFailure => "action_instance_failure",
    }
}

fn event_type_from_tag(s: &str) -> EventType {
    match s {
        "model_created" => EventType::ModelCreated,
        "model_version_created" => EventType::ModelVersionCreated,
        "action_created" => EventType::ActionCreated,
        "action_instance_created" => EventType::ActionInstanceCreated,
        "action_instance_pending" => EventType::ActionInstancePending,
        "action_instance_running" => EventType::ActionInstanceRunning,
        "action_instance_success" => EventType::ActionInstanceSuccess,
        "action_instance_failure" => EventType::ActionInstanceFailure,
        _ => EventType::ExperimentCreated,
    }
}

fn object_type_tag(t: ObjectType) -> &'static str {
    match t {
        ObjectType::Model => "model",
        ObjectType::ModelVersion => "model_version",
        ObjectType::Experiment => "experiment",
        ObjectType::Action => "action",
        ObjectType::ActionInstance => "action_instance",
    }
}

fn object_type_from_tag(s: &str) -> ObjectType {
    match s {
        "model" => ObjectType::Model,
        "model_version" => ObjectType::ModelVersion,
        "action" => ObjectType::Action,
        "action_instance" => ObjectType::ActionInstance,
        _ => ObjectType::Experiment,
    }
}

impl MutationEventInsert {
    pub fn from_change_event(c: &ChangeEvent) -> Self {
        Self {
            mutation_time: c.mutation_time as i64,
            event_type: event_type_tag(c.event_type).to_string(),
            object_id: c.object_id.clone(),
            object_type: object_type_tag(c.object_type).to_string(),
            parent_id: c.parent_id.clone(),
            namespace: c.namespace.clone(),
            processed_at: c.processed_at as i64,
            payload: c
                .payload
                .as_ref()
                .map(|v| serde_json::to_string(v).expect("payload always serializes")),
        }
    }
}

impl From<MutationEventRow> for ChangeEvent {
    fn from(r: MutationEventRow) -> Self {
        Self {
            mutation_id: r.mutation_id as u64,
            mutation_time: r.mutation_time as u64,
            event_type: event_type_from_tag(&r.event_type),
            object_id: r.object_id,
            object_type: object_type_from_tag(&r.object_type),
            parent_id: r.parent_id,
            namespace: r.namespace,
            processed_at: r.processed_at as u64,
            payload: r.payload.and_then(|p| serde_json::from_str(&p).ok()),
        }
    }
}

#[derive(Queryable, Insertable, Debug, Clone)]
#[diesel(table_name = events)]
pub struct EventRow {
    pub id: String,
    pub parent_id: String,
    pub name: String,
    pub source: String,
    pub wallclock: i64,
    pub metadata: String,
}

impl From<&Event> for EventRow {
    fn from(e: &Event) -> Self {
        Self {
            id: e.id.clone(),
            parent_id: e.parent_id.clone(),
            name: e.name.clone(),
            source: e.source.clone(),
            wallclock: e.wallclock as i64,
            metadata: serde_json::to_string(&e.metadata).expect("event metadata always serializes"),
        }
    }
}

impl From<EventRow> for Event {
    fn from(r: EventRow) -> Self {
        Self {
            id: r.id,
            parent_id: r.parent_id,
            name: r.name,
            source: r.source,
            wallclock: r.wallclock as u64,
            metadata: serde_json::from_str(&r.metadata).unwrap_or_default(),
        }
    }
}

#[derive(Queryable, Insertable, Debug, Clone)]
#[diesel(table_name = triggers)]
pub struct TriggerRow {
    pub id: String,
    pub parent_id: String,
    pub payload: String,
    pub trigger_type: String,
}

impl TriggerRow {
    pub fn new(parent_id: &str, id: &str, trigger: &Trigger) -> Self {
        Self {
            id: id.to_string(),
            parent_id: parent_id.to_string(),
            payload: trigger.payload.clone(),
            trigger_type: match trigger.trigger_type {
                TriggerType::Script => "script".to_string(),
            },
        }
    }
}

impl From<TriggerRow> for Trigger {
    fn from(r: TriggerRow) -> Self {
        Self {
            payload: r.payload,
            trigger_type: TriggerType::Script,
        }
    }
}

#[derive(Queryable, Insertable, Debug, Clone)]
#[diesel(table_name = actions)]
pub struct ActionRow {
    pub id: String,
    pub parent_id: String,
    pub name: String,
    pub arch: String,
    pub trigger_payload: String,
    pub trigger_type: String,
    pub params: String,
    pub created_at: i64,
    pub updated_at: i64,
    pub finished_at: i64,
}

impl From<&Action> for ActionRow {
    fn from(a: &Action) -> Self {
        Self {
            id: a.id.clone(),
            parent_id: a.parent_id.clone(),
            name: a.name.clone(),
            arch: a.arch.clone(),
            trigger_payload: a.trigger.payload.clone(),
            trigger_type: match a.trigger.trigger_type {
                TriggerType::Script => "script".to_string(),
            },
            params: serde_json::to_string(&a.params).expect("params always serialize"),
            created_at: a.created_at as i64,
            updated_at: a.updated_at as i64,
            finished_at: a.finished_at as i64,
        }
    }
}

impl From<ActionRow> for Action {
    fn from(r: ActionRow) -> Self {
        Self {
            id: r.id,
            parent_id: r.parent_id,
            name: r.name,
            arch: r.arch,
            trigger: Trigger {
                payload: r.trigger_payload,
                trigger_type: TriggerType::Script,
            },
            params: serde_json::from_str(&r.params).unwrap_or_default(),
            created_at: r.created_at as u64,
            updated_at: r.updated_at as u64,
            finished_at: r.finished_at as u64,
        }
    }
}

fn status_tag(s: Status) -> &'static str {
    match s {
        Status::Pending => "pending",
        Status::Running => "running",
        Status::Finished => "finished",
    }
}

fn status_from_tag(s: &str) -> Status {
    match s {
        "running" => Status::Running,
        "finished" => Status::Finished,
        _ => Status::Pending,
    }
}

fn outcome_tag(o: Outcome) -> &'static str {
    match o {
        Outcome::Unknown => "unknown",
        Outcome::Success => "success",
        Outcome::Failure => "failure",
    }
}

fn outcome_from_tag(s: &str) -> Outcome {
    match s {
        "success" => Outcome::Success,
        "failure" => Outcome::Failure,
        _ => Outcome::Unknown,
    }
}

#[derive(Queryable, Insertable, Debug, Clone)]
#[diesel(table_name = action_instances)]
pub struct ActionInstanceRow {
    pub id: String,
    pub action_id: String,
    pub attempt: i32,
    pub status: String,
    pub outcome: String,
    pub outcome_reason: String,
    pub created_at: i64,
    pub updated_at: i64,
    pub finished_at: i64,
}

impl From<&ActionInstance> for ActionInstanceRow {
    fn from(i: &ActionInstance) -> Self {
        Self {
            id: i.id.clone(),
            action_id: i.action_id.clone(),
            attempt: i.attempt as i32,
            status: status_tag(i.status).to_string(),
            outcome: outcome_tag(i.outcome).to_string(),
            outcome_reason: i.outcome_reason.clone(),
            created_at: i.created_at as i64,
            updated_at: i.updated_at as i64,
            finished_at: i.finished_at as i64,
        }
    }
}

impl From<ActionInstanceRow> for ActionInstance {
    fn from(r: ActionInstanceRow) -> Self {
        Self {
            id: r.id,
            action_id: r.action_id,
            attempt: r.attempt as u32,
            status: status_from_tag(&r.status),
            outcome: outcome_from_tag(&r.outcome),
            outcome_reason: r.outcome_reason,
            created_at: r.created_at as u64,
            updated_at: r.updated_at as u64,
            finished_at: r.finished_at as u64,
        }
    }
}

#[derive(Queryable, Insertable, Debug, Clone)]
#[diesel(table_name = agents)]
pub struct AgentRow {
    pub id: String,
    pub name: String,
    pub hostname: String,
    pub ip: String,
    pub arch: String,
    pub actions: String,
    pub heartbeat_time: i64,
}

impl AgentRow {
    pub fn new(agent: &Agent, now: u64) -> Self {
        Self {
            id: agent.id.clone(),
            name: agent.name.clone(),
            hostname: agent.hostname.clone(),
            ip: agent.ip.clone(),
            arch: agent.arch.clone(),
            actions: serde_json::to_string(&agent.actions).expect("actions always serialize"),
            heartbeat_time: now as i64,
        }
    }
}

impl From<AgentRow> for Agent {
    fn from(r: AgentRow) -> Self {
        Self {
            id: r.id,
            name: r.name,
            hostname: r.hostname,
            ip: r.ip,
            arch: r.arch,
            actions: serde_json::from_str(&r.actions).unwrap_or_default(),
        }
    }
}

#[derive(Queryable, Insertable, Debug, Clone)]
#[diesel(table_name = cluster_members)]
pub struct ClusterMemberRow {
    pub id: String,
    pub hostname: String,
    pub rpc_addr: String,
    pub http_addr: String,
    pub heartbeat_time: i64,
}

impl From<&ClusterMember> for ClusterMemberRow {
    fn from(m: &ClusterMember) -> Self {
        Self {
            id: m.id.clone(),
            hostname: m.hostname.clone(),
            rpc_addr: m.rpc_addr.clone(),
            http_addr: m.http_addr.clone(),
            heartbeat_time: m.heartbeat_time as i64,
        }
    }
}

impl From<ClusterMemberRow> for ClusterMember {
    fn from(r: ClusterMemberRow) -> Self {
        Self {
            id: r.id,
            hostname: r.hostname,
            rpc_addr: r.rpc_addr,
            http_addr: r.http_addr,
            heartbeat_time: r.heartbeat_time as u64,
        }
    }
}
