//! Wire DTOs for the `ModelStore`/`ModelBoxAdmin` services. Request/response
//! shapes mirror `spec.md` §6 one-for-one; most wrap a `modelbox-domain`
//! entity directly rather than re-declaring its fields, since the entity
//! *is* the wire shape the original's generated protobuf types carried.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use modelbox_core::MetricPoint;
use modelbox_domain::{
    Action, ActionInstance, Agent, Checkpoint, ClusterMember, Event, Experiment, File, MetadataMap,
    MetadataValue, Model, ModelVersion, Outcome, Status, Trigger,
};
use modelbox_domain::change_event::ChangeEvent;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateExperimentRequest {
    pub experiment: Experiment,
    pub metadata: MetadataMap,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListExperimentsRequest {
    pub namespace: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GetExperimentRequest {
    pub id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateModelRequest {
    pub model: Model,
    pub metadata: MetadataMap,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListModelsRequest {
    pub namespace: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GetModelRequest {
    pub id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateModelVersionRequest {
    pub version: ModelVersion,
    pub metadata: MetadataMap,
    pub files: Vec<File>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListModelVersionsRequest {
    pub model_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GetModelVersionRequest {
    pub id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateCheckpointRequest {
    pub checkpoint: Checkpoint,
    pub files: Vec<File>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListCheckpointsRequest {
    pub experiment_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GetCheckpointRequest {
    pub id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GetCheckpointResponse {
    pub checkpoint: Checkpoint,
    pub files: Vec<File>,
}

/// First frame of the `UploadFile` client stream.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadMetadataFrame {
    pub parent_id: String,
    pub file_type: modelbox_domain::FileType,
    pub checksum: String,
}

/// Subsequent frames of the `UploadFile` client stream.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadChunkFrame {
    pub chunk: Vec<u8>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadFileResponse {
    pub file_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DownloadFileRequest {
    pub file_id: String,
}

/// First frame of the `DownloadFile` server stream.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DownloadMetadataFrame {
    pub file: File,
}

/// Subsequent frames of the `DownloadFile` server stream, each at most
/// `modelbox_core::constants::DOWNLOAD_CHUNK_SIZE` bytes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DownloadChunkFrame {
    pub chunk: Vec<u8>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackArtifactsRequest {
    pub files: Vec<File>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackArtifactsResponse {
    pub file_ids: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListArtifactsRequest {
    pub parent_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateMetadataRequest {
    pub parent_id: String,
    pub updates: BTreeMap<String, MetadataValue>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListMetadataRequest {
    pub parent_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogMetricsRequest {
    pub parent_id: String,
    pub key: String,
    pub points: Vec<MetricPoint>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GetMetricsRequest {
    pub parent_id: String,
    pub key: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEventRequest {
    pub event: Event,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListEventsRequest {
    pub parent_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateActionsRequest {
    pub actions: Vec<Action>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateActionsResponse {
    pub action_ids: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListActionsRequest {
    pub action_ids: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListActionsResponse {
    pub actions: Vec<(Action, Vec<ActionInstance>)>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListChangesRequest {
    pub namespace: String,
    pub since: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WatchNamespaceRequest {
    pub namespace: String,
}

pub use modelbox_domain::change_event::ChangeEvent as ChangeEventFrame;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClusterMembersResponse {
    pub members: Vec<ClusterMember>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterAgentRequest {
    pub agent: Agent,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterAgentResponse {
    pub agent_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HeartbeatRequest {
    pub agent_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GetRunnableActionInstancesRequest {
    pub arch: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GetRunnableActionInstancesResponse {
    pub instances: Vec<ActionInstance>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateActionStatusRequest {
    pub instance_id: String,
    pub status: Status,
    pub outcome: Outcome,
    pub outcome_reason: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateActionStatusResponse {
    pub updated: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateTriggerRequest {
    pub parent_id: String,
    pub trigger: Trigger,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GetTriggersRequest {
    pub parent_id: String,
}

// Re-exported so downstream crates don't need to depend on modelbox-domain
// just to name the change-event frame type `WatchNamespace` streams.
pub type WatchNamespaceFrame = ChangeEvent;
