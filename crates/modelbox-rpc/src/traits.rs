//! `ModelStore` (public) and `ModelBoxAdmin` (agent) service seams.
//!
//! `spec.md`'s Non-goals place ".proto generation" (the code-generation
//! step `tonic-build` would normally run) out of scope; what is in scope
//! is the seam itself: these are plain `async_trait` service traits over
//! the DTOs in `dto`, using `tonic::Status` for the error-to-RPC-status
//! mapping §7 requires. A real deployment wires a generated `tonic`
//! service trait to these same methods; nothing here depends on codegen.

use async_trait::async_trait;
use futures::stream::BoxStream;
use tonic::Status;

use crate::dto::*;

#[async_trait]
pub trait ModelStoreService: Send + Sync {
    async fn create_experiment(&self, req: CreateExperimentRequest) -> Result<CreateResultDto, Status>;
    async fn list_experiments(&self, req: ListExperimentsRequest) -> Result<Vec<modelbox_domain::Experiment>, Status>;
    async fn get_experiment(&self, req: GetExperimentRequest) -> Result<modelbox_domain::Experiment, Status>;

    async fn create_model(&self, req: CreateModelRequest) -> Result<CreateResultDto, Status>;
    async fn list_models(&self, req: ListModelsRequest) -> Result<Vec<modelbox_domain::Model>, Status>;
    async fn get_model(&self, req: GetModelRequest) -> Result<modelbox_domain::Model, Status>;

    async fn create_model_version(&self, req: CreateModelVersionRequest) -> Result<CreateResultDto, Status>;
    async fn list_model_versions(
        &self,
        req: ListModelVersionsRequest,
    ) -> Result<Vec<modelbox_domain::ModelVersion>, Status>;
    async fn get_model_version(&self, req: GetModelVersionRequest) -> Result<modelbox_domain::ModelVersion, Status>;

    async fn create_checkpoint(&self, req: CreateCheckpointRequest) -> Result<CreateResultDto, Status>;
    async fn list_checkpoints(&self, req: ListCheckpointsRequest) -> Result<Vec<modelbox_domain::Checkpoint>, Status>;
    async fn get_checkpoint(&self, req: GetCheckpointRequest) -> Result<GetCheckpointResponse, Status>;

    /// Begins an upload session: validates the first (metadata) frame and
    /// returns a handle the caller drives with `write_upload_chunk` then
    /// `finish_upload`. Modeling the client-streaming RPC as three calls
    /// (rather than taking an actual `Stream`) keeps this trait
    /// transport-agnostic; a `tonic`-generated server wires its inbound
    /// stream to exactly this sequence.
    async fn begin_upload(&self, metadata: UploadMetadataFrame, now: u64) -> Result<UploadHandle, Status>;
    async fn write_upload_chunk(&self, handle: &mut UploadHandle, frame: UploadChunkFrame) -> Result<(), Status>;
    async fn finish_upload(&self, handle: UploadHandle) -> Result<UploadFileResponse, Status>;

    /// Begins a download session, returning the handle plus the metadata
    /// frame that must be sent first. The caller then drives
    /// `next_download_chunk` until it returns `None`, mirroring the
    /// server-streaming RPC's `metadata, chunk*` frame layout.
    async fn begin_download(&self, req: DownloadFileRequest) -> Result<(DownloadHandle, DownloadMetadataFrame), Status>;
    async fn next_download_chunk(&self, handle: &mut DownloadHandle) -> Result<Option<DownloadChunkFrame>, Status>;

    async fn track_artifacts(&self, req: TrackArtifactsRequest) -> Result<TrackArtifactsResponse, Status>;
    async fn list_artifacts(&self, req: ListArtifactsRequest) -> Result<Vec<modelbox_domain::File>, Status>;

    async fn update_metadata(&self, req: UpdateMetadataRequest) -> Result<(), Status>;
    async fn list_metadata(&self, req: ListMetadataRequest) -> Result<modelbox_domain::MetadataMap, Status>;

    async fn log_metrics(&self, req: LogMetricsRequest) -> Result<(), Status>;
    async fn get_metrics(&self, req: GetMetricsRequest) -> Result<Vec<modelbox_core::MetricPoint>, Status>;

    async fn log_event(&self, req: LogEventRequest) -> Result<(), Status>;
    async fn list_events(&self, req: ListEventsRequest) -> Result<Vec<modelbox_domain::Event>, Status>;

    async fn create_actions(&self, req: CreateActionsRequest) -> Result<CreateActionsResponse, Status>;
    async fn list_actions(&self, req: ListActionsRequest) -> Result<ListActionsResponse, Status>;

    async fn get_cluster_members(&self) -> Result<ClusterMembersResponse, Status>;

    async fn create_trigger(&self, req: CreateTriggerRequest) -> Result<(), Status>;
    async fn get_triggers(&self, req: GetTriggersRequest) -> Result<Vec<modelbox_domain::Trigger>, Status>;

    /// Server-streaming: pushes the namespace's change events every
    /// `modelbox_core::constants::WATCH_NAMESPACE_PUSH_INTERVAL`, polling
    /// `ListChanges` with `since` advanced to the latest `mutation_time`
    /// seen on the previous tick.
    fn watch_namespace(&self, req: WatchNamespaceRequest) -> BoxStream<'static, Result<WatchNamespaceFrame, Status>>;
}

#[async_trait]
pub trait ModelBoxAdminService: Send + Sync {
    async fn register_agent(&self, req: RegisterAgentRequest) -> Result<RegisterAgentResponse, Status>;
    async fn heartbeat(&self, req: HeartbeatRequest, now: u64) -> Result<(), Status>;
    async fn get_runnable_action_instances(
        &self,
        req: GetRunnableActionInstancesRequest,
    ) -> Result<GetRunnableActionInstancesResponse, Status>;
    async fn update_action_status(
        &self,
        req: UpdateActionStatusRequest,
        now: u64,
    ) -> Result<UpdateActionStatusResponse, Status>;
}

/// Result of any idempotent create, as seen over the wire (mirrors
/// `modelbox_core::CreateResult` without requiring RPC callers to depend
/// on `modelbox-core`).
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct CreateResultDto {
    pub id: String,
    pub exists: bool,
}

impl From<modelbox_core::CreateResult> for CreateResultDto {
    fn from(r: modelbox_core::CreateResult) -> Self {
        Self { id: r.id, exists: r.exists }
    }
}

/// Opaque handle threaded through the upload call sequence; holds the
/// in-flight `ArtifactPipeline` session.
pub struct UploadHandle {
    pub(crate) session: modelbox_blobstore::UploadSession,
}

/// Opaque handle threaded through the download call sequence.
pub struct DownloadHandle {
    pub(crate) session: modelbox_blobstore::DownloadSession,
}
