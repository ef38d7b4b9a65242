//! The `ModelStore` service: a thin pass-through from wire DTOs to
//! `MetadataStore`/`BlobStore`/`MetricsLogger`/`ClusterMembership`, mapping
//! `ModelBoxError` to `tonic::Status` at the boundary. Most handlers are a
//! single store call because the DTOs already carry fully-formed
//! `modelbox-domain` entities (see `dto`'s module doc) — the interesting
//! logic (upload/download session handling, the watch poll loop) lives
//! where the protocol actually has state.

use std::sync::Arc;

use async_trait::async_trait;
use futures::stream::{self, BoxStream, StreamExt};
use tonic::Status;

use modelbox_core::{now_epoch, BlobStore, ClusterMembership, MetadataStore, MetricsLogger};
use modelbox_blobstore::{ArtifactPipeline, UploadRequest};

use crate::dto::*;
use crate::error_map::to_status;
use crate::traits::{CreateResultDto, DownloadHandle, ModelStoreService, UploadHandle};

/// Holds the four capability traits as trait objects rather than generic
/// parameters: the concrete backend is chosen once at startup from
/// `ServerConfig`, and a 4-way generic product over backend choices buys
/// nothing a `dyn` seam doesn't already give us (mirrors the original's use
/// of plain interfaces for this wiring).
pub struct ModelStore {
    metadata: Arc<dyn MetadataStore>,
    pipeline: ArtifactPipeline,
    metrics: Arc<dyn MetricsLogger>,
    membership: Arc<dyn ClusterMembership>,
}

impl ModelStore {
    pub fn new(
        metadata: Arc<dyn MetadataStore>,
        blobs: Arc<dyn BlobStore>,
        metrics: Arc<dyn MetricsLogger>,
        membership: Arc<dyn ClusterMembership>,
    ) -> Self {
        let pipeline = ArtifactPipeline::new(metadata.clone(), blobs);
        Self {
            metadata,
            pipeline,
            metrics,
            membership,
        }
    }
}

#[async_trait]
impl ModelStoreService for ModelStore {
    async fn create_experiment(&self, req: CreateExperimentRequest) -> Result<CreateResultDto, Status> {
        self.metadata
            .create_experiment(req.experiment, req.metadata)
            .await
            .map(CreateResultDto::from)
            .map_err(to_status)
    }

    async fn list_experiments(&self, req: ListExperimentsRequest) -> Result<Vec<modelbox_domain::Experiment>, Status> {
        self.metadata.list_experiments(&req.namespace).await.map_err(to_status)
    }

    async fn get_experiment(&self, req: GetExperimentRequest) -> Result<modelbox_domain::Experiment, Status> {
        self.metadata.get_experiment(&req.id).await.map_err(to_status)
    }

    async fn create_model(&self, req: CreateModelRequest) -> Result<CreateResultDto, Status> {
        self.metadata
            .create_model(req.model, req.metadata)
            .await
            .map(CreateResultDto::from)
            .map_err(to_status)
    }

    async fn list_models(&self, req: ListModelsRequest) -> Result<Vec<modelbox_domain::Model>, Status> {
        self.metadata.list_models(&req.namespace).await.map_err(to_status)
    }

    async fn get_model(&self, req: GetModelRequest) -> Result<modelbox_domain::Model, Status> {
        self.metadata.get_model(&req.id).await.map_err(to_status)
    }

    async fn create_model_version(&self, req: CreateModelVersionRequest) -> Result<CreateResultDto, Status> {
        self.metadata
            .create_model_version(req.version, req.metadata, req.files)
            .await
            .map(CreateResultDto::from)
            .map_err(to_status)
    }

    async fn get_model_version(&self, req: GetModelVersionRequest) -> Result<modelbox_domain::ModelVersion, Status> {
        self.metadata.get_model_version(&req.id).await.map_err(to_status)
    }

    async fn list_model_versions(
        &self,
        req: ListModelVersionsRequest,
    ) -> Result<Vec<modelbox_domain::ModelVersion>, Status> {
        self.metadata.list_model_versions(&req.model_id).await.map_err(to_status)
    }

    async fn create_checkpoint(&self, req: CreateCheckpointRequest) -> Result<CreateResultDto, Status> {
        self.metadata
            .create_checkpoint(req.checkpoint, req.files)
            .await
            .map(CreateResultDto::from)
            .map_err(to_status)
    }

    async fn list_checkpoints(&self, req: ListCheckpointsRequest) -> Result<Vec<modelbox_domain::Checkpoint>, Status> {
        self.metadata.list_checkpoints(&req.experiment_id).await.map_err(to_status)
    }

    async fn get_checkpoint(&self, req: GetCheckpointRequest) -> Result<GetCheckpointResponse, Status> {
        let (checkpoint, files) = self.metadata.get_checkpoint(&req.id).await.map_err(to_status)?;
        Ok(GetCheckpointResponse { checkpoint, files })
    }

    async fn begin_upload(&self, metadata: UploadMetadataFrame, now: u64) -> Result<UploadHandle, Status> {
        let session = self
            .pipeline
            .begin_upload(UploadRequest {
                parent_id: metadata.parent_id,
                file_type: metadata.file_type,
                checksum: metadata.checksum,
                now,
            })
            .await
            .map_err(to_status)?;
        Ok(UploadHandle { session })
    }

    async fn write_upload_chunk(&self, handle: &mut UploadHandle, frame: UploadChunkFrame) -> Result<(), Status> {
        handle.session.write_chunk(&frame.chunk).await.map_err(to_status)
    }

    async fn finish_upload(&self, handle: UploadHandle) -> Result<UploadFileResponse, Status> {
        let file_id = handle.session.finish().await.map_err(to_status)?;
        Ok(UploadFileResponse { file_id })
    }

    async fn begin_download(&self, req: DownloadFileRequest) -> Result<(DownloadHandle, DownloadMetadataFrame), Status> {
        let session = self.pipeline.begin_download(&req.file_id).await.map_err(to_status)?;
        let frame = DownloadMetadataFrame { file: session.file.clone() };
        Ok((DownloadHandle { session }, frame))
    }

    async fn next_download_chunk(&self, handle: &mut DownloadHandle) -> Result<Option<DownloadChunkFrame>, Status> {
        let chunk = handle.session.next_chunk().await.map_err(to_status)?;
        Ok(chunk.map(|chunk| DownloadChunkFrame { chunk }))
    }

    async fn track_artifacts(&self, req: TrackArtifactsRequest) -> Result<TrackArtifactsResponse, Status> {
        let results = self.metadata.write_files(req.files).await.map_err(to_status)?;
        Ok(TrackArtifactsResponse {
            file_ids: results.into_iter().map(|r| r.id).collect(),
        })
    }

    async fn list_artifacts(&self, req: ListArtifactsRequest) -> Result<Vec<modelbox_domain::File>, Status> {
        self.metadata.get_files(&req.parent_id).await.map_err(to_status)
    }

    async fn update_metadata(&self, req: UpdateMetadataRequest) -> Result<(), Status> {
        self.metadata.update_metadata(&req.parent_id, req.updates).await.map_err(to_status)
    }

    async fn list_metadata(&self, req: ListMetadataRequest) -> Result<modelbox_domain::MetadataMap, Status> {
        self.metadata.list_metadata(&req.parent_id).await.map_err(to_status)
    }

    async fn log_metrics(&self, req: LogMetricsRequest) -> Result<(), Status> {
        self.metrics.log_metrics(&req.parent_id, &req.key, req.points).await.map_err(to_status)
    }

    async fn get_metrics(&self, req: GetMetricsRequest) -> Result<Vec<modelbox_core::MetricPoint>, Status> {
        self.metrics.get_metrics(&req.parent_id, &req.key).await.map_err(to_status)
    }

    async fn log_event(&self, req: LogEventRequest) -> Result<(), Status> {
        self.metadata.log_event(req.event).await.map_err(to_status)
    }

    async fn list_events(&self, req: ListEventsRequest) -> Result<Vec<modelbox_domain::Event>, Status> {
        self.metadata.list_events(&req.parent_id).await.map_err(to_status)
    }

    async fn create_actions(&self, req: CreateActionsRequest) -> Result<CreateActionsResponse, Status> {
        let mut action_ids = Vec::with_capacity(req.actions.len());
        for action in req.actions {
            let result = self.metadata.create_action(action).await.map_err(to_status)?;
            action_ids.push(result.id);
        }
        Ok(CreateActionsResponse { action_ids })
    }

    async fn list_actions(&self, req: ListActionsRequest) -> Result<ListActionsResponse, Status> {
        let actions = self.metadata.list_actions(&req.action_ids).await.map_err(to_status)?;
        Ok(ListActionsResponse { actions })
    }

    async fn get_cluster_members(&self) -> Result<ClusterMembersResponse, Status> {
        let members = self.membership.get_members().await.map_err(to_status)?;
        Ok(ClusterMembersResponse { members })
    }

    async fn create_trigger(&self, req: CreateTriggerRequest) -> Result<(), Status> {
        self.metadata.create_trigger(&req.parent_id, req.trigger).await.map_err(to_status)
    }

    async fn get_triggers(&self, req: GetTriggersRequest) -> Result<Vec<modelbox_domain::Trigger>, Status> {
        self.metadata.get_triggers(&req.parent_id).await.map_err(to_status)
    }

    fn watch_namespace(&self, req: WatchNamespaceRequest) -> BoxStream<'static, Result<WatchNamespaceFrame, Status>> {
        let metadata = self.metadata.clone();
        let namespace = req.namespace;
        let interval = modelbox_core::constants::WATCH_NAMESPACE_PUSH_INTERVAL;

        let initial_since = now_epoch();
        stream::unfold((metadata, namespace, initial_since), move |(metadata, namespace, since)| {
            let interval = interval;
            async move {
                tokio::time::sleep(interval).await;
                match metadata.list_changes(&namespace, since).await {
                    Ok(changes) => {
                        let next_since = changes.iter().map(|c| c.mutation_time).max().unwrap_or(since).max(since);
                        let items: Vec<Result<WatchNamespaceFrame, Status>> = changes.into_iter().map(Ok).collect();
                        Some((stream::iter(items), (metadata, namespace, next_since)))
                    }
                    Err(e) => {
                        let err = stream::iter(vec![Err(to_status(e))]);
                        Some((err, (metadata, namespace, since)))
                    }
                }
            }
        })
        .flatten()
        .boxed()
    }
}
