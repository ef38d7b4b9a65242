//! In-process `modelbox client` handlers: each builds the same
//! `ModelStore`/`ModelBoxAdmin` the agent would serve (see the module doc
//! on `agent.rs`) against the config file and calls straight through.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

use modelbox_core::MetricPoint;
use modelbox_domain::{ClusterMember, Event, MetadataValue, Trigger};
use modelbox_rpc::dto::*;
use modelbox_rpc::{ModelStore, ModelStoreService};

use crate::cli::*;
use crate::wiring;

async fn build_model_store(config_path: &PathBuf) -> anyhow::Result<ModelStore> {
    let config = crate::load_config(config_path)?;
    let metadata = wiring::build_metadata_store(&config)?;
    let blobs = wiring::build_blob_store(&config).await?;
    let metrics = wiring::build_metrics_logger(&config).await?;
    let self_member = ClusterMember::new("cli-client", &config.grpc_listen_addr, &config.http_listen_addr, 0);
    let membership = wiring::build_membership(&config, self_member)?;
    Ok(ModelStore::new(metadata, blobs, metrics, membership))
}

fn parse_framework(s: &str) -> modelbox_domain::Framework {
    serde_json::from_value(serde_json::Value::String(s.to_string())).unwrap_or_default()
}

fn parse_file_type(s: &str) -> anyhow::Result<modelbox_domain::FileType> {
    serde_json::from_value(serde_json::Value::String(s.to_string()))
        .map_err(|_| anyhow::anyhow!("unrecognized file type {s:?}"))
}

/// Bridges a plain JSON value (what a CLI user types) to the tagged
/// `MetadataValue` wire representation, which round-trips through its own
/// `{"type": ..., "value": ...}` shape rather than accepting bare JSON.
fn json_to_metadata_value(v: serde_json::Value) -> MetadataValue {
    match v {
        serde_json::Value::Null => MetadataValue::Null,
        serde_json::Value::Bool(b) => MetadataValue::Bool(b),
        serde_json::Value::Number(n) => MetadataValue::Number(n.as_f64().unwrap_or(0.0)),
        serde_json::Value::String(s) => MetadataValue::Str(s),
        serde_json::Value::Array(items) => MetadataValue::List(items.into_iter().map(json_to_metadata_value).collect()),
        serde_json::Value::Object(map) => {
            MetadataValue::Struct(map.into_iter().map(|(k, v)| (k, json_to_metadata_value(v))).collect())
        }
    }
}

fn parse_kv_pairs(entries: &[String]) -> BTreeMap<String, MetadataValue> {
    entries
        .iter()
        .filter_map(|e| e.split_once('='))
        .map(|(k, v)| (k.to_string(), MetadataValue::Str(v.to_string())))
        .collect()
}

fn print_json(value: &impl serde::Serialize) {
    match serde_json::to_string_pretty(value) {
        Ok(s) => println!("{s}"),
        Err(e) => eprintln!("unable to render response: {e}"),
    }
}

pub async fn run(config: PathBuf, command: ClientCommand) -> anyhow::Result<()> {
    let store = build_model_store(&config).await?;

    match command {
        ClientCommand::Experiment { command } => run_experiment(&store, command).await?,
        ClientCommand::Model { command } => run_model(&store, command).await?,
        ClientCommand::ModelVersion { command } => run_model_version(&store, command).await?,
        ClientCommand::Checkpoint { command } => run_checkpoint(&store, command).await?,
        ClientCommand::Artifact { command } => run_artifact(&store, command).await?,
        ClientCommand::Metadata { command } => run_metadata(&store, command).await?,
        ClientCommand::Metric { command } => run_metric(&store, command).await?,
        ClientCommand::Event { command } => run_event(&store, command).await?,
        ClientCommand::Action { command } => run_action(&store, command).await?,
        ClientCommand::Trigger { command } => run_trigger(&store, command).await?,
        ClientCommand::ClusterMembers => {
            let resp = store.get_cluster_members().await.map_err(to_anyhow)?;
            print_json(&resp.members);
        }
        ClientCommand::Watch { namespace } => {
            use futures::StreamExt;
            let mut stream = store.watch_namespace(WatchNamespaceRequest { namespace });
            println!("watching for changes, ctrl-c to stop");
            while let Some(frame) = stream.next().await {
                match frame {
                    Ok(event) => print_json(&event),
                    Err(status) => eprintln!("watch error: {status}"),
                }
            }
        }
    }
    Ok(())
}

fn to_anyhow(status: tonic::Status) -> anyhow::Error {
    anyhow::anyhow!("{status}")
}

async fn run_experiment(store: &ModelStore, command: ExperimentCommand) -> anyhow::Result<()> {
    match command {
        ExperimentCommand::Create { name, owner, namespace, external_id, framework } => {
            let now = modelbox_core::now_epoch();
            let experiment =
                modelbox_domain::Experiment::new(name, owner, namespace, external_id, parse_framework(&framework), now);
            let resp = store
                .create_experiment(CreateExperimentRequest { experiment, metadata: BTreeMap::new() })
                .await
                .map_err(to_anyhow)?;
            print_json(&resp);
        }
        ExperimentCommand::List { namespace } => {
            let resp = store.list_experiments(ListExperimentsRequest { namespace }).await.map_err(to_anyhow)?;
            print_json(&resp);
        }
        ExperimentCommand::Get { id } => {
            let resp = store.get_experiment(GetExperimentRequest { id }).await.map_err(to_anyhow)?;
            print_json(&resp);
        }
    }
    Ok(())
}

async fn run_model(store: &ModelStore, command: ModelCommand) -> anyhow::Result<()> {
    match command {
        ModelCommand::Create { name, owner, namespace, task, description } => {
            let now = modelbox_core::now_epoch();
            let model = modelbox_domain::Model::new(name, owner, namespace, task, description, now);
            let resp = store
                .create_model(CreateModelRequest { model, metadata: BTreeMap::new() })
                .await
                .map_err(to_anyhow)?;
            print_json(&resp);
        }
        ModelCommand::List { namespace } => {
            let resp = store.list_models(ListModelsRequest { namespace }).await.map_err(to_anyhow)?;
            print_json(&resp);
        }
        ModelCommand::Get { id } => {
            let resp = store.get_model(GetModelRequest { id }).await.map_err(to_anyhow)?;
            print_json(&resp);
        }
    }
    Ok(())
}

async fn run_model_version(store: &ModelStore, command: ModelVersionCommand) -> anyhow::Result<()> {
    match command {
        ModelVersionCommand::Create { model_id, version, name, description, framework, tags } => {
            let now = modelbox_core::now_epoch();
            let version = modelbox_domain::ModelVersion::new(name, model_id, version, description, framework, tags, now);
            let resp = store
                .create_model_version(CreateModelVersionRequest { version, metadata: BTreeMap::new(), files: vec![] })
                .await
                .map_err(to_anyhow)?;
            print_json(&resp);
        }
        ModelVersionCommand::List { model_id } => {
            let resp = store.list_model_versions(ListModelVersionsRequest { model_id }).await.map_err(to_anyhow)?;
            print_json(&resp);
        }
        ModelVersionCommand::Get { id } => {
            let resp = store.get_model_version(GetModelVersionRequest { id }).await.map_err(to_anyhow)?;
            print_json(&resp);
        }
    }
    Ok(())
}

async fn run_checkpoint(store: &ModelStore, command: CheckpointCommand) -> anyhow::Result<()> {
    match command {
        CheckpointCommand::Create { experiment_id, epoch, metrics } => {
            let now = modelbox_core::now_epoch();
            let parsed_metrics: BTreeMap<String, f32> = metrics
                .iter()
                .filter_map(|e| e.split_once('='))
                .filter_map(|(k, v)| v.parse::<f32>().ok().map(|v| (k.to_string(), v)))
                .collect();
            let checkpoint = modelbox_domain::Checkpoint::new(experiment_id, epoch, parsed_metrics, now);
            let resp = store
                .create_checkpoint(CreateCheckpointRequest { checkpoint, files: vec![] })
                .await
                .map_err(to_anyhow)?;
            print_json(&resp);
        }
        CheckpointCommand::List { experiment_id } => {
            let resp = store.list_checkpoints(ListCheckpointsRequest { experiment_id }).await.map_err(to_anyhow)?;
            print_json(&resp);
        }
        CheckpointCommand::Get { id } => {
            let resp = store.get_checkpoint(GetCheckpointRequest { id }).await.map_err(to_anyhow)?;
            print_json(&resp);
        }
    }
    Ok(())
}

async fn run_artifact(store: &ModelStore, command: ArtifactCommand) -> anyhow::Result<()> {
    match command {
        ArtifactCommand::Upload { parent_id, file_type, path } => {
            let bytes = tokio::fs::read(&path).await?;
            let checksum = modelbox_domain::ids::md5_hex(&bytes);
            let now = modelbox_core::now_epoch();
            let mut handle = store
                .begin_upload(UploadMetadataFrame { parent_id, file_type: parse_file_type(&file_type)?, checksum }, now)
                .await
                .map_err(to_anyhow)?;
            for chunk in bytes.chunks(modelbox_core::constants::DOWNLOAD_CHUNK_SIZE) {
                store
                    .write_upload_chunk(&mut handle, UploadChunkFrame { chunk: chunk.to_vec() })
                    .await
                    .map_err(to_anyhow)?;
            }
            let resp = store.finish_upload(handle).await.map_err(to_anyhow)?;
            print_json(&resp);
        }
        ArtifactCommand::Download { file_id, out } => {
            let (mut handle, metadata) = store.begin_download(DownloadFileRequest { file_id }).await.map_err(to_anyhow)?;
            let mut bytes = Vec::new();
            while let Some(frame) = store.next_download_chunk(&mut handle).await.map_err(to_anyhow)? {
                bytes.extend_from_slice(&frame.chunk);
            }
            tokio::fs::write(&out, &bytes).await?;
            print_json(&metadata.file);
        }
        ArtifactCommand::List { parent_id } => {
            let resp = store.list_artifacts(ListArtifactsRequest { parent_id }).await.map_err(to_anyhow)?;
            print_json(&resp);
        }
    }
    Ok(())
}

async fn run_metadata(store: &ModelStore, command: MetadataCommand) -> anyhow::Result<()> {
    match command {
        MetadataCommand::Set { parent_id, entries } => {
            let updates = parse_kv_pairs(&entries);
            store.update_metadata(UpdateMetadataRequest { parent_id, updates }).await.map_err(to_anyhow)?;
            println!("ok");
        }
        MetadataCommand::List { parent_id } => {
            let resp = store.list_metadata(ListMetadataRequest { parent_id }).await.map_err(to_anyhow)?;
            print_json(&resp);
        }
    }
    Ok(())
}

async fn run_metric(store: &ModelStore, command: MetricCommand) -> anyhow::Result<()> {
    match command {
        MetricCommand::Log { parent_id, key, points } => {
            let points: Vec<MetricPoint> = points
                .iter()
                .filter_map(|p| {
                    let mut parts = p.splitn(3, ':');
                    let step = parts.next()?.parse().ok()?;
                    let wallclock = parts.next()?.parse().ok()?;
                    let value = parts.next()?.parse().ok()?;
                    Some(MetricPoint { step, wallclock, value })
                })
                .collect();
            store.log_metrics(LogMetricsRequest { parent_id, key, points }).await.map_err(to_anyhow)?;
            println!("ok");
        }
        MetricCommand::Get { parent_id, key } => {
            let resp = store.get_metrics(GetMetricsRequest { parent_id, key }).await.map_err(to_anyhow)?;
            print_json(&resp);
        }
    }
    Ok(())
}

async fn run_event(store: &ModelStore, command: EventCommand) -> anyhow::Result<()> {
    match command {
        EventCommand::Log { parent_id, name, source, metadata } => {
            let now = modelbox_core::now_epoch();
            let event = Event::new(parent_id, name, source, now, parse_kv_pairs(&metadata));
            store.log_event(LogEventRequest { event }).await.map_err(to_anyhow)?;
            println!("ok");
        }
        EventCommand::List { parent_id } => {
            let resp = store.list_events(ListEventsRequest { parent_id }).await.map_err(to_anyhow)?;
            print_json(&resp);
        }
    }
    Ok(())
}

async fn run_action(store: &ModelStore, command: ActionCommand) -> anyhow::Result<()> {
    match command {
        ActionCommand::Create { name, parent_id, arch, trigger_payload, params_json } => {
            let now = modelbox_core::now_epoch();
            let params_value: serde_json::Value = serde_json::from_str(&params_json)?;
            let params = match json_to_metadata_value(params_value) {
                MetadataValue::Struct(map) => map,
                other => BTreeMap::from([("value".to_string(), other)]),
            };
            let action = modelbox_domain::Action::new(name, parent_id, arch, Trigger::script(trigger_payload), params, now);
            let resp = store.create_actions(CreateActionsRequest { actions: vec![action] }).await.map_err(to_anyhow)?;
            print_json(&resp);
        }
        ActionCommand::List { ids } => {
            let action_ids = ids.split(',').map(|s| s.trim().to_string()).filter(|s| !s.is_empty()).collect();
            let resp = store.list_actions(ListActionsRequest { action_ids }).await.map_err(to_anyhow)?;
            print_json(&resp.actions);
        }
    }
    Ok(())
}

async fn run_trigger(store: &ModelStore, command: TriggerCommand) -> anyhow::Result<()> {
    match command {
        TriggerCommand::Create { parent_id, payload } => {
            store
                .create_trigger(CreateTriggerRequest { parent_id, trigger: Trigger::script(payload) })
                .await
                .map_err(to_anyhow)?;
            println!("ok");
        }
        TriggerCommand::List { parent_id } => {
            let resp = store.get_triggers(GetTriggersRequest { parent_id }).await.map_err(to_anyhow)?;
            print_json(&resp);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_to_metadata_value_recurses_through_arrays_and_objects() {
        let v = serde_json::json!({
            "lr": 0.01,
            "tags": ["a", "b"],
            "enabled": true,
            "note": null,
        });
        let converted = json_to_metadata_value(v);
        match converted {
            MetadataValue::Struct(map) => {
                assert_eq!(map.get("lr"), Some(&MetadataValue::Number(0.01)));
                assert_eq!(
                    map.get("tags"),
                    Some(&MetadataValue::List(vec![
                        MetadataValue::Str("a".to_string()),
                        MetadataValue::Str("b".to_string()),
                    ]))
                );
                assert_eq!(map.get("enabled"), Some(&MetadataValue::Bool(true)));
                assert_eq!(map.get("note"), Some(&MetadataValue::Null));
            }
            other => panic!("expected a Struct, got {other:?}"),
        }
    }

    #[test]
    fn parse_kv_pairs_drops_entries_with_no_equals_sign() {
        let parsed = parse_kv_pairs(&["a=1".to_string(), "malformed".to_string(), "b=2".to_string()]);
        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed.get("a"), Some(&MetadataValue::Str("1".to_string())));
        assert_eq!(parsed.get("b"), Some(&MetadataValue::Str("2".to_string())));
    }

    #[test]
    fn parse_framework_falls_back_to_default_on_an_unknown_name() {
        assert_eq!(parse_framework("pytorch"), modelbox_domain::Framework::Pytorch);
        assert_eq!(parse_framework("not-a-framework"), modelbox_domain::Framework::default());
    }

    #[tokio::test]
    async fn run_dispatches_an_experiment_create_against_the_configured_backend() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = modelbox_core::ServerConfig::default();
        config.filesystem = Some(modelbox_core::config::FilesystemArtifactConfig {
            base_dir: dir.path().join("blobs").to_string_lossy().into_owned(),
        });
        let config_path = dir.path().join("modelbox.toml");
        std::fs::write(&config_path, toml::to_string_pretty(&config).unwrap()).unwrap();

        let command = ClientCommand::Experiment {
            command: ExperimentCommand::Create {
                name: "exp-1".to_string(),
                owner: "alice".to_string(),
                namespace: "default".to_string(),
                external_id: "ext-1".to_string(),
                framework: "pytorch".to_string(),
            },
        };
        run(config_path, command).await.unwrap();
    }
}
