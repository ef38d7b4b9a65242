use std::collections::BTreeMap;

use modelbox_core::MetadataStore;
use modelbox_domain::change_event::EventType;
use modelbox_domain::{
    Action, ActionInstance, Checkpoint, Experiment, File, FileType, Framework, Model, ModelVersion,
    Outcome, Status, Trigger,
};
use modelbox_persistence::EmbeddedKvMetadataStore;

fn store() -> EmbeddedKvMetadataStore {
    let dir = tempfile::tempdir().expect("tempdir");
    EmbeddedKvMetadataStore::open(dir.path().join("modelbox.sled")).expect("open embedded store")
}

#[tokio::test]
async fn creating_the_same_experiment_twice_is_idempotent() {
    let store = store();
    let exp = Experiment::new("run-1", "alice", "ns", "ext-1", Framework::Pytorch, 100);

    let first = store
        .create_experiment(exp.clone(), BTreeMap::new())
        .await
        .unwrap();
    assert!(!first.exists);

    let second = store
        .create_experiment(exp.clone(), BTreeMap::new())
        .await
        .unwrap();
    assert!(second.exists);
    assert_eq!(first.id, second.id);

    let listed = store.list_experiments("ns").await.unwrap();
    assert_eq!(listed.len(), 1);
}

#[tokio::test]
async fn checkpoints_list_in_epoch_order() {
    let store = store();
    let exp = Experiment::new("run-2", "alice", "ns", "ext-2", Framework::Pytorch, 100);
    store.create_experiment(exp.clone(), BTreeMap::new()).await.unwrap();

    for epoch in [3u64, 1, 2] {
        let ckpt = Checkpoint::new(exp.id.clone(), epoch, BTreeMap::new(), 100 + epoch);
        store.create_checkpoint(ckpt, vec![]).await.unwrap();
    }

    let listed = store.list_checkpoints(&exp.id).await.unwrap();
    let epochs: Vec<u64> = listed.iter().map(|c| c.epoch).collect();
    assert_eq!(epochs, vec![1, 2, 3]);
}

#[tokio::test]
async fn duplicate_file_upload_is_reported_as_existing_not_an_error() {
    let store = store();
    let file = File::new("parent-1", FileType::Checkpoint, "deadbeef", "/tmp/x", 100);

    let results = store.write_files(vec![file.clone(), file.clone()]).await.unwrap();
    assert_eq!(results.len(), 2);
    assert!(!results[0].exists);
    assert!(results[1].exists);
    assert_eq!(results[0].id, results[1].id);
}

#[tokio::test]
async fn model_version_created_event_carries_the_parent_models_namespace() {
    let store = store();
    let model = Model::new("ocr-net", "alice", "vision", "classification", "", 100);
    store.create_model(model.clone(), BTreeMap::new()).await.unwrap();

    let version = ModelVersion::new("v1", model.id.clone(), "1", "", "pytorch", vec![], 200);
    store
        .create_model_version(version.clone(), BTreeMap::new(), vec![])
        .await
        .unwrap();

    let changes = store.list_changes("vision", 0).await.unwrap();
    let version_event = changes
        .iter()
        .find(|c| c.object_id == version.id)
        .expect("model_version_created event visible on the parent model's namespace");
    assert_eq!(version_event.event_type, EventType::ModelVersionCreated);
    assert_eq!(version_event.namespace, "vision");
}

#[tokio::test]
async fn action_instance_lifecycle_is_monotone_and_logged() {
    let store = store();
    let exp = Experiment::new("run-3", "alice", "ns", "ext-3", Framework::Pytorch, 100);
    store.create_experiment(exp.clone(), BTreeMap::new()).await.unwrap();

    let action = Action::new(
        "export",
        exp.id.clone(),
        "cpu",
        Trigger::script("true"),
        BTreeMap::new(),
        100,
    );
    store.create_action(action.clone()).await.unwrap();

    let unprocessed = store.get_unprocessed_change_events().await.unwrap();
    let trigger_event = unprocessed
        .iter()
        .find(|e| e.object_id == exp.id)
        .expect("experiment_created event present");

    let instance = ActionInstance::new(action.id.clone(), 0, 200);
    store
        .create_action_instance(instance.clone(), trigger_event.mutation_id, 200)
        .await
        .unwrap();

    let (_, instances) = store.get_action(&action.id).await.unwrap();
    assert_eq!(instances.len(), 1);
    assert_eq!(instances[0].status, Status::Pending);

    let advanced = store
        .update_action_instance(&instance.id, Status::Running, Outcome::Unknown, "", 210)
        .await
        .unwrap();
    assert!(advanced);

    let stale = store
        .update_action_instance(&instance.id, Status::Pending, Outcome::Unknown, "", 220)
        .await
        .unwrap();
    assert!(!stale);

    let finished = store
        .update_action_instance(&instance.id, Status::Finished, Outcome::Success, "done", 230)
        .await
        .unwrap();
    assert!(finished);

    let (_, instances) = store.get_action(&action.id).await.unwrap();
    assert_eq!(instances[0].status, Status::Finished);
    assert_eq!(instances[0].outcome, Outcome::Success);

    // action/action-instance ChangeEvents carry no namespace of their own
    // (neither entity has one), so they land under "". `list_changes`
    // returns them in ascending mutation_id order, so this also confirms
    // the stale `Pending` update above wrote no event of its own.
    let logged = store.list_changes("", 0).await.unwrap();
    let types: Vec<EventType> = logged.iter().map(|c| c.event_type).collect();
    assert_eq!(
        types,
        vec![
            EventType::ActionCreated,
            EventType::ActionInstanceCreated,
            EventType::ActionInstanceRunning,
            EventType::ActionInstanceSuccess,
        ]
    );
}

#[tokio::test]
async fn agent_past_stale_threshold_is_reported_dead() {
    let store = store();
    let agent = modelbox_domain::Agent::new("worker-1", "host-1", "10.0.0.1", "cpu", vec![]);
    store.register_agent(agent.clone(), 1_000).await.unwrap();

    let dead = store.get_dead_agents(1_100, 60).await.unwrap();
    assert!(dead.iter().any(|a| a.id == agent.id));

    store.heartbeat(&agent.id, 1_090).await.unwrap();
    let dead = store.get_dead_agents(1_100, 60).await.unwrap();
    assert!(!dead.iter().any(|a| a.id == agent.id));
}
