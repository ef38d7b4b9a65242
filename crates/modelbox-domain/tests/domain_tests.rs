use modelbox_domain::action_instance::{ActionInstance, Outcome, Status};
use modelbox_domain::{
    Action, Checkpoint, Experiment, File, FileType, Framework, MetadataRow, MetadataValue, Trigger,
};
use std::collections::BTreeMap;

#[test]
fn experiment_identity_is_stable_across_reconstruction() {
    let e1 = Experiment::new("ocr", "alice", "vision", "", Framework::Unknown, 100);
    let e2 = Experiment::new("ocr", "bob", "vision", "ext-1", Framework::Pytorch, 200);

    // same (name, namespace) => same id, regardless of the other fields.
    assert_eq!(e1.id, e2.id);
    assert_eq!(e1.id, Experiment::derive_id("ocr", "vision"));
}

#[test]
fn checkpoint_identity_is_keyed_by_experiment_and_epoch() {
    let mut metrics = BTreeMap::new();
    metrics.insert("loss".to_string(), 0.5_f32);
    let c1 = Checkpoint::new("exp-1", 1, metrics.clone(), 10);
    let c2 = Checkpoint::new("exp-1", 1, BTreeMap::new(), 20);
    let c3 = Checkpoint::new("exp-1", 2, metrics, 10);

    assert_eq!(c1.id, c2.id);
    assert_ne!(c1.id, c3.id);
}

#[test]
fn file_identity_collapses_duplicate_uploads() {
    let f1 = File::new("exp-x", FileType::Checkpoint, "abc123", "/tmp/exp-x/abc123", 1);
    let f2 = File::new("exp-x", FileType::Checkpoint, "abc123", "/other/path", 2);

    // Same (parent, type, checksum) is the same file row even with a
    // different recorded path or timestamp.
    assert_eq!(f1.id, f2.id);

    let f3 = File::new("exp-x", FileType::Model, "abc123", "/tmp/exp-x/abc123", 1);
    assert_ne!(f1.id, f3.id);
}

#[test]
fn metadata_row_id_upserts_by_parent_and_key() {
    let m1 = MetadataRow::new("exp-1", "accuracy", MetadataValue::Number(0.9));
    let m2 = MetadataRow::new("exp-1", "accuracy", MetadataValue::Number(0.95));

    assert_eq!(m1.id, m2.id);
}

#[test]
fn action_identity_folds_in_trigger_and_params() {
    let mut params = BTreeMap::new();
    params.insert("bits".to_string(), MetadataValue::Number(8.0));

    let a1 = Action::new(
        "quantize",
        "m1",
        "x86",
        Trigger::script("return 'quantize'"),
        params.clone(),
        1,
    );
    let a2 = Action::new(
        "quantize",
        "m1",
        "x86",
        Trigger::script("return 'different'"),
        params,
        1,
    );

    assert_ne!(a1.id, a2.id);
}

#[test]
fn action_instance_status_is_monotone() {
    let mut instance = ActionInstance::new("action-1", 0, 10);
    assert_eq!(instance.status, Status::Pending);

    assert!(instance.apply_update(Status::Running, Outcome::Unknown, "", 11));
    assert_eq!(instance.finished_at, 0);

    assert!(instance.apply_update(Status::Finished, Outcome::Success, "ok", 12));
    assert_eq!(instance.finished_at, 12);

    // Re-applying the same (or an older) status is rejected.
    assert!(!instance.apply_update(Status::Finished, Outcome::Success, "ok", 13));
    assert!(!instance.apply_update(Status::Pending, Outcome::Unknown, "", 14));
    assert_eq!(instance.updated_at, 12);
}

#[test]
fn action_instance_allows_direct_pending_to_finished() {
    let mut instance = ActionInstance::new("action-2", 0, 10);
    assert!(instance.apply_update(Status::Finished, Outcome::Failure, "crashed", 11));
    assert_eq!(instance.outcome, Outcome::Failure);
    assert_eq!(instance.finished_at, 11);
}
