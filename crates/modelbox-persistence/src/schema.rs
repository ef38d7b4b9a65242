//! Diesel schema (hand-written, mirroring `diesel print-schema` output) for
//! every SQL-backed table named in the persisted-state section:
//! `experiments`, `checkpoints`, `models`, `model_versions`, `blobs`,
//! `metadata`, `mutation_events`, `events`, `actions`, `action_instances`,
//! `agents`, `cluster_members`, plus a `triggers` table the distilled
//! interface implies but never names a schema for.
//!
//! JSON-shaped columns (`metrics`, `unique_tags`, `value`, `payload`,
//! `metadata`, `params`, `actions`) are declared `Text` rather than a
//! native JSON column type: Postgres, MySQL and SQLite disagree on JSON
//! column support and query syntax, and the store only ever round-trips
//! these as opaque `serde_json::Value` blobs, never queries inside them.
//! A portable `TEXT` column holding the canonical JSON string sidesteps
//! that disagreement entirely.

diesel::table! {
    experiments (id) {
        id -> Text,
        name -> Text,
        owner -> Text,
        namespace -> Text,
        external_id -> Text,
        framework -> Text,
        created_at -> BigInt,
        updated_at -> BigInt,
    }
}

diesel::table! {
    checkpoints (id) {
        id -> Text,
        experiment_id -> Text,
        epoch -> BigInt,
        metrics -> Text,
        created_at -> BigInt,
        updated_at -> BigInt,
    }
}

diesel::table! {
    models (id) {
        id -> Text,
        name -> Text,
        owner -> Text,
        namespace -> Text,
        task -> Text,
        description -> Text,
        created_at -> BigInt,
        updated_at -> BigInt,
    }
}

diesel::table! {
    model_versions (id) {
        id -> Text,
        name -> Text,
        model_id -> Text,
        version -> Text,
        description -> Text,
        framework -> Text,
        unique_tags -> Text,
        created_at -> BigInt,
        updated_at -> BigInt,
    }
}

diesel::table! {
    blobs (id) {
        id -> Text,
        parent_id -> Text,
        file_type -> Text,
        path -> Text,
        checksum -> Text,
        created_at -> BigInt,
        updated_at -> BigInt,
    }
}

diesel::table! {
    metadata (id) {
        id -> Text,
        parent_id -> Text,
        key -> Text,
        value -> Text,
    }
}

diesel::table! {
    mutation_events (mutation_id) {
        mutation_id -> BigInt,
        mutation_time -> BigInt,
        event_type -> Text,
        object_id -> Text,
        object_type -> Text,
        parent_id -> Text,
        namespace -> Text,
        processed_at -> BigInt,
        payload -> Nullable<Text>,
    }
}

diesel::table! {
    events (id) {
        id -> Text,
        parent_id -> Text,
        name -> Text,
        source -> Text,
        wallclock -> BigInt,
        metadata -> Text,
    }
}

diesel::table! {
    triggers (id) {
        id -> Text,
        parent_id -> Text,
        payload -> Text,
        trigger_type -> Text,
    }
}

diesel::table! {
    actions (id) {
        id -> Text,
        parent_id -> Text,
        name -> Text,
        arch -> Text,
        trigger_payload -> Text,
        trigger_type -> Text,
        params -> Text,
        created_at -> BigInt,
        updated_at -> BigInt,
        finished_at -> BigInt,
    }
}

diesel::table! {
    action_instances (id) {
        id -> Text,
        action_id -> Text,
        attempt -> Integer,
        status -> Text,
        outcome -> Text,
        outcome_reason -> Text,
        created_at -> BigInt,
        updated_at -> BigInt,
        finished_at -> BigInt,
    }
}

diesel::table! {
    agents (id) {
        id -> Text,
        name -> Text,
        hostname -> Text,
        ip -> Text,
        arch -> Text,
        actions -> Text,
        heartbeat_time -> BigInt,
    }
}

diesel::table! {
    cluster_members (id) {
        id -> Text,
        hostname -> Text,
        rpc_addr -> Text,
        http_addr -> Text,
        heartbeat_time -> BigInt,
    }
}

diesel::allow_tables_to_appear_in_same_query!(
    experiments,
    checkpoints,
    models,
    model_versions,
    blobs,
    metadata,
    mutation_events,
    events,
    triggers,
    actions,
    action_instances,
    agents,
    cluster_members,
);
