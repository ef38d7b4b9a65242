//! `modelbox server {init-config,create-schema,start}` / `modelbox client
//! {...}` surface. A real deployment runs `server start` on each replica
//! and drives it over the network; since the generated wire transport is
//! out of scope here (see `modelbox-rpc`'s module doc), `client` builds
//! the same in-process `ModelStore`/`ModelBoxAdmin` the agent would serve
//! and calls straight through to it, against the same `--config` file.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "modelbox", author, version, about = "ModelBox: track experiments, models, and their artifacts")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Operations that run a ModelBox server replica.
    Server {
        #[command(subcommand)]
        command: ServerCommand,
    },
    /// Talks to a ModelBox deployment's storage/artifact/metadata surface.
    Client {
        /// Path to the server config this client wires itself against.
        #[arg(long, global = true, default_value = "modelbox.toml")]
        config: PathBuf,
        #[command(subcommand)]
        command: ClientCommand,
    },
}

#[derive(Subcommand)]
pub enum ServerCommand {
    /// Writes a default `ServerConfig` to a TOML file.
    InitConfig {
        #[arg(long, default_value = "modelbox.toml")]
        out: PathBuf,
    },
    /// Applies the configured metadata backend's schema.
    CreateSchema {
        #[arg(long, default_value = "modelbox.toml")]
        config: PathBuf,
    },
    /// Starts the agent: scheduler, cluster membership, Prometheus
    /// listener, blocking until SIGINT/SIGTERM.
    Start {
        #[arg(long, default_value = "modelbox.toml")]
        config: PathBuf,
    },
}

#[derive(Subcommand)]
pub enum ClientCommand {
    Experiment {
        #[command(subcommand)]
        command: ExperimentCommand,
    },
    Model {
        #[command(subcommand)]
        command: ModelCommand,
    },
    ModelVersion {
        #[command(subcommand)]
        command: ModelVersionCommand,
    },
    Checkpoint {
        #[command(subcommand)]
        command: CheckpointCommand,
    },
    Artifact {
        #[command(subcommand)]
        command: ArtifactCommand,
    },
    Metadata {
        #[command(subcommand)]
        command: MetadataCommand,
    },
    Metric {
        #[command(subcommand)]
        command: MetricCommand,
    },
    Event {
        #[command(subcommand)]
        command: EventCommand,
    },
    Action {
        #[command(subcommand)]
        command: ActionCommand,
    },
    Trigger {
        #[command(subcommand)]
        command: TriggerCommand,
    },
    /// Lists the roster `GetClusterMembers` would return.
    ClusterMembers,
    /// Streams a namespace's change events until interrupted.
    Watch {
        #[arg(long)]
        namespace: String,
    },
}

#[derive(Subcommand)]
pub enum ExperimentCommand {
    Create {
        #[arg(long)]
        name: String,
        #[arg(long, default_value = "")]
        owner: String,
        #[arg(long, default_value = "default")]
        namespace: String,
        #[arg(long, default_value = "")]
        external_id: String,
        /// One of unknown, pytorch, keras.
        #[arg(long, default_value = "unknown")]
        framework: String,
    },
    List {
        #[arg(long, default_value = "default")]
        namespace: String,
    },
    Get {
        id: String,
    },
}

#[derive(Subcommand)]
pub enum ModelCommand {
    Create {
        #[arg(long)]
        name: String,
        #[arg(long, default_value = "")]
        owner: String,
        #[arg(long, default_value = "default")]
        namespace: String,
        #[arg(long, default_value = "")]
        task: String,
        #[arg(long, default_value = "")]
        description: String,
    },
    List {
        #[arg(long, default_value = "default")]
        namespace: String,
    },
    Get {
        id: String,
    },
}

#[derive(Subcommand)]
pub enum ModelVersionCommand {
    Create {
        #[arg(long)]
        model_id: String,
        #[arg(long)]
        version: String,
        #[arg(long, default_value = "")]
        name: String,
        #[arg(long, default_value = "")]
        description: String,
        #[arg(long, default_value = "")]
        framework: String,
        #[arg(long = "tag")]
        tags: Vec<String>,
    },
    List {
        model_id: String,
    },
    Get {
        id: String,
    },
}

#[derive(Subcommand)]
pub enum CheckpointCommand {
    Create {
        #[arg(long)]
        experiment_id: String,
        #[arg(long)]
        epoch: u64,
        /// Repeatable `name=value` metric pair.
        #[arg(long = "metric")]
        metrics: Vec<String>,
    },
    List {
        experiment_id: String,
    },
    Get {
        id: String,
    },
}

#[derive(Subcommand)]
pub enum ArtifactCommand {
    Upload {
        #[arg(long)]
        parent_id: String,
        /// One of checkpoint, model, text, image, audio, video.
        #[arg(long)]
        file_type: String,
        #[arg(long)]
        path: PathBuf,
    },
    Download {
        #[arg(long)]
        file_id: String,
        #[arg(long)]
        out: PathBuf,
    },
    List {
        parent_id: String,
    },
}

#[derive(Subcommand)]
pub enum MetadataCommand {
    Set {
        #[arg(long)]
        parent_id: String,
        /// Repeatable `key=value` string pair.
        #[arg(long = "entry")]
        entries: Vec<String>,
    },
    List {
        parent_id: String,
    },
}

#[derive(Subcommand)]
pub enum MetricCommand {
    Log {
        #[arg(long)]
        parent_id: String,
        #[arg(long)]
        key: String,
        /// Repeatable `step:wallclock:value` triple.
        #[arg(long = "point")]
        points: Vec<String>,
    },
    Get {
        #[arg(long)]
        parent_id: String,
        #[arg(long)]
        key: String,
    },
}

#[derive(Subcommand)]
pub enum EventCommand {
    Log {
        #[arg(long)]
        parent_id: String,
        #[arg(long)]
        name: String,
        #[arg(long, default_value = "cli")]
        source: String,
        #[arg(long = "entry")]
        metadata: Vec<String>,
    },
    List {
        parent_id: String,
    },
}

#[derive(Subcommand)]
pub enum ActionCommand {
    Create {
        #[arg(long)]
        name: String,
        #[arg(long)]
        parent_id: String,
        #[arg(long, default_value = "")]
        arch: String,
        /// Rhai expression (or a declarative JSON rule) the scheduler
        /// evaluates against the triggering `ChangeEvent`.
        #[arg(long)]
        trigger_payload: String,
        #[arg(long, default_value = "{}")]
        params_json: String,
    },
    /// Comma-separated action ids.
    List {
        ids: String,
    },
}

#[derive(Subcommand)]
pub enum TriggerCommand {
    Create {
        #[arg(long)]
        parent_id: String,
        #[arg(long)]
        payload: String,
    },
    List {
        parent_id: String,
    },
}
