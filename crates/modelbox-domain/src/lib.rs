//! Entity types for the catalog: experiments, checkpoints, models, model
//! versions, files, metadata, events, the mutation log, triggers, actions
//! and their instances, agents, and cluster members.
//!
//! Every constructor here derives its entity's content-addressed `id` the
//! same way the backend re-derives it on a duplicate create, so
//! `MetadataStore` implementations never need to invent their own id
//! scheme — see each module's `derive_id`.

pub mod action;
pub mod action_instance;
pub mod agent;
pub mod canonical_json;
pub mod change_event;
pub mod checkpoint;
pub mod cluster_member;
pub mod error;
pub mod event;
pub mod experiment;
pub mod file;
pub mod ids;
pub mod metadata;
pub mod model;
pub mod model_version;
pub mod trigger;

pub use action::Action;
pub use action_instance::{ActionInstance, Outcome, Status};
pub use agent::{Agent, Heartbeat};
pub use change_event::{ChangeEvent, EventType, ObjectType};
pub use checkpoint::Checkpoint;
pub use cluster_member::ClusterMember;
pub use error::{DomainError, DomainResult};
pub use event::Event;
pub use experiment::{Experiment, Framework};
pub use file::{File, FileType};
pub use metadata::{MetadataMap, MetadataRow, MetadataValue};
pub use model::Model;
pub use model_version::ModelVersion;
pub use trigger::{Trigger, TriggerType};
