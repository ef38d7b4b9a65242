//! `modelbox`: the top-level facade crate.
//!
//! This crate has no logic of its own — it re-exports the workspace's
//! member crates for a caller that wants one `Cargo.toml` entry, and its
//! `src/main.rs` is the `modelbox` binary, a thin wrapper around
//! `modelbox_cli::run`.

pub use modelbox_blobstore;
pub use modelbox_core;
pub use modelbox_domain;
pub use modelbox_membership;
pub use modelbox_metrics;
pub use modelbox_persistence;
pub use modelbox_rpc;
pub use modelbox_triggers;

pub use modelbox_cli;
