//! Defaults referenced by config parsing and the scheduler/membership loops.

use std::time::Duration;

/// Default `scheduler_tick_duration` when a config omits it.
pub const DEFAULT_SCHEDULER_TICK: Duration = Duration::from_secs(5);

/// Default cadence at which `WatchNamespace` pushes change events.
pub const WATCH_NAMESPACE_PUSH_INTERVAL: Duration = Duration::from_secs(5);

/// Default `sql_cluster_membership.lease_interval`.
pub const DEFAULT_LEASE_INTERVAL: Duration = Duration::from_secs(10);

/// Default `sql_cluster_membership.stale_heartbeat_duration`.
pub const DEFAULT_STALE_HEARTBEAT: Duration = Duration::from_secs(30);

/// Default agent heartbeat staleness threshold evicted by the scheduler tick.
pub const DEFAULT_AGENT_STALE_THRESHOLD: Duration = Duration::from_secs(60);

/// Multipart upload part-size threshold for the S3 BlobStore backend.
pub const S3_MULTIPART_PART_SIZE: usize = 5 * 1024 * 1024;

/// Max bytes per chunk frame on the download path.
pub const DOWNLOAD_CHUNK_SIZE: usize = 1024;

/// Default unary RPC deadline.
pub const DEFAULT_UNARY_DEADLINE: Duration = Duration::from_secs(10);
