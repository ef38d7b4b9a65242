use serde::{Deserialize, Serialize};

use crate::ids::IdHasher;

/// One server replica in the cluster roster, as seen by `GetClusterMembers`
/// and the SQL-lease membership driver.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusterMember {
    pub id: String,
    pub hostname: String,
    pub rpc_addr: String,
    pub http_addr: String,
    pub heartbeat_time: u64,
}

impl ClusterMember {
    pub fn new(
        hostname: impl Into<String>,
        rpc_addr: impl Into<String>,
        http_addr: impl Into<String>,
        now: u64,
    ) -> Self {
        let hostname = hostname.into();
        let rpc_addr = rpc_addr.into();
        let http_addr = http_addr.into();
        let id = Self::derive_id(&hostname, &rpc_addr, &http_addr);
        Self {
            id,
            hostname,
            rpc_addr,
            http_addr,
            heartbeat_time: now,
        }
    }

    pub fn derive_id(hostname: &str, rpc_addr: &str, http_addr: &str) -> String {
        IdHasher::new()
            .feed_str(hostname)
            .feed_str(rpc_addr)
            .feed_str(http_addr)
            .finish()
    }
}
