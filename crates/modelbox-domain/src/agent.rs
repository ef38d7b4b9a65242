use serde::{Deserialize, Serialize};

use crate::ids::IdHasher;

/// A worker process that registers on the admin plane, heartbeats, and
/// pulls runnable [`crate::action_instance::ActionInstance`]s filtered by
/// `arch`. Distinct from [`crate::cluster_member::ClusterMember`], which
/// tracks server replicas rather than workers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Agent {
    pub id: String,
    pub name: String,
    pub hostname: String,
    pub ip: String,
    pub arch: String,
    pub actions: Vec<String>,
}

impl Agent {
    pub fn new(
        name: impl Into<String>,
        hostname: impl Into<String>,
        ip: impl Into<String>,
        arch: impl Into<String>,
        actions: Vec<String>,
    ) -> Self {
        let name = name.into();
        let hostname = hostname.into();
        let ip = ip.into();
        let arch = arch.into();
        let id = Self::derive_id(&name, &hostname, &ip, &arch, &actions);
        Self {
            id,
            name,
            hostname,
            ip,
            arch,
            actions,
        }
    }

    pub fn derive_id(name: &str, hostname: &str, ip: &str, arch: &str, actions: &[String]) -> String {
        let mut hasher = IdHasher::new()
            .feed_str(name)
            .feed_str(hostname)
            .feed_str(ip)
            .feed_str(arch);
        for action in actions {
            hasher = hasher.feed_str(action);
        }
        hasher.finish()
    }
}

/// Liveness pair tracked per agent; eviction compares `heartbeat_time`
/// against `now - stale_threshold`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Heartbeat {
    pub agent_id: String,
    pub heartbeat_time: u64,
}
