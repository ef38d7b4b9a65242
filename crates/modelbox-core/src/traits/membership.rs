//! The `ClusterMembership` capability: static rosters or a DB-backed
//! liveness table, behind one interface.

use async_trait::async_trait;
use modelbox_domain::ClusterMember;

use crate::error::ModelBoxResult;

#[async_trait]
pub trait ClusterMembership: Send + Sync {
    /// Starts renewing this process's own lease, if the driver has one.
    /// No-op for the static driver.
    async fn join(&self) -> ModelBoxResult<()>;

    /// Stops the renewal loop started by `join`. No-op for the static
    /// driver.
    async fn leave(&self) -> ModelBoxResult<()>;

    async fn get_members(&self) -> ModelBoxResult<Vec<ClusterMember>>;
}
