//! A fixed roster read from configuration. Grounded in
//! `server/membership/static.go`'s `Static` driver: `Join`/`Leave` are
//! no-ops and `GetMembers` always returns the same list.

use async_trait::async_trait;

use modelbox_core::error::ModelBoxResult;
use modelbox_core::ClusterMembership;
use modelbox_domain::ClusterMember;

pub struct StaticMembership {
    members: Vec<ClusterMember>,
}

impl StaticMembership {
    pub fn new(members: Vec<ClusterMember>) -> Self {
        Self { members }
    }
}

#[async_trait]
impl ClusterMembership for StaticMembership {
    async fn join(&self) -> ModelBoxResult<()> {
        Ok(())
    }

    async fn leave(&self) -> ModelBoxResult<()> {
        Ok(())
    }

    async fn get_members(&self) -> ModelBoxResult<Vec<ClusterMember>> {
        Ok(self.members.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn returns_the_configured_roster_unconditionally() {
        let members = vec![ClusterMember::new("host-a", "host-a:8085", "host-a:8086", 0)];
        let membership = StaticMembership::new(members.clone());

        membership.join().await.unwrap();
        assert_eq!(membership.get_members().await.unwrap(), members);
        membership.leave().await.unwrap();
        assert_eq!(membership.get_members().await.unwrap(), members);
    }
}
