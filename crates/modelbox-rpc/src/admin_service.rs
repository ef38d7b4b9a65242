//! The `ModelBoxAdmin` service: the four agent-facing operations from
//! `spec.md` §4.5/§6, grounded in `server/admin.go`'s `AdminServer`. All
//! four delegate directly to `MetadataStore` — the monotone-status check
//! for `UpdateActionStatus` lives in the store's `update_action_instance`,
//! matching the original's `ActionScheduler.UpdateInstanceStatus`, which is
//! itself a pass-through to storage.

use std::sync::Arc;

use async_trait::async_trait;
use tonic::Status;

use modelbox_core::MetadataStore;
use modelbox_domain::Agent;

use crate::dto::*;
use crate::error_map::to_status;
use crate::traits::ModelBoxAdminService;

pub struct AdminService {
    metadata: Arc<dyn MetadataStore>,
}

impl AdminService {
    pub fn new(metadata: Arc<dyn MetadataStore>) -> Self {
        Self { metadata }
    }
}

#[async_trait]
impl ModelBoxAdminService for AdminService {
    async fn register_agent(&self, req: RegisterAgentRequest) -> Result<RegisterAgentResponse, Status> {
        let now = modelbox_core::now_epoch();
        let agent: Agent = req.agent;
        let agent_id = self.metadata.register_agent(agent, now).await.map_err(to_status)?;
        Ok(RegisterAgentResponse { agent_id })
    }

    async fn heartbeat(&self, req: HeartbeatRequest, now: u64) -> Result<(), Status> {
        self.metadata.heartbeat(&req.agent_id, now).await.map_err(to_status)
    }

    async fn get_runnable_action_instances(
        &self,
        req: GetRunnableActionInstancesRequest,
    ) -> Result<GetRunnableActionInstancesResponse, Status> {
        let instances = self
            .metadata
            .get_runnable_action_instances(&req.arch)
            .await
            .map_err(to_status)?;
        Ok(GetRunnableActionInstancesResponse { instances })
    }

    async fn update_action_status(
        &self,
        req: UpdateActionStatusRequest,
        now: u64,
    ) -> Result<UpdateActionStatusResponse, Status> {
        let updated = self
            .metadata
            .update_action_instance(&req.instance_id, req.status, req.outcome, &req.outcome_reason, now)
            .await
            .map_err(to_status)?;
        Ok(UpdateActionStatusResponse { updated })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use modelbox_domain::action::Action;
    use modelbox_domain::trigger::Trigger;
    use modelbox_domain::{ActionInstance, Outcome, Status as InstanceStatus};
    use modelbox_persistence::EmbeddedKvMetadataStore;

    fn store() -> Arc<dyn MetadataStore> {
        let dir = tempfile::tempdir().unwrap().into_path();
        Arc::new(EmbeddedKvMetadataStore::open(dir.join("modelbox.sled")).unwrap())
    }

    #[tokio::test]
    async fn register_then_heartbeat_then_eviction_is_visible_through_the_store() {
        let metadata = store();
        let admin = AdminService::new(metadata.clone());

        let agent = Agent::new("worker-1", "host-a", "10.0.0.1", "x86", vec!["quantize".to_string()]);
        let resp = admin
            .register_agent(RegisterAgentRequest { agent: agent.clone() })
            .await
            .unwrap();
        assert_eq!(resp.agent_id, agent.id);

        admin
            .heartbeat(HeartbeatRequest { agent_id: agent.id.clone() }, 1_000)
            .await
            .unwrap();

        let dead = metadata.get_dead_agents(2_000, 500).await.unwrap();
        assert_eq!(dead.len(), 1);
        assert_eq!(dead[0].id, agent.id);
    }

    #[tokio::test]
    async fn update_action_status_enforces_the_monotone_rule_through_the_admin_seam() {
        let metadata = store();
        let admin = AdminService::new(metadata.clone());

        let action = Action::new("quantize", "model-1", "x86", Trigger::script("\"quantize\""), Default::default(), 0);
        metadata.create_action(action.clone()).await.unwrap();
        let instance = ActionInstance::new(action.id.clone(), 0, 0);
        let events = metadata.get_unprocessed_change_events().await.unwrap();
        let action_created = events.iter().find(|e| e.object_id == action.id).unwrap();
        metadata
            .create_action_instance(instance.clone(), action_created.mutation_id, 0)
            .await
            .unwrap();

        let first = admin
            .update_action_status(
                UpdateActionStatusRequest {
                    instance_id: instance.id.clone(),
                    status: InstanceStatus::Finished,
                    outcome: Outcome::Success,
                    outcome_reason: "done".to_string(),
                },
                10,
            )
            .await
            .unwrap();
        assert!(first.updated);

        let second = admin
            .update_action_status(
                UpdateActionStatusRequest {
                    instance_id: instance.id,
                    status: InstanceStatus::Pending,
                    outcome: Outcome::Unknown,
                    outcome_reason: String::new(),
                },
                20,
            )
            .await
            .unwrap();
        assert!(!second.updated);
    }
}
