//! The action scheduler: a singleton cooperative loop that consumes
//! unprocessed change-events, evaluates triggers, materializes actions
//! into runnable instances, and evicts stale agents.
//!
//! Structurally this is the same shape as a replay-driven engine tick —
//! pull the log, fold each entry into a side effect, never mutate history
//! — just applied to a live backend instead of an in-memory event vector.

use std::sync::Arc;
use std::time::Duration;

use modelbox_domain::action::Action;
use modelbox_domain::action_instance::{ActionInstance, Status};
use modelbox_domain::change_event::{ChangeEvent, EventType, ObjectType};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

use crate::error::ModelBoxResult;
use crate::traits::{MetadataStore, TriggerEvaluator};

/// Outcome of a single tick, surfaced for logging/tests.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct TickReport {
    pub events_seen: usize,
    pub actions_created: usize,
    pub instances_created: usize,
    pub agents_evicted: usize,
    pub trigger_errors: usize,
}

/// The metadata backend and trigger evaluator are trait objects rather than
/// generic parameters: the concrete backend is chosen once at startup from
/// `ServerConfig`, so there is nothing for monomorphization to buy here.
pub struct Scheduler {
    store: Arc<dyn MetadataStore>,
    triggers: Arc<dyn TriggerEvaluator>,
    tick_interval: Duration,
    agent_stale_threshold: Duration,
}

impl Scheduler {
    pub fn new(
        store: Arc<dyn MetadataStore>,
        triggers: Arc<dyn TriggerEvaluator>,
        tick_interval: Duration,
        agent_stale_threshold: Duration,
    ) -> Self {
        Self {
            store,
            triggers,
            tick_interval,
            agent_stale_threshold,
        }
    }

    /// Runs one tick: processes every currently-unprocessed change-event in
    /// ascending `mutation_id` order, then evicts stale agents. Not
    /// reentrant — callers must await completion before starting another.
    pub async fn tick(&self, now: u64) -> ModelBoxResult<TickReport> {
        let mut report = TickReport::default();

        let mut events = self.store.get_unprocessed_change_events().await?;
        events.sort_by_key(|e| e.mutation_id);
        report.events_seen = events.len();

        for event in &events {
            if event.event_type.is_trigger_source() {
                self.handle_trigger_source(event, now, &mut report).await;
            } else if event.event_type == EventType::ActionCreated {
                self.handle_action_created(event, now, &mut report).await;
            }
            // Any other event_type (action-instance lifecycle transitions)
            // is scheduler-inert: it was already marked processed by the
            // write that produced it, or is left unprocessed by design.
        }

        let dead = self
            .store
            .get_dead_agents(now, self.agent_stale_threshold.as_secs())
            .await?;
        report.agents_evicted = dead.len();

        Ok(report)
    }

    async fn handle_trigger_source(&self, event: &ChangeEvent, now: u64, report: &mut TickReport) {
        let triggers = match self.store.get_triggers(&event.parent_id).await {
            Ok(t) => t,
            Err(e) => {
                log::warn!("scheduler: unable to load triggers for {}: {e}", event.parent_id);
                return;
            }
        };

        // No triggers attached: per design, leave processed_at=0 rather
        // than inventing a "nothing to do" processed marker.
        if triggers.is_empty() {
            return;
        }

        let mut all_ok = true;
        for trigger in &triggers {
            match self.triggers.get_action(event, trigger).await {
                Ok(action_name) => {
                    let action = Action::new(
                        action_name,
                        event.object_id.clone(),
                        String::new(),
                        trigger.clone(),
                        Default::default(),
                        now,
                    );
                    match self.store.create_action(action).await {
                        Ok(res) => {
                            if !res.exists {
                                report.actions_created += 1;
                            }
                        }
                        Err(e) => {
                            log::warn!("scheduler: unable to create action for {}: {e}", event.object_id);
                            all_ok = false;
                        }
                    }
                }
                Err(e) => {
                    log::warn!("scheduler: trigger evaluation failed for {}: {e}", event.object_id);
                    report.trigger_errors += 1;
                    all_ok = false;
                }
            }
        }

        if all_ok {
            if let Err(e) = self.store.mark_change_event_processed(event.mutation_id, now).await {
                log::warn!("scheduler: unable to mark event {} processed: {e}", event.mutation_id);
            }
        }
    }

    async fn handle_action_created(&self, event: &ChangeEvent, now: u64, report: &mut TickReport) {
        debug_assert_eq!(event.object_type, ObjectType::Action);

        let existing = match self.store.get_action(&event.object_id).await {
            Ok((_, instances)) => instances,
            Err(e) => {
                log::warn!("scheduler: unable to load action {}: {e}", event.object_id);
                return;
            }
        };
        if !existing.is_empty() {
            // Already materialized (a prior tick created it, or this tick
            // is re-processing after a restart); no-op, keeps the tick
            // idempotent.
            return;
        }

        let instance = ActionInstance::new(event.object_id.clone(), 0, now);
        debug_assert_eq!(instance.status, Status::Pending);
        match self
            .store
            .create_action_instance(instance, event.mutation_id, now)
            .await
        {
            Ok(()) => report.instances_created += 1,
            Err(e) => log::warn!("scheduler: unable to create action instance for {}: {e}", event.object_id),
        }
    }

    /// Spawns the tick loop on the current tokio runtime. Returns a handle
    /// and a stop sender; dropping or firing the sender ends the loop
    /// after the in-flight tick (if any) completes.
    pub fn spawn(self: Arc<Self>) -> (JoinHandle<()>, oneshot::Sender<()>) {
        let (stop_tx, mut stop_rx) = oneshot::channel();
        let handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval(self.tick_interval);
            loop {
                tokio::select! {
                    _ = interval.tick() => {
                        let now = crate::now_epoch();
                        match self.tick(now).await {
                            Ok(report) => log::debug!("scheduler tick: {report:?}"),
                            Err(e) => log::error!("scheduler tick failed: {e}"),
                        }
                    }
                    _ = &mut stop_rx => {
                        log::info!("stopping action scheduler");
                        return;
                    }
                }
            }
        });
        (handle, stop_tx)
    }
}
