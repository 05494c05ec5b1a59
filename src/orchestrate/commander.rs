// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Commander: the single owner of a workflow's state.
//!
//! The Commander drains the runner's event stream, reconciles each event into
//! the workflow state and schedules the auto-run dispatches it produces.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                        Commander                         │
//! │  ┌────────────────────────────────────────────────────┐  │
//! │  │  Mutex<Inner>                                      │  │
//! │  │  ├── WorkflowState (graph + agents + status)       │  │
//! │  │  ├── dispatch generations per workspace            │  │
//! │  │  └── orphan events awaiting a dispatch ack         │  │
//! │  └───────────────▲───────────────────────┬────────────┘  │
//! │                  │ reconcile             │ prepare       │
//! │        ┌─────────┴────────┐     ┌────────▼─────────┐     │
//! │        │ run(events)      │     │ spawned dispatch │     │
//! │        └─────────▲────────┘     └────────┬─────────┘     │
//! └──────────────────┼───────────────────────┼───────────────┘
//!                    │ AgentEvent            │ start_agent
//!              ┌─────┴───────────────────────▼─────┐
//!              │              Runner               │
//!              └───────────────────────────────────┘
//! ```
//!
//! The lock is only held inside synchronous blocks, never across an
//! `.await`, so each event's read-modify-write is atomic with respect to
//! every other event and acknowledgment.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Instant;

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::types::CommanderConfig;
use crate::dispatch::{self, TaskOptions};
use crate::error::{DispatchError, GraphError, RunnerError};
use crate::events::{self, AgentEvent, AutoRunTrigger};
use crate::graph::{ConnectionGraph, WorkspaceSpec};
use crate::runner::{
    AgentConfig, EventSubscription, Runner, SkillDetail, SkillInfo, StreamStatus,
};
use crate::state::WorkflowState;
use crate::types::{AgentId, CliType, WorkspaceId};

/// A prepared dispatch waiting on its runner call.
#[derive(Debug)]
struct DispatchJob {
    workspace_id: WorkspaceId,
    generation: u64,
    config: AgentConfig,
}

/// What became of a dispatch once the runner answered.
enum Ack {
    Registered(AgentId, Vec<DispatchJob>),
    /// The workspace was deleted or re-dispatched meanwhile.
    Unneeded(AgentId, DispatchError),
    Failed(DispatchError),
}

#[derive(Debug, Default)]
struct Inner {
    workflow: WorkflowState,
    /// Latest dispatch generation per workspace.
    generations: HashMap<WorkspaceId, u64>,
    next_generation: u64,
    /// Dispatches whose runner call has not returned.
    in_flight: usize,
    /// Events for unknown agents received while a dispatch was in flight.
    orphans: VecDeque<AgentEvent>,
}

impl Inner {
    fn begin_dispatch(&mut self, workspace_id: &str) -> u64 {
        self.next_generation += 1;
        self.generations
            .insert(workspace_id.to_string(), self.next_generation);
        self.in_flight += 1;
        self.next_generation
    }

    fn end_dispatch(&mut self) {
        self.in_flight = self.in_flight.saturating_sub(1);
        if self.in_flight == 0 && !self.orphans.is_empty() {
            debug!(dropped = self.orphans.len(), "Dropping events for unknown agents");
            self.orphans.clear();
        }
    }

    fn hold_orphan(&mut self, event: AgentEvent, capacity: usize) {
        if self.orphans.len() >= capacity.max(1) {
            if let Some(dropped) = self.orphans.pop_front() {
                warn!(
                    agent_id = dropped.agent_id(),
                    kind = dropped.kind(),
                    "Orphan event buffer full, dropping oldest"
                );
            }
        }
        self.orphans.push_back(event);
    }

    /// Apply buffered events for a newly registered agent, in arrival order.
    fn replay_orphans(&mut self, agent_id: &str) -> Vec<AutoRunTrigger> {
        let (matching, rest): (VecDeque<_>, VecDeque<_>) = std::mem::take(&mut self.orphans)
            .into_iter()
            .partition(|event| event.agent_id() == agent_id);
        self.orphans = rest;

        if !matching.is_empty() {
            debug!(%agent_id, count = matching.len(), "Replaying buffered events");
        }
        matching
            .iter()
            .flat_map(|event| events::apply(&mut self.workflow, event))
            .collect()
    }

    /// Prepare auto-run dispatches while the lock is held.
    fn prepare_triggers(
        &mut self,
        config: &CommanderConfig,
        triggers: Vec<AutoRunTrigger>,
    ) -> Vec<DispatchJob> {
        let options = config.task_options(TaskOptions::new());
        triggers
            .into_iter()
            .filter_map(|trigger| {
                match dispatch::prepare(
                    &mut self.workflow,
                    &trigger.workspace_id,
                    &trigger.task_template,
                    &options,
                ) {
                    Ok(config) => Some(DispatchJob {
                        generation: self.begin_dispatch(&trigger.workspace_id),
                        workspace_id: trigger.workspace_id,
                        config,
                    }),
                    Err(e) => {
                        warn!(workspace_id = %trigger.workspace_id, error = %e, "Auto-run skipped");
                        None
                    }
                }
            })
            .collect()
    }
}

/// Handle to a spawned event loop.
#[derive(Debug)]
pub struct EventLoop {
    handle: JoinHandle<()>,
    status: StreamStatus,
}

impl EventLoop {
    /// Wait until the runner stream is live. Events emitted earlier are lost,
    /// so dispatch only after this returns `true`.
    pub async fn wait_connected(&mut self) -> bool {
        self.status.wait_connected().await
    }

    pub fn is_connected(&self) -> bool {
        self.status.is_connected()
    }

    pub fn abort(&self) {
        self.handle.abort();
    }

    pub fn into_handle(self) -> JoinHandle<()> {
        self.handle
    }
}

/// Balances `begin_dispatch` even when a dispatch future is dropped mid-call.
struct InFlight<'a> {
    commander: &'a Commander,
    armed: bool,
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        if self.armed {
            debug!("Dispatch abandoned before the runner answered");
            self.commander.lock().end_dispatch();
            self.commander.bump();
        }
    }
}

/// Owner of one workflow's state and its runner connection.
#[derive(Clone)]
pub struct Commander {
    inner: Arc<Mutex<Inner>>,
    runner: Arc<dyn Runner>,
    config: Arc<CommanderConfig>,
    revision: Arc<watch::Sender<u64>>,
}

impl Commander {
    pub fn new(runner: Arc<dyn Runner>, config: CommanderConfig) -> Self {
        Self::with_state(WorkflowState::new(), runner, config)
    }

    /// Start from an existing workflow state.
    pub fn with_state(
        workflow: WorkflowState,
        runner: Arc<dyn Runner>,
        config: CommanderConfig,
    ) -> Self {
        let (revision, _) = watch::channel(0);
        Self {
            inner: Arc::new(Mutex::new(Inner {
                workflow,
                ..Default::default()
            })),
            runner,
            config: Arc::new(config),
            revision: Arc::new(revision),
        }
    }

    pub fn config(&self) -> &CommanderConfig {
        &self.config
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn bump(&self) {
        self.revision.send_modify(|rev| *rev += 1);
    }

    /// Receiver notified after every state change.
    pub fn changes(&self) -> watch::Receiver<u64> {
        self.revision.subscribe()
    }

    /// Inspect the current state.
    pub fn read<R>(&self, f: impl FnOnce(&WorkflowState) -> R) -> R {
        f(&self.lock().workflow)
    }

    /// A copy of the current state.
    pub fn snapshot(&self) -> WorkflowState {
        self.read(WorkflowState::clone)
    }

    pub fn status(&self) -> String {
        self.read(|state| state.status.clone())
    }

    /// Wait until `predicate` holds for the current state.
    pub async fn wait_until(&self, mut predicate: impl FnMut(&WorkflowState) -> bool) {
        let mut changes = self.changes();
        loop {
            if self.read(&mut predicate) {
                return;
            }
            if changes.changed().await.is_err() {
                return;
            }
        }
    }

    // ========================================================================
    // Graph editing
    // ========================================================================

    pub fn add_workspace(&self, spec: WorkspaceSpec) -> WorkspaceId {
        let id = self.lock().workflow.graph.add_workspace(spec);
        self.bump();
        id
    }

    /// Edit the graph directly.
    pub fn with_graph_mut<R>(&self, f: impl FnOnce(&mut ConnectionGraph) -> R) -> R {
        let result = f(&mut self.lock().workflow.graph);
        self.bump();
        result
    }

    /// Connect `from -> to`, rejecting self-loops and, when configured, cycles.
    pub fn connect(&self, from: &str, to: &str) -> Result<(), GraphError> {
        {
            let mut inner = self.lock();
            let graph = &mut inner.workflow.graph;
            for id in [from, to] {
                if !graph.contains(id) {
                    return Err(GraphError::NotFound(id.to_string()));
                }
            }
            if from == to {
                return Err(GraphError::SelfLoop(from.to_string()));
            }
            if self.config.reject_cycles && graph.would_create_cycle(from, to) {
                return Err(GraphError::Cycle {
                    from: from.to_string(),
                    to: to.to_string(),
                });
            }
            graph.connect_workspaces(from, to);
        }
        self.bump();
        Ok(())
    }

    pub fn disconnect(&self, from: &str, to: &str) {
        self.with_graph_mut(|graph| graph.disconnect_workspaces(from, to));
    }

    // ========================================================================
    // Event loop
    // ========================================================================

    /// Subscribe to the runner and drain its events in a background task.
    pub fn spawn_event_loop(&self) -> EventLoop {
        let EventSubscription { events, status } = self.runner.subscribe();
        let commander = self.clone();
        EventLoop {
            handle: tokio::spawn(async move { commander.run(events).await }),
            status,
        }
    }

    /// Drain `events` in order until the channel closes.
    pub async fn run(&self, mut events: mpsc::Receiver<AgentEvent>) {
        info!("Commander event loop started");
        while let Some(event) = events.recv().await {
            self.handle_event(event);
        }
        info!("Commander event loop stopped: event stream closed");
    }

    /// Reconcile one event and schedule the dispatches it triggers.
    pub fn handle_event(&self, event: AgentEvent) {
        let jobs = {
            let mut inner = self.lock();
            let known = inner.workflow.agents.contains(event.agent_id());
            if !known && inner.in_flight > 0 {
                debug!(
                    agent_id = event.agent_id(),
                    kind = event.kind(),
                    "Holding event until dispatch is acknowledged"
                );
                inner.hold_orphan(event, self.config.orphan_capacity);
                return;
            }
            let triggers = events::apply(&mut inner.workflow, &event);
            inner.prepare_triggers(&self.config, triggers)
        };
        self.bump();
        self.spawn_dispatches(jobs);
    }

    /// Fire-and-forget the runner calls of prepared dispatches.
    fn spawn_dispatches(&self, jobs: Vec<DispatchJob>) {
        for job in jobs {
            let commander = self.clone();
            tokio::spawn(async move {
                let workspace_id = job.workspace_id.clone();
                if let Err(e) = commander.complete_dispatch(job).await {
                    warn!(%workspace_id, error = %e, "Auto-run dispatch failed");
                }
            });
        }
    }

    /// Await the runner call of a prepared dispatch and register its agent.
    async fn complete_dispatch(&self, job: DispatchJob) -> Result<AgentId, DispatchError> {
        let DispatchJob {
            workspace_id,
            generation,
            config,
        } = job;
        let task = config.prompt.clone();

        let mut in_flight = InFlight {
            commander: self,
            armed: true,
        };
        let started = Instant::now();
        let result = self.runner.start_agent(config).await;
        #[cfg(feature = "telemetry")]
        crate::telemetry::GLOBAL_METRICS.record_dispatch(started.elapsed(), result.is_ok());

        let outcome = {
            let mut inner = self.lock();
            let ack = match result {
                Ok(agent_id) if !inner.workflow.graph.contains(&workspace_id) => {
                    Ack::Unneeded(agent_id, DispatchError::WorkspaceNotFound(workspace_id.clone()))
                }
                Ok(agent_id) if inner.generations.get(&workspace_id) != Some(&generation) => {
                    Ack::Unneeded(agent_id, DispatchError::Superseded(workspace_id.clone()))
                }
                Ok(agent_id) => {
                    info!(
                        %agent_id,
                        %workspace_id,
                        elapsed_ms = started.elapsed().as_millis() as u64,
                        "Task dispatched"
                    );
                    dispatch::register(&mut inner.workflow, &workspace_id, &agent_id, &task);
                    let triggers = inner.replay_orphans(&agent_id);
                    let jobs = inner.prepare_triggers(&self.config, triggers);
                    Ack::Registered(agent_id, jobs)
                }
                Err(e) => {
                    Ack::Failed(dispatch::dispatch_failed(&mut inner.workflow, &workspace_id, e))
                }
            };
            inner.end_dispatch();
            in_flight.armed = false;
            ack
        };
        self.bump();

        match outcome {
            Ack::Registered(agent_id, jobs) => {
                self.spawn_dispatches(jobs);
                Ok(agent_id)
            }
            Ack::Unneeded(agent_id, err) => {
                info!(%agent_id, %workspace_id, reason = %err, "Cancelling unneeded agent");
                if let Err(e) = self.runner.stop_agent(&agent_id).await {
                    warn!(%agent_id, error = %e, "Failed to cancel unneeded agent");
                }
                Err(err)
            }
            Ack::Failed(err) => Err(err),
        }
    }

    // ========================================================================
    // Task control
    // ========================================================================

    /// Dispatch `prompt` to a workspace, replacing any agent bound to it.
    pub async fn start_task(
        &self,
        workspace_id: &str,
        prompt: &str,
        options: TaskOptions,
    ) -> Result<AgentId, DispatchError> {
        let job = {
            let mut inner = self.lock();
            let options = self.config.task_options(options);
            let config = dispatch::prepare(&mut inner.workflow, workspace_id, prompt, &options)?;
            DispatchJob {
                workspace_id: workspace_id.to_string(),
                generation: inner.begin_dispatch(workspace_id),
                config,
            }
        };
        self.bump();
        self.complete_dispatch(job).await
    }

    /// Dispatch a workspace's task template.
    pub async fn run_workspace(&self, workspace_id: &str) -> Result<AgentId, DispatchError> {
        let template = self.read(|state| {
            state
                .graph
                .get(workspace_id)
                .map(|ws| ws.task_template.clone())
        });
        match template {
            None => Err(DispatchError::WorkspaceNotFound(workspace_id.to_string())),
            Some(None) => Err(DispatchError::NoTaskTemplate(workspace_id.to_string())),
            Some(Some(template)) => {
                self.start_task(workspace_id, &template, TaskOptions::new())
                    .await
            }
        }
    }

    /// Request cancellation. Local state follows when `Stopped` arrives.
    pub async fn stop_task(&self, agent_id: &str) -> Result<(), DispatchError> {
        dispatch::begin_stop(&mut self.lock().workflow, agent_id);
        self.bump();

        let result = self.runner.stop_agent(agent_id).await;
        let outcome = dispatch::finish_stop(&mut self.lock().workflow, agent_id, result);
        self.bump();
        outcome
    }

    /// Cancel every agent the runner knows about.
    pub async fn stop_all(&self) -> Result<(), RunnerError> {
        info!("Cancelling all agents");
        self.runner.stop_all_agents().await
    }

    /// Remove a workspace and its agent now, then cancel the agent at the runner.
    pub async fn delete_workspace(&self, workspace_id: &str) -> Result<(), DispatchError> {
        let agents = {
            let mut inner = self.lock();
            let agents = dispatch::remove_workspace(&mut inner.workflow, workspace_id)?;
            inner.generations.remove(workspace_id);
            agents
        };
        self.bump();

        for agent_id in agents {
            if let Err(e) = self.runner.stop_agent(&agent_id).await {
                warn!(%agent_id, error = %e, "Cancellation failed during workspace deletion");
            }
        }
        Ok(())
    }

    // ========================================================================
    // Runner passthroughs
    // ========================================================================

    pub async fn live_agents(&self) -> Result<Vec<AgentId>, RunnerError> {
        self.runner.list_agents().await
    }

    pub async fn check_cli(&self, cli: CliType) -> Result<bool, RunnerError> {
        self.runner.check_cli_available(cli).await
    }

    pub async fn skills(&self) -> Result<Vec<SkillInfo>, RunnerError> {
        self.runner.list_skills().await
    }

    pub async fn skill(&self, name: &str) -> Result<SkillDetail, RunnerError> {
        self.runner.get_skill(name).await
    }
}
