// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Task dispatcher.
//!
//! A dispatch is split around its one suspension point:
//!
//! 1. [`prepare`] (sync): drop the workspace's previous agent, compose the
//!    prompt, mark the workspace working and build the runner request.
//! 2. `Runner::start_agent` (async): returns the runner-assigned id.
//! 3. [`register`] (sync): bind a thinking agent under that id, or
//!    [`dispatch_failed`] when the runner refused.
//!
//! Cancellation and deletion are split the same way: [`begin_stop`] and
//! [`finish_stop`] around `Runner::stop_agent`, and [`remove_workspace`]
//! before the runner is told to cancel what it removed. The commander holds
//! its lock only for the sync halves.

use tracing::{info, warn};

use super::compose::compose_prompt;
use crate::error::{DispatchError, RunnerError};
use crate::graph::WorkspaceState;
use crate::runner::AgentConfig;
use crate::state::WorkflowState;
use crate::types::AgentId;

/// Per-dispatch options.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskOptions {
    /// Compose upstream outputs into the prompt. `None` means yes.
    pub use_workflow_inputs: Option<bool>,
    pub allowed_tools: Option<Vec<String>>,
    pub working_directory: Option<String>,
}

impl TaskOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn without_workflow_inputs(mut self) -> Self {
        self.use_workflow_inputs = Some(false);
        self
    }

    pub fn with_allowed_tools(mut self, tools: Vec<String>) -> Self {
        self.allowed_tools = Some(tools);
        self
    }

    pub fn with_working_directory(mut self, dir: impl Into<String>) -> Self {
        self.working_directory = Some(dir.into());
        self
    }

    pub fn uses_workflow_inputs(&self) -> bool {
        self.use_workflow_inputs != Some(false)
    }
}

/// Synchronous first half of a dispatch. Returns the runner request.
pub fn prepare(
    state: &mut WorkflowState,
    workspace_id: &str,
    prompt: &str,
    options: &TaskOptions,
) -> Result<AgentConfig, DispatchError> {
    let Some(workspace) = state.graph.get(workspace_id) else {
        return Err(DispatchError::WorkspaceNotFound(workspace_id.to_string()));
    };

    let final_prompt = if options.uses_workflow_inputs() {
        compose_prompt(&state.graph, workspace_id, prompt)
    } else {
        prompt.to_string()
    };

    let config = AgentConfig {
        workspace_id: workspace_id.to_string(),
        prompt: final_prompt,
        cli: Some(workspace.cli),
        mode: workspace.mode.clone(),
        allowed_tools: options.allowed_tools.clone(),
        working_directory: options.working_directory.clone(),
        system_prompt: workspace
            .system_prompt
            .clone()
            .filter(|p| !p.trim().is_empty()),
        model: Some(workspace.model.clone()).filter(|m| !m.is_empty()),
    };

    discard_agents(state, workspace_id);
    state
        .graph
        .update_workspace_state(workspace_id, WorkspaceState::Working);
    state.set_status("Starting task...");

    Ok(config)
}

/// Synchronous second half of a dispatch: bind the runner-assigned agent.
pub fn register(state: &mut WorkflowState, workspace_id: &str, agent_id: &str, task: &str) {
    discard_agents(state, workspace_id);
    state.agents.register(agent_id, workspace_id, task);
    state
        .graph
        .set_workspace_agent(workspace_id, Some(agent_id.to_string()));
    state
        .graph
        .update_workspace_state(workspace_id, WorkspaceState::Working);
}

/// Remove every agent bound to a workspace.
fn discard_agents(state: &mut WorkflowState, workspace_id: &str) {
    for agent_id in state.agents.agents_for_workspace(workspace_id) {
        info!(%agent_id, %workspace_id, "Discarding previous agent");
        state.agents.remove_agent(&agent_id);
    }
    if state
        .graph
        .get(workspace_id)
        .is_some_and(|ws| ws.agent_id.is_some())
    {
        state.graph.set_workspace_agent(workspace_id, None);
    }
}

/// Record a refused dispatch. No agent is created and the workspace stays working.
pub fn dispatch_failed(
    state: &mut WorkflowState,
    workspace_id: &str,
    error: RunnerError,
) -> DispatchError {
    warn!(%workspace_id, error = %error, "Dispatch failed");
    let err = DispatchError::from(error);
    state.set_status(err.to_string());
    err
}

/// Status before a cancellation request goes out.
pub fn begin_stop(state: &mut WorkflowState, agent_id: &str) {
    info!(%agent_id, "Requesting cancellation");
    state.set_status("Stopping task...");
    #[cfg(feature = "telemetry")]
    crate::telemetry::GLOBAL_METRICS.record_cancellation();
}

/// Status once the runner answered a cancellation request.
///
/// Local agent and workspace state only change when `Stopped` arrives.
pub fn finish_stop(
    state: &mut WorkflowState,
    agent_id: &str,
    result: Result<(), RunnerError>,
) -> Result<(), DispatchError> {
    match result {
        Ok(()) => {
            info!(%agent_id, "Cancellation requested");
            state.set_status("Task stopped");
            Ok(())
        }
        Err(e) => {
            warn!(%agent_id, error = %e, "Cancellation failed");
            state.set_status(format!("Failed to stop task: {e}"));
            Err(e.into())
        }
    }
}

/// Remove a workspace, its edges and every agent bound to it.
///
/// Returns the removed agent ids so the caller can cancel them at the runner.
/// Events that arrive for them afterwards hit a missing id.
pub fn remove_workspace(
    state: &mut WorkflowState,
    workspace_id: &str,
) -> Result<Vec<AgentId>, DispatchError> {
    if !state.graph.contains(workspace_id) {
        return Err(DispatchError::WorkspaceNotFound(workspace_id.to_string()));
    }
    let agents = state.agents.agents_for_workspace(workspace_id);
    for agent_id in &agents {
        state.agents.remove_agent(agent_id);
    }
    state.graph.remove_workspace(workspace_id);
    state.set_status("Workspace deleted");
    Ok(agents)
}
