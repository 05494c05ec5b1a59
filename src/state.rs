// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! The state container shared by the reconciler and the dispatcher.

use crate::agents::{Agent, AgentRegistry};
use crate::graph::{ConnectionGraph, Workspace};

/// Status line shown before anything happens.
pub const READY_STATUS: &str = "Ready";

/// Workspaces, agents and the user-facing status line.
///
/// Constructed explicitly and passed by reference; there is no ambient
/// instance, so independent workflows can coexist in one process.
#[derive(Debug, Clone)]
pub struct WorkflowState {
    pub graph: ConnectionGraph,
    pub agents: AgentRegistry,
    pub status: String,
}

impl WorkflowState {
    pub fn new() -> Self {
        Self {
            graph: ConnectionGraph::new(),
            agents: AgentRegistry::new(),
            status: READY_STATUS.to_string(),
        }
    }

    pub fn set_status(&mut self, message: impl Into<String>) {
        self.status = message.into();
    }

    /// The workspace an agent is bound to.
    pub fn workspace_of(&self, agent_id: &str) -> Option<&Workspace> {
        let agent = self.agents.get(agent_id)?;
        self.graph.get(&agent.workspace_id)
    }

    /// The agent currently bound to a workspace.
    pub fn agent_for(&self, workspace_id: &str) -> Option<&Agent> {
        self.agents.get_agent_by_workspace(workspace_id)
    }
}

impl Default for WorkflowState {
    fn default() -> Self {
        Self::new()
    }
}
