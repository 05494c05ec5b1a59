// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Agent registry.
//!
//! A dumb store: `update_agent_state` overwrites unconditionally and
//! transition policy lives in the event reconciler. Every mutation on an
//! unknown id is a silent no-op.

use std::collections::HashMap;

use chrono::Utc;
use uuid::Uuid;

use super::types::{Agent, AgentState, LogDraft, LogEntry};
use crate::types::{AgentId, WorkspaceId};

/// Logs kept per agent; older entries are dropped first.
pub const MAX_LOG_ENTRIES: usize = 500;

#[derive(Debug, Clone, Default)]
pub struct AgentRegistry {
    agents: HashMap<AgentId, Agent>,
}

impl AgentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an idle agent with a locally generated id.
    pub fn add_agent(&mut self, workspace_id: impl Into<WorkspaceId>) -> AgentId {
        let id = Uuid::new_v4().simple().to_string();
        self.agents
            .insert(id.clone(), Agent::new(id.clone(), workspace_id.into()));
        id
    }

    /// Store an agent under the runner-assigned id, already thinking on `task`.
    pub fn register(
        &mut self,
        agent_id: impl Into<AgentId>,
        workspace_id: impl Into<WorkspaceId>,
        task: impl Into<String>,
    ) -> &Agent {
        let agent_id = agent_id.into();
        let mut agent = Agent::new(agent_id.clone(), workspace_id.into());
        agent.task = Some(task.into());
        agent.state = AgentState::Thinking;
        agent.started_at = Some(Utc::now());
        self.agents.insert(agent_id.clone(), agent);
        &self.agents[&agent_id]
    }

    pub fn remove_agent(&mut self, id: &str) -> Option<Agent> {
        self.agents.remove(id)
    }

    pub fn get(&self, id: &str) -> Option<&Agent> {
        self.agents.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.agents.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.agents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }

    pub fn agents(&self) -> impl Iterator<Item = &Agent> {
        self.agents.values()
    }

    /// First agent bound to a workspace. Linear scan.
    pub fn get_agent_by_workspace(&self, workspace_id: &str) -> Option<&Agent> {
        self.agents.values().find(|a| a.workspace_id == workspace_id)
    }

    /// Every agent bound to a workspace. Linear scan.
    pub fn agents_for_workspace(&self, workspace_id: &str) -> Vec<AgentId> {
        self.agents
            .values()
            .filter(|a| a.workspace_id == workspace_id)
            .map(|a| a.id.clone())
            .collect()
    }

    pub fn update_agent_state(&mut self, id: &str, state: AgentState) {
        self.with_agent(id, |agent| agent.state = state);
    }

    /// Restart the agent on a new task.
    pub fn set_agent_task(&mut self, id: &str, task: impl Into<String>) {
        let task = task.into();
        self.with_agent(id, |agent| {
            agent.task = Some(task);
            agent.started_at = Some(Utc::now());
            agent.state = AgentState::Thinking;
            agent.progress = 0;
            agent.error = None;
            agent.completed_at = None;
        });
    }

    /// Record session metadata. Only the first call takes effect.
    pub fn set_agent_session(&mut self, id: &str, session_id: &str, model: &str) {
        self.with_agent(id, |agent| {
            if agent.session_id.is_none() {
                agent.session_id = Some(session_id.to_string());
                agent.model = Some(model.to_string());
            }
        });
    }

    /// Stamp and append a log entry, keeping the most recent `MAX_LOG_ENTRIES`.
    pub fn append_log(&mut self, id: &str, draft: LogDraft) {
        self.with_agent(id, |agent| {
            agent.logs.push_back(LogEntry {
                id: Uuid::new_v4().simple().to_string(),
                timestamp: Utc::now(),
                kind: draft.kind,
                content: draft.content,
                tool_name: draft.tool_name,
                tool_input: draft.tool_input,
            });
            while agent.logs.len() > MAX_LOG_ENTRIES {
                agent.logs.pop_front();
            }
        });
    }

    pub fn update_progress(&mut self, id: &str, progress: i32) {
        // In range after the clamp, so the cast cannot truncate.
        self.with_agent(id, |agent| agent.progress = progress.clamp(0, 100) as u8);
    }

    pub fn set_agent_error(&mut self, id: &str, message: impl Into<String>) {
        let message = message.into();
        self.with_agent(id, |agent| {
            agent.error = Some(message);
            agent.state = AgentState::Error;
            agent.completed_at.get_or_insert_with(Utc::now);
        });
    }

    pub fn complete_agent(&mut self, id: &str, success: bool) {
        self.with_agent(id, |agent| {
            agent.state = if success {
                AgentState::Success
            } else {
                AgentState::Error
            };
            agent.completed_at.get_or_insert_with(Utc::now);
            agent.progress = 100;
        });
    }

    fn with_agent(&mut self, id: &str, f: impl FnOnce(&mut Agent)) {
        if let Some(agent) = self.agents.get_mut(id) {
            f(agent);
        }
    }
}
