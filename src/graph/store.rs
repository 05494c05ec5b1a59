// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Connection graph store.
//!
//! Owns every workspace and keeps both sides of each edge in sync: an edge
//! `A -> B` exists iff `B` is in `A.output_connections` and `A` is in
//! `B.input_connections`. Field setters are silent no-ops for unknown ids so
//! that late events referencing a deleted workspace never fail.

use std::collections::{HashMap, HashSet};

use uuid::Uuid;

use super::types::{Workspace, WorkspaceInput, WorkspaceSpec, WorkspaceState, MAX_MESSINESS};
use crate::types::{AgentId, CliType, WorkspaceId};

/// In-memory mapping from workspace id to workspace.
#[derive(Debug, Clone, Default)]
pub struct ConnectionGraph {
    workspaces: HashMap<WorkspaceId, Workspace>,
    /// Ordinal used for default workspace names.
    created: u64,
}

impl ConnectionGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a workspace and return its new id.
    pub fn add_workspace(&mut self, spec: WorkspaceSpec) -> WorkspaceId {
        self.created += 1;
        let id = Uuid::new_v4().simple().to_string();
        let workspace = spec.into_workspace(id.clone(), self.created);
        self.workspaces.insert(id.clone(), workspace);
        id
    }

    /// Remove a workspace and scrub it from every other workspace's edges.
    pub fn remove_workspace(&mut self, id: &str) -> Option<Workspace> {
        let removed = self.workspaces.remove(id)?;
        for ws in self.workspaces.values_mut() {
            ws.input_connections.retain(|other| other != id);
            ws.output_connections.retain(|other| other != id);
        }
        Some(removed)
    }

    pub fn get(&self, id: &str) -> Option<&Workspace> {
        self.workspaces.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.workspaces.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.workspaces.len()
    }

    pub fn is_empty(&self) -> bool {
        self.workspaces.is_empty()
    }

    /// All workspaces, oldest first.
    pub fn workspaces(&self) -> Vec<&Workspace> {
        let mut all: Vec<&Workspace> = self.workspaces.values().collect();
        all.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        all
    }

    /// Look up a workspace by display name.
    pub fn find_by_name(&self, name: &str) -> Option<&Workspace> {
        self.workspaces.values().find(|ws| ws.name == name)
    }

    /// Add the edge `from -> to`. Idempotent; ignored unless both ends exist.
    pub fn connect_workspaces(&mut self, from_id: &str, to_id: &str) {
        if !self.contains(from_id) || !self.contains(to_id) {
            return;
        }
        if let Some(from) = self.workspaces.get_mut(from_id) {
            if !from.output_connections.iter().any(|id| id == to_id) {
                from.output_connections.push(to_id.to_string());
            }
        }
        if let Some(to) = self.workspaces.get_mut(to_id) {
            if !to.input_connections.iter().any(|id| id == from_id) {
                to.input_connections.push(from_id.to_string());
            }
        }
    }

    /// Remove the edge `from -> to` from whichever ends still exist.
    pub fn disconnect_workspaces(&mut self, from_id: &str, to_id: &str) {
        if let Some(from) = self.workspaces.get_mut(from_id) {
            from.output_connections.retain(|id| id != to_id);
        }
        if let Some(to) = self.workspaces.get_mut(to_id) {
            to.input_connections.retain(|id| id != from_id);
        }
    }

    /// Every edge as `(from, to)`.
    pub fn edges(&self) -> Vec<(WorkspaceId, WorkspaceId)> {
        self.workspaces()
            .into_iter()
            .flat_map(|ws| {
                ws.output_connections
                    .iter()
                    .map(move |to| (ws.id.clone(), to.clone()))
            })
            .collect()
    }

    /// Upstream ids with their latest output, in connection order.
    pub fn get_inputs_for_workspace(&self, id: &str) -> Vec<WorkspaceInput> {
        let Some(workspace) = self.workspaces.get(id) else {
            return Vec::new();
        };
        workspace
            .input_connections
            .iter()
            .map(|input_id| WorkspaceInput {
                id: input_id.clone(),
                output: self
                    .workspaces
                    .get(input_id)
                    .and_then(|ws| ws.last_output.clone()),
            })
            .collect()
    }

    pub fn get_downstream_workspaces(&self, id: &str) -> Vec<WorkspaceId> {
        self.workspaces
            .get(id)
            .map(|ws| ws.output_connections.clone())
            .unwrap_or_default()
    }

    /// Whether adding `from -> to` would close a directed cycle.
    pub fn would_create_cycle(&self, from_id: &str, to_id: &str) -> bool {
        if from_id == to_id {
            return true;
        }
        let mut stack = vec![to_id];
        let mut seen = HashSet::new();
        while let Some(current) = stack.pop() {
            if current == from_id {
                return true;
            }
            if !seen.insert(current) {
                continue;
            }
            if let Some(ws) = self.workspaces.get(current) {
                stack.extend(ws.output_connections.iter().map(String::as_str));
            }
        }
        false
    }

    pub fn update_workspace_state(&mut self, id: &str, state: WorkspaceState) {
        self.with_workspace(id, |ws| ws.state = state);
    }

    /// Bind or unbind an agent; binding marks the workspace occupied, unbinding empty.
    pub fn set_workspace_agent(&mut self, id: &str, agent_id: Option<AgentId>) {
        self.with_workspace(id, |ws| {
            ws.state = if agent_id.is_some() {
                WorkspaceState::Occupied
            } else {
                WorkspaceState::Empty
            };
            ws.agent_id = agent_id;
        });
    }

    /// Set messiness to an absolute value, clamped to `0..=100`.
    pub fn update_messiness(&mut self, id: &str, messiness: i32) {
        self.with_workspace(id, |ws| ws.messiness = clamp_messiness(messiness));
    }

    /// Add (or subtract) from messiness, saturating at both ends.
    pub fn increment_messiness(&mut self, id: &str, amount: i32) {
        self.with_workspace(id, |ws| {
            ws.messiness = clamp_messiness(i32::from(ws.messiness).saturating_add(amount));
        });
    }

    pub fn rename_workspace(&mut self, id: &str, name: impl Into<String>) {
        let name = name.into();
        self.with_workspace(id, |ws| ws.name = name);
    }

    pub fn set_system_prompt(&mut self, id: &str, prompt: Option<String>) {
        self.with_workspace(id, |ws| ws.system_prompt = prompt);
    }

    pub fn set_model(&mut self, id: &str, model: impl Into<String>) {
        let model = model.into();
        self.with_workspace(id, |ws| ws.model = model);
    }

    pub fn set_cli(&mut self, id: &str, cli: CliType) {
        self.with_workspace(id, |ws| ws.cli = cli);
    }

    pub fn set_mode(&mut self, id: &str, mode: Option<String>) {
        self.with_workspace(id, |ws| ws.mode = mode);
    }

    pub fn set_task_template(&mut self, id: &str, template: Option<String>) {
        self.with_workspace(id, |ws| ws.task_template = template);
    }

    pub fn set_last_output(&mut self, id: &str, output: Option<String>) {
        self.with_workspace(id, |ws| ws.last_output = output);
    }

    pub fn set_auto_run(&mut self, id: &str, auto_run: bool) {
        self.with_workspace(id, |ws| ws.auto_run = auto_run);
    }

    fn with_workspace(&mut self, id: &str, f: impl FnOnce(&mut Workspace)) {
        if let Some(ws) = self.workspaces.get_mut(id) {
            f(ws);
        }
    }
}

fn clamp_messiness(value: i32) -> u8 {
    // In range after the clamp, so the cast cannot truncate.
    value.clamp(0, i32::from(MAX_MESSINESS)) as u8
}
