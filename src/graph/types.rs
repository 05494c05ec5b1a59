// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Workspace node types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{AgentId, CliType, WorkspaceId, DEFAULT_MODEL};

/// Smallest width or height a workspace may have.
pub const MIN_WORKSPACE_SIZE: f64 = 100.0;

/// Size used for quick-created workspaces.
pub const DEFAULT_WORKSPACE_SIZE: f64 = 200.0;

/// Messiness saturates at this value.
pub const MAX_MESSINESS: u8 = 100;

/// Messiness added when a task succeeds.
pub const SUCCESS_MESSINESS: i32 = 15;

/// Messiness added when a task fails.
pub const FAILURE_MESSINESS: i32 = 5;

/// Lifecycle of the agent bound to a workspace.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkspaceState {
    #[default]
    Empty,
    Occupied,
    Working,
    Success,
    Error,
}

impl WorkspaceState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Empty => "empty",
            Self::Occupied => "occupied",
            Self::Working => "working",
            Self::Success => "success",
            Self::Error => "error",
        }
    }
}

impl std::fmt::Display for WorkspaceState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Axis-aligned rectangle on the canvas.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// A default-sized rectangle centred on a point.
    pub fn centered_at(x: f64, y: f64) -> Self {
        let half = DEFAULT_WORKSPACE_SIZE / 2.0;
        Self::new(x - half, y - half, DEFAULT_WORKSPACE_SIZE, DEFAULT_WORKSPACE_SIZE)
    }

    /// Grow either side up to the minimum workspace size.
    pub fn clamped(self) -> Self {
        Self {
            width: self.width.max(MIN_WORKSPACE_SIZE),
            height: self.height.max(MIN_WORKSPACE_SIZE),
            ..self
        }
    }
}

/// A node in the workflow graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Workspace {
    pub id: WorkspaceId,
    pub name: String,
    #[serde(flatten)]
    pub rect: Rect,
    pub state: WorkspaceState,
    pub agent_id: Option<AgentId>,
    pub messiness: u8,
    pub created_at: DateTime<Utc>,
    pub system_prompt: Option<String>,
    pub model: String,
    pub cli: CliType,
    /// Cursor-only: `agent`, `plan` or `ask`.
    pub mode: Option<String>,

    /// Prompt reused when the workspace auto-runs.
    pub task_template: Option<String>,
    /// Concatenated message output of the most recent successful task.
    pub last_output: Option<String>,
    /// Upstream workspaces, in connection order.
    pub input_connections: Vec<WorkspaceId>,
    /// Downstream workspaces, in connection order.
    pub output_connections: Vec<WorkspaceId>,
    pub auto_run: bool,
}

impl Workspace {
    /// Whether this workspace currently offers output to downstream nodes.
    pub fn has_successful_output(&self) -> bool {
        self.state == WorkspaceState::Success
            && self.last_output.as_deref().is_some_and(|out| !out.is_empty())
    }
}

/// Caller-supplied fields for a new workspace.
#[derive(Debug, Clone, PartialEq)]
pub struct WorkspaceSpec {
    pub name: Option<String>,
    pub rect: Rect,
    pub system_prompt: Option<String>,
    pub model: Option<String>,
    pub cli: CliType,
    pub mode: Option<String>,
}

impl WorkspaceSpec {
    /// Fields for a drawn rectangle.
    pub fn new(rect: Rect) -> Self {
        Self {
            name: None,
            rect,
            system_prompt: None,
            model: None,
            cli: CliType::default(),
            mode: None,
        }
    }

    /// Fields for a quick-created workspace centred on a point.
    pub fn at(x: f64, y: f64) -> Self {
        Self::new(Rect::centered_at(x, y))
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = Some(prompt.into());
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn with_cli(mut self, cli: CliType) -> Self {
        self.cli = cli;
        self
    }

    pub fn with_mode(mut self, mode: impl Into<String>) -> Self {
        self.mode = Some(mode.into());
        self
    }

    pub(crate) fn into_workspace(self, id: WorkspaceId, ordinal: u64) -> Workspace {
        Workspace {
            name: self
                .name
                .filter(|n| !n.trim().is_empty())
                .unwrap_or_else(|| format!("Workspace {ordinal}")),
            id,
            rect: self.rect.clamped(),
            state: WorkspaceState::Empty,
            agent_id: None,
            messiness: 0,
            created_at: Utc::now(),
            system_prompt: self.system_prompt,
            model: self.model.unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            cli: self.cli,
            mode: self.mode,
            task_template: None,
            last_output: None,
            input_connections: Vec::new(),
            output_connections: Vec::new(),
            auto_run: false,
        }
    }
}

/// An upstream workspace and its latest output, if any.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkspaceInput {
    pub id: WorkspaceId,
    pub output: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rect_clamped_to_minimum() {
        let rect = Rect::new(0.0, 0.0, 20.0, 350.0).clamped();
        assert_eq!(rect.width, MIN_WORKSPACE_SIZE);
        assert_eq!(rect.height, 350.0);
    }

    #[test]
    fn test_centered_rect() {
        let rect = Rect::centered_at(400.0, 300.0);
        assert_eq!(rect, Rect::new(300.0, 200.0, 200.0, 200.0));
    }

    #[test]
    fn test_spec_defaults() {
        let ws = WorkspaceSpec::at(0.0, 0.0).into_workspace("w".to_string(), 3);
        assert_eq!(ws.name, "Workspace 3");
        assert_eq!(ws.model, DEFAULT_MODEL);
        assert_eq!(ws.state, WorkspaceState::Empty);
        assert!(!ws.auto_run);
        assert!(ws.task_template.is_none());
        assert!(ws.last_output.is_none());
        assert!(ws.input_connections.is_empty() && ws.output_connections.is_empty());
    }

    #[test]
    fn test_workspace_serializes_camel_case() {
        let ws = WorkspaceSpec::at(0.0, 0.0)
            .named("A")
            .into_workspace("w".to_string(), 1);
        let json = serde_json::to_value(&ws).unwrap();
        assert_eq!(json["inputConnections"], serde_json::json!([]));
        assert_eq!(json["autoRun"], serde_json::json!(false));
        assert_eq!(json["width"], serde_json::json!(200.0));
        assert_eq!(json["state"], serde_json::json!("empty"));
    }
}
