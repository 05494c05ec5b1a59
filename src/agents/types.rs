// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Agent and log entry types.

use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{AgentId, WorkspaceId};

/// Where an agent is in its task.
///
/// ```text
/// idle ─► thinking ─► {reading, writing, running, searching} ─► thinking ─► … ─► success | error
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AgentState {
    #[default]
    Idle,
    Thinking,
    Reading,
    Writing,
    Running,
    Searching,
    Success,
    Error,
}

impl AgentState {
    /// Classify a tool invocation into the activity it represents.
    pub fn for_tool(tool_name: &str) -> Self {
        match tool_name {
            "Read" | "Glob" | "Grep" => Self::Reading,
            "Write" | "Edit" => Self::Writing,
            "WebSearch" | "WebFetch" => Self::Searching,
            _ => Self::Running,
        }
    }

    /// Success and error end an agent instance.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Success | Self::Error)
    }

    /// Thinking or using a tool.
    pub fn is_busy(&self) -> bool {
        !self.is_terminal() && *self != Self::Idle
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Thinking => "thinking",
            Self::Reading => "reading",
            Self::Writing => "writing",
            Self::Running => "running",
            Self::Searching => "searching",
            Self::Success => "success",
            Self::Error => "error",
        }
    }
}

impl std::fmt::Display for AgentState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Category of a log entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogKind {
    Info,
    Tool,
    Result,
    Error,
    Message,
}

/// A log entry before the registry stamps it.
#[derive(Debug, Clone, PartialEq)]
pub struct LogDraft {
    pub kind: LogKind,
    pub content: String,
    pub tool_name: Option<String>,
    pub tool_input: Option<serde_json::Value>,
}

impl LogDraft {
    pub fn new(kind: LogKind, content: impl Into<String>) -> Self {
        Self {
            kind,
            content: content.into(),
            tool_name: None,
            tool_input: None,
        }
    }

    pub fn info(content: impl Into<String>) -> Self {
        Self::new(LogKind::Info, content)
    }

    pub fn message(content: impl Into<String>) -> Self {
        Self::new(LogKind::Message, content)
    }

    pub fn error(content: impl Into<String>) -> Self {
        Self::new(LogKind::Error, content)
    }

    pub fn with_tool(mut self, name: impl Into<String>) -> Self {
        self.tool_name = Some(name.into());
        self
    }

    pub fn with_tool_input(mut self, input: serde_json::Value) -> Self {
        self.tool_input = Some(input);
        self
    }
}

/// A stamped, stored log entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogEntry {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    #[serde(rename = "type")]
    pub kind: LogKind,
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_input: Option<serde_json::Value>,
}

/// One task execution bound to one workspace.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Agent {
    pub id: AgentId,
    pub workspace_id: WorkspaceId,
    pub state: AgentState,
    pub task: Option<String>,
    /// 0..=100.
    pub progress: u8,
    pub logs: VecDeque<LogEntry>,
    pub session_id: Option<String>,
    pub model: Option<String>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub error: Option<String>,
}

impl Agent {
    pub(crate) fn new(id: AgentId, workspace_id: WorkspaceId) -> Self {
        Self {
            id,
            workspace_id,
            state: AgentState::Idle,
            task: None,
            progress: 0,
            logs: VecDeque::new(),
            session_id: None,
            model: None,
            started_at: None,
            completed_at: None,
            error: None,
        }
    }

    /// Contents of every `message` log, in log order.
    pub fn messages(&self) -> impl Iterator<Item = &str> {
        self.logs
            .iter()
            .filter(|log| log.kind == LogKind::Message)
            .map(|log| log.content.as_str())
    }

    /// Wall-clock run time, once the agent has finished.
    pub fn duration(&self) -> Option<chrono::Duration> {
        Some(self.completed_at? - self.started_at?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tool_classification() {
        assert_eq!(AgentState::for_tool("Read"), AgentState::Reading);
        assert_eq!(AgentState::for_tool("Glob"), AgentState::Reading);
        assert_eq!(AgentState::for_tool("Grep"), AgentState::Reading);
        assert_eq!(AgentState::for_tool("Write"), AgentState::Writing);
        assert_eq!(AgentState::for_tool("Edit"), AgentState::Writing);
        assert_eq!(AgentState::for_tool("WebSearch"), AgentState::Searching);
        assert_eq!(AgentState::for_tool("WebFetch"), AgentState::Searching);
        assert_eq!(AgentState::for_tool("Bash"), AgentState::Running);
        assert_eq!(AgentState::for_tool("read"), AgentState::Running);
    }

    #[test]
    fn test_terminal_states() {
        assert!(AgentState::Success.is_terminal());
        assert!(AgentState::Error.is_terminal());
        assert!(!AgentState::Thinking.is_terminal());
        assert!(AgentState::Writing.is_busy());
        assert!(!AgentState::Idle.is_busy());
    }

    #[test]
    fn test_log_entry_serializes_type_field() {
        let entry = LogEntry {
            id: "1".to_string(),
            timestamp: Utc::now(),
            kind: LogKind::Tool,
            content: "Using tool: Read".to_string(),
            tool_name: Some("Read".to_string()),
            tool_input: None,
        };
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["type"], "tool");
        assert_eq!(json["toolName"], "Read");
        assert!(json.get("toolInput").is_none());
    }
}
