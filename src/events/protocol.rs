// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Lifecycle events streamed by the runner.
//!
//! Internally tagged JSON, e.g. `{"type":"Message","agent_id":"a1","content":"hi"}`.
//! The field names are the runner's wire contract; do not rename them.

use serde::{Deserialize, Serialize};

use crate::types::{AgentId, WorkspaceId};

/// Why an agent stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StopReason {
    Completed,
    Cancelled,
    Error,
}

impl std::fmt::Display for StopReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
            Self::Error => "error",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum AgentEvent {
    Started {
        agent_id: AgentId,
        workspace_id: WorkspaceId,
    },
    Init {
        agent_id: AgentId,
        session_id: String,
        model: String,
    },
    Message {
        agent_id: AgentId,
        content: String,
    },
    ToolUse {
        agent_id: AgentId,
        tool_name: String,
        #[serde(default)]
        tool_input: serde_json::Value,
    },
    ToolResult {
        agent_id: AgentId,
        tool_name: String,
        success: bool,
    },
    Result {
        agent_id: AgentId,
        success: bool,
        duration_ms: u64,
    },
    Error {
        agent_id: AgentId,
        message: String,
    },
    Stopped {
        agent_id: AgentId,
        reason: StopReason,
    },
}

impl AgentEvent {
    pub fn agent_id(&self) -> &str {
        match self {
            Self::Started { agent_id, .. }
            | Self::Init { agent_id, .. }
            | Self::Message { agent_id, .. }
            | Self::ToolUse { agent_id, .. }
            | Self::ToolResult { agent_id, .. }
            | Self::Result { agent_id, .. }
            | Self::Error { agent_id, .. }
            | Self::Stopped { agent_id, .. } => agent_id,
        }
    }

    /// The wire tag of this event.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Started { .. } => "Started",
            Self::Init { .. } => "Init",
            Self::Message { .. } => "Message",
            Self::ToolUse { .. } => "ToolUse",
            Self::ToolResult { .. } => "ToolResult",
            Self::Result { .. } => "Result",
            Self::Error { .. } => "Error",
            Self::Stopped { .. } => "Stopped",
        }
    }

    /// Parse one JSON frame from the event stream.
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }
}
