// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Shared type definitions.
//!
//! Identifiers and per-workspace backend settings used by every other module.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Opaque workspace identifier, assigned by the graph store.
pub type WorkspaceId = String;

/// Opaque agent identifier, assigned by the external runner.
pub type AgentId = String;

/// Model used when a workspace does not pick one.
pub const DEFAULT_MODEL: &str = "claude-sonnet-4-20250514";

/// CLI backend that executes a workspace's task.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CliType {
    /// Claude Code.
    #[default]
    Claude,
    /// Cursor Agent CLI.
    Cursor,
    /// Kilo Code.
    Kilo,
    /// Gemini CLI.
    Gemini,
    /// Grok CLI.
    Grok,
    /// DeepSeek CLI.
    Deepseek,
}

impl CliType {
    /// Every supported backend, in display order.
    pub const ALL: [CliType; 6] = [
        CliType::Claude,
        CliType::Cursor,
        CliType::Kilo,
        CliType::Gemini,
        CliType::Grok,
        CliType::Deepseek,
    ];

    /// Wire name of the backend.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Claude => "claude",
            Self::Cursor => "cursor",
            Self::Kilo => "kilo",
            Self::Gemini => "gemini",
            Self::Grok => "grok",
            Self::Deepseek => "deepseek",
        }
    }

    /// Executable the runner looks for on this backend.
    pub fn binary(&self) -> &'static str {
        match self {
            Self::Cursor => "agent",
            other => other.as_str(),
        }
    }

    /// Whether the backend honours a `mode` (agent / plan / ask).
    ///
    /// Dispatch sends the workspace's mode to every backend and the runner
    /// decides what to do with it. This is a hint for callers picking a mode.
    pub fn supports_mode(&self) -> bool {
        matches!(self, Self::Cursor)
    }
}

impl fmt::Display for CliType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CliType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|cli| cli.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown CLI backend: {s}"))
    }
}

/// A selectable model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModelOption {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
}

/// Models offered for per-workspace selection.
pub const AVAILABLE_MODELS: &[ModelOption] = &[
    ModelOption {
        id: "claude-sonnet-4-20250514",
        name: "Claude Sonnet 4",
        description: "Fast & capable (default)",
    },
    ModelOption {
        id: "claude-opus-4-20250514",
        name: "Claude Opus 4",
        description: "Most powerful",
    },
    ModelOption {
        id: "claude-3-5-haiku-20241022",
        name: "Claude 3.5 Haiku",
        description: "Fastest, lightweight",
    },
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_type_round_trips_through_str() {
        for cli in CliType::ALL {
            assert_eq!(cli.as_str().parse::<CliType>().unwrap(), cli);
        }
        assert_eq!("Gemini".parse::<CliType>().unwrap(), CliType::Gemini);
        assert!("vim".parse::<CliType>().is_err());
    }

    #[test]
    fn test_cli_type_serde_is_lowercase() {
        let json = serde_json::to_string(&CliType::Deepseek).unwrap();
        assert_eq!(json, "\"deepseek\"");
    }

    #[test]
    fn test_cursor_binary_and_mode() {
        assert_eq!(CliType::Cursor.binary(), "agent");
        assert_eq!(CliType::Claude.binary(), "claude");
        assert!(CliType::Cursor.supports_mode());
        assert!(!CliType::Kilo.supports_mode());
    }

    #[test]
    fn test_default_model_is_listed() {
        assert!(AVAILABLE_MODELS.iter().any(|m| m.id == DEFAULT_MODEL));
    }
}
