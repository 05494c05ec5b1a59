// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Configuration type definitions.
//!
//! [`WorkflowConfig`] is the on-disk shape (every field optional, camelCase,
//! JSON or YAML). [`ResolvedConfig`] is the merged result with defaults applied.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::graph::WorkspaceSpec;
use crate::orchestrate::{CommanderConfig, DEFAULT_ORPHAN_CAPACITY};
use crate::runner::{StreamOptions, DEFAULT_RUNNER_URL};
use crate::types::{CliType, DEFAULT_MODEL};

/// Reconnects attempted after the event stream drops.
pub const DEFAULT_RECONNECT_ATTEMPTS: u32 = 5;

/// Capacity of the runner event channel.
pub const DEFAULT_EVENT_BUFFER: usize = 256;

/// Workflow configuration as written in `.giga.json` and friends.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowConfig {
    /// Base URL of the agent runner
    #[serde(skip_serializing_if = "Option::is_none")]
    pub runner_url: Option<String>,

    /// CLI used for new workspaces
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_cli: Option<CliType>,

    /// Model used for new workspaces
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_model: Option<String>,

    /// System prompt given to new workspaces
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_system_prompt: Option<String>,

    /// Tools the runner may allow the agent to use
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allowed_tools: Option<Vec<String>>,

    /// Directory agents run in
    #[serde(skip_serializing_if = "Option::is_none")]
    pub working_directory: Option<String>,

    /// Refuse connections that would close a cycle
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reject_cycles: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub reconnect_attempts: Option<u32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub event_buffer: Option<usize>,
}

/// Fully resolved configuration.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedConfig {
    pub runner_url: String,
    pub default_cli: CliType,
    pub default_model: String,
    pub default_system_prompt: Option<String>,
    /// Union of every layer's list, first occurrence first.
    pub allowed_tools: Vec<String>,
    pub working_directory: Option<String>,
    pub reject_cycles: bool,
    pub reconnect_attempts: u32,
    pub event_buffer: usize,
}

impl Default for ResolvedConfig {
    fn default() -> Self {
        Self {
            runner_url: DEFAULT_RUNNER_URL.to_string(),
            default_cli: CliType::default(),
            default_model: DEFAULT_MODEL.to_string(),
            default_system_prompt: None,
            allowed_tools: Vec::new(),
            working_directory: None,
            reject_cycles: false,
            reconnect_attempts: DEFAULT_RECONNECT_ATTEMPTS,
            event_buffer: DEFAULT_EVENT_BUFFER,
        }
    }
}

impl ResolvedConfig {
    /// Reject values the runner client cannot use.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.runner_url.starts_with("http://") || self.runner_url.starts_with("https://")) {
            return Err(ConfigError::InvalidValue {
                field: "runnerUrl".to_string(),
                message: format!("expected an http(s) URL, got {:?}", self.runner_url),
            });
        }
        if self.event_buffer == 0 {
            return Err(ConfigError::InvalidValue {
                field: "eventBuffer".to_string(),
                message: "must be at least 1".to_string(),
            });
        }
        Ok(())
    }

    pub fn commander_config(&self) -> CommanderConfig {
        CommanderConfig {
            allowed_tools: (!self.allowed_tools.is_empty()).then(|| self.allowed_tools.clone()),
            working_directory: self.working_directory.clone(),
            reject_cycles: self.reject_cycles,
            orphan_capacity: DEFAULT_ORPHAN_CAPACITY,
        }
    }

    pub fn stream_options(&self) -> StreamOptions {
        StreamOptions {
            reconnect_attempts: self.reconnect_attempts,
            buffer: self.event_buffer,
            ..StreamOptions::default()
        }
    }

    /// A quick-create spec carrying the configured workspace defaults.
    pub fn workspace_spec(&self, x: f64, y: f64) -> WorkspaceSpec {
        let spec = WorkspaceSpec::at(x, y)
            .with_cli(self.default_cli)
            .with_model(self.default_model.clone());
        match &self.default_system_prompt {
            Some(prompt) => spec.with_system_prompt(prompt.clone()),
            None => spec,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_camel_case() {
        let config: WorkflowConfig = serde_json::from_str(
            r#"{"runnerUrl": "http://runner:4000", "defaultCli": "gemini", "rejectCycles": true}"#,
        )
        .unwrap();
        assert_eq!(config.runner_url.as_deref(), Some("http://runner:4000"));
        assert_eq!(config.default_cli, Some(CliType::Gemini));
        assert_eq!(config.reject_cycles, Some(true));
    }

    #[test]
    fn test_serialize_skips_unset() {
        let config = WorkflowConfig {
            default_model: Some("opus".to_string()),
            ..Default::default()
        };
        assert_eq!(serde_json::to_string(&config).unwrap(), r#"{"defaultModel":"opus"}"#);
    }

    #[test]
    fn test_validate() {
        assert!(ResolvedConfig::default().validate().is_ok());

        let bad_url = ResolvedConfig {
            runner_url: "localhost:3000".to_string(),
            ..Default::default()
        };
        assert!(matches!(
            bad_url.validate(),
            Err(ConfigError::InvalidValue { field, .. }) if field == "runnerUrl"
        ));

        let no_buffer = ResolvedConfig {
            event_buffer: 0,
            ..Default::default()
        };
        assert!(no_buffer.validate().is_err());
    }

    #[test]
    fn test_workspace_spec_uses_defaults() {
        let config = ResolvedConfig {
            default_cli: CliType::Deepseek,
            default_system_prompt: Some("terse".to_string()),
            ..Default::default()
        };
        let spec = config.workspace_spec(10.0, 10.0);
        assert_eq!(spec.cli, CliType::Deepseek);
        assert_eq!(spec.model.as_deref(), Some(DEFAULT_MODEL));
        assert_eq!(spec.system_prompt.as_deref(), Some("terse"));
    }

    #[test]
    fn test_commander_config_omits_empty_tools() {
        assert!(ResolvedConfig::default().commander_config().allowed_tools.is_none());
    }
}
