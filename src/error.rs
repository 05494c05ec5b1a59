// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Error types for the workflow engine.
//!
//! Store and registry mutations never fail: a mutation that names a missing
//! workspace or agent is a silent no-op. Typed errors only appear at the
//! runner boundary, in dispatch, in explicit graph validation and in config
//! loading. `thiserror` defines them and `anyhow` propagates them.

use thiserror::Error;

/// Errors returned by the external agent runner.
#[derive(Error, Debug)]
pub enum RunnerError {
    #[error("Runner unreachable: {0}")]
    Network(String),

    #[error("Runner returned {status}: {message}")]
    Http { status: u16, message: String },

    #[error("Invalid runner response: {0}")]
    Parse(String),

    #[error("Agent not found: {0}")]
    AgentNotFound(String),

    #[error("Event stream error: {0}")]
    Stream(String),
}

impl RunnerError {
    /// Create an HTTP error from a status code and message.
    pub fn http(status: u16, message: impl Into<String>) -> Self {
        Self::Http {
            status,
            message: message.into(),
        }
    }

    /// Check if retrying the same request could succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Network(_) | Self::Stream(_) => true,
            Self::Http { status, .. } => *status >= 500,
            _ => false,
        }
    }
}

impl From<reqwest::Error> for RunnerError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Self::Parse(err.to_string())
        } else if let Some(status) = err.status() {
            Self::http(status.as_u16(), err.to_string())
        } else {
            Self::Network(err.to_string())
        }
    }
}

impl From<serde_json::Error> for RunnerError {
    fn from(err: serde_json::Error) -> Self {
        Self::Parse(err.to_string())
    }
}

/// Errors surfaced to callers of the task dispatcher.
#[derive(Error, Debug)]
pub enum DispatchError {
    #[error("Workspace not found: {0}")]
    WorkspaceNotFound(String),

    #[error("Failed to start task: {0}")]
    Runner(#[from] RunnerError),

    #[error("Task for workspace {0} was superseded by a newer task")]
    Superseded(String),

    #[error("Workspace {0} has no task template")]
    NoTaskTemplate(String),
}

/// Validation errors for graph edits requested through the commander.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum GraphError {
    #[error("Workspace not found: {0}")]
    NotFound(String),

    #[error("Cannot connect workspace {0} to itself")]
    SelfLoop(String),

    #[error("Connecting {from} -> {to} would create a cycle")]
    Cycle { from: String, to: String },
}

/// Errors that can occur during configuration loading.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Config file not found: {0}")]
    NotFound(String),

    #[error("Invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },

    #[error("IO error reading config: {0}")]
    IoError(String),

    #[error("YAML parsing error: {0}")]
    YamlError(String),

    #[error("JSON parsing error: {0}")]
    JsonError(String),
}

impl From<std::io::Error> for ConfigError {
    fn from(err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::NotFound => Self::NotFound(err.to_string()),
            _ => Self::IoError(err.to_string()),
        }
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(err: serde_json::Error) -> Self {
        Self::JsonError(err.to_string())
    }
}

impl From<serde_yaml::Error> for ConfigError {
    fn from(err: serde_yaml::Error) -> Self {
        Self::YamlError(err.to_string())
    }
}

/// Result type alias using anyhow for flexible error handling.
pub type Result<T> = anyhow::Result<T>;
