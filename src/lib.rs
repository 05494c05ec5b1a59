// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Giga Workflow - a workflow graph engine for coding-agent CLIs.
//!
//! Workspaces are nodes on a canvas. Each one is bound to at most one agent
//! (Claude, Cursor, Kilo, Gemini, Grok or DeepSeek) executed by an external
//! runner. Directed connections feed the final output of one workspace into
//! the prompt of the next, and downstream workspaces can run automatically
//! once every upstream input has succeeded.
//!
//! # Architecture
//!
//! The crate is organized into the following modules:
//!
//! - [`types`] - Shared ids, CLI backends and the model catalogue
//! - [`error`] - Error types and result aliases
//! - [`graph`] - Connection graph store and canvas gesture state
//! - [`agents`] - Agent registry and agent state machine
//! - [`state`] - The workflow state container
//! - [`events`] - Runner event protocol and the event reconciler
//! - [`dispatch`] - Prompt composition and task dispatch
//! - [`runner`] - The runner boundary (trait + HTTP/WebSocket client)
//! - [`orchestrate`] - The commander that owns state and drains events
//! - [`config`] - Configuration loading and merging
//! - [`telemetry`] - Tracing initialization and workflow metrics
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use giga_workflow::config::{load_config, CliOptions};
//! use giga_workflow::orchestrate::Commander;
//! use giga_workflow::runner::HttpRunner;
//!
//! let config = load_config(".".as_ref(), CliOptions::default())?;
//! let runner = HttpRunner::new(&config.runner_url)?.with_stream_options(config.stream_options());
//! let commander = Commander::new(Arc::new(runner), config.commander_config());
//! let mut events = commander.spawn_event_loop();
//! events.wait_connected().await;
//!
//! let ws = commander.add_workspace(config.workspace_spec(0.0, 0.0));
//! commander.start_task(&ws, "count to 3", Default::default()).await?;
//! ```

pub mod agents;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod events;
pub mod graph;
pub mod orchestrate;
pub mod runner;
pub mod state;
pub mod telemetry;
pub mod types;

// Re-export commonly used types at crate root
pub use agents::{Agent, AgentRegistry, AgentState, LogEntry, LogKind};
pub use error::{ConfigError, DispatchError, GraphError, Result, RunnerError};
pub use events::{AgentEvent, StopReason};
pub use graph::{ConnectionGraph, Rect, Workspace, WorkspaceSpec, WorkspaceState};
pub use orchestrate::{Commander, CommanderConfig};
pub use runner::{AgentConfig, HttpRunner, Runner};
pub use state::WorkflowState;
pub use types::{AgentId, CliType, WorkspaceId};

/// Giga version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
