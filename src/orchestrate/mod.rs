// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Workflow orchestration.
//!
//! The [`Commander`] ties the pieces together: it owns the workflow state,
//! consumes the runner's event stream through the reconciler and dispatches
//! tasks, including auto-run cascades, through the dispatcher.
//!
//! # Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use giga_workflow::graph::WorkspaceSpec;
//! use giga_workflow::orchestrate::{Commander, CommanderConfig};
//! use giga_workflow::runner::HttpRunner;
//! use giga_workflow::dispatch::TaskOptions;
//!
//! let runner = Arc::new(HttpRunner::new("http://localhost:3000")?);
//! let commander = Commander::new(runner, CommanderConfig::default());
//! let mut events = commander.spawn_event_loop();
//! events.wait_connected().await;
//!
//! let a = commander.add_workspace(WorkspaceSpec::at(0.0, 0.0).named("Report"));
//! let b = commander.add_workspace(WorkspaceSpec::at(300.0, 0.0).named("Summary"));
//! commander.connect(&a, &b)?;
//! commander.with_graph_mut(|graph| {
//!     graph.set_auto_run(&b, true);
//!     graph.set_task_template(&b, Some("summarize {{input}}".into()));
//! });
//!
//! commander.start_task(&a, "write a report", TaskOptions::new()).await?;
//! ```
//!
//! # Ordering
//!
//! Events are handled one at a time in arrival order. Auto-run dispatches
//! are prepared inside the event's handling and their runner calls run as
//! spawned tasks, so a burst of completions never stalls the event loop.

pub mod commander;
pub mod types;

pub use commander::{Commander, EventLoop};
pub use types::{CommanderConfig, DEFAULT_ORPHAN_CAPACITY};
