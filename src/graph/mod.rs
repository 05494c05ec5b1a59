// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Workflow graph: workspaces and the input/output edges between them.
//!
//! A workspace is a rectangle on the canvas bound to at most one agent.
//! Edges carry the output of one workspace into the prompt of another:
//!
//! ```text
//!   ┌──────────┐  output   input  ┌──────────┐
//!   │  Report  │ ───────────────► │ Summary  │  autoRun + taskTemplate
//!   └──────────┘                  └──────────┘
//! ```
//!
//! The store is pure data. The reconciler and dispatcher decide when edges fire.

mod gestures;
mod store;
mod types;

pub use gestures::{DrawingState, Point, PortKind, WiringState};
pub use store::ConnectionGraph;
pub use types::{
    Rect, Workspace, WorkspaceInput, WorkspaceSpec, WorkspaceState, DEFAULT_WORKSPACE_SIZE,
    FAILURE_MESSINESS, MAX_MESSINESS, MIN_WORKSPACE_SIZE, SUCCESS_MESSINESS,
};
