// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Agents: one per dispatched task, keyed by the runner-assigned id.

mod registry;
mod types;

pub use registry::{AgentRegistry, MAX_LOG_ENTRIES};
pub use types::{Agent, AgentState, LogDraft, LogEntry, LogKind};
