// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Runner events and their reconciliation into workflow state.

mod protocol;
pub mod reconciler;

pub use protocol::{AgentEvent, StopReason};
pub use reconciler::{apply, AutoRunTrigger, OUTPUT_SEPARATOR};
