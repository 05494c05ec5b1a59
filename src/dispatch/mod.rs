// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Prompt composition and task dispatch.

pub mod compose;
pub mod dispatcher;

pub use compose::{compose_prompt, INPUT_PLACEHOLDER};
pub use dispatcher::{
    begin_stop, dispatch_failed, finish_stop, prepare, register, remove_workspace, TaskOptions,
};
