// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Commander configuration.

use crate::dispatch::TaskOptions;

/// Events held while waiting for a dispatch acknowledgment.
pub const DEFAULT_ORPHAN_CAPACITY: usize = 256;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommanderConfig {
    /// Tools allowed when a dispatch does not name its own.
    pub allowed_tools: Option<Vec<String>>,
    /// Working directory passed to the runner when a dispatch does not name its own.
    pub working_directory: Option<String>,
    /// Refuse connections that would close a cycle.
    pub reject_cycles: bool,
    /// Bound on events buffered for not-yet-registered agents.
    pub orphan_capacity: usize,
}

impl Default for CommanderConfig {
    fn default() -> Self {
        Self {
            allowed_tools: None,
            working_directory: None,
            reject_cycles: false,
            orphan_capacity: DEFAULT_ORPHAN_CAPACITY,
        }
    }
}

impl CommanderConfig {
    /// Fill unset dispatch options from the defaults.
    pub fn task_options(&self, mut options: TaskOptions) -> TaskOptions {
        if options.allowed_tools.is_none() {
            options.allowed_tools = self.allowed_tools.clone();
        }
        if options.working_directory.is_none() {
            options.working_directory = self.working_directory.clone();
        }
        options
    }
}
