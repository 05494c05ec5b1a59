// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Configuration merging.
//!
//! Handles merging configurations from different sources with proper precedence.

use super::types::{ResolvedConfig, WorkflowConfig};
use crate::types::CliType;

/// CLI options that can override configuration.
#[derive(Debug, Clone, Default)]
pub struct CliOptions {
    pub runner_url: Option<String>,
    pub cli: Option<CliType>,
    pub model: Option<String>,
}

/// Default configuration values.
pub fn default_config() -> ResolvedConfig {
    ResolvedConfig::default()
}

/// Merge multiple configurations with precedence.
///
/// Precedence (highest to lowest):
/// 1. CLI options
/// 2. Local config (.giga.local.json)
/// 3. Workspace config (.giga.json)
/// 4. Global config (~/.giga/config.json)
/// 5. Default values
pub fn merge_config(
    global: Option<WorkflowConfig>,
    workspace: Option<WorkflowConfig>,
    local: Option<WorkflowConfig>,
    cli: CliOptions,
) -> ResolvedConfig {
    let mut result = default_config();

    for config in [global, workspace, local].iter().flatten() {
        apply_workflow_config(&mut result, config);
    }

    // Apply CLI options (highest precedence)
    apply_cli_options(&mut result, &cli);

    result
}

fn apply_workflow_config(result: &mut ResolvedConfig, config: &WorkflowConfig) {
    if let Some(ref url) = config.runner_url {
        result.runner_url = url.trim_end_matches('/').to_string();
    }

    if let Some(cli) = config.default_cli {
        result.default_cli = cli;
    }

    if let Some(ref model) = config.default_model {
        result.default_model = model.clone();
    }

    if config.default_system_prompt.is_some() {
        result.default_system_prompt = config.default_system_prompt.clone();
    }

    if let Some(ref tools) = config.allowed_tools {
        // Merge allowed-tool lists
        for tool in tools {
            if !result.allowed_tools.contains(tool) {
                result.allowed_tools.push(tool.clone());
            }
        }
    }

    if config.working_directory.is_some() {
        result.working_directory = config.working_directory.clone();
    }

    if let Some(reject) = config.reject_cycles {
        result.reject_cycles = reject;
    }

    if let Some(attempts) = config.reconnect_attempts {
        result.reconnect_attempts = attempts;
    }

    if let Some(buffer) = config.event_buffer {
        result.event_buffer = buffer;
    }
}

fn apply_cli_options(result: &mut ResolvedConfig, cli: &CliOptions) {
    if let Some(ref url) = cli.runner_url {
        result.runner_url = url.trim_end_matches('/').to_string();
    }

    if let Some(cli_type) = cli.cli {
        result.default_cli = cli_type;
    }

    if let Some(ref model) = cli.model {
        result.default_model = model.clone();
    }
}
