// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Request and response bodies exchanged with the runner.

use serde::{Deserialize, Serialize};

use crate::types::{CliType, WorkspaceId};

/// Body of a dispatch request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentConfig {
    pub workspace_id: WorkspaceId,
    pub prompt: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cli: Option<CliType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mode: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allowed_tools: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub working_directory: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_prompt: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
}

impl AgentConfig {
    pub fn new(workspace_id: impl Into<WorkspaceId>, prompt: impl Into<String>) -> Self {
        Self {
            workspace_id: workspace_id.into(),
            prompt: prompt.into(),
            cli: None,
            mode: None,
            allowed_tools: None,
            working_directory: None,
            system_prompt: None,
            model: None,
        }
    }
}

/// Entry in the runner's skill listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkillInfo {
    pub name: String,
    pub description: String,
}

/// A skill's metadata plus its markdown body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkillDetail {
    pub info: SkillInfo,
    pub markdown: String,
    pub path: String,
}
