// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! The external agent runner boundary.
//!
//! The runner executes agent CLIs and streams lifecycle events back. This
//! crate only talks to it through [`Runner`]; [`HttpRunner`] is the
//! HTTP + WebSocket implementation.

mod http;
mod stream;
mod types;

use async_trait::async_trait;
use crate::error::RunnerError;
use crate::types::{AgentId, CliType};

pub use http::{HttpRunner, DEFAULT_RUNNER_URL};
pub use stream::{
    parse_frame, spawn_event_stream, websocket_url, EventSubscription, StreamOptions, StreamStatus,
};
pub use types::{AgentConfig, SkillDetail, SkillInfo};

/// Operations offered by the agent runner.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Runner: Send + Sync {
    /// Dispatch a task. Returns the runner-assigned agent id.
    async fn start_agent(&self, config: AgentConfig) -> Result<AgentId, RunnerError>;

    /// Request cancellation. Local state changes only when `Stopped` arrives.
    async fn stop_agent(&self, agent_id: &str) -> Result<(), RunnerError>;

    async fn stop_all_agents(&self) -> Result<(), RunnerError>;

    /// Ids of every agent the runner currently knows about.
    async fn list_agents(&self) -> Result<Vec<AgentId>, RunnerError>;

    async fn check_cli_available(&self, cli: CliType) -> Result<bool, RunnerError>;

    async fn list_skills(&self) -> Result<Vec<SkillInfo>, RunnerError>;

    async fn get_skill(&self, name: &str) -> Result<SkillDetail, RunnerError>;

    /// Open the event subscription. Events arrive in runner emission order.
    fn subscribe(&self) -> EventSubscription;
}
