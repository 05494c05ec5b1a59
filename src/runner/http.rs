// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! HTTP + WebSocket runner client.
//!
//! | Operation | Request |
//! |---|---|
//! | dispatch | `POST /api/agents` |
//! | cancel | `DELETE /api/agents/{id}` |
//! | cancel all | `DELETE /api/agents/all` |
//! | list | `GET /api/agents` |
//! | CLI check | `GET /api/cli/check/{cli}` |
//! | skills | `GET /api/skills`, `GET /api/skills/{name}` |
//! | events | WebSocket `/ws` |

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode, Url};
use serde::de::DeserializeOwned;
use tracing::debug;

use super::stream::{spawn_event_stream, websocket_url, EventSubscription, StreamOptions};
use super::types::{AgentConfig, SkillDetail, SkillInfo};
use super::Runner;
use crate::error::RunnerError;
use crate::types::{AgentId, CliType};

/// Runner address used when nothing is configured.
pub const DEFAULT_RUNNER_URL: &str = "http://localhost:3000";

/// Request timeout in seconds.
const DEFAULT_TIMEOUT_SECS: u64 = 30;

pub struct HttpRunner {
    client: Client,
    base_url: String,
    stream: StreamOptions,
}

impl HttpRunner {
    pub fn new(base_url: impl Into<String>) -> Result<Self, RunnerError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            stream: StreamOptions::default(),
        })
    }

    pub fn with_stream_options(mut self, options: StreamOptions) -> Self {
        self.stream = options;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// `base/prefix/segment` with `segment` percent-encoded.
    fn url_with_segment(&self, prefix: &str, segment: &str) -> Result<Url, RunnerError> {
        let mut url = Url::parse(&self.url(prefix))
            .map_err(|e| RunnerError::Network(format!("invalid runner URL: {e}")))?;
        url.path_segments_mut()
            .map_err(|_| RunnerError::Network(format!("invalid runner URL: {}", self.base_url)))?
            .push(segment);
        Ok(url)
    }

    /// Turn a non-success response into `RunnerError::Http`.
    async fn check(response: Response) -> Result<Response, RunnerError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let message = response.text().await.unwrap_or_default();
        Err(RunnerError::http(status.as_u16(), message))
    }

    async fn get_json<T: DeserializeOwned>(&self, url: impl reqwest::IntoUrl) -> Result<T, RunnerError> {
        let response = Self::check(self.client.get(url).send().await?).await?;
        Ok(response.json().await?)
    }
}

#[async_trait]
impl Runner for HttpRunner {
    async fn start_agent(&self, config: AgentConfig) -> Result<AgentId, RunnerError> {
        debug!(workspace_id = %config.workspace_id, "POST /api/agents");
        let response = self
            .client
            .post(self.url("/api/agents"))
            .json(&config)
            .send()
            .await?;
        let response = Self::check(response).await?;
        Ok(response.json().await?)
    }

    async fn stop_agent(&self, agent_id: &str) -> Result<(), RunnerError> {
        let url = self.url_with_segment("/api/agents", agent_id)?;
        let response = self.client.delete(url).send().await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Err(RunnerError::AgentNotFound(agent_id.to_string()));
        }
        Self::check(response).await?;
        Ok(())
    }

    async fn stop_all_agents(&self) -> Result<(), RunnerError> {
        let response = self.client.delete(self.url("/api/agents/all")).send().await?;
        Self::check(response).await?;
        Ok(())
    }

    async fn list_agents(&self) -> Result<Vec<AgentId>, RunnerError> {
        self.get_json(self.url("/api/agents")).await
    }

    async fn check_cli_available(&self, cli: CliType) -> Result<bool, RunnerError> {
        let response = self
            .client
            .get(self.url(&format!("/api/cli/check/{}", cli.as_str())))
            .send()
            .await?;
        if !response.status().is_success() {
            return Ok(false);
        }
        Ok(response.json().await?)
    }

    async fn list_skills(&self) -> Result<Vec<SkillInfo>, RunnerError> {
        self.get_json(self.url("/api/skills")).await
    }

    async fn get_skill(&self, name: &str) -> Result<SkillDetail, RunnerError> {
        self.get_json(self.url_with_segment("/api/skills", name)?).await
    }

    fn subscribe(&self) -> EventSubscription {
        spawn_event_stream(websocket_url(&self.base_url), self.stream)
    }
}
