//! HTTP client for the MindWatch backend.
//!
//! Every endpoint takes the credential as a `token` query parameter. The
//! trait seam exists so the orchestrator and conversation manager can be
//! driven by a mock in tests.

use crate::chat::ChatRequest;
use crate::models::{ContentAnalysis, MusicAnalysis, UserProfile};
use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use tracing::debug;

/// Backend operations the core components depend on.
#[async_trait]
pub trait WellnessApi: Send + Sync {
    /// `GET /api/auth/me` - identity plus per-source connection flags.
    async fn fetch_profile(&self, token: &str) -> Result<UserProfile>;

    /// `GET /api/connectors/spotify/analysis` - music-listening analysis.
    async fn fetch_music_analysis(&self, token: &str) -> Result<MusicAnalysis>;

    /// `POST /api/connectors/youtube/analyze` - upload watch history for
    /// analysis. `search_history` is optional.
    async fn analyze_watch_history(
        &self,
        token: &str,
        watch_history: &Path,
        search_history: Option<&Path>,
    ) -> Result<ContentAnalysis>;

    /// `GET /api/chat/starters` - suggested conversation starters.
    async fn fetch_starters(&self, token: &str) -> Result<Vec<String>>;

    /// `POST /api/chat/message` - send one chat turn, returning the
    /// assistant's reply text.
    async fn send_chat(&self, token: &str, request: &ChatRequest) -> Result<String>;
}

#[derive(Debug, Deserialize)]
struct StartersResponse {
    starters: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    response: String,
}

/// reqwest-backed client.
pub struct HttpApi {
    base_url: String,
    client: reqwest::Client,
}

impl HttpApi {
    pub fn new(base_url: impl Into<String>, timeout_seconds: u64) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_seconds))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client,
        })
    }

    /// URL the browser should open to start the Google sign-in flow.
    pub fn login_url(&self) -> String {
        format!("{}/api/auth/google", self.base_url)
    }

    /// URL the browser should open to link the Spotify connector.
    /// Completion is signaled by `spotify=connected` on the redirect back.
    pub fn connect_url(&self, token: &str) -> String {
        format!(
            "{}/api/connectors/spotify/connect?token={}",
            self.base_url, token
        )
    }

    fn endpoint(&self, path: &str, token: &str) -> String {
        format!("{}{}?token={}", self.base_url, path, token)
    }

    fn map_send_error(&self, e: reqwest::Error) -> anyhow::Error {
        if e.is_timeout() {
            anyhow::anyhow!("Request timed out")
        } else if e.is_connect() {
            anyhow::anyhow!("Cannot connect to MindWatch backend at {}", self.base_url)
        } else {
            anyhow::anyhow!("Failed to send request: {}", e)
        }
    }

    async fn check_status(&self, response: reqwest::Response) -> Result<reqwest::Response> {
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(anyhow::anyhow!("MindWatch API error {}: {}", status, body));
        }
        Ok(response)
    }
}

#[async_trait]
impl WellnessApi for HttpApi {
    async fn fetch_profile(&self, token: &str) -> Result<UserProfile> {
        let url = self.endpoint("/api/auth/me", token);
        debug!("Fetching profile");

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| self.map_send_error(e))?;

        self.check_status(response)
            .await?
            .json()
            .await
            .context("Failed to parse profile response")
    }

    async fn fetch_music_analysis(&self, token: &str) -> Result<MusicAnalysis> {
        let url = self.endpoint("/api/connectors/spotify/analysis", token);
        debug!("Fetching music analysis");

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| self.map_send_error(e))?;

        self.check_status(response)
            .await?
            .json()
            .await
            .context("Failed to parse music analysis response")
    }

    async fn analyze_watch_history(
        &self,
        token: &str,
        watch_history: &Path,
        search_history: Option<&Path>,
    ) -> Result<ContentAnalysis> {
        let url = self.endpoint("/api/connectors/youtube/analyze", token);
        debug!("Uploading watch history for analysis");

        let watch_bytes = std::fs::read(watch_history)
            .with_context(|| format!("Failed to read {}", watch_history.display()))?;
        let mut form = reqwest::multipart::Form::new().part(
            "watch_history",
            reqwest::multipart::Part::bytes(watch_bytes)
                .file_name("watch-history.html")
                .mime_str("text/html")?,
        );

        if let Some(search) = search_history {
            let search_bytes = std::fs::read(search)
                .with_context(|| format!("Failed to read {}", search.display()))?;
            form = form.part(
                "search_history",
                reqwest::multipart::Part::bytes(search_bytes)
                    .file_name("search-history.html")
                    .mime_str("text/html")?,
            );
        }

        let response = self
            .client
            .post(&url)
            .multipart(form)
            .send()
            .await
            .map_err(|e| self.map_send_error(e))?;

        self.check_status(response)
            .await?
            .json()
            .await
            .context("Failed to parse content analysis response")
    }

    async fn fetch_starters(&self, token: &str) -> Result<Vec<String>> {
        let url = self.endpoint("/api/chat/starters", token);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| self.map_send_error(e))?;

        let parsed: StartersResponse = self
            .check_status(response)
            .await?
            .json()
            .await
            .context("Failed to parse starters response")?;
        Ok(parsed.starters)
    }

    async fn send_chat(&self, token: &str, request: &ChatRequest) -> Result<String> {
        let url = self.endpoint("/api/chat/message", token);
        debug!("Sending chat message ({} history entries)", request.history.len());

        let response = self
            .client
            .post(&url)
            .json(request)
            .send()
            .await
            .map_err(|e| self.map_send_error(e))?;

        let parsed: ChatResponse = self
            .check_status(response)
            .await?
            .json()
            .await
            .context("Failed to parse chat response")?;
        Ok(parsed.response)
    }
}
