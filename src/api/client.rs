//! HTTP client for the dashboard REST API.
//!
//! Uses reqwest with Bearer token auth. Every path is joined onto the
//! configured base URL (e.g. `https://sentry.io/api/0/`).

use std::time::{Duration, Instant};

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use url::Url;

use super::{
    organization_path, team_projects_path, teams_path, DashboardApi, ENDPOINT_ORGANIZATION,
    ENDPOINT_TEAMS, ENDPOINT_TEAM_PROJECTS,
};
use crate::config::Config;
use crate::error::ApiError;
use crate::types::{Organization, Project, Team};

/// Longest error body kept in an `ApiError::Status` message.
const MAX_ERROR_BODY_CHARS: usize = 512;

pub struct HttpApiClient {
    client: reqwest::Client,
    base: Url,
    auth_token: Option<String>,
}

impl HttpApiClient {
    pub fn new(
        api_url: &str,
        auth_token: Option<&str>,
        timeout: Duration,
    ) -> Result<Self, ApiError> {
        // Url::join drops the last segment unless the base ends in '/'.
        let mut base = api_url.to_string();
        if !base.ends_with('/') {
            base.push('/');
        }
        let base = Url::parse(&base).map_err(|e| ApiError::InvalidUrl(format!("{}: {}", base, e)))?;

        let client = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            base,
            auth_token: auth_token.map(str::to_string),
        })
    }

    pub fn from_config(config: &Config) -> Result<Self, ApiError> {
        Self::new(
            &config.api_url,
            config.auth_token.as_deref(),
            Duration::from_secs(config.request_timeout_secs),
        )
    }

    /// Resolve an endpoint path (leading '/' optional) against the base URL.
    pub fn endpoint_url(&self, path: &str) -> Result<Url, ApiError> {
        self.base
            .join(path.trim_start_matches('/'))
            .map_err(|e| ApiError::InvalidUrl(format!("{}: {}", path, e)))
    }

    async fn get_json<T: DeserializeOwned>(&self, endpoint: &str, path: &str) -> Result<T, ApiError> {
        let url = self.endpoint_url(path)?;
        let started = Instant::now();

        let result = self.send_get(url).await;
        log::debug!(
            "API: {} {} in {}ms",
            endpoint,
            if result.is_ok() { "ok" } else { "failed" },
            started.elapsed().as_millis()
        );
        result
    }

    async fn send_get<T: DeserializeOwned>(&self, url: Url) -> Result<T, ApiError> {
        let mut request = self
            .client
            .get(url.clone())
            .header(reqwest::header::ACCEPT, "application/json");
        if let Some(token) = &self.auth_token {
            request = request.bearer_auth(token);
        }

        let resp = request.send().await?;
        let status = resp.status();

        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            log::warn!("API: GET {} returned {}", url.path(), status);
            return Err(ApiError::Status {
                status: status.as_u16(),
                message: truncate(&text, MAX_ERROR_BODY_CHARS),
            });
        }

        Ok(resp.json::<T>().await?)
    }
}

fn truncate(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}…", &text[..idx]),
        None => text.to_string(),
    }
}

#[async_trait]
impl DashboardApi for HttpApiClient {
    async fn organization(&self, org_slug: &str) -> Result<Organization, ApiError> {
        let path = organization_path(org_slug)?;
        self.get_json(ENDPOINT_ORGANIZATION, &path).await
    }

    async fn list_teams(&self, org_slug: &str, lite: bool) -> Result<Vec<Team>, ApiError> {
        let path = teams_path(org_slug, lite)?;
        self.get_json(ENDPOINT_TEAMS, &path).await
    }

    async fn list_team_projects(
        &self,
        org_slug: &str,
        team_slug: &str,
    ) -> Result<Vec<Project>, ApiError> {
        let path = team_projects_path(org_slug, team_slug)?;
        self.get_json(ENDPOINT_TEAM_PROJECTS, &path).await
    }
}
