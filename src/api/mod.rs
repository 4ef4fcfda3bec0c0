//! REST API surface consumed by the dashboard.
//!
//! Modules:
//! - client: reqwest implementation of `DashboardApi`
//!
//! Endpoints (GET, JSON, no body):
//! - `/organizations/{org}/?detailed=0`  organization details without teams/projects
//! - `/organizations/{org}/teams/`        the viewer's teams (`?lite=1` for the lightweight form)
//! - `/teams/{org}/{team}/projects/`      a team's projects

pub mod client;

#[cfg(test)]
pub(crate) mod mock;

use async_trait::async_trait;

use crate::error::ApiError;
use crate::types::{Organization, Project, Team};

/// Endpoint labels for request logging.
pub const ENDPOINT_ORGANIZATION: &str = "organization";
pub const ENDPOINT_TEAMS: &str = "teams";
pub const ENDPOINT_TEAM_PROJECTS: &str = "team_projects";

/// Backend the fetchers talk to. Injected so the screen never reaches for a
/// global client.
#[async_trait]
pub trait DashboardApi: Send + Sync {
    async fn organization(&self, org_slug: &str) -> Result<Organization, ApiError>;

    async fn list_teams(&self, org_slug: &str, lite: bool) -> Result<Vec<Team>, ApiError>;

    async fn list_team_projects(
        &self,
        org_slug: &str,
        team_slug: &str,
    ) -> Result<Vec<Project>, ApiError>;
}

/// Slugs are interpolated into paths, so only URL-safe identifiers pass.
pub fn validate_slug(slug: &str) -> Result<&str, ApiError> {
    let ok = !slug.is_empty()
        && slug
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.');
    if ok && slug != "." && slug != ".." {
        Ok(slug)
    } else {
        Err(ApiError::InvalidSlug(slug.to_string()))
    }
}

pub fn organization_path(org_slug: &str) -> Result<String, ApiError> {
    Ok(format!("/organizations/{}/?detailed=0", validate_slug(org_slug)?))
}

pub fn teams_path(org_slug: &str, lite: bool) -> Result<String, ApiError> {
    let org = validate_slug(org_slug)?;
    if lite {
        Ok(format!("/organizations/{}/teams/?lite=1", org))
    } else {
        Ok(format!("/organizations/{}/teams/", org))
    }
}

pub fn team_projects_path(org_slug: &str, team_slug: &str) -> Result<String, ApiError> {
    Ok(format!(
        "/teams/{}/{}/projects/",
        validate_slug(org_slug)?,
        validate_slug(team_slug)?
    ))
}
