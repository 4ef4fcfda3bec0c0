//! Data model shared by the fetchers, grouping utilities and the dashboard.
//!
//! Field names follow the REST API's camelCase JSON.

use std::collections::{BTreeMap, BTreeSet, HashSet};

use serde::{Deserialize, Serialize};

use crate::error::FetchFailure;

// ============================================================================
// Access scopes
// ============================================================================

pub const SCOPE_PROJECT_ADMIN: &str = "project:admin";
pub const SCOPE_PROJECT_READ: &str = "project:read";
pub const SCOPE_TEAM_ADMIN: &str = "team:admin";
pub const SCOPE_TEAM_READ: &str = "team:read";

/// Opaque capability set granted to the viewer on an organization.
///
/// Only membership can be tested. Nothing here iterates the scopes or
/// interprets their contents.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Access(HashSet<String>);

impl Access {
    pub fn new<I, S>(scopes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(scopes.into_iter().map(Into::into).collect())
    }

    pub fn has(&self, scope: &str) -> bool {
        self.0.contains(scope)
    }
}

// ============================================================================
// Organization / Team / Project
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Organization {
    #[serde(default)]
    pub id: String,
    pub slug: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub access: Access,
    #[serde(default)]
    pub features: Vec<String>,
}

/// Reference from a project to one of the teams that owns it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamRef {
    pub slug: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: String,
    pub slug: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub platform: Option<String>,
    #[serde(default)]
    pub is_bookmarked: bool,
    /// Timestamp of the first ingested event. `None` means the project has
    /// never received data.
    #[serde(default)]
    pub first_event: Option<String>,
    #[serde(default)]
    pub teams: Vec<TeamRef>,
}

impl Project {
    pub fn is_fresh(&self) -> bool {
        self.first_event.is_none()
    }

    pub fn belongs_to(&self, team_slug: &str) -> bool {
        self.teams.iter().any(|t| t.slug == team_slug)
    }

    /// Record `team_slug` as an owner if the payload did not already say so.
    pub fn stamp_team(&mut self, team_slug: &str) {
        if !self.belongs_to(team_slug) {
            self.teams.push(TeamRef {
                slug: team_slug.to_string(),
            });
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Team {
    pub id: String,
    pub slug: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub is_member: bool,
    #[serde(default)]
    pub member_count: Option<u32>,
    /// Embedded project summaries. Possibly stale, and absent from the lite
    /// listing.
    #[serde(default)]
    pub projects: Vec<Project>,
}

impl Team {
    pub fn display_name(&self) -> &str {
        if self.name.is_empty() {
            &self.slug
        } else {
            &self.name
        }
    }
}

// ============================================================================
// Fetch state
// ============================================================================

/// Asynchronous state owned by a fetcher. Consumers receive clones.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FetchState<T> {
    pub loading: bool,
    pub data: T,
    pub error: Option<FetchFailure>,
}

impl<T: Default> FetchState<T> {
    /// State from mount until the first response: loading, empty data.
    pub fn loading() -> Self {
        Self {
            loading: true,
            data: T::default(),
            error: None,
        }
    }

    pub fn ready(data: T) -> Self {
        Self {
            loading: false,
            data,
            error: None,
        }
    }

    pub fn failed(error: FetchFailure) -> Self {
        Self {
            loading: false,
            data: T::default(),
            error: Some(error),
        }
    }
}

impl<T: Default> Default for FetchState<T> {
    fn default() -> Self {
        Self::loading()
    }
}

/// Aggregate result of the per-team project fan-out.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamProjects {
    pub by_team: BTreeMap<String, Vec<Project>>,
    /// Teams whose request failed. Each still has an (empty) entry in
    /// `by_team`.
    pub failed_teams: BTreeSet<String>,
}

impl TeamProjects {
    /// Flattened, deduplicated and sorted view over every team's projects.
    pub fn projects(&self) -> Vec<Project> {
        let mut projects =
            crate::grouping::dedupe_projects(self.by_team.values().flatten().cloned());
        crate::grouping::sort_projects(&mut projects);
        projects
    }

    pub fn is_partial(&self) -> bool {
        !self.failed_teams.is_empty()
    }
}
