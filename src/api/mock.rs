//! In-memory `DashboardApi` double for tests.
//!
//! Responses are keyed by slug. A gate holds a single call open until the
//! test releases it, which lets tests finish requests out of order.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::oneshot;

use super::DashboardApi;
use crate::error::ApiError;
use crate::types::{Access, Organization, Project, Team, TeamRef};

#[derive(Default)]
pub(crate) struct MockApi {
    teams: Mutex<HashMap<String, Result<Vec<Team>, u16>>>,
    projects: Mutex<HashMap<String, Result<Vec<Project>, u16>>>,
    gates: Mutex<HashMap<String, oneshot::Receiver<()>>>,
    pub team_calls: AtomicUsize,
    pub project_calls: AtomicUsize,
    pub lite_calls: AtomicUsize,
    /// `"{org}/{team}"` for every project request, in call order.
    project_requests: Mutex<Vec<String>>,
}

impl MockApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_teams(self, org: &str, teams: Vec<Team>) -> Self {
        self.teams.lock().insert(org.to_string(), Ok(teams));
        self
    }

    pub fn with_teams_error(self, org: &str, status: u16) -> Self {
        self.teams.lock().insert(org.to_string(), Err(status));
        self
    }

    pub fn with_projects(self, team: &str, projects: Vec<Project>) -> Self {
        self.projects.lock().insert(team.to_string(), Ok(projects));
        self
    }

    pub fn with_projects_error(self, team: &str, status: u16) -> Self {
        self.projects.lock().insert(team.to_string(), Err(status));
        self
    }

    /// Hold the next teams request for `org` until the sender fires.
    pub fn gate_teams(&self, org: &str) -> oneshot::Sender<()> {
        self.gate(format!("teams:{}", org))
    }

    /// Hold the next projects request for `team` until the sender fires.
    pub fn gate_projects(&self, team: &str) -> oneshot::Sender<()> {
        self.gate(format!("projects:{}", team))
    }

    pub fn team_calls(&self) -> usize {
        self.team_calls.load(Ordering::SeqCst)
    }

    pub fn project_calls(&self) -> usize {
        self.project_calls.load(Ordering::SeqCst)
    }

    pub fn project_requests(&self) -> Vec<String> {
        self.project_requests.lock().clone()
    }

    fn gate(&self, key: String) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        self.gates.lock().insert(key, rx);
        tx
    }

    async fn wait_gate(&self, key: &str) {
        let gate = self.gates.lock().remove(key);
        if let Some(rx) = gate {
            let _ = rx.await;
        }
    }
}

fn status_error(status: u16) -> ApiError {
    ApiError::Status {
        status,
        message: "mock failure".to_string(),
    }
}

#[async_trait]
impl DashboardApi for MockApi {
    async fn organization(&self, org_slug: &str) -> Result<Organization, ApiError> {
        Ok(org(org_slug, &[]))
    }

    async fn list_teams(&self, org_slug: &str, lite: bool) -> Result<Vec<Team>, ApiError> {
        self.team_calls.fetch_add(1, Ordering::SeqCst);
        if lite {
            self.lite_calls.fetch_add(1, Ordering::SeqCst);
        }
        self.wait_gate(&format!("teams:{}", org_slug)).await;
        let response = self.teams.lock().get(org_slug).cloned();
        match response {
            Some(Ok(teams)) => Ok(teams),
            Some(Err(status)) => Err(status_error(status)),
            None => Err(status_error(404)),
        }
    }

    async fn list_team_projects(
        &self,
        org_slug: &str,
        team_slug: &str,
    ) -> Result<Vec<Project>, ApiError> {
        self.project_calls.fetch_add(1, Ordering::SeqCst);
        self.project_requests
            .lock()
            .push(format!("{}/{}", org_slug, team_slug));
        self.wait_gate(&format!("projects:{}", team_slug)).await;
        let response = self.projects.lock().get(team_slug).cloned();
        match response {
            Some(Ok(projects)) => Ok(projects),
            Some(Err(status)) => Err(status_error(status)),
            None => Ok(Vec::new()),
        }
    }
}

// ============================================================================
// Fixtures
// ============================================================================

pub(crate) fn org(slug: &str, scopes: &[&str]) -> Organization {
    Organization {
        id: "1".to_string(),
        slug: slug.to_string(),
        name: slug.to_uppercase(),
        access: Access::new(scopes.iter().copied()),
        features: Vec::new(),
    }
}

pub(crate) fn project(id: &str, name: &str, bookmarked: bool) -> Project {
    Project {
        id: id.to_string(),
        slug: name.to_lowercase(),
        name: name.to_string(),
        platform: None,
        is_bookmarked: bookmarked,
        first_event: Some("2019-01-01T00:00:00Z".to_string()),
        teams: Vec::new(),
    }
}

pub(crate) fn fresh_project(id: &str, name: &str) -> Project {
    Project {
        first_event: None,
        ..project(id, name, false)
    }
}

pub(crate) fn team(slug: &str, projects: Vec<Project>) -> Team {
    let projects = projects
        .into_iter()
        .map(|mut p| {
            p.teams.push(TeamRef {
                slug: slug.to_string(),
            });
            p
        })
        .collect();
    Team {
        id: format!("team-{}", slug),
        slug: slug.to_string(),
        name: slug.to_uppercase(),
        is_member: true,
        member_count: Some(3),
        projects,
    }
}
