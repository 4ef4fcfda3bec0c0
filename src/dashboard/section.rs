//! Per-team section that loads its own projects the first time it scrolls
//! into view.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use serde::Serialize;

use crate::api::DashboardApi;
use crate::error::FetchFailure;
use crate::fetch::{Commit, Generations};
use crate::grouping::{dedupe_projects, sort_projects};
use crate::types::{FetchState, Project};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum SectionStatus {
    /// Not scrolled into view yet; nothing requested.
    Deferred,
    Loading,
    Ready,
    Failed,
}

/// Read-only view of a section's state at render time.
#[derive(Debug, Clone, PartialEq)]
pub struct SectionSnapshot {
    pub status: SectionStatus,
    pub projects: Vec<Project>,
}

pub struct TeamSection {
    api: Arc<dyn DashboardApi>,
    org_slug: String,
    team_slug: String,
    generations: Generations,
    visible: AtomicBool,
    state: Mutex<FetchState<Vec<Project>>>,
}

impl TeamSection {
    pub fn new(api: Arc<dyn DashboardApi>, org_slug: &str, team_slug: &str) -> Self {
        Self {
            api,
            org_slug: org_slug.to_string(),
            team_slug: team_slug.to_string(),
            generations: Generations::new(),
            visible: AtomicBool::new(false),
            state: Mutex::new(FetchState::loading()),
        }
    }

    pub fn team_slug(&self) -> &str {
        &self.team_slug
    }

    pub fn org_slug(&self) -> &str {
        &self.org_slug
    }

    pub fn has_been_visible(&self) -> bool {
        self.visible.load(Ordering::SeqCst)
    }

    /// Called when the section nears the viewport. Only the first call
    /// fetches.
    pub async fn on_visible(&self) -> Option<Commit> {
        if self.visible.swap(true, Ordering::SeqCst) {
            return None;
        }
        Some(self.fetch().await)
    }

    pub fn state(&self) -> FetchState<Vec<Project>> {
        self.state.lock().clone()
    }

    pub fn snapshot(&self) -> SectionSnapshot {
        let state = self.state();
        let status = if !self.has_been_visible() {
            SectionStatus::Deferred
        } else if state.loading {
            SectionStatus::Loading
        } else if state.error.is_some() {
            SectionStatus::Failed
        } else {
            SectionStatus::Ready
        };
        SectionSnapshot {
            status,
            projects: state.data,
        }
    }

    pub fn unmount(&self) {
        self.generations.unmount();
    }

    async fn fetch(&self) -> Commit {
        let ticket = self.generations.begin();
        log::debug!("TeamSection: {} visible, fetching projects", self.team_slug);

        let result = self
            .api
            .list_team_projects(&self.org_slug, &self.team_slug)
            .await;

        let next = match result {
            Ok(projects) => {
                let mut projects = dedupe_projects(projects.into_iter().map(|mut p| {
                    p.stamp_team(&self.team_slug);
                    p
                }));
                sort_projects(&mut projects);
                FetchState::ready(projects)
            }
            Err(e) => {
                log::warn!(
                    "TeamSection: failed to fetch projects for {}/{}: {}",
                    self.org_slug,
                    self.team_slug,
                    e
                );
                FetchState::failed(FetchFailure::from(&e))
            }
        };

        let mut state = self.state.lock();
        self.generations
            .commit("TeamSection", ticket, || *state = next)
    }
}
