//! Teams the current user belongs to, for one organization.

use std::sync::Arc;

use parking_lot::Mutex;

use super::{Commit, Generations};
use crate::api::DashboardApi;
use crate::error::FetchFailure;
use crate::types::{FetchState, Team};

pub struct TeamsFetcher {
    api: Arc<dyn DashboardApi>,
    lite: bool,
    generations: Generations,
    organization: Mutex<Option<String>>,
    state: Mutex<FetchState<Vec<Team>>>,
}

impl TeamsFetcher {
    /// `lite` selects the lightweight listing (`?lite=1`), which omits
    /// embedded projects.
    pub fn new(api: Arc<dyn DashboardApi>, lite: bool) -> Self {
        Self {
            api,
            lite,
            generations: Generations::new(),
            organization: Mutex::new(None),
            state: Mutex::new(FetchState::loading()),
        }
    }

    pub fn state(&self) -> FetchState<Vec<Team>> {
        self.state.lock().clone()
    }

    pub fn organization(&self) -> Option<String> {
        self.organization.lock().clone()
    }

    pub fn is_lite(&self) -> bool {
        self.lite
    }

    /// Initial fetch for `org_slug`.
    pub async fn mount(&self, org_slug: &str) -> Commit {
        *self.organization.lock() = Some(org_slug.to_string());
        self.fetch(org_slug.to_string()).await
    }

    /// Re-fetch only when the organization actually changed.
    pub async fn set_organization(&self, org_slug: &str) -> Option<Commit> {
        {
            let mut current = self.organization.lock();
            if current.as_deref() == Some(org_slug) {
                return None;
            }
            *current = Some(org_slug.to_string());
        }
        Some(self.fetch(org_slug.to_string()).await)
    }

    /// Re-fetch for the current organization, if one was mounted.
    pub async fn reload(&self) -> Option<Commit> {
        let org = self.organization()?;
        Some(self.fetch(org).await)
    }

    pub fn unmount(&self) {
        self.generations.unmount();
    }

    async fn fetch(&self, org_slug: String) -> Commit {
        let ticket = self.generations.begin();
        {
            let mut state = self.state.lock();
            let reset = self
                .generations
                .commit("Teams", ticket, || *state = FetchState::loading());
            if !reset.applied() {
                return reset;
            }
        }

        log::debug!("Teams: fetching for {} (generation {})", org_slug, ticket.generation());
        let result = self.api.list_teams(&org_slug, self.lite).await;
        if let Err(e) = &result {
            log::warn!("Teams: failed to fetch teams for {}: {}", org_slug, e);
        }

        let mut state = self.state.lock();
        self.generations.commit("Teams", ticket, || {
            *state = match result {
                Ok(teams) => {
                    log::info!("Teams: loaded {} teams for {}", teams.len(), org_slug);
                    FetchState::ready(teams)
                }
                Err(e) => FetchState::failed(FetchFailure::from(&e)),
            }
        })
    }
}
