//! The organization dashboard screen.
//!
//! `DashboardScreen` composes the fetchers: teams first, then projects
//! (up front, per section as sections scroll into view, or straight from the
//! team listing). `render()` turns whatever has loaded into a `DashboardView`.
//!
//! Modules:
//! - section: per-team lazily loaded section
//! - view: view model and the loading/error/empty/content state machine

pub mod section;
pub mod view;

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::api::DashboardApi;
use crate::config::Config;
use crate::fetch::team_projects::SyncOutcome;
use crate::fetch::{Commit, TeamProjectsFetcher, TeamsFetcher};
use crate::grouping::team_slug_key;
use crate::routing::{legacy_redirect, Navigator};
use crate::stats::ProjectStatsStore;
use crate::types::{FetchState, Organization, Team};

pub use section::{SectionSnapshot, SectionStatus, TeamSection};
pub use view::{render_dashboard, DashboardView, ProjectSource, RenderInput};

/// How section projects are loaded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "camelCase")]
pub enum ProjectLoading {
    /// Fetch every team's projects once the team list resolves.
    #[default]
    UpFront,
    /// Each section fetches its projects when first scrolled into view.
    Lazy,
    /// Use the projects embedded in the team listing.
    Embedded,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DashboardOptions {
    pub project_loading: ProjectLoading,
    pub lite_teams: bool,
    pub show_all_teams: bool,
}

impl From<&Config> for DashboardOptions {
    fn from(config: &Config) -> Self {
        Self {
            project_loading: config.project_loading,
            lite_teams: config.lite_teams,
            show_all_teams: config.show_all_teams,
        }
    }
}

pub struct DashboardScreen {
    api: Arc<dyn DashboardApi>,
    options: DashboardOptions,
    stats: Arc<dyn ProjectStatsStore>,
    navigator: Arc<dyn Navigator>,
    organization: Mutex<Option<Organization>>,
    teams: TeamsFetcher,
    team_projects: TeamProjectsFetcher,
    sections: Mutex<BTreeMap<String, Arc<TeamSection>>>,
    unmounted: AtomicBool,
}

impl DashboardScreen {
    pub fn new(
        api: Arc<dyn DashboardApi>,
        options: DashboardOptions,
        stats: Arc<dyn ProjectStatsStore>,
        navigator: Arc<dyn Navigator>,
    ) -> Self {
        Self {
            teams: TeamsFetcher::new(api.clone(), options.lite_teams),
            team_projects: TeamProjectsFetcher::new(api.clone()),
            api,
            options,
            stats,
            navigator,
            organization: Mutex::new(None),
            sections: Mutex::new(BTreeMap::new()),
            unmounted: AtomicBool::new(false),
        }
    }

    pub fn options(&self) -> DashboardOptions {
        self.options
    }

    /// Mount the screen at `path` for `organization`.
    ///
    /// A legacy path without an organization segment triggers one redirect
    /// to the canonical dashboard path before loading starts.
    pub async fn mount(&self, path: &str, organization: Organization) {
        if let Some(target) = legacy_redirect(path, &organization.slug) {
            log::info!("Dashboard: redirecting legacy path {} to {}", path, target);
            self.navigator.redirect(&target);
        }

        let slug = organization.slug.clone();
        *self.organization.lock() = Some(organization);
        let commit = self.teams.mount(&slug).await;
        self.after_teams(&slug, commit).await;
    }

    /// New organization props. Data is re-fetched only when the slug changes.
    pub async fn set_organization(&self, organization: Organization) {
        let slug = organization.slug.clone();
        *self.organization.lock() = Some(organization);
        if let Some(commit) = self.teams.set_organization(&slug).await {
            self.after_teams(&slug, commit).await;
        }
    }

    /// Re-fetch everything for the current organization.
    pub async fn reload(&self) {
        let Some(slug) = self.organization_slug() else {
            return;
        };
        if !self.teams.reload().await.is_some_and(|c| c.applied()) {
            log::debug!("Dashboard: team reload for {} superseded", slug);
            return;
        }
        match self.options.project_loading {
            ProjectLoading::UpFront => {
                let teams = self.teams.state();
                if self.team_projects.sync(&slug, &teams).await == SyncOutcome::Unchanged {
                    self.team_projects.reload().await;
                }
            }
            ProjectLoading::Lazy => {
                self.unmount_sections();
                self.rebuild_sections(&slug);
            }
            ProjectLoading::Embedded => {}
        }
    }

    /// A team section came near the viewport. Only meaningful in lazy mode.
    pub async fn section_visible(&self, team_slug: &str) -> Option<Commit> {
        let section = self.sections.lock().get(team_slug).cloned()?;
        section.on_visible().await
    }

    /// Team slugs with a section, in render order.
    pub fn section_slugs(&self) -> Vec<String> {
        team_slug_key(&self.teams.state().data)
    }

    pub fn render(&self) -> DashboardView {
        let Some(organization) = self.organization.lock().clone() else {
            return DashboardView::Loading;
        };
        let teams = self.teams.state();

        match self.options.project_loading {
            ProjectLoading::UpFront => {
                let projects = self.team_projects.state();
                self.render_with(&organization, &teams, ProjectSource::UpFront(&projects))
            }
            ProjectLoading::Lazy => {
                let snapshots: BTreeMap<String, SectionSnapshot> = self
                    .sections
                    .lock()
                    .iter()
                    .map(|(slug, section)| (slug.clone(), section.snapshot()))
                    .collect();
                self.render_with(&organization, &teams, ProjectSource::Lazy(&snapshots))
            }
            ProjectLoading::Embedded => {
                self.render_with(&organization, &teams, ProjectSource::Embedded)
            }
        }
    }

    /// Tear down: late responses become no-ops and the shared project stats
    /// are reset. Safe to call more than once.
    pub fn unmount(&self) {
        if self.unmounted.swap(true, Ordering::SeqCst) {
            return;
        }
        self.teams.unmount();
        self.team_projects.unmount();
        self.unmount_sections();
        self.stats.reset_project_stats();
        log::info!("Dashboard: unmounted");
    }

    fn render_with(
        &self,
        organization: &Organization,
        teams: &FetchState<Vec<Team>>,
        projects: ProjectSource<'_>,
    ) -> DashboardView {
        render_dashboard(&RenderInput {
            organization,
            teams,
            projects,
            show_all_teams: self.options.show_all_teams,
        })
    }

    fn organization_slug(&self) -> Option<String> {
        self.organization.lock().as_ref().map(|o| o.slug.clone())
    }

    /// Follow a team fetch with project loading. Only a fetch that is still
    /// current may do so.
    async fn after_teams(&self, org_slug: &str, teams_commit: Commit) {
        if !teams_commit.applied() {
            log::debug!("Dashboard: teams for {} superseded, not loading projects", org_slug);
            return;
        }
        match self.options.project_loading {
            ProjectLoading::UpFront => {
                let teams = self.teams.state();
                self.team_projects.sync(org_slug, &teams).await;
            }
            ProjectLoading::Lazy => self.rebuild_sections(org_slug),
            ProjectLoading::Embedded => {}
        }
    }

    /// Keep sections whose team is still listed, add sections for new teams
    /// and drop the rest. An organization change replaces every section.
    fn rebuild_sections(&self, org_slug: &str) {
        let teams = self.teams.state();
        if teams.loading || teams.error.is_some() {
            return;
        }
        let wanted = team_slug_key(&teams.data);

        let mut sections = self.sections.lock();
        let org_changed = sections
            .values()
            .next()
            .is_some_and(|s| s.org_slug() != org_slug);
        if org_changed {
            for section in sections.values() {
                section.unmount();
            }
            sections.clear();
        }

        sections.retain(|slug, section| {
            let keep = wanted.contains(slug);
            if !keep {
                section.unmount();
            }
            keep
        });
        for slug in wanted {
            sections
                .entry(slug.clone())
                .or_insert_with(|| Arc::new(TeamSection::new(self.api.clone(), org_slug, &slug)));
        }
    }

    fn unmount_sections(&self) {
        let mut sections = self.sections.lock();
        for section in sections.values() {
            section.unmount();
        }
        sections.clear();
    }
}
