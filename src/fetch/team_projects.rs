//! Per-team project fan-out.
//!
//! One request per team, all in flight together, joined before the
//! aggregate commits. Each branch reports its own outcome, so a failing team
//! ends up with an empty list instead of stalling the aggregate.

use std::sync::Arc;

use futures::future::join_all;
use parking_lot::Mutex;

use super::{Commit, Generations};
use crate::api::DashboardApi;
use crate::error::{ApiError, FetchFailure};
use crate::grouping::{dedupe_projects, sort_projects, team_slug_key};
use crate::types::{FetchState, Project, Team, TeamProjects};

/// What a fan-out was issued for. Equal keys mean the same fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
struct FanOutKey {
    org: String,
    teams: Vec<String>,
}

/// Result of handing a new team list to the fetcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    /// The team list is still loading; nothing was issued.
    Waiting,
    /// The team list failed to load; there is nothing to fan out over.
    Skipped,
    /// Same organization and team slugs as the last fan-out.
    Unchanged,
    Fetched(Commit),
}

pub struct TeamProjectsFetcher {
    api: Arc<dyn DashboardApi>,
    generations: Generations,
    key: Mutex<Option<FanOutKey>>,
    state: Mutex<FetchState<TeamProjects>>,
}

impl TeamProjectsFetcher {
    pub fn new(api: Arc<dyn DashboardApi>) -> Self {
        Self {
            api,
            generations: Generations::new(),
            key: Mutex::new(None),
            state: Mutex::new(FetchState::loading()),
        }
    }

    pub fn state(&self) -> FetchState<TeamProjects> {
        self.state.lock().clone()
    }

    /// Fan out for `teams` once they have loaded, unless the same slugs were
    /// already fetched for this organization.
    pub async fn sync(&self, org_slug: &str, teams: &FetchState<Vec<Team>>) -> SyncOutcome {
        if teams.loading {
            return SyncOutcome::Waiting;
        }
        if teams.error.is_some() {
            return SyncOutcome::Skipped;
        }

        let key = FanOutKey {
            org: org_slug.to_string(),
            teams: team_slug_key(&teams.data),
        };
        {
            let mut last = self.key.lock();
            if last.as_ref() == Some(&key) {
                log::debug!("TeamProjects: team list unchanged, skipping fan-out");
                return SyncOutcome::Unchanged;
            }
            *last = Some(key.clone());
        }

        SyncOutcome::Fetched(self.fan_out(key).await)
    }

    /// Repeat the last fan-out regardless of the key.
    pub async fn reload(&self) -> Option<Commit> {
        let key = self.key.lock().clone()?;
        Some(self.fan_out(key).await)
    }

    pub fn unmount(&self) {
        self.generations.unmount();
    }

    async fn fan_out(&self, key: FanOutKey) -> Commit {
        let ticket = self.generations.begin();

        if key.teams.is_empty() {
            let mut state = self.state.lock();
            return self.generations.commit("TeamProjects", ticket, || {
                *state = FetchState::ready(TeamProjects::default())
            });
        }

        {
            let mut state = self.state.lock();
            let reset = self
                .generations
                .commit("TeamProjects", ticket, || *state = FetchState::loading());
            if !reset.applied() {
                return reset;
            }
        }

        log::info!(
            "TeamProjects: fetching projects for {} teams in {} (generation {})",
            key.teams.len(),
            key.org,
            ticket.generation()
        );
        let org = key.org.as_str();
        let requests = key.teams.iter().map(|team_slug| async move {
            let result = self.api.list_team_projects(org, team_slug).await;
            (team_slug.clone(), result)
        });
        let outcomes = join_all(requests).await;
        let folded = fold_outcomes(org, outcomes);

        let mut state = self.state.lock();
        self.generations
            .commit("TeamProjects", ticket, || *state = folded)
    }
}

/// Fold tagged per-team outcomes into the aggregate state.
///
/// Failed teams map to an empty list. The aggregate carries an error only
/// when every branch failed.
fn fold_outcomes(
    org: &str,
    outcomes: Vec<(String, Result<Vec<Project>, ApiError>)>,
) -> FetchState<TeamProjects> {
    let total = outcomes.len();
    let mut aggregate = TeamProjects::default();
    let mut last_failure = None;

    for (team_slug, outcome) in outcomes {
        match outcome {
            Ok(projects) => {
                let mut projects = dedupe_projects(projects.into_iter().map(|mut p| {
                    p.stamp_team(&team_slug);
                    p
                }));
                sort_projects(&mut projects);
                aggregate.by_team.insert(team_slug, projects);
            }
            Err(e) => {
                log::warn!(
                    "TeamProjects: failed to fetch projects for {}/{}: {}",
                    org,
                    team_slug,
                    e
                );
                last_failure = Some(FetchFailure::from(&e));
                aggregate.by_team.insert(team_slug.clone(), Vec::new());
                aggregate.failed_teams.insert(team_slug);
            }
        }
    }

    let failed = aggregate.failed_teams.len();
    if failed > 0 && failed < total {
        log::info!(
            "TeamProjects: partial result, {} of {} teams failed",
            failed,
            total
        );
    }

    FetchState {
        loading: false,
        error: if failed == total { last_failure } else { None },
        data: aggregate,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::mock::{project, team, MockApi};

    fn loaded(teams: Vec<Team>) -> FetchState<Vec<Team>> {
        FetchState::ready(teams)
    }

    fn ids(projects: &[Project]) -> Vec<&str> {
        projects.iter().map(|p| p.id.as_str()).collect()
    }

    #[tokio::test]
    async fn test_waits_for_teams_to_load() {
        let api = Arc::new(MockApi::new());
        let fetcher = TeamProjectsFetcher::new(api.clone());

        let outcome = fetcher.sync("acme", &FetchState::loading()).await;
        assert_eq!(outcome, SyncOutcome::Waiting);
        assert_eq!(api.project_calls(), 0);
        assert!(fetcher.state().loading);
    }

    #[tokio::test]
    async fn test_skips_when_teams_failed() {
        let api = Arc::new(MockApi::new());
        let fetcher = TeamProjectsFetcher::new(api.clone());
        let failed = FetchState::failed(FetchFailure::from(&ApiError::Status {
            status: 500,
            message: String::new(),
        }));

        assert_eq!(fetcher.sync("acme", &failed).await, SyncOutcome::Skipped);
        assert_eq!(api.project_calls(), 0);
    }

    #[tokio::test]
    async fn test_fans_out_one_request_per_team() {
        let api = Arc::new(
            MockApi::new()
                .with_projects("a", vec![project("1", "Z", false)])
                .with_projects("b", vec![project("2", "A", true)]),
        );
        let fetcher = TeamProjectsFetcher::new(api.clone());
        let teams = loaded(vec![team("a", vec![]), team("b", vec![])]);

        let outcome = fetcher.sync("acme", &teams).await;
        assert_eq!(outcome, SyncOutcome::Fetched(Commit::Applied));
        assert_eq!(api.project_calls(), 2);

        let state = fetcher.state();
        assert!(!state.loading);
        assert!(state.error.is_none());
        assert_eq!(ids(&state.data.by_team["a"]), vec!["1"]);
        assert_eq!(ids(&state.data.by_team["b"]), vec!["2"]);
        assert!(state.data.by_team["a"][0].belongs_to("a"));
        assert_eq!(ids(&state.data.projects()), vec!["2", "1"]);
    }

    #[tokio::test]
    async fn test_unchanged_team_list_issues_one_fan_out() {
        let api = Arc::new(MockApi::new().with_projects("a", vec![project("1", "Api", false)]));
        let fetcher = TeamProjectsFetcher::new(api.clone());

        let first = loaded(vec![team("a", vec![]), team("b", vec![])]);
        // Same slugs, different order and fresh instances.
        let second = loaded(vec![team("b", vec![]), team("a", vec![])]);

        fetcher.sync("acme", &first).await;
        assert_eq!(fetcher.sync("acme", &second).await, SyncOutcome::Unchanged);
        assert_eq!(api.project_calls(), 2);
    }

    #[tokio::test]
    async fn test_changed_team_list_refetches() {
        let api = Arc::new(MockApi::new());
        let fetcher = TeamProjectsFetcher::new(api.clone());

        fetcher.sync("acme", &loaded(vec![team("a", vec![])])).await;
        fetcher
            .sync("acme", &loaded(vec![team("a", vec![]), team("c", vec![])]))
            .await;
        assert_eq!(api.project_calls(), 3);
        assert_eq!(fetcher.state().data.by_team.len(), 2);
    }

    #[tokio::test]
    async fn test_empty_team_list_issues_no_requests() {
        let api = Arc::new(MockApi::new());
        let fetcher = TeamProjectsFetcher::new(api.clone());

        let outcome = fetcher.sync("acme", &loaded(vec![])).await;
        assert_eq!(outcome, SyncOutcome::Fetched(Commit::Applied));
        assert_eq!(api.project_calls(), 0);
        let state = fetcher.state();
        assert!(!state.loading);
        assert!(state.data.by_team.is_empty());
    }

    #[tokio::test]
    async fn test_partial_failure_completes_with_successful_subset() {
        let api = Arc::new(
            MockApi::new()
                .with_projects("a", vec![project("1", "Api", false)])
                .with_projects_error("b", 500),
        );
        let fetcher = TeamProjectsFetcher::new(api.clone());

        fetcher
            .sync("acme", &loaded(vec![team("a", vec![]), team("b", vec![])]))
            .await;

        let state = fetcher.state();
        assert!(!state.loading);
        assert!(state.error.is_none());
        assert_eq!(ids(&state.data.by_team["a"]), vec!["1"]);
        assert!(state.data.by_team["b"].is_empty());
        assert!(state.data.failed_teams.contains("b"));
        assert!(state.data.is_partial());
    }

    #[tokio::test]
    async fn test_total_failure_sets_error() {
        let api = Arc::new(
            MockApi::new()
                .with_projects_error("a", 502)
                .with_projects_error("b", 503),
        );
        let fetcher = TeamProjectsFetcher::new(api.clone());

        fetcher
            .sync("acme", &loaded(vec![team("a", vec![]), team("b", vec![])]))
            .await;

        let state = fetcher.state();
        assert!(!state.loading);
        assert!(state.error.is_some());
        assert_eq!(state.data.failed_teams.len(), 2);
    }

    #[tokio::test]
    async fn test_superseded_fan_out_is_discarded() {
        let api = Arc::new(
            MockApi::new()
                .with_projects("a", vec![project("1", "Api", false)])
                .with_projects("b", vec![project("2", "Web", false)]),
        );
        let release_first = api.gate_projects("a");
        let fetcher = TeamProjectsFetcher::new(api.clone());

        let first_teams = loaded(vec![team("a", vec![])]);
        let second_teams = loaded(vec![team("b", vec![])]);

        let (first, second) = tokio::join!(fetcher.sync("acme", &first_teams), async {
            let outcome = fetcher.sync("acme", &second_teams).await;
            let _ = release_first.send(());
            outcome
        });

        assert_eq!(first, SyncOutcome::Fetched(Commit::Stale));
        assert_eq!(second, SyncOutcome::Fetched(Commit::Applied));
        let state = fetcher.state();
        assert_eq!(state.data.by_team.keys().collect::<Vec<_>>(), vec!["b"]);
    }

    #[tokio::test]
    async fn test_unmount_drops_in_flight_result() {
        let api = Arc::new(MockApi::new().with_projects("a", vec![project("1", "Api", false)]));
        let release = api.gate_projects("a");
        let fetcher = TeamProjectsFetcher::new(api.clone());
        let teams = loaded(vec![team("a", vec![])]);

        let (outcome, _) = tokio::join!(fetcher.sync("acme", &teams), async {
            fetcher.unmount();
            let _ = release.send(());
        });

        assert_eq!(outcome, SyncOutcome::Fetched(Commit::Unmounted));
        assert!(fetcher.state().data.by_team.is_empty());
    }

    #[tokio::test]
    async fn test_reload_repeats_last_fan_out() {
        let api = Arc::new(MockApi::new());
        let fetcher = TeamProjectsFetcher::new(api.clone());
        assert_eq!(fetcher.reload().await, None);

        fetcher.sync("acme", &loaded(vec![team("a", vec![])])).await;
        assert_eq!(fetcher.reload().await, Some(Commit::Applied));
        assert_eq!(api.project_calls(), 2);
    }

    #[test]
    fn test_fold_dedupes_within_team() {
        let outcomes = vec![(
            "a".to_string(),
            Ok(vec![project("1", "Api", false), project("1", "Api", false)]),
        )];
        let state = fold_outcomes("acme", outcomes);
        assert_eq!(state.data.by_team["a"].len(), 1);
    }
}
