//! Dashboard view model and the state machine that picks which view to show.

use std::collections::BTreeMap;

use serde::Serialize;

use super::section::{SectionSnapshot, SectionStatus};
use crate::grouping::{
    all_projects, bookmarked_count, group_projects_by_team, order_fetched_projects,
    single_fresh_project,
};
use crate::types::{
    FetchState, Organization, Project, Team, TeamProjects, SCOPE_PROJECT_ADMIN,
    SCOPE_PROJECT_READ, SCOPE_TEAM_ADMIN, SCOPE_TEAM_READ,
};

/// What the dashboard shows for one render.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[allow(clippy::large_enum_variant)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum DashboardView {
    Loading,
    Error {
        message: String,
    },
    Empty {
        organization: String,
        /// Known project count; `None` when projects load per section.
        #[serde(rename = "projectCount")]
        project_count: Option<usize>,
        /// Whether the empty state can be specific about projects.
        detailed: bool,
    },
    Content {
        header: PageHeader,
        sections: Vec<TeamSectionView>,
        #[serde(rename = "gettingStarted")]
        getting_started: Option<GettingStarted>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageHeader {
    pub title: String,
    /// Present only for viewers holding `project:admin`.
    pub create_project_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamSectionView {
    pub team_slug: String,
    pub title: String,
    /// Link to team settings, `team:admin` only.
    pub settings_url: Option<String>,
    /// Members summary, `team:read` only.
    pub members: Option<MembersSummary>,
    pub status: SectionStatus,
    pub projects: Vec<ProjectCard>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MembersSummary {
    pub member_count: Option<u32>,
    pub members_url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectCard {
    pub id: String,
    pub slug: String,
    pub name: String,
    pub platform: Option<String>,
    pub is_bookmarked: bool,
    pub has_events: bool,
    pub affordance: CardAffordance,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum CardAffordance {
    /// Viewer holds `project:read`: the card links into the project.
    Full {
        #[serde(rename = "detailsUrl")]
        details_url: String,
    },
    /// Name and badges only.
    Restricted,
}

/// Resources panel appended when the organization's only project has not
/// received an event yet.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GettingStarted {
    pub project_slug: String,
    pub project_name: String,
    pub setup_url: String,
}

/// Where section projects come from for this render.
pub enum ProjectSource<'a> {
    /// The projects embedded in the team listing.
    Embedded,
    /// The up-front per-team fan-out.
    UpFront(&'a FetchState<TeamProjects>),
    /// Each section's own lazily fetched list, keyed by team slug.
    Lazy(&'a BTreeMap<String, SectionSnapshot>),
}

pub struct RenderInput<'a> {
    pub organization: &'a Organization,
    pub teams: &'a FetchState<Vec<Team>>,
    pub projects: ProjectSource<'a>,
    pub show_all_teams: bool,
}

/// Pick the dashboard state, in priority order: loading, error, empty,
/// content (with the getting-started panel for a single fresh project).
pub fn render_dashboard(input: &RenderInput<'_>) -> DashboardView {
    let teams = input.teams;
    let upfront = match input.projects {
        ProjectSource::UpFront(state) => Some(state),
        _ => None,
    };

    if teams.loading {
        return DashboardView::Loading;
    }
    // A failed team list means the project fan-out never starts.
    if let Some(error) = &teams.error {
        return DashboardView::Error {
            message: error.message.clone(),
        };
    }

    if upfront.is_some_and(|s| s.loading) {
        return DashboardView::Loading;
    }
    if let Some(error) = upfront.and_then(|s| s.error.as_ref()) {
        return DashboardView::Error {
            message: error.message.clone(),
        };
    }

    // Lazy sections fetch their own lists, so only the (possibly stale)
    // embedded projects are known up front.
    let (known_projects, project_count) = match input.projects {
        ProjectSource::Embedded => {
            let projects = all_projects(&teams.data);
            let count = projects.len();
            (projects, Some(count))
        }
        ProjectSource::UpFront(state) => {
            let projects = state.data.projects();
            let count = projects.len();
            (projects, Some(count))
        }
        ProjectSource::Lazy(_) => (all_projects(&teams.data), None),
    };

    let org = input.organization;
    if teams.data.is_empty() && bookmarked_count(&known_projects) == 0 {
        return DashboardView::Empty {
            organization: org.slug.clone(),
            project_count,
            detailed: project_count.is_some(),
        };
    }

    let sections = build_sections(input, &known_projects);
    let getting_started = single_fresh_project(&known_projects).map(|p| GettingStarted {
        project_slug: p.slug.clone(),
        project_name: p.name.clone(),
        setup_url: format!("/{}/{}/getting-started/", org.slug, p.slug),
    });

    DashboardView::Content {
        header: build_header(org),
        sections,
        getting_started,
    }
}

fn build_header(org: &Organization) -> PageHeader {
    let title = if org.name.is_empty() {
        org.slug.clone()
    } else {
        org.name.clone()
    };
    PageHeader {
        title,
        create_project_url: org
            .access
            .has(SCOPE_PROJECT_ADMIN)
            .then(|| format!("/organizations/{}/projects/new/", org.slug)),
    }
}

fn build_sections(input: &RenderInput<'_>, known_projects: &[Project]) -> Vec<TeamSectionView> {
    let teams = &input.teams.data;
    let org = input.organization;

    // One section per team slug, lexicographic.
    let mut by_slug: BTreeMap<&str, &Team> = BTreeMap::new();
    for team in teams {
        by_slug.entry(team.slug.as_str()).or_insert(team);
    }

    let grouped = match input.projects {
        ProjectSource::Embedded if !input.show_all_teams => {
            group_projects_by_team(teams, None, false)
        }
        // Already per team. A project shared by several teams stays in each.
        ProjectSource::UpFront(state) if !input.show_all_teams => {
            order_fetched_projects(&state.data.by_team)
        }
        ProjectSource::Embedded | ProjectSource::UpFront(_) => {
            group_projects_by_team(teams, Some(known_projects), input.show_all_teams)
        }
        ProjectSource::Lazy(sections) => sections
            .iter()
            .map(|(slug, snapshot)| (slug.clone(), snapshot.projects.clone()))
            .collect(),
    };

    by_slug
        .into_values()
        .map(|team| {
            let status = section_status(input, &team.slug);
            let projects = grouped
                .get(&team.slug)
                .map(|list| list.iter().map(|p| project_card(org, p)).collect())
                .unwrap_or_default();
            team_section(org, team, status, projects)
        })
        .collect()
}

fn section_status(input: &RenderInput<'_>, team_slug: &str) -> SectionStatus {
    match input.projects {
        ProjectSource::Embedded => SectionStatus::Ready,
        ProjectSource::UpFront(state) if state.data.failed_teams.contains(team_slug) => {
            SectionStatus::Failed
        }
        ProjectSource::UpFront(_) => SectionStatus::Ready,
        ProjectSource::Lazy(sections) => sections
            .get(team_slug)
            .map(|s| s.status)
            .unwrap_or(SectionStatus::Deferred),
    }
}

fn team_section(
    org: &Organization,
    team: &Team,
    status: SectionStatus,
    projects: Vec<ProjectCard>,
) -> TeamSectionView {
    let settings_base = format!("/settings/{}/teams/{}/", org.slug, team.slug);
    TeamSectionView {
        team_slug: team.slug.clone(),
        title: team.display_name().to_string(),
        settings_url: org
            .access
            .has(SCOPE_TEAM_ADMIN)
            .then(|| settings_base.clone()),
        members: org.access.has(SCOPE_TEAM_READ).then(|| MembersSummary {
            member_count: team.member_count,
            members_url: format!("{}members/", settings_base),
        }),
        status,
        projects,
    }
}

fn project_card(org: &Organization, project: &Project) -> ProjectCard {
    let affordance = if org.access.has(SCOPE_PROJECT_READ) {
        CardAffordance::Full {
            details_url: format!("/organizations/{}/issues/?project={}", org.slug, project.id),
        }
    } else {
        CardAffordance::Restricted
    };
    ProjectCard {
        id: project.id.clone(),
        slug: project.slug.clone(),
        name: project.name.clone(),
        platform: project.platform.clone(),
        is_bookmarked: project.is_bookmarked,
        has_events: !project.is_fresh(),
        affordance,
    }
}
