//! Project grouping, ordering and de-duplication.
//!
//! Everything here is pure and synchronous. It runs on every render once
//! data is available.

use std::cmp::Ordering;
use std::collections::{BTreeMap, HashSet};

use crate::types::{Project, Team};

/// Dashboard order: bookmarked first, then by name.
///
/// Slug and id break the remaining ties so the order is total.
pub fn compare_projects(a: &Project, b: &Project) -> Ordering {
    b.is_bookmarked
        .cmp(&a.is_bookmarked)
        .then_with(|| a.name.cmp(&b.name))
        .then_with(|| a.slug.cmp(&b.slug))
        .then_with(|| a.id.cmp(&b.id))
}

pub fn sort_projects(projects: &mut [Project]) {
    projects.sort_by(compare_projects);
}

/// Drop repeated project ids, keeping the first occurrence in input order.
pub fn dedupe_projects<I>(projects: I) -> Vec<Project>
where
    I: IntoIterator<Item = Project>,
{
    let mut seen = HashSet::new();
    projects
        .into_iter()
        .filter(|p| seen.insert(p.id.clone()))
        .collect()
}

fn dedupe_and_sort<I>(projects: I) -> Vec<Project>
where
    I: IntoIterator<Item = Project>,
{
    let mut projects = dedupe_projects(projects);
    sort_projects(&mut projects);
    projects
}

/// Map each team slug to its deduplicated, sorted projects.
///
/// With `projects = None` each team's embedded list is used. Otherwise
/// projects are attached by their `teams` membership, or to every team when
/// `show_all_teams` is set (elevated viewers see all teams).
pub fn group_projects_by_team(
    teams: &[Team],
    projects: Option<&[Project]>,
    show_all_teams: bool,
) -> BTreeMap<String, Vec<Project>> {
    let mut grouped = BTreeMap::new();
    for team in teams {
        let list = match projects {
            None => dedupe_and_sort(team.projects.iter().cloned()),
            Some(all) => dedupe_and_sort(
                all.iter()
                    .filter(|p| show_all_teams || p.belongs_to(&team.slug))
                    .cloned(),
            ),
        };
        // Duplicate team slugs in the listing collapse onto one key.
        grouped
            .entry(team.slug.clone())
            .and_modify(|existing: &mut Vec<Project>| {
                let merged = dedupe_and_sort(existing.drain(..).chain(list.iter().cloned()));
                *existing = merged;
            })
            .or_insert(list);
    }
    grouped
}

/// Per-team fetched lists, each deduplicated and in dashboard order.
///
/// A project returned by several teams stays under every one of them,
/// whatever its `teams` field says.
pub fn order_fetched_projects(
    by_team: &BTreeMap<String, Vec<Project>>,
) -> BTreeMap<String, Vec<Project>> {
    by_team
        .iter()
        .map(|(slug, list)| (slug.clone(), dedupe_and_sort(list.iter().cloned())))
        .collect()
}

/// Every project embedded in `teams`, each id once, in dashboard order.
pub fn all_projects(teams: &[Team]) -> Vec<Project> {
    dedupe_and_sort(teams.iter().flat_map(|t| t.projects.iter().cloned()))
}

pub fn favorite_projects(projects: &[Project]) -> Vec<&Project> {
    projects.iter().filter(|p| p.is_bookmarked).collect()
}

pub fn bookmarked_count(projects: &[Project]) -> usize {
    projects.iter().filter(|p| p.is_bookmarked).count()
}

/// The only project, when there is exactly one and it has no events yet.
pub fn single_fresh_project(projects: &[Project]) -> Option<&Project> {
    match projects {
        [only] if only.is_fresh() => Some(only),
        _ => None,
    }
}

/// Sorted, deduplicated team slugs. Two team lists with the same key
/// describe the same fetch.
pub fn team_slug_key(teams: &[Team]) -> Vec<String> {
    let mut slugs: Vec<String> = teams.iter().map(|t| t.slug.clone()).collect();
    slugs.sort();
    slugs.dedup();
    slugs
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::mock::{fresh_project, project, team};

    fn ids(projects: &[Project]) -> Vec<&str> {
        projects.iter().map(|p| p.id.as_str()).collect()
    }

    #[test]
    fn test_sort_bookmarked_first_then_name() {
        let mut projects = vec![
            project("1", "Zeta", false),
            project("2", "Alpha", false),
            project("3", "Mu", true),
            project("4", "Beta", true),
        ];
        sort_projects(&mut projects);
        assert_eq!(ids(&projects), vec!["4", "3", "2", "1"]);
    }

    #[test]
    fn test_dedupe_keeps_first_occurrence() {
        let mut shadow = project("1", "Renamed", true);
        shadow.slug = "shadow".to_string();
        let projects = dedupe_projects(vec![
            project("1", "Api", false),
            project("2", "Web", false),
            shadow,
        ]);
        assert_eq!(ids(&projects), vec!["1", "2"]);
        assert_eq!(projects[0].name, "Api");
    }

    #[test]
    fn test_group_embedded_scenario() {
        let teams = vec![
            team("a", vec![project("1", "Z", false)]),
            team("b", vec![project("2", "A", true)]),
        ];
        let grouped = group_projects_by_team(&teams, None, false);
        assert_eq!(grouped.len(), 2);
        assert_eq!(ids(&grouped["a"]), vec!["1"]);
        assert_eq!(ids(&grouped["b"]), vec!["2"]);

        let all = all_projects(&teams);
        assert_eq!(ids(&all), vec!["2", "1"]);
        assert_eq!(all[0].name, "A");
    }

    #[test]
    fn test_group_has_one_key_per_team_even_without_projects() {
        let teams = vec![team("c", vec![]), team("a", vec![]), team("b", vec![])];
        let grouped = group_projects_by_team(&teams, None, false);
        let keys: Vec<&String> = grouped.keys().collect();
        assert_eq!(keys, vec!["a", "b", "c"]);
        assert!(grouped.values().all(Vec::is_empty));
    }

    #[test]
    fn test_group_dedupes_within_team() {
        let teams = vec![team(
            "a",
            vec![project("1", "Api", false), project("1", "Api", false)],
        )];
        let grouped = group_projects_by_team(&teams, None, false);
        assert_eq!(ids(&grouped["a"]), vec!["1"]);
    }

    #[test]
    fn test_all_projects_dedupes_across_teams() {
        let shared = project("7", "Shared", false);
        let teams = vec![
            team("a", vec![shared.clone(), project("1", "Api", false)]),
            team("b", vec![shared, project("2", "Web", true)]),
        ];
        let all = all_projects(&teams);
        assert_eq!(ids(&all), vec!["2", "1", "7"]);
    }

    #[test]
    fn test_group_separate_projects_by_membership() {
        let teams = vec![team("a", vec![]), team("b", vec![])];
        let mut p1 = project("1", "Api", false);
        p1.stamp_team("a");
        let mut p2 = project("2", "Web", false);
        p2.stamp_team("a");
        p2.stamp_team("b");
        let orphan = project("3", "Orphan", false);
        let projects = vec![p1, p2, orphan];

        let grouped = group_projects_by_team(&teams, Some(&projects), false);
        assert_eq!(ids(&grouped["a"]), vec!["1", "2"]);
        assert_eq!(ids(&grouped["b"]), vec!["2"]);
    }

    #[test]
    fn test_group_show_all_teams_attaches_every_project() {
        let teams = vec![team("a", vec![]), team("b", vec![])];
        let projects = vec![project("1", "Api", false), project("2", "Web", true)];

        let grouped = group_projects_by_team(&teams, Some(&projects), true);
        assert_eq!(ids(&grouped["a"]), vec!["2", "1"]);
        assert_eq!(ids(&grouped["b"]), vec!["2", "1"]);
    }

    #[test]
    fn test_duplicate_team_slugs_merge() {
        let teams = vec![
            team("a", vec![project("1", "Api", false)]),
            team("a", vec![project("2", "Web", false), project("1", "Api", false)]),
        ];
        let grouped = group_projects_by_team(&teams, None, false);
        assert_eq!(grouped.len(), 1);
        assert_eq!(ids(&grouped["a"]), vec!["1", "2"]);
    }

    #[test]
    fn test_fetched_project_shared_by_two_teams_stays_in_both() {
        let shared = project("7", "Web", false);
        assert!(shared.teams.is_empty());
        let mut by_team = BTreeMap::new();
        by_team.insert("a".to_string(), vec![shared.clone(), shared.clone()]);
        by_team.insert("b".to_string(), vec![project("2", "Zed", false), shared]);

        let grouped = order_fetched_projects(&by_team);
        assert_eq!(ids(&grouped["a"]), vec!["7"]);
        assert_eq!(ids(&grouped["b"]), vec!["7", "2"]);
    }

    #[test]
    fn test_single_fresh_project() {
        let fresh = vec![fresh_project("1", "New")];
        assert_eq!(single_fresh_project(&fresh).map(|p| p.id.as_str()), Some("1"));

        let seasoned = vec![project("1", "Old", false)];
        assert!(single_fresh_project(&seasoned).is_none());

        let two = vec![fresh_project("1", "New"), fresh_project("2", "Newer")];
        assert!(single_fresh_project(&two).is_none());
        assert!(single_fresh_project(&[]).is_none());
    }

    #[test]
    fn test_favorites() {
        let projects = vec![project("1", "Api", true), project("2", "Web", false)];
        assert_eq!(bookmarked_count(&projects), 1);
        assert_eq!(favorite_projects(&projects)[0].id, "1");
    }

    #[test]
    fn test_team_slug_key_ignores_order_and_repeats() {
        let a = vec![team("b", vec![]), team("a", vec![])];
        let b = vec![team("a", vec![]), team("b", vec![]), team("a", vec![])];
        assert_eq!(team_slug_key(&a), team_slug_key(&b));
        assert_eq!(team_slug_key(&a), vec!["a".to_string(), "b".to_string()]);
    }
}
