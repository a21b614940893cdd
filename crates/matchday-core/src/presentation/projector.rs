//! Pure projections from fetched records to display snapshots.

use std::collections::HashSet;

use crate::models::{Match, MatchType, Team};
use crate::sync::FetchResult;
use crate::utils::count_label;

use super::items::{MatchItem, Section, Snapshot, TeamFilter, TeamItem};

/// Matches the filter lets through, in delivery order.
///
/// An empty filter passes everything unchanged. Otherwise a match is kept when
/// either side is selected, and only its first occurrence survives.
pub fn select_matches<'a>(matches: &'a [Match], filter: &TeamFilter) -> Vec<&'a Match> {
    if filter.is_empty() {
        return matches.iter().collect();
    }

    let mut seen = HashSet::new();
    matches
        .iter()
        .filter(|m| filter.admits(m))
        .filter(|m| seen.insert(m.identifier()))
        .collect()
}

/// Group matches by type, newest group title first.
pub fn project_matches(result: &FetchResult<Match>, filter: &TeamFilter) -> Snapshot<MatchItem> {
    let Ok(matches) = result else {
        return Snapshot::default();
    };

    let mut groups: Vec<(MatchType, Vec<MatchItem>)> = Vec::new();
    for m in select_matches(matches, filter) {
        match groups.iter_mut().find(|(kind, _)| *kind == m.match_type) {
            Some((_, items)) => items.push(MatchItem::from(m)),
            None => groups.push((m.match_type, vec![MatchItem::from(m)])),
        }
    }
    groups.sort_by(|(a, _), (b, _)| b.title().cmp(a.title()));

    Snapshot {
        sections: groups
            .into_iter()
            .map(|(kind, items)| Section::new(kind.title(), items))
            .collect(),
    }
}

/// A single untitled section listing every team.
pub fn project_teams(result: &FetchResult<Team>, filter: &TeamFilter) -> Snapshot<TeamItem> {
    let Ok(teams) = result else {
        return Snapshot::default();
    };

    let items = teams.iter().map(|t| TeamItem::new(t, filter)).collect();
    Snapshot {
        sections: vec![Section::new("", items)],
    }
}

/// Headline numbers for one team.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TeamSummary {
    pub title: String,
    pub total: String,
    pub previous: String,
    pub upcoming: String,
}

impl TeamSummary {
    /// Summarise `matches`, which should already be limited to `team`.
    pub fn from_matches(team: &str, matches: &[Match]) -> Self {
        let previous: Vec<&Match> = matches
            .iter()
            .filter(|m| m.match_type == MatchType::Previous)
            .collect();
        let wins = previous.iter().filter(|m| m.won_by(team)).count();
        let upcoming = matches.len() - previous.len();

        Self {
            title: team.to_string(),
            total: count_label("Total", matches.len()),
            previous: format!("{} (win {})", count_label("Previous", previous.len()), wins),
            upcoming: count_label("Upcoming", upcoming),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;
    use chrono::{Duration, TimeZone, Utc};

    fn fixture(minute: i64, home: &str, away: &str, winner: Option<&str>, kind: MatchType) -> Match {
        let kickoff = Utc.with_ymd_and_hms(2022, 4, 23, 18, 0, 0).unwrap() + Duration::minutes(minute);
        Match {
            date: Some(kickoff),
            description: Some(format!("{home} vs. {away}")),
            home: Some(home.into()),
            away: Some(away.into()),
            winner: winner.map(String::from),
            highlights: None,
            match_type: kind,
        }
    }

    fn sample() -> Vec<Match> {
        vec![
            fixture(0, "A", "B", Some("A"), MatchType::Previous),
            fixture(1, "B", "C", Some("B"), MatchType::Previous),
            fixture(2, "C", "D", None, MatchType::Upcoming),
            fixture(3, "A", "D", None, MatchType::Upcoming),
        ]
    }

    fn identifiers(snapshot: &Snapshot<MatchItem>) -> Vec<String> {
        snapshot.items().map(|i| i.identifier.clone()).collect()
    }

    #[test]
    fn test_empty_filter_keeps_everything() {
        let mut matches = sample();
        matches.push(matches[0].clone());
        let selected = select_matches(&matches, &TeamFilter::new());
        assert_eq!(selected.len(), 5);
    }

    #[test]
    fn test_filter_single_team() {
        let filter: TeamFilter = ["A"].into_iter().collect();
        let matches = sample();
        let selected = select_matches(&matches, &filter);
        assert_eq!(selected.len(), 2);
        assert!(selected.iter().all(|m| m.involves("A")));
        assert_eq!(selected[0].description.as_deref(), Some("A vs. B"));
        assert_eq!(selected[1].description.as_deref(), Some("A vs. D"));
    }

    #[test]
    fn test_filter_two_teams_in_one_match_appears_once() {
        let filter: TeamFilter = ["A", "B"].into_iter().collect();
        let matches = sample();
        let selected = select_matches(&matches, &filter);
        let descriptions: Vec<_> = selected.iter().filter_map(|m| m.description.as_deref()).collect();
        assert_eq!(descriptions, vec!["A vs. B", "B vs. C", "A vs. D"]);
    }

    #[test]
    fn test_filter_drops_repeated_records() {
        let filter: TeamFilter = ["C"].into_iter().collect();
        let mut matches = sample();
        matches.extend(sample());
        let selected = select_matches(&matches, &filter);
        assert_eq!(selected.len(), 2);
    }

    #[test]
    fn test_upcoming_section_comes_first() {
        let snapshot = project_matches(&Ok(sample()), &TeamFilter::new());
        assert_eq!(snapshot.section_titles(), vec!["Upcoming", "Previous"]);
        assert_eq!(snapshot.sections[0].items.len(), 2);
        assert_eq!(snapshot.sections[1].items.len(), 2);
        assert_eq!(snapshot.total_items(), 4);
    }

    #[test]
    fn test_section_keeps_arrival_order() {
        let matches = sample();
        let snapshot = project_matches(&Ok(matches.clone()), &TeamFilter::new());
        let expected: Vec<String> = [2, 3, 0, 1].iter().map(|&i| matches[i].identifier()).collect();
        assert_eq!(identifiers(&snapshot), expected);
    }

    #[test]
    fn test_only_one_group_present() {
        let filter: TeamFilter = ["B"].into_iter().collect();
        let snapshot = project_matches(&Ok(sample()), &filter);
        assert_eq!(snapshot.section_titles(), vec!["Previous"]);
    }

    #[test]
    fn test_failure_projects_to_empty_snapshot() {
        assert!(project_matches(&Err(AppError::NotFound), &TeamFilter::new()).is_empty());
        assert!(project_teams(&Err(AppError::ServerError), &TeamFilter::new()).is_empty());
    }

    #[test]
    fn test_empty_result_projects_to_no_sections() {
        assert!(project_matches(&Ok(vec![]), &TeamFilter::new()).is_empty());
    }

    #[test]
    fn test_project_teams() {
        let teams = vec![
            Team {
                id: "t1".into(),
                name: Some("A".into()),
                logo: None,
            },
            Team {
                id: "t2".into(),
                name: Some("B".into()),
                logo: Some("https://example.com/b.png".into()),
            },
        ];
        let filter: TeamFilter = ["B"].into_iter().collect();
        let snapshot = project_teams(&Ok(teams), &filter);

        assert_eq!(snapshot.section_titles(), vec![""]);
        let selected: Vec<bool> = snapshot.items().map(|t| t.is_selected).collect();
        assert_eq!(selected, vec![false, true]);
    }

    #[test]
    fn test_team_summary() {
        let matches = vec![
            fixture(0, "A", "T", Some("A"), MatchType::Previous),
            fixture(1, "T", "B", Some("T"), MatchType::Previous),
        ];
        let summary = TeamSummary::from_matches("T", &matches);
        assert_eq!(summary.title, "T");
        assert_eq!(summary.total, "Total: 2 matches");
        assert_eq!(summary.previous, "Previous: 2 matches (win 1)");
        assert_eq!(summary.upcoming, "Upcoming: 0 matches");
    }

    #[test]
    fn test_team_summary_counts_upcoming() {
        let matches = vec![fixture(0, "T", "B", None, MatchType::Upcoming)];
        let summary = TeamSummary::from_matches("T", &matches);
        assert_eq!(summary.total, "Total: 1 matches");
        assert_eq!(summary.previous, "Previous: 0 matches (win 0)");
        assert_eq!(summary.upcoming, "Upcoming: 1 matches");
    }
}
