use std::collections::BTreeSet;

use uuid::Uuid;

use crate::models::{team, Match, Team};
use crate::utils::format_match_date;

const WINNER_SUFFIX: &str = " (winner)";

/// A titled group of display items.
///
/// Every section gets a fresh id when it is built, so rebuilding the same
/// content yields a section that compares unequal to the old one.
#[derive(Debug, Clone, PartialEq)]
pub struct Section<I> {
    pub id: Uuid,
    pub title: String,
    pub items: Vec<I>,
}

impl<I> Section<I> {
    pub fn new(title: impl Into<String>, items: Vec<I>) -> Self {
        Self {
            id: Uuid::new_v4(),
            title: title.into(),
            items,
        }
    }
}

/// Everything one view shows, in display order.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot<I> {
    pub sections: Vec<Section<I>>,
}

// Manual impl: derive would require `I: Default`
impl<I> Default for Snapshot<I> {
    fn default() -> Self {
        Self { sections: Vec::new() }
    }
}

impl<I> Snapshot<I> {
    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    pub fn total_items(&self) -> usize {
        self.sections.iter().map(|s| s.items.len()).sum()
    }

    pub fn section_titles(&self) -> Vec<&str> {
        self.sections.iter().map(|s| s.title.as_str()).collect()
    }

    pub fn items(&self) -> impl Iterator<Item = &I> {
        self.sections.iter().flat_map(|s| s.items.iter())
    }
}

/// One row of the matches list.
#[derive(Debug, Clone)]
pub struct MatchItem {
    pub identifier: String,
    pub date: Option<String>,
    pub description: Option<String>,
    pub home: String,
    pub away: String,
    pub highlights: Option<String>,
}

impl MatchItem {
    fn side(name: Option<&str>, winner: Option<&str>) -> String {
        match name {
            Some(name) if winner == Some(name) => format!("{name}{WINNER_SUFFIX}"),
            Some(name) => name.to_string(),
            None => String::new(),
        }
    }
}

impl From<&Match> for MatchItem {
    fn from(m: &Match) -> Self {
        let winner = m.winner.as_deref();
        Self {
            identifier: m.identifier(),
            date: m.date.as_ref().map(format_match_date),
            description: m.description.clone(),
            home: Self::side(m.home.as_deref(), winner),
            away: Self::side(m.away.as_deref(), winner),
            highlights: m.highlights.clone(),
        }
    }
}

impl PartialEq for MatchItem {
    fn eq(&self, other: &Self) -> bool {
        self.identifier == other.identifier
    }
}

impl Eq for MatchItem {}

/// One row of the team picker.
#[derive(Debug, Clone)]
pub struct TeamItem {
    pub identifier: String,
    pub name: Option<String>,
    pub logo: Option<String>,
    pub is_selected: bool,
}

impl TeamItem {
    pub fn new(team: &Team, filter: &TeamFilter) -> Self {
        Self {
            identifier: team.id.clone(),
            name: team.name.clone(),
            logo: team.logo.clone(),
            is_selected: team.name.as_deref().is_some_and(|name| filter.contains(name)),
        }
    }

    pub fn display_name(&self) -> &str {
        team::display_name(self.name.as_deref())
    }
}

impl PartialEq for TeamItem {
    fn eq(&self, other: &Self) -> bool {
        self.identifier == other.identifier
    }
}

impl Eq for TeamItem {}

/// The set of team names the user picked. Empty means "all teams".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TeamFilter(BTreeSet<String>);

impl TeamFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains(&self, team: &str) -> bool {
        self.0.contains(team)
    }

    /// Select `team` if it is not selected, otherwise deselect it.
    pub fn toggle(&mut self, team: &str) {
        if !self.0.remove(team) {
            self.0.insert(team.to_string());
        }
    }

    /// True if either side of the match is selected.
    pub fn admits(&self, m: &Match) -> bool {
        [m.home.as_deref(), m.away.as_deref()]
            .into_iter()
            .flatten()
            .any(|team| self.contains(team))
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

impl<S: Into<String>> FromIterator<S> for TeamFilter {
    fn from_iter<T: IntoIterator<Item = S>>(iter: T) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}
