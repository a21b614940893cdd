use std::fmt;
use std::hash::{Hash, Hasher};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::utils::format_match_date;

/// Whether a match has been played or is still scheduled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, PartialOrd, Ord)]
pub enum MatchType {
    #[default]
    Previous,
    Upcoming,
}

impl MatchType {
    /// Section title for this group of matches.
    pub fn title(&self) -> &'static str {
        match self {
            MatchType::Previous => "Previous",
            MatchType::Upcoming => "Upcoming",
        }
    }

    /// Integer code used by the local cache.
    pub fn code(&self) -> i64 {
        match self {
            MatchType::Previous => 0,
            MatchType::Upcoming => 1,
        }
    }

    /// Decode a cached type code. Anything unrecognised is a previous match.
    pub fn from_code(code: i64) -> Self {
        match code {
            1 => MatchType::Upcoming,
            _ => MatchType::Previous,
        }
    }
}

impl fmt::Display for MatchType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.title())
    }
}

/// A single fixture as served by the API.
///
/// Two matches are the same match when their [`identifier`](Match::identifier)
/// agrees, even if scores or highlights differ.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Match {
    #[serde(default, with = "wire_date")]
    pub date: Option<DateTime<Utc>>,
    pub description: Option<String>,
    pub home: Option<String>,
    pub winner: Option<String>,
    pub away: Option<String>,
    pub highlights: Option<String>,
    // Not on the wire: set by `MatchesEnvelope` or read back from the cache
    #[serde(skip)]
    pub match_type: MatchType,
}

impl Match {
    /// Display date followed by the description.
    pub fn identifier(&self) -> String {
        let date = self.date.as_ref().map(format_match_date).unwrap_or_default();
        format!("{}{}", date, self.description.as_deref().unwrap_or(""))
    }

    /// True if `team` played on either side.
    pub fn involves(&self, team: &str) -> bool {
        self.home.as_deref() == Some(team) || self.away.as_deref() == Some(team)
    }

    /// True if `team` is recorded as the winner.
    pub fn won_by(&self, team: &str) -> bool {
        self.winner.as_deref() == Some(team)
    }
}

impl PartialEq for Match {
    fn eq(&self, other: &Self) -> bool {
        self.identifier() == other.identifier()
    }
}

impl Eq for Match {}

impl Hash for Match {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.identifier().hash(state);
    }
}

/// Wire envelope for `GET /teams/matches`.
#[derive(Debug, Deserialize)]
pub struct MatchesEnvelope {
    matches: MatchGroups,
}

#[derive(Debug, Deserialize)]
struct MatchGroups {
    previous: Vec<Match>,
    upcoming: Vec<Match>,
}

impl MatchesEnvelope {
    /// Flatten both groups, previous first, tagging the upcoming ones.
    pub fn into_matches(self) -> Vec<Match> {
        let MatchGroups { previous, upcoming } = self.matches;
        let mut matches = previous;
        matches.reserve(upcoming.len());
        matches.extend(upcoming.into_iter().map(|mut m| {
            m.match_type = MatchType::Upcoming;
            m
        }));
        matches
    }
}

/// Serde adapter for optional API timestamps.
pub mod wire_date {
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    use crate::utils::{format_wire_date, parse_wire_date};

    pub fn serialize<S: Serializer>(
        date: &Option<DateTime<Utc>>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match date {
            Some(d) => serializer.serialize_str(&format_wire_date(d)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<DateTime<Utc>>, D::Error> {
        match Option::<String>::deserialize(deserializer)? {
            Some(raw) => parse_wire_date(&raw)
                .map(Some)
                .map_err(|e| serde::de::Error::custom(format!("invalid date {:?}: {}", raw, e))),
            None => Ok(None),
        }
    }
}
