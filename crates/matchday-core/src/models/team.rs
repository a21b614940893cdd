use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Team {
    pub id: String,
    pub name: Option<String>,
    pub logo: Option<String>,
}

/// Shown for teams sent without a name.
const UNKNOWN_TEAM: &str = "Unknown";

pub(crate) fn display_name(name: Option<&str>) -> &str {
    name.unwrap_or(UNKNOWN_TEAM)
}

impl Team {
    pub fn display_name(&self) -> &str {
        display_name(self.name.as_deref())
    }
}

/// Wire envelope for `GET /teams`. A missing list means no teams.
#[derive(Debug, Deserialize)]
pub struct TeamsEnvelope {
    #[serde(default)]
    teams: Option<Vec<Team>>,
}

impl TeamsEnvelope {
    pub fn into_teams(self) -> Vec<Team> {
        self.teams.unwrap_or_default()
    }
}
