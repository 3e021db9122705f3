use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Entity types that receive short keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    User,
    State,
    Project,
    Team,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Unknown entity type: {0}")]
pub struct UnknownKind(pub String);

impl EntityKind {
    pub const ALL: [EntityKind; 4] = [
        EntityKind::User,
        EntityKind::State,
        EntityKind::Project,
        EntityKind::Team,
    ];

    /// Short-key tag, e.g. `u` in `u3`.
    #[must_use]
    pub const fn tag(self) -> &'static str {
        match self {
            EntityKind::User => "u",
            EntityKind::State => "s",
            EntityKind::Project => "pr",
            EntityKind::Team => "t",
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            EntityKind::User => "user",
            EntityKind::State => "state",
            EntityKind::Project => "project",
            EntityKind::Team => "team",
        }
    }

    /// Plural collection name used in snapshot payloads.
    #[must_use]
    pub const fn plural(self) -> &'static str {
        match self {
            EntityKind::User => "users",
            EntityKind::State => "states",
            EntityKind::Project => "projects",
            EntityKind::Team => "teams",
        }
    }

    /// Whether keys of this kind are numbered per team.
    #[must_use]
    pub const fn is_team_scoped(self) -> bool {
        matches!(self, EntityKind::State)
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntityKind {
    type Err = UnknownKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lowered = s.trim().to_ascii_lowercase();
        EntityKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == lowered || kind.plural() == lowered)
            .ok_or_else(|| UnknownKind(s.to_string()))
    }
}
