use chrono::{DateTime, Utc};
use compact_schema::EntityKind;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::{RegistryError, Result};

/// Fields every snapshot shares; key assignment only looks at these.
pub trait Snapshot {
    fn id(&self) -> &str;
    fn created_at(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSnapshot {
    pub id: String,
    pub created_at: DateTime<Utc>,
    pub name: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default = "default_active")]
    pub active: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StateSnapshot {
    pub id: String,
    pub created_at: DateTime<Utc>,
    pub name: String,
    #[serde(rename = "type")]
    pub state_type: String,
    #[serde(default)]
    pub team_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectSnapshot {
    pub id: String,
    pub created_at: DateTime<Utc>,
    pub name: String,
    /// URL slug, usually `<name>-<hash>`.
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub lead_id: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamSnapshot {
    pub id: String,
    pub created_at: DateTime<Utc>,
    pub key: String,
    pub name: String,
}

const fn default_active() -> bool {
    true
}

macro_rules! impl_snapshot {
    ($($ty:ty),*) => {
        $(impl Snapshot for $ty {
            fn id(&self) -> &str {
                &self.id
            }

            fn created_at(&self) -> DateTime<Utc> {
                self.created_at
            }
        })*
    };
}

impl_snapshot!(UserSnapshot, StateSnapshot, ProjectSnapshot, TeamSnapshot);

/// Everything one registry build consumes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SnapshotSet {
    #[serde(default)]
    pub users: Vec<UserSnapshot>,
    #[serde(default)]
    pub states: Vec<StateSnapshot>,
    #[serde(default)]
    pub projects: Vec<ProjectSnapshot>,
    #[serde(default)]
    pub teams: Vec<TeamSnapshot>,
}

impl SnapshotSet {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
            && self.states.is_empty()
            && self.projects.is_empty()
            && self.teams.is_empty()
    }

    #[must_use]
    pub fn len(&self, kind: EntityKind) -> usize {
        match kind {
            EntityKind::User => self.users.len(),
            EntityKind::State => self.states.len(),
            EntityKind::Project => self.projects.len(),
            EntityKind::Team => self.teams.len(),
        }
    }

    /// Parses `{"users": [...], "states": [...], ...}`, reporting the kind and
    /// index of the first snapshot that does not deserialize.
    pub fn from_json(value: serde_json::Value) -> Result<Self> {
        let serde_json::Value::Object(map) = value else {
            return Err(RegistryError::InvalidPayload(
                "expected an object keyed by entity type".to_string(),
            ));
        };

        let mut set = Self::default();
        for (name, items) in map {
            let kind: EntityKind = name.parse()?;
            let serde_json::Value::Array(items) = items else {
                return Err(RegistryError::InvalidPayload(format!(
                    "`{name}` must be an array"
                )));
            };
            match kind {
                EntityKind::User => set.users = parse_items(kind, items)?,
                EntityKind::State => set.states = parse_items(kind, items)?,
                EntityKind::Project => set.projects = parse_items(kind, items)?,
                EntityKind::Team => set.teams = parse_items(kind, items)?,
            }
        }
        Ok(set)
    }
}

fn parse_items<T: DeserializeOwned>(
    kind: EntityKind,
    items: Vec<serde_json::Value>,
) -> Result<Vec<T>> {
    items
        .into_iter()
        .enumerate()
        .map(|(index, item)| {
            serde_json::from_value(item).map_err(|err| RegistryError::MalformedSnapshot {
                kind,
                index,
                reason: err.to_string(),
            })
        })
        .collect()
}

/// Indices of `items` ordered by creation time, ties kept in input order.
pub(crate) fn creation_order<T: Snapshot>(items: &[T]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..items.len()).collect();
    order.sort_by_key(|&idx| items[idx].created_at());
    order
}
