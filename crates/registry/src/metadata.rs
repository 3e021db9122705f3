use serde::Serialize;

/// Display data cached at build time so lookup tables need no re-fetch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserMetadata {
    pub key: String,
    pub name: String,
    pub display_name: Option<String>,
    pub email: Option<String>,
    pub role: Option<String>,
    pub active: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StateMetadata {
    pub key: String,
    pub name: String,
    pub state_type: String,
    pub team_id: Option<String>,
    pub team_key: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProjectMetadata {
    pub key: String,
    pub name: String,
    pub slug: Option<String>,
    pub state: Option<String>,
    pub lead_id: Option<String>,
    /// Registry key of the lead; `None` when the lead is outside the snapshot.
    pub lead_key: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TeamMetadata {
    pub key: String,
    pub team_key: String,
    pub name: String,
}
