use std::collections::{HashMap, HashSet};
use std::time::Duration;

use chrono::{DateTime, Utc};
use compact_schema::EntityKind;

use crate::error::{RegistryError, ResolutionError, Result};
use crate::key::{format_key, is_uuid, ShortKey};
use crate::metadata::{ProjectMetadata, StateMetadata, TeamMetadata, UserMetadata};
use crate::snapshot::{
    creation_order, ProjectSnapshot, Snapshot, SnapshotSet, StateSnapshot, TeamSnapshot,
    UserSnapshot,
};

/// How many valid keys a [`ResolutionError`] carries.
pub const SUGGESTION_LIMIT: usize = 5;

#[derive(Debug, Clone, Default)]
pub struct BuildOptions {
    pub workspace_id: String,
    /// URL segment of the workspace, e.g. `acme` in `https://linear.app/acme/...`.
    pub workspace_key: Option<String>,
    /// Team id or team key whose states get unprefixed keys.
    pub default_team: Option<String>,
}

impl BuildOptions {
    #[must_use]
    pub fn new(workspace_id: impl Into<String>) -> Self {
        Self {
            workspace_id: workspace_id.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_workspace_key(mut self, key: impl Into<String>) -> Self {
        self.workspace_key = Some(key.into());
        self
    }

    #[must_use]
    pub fn with_default_team(mut self, team: impl Into<String>) -> Self {
        self.default_team = Some(team.into());
        self
    }
}

/// One direction per map; `keys` keeps assignment order for listings.
#[derive(Debug, Clone, Default)]
struct KeyMap {
    by_key: HashMap<String, String>,
    by_id: HashMap<String, String>,
    keys: Vec<String>,
}

impl KeyMap {
    fn insert(&mut self, key: String, id: &str) {
        self.by_key.insert(key.clone(), id.to_string());
        self.by_id.insert(id.to_string(), key.clone());
        self.keys.push(key);
    }
}

/// Bidirectional short key ↔ id maps for one workspace snapshot.
#[derive(Debug, Clone)]
pub struct Registry {
    users: KeyMap,
    states: KeyMap,
    projects: KeyMap,
    teams: KeyMap,
    user_meta: HashMap<String, UserMetadata>,
    state_meta: HashMap<String, StateMetadata>,
    project_meta: HashMap<String, ProjectMetadata>,
    team_meta: HashMap<String, TeamMetadata>,
    /// Lower-cased project slug or slug hash → project key.
    project_slugs: HashMap<String, String>,
    /// Upper-cased team key → team id.
    team_ids_by_key: HashMap<String, String>,
    default_team_id: Option<String>,
    workspace_id: String,
    workspace_key: Option<String>,
    generated_at: DateTime<Utc>,
}

impl Registry {
    fn empty(options: &BuildOptions, generated_at: DateTime<Utc>) -> Self {
        Self {
            users: KeyMap::default(),
            states: KeyMap::default(),
            projects: KeyMap::default(),
            teams: KeyMap::default(),
            user_meta: HashMap::new(),
            state_meta: HashMap::new(),
            project_meta: HashMap::new(),
            team_meta: HashMap::new(),
            project_slugs: HashMap::new(),
            team_ids_by_key: HashMap::new(),
            default_team_id: None,
            workspace_id: options.workspace_id.clone(),
            workspace_key: options.workspace_key.clone(),
            generated_at,
        }
    }

    /// Assigns short keys to every snapshot.
    ///
    /// Each kind is sorted by `createdAt` (ties keep input order) and numbered
    /// from 0. States are numbered per team: the default team's states are
    /// unprefixed, every other team's states carry `<team key>:`.
    pub fn build(
        snapshots: &SnapshotSet,
        options: &BuildOptions,
        generated_at: DateTime<Utc>,
    ) -> Result<Self> {
        check_ids(EntityKind::User, &snapshots.users)?;
        check_ids(EntityKind::State, &snapshots.states)?;
        check_ids(EntityKind::Project, &snapshots.projects)?;
        check_ids(EntityKind::Team, &snapshots.teams)?;

        let mut registry = Self::empty(options, generated_at);
        registry.assign_teams(&snapshots.teams)?;
        registry.default_team_id = pick_default_team(&snapshots.teams, options)?;
        registry.assign_users(&snapshots.users);
        registry.assign_states(&snapshots.states, &snapshots.teams)?;
        registry.assign_projects(&snapshots.projects);

        log::debug!(
            "built registry for workspace {}: {} users, {} states, {} projects, {} teams",
            registry.workspace_id,
            registry.users.keys.len(),
            registry.states.keys.len(),
            registry.projects.keys.len(),
            registry.teams.keys.len()
        );
        Ok(registry)
    }

    fn assign_teams(&mut self, teams: &[TeamSnapshot]) -> Result<()> {
        for (n, idx) in creation_order(teams).into_iter().enumerate() {
            let team = &teams[idx];
            let team_key = team.key.trim().to_ascii_uppercase();
            if team_key.is_empty() {
                return Err(malformed(EntityKind::Team, idx, "empty team key"));
            }
            if self.team_ids_by_key.contains_key(&team_key) {
                return Err(malformed(
                    EntityKind::Team,
                    idx,
                    format!("duplicate team key `{team_key}`"),
                ));
            }
            let key = format_key("", EntityKind::Team, n);
            self.team_ids_by_key.insert(team_key.clone(), team.id.clone());
            self.team_meta.insert(
                team.id.clone(),
                TeamMetadata {
                    key: key.clone(),
                    team_key,
                    name: team.name.clone(),
                },
            );
            self.teams.insert(key, &team.id);
        }
        Ok(())
    }

    fn assign_users(&mut self, users: &[UserSnapshot]) {
        for (n, idx) in creation_order(users).into_iter().enumerate() {
            let user = &users[idx];
            let key = format_key("", EntityKind::User, n);
            self.user_meta.insert(
                user.id.clone(),
                UserMetadata {
                    key: key.clone(),
                    name: user.name.clone(),
                    display_name: user.display_name.clone(),
                    email: user.email.clone(),
                    role: user.role.clone(),
                    active: user.active,
                },
            );
            self.users.insert(key, &user.id);
        }
    }

    fn assign_states(&mut self, states: &[StateSnapshot], teams: &[TeamSnapshot]) -> Result<()> {
        let teams_by_id: HashMap<&str, &TeamSnapshot> =
            teams.iter().map(|t| (t.id.as_str(), t)).collect();
        let mut next_index: HashMap<String, usize> = HashMap::new();

        for idx in creation_order(states) {
            let state = &states[idx];
            let (scope, team_key) = match state.team_id.as_deref() {
                Some(team_id) if !teams.is_empty() => {
                    let Some(team) = teams_by_id.get(team_id) else {
                        return Err(malformed(
                            EntityKind::State,
                            idx,
                            format!("unknown team id `{team_id}`"),
                        ));
                    };
                    let scope = if self.default_team_id.as_deref() == Some(team.id.as_str()) {
                        String::new()
                    } else {
                        team.key.trim().to_ascii_lowercase()
                    };
                    (scope, Some(team.key.trim().to_ascii_uppercase()))
                }
                _ => (String::new(), None),
            };

            let counter = next_index.entry(scope.clone()).or_insert(0);
            let key = format_key(&scope, EntityKind::State, *counter);
            *counter += 1;

            self.state_meta.insert(
                state.id.clone(),
                StateMetadata {
                    key: key.clone(),
                    name: state.name.clone(),
                    state_type: state.state_type.clone(),
                    team_id: state.team_id.clone(),
                    team_key,
                },
            );
            self.states.insert(key, &state.id);
        }
        Ok(())
    }

    fn assign_projects(&mut self, projects: &[ProjectSnapshot]) {
        for (n, idx) in creation_order(projects).into_iter().enumerate() {
            let project = &projects[idx];
            let key = format_key("", EntityKind::Project, n);
            let lead_key = project
                .lead_id
                .as_deref()
                .and_then(|id| self.users.by_id.get(id))
                .cloned();
            if let Some(slug) = project.slug.as_deref() {
                self.index_project_slug(slug, &key);
            }
            self.project_meta.insert(
                project.id.clone(),
                ProjectMetadata {
                    key: key.clone(),
                    name: project.name.clone(),
                    slug: project.slug.clone(),
                    state: project.state.clone(),
                    lead_id: project.lead_id.clone(),
                    lead_key,
                },
            );
            self.projects.insert(key, &project.id);
        }
    }

    /// Indexes the full slug and its trailing hash (`mobile-app-3f2a9c1b7d4e`
    /// → `3f2a9c1b7d4e`). A full slug always wins over another project's hash.
    fn index_project_slug(&mut self, slug: &str, key: &str) {
        let slug = slug.trim().to_ascii_lowercase();
        if slug.is_empty() {
            return;
        }
        if let Some((_, hash)) = slug.rsplit_once('-') {
            if !hash.is_empty() && hash.chars().all(|c| c.is_ascii_alphanumeric()) {
                self.project_slugs
                    .entry(hash.to_string())
                    .or_insert_with(|| key.to_string());
            }
        }
        self.project_slugs.insert(slug, key.to_string());
    }

    fn map(&self, kind: EntityKind) -> &KeyMap {
        match kind {
            EntityKind::User => &self.users,
            EntityKind::State => &self.states,
            EntityKind::Project => &self.projects,
            EntityKind::Team => &self.teams,
        }
    }

    /// Short key (any case) or canonical id → canonical id.
    ///
    /// Ids the registry holds and hyphenated UUIDs pass through unchanged, so
    /// callers that already hold canonical ids can use the same path. Team keys
    /// such as `SQT` are accepted for teams. Unknown and out-of-range keys are
    /// both `None`.
    #[must_use]
    pub fn resolve(&self, kind: EntityKind, key_or_id: &str) -> Option<String> {
        let raw = key_or_id.trim();
        if raw.is_empty() {
            return None;
        }
        let map = self.map(kind);
        if map.by_id.contains_key(raw) || is_uuid(raw) {
            return Some(raw.to_string());
        }
        if let Some(id) = map.by_key.get(&raw.to_ascii_lowercase()) {
            return Some(id.clone());
        }
        if kind == EntityKind::Team {
            return self
                .team_ids_by_key
                .get(&raw.to_ascii_uppercase())
                .cloned();
        }
        None
    }

    /// Like [`Registry::resolve`], but explains the miss.
    pub fn resolve_or_error(
        &self,
        kind: EntityKind,
        key_or_id: &str,
    ) -> std::result::Result<String, ResolutionError> {
        self.resolve(kind, key_or_id)
            .ok_or_else(|| ResolutionError {
                kind,
                requested: key_or_id.to_string(),
                suggestions: self.nearby_keys(kind, key_or_id, SUGGESTION_LIMIT),
            })
    }

    /// Resolves every input independently so one bad key does not sink a batch.
    pub fn resolve_batch<S: AsRef<str>>(
        &self,
        kind: EntityKind,
        inputs: &[S],
    ) -> Vec<std::result::Result<String, ResolutionError>> {
        inputs
            .iter()
            .map(|input| self.resolve_or_error(kind, input.as_ref()))
            .collect()
    }

    /// Valid keys closest to `requested`: same scope, ordered by numeric
    /// distance. Falls back to the first keys in assignment order.
    #[must_use]
    pub fn nearby_keys(&self, kind: EntityKind, requested: &str, limit: usize) -> Vec<String> {
        let keys = &self.map(kind).keys;
        let fallback = || keys.iter().take(limit).cloned().collect::<Vec<_>>();
        let Some(wanted) = ShortKey::parse(&requested.trim().to_ascii_lowercase()) else {
            return fallback();
        };

        let mut candidates: Vec<(u64, u64, &String)> = keys
            .iter()
            .filter_map(|key| {
                let parsed = ShortKey::parse(key)?;
                (parsed.scope == wanted.scope).then(|| {
                    (parsed.index.abs_diff(wanted.index), parsed.index, key)
                })
            })
            .collect();
        if candidates.is_empty() {
            return fallback();
        }
        candidates.sort();
        candidates
            .into_iter()
            .take(limit)
            .map(|(_, _, key)| key.clone())
            .collect()
    }

    /// Id → short key. `None` for ids outside the snapshot.
    #[must_use]
    pub fn reverse_lookup(&self, kind: EntityKind, id: &str) -> Option<&str> {
        self.map(kind).by_id.get(id).map(String::as_str)
    }

    /// Keys of one kind in assignment order.
    #[must_use]
    pub fn keys(&self, kind: EntityKind) -> &[String] {
        &self.map(kind).keys
    }

    /// `(key, id)` pairs of one kind in assignment order.
    pub fn entries(&self, kind: EntityKind) -> impl Iterator<Item = (&str, &str)> + '_ {
        let map = self.map(kind);
        map.keys.iter().filter_map(move |key| {
            map.by_key
                .get(key)
                .map(|id| (key.as_str(), id.as_str()))
        })
    }

    #[must_use]
    pub fn len(&self, kind: EntityKind) -> usize {
        self.map(kind).keys.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        EntityKind::ALL.into_iter().all(|kind| self.len(kind) == 0)
    }

    #[must_use]
    pub fn user_metadata(&self, id: &str) -> Option<&UserMetadata> {
        self.user_meta.get(id)
    }

    #[must_use]
    pub fn state_metadata(&self, id: &str) -> Option<&StateMetadata> {
        self.state_meta.get(id)
    }

    #[must_use]
    pub fn project_metadata(&self, id: &str) -> Option<&ProjectMetadata> {
        self.project_meta.get(id)
    }

    #[must_use]
    pub fn team_metadata(&self, id: &str) -> Option<&TeamMetadata> {
        self.team_meta.get(id)
    }

    /// Project key for a full URL slug or its hash suffix.
    #[must_use]
    pub fn project_key_for_slug(&self, slug_or_hash: &str) -> Option<&str> {
        let lowered = slug_or_hash.trim().to_ascii_lowercase();
        if let Some(key) = self.project_slugs.get(&lowered) {
            return Some(key);
        }
        let (_, hash) = lowered.rsplit_once('-')?;
        self.project_slugs.get(hash).map(String::as_str)
    }

    /// URL slug for a project key.
    #[must_use]
    pub fn project_slug(&self, key: &str) -> Option<&str> {
        let id = self.projects.by_key.get(&key.to_ascii_lowercase())?;
        self.project_meta.get(id)?.slug.as_deref()
    }

    /// Upper-cased team keys (`SQT`, `SQM`, ...).
    pub fn team_keys(&self) -> impl Iterator<Item = &str> + '_ {
        self.team_ids_by_key.keys().map(String::as_str)
    }

    #[must_use]
    pub fn default_team_id(&self) -> Option<&str> {
        self.default_team_id.as_deref()
    }

    #[must_use]
    pub fn workspace_id(&self) -> &str {
        &self.workspace_id
    }

    #[must_use]
    pub fn workspace_key(&self) -> Option<&str> {
        self.workspace_key.as_deref()
    }

    #[must_use]
    pub fn generated_at(&self) -> DateTime<Utc> {
        self.generated_at
    }

    /// Time since generation; zero if `now` is before it.
    #[must_use]
    pub fn age(&self, now: DateTime<Utc>) -> Duration {
        (now - self.generated_at).to_std().unwrap_or(Duration::ZERO)
    }

    #[must_use]
    pub fn is_stale(&self, now: DateTime<Utc>, ttl: Duration) -> bool {
        self.age(now) >= ttl
    }

    #[must_use]
    pub fn remaining_ttl(&self, now: DateTime<Utc>, ttl: Duration) -> Duration {
        ttl.saturating_sub(self.age(now))
    }
}

fn malformed(kind: EntityKind, index: usize, reason: impl Into<String>) -> RegistryError {
    RegistryError::MalformedSnapshot {
        kind,
        index,
        reason: reason.into(),
    }
}

fn check_ids<T: Snapshot>(kind: EntityKind, items: &[T]) -> Result<()> {
    let mut seen = HashSet::new();
    for (idx, item) in items.iter().enumerate() {
        if item.id().trim().is_empty() {
            return Err(malformed(kind, idx, "empty id"));
        }
        if !seen.insert(item.id()) {
            return Err(RegistryError::DuplicateId {
                kind,
                id: item.id().to_string(),
            });
        }
    }
    Ok(())
}

fn pick_default_team(teams: &[TeamSnapshot], options: &BuildOptions) -> Result<Option<String>> {
    match options.default_team.as_deref().map(str::trim) {
        Some(wanted) if !wanted.is_empty() => teams
            .iter()
            .find(|t| t.id == wanted || t.key.trim().eq_ignore_ascii_case(wanted))
            .map(|t| Some(t.id.clone()))
            .ok_or_else(|| RegistryError::UnknownDefaultTeam(wanted.to_string())),
        _ if teams.len() == 1 => Ok(Some(teams[0].id.clone())),
        _ => Ok(None),
    }
}
