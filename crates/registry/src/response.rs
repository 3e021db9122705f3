//! Per-response helpers: ad hoc keys for ids outside the registry, lookup
//! tables for exactly the entities a response mentions, failure rows, and a
//! dangling-reference check.

use std::collections::{HashMap, HashSet};

use compact_encoder::{Document, Row, Section};
use compact_schema::{
    EntityKind, FieldRole, Schema, Value, FAILURES, PROJECTS_LOOKUP, STATES_LOOKUP, TEAMS_LOOKUP,
    USERS_LOOKUP,
};

use crate::error::ResolutionError;
use crate::key::{format_external_key, is_external_key};
use crate::registry::Registry;

const EXTERNAL_LABEL: &str = "(external)";

#[derive(Debug, Clone)]
struct ExternalEntry {
    kind: EntityKind,
    key: String,
    name: Option<String>,
}

/// Key allocator scoped to a single response.
///
/// Registry keys are returned as-is. Ids the registry does not know (e.g.
/// deactivated or guest users) get `ext0`, `ext1`, ... which are stable within
/// this response only and never written back into the registry.
#[derive(Debug)]
pub struct ResponseKeys<'r> {
    registry: &'r Registry,
    external_by_id: HashMap<(EntityKind, String), usize>,
    external: Vec<ExternalEntry>,
    used: HashMap<EntityKind, Vec<String>>,
    used_set: HashSet<(EntityKind, String)>,
}

impl<'r> ResponseKeys<'r> {
    #[must_use]
    pub fn new(registry: &'r Registry) -> Self {
        Self {
            registry,
            external_by_id: HashMap::new(),
            external: Vec::new(),
            used: HashMap::new(),
            used_set: HashSet::new(),
        }
    }

    #[must_use]
    pub fn registry(&self) -> &'r Registry {
        self.registry
    }

    /// Key for `id`, allocating an `ext` key if the registry does not know it.
    pub fn key_for(&mut self, kind: EntityKind, id: &str) -> String {
        self.key_for_named(kind, id, None)
    }

    /// Same as [`ResponseKeys::key_for`]; `name` labels the lookup row if an
    /// `ext` key has to be allocated.
    pub fn key_for_named(&mut self, kind: EntityKind, id: &str, name: Option<&str>) -> String {
        let registry = self.registry;
        let key = match registry.reverse_lookup(kind, id) {
            Some(key) => key.to_string(),
            None => self.external_key(kind, id, name),
        };
        self.mark_used(kind, &key);

        if kind == EntityKind::Project {
            let lead = registry
                .project_metadata(id)
                .and_then(|meta| meta.lead_id.as_deref());
            if let Some(lead_id) = lead {
                self.key_for(EntityKind::User, lead_id);
            }
        }
        key
    }

    /// Optional id → cell value (`Null` when absent).
    pub fn cell(&mut self, kind: EntityKind, id: Option<&str>) -> Value {
        id.map_or(Value::Null, |id| Value::Str(self.key_for(kind, id)))
    }

    fn external_key(&mut self, kind: EntityKind, id: &str, name: Option<&str>) -> String {
        let lookup = (kind, id.to_string());
        if let Some(&idx) = self.external_by_id.get(&lookup) {
            let entry = &mut self.external[idx];
            if entry.name.is_none() {
                entry.name = name.map(str::to_string);
            }
            return self.external[idx].key.clone();
        }
        let key = format_external_key(self.external.len());
        log::debug!("allocated {key} for {kind} {id} outside the registry");
        self.external_by_id.insert(lookup, self.external.len());
        self.external.push(ExternalEntry {
            kind,
            key: key.clone(),
            name: name.map(str::to_string),
        });
        key
    }

    fn mark_used(&mut self, kind: EntityKind, key: &str) {
        if self.used_set.insert((kind, key.to_string())) {
            self.used.entry(kind).or_default().push(key.to_string());
        }
    }

    #[must_use]
    pub fn external_count(&self) -> usize {
        self.external.len()
    }

    /// Lookup sections (`_users`, `_states`, `_projects`, `_teams`) for every
    /// key handed out so far, in first-use order. Kinds with no keys are
    /// skipped.
    #[must_use]
    pub fn lookups(&self) -> Vec<Section> {
        EntityKind::ALL
            .into_iter()
            .filter_map(|kind| {
                let keys = self.used.get(&kind).filter(|keys| !keys.is_empty())?;
                let rows = keys.iter().map(|key| self.lookup_row(kind, key)).collect();
                Some(Section::with_rows(lookup_schema(kind), rows))
            })
            .collect()
    }

    fn lookup_row(&self, kind: EntityKind, key: &str) -> Row {
        if is_external_key(key) {
            return self.external_row(kind, key);
        }
        let id = self.registry.resolve(kind, key).unwrap_or_default();
        match kind {
            EntityKind::User => {
                let meta = self.registry.user_metadata(&id);
                Row::new()
                    .with("key", key)
                    .with("name", meta.map(|m| m.name.clone()))
                    .with("displayName", meta.and_then(|m| m.display_name.clone()))
                    .with("email", meta.and_then(|m| m.email.clone()))
                    .with("role", meta.and_then(|m| m.role.clone()))
            }
            EntityKind::State => {
                let meta = self.registry.state_metadata(&id);
                Row::new()
                    .with("key", key)
                    .with("name", meta.map(|m| m.name.clone()))
                    .with("type", meta.map(|m| m.state_type.clone()))
            }
            EntityKind::Project => {
                let meta = self.registry.project_metadata(&id);
                let lead = meta
                    .and_then(|m| m.lead_id.as_deref())
                    .and_then(|lead_id| self.known_key(EntityKind::User, lead_id));
                Row::new()
                    .with("key", key)
                    .with("name", meta.map(|m| m.name.clone()))
                    .with("state", meta.and_then(|m| m.state.clone()))
                    .with("lead", lead)
            }
            EntityKind::Team => {
                let meta = self.registry.team_metadata(&id);
                Row::new()
                    .with("key", key)
                    .with("teamKey", meta.map(|m| m.team_key.clone()))
                    .with("name", meta.map(|m| m.name.clone()))
            }
        }
    }

    /// Registry or already-allocated `ext` key, without allocating.
    fn known_key(&self, kind: EntityKind, id: &str) -> Option<String> {
        if let Some(key) = self.registry.reverse_lookup(kind, id) {
            return Some(key.to_string());
        }
        self.external_by_id
            .get(&(kind, id.to_string()))
            .map(|&idx| self.external[idx].key.clone())
    }

    fn external_row(&self, kind: EntityKind, key: &str) -> Row {
        let name = self
            .external
            .iter()
            .find(|e| e.kind == kind && e.key == key)
            .and_then(|e| e.name.as_deref())
            .map_or_else(
                || EXTERNAL_LABEL.to_string(),
                |name| format!("{name} {EXTERNAL_LABEL}"),
            );
        let mut row = Row::new().with("key", key).with("name", name);
        for field in lookup_schema(kind).field_names() {
            if !row.contains(field) {
                row.set(field, Value::Null);
            }
        }
        row
    }
}

#[must_use]
pub fn lookup_schema(kind: EntityKind) -> &'static Schema {
    match kind {
        EntityKind::User => &USERS_LOOKUP,
        EntityKind::State => &STATES_LOOKUP,
        EntityKind::Project => &PROJECTS_LOOKUP,
        EntityKind::Team => &TEAMS_LOOKUP,
    }
}

/// `failures` section holding one row per failed item of a batch.
///
/// `outcomes` is indexed like the batch input; successes are skipped.
#[must_use]
pub fn failure_section<T>(outcomes: &[Result<T, ResolutionError>]) -> Section {
    let rows = outcomes
        .iter()
        .enumerate()
        .filter_map(|(idx, outcome)| outcome.as_ref().err().map(|err| failure_row(idx, err)))
        .collect();
    Section::with_rows(&FAILURES, rows)
}

#[must_use]
pub fn failure_row(index: usize, err: &ResolutionError) -> Row {
    Row::new()
        .with("index", index)
        .with("kind", err.kind.as_str())
        .with("key", err.requested.as_str())
        .with("error", "unknown key")
        .with("suggestions", Value::joined(&err.suggestions, " "))
}

/// A short key in a reference column that nothing can resolve.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DanglingReference {
    pub section: String,
    pub row: usize,
    pub field: String,
    pub key: String,
}

/// Finds reference cells that neither the registry nor the document's own
/// lookup tables can resolve.
#[must_use]
pub fn check_references(doc: &Document, registry: &Registry) -> Vec<DanglingReference> {
    let mut defined: HashSet<(EntityKind, String)> = HashSet::new();
    for section in &doc.lookups {
        let Some(key_field) = section.schema.key_field() else {
            continue;
        };
        let Some(kind) = key_field.entity() else {
            continue;
        };
        for row in &section.rows {
            if let Some(key) = row.get(key_field.name).and_then(Value::as_str) {
                defined.insert((kind, key.to_ascii_lowercase()));
            }
        }
    }

    let mut dangling = Vec::new();
    for section in doc.sections() {
        for field in section.schema.fields {
            let FieldRole::Ref(kind) = field.role else {
                continue;
            };
            for (idx, row) in section.rows.iter().enumerate() {
                let Some(key) = row.get(field.name).and_then(Value::as_str) else {
                    continue;
                };
                let known = defined.contains(&(kind, key.to_ascii_lowercase()))
                    || registry.resolve(kind, key).is_some();
                if !known {
                    dangling.push(DanglingReference {
                        section: section.name().to_string(),
                        row: idx,
                        field: field.name.to_string(),
                        key: key.to_string(),
                    });
                }
            }
        }
    }
    dangling
}
