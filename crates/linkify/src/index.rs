use std::collections::{BTreeMap, BTreeSet};

use compact_registry::Registry;
use compact_schema::EntityKind;

/// Workspace URL root, e.g. `https://linear.app/acme`.
#[must_use]
pub fn url_base(host: &str, workspace_key: &str) -> String {
    format!(
        "https://{}/{}",
        host.trim().trim_end_matches('/'),
        workspace_key.trim().trim_matches('/')
    )
}

/// What the rewriter needs to know to compact reference URLs.
pub trait ReferenceResolver {
    /// Workspace URL root without a trailing slash.
    fn url_base(&self) -> &str;

    /// `team_key` arrives upper-cased.
    fn knows_team(&self, team_key: &str) -> bool;

    /// Project short key for a full slug or its hash suffix.
    fn project_key(&self, slug_or_hash: &str) -> Option<String>;

    fn project_name(&self, _project_key: &str) -> Option<String> {
        None
    }

    fn issue_title(&self, _identifier: &str) -> Option<String> {
        None
    }
}

/// Lookup data for [`crate::forward_link`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LinkIndex {
    url_base: String,
    team_keys: BTreeSet<String>,
    project_slugs: BTreeMap<String, String>,
    project_names: BTreeMap<String, String>,
}

impl LinkIndex {
    pub fn new(url_base: impl Into<String>) -> Self {
        let url_base: String = url_base.into();
        Self {
            url_base: url_base.trim_end_matches('/').to_string(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_team(mut self, key: &str) -> Self {
        self.team_keys.insert(key.trim().to_ascii_uppercase());
        self
    }

    #[must_use]
    pub fn with_project(mut self, key: &str, slug: &str) -> Self {
        self.project_slugs
            .insert(key.trim().to_ascii_lowercase(), slug.trim().to_string());
        self
    }

    #[must_use]
    pub fn with_project_name(mut self, key: &str, name: &str) -> Self {
        self.project_names
            .insert(key.trim().to_ascii_lowercase(), name.to_string());
        self
    }

    /// Teams and slugged projects of a registry under `https://<host>/<workspace>`.
    /// The workspace URL key falls back to the workspace id.
    #[must_use]
    pub fn from_registry(registry: &Registry, host: &str) -> Self {
        let workspace = registry
            .workspace_key()
            .unwrap_or_else(|| registry.workspace_id());
        let mut index = Self::new(url_base(host, workspace));
        for team in registry.team_keys() {
            index = index.with_team(team);
        }
        for (key, id) in registry.entries(EntityKind::Project) {
            let Some(meta) = registry.project_metadata(id) else {
                continue;
            };
            if let Some(slug) = &meta.slug {
                index = index.with_project(key, slug);
            }
            index = index.with_project_name(key, &meta.name);
        }
        index
    }

    #[must_use]
    pub fn url_base(&self) -> &str {
        &self.url_base
    }

    #[must_use]
    pub fn knows_team(&self, team_key: &str) -> bool {
        self.team_keys.contains(&team_key.to_ascii_uppercase())
    }

    #[must_use]
    pub fn project_slug(&self, key: &str) -> Option<&str> {
        self.project_slugs
            .get(&key.to_ascii_lowercase())
            .map(String::as_str)
    }

    #[must_use]
    pub fn issue_url(&self, identifier: &str) -> String {
        format!("{}/issue/{identifier}", self.url_base)
    }

    #[must_use]
    pub fn project_url(&self, slug: &str) -> String {
        format!("{}/project/{slug}", self.url_base)
    }
}

impl ReferenceResolver for LinkIndex {
    fn url_base(&self) -> &str {
        &self.url_base
    }

    fn knows_team(&self, team_key: &str) -> bool {
        LinkIndex::knows_team(self, team_key)
    }

    fn project_key(&self, slug_or_hash: &str) -> Option<String> {
        let wanted = slug_or_hash.to_ascii_lowercase();
        let by_slug = self
            .project_slugs
            .iter()
            .find(|(_, slug)| slug.eq_ignore_ascii_case(&wanted));
        let by_hash = || {
            self.project_slugs.iter().find(|(_, slug)| {
                slug.rsplit_once('-')
                    .is_some_and(|(_, hash)| hash.eq_ignore_ascii_case(&wanted))
            })
        };
        by_slug.or_else(by_hash).map(|(key, _)| key.clone())
    }

    fn project_name(&self, project_key: &str) -> Option<String> {
        self.project_names
            .get(&project_key.to_ascii_lowercase())
            .cloned()
    }
}

/// [`ReferenceResolver`] backed by a session registry.
#[derive(Debug, Clone)]
pub struct RegistryResolver<'r> {
    registry: &'r Registry,
    url_base: String,
}

impl<'r> RegistryResolver<'r> {
    #[must_use]
    pub fn new(registry: &'r Registry, host: &str) -> Self {
        let workspace = registry
            .workspace_key()
            .unwrap_or_else(|| registry.workspace_id());
        Self {
            registry,
            url_base: url_base(host, workspace),
        }
    }
}

impl ReferenceResolver for RegistryResolver<'_> {
    fn url_base(&self) -> &str {
        &self.url_base
    }

    fn knows_team(&self, team_key: &str) -> bool {
        self.registry
            .team_keys()
            .any(|key| key.eq_ignore_ascii_case(team_key))
    }

    fn project_key(&self, slug_or_hash: &str) -> Option<String> {
        self.registry
            .project_key_for_slug(slug_or_hash)
            .map(str::to_string)
    }

    fn project_name(&self, project_key: &str) -> Option<String> {
        let id = self.registry.resolve(EntityKind::Project, project_key)?;
        self.registry
            .project_metadata(&id)
            .map(|meta| meta.name.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn index() -> LinkIndex {
        LinkIndex::new("https://linear.app/acme/")
            .with_team("sqt")
            .with_project("PR0", "mobile-app-3f2a9c1b7d4e")
    }

    #[test]
    fn builds_url_base_from_host_and_workspace() {
        assert_eq!(url_base("linear.app/", "/acme"), "https://linear.app/acme");
    }

    #[test]
    fn normalizes_keys() {
        let index = index();
        assert_eq!(index.url_base(), "https://linear.app/acme");
        assert!(index.knows_team("SQT"));
        assert!(index.knows_team("sqt"));
        assert_eq!(index.project_slug("pr0"), Some("mobile-app-3f2a9c1b7d4e"));
    }

    #[test]
    fn resolves_project_by_slug_or_hash() {
        let index = index();
        assert_eq!(
            ReferenceResolver::project_key(&index, "mobile-app-3f2a9c1b7d4e").as_deref(),
            Some("pr0")
        );
        assert_eq!(
            ReferenceResolver::project_key(&index, "3F2A9C1B7D4E").as_deref(),
            Some("pr0")
        );
        assert_eq!(ReferenceResolver::project_key(&index, "mobile"), None);
    }
}
