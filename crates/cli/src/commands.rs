use std::fs;
use std::io::{self, Read};
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use compact_encoder::{encode, Document, Meta};
use compact_linkify::{forward_link, reverse_strip, LinkIndex, RegistryResolver};
use compact_registry::{
    failure_section, Registry, RegistryStore, ResponseKeys, SnapshotSet, SystemClock,
};
use compact_schema::EntityKind;

use crate::config::CompactConfig;

const SESSION_ID: &str = "cli";

/// What a command printed and whether it counts as success.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outcome {
    pub output: String,
    pub success: bool,
}

impl Outcome {
    fn ok(output: String) -> Self {
        Self {
            output,
            success: true,
        }
    }
}

fn read_json(path: &Path) -> Result<serde_json::Value> {
    let raw =
        fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("Invalid JSON in {}", path.display()))
}

/// Text from `path`, or stdin when absent.
fn read_text(path: Option<&Path>) -> Result<String> {
    match path {
        Some(path) => {
            fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))
        }
        None => {
            let mut text = String::new();
            io::stdin()
                .read_to_string(&mut text)
                .context("Failed to read stdin")?;
            Ok(text)
        }
    }
}

/// Builds the registry for `snapshots` through a session store configured from
/// `config`.
pub fn load_registry(config: &CompactConfig, snapshots: &Path) -> Result<Arc<Registry>> {
    let set = SnapshotSet::from_json(read_json(snapshots)?)
        .with_context(|| format!("Invalid snapshots in {}", snapshots.display()))?;
    let store = RegistryStore::new(Arc::new(SystemClock), config.session_ttl());
    let registry = store
        .discover(SESSION_ID, &set, &config.build_options())
        .context("Failed to build key registry")?;
    log::info!(
        "registry ready: {} users, {} states, {} projects, {} teams",
        registry.len(EntityKind::User),
        registry.len(EntityKind::State),
        registry.len(EntityKind::Project),
        registry.len(EntityKind::Team)
    );
    Ok(registry)
}

/// Every registry key as lookup tables.
pub fn run_keys(config: &CompactConfig, snapshots: &Path) -> Result<Outcome> {
    let registry = load_registry(config, snapshots)?;
    let mut keys = ResponseKeys::new(&registry);
    for kind in EntityKind::ALL {
        for (_, id) in registry.entries(kind) {
            keys.key_for(kind, id);
        }
    }

    let meta = Meta::new()
        .field("workspace", config.workspace_segment())
        .field("ttl", config.session_ttl_secs);
    let doc = keys
        .lookups()
        .into_iter()
        .fold(Document::new(meta), Document::with_lookup);
    Ok(Outcome::ok(encode(&doc)?))
}

/// One `key id` line per resolved key, then a `failures` section if any
/// failed. Fails only when nothing resolved.
pub fn run_resolve(
    config: &CompactConfig,
    snapshots: &Path,
    kind: EntityKind,
    keys: &[String],
) -> Result<Outcome> {
    let registry = load_registry(config, snapshots)?;
    let outcomes = registry.resolve_batch(kind, keys);

    let mut lines: Vec<String> = keys
        .iter()
        .zip(&outcomes)
        .filter_map(|(key, outcome)| outcome.as_ref().ok().map(|id| format!("{key} {id}")))
        .collect();
    let resolved = lines.len();
    let failed = outcomes.len() - resolved;
    if failed > 0 {
        log::warn!("{failed} of {} {kind} keys did not resolve", outcomes.len());
        let doc = Document::default().with_data(failure_section(&outcomes));
        lines.push(encode(&doc)?);
    }

    Ok(Outcome {
        output: lines.join("\n"),
        success: resolved > 0 || keys.is_empty(),
    })
}

pub fn run_encode(document: &Path) -> Result<Outcome> {
    let doc = Document::from_json(read_json(document)?)
        .with_context(|| format!("Invalid document in {}", document.display()))?;
    let encoded =
        encode(&doc).with_context(|| format!("Failed to encode {}", document.display()))?;
    Ok(Outcome::ok(encoded))
}

pub fn run_link(config: &CompactConfig, snapshots: &Path, text: Option<&Path>) -> Result<Outcome> {
    let registry = load_registry(config, snapshots)?;
    let index = LinkIndex::from_registry(&registry, &config.url_host);
    let text = read_text(text)?;
    Ok(Outcome::ok(forward_link(&text, &index)))
}

pub fn run_strip(config: &CompactConfig, snapshots: &Path, text: Option<&Path>) -> Result<Outcome> {
    let registry = load_registry(config, snapshots)?;
    let resolver = RegistryResolver::new(&registry, &config.url_host);
    let text = read_text(text)?;
    Ok(Outcome::ok(reverse_strip(&text, &resolver)))
}
