use compact_schema::EntityKind;
use once_cell::sync::Lazy;
use regex::Regex;

pub const EXTERNAL_TAG: &str = "ext";

static SHORT_KEY_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:([a-z0-9][a-z0-9_]*):)?([a-z]{1,2})(\d+)$").expect("valid short key regex")
});

static EXTERNAL_KEY_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^ext(\d+)$").expect("valid external key regex"));

/// Parsed form of `[scope:]tag<index>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShortKey {
    pub scope: Option<String>,
    pub tag: String,
    pub index: u64,
}

impl ShortKey {
    /// Parses a lower-cased key. Returns `None` for anything outside the
    /// grammar, including `ext` keys.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        let caps = SHORT_KEY_RE.captures(raw)?;
        let index = caps.get(3)?.as_str().parse().ok()?;
        Some(Self {
            scope: caps.get(1).map(|m| m.as_str().to_string()),
            tag: caps.get(2)?.as_str().to_string(),
            index,
        })
    }

    #[must_use]
    pub fn kind(&self) -> Option<EntityKind> {
        EntityKind::ALL
            .into_iter()
            .find(|kind| kind.tag() == self.tag)
    }
}

/// Formats a registry key; an empty scope means unprefixed.
#[must_use]
pub fn format_key(scope: &str, kind: EntityKind, index: usize) -> String {
    if scope.is_empty() {
        format!("{}{index}", kind.tag())
    } else {
        format!("{scope}:{}{index}", kind.tag())
    }
}

#[must_use]
pub fn format_external_key(index: usize) -> String {
    format!("{EXTERNAL_TAG}{index}")
}

#[must_use]
pub fn is_external_key(raw: &str) -> bool {
    EXTERNAL_KEY_RE.is_match(raw)
}

/// Canonical hyphenated UUID form only; braced, URN and simple forms are not
/// treated as ids.
#[must_use]
pub fn is_uuid(raw: &str) -> bool {
    raw.len() == 36 && uuid::Uuid::try_parse(raw).is_ok()
}
