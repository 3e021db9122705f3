use once_cell::sync::Lazy;
use regex::{Captures, Regex};

use crate::index::LinkIndex;
use crate::scan::{scan, Span};

/// Existing URLs first so their contents are never rewritten; then issue
/// identifiers; then project short keys.
static REFERENCE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)(?P<url>https?://\S+)|(?P<team>[a-z][a-z0-9_]*)-(?P<num>\d+)|(?P<project>pr\d+)",
    )
    .expect("valid reference regex")
});

/// Expands issue identifiers and project short keys into full URLs outside
/// protected regions.
#[must_use]
pub fn forward_link(text: &str, index: &LinkIndex) -> String {
    let mut out = String::with_capacity(text.len());
    for span in scan(text) {
        match span {
            Span::Text(plain) => link_plain(plain, index, &mut out),
            other => out.push_str(other.raw()),
        }
    }
    out
}

fn link_plain(plain: &str, index: &LinkIndex, out: &mut String) {
    let mut last = 0;
    for caps in REFERENCE.captures_iter(plain) {
        let Some(whole) = caps.get(0) else {
            continue;
        };
        if caps.name("url").is_some() {
            continue;
        }
        if !is_standalone(plain, whole.start(), whole.end()) {
            continue;
        }
        let Some(url) = expand(&caps, whole.as_str(), index) else {
            continue;
        };
        log::debug!("linking {} -> {url}", whole.as_str());
        out.push_str(&plain[last..whole.start()]);
        out.push_str(&url);
        last = whole.end();
    }
    out.push_str(&plain[last..]);
}

/// Issue URLs keep the identifier as written so stripping restores it.
fn expand(caps: &Captures<'_>, matched: &str, index: &LinkIndex) -> Option<String> {
    if let Some(team) = caps.name("team") {
        return index
            .knows_team(&team.as_str().to_ascii_uppercase())
            .then(|| index.issue_url(matched));
    }
    let project = caps.name("project")?;
    index.project_slug(project.as_str()).map(|slug| index.project_url(slug))
}

fn is_ident_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_'
}

/// Rejects matches glued to paths, emails, dotted names and longer words.
pub(crate) fn is_standalone(text: &str, start: usize, end: usize) -> bool {
    starts_cleanly(text, start) && ends_cleanly(text, end)
}

pub(crate) fn starts_cleanly(text: &str, start: usize) -> bool {
    start == 0 || {
        let b = text.as_bytes()[start - 1];
        !(is_ident_byte(b) || matches!(b, b'-' | b'/' | b'.' | b'@' | b':'))
    }
}

/// Sentence punctuation may follow a reference; a query, fragment or file
/// extension may not.
pub(crate) fn ends_cleanly(text: &str, end: usize) -> bool {
    let bytes = text.as_bytes();
    match bytes.get(end) {
        None => true,
        Some(&b) if is_ident_byte(b) || matches!(b, b'-' | b'/') => false,
        Some(b'.' | b'?' | b'#' | b':' | b'=' | b'&') => {
            !bytes.get(end + 1).copied().is_some_and(is_ident_byte)
        }
        Some(_) => true,
    }
}
