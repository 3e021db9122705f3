use once_cell::sync::Lazy;
use regex::Regex;

use crate::forward::{ends_cleanly, starts_cleanly};
use crate::index::ReferenceResolver;
use crate::scan::{scan, Link, Span};

static URL_START: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)https?://").expect("valid url regex"));

static IDENTIFIER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^([A-Za-z][A-Za-z0-9_]*)-(\d+)$").expect("valid identifier regex")
});

/// Target of a workspace URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reference {
    /// `team` keeps the case it was written in.
    Issue { team: String, number: String },
    Project { slug: String },
}

impl Reference {
    #[must_use]
    pub fn identifier(&self) -> Option<String> {
        match self {
            Reference::Issue { team, number } => Some(format!("{team}-{number}")),
            Reference::Project { .. } => None,
        }
    }
}

fn strip_scheme(url: &str) -> &str {
    url.strip_prefix("https://")
        .or_else(|| url.strip_prefix("http://"))
        .unwrap_or(url)
}

/// Parses `<base>/issue/<TEAM-NUM>[/<title-slug>]` or
/// `<base>/project/<slug-or-hash>`. Query strings and fragments are not
/// references.
#[must_use]
pub fn parse_reference_url(url: &str, url_base: &str) -> Option<Reference> {
    let url = strip_scheme(url.trim());
    let base = strip_scheme(url_base.trim_end_matches('/'));
    let head = url.get(..base.len())?;
    if !head.eq_ignore_ascii_case(base) {
        return None;
    }
    let rest = url[base.len()..].strip_prefix('/')?;
    if rest.contains(['?', '#']) {
        return None;
    }

    let mut segments = rest.trim_end_matches('/').split('/');
    let section = segments.next()?;
    let target = segments.next().filter(|s| !s.is_empty())?;
    let extra: Vec<&str> = segments.collect();

    if section.eq_ignore_ascii_case("issue") {
        if extra.len() > 1 {
            return None;
        }
        let caps = IDENTIFIER.captures(target)?;
        Some(Reference::Issue {
            team: caps.get(1)?.as_str().to_string(),
            number: caps.get(2)?.as_str().to_string(),
        })
    } else if section.eq_ignore_ascii_case("project") && extra.is_empty() {
        Some(Reference::Project {
            slug: target.to_string(),
        })
    } else {
        None
    }
}

/// Compact form of a reference the resolver recognizes.
fn compact_form(reference: &Reference, resolver: &impl ReferenceResolver) -> Option<String> {
    match reference {
        Reference::Issue { team, .. } => {
            if resolver.knows_team(&team.to_ascii_uppercase()) {
                reference.identifier()
            } else {
                None
            }
        }
        Reference::Project { slug } => resolver.project_key(slug),
    }
}

/// Workspace reference URLs and nothing after them. Anchored so it only
/// matches where a URL starts.
fn reference_url_regex(url_base: &str) -> Option<Regex> {
    let base = strip_scheme(url_base.trim().trim_end_matches('/'));
    let pattern = format!(
        r"(?i)^https?://{}/(?:issue/[a-z][a-z0-9_]*-\d+(?:/[a-z0-9_-]+)?|project/[a-z0-9_-]+)/?",
        regex::escape(base)
    );
    match Regex::new(&pattern) {
        Ok(regex) => Some(regex),
        Err(err) => {
            log::warn!("cannot match URLs under {url_base}: {err}");
            None
        }
    }
}

/// Rewrites workspace URLs back to identifiers and project keys. Links whose
/// visible text is anything other than the URL, the identifier or the display
/// name are kept.
#[must_use]
pub fn reverse_strip(text: &str, resolver: &impl ReferenceResolver) -> String {
    let reference_url = reference_url_regex(resolver.url_base());
    let mut out = String::with_capacity(text.len());
    for span in scan(text) {
        match span {
            Span::Text(plain) => match &reference_url {
                Some(regex) => strip_plain(plain, regex, resolver, &mut out),
                None => out.push_str(plain),
            },
            Span::Link(link) => match strip_link(&link, resolver) {
                Some(compact) => out.push_str(&compact),
                None => out.push_str(link.raw),
            },
            other => out.push_str(other.raw()),
        }
    }
    out
}

/// Surrounding markdown (`**`, `~~`, `<>`, list commas) is kept as is. URLs
/// outside the workspace are skipped whole so nothing inside them is touched.
fn strip_plain(
    plain: &str,
    reference_url: &Regex,
    resolver: &impl ReferenceResolver,
    out: &mut String,
) {
    let mut last = 0;
    let mut pos = 0;
    while let Some(found) = URL_START.find_at(plain, pos) {
        let start = found.start();
        let candidate = reference_url
            .find(&plain[start..])
            .map(|m| start + m.end())
            .filter(|&end| starts_cleanly(plain, start) && ends_cleanly(plain, end));
        let Some(end) = candidate else {
            pos = plain[start..]
                .find(char::is_whitespace)
                .map_or(plain.len(), |offset| start + offset);
            continue;
        };
        pos = end;

        let url = &plain[start..end];
        let Some(compact) = parse_reference_url(url, resolver.url_base())
            .and_then(|reference| compact_form(&reference, resolver))
        else {
            continue;
        };
        log::debug!("stripping {url} -> {compact}");
        out.push_str(&plain[last..start]);
        out.push_str(&compact);
        last = end;
    }
    out.push_str(&plain[last..]);
}

fn strip_link(link: &Link<'_>, resolver: &impl ReferenceResolver) -> Option<String> {
    let reference = parse_reference_url(link.target, resolver.url_base())?;
    let compact = compact_form(&reference, resolver)?;

    let visible = link.text.trim();
    let visible = visible
        .strip_prefix('<')
        .and_then(|v| v.strip_suffix('>'))
        .unwrap_or(visible);
    let display = match &reference {
        Reference::Issue { .. } => resolver.issue_title(&compact),
        Reference::Project { .. } => resolver.project_name(&compact),
    };

    let plain_text = visible.eq_ignore_ascii_case(link.target.trim())
        || visible.eq_ignore_ascii_case(&compact)
        || display.is_some_and(|name| visible.eq_ignore_ascii_case(name.trim()));
    plain_text.then_some(compact)
}
