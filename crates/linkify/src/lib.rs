//! # Compact Linkify
//!
//! Rewrites free text between the compact form agents write (`SQT-297`,
//! `pr0`) and the workspace URLs the tracker renders as links.
//!
//! ## Architecture
//!
//! ```text
//! text ──> scan ──> [Text | FencedCode | InlineCode | Link] spans
//!                      │
//!                      ├─ forward_link:  Text: TEAM-NUM / prN ──> URL
//!                      │
//!                      └─ reverse_strip: Text: bare URL ──> TEAM-NUM / prN
//!                                        Link: plain-text links ──> TEAM-NUM / prN
//! ```
//!
//! Code spans and fenced blocks are never touched, and neither transform
//! can fail: anything unrecognized stays as written.
//!
//! ## Example
//!
//! ```rust
//! use compact_linkify::{forward_link, reverse_strip, LinkIndex};
//!
//! let index = LinkIndex::new("https://linear.app/acme").with_team("SQT");
//! let linked = forward_link("See SQT-297, not `SQT-1`", &index);
//! assert_eq!(linked, "See https://linear.app/acme/issue/SQT-297, not `SQT-1`");
//! assert_eq!(reverse_strip(&linked, &index), "See SQT-297, not `SQT-1`");
//! ```

mod forward;
mod index;
mod reverse;
mod scan;

pub use forward::forward_link;
pub use index::{url_base, LinkIndex, ReferenceResolver, RegistryResolver};
pub use reverse::{parse_reference_url, reverse_strip, Reference};
pub use scan::{scan, Link, Mode, Span};
