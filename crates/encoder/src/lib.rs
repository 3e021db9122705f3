//! # Compact Encoder
//!
//! Turns a response document (meta + lookup tables + data tables) into the
//! line-oriented text handed to a language model.
//!
//! ## Format
//!
//! ```text
//! _meta{f1,f2}:v1,v2
//! name[count]{f1,f2,...}:
//!   v1,v2,...
//! ```
//!
//! Column order comes from the schema, so field names are written once per
//! table instead of once per row. A leading `_` marks a lookup table.
//!
//! ## Example
//!
//! ```rust
//! use compact_encoder::{encode, Document, Meta, Row, Section};
//! use compact_schema::TEAMS_LOOKUP;
//!
//! let mut teams = Section::new(&TEAMS_LOOKUP);
//! teams.push(Row::new().with("key", "t0").with("teamKey", "SQT").with("name", "Squad"));
//!
//! let doc = Document::new(Meta::new().field("tool", "list_teams")).with_lookup(teams);
//! let text = encode(&doc).unwrap();
//! assert_eq!(
//!     text,
//!     "_meta{tool}:list_teams\n_teams[1]{key,teamKey,name}:\n  t0,SQT,Squad"
//! );
//! ```

mod document;
mod encode;
mod error;
mod validate;

pub use document::{Document, Meta, Row, Section};
pub use encode::{encode, encode_value, BLANK, DELIMITER, INDENT, META_NAME};
pub use error::{EncodingError, Result};
pub use validate::{validate_document, validate_row_against_schema};
