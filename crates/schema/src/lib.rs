//! # Compact Schema
//!
//! Static catalog of the table shapes the compact encoder can render, plus the
//! cell value type shared by the encoder and the short-key registry.
//!
//! ## Architecture
//!
//! ```text
//! Schema Catalog
//!     │
//!     ├──> Lookup tables (`_users`, `_states`, `_projects`, `_teams`)
//!     │      └─ one row per referenced entity, keyed by short key
//!     │
//!     └──> Data tables (`issues`, `comments`, `projects`, `cycles`, ...)
//!            └─ fields may reference lookup keys or carry a formatter
//! ```
//!
//! Field order is fixed by the schema, so the encoder writes a header once and
//! every row after it carries values only.

mod catalog;
mod field;
mod format;
mod kind;
mod value;

pub use catalog::{all_schemas, schema_by_name};
pub use catalog::{
    COMMENTS, CYCLES, FAILURES, ISSUES, PROJECTS, PROJECTS_LOOKUP, STATES_LOOKUP, TEAMS_LOOKUP,
    USERS_LOOKUP, WRITE_RESULTS,
};
pub use field::{Field, FieldRole, Formatter, Schema};
pub use format::{cycle_tag, date_only, percent, priority_label};
pub use kind::{EntityKind, UnknownKind};
pub use value::Value;
