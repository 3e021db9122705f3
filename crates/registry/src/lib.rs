//! # Compact Registry
//!
//! Session-scoped mapping between canonical tracker ids and short keys such as
//! `u3`, `s0`, `sqm:s0` or `pr2`.
//!
//! ## Architecture
//!
//! ```text
//! SnapshotSet (users, states, projects, teams)
//!     │
//!     ├──> Registry::build
//!     │      ├─ sort each kind by createdAt
//!     │      ├─ number from 0 (states per team scope)
//!     │      └─ cache display metadata + project slug index
//!     │
//!     ├──> RegistryStore (session id → registry, lazy TTL)
//!     │
//!     ├──> ResponseKeys (per response: ext keys + lookup tables)
//!     │
//!     └──> resolve / resolve_or_error (short key → id on write-back)
//! ```
//!
//! ## Example
//!
//! ```rust
//! use compact_registry::{BuildOptions, Registry, SnapshotSet};
//! use compact_schema::EntityKind;
//!
//! let set = SnapshotSet::from_json(serde_json::json!({
//!     "users": [
//!         {"id": "b", "createdAt": "2024-02-01T00:00:00Z", "name": "Grace"},
//!         {"id": "a", "createdAt": "2024-01-01T00:00:00Z", "name": "Ada"}
//!     ]
//! }))
//! .unwrap();
//! let registry = Registry::build(&set, &BuildOptions::new("ws"), chrono::Utc::now()).unwrap();
//! assert_eq!(registry.reverse_lookup(EntityKind::User, "a"), Some("u0"));
//! assert_eq!(registry.resolve(EntityKind::User, "u1").as_deref(), Some("b"));
//! assert_eq!(registry.resolve(EntityKind::User, "zz999"), None);
//! ```

mod error;
mod key;
mod metadata;
mod registry;
mod response;
mod snapshot;
mod store;

pub use error::{RegistryError, ResolutionError, Result};
pub use key::{format_key, is_external_key, is_uuid, ShortKey};
pub use metadata::{ProjectMetadata, StateMetadata, TeamMetadata, UserMetadata};
pub use registry::{BuildOptions, Registry, SUGGESTION_LIMIT};
pub use response::{
    check_references, failure_row, failure_section, lookup_schema, DanglingReference,
    ResponseKeys,
};
pub use snapshot::{
    ProjectSnapshot, Snapshot, SnapshotSet, StateSnapshot, TeamSnapshot, UserSnapshot,
};
pub use store::{Clock, ManualClock, RegistryStore, SystemClock, DEFAULT_SESSION_TTL};
