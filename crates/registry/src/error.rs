use std::fmt;

use compact_schema::{EntityKind, UnknownKind};
use thiserror::Error;

/// Result type for registry operations
pub type Result<T> = std::result::Result<T, RegistryError>;

/// Errors raised while building a registry from snapshots
#[derive(Error, Debug)]
pub enum RegistryError {
    /// Snapshot payload names a collection that is not an entity kind
    #[error("Unknown entity type: {0}")]
    UnknownEntityType(String),

    /// A single snapshot could not be used
    #[error("Malformed {kind} snapshot at index {index}: {reason}")]
    MalformedSnapshot {
        kind: EntityKind,
        index: usize,
        reason: String,
    },

    /// Two snapshots of one kind share an id
    #[error("Duplicate {kind} id: {id}")]
    DuplicateId { kind: EntityKind, id: String },

    /// Configured default team matches neither a team id nor a team key
    #[error("Default team not found among snapshots: {0}")]
    UnknownDefaultTeam(String),

    /// Payload is not shaped like a snapshot set
    #[error("Invalid snapshot payload: {0}")]
    InvalidPayload(String),
}

impl From<UnknownKind> for RegistryError {
    fn from(err: UnknownKind) -> Self {
        Self::UnknownEntityType(err.0)
    }
}

/// A short key (or id) the registry does not know.
///
/// Carries a handful of valid keys from the same scope so the caller can put
/// them in a per-item failure row.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub struct ResolutionError {
    pub kind: EntityKind,
    pub requested: String,
    pub suggestions: Vec<String>,
}

impl fmt::Display for ResolutionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Unknown {} key `{}`", self.kind, self.requested)?;
        if !self.suggestions.is_empty() {
            write!(f, " (valid keys include: {})", self.suggestions.join(", "))?;
        }
        Ok(())
    }
}
