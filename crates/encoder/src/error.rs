use thiserror::Error;

/// Result type for encoder operations
pub type Result<T> = std::result::Result<T, EncodingError>;

/// Schema/row mismatches. These are programmer errors: the whole response is
/// rejected instead of emitting malformed text.
#[derive(Error, Debug)]
pub enum EncodingError {
    /// A row omits a field its schema declares
    #[error("Section `{section}` row {row}: missing field `{field}`")]
    MissingField {
        section: String,
        row: usize,
        field: String,
    },

    /// A row carries a field its schema does not declare
    #[error("Section `{section}` row {row}: undeclared field `{field}`")]
    UnexpectedField {
        section: String,
        row: usize,
        field: String,
    },

    /// A cell holds an array or object
    #[error("Section `{section}` row {row}: field `{field}` is not a scalar value")]
    UnsupportedValue {
        section: String,
        row: usize,
        field: String,
    },

    #[error("Meta field `{0}` has no value")]
    MissingMetaValue(String),

    #[error("Meta value `{0}` does not belong to a declared meta field")]
    UnexpectedMetaValue(String),

    #[error("Meta field `{0}` is declared twice")]
    DuplicateMetaField(String),

    /// Empty, or contains a character that is part of the header syntax
    #[error("Meta field name `{0}` is not a valid header name")]
    InvalidMetaField(String),

    /// A lookup table placed among data sections or vice versa
    #[error("Section `{section}` is misplaced (lookup tables must be named with a leading `_` and listed under lookups)")]
    MisplacedSection { section: String },

    #[error("Unknown schema: {0}")]
    UnknownSchema(String),

    #[error("Invalid document: {0}")]
    InvalidDocument(#[from] serde_json::Error),
}

impl EncodingError {
    /// Section name the error is attributed to, when there is one.
    #[must_use]
    pub fn section(&self) -> Option<&str> {
        match self {
            Self::MissingField { section, .. }
            | Self::UnexpectedField { section, .. }
            | Self::UnsupportedValue { section, .. }
            | Self::MisplacedSection { section } => Some(section),
            _ => None,
        }
    }
}
