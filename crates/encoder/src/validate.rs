use std::collections::HashSet;

use compact_schema::Schema;

use crate::document::{Document, Meta, Row, Section};
use crate::error::{EncodingError, Result};

/// Checks that `row` supplies exactly the fields `schema` declares.
///
/// Missing fields are reported before undeclared ones, each in a deterministic
/// order (schema order, then alphabetical).
pub fn validate_row_against_schema(row: &Row, schema: &Schema, row_index: usize) -> Result<()> {
    if let Some(field) = schema.fields.iter().find(|f| !row.contains(f.name)) {
        return Err(EncodingError::MissingField {
            section: schema.name.to_string(),
            row: row_index,
            field: field.name.to_string(),
        });
    }
    if let Some(extra) = row.fields().find(|name| !schema.has_field(name)) {
        return Err(EncodingError::UnexpectedField {
            section: schema.name.to_string(),
            row: row_index,
            field: extra.to_string(),
        });
    }
    Ok(())
}

/// Characters that delimit the `_meta{a,b}:x,y` header.
const HEADER_DELIMITERS: &[char] = &[',', '{', '}', '[', ']', ':', '\n', '\r'];

pub(crate) fn validate_meta(meta: &Meta) -> Result<()> {
    let mut seen = HashSet::new();
    for field in &meta.fields {
        if field.trim().is_empty() || field.contains(HEADER_DELIMITERS) {
            return Err(EncodingError::InvalidMetaField(field.clone()));
        }
        if !seen.insert(field.as_str()) {
            return Err(EncodingError::DuplicateMetaField(field.clone()));
        }
        if !meta.values.contains_key(field) {
            return Err(EncodingError::MissingMetaValue(field.clone()));
        }
    }
    if let Some(extra) = meta.values.keys().find(|k| !seen.contains(k.as_str())) {
        return Err(EncodingError::UnexpectedMetaValue(extra.clone()));
    }
    Ok(())
}

fn validate_section(section: &Section, expect_lookup: bool) -> Result<()> {
    if section.schema.is_lookup() != expect_lookup {
        return Err(EncodingError::MisplacedSection {
            section: section.name().to_string(),
        });
    }
    for (idx, row) in section.rows.iter().enumerate() {
        validate_row_against_schema(row, section.schema, idx)?;
    }
    Ok(())
}

/// Validates the whole document; nothing is rendered unless this passes.
pub fn validate_document(doc: &Document) -> Result<()> {
    validate_meta(&doc.meta)?;
    for section in &doc.lookups {
        validate_section(section, true)?;
    }
    for section in &doc.data {
        validate_section(section, false)?;
    }
    Ok(())
}
