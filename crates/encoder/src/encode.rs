use compact_schema::Value;

use crate::document::{Document, Meta, Section};
use crate::error::Result;
use crate::validate::validate_document;

pub const DELIMITER: char = ',';
pub const INDENT: &str = "  ";
pub const META_NAME: &str = "_meta";
/// Rendering of `null`. An explicit empty string renders as `""` instead.
pub const BLANK: &str = "";

/// Renders a response document into the compact line format.
///
/// ```text
/// _meta{tool,count}:list_issues,2
/// _users[1]{key,name,displayName,email,role}:
///   u0,Ada Lovelace,ada,ada@example.com,admin
/// issues[2]{identifier,title,...}:
///   SQT-1,Fix login,...
///   SQT-2,"Crash, on save",...
/// ```
///
/// The document is validated first; a single bad row rejects the whole output.
pub fn encode(doc: &Document) -> Result<String> {
    validate_document(doc)?;

    let mut lines: Vec<String> = Vec::new();
    if let Some(line) = encode_meta(&doc.meta) {
        lines.push(line);
    }
    for section in doc.sections() {
        encode_section(section, &mut lines);
    }

    let out = lines.join("\n");
    log::debug!(
        "encoded {} lookup and {} data sections into {} bytes",
        doc.lookups.len(),
        doc.data.len(),
        out.len()
    );
    Ok(out)
}

fn encode_meta(meta: &Meta) -> Option<String> {
    if meta.fields.is_empty() {
        return None;
    }
    let values: Vec<String> = meta
        .fields
        .iter()
        .map(|f| meta.values.get(f).map(encode_value).unwrap_or_default())
        .collect();
    Some(format!(
        "{META_NAME}{{{}}}:{}",
        meta.fields.join(","),
        values.join(",")
    ))
}

fn encode_section(section: &Section, lines: &mut Vec<String>) {
    let schema = section.schema;
    let header: Vec<&str> = schema.field_names().collect();
    lines.push(format!(
        "{}[{}]{{{}}}:",
        schema.name,
        section.rows.len(),
        header.join(",")
    ));

    for row in &section.rows {
        let mut line = String::from(INDENT);
        for (idx, field) in schema.fields.iter().enumerate() {
            if idx > 0 {
                line.push(DELIMITER);
            }
            let rendered = row.get(field.name).map(|v| field.render(v)).unwrap_or_default();
            line.push_str(&encode_value(&rendered));
        }
        lines.push(line);
    }
}

/// Encodes one cell.
#[must_use]
pub fn encode_value(value: &Value) -> String {
    match value {
        Value::Null => BLANK.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Int(n) => n.to_string(),
        Value::Float(f) => encode_float(*f),
        Value::Str(s) => {
            if needs_quoting(s) {
                quote(s)
            } else {
                s.clone()
            }
        }
    }
}

fn encode_float(f: f64) -> String {
    if !f.is_finite() {
        return BLANK.to_string();
    }
    if f == 0.0 {
        // Covers -0.0.
        return "0".to_string();
    }
    // `Display` for f64 is already the shortest round-trip form and drops `.0`.
    f.to_string()
}

fn needs_quoting(s: &str) -> bool {
    if s.is_empty() || s.trim() != s {
        return true;
    }
    if s.chars()
        .any(|ch| matches!(ch, DELIMITER | '"' | '\\' | '\n' | '\r' | '\t'))
    {
        return true;
    }
    s == "true" || s == "false" || looks_numeric(s)
}

fn looks_numeric(s: &str) -> bool {
    let digits = s.strip_prefix('-').unwrap_or(s);
    let starts_like_number = digits
        .chars()
        .next()
        .is_some_and(|ch| ch.is_ascii_digit() || ch == '.');
    starts_like_number && s.parse::<f64>().is_ok()
}

fn quote(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for ch in s.chars() {
        match ch {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            other => out.push(other),
        }
    }
    out.push('"');
    out
}
