use std::collections::BTreeMap;

use compact_schema::{schema_by_name, Schema, Value};
use serde::Deserialize;

use crate::error::{EncodingError, Result};

/// One table row: a bag of named cells checked against the section schema at
/// encode time.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Row {
    cells: BTreeMap<String, Value>,
}

impl Row {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set(field, value);
        self
    }

    pub fn set(&mut self, field: impl Into<String>, value: impl Into<Value>) {
        self.cells.insert(field.into(), value.into());
    }

    #[must_use]
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.cells.get(field)
    }

    #[must_use]
    pub fn contains(&self, field: &str) -> bool {
        self.cells.contains_key(field)
    }

    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.cells.keys().map(String::as_str)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct Section {
    pub schema: &'static Schema,
    pub rows: Vec<Row>,
}

impl Section {
    #[must_use]
    pub fn new(schema: &'static Schema) -> Self {
        Self {
            schema,
            rows: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_rows(schema: &'static Schema, rows: Vec<Row>) -> Self {
        Self { schema, rows }
    }

    pub fn push(&mut self, row: Row) {
        self.rows.push(row);
    }

    #[must_use]
    pub fn name(&self) -> &'static str {
        self.schema.name
    }
}

/// Response-level header: ordered field names plus their values.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Meta {
    pub fields: Vec<String>,
    pub values: BTreeMap<String, Value>,
}

impl Meta {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a field and its value, keeping declaration order.
    #[must_use]
    pub fn field(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        let name = name.into();
        if !self.fields.contains(&name) {
            self.fields.push(name.clone());
        }
        self.values.insert(name, value.into());
        self
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty() && self.values.is_empty()
    }
}

#[derive(Debug, Clone, Default)]
pub struct Document {
    pub meta: Meta,
    pub lookups: Vec<Section>,
    pub data: Vec<Section>,
}

impl Document {
    #[must_use]
    pub fn new(meta: Meta) -> Self {
        Self {
            meta,
            lookups: Vec::new(),
            data: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_lookup(mut self, section: Section) -> Self {
        self.lookups.push(section);
        self
    }

    #[must_use]
    pub fn with_data(mut self, section: Section) -> Self {
        self.data.push(section);
        self
    }

    /// Lookups first, then data, in input order.
    pub fn sections(&self) -> impl Iterator<Item = &Section> {
        self.lookups.iter().chain(self.data.iter())
    }

    /// Parses a JSON document whose sections name catalog schemas:
    ///
    /// ```json
    /// {"meta": {"fields": ["tool"], "values": {"tool": "list_issues"}},
    ///  "lookups": [{"schema": "_users", "rows": [...]}],
    ///  "data": [{"schema": "issues", "rows": [...]}]}
    /// ```
    pub fn from_json(value: serde_json::Value) -> Result<Self> {
        let raw: RawDocument = serde_json::from_value(value)?;

        let mut meta = Meta::new();
        if let Some(raw_meta) = raw.meta {
            meta.fields = raw_meta.fields;
            for (name, value) in raw_meta.values {
                let cell = Value::from_json(&value).ok_or_else(|| {
                    EncodingError::UnsupportedValue {
                        section: "_meta".to_string(),
                        row: 0,
                        field: name.clone(),
                    }
                })?;
                meta.values.insert(name, cell);
            }
        }

        let lookups = raw
            .lookups
            .into_iter()
            .map(RawSection::into_section)
            .collect::<Result<Vec<_>>>()?;
        let data = raw
            .data
            .into_iter()
            .map(RawSection::into_section)
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            meta,
            lookups,
            data,
        })
    }
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct RawDocument {
    #[serde(default)]
    meta: Option<RawMeta>,
    #[serde(default)]
    lookups: Vec<RawSection>,
    #[serde(default)]
    data: Vec<RawSection>,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct RawMeta {
    #[serde(default)]
    fields: Vec<String>,
    #[serde(default)]
    values: serde_json::Map<String, serde_json::Value>,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct RawSection {
    schema: String,
    #[serde(default)]
    rows: Vec<serde_json::Map<String, serde_json::Value>>,
}

impl RawSection {
    fn into_section(self) -> Result<Section> {
        let schema = schema_by_name(&self.schema)
            .ok_or_else(|| EncodingError::UnknownSchema(self.schema.clone()))?;
        let mut section = Section::new(schema);
        for (idx, raw_row) in self.rows.into_iter().enumerate() {
            let mut row = Row::new();
            for (field, value) in raw_row {
                let cell =
                    Value::from_json(&value).ok_or_else(|| EncodingError::UnsupportedValue {
                        section: schema.name.to_string(),
                        row: idx,
                        field: field.clone(),
                    })?;
                row.set(field, cell);
            }
            section.push(row);
        }
        Ok(section)
    }
}
