use crate::kind::EntityKind;
use crate::value::Value;

/// Pure per-field value transform applied right before encoding.
pub type Formatter = fn(&Value) -> Value;

/// What a column means with respect to short keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldRole {
    Plain,
    /// The row defines this short key (lookup tables).
    Key(EntityKind),
    /// The cell holds a short key defined elsewhere.
    Ref(EntityKind),
}

#[derive(Debug, Clone, Copy)]
pub struct Field {
    pub name: &'static str,
    pub role: FieldRole,
    pub format: Option<Formatter>,
}

impl Field {
    #[must_use]
    pub const fn plain(name: &'static str) -> Self {
        Self {
            name,
            role: FieldRole::Plain,
            format: None,
        }
    }

    #[must_use]
    pub const fn key(name: &'static str, kind: EntityKind) -> Self {
        Self {
            name,
            role: FieldRole::Key(kind),
            format: None,
        }
    }

    #[must_use]
    pub const fn reference(name: &'static str, kind: EntityKind) -> Self {
        Self {
            name,
            role: FieldRole::Ref(kind),
            format: None,
        }
    }

    #[must_use]
    pub const fn formatted(name: &'static str, format: Formatter) -> Self {
        Self {
            name,
            role: FieldRole::Plain,
            format: Some(format),
        }
    }

    /// Applies the declared formatter, if any.
    #[must_use]
    pub fn render(&self, value: &Value) -> Value {
        match self.format {
            Some(format) if !value.is_null() => format(value),
            _ => value.clone(),
        }
    }

    #[must_use]
    pub fn entity(&self) -> Option<EntityKind> {
        match self.role {
            FieldRole::Key(kind) | FieldRole::Ref(kind) => Some(kind),
            FieldRole::Plain => None,
        }
    }
}

/// A named, ordered field list.
#[derive(Debug, Clone, Copy)]
pub struct Schema {
    pub name: &'static str,
    pub fields: &'static [Field],
}

impl Schema {
    /// Lookup tables are prefixed with `_`.
    #[must_use]
    pub fn is_lookup(&self) -> bool {
        self.name.starts_with('_')
    }

    pub fn field_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.fields.iter().map(|f| f.name)
    }

    #[must_use]
    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == name)
    }

    #[must_use]
    pub fn has_field(&self, name: &str) -> bool {
        self.field(name).is_some()
    }

    /// Field declared as this table's key column.
    #[must_use]
    pub fn key_field(&self) -> Option<&Field> {
        self.fields
            .iter()
            .find(|f| matches!(f.role, FieldRole::Key(_)))
    }
}
