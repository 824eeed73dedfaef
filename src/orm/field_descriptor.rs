use serde::{Deserialize, Serialize};

use crate::orm::FieldKind;

/// Static metadata for one model-declared field.
///
/// `name` is the attribute name used in lookups; `column` is the key the field
/// occupies in realized rows. The two differ for relations (`author` is
/// stored as `author_id`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDescriptor {
    pub name: String,
    pub column: String,
    pub kind: FieldKind,
    pub nullable: bool,
}

impl FieldDescriptor {
    /// A non-null field whose row key equals its name. Relation kinds get the
    /// conventional `<name>_id` row key.
    pub fn new(name: &str, kind: FieldKind) -> Self {
        let column = match kind {
            FieldKind::ForeignKey { .. } | FieldKind::OneToOneField { .. } => format!("{name}_id"),
            _ => name.to_string(),
        };
        Self { name: name.to_string(), column, kind, nullable: false }
    }

    /// Same as [`FieldDescriptor::new`] but accepting nulls.
    pub fn nullable(name: &str, kind: FieldKind) -> Self {
        Self { nullable: true, ..Self::new(name, kind) }
    }

    pub fn with_column(mut self, column: &str) -> Self {
        self.column = column.to_string();
        self
    }

    pub fn has_column(&self) -> bool {
        self.kind.has_column()
    }

    /// True when `key` names this field either by attribute or by row key.
    pub fn answers_to(&self, key: &str) -> bool {
        self.name == key || self.column == key
    }
}
