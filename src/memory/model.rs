use indexmap::IndexMap;
use serde_json::Value as JsonValue;

use crate::{
    memory::{MemoryError, coerce_json},
    orm::{FieldDescriptor, FieldKind, FieldMetadataProvider, Row, Value},
};

/// Default primary key name added by [`Model::new`].
pub const AUTO_PK: &str = "id";

/// An in-memory model: declared fields plus stored rows.
///
/// Stored rows always hold every column-backed field, keyed by row key, in
/// declaration order.
#[derive(Debug, Clone)]
pub struct Model {
    name: String,
    fields: IndexMap<String, FieldDescriptor>,
    pk: Option<String>,
    next_id: i64,
    rows: Vec<Row>,
}

impl Model {
    /// A model with an auto-incrementing `id` primary key.
    pub fn new(name: &str) -> Self {
        Self::without_auto_pk(name)
            .field(FieldDescriptor::new(AUTO_PK, FieldKind::BigAutoField))
            .with_pk(AUTO_PK)
    }

    pub fn without_auto_pk(name: &str) -> Self {
        Self {
            name: name.to_ascii_lowercase(),
            fields: IndexMap::new(),
            pk: None,
            next_id: 1,
            rows: Vec::new(),
        }
    }

    /// Declare a field. Re-declaring a name replaces the previous field.
    pub fn field(mut self, field: FieldDescriptor) -> Self {
        self.fields.insert(field.name.clone(), field);
        self
    }

    pub fn with_pk(mut self, name: &str) -> Self {
        self.pk = Some(name.to_string());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn pk(&self) -> Option<&FieldDescriptor> {
        self.pk.as_ref().and_then(|pk| self.fields.get(pk))
    }

    /// Field answering to `key`, by attribute name or row key.
    pub fn lookup_field(&self, key: &str) -> Option<&FieldDescriptor> {
        self.fields.get(key).or_else(|| self.fields.values().find(|f| f.answers_to(key)))
    }

    /// Row keys of every column-backed field, in declaration order.
    pub fn columns(&self) -> Vec<&str> {
        self.fields.values().filter(|f| f.has_column()).map(|f| f.column.as_str()).collect()
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn count(&self) -> usize {
        self.rows.len()
    }

    /// First stored row whose primary key equals `key`.
    pub fn get_by_pk(&self, key: &Value) -> Option<&Row> {
        let pk = self.pk()?;
        self.rows.iter().find(|r| r.get(&pk.column) == Some(key))
    }

    /// Store a row. Keys may be attribute names or row keys; omitted fields
    /// are null, and an omitted or null auto primary key is assigned.
    pub fn insert(&mut self, row: Row) -> Result<Row, MemoryError> {
        let mut given = IndexMap::new();
        for (key, value) in row.0 {
            let field = self.lookup_field(&key).ok_or_else(|| MemoryError::UnknownField {
                model: self.name.clone(),
                field: key.clone(),
            })?;
            given.insert(field.column.clone(), value);
        }

        let mut stored = Row::new();
        for field in self.fields.values().filter(|f| f.has_column()) {
            let mut value = given.shift_remove(&field.column).unwrap_or_default();
            if self.is_auto_pk(field) {
                value = match value {
                    Value::Null => Value::Int(self.next_id),
                    other => other,
                };
                if let Value::Int(id) = value {
                    self.next_id = self.next_id.max(id + 1);
                }
            }
            if value.is_null() && !field.nullable {
                return Err(MemoryError::NullViolation { field: field.name.clone() });
            }
            stored.insert(field.column.clone(), value);
        }

        self.rows.push(stored.clone());
        Ok(stored)
    }

    /// Store every object of a JSON array, converting each value by its
    /// field's declared kind.
    pub fn load_from_json(&mut self, json_value: JsonValue) -> Result<Vec<Row>, MemoryError> {
        let JsonValue::Array(items) = json_value else {
            return Err(MemoryError::NotAnArray);
        };

        let mut added = Vec::with_capacity(items.len());
        for item in items {
            let JsonValue::Object(map) = item else {
                return Err(MemoryError::NotAnArray);
            };
            let mut row = Row::new();
            for (key, value) in &map {
                let field = self.lookup_field(key).ok_or_else(|| MemoryError::UnknownField {
                    model: self.name.clone(),
                    field: key.clone(),
                })?;
                let coerced = if value.is_null() && self.is_auto_pk(field) {
                    Value::Null
                } else {
                    coerce_json(field, value)?
                };
                row.insert(key.clone(), coerced);
            }
            added.push(self.insert(row)?);
        }
        Ok(added)
    }

    fn is_auto_pk(&self, field: &FieldDescriptor) -> bool {
        self.pk.as_deref() == Some(field.name.as_str())
            && matches!(field.kind, FieldKind::AutoField | FieldKind::BigAutoField | FieldKind::SmallAutoField)
    }
}

impl FieldMetadataProvider for Model {
    fn fields_by_name(&self) -> IndexMap<String, FieldDescriptor> {
        self.fields.clone()
    }
}
