use serde_json::Value as JsonValue;

use crate::{
    memory::MemoryError,
    orm::{FieldDescriptor, Value},
};

/// Convert a JSON value for storage in `field`, enforcing nullability.
pub fn coerce_json(field: &FieldDescriptor, value: &JsonValue) -> Result<Value, MemoryError> {
    if value.is_null() && !field.nullable {
        return Err(MemoryError::NullViolation { field: field.name.clone() });
    }
    Value::from_json_as(&field.kind, value).ok_or_else(|| MemoryError::Coerce {
        field: field.name.clone(),
        kind: field.kind.to_string(),
        value: value.to_string(),
    })
}
