use thiserror::Error;

/// Failures of the in-memory adapter. Surface through a conversion as
/// upstream errors.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum MemoryError {
    #[error("model '{model}' has no field '{field}'")]
    UnknownField { model: String, field: String },

    #[error("no model named '{0}' is registered")]
    UnknownModel(String),

    #[error("'{field}' on model '{model}' is not a relation")]
    NotARelation { model: String, field: String },

    #[error("field '{field}' ({kind}) cannot hold {value}")]
    Coerce { field: String, kind: String, value: String },

    #[error("field '{field}' does not accept null")]
    NullViolation { field: String },

    #[error("expected a JSON array of objects")]
    NotAnArray,
}
