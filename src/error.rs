use thiserror::Error;

use crate::{orm::UpstreamError, schema::DataType};

pub type Result<T> = std::result::Result<T, ConvertError>;

/// Everything that can stop a queryset from becoming a table.
///
/// No variant is retried or recovered from locally: a conversion either
/// yields a fully typed table or one of these.
#[derive(Debug, Error)]
pub enum ConvertError {
    /// A declared field kind has no entry in the kind -> type mapping.
    #[error("column '{column}': field kind {kind} has no columnar type mapping")]
    UnmappableFieldKind { column: String, kind: String },

    /// A value beyond the inference sample does not fit the type inferred
    /// from the sample.
    #[error(
        "column '{column}': could not append {found} value at row {row} to a column of type {expected} \
         inferred from the first {infer_schema_length} row(s); make sure all rows share one type, \
         increase `infer_schema_length`, or supply a schema override for this column"
    )]
    SchemaAmbiguity {
        column: String,
        expected: DataType,
        found: String,
        row: usize,
        infer_schema_length: usize,
    },

    /// Two values inside the inference sample have types with no common
    /// supertype.
    #[error(
        "column '{column}': sampled values of type {first} and {second} cannot be unified; \
         supply a schema override for this column (`infer_schema_length` cannot resolve this)"
    )]
    IncompatibleSampleTypes { column: String, first: DataType, second: DataType },

    /// A value of a pinned column is not representable in its pinned type.
    #[error("column '{column}': value {value} is not representable as {dtype}")]
    ValueCast { column: String, dtype: DataType, value: String },

    /// A projected field and an annotation alias share one output name.
    #[error("column '{column}' is both a projected field and an annotation alias")]
    ConflictingColumnName { column: String },

    #[error("'{name}' is not a valid field name or lookup path")]
    InvalidFieldName { name: String },

    #[error("invalid configuration: {0}")]
    InvalidConfig(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// The columnar storage refused a column layout.
    #[error("columnar storage error: {0}")]
    Arrow(#[from] arrow_schema::ArrowError),

    /// Failure raised by the queryset while it was being drained.
    #[error(transparent)]
    Upstream(UpstreamError),
}

impl ConvertError {
    /// Both ways an inferred column can fail to settle on a single type.
    pub fn is_schema_ambiguity(&self) -> bool {
        matches!(
            self,
            ConvertError::SchemaAmbiguity { .. } | ConvertError::IncompatibleSampleTypes { .. }
        )
    }

    /// Take back the adapter's own error, if this is an iteration failure.
    pub fn into_upstream(self) -> Option<UpstreamError> {
        match self {
            ConvertError::Upstream(err) => Some(err),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ambiguity_message_names_the_remedy() {
        let err = ConvertError::SchemaAmbiguity {
            column: "name".into(),
            expected: DataType::Null,
            found: "str".into(),
            row: 1,
            infer_schema_length: 1,
        };
        assert!(err.is_schema_ambiguity());
        assert!(err.to_string().contains("infer_schema_length"));
    }

    #[test]
    fn upstream_error_is_returned_as_is() {
        let inner: UpstreamError = "database is unreachable".into();
        let err = ConvertError::Upstream(inner);
        assert_eq!(err.to_string(), "database is unreachable");
        let back = err.into_upstream().unwrap();
        assert_eq!(back.to_string(), "database is unreachable");
    }
}
