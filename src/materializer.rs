use indexmap::IndexMap;
use tracing::{debug, warn};

use crate::{
    config::InferSchemaLength,
    error::{ConvertError, Result},
    orm::{QuerySet, Row},
    schema::{DataType, PartialSchema},
    table::Table,
};

/// Drains a queryset and builds the table, pinning resolved columns and
/// inferring the rest.
#[derive(Debug, Clone, Default)]
pub struct TableMaterializer {
    infer_schema_length: InferSchemaLength,
    schema_overrides: IndexMap<String, DataType>,
}

impl TableMaterializer {
    pub fn new(infer_schema_length: InferSchemaLength) -> Self {
        Self { infer_schema_length, schema_overrides: IndexMap::new() }
    }

    /// Explicit column types applied on top of the resolved schema.
    pub fn with_overrides(mut self, overrides: IndexMap<String, DataType>) -> Self {
        self.schema_overrides = overrides;
        self
    }

    pub fn materialize<Q: QuerySet + ?Sized>(&self, queryset: &Q, partial_schema: &PartialSchema) -> Result<Table> {
        let rows = Self::drain(queryset)?;

        let mut pinned = partial_schema.clone();
        for (column, dtype) in &self.schema_overrides {
            if let Some(declared) = pinned.get(column).filter(|d| *d != dtype) {
                debug!(column = %column, %declared, overridden_by = %dtype, "explicit override replaces declared type");
            }
        }
        pinned.merge_overrides(&self.schema_overrides);

        Table::from_rows(&rows, &pinned, self.infer_schema_length)
    }

    /// Realize every row up front; the first iteration failure aborts.
    fn drain<Q: QuerySet + ?Sized>(queryset: &Q) -> Result<Vec<Row>> {
        let mut rows = Vec::new();
        for row in queryset.rows() {
            match row {
                Ok(row) => rows.push(row),
                Err(err) => {
                    warn!(realized = rows.len(), error = %err, "queryset iteration failed");
                    return Err(ConvertError::Upstream(err));
                }
            }
        }
        debug!(rows = rows.len(), "queryset drained");
        Ok(rows)
    }
}
