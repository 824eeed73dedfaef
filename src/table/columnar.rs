use std::{fmt::Display, sync::Arc};

use arrow_array::{RecordBatch, RecordBatchOptions};
use arrow_schema::{Schema, SchemaRef};
use indexmap::{IndexMap, IndexSet};
use serde_json::Value as JsonValue;
use tracing::{debug, trace};

use crate::{
    config::InferSchemaLength,
    error::{ConvertError, Result},
    orm::{Row, Value},
    schema::{DataType, PartialSchema},
    table::{Column, ColumnBuilder, infer_column_type},
};

/// Column name -> type of a built table, in column order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TableSchema {
    pub fields: IndexMap<String, DataType>,
}

impl TableSchema {
    pub fn get(&self, column: &str) -> Option<&DataType> {
        self.fields.get(column)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl Display for TableSchema {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("{")?;
        for (i, (name, dtype)) in self.fields.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{name}: {dtype}")?;
        }
        f.write_str("}")
    }
}

/// In-memory columnar table backed by an Arrow [`RecordBatch`]: one
/// single-typed, nullable column per distinct row key.
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    schema: TableSchema,
    batch: RecordBatch,
}

impl Table {
    /// Build a table from realized rows.
    ///
    /// Columns appear in first-occurrence order across `rows`. Columns listed
    /// in `pinned` take that type and every value must fit it. The remaining
    /// columns get a type inferred from the first `infer_schema_length` rows;
    /// a later value that does not fit the inferred type fails the whole
    /// build. Pinned entries for columns that never occur are ignored.
    pub fn from_rows(rows: &[Row], pinned: &PartialSchema, infer_schema_length: InferSchemaLength) -> Result<Table> {
        let names = rows.iter().flat_map(Row::keys).cloned().collect::<IndexSet<String>>();
        for unused in pinned.columns().filter(|c| !names.contains(*c)) {
            trace!(column = %unused, "pinned column not present in rows, ignored");
        }

        let sample_len = infer_schema_length.sample_len(rows.len());
        let sample = &rows[..sample_len];
        debug!(
            rows = rows.len(),
            columns = names.len(),
            pinned = names.iter().filter(|c| pinned.contains(c)).count(),
            sample_len,
            "building table"
        );

        let mut schema = TableSchema::default();
        let mut fields = Vec::with_capacity(names.len());
        let mut arrays = Vec::with_capacity(names.len());
        for name in &names {
            let builder = match pinned.get(name) {
                Some(dtype) => Self::build_pinned(name, dtype, rows)?,
                None => Self::build_inferred(name, rows, sample)?,
            };
            schema.fields.insert(name.clone(), builder.dtype().clone());
            let (field, array) = builder.finish();
            fields.push(field);
            arrays.push(array);
        }

        let options = RecordBatchOptions::new().with_row_count(Some(rows.len()));
        let batch = RecordBatch::try_new_with_options(Arc::new(Schema::new(fields)), arrays, &options)?;
        Ok(Table { schema, batch })
    }

    fn build_pinned(name: &str, dtype: &DataType, rows: &[Row]) -> Result<ColumnBuilder> {
        let mut builder = ColumnBuilder::new(name, dtype.clone(), rows.len())?;
        for row in rows {
            let value = row.value_or_null(name);
            builder.push(value).map_err(|_| {
                debug!(column = name, %dtype, %value, "value does not fit pinned type");
                ConvertError::ValueCast {
                    column: name.to_string(),
                    dtype: dtype.clone(),
                    value: value.to_string(),
                }
            })?;
        }
        Ok(builder)
    }

    fn build_inferred(name: &str, rows: &[Row], sample: &[Row]) -> Result<ColumnBuilder> {
        let dtype = infer_column_type(name, sample)?;
        let mut builder = ColumnBuilder::new(name, dtype, rows.len())?;
        for (index, row) in rows.iter().enumerate() {
            let value = row.value_or_null(name);
            builder.push(value).map_err(|_| {
                debug!(column = name, row = index, found = value.type_name(), "value outside inference sample does not fit");
                ConvertError::SchemaAmbiguity {
                    column: name.to_string(),
                    expected: builder.dtype().clone(),
                    found: value.type_name().to_string(),
                    row: index,
                    infer_schema_length: sample.len(),
                }
            })?;
        }
        Ok(builder)
    }

    pub fn height(&self) -> usize {
        self.batch.num_rows()
    }

    pub fn width(&self) -> usize {
        self.batch.num_columns()
    }

    pub fn is_empty(&self) -> bool {
        self.height() == 0
    }

    pub fn schema(&self) -> &TableSchema {
        &self.schema
    }

    pub fn arrow_schema(&self) -> SchemaRef {
        self.batch.schema()
    }

    pub fn record_batch(&self) -> &RecordBatch {
        &self.batch
    }

    pub fn into_record_batch(self) -> RecordBatch {
        self.batch
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.schema.fields.keys().map(String::as_str).collect()
    }

    pub fn columns(&self) -> impl Iterator<Item = Column<'_>> {
        self.schema
            .fields
            .iter()
            .zip(self.batch.columns())
            .map(|((name, dtype), array)| Column::new(name, dtype, array))
    }

    pub fn column(&self, name: &str) -> Option<Column<'_>> {
        let (index, name, dtype) = self.schema.fields.get_full(name)?;
        Some(Column::new(name, dtype, self.batch.column(index)))
    }

    /// Cell at (`row`, `column`), or `None` when either is out of range.
    pub fn get(&self, row: usize, column: &str) -> Option<Value> {
        self.column(column)?.get(row)
    }

    pub fn row(&self, index: usize) -> Option<Row> {
        if index >= self.height() {
            return None;
        }
        Some(
            self.columns()
                .map(|c| (c.name.to_string(), c.get(index).unwrap_or_default()))
                .collect(),
        )
    }

    pub fn iter_rows(&self) -> impl Iterator<Item = Row> + '_ {
        (0..self.height()).filter_map(|i| self.row(i))
    }

    pub fn to_json_rows(&self) -> JsonValue {
        JsonValue::Array(self.iter_rows().map(|r| r.to_json()).collect())
    }
}
