use tracing::trace;

use crate::{
    error::{ConvertError, Result},
    orm::Row,
    schema::DataType,
};

/// Infer the type of `column` from a sample of rows.
///
/// Starts from `Null` and promotes through every sampled value; a missing
/// key counts as null. Two values without a common supertype fail instead of
/// picking one of them.
pub fn infer_column_type(column: &str, sample: &[Row]) -> Result<DataType> {
    let mut dtype = DataType::Null;
    for row in sample {
        let value = row.value_or_null(column);
        if value.is_null() {
            continue;
        }
        let value_type = DataType::of_value(value);
        dtype = DataType::promote(&dtype, &value_type).ok_or_else(|| {
            ConvertError::IncompatibleSampleTypes {
                column: column.to_string(),
                first: dtype.clone(),
                second: value_type.clone(),
            }
        })?;
    }
    trace!(column, %dtype, sampled = sample.len(), "inferred column type");
    Ok(dtype)
}
