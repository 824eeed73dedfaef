use arrow_array::{
    Array, ArrayRef, BinaryArray, BooleanArray, Date32Array, Decimal128Array, DurationMicrosecondArray, Float64Array,
    Int64Array, StringArray, Time64MicrosecondArray, TimestampMicrosecondArray,
};
use arrow_schema::{DataType as ArrowDataType, TimeUnit};
use chrono::{DateTime, NaiveDate, NaiveTime, TimeDelta};
use rust_decimal::Decimal;

use crate::{orm::Value, schema::DataType};

/// Days between 0001-01-01 and the Unix epoch.
pub(crate) const EPOCH_DAYS_FROM_CE: i32 = 719_163;

const MICROS_PER_SECOND: i64 = 1_000_000;

/// Read-only view of one column of a [`Table`](crate::table::Table).
#[derive(Debug, Clone, Copy)]
pub struct Column<'a> {
    pub name: &'a str,
    pub dtype: &'a DataType,
    array: &'a ArrayRef,
}

impl<'a> Column<'a> {
    pub(crate) fn new(name: &'a str, dtype: &'a DataType, array: &'a ArrayRef) -> Self {
        Self { name, dtype, array }
    }

    /// The underlying Arrow array.
    pub fn array(&self) -> &'a ArrayRef {
        self.array
    }

    pub fn len(&self) -> usize {
        self.array.len()
    }

    pub fn is_empty(&self) -> bool {
        self.array.is_empty()
    }

    pub fn null_count(&self) -> usize {
        match self.array.data_type() {
            ArrowDataType::Null => self.array.len(),
            _ => self.array.null_count(),
        }
    }

    /// Cell at `index` as a [`Value`]; `None` past the end.
    ///
    /// Zoned timestamps come back as `Value::DatetimeTz`.
    pub fn get(&self, index: usize) -> Option<Value> {
        value_at(self.array.as_ref(), index)
    }

    pub fn values(&self) -> impl Iterator<Item = Value> + use<'a> {
        let array = self.array;
        (0..array.len()).filter_map(move |i| value_at(array.as_ref(), i))
    }
}

fn downcast<T: Array + 'static>(array: &dyn Array) -> Option<&T> {
    array.as_any().downcast_ref::<T>()
}

/// Cell of an Arrow array produced by this crate, as a [`Value`].
pub(crate) fn value_at(array: &dyn Array, index: usize) -> Option<Value> {
    if index >= array.len() {
        return None;
    }
    if array.is_null(index) {
        return Some(Value::Null);
    }
    let value = match array.data_type() {
        ArrowDataType::Null => Value::Null,
        ArrowDataType::Boolean => Value::Bool(downcast::<BooleanArray>(array)?.value(index)),
        ArrowDataType::Int64 => Value::Int(downcast::<Int64Array>(array)?.value(index)),
        ArrowDataType::Float64 => Value::Float(downcast::<Float64Array>(array)?.value(index)),
        ArrowDataType::Decimal128(_, scale) => {
            decimal_value(downcast::<Decimal128Array>(array)?.value(index), *scale)
        }
        ArrowDataType::Utf8 => Value::String(downcast::<StringArray>(array)?.value(index).to_string()),
        ArrowDataType::Binary => Value::Bytes(downcast::<BinaryArray>(array)?.value(index).to_vec()),
        ArrowDataType::Date32 => {
            let days = downcast::<Date32Array>(array)?.value(index);
            Value::Date(NaiveDate::from_num_days_from_ce_opt(days.checked_add(EPOCH_DAYS_FROM_CE)?)?)
        }
        ArrowDataType::Timestamp(TimeUnit::Microsecond, zone) => {
            let micros = downcast::<TimestampMicrosecondArray>(array)?.value(index);
            let instant = DateTime::from_timestamp_micros(micros)?;
            match zone {
                Some(_) => Value::DatetimeTz(instant),
                None => Value::Datetime(instant.naive_utc()),
            }
        }
        ArrowDataType::Time64(TimeUnit::Microsecond) => {
            let micros = downcast::<Time64MicrosecondArray>(array)?.value(index);
            let secs = u32::try_from(micros / MICROS_PER_SECOND).ok()?;
            let nanos = u32::try_from(micros % MICROS_PER_SECOND * 1_000).ok()?;
            Value::Time(NaiveTime::from_num_seconds_from_midnight_opt(secs, nanos)?)
        }
        ArrowDataType::Duration(TimeUnit::Microsecond) => {
            Value::Duration(TimeDelta::microseconds(downcast::<DurationMicrosecondArray>(array)?.value(index)))
        }
        _ => return None,
    };
    Some(value)
}

/// 128-bit decimals wider than `rust_decimal` can hold drop trailing zeros
/// first and fall back to a float as a last resort.
fn decimal_value(mut mantissa: i128, scale: i8) -> Value {
    let mut scale = u32::try_from(scale).unwrap_or(0);
    loop {
        if let Ok(d) = Decimal::try_from_i128_with_scale(mantissa, scale) {
            return Value::Decimal(d);
        }
        if scale == 0 || mantissa % 10 != 0 {
            break;
        }
        mantissa /= 10;
        scale -= 1;
    }
    Value::Float(mantissa as f64 / 10f64.powi(scale as i32))
}
