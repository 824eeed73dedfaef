use std::sync::Arc;

use arrow_array::{
    ArrayRef, NullArray,
    builder::{
        BinaryBuilder, BooleanBuilder, Date32Builder, Decimal128Builder, DurationMicrosecondBuilder, Float64Builder,
        Int64Builder, StringBuilder, Time64MicrosecondBuilder, TimestampMicrosecondBuilder,
    },
};
use arrow_schema::Field;
use chrono::{Datelike, NaiveDateTime, NaiveTime, Timelike};
use rust_decimal::Decimal;

use crate::{
    error::Result,
    orm::Value,
    schema::DataType,
    table::column::EPOCH_DAYS_FROM_CE,
};

/// Returned when a value has no lossless representation in a column type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Unrepresentable;

enum ArrayBuilder {
    /// All-null column; only the length is kept.
    Null(usize),
    Boolean(BooleanBuilder),
    Int64(Int64Builder),
    Float64(Float64Builder),
    Decimal { builder: Decimal128Builder, precision: u32, scale: u32 },
    String(StringBuilder),
    Binary(BinaryBuilder),
    Date(Date32Builder),
    Datetime(TimestampMicrosecondBuilder),
    Time(Time64MicrosecondBuilder),
    Duration(DurationMicrosecondBuilder),
}

/// Appends row values to an Arrow array of a fixed column type.
///
/// Accepted conversions are the lossless ones: integers into float and
/// decimal columns, decimals rescaled up to the column scale, UUIDs into
/// string columns, and timestamps stored as UTC microseconds.
pub struct ColumnBuilder {
    name: String,
    dtype: DataType,
    inner: ArrayBuilder,
}

impl ColumnBuilder {
    /// Fails only for a decimal type Arrow cannot store.
    pub fn new(name: &str, dtype: DataType, capacity: usize) -> Result<Self> {
        let inner = match &dtype {
            DataType::Null => ArrayBuilder::Null(0),
            DataType::Boolean => ArrayBuilder::Boolean(BooleanBuilder::with_capacity(capacity)),
            DataType::Int64 => ArrayBuilder::Int64(Int64Builder::with_capacity(capacity)),
            DataType::Float64 => ArrayBuilder::Float64(Float64Builder::with_capacity(capacity)),
            DataType::Decimal { precision, scale } => {
                let builder = Decimal128Builder::with_capacity(capacity).with_precision_and_scale(
                    u8::try_from(*precision).unwrap_or(u8::MAX),
                    i8::try_from(*scale).unwrap_or(i8::MAX),
                )?;
                ArrayBuilder::Decimal { builder, precision: *precision, scale: *scale }
            }
            DataType::String => ArrayBuilder::String(StringBuilder::with_capacity(capacity, capacity * 16)),
            DataType::Binary => ArrayBuilder::Binary(BinaryBuilder::with_capacity(capacity, capacity * 16)),
            DataType::Date => ArrayBuilder::Date(Date32Builder::with_capacity(capacity)),
            DataType::Datetime { time_zone } => ArrayBuilder::Datetime(
                TimestampMicrosecondBuilder::with_capacity(capacity).with_timezone_opt(time_zone.clone()),
            ),
            DataType::Time => ArrayBuilder::Time(Time64MicrosecondBuilder::with_capacity(capacity)),
            DataType::Duration => ArrayBuilder::Duration(DurationMicrosecondBuilder::with_capacity(capacity)),
        };
        Ok(Self { name: name.to_string(), dtype, inner })
    }

    pub fn dtype(&self) -> &DataType {
        &self.dtype
    }

    pub fn push(&mut self, value: &Value) -> std::result::Result<(), Unrepresentable> {
        if value.is_null() {
            self.push_null();
            return Ok(());
        }

        match (&mut self.inner, value) {
            (ArrayBuilder::Boolean(b), Value::Bool(v)) => b.append_value(*v),
            (ArrayBuilder::Int64(b), Value::Int(i)) => b.append_value(*i),
            (ArrayBuilder::Float64(b), Value::Float(f)) => b.append_value(*f),
            (ArrayBuilder::Float64(b), Value::Int(i)) => b.append_value(*i as f64),
            (ArrayBuilder::Decimal { builder, precision, scale }, Value::Decimal(d)) => {
                builder.append_value(fit_decimal(*d, *precision, *scale)?)
            }
            (ArrayBuilder::Decimal { builder, precision, scale }, Value::Int(i)) => {
                builder.append_value(fit_decimal(Decimal::from(*i), *precision, *scale)?)
            }
            (ArrayBuilder::String(b), Value::String(s)) => b.append_value(s),
            (ArrayBuilder::String(b), Value::Uuid(u)) => b.append_value(u.to_string()),
            (ArrayBuilder::Binary(b), Value::Bytes(v)) => b.append_value(v),
            (ArrayBuilder::Date(b), Value::Date(d)) => b.append_value(d.num_days_from_ce() - EPOCH_DAYS_FROM_CE),
            // naive values carry no zone and are stored as UTC wall time
            (ArrayBuilder::Datetime(b), Value::Datetime(dt)) => b.append_value(timestamp_micros(dt)),
            (ArrayBuilder::Datetime(b), Value::DatetimeTz(dt)) => b.append_value(dt.timestamp_micros()),
            (ArrayBuilder::Time(b), Value::Time(t)) => b.append_value(time_micros(t)),
            (ArrayBuilder::Duration(b), Value::Duration(d)) => b.append_value(d.num_microseconds().ok_or(Unrepresentable)?),
            _ => return Err(Unrepresentable),
        }
        Ok(())
    }

    fn push_null(&mut self) {
        match &mut self.inner {
            ArrayBuilder::Null(n) => *n += 1,
            ArrayBuilder::Boolean(b) => b.append_null(),
            ArrayBuilder::Int64(b) => b.append_null(),
            ArrayBuilder::Float64(b) => b.append_null(),
            ArrayBuilder::Decimal { builder, .. } => builder.append_null(),
            ArrayBuilder::String(b) => b.append_null(),
            ArrayBuilder::Binary(b) => b.append_null(),
            ArrayBuilder::Date(b) => b.append_null(),
            ArrayBuilder::Datetime(b) => b.append_null(),
            ArrayBuilder::Time(b) => b.append_null(),
            ArrayBuilder::Duration(b) => b.append_null(),
        }
    }

    /// The schema field and the finished array.
    pub fn finish(self) -> (Field, ArrayRef) {
        let array: ArrayRef = match self.inner {
            ArrayBuilder::Null(n) => Arc::new(NullArray::new(n)),
            ArrayBuilder::Boolean(mut b) => Arc::new(b.finish()),
            ArrayBuilder::Int64(mut b) => Arc::new(b.finish()),
            ArrayBuilder::Float64(mut b) => Arc::new(b.finish()),
            ArrayBuilder::Decimal { mut builder, .. } => Arc::new(builder.finish()),
            ArrayBuilder::String(mut b) => Arc::new(b.finish()),
            ArrayBuilder::Binary(mut b) => Arc::new(b.finish()),
            ArrayBuilder::Date(mut b) => Arc::new(b.finish()),
            ArrayBuilder::Datetime(mut b) => Arc::new(b.finish()),
            ArrayBuilder::Time(mut b) => Arc::new(b.finish()),
            ArrayBuilder::Duration(mut b) => Arc::new(b.finish()),
        };
        (Field::new(self.name, self.dtype.to_arrow(), true), array)
    }
}

fn timestamp_micros(dt: &NaiveDateTime) -> i64 {
    dt.and_utc().timestamp_micros()
}

fn time_micros(t: &NaiveTime) -> i64 {
    i64::from(t.num_seconds_from_midnight()) * 1_000_000 + i64::from(t.nanosecond() / 1_000)
}

/// Unscaled 128-bit value of `d` at the column scale, refusing to drop digits
/// or exceed the column precision.
fn fit_decimal(d: Decimal, precision: u32, scale: u32) -> std::result::Result<i128, Unrepresentable> {
    let d = d.normalize();
    if d.scale() > scale {
        return Err(Unrepresentable);
    }
    let factor = 10i128.checked_pow(scale - d.scale()).ok_or(Unrepresentable)?;
    let unscaled = d.mantissa().checked_mul(factor).ok_or(Unrepresentable)?;
    if digits(unscaled) > precision {
        return Err(Unrepresentable);
    }
    Ok(unscaled)
}

fn digits(n: i128) -> u32 {
    n.unsigned_abs().checked_ilog10().map_or(1, |d| d + 1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::column::value_at;
    use arrow_array::Array;
    use chrono::{NaiveDate, TimeZone, Utc};
    use std::str::FromStr;

    fn dec(s: &str) -> Value {
        Value::Decimal(Decimal::from_str(s).unwrap())
    }

    fn built(b: ColumnBuilder) -> ArrayRef {
        b.finish().1
    }

    #[test]
    fn nulls_fit_every_type() {
        for dtype in [DataType::Null, DataType::Int64, DataType::String, DataType::Duration] {
            let mut b = ColumnBuilder::new("c", dtype, 1).unwrap();
            b.push(&Value::Null).unwrap();
            let array = built(b);
            assert_eq!(array.len(), 1);
            assert_eq!(value_at(array.as_ref(), 0), Some(Value::Null));
        }
    }

    #[test]
    fn null_column_rejects_values() {
        let mut b = ColumnBuilder::new("c", DataType::Null, 1).unwrap();
        assert_eq!(b.push(&Value::from("x")), Err(Unrepresentable));
    }

    #[test]
    fn int_widens_but_float_does_not_narrow() {
        let mut floats = ColumnBuilder::new("f", DataType::Float64, 2).unwrap();
        floats.push(&Value::Int(3)).unwrap();
        assert_eq!(value_at(built(floats).as_ref(), 0), Some(Value::Float(3.0)));

        let mut ints = ColumnBuilder::new("i", DataType::Int64, 1).unwrap();
        assert!(ints.push(&Value::Float(3.5)).is_err());
    }

    #[test]
    fn decimals_rescale_within_precision() {
        let mut b = ColumnBuilder::new("d", DataType::Decimal { precision: 5, scale: 2 }, 4).unwrap();
        b.push(&dec("99.99")).unwrap();
        b.push(&dec("1.5")).unwrap();
        b.push(&Value::Int(12)).unwrap();
        assert!(b.push(&dec("1.234")).is_err(), "would drop a digit");
        assert!(b.push(&dec("1000.00")).is_err(), "exceeds precision");
        let array = built(b);
        assert_eq!(array.data_type(), &arrow_schema::DataType::Decimal128(5, 2));
        assert_eq!(value_at(array.as_ref(), 1), Some(dec("1.50")));
        assert_eq!(value_at(array.as_ref(), 2), Some(dec("12.00")));
    }

    #[test]
    fn trailing_zeros_beyond_scale_are_accepted() {
        let mut b = ColumnBuilder::new("d", DataType::Decimal { precision: 5, scale: 2 }, 1).unwrap();
        b.push(&dec("2.5000")).unwrap();
        assert_eq!(value_at(built(b).as_ref(), 0), Some(dec("2.50")));
    }

    #[test]
    fn wide_scale_decimal_columns_accept_values() {
        let mut b = ColumnBuilder::new("d", DataType::Decimal { precision: 38, scale: 30 }, 2).unwrap();
        b.push(&dec("1.5")).unwrap();
        b.push(&Value::Int(-7)).unwrap();
        let array = built(b);
        assert_eq!(value_at(array.as_ref(), 0), Some(dec("1.5")));
        assert_eq!(value_at(array.as_ref(), 1), Some(dec("-7")));
    }

    #[test]
    fn decimal_type_outside_arrow_bounds_is_rejected() {
        assert!(ColumnBuilder::new("d", DataType::Decimal { precision: 60, scale: 2 }, 1).is_err());
    }

    #[test]
    fn zoned_column_stores_utc_instants() {
        let zoned = DataType::Datetime { time_zone: Some("Europe/Lisbon".into()) };
        let mut b = ColumnBuilder::new("ts", zoned, 2).unwrap();
        let aware = Utc.with_ymd_and_hms(2025, 7, 1, 10, 0, 0).unwrap();
        let naive = NaiveDate::from_ymd_opt(2025, 7, 1).unwrap().and_hms_opt(11, 0, 0).unwrap();
        b.push(&Value::DatetimeTz(aware)).unwrap();
        b.push(&Value::Datetime(naive)).unwrap();
        let (field, array) = b.finish();
        assert_eq!(
            field.data_type(),
            &arrow_schema::DataType::Timestamp(arrow_schema::TimeUnit::Microsecond, Some("Europe/Lisbon".into()))
        );
        assert_eq!(value_at(array.as_ref(), 0), Some(Value::DatetimeTz(aware)));
        assert_eq!(value_at(array.as_ref(), 1), Some(Value::DatetimeTz(naive.and_utc())));
    }

    #[test]
    fn temporal_values_survive_storage() {
        let day = NaiveDate::from_ymd_opt(1969, 12, 31).unwrap();
        let mut dates = ColumnBuilder::new("d", DataType::Date, 1).unwrap();
        dates.push(&Value::Date(day)).unwrap();
        assert_eq!(value_at(built(dates).as_ref(), 0), Some(Value::Date(day)));

        let t = NaiveTime::from_hms_micro_opt(10, 30, 5, 250).unwrap();
        let mut times = ColumnBuilder::new("t", DataType::Time, 1).unwrap();
        times.push(&Value::Time(t)).unwrap();
        assert_eq!(value_at(built(times).as_ref(), 0), Some(Value::Time(t)));
    }

    #[test]
    fn uuid_fits_string_column() {
        let id = uuid::Uuid::new_v4();
        let mut b = ColumnBuilder::new("u", DataType::String, 1).unwrap();
        b.push(&Value::Uuid(id)).unwrap();
        assert_eq!(value_at(built(b).as_ref(), 0), Some(Value::String(id.to_string())));
    }
}
