use std::{fmt::Display, sync::Arc};

use arrow_schema::{DECIMAL128_MAX_PRECISION, DataType as ArrowDataType, TimeUnit};
use serde::{Deserialize, Serialize};

use crate::orm::Value;

/// Largest decimal precision a column may declare (128-bit decimal storage).
pub const MAX_DECIMAL_PRECISION: u32 = DECIMAL128_MAX_PRECISION as u32;

/// Digits needed to print any `i64`.
const INT64_DIGITS: u32 = 19;

/// Semantic type of a table column.
///
/// `Null` is only ever inferred: it is the type of a column whose sampled
/// values were all null.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataType {
    Null,
    Boolean,
    Int64,
    Float64,
    Decimal { precision: u32, scale: u32 },
    String,
    Binary,
    Date,
    /// Microsecond timestamp; zoned when `time_zone` is set.
    Datetime { time_zone: Option<String> },
    Time,
    Duration,
}

impl DataType {
    /// A decimal type, if `precision` and `scale` fit 128-bit decimal storage.
    pub fn decimal(precision: u32, scale: u32) -> Option<DataType> {
        (precision > 0 && precision <= MAX_DECIMAL_PRECISION && scale <= precision)
            .then_some(DataType::Decimal { precision, scale })
    }

    /// Arrow type the column is stored as. Timestamps, times and durations
    /// use microsecond units.
    pub fn to_arrow(&self) -> ArrowDataType {
        match self {
            DataType::Null => ArrowDataType::Null,
            DataType::Boolean => ArrowDataType::Boolean,
            DataType::Int64 => ArrowDataType::Int64,
            DataType::Float64 => ArrowDataType::Float64,
            DataType::Decimal { precision, scale } => ArrowDataType::Decimal128(
                u8::try_from(*precision).unwrap_or(u8::MAX),
                i8::try_from(*scale).unwrap_or(i8::MAX),
            ),
            DataType::String => ArrowDataType::Utf8,
            DataType::Binary => ArrowDataType::Binary,
            DataType::Date => ArrowDataType::Date32,
            DataType::Datetime { time_zone } => {
                ArrowDataType::Timestamp(TimeUnit::Microsecond, time_zone.as_deref().map(Arc::from))
            }
            DataType::Time => ArrowDataType::Time64(TimeUnit::Microsecond),
            DataType::Duration => ArrowDataType::Duration(TimeUnit::Microsecond),
        }
    }

    /// Natural type of a single non-null value. Returns `Null` for `Value::Null`.
    pub fn of_value(v: &Value) -> DataType {
        match v {
            Value::Null => DataType::Null,
            Value::Bool(_) => DataType::Boolean,
            Value::Int(_) => DataType::Int64,
            Value::Float(_) => DataType::Float64,
            Value::Decimal(d) => {
                let scale = d.scale();
                DataType::Decimal { precision: decimal_digits(d).max(scale).max(1), scale }
            }
            Value::String(_) | Value::Uuid(_) => DataType::String,
            Value::Bytes(_) => DataType::Binary,
            Value::Date(_) => DataType::Date,
            Value::Datetime(_) => DataType::Datetime { time_zone: None },
            Value::DatetimeTz(_) => DataType::Datetime { time_zone: Some("UTC".to_string()) },
            Value::Time(_) => DataType::Time,
            Value::Duration(_) => DataType::Duration,
        }
    }

    /// Smallest type both `a` and `b` fit in, if any.
    ///
    /// `Null` joins anything. Integers widen to floats or decimals, decimals
    /// widen to cover both operands and fall back to floats next to a float.
    /// Every other pair of distinct types has no supertype.
    pub fn promote(a: &DataType, b: &DataType) -> Option<DataType> {
        use DataType::*;
        if a == b {
            return Some(a.clone());
        }
        match (a, b) {
            (Null, other) | (other, Null) => Some(other.clone()),
            (Int64, Float64) | (Float64, Int64) => Some(Float64),
            (Float64, Decimal { .. }) | (Decimal { .. }, Float64) => Some(Float64),
            (Int64, Decimal { precision, scale }) | (Decimal { precision, scale }, Int64) => {
                Some(widen_decimal(INT64_DIGITS, 0, *precision, *scale))
            }
            (Decimal { precision: p1, scale: s1 }, Decimal { precision: p2, scale: s2 }) => {
                Some(widen_decimal(*p1, *s1, *p2, *s2))
            }
            _ => None,
        }
    }
}

fn widen_decimal(p1: u32, s1: u32, p2: u32, s2: u32) -> DataType {
    let scale = s1.max(s2);
    let integral = p1.saturating_sub(s1).max(p2.saturating_sub(s2));
    DataType::Decimal { precision: (integral + scale).min(MAX_DECIMAL_PRECISION), scale }
}

/// Number of significant digits in the decimal's mantissa.
pub fn decimal_digits(d: &rust_decimal::Decimal) -> u32 {
    let mut m = d.mantissa().unsigned_abs();
    let mut digits = 1;
    while m >= 10 {
        m /= 10;
        digits += 1;
    }
    digits
}

impl Display for DataType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DataType::Null => f.write_str("null"),
            DataType::Boolean => f.write_str("bool"),
            DataType::Int64 => f.write_str("i64"),
            DataType::Float64 => f.write_str("f64"),
            DataType::Decimal { precision, scale } => write!(f, "decimal[{precision},{scale}]"),
            DataType::String => f.write_str("str"),
            DataType::Binary => f.write_str("binary"),
            DataType::Date => f.write_str("date"),
            DataType::Datetime { time_zone: None } => f.write_str("datetime[μs]"),
            DataType::Datetime { time_zone: Some(tz) } => write!(f, "datetime[μs, {tz}]"),
            DataType::Time => f.write_str("time"),
            DataType::Duration => f.write_str("duration[μs]"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use std::str::FromStr;

    #[test]
    fn null_joins_anything() {
        assert_eq!(DataType::promote(&DataType::Null, &DataType::String), Some(DataType::String));
        assert_eq!(DataType::promote(&DataType::Date, &DataType::Null), Some(DataType::Date));
    }

    #[test]
    fn int_widens_to_float() {
        assert_eq!(DataType::promote(&DataType::Int64, &DataType::Float64), Some(DataType::Float64));
        assert_eq!(DataType::promote(&DataType::Float64, &DataType::Int64), Some(DataType::Float64));
    }

    #[test]
    fn decimals_widen_to_cover_both() {
        let a = DataType::Decimal { precision: 5, scale: 2 };
        let b = DataType::Decimal { precision: 6, scale: 4 };
        assert_eq!(DataType::promote(&a, &b), Some(DataType::Decimal { precision: 7, scale: 4 }));

        let with_int = DataType::promote(&DataType::Int64, &a).unwrap();
        assert_eq!(with_int, DataType::Decimal { precision: 21, scale: 2 });
    }

    #[test]
    fn unrelated_types_do_not_unify() {
        assert_eq!(DataType::promote(&DataType::Int64, &DataType::String), None);
        assert_eq!(DataType::promote(&DataType::Date, &DataType::Datetime { time_zone: None }), None);
        let naive = DataType::Datetime { time_zone: None };
        let zoned = DataType::Datetime { time_zone: Some("UTC".into()) };
        assert_eq!(DataType::promote(&naive, &zoned), None);
    }

    #[test]
    fn decimal_value_type_tracks_digits_and_scale() {
        let v = Value::Decimal(Decimal::from_str("99.99").unwrap());
        assert_eq!(DataType::of_value(&v), DataType::Decimal { precision: 4, scale: 2 });
        let small = Value::Decimal(Decimal::from_str("0.05").unwrap());
        assert_eq!(DataType::of_value(&small), DataType::Decimal { precision: 2, scale: 2 });
    }

    #[test]
    fn decimal_bounds_follow_128_bit_storage() {
        assert_eq!(DataType::decimal(38, 30), Some(DataType::Decimal { precision: 38, scale: 30 }));
        assert_eq!(DataType::decimal(39, 2), None);
        assert_eq!(DataType::decimal(0, 0), None);
        assert_eq!(DataType::decimal(4, 5), None);
    }

    #[test]
    fn arrow_storage_types() {
        assert_eq!(DataType::Decimal { precision: 5, scale: 2 }.to_arrow(), ArrowDataType::Decimal128(5, 2));
        assert_eq!(
            DataType::Datetime { time_zone: Some("Europe/Lisbon".into()) }.to_arrow(),
            ArrowDataType::Timestamp(TimeUnit::Microsecond, Some("Europe/Lisbon".into()))
        );
        assert_eq!(DataType::Datetime { time_zone: None }.to_arrow(), ArrowDataType::Timestamp(TimeUnit::Microsecond, None));
        assert_eq!(DataType::Date.to_arrow(), ArrowDataType::Date32);
        assert_eq!(DataType::String.to_arrow(), ArrowDataType::Utf8);
    }

    #[test]
    fn display_names() {
        assert_eq!(DataType::Decimal { precision: 5, scale: 2 }.to_string(), "decimal[5,2]");
        assert_eq!(DataType::Datetime { time_zone: Some("UTC".into()) }.to_string(), "datetime[μs, UTC]");
    }
}
