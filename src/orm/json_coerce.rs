use std::str::FromStr;

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, TimeDelta, Utc};
use rust_decimal::Decimal;
use serde_json::Value as JsonValue;
use uuid::Uuid;

use crate::{
    orm::{FieldKind, Value},
    schema::decimal_digits,
};

impl Value {
    /// Convert a JSON value into the scalar a field of `kind` stores.
    ///
    /// Temporal kinds accept ISO-8601 text, decimals accept numbers or numeric
    /// text and are quantized to the field's decimal places, durations accept a
    /// number of seconds. Returns `None` when `value` cannot be held by `kind`;
    /// JSON `null` is always `Value::Null`.
    pub fn from_json_as(kind: &FieldKind, value: &JsonValue) -> Option<Value> {
        use FieldKind::*;
        if value.is_null() {
            return Some(Value::Null);
        }
        let coerced = match kind {
            PositiveIntegerField | PositiveBigIntegerField | PositiveSmallIntegerField => {
                Value::Int(value.as_i64().filter(|i| *i >= 0)?)
            }
            k if k.is_integer() => Value::Int(value.as_i64()?),
            FloatField => Value::Float(value.as_f64()?),
            DecimalField { max_digits, decimal_places } => {
                let mut d = parse_decimal(value)?.round_dp(*decimal_places);
                d.rescale(*decimal_places);
                if decimal_digits(&d) > *max_digits {
                    return None;
                }
                Value::Decimal(d)
            }
            BooleanField => Value::Bool(value.as_bool()?),
            k if k.is_text() => Value::String(value.as_str()?.to_string()),
            FileField | ImageField => Value::String(value.as_str()?.to_string()),
            UuidField => Value::Uuid(Uuid::parse_str(value.as_str()?).ok()?),
            BinaryField => Value::Bytes(parse_bytes(value)?),
            DateField => Value::Date(parse_date(value.as_str()?)?),
            DateTimeField => parse_datetime(value.as_str()?)?,
            TimeField => Value::Time(parse_time(value.as_str()?)?),
            DurationField => {
                let seconds = value.as_f64()?;
                Value::Duration(TimeDelta::microseconds((seconds * 1_000_000.0).round() as i64))
            }
            JsonField => Value::String(value.to_string()),
            ForeignKey { key, .. } | OneToOneField { key, .. } => Value::from_json_as(key, value)?,
            _ => Value::from_json(value),
        };
        Some(coerced)
    }
}

fn parse_decimal(value: &JsonValue) -> Option<Decimal> {
    match value {
        JsonValue::Number(n) => Decimal::from_str(&n.to_string())
            .or_else(|_| Decimal::from_scientific(&n.to_string()))
            .ok(),
        JsonValue::String(s) => Decimal::from_str(s).ok(),
        _ => None,
    }
}

fn parse_bytes(value: &JsonValue) -> Option<Vec<u8>> {
    match value {
        JsonValue::String(s) => Some(s.as_bytes().to_vec()),
        JsonValue::Array(items) => items
            .iter()
            .map(|i| i.as_u64().and_then(|b| u8::try_from(b).ok()))
            .collect(),
        _ => None,
    }
}

fn parse_date(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .or_else(|| DateTime::parse_from_rfc3339(s).ok().map(|dt| dt.with_timezone(&Utc).date_naive()))
}

fn parse_datetime(s: &str) -> Option<Value> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(Value::DatetimeTz(dt.with_timezone(&Utc)));
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .map(Value::Datetime)
}

fn parse_time(s: &str) -> Option<NaiveTime> {
    NaiveTime::parse_from_str(s, "%H:%M:%S%.f")
        .ok()
        .or_else(|| DateTime::parse_from_rfc3339(s).ok().map(|dt| dt.with_timezone(&Utc).time()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn decimals_are_quantized_to_places() {
        let kind = FieldKind::decimal(5, 2);
        assert_eq!(Value::from_json_as(&kind, &json!(99.99)), Some(Value::Decimal(Decimal::from_str("99.99").unwrap())));
        assert_eq!(Value::from_json_as(&kind, &json!("1.5")), Some(Value::Decimal(Decimal::from_str("1.50").unwrap())));
        assert_eq!(Value::from_json_as(&kind, &json!(12345.6)), None);
    }

    #[test]
    fn temporal_text_is_parsed() {
        assert_eq!(
            Value::from_json_as(&FieldKind::DateField, &json!("2025-02-01T10:30:00+00:00")),
            Some(Value::Date(NaiveDate::from_ymd_opt(2025, 2, 1).unwrap()))
        );
        assert!(matches!(
            Value::from_json_as(&FieldKind::DateTimeField, &json!("2025-02-01T10:30:00Z")),
            Some(Value::DatetimeTz(_))
        ));
        assert!(matches!(
            Value::from_json_as(&FieldKind::DateTimeField, &json!("2025-02-01 10:30:00")),
            Some(Value::Datetime(_))
        ));
        assert_eq!(
            Value::from_json_as(&FieldKind::TimeField, &json!("10:30:00")),
            Some(Value::Time(NaiveTime::from_hms_opt(10, 30, 0).unwrap()))
        );
    }

    #[test]
    fn durations_are_seconds() {
        assert_eq!(
            Value::from_json_as(&FieldKind::DurationField, &json!(30)),
            Some(Value::Duration(TimeDelta::seconds(30)))
        );
    }

    #[test]
    fn binary_from_text_or_byte_array() {
        let kind = FieldKind::BinaryField;
        assert_eq!(Value::from_json_as(&kind, &json!("110")), Some(Value::Bytes(b"110".to_vec())));
        assert_eq!(Value::from_json_as(&kind, &json!([1, 2, 255])), Some(Value::Bytes(vec![1, 2, 255])));
        assert_eq!(Value::from_json_as(&kind, &json!([256])), None);
    }

    #[test]
    fn positive_integers_reject_negatives() {
        let kind = FieldKind::PositiveIntegerField;
        assert_eq!(Value::from_json_as(&kind, &json!(5)), Some(Value::Int(5)));
        assert_eq!(Value::from_json_as(&kind, &json!(-5)), None);
    }

    #[test]
    fn relation_values_follow_key_kind() {
        let kind = FieldKind::foreign_key("author", FieldKind::BigAutoField);
        assert_eq!(Value::from_json_as(&kind, &json!(3)), Some(Value::Int(3)));
        assert_eq!(Value::from_json_as(&kind, &json!("three")), None);
    }

    #[test]
    fn null_is_null_for_every_kind() {
        assert_eq!(Value::from_json_as(&FieldKind::CharField, &json!(null)), Some(Value::Null));
        assert_eq!(Value::from_json_as(&FieldKind::decimal(5, 2), &json!(null)), Some(Value::Null));
    }
}
