use crate::{config::TimeZoneSetting, orm::FieldKind, schema::DataType};

/// The canonical declared-kind -> column type table.
///
/// | kind family                                  | column type           |
/// |----------------------------------------------|-----------------------|
/// | all integer and auto fields                  | `Int64`               |
/// | float                                        | `Float64`             |
/// | decimal, precision at most 38                | `Decimal(p, s)`       |
/// | boolean                                      | `Boolean`             |
/// | char, text, slug, email, url, path, ip, uuid | `String`              |
/// | binary                                       | `Binary`              |
/// | date / time / duration                       | `Date`/`Time`/`Duration` |
/// | datetime                                     | `Datetime` (zoned when aware) |
/// | foreign key, one-to-one                      | type of the related key |
///
/// Kinds outside the table return `None`; callers turn that into an error
/// instead of guessing.
#[derive(Debug, Clone, Default)]
pub struct TypeMapping {
    time_zone: TimeZoneSetting,
}

impl TypeMapping {
    pub fn new(time_zone: TimeZoneSetting) -> Self {
        Self { time_zone }
    }

    pub fn map(&self, kind: &FieldKind) -> Option<DataType> {
        use FieldKind::*;
        let dtype = match kind {
            k if k.is_integer() => DataType::Int64,
            FloatField => DataType::Float64,
            DecimalField { max_digits, decimal_places } => return DataType::decimal(*max_digits, *decimal_places),
            BooleanField => DataType::Boolean,
            k if k.is_text() => DataType::String,
            UuidField => DataType::String,
            BinaryField => DataType::Binary,
            DateField => DataType::Date,
            DateTimeField => DataType::Datetime {
                time_zone: self.time_zone.zone().map(str::to_string),
            },
            TimeField => DataType::Time,
            DurationField => DataType::Duration,
            ForeignKey { key, .. } | OneToOneField { key, .. } => return self.map(key),
            _ => return None,
        };
        Some(dtype)
    }
}
