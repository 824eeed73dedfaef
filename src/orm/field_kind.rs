use std::fmt::Display;

use serde::{Deserialize, Serialize};

/// Declared kind of a model field, as reported by the ORM's field metadata.
///
/// The variants follow the usual relational-ORM field families. Kinds that
/// the schema resolver cannot map (e.g. `JsonField`) are still representable
/// here so the resolver can report them by name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FieldKind {
    AutoField,
    BigAutoField,
    SmallAutoField,
    IntegerField,
    BigIntegerField,
    SmallIntegerField,
    PositiveIntegerField,
    PositiveBigIntegerField,
    PositiveSmallIntegerField,
    FloatField,
    DecimalField { max_digits: u32, decimal_places: u32 },
    BooleanField,
    CharField,
    TextField,
    SlugField,
    EmailField,
    UrlField,
    FilePathField,
    GenericIpAddressField,
    UuidField,
    BinaryField,
    DateField,
    DateTimeField,
    TimeField,
    DurationField,
    JsonField,
    FileField,
    ImageField,
    /// Many-to-one relation; the row column holds the related model's key.
    ForeignKey { to: String, key: Box<FieldKind> },
    OneToOneField { to: String, key: Box<FieldKind> },
    /// Has no column of its own on the declaring model.
    ManyToManyField { to: String },
    /// Any custom field type the adapter does not classify.
    Other(String),
}

impl FieldKind {
    pub fn foreign_key(to: &str, key: FieldKind) -> Self {
        FieldKind::ForeignKey { to: to.to_string(), key: Box::new(key) }
    }

    pub fn one_to_one(to: &str, key: FieldKind) -> Self {
        FieldKind::OneToOneField { to: to.to_string(), key: Box::new(key) }
    }

    pub fn decimal(max_digits: u32, decimal_places: u32) -> Self {
        FieldKind::DecimalField { max_digits, decimal_places }
    }

    /// Name of the related model for relation kinds.
    pub fn related_model(&self) -> Option<&str> {
        match self {
            FieldKind::ForeignKey { to, .. }
            | FieldKind::OneToOneField { to, .. }
            | FieldKind::ManyToManyField { to } => Some(to),
            _ => None,
        }
    }

    /// Whether values of this kind live in a column of the declaring model.
    pub fn has_column(&self) -> bool {
        !matches!(self, FieldKind::ManyToManyField { .. })
    }

    pub fn is_integer(&self) -> bool {
        use FieldKind::*;
        matches!(
            self,
            AutoField | BigAutoField | SmallAutoField
                | IntegerField | BigIntegerField | SmallIntegerField
                | PositiveIntegerField | PositiveBigIntegerField | PositiveSmallIntegerField
        )
    }

    /// String-backed kinds: text, char, slug, email, url, file path, ip address.
    pub fn is_text(&self) -> bool {
        use FieldKind::*;
        matches!(
            self,
            CharField | TextField | SlugField | EmailField | UrlField | FilePathField | GenericIpAddressField
        )
    }

    /// Class-style name of the kind, without parameters.
    pub fn name(&self) -> &str {
        use FieldKind::*;
        match self {
            AutoField => "AutoField",
            BigAutoField => "BigAutoField",
            SmallAutoField => "SmallAutoField",
            IntegerField => "IntegerField",
            BigIntegerField => "BigIntegerField",
            SmallIntegerField => "SmallIntegerField",
            PositiveIntegerField => "PositiveIntegerField",
            PositiveBigIntegerField => "PositiveBigIntegerField",
            PositiveSmallIntegerField => "PositiveSmallIntegerField",
            FloatField => "FloatField",
            DecimalField { .. } => "DecimalField",
            BooleanField => "BooleanField",
            CharField => "CharField",
            TextField => "TextField",
            SlugField => "SlugField",
            EmailField => "EmailField",
            UrlField => "URLField",
            FilePathField => "FilePathField",
            GenericIpAddressField => "GenericIPAddressField",
            UuidField => "UUIDField",
            BinaryField => "BinaryField",
            DateField => "DateField",
            DateTimeField => "DateTimeField",
            TimeField => "TimeField",
            DurationField => "DurationField",
            JsonField => "JSONField",
            FileField => "FileField",
            ImageField => "ImageField",
            ForeignKey { .. } => "ForeignKey",
            OneToOneField { .. } => "OneToOneField",
            ManyToManyField { .. } => "ManyToManyField",
            Other(name) => name.as_str(),
        }
    }
}

impl Display for FieldKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FieldKind::DecimalField { max_digits, decimal_places } => {
                write!(f, "DecimalField({max_digits}, {decimal_places})")
            }
            FieldKind::ForeignKey { to, key } | FieldKind::OneToOneField { to, key } => {
                write!(f, "{}({to}, key={key})", self.name())
            }
            FieldKind::ManyToManyField { to } => write!(f, "ManyToManyField({to})"),
            other => f.write_str(other.name()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relation_kinds_report_target() {
        let fk = FieldKind::foreign_key("author", FieldKind::BigAutoField);
        assert_eq!(fk.related_model(), Some("author"));
        assert!(fk.has_column());
        assert_eq!(fk.to_string(), "ForeignKey(author, key=BigAutoField)");

        let m2m = FieldKind::ManyToManyField { to: "tag".into() };
        assert!(!m2m.has_column());
    }

    #[test]
    fn families() {
        assert!(FieldKind::PositiveSmallIntegerField.is_integer());
        assert!(!FieldKind::FloatField.is_integer());
        assert!(FieldKind::GenericIpAddressField.is_text());
        assert!(!FieldKind::UuidField.is_text());
        assert_eq!(FieldKind::Other("HStoreField".into()).name(), "HStoreField");
    }
}
