use indexmap::IndexMap;
use tracing::{debug, trace};

use crate::{
    config::TimeZoneSetting,
    error::{ConvertError, Result},
    orm::{FieldDescriptor, FieldMetadataProvider, LookupPath, QuerySet},
    schema::{PartialSchema, TypeMapping},
};

/// Builds the [`PartialSchema`] of a queryset from its model's declared
/// fields. Reads metadata only; never touches rows.
#[derive(Debug, Clone, Default)]
pub struct SchemaResolver {
    mapping: TypeMapping,
}

impl SchemaResolver {
    pub fn new(time_zone: TimeZoneSetting) -> Self {
        Self { mapping: TypeMapping::new(time_zone) }
    }

    /// Resolve every column whose type the model declares.
    ///
    /// Without a projection, each field that occupies a row column is pinned
    /// under its row key. With a projection, only plain field names listed in
    /// it are pinned, under the projected spelling; relation traversals,
    /// annotation aliases and names unknown to the model stay unresolved.
    /// Annotation columns are never pinned, and an annotation alias that is
    /// also a model field or row key is rejected.
    pub fn resolve<Q: QuerySet + ?Sized>(&self, queryset: &Q) -> Result<PartialSchema> {
        let annotations = queryset.annotation_names();

        if let Some(name) = queryset
            .projection()
            .into_iter()
            .flatten()
            .find(|name| LookupPath::parse(name).is_none())
        {
            return Err(ConvertError::InvalidFieldName { name: name.clone() });
        }

        let Some(metadata) = queryset.metadata() else {
            debug!("queryset has no model metadata, every column is inferred");
            return Ok(PartialSchema::new());
        };

        let schema = match queryset.projection() {
            None => self.resolve_model_rows(&metadata.fields_by_name(), &annotations)?,
            Some(projection) => self.resolve_projection(metadata, projection, &annotations)?,
        };

        debug!(pinned = schema.len(), annotations = annotations.len(), "resolved partial schema");
        Ok(schema)
    }

    fn resolve_model_rows(
        &self,
        fields: &IndexMap<String, FieldDescriptor>,
        annotations: &[String],
    ) -> Result<PartialSchema> {
        let mut schema = PartialSchema::new();
        for field in fields.values() {
            if !field.has_column() {
                trace!(field = %field.name, kind = %field.kind, "field has no row column, skipped");
                continue;
            }
            if annotations.contains(&field.column) {
                return Err(ConvertError::ConflictingColumnName { column: field.column.clone() });
            }
            self.pin(&mut schema, &field.column, field)?;
        }
        Ok(schema)
    }

    fn resolve_projection(
        &self,
        metadata: &dyn FieldMetadataProvider,
        projection: &[String],
        annotations: &[String],
    ) -> Result<PartialSchema> {
        let mut schema = PartialSchema::new();
        for name in projection {
            // validated by `resolve`
            let Some(path) = LookupPath::parse(name) else { continue };
            if path.is_traversal() {
                trace!(column = %name, "relation traversal left to inference");
                continue;
            }
            let field = metadata.field(name);
            if annotations.contains(name) {
                if field.is_some() {
                    return Err(ConvertError::ConflictingColumnName { column: name.clone() });
                }
                trace!(column = %name, "projected annotation alias left to inference");
                continue;
            }
            match field {
                Some(field) if field.has_column() => self.pin(&mut schema, name, &field)?,
                Some(field) => {
                    trace!(column = %name, kind = %field.kind, "projected field has no row column, left to inference");
                }
                None => trace!(column = %name, "no declared field, left to inference"),
            }
        }
        Ok(schema)
    }

    fn pin(&self, schema: &mut PartialSchema, column: &str, field: &FieldDescriptor) -> Result<()> {
        let dtype = self.mapping.map(&field.kind).ok_or_else(|| {
            debug!(column, kind = %field.kind, "unmappable field kind");
            ConvertError::UnmappableFieldKind {
                column: column.to_string(),
                kind: field.kind.to_string(),
            }
        })?;
        trace!(column, kind = %field.kind, %dtype, nullable = field.nullable, "pinned column type");
        schema.insert(column, dtype);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        orm::{FieldKind, RowIter},
        schema::DataType,
    };

    struct StubQuerySet {
        fields: Option<Vec<FieldDescriptor>>,
        projection: Option<Vec<String>>,
        annotations: Vec<String>,
    }

    impl StubQuerySet {
        fn model(fields: Vec<FieldDescriptor>) -> Self {
            Self { fields: Some(fields), projection: None, annotations: Vec::new() }
        }

        fn values(mut self, names: &[&str]) -> Self {
            self.projection = Some(names.iter().map(|s| s.to_string()).collect());
            self
        }

        fn annotate(mut self, alias: &str) -> Self {
            self.annotations.push(alias.to_string());
            self
        }
    }

    impl QuerySet for StubQuerySet {
        fn metadata(&self) -> Option<&dyn FieldMetadataProvider> {
            self.fields.as_ref().map(|f| f as &dyn FieldMetadataProvider)
        }

        fn projection(&self) -> Option<&[String]> {
            self.projection.as_deref()
        }

        fn annotation_names(&self) -> Vec<String> {
            self.annotations.clone()
        }

        fn rows(&self) -> RowIter<'_> {
            Box::new(std::iter::empty())
        }
    }

    fn book_fields() -> Vec<FieldDescriptor> {
        vec![
            FieldDescriptor::new("id", FieldKind::BigAutoField),
            FieldDescriptor::nullable("title", FieldKind::CharField),
            FieldDescriptor::nullable("author", FieldKind::foreign_key("author", FieldKind::BigAutoField)),
            FieldDescriptor::new("tags", FieldKind::ManyToManyField { to: "tag".into() }),
        ]
    }

    #[test]
    fn full_rows_pin_every_column_under_row_key() {
        let qs = StubQuerySet::model(book_fields());
        let schema = SchemaResolver::default().resolve(&qs).unwrap();
        assert_eq!(schema.columns().collect::<Vec<_>>(), vec!["id", "title", "author_id"]);
        assert_eq!(schema.get("author_id"), Some(&DataType::Int64));
        assert!(!schema.contains("tags"));
    }

    #[test]
    fn annotations_are_never_pinned() {
        let qs = StubQuerySet::model(book_fields()).annotate("title_upper");
        let schema = SchemaResolver::default().resolve(&qs).unwrap();
        assert!(!schema.contains("title_upper"));
        assert_eq!(schema.get("title"), Some(&DataType::String));
    }

    #[test]
    fn projection_pins_only_listed_plain_fields() {
        let qs = StubQuerySet::model(book_fields())
            .values(&["title", "author__name", "author"])
            .annotate("n");
        let schema = SchemaResolver::default().resolve(&qs).unwrap();
        assert_eq!(schema.columns().collect::<Vec<_>>(), vec!["title", "author"]);
        assert!(!schema.contains("author__name"));
        assert!(!schema.contains("id"));
    }

    #[test]
    fn projected_many_to_many_is_left_to_inference() {
        let qs = StubQuerySet::model(book_fields()).values(&["title", "tags"]);
        let schema = SchemaResolver::default().resolve(&qs).unwrap();
        assert_eq!(schema.columns().collect::<Vec<_>>(), vec!["title"]);
    }

    #[test]
    fn projection_accepts_row_key_spelling() {
        let qs = StubQuerySet::model(book_fields()).values(&["author_id"]);
        let schema = SchemaResolver::default().resolve(&qs).unwrap();
        assert_eq!(schema.get("author_id"), Some(&DataType::Int64));
    }

    #[test]
    fn unmappable_kind_names_column_and_kind() {
        let qs = StubQuerySet::model(vec![FieldDescriptor::nullable("payload", FieldKind::JsonField)]);
        let err = SchemaResolver::default().resolve(&qs).unwrap_err();
        match err {
            ConvertError::UnmappableFieldKind { column, kind } => {
                assert_eq!(column, "payload");
                assert_eq!(kind, "JSONField");
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn unmappable_kind_outside_projection_is_ignored() {
        let mut fields = book_fields();
        fields.push(FieldDescriptor::nullable("payload", FieldKind::JsonField));
        let qs = StubQuerySet::model(fields).values(&["title"]);
        let schema = SchemaResolver::default().resolve(&qs).unwrap();
        assert_eq!(schema.len(), 1);
    }

    #[test]
    fn projection_colliding_with_annotation_is_rejected() {
        let qs = StubQuerySet::model(book_fields()).values(&["title"]).annotate("title");
        let err = SchemaResolver::default().resolve(&qs).unwrap_err();
        assert!(matches!(err, ConvertError::ConflictingColumnName { column } if column == "title"));
    }

    #[test]
    fn projected_annotation_alias_is_left_unpinned() {
        let qs = StubQuerySet::model(vec![FieldDescriptor::nullable("title", FieldKind::CharField)])
            .values(&["title", "title_upper"])
            .annotate("title_upper");
        let schema = SchemaResolver::default().resolve(&qs).unwrap();
        assert_eq!(schema.columns().collect::<Vec<_>>(), vec!["title"]);
        assert!(!schema.contains("title_upper"));
    }

    #[test]
    fn projected_alias_matching_a_row_key_is_rejected() {
        let qs = StubQuerySet::model(book_fields()).values(&["author_id"]).annotate("author_id");
        let err = SchemaResolver::default().resolve(&qs).unwrap_err();
        assert!(matches!(err, ConvertError::ConflictingColumnName { column } if column == "author_id"));
    }

    #[test]
    fn annotation_shadowing_model_column_is_rejected() {
        let qs = StubQuerySet::model(book_fields()).annotate("author_id");
        let err = SchemaResolver::default().resolve(&qs).unwrap_err();
        assert!(matches!(err, ConvertError::ConflictingColumnName { .. }));
    }

    #[test]
    fn malformed_projection_name_is_rejected() {
        let qs = StubQuerySet::model(book_fields()).values(&["author__"]);
        let err = SchemaResolver::default().resolve(&qs).unwrap_err();
        assert!(matches!(err, ConvertError::InvalidFieldName { name } if name == "author__"));
    }

    #[test]
    fn no_metadata_means_empty_schema() {
        let qs = StubQuerySet { fields: None, projection: None, annotations: vec!["x".into()] };
        let schema = SchemaResolver::default().resolve(&qs).unwrap();
        assert!(schema.is_empty());
    }

    #[test]
    fn resolution_is_deterministic() {
        let resolver = SchemaResolver::new(TimeZoneSetting::Naive);
        let a = resolver.resolve(&StubQuerySet::model(book_fields())).unwrap();
        let b = resolver.resolve(&StubQuerySet::model(book_fields())).unwrap();
        assert_eq!(a, b);
    }
}
