use std::sync::{PoisonError, RwLock};

use indexmap::IndexMap;

use crate::orm::FieldDescriptor;

/// Capability to enumerate a model's declared fields.
///
/// Implemented once per ORM adapter; the schema resolver only ever reads
/// field metadata through this trait.
pub trait FieldMetadataProvider {
    /// Declared fields keyed by field name, in declaration order.
    fn fields_by_name(&self) -> IndexMap<String, FieldDescriptor>;

    /// Look a field up by attribute name or row key.
    fn field(&self, key: &str) -> Option<FieldDescriptor> {
        let fields = self.fields_by_name();
        if let Some(found) = fields.get(key) {
            return Some(found.clone());
        }
        fields.into_values().find(|f| f.answers_to(key))
    }
}

impl<T: FieldMetadataProvider> FieldMetadataProvider for RwLock<T> {
    fn fields_by_name(&self) -> IndexMap<String, FieldDescriptor> {
        self.read().unwrap_or_else(PoisonError::into_inner).fields_by_name()
    }
}

impl FieldMetadataProvider for IndexMap<String, FieldDescriptor> {
    fn fields_by_name(&self) -> IndexMap<String, FieldDescriptor> {
        self.clone()
    }
}

impl FieldMetadataProvider for Vec<FieldDescriptor> {
    fn fields_by_name(&self) -> IndexMap<String, FieldDescriptor> {
        self.iter().map(|f| (f.name.clone(), f.clone())).collect()
    }
}
