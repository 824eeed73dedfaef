use std::{collections::HashMap, sync::{Arc, PoisonError, RwLock}};

use crate::memory::{MemoryError, MemoryQuerySet, Model};

/// Shared, lockable handle to one registered model.
pub type ModelHandle = Arc<RwLock<Model>>;

/// Set of models that can reach each other through relations.
#[derive(Debug, Clone, Default)]
pub struct ModelRegistry {
    models: Arc<RwLock<HashMap<String, ModelHandle>>>,
}

impl ModelRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `model` under its (lowercased) name, replacing any model of
    /// the same name.
    pub fn register(&self, model: Model) -> ModelHandle {
        let name = model.name().to_string();
        let handle = Arc::new(RwLock::new(model));
        self.models
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(name, Arc::clone(&handle));
        handle
    }

    pub fn get(&self, name: &str) -> Option<ModelHandle> {
        self.models
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&name.to_ascii_lowercase())
            .map(Arc::clone)
    }

    pub fn list_models(&self) -> Vec<String> {
        let mut names = self
            .models
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect::<Vec<_>>();
        names.sort();
        names
    }

    /// Unrestricted queryset over every row of the named model.
    pub fn objects(&self, name: &str) -> Result<MemoryQuerySet, MemoryError> {
        let model = self.get(name).ok_or_else(|| MemoryError::UnknownModel(name.to_string()))?;
        Ok(MemoryQuerySet::new(model).with_registry(self.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn models_are_found_case_insensitively() {
        let registry = ModelRegistry::new();
        registry.register(Model::new("Author"));
        registry.register(Model::new("Book"));
        assert!(registry.get("AUTHOR").is_some());
        assert_eq!(registry.list_models(), vec!["author", "book"]);
        assert!(registry.objects("book").is_ok());
        assert_eq!(
            registry.objects("shelf").unwrap_err(),
            MemoryError::UnknownModel("shelf".into())
        );
    }
}
