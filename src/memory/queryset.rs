use std::{
    fmt::Debug,
    sync::{Arc, PoisonError, RwLock, RwLockReadGuard},
};

use crate::{
    memory::{MemoryError, Model, ModelHandle, ModelRegistry},
    orm::{FieldMetadataProvider, LookupPath, QuerySet, Row, RowIter, UpstreamError, Value},
};

type AnnotationFn = dyn Fn(&Row) -> Value + Send + Sync;

/// A computed column: evaluated against the full stored row, so it may
/// reference fields outside the projection.
#[derive(Clone)]
pub struct Annotation {
    pub alias: String,
    expr: Arc<AnnotationFn>,
}

impl Annotation {
    pub fn evaluate(&self, row: &Row) -> Value {
        (self.expr)(row)
    }
}

impl Debug for Annotation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Annotation").field("alias", &self.alias).finish_non_exhaustive()
    }
}

/// Lazily evaluated query over one in-memory model.
///
/// Rows are produced fresh on every [`QuerySet::rows`] call. Without a
/// projection a row holds every column of the model; with `values(...)` it
/// holds exactly the projected names. Annotation columns follow in either
/// case.
#[derive(Debug, Clone)]
pub struct MemoryQuerySet {
    model: ModelHandle,
    registry: Option<ModelRegistry>,
    projection: Option<Vec<String>>,
    annotations: Vec<Annotation>,
}

fn read(model: &RwLock<Model>) -> RwLockReadGuard<'_, Model> {
    model.read().unwrap_or_else(PoisonError::into_inner)
}

impl MemoryQuerySet {
    pub fn new(model: ModelHandle) -> Self {
        Self { model, registry: None, projection: None, annotations: Vec::new() }
    }

    /// Registry used to follow relation traversals such as `author__name`.
    pub fn with_registry(mut self, registry: ModelRegistry) -> Self {
        self.registry = Some(registry);
        self
    }

    pub fn all(&self) -> Self {
        self.clone()
    }

    /// Restrict rows to the named fields or lookup paths.
    pub fn values(&self, names: &[&str]) -> Self {
        let mut qs = self.clone();
        qs.projection = Some(names.iter().map(|n| n.to_string()).collect());
        qs
    }

    /// Add a computed column named `alias`.
    pub fn annotate<F>(&self, alias: &str, expr: F) -> Self
    where
        F: Fn(&Row) -> Value + Send + Sync + 'static,
    {
        let mut qs = self.clone();
        qs.annotations.push(Annotation { alias: alias.to_string(), expr: Arc::new(expr) });
        qs
    }

    pub fn count(&self) -> usize {
        read(&self.model).count()
    }

    fn annotation(&self, alias: &str) -> Option<&Annotation> {
        self.annotations.iter().find(|a| a.alias == alias)
    }

    /// A projected name that is an annotation alias takes the annotation's
    /// value in its projected position.
    fn shape(&self, row: Row) -> Result<Row, MemoryError> {
        let mut out = match &self.projection {
            None => row.clone(),
            Some(names) => {
                let mut out = Row::new();
                for name in names {
                    let value = match self.annotation(name) {
                        Some(annotation) => annotation.evaluate(&row),
                        None => self.lookup(&row, name)?,
                    };
                    out.insert(name.clone(), value);
                }
                out
            }
        };
        let projected = self.projection.as_deref().unwrap_or_default();
        for annotation in self.annotations.iter().filter(|a| !projected.contains(&a.alias)) {
            out.insert(annotation.alias.clone(), annotation.evaluate(&row));
        }
        Ok(out)
    }

    /// Value of `name` for `row`, following relations hop by hop. A null or
    /// dangling relation yields null.
    fn lookup(&self, row: &Row, name: &str) -> Result<Value, MemoryError> {
        let unknown = |model: &str| MemoryError::UnknownField { model: model.to_string(), field: name.to_string() };
        let path = LookupPath::parse(name).ok_or_else(|| unknown(read(&self.model).name()))?;

        let mut model = Arc::clone(&self.model);
        let mut current = row.clone();
        for hop in path.relations() {
            let (key, target) = {
                let guard = read(&model);
                let field = guard.lookup_field(hop).ok_or_else(|| unknown(guard.name()))?;
                let target = field
                    .kind
                    .related_model()
                    .filter(|_| field.has_column())
                    .ok_or_else(|| MemoryError::NotARelation {
                        model: guard.name().to_string(),
                        field: hop.clone(),
                    })?
                    .to_string();
                (current.value_or_null(&field.column).clone(), target)
            };
            if key.is_null() {
                return Ok(Value::Null);
            }

            model = self
                .registry
                .as_ref()
                .and_then(|r| r.get(&target))
                .ok_or(MemoryError::UnknownModel(target))?;
            let related = read(&model).get_by_pk(&key).cloned();
            match related {
                Some(related) => current = related,
                None => return Ok(Value::Null),
            }
        }

        let guard = read(&model);
        let field = guard.lookup_field(path.attribute()).ok_or_else(|| unknown(guard.name()))?;
        Ok(current.value_or_null(&field.column).clone())
    }
}

impl QuerySet for MemoryQuerySet {
    fn metadata(&self) -> Option<&dyn FieldMetadataProvider> {
        Some(self.model.as_ref() as &dyn FieldMetadataProvider)
    }

    fn projection(&self) -> Option<&[String]> {
        self.projection.as_deref()
    }

    fn annotation_names(&self) -> Vec<String> {
        self.annotations.iter().map(|a| a.alias.clone()).collect()
    }

    fn rows(&self) -> RowIter<'_> {
        let stored = read(&self.model).rows().to_vec();
        Box::new(
            stored
                .into_iter()
                .map(move |row| self.shape(row).map_err(|e| Box::new(e) as UpstreamError)),
        )
    }
}
