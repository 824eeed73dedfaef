use indexmap::IndexMap;

use crate::schema::DataType;

/// Column types known before any row is read.
///
/// Holds an entry only for columns backed by a resolvable field descriptor.
/// A column observed in the rows but absent here is left to inference; an
/// entry whose column never shows up in the rows is ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PartialSchema {
    /// Map of column name -> pinned type
    pub fields: IndexMap<String, DataType>,
}

impl PartialSchema {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, column: &str) -> Option<&DataType> {
        self.fields.get(column)
    }

    pub fn contains(&self, column: &str) -> bool {
        self.fields.contains_key(column)
    }

    pub fn insert(&mut self, column: &str, dtype: DataType) -> Option<DataType> {
        self.fields.insert(column.to_string(), dtype)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn columns(&self) -> impl Iterator<Item = &String> {
        self.fields.keys()
    }

    /// Overlay explicit types on top of this schema; `overrides` win.
    pub fn merge_overrides(&mut self, overrides: &IndexMap<String, DataType>) {
        for (column, dtype) in overrides {
            self.fields.insert(column.clone(), dtype.clone());
        }
    }
}

impl FromIterator<(String, DataType)> for PartialSchema {
    fn from_iter<T: IntoIterator<Item = (String, DataType)>>(iter: T) -> Self {
        PartialSchema { fields: iter.into_iter().collect() }
    }
}
