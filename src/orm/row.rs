use indexmap::IndexMap;
use serde_json::{Map, Value as JsonValue};

use crate::orm::Value;

/// One realized queryset row: column name -> scalar, in the order the
/// queryset yielded the keys.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Row(pub IndexMap<String, Value>);

impl Row {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&Value> { self.0.get(key) }

    /// Value for `key`, treating a missing key as null.
    pub fn value_or_null(&self, key: &str) -> &Value {
        static NULL: Value = Value::Null;
        self.0.get(key).unwrap_or(&NULL)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.0.insert(key.into(), value.into())
    }

    pub fn contains_key(&self, key: &str) -> bool { self.0.contains_key(key) }

    pub fn keys(&self) -> impl Iterator<Item = &String> { self.0.keys() }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> { self.0.iter() }

    pub fn len(&self) -> usize { self.0.len() }

    pub fn is_empty(&self) -> bool { self.0.is_empty() }

    /// Build a row from a JSON object without type hints.
    pub fn from_json(obj: &Map<String, JsonValue>) -> Row {
        obj.iter().map(|(k, v)| (k.clone(), Value::from_json(v))).collect()
    }

    pub fn to_json(&self) -> JsonValue {
        JsonValue::Object(self.0.iter().map(|(k, v)| (k.clone(), v.to_json())).collect())
    }
}

impl FromIterator<(String, Value)> for Row {
    fn from_iter<T: IntoIterator<Item = (String, Value)>>(iter: T) -> Self {
        Row(iter.into_iter().collect())
    }
}

impl<K: Into<String>, V: Into<Value>, const N: usize> From<[(K, V); N]> for Row {
    fn from(pairs: [(K, V); N]) -> Self {
        pairs.into_iter().map(|(k, v)| (k.into(), v.into())).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn missing_key_reads_as_null() {
        let row = Row::from([("a", 1)]);
        assert_eq!(row.value_or_null("a"), &Value::Int(1));
        assert_eq!(row.value_or_null("b"), &Value::Null);
    }

    #[test]
    fn json_object_converts_each_scalar() {
        let obj = json!({"z": 1, "a": "x"}).as_object().unwrap().clone();
        let row = Row::from_json(&obj);
        assert_eq!(row.len(), 2);
        assert_eq!(row.get("z"), Some(&Value::Int(1)));
        assert_eq!(row.get("a"), Some(&Value::String("x".into())));
    }
}
