use once_cell::sync::Lazy;
use regex::Regex;

/// Separator between path segments of a relation traversal (`author__name`).
pub const LOOKUP_SEP: &str = "__";

static IDENTIFIER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("identifier pattern is valid")
});

/// A column name split into its relation-traversal segments.
///
/// `title` has one segment; `author__name` has two and designates a value
/// reached through the `author` relation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LookupPath {
    pub segments: Vec<String>,
}

impl LookupPath {
    /// Split a projected name. Returns `None` when any segment is empty or
    /// not a valid identifier.
    pub fn parse(name: &str) -> Option<LookupPath> {
        let segments = name.split(LOOKUP_SEP).map(str::to_string).collect::<Vec<_>>();
        if segments.iter().all(|s| IDENTIFIER.is_match(s)) {
            Some(LookupPath { segments })
        } else {
            None
        }
    }

    pub fn is_traversal(&self) -> bool {
        self.segments.len() > 1
    }

    /// Relation hops, excluding the final attribute.
    pub fn relations(&self) -> &[String] {
        &self.segments[..self.segments.len() - 1]
    }

    pub fn attribute(&self) -> &str {
        &self.segments[self.segments.len() - 1]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_names_have_one_segment() {
        let p = LookupPath::parse("char_field").unwrap();
        assert!(!p.is_traversal());
        assert_eq!(p.attribute(), "char_field");
        assert!(p.relations().is_empty());
    }

    #[test]
    fn traversal_splits_on_double_underscore() {
        let p = LookupPath::parse("book__author__name").unwrap();
        assert!(p.is_traversal());
        assert_eq!(p.relations(), &["book".to_string(), "author".to_string()]);
        assert_eq!(p.attribute(), "name");
    }

    #[test]
    fn rejects_malformed_names() {
        assert!(LookupPath::parse("").is_none());
        assert!(LookupPath::parse("author__").is_none());
        assert!(LookupPath::parse("__name").is_none());
        assert!(LookupPath::parse("1st").is_none());
        assert!(LookupPath::parse("has space").is_none());
    }
}
