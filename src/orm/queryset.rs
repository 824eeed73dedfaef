use crate::orm::{FieldMetadataProvider, Row};

/// Error raised by an ORM adapter while producing rows. Carried through the
/// conversion untouched.
pub type UpstreamError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Iterator over the rows of a queryset, each step possibly failing.
pub type RowIter<'a> = Box<dyn Iterator<Item = Result<Row, UpstreamError>> + 'a>;

/// The slice of a queryset the conversion needs: how it was shaped, and its
/// rows.
///
/// Implementations must not mutate the queryset itself while iterating;
/// calling [`QuerySet::rows`] twice over unchanged data yields the same rows.
pub trait QuerySet {
    /// Field metadata of the originating model, if the queryset has one.
    fn metadata(&self) -> Option<&dyn FieldMetadataProvider>;

    /// Names passed to an explicit column projection (`values(...)`), or
    /// `None` when the queryset yields full model rows.
    fn projection(&self) -> Option<&[String]>;

    /// Aliases of computed annotation columns, in declaration order.
    fn annotation_names(&self) -> Vec<String>;

    /// Start a fresh pass over the rows.
    fn rows(&self) -> RowIter<'_>;
}

impl<Q: QuerySet + ?Sized> QuerySet for &Q {
    fn metadata(&self) -> Option<&dyn FieldMetadataProvider> {
        (**self).metadata()
    }

    fn projection(&self) -> Option<&[String]> {
        (**self).projection()
    }

    fn annotation_names(&self) -> Vec<String> {
        (**self).annotation_names()
    }

    fn rows(&self) -> RowIter<'_> {
        (**self).rows()
    }
}

/// A queryset over rows that are already in memory and carry no model
/// metadata. Every column is left to value inference.
#[derive(Debug, Clone, Default)]
pub struct RowsQuerySet {
    rows: Vec<Row>,
}

impl RowsQuerySet {
    pub fn new(rows: Vec<Row>) -> Self {
        Self { rows }
    }
}

impl QuerySet for RowsQuerySet {
    fn metadata(&self) -> Option<&dyn FieldMetadataProvider> {
        None
    }

    fn projection(&self) -> Option<&[String]> {
        None
    }

    fn annotation_names(&self) -> Vec<String> {
        Vec::new()
    }

    fn rows(&self) -> RowIter<'_> {
        Box::new(self.rows.iter().cloned().map(Ok::<Row, UpstreamError>))
    }
}
