use std::num::NonZeroUsize;

use tracing::debug_span;

use crate::{
    config::ConvertConfig,
    error::Result,
    materializer::TableMaterializer,
    orm::QuerySet,
    schema::SchemaResolver,
    table::Table,
};

/// Convert a queryset into a table with the default configuration.
///
/// `infer_schema_length` bounds the rows sampled for columns without declared
/// metadata; `None` samples every realized row.
pub fn convert<Q: QuerySet + ?Sized>(queryset: &Q, infer_schema_length: Option<NonZeroUsize>) -> Result<Table> {
    let config = ConvertConfig { infer_schema_length: infer_schema_length.into(), ..ConvertConfig::default() };
    convert_with_config(queryset, &config)
}

/// Resolve the declared schema, then drain and materialize the rows.
pub fn convert_with_config<Q: QuerySet + ?Sized>(queryset: &Q, config: &ConvertConfig) -> Result<Table> {
    let _span = debug_span!("convert", infer_schema_length = ?config.infer_schema_length).entered();

    let partial_schema = SchemaResolver::new(config.time_zone.clone()).resolve(queryset)?;
    TableMaterializer::new(config.infer_schema_length)
        .with_overrides(config.schema_overrides.clone())
        .materialize(queryset, &partial_schema)
}

/// Method-style access to [`convert_with_config`] for any queryset.
pub trait ToTable {
    fn to_table(&self, config: &ConvertConfig) -> Result<Table>;
}

impl<Q: QuerySet> ToTable for Q {
    fn to_table(&self, config: &ConvertConfig) -> Result<Table> {
        convert_with_config(self, config)
    }
}
