pub mod orm;
pub use orm::{FieldDescriptor, FieldKind, FieldMetadataProvider, QuerySet, Row, RowsQuerySet, Value};

pub mod schema;
pub use schema::{DataType, PartialSchema, SchemaResolver};

pub mod table;
pub use table::{Column, Table, TableSchema};

pub mod config;
pub use config::{ConvertConfig, InferSchemaLength, TimeZoneSetting};

pub mod error;
pub use error::{ConvertError, Result};

pub mod materializer;
pub use materializer::TableMaterializer;

pub mod convert;
pub use convert::{ToTable, convert, convert_with_config};

pub mod memory;
