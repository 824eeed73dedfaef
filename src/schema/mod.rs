pub mod data_type;
pub use data_type::*;

pub mod type_mapping;
pub use type_mapping::*;

pub mod partial_schema;
pub use partial_schema::*;

pub mod resolver;
pub use resolver::*;
