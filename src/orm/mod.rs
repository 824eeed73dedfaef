pub mod value;
pub use value::*;

mod json_coerce;

pub mod row;
pub use row::*;

pub mod field_kind;
pub use field_kind::*;

pub mod field_descriptor;
pub use field_descriptor::*;

pub mod metadata;
pub use metadata::*;

pub mod lookup;
pub use lookup::*;

pub mod queryset;
pub use queryset::*;
