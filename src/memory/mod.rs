pub mod error;
pub use error::*;

pub mod coerce;
pub use coerce::*;

pub mod model;
pub use model::*;

pub mod registry;
pub use registry::*;

pub mod queryset;
pub use queryset::*;
