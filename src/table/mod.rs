pub mod column;
pub use column::*;

pub mod builder;
pub use builder::*;

pub mod inference;
pub use inference::*;

pub mod columnar;
pub use columnar::*;
