//! Core data types for Trellis.

mod datatype;
mod value;

pub use datatype::{DataType, FormatType, TypeClass};
pub use value::Value;
