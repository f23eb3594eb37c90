//! Shared foundation for the Trellis pushdown query executor.
//!
//! This crate provides the pieces every other Trellis crate builds on:
//!
//! - [`types`]: the closed data-type tag set and the runtime cell value
//! - [`schema`]: column descriptors and the textual schema codec
//! - [`constants`]: wire constants, reserved column indices, delimiters
//! - [`error`]: the unified error type and stable error codes

pub mod constants;
pub mod error;
pub mod schema;
pub mod types;

pub use error::{ErrorCode, TrellisError, TrellisResult};
pub use schema::{ColInfo, Schema};
pub use types::{DataType, FormatType, TypeClass, Value};
