//! Serialized container formats for Trellis.
//!
//! Objects hold tabular data in one of two binary layouts:
//!
//! - [`row`]: a row-oriented container: a header followed by per-row
//!   records, each carrying a record id, nullbits, and a cell region.
//!   Decoding returns borrowed views into the input buffer; cell payloads
//!   are never copied on decode.
//! - [`columnar`]: a columnar container: a record-batch stream whose
//!   schema metadata carries the table's identity and textual schema.
//!
//! [`transform`] converts between the two layouts, preserving record ids,
//! nullbits, and tombstones.

pub mod columnar;
pub mod row;
pub mod transform;
mod wire;

pub use columnar::{ColumnArray, Table};
pub use row::{RecordBuilder, RecordView, RootBuilder, RootView};
pub use transform::{columnar_to_row, row_to_columnar};
