//! The Trellis query layer.
//!
//! Evaluates pushdown requests against serialized containers: a request
//! names a projected output schema and a predicate chain; the executor
//! decodes the object's payload, filters rows, projects columns,
//! optionally reduces aggregates, and re-encodes a fresh container in the
//! same format.
//!
//! - [`predicate`]: typed comparison atoms, logical chaining, aggregates
//! - [`executor`]: the row-format and columnar-format executors
//! - [`index`]: composite secondary-index key codec
//! - [`print`]: diagnostic text and CSV rendering
//!
//! The schema model lives in [`trellis_common::schema`] and is re-exported
//! here for convenience.

pub mod executor;
pub mod index;
pub mod predicate;
pub mod print;

pub use executor::{process_columnar, process_rows, ScanOutput};
pub use predicate::{
    apply_predicates, check_predicate_ops, check_predicate_ops_all_equality,
    check_predicate_ops_all_include_equality, colnames_from_preds, preds_from_string,
    preds_to_string, ChainOp, OpType, PredValue, Predicate,
};
pub use trellis_common::schema::{ColInfo, Schema};
