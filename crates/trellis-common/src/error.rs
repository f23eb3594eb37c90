//! Error handling for Trellis.
//!
//! One unified error type is shared by every crate in the workspace, with
//! a stable [`ErrorCode`] for the closed taxonomy callers match on
//! programmatically. Per-row errors recorded during a scan carry the code
//! of the last failure alongside an accumulated message; see the row
//! executor for that policy.

use thiserror::Error;

use crate::types::DataType;

/// Result type alias for Trellis operations.
pub type TrellisResult<T> = std::result::Result<T, TrellisError>;

/// Stable error codes for categorizing failures.
///
/// Codes are wire-visible (a scan response carries the code of the last
/// per-row failure), so the numbering must not change across versions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u16)]
pub enum ErrorCode {
    /// Schema text decoded to zero column descriptors.
    EmptySchema = 1,
    /// A column-descriptor line had the wrong number of fields.
    BadColInfoFormat = 2,
    /// A requested column name is absent from the schema.
    RequestedColNotPresent = 3,
    /// A projected column index lies outside the table's column range.
    RequestedColIndexOOB = 4,
    /// A cell carried a type the operation cannot handle.
    UnsupportedDataType = 5,
    /// A type tag outside the closed set was encountered.
    UnknownDataType = 6,
    /// An aggregate was requested over a non-numeric column type.
    UnsupportedAggDataType = 7,
    /// An operator token outside the closed set was encountered.
    OpNotRecognized = 8,
    /// No comparison is defined for the operator/type combination.
    ComparisonNotDefined = 9,
    /// An explicit row number exceeds the container's row count.
    RowIndexOOB = 10,
    /// An index key was requested over a column type with no
    /// lexicographic-safe encoding.
    IndexKeyUnsupportedColType = 11,
    /// Columnar tables with differing schemas cannot be concatenated.
    TableConcatSchemaMismatch = 12,
}

impl ErrorCode {
    /// Returns the numeric code.
    #[inline]
    pub const fn as_u16(self) -> u16 {
        self as u16
    }
}

/// The unified error type for Trellis operations.
#[derive(Debug, Error)]
pub enum TrellisError {
    /// Schema text contained no column descriptors.
    #[error("schema text contains no column descriptors")]
    EmptySchema,

    /// A descriptor line did not split into the expected field count.
    #[error("bad column descriptor {line:?}: expected {expected} fields, found {found}")]
    BadColInfoFormat {
        line: String,
        expected: usize,
        found: usize,
    },

    /// A requested column is not in the reference schema.
    #[error("column {name:?} not present in schema")]
    ColNotPresent { name: String },

    /// A projected column index is outside the table's column range.
    #[error("table {table:?}: rid={rid} col.idx={idx} out of bounds")]
    ColIndexOOB { table: String, rid: i64, idx: i32 },

    /// The operation cannot handle this cell type.
    #[error("unsupported data type {dtype:?}")]
    UnsupportedDataType { dtype: DataType },

    /// A wire tag outside the closed data-type set.
    #[error("unknown data type tag {tag}")]
    UnknownDataType { tag: u8 },

    /// A wire tag outside the closed container-format set.
    #[error("unknown container format tag {tag}")]
    UnknownFormatType { tag: u8 },

    /// Aggregates are only defined over the numeric backbones.
    #[error("aggregate not defined over data type {dtype:?}")]
    UnsupportedAggDataType { dtype: DataType },

    /// An operator token outside the closed set.
    #[error("operator {op:?} not recognized")]
    OpNotRecognized { op: String },

    /// No comparison defined for this operator/type combination.
    #[error("comparison not defined for op {op:?} on {dtype:?}")]
    ComparisonNotDefined { op: String, dtype: DataType },

    /// An explicit row number beyond the container's rows.
    #[error("row index {rnum} out of bounds: container has {nrows} rows")]
    RowIndexOOB { rnum: u32, nrows: u32 },

    /// Index keys are only defined over fixed-width integer types.
    #[error("index key not supported for column type {dtype:?}")]
    IndexKeyUnsupportedColType { dtype: DataType },

    /// Concatenation requires identical schemas.
    #[error("cannot concatenate columnar tables with differing schemas")]
    TableConcatSchemaMismatch,

    /// A predicate item did not split into a `col,op,val` triple.
    #[error("bad predicate item {item:?}: expected col,op,val")]
    BadPredicateFormat { item: String },

    /// A predicate literal failed to parse as the column's type.
    #[error("predicate value {value:?} does not parse as {dtype:?}")]
    PredicateValue { value: String, dtype: DataType },

    /// The input buffer ended before a complete structure was decoded.
    #[error("truncated container: {reason}")]
    Truncated { reason: String },

    /// The input buffer does not start with the expected magic.
    #[error("bad container magic: expected {expected:#010x}, found {found:#010x}")]
    BadMagic { expected: u32, found: u32 },

    /// A decoded field was internally inconsistent.
    #[error("corrupt container: {reason}")]
    Corrupt { reason: String },
}

impl TrellisError {
    /// Creates a truncated-container error.
    pub fn truncated(reason: impl Into<String>) -> Self {
        Self::Truncated {
            reason: reason.into(),
        }
    }

    /// Creates a corrupt-container error.
    pub fn corrupt(reason: impl Into<String>) -> Self {
        Self::Corrupt {
            reason: reason.into(),
        }
    }

    /// Maps this error onto the stable code taxonomy.
    ///
    /// Decode failures (`Truncated`, `BadMagic`, `Corrupt`) have no code:
    /// they are fatal to the request rather than recordable per row.
    pub fn code(&self) -> Option<ErrorCode> {
        match self {
            Self::EmptySchema => Some(ErrorCode::EmptySchema),
            Self::BadColInfoFormat { .. } => Some(ErrorCode::BadColInfoFormat),
            Self::ColNotPresent { .. } => Some(ErrorCode::RequestedColNotPresent),
            Self::ColIndexOOB { .. } => Some(ErrorCode::RequestedColIndexOOB),
            Self::UnsupportedDataType { .. } => Some(ErrorCode::UnsupportedDataType),
            Self::UnknownDataType { .. } | Self::UnknownFormatType { .. } => {
                Some(ErrorCode::UnknownDataType)
            }
            Self::UnsupportedAggDataType { .. } => Some(ErrorCode::UnsupportedAggDataType),
            Self::OpNotRecognized { .. } => Some(ErrorCode::OpNotRecognized),
            Self::ComparisonNotDefined { .. } | Self::PredicateValue { .. } => {
                Some(ErrorCode::ComparisonNotDefined)
            }
            Self::RowIndexOOB { .. } => Some(ErrorCode::RowIndexOOB),
            Self::IndexKeyUnsupportedColType { .. } => {
                Some(ErrorCode::IndexKeyUnsupportedColType)
            }
            Self::TableConcatSchemaMismatch => Some(ErrorCode::TableConcatSchemaMismatch),
            Self::BadPredicateFormat { .. }
            | Self::Truncated { .. }
            | Self::BadMagic { .. }
            | Self::Corrupt { .. } => None,
        }
    }

    /// Returns true if a scan may record this error and keep going.
    ///
    /// Only per-row projection failures are recoverable; everything else
    /// aborts the request.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::ColIndexOOB { .. } | Self::UnsupportedDataType { .. }
        )
    }
}
