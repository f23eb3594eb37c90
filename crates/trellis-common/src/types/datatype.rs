//! Physical data-type tags for column cells.
//!
//! The tag set is closed and its wire values are stable: tags appear in
//! serialized containers and in the textual schema form, so the numbering
//! must never change.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TrellisError;

/// Physical type of a column cell.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DataType {
    /// 8-bit signed integer.
    Int8 = 1,
    /// 16-bit signed integer.
    Int16 = 2,
    /// 32-bit signed integer.
    Int32 = 3,
    /// 64-bit signed integer.
    Int64 = 4,
    /// 8-bit unsigned integer.
    Uint8 = 5,
    /// 16-bit unsigned integer.
    Uint16 = 6,
    /// 32-bit unsigned integer.
    Uint32 = 7,
    /// 64-bit unsigned integer.
    Uint64 = 8,
    /// Signed byte-sized character.
    Char = 9,
    /// Unsigned byte-sized character.
    Uchar = 10,
    /// Boolean.
    Bool = 11,
    /// 32-bit floating point.
    Float = 12,
    /// 64-bit floating point.
    Double = 13,
    /// Calendar date, textual `YYYY-MM-DD`.
    Date = 14,
    /// UTF-8 string.
    String = 15,
}

/// Comparison backbone a data type maps onto.
///
/// Every predicate comparison is evaluated on one of these five
/// representations after widening.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeClass {
    /// Widens to `i64`.
    SignedInt,
    /// Widens to `u64`.
    UnsignedInt,
    /// Widens to `f64`.
    Float,
    /// Stays `bool`.
    Bool,
    /// Compared textually (dates as calendar dates, strings via regex
    /// for `like`).
    Text,
}

impl DataType {
    /// Decodes a wire tag.
    pub fn from_u8(tag: u8) -> Result<Self, TrellisError> {
        match tag {
            1 => Ok(DataType::Int8),
            2 => Ok(DataType::Int16),
            3 => Ok(DataType::Int32),
            4 => Ok(DataType::Int64),
            5 => Ok(DataType::Uint8),
            6 => Ok(DataType::Uint16),
            7 => Ok(DataType::Uint32),
            8 => Ok(DataType::Uint64),
            9 => Ok(DataType::Char),
            10 => Ok(DataType::Uchar),
            11 => Ok(DataType::Bool),
            12 => Ok(DataType::Float),
            13 => Ok(DataType::Double),
            14 => Ok(DataType::Date),
            15 => Ok(DataType::String),
            _ => Err(TrellisError::UnknownDataType { tag }),
        }
    }

    /// Returns the wire tag.
    #[inline]
    pub const fn as_u8(self) -> u8 {
        self as u8
    }

    /// Returns the comparison backbone for this type.
    pub const fn class(self) -> TypeClass {
        match self {
            DataType::Int8 | DataType::Int16 | DataType::Int32 | DataType::Int64
            | DataType::Char => TypeClass::SignedInt,
            DataType::Uint8 | DataType::Uint16 | DataType::Uint32 | DataType::Uint64
            | DataType::Uchar => TypeClass::UnsignedInt,
            DataType::Float | DataType::Double => TypeClass::Float,
            DataType::Bool => TypeClass::Bool,
            DataType::Date | DataType::String => TypeClass::Text,
        }
    }

    /// Fixed encoded width of a cell of this type, or `None` for
    /// variable-length types.
    pub const fn fixed_width(self) -> Option<usize> {
        match self {
            DataType::Int8 | DataType::Uint8 | DataType::Char | DataType::Uchar
            | DataType::Bool => Some(1),
            DataType::Int16 | DataType::Uint16 => Some(2),
            DataType::Int32 | DataType::Uint32 | DataType::Float => Some(4),
            DataType::Int64 | DataType::Uint64 | DataType::Double => Some(8),
            DataType::Date | DataType::String => None,
        }
    }

    /// Number of decimal characters an index-key value of this type
    /// occupies, or `None` when the type cannot back an index key.
    ///
    /// The widths keep byte-lexicographic order equal to numeric order
    /// within one type width: 1 char covers a bit, 3 cover a byte,
    /// 5 cover 16 bits, 10 cover 32 bits, 20 cover the full `u64` range.
    pub const fn key_width(self) -> Option<usize> {
        match self {
            DataType::Bool => Some(1),
            DataType::Int8 | DataType::Uint8 | DataType::Char | DataType::Uchar => Some(3),
            DataType::Int16 | DataType::Uint16 => Some(5),
            DataType::Int32 | DataType::Uint32 => Some(10),
            DataType::Int64 | DataType::Uint64 => Some(20),
            DataType::Float | DataType::Double | DataType::Date | DataType::String => None,
        }
    }
}

impl fmt::Display for DataType {
    /// Renders the decimal wire tag, the form used in schema text.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_u8())
    }
}

impl FromStr for DataType {
    type Err = TrellisError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let tag: u8 = s
            .trim()
            .parse()
            .map_err(|_| TrellisError::UnknownDataType { tag: 0 })?;
        DataType::from_u8(tag)
    }
}

/// Container format tag carried in every serialized object.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FormatType {
    /// Row-oriented container: header + per-row records.
    Row = 1,
    /// Columnar container: record-batch stream with schema metadata.
    Columnar = 2,
}

impl FormatType {
    /// Decodes a wire tag.
    pub fn from_u8(tag: u8) -> Result<Self, TrellisError> {
        match tag {
            1 => Ok(FormatType::Row),
            2 => Ok(FormatType::Columnar),
            _ => Err(TrellisError::UnknownFormatType { tag }),
        }
    }

    /// Returns the wire tag.
    #[inline]
    pub const fn as_u8(self) -> u8 {
        self as u8
    }
}
