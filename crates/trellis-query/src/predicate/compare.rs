//! Typed comparison functions.
//!
//! Comparisons are defined once per backbone and reused by every
//! component that filters rows. The logical operators follow truthiness
//! of the raw values; bitwise operators are defined on the unsigned and
//! boolean backbones only.

use chrono::NaiveDate;
use regex::Regex;

use trellis_common::{DataType, TrellisError, TrellisResult};

use super::OpType;

fn not_defined(op: OpType, dtype: DataType) -> TrellisError {
    TrellisError::ComparisonNotDefined {
        op: op.as_token().to_string(),
        dtype,
    }
}

pub(crate) fn compare_i64(v1: i64, v2: i64, op: OpType, dtype: DataType) -> TrellisResult<bool> {
    let pass = match op {
        OpType::Lt => v1 < v2,
        OpType::Gt => v1 > v2,
        OpType::Eq => v1 == v2,
        OpType::Ne => v1 != v2,
        OpType::Leq => v1 <= v2,
        OpType::Geq => v1 >= v2,
        OpType::LogicalOr => v1 != 0 || v2 != 0,
        OpType::LogicalAnd => v1 != 0 && v2 != 0,
        OpType::LogicalNot => v1 == 0 && v2 == 0,
        OpType::LogicalNor => !(v1 != 0 || v2 != 0),
        OpType::LogicalNand => !(v1 != 0 && v2 != 0),
        OpType::LogicalXor => (v1 != 0 || v2 != 0) && v1 != v2,
        _ => return Err(not_defined(op, dtype)),
    };
    Ok(pass)
}

pub(crate) fn compare_u64(v1: u64, v2: u64, op: OpType, dtype: DataType) -> TrellisResult<bool> {
    let pass = match op {
        OpType::Lt => v1 < v2,
        OpType::Gt => v1 > v2,
        OpType::Eq => v1 == v2,
        OpType::Ne => v1 != v2,
        OpType::Leq => v1 <= v2,
        OpType::Geq => v1 >= v2,
        OpType::LogicalOr => v1 != 0 || v2 != 0,
        OpType::LogicalAnd => v1 != 0 && v2 != 0,
        OpType::LogicalNot => v1 == 0 && v2 == 0,
        OpType::LogicalNor => !(v1 != 0 || v2 != 0),
        OpType::LogicalNand => !(v1 != 0 && v2 != 0),
        OpType::LogicalXor => (v1 != 0 || v2 != 0) && v1 != v2,
        OpType::BitwiseAnd => v1 & v2 != 0,
        OpType::BitwiseOr => v1 | v2 != 0,
        _ => return Err(not_defined(op, dtype)),
    };
    Ok(pass)
}

pub(crate) fn compare_f64(v1: f64, v2: f64, op: OpType, dtype: DataType) -> TrellisResult<bool> {
    let pass = match op {
        OpType::Lt => v1 < v2,
        OpType::Gt => v1 > v2,
        OpType::Eq => v1 == v2,
        OpType::Ne => v1 != v2,
        OpType::Leq => v1 <= v2,
        OpType::Geq => v1 >= v2,
        _ => return Err(not_defined(op, dtype)),
    };
    Ok(pass)
}

pub(crate) fn compare_bool(v1: bool, v2: bool, op: OpType, dtype: DataType) -> TrellisResult<bool> {
    let pass = match op {
        OpType::Lt => !v1 & v2,
        OpType::Gt => v1 & !v2,
        OpType::Eq => v1 == v2,
        OpType::Ne => v1 != v2,
        OpType::Leq => v1 <= v2,
        OpType::Geq => v1 >= v2,
        OpType::LogicalOr | OpType::BitwiseOr => v1 || v2,
        OpType::LogicalAnd | OpType::BitwiseAnd => v1 && v2,
        OpType::LogicalNot => !v1 && !v2,
        OpType::LogicalNor => !(v1 || v2),
        OpType::LogicalNand => !(v1 && v2),
        OpType::LogicalXor => v1 ^ v2,
        _ => return Err(not_defined(op, dtype)),
    };
    Ok(pass)
}

fn parse_date(s: &str, dtype: DataType) -> TrellisResult<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").map_err(|_| TrellisError::PredicateValue {
        value: s.to_string(),
        dtype,
    })
}

/// Compares textual operands: calendar-date order for `Date` columns,
/// regex partial match for `like` on string columns.
pub(crate) fn compare_text(
    v1: &str,
    v2: &str,
    op: OpType,
    dtype: DataType,
    like_re: Option<&Regex>,
) -> TrellisResult<bool> {
    match dtype {
        DataType::Date => {
            let d1 = parse_date(v1, dtype)?;
            let d2 = parse_date(v2, dtype)?;
            let pass = match op {
                OpType::Before | OpType::Lt => d1 < d2,
                OpType::After | OpType::Gt => d1 > d2,
                OpType::Leq => d1 <= d2,
                OpType::Geq => d1 >= d2,
                OpType::Eq => d1 == d2,
                OpType::Ne => d1 != d2,
                _ => return Err(not_defined(op, dtype)),
            };
            Ok(pass)
        }
        DataType::String => match op {
            OpType::Like => {
                // Compiled at predicate construction; fall back for
                // direct calls.
                match like_re {
                    Some(re) => Ok(re.is_match(v1)),
                    None => {
                        let re = Regex::new(v2).map_err(|_| TrellisError::PredicateValue {
                            value: v2.to_string(),
                            dtype,
                        })?;
                        Ok(re.is_match(v1))
                    }
                }
            }
            OpType::Eq => Ok(v1 == v2),
            OpType::Ne => Ok(v1 != v2),
            _ => Err(not_defined(op, dtype)),
        },
        _ => Err(not_defined(op, dtype)),
    }
}

/// Folds one passing row's cell into a running aggregate.
pub(crate) fn compute_agg_i64(cur: i64, col: i64, op: OpType) -> i64 {
    match op {
        OpType::Min => cur.min(col),
        OpType::Max => cur.max(col),
        OpType::Sum => cur.wrapping_add(col),
        OpType::Cnt => cur.wrapping_add(1),
        _ => cur,
    }
}

pub(crate) fn compute_agg_u64(cur: u64, col: u64, op: OpType) -> u64 {
    match op {
        OpType::Min => cur.min(col),
        OpType::Max => cur.max(col),
        OpType::Sum => cur.wrapping_add(col),
        OpType::Cnt => cur.wrapping_add(1),
        _ => cur,
    }
}

pub(crate) fn compute_agg_f64(cur: f64, col: f64, op: OpType) -> f64 {
    match op {
        OpType::Min => cur.min(col),
        OpType::Max => cur.max(col),
        OpType::Sum => cur + col,
        OpType::Cnt => cur + 1.0,
        _ => cur,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signed_orderings() {
        assert!(compare_i64(1, 2, OpType::Lt, DataType::Int64).unwrap());
        assert!(compare_i64(-1, -1, OpType::Eq, DataType::Int64).unwrap());
        assert!(compare_i64(5, 2, OpType::Geq, DataType::Int64).unwrap());
        assert!(!compare_i64(5, 5, OpType::Ne, DataType::Int64).unwrap());
    }

    #[test]
    fn test_signed_bitwise_not_defined() {
        assert!(compare_i64(1, 1, OpType::BitwiseAnd, DataType::Int64).is_err());
    }

    #[test]
    fn test_unsigned_bitwise() {
        assert!(compare_u64(0b1100, 0b0100, OpType::BitwiseAnd, DataType::Uint64).unwrap());
        assert!(!compare_u64(0b1000, 0b0100, OpType::BitwiseAnd, DataType::Uint64).unwrap());
        assert!(compare_u64(0, 0b0100, OpType::BitwiseOr, DataType::Uint64).unwrap());
    }

    #[test]
    fn test_logical_chaining_ops() {
        assert!(compare_i64(0, 0, OpType::LogicalNor, DataType::Int64).unwrap());
        assert!(compare_i64(1, 0, OpType::LogicalNand, DataType::Int64).unwrap());
        assert!(compare_i64(1, 0, OpType::LogicalXor, DataType::Int64).unwrap());
        assert!(!compare_i64(1, 1, OpType::LogicalXor, DataType::Int64).unwrap());
    }

    #[test]
    fn test_float_orderings() {
        assert!(compare_f64(1.5, 2.0, OpType::Lt, DataType::Double).unwrap());
        assert!(compare_f64(2.0, 2.0, OpType::Leq, DataType::Double).unwrap());
        assert!(compare_f64(1.5, 1.5, OpType::Lt, DataType::Double).is_ok());
        assert!(compare_f64(1.0, 1.0, OpType::LogicalAnd, DataType::Double).is_err());
    }

    #[test]
    fn test_date_order() {
        let d1 = "1995-01-27";
        let d2 = "1996-03-02";
        assert!(compare_text(d1, d2, OpType::Before, DataType::Date, None).unwrap());
        assert!(compare_text(d2, d1, OpType::After, DataType::Date, None).unwrap());
        assert!(compare_text(d1, d1, OpType::Eq, DataType::Date, None).unwrap());
        assert!(compare_text(d1, d2, OpType::Between, DataType::Date, None).is_err());
    }

    #[test]
    fn test_bad_date_literal() {
        let err = compare_text("not-a-date", "1995-01-27", OpType::Eq, DataType::Date, None)
            .unwrap_err();
        assert!(matches!(err, TrellisError::PredicateValue { .. }));
    }

    #[test]
    fn test_like_partial_match() {
        assert!(compare_text("hello world", "lo wo", OpType::Like, DataType::String, None)
            .unwrap());
        assert!(
            !compare_text("hello world", "^world", OpType::Like, DataType::String, None).unwrap()
        );
    }

    #[test]
    fn test_agg_folding() {
        assert_eq!(compute_agg_i64(5, 3, OpType::Min), 3);
        assert_eq!(compute_agg_i64(5, 3, OpType::Max), 5);
        assert_eq!(compute_agg_i64(5, 3, OpType::Sum), 8);
        assert_eq!(compute_agg_i64(5, 3, OpType::Cnt), 6);
        assert_eq!(compute_agg_f64(1.5, 2.5, OpType::Sum), 4.0);
        assert_eq!(compute_agg_u64(7, 2, OpType::Min), 2);
    }
}
