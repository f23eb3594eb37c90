//! The predicate model: typed comparison atoms, logical chaining, and
//! in-stream aggregation.
//!
//! A predicate chain is an ordered sequence of atoms. Non-aggregate atoms
//! filter rows; aggregate atoms (`min`/`max`/`sum`/`cnt`) carry a running
//! value that updates once per passing row and is emitted as a single
//! synthetic output row after the scan.

mod compare;
mod eval;
mod parse;

use std::fmt;

use regex::Regex;

use trellis_common::{DataType, TrellisError, TrellisResult, TypeClass};

pub use eval::apply_predicates;
pub use parse::{colnames_from_preds, preds_from_string, preds_to_string};

/// Operator codes. The token forms are wire constants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OpType {
    Lt,
    Gt,
    Eq,
    Ne,
    Leq,
    Geq,
    Add,
    Sub,
    Mul,
    Div,
    Min,
    Max,
    Sum,
    Cnt,
    Like,
    In,
    NotIn,
    Before,
    Between,
    After,
    LogicalOr,
    LogicalAnd,
    LogicalNot,
    LogicalNor,
    LogicalXor,
    LogicalNand,
    BitwiseAnd,
    BitwiseOr,
}

impl OpType {
    /// Resolves an operator token.
    pub fn from_token(op: &str) -> TrellisResult<Self> {
        let op_type = match op {
            "lt" => OpType::Lt,
            "gt" => OpType::Gt,
            "eq" => OpType::Eq,
            "ne" => OpType::Ne,
            "leq" => OpType::Leq,
            "geq" => OpType::Geq,
            "add" => OpType::Add,
            "sub" => OpType::Sub,
            "mul" => OpType::Mul,
            "div" => OpType::Div,
            "min" => OpType::Min,
            "max" => OpType::Max,
            "sum" => OpType::Sum,
            "cnt" => OpType::Cnt,
            "like" => OpType::Like,
            "in" => OpType::In,
            "not_in" => OpType::NotIn,
            "before" => OpType::Before,
            "between" => OpType::Between,
            "after" => OpType::After,
            "logical_or" => OpType::LogicalOr,
            "logical_and" => OpType::LogicalAnd,
            "logical_not" => OpType::LogicalNot,
            "logical_nor" => OpType::LogicalNor,
            "logical_xor" => OpType::LogicalXor,
            "logical_nand" => OpType::LogicalNand,
            "bitwise_and" => OpType::BitwiseAnd,
            "bitwise_or" => OpType::BitwiseOr,
            _ => {
                return Err(TrellisError::OpNotRecognized { op: op.to_string() });
            }
        };
        Ok(op_type)
    }

    /// Returns the wire token.
    pub const fn as_token(self) -> &'static str {
        match self {
            OpType::Lt => "lt",
            OpType::Gt => "gt",
            OpType::Eq => "eq",
            OpType::Ne => "ne",
            OpType::Leq => "leq",
            OpType::Geq => "geq",
            OpType::Add => "add",
            OpType::Sub => "sub",
            OpType::Mul => "mul",
            OpType::Div => "div",
            OpType::Min => "min",
            OpType::Max => "max",
            OpType::Sum => "sum",
            OpType::Cnt => "cnt",
            OpType::Like => "like",
            OpType::In => "in",
            OpType::NotIn => "not_in",
            OpType::Before => "before",
            OpType::Between => "between",
            OpType::After => "after",
            OpType::LogicalOr => "logical_or",
            OpType::LogicalAnd => "logical_and",
            OpType::LogicalNot => "logical_not",
            OpType::LogicalNor => "logical_nor",
            OpType::LogicalXor => "logical_xor",
            OpType::LogicalNand => "logical_nand",
            OpType::BitwiseAnd => "bitwise_and",
            OpType::BitwiseOr => "bitwise_or",
        }
    }

    /// True for the reduction operators that accumulate across rows.
    pub const fn is_global_agg(self) -> bool {
        matches!(self, OpType::Min | OpType::Max | OpType::Sum | OpType::Cnt)
    }
}

impl fmt::Display for OpType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_token())
    }
}

/// How an atom's verdict folds into the row verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChainOp {
    /// Row passes only if every AND atom passes (the default).
    #[default]
    And,
    /// Row passes if any OR atom passes.
    Or,
}

/// A predicate literal, carried on the comparison backbone of the target
/// column's type.
#[derive(Debug, Clone, PartialEq)]
pub enum PredValue {
    /// Signed integer backbone.
    Int(i64),
    /// Unsigned integer backbone.
    Uint(u64),
    /// Floating-point backbone.
    Float(f64),
    /// Boolean backbone.
    Bool(bool),
    /// Textual backbone (strings and dates).
    Str(String),
}

impl fmt::Display for PredValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PredValue::Int(v) => write!(f, "{v}"),
            PredValue::Uint(v) => write!(f, "{v}"),
            PredValue::Float(v) => write!(f, "{v}"),
            PredValue::Bool(v) => write!(f, "{}", u8::from(*v)),
            PredValue::Str(s) => f.write_str(s),
        }
    }
}

/// One predicate atom.
///
/// Immutable after construction except for the running aggregate value,
/// which only the owning executor invocation touches.
#[derive(Debug)]
pub struct Predicate {
    col_idx: i32,
    col_type: DataType,
    op: OpType,
    chain_op: ChainOp,
    value: PredValue,
    agg: Option<PredValue>,
    // Compiled once; `like` patterns are applied per row.
    like_re: Option<Regex>,
}

impl Predicate {
    /// Creates an atom. The literal must ride the backbone of
    /// `col_type`; aggregates are only defined over the numeric
    /// backbones.
    pub fn new(
        col_idx: i32,
        col_type: DataType,
        op: OpType,
        value: PredValue,
    ) -> TrellisResult<Self> {
        if op.is_global_agg()
            && !matches!(
                value,
                PredValue::Int(_) | PredValue::Uint(_) | PredValue::Float(_)
            )
        {
            return Err(TrellisError::UnsupportedAggDataType { dtype: col_type });
        }

        let like_re = if op == OpType::Like {
            let PredValue::Str(pattern) = &value else {
                return Err(TrellisError::ComparisonNotDefined {
                    op: op.as_token().to_string(),
                    dtype: col_type,
                });
            };
            Some(Regex::new(pattern).map_err(|_| TrellisError::PredicateValue {
                value: pattern.clone(),
                dtype: col_type,
            })?)
        } else {
            None
        };

        let agg = op.is_global_agg().then(|| value.clone());

        Ok(Self {
            col_idx,
            col_type,
            op,
            chain_op: ChainOp::And,
            value,
            agg,
            like_re,
        })
    }

    /// Sets the chain operator (AND is the default).
    pub fn with_chain_op(mut self, chain_op: ChainOp) -> Self {
        self.chain_op = chain_op;
        self
    }

    /// Target column index within the source schema, or the RID sentinel.
    pub fn col_idx(&self) -> i32 {
        self.col_idx
    }

    /// Target column type.
    pub fn col_type(&self) -> DataType {
        self.col_type
    }

    /// Operator code.
    pub fn op(&self) -> OpType {
        self.op
    }

    /// Chain operator.
    pub fn chain_op(&self) -> ChainOp {
        self.chain_op
    }

    /// The literal this atom compares against (or the aggregate's
    /// initial value).
    pub fn value(&self) -> &PredValue {
        &self.value
    }

    /// The running aggregate value, if this atom is a reduction.
    pub fn agg_value(&self) -> Option<&PredValue> {
        self.agg.as_ref()
    }

    /// True for min/max/sum/cnt atoms.
    pub fn is_global_agg(&self) -> bool {
        self.op.is_global_agg()
    }

    pub(crate) fn like_re(&self) -> Option<&Regex> {
        self.like_re.as_ref()
    }

    pub(crate) fn set_agg(&mut self, value: PredValue) {
        self.agg = Some(value);
    }

    pub(crate) fn backbone(&self) -> TypeClass {
        self.col_type.class()
    }
}

// The compiled regex mirrors `value`, so equality over the semantic
// fields is complete.
impl PartialEq for Predicate {
    fn eq(&self, other: &Self) -> bool {
        self.col_idx == other.col_idx
            && self.col_type == other.col_type
            && self.op == other.op
            && self.chain_op == other.chain_op
            && self.value == other.value
            && self.agg == other.agg
    }
}

/// True if every atom uses exactly `op`.
pub fn check_predicate_ops(preds: &[Predicate], op: OpType) -> bool {
    preds.iter().all(|p| p.op() == op)
}

/// True if every atom is an equality comparison.
pub fn check_predicate_ops_all_equality(preds: &[Predicate]) -> bool {
    check_predicate_ops(preds, OpType::Eq)
}

/// True if every atom's operator admits equality (`eq`, `leq`, `geq`).
pub fn check_predicate_ops_all_include_equality(preds: &[Predicate]) -> bool {
    preds
        .iter()
        .all(|p| matches!(p.op(), OpType::Eq | OpType::Leq | OpType::Geq))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_op_token_roundtrip() {
        let ops = [
            OpType::Lt,
            OpType::Geq,
            OpType::Sum,
            OpType::Like,
            OpType::NotIn,
            OpType::LogicalNand,
            OpType::BitwiseOr,
        ];
        for op in ops {
            assert_eq!(OpType::from_token(op.as_token()).unwrap(), op);
        }
        assert!(matches!(
            OpType::from_token("unknown_op"),
            Err(TrellisError::OpNotRecognized { .. })
        ));
    }

    #[test]
    fn test_is_global_agg() {
        assert!(OpType::Min.is_global_agg());
        assert!(OpType::Max.is_global_agg());
        assert!(OpType::Sum.is_global_agg());
        assert!(OpType::Cnt.is_global_agg());
        assert!(!OpType::Eq.is_global_agg());
        assert!(!OpType::Add.is_global_agg());
    }

    #[test]
    fn test_agg_over_text_rejected() {
        let err = Predicate::new(
            0,
            DataType::String,
            OpType::Sum,
            PredValue::Str("x".into()),
        )
        .unwrap_err();
        assert!(matches!(err, TrellisError::UnsupportedAggDataType { .. }));
    }

    #[test]
    fn test_like_requires_text_literal() {
        let err =
            Predicate::new(0, DataType::Int32, OpType::Like, PredValue::Int(5)).unwrap_err();
        assert!(matches!(err, TrellisError::ComparisonNotDefined { .. }));
    }

    #[test]
    fn test_bad_like_pattern() {
        let err = Predicate::new(
            0,
            DataType::String,
            OpType::Like,
            PredValue::Str("(unclosed".into()),
        )
        .unwrap_err();
        assert!(matches!(err, TrellisError::PredicateValue { .. }));
    }

    #[test]
    fn test_check_predicate_ops() {
        let preds = vec![
            Predicate::new(0, DataType::Int32, OpType::Eq, PredValue::Int(1)).unwrap(),
            Predicate::new(1, DataType::Int32, OpType::Eq, PredValue::Int(2)).unwrap(),
        ];
        assert!(check_predicate_ops_all_equality(&preds));
        assert!(check_predicate_ops_all_include_equality(&preds));

        let mixed = vec![
            Predicate::new(0, DataType::Int32, OpType::Eq, PredValue::Int(1)).unwrap(),
            Predicate::new(1, DataType::Int32, OpType::Leq, PredValue::Int(2)).unwrap(),
        ];
        assert!(!check_predicate_ops_all_equality(&mixed));
        assert!(check_predicate_ops_all_include_equality(&mixed));

        let ranged = vec![
            Predicate::new(0, DataType::Int32, OpType::Lt, PredValue::Int(1)).unwrap(),
        ];
        assert!(!check_predicate_ops_all_include_equality(&ranged));
    }
}
