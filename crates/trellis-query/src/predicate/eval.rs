//! Predicate-chain evaluation against one decoded record.

use trellis_common::constants::RID_COL_INDEX;
use trellis_common::{TrellisError, TrellisResult, TypeClass};
use trellis_format::RecordView;

use super::compare::{
    compare_bool, compare_f64, compare_i64, compare_text, compare_u64, compute_agg_f64,
    compute_agg_i64, compute_agg_u64,
};
use super::{ChainOp, PredValue, Predicate};

fn type_error(pred: &Predicate) -> TrellisError {
    TrellisError::ComparisonNotDefined {
        op: pred.op().as_token().to_string(),
        dtype: pred.col_type(),
    }
}

/// Evaluates one atom. Returns the column verdict; aggregate atoms update
/// their running value and always report passing.
///
/// A null cell never satisfies a comparison and never feeds an aggregate.
fn eval_one(pred: &mut Predicate, rec: &RecordView<'_>) -> TrellisResult<bool> {
    match pred.backbone() {
        TypeClass::SignedInt => {
            let colval = if pred.col_idx() == RID_COL_INDEX {
                Some(rec.rid)
            } else {
                rec.cell(pred.col_idx(), pred.col_type())?.as_i64()
            };
            let Some(colval) = colval else {
                return Ok(pred.is_global_agg());
            };
            let &PredValue::Int(predval) = pred.value() else {
                return Err(type_error(pred));
            };
            if pred.is_global_agg() {
                let Some(&PredValue::Int(cur)) = pred.agg_value() else {
                    return Err(type_error(pred));
                };
                pred.set_agg(PredValue::Int(compute_agg_i64(cur, colval, pred.op())));
                Ok(true)
            } else {
                compare_i64(colval, predval, pred.op(), pred.col_type())
            }
        }
        TypeClass::UnsignedInt => {
            let colval = if pred.col_idx() == RID_COL_INDEX {
                Some(rec.rid as u64)
            } else {
                rec.cell(pred.col_idx(), pred.col_type())?.as_u64()
            };
            let Some(colval) = colval else {
                return Ok(pred.is_global_agg());
            };
            let &PredValue::Uint(predval) = pred.value() else {
                return Err(type_error(pred));
            };
            if pred.is_global_agg() {
                let Some(&PredValue::Uint(cur)) = pred.agg_value() else {
                    return Err(type_error(pred));
                };
                pred.set_agg(PredValue::Uint(compute_agg_u64(cur, colval, pred.op())));
                Ok(true)
            } else {
                compare_u64(colval, predval, pred.op(), pred.col_type())
            }
        }
        TypeClass::Float => {
            let colval = rec.cell(pred.col_idx(), pred.col_type())?.as_f64();
            let Some(colval) = colval else {
                return Ok(pred.is_global_agg());
            };
            let &PredValue::Float(predval) = pred.value() else {
                return Err(type_error(pred));
            };
            if pred.is_global_agg() {
                let Some(&PredValue::Float(cur)) = pred.agg_value() else {
                    return Err(type_error(pred));
                };
                pred.set_agg(PredValue::Float(compute_agg_f64(cur, colval, pred.op())));
                Ok(true)
            } else {
                compare_f64(colval, predval, pred.op(), pred.col_type())
            }
        }
        TypeClass::Bool => {
            let colval = rec.cell(pred.col_idx(), pred.col_type())?.as_bool();
            let Some(colval) = colval else {
                return Ok(false);
            };
            let &PredValue::Bool(predval) = pred.value() else {
                return Err(type_error(pred));
            };
            compare_bool(colval, predval, pred.op(), pred.col_type())
        }
        TypeClass::Text => {
            let cell = rec.cell(pred.col_idx(), pred.col_type())?;
            if cell.is_null() {
                return Ok(false);
            }
            let Some(colval) = cell.as_str() else {
                return Err(type_error(pred));
            };
            let PredValue::Str(predval) = pred.value() else {
                return Err(type_error(pred));
            };
            compare_text(
                colval,
                predval,
                pred.op(),
                pred.col_type(),
                pred.like_re(),
            )
        }
    }
}

/// Evaluates a predicate chain against one record.
///
/// The row verdict starts true for an AND chain and false for an OR
/// chain. An AND chain short-circuits as soon as the verdict is false;
/// aggregate atoms beyond the break do not update for that row.
pub fn apply_predicates(preds: &mut [Predicate], rec: &RecordView<'_>) -> TrellisResult<bool> {
    let mut rowpass = false;
    let mut init_rowpass = false;

    for pred in preds.iter_mut() {
        let chain_op = pred.chain_op();

        if !init_rowpass {
            rowpass = match chain_op {
                ChainOp::Or => false,
                ChainOp::And => true,
            };
            init_rowpass = true;
        }

        if chain_op == ChainOp::And && !rowpass {
            break;
        }

        let colpass = eval_one(pred, rec)?;

        match chain_op {
            ChainOp::Or => rowpass |= colpass,
            ChainOp::And => rowpass &= colpass,
        }
    }
    Ok(rowpass)
}
