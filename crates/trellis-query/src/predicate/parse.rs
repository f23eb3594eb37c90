//! Predicate wire-string codec.
//!
//! Wire form: `;col,op,val;col,op,val;…`. An empty string or the default
//! token means no predicates. Column names are resolved case-insensitively
//! against a reference schema; the literal is parsed according to the
//! referenced column's type, with overflow checking delegated to the
//! standard numeric parsers.

use trellis_common::constants::{
    PRED_DELIM_INNER, PRED_DELIM_OUTER, RID_COL_INDEX, RID_INDEX, SELECT_DEFAULT,
};
use trellis_common::{DataType, Schema, TrellisError, TrellisResult};

use super::{OpType, PredValue, Predicate};

fn parse_value(val: &str, dtype: DataType) -> TrellisResult<PredValue> {
    let bad = || TrellisError::PredicateValue {
        value: val.to_string(),
        dtype,
    };
    let value = match dtype {
        DataType::Int8 => PredValue::Int(val.parse::<i8>().map_err(|_| bad())?.into()),
        DataType::Int16 => PredValue::Int(val.parse::<i16>().map_err(|_| bad())?.into()),
        DataType::Int32 => PredValue::Int(val.parse::<i32>().map_err(|_| bad())?.into()),
        DataType::Int64 => PredValue::Int(val.parse::<i64>().map_err(|_| bad())?),
        DataType::Char => PredValue::Int(val.parse::<i8>().map_err(|_| bad())?.into()),
        DataType::Uint8 => PredValue::Uint(val.parse::<u8>().map_err(|_| bad())?.into()),
        DataType::Uint16 => PredValue::Uint(val.parse::<u16>().map_err(|_| bad())?.into()),
        DataType::Uint32 => PredValue::Uint(val.parse::<u32>().map_err(|_| bad())?.into()),
        DataType::Uint64 => PredValue::Uint(val.parse::<u64>().map_err(|_| bad())?),
        DataType::Uchar => PredValue::Uint(val.parse::<u8>().map_err(|_| bad())?.into()),
        DataType::Bool => PredValue::Bool(val.parse::<i64>().map_err(|_| bad())? != 0),
        DataType::Float | DataType::Double => {
            PredValue::Float(val.parse::<f64>().map_err(|_| bad())?)
        }
        DataType::Date | DataType::String => PredValue::Str(val.to_string()),
    };
    Ok(value)
}

/// Parses a predicate wire string against a reference schema.
///
/// Output ordering: all non-aggregate atoms first, in input order, then
/// all aggregate atoms in input order; aggregates must only update once
/// every filter for the row has passed.
pub fn preds_from_string(schema: &Schema, preds_string: &str) -> TrellisResult<Vec<Predicate>> {
    let preds_string = preds_string
        .trim()
        .trim_matches(|c: char| PRED_DELIM_OUTER.contains(c));

    if preds_string.is_empty() || preds_string == SELECT_DEFAULT {
        return Ok(Vec::new());
    }

    let mut preds = Vec::new();
    let mut agg_preds = Vec::new();

    for item in preds_string.split(PRED_DELIM_OUTER) {
        let item = item.trim();
        if item.is_empty() {
            continue;
        }
        let fields: Vec<&str> = item.split(PRED_DELIM_INNER).collect();
        if fields.len() != 3 {
            return Err(TrellisError::BadPredicateFormat {
                item: item.to_string(),
            });
        }

        let colname = fields[0].trim().to_ascii_uppercase();
        let opname = fields[1].trim();
        let val = fields[2].trim();

        // Resolve the name through the projection rules so the RID
        // keyword yields its sentinel descriptor.
        let resolved = Schema::from_colnames(schema, &colname);
        let Some(ci) = resolved.cols().first() else {
            return Err(TrellisError::ColNotPresent { name: colname });
        };

        let op = OpType::from_token(opname)?;
        let value = parse_value(val, ci.dtype)?;
        let pred = Predicate::new(ci.idx, ci.dtype, op, value)?;

        if pred.is_global_agg() {
            agg_preds.push(pred);
        } else {
            preds.push(pred);
        }
    }

    preds.append(&mut agg_preds);
    Ok(preds)
}

/// Renders a predicate list back into wire form.
///
/// The RID sentinel prints as the `RID` keyword rather than a schema
/// column name.
pub fn preds_to_string(preds: &[Predicate], schema: &Schema) -> String {
    let mut out = String::new();
    for pred in preds {
        let colname = if pred.col_idx() == RID_COL_INDEX {
            Some(RID_INDEX.to_string())
        } else {
            schema
                .col_by_idx(pred.col_idx())
                .map(|ci| ci.name.clone())
        };
        let Some(colname) = colname else { continue };

        out.push_str(PRED_DELIM_OUTER);
        out.push_str(&colname);
        out.push_str(PRED_DELIM_INNER);
        out.push_str(pred.op().as_token());
        out.push_str(PRED_DELIM_INNER);
        out.push_str(&pred.value().to_string());
    }
    out.push_str(PRED_DELIM_OUTER);
    out
}

/// Returns the schema names of the columns the predicates touch, in
/// predicate order.
pub fn colnames_from_preds(preds: &[Predicate], schema: &Schema) -> Vec<String> {
    let mut names = Vec::new();
    for pred in preds {
        if let Some(ci) = schema.col_by_idx(pred.col_idx()) {
            names.push(ci.name.clone());
        }
    }
    names
}
