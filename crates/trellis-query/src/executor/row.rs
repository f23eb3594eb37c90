//! The row-format executor: filter, project, aggregate, re-encode.

use std::fmt::Write as _;

use tracing::{debug, warn};

use trellis_common::constants::{AGG_COL_LAST, AGG_ROW_RID};
use trellis_common::{DataType, ErrorCode, Schema, TrellisResult, Value};
use trellis_format::{RecordBuilder, RootBuilder, RootView};

use crate::predicate::{apply_predicates, PredValue, Predicate};

/// Result of one executor invocation.
///
/// The buffer is always a finalized, well-formed container, possibly
/// empty. Recoverable per-row failures leave their code and an
/// accumulated message alongside the rows that did process.
#[derive(Debug)]
pub struct ScanOutput {
    /// The serialized output container.
    pub buffer: Vec<u8>,
    /// Code of the last recorded failure, if any.
    pub errcode: Option<ErrorCode>,
    /// Accumulated failure messages.
    pub errmsg: String,
    /// Number of data rows emitted.
    pub rows_out: u32,
}

impl ScanOutput {
    /// True if the scan recorded no failures.
    pub fn is_clean(&self) -> bool {
        self.errcode.is_none()
    }
}

fn agg_output_value(pred: &Predicate) -> Value {
    // The running value rides the backbone; narrow it back to the
    // column's physical type for the output cell.
    let agg = pred.agg_value().cloned().unwrap_or(PredValue::Int(0));
    match (agg, pred.col_type()) {
        (PredValue::Int(v), DataType::Int8) => Value::Int8(v as i8),
        (PredValue::Int(v), DataType::Int16) => Value::Int16(v as i16),
        (PredValue::Int(v), DataType::Int32) => Value::Int32(v as i32),
        (PredValue::Int(v), DataType::Char) => Value::Char(v as i8),
        (PredValue::Int(v), _) => Value::Int64(v),
        (PredValue::Uint(v), DataType::Uint8) => Value::Uint8(v as u8),
        (PredValue::Uint(v), DataType::Uint16) => Value::Uint16(v as u16),
        (PredValue::Uint(v), DataType::Uint32) => Value::Uint32(v as u32),
        (PredValue::Uint(v), DataType::Uchar) => Value::Uchar(v as u8),
        (PredValue::Uint(v), _) => Value::Uint64(v),
        (PredValue::Float(v), DataType::Float) => Value::Float(v as f32),
        (PredValue::Float(v), _) => Value::Double(v),
        (PredValue::Bool(v), _) => Value::Bool(v),
        (PredValue::Str(s), _) => Value::Str(s),
    }
}

/// Executes a pushdown request over a serialized row container.
///
/// `row_nums` restricts the scan to explicit row numbers (an index-driven
/// read); otherwise every row is visited in source order. Decode failures
/// and predicate-evaluation failures are fatal; per-row projection
/// failures are recorded and the offending row dropped so the output
/// stays well-formed.
pub fn process_rows(
    tbl_schema: &Schema,
    query_schema: &Schema,
    preds: &mut [Predicate],
    input: &[u8],
    row_nums: Option<&[u32]>,
) -> TrellisResult<ScanOutput> {
    let root = RootView::decode(input)?;

    // Upper bound for projected indices, to catch out-of-band requests
    // before touching a record's cell region.
    let col_idx_max = tbl_schema.max_idx();

    let project_all = tbl_schema == query_schema;
    let encode_aggs = preds.iter().any(Predicate::is_global_agg);
    let encode_rows = !encode_aggs;

    let new_builder = || {
        RootBuilder::new(
            root.format_type,
            query_schema.to_text(),
            root.db_schema.clone(),
            root.table_name.clone(),
        )
        .with_versions(
            root.engine_version,
            root.structure_version,
            root.schema_version,
        )
    };
    let mut out = new_builder();

    let mut errcode: Option<ErrorCode> = None;
    let mut errmsg = String::new();

    let all_rows: Vec<u32>;
    let rnums: &[u32] = match row_nums {
        Some(nums) => nums,
        None => {
            all_rows = (0..root.nrows).collect();
            &all_rows
        }
    };

    for &rnum in rnums {
        if rnum >= root.nrows {
            // Fatal for the request: report the code on an empty but
            // well-formed container.
            let _ = write!(
                errmsg,
                "ERROR: rnum({rnum}) >= nrows({}) in table={}",
                root.nrows, root.table_name
            );
            warn!(rnum, nrows = root.nrows, "row number out of bounds");
            return Ok(ScanOutput {
                buffer: new_builder().finish(),
                errcode: Some(ErrorCode::RowIndexOOB),
                errmsg,
                rows_out: 0,
            });
        }

        if root.delete_vector[rnum as usize] == 1 {
            continue;
        }

        let rec = root.record(rnum)?;

        if !preds.is_empty() && !apply_predicates(preds, &rec)? {
            continue;
        }

        if !encode_rows {
            continue;
        }

        // Build the projected cell vector in query-schema order. A bad
        // column request poisons only this row.
        let mut builder = RecordBuilder::new(rec.rid).with_nullbits(rec.nullbits());
        let mut row_ok = true;
        for col in query_schema {
            if col.idx < AGG_COL_LAST || col.idx > col_idx_max {
                errcode = Some(ErrorCode::RequestedColIndexOOB);
                let _ = write!(
                    errmsg,
                    "ERROR process_rows(): table={}; rid={} col.idx={} OOB.",
                    root.table_name, rec.rid, col.idx
                );
                row_ok = false;
                break;
            }
            let value = rec.cell(col.idx, col.dtype)?;
            builder.append(&value, col.dtype)?;
        }
        if row_ok {
            out.push(builder, false);
        }
    }

    if encode_aggs {
        // One synthetic row: the finalized reductions, in atom order.
        let mut builder = RecordBuilder::new(AGG_ROW_RID);
        for pred in preds.iter().filter(|p| p.is_global_agg()) {
            let value = agg_output_value(pred);
            builder.append(&value, pred.col_type())?;
        }
        out.push(builder, false);
    }

    let rows_out = out.nrows();
    debug!(
        table = %root.table_name,
        nrows_in = root.nrows,
        rows_out,
        project_all,
        encode_aggs,
        "row scan complete"
    );

    Ok(ScanOutput {
        buffer: out.finish(),
        errcode,
        errmsg,
        rows_out,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::predicate::preds_from_string;
    use trellis_common::{FormatType, TrellisError};
    use trellis_format::RecordBuilder;

    const SCHEMA_TEXT: &str = "0 3 1 0 ORDERKEY\n1 13 0 0 PRICE\n";

    fn schema() -> Schema {
        Schema::from_string(SCHEMA_TEXT).unwrap()
    }

    fn sample_container(delete_mask: &[bool]) -> Vec<u8> {
        let rows = [(1i64, 1i32, 10.0f64), (2, 2, 20.0), (3, 3, 30.0)];
        let mut root = RootBuilder::new(FormatType::Row, SCHEMA_TEXT, "tpch", "LINEITEM");
        for (i, (rid, key, price)) in rows.iter().enumerate() {
            let mut rec = RecordBuilder::new(*rid);
            rec.append(&Value::Int32(*key), DataType::Int32).unwrap();
            rec.append(&Value::Double(*price), DataType::Double).unwrap();
            root.push(rec, delete_mask.get(i).copied().unwrap_or(false));
        }
        root.finish()
    }

    #[test]
    fn test_identity_query_preserves_rows() {
        let input = sample_container(&[false, false, false]);
        let out = process_rows(&schema(), &schema(), &mut [], &input, None).unwrap();
        assert!(out.is_clean());
        assert_eq!(out.rows_out, 3);

        let root = RootView::decode(&out.buffer).unwrap();
        assert_eq!(root.nrows, 3);
        assert_eq!(root.delete_vector, vec![0, 0, 0]);
        assert_eq!(root.data_schema, SCHEMA_TEXT);
        let rec = root.record(1).unwrap();
        assert_eq!(rec.rid, 2);
        assert_eq!(rec.cell(0, DataType::Int32).unwrap(), Value::Int32(2));
        assert_eq!(rec.cell(1, DataType::Double).unwrap(), Value::Double(20.0));
    }

    #[test]
    fn test_filter_and_project() {
        let input = sample_container(&[false, false, false]);
        let tbl = schema();
        let query = Schema::from_colnames(&tbl, "ORDERKEY");
        let mut preds = preds_from_string(&tbl, ";PRICE,gt,15").unwrap();

        let out = process_rows(&tbl, &query, &mut preds, &input, None).unwrap();
        assert!(out.is_clean());
        assert_eq!(out.rows_out, 2);

        let root = RootView::decode(&out.buffer).unwrap();
        let first = root.record(0).unwrap();
        let second = root.record(1).unwrap();
        assert_eq!(first.rid, 2);
        assert_eq!(second.rid, 3);
        assert_eq!(first.ncells(), 1);
        assert_eq!(first.cell(0, DataType::Int32).unwrap(), Value::Int32(2));
        assert_eq!(second.cell(0, DataType::Int32).unwrap(), Value::Int32(3));
    }

    #[test]
    fn test_aggregate_emits_single_synthetic_row() {
        let input = sample_container(&[false, false, false]);
        let tbl = schema();
        let query = Schema::from_colnames(&tbl, "PRICE");
        let mut preds = preds_from_string(&tbl, ";PRICE,sum,0;PRICE,gt,15").unwrap();

        let out = process_rows(&tbl, &query, &mut preds, &input, None).unwrap();
        assert_eq!(out.rows_out, 1);

        let root = RootView::decode(&out.buffer).unwrap();
        assert_eq!(root.nrows, 1);
        let rec = root.record(0).unwrap();
        assert_eq!(rec.rid, AGG_ROW_RID);
        assert_eq!(rec.ncells(), 1);
        assert_eq!(rec.cell(0, DataType::Double).unwrap(), Value::Double(50.0));
        assert_eq!(rec.nullbits(), [0, 0]);
    }

    #[test]
    fn test_deleted_rows_elided() {
        let input = sample_container(&[false, true, false]);
        let out = process_rows(&schema(), &schema(), &mut [], &input, None).unwrap();
        assert_eq!(out.rows_out, 2);

        let root = RootView::decode(&out.buffer).unwrap();
        assert_eq!(root.delete_vector, vec![0, 0]);
        assert_eq!(root.record(0).unwrap().rid, 1);
        assert_eq!(root.record(1).unwrap().rid, 3);
    }

    #[test]
    fn test_oob_projection_records_error_and_emits_empty() {
        let input = sample_container(&[false, false, false]);
        let tbl = schema();
        let mut query = tbl.clone();
        // A column index beyond col_idx_max.
        let query_cols = {
            let mut cols = query.cols().to_vec();
            cols[1].idx = 2;
            cols
        };
        query = Schema::new(query_cols);

        let out = process_rows(&tbl, &query, &mut [], &input, None).unwrap();
        assert_eq!(out.errcode, Some(ErrorCode::RequestedColIndexOOB));
        assert!(out.errmsg.contains("col.idx=2"));
        assert!(out.errmsg.contains("rid=1"));
        assert_eq!(out.rows_out, 0);

        let root = RootView::decode(&out.buffer).unwrap();
        assert_eq!(root.nrows, 0);
    }

    #[test]
    fn test_explicit_row_nums() {
        let input = sample_container(&[false, false, false]);
        let out = process_rows(&schema(), &schema(), &mut [], &input, Some(&[2, 0])).unwrap();
        assert_eq!(out.rows_out, 2);

        let root = RootView::decode(&out.buffer).unwrap();
        assert_eq!(root.record(0).unwrap().rid, 3);
        assert_eq!(root.record(1).unwrap().rid, 1);
    }

    #[test]
    fn test_row_num_oob_is_fatal_but_well_formed() {
        let input = sample_container(&[false, false, false]);
        let out = process_rows(&schema(), &schema(), &mut [], &input, Some(&[0, 9])).unwrap();
        assert_eq!(out.errcode, Some(ErrorCode::RowIndexOOB));
        assert!(out.errmsg.contains("rnum(9)"));

        let root = RootView::decode(&out.buffer).unwrap();
        assert_eq!(root.nrows, 0);
    }

    #[test]
    fn test_truncated_input_is_fatal() {
        let input = sample_container(&[false, false, false]);
        let err = process_rows(&schema(), &schema(), &mut [], &input[..8], None).unwrap_err();
        assert!(matches!(err, TrellisError::Truncated { .. }));
    }
}
