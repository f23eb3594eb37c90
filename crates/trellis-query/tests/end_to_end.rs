//! End-to-end scenarios over serialized containers.

use trellis_common::constants::{AGG_ROW_RID, ENGINE_VERSION};
use trellis_common::{DataType, ErrorCode, FormatType, Schema, Value};
use trellis_format::{columnar_to_row, row_to_columnar, RecordBuilder, RootBuilder, RootView};
use trellis_query::{index, preds_from_string, preds_to_string, process_rows};

const TABLE_SCHEMA: &str = "0 3 1 0 ORDERKEY\n1 13 0 0 PRICE\n";

/// `(ORDERKEY: int32, PRICE: double)` with rows (1,10.0), (2,20.0),
/// (3,30.0) and the given tombstone mask.
fn lineitem_container(delete_mask: [bool; 3]) -> Vec<u8> {
    let mut root = RootBuilder::new(FormatType::Row, TABLE_SCHEMA, "tpch", "LINEITEM");
    for (i, (rid, key, price)) in [(1i64, 1i32, 10.0f64), (2, 2, 20.0), (3, 3, 30.0)]
        .iter()
        .enumerate()
    {
        let mut rec = RecordBuilder::new(*rid);
        rec.append(&Value::Int32(*key), DataType::Int32).unwrap();
        rec.append(&Value::Double(*price), DataType::Double).unwrap();
        root.push(rec, delete_mask[i]);
    }
    root.finish()
}

#[test]
fn schema_text_roundtrip() {
    let input = "0 12 1 0 ORDERKEY\n1 14 0 1 COMMENT\n";
    let schema = Schema::from_string(input).unwrap();
    assert_eq!(schema.to_text(), input);
    assert_eq!(Schema::from_string(&schema.to_text()).unwrap(), schema);
}

#[test]
fn predicate_roundtrip_without_aggregates() {
    let schema = Schema::from_string(TABLE_SCHEMA).unwrap();
    let preds = preds_from_string(&schema, ";ORDERKEY,geq,2;PRICE,lt,25.5;").unwrap();
    let rendered = preds_to_string(&preds, &schema);
    assert_eq!(preds_from_string(&schema, &rendered).unwrap(), preds);
}

#[test]
fn filter_projects_matching_rows() {
    let tbl = Schema::from_string(TABLE_SCHEMA).unwrap();
    let query = Schema::from_colnames(&tbl, "ORDERKEY");
    let mut preds = preds_from_string(&tbl, ";PRICE,gt,15").unwrap();

    let out = process_rows(
        &tbl,
        &query,
        &mut preds,
        &lineitem_container([false; 3]),
        None,
    )
    .unwrap();
    assert!(out.is_clean());
    assert_eq!(out.rows_out, 2);

    let root = RootView::decode(&out.buffer).unwrap();
    let rids: Vec<i64> = (0..root.nrows)
        .map(|r| root.record(r).unwrap().rid)
        .collect();
    assert_eq!(rids, vec![2, 3]);
    for (rnum, expect) in [(0u32, 2i32), (1, 3)] {
        let rec = root.record(rnum).unwrap();
        assert_eq!(rec.ncells(), 1);
        assert_eq!(rec.cell_at(0, DataType::Int32).unwrap(), Value::Int32(expect));
    }
}

#[test]
fn aggregate_emits_one_row_with_sentinel_rid() {
    let tbl = Schema::from_string(TABLE_SCHEMA).unwrap();
    let query = Schema::from_colnames(&tbl, "PRICE");
    let mut preds = preds_from_string(&tbl, ";PRICE,sum,0;PRICE,gt,15").unwrap();

    let out = process_rows(
        &tbl,
        &query,
        &mut preds,
        &lineitem_container([false; 3]),
        None,
    )
    .unwrap();
    assert_eq!(out.rows_out, 1);

    let root = RootView::decode(&out.buffer).unwrap();
    assert_eq!(root.nrows, 1);
    let rec = root.record(0).unwrap();
    assert_eq!(rec.rid, AGG_ROW_RID);
    assert_eq!(rec.cell_at(0, DataType::Double).unwrap(), Value::Double(50.0));
}

#[test]
fn tombstoned_rows_are_physically_elided() {
    let tbl = Schema::from_string(TABLE_SCHEMA).unwrap();
    let out = process_rows(
        &tbl,
        &tbl,
        &mut [],
        &lineitem_container([false, true, false]),
        None,
    )
    .unwrap();
    assert_eq!(out.rows_out, 2);

    let root = RootView::decode(&out.buffer).unwrap();
    assert_eq!(root.nrows, 2);
    assert_eq!(root.delete_vector, vec![0, 0]);
    assert_eq!(root.record(0).unwrap().rid, 1);
    assert_eq!(root.record(1).unwrap().rid, 3);
}

#[test]
fn oob_column_yields_error_code_and_empty_container() {
    let tbl = Schema::from_string(TABLE_SCHEMA).unwrap();
    // Query one past the largest table index.
    let bad_idx = tbl.max_idx() + 1;
    let query = Schema::new(vec![trellis_common::ColInfo::new(
        bad_idx,
        DataType::Int32,
        false,
        false,
        "PHANTOM",
    )]);

    let out = process_rows(
        &tbl,
        &query,
        &mut [],
        &lineitem_container([false; 3]),
        None,
    )
    .unwrap();
    assert_eq!(out.errcode, Some(ErrorCode::RequestedColIndexOOB));
    assert!(out.errmsg.contains(&format!("col.idx={bad_idx}")));
    assert!(out.errmsg.contains("rid="));

    let root = RootView::decode(&out.buffer).unwrap();
    assert_eq!(root.nrows, 0);
}

#[test]
fn index_key_prefix_comparison() {
    let k1 = "IDX_REC/*.LINEITEM/ORDERKEY/00000000000000000001";
    let k2 = "IDX_REC/*.LINEITEM/ORDERKEY/00000000000000000001-00000000000000000006";
    assert!(index::compare_keys(k1, k2));
}

#[test]
fn and_chain_row_count_matches_set_filter() {
    let tbl = Schema::from_string(TABLE_SCHEMA).unwrap();
    let mut preds = preds_from_string(&tbl, ";PRICE,gt,5;ORDERKEY,lt,3").unwrap();

    let out = process_rows(
        &tbl,
        &tbl,
        &mut preds,
        &lineitem_container([true, false, false]),
        None,
    )
    .unwrap();
    // Live rows: (2, 20.0), (3, 30.0); both have PRICE > 5, only
    // ORDERKEY 2 is < 3.
    assert_eq!(out.rows_out, 1);
    let root = RootView::decode(&out.buffer).unwrap();
    assert_eq!(root.record(0).unwrap().rid, 2);
}

#[test]
fn identity_query_preserves_container_semantics() {
    let tbl = Schema::from_string(TABLE_SCHEMA).unwrap();
    let input = lineitem_container([false; 3]);
    let out = process_rows(&tbl, &tbl, &mut [], &input, None).unwrap();

    let a = RootView::decode(&input).unwrap();
    let b = RootView::decode(&out.buffer).unwrap();
    assert_eq!(a.nrows, b.nrows);
    assert_eq!(b.engine_version, ENGINE_VERSION);
    assert_eq!(a.data_schema, b.data_schema);
    for rnum in 0..a.nrows {
        let ra = a.record(rnum).unwrap();
        let rb = b.record(rnum).unwrap();
        assert_eq!(ra.rid, rb.rid);
        assert_eq!(ra.nullbits(), rb.nullbits());
        for col in &tbl {
            assert_eq!(
                ra.cell(col.idx, col.dtype).unwrap(),
                rb.cell(col.idx, col.dtype).unwrap()
            );
        }
    }
}

#[test]
fn format_transform_roundtrip_preserves_live_rows() {
    let input = lineitem_container([false, true, false]);
    let table = row_to_columnar(&input).unwrap();
    let rebuilt = columnar_to_row(&table).unwrap();

    let a = RootView::decode(&input).unwrap();
    let b = RootView::decode(&rebuilt).unwrap();
    assert_eq!(a.nrows, b.nrows);
    assert_eq!(a.delete_vector, b.delete_vector);

    let schema = Schema::from_string(&a.data_schema).unwrap();
    for rnum in 0..a.nrows {
        let ra = a.record(rnum).unwrap();
        let rb = b.record(rnum).unwrap();
        assert_eq!(ra.rid, rb.rid);
        assert_eq!(ra.nullbits(), rb.nullbits());
        for col in &schema {
            assert_eq!(
                ra.cell(col.idx, col.dtype).unwrap(),
                rb.cell(col.idx, col.dtype).unwrap()
            );
        }
    }
}
