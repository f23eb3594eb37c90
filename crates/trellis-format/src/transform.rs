//! Row-container ↔ columnar-container transform.
//!
//! The forward direction builds one typed array per schema column, plus
//! two appended reserved columns carrying the per-record id and tombstone
//! byte, and attaches the container identity as schema metadata. The
//! reverse direction rebuilds records from the arrays, restoring record
//! ids, nullbits, and tombstones, so a round trip preserves every row,
//! live or dead.

use tracing::debug;

use trellis_common::constants::{
    COLUMNAR_DELVEC_COL, COLUMNAR_RID_COL, META_DATA_FORMAT_TYPE, META_DATA_SCHEMA,
    META_DATA_SCHEMA_VERSION, META_DATA_STRUCTURE_VERSION, META_DB_SCHEMA, META_ENGINE_VERSION,
    META_NUM_ROWS, META_TABLE_NAME,
};
use trellis_common::{DataType, FormatType, Schema, TrellisError, TrellisResult, Value};

use crate::columnar::{Column, Table};
use crate::row::{RecordBuilder, RootBuilder, RootView};

/// Converts a serialized row container into a columnar table.
///
/// The output carries one column per schema column plus `RID: Int64` and
/// `DELETED_VECTOR: Uint8`, and the eight identity metadata keys. Dead
/// rows are carried over with their tombstone byte set rather than
/// dropped.
pub fn row_to_columnar(bytes: &[u8]) -> TrellisResult<Table> {
    let root = RootView::decode(bytes)?;
    let schema = Schema::from_string(&root.data_schema)?;

    let mut columns: Vec<Column> = schema
        .iter()
        .map(|col| Column::new(col.name.clone(), col.dtype))
        .collect();
    let mut rid_col = Column::new(COLUMNAR_RID_COL, DataType::Int64);
    let mut delvec_col = Column::new(COLUMNAR_DELVEC_COL, DataType::Uint8);

    for rnum in 0..root.nrows {
        let rec = root.record(rnum)?;
        for (col, out) in schema.iter().zip(columns.iter_mut()) {
            // Nullbit test is against zero, not equality with one.
            if col.nullable && rec.is_null(col.idx) {
                out.append_null();
                continue;
            }
            let value = rec.cell(col.idx, col.dtype)?;
            out.append(&value)?;
        }
        rid_col.append(&Value::Int64(rec.rid))?;
        delvec_col.append(&Value::Uint8(root.delete_vector[rnum as usize]))?;
    }

    columns.push(rid_col);
    columns.push(delvec_col);

    let metadata = vec![
        (META_ENGINE_VERSION.into(), root.engine_version.to_string()),
        (
            META_DATA_SCHEMA_VERSION.into(),
            root.schema_version.to_string(),
        ),
        (
            META_DATA_STRUCTURE_VERSION.into(),
            root.structure_version.to_string(),
        ),
        (
            META_DATA_FORMAT_TYPE.into(),
            root.format_type.as_u8().to_string(),
        ),
        (META_DATA_SCHEMA.into(), root.data_schema.clone()),
        (META_DB_SCHEMA.into(), root.db_schema.clone()),
        (META_TABLE_NAME.into(), root.table_name.clone()),
        (META_NUM_ROWS.into(), root.nrows.to_string()),
    ];

    debug!(
        table = %root.table_name,
        nrows = root.nrows,
        ncols = columns.len(),
        "transformed row container to columnar"
    );
    Ok(Table::new(columns, metadata))
}

fn meta_u32(table: &Table, key: &str) -> TrellisResult<u32> {
    table
        .metadata_value(key)
        .ok_or_else(|| TrellisError::corrupt(format!("missing metadata key {key}")))?
        .parse()
        .map_err(|_| TrellisError::corrupt(format!("metadata key {key} is not an integer")))
}

fn meta_str<'t>(table: &'t Table, key: &str) -> TrellisResult<&'t str> {
    table
        .metadata_value(key)
        .ok_or_else(|| TrellisError::corrupt(format!("missing metadata key {key}")))
}

/// Converts a columnar table back into a serialized row container.
///
/// Requires the reserved `RID` and `DELETED_VECTOR` columns and the
/// identity metadata written by [`row_to_columnar`].
pub fn columnar_to_row(table: &Table) -> TrellisResult<Vec<u8>> {
    let data_schema = meta_str(table, META_DATA_SCHEMA)?.to_string();
    let schema = Schema::from_string(&data_schema)?;

    let format_type = FormatType::from_u8(meta_u32(table, META_DATA_FORMAT_TYPE)? as u8)?;
    let engine_version = meta_u32(table, META_ENGINE_VERSION)?;
    let structure_version = meta_u32(table, META_DATA_STRUCTURE_VERSION)?;
    let schema_version = meta_u32(table, META_DATA_SCHEMA_VERSION)?;
    let db_schema = meta_str(table, META_DB_SCHEMA)?.to_string();
    let table_name = meta_str(table, META_TABLE_NAME)?.to_string();

    let rid_col = table
        .column_by_name(COLUMNAR_RID_COL)
        .ok_or_else(|| TrellisError::corrupt("missing RID column"))?;
    let delvec_col = table
        .column_by_name(COLUMNAR_DELVEC_COL)
        .ok_or_else(|| TrellisError::corrupt("missing DELETED_VECTOR column"))?;

    let mut root = RootBuilder::new(format_type, data_schema, db_schema, table_name)
        .with_versions(engine_version, structure_version, schema_version);

    for row in 0..table.nrows() {
        let rid = rid_col
            .value(row)
            .as_i64()
            .ok_or_else(|| TrellisError::corrupt("RID column holds a non-integer"))?;
        let deleted = delvec_col
            .value(row)
            .as_u64()
            .ok_or_else(|| TrellisError::corrupt("DELETED_VECTOR holds a non-integer"))?
            != 0;

        let mut rec = RecordBuilder::new(rid);
        for col in &schema {
            let source = table.column_by_name(&col.name).ok_or_else(|| {
                TrellisError::corrupt(format!("schema column {} absent from table", col.name))
            })?;
            let value = source.value(row);
            if value.is_null() {
                rec.set_nullbit(col.idx);
            }
            rec.append(&value, col.dtype)?;
        }
        root.push(rec, deleted);
    }

    Ok(root.finish())
}

#[cfg(test)]
mod tests {
    use super::*;
    use trellis_common::constants::NULLBITS_WORDS;

    const SCHEMA_TEXT: &str = "0 3 1 0 ORDERKEY\n1 13 0 0 PRICE\n2 15 0 1 COMMENT\n";

    fn sample_row_container() -> Vec<u8> {
        let mut root = RootBuilder::new(FormatType::Row, SCHEMA_TEXT, "tpch", "LINEITEM");

        let rows: &[(i64, i32, f64, Option<&str>)] = &[
            (1, 1, 10.0, Some("first")),
            (2, 2, 20.0, None),
            (3, 3, 30.0, Some("third")),
        ];
        for (rid, key, price, comment) in rows {
            let mut rec = RecordBuilder::new(*rid);
            rec.append(&Value::Int32(*key), DataType::Int32).unwrap();
            rec.append(&Value::Double(*price), DataType::Double).unwrap();
            match comment {
                Some(s) => rec
                    .append(&Value::Str((*s).to_string()), DataType::String)
                    .unwrap(),
                None => {
                    rec.set_nullbit(2);
                    rec.append(&Value::Null, DataType::String).unwrap();
                }
            }
            // Row with rid 2 is a tombstone.
            root.push(rec, *rid == 2);
        }
        root.finish()
    }

    #[test]
    fn test_forward_shape() {
        let table = row_to_columnar(&sample_row_container()).unwrap();
        // Three schema columns plus RID and DELETED_VECTOR.
        assert_eq!(table.ncols(), 5);
        assert_eq!(table.nrows(), 3);
        assert_eq!(table.columns[3].name, COLUMNAR_RID_COL);
        assert_eq!(table.columns[4].name, COLUMNAR_DELVEC_COL);
        assert_eq!(table.metadata_value(META_NUM_ROWS), Some("3"));
        assert_eq!(table.metadata_value(META_TABLE_NAME), Some("LINEITEM"));
    }

    #[test]
    fn test_forward_nulls_and_tombstones() {
        let table = row_to_columnar(&sample_row_container()).unwrap();
        assert_eq!(table.columns[2].value(1), Value::Null);
        assert_eq!(table.columns[2].value(0), Value::Str("first".into()));
        assert_eq!(table.columns[4].value(1), Value::Uint8(1));
        assert_eq!(table.columns[4].value(0), Value::Uint8(0));
    }

    #[test]
    fn test_roundtrip_restores_records() {
        let original = sample_row_container();
        let table = row_to_columnar(&original).unwrap();
        let rebuilt = columnar_to_row(&table).unwrap();

        let a = RootView::decode(&original).unwrap();
        let b = RootView::decode(&rebuilt).unwrap();
        assert_eq!(a.nrows, b.nrows);
        assert_eq!(a.delete_vector, b.delete_vector);
        assert_eq!(a.data_schema, b.data_schema);
        assert_eq!(a.table_name, b.table_name);

        let schema = Schema::from_string(&a.data_schema).unwrap();
        for rnum in 0..a.nrows {
            let ra = a.record(rnum).unwrap();
            let rb = b.record(rnum).unwrap();
            assert_eq!(ra.rid, rb.rid);
            assert_eq!(ra.nullbits(), rb.nullbits());
            for col in &schema {
                assert_eq!(
                    ra.cell(col.idx, col.dtype).unwrap(),
                    rb.cell(col.idx, col.dtype).unwrap(),
                    "row {rnum} col {}",
                    col.name
                );
            }
        }
    }

    #[test]
    fn test_roundtrip_through_columnar_buffer() {
        let original = sample_row_container();
        let table = row_to_columnar(&original).unwrap();
        let decoded = Table::from_buffer(&table.to_buffer()).unwrap();
        let rebuilt = columnar_to_row(&decoded).unwrap();
        assert_eq!(rebuilt, columnar_to_row(&table).unwrap());
    }

    #[test]
    fn test_reverse_missing_reserved_column() {
        let table = row_to_columnar(&sample_row_container()).unwrap();
        let names: Vec<String> = vec!["ORDERKEY".into(), "PRICE".into(), "COMMENT".into()];
        let projected = table.project(&names);
        assert!(columnar_to_row(&projected).is_err());
    }

    #[test]
    fn test_nullbits_width_is_bounded() {
        // The record nullbits cover NULLBITS_WORDS * 64 columns; the
        // transform must never index beyond that.
        assert!(SCHEMA_TEXT.lines().count() <= NULLBITS_WORDS * 64);
    }
}
