//! The columnar-format executor: projection over a columnar container.

use tracing::debug;

use trellis_common::constants::META_DATA_SCHEMA;
use trellis_common::{Schema, TrellisResult};
use trellis_format::Table;

/// Applies a projection to a serialized columnar container.
///
/// When the query schema equals the table schema the input passes through
/// untouched. Otherwise the projection is rebuilt by iterating the query
/// schema and copying each matching column, and the identity metadata is
/// re-attached with the textual data schema replaced by the query's.
pub fn process_columnar(
    tbl_schema: &Schema,
    query_schema: &Schema,
    input: &[u8],
) -> TrellisResult<Vec<u8>> {
    if tbl_schema == query_schema {
        return Ok(input.to_vec());
    }

    let table = Table::from_buffer(input)?;
    let mut projected = table.project(&query_schema.colnames());
    projected.set_metadata(META_DATA_SCHEMA, query_schema.to_text());

    debug!(
        ncols_in = table.ncols(),
        ncols_out = projected.ncols(),
        "columnar projection"
    );
    Ok(projected.to_buffer())
}

#[cfg(test)]
mod tests {
    use super::*;
    use trellis_common::constants::{COLUMNAR_DELVEC_COL, COLUMNAR_RID_COL};
    use trellis_format::row_to_columnar;
    use trellis_format::{RecordBuilder, RootBuilder};
    use trellis_common::{DataType, FormatType, Value};

    const SCHEMA_TEXT: &str = "0 3 1 0 ORDERKEY\n1 13 0 0 PRICE\n";

    fn columnar_input() -> Vec<u8> {
        let mut root = RootBuilder::new(FormatType::Row, SCHEMA_TEXT, "tpch", "LINEITEM");
        for (rid, key, price) in [(1i64, 1i32, 10.0f64), (2, 2, 20.0)] {
            let mut rec = RecordBuilder::new(rid);
            rec.append(&Value::Int32(key), DataType::Int32).unwrap();
            rec.append(&Value::Double(price), DataType::Double).unwrap();
            root.push(rec, false);
        }
        row_to_columnar(&root.finish()).unwrap().to_buffer()
    }

    #[test]
    fn test_identity_passthrough() {
        let input = columnar_input();
        let schema = Schema::from_string(SCHEMA_TEXT).unwrap();
        let out = process_columnar(&schema, &schema, &input).unwrap();
        assert_eq!(out, input);
    }

    #[test]
    fn test_projection_drops_unselected() {
        let input = columnar_input();
        let tbl = Schema::from_string(SCHEMA_TEXT).unwrap();
        let query = Schema::from_colnames(&tbl, "ORDERKEY");

        let out = process_columnar(&tbl, &query, &input).unwrap();
        let table = Table::from_buffer(&out).unwrap();
        assert_eq!(table.ncols(), 1);
        assert_eq!(table.columns[0].name, "ORDERKEY");
        assert_eq!(table.metadata_value(META_DATA_SCHEMA), Some(query.to_text().as_str()));
        // The reserved transform columns are not part of the query schema.
        assert!(table.column_by_name(COLUMNAR_RID_COL).is_none());
        assert!(table.column_by_name(COLUMNAR_DELVEC_COL).is_none());
    }
}
