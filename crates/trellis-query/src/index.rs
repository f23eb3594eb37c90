//! Secondary-index key codec.
//!
//! A composite key is
//! `<index-type-tag>/<schema>.<table>/<col1>-<col2>-…/<value1>-<value2>-…`.
//! Values are fixed-width decimal strings derived from a `u64` mapping so
//! that byte comparison on the key reproduces numeric order within one
//! type width.

use trellis_common::constants::{
    IDX_FIELD_VALUE, IDX_KEY_COLS_DEFAULT, IDX_KEY_DELIM_INNER, IDX_KEY_DELIM_OUTER,
    IDX_KEY_DELIM_UNIQUE, SCHEMA_NAME_DEFAULT, TABLE_NAME_DEFAULT,
};
use trellis_common::{DataType, TrellisError, TrellisResult};

use crate::predicate::{PredValue, Predicate};

/// Kind of secondary index a key belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdxType {
    /// Container-level index (one entry per object).
    Container,
    /// Physical record-number index.
    Rid,
    /// Column-value record index.
    Rec,
    /// Text keyword index.
    Txt,
}

impl IdxType {
    /// Returns the tag string leading every key of this index type.
    pub const fn tag(self) -> &'static str {
        match self {
            IdxType::Container => "IDX_OBJ",
            IdxType::Rid => "IDX_RID",
            IdxType::Rec => "IDX_REC",
            IdxType::Txt => "IDX_TXT",
        }
    }
}

/// Builds the constant prefix of a composite key:
/// `"<TAG>/<schema>.<table>/<col-list>/"`.
///
/// Empty schema/table names fall back to their defaults; the column list
/// is only stitched for record-oriented indexes and defaults to `*`.
pub fn build_key_prefix(
    idx_type: IdxType,
    schema_name: &str,
    table_name: &str,
    colnames: &[String],
) -> String {
    let schema_name = schema_name.trim();
    let table_name = table_name.trim();

    let schema_name = if schema_name.is_empty() {
        SCHEMA_NAME_DEFAULT
    } else {
        schema_name
    };
    let table_name = if table_name.is_empty() {
        TABLE_NAME_DEFAULT
    } else {
        table_name
    };

    let key_cols = match idx_type {
        IdxType::Rid | IdxType::Rec if !colnames.is_empty() => {
            colnames.join(IDX_KEY_DELIM_INNER)
        }
        _ => IDX_KEY_COLS_DEFAULT.to_string(),
    };

    format!(
        "{}{}{}{}{}{}{}{}",
        idx_type.tag(),
        IDX_KEY_DELIM_OUTER,
        schema_name,
        IDX_KEY_DELIM_UNIQUE,
        table_name,
        IDX_KEY_DELIM_OUTER,
        key_cols,
        IDX_KEY_DELIM_OUTER
    )
}

/// Encodes one key value as a fixed-width decimal string.
///
/// The width matches the column's physical size so byte-lexicographic
/// order equals numeric order for unsigned values of the same width.
pub fn build_key_data(dtype: DataType, value: u64) -> TrellisResult<String> {
    let width = dtype
        .key_width()
        .ok_or(TrellisError::IndexKeyUnsupportedColType { dtype })?;
    let full = format!("{value:020}");
    Ok(full[full.len() - width..].to_string())
}

/// Appends encoded value segments to a key prefix.
pub fn build_key(prefix: &str, values: &[String]) -> String {
    let mut key = prefix.to_string();
    key.push_str(&values.join(IDX_KEY_DELIM_INNER));
    key
}

/// Extracts the `u64` key mapping of a predicate's literal.
///
/// Only the fixed-width integer backbones participate in index keys;
/// signed values map through their two's-complement bits.
pub fn key_value_from_pred(pred: &Predicate) -> TrellisResult<u64> {
    match pred.value() {
        PredValue::Int(v) => Ok(*v as u64),
        PredValue::Uint(v) => Ok(*v),
        _ => Err(TrellisError::IndexKeyUnsupportedColType {
            dtype: pred.col_type(),
        }),
    }
}

/// Leading-column prefix test for range-scan termination.
///
/// Splits both keys on the outer delimiter, splits each value field on
/// the inner delimiter, and reports whether the first value tokens match.
pub fn compare_keys(key1: &str, key2: &str) -> bool {
    let value_head = |key: &str| -> Option<String> {
        let field = key.split(IDX_KEY_DELIM_OUTER).nth(IDX_FIELD_VALUE)?;
        field
            .split(IDX_KEY_DELIM_INNER)
            .next()
            .map(|s| s.to_string())
    };
    match (value_head(key1), value_head(key2)) {
        (Some(v1), Some(v2)) => v1 == v2,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::predicate::OpType;

    #[test]
    fn test_prefix_with_columns() {
        let prefix = build_key_prefix(
            IdxType::Rec,
            "tpch",
            "LINEITEM",
            &["ORDERKEY".to_string(), "LINENUMBER".to_string()],
        );
        assert_eq!(prefix, "IDX_REC/tpch.LINEITEM/ORDERKEY-LINENUMBER/");
    }

    #[test]
    fn test_prefix_defaults() {
        let prefix = build_key_prefix(IdxType::Rec, "", " ", &[]);
        assert_eq!(prefix, "IDX_REC/*.*/*/");
    }

    #[test]
    fn test_prefix_container_index_ignores_columns() {
        let prefix = build_key_prefix(IdxType::Container, "tpch", "LINEITEM", &["X".to_string()]);
        assert_eq!(prefix, "IDX_OBJ/tpch.LINEITEM/*/");
    }

    #[test]
    fn test_key_data_widths() {
        assert_eq!(build_key_data(DataType::Bool, 1).unwrap(), "1");
        assert_eq!(build_key_data(DataType::Uint8, 7).unwrap(), "007");
        assert_eq!(build_key_data(DataType::Uint16, 300).unwrap(), "00300");
        assert_eq!(build_key_data(DataType::Uint32, 5).unwrap(), "0000000005");
        assert_eq!(
            build_key_data(DataType::Uint64, 1).unwrap(),
            "00000000000000000001"
        );
        assert!(build_key_data(DataType::String, 1).is_err());
    }

    #[test]
    fn test_key_data_order_matches_numeric_order() {
        let values = [0u64, 1, 9, 10, 99, 100, 255];
        for dtype in [DataType::Uint8, DataType::Uint16, DataType::Uint32, DataType::Uint64] {
            let mut encoded: Vec<String> = values
                .iter()
                .map(|v| build_key_data(dtype, *v).unwrap())
                .collect();
            let ordered = encoded.clone();
            encoded.sort();
            assert_eq!(encoded, ordered, "{dtype:?}");
        }
    }

    #[test]
    fn test_build_key() {
        let prefix = build_key_prefix(IdxType::Rec, "*", "LINEITEM", &["ORDERKEY".to_string()]);
        let v1 = build_key_data(DataType::Uint64, 1).unwrap();
        let v2 = build_key_data(DataType::Uint64, 6).unwrap();
        let key = build_key(&prefix, &[v1, v2]);
        assert_eq!(
            key,
            "IDX_REC/*.LINEITEM/ORDERKEY/00000000000000000001-00000000000000000006"
        );
    }

    #[test]
    fn test_compare_keys_leading_token() {
        let k1 = "IDX_REC/*.LINEITEM/ORDERKEY/00000000000000000001";
        let k2 = "IDX_REC/*.LINEITEM/ORDERKEY/00000000000000000001-00000000000000000006";
        let k3 = "IDX_REC/*.LINEITEM/ORDERKEY/00000000000000000002";
        assert!(compare_keys(k1, k2));
        assert!(!compare_keys(k1, k3));
        assert!(!compare_keys(k1, "garbage"));
    }

    #[test]
    fn test_key_value_from_pred() {
        use trellis_common::DataType;
        let pred = Predicate::new(0, DataType::Uint64, OpType::Eq, PredValue::Uint(42)).unwrap();
        assert_eq!(key_value_from_pred(&pred).unwrap(), 42);

        let pred = Predicate::new(
            0,
            DataType::String,
            OpType::Eq,
            PredValue::Str("x".into()),
        )
        .unwrap();
        assert!(key_value_from_pred(&pred).is_err());
    }
}
