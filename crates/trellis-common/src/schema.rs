//! Column descriptors and the textual schema codec.
//!
//! A schema is an ordered sequence of column descriptors; order defines
//! projection output order. The textual form is one descriptor per line,
//! five space-separated fields: `idx type is_key nullable name`.
//!
//! ```text
//! 0 3 1 0 ORDERKEY
//! 1 15 0 1 COMMENT
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::constants::{NUM_COL_INFO_FIELDS, PROJECT_DEFAULT, RID_COL_INDEX, RID_INDEX};
use crate::error::{TrellisError, TrellisResult};
use crate::types::DataType;

/// Descriptor for one column of a table schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColInfo {
    /// Zero-based index within the source table schema. Negative values
    /// are reserved sentinels (record id, aggregate outputs).
    pub idx: i32,
    /// Physical cell type.
    pub dtype: DataType,
    /// Whether this column is part of the table key.
    pub is_key: bool,
    /// Whether cells of this column may be null. Key columns are never
    /// nullable.
    pub nullable: bool,
    /// Column name. Compared case-insensitively.
    pub name: String,
}

impl ColInfo {
    /// Creates a new column descriptor.
    pub fn new(
        idx: i32,
        dtype: DataType,
        is_key: bool,
        nullable: bool,
        name: impl Into<String>,
    ) -> Self {
        Self {
            idx,
            dtype,
            is_key,
            nullable,
            name: name.into(),
        }
    }

    /// Case-insensitive name comparison.
    pub fn compare_name(&self, other: &str) -> bool {
        self.name.eq_ignore_ascii_case(other)
    }

    fn parse_line(line: &str) -> TrellisResult<Self> {
        let fields: Vec<&str> = line.split_ascii_whitespace().collect();
        if fields.len() != NUM_COL_INFO_FIELDS {
            return Err(TrellisError::BadColInfoFormat {
                line: line.to_string(),
                expected: NUM_COL_INFO_FIELDS,
                found: fields.len(),
            });
        }

        let bad = || TrellisError::BadColInfoFormat {
            line: line.to_string(),
            expected: NUM_COL_INFO_FIELDS,
            found: fields.len(),
        };

        let idx: i32 = fields[0].parse().map_err(|_| bad())?;
        let dtype: DataType = fields[1].parse()?;
        let is_key = fields[2].parse::<u8>().map_err(|_| bad())? != 0;
        let nullable = fields[3].parse::<u8>().map_err(|_| bad())? != 0;
        let name = fields[4].to_string();

        if name.is_empty() || (is_key && nullable) {
            return Err(bad());
        }

        Ok(ColInfo {
            idx,
            dtype,
            is_key,
            nullable,
            name,
        })
    }
}

impl fmt::Display for ColInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {} {} {}",
            self.idx,
            self.dtype,
            u8::from(self.is_key),
            u8::from(self.nullable),
            self.name
        )
    }
}

/// An ordered sequence of column descriptors.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Schema(Vec<ColInfo>);

impl Schema {
    /// Creates a schema from a list of descriptors.
    pub fn new(cols: Vec<ColInfo>) -> Self {
        Self(cols)
    }

    /// Parses the textual schema form.
    ///
    /// Lines too short to hold five fields are ignored (split artifacts);
    /// any other malformed line fails with `BadColInfoFormat`. Zero
    /// descriptors overall fail with `EmptySchema`.
    pub fn from_string(s: &str) -> TrellisResult<Self> {
        // Minimum useful line: five one-char fields and four spaces.
        let min_len = 2 * NUM_COL_INFO_FIELDS - 1;

        let mut cols = Vec::new();
        for line in s.split('\n') {
            let line = line.trim();
            if line.len() < min_len {
                continue;
            }
            cols.push(ColInfo::parse_line(line)?);
        }

        if cols.is_empty() {
            return Err(TrellisError::EmptySchema);
        }
        Ok(Schema(cols))
    }

    /// Renders the textual schema form, one descriptor per line.
    pub fn to_text(&self) -> String {
        let mut s = String::new();
        for col in &self.0 {
            s.push_str(&col.to_string());
            s.push('\n');
        }
        s
    }

    /// Builds a projection schema from a column-name request.
    ///
    /// `"*"` selects every column of `current`; the `RID` keyword
    /// synthesizes the record-id pseudo column; otherwise the request is
    /// a CSV of names resolved case-insensitively against `current`, in
    /// request order. Unknown names are skipped; callers that require
    /// resolution check for an empty result.
    pub fn from_colnames(current: &Schema, col_names: &str) -> Self {
        let col_names = col_names.trim();

        if col_names == PROJECT_DEFAULT {
            return current.clone();
        }
        if col_names == RID_INDEX {
            return Schema(vec![ColInfo::new(
                RID_COL_INDEX,
                DataType::Uint64,
                true,
                false,
                RID_INDEX,
            )]);
        }

        let mut cols = Vec::new();
        for name in col_names.split(',') {
            let name = name.trim();
            for col in &current.0 {
                if col.compare_name(name) {
                    cols.push(col.clone());
                }
            }
        }
        Schema(cols)
    }

    /// Returns the descriptors in order.
    pub fn cols(&self) -> &[ColInfo] {
        &self.0
    }

    /// Returns the number of columns.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if the schema has no columns.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterates the descriptors in order.
    pub fn iter(&self) -> std::slice::Iter<'_, ColInfo> {
        self.0.iter()
    }

    /// Finds a descriptor by name, case-insensitively.
    pub fn col_by_name(&self, name: &str) -> Option<&ColInfo> {
        self.0.iter().find(|c| c.compare_name(name))
    }

    /// Finds a descriptor by source-schema index.
    pub fn col_by_idx(&self, idx: i32) -> Option<&ColInfo> {
        self.0.iter().find(|c| c.idx == idx)
    }

    /// Largest column index present, or -1 for an empty schema.
    pub fn max_idx(&self) -> i32 {
        self.0.iter().map(|c| c.idx).max().unwrap_or(-1)
    }

    /// Returns the column names in order.
    pub fn colnames(&self) -> Vec<String> {
        self.0.iter().map(|c| c.name.clone()).collect()
    }
}

impl fmt::Display for Schema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_text())
    }
}

impl<'a> IntoIterator for &'a Schema {
    type Item = &'a ColInfo;
    type IntoIter = std::slice::Iter<'a, ColInfo>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
