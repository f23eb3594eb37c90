//! Diagnostic text and CSV rendering of containers.
//!
//! These renderers are not query-semantic; they exist for the CLI and for
//! inspecting containers in tests. Every function returns the rendered
//! text rather than writing to stdout so callers decide where it goes.

use std::fmt::Write as _;

use trellis_common::constants::{
    COLUMNAR_DELVEC_COL, COLUMNAR_RID_COL, CSV_DELIM, META_DATA_SCHEMA,
};
use trellis_common::{Schema, TrellisError, TrellisResult};
use trellis_format::{RecordView, RootView, Table};

/// Options for the CSV renderers.
#[derive(Debug, Clone, Copy)]
pub struct CsvOptions {
    /// Emit a leading header row naming the columns.
    pub header: bool,
    /// Emit container/record headers (row format) or the reserved
    /// RID/tombstone columns (columnar format).
    pub verbose: bool,
    /// Stop after this many data rows.
    pub max_rows: u64,
}

impl Default for CsvOptions {
    fn default() -> Self {
        Self {
            header: true,
            verbose: false,
            max_rows: u64::MAX,
        }
    }
}

/// Renders a container header block.
pub fn format_root_header(root: &RootView<'_>) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "[CONTAINER HEADER]");
    let _ = writeln!(out, "format_type: {}", root.format_type.as_u8());
    let _ = writeln!(out, "engine_version: {}", root.engine_version);
    let _ = writeln!(out, "structure_version: {}", root.structure_version);
    let _ = writeln!(out, "schema_version: {}", root.schema_version);
    let _ = writeln!(out, "db_schema: {}", root.db_schema);
    let _ = writeln!(out, "table_name: {}", root.table_name);
    let _ = writeln!(out, "data_schema:\n{}", root.data_schema);
    let bits: Vec<String> = root.delete_vector.iter().map(|b| b.to_string()).collect();
    let _ = writeln!(out, "delete_vector: [{}]", bits.join(", "));
    let _ = writeln!(out, "nrows: {}", root.nrows);
    out
}

/// Renders one record header: record id and nullbits words as bit
/// strings, least significant bit first.
pub fn format_record_header(rec: &RecordView<'_>) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "[RECORD HEADER]");
    let _ = writeln!(out, "RID: {}", rec.rid);
    for (word_idx, word) in rec.nullbits().iter().enumerate() {
        let mut bitstring = String::with_capacity(64);
        for bit in 0..64 {
            bitstring.push(if word & (1u64 << bit) != 0 { '1' } else { '0' });
        }
        let _ = writeln!(
            out,
            "nullbits[{word_idx}]: val={word} bits={bitstring}"
        );
    }
    out
}

fn header_label(col: &trellis_common::ColInfo) -> String {
    let mut label = col.name.clone();
    if col.is_key {
        label.push_str("(key)");
    }
    if !col.nullable {
        label.push_str("(NOT NULL)");
    }
    label
}

/// Renders a full dump of a row container: header block, then one
/// delimited line per live record with its record header.
pub fn format_row_container(bytes: &[u8]) -> TrellisResult<String> {
    let root = RootView::decode(bytes)?;
    let mut out = format_root_header(&root);
    if root.nrows == 0 {
        return Ok(out);
    }

    let schema = Schema::from_string(&root.data_schema)?;
    let labels: Vec<String> = schema.iter().map(header_label).collect();
    let _ = writeln!(out, "columns: | {} |", labels.join(" | "));

    for rnum in 0..root.nrows {
        if root.delete_vector[rnum as usize] == 1 {
            continue;
        }
        let rec = root.record(rnum)?;
        out.push_str(&format_record_header(&rec));

        out.push('|');
        for (pos, col) in schema.iter().enumerate() {
            if col.nullable && rec.is_null(col.idx) {
                out.push_str("NULL");
            } else {
                let _ = write!(out, "{}", rec.cell_at(pos, col.dtype)?);
            }
            out.push('|');
        }
        out.push('\n');
    }
    Ok(out)
}

/// Renders a row container as CSV, returning the text and the number of
/// data rows rendered. Dead rows are skipped silently; null cells render
/// as `NULL`.
pub fn row_container_as_csv(bytes: &[u8], opts: &CsvOptions) -> TrellisResult<(String, u64)> {
    let root = RootView::decode(bytes)?;
    let schema = Schema::from_string(&root.data_schema)?;

    let mut out = String::new();
    if opts.verbose {
        out.push_str(&format_root_header(&root));
    }
    if opts.header {
        let labels: Vec<String> = schema.iter().map(header_label).collect();
        let _ = writeln!(out, "{}", labels.join(&CSV_DELIM.to_string()));
    }

    let mut printed: u64 = 0;
    for rnum in 0..root.nrows {
        if printed >= opts.max_rows {
            break;
        }
        if root.delete_vector[rnum as usize] == 1 {
            continue;
        }
        let rec = root.record(rnum)?;
        if opts.verbose {
            out.push_str(&format_record_header(&rec));
        }

        for (pos, col) in schema.iter().enumerate() {
            if pos > 0 {
                out.push(CSV_DELIM);
            }
            if col.nullable && rec.is_null(col.idx) {
                out.push_str("NULL");
            } else {
                let _ = write!(out, "{}", rec.cell_at(pos, col.dtype)?);
            }
        }
        out.push('\n');
        printed += 1;
    }
    Ok((out, printed))
}

/// Renders a columnar container as CSV, row-major, returning the text and
/// the number of data rows rendered. With `verbose`, the reserved RID and
/// tombstone columns are included.
pub fn columnar_as_csv(bytes: &[u8], opts: &CsvOptions) -> TrellisResult<(String, u64)> {
    let table = Table::from_buffer(bytes)?;
    let schema_text = table
        .metadata_value(META_DATA_SCHEMA)
        .ok_or_else(|| TrellisError::corrupt("columnar container lacks a data schema"))?;
    let schema = Schema::from_string(schema_text)?;

    let mut cols = Vec::with_capacity(schema.len() + 2);
    for ci in &schema {
        let col = table.column_by_name(&ci.name).ok_or_else(|| {
            TrellisError::corrupt(format!("schema column {} absent from table", ci.name))
        })?;
        cols.push((header_label(ci), col));
    }
    if opts.verbose {
        for name in [COLUMNAR_RID_COL, COLUMNAR_DELVEC_COL] {
            if let Some(col) = table.column_by_name(name) {
                cols.push((name.to_string(), col));
            }
        }
    }

    let mut out = String::new();
    if opts.header {
        let labels: Vec<&str> = cols.iter().map(|(label, _)| label.as_str()).collect();
        let _ = writeln!(out, "{}", labels.join(&CSV_DELIM.to_string()));
    }

    let mut printed: u64 = 0;
    for row in 0..table.nrows() {
        if printed >= opts.max_rows {
            break;
        }
        for (i, (_, col)) in cols.iter().enumerate() {
            if i > 0 {
                out.push(CSV_DELIM);
            }
            let _ = write!(out, "{}", col.value(row));
        }
        out.push('\n');
        printed += 1;
    }
    Ok((out, printed))
}

/// Renders a columnar table column-major: one line per schema column,
/// the column name followed by its values.
pub fn format_columnar_colwise(table: &Table) -> TrellisResult<String> {
    let schema_text = table
        .metadata_value(META_DATA_SCHEMA)
        .ok_or_else(|| TrellisError::corrupt("columnar container lacks a data schema"))?;
    let schema = Schema::from_string(schema_text)?;

    let mut out = String::new();
    for ci in &schema {
        let col = table.column_by_name(&ci.name).ok_or_else(|| {
            TrellisError::corrupt(format!("schema column {} absent from table", ci.name))
        })?;
        out.push_str(&col.name);
        for row in 0..col.len() {
            out.push(CSV_DELIM);
            let _ = write!(out, "{}", col.value(row));
        }
        out.push('\n');
    }
    Ok(out)
}
