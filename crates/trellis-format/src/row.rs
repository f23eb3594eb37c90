//! Row-oriented container codec.
//!
//! Layout (all integers big-endian, strings `u32`-length-prefixed UTF-8):
//!
//! ```text
//! RootHeader:
//!   magic u32              format_type u8
//!   engine_version u32     structure_version u32    schema_version u32
//!   data_schema str        db_schema str            table_name str
//!   nrows u32
//!   delete_vector  [u8;  nrows]
//!   row_offset_table [u32; nrows]    // record offsets into the body
//!   body: records…
//!
//! Record:
//!   rid i64
//!   nullbits [u64; 2]
//!   ncells u32
//!   cell_ends [u32; ncells]          // end offset of each cell slot
//!   cell data bytes
//! ```
//!
//! A null cell occupies a zero-length slot; readers consult the record's
//! nullbits. [`RootView::decode`] materializes the header eagerly but
//! leaves record bodies borrowed from the caller's buffer, so per-cell
//! access copies nothing until a `Value` is produced.

use bytes::BufMut;

use trellis_common::constants::{NULLBITS_WORDS, ROW_CONTAINER_MAGIC};
use trellis_common::{DataType, FormatType, TrellisError, TrellisResult, Value};

use crate::wire::{get_i64, get_str, get_u32, get_u64, get_u8, put_str, take};

// ---------------------------------------------------------------------------
// Cell codec
// ---------------------------------------------------------------------------

/// Encodes one cell into `out` according to the column type.
///
/// `Value::Null` encodes as a zero-length slot regardless of type.
pub(crate) fn encode_cell(value: &Value, dtype: DataType, out: &mut Vec<u8>) -> TrellisResult<()> {
    match (dtype, value) {
        (_, Value::Null) => {}
        (DataType::Int8, Value::Int8(v)) => out.put_i8(*v),
        (DataType::Int16, Value::Int16(v)) => out.put_i16(*v),
        (DataType::Int32, Value::Int32(v)) => out.put_i32(*v),
        (DataType::Int64, Value::Int64(v)) => out.put_i64(*v),
        (DataType::Uint8, Value::Uint8(v)) => out.put_u8(*v),
        (DataType::Uint16, Value::Uint16(v)) => out.put_u16(*v),
        (DataType::Uint32, Value::Uint32(v)) => out.put_u32(*v),
        (DataType::Uint64, Value::Uint64(v)) => out.put_u64(*v),
        (DataType::Char, Value::Char(v)) => out.put_i8(*v),
        (DataType::Uchar, Value::Uchar(v)) => out.put_u8(*v),
        (DataType::Bool, Value::Bool(v)) => out.put_u8(u8::from(*v)),
        (DataType::Float, Value::Float(v)) => out.put_f32(*v),
        (DataType::Double, Value::Double(v)) => out.put_f64(*v),
        (DataType::Date, Value::Date(s) | Value::Str(s))
        | (DataType::String, Value::Str(s) | Value::Date(s)) => out.put_slice(s.as_bytes()),
        (dtype, value) => {
            return Err(TrellisError::corrupt(format!(
                "cell value {value:?} does not encode as {dtype:?}"
            )))
        }
    }
    Ok(())
}

/// Decodes one cell slot according to the column type.
///
/// A zero-length slot decodes as `Value::Null`.
pub(crate) fn decode_cell(raw: &[u8], dtype: DataType) -> TrellisResult<Value> {
    if raw.is_empty() {
        return Ok(Value::Null);
    }
    if let Some(width) = dtype.fixed_width() {
        if raw.len() != width {
            return Err(TrellisError::corrupt(format!(
                "cell of type {dtype:?}: expected {width} bytes, found {}",
                raw.len()
            )));
        }
    }
    let value = match dtype {
        DataType::Int8 => Value::Int8(raw[0] as i8),
        DataType::Int16 => Value::Int16(i16::from_be_bytes([raw[0], raw[1]])),
        DataType::Int32 => Value::Int32(i32::from_be_bytes([raw[0], raw[1], raw[2], raw[3]])),
        DataType::Int64 => {
            Value::Int64(i64::from_be_bytes(raw.try_into().expect("8-byte slice")))
        }
        DataType::Uint8 => Value::Uint8(raw[0]),
        DataType::Uint16 => Value::Uint16(u16::from_be_bytes([raw[0], raw[1]])),
        DataType::Uint32 => Value::Uint32(u32::from_be_bytes([raw[0], raw[1], raw[2], raw[3]])),
        DataType::Uint64 => {
            Value::Uint64(u64::from_be_bytes(raw.try_into().expect("8-byte slice")))
        }
        DataType::Char => Value::Char(raw[0] as i8),
        DataType::Uchar => Value::Uchar(raw[0]),
        DataType::Bool => Value::Bool(raw[0] != 0),
        DataType::Float => Value::Float(f32::from_be_bytes([raw[0], raw[1], raw[2], raw[3]])),
        DataType::Double => {
            Value::Double(f64::from_be_bytes(raw.try_into().expect("8-byte slice")))
        }
        DataType::Date => Value::Date(
            std::str::from_utf8(raw)
                .map_err(|_| TrellisError::corrupt("date cell: invalid UTF-8"))?
                .to_string(),
        ),
        DataType::String => Value::Str(
            std::str::from_utf8(raw)
                .map_err(|_| TrellisError::corrupt("string cell: invalid UTF-8"))?
                .to_string(),
        ),
    };
    Ok(value)
}

// ---------------------------------------------------------------------------
// Decoded views
// ---------------------------------------------------------------------------

/// Decoded container header with borrowed access to the record body.
#[derive(Debug)]
pub struct RootView<'a> {
    /// Container format tag.
    pub format_type: FormatType,
    /// Engine version that wrote this container.
    pub engine_version: u32,
    /// Physical layout version.
    pub structure_version: u32,
    /// Textual schema format version.
    pub schema_version: u32,
    /// Textual data schema of the contained rows.
    pub data_schema: String,
    /// Database schema (namespace) name.
    pub db_schema: String,
    /// Table name.
    pub table_name: String,
    /// Number of records, live or dead.
    pub nrows: u32,
    /// One tombstone byte per record.
    pub delete_vector: Vec<u8>,
    row_offsets: Vec<u32>,
    body: &'a [u8],
}

impl<'a> RootView<'a> {
    /// Decodes a container header.
    ///
    /// The header (strings, delete vector, offset table) is materialized
    /// eagerly; records stay borrowed until [`RootView::record`] is called.
    pub fn decode(bytes: &'a [u8]) -> TrellisResult<Self> {
        let mut buf = bytes;

        let magic = get_u32(&mut buf, "magic")?;
        if magic != ROW_CONTAINER_MAGIC {
            return Err(TrellisError::BadMagic {
                expected: ROW_CONTAINER_MAGIC,
                found: magic,
            });
        }

        let format_type = FormatType::from_u8(get_u8(&mut buf, "format_type")?)?;
        let engine_version = get_u32(&mut buf, "engine_version")?;
        let structure_version = get_u32(&mut buf, "structure_version")?;
        let schema_version = get_u32(&mut buf, "schema_version")?;
        let data_schema = get_str(&mut buf, "data_schema")?;
        let db_schema = get_str(&mut buf, "db_schema")?;
        let table_name = get_str(&mut buf, "table_name")?;
        let nrows = get_u32(&mut buf, "nrows")?;

        let delete_vector = take(&mut buf, nrows as usize, "delete_vector")?.to_vec();

        let raw_offsets = take(&mut buf, nrows as usize * 4, "row_offset_table")?;
        let row_offsets = raw_offsets
            .chunks_exact(4)
            .map(|c| u32::from_be_bytes([c[0], c[1], c[2], c[3]]))
            .collect();

        Ok(RootView {
            format_type,
            engine_version,
            structure_version,
            schema_version,
            data_schema,
            db_schema,
            table_name,
            nrows,
            delete_vector,
            row_offsets,
            body: buf,
        })
    }

    /// Materializes the record at row number `rnum`.
    pub fn record(&self, rnum: u32) -> TrellisResult<RecordView<'a>> {
        let off = *self
            .row_offsets
            .get(rnum as usize)
            .ok_or(TrellisError::RowIndexOOB {
                rnum,
                nrows: self.nrows,
            })? as usize;

        if off > self.body.len() {
            return Err(TrellisError::corrupt(format!(
                "row {rnum}: offset {off} beyond body of {} bytes",
                self.body.len()
            )));
        }

        let mut buf = &self.body[off..];
        let rid = get_i64(&mut buf, "record rid")?;
        let mut nullbits = [0u64; NULLBITS_WORDS];
        for word in nullbits.iter_mut() {
            *word = get_u64(&mut buf, "record nullbits")?;
        }
        let ncells = get_u32(&mut buf, "record ncells")? as usize;
        let ends = take(&mut buf, ncells * 4, "record cell_ends")?;

        let data_len = if ncells == 0 {
            0
        } else {
            let tail = &ends[(ncells - 1) * 4..];
            u32::from_be_bytes([tail[0], tail[1], tail[2], tail[3]]) as usize
        };
        let data = take(&mut buf, data_len, "record cell data")?;

        Ok(RecordView {
            rid,
            nullbits,
            ncells,
            ends,
            data,
        })
    }
}

/// One decoded record: id, nullbits, and a borrowed cell region.
#[derive(Debug, Clone, Copy)]
pub struct RecordView<'a> {
    /// Record id; -1 marks a synthetic aggregate-output row.
    pub rid: i64,
    nullbits: [u64; NULLBITS_WORDS],
    ncells: usize,
    ends: &'a [u8],
    data: &'a [u8],
}

impl<'a> RecordView<'a> {
    /// Returns the nullbits words.
    pub fn nullbits(&self) -> [u64; NULLBITS_WORDS] {
        self.nullbits
    }

    /// Number of cell slots in this record.
    pub fn ncells(&self) -> usize {
        self.ncells
    }

    /// Tests the nullbit of a column index. Sentinel (negative) indices
    /// are never null.
    pub fn is_null(&self, col_idx: i32) -> bool {
        if col_idx < 0 {
            return false;
        }
        let idx = col_idx as usize;
        let pos = idx / 64;
        if pos >= NULLBITS_WORDS {
            return false;
        }
        self.nullbits[pos] & (1u64 << (idx % 64)) != 0
    }

    fn cell_raw(&self, idx: usize) -> TrellisResult<&'a [u8]> {
        if idx >= self.ncells {
            return Err(TrellisError::corrupt(format!(
                "cell index {idx} beyond record width {}",
                self.ncells
            )));
        }
        let end_at = |i: usize| {
            let b = &self.ends[i * 4..i * 4 + 4];
            u32::from_be_bytes([b[0], b[1], b[2], b[3]]) as usize
        };
        let start = if idx == 0 { 0 } else { end_at(idx - 1) };
        let end = end_at(idx);
        if start > end || end > self.data.len() {
            return Err(TrellisError::corrupt(format!(
                "cell {idx}: slot [{start}, {end}) outside data of {} bytes",
                self.data.len()
            )));
        }
        Ok(&self.data[start..end])
    }

    /// Decodes the cell at source-schema index `col_idx` as `dtype`.
    pub fn cell(&self, col_idx: i32, dtype: DataType) -> TrellisResult<Value> {
        if col_idx < 0 {
            return Err(TrellisError::corrupt(format!(
                "cell access through reserved index {col_idx}"
            )));
        }
        decode_cell(self.cell_raw(col_idx as usize)?, dtype)
    }

    /// Decodes the cell in slot position `pos` as `dtype`.
    ///
    /// Positional access is what a reader of a projected container needs:
    /// the container's schema text keeps the source column indices, but
    /// its records store cells densely in schema-text order.
    pub fn cell_at(&self, pos: usize, dtype: DataType) -> TrellisResult<Value> {
        decode_cell(self.cell_raw(pos)?, dtype)
    }
}

// ---------------------------------------------------------------------------
// Builders
// ---------------------------------------------------------------------------

/// Builds one output record.
///
/// Cells are appended in output-schema order; the record is consumed when
/// pushed into a [`RootBuilder`], so a record can never be half-written
/// into a container.
#[derive(Debug)]
pub struct RecordBuilder {
    rid: i64,
    nullbits: [u64; NULLBITS_WORDS],
    ends: Vec<u32>,
    data: Vec<u8>,
}

impl RecordBuilder {
    /// Creates a record with zeroed nullbits.
    pub fn new(rid: i64) -> Self {
        Self {
            rid,
            nullbits: [0; NULLBITS_WORDS],
            ends: Vec::new(),
            data: Vec::new(),
        }
    }

    /// Replaces the nullbits wholesale (used when carrying a source
    /// record's bits through a projection).
    pub fn with_nullbits(mut self, nullbits: [u64; NULLBITS_WORDS]) -> Self {
        self.nullbits = nullbits;
        self
    }

    /// Sets the nullbit for one column index.
    pub fn set_nullbit(&mut self, col_idx: i32) {
        if col_idx < 0 {
            return;
        }
        let idx = col_idx as usize;
        let pos = idx / 64;
        if pos < NULLBITS_WORDS {
            self.nullbits[pos] |= 1u64 << (idx % 64);
        }
    }

    /// Appends one cell encoded as `dtype`.
    pub fn append(&mut self, value: &Value, dtype: DataType) -> TrellisResult<()> {
        encode_cell(value, dtype, &mut self.data)?;
        self.ends.push(self.data.len() as u32);
        Ok(())
    }

    fn encode_into(&self, out: &mut Vec<u8>) {
        out.put_i64(self.rid);
        for word in &self.nullbits {
            out.put_u64(*word);
        }
        out.put_u32(self.ends.len() as u32);
        for end in &self.ends {
            out.put_u32(*end);
        }
        out.put_slice(&self.data);
    }
}

/// Builds an output container.
///
/// Records are appended through [`RootBuilder::push`]; [`RootBuilder::finish`]
/// consumes the builder and emits the complete byte buffer, so a container
/// is finalized exactly once on every path.
#[derive(Debug)]
pub struct RootBuilder {
    format_type: FormatType,
    engine_version: u32,
    structure_version: u32,
    schema_version: u32,
    data_schema: String,
    db_schema: String,
    table_name: String,
    delete_vector: Vec<u8>,
    row_offsets: Vec<u32>,
    body: Vec<u8>,
}

impl RootBuilder {
    /// Creates a builder with the current engine/layout versions.
    pub fn new(
        format_type: FormatType,
        data_schema: impl Into<String>,
        db_schema: impl Into<String>,
        table_name: impl Into<String>,
    ) -> Self {
        use trellis_common::constants::{ENGINE_VERSION, SCHEMA_VERSION, STRUCTURE_VERSION};
        Self {
            format_type,
            engine_version: ENGINE_VERSION,
            structure_version: STRUCTURE_VERSION,
            schema_version: SCHEMA_VERSION,
            data_schema: data_schema.into(),
            db_schema: db_schema.into(),
            table_name: table_name.into(),
            delete_vector: Vec::new(),
            row_offsets: Vec::new(),
            body: Vec::new(),
        }
    }

    /// Overrides the version triple (used when re-emitting an input
    /// container whose versions must be preserved).
    pub fn with_versions(mut self, engine: u32, structure: u32, schema: u32) -> Self {
        self.engine_version = engine;
        self.structure_version = structure;
        self.schema_version = schema;
        self
    }

    /// Appends a record. `deleted` sets its tombstone byte.
    pub fn push(&mut self, record: RecordBuilder, deleted: bool) {
        self.row_offsets.push(self.body.len() as u32);
        self.delete_vector.push(u8::from(deleted));
        record.encode_into(&mut self.body);
    }

    /// Number of records appended so far.
    pub fn nrows(&self) -> u32 {
        self.row_offsets.len() as u32
    }

    /// Finalizes the container and returns the serialized bytes.
    pub fn finish(self) -> Vec<u8> {
        let mut out = Vec::with_capacity(64 + self.body.len());
        out.put_u32(ROW_CONTAINER_MAGIC);
        out.put_u8(self.format_type.as_u8());
        out.put_u32(self.engine_version);
        out.put_u32(self.structure_version);
        out.put_u32(self.schema_version);
        put_str(&mut out, &self.data_schema);
        put_str(&mut out, &self.db_schema);
        put_str(&mut out, &self.table_name);
        out.put_u32(self.row_offsets.len() as u32);
        out.put_slice(&self.delete_vector);
        for off in &self.row_offsets {
            out.put_u32(*off);
        }
        out.put_slice(&self.body);
        out
    }
}
