//! Columnar container codec.
//!
//! A columnar container is a record-batch stream: a stream header naming
//! the schema metadata and the column fields, followed by one or more
//! batches of column buffers. The in-memory [`Table`] holds one typed
//! array per column plus a validity vector; batches are concatenated on
//! decode.
//!
//! Metadata travels as ordered key/value pairs. The eight well-known keys
//! (engine version, schema/structure versions, format tag, schema text,
//! db schema, table name, row count) are written by the transform layer
//! and consumed by the executors and printers.

use bytes::BufMut;
use tracing::debug;

use trellis_common::constants::COLUMNAR_CONTAINER_MAGIC;
use trellis_common::constants::META_NUM_ROWS;
use trellis_common::{DataType, TrellisError, TrellisResult, Value};

use crate::wire::{get_str, get_u32, get_u8, put_str, take};

/// Typed value storage for one column.
///
/// `Char` shares `I8`, `Uchar` shares `U8`, and `Date`/`String` share
/// `Utf8`; the owning [`Column`] keeps the declared [`DataType`].
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnArray {
    I8(Vec<i8>),
    I16(Vec<i16>),
    I32(Vec<i32>),
    I64(Vec<i64>),
    U8(Vec<u8>),
    U16(Vec<u16>),
    U32(Vec<u32>),
    U64(Vec<u64>),
    Bool(Vec<bool>),
    F32(Vec<f32>),
    F64(Vec<f64>),
    Utf8(Vec<String>),
}

impl ColumnArray {
    /// Creates empty storage appropriate for `dtype`.
    pub fn empty_for(dtype: DataType) -> Self {
        match dtype {
            DataType::Int8 | DataType::Char => ColumnArray::I8(Vec::new()),
            DataType::Int16 => ColumnArray::I16(Vec::new()),
            DataType::Int32 => ColumnArray::I32(Vec::new()),
            DataType::Int64 => ColumnArray::I64(Vec::new()),
            DataType::Uint8 | DataType::Uchar => ColumnArray::U8(Vec::new()),
            DataType::Uint16 => ColumnArray::U16(Vec::new()),
            DataType::Uint32 => ColumnArray::U32(Vec::new()),
            DataType::Uint64 => ColumnArray::U64(Vec::new()),
            DataType::Bool => ColumnArray::Bool(Vec::new()),
            DataType::Float => ColumnArray::F32(Vec::new()),
            DataType::Double => ColumnArray::F64(Vec::new()),
            DataType::Date | DataType::String => ColumnArray::Utf8(Vec::new()),
        }
    }

    /// Number of slots.
    pub fn len(&self) -> usize {
        match self {
            ColumnArray::I8(v) => v.len(),
            ColumnArray::I16(v) => v.len(),
            ColumnArray::I32(v) => v.len(),
            ColumnArray::I64(v) => v.len(),
            ColumnArray::U8(v) => v.len(),
            ColumnArray::U16(v) => v.len(),
            ColumnArray::U32(v) => v.len(),
            ColumnArray::U64(v) => v.len(),
            ColumnArray::Bool(v) => v.len(),
            ColumnArray::F32(v) => v.len(),
            ColumnArray::F64(v) => v.len(),
            ColumnArray::Utf8(v) => v.len(),
        }
    }

    /// Returns true if the array holds no slots.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn slice(&self, start: usize, len: usize) -> Self {
        match self {
            ColumnArray::I8(v) => ColumnArray::I8(v[start..start + len].to_vec()),
            ColumnArray::I16(v) => ColumnArray::I16(v[start..start + len].to_vec()),
            ColumnArray::I32(v) => ColumnArray::I32(v[start..start + len].to_vec()),
            ColumnArray::I64(v) => ColumnArray::I64(v[start..start + len].to_vec()),
            ColumnArray::U8(v) => ColumnArray::U8(v[start..start + len].to_vec()),
            ColumnArray::U16(v) => ColumnArray::U16(v[start..start + len].to_vec()),
            ColumnArray::U32(v) => ColumnArray::U32(v[start..start + len].to_vec()),
            ColumnArray::U64(v) => ColumnArray::U64(v[start..start + len].to_vec()),
            ColumnArray::Bool(v) => ColumnArray::Bool(v[start..start + len].to_vec()),
            ColumnArray::F32(v) => ColumnArray::F32(v[start..start + len].to_vec()),
            ColumnArray::F64(v) => ColumnArray::F64(v[start..start + len].to_vec()),
            ColumnArray::Utf8(v) => ColumnArray::Utf8(v[start..start + len].to_vec()),
        }
    }

    fn extend_from(&mut self, other: &Self) -> TrellisResult<()> {
        match (self, other) {
            (ColumnArray::I8(a), ColumnArray::I8(b)) => a.extend_from_slice(b),
            (ColumnArray::I16(a), ColumnArray::I16(b)) => a.extend_from_slice(b),
            (ColumnArray::I32(a), ColumnArray::I32(b)) => a.extend_from_slice(b),
            (ColumnArray::I64(a), ColumnArray::I64(b)) => a.extend_from_slice(b),
            (ColumnArray::U8(a), ColumnArray::U8(b)) => a.extend_from_slice(b),
            (ColumnArray::U16(a), ColumnArray::U16(b)) => a.extend_from_slice(b),
            (ColumnArray::U32(a), ColumnArray::U32(b)) => a.extend_from_slice(b),
            (ColumnArray::U64(a), ColumnArray::U64(b)) => a.extend_from_slice(b),
            (ColumnArray::Bool(a), ColumnArray::Bool(b)) => a.extend_from_slice(b),
            (ColumnArray::F32(a), ColumnArray::F32(b)) => a.extend_from_slice(b),
            (ColumnArray::F64(a), ColumnArray::F64(b)) => a.extend_from_slice(b),
            (ColumnArray::Utf8(a), ColumnArray::Utf8(b)) => a.extend_from_slice(b),
            _ => return Err(TrellisError::TableConcatSchemaMismatch),
        }
        Ok(())
    }
}

/// One named, typed column with per-slot validity.
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    /// Column name.
    pub name: String,
    /// Declared cell type.
    pub dtype: DataType,
    /// Per-slot validity; false means null.
    pub validity: Vec<bool>,
    /// Typed value storage.
    pub array: ColumnArray,
}

impl Column {
    /// Creates an empty column.
    pub fn new(name: impl Into<String>, dtype: DataType) -> Self {
        Self {
            name: name.into(),
            dtype,
            validity: Vec::new(),
            array: ColumnArray::empty_for(dtype),
        }
    }

    /// Number of slots.
    pub fn len(&self) -> usize {
        self.validity.len()
    }

    /// Returns true if the column has no slots.
    pub fn is_empty(&self) -> bool {
        self.validity.is_empty()
    }

    /// Appends one value. `Value::Null` appends a null slot.
    pub fn append(&mut self, value: &Value) -> TrellisResult<()> {
        if value.is_null() {
            self.append_null();
            return Ok(());
        }
        match (&mut self.array, value) {
            (ColumnArray::I8(v), Value::Int8(x)) => v.push(*x),
            (ColumnArray::I8(v), Value::Char(x)) => v.push(*x),
            (ColumnArray::I16(v), Value::Int16(x)) => v.push(*x),
            (ColumnArray::I32(v), Value::Int32(x)) => v.push(*x),
            (ColumnArray::I64(v), Value::Int64(x)) => v.push(*x),
            (ColumnArray::U8(v), Value::Uint8(x)) => v.push(*x),
            (ColumnArray::U8(v), Value::Uchar(x)) => v.push(*x),
            (ColumnArray::U16(v), Value::Uint16(x)) => v.push(*x),
            (ColumnArray::U32(v), Value::Uint32(x)) => v.push(*x),
            (ColumnArray::U64(v), Value::Uint64(x)) => v.push(*x),
            (ColumnArray::Bool(v), Value::Bool(x)) => v.push(*x),
            (ColumnArray::F32(v), Value::Float(x)) => v.push(*x),
            (ColumnArray::F64(v), Value::Double(x)) => v.push(*x),
            (ColumnArray::Utf8(v), Value::Str(x) | Value::Date(x)) => v.push(x.clone()),
            (_, value) => {
                return Err(TrellisError::corrupt(format!(
                    "column {}: value {value:?} does not fit {:?}",
                    self.name, self.dtype
                )))
            }
        }
        self.validity.push(true);
        Ok(())
    }

    /// Appends a null slot.
    pub fn append_null(&mut self) {
        match &mut self.array {
            ColumnArray::I8(v) => v.push(0),
            ColumnArray::I16(v) => v.push(0),
            ColumnArray::I32(v) => v.push(0),
            ColumnArray::I64(v) => v.push(0),
            ColumnArray::U8(v) => v.push(0),
            ColumnArray::U16(v) => v.push(0),
            ColumnArray::U32(v) => v.push(0),
            ColumnArray::U64(v) => v.push(0),
            ColumnArray::Bool(v) => v.push(false),
            ColumnArray::F32(v) => v.push(0.0),
            ColumnArray::F64(v) => v.push(0.0),
            ColumnArray::Utf8(v) => v.push(String::new()),
        }
        self.validity.push(false);
    }

    /// Returns the value in slot `row`, `Value::Null` for null slots.
    pub fn value(&self, row: usize) -> Value {
        if !self.validity.get(row).copied().unwrap_or(false) {
            return Value::Null;
        }
        match (&self.array, self.dtype) {
            (ColumnArray::I8(v), DataType::Char) => Value::Char(v[row]),
            (ColumnArray::I8(v), _) => Value::Int8(v[row]),
            (ColumnArray::I16(v), _) => Value::Int16(v[row]),
            (ColumnArray::I32(v), _) => Value::Int32(v[row]),
            (ColumnArray::I64(v), _) => Value::Int64(v[row]),
            (ColumnArray::U8(v), DataType::Uchar) => Value::Uchar(v[row]),
            (ColumnArray::U8(v), _) => Value::Uint8(v[row]),
            (ColumnArray::U16(v), _) => Value::Uint16(v[row]),
            (ColumnArray::U32(v), _) => Value::Uint32(v[row]),
            (ColumnArray::U64(v), _) => Value::Uint64(v[row]),
            (ColumnArray::Bool(v), _) => Value::Bool(v[row]),
            (ColumnArray::F32(v), _) => Value::Float(v[row]),
            (ColumnArray::F64(v), _) => Value::Double(v[row]),
            (ColumnArray::Utf8(v), DataType::Date) => Value::Date(v[row].clone()),
            (ColumnArray::Utf8(v), _) => Value::Str(v[row].clone()),
        }
    }

    fn slice(&self, start: usize, len: usize) -> Self {
        Self {
            name: self.name.clone(),
            dtype: self.dtype,
            validity: self.validity[start..start + len].to_vec(),
            array: self.array.slice(start, len),
        }
    }
}

/// An in-memory columnar table: metadata plus typed columns.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Table {
    /// Ordered metadata key/value pairs.
    pub metadata: Vec<(String, String)>,
    /// Columns in schema order.
    pub columns: Vec<Column>,
}

impl Table {
    /// Creates a table from columns and metadata.
    pub fn new(columns: Vec<Column>, metadata: Vec<(String, String)>) -> Self {
        Self { metadata, columns }
    }

    /// Number of rows (slots of the first column).
    pub fn nrows(&self) -> usize {
        self.columns.first().map_or(0, Column::len)
    }

    /// Number of columns.
    pub fn ncols(&self) -> usize {
        self.columns.len()
    }

    /// Looks up a metadata value.
    pub fn metadata_value(&self, key: &str) -> Option<&str> {
        self.metadata
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Sets or replaces a metadata entry, preserving key order.
    pub fn set_metadata(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.metadata.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.metadata.push((key, value)),
        }
    }

    /// Finds a column by name (case-insensitive, matching schema-name
    /// semantics).
    pub fn column_by_name(&self, name: &str) -> Option<&Column> {
        self.columns
            .iter()
            .find(|c| c.name.eq_ignore_ascii_case(name))
    }

    /// Returns the `(name, dtype)` pairs describing the columns.
    pub fn fields(&self) -> Vec<(&str, DataType)> {
        self.columns
            .iter()
            .map(|c| (c.name.as_str(), c.dtype))
            .collect()
    }

    /// Builds a new table holding only the named columns, in the order
    /// given. Unknown names are skipped. Metadata is carried over.
    pub fn project(&self, names: &[String]) -> Table {
        let mut columns = Vec::with_capacity(names.len());
        for name in names {
            if let Some(col) = self.column_by_name(name) {
                columns.push(col.clone());
            }
        }
        Table {
            metadata: self.metadata.clone(),
            columns,
        }
    }

    /// Splits the table into pieces of at most `max_rows` rows.
    ///
    /// Every piece carries a copy of the metadata with the row count
    /// patched to the piece's size.
    pub fn split(&self, max_rows: usize) -> Vec<Table> {
        assert!(max_rows > 0, "max_rows must be positive");
        let nrows = self.nrows();
        let mut pieces = Vec::new();
        let mut offset = 0;
        while offset < nrows {
            let len = max_rows.min(nrows - offset);
            let columns = self.columns.iter().map(|c| c.slice(offset, len)).collect();
            let mut piece = Table {
                metadata: self.metadata.clone(),
                columns,
            };
            piece.set_metadata(META_NUM_ROWS, len.to_string());
            pieces.push(piece);
            offset += len;
        }
        debug!(nrows, max_rows, pieces = pieces.len(), "split columnar table");
        pieces
    }

    /// Concatenates tables sharing an identical column layout.
    ///
    /// Metadata is taken from the first table with the row count patched
    /// to the combined size. Differing layouts fail with
    /// `TableConcatSchemaMismatch`.
    pub fn concat(tables: Vec<Table>) -> TrellisResult<Table> {
        let mut iter = tables.into_iter();
        let mut out = iter
            .next()
            .ok_or_else(|| TrellisError::corrupt("concat of zero tables"))?;

        for table in iter {
            if table.fields() != out.fields() {
                return Err(TrellisError::TableConcatSchemaMismatch);
            }
            for (dst, src) in out.columns.iter_mut().zip(&table.columns) {
                dst.validity.extend_from_slice(&src.validity);
                dst.array.extend_from(&src.array)?;
            }
        }
        let total = out.nrows();
        out.set_metadata(META_NUM_ROWS, total.to_string());
        Ok(out)
    }

    // -----------------------------------------------------------------------
    // Wire codec
    // -----------------------------------------------------------------------

    /// Serializes the table as a single-batch stream.
    pub fn to_buffer(&self) -> Vec<u8> {
        let nrows = self.nrows();
        let mut out = Vec::new();
        out.put_u32(COLUMNAR_CONTAINER_MAGIC);

        out.put_u32(self.metadata.len() as u32);
        for (key, value) in &self.metadata {
            put_str(&mut out, key);
            put_str(&mut out, value);
        }

        out.put_u32(self.columns.len() as u32);
        for col in &self.columns {
            put_str(&mut out, &col.name);
            out.put_u8(col.dtype.as_u8());
        }

        // Single batch.
        out.put_u32(1);
        out.put_u32(nrows as u32);
        for col in &self.columns {
            write_validity(&mut out, &col.validity);
            write_values(&mut out, &col.array);
        }
        out
    }

    /// Reconstructs a table from a serialized batch stream, concatenating
    /// all batches.
    pub fn from_buffer(bytes: &[u8]) -> TrellisResult<Table> {
        let mut buf = bytes;

        let magic = get_u32(&mut buf, "columnar magic")?;
        if magic != COLUMNAR_CONTAINER_MAGIC {
            return Err(TrellisError::BadMagic {
                expected: COLUMNAR_CONTAINER_MAGIC,
                found: magic,
            });
        }

        let nmeta = get_u32(&mut buf, "metadata count")? as usize;
        let mut metadata = Vec::with_capacity(nmeta);
        for _ in 0..nmeta {
            let key = get_str(&mut buf, "metadata key")?;
            let value = get_str(&mut buf, "metadata value")?;
            metadata.push((key, value));
        }

        let ncols = get_u32(&mut buf, "column count")? as usize;
        let mut columns = Vec::with_capacity(ncols);
        for _ in 0..ncols {
            let name = get_str(&mut buf, "column name")?;
            let dtype = DataType::from_u8(get_u8(&mut buf, "column dtype")?)?;
            columns.push(Column::new(name, dtype));
        }

        let nbatches = get_u32(&mut buf, "batch count")?;
        for _ in 0..nbatches {
            let batch_rows = get_u32(&mut buf, "batch nrows")? as usize;
            for col in columns.iter_mut() {
                let validity = read_validity(&mut buf, batch_rows)?;
                read_values(&mut buf, col, batch_rows)?;
                col.validity.extend_from_slice(&validity);
            }
        }

        Ok(Table { metadata, columns })
    }
}

fn write_validity(out: &mut Vec<u8>, validity: &[bool]) {
    let mut bitmap = vec![0u8; validity.len().div_ceil(8)];
    for (i, valid) in validity.iter().enumerate() {
        if *valid {
            bitmap[i / 8] |= 1 << (i % 8);
        }
    }
    out.extend_from_slice(&bitmap);
}

fn read_validity(buf: &mut &[u8], nrows: usize) -> TrellisResult<Vec<bool>> {
    let bitmap = take(buf, nrows.div_ceil(8), "validity bitmap")?;
    Ok((0..nrows)
        .map(|i| bitmap[i / 8] & (1 << (i % 8)) != 0)
        .collect())
}

fn write_values(out: &mut Vec<u8>, array: &ColumnArray) {
    match array {
        ColumnArray::I8(v) => v.iter().for_each(|x| out.put_i8(*x)),
        ColumnArray::I16(v) => v.iter().for_each(|x| out.put_i16(*x)),
        ColumnArray::I32(v) => v.iter().for_each(|x| out.put_i32(*x)),
        ColumnArray::I64(v) => v.iter().for_each(|x| out.put_i64(*x)),
        ColumnArray::U8(v) => out.put_slice(v),
        ColumnArray::U16(v) => v.iter().for_each(|x| out.put_u16(*x)),
        ColumnArray::U32(v) => v.iter().for_each(|x| out.put_u32(*x)),
        ColumnArray::U64(v) => v.iter().for_each(|x| out.put_u64(*x)),
        ColumnArray::Bool(v) => v.iter().for_each(|x| out.put_u8(u8::from(*x))),
        ColumnArray::F32(v) => v.iter().for_each(|x| out.put_f32(*x)),
        ColumnArray::F64(v) => v.iter().for_each(|x| out.put_f64(*x)),
        ColumnArray::Utf8(v) => v.iter().for_each(|s| put_str(out, s)),
    }
}

fn read_values(buf: &mut &[u8], col: &mut Column, nrows: usize) -> TrellisResult<()> {
    match &mut col.array {
        ColumnArray::I8(v) => {
            let raw = take(buf, nrows, "i8 values")?;
            v.extend(raw.iter().map(|b| *b as i8));
        }
        ColumnArray::I16(v) => {
            let raw = take(buf, nrows * 2, "i16 values")?;
            v.extend(
                raw.chunks_exact(2)
                    .map(|c| i16::from_be_bytes([c[0], c[1]])),
            );
        }
        ColumnArray::I32(v) => {
            let raw = take(buf, nrows * 4, "i32 values")?;
            v.extend(
                raw.chunks_exact(4)
                    .map(|c| i32::from_be_bytes([c[0], c[1], c[2], c[3]])),
            );
        }
        ColumnArray::I64(v) => {
            let raw = take(buf, nrows * 8, "i64 values")?;
            v.extend(
                raw.chunks_exact(8)
                    .map(|c| i64::from_be_bytes(c.try_into().expect("8-byte chunk"))),
            );
        }
        ColumnArray::U8(v) => {
            let raw = take(buf, nrows, "u8 values")?;
            v.extend_from_slice(raw);
        }
        ColumnArray::U16(v) => {
            let raw = take(buf, nrows * 2, "u16 values")?;
            v.extend(
                raw.chunks_exact(2)
                    .map(|c| u16::from_be_bytes([c[0], c[1]])),
            );
        }
        ColumnArray::U32(v) => {
            let raw = take(buf, nrows * 4, "u32 values")?;
            v.extend(
                raw.chunks_exact(4)
                    .map(|c| u32::from_be_bytes([c[0], c[1], c[2], c[3]])),
            );
        }
        ColumnArray::U64(v) => {
            let raw = take(buf, nrows * 8, "u64 values")?;
            v.extend(
                raw.chunks_exact(8)
                    .map(|c| u64::from_be_bytes(c.try_into().expect("8-byte chunk"))),
            );
        }
        ColumnArray::Bool(v) => {
            let raw = take(buf, nrows, "bool values")?;
            v.extend(raw.iter().map(|b| *b != 0));
        }
        ColumnArray::F32(v) => {
            let raw = take(buf, nrows * 4, "f32 values")?;
            v.extend(
                raw.chunks_exact(4)
                    .map(|c| f32::from_be_bytes([c[0], c[1], c[2], c[3]])),
            );
        }
        ColumnArray::F64(v) => {
            let raw = take(buf, nrows * 8, "f64 values")?;
            v.extend(
                raw.chunks_exact(8)
                    .map(|c| f64::from_be_bytes(c.try_into().expect("8-byte chunk"))),
            );
        }
        ColumnArray::Utf8(v) => {
            for _ in 0..nrows {
                v.push(get_str(buf, "utf8 value")?);
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_table() -> Table {
        let mut key = Column::new("ORDERKEY", DataType::Int32);
        let mut price = Column::new("PRICE", DataType::Double);
        let mut comment = Column::new("COMMENT", DataType::String);
        for i in 0..5 {
            key.append(&Value::Int32(i)).unwrap();
            price.append(&Value::Double(f64::from(i) * 10.0)).unwrap();
            if i == 3 {
                comment.append_null();
            } else {
                comment.append(&Value::Str(format!("row {i}"))).unwrap();
            }
        }
        Table::new(
            vec![key, price, comment],
            vec![(META_NUM_ROWS.to_string(), "5".to_string())],
        )
    }

    #[test]
    fn test_buffer_roundtrip() {
        let table = sample_table();
        let bytes = table.to_buffer();
        let decoded = Table::from_buffer(&bytes).unwrap();
        assert_eq!(decoded, table);
    }

    #[test]
    fn test_null_slots_survive_roundtrip() {
        let table = sample_table();
        let decoded = Table::from_buffer(&table.to_buffer()).unwrap();
        assert_eq!(decoded.columns[2].value(3), Value::Null);
        assert_eq!(decoded.columns[2].value(4), Value::Str("row 4".into()));
    }

    #[test]
    fn test_split_covers_every_row() {
        let table = sample_table();
        let pieces = table.split(2);
        assert_eq!(pieces.len(), 3);
        assert_eq!(pieces[0].nrows(), 2);
        assert_eq!(pieces[1].nrows(), 2);
        assert_eq!(pieces[2].nrows(), 1);
        assert_eq!(pieces[2].metadata_value(META_NUM_ROWS), Some("1"));
        assert_eq!(pieces[1].columns[0].value(0), Value::Int32(2));
    }

    #[test]
    fn test_split_then_concat_restores_table() {
        let table = sample_table();
        let joined = Table::concat(table.split(2)).unwrap();
        assert_eq!(joined.nrows(), 5);
        assert_eq!(joined.metadata_value(META_NUM_ROWS), Some("5"));
        assert_eq!(joined.columns, table.columns);
    }

    #[test]
    fn test_concat_schema_mismatch() {
        let a = sample_table();
        let mut b = sample_table();
        b.columns[1].name = "TAX".to_string();
        assert!(matches!(
            Table::concat(vec![a, b]),
            Err(TrellisError::TableConcatSchemaMismatch)
        ));
    }

    #[test]
    fn test_project_by_query_order() {
        let table = sample_table();
        let proj = table.project(&["COMMENT".to_string(), "ORDERKEY".to_string()]);
        assert_eq!(proj.ncols(), 2);
        assert_eq!(proj.columns[0].name, "COMMENT");
        assert_eq!(proj.columns[1].name, "ORDERKEY");
        assert_eq!(proj.nrows(), 5);
    }

    #[test]
    fn test_bad_magic() {
        let mut bytes = sample_table().to_buffer();
        bytes[3] ^= 0xFF;
        assert!(matches!(
            Table::from_buffer(&bytes),
            Err(TrellisError::BadMagic { .. })
        ));
    }
}
