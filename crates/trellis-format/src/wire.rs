//! Primitive read/write helpers shared by the container codecs.
//!
//! All integers are big-endian; strings are `u32`-length-prefixed UTF-8.
//! Readers operate on `&mut &[u8]` so decoded views can keep borrowing
//! from the caller's buffer.

use bytes::{Buf, BufMut};

use trellis_common::{TrellisError, TrellisResult};

pub(crate) fn take<'a>(buf: &mut &'a [u8], n: usize, what: &str) -> TrellisResult<&'a [u8]> {
    if buf.len() < n {
        return Err(TrellisError::truncated(format!(
            "{what}: need {n} bytes, {} remain",
            buf.len()
        )));
    }
    let (head, tail) = buf.split_at(n);
    *buf = tail;
    Ok(head)
}

pub(crate) fn get_u8(buf: &mut &[u8], what: &str) -> TrellisResult<u8> {
    if buf.remaining() < 1 {
        return Err(TrellisError::truncated(format!("{what}: need 1 byte")));
    }
    Ok(buf.get_u8())
}

pub(crate) fn get_u32(buf: &mut &[u8], what: &str) -> TrellisResult<u32> {
    if buf.remaining() < 4 {
        return Err(TrellisError::truncated(format!(
            "{what}: need 4 bytes, {} remain",
            buf.remaining()
        )));
    }
    Ok(buf.get_u32())
}

pub(crate) fn get_u64(buf: &mut &[u8], what: &str) -> TrellisResult<u64> {
    if buf.remaining() < 8 {
        return Err(TrellisError::truncated(format!(
            "{what}: need 8 bytes, {} remain",
            buf.remaining()
        )));
    }
    Ok(buf.get_u64())
}

pub(crate) fn get_i64(buf: &mut &[u8], what: &str) -> TrellisResult<i64> {
    Ok(get_u64(buf, what)? as i64)
}

pub(crate) fn get_str(buf: &mut &[u8], what: &str) -> TrellisResult<String> {
    let len = get_u32(buf, what)? as usize;
    let raw = take(buf, len, what)?;
    String::from_utf8(raw.to_vec())
        .map_err(|_| TrellisError::corrupt(format!("{what}: invalid UTF-8")))
}

pub(crate) fn put_str(out: &mut Vec<u8>, s: &str) {
    out.put_u32(s.len() as u32);
    out.put_slice(s.as_bytes());
}
