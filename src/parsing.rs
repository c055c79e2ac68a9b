//! Small in-crate binary parsing helpers: length-prefixed vectors and
//! big-endian integers of various widths, as plain functions over
//! `bytes::Bytes`.

use bytes::{Buf, Bytes};

use crate::error::{Result, TlsError};

pub const U8_LIMIT: usize = u8::MAX as usize;
pub const U16_LIMIT: usize = u16::MAX as usize;
pub const U24_LIMIT: usize = 1 << 24;
pub const U32_LIMIT: usize = u32::MAX as usize;

fn decode_error(msg: impl Into<String>) -> TlsError {
    TlsError::DecodeError(msg.into())
}

/// A forward-only cursor over a `Bytes` buffer used while parsing a single
/// message or extension body. Every read either succeeds and advances the
/// cursor, or fails with `DecodeError` and leaves the cursor unspecified.
pub struct Cursor {
    data: Bytes,
}

impl Cursor {
    pub fn new(data: Bytes) -> Self {
        Cursor { data }
    }

    pub fn remaining(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn take_exact(&mut self, n: usize) -> Result<Bytes> {
        if self.data.len() < n {
            return Err(decode_error("unexpected end of input"));
        }
        Ok(self.data.split_to(n))
    }

    pub fn rest(self) -> Bytes {
        self.data
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        if self.data.is_empty() {
            return Err(decode_error("unexpected end of input"));
        }
        Ok(self.data.get_u8())
    }

    pub fn read_u16(&mut self) -> Result<u16> {
        if self.data.len() < 2 {
            return Err(decode_error("unexpected end of input"));
        }
        Ok(self.data.get_u16())
    }

    pub fn read_u24(&mut self) -> Result<u32> {
        let b = self.take_exact(3)?;
        Ok(((b[0] as u32) << 16) | ((b[1] as u32) << 8) | (b[2] as u32))
    }

    pub fn read_u32(&mut self) -> Result<u32> {
        if self.data.len() < 4 {
            return Err(decode_error("unexpected end of input"));
        }
        Ok(self.data.get_u32())
    }

    /// Reads a length-prefixed vector the way TLS does: the width of the
    /// length field is the minimum number of bytes needed to represent
    /// `max_bytes`.
    pub fn read_varlen_vector(&mut self, min_bytes: usize, max_bytes: usize) -> Result<Bytes> {
        let len = if max_bytes <= U8_LIMIT {
            self.read_u8()? as usize
        } else if max_bytes <= U16_LIMIT {
            self.read_u16()? as usize
        } else if max_bytes <= U24_LIMIT {
            self.read_u24()? as usize
        } else if max_bytes <= U32_LIMIT {
            self.read_u32()? as usize
        } else {
            return Err(TlsError::InternalError(
                "unsupported max_bytes for varlen vector".into(),
            ));
        };

        if len < min_bytes || len > max_bytes {
            return Err(decode_error("length field out of allowed range"));
        }

        self.take_exact(len)
    }
}

pub fn write_u24(out: &mut Vec<u8>, v: u32) {
    out.push((v >> 16) as u8);
    out.push((v >> 8) as u8);
    out.push(v as u8);
}

/// Writes `f`'s output prefixed by its length, using a field width chosen
/// from `max_bytes` exactly as `read_varlen_vector` expects to read it.
pub fn write_varlen_vector<F: FnOnce(&mut Vec<u8>)>(
    out: &mut Vec<u8>,
    min_bytes: usize,
    max_bytes: usize,
    f: F,
) {
    let width = if max_bytes <= U8_LIMIT {
        1
    } else if max_bytes <= U16_LIMIT {
        2
    } else if max_bytes <= U24_LIMIT {
        3
    } else if max_bytes <= U32_LIMIT {
        4
    } else {
        panic!("unsupported max_bytes for varlen vector");
    };

    let prefix_at = out.len();
    out.resize(prefix_at + width, 0);
    let body_at = out.len();

    f(out);

    let size = out.len() - body_at;
    debug_assert!(size >= min_bytes && size <= max_bytes);

    match width {
        1 => out[prefix_at] = size as u8,
        2 => out[prefix_at..prefix_at + 2].copy_from_slice(&(size as u16).to_be_bytes()),
        3 => {
            let b = (size as u32).to_be_bytes();
            out[prefix_at..prefix_at + 3].copy_from_slice(&b[1..]);
        }
        4 => out[prefix_at..prefix_at + 4].copy_from_slice(&(size as u32).to_be_bytes()),
        _ => unreachable!(),
    }
}
