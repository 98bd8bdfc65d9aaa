//! Encoding of a single field record.
//!
//! ```text
//! type  : u8        field type tag
//! fid   : u16 (LE)  0 = unset
//! name  : bytes     NUL-terminated, a lone NUL when absent
//! [len  : u32 (LE)] only for sized types
//! value : len bytes (sized) | implied-width bytes (fixed)
//! ```
//!
//! Decoding never reads past the end of the slice it is handed, which callers
//! bound at the payload tail.
use crate::{
    error::{PayloadError, PayloadResult},
    types::{FieldType, LENGTH_WIDTH},
};

pub(crate) const TYPE_WIDTH: usize = 1;
pub(crate) const FID_WIDTH: usize = 2;

/// Location of one record inside a payload buffer.
///
/// A span is a set of offsets, never a pointer, and carries the buffer generation
/// it was decoded at. Any mutation of the payload makes it stale; passing a stale
/// span back to the payload is rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordSpan {
    pub(crate) start: usize,
    pub(crate) field_type: FieldType,
    pub(crate) fid: u16,
    pub(crate) name_len: usize,
    pub(crate) data: usize,
    pub(crate) size: usize,
    pub(crate) generation: u32,
}

impl RecordSpan {
    #[inline]
    pub fn field_type(&self) -> FieldType {
        self.field_type
    }

    #[inline]
    pub fn fid(&self) -> u16 {
        self.fid
    }

    /// Offset of the record's type byte.
    #[inline]
    pub fn offset(&self) -> usize {
        self.start
    }

    /// Offset of the first value byte.
    #[inline]
    pub fn data_offset(&self) -> usize {
        self.data
    }

    /// Value size in bytes (for strings, including the terminator).
    #[inline]
    pub fn size(&self) -> usize {
        self.size
    }

    /// Offset one past the last value byte; the next record starts here.
    #[inline]
    pub fn end(&self) -> usize {
        self.data + self.size
    }

    #[inline]
    pub fn generation(&self) -> u32 {
        self.generation
    }

    #[inline]
    pub(crate) fn name_range(&self) -> std::ops::Range<usize> {
        let from = self.start + TYPE_WIDTH + FID_WIDTH;
        from..from + self.name_len
    }

    #[inline]
    pub(crate) fn data_range(&self) -> std::ops::Range<usize> {
        self.data..self.end()
    }

    /// Offset of the explicit length prefix, for sized records.
    #[inline]
    pub(crate) fn length_offset(&self) -> Option<usize> {
        self.field_type
            .is_sized()
            .then(|| self.data - LENGTH_WIDTH)
    }
}

/// Number of bytes a record occupies on the wire.
pub fn encoded_len(field_type: FieldType, name: Option<&str>, value_len: usize) -> usize {
    TYPE_WIDTH
        + FID_WIDTH
        + name.map_or(0, str::len)
        + 1
        + if field_type.is_sized() { LENGTH_WIDTH } else { 0 }
        + value_len
}

/// Value length as stored in a sized record's 4-byte prefix.
pub(crate) fn length_prefix(len: usize) -> PayloadResult<u32> {
    u32::try_from(len).map_err(|_| {
        PayloadError::invalid(format!(
            "value of {len} bytes does not fit a 4-byte length prefix"
        ))
    })
}

/// Write a record into `dst`, which must be exactly [`encoded_len`] bytes long.
///
/// Returns the offset of the value bytes relative to `dst`.
pub fn write_record(
    dst: &mut [u8],
    field_type: FieldType,
    fid: u16,
    name: Option<&str>,
    value: &[u8],
) -> PayloadResult<usize> {
    debug_assert_eq!(dst.len(), encoded_len(field_type, name, value.len()));

    dst[0] = field_type as u8;
    dst[TYPE_WIDTH..TYPE_WIDTH + FID_WIDTH].copy_from_slice(&fid.to_le_bytes());
    let mut at = TYPE_WIDTH + FID_WIDTH;

    if let Some(name) = name {
        dst[at..at + name.len()].copy_from_slice(name.as_bytes());
        at += name.len();
    }
    dst[at] = 0;
    at += 1;

    if field_type.is_sized() {
        dst[at..at + LENGTH_WIDTH].copy_from_slice(&length_prefix(value.len())?.to_le_bytes());
        at += LENGTH_WIDTH;
    }

    dst[at..at + value.len()].copy_from_slice(value);
    Ok(at)
}

#[inline]
fn need(used: &[u8], offset: usize, needed: usize) -> PayloadResult<()> {
    let available = used.len().saturating_sub(offset);
    if needed > available {
        Err(PayloadError::Truncated {
            offset,
            needed,
            available,
        })
    } else {
        Ok(())
    }
}

/// Decode the record starting at `offset`. `used` ends at the payload tail.
pub fn decode_record(used: &[u8], offset: usize, generation: u32) -> PayloadResult<RecordSpan> {
    need(used, offset, TYPE_WIDTH + FID_WIDTH + 1)?;

    let tag = used[offset];
    let field_type =
        FieldType::from_repr(tag).ok_or(PayloadError::UnknownFieldType { tag, offset })?;
    let fid = u16::from_le_bytes([used[offset + 1], used[offset + 2]]);

    let name_start = offset + TYPE_WIDTH + FID_WIDTH;
    let name_len = used[name_start..]
        .iter()
        .position(|&b| b == 0)
        .ok_or(PayloadError::Truncated {
            offset: name_start,
            needed: used.len() - name_start + 1,
            available: used.len() - name_start,
        })?;
    if std::str::from_utf8(&used[name_start..name_start + name_len]).is_err() {
        return Err(PayloadError::invalid(format!(
            "field name at offset {name_start} is not valid UTF-8"
        )));
    }

    let mut data = name_start + name_len + 1;
    let size = match field_type.implied_width() {
        Some(width) => width,
        None => {
            need(used, data, LENGTH_WIDTH)?;
            let mut len = [0u8; LENGTH_WIDTH];
            len.copy_from_slice(&used[data..data + LENGTH_WIDTH]);
            data += LENGTH_WIDTH;
            u32::from_le_bytes(len) as usize
        }
    };
    need(used, data, size)?;

    let span = RecordSpan {
        start: offset,
        field_type,
        fid,
        name_len,
        data,
        size,
        generation,
    };
    validate_value(field_type, &used[span.data_range()], data)?;
    Ok(span)
}

/// Check the internal layout of a value that the record header alone does not
/// describe.
pub(crate) fn validate_value(field_type: FieldType, value: &[u8], offset: usize) -> PayloadResult<()> {
    let malformed = |what: &str| {
        PayloadError::invalid(format!(
            "malformed {field_type} value at offset {offset}: {what}"
        ))
    };

    match field_type {
        FieldType::String => {
            let Some((&0, text)) = value.split_last() else {
                return Err(malformed("missing terminator"));
            };
            if text.contains(&0) {
                return Err(malformed("interior NUL"));
            }
            std::str::from_utf8(value).map_err(|_| malformed("not valid UTF-8"))?;
        }
        FieldType::VectorString => {
            if !value.is_empty() && value.last() != Some(&0) {
                return Err(malformed("missing terminator"));
            }
            std::str::from_utf8(value).map_err(|_| malformed("not valid UTF-8"))?;
        }
        FieldType::VectorMsg => {
            let mut at = 0;
            while at < value.len() {
                let header = value
                    .get(at..at + LENGTH_WIDTH)
                    .ok_or_else(|| malformed("truncated element length"))?;
                let len = u32::from_le_bytes([header[0], header[1], header[2], header[3]]) as usize;
                at += LENGTH_WIDTH;
                if len > value.len() - at {
                    return Err(malformed("element runs past the value"));
                }
                at += len;
            }
        }
        other => {
            if let Some(width) = other.vector_element().and_then(FieldType::implied_width) {
                if value.len() % width != 0 {
                    return Err(malformed("length is not a multiple of the element width"));
                }
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encode(field_type: FieldType, fid: u16, name: Option<&str>, value: &[u8]) -> Vec<u8> {
        let mut out = vec![0u8; encoded_len(field_type, name, value.len())];
        write_record(&mut out, field_type, fid, name, value).unwrap();
        out
    }

    #[test]
    fn fixed_record_layout() {
        let bytes = encode(FieldType::I64, 666, None, &12398i64.to_le_bytes());
        assert_eq!(bytes.len(), 1 + 2 + 1 + 8);
        assert_eq!(bytes[0], FieldType::I64 as u8);
        assert_eq!(&bytes[1..3], &666u16.to_le_bytes());
        assert_eq!(bytes[3], 0);
        assert_eq!(&bytes[4..], &12398i64.to_le_bytes());
    }

    #[test]
    fn sized_record_layout() {
        let bytes = encode(FieldType::Opaque, 103, Some("opaque_field1"), b"opaque value 1");
        let name_end = 3 + "opaque_field1".len();
        assert_eq!(&bytes[3..name_end], b"opaque_field1");
        assert_eq!(bytes[name_end], 0);
        assert_eq!(&bytes[name_end + 1..name_end + 5], &14u32.to_le_bytes());
        assert_eq!(&bytes[name_end + 5..], b"opaque value 1");
    }

    #[test]
    fn decode_reverses_encode() {
        let bytes = encode(FieldType::String, 102, Some("s"), b"teststr\0");
        let span = decode_record(&bytes, 0, 7).unwrap();
        assert_eq!(span.field_type(), FieldType::String);
        assert_eq!(span.fid(), 102);
        assert_eq!(&bytes[span.name_range()], b"s");
        assert_eq!(&bytes[span.data_range()], b"teststr\0");
        assert_eq!(span.end(), bytes.len());
        assert_eq!(span.length_offset(), Some(span.data_offset() - 4));
        assert_eq!(span.generation(), 7);
    }

    #[test]
    fn decode_never_reads_past_the_slice() {
        let bytes = encode(FieldType::F64, 1, Some("price"), &1.5f64.to_le_bytes());
        for cut in 0..bytes.len() {
            assert!(decode_record(&bytes[..cut], 0, 0).is_err(), "cut at {cut}");
        }

        let bytes = encode(FieldType::Opaque, 1, None, b"abcdef");
        assert!(matches!(
            decode_record(&bytes[..bytes.len() - 1], 0, 0),
            Err(PayloadError::Truncated { .. })
        ));
    }

    #[test]
    fn unknown_tag_is_reported() {
        let mut bytes = encode(FieldType::U8, 1, None, &[1]);
        bytes[0] = 0xee;
        assert!(matches!(
            decode_record(&bytes, 0, 0),
            Err(PayloadError::UnknownFieldType { tag: 0xee, offset: 0 })
        ));
    }

    #[test]
    fn value_layout_is_checked() {
        let bytes = encode(FieldType::String, 1, None, b"no terminator");
        assert!(decode_record(&bytes, 0, 0).is_err());

        let bytes = encode(FieldType::VectorI32, 1, None, &[0u8; 6]);
        assert!(decode_record(&bytes, 0, 0).is_err());

        let mut blob = Vec::new();
        blob.extend_from_slice(&10u32.to_le_bytes());
        blob.extend_from_slice(b"short");
        let bytes = encode(FieldType::VectorMsg, 1, None, &blob);
        assert!(decode_record(&bytes, 0, 0).is_err());

        let bytes = encode(FieldType::String, 1, None, b"ab\0d\0");
        assert!(matches!(
            decode_record(&bytes, 0, 0),
            Err(PayloadError::InvalidArgument(_))
        ));
    }

    #[test]
    fn length_prefix_is_bounded_by_u32() {
        assert_eq!(length_prefix(14).unwrap(), 14);
        assert_eq!(length_prefix(u32::MAX as usize).unwrap(), u32::MAX);
        assert!(matches!(
            length_prefix(u32::MAX as usize + 1),
            Err(PayloadError::InvalidArgument(_))
        ));
    }
}
