//! Secondary layouts inside vector field values.
//!
//! - fixed elements: flat array, `count = len / width`
//! - strings: back-to-back NUL-terminated strings, `count = number of NULs`
//! - messages: `(u32 length, bytes)` pairs walked to the end of the blob
use std::marker::PhantomData;

use crate::{
    error::{PayloadError, PayloadResult},
    types::LENGTH_WIDTH,
    value::FixedElement,
};

/// Lazy view over a vector of fixed-width elements.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScalarVector<'a, T> {
    bytes: &'a [u8],
    _marker: PhantomData<T>,
}

impl<'a, T: FixedElement> ScalarVector<'a, T> {
    pub fn new(bytes: &'a [u8]) -> PayloadResult<Self> {
        if bytes.len() % T::WIDTH != 0 {
            return Err(PayloadError::invalid(format!(
                "{} bytes do not hold a whole number of {} elements",
                bytes.len(),
                T::FIELD_TYPE
            )));
        }
        Ok(Self {
            bytes,
            _marker: PhantomData,
        })
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.bytes.len() / T::WIDTH
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<T> {
        let at = index.checked_mul(T::WIDTH)?;
        self.bytes.get(at..at + T::WIDTH).map(T::read_le)
    }

    pub fn iter(&self) -> impl ExactSizeIterator<Item = T> + use<'a, T> {
        self.bytes.chunks_exact(T::WIDTH).map(T::read_le)
    }

    pub fn to_vec(&self) -> Vec<T> {
        self.iter().collect()
    }

    #[inline]
    pub fn as_bytes(&self) -> &'a [u8] {
        self.bytes
    }
}

/// Lazy view over a string vector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StringVector<'a> {
    content: &'a str,
}

impl<'a> StringVector<'a> {
    pub fn new(bytes: &'a [u8]) -> PayloadResult<Self> {
        if !bytes.is_empty() && bytes.last() != Some(&0) {
            return Err(PayloadError::invalid("string vector is not NUL-terminated"));
        }
        let content = std::str::from_utf8(bytes)
            .map_err(|e| PayloadError::invalid(format!("string vector is not valid UTF-8: {e}")))?;
        Ok(Self { content })
    }

    pub fn len(&self) -> usize {
        self.content.bytes().filter(|&b| b == 0).count()
    }

    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &'a str> + use<'a> {
        self.content.split_terminator('\0')
    }

    pub fn to_vec(&self) -> Vec<String> {
        self.iter().map(str::to_owned).collect()
    }

    #[inline]
    pub fn as_bytes(&self) -> &'a [u8] {
        self.content.as_bytes()
    }
}

/// Lazy view over a vector of serialized sub-payloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MsgVector<'a> {
    bytes: &'a [u8],
}

impl<'a> MsgVector<'a> {
    pub fn new(bytes: &'a [u8]) -> Self {
        Self { bytes }
    }

    pub fn len(&self) -> usize {
        self.iter().count()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    #[inline]
    pub fn as_bytes(&self) -> &'a [u8] {
        self.bytes
    }

    /// Serialized bytes of each element. Walking stops at the first element
    /// whose length runs past the blob.
    pub fn iter(&self) -> MsgVectorIter<'a> {
        MsgVectorIter {
            bytes: self.bytes,
            at: 0,
        }
    }
}

pub struct MsgVectorIter<'a> {
    bytes: &'a [u8],
    at: usize,
}

impl<'a> Iterator for MsgVectorIter<'a> {
    type Item = &'a [u8];

    fn next(&mut self) -> Option<Self::Item> {
        let header = self.bytes.get(self.at..self.at + LENGTH_WIDTH)?;
        let len = u32::from_le_bytes([header[0], header[1], header[2], header[3]]) as usize;
        let start = self.at + LENGTH_WIDTH;
        let Some(element) = self.bytes.get(start..start + len) else {
            self.at = self.bytes.len();
            return None;
        };
        self.at = start + len;
        Some(element)
    }
}

pub(crate) fn encode_vector<T: FixedElement>(values: &[T]) -> Vec<u8> {
    let mut out = vec![0u8; values.len() * T::WIDTH];
    for (chunk, value) in out.chunks_exact_mut(T::WIDTH).zip(values) {
        value.write_le(chunk);
    }
    out
}

pub(crate) fn encode_strings<S: AsRef<str>>(values: &[S]) -> PayloadResult<Vec<u8>> {
    let mut out = Vec::with_capacity(values.iter().map(|s| s.as_ref().len() + 1).sum());
    for value in values {
        let value = value.as_ref();
        if value.contains('\0') {
            return Err(PayloadError::invalid(format!(
                "string vector element {value:?} contains a NUL byte"
            )));
        }
        out.extend_from_slice(value.as_bytes());
        out.push(0);
    }
    Ok(out)
}

pub(crate) fn encode_msgs<'m, I>(messages: I) -> PayloadResult<Vec<u8>>
where
    I: IntoIterator<Item = &'m [u8]>,
{
    let mut out = Vec::new();
    for msg in messages {
        let len = u32::try_from(msg.len()).map_err(|_| {
            PayloadError::invalid(format!("sub-message of {} bytes is too large", msg.len()))
        })?;
        out.extend_from_slice(&len.to_le_bytes());
        out.extend_from_slice(msg);
    }
    Ok(out)
}
