//! Forward cursor over the records of a payload.
use log::trace;
use smallvec::SmallVec;

use crate::{
    datetime::DateTime,
    error::PayloadResult,
    field::Field,
    payload::Payload,
    price::Price,
    record::decode_record,
};

/// Address of the record's value bytes and the buffer generation a cached decode
/// belongs to. The address tells apart equal offsets in different payloads.
type CacheKey = (usize, u32);

/// Secondary decodes of vector fields, kept for the field most recently asked
/// about.
#[derive(Debug, Default)]
struct VectorCache<'a> {
    key: Option<CacheKey>,
    strings: Option<SmallVec<[&'a str; 8]>>,
    times: Option<Vec<DateTime>>,
    prices: Option<Vec<Price>>,
    msgs: Option<Vec<Payload>>,
}

impl<'a> VectorCache<'a> {
    fn select(&mut self, field: &Field<'a>) {
        let key = (field.data().as_ptr() as usize, field.span().generation());
        if self.key != Some(key) {
            self.reset();
            self.key = Some(key);
        }
    }

    fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Cursor over a payload's records, in buffer order.
///
/// The cursor borrows the payload, so the payload cannot change underneath it.
pub struct FieldIter<'a> {
    payload: &'a Payload,
    cursor: usize,
    index: usize,
    cache: VectorCache<'a>,
}

impl<'a> FieldIter<'a> {
    pub fn new(payload: &'a Payload) -> Self {
        Self {
            payload,
            cursor: payload.header().size(),
            index: 0,
            cache: VectorCache::default(),
        }
    }

    /// Rebind to `payload` and rewind to its first record.
    pub fn associate(&mut self, payload: &'a Payload) {
        self.payload = payload;
        self.rewind();
        self.cache.reset();
    }

    fn rewind(&mut self) {
        self.cursor = self.payload.header().size();
        self.index = 0;
    }

    /// First record, if any. The cursor is rewound afterwards, so the next call
    /// to [`Iterator::next`] yields the same record.
    pub fn begin(&mut self) -> Option<Field<'a>> {
        self.rewind();
        let first = self.next();
        self.rewind();
        first
    }

    #[inline]
    pub fn has_next(&self) -> bool {
        self.cursor < self.payload.byte_size()
    }

    /// Strings of a `VectorString` field, decoded once per field.
    pub fn vector_strings(&mut self, field: &Field<'a>) -> PayloadResult<&[&'a str]> {
        self.cache.select(field);
        if self.cache.strings.is_none() {
            let strings = field.get_vector_string()?.iter().collect();
            self.cache.strings = Some(strings);
        }
        Ok(self.cache.strings.as_deref().unwrap_or_default())
    }

    /// Elements of a `VectorTime` field, decoded once per field.
    pub fn vector_date_times(&mut self, field: &Field<'a>) -> PayloadResult<&[DateTime]> {
        self.cache.select(field);
        if self.cache.times.is_none() {
            self.cache.times = Some(field.get_vector::<DateTime>()?.to_vec());
        }
        Ok(self.cache.times.as_deref().unwrap_or_default())
    }

    /// Elements of a `VectorPrice` field, decoded once per field.
    pub fn vector_prices(&mut self, field: &Field<'a>) -> PayloadResult<&[Price]> {
        self.cache.select(field);
        if self.cache.prices.is_none() {
            self.cache.prices = Some(field.get_vector::<Price>()?.to_vec());
        }
        Ok(self.cache.prices.as_deref().unwrap_or_default())
    }

    /// Sub-payloads of a `VectorMsg` field, rebuilt once per field.
    pub fn vector_msgs(&mut self, field: &Field<'a>) -> PayloadResult<&[Payload]> {
        self.cache.select(field);
        if self.cache.msgs.is_none() {
            let msgs = field
                .get_vector_msg()?
                .iter()
                .map(Payload::from_byte_buffer)
                .collect::<PayloadResult<Vec<_>>>()?;
            self.cache.msgs = Some(msgs);
        }
        Ok(self.cache.msgs.as_deref().unwrap_or_default())
    }
}

impl<'a> Iterator for FieldIter<'a> {
    type Item = Field<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        if !self.has_next() {
            return None;
        }

        let used = self.payload.serialize();
        match decode_record(used, self.cursor, self.payload.generation()) {
            Ok(span) => {
                let field = Field::new(span, used, self.index);
                self.cursor = span.end();
                self.index += 1;
                Some(field)
            }
            Err(e) => {
                // Unreachable for buffers accepted by `unserialize` or built by `add`
                trace!("Stopping iteration at corrupt record {}: {}", self.cursor, e);
                self.cursor = used.len();
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Payload {
        let mut p = Payload::new();
        p.add(None, 1, 10i32).unwrap();
        p.add_vector_string(Some("names"), 2, &["a", "bc"]).unwrap();
        p.add_vector(None, 3, &[DateTime::from_epoch_millis(5)]).unwrap();
        p
    }

    #[test]
    fn begin_does_not_consume() {
        let p = sample();
        let mut it = p.iter();
        assert_eq!(it.begin().unwrap().fid(), 1);
        assert_eq!(it.next().unwrap().fid(), 1);
        assert_eq!(it.next().unwrap().index(), 1);
        assert!(it.has_next());
        it.next();
        assert!(!it.has_next());
        assert!(it.next().is_none());
    }

    #[test]
    fn begin_on_empty_payload() {
        let p = Payload::new();
        let mut it = p.iter();
        assert!(it.begin().is_none());
        assert!(!it.has_next());
    }

    #[test]
    fn vector_caches_follow_the_requested_field() {
        let p = sample();
        let mut it = p.iter();
        let fields: Vec<_> = p.iter().collect();

        assert_eq!(it.vector_strings(&fields[1]).unwrap(), &["a", "bc"]);
        assert_eq!(it.vector_strings(&fields[1]).unwrap().len(), 2);
        assert_eq!(
            it.vector_date_times(&fields[2]).unwrap(),
            &[DateTime::from_epoch_millis(5)]
        );
        assert!(it.vector_strings(&fields[2]).is_err());
        assert!(it.vector_prices(&fields[0]).is_err());
    }

    #[test]
    fn vector_cache_tells_payloads_apart() {
        let mut a = Payload::new();
        a.add_vector_string(None, 1, &["alpha"]).unwrap();
        let mut b = Payload::new();
        b.add_vector_string(None, 1, &["beta"]).unwrap();

        let fa = a.iter().next().unwrap();
        let fb = b.iter().next().unwrap();
        assert_eq!(fa.span().offset(), fb.span().offset());
        assert_eq!(fa.span().generation(), fb.span().generation());

        let mut it = a.iter();
        assert_eq!(it.vector_strings(&fa).unwrap(), &["alpha"]);
        assert_eq!(it.vector_strings(&fb).unwrap(), &["beta"]);
        assert_eq!(it.vector_strings(&fa).unwrap(), &["alpha"]);
    }

    #[test]
    fn associate_rebinds_and_rewinds() {
        let a = sample();
        let b = Payload::new();
        let mut it = a.iter();
        it.next();
        it.associate(&b);
        assert!(it.next().is_none());
        it.associate(&a);
        assert_eq!(it.count(), 3);
    }
}
