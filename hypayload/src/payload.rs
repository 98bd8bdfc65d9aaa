//! The payload buffer engine: locator, mutation engine and typed accessors.
use log::debug;

use crate::{
    buffer::PayloadBuffer,
    config::PayloadConfig,
    datetime::DateTime,
    error::{PayloadError, PayloadResult},
    field::Field,
    header::WireHeader,
    iter::FieldIter,
    price::Price,
    record::{
        RecordSpan, decode_record, encoded_len, length_prefix, validate_value, write_record,
    },
    types::{FieldType, are_castable},
    value::{FieldValue, Scalar, ScalarValue, VectorElement, encode_fixed, encode_str},
    vector::{ScalarVector, StringVector, encode_msgs, encode_strings, encode_vector},
};

/// A self-describing message payload: a wire header followed by a flat sequence
/// of field records, held in one growable buffer.
///
/// Lookups are linear scans. Every mutation may shift or reallocate the buffer;
/// views borrowed from the payload cannot survive one, and [`RecordSpan`]
/// handles captured before it are rejected by [`Payload::update_record`].
#[derive(Debug, Clone)]
pub struct Payload {
    buf: PayloadBuffer,
    header: WireHeader,
}

impl Default for Payload {
    fn default() -> Self {
        Self::new()
    }
}

fn check_ident(name: Option<&str>, fid: u16) -> PayloadResult<()> {
    match (name, fid) {
        (None, 0) => Err(PayloadError::NullArgument),
        (Some(""), 0) => Err(PayloadError::invalid("empty field name and no fid")),
        (Some(n), _) if n.contains('\0') => Err(PayloadError::invalid(format!(
            "field name {n:?} contains a NUL byte"
        ))),
        _ => Ok(()),
    }
}

fn check_value(field_type: FieldType, value: &[u8]) -> PayloadResult<()> {
    if value.is_empty() {
        return Err(PayloadError::invalid(format!("empty {field_type} value")));
    }
    if field_type.is_sized() {
        length_prefix(value.len())?;
    }
    if let Some(width) = field_type.implied_width() {
        if value.len() != width {
            return Err(PayloadError::invalid(format!(
                "{field_type} value must be {width} bytes, got {}",
                value.len()
            )));
        }
    }
    validate_value(field_type, value, 0)
}

impl Payload {
    pub fn new() -> Self {
        Self::with_config(PayloadConfig::default())
    }

    pub fn with_config(config: PayloadConfig) -> Self {
        let header = WireHeader::current();
        let mut bytes = [0u8; WireHeader::BASE_SIZE];
        header.encode_into(&mut bytes);
        Self {
            buf: PayloadBuffer::with_prefix(config, &bytes),
            header,
        }
    }

    /// Payload rebuilt from wire bytes, with the default configuration.
    pub fn from_byte_buffer(bytes: &[u8]) -> PayloadResult<Self> {
        Self::from_byte_buffer_with(PayloadConfig::default(), bytes)
    }

    pub fn from_byte_buffer_with(config: PayloadConfig, bytes: &[u8]) -> PayloadResult<Self> {
        let mut payload = Self::with_config(config);
        payload.unserialize(bytes)?;
        Ok(payload)
    }

    #[inline]
    pub fn config(&self) -> &PayloadConfig {
        self.buf.config()
    }

    #[inline]
    pub fn header(&self) -> WireHeader {
        self.header
    }

    /// Bytes in use, header included.
    #[inline]
    pub fn byte_size(&self) -> usize {
        self.buf.tail()
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.buf.capacity()
    }

    #[inline]
    pub(crate) fn generation(&self) -> u32 {
        self.buf.generation()
    }

    pub fn num_fields(&self) -> usize {
        self.iter().count()
    }

    pub fn is_empty(&self) -> bool {
        self.byte_size() == self.header.size()
    }

    pub fn iter(&self) -> FieldIter<'_> {
        FieldIter::new(self)
    }

    /// Call `visit` on every field, in buffer order.
    pub fn iterate_fields<F>(&self, mut visit: F)
    where
        F: FnMut(&Field<'_>),
    {
        for field in self.iter() {
            visit(&field);
        }
    }

    /// Drop every field and reset the header. Capacity is kept.
    pub fn clear(&mut self) {
        self.header = WireHeader::current();
        let mut bytes = [0u8; WireHeader::BASE_SIZE];
        self.header.encode_into(&mut bytes);
        self.buf.truncate(WireHeader::BASE_SIZE);
        self.buf.write(0, &bytes);
    }

    /// Wire bytes: header plus every record.
    #[inline]
    pub fn serialize(&self) -> &[u8] {
        self.buf.used()
    }

    #[inline]
    pub fn byte_buffer(&self) -> &[u8] {
        self.serialize()
    }

    /// Replace the whole content with `bytes`.
    ///
    /// The header version must not be newer than [`crate::WIRE_FORMAT_VERSION`]
    /// and every record must decode. On failure the payload is left untouched.
    pub fn unserialize(&mut self, bytes: &[u8]) -> PayloadResult<()> {
        if bytes.is_empty() {
            return Err(PayloadError::invalid("zero-length payload buffer"));
        }
        let header = WireHeader::decode(bytes)?;

        let mut offset = header.size();
        let mut count = 0usize;
        while offset < bytes.len() {
            offset = decode_record(bytes, offset, 0)?.end();
            count += 1;
        }

        self.buf.replace(bytes)?;
        self.header = header;
        debug!(
            "Adopted {} byte payload (wire version {}, {} fields)",
            bytes.len(),
            header.version(),
            count
        );
        Ok(())
    }

    #[inline]
    pub fn set_byte_buffer(&mut self, bytes: &[u8]) -> PayloadResult<()> {
        self.unserialize(bytes)
    }

    /// Deep copy of `other`'s wire bytes into this payload.
    pub fn copy_from(&mut self, other: &Payload) -> PayloadResult<()> {
        self.unserialize(other.serialize())
    }

    /// Upsert every field of `src` into this payload.
    ///
    /// Message vectors, date-time vectors, price vectors and collections are
    /// skipped. The merge is built on a copy, so on error this payload is left
    /// unchanged.
    pub fn apply(&mut self, src: &Payload) -> PayloadResult<()> {
        let mut merged = self.clone();
        for field in src.iter() {
            let value = field.value()?;
            match value {
                FieldValue::VectorMsg(_)
                | FieldValue::VectorTime(_)
                | FieldValue::VectorPrice(_)
                | FieldValue::Collection(_) => continue,
                _ => {
                    merged.update_value(field.name(), field.fid(), &value)?;
                }
            }
        }
        *self = merged;
        Ok(())
    }

    /// Locate a field.
    ///
    /// A record whose fid equals a nonzero `fid` wins outright; otherwise the first
    /// record whose name equals `name` is returned.
    pub fn find(&self, name: Option<&str>, fid: u16) -> PayloadResult<Option<Field<'_>>> {
        check_ident(name, fid)?;
        let name = name.filter(|n| !n.is_empty());

        let mut by_name = None;
        for field in self.iter() {
            if fid != 0 && field.fid() == fid {
                return Ok(Some(field));
            }
            if by_name.is_none() && name.is_some() && field.name() == name {
                by_name = Some(field);
            }
        }
        Ok(by_name)
    }

    pub fn get_field(&self, name: Option<&str>, fid: u16) -> PayloadResult<Field<'_>> {
        self.find(name, fid)?
            .ok_or_else(|| PayloadError::not_found(name, fid))
    }

    pub fn get_field_as_string(&self, name: Option<&str>, fid: u16) -> PayloadResult<String> {
        self.get_field(name, fid)?.as_string()
    }

    /// Append a record. Existing records are never consulted.
    pub fn add_field(
        &mut self,
        field_type: FieldType,
        name: Option<&str>,
        fid: u16,
        value: &[u8],
    ) -> PayloadResult<RecordSpan> {
        check_ident(name, fid)?;
        check_value(field_type, value)?;
        let name = name.filter(|n| !n.is_empty());

        let len = encoded_len(field_type, name, value.len());
        let start = self.buf.append(len)?;
        write_record(
            &mut self.buf.used_mut()[start..start + len],
            field_type,
            fid,
            name,
            value,
        )?;
        decode_record(self.buf.used(), start, self.buf.generation())
    }

    /// Overwrite the field matching `name` / `fid`, or append it if absent.
    ///
    /// A stored scalar of a different but castable type keeps its tag; `value` is
    /// converted into it.
    pub fn update_field(
        &mut self,
        field_type: FieldType,
        name: Option<&str>,
        fid: u16,
        value: &[u8],
    ) -> PayloadResult<RecordSpan> {
        check_ident(name, fid)?;
        check_value(field_type, value)?;

        let found = self.find(name, fid)?.map(|f| f.span());
        let Some(span) = found else {
            return self.add_field(field_type, name, fid, value);
        };

        let stored = span.field_type();
        if stored == field_type {
            self.replace_value(span, value)
        } else if are_castable(stored, field_type) {
            let converted = ScalarValue::read(field_type, value)?.cast_to(stored)?;
            let mut bytes = [0u8; 8];
            let width = span.size();
            converted.write_le(&mut bytes[..width]);
            self.replace_value(span, &bytes[..width])
        } else {
            Err(PayloadError::WrongFieldType {
                stored,
                requested: field_type,
            })
        }
    }

    /// Upsert a decoded value under `name` / `fid`.
    pub fn update_value(
        &mut self,
        name: Option<&str>,
        fid: u16,
        value: &FieldValue<'_>,
    ) -> PayloadResult<RecordSpan> {
        let bytes = value.to_wire_bytes()?;
        self.update_field(value.field_type(), name, fid, &bytes)
    }

    /// Overwrite the record behind a handle obtained earlier.
    ///
    /// The handle must come from the current buffer generation and its stored
    /// type must equal the value's type.
    pub fn update_record(
        &mut self,
        record: RecordSpan,
        value: &FieldValue<'_>,
    ) -> PayloadResult<RecordSpan> {
        if record.generation() != self.buf.generation() {
            return Err(PayloadError::invalid(format!(
                "record handle at offset {} is stale",
                record.offset()
            )));
        }
        if record.field_type() != value.field_type() {
            return Err(PayloadError::WrongFieldType {
                stored: record.field_type(),
                requested: value.field_type(),
            });
        }

        let bytes = value.to_wire_bytes()?;
        check_value(record.field_type(), &bytes)?;
        self.replace_value(record, &bytes)
    }

    /// Resize the value of `span` to `value.len()` and write it.
    fn replace_value(&mut self, span: RecordSpan, value: &[u8]) -> PayloadResult<RecordSpan> {
        let len = length_prefix(value.len())?;
        let delta = value.len() as isize - span.size() as isize;
        // Grows before moving anything, so a refused growth leaves the buffer intact
        self.buf.shift_tail(span.end(), delta)?;

        if let Some(at) = span.length_offset() {
            self.buf.write(at, &len.to_le_bytes());
        }
        self.buf.write(span.data_offset(), value);

        Ok(RecordSpan {
            size: value.len(),
            generation: self.buf.generation(),
            ..span
        })
    }

    pub fn add<T: Scalar>(&mut self, name: Option<&str>, fid: u16, value: T) -> PayloadResult<()> {
        self.add_field(T::FIELD_TYPE, name, fid, &encode_fixed(value))?;
        Ok(())
    }

    pub fn update<T: Scalar>(
        &mut self,
        name: Option<&str>,
        fid: u16,
        value: T,
    ) -> PayloadResult<()> {
        self.update_field(T::FIELD_TYPE, name, fid, &encode_fixed(value))?;
        Ok(())
    }

    pub fn get<T: Scalar>(&self, name: Option<&str>, fid: u16) -> PayloadResult<T> {
        self.get_field(name, fid)?.get::<T>()
    }

    pub fn add_string(&mut self, name: Option<&str>, fid: u16, value: &str) -> PayloadResult<()> {
        self.add_field(FieldType::String, name, fid, &encode_str(value)?)?;
        Ok(())
    }

    pub fn update_string(
        &mut self,
        name: Option<&str>,
        fid: u16,
        value: &str,
    ) -> PayloadResult<()> {
        self.update_field(FieldType::String, name, fid, &encode_str(value)?)?;
        Ok(())
    }

    pub fn get_string(&self, name: Option<&str>, fid: u16) -> PayloadResult<&str> {
        self.get_field(name, fid)?.get_string()
    }

    pub fn add_opaque(&mut self, name: Option<&str>, fid: u16, value: &[u8]) -> PayloadResult<()> {
        self.add_field(FieldType::Opaque, name, fid, value)?;
        Ok(())
    }

    pub fn update_opaque(
        &mut self,
        name: Option<&str>,
        fid: u16,
        value: &[u8],
    ) -> PayloadResult<()> {
        self.update_field(FieldType::Opaque, name, fid, value)?;
        Ok(())
    }

    pub fn get_opaque(&self, name: Option<&str>, fid: u16) -> PayloadResult<&[u8]> {
        self.get_field(name, fid)?.get_opaque()
    }

    pub fn add_date_time(
        &mut self,
        name: Option<&str>,
        fid: u16,
        value: DateTime,
    ) -> PayloadResult<()> {
        self.add_field(FieldType::Time, name, fid, &value.to_le_bytes())?;
        Ok(())
    }

    pub fn update_date_time(
        &mut self,
        name: Option<&str>,
        fid: u16,
        value: DateTime,
    ) -> PayloadResult<()> {
        self.update_field(FieldType::Time, name, fid, &value.to_le_bytes())?;
        Ok(())
    }

    pub fn get_date_time(&self, name: Option<&str>, fid: u16) -> PayloadResult<DateTime> {
        self.get_field(name, fid)?.get_date_time()
    }

    pub fn add_price(&mut self, name: Option<&str>, fid: u16, value: Price) -> PayloadResult<()> {
        self.add_field(FieldType::Price, name, fid, &value.to_le_bytes())?;
        Ok(())
    }

    pub fn update_price(
        &mut self,
        name: Option<&str>,
        fid: u16,
        value: Price,
    ) -> PayloadResult<()> {
        self.update_field(FieldType::Price, name, fid, &value.to_le_bytes())?;
        Ok(())
    }

    pub fn get_price(&self, name: Option<&str>, fid: u16) -> PayloadResult<Price> {
        self.get_field(name, fid)?.get_price()
    }

    /// Embed `msg` as a sub-message holding its full wire bytes.
    pub fn add_msg(&mut self, name: Option<&str>, fid: u16, msg: &Payload) -> PayloadResult<()> {
        self.add_field(FieldType::Msg, name, fid, msg.serialize())?;
        Ok(())
    }

    pub fn update_msg(&mut self, name: Option<&str>, fid: u16, msg: &Payload) -> PayloadResult<()> {
        self.update_field(FieldType::Msg, name, fid, msg.serialize())?;
        Ok(())
    }

    /// Independent copy of an embedded sub-message, with the default
    /// configuration.
    pub fn get_msg(&self, name: Option<&str>, fid: u16) -> PayloadResult<Payload> {
        self.get_field(name, fid)?.get_msg()
    }

    pub fn add_vector<T: VectorElement>(
        &mut self,
        name: Option<&str>,
        fid: u16,
        values: &[T],
    ) -> PayloadResult<()> {
        self.add_field(T::VECTOR_TYPE, name, fid, &encode_vector(values))?;
        Ok(())
    }

    pub fn update_vector<T: VectorElement>(
        &mut self,
        name: Option<&str>,
        fid: u16,
        values: &[T],
    ) -> PayloadResult<()> {
        self.update_field(T::VECTOR_TYPE, name, fid, &encode_vector(values))?;
        Ok(())
    }

    pub fn get_vector<T: VectorElement>(
        &self,
        name: Option<&str>,
        fid: u16,
    ) -> PayloadResult<ScalarVector<'_, T>> {
        self.get_field(name, fid)?.get_vector::<T>()
    }

    pub fn add_vector_string<S: AsRef<str>>(
        &mut self,
        name: Option<&str>,
        fid: u16,
        values: &[S],
    ) -> PayloadResult<()> {
        self.add_field(FieldType::VectorString, name, fid, &encode_strings(values)?)?;
        Ok(())
    }

    pub fn update_vector_string<S: AsRef<str>>(
        &mut self,
        name: Option<&str>,
        fid: u16,
        values: &[S],
    ) -> PayloadResult<()> {
        self.update_field(FieldType::VectorString, name, fid, &encode_strings(values)?)?;
        Ok(())
    }

    pub fn get_vector_string(&self, name: Option<&str>, fid: u16) -> PayloadResult<StringVector<'_>> {
        self.get_field(name, fid)?.get_vector_string()
    }

    pub fn add_vector_msg<'m, I>(&mut self, name: Option<&str>, fid: u16, msgs: I) -> PayloadResult<()>
    where
        I: IntoIterator<Item = &'m Payload>,
    {
        let bytes = encode_msgs(msgs.into_iter().map(Payload::serialize))?;
        self.add_field(FieldType::VectorMsg, name, fid, &bytes)?;
        Ok(())
    }

    pub fn update_vector_msg<'m, I>(
        &mut self,
        name: Option<&str>,
        fid: u16,
        msgs: I,
    ) -> PayloadResult<()>
    where
        I: IntoIterator<Item = &'m Payload>,
    {
        let bytes = encode_msgs(msgs.into_iter().map(Payload::serialize))?;
        self.update_field(FieldType::VectorMsg, name, fid, &bytes)?;
        Ok(())
    }

    /// Independent copies of every sub-message in a message vector, each with
    /// the default configuration.
    pub fn get_vector_msg(&self, name: Option<&str>, fid: u16) -> PayloadResult<Vec<Payload>> {
        self.get_field(name, fid)?
            .get_vector_msg()?
            .iter()
            .map(Self::from_byte_buffer)
            .collect()
    }
}
