use crate::{
    datetime::DateTime,
    dictionary::{FieldDescriptor, FieldDictionary},
    error::{PayloadError, PayloadResult},
    payload::Payload,
    price::Price,
    record::RecordSpan,
    types::{FieldType, are_castable},
    value::{FieldValue, FixedElement, Scalar, ScalarValue, VectorElement, decode_str},
    vector::{MsgVector, ScalarVector, StringVector},
};

/// Zero-copy view of one record, borrowed from its payload.
///
/// Mutating the payload requires `&mut`, so a view can never observe a shifted or
/// reallocated buffer. Keep the [`RecordSpan`] instead when a handle must outlive
/// the borrow.
#[derive(Debug, Clone, Copy)]
pub struct Field<'a> {
    span: RecordSpan,
    buf: &'a [u8],
    index: usize,
}

impl<'a> Field<'a> {
    pub(crate) fn new(span: RecordSpan, buf: &'a [u8], index: usize) -> Self {
        Self { span, buf, index }
    }

    #[inline]
    pub fn field_type(&self) -> FieldType {
        self.span.field_type()
    }

    #[inline]
    pub fn fid(&self) -> u16 {
        self.span.fid()
    }

    /// Inline name; `None` when the record was stored by fid only.
    pub fn name(&self) -> Option<&'a str> {
        std::str::from_utf8(&self.buf[self.span.name_range()])
            .ok()
            .filter(|name| !name.is_empty())
    }

    /// Raw value bytes.
    #[inline]
    pub fn data(&self) -> &'a [u8] {
        &self.buf[self.span.data_range()]
    }

    #[inline]
    pub fn size(&self) -> usize {
        self.span.size()
    }

    #[inline]
    pub fn span(&self) -> RecordSpan {
        self.span
    }

    /// Zero-based position of this record in its payload.
    #[inline]
    pub fn index(&self) -> usize {
        self.index
    }

    fn expect_type(&self, requested: FieldType) -> PayloadResult<()> {
        if self.field_type() == requested {
            Ok(())
        } else {
            Err(self.wrong_type(requested))
        }
    }

    fn wrong_type(&self, requested: FieldType) -> PayloadError {
        PayloadError::WrongFieldType {
            stored: self.field_type(),
            requested,
        }
    }

    pub fn value(&self) -> PayloadResult<FieldValue<'a>> {
        FieldValue::decode(self.field_type(), self.data())
    }

    /// Read a scalar, converting from any castable stored type.
    pub fn get<T: Scalar>(&self) -> PayloadResult<T> {
        let stored = self.field_type();
        if stored == T::FIELD_TYPE {
            Ok(T::read_le(self.data()))
        } else if are_castable(stored, T::FIELD_TYPE) {
            Ok(T::from_value(ScalarValue::read(stored, self.data())?))
        } else {
            Err(self.wrong_type(T::FIELD_TYPE))
        }
    }

    pub fn get_string(&self) -> PayloadResult<&'a str> {
        self.expect_type(FieldType::String)?;
        decode_str(self.data())
    }

    pub fn get_opaque(&self) -> PayloadResult<&'a [u8]> {
        self.expect_type(FieldType::Opaque)?;
        Ok(self.data())
    }

    /// Accepts `Time`, `String`, `F64` (epoch seconds), `I64` (epoch
    /// milliseconds) and `U64` (epoch microseconds).
    pub fn get_date_time(&self) -> PayloadResult<DateTime> {
        match self.field_type() {
            FieldType::Time => Ok(DateTime::read(self.data())),
            FieldType::String => DateTime::parse(decode_str(self.data())?),
            FieldType::F64 => Ok(DateTime::from_epoch_seconds(f64::read_le(self.data()))),
            FieldType::I64 => Ok(DateTime::from_epoch_millis(i64::read_le(self.data()))),
            FieldType::U64 => Ok(DateTime::from_epoch_micros(
                u64::read_le(self.data()).min(i64::MAX as u64) as i64,
            )),
            _ => Err(self.wrong_type(FieldType::Time)),
        }
    }

    /// Accepts `Price` and `F64`.
    pub fn get_price(&self) -> PayloadResult<Price> {
        match self.field_type() {
            FieldType::Price => Ok(Price::read(self.data())),
            FieldType::F64 => Ok(Price::new(f64::read_le(self.data()))),
            _ => Err(self.wrong_type(FieldType::Price)),
        }
    }

    /// Serialized bytes of a nested payload.
    pub fn get_msg_bytes(&self) -> PayloadResult<&'a [u8]> {
        self.expect_type(FieldType::Msg)?;
        Ok(self.data())
    }

    /// Nested payload, rebuilt from a copy of the stored bytes.
    pub fn get_msg(&self) -> PayloadResult<Payload> {
        Payload::from_byte_buffer(self.get_msg_bytes()?)
    }

    pub fn get_vector<T: VectorElement>(&self) -> PayloadResult<ScalarVector<'a, T>> {
        self.expect_type(T::VECTOR_TYPE)?;
        ScalarVector::new(self.data())
    }

    pub fn get_vector_string(&self) -> PayloadResult<StringVector<'a>> {
        self.expect_type(FieldType::VectorString)?;
        StringVector::new(self.data())
    }

    pub fn get_vector_msg(&self) -> PayloadResult<MsgVector<'a>> {
        self.expect_type(FieldType::VectorMsg)?;
        Ok(MsgVector::new(self.data()))
    }

    /// Value rendered the way the payload's `Display` renders it.
    pub fn as_string(&self) -> PayloadResult<String> {
        Ok(self.value()?.to_string())
    }

    /// Descriptor for this record: looked up by fid when one is set, by inline name
    /// otherwise.
    pub fn descriptor<'d, D>(&self, dict: &'d D) -> Option<&'d FieldDescriptor>
    where
        D: FieldDictionary + ?Sized,
    {
        match (self.fid(), self.name()) {
            (0, Some(name)) => dict.descriptor_by_name(name),
            (0, None) => None,
            (fid, name) => dict
                .descriptor_by_fid(fid)
                .or_else(|| name.and_then(|n| dict.descriptor_by_name(n))),
        }
    }

    /// Canonical name from the dictionary, falling back to the inline name.
    pub fn name_with<'r, D>(&self, dict: &'r D) -> Option<&'r str>
    where
        D: FieldDictionary + ?Sized,
        'a: 'r,
    {
        self.descriptor(dict)
            .map(|d| d.name.as_str())
            .filter(|name| !name.is_empty())
            .or_else(|| self.name())
    }
}
