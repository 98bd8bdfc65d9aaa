//! Typed values stored in field records.
//!
//! [`FixedElement`] covers every type with a width implied by its tag, [`Scalar`]
//! narrows that to the primitive numeric types that cast into each other, and
//! [`FieldValue`] is the decoded form of any record.
use std::fmt;

use crate::{
    datetime::DateTime,
    error::{PayloadError, PayloadResult},
    price::Price,
    types::{DATE_TIME_WIDTH, FieldType, PRICE_WIDTH},
    vector::{MsgVector, ScalarVector, StringVector},
};

/// A value with a fixed little-endian wire layout.
pub trait FixedElement: Copy + fmt::Debug + 'static {
    const FIELD_TYPE: FieldType;
    const WIDTH: usize;

    /// Write the value into `dst[..WIDTH]`.
    fn write_le(self, dst: &mut [u8]);

    /// Read a value from `src[..WIDTH]`.
    fn read_le(src: &[u8]) -> Self;
}

/// Primitive numeric value, castable into any other [`Scalar`].
pub trait Scalar: FixedElement {
    fn into_value(self) -> ScalarValue;

    /// Convert any scalar into `Self` with numeric `as` semantics.
    fn from_value(value: ScalarValue) -> Self;
}

/// Element type of a vector field.
pub trait VectorElement: FixedElement {
    const VECTOR_TYPE: FieldType;
}

/// Quantity stored as a 4-byte float.
#[derive(Debug, Clone, Copy, Default, PartialEq, PartialOrd)]
pub struct Quantity(pub f32);

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.6}", self.0)
    }
}

/// Intermediate numeric form used by casts.
#[derive(Clone, Copy)]
enum Num {
    Int(i128),
    Float(f64),
}

/// Any primitive scalar, tagged with its field type.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ScalarValue {
    Bool(bool),
    Char(char),
    I8(i8),
    U8(u8),
    I16(i16),
    U16(u16),
    I32(i32),
    U32(u32),
    I64(i64),
    U64(u64),
    F32(f32),
    F64(f64),
    Quantity(Quantity),
}

macro_rules! impl_numeric_scalar {
    ($($ty:ty => $variant:ident / $vector:ident),* $(,)?) => {$(
        impl FixedElement for $ty {
            const FIELD_TYPE: FieldType = FieldType::$variant;
            const WIDTH: usize = std::mem::size_of::<$ty>();

            #[inline]
            fn write_le(self, dst: &mut [u8]) {
                dst[..Self::WIDTH].copy_from_slice(&self.to_le_bytes());
            }

            #[inline]
            fn read_le(src: &[u8]) -> Self {
                let mut bytes = [0u8; std::mem::size_of::<$ty>()];
                bytes.copy_from_slice(&src[..Self::WIDTH]);
                <$ty>::from_le_bytes(bytes)
            }
        }

        impl Scalar for $ty {
            #[inline]
            fn into_value(self) -> ScalarValue {
                ScalarValue::$variant(self)
            }

            #[inline]
            fn from_value(value: ScalarValue) -> Self {
                match value.num() {
                    Num::Int(i) => i as $ty,
                    Num::Float(f) => f as $ty,
                }
            }
        }

        impl VectorElement for $ty {
            const VECTOR_TYPE: FieldType = FieldType::$vector;
        }
    )*};
}

impl_numeric_scalar! {
    i8 => I8 / VectorI8,
    u8 => U8 / VectorU8,
    i16 => I16 / VectorI16,
    u16 => U16 / VectorU16,
    i32 => I32 / VectorI32,
    u32 => U32 / VectorU32,
    i64 => I64 / VectorI64,
    u64 => U64 / VectorU64,
    f32 => F32 / VectorF32,
    f64 => F64 / VectorF64,
}

impl FixedElement for bool {
    const FIELD_TYPE: FieldType = FieldType::Bool;
    const WIDTH: usize = 1;

    fn write_le(self, dst: &mut [u8]) {
        dst[0] = self as u8;
    }

    fn read_le(src: &[u8]) -> Self {
        src[0] != 0
    }
}

impl Scalar for bool {
    fn into_value(self) -> ScalarValue {
        ScalarValue::Bool(self)
    }

    fn from_value(value: ScalarValue) -> Self {
        match value.num() {
            Num::Int(i) => i != 0,
            Num::Float(f) => f != 0.0,
        }
    }
}

impl VectorElement for bool {
    const VECTOR_TYPE: FieldType = FieldType::VectorBool;
}

/// Characters occupy a single byte; code points above `U+00FF` are truncated.
impl FixedElement for char {
    const FIELD_TYPE: FieldType = FieldType::Char;
    const WIDTH: usize = 1;

    fn write_le(self, dst: &mut [u8]) {
        dst[0] = self as u8;
    }

    fn read_le(src: &[u8]) -> Self {
        src[0] as char
    }
}

impl Scalar for char {
    fn into_value(self) -> ScalarValue {
        ScalarValue::Char(self)
    }

    fn from_value(value: ScalarValue) -> Self {
        match value.num() {
            Num::Int(i) => (i as u8) as char,
            Num::Float(f) => (f as u8) as char,
        }
    }
}

impl VectorElement for char {
    const VECTOR_TYPE: FieldType = FieldType::VectorChar;
}

impl FixedElement for Quantity {
    const FIELD_TYPE: FieldType = FieldType::Quantity;
    const WIDTH: usize = 4;

    fn write_le(self, dst: &mut [u8]) {
        self.0.write_le(dst);
    }

    fn read_le(src: &[u8]) -> Self {
        Quantity(f32::read_le(src))
    }
}

impl Scalar for Quantity {
    fn into_value(self) -> ScalarValue {
        ScalarValue::Quantity(self)
    }

    fn from_value(value: ScalarValue) -> Self {
        Quantity(f32::from_value(value))
    }
}

impl FixedElement for DateTime {
    const FIELD_TYPE: FieldType = FieldType::Time;
    const WIDTH: usize = DATE_TIME_WIDTH;

    fn write_le(self, dst: &mut [u8]) {
        dst[..DATE_TIME_WIDTH].copy_from_slice(&self.to_le_bytes());
    }

    fn read_le(src: &[u8]) -> Self {
        DateTime::read(src)
    }
}

impl VectorElement for DateTime {
    const VECTOR_TYPE: FieldType = FieldType::VectorTime;
}

impl FixedElement for Price {
    const FIELD_TYPE: FieldType = FieldType::Price;
    const WIDTH: usize = PRICE_WIDTH;

    fn write_le(self, dst: &mut [u8]) {
        dst[..PRICE_WIDTH].copy_from_slice(&self.to_le_bytes());
    }

    fn read_le(src: &[u8]) -> Self {
        Price::read(src)
    }
}

impl VectorElement for Price {
    const VECTOR_TYPE: FieldType = FieldType::VectorPrice;
}

/// Encode a single fixed element into a fresh byte vector.
pub(crate) fn encode_fixed<T: FixedElement>(value: T) -> smallvec::SmallVec<[u8; 16]> {
    let mut out = smallvec::smallvec![0u8; T::WIDTH];
    value.write_le(&mut out);
    out
}

impl ScalarValue {
    pub fn field_type(&self) -> FieldType {
        match self {
            ScalarValue::Bool(_) => FieldType::Bool,
            ScalarValue::Char(_) => FieldType::Char,
            ScalarValue::I8(_) => FieldType::I8,
            ScalarValue::U8(_) => FieldType::U8,
            ScalarValue::I16(_) => FieldType::I16,
            ScalarValue::U16(_) => FieldType::U16,
            ScalarValue::I32(_) => FieldType::I32,
            ScalarValue::U32(_) => FieldType::U32,
            ScalarValue::I64(_) => FieldType::I64,
            ScalarValue::U64(_) => FieldType::U64,
            ScalarValue::F32(_) => FieldType::F32,
            ScalarValue::F64(_) => FieldType::F64,
            ScalarValue::Quantity(_) => FieldType::Quantity,
        }
    }

    fn num(self) -> Num {
        match self {
            ScalarValue::Bool(v) => Num::Int(v as i128),
            ScalarValue::Char(v) => Num::Int(v as u8 as i128),
            ScalarValue::I8(v) => Num::Int(v as i128),
            ScalarValue::U8(v) => Num::Int(v as i128),
            ScalarValue::I16(v) => Num::Int(v as i128),
            ScalarValue::U16(v) => Num::Int(v as i128),
            ScalarValue::I32(v) => Num::Int(v as i128),
            ScalarValue::U32(v) => Num::Int(v as i128),
            ScalarValue::I64(v) => Num::Int(v as i128),
            ScalarValue::U64(v) => Num::Int(v as i128),
            ScalarValue::F32(v) => Num::Float(v as f64),
            ScalarValue::F64(v) => Num::Float(v),
            ScalarValue::Quantity(v) => Num::Float(v.0 as f64),
        }
    }

    /// Decode the value of a fixed-width record stored as `field_type`.
    pub fn read(field_type: FieldType, src: &[u8]) -> PayloadResult<Self> {
        let width = field_type
            .implied_width()
            .filter(|_| field_type.is_fixed_width())
            .ok_or_else(|| PayloadError::invalid(format!("{field_type} is not a scalar type")))?;
        if src.len() < width {
            return Err(PayloadError::Truncated {
                offset: 0,
                needed: width,
                available: src.len(),
            });
        }

        Ok(match field_type {
            FieldType::Bool => bool::read_le(src).into_value(),
            FieldType::Char => char::read_le(src).into_value(),
            FieldType::I8 => i8::read_le(src).into_value(),
            FieldType::U8 => u8::read_le(src).into_value(),
            FieldType::I16 => i16::read_le(src).into_value(),
            FieldType::U16 => u16::read_le(src).into_value(),
            FieldType::I32 => i32::read_le(src).into_value(),
            FieldType::U32 => u32::read_le(src).into_value(),
            FieldType::I64 => i64::read_le(src).into_value(),
            FieldType::U64 => u64::read_le(src).into_value(),
            FieldType::F32 => f32::read_le(src).into_value(),
            FieldType::F64 => f64::read_le(src).into_value(),
            _ => Quantity::read_le(src).into_value(),
        })
    }

    /// Write the value into `dst[..width]`.
    pub fn write_le(self, dst: &mut [u8]) {
        match self {
            ScalarValue::Bool(v) => v.write_le(dst),
            ScalarValue::Char(v) => v.write_le(dst),
            ScalarValue::I8(v) => v.write_le(dst),
            ScalarValue::U8(v) => v.write_le(dst),
            ScalarValue::I16(v) => v.write_le(dst),
            ScalarValue::U16(v) => v.write_le(dst),
            ScalarValue::I32(v) => v.write_le(dst),
            ScalarValue::U32(v) => v.write_le(dst),
            ScalarValue::I64(v) => v.write_le(dst),
            ScalarValue::U64(v) => v.write_le(dst),
            ScalarValue::F32(v) => v.write_le(dst),
            ScalarValue::F64(v) => v.write_le(dst),
            ScalarValue::Quantity(v) => v.write_le(dst),
        }
    }

    /// Convert to another scalar type. Only fixed-width targets are accepted.
    pub fn cast_to(self, to: FieldType) -> PayloadResult<Self> {
        Ok(match to {
            FieldType::Bool => bool::from_value(self).into_value(),
            FieldType::Char => char::from_value(self).into_value(),
            FieldType::I8 => i8::from_value(self).into_value(),
            FieldType::U8 => u8::from_value(self).into_value(),
            FieldType::I16 => i16::from_value(self).into_value(),
            FieldType::U16 => u16::from_value(self).into_value(),
            FieldType::I32 => i32::from_value(self).into_value(),
            FieldType::U32 => u32::from_value(self).into_value(),
            FieldType::I64 => i64::from_value(self).into_value(),
            FieldType::U64 => u64::from_value(self).into_value(),
            FieldType::F32 => f32::from_value(self).into_value(),
            FieldType::F64 => f64::from_value(self).into_value(),
            FieldType::Quantity => Quantity::from_value(self).into_value(),
            requested => {
                return Err(PayloadError::WrongFieldType {
                    stored: self.field_type(),
                    requested,
                });
            }
        })
    }
}

impl fmt::Display for ScalarValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScalarValue::Bool(v) => write!(f, "{}", *v as u8),
            ScalarValue::Char(v) => write!(f, "{v}"),
            ScalarValue::I8(v) => write!(f, "{v}"),
            ScalarValue::U8(v) => write!(f, "{v}"),
            ScalarValue::I16(v) => write!(f, "{v}"),
            ScalarValue::U16(v) => write!(f, "{v}"),
            ScalarValue::I32(v) => write!(f, "{v}"),
            ScalarValue::U32(v) => write!(f, "{v}"),
            ScalarValue::I64(v) => write!(f, "{v}"),
            ScalarValue::U64(v) => write!(f, "{v}"),
            ScalarValue::F32(v) => write!(f, "{v:.6}"),
            ScalarValue::F64(v) => write!(f, "{v:.6}"),
            ScalarValue::Quantity(v) => write!(f, "{v}"),
        }
    }
}

/// Decoded value of one field record, borrowing variable-width data from the
/// payload buffer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldValue<'a> {
    Scalar(ScalarValue),
    Time(DateTime),
    Price(Price),
    /// String content without its terminator.
    String(&'a str),
    Opaque(&'a [u8]),
    /// Serialized bytes of a nested payload.
    Msg(&'a [u8]),
    Collection(&'a [u8]),
    VectorBool(ScalarVector<'a, bool>),
    VectorChar(ScalarVector<'a, char>),
    VectorI8(ScalarVector<'a, i8>),
    VectorU8(ScalarVector<'a, u8>),
    VectorI16(ScalarVector<'a, i16>),
    VectorU16(ScalarVector<'a, u16>),
    VectorI32(ScalarVector<'a, i32>),
    VectorU32(ScalarVector<'a, u32>),
    VectorI64(ScalarVector<'a, i64>),
    VectorU64(ScalarVector<'a, u64>),
    VectorF32(ScalarVector<'a, f32>),
    VectorF64(ScalarVector<'a, f64>),
    VectorString(StringVector<'a>),
    VectorMsg(MsgVector<'a>),
    VectorTime(ScalarVector<'a, DateTime>),
    VectorPrice(ScalarVector<'a, Price>),
}

impl<'a> FieldValue<'a> {
    /// Decode the value bytes of a record tagged `field_type`.
    pub fn decode(field_type: FieldType, data: &'a [u8]) -> PayloadResult<Self> {
        use FieldType as T;

        Ok(match field_type {
            T::Bool
            | T::Char
            | T::I8
            | T::U8
            | T::I16
            | T::U16
            | T::I32
            | T::U32
            | T::I64
            | T::U64
            | T::F32
            | T::F64
            | T::Quantity => FieldValue::Scalar(ScalarValue::read(field_type, data)?),
            T::Time => FieldValue::Time(DateTime::read(data)),
            T::Price => FieldValue::Price(Price::read(data)),
            T::String => FieldValue::String(decode_str(data)?),
            T::Opaque => FieldValue::Opaque(data),
            T::Msg => FieldValue::Msg(data),
            T::Collection => FieldValue::Collection(data),
            T::VectorBool => FieldValue::VectorBool(ScalarVector::new(data)?),
            T::VectorChar => FieldValue::VectorChar(ScalarVector::new(data)?),
            T::VectorI8 => FieldValue::VectorI8(ScalarVector::new(data)?),
            T::VectorU8 => FieldValue::VectorU8(ScalarVector::new(data)?),
            T::VectorI16 => FieldValue::VectorI16(ScalarVector::new(data)?),
            T::VectorU16 => FieldValue::VectorU16(ScalarVector::new(data)?),
            T::VectorI32 => FieldValue::VectorI32(ScalarVector::new(data)?),
            T::VectorU32 => FieldValue::VectorU32(ScalarVector::new(data)?),
            T::VectorI64 => FieldValue::VectorI64(ScalarVector::new(data)?),
            T::VectorU64 => FieldValue::VectorU64(ScalarVector::new(data)?),
            T::VectorF32 => FieldValue::VectorF32(ScalarVector::new(data)?),
            T::VectorF64 => FieldValue::VectorF64(ScalarVector::new(data)?),
            T::VectorString => FieldValue::VectorString(StringVector::new(data)?),
            T::VectorMsg => FieldValue::VectorMsg(MsgVector::new(data)),
            T::VectorTime => FieldValue::VectorTime(ScalarVector::new(data)?),
            T::VectorPrice => FieldValue::VectorPrice(ScalarVector::new(data)?),
        })
    }

    pub fn field_type(&self) -> FieldType {
        match self {
            FieldValue::Scalar(v) => v.field_type(),
            FieldValue::Time(_) => FieldType::Time,
            FieldValue::Price(_) => FieldType::Price,
            FieldValue::String(_) => FieldType::String,
            FieldValue::Opaque(_) => FieldType::Opaque,
            FieldValue::Msg(_) => FieldType::Msg,
            FieldValue::Collection(_) => FieldType::Collection,
            FieldValue::VectorBool(_) => FieldType::VectorBool,
            FieldValue::VectorChar(_) => FieldType::VectorChar,
            FieldValue::VectorI8(_) => FieldType::VectorI8,
            FieldValue::VectorU8(_) => FieldType::VectorU8,
            FieldValue::VectorI16(_) => FieldType::VectorI16,
            FieldValue::VectorU16(_) => FieldType::VectorU16,
            FieldValue::VectorI32(_) => FieldType::VectorI32,
            FieldValue::VectorU32(_) => FieldType::VectorU32,
            FieldValue::VectorI64(_) => FieldType::VectorI64,
            FieldValue::VectorU64(_) => FieldType::VectorU64,
            FieldValue::VectorF32(_) => FieldType::VectorF32,
            FieldValue::VectorF64(_) => FieldType::VectorF64,
            FieldValue::VectorString(_) => FieldType::VectorString,
            FieldValue::VectorMsg(_) => FieldType::VectorMsg,
            FieldValue::VectorTime(_) => FieldType::VectorTime,
            FieldValue::VectorPrice(_) => FieldType::VectorPrice,
        }
    }
}

impl FieldValue<'_> {
    /// Value bytes as stored in a record of [`FieldValue::field_type`].
    pub fn to_wire_bytes(&self) -> PayloadResult<Vec<u8>> {
        Ok(match self {
            FieldValue::Scalar(v) => {
                let mut out = vec![0u8; v.field_type().implied_width().unwrap_or_default()];
                v.write_le(&mut out);
                out
            }
            FieldValue::Time(v) => v.to_le_bytes().to_vec(),
            FieldValue::Price(v) => v.to_le_bytes().to_vec(),
            FieldValue::String(v) => encode_str(v)?,
            FieldValue::Opaque(v) | FieldValue::Msg(v) | FieldValue::Collection(v) => v.to_vec(),
            FieldValue::VectorBool(v) => v.as_bytes().to_vec(),
            FieldValue::VectorChar(v) => v.as_bytes().to_vec(),
            FieldValue::VectorI8(v) => v.as_bytes().to_vec(),
            FieldValue::VectorU8(v) => v.as_bytes().to_vec(),
            FieldValue::VectorI16(v) => v.as_bytes().to_vec(),
            FieldValue::VectorU16(v) => v.as_bytes().to_vec(),
            FieldValue::VectorI32(v) => v.as_bytes().to_vec(),
            FieldValue::VectorU32(v) => v.as_bytes().to_vec(),
            FieldValue::VectorI64(v) => v.as_bytes().to_vec(),
            FieldValue::VectorU64(v) => v.as_bytes().to_vec(),
            FieldValue::VectorF32(v) => v.as_bytes().to_vec(),
            FieldValue::VectorF64(v) => v.as_bytes().to_vec(),
            FieldValue::VectorString(v) => v.as_bytes().to_vec(),
            FieldValue::VectorMsg(v) => v.as_bytes().to_vec(),
            FieldValue::VectorTime(v) => v.as_bytes().to_vec(),
            FieldValue::VectorPrice(v) => v.as_bytes().to_vec(),
        })
    }
}

/// NUL-terminated encoding of a string value.
pub(crate) fn encode_str(value: &str) -> PayloadResult<Vec<u8>> {
    if value.contains('\0') {
        return Err(PayloadError::invalid(format!(
            "string value {value:?} contains a NUL byte"
        )));
    }
    let mut out = Vec::with_capacity(value.len() + 1);
    out.extend_from_slice(value.as_bytes());
    out.push(0);
    Ok(out)
}

/// Borrow the content of a NUL-terminated string value.
pub(crate) fn decode_str(data: &[u8]) -> PayloadResult<&str> {
    let content = data.strip_suffix(&[0]).unwrap_or(data);
    std::str::from_utf8(content)
        .map_err(|e| PayloadError::invalid(format!("string value is not valid UTF-8: {e}")))
}

fn write_list<I>(f: &mut fmt::Formatter<'_>, items: I) -> fmt::Result
where
    I: IntoIterator,
    I::Item: fmt::Display,
{
    f.write_str("{")?;
    for (i, item) in items.into_iter().enumerate() {
        if i > 0 {
            f.write_str(",")?;
        }
        write!(f, "{item}")?;
    }
    f.write_str("}")
}

/// Debug rendering used by `Payload`'s `Display` and `get_field_as_string`.
impl fmt::Display for FieldValue<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Scalar(v) => write!(f, "{v}"),
            FieldValue::Time(v) => write!(f, "{v}"),
            FieldValue::Price(v) => write!(f, "{v}"),
            FieldValue::String(v) => f.write_str(v),
            FieldValue::Opaque(v) => write!(f, "{{{} bytes}}", v.len()),
            FieldValue::Msg(_)
            | FieldValue::Collection(_)
            | FieldValue::VectorMsg(_)
            | FieldValue::VectorTime(_)
            | FieldValue::VectorPrice(_) => f.write_str("{...}"),
            FieldValue::VectorBool(v) => write_list(f, v.iter().map(|b| b as u8)),
            FieldValue::VectorChar(v) => write_list(f, v.iter()),
            FieldValue::VectorI8(v) => write_list(f, v.iter()),
            FieldValue::VectorU8(v) => write_list(f, v.iter()),
            FieldValue::VectorI16(v) => write_list(f, v.iter()),
            FieldValue::VectorU16(v) => write_list(f, v.iter()),
            FieldValue::VectorI32(v) => write_list(f, v.iter()),
            FieldValue::VectorU32(v) => write_list(f, v.iter()),
            FieldValue::VectorI64(v) => write_list(f, v.iter()),
            FieldValue::VectorU64(v) => write_list(f, v.iter()),
            FieldValue::VectorF32(v) => write_list(f, v.iter().map(ScalarValue::F32)),
            FieldValue::VectorF64(v) => write_list(f, v.iter().map(ScalarValue::F64)),
            FieldValue::VectorString(v) => write_list(f, v.iter()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn widths_match_the_tag_table() {
        assert_eq!(bool::WIDTH, FieldType::Bool.implied_width().unwrap());
        assert_eq!(char::WIDTH, FieldType::Char.implied_width().unwrap());
        assert_eq!(u16::WIDTH, FieldType::U16.implied_width().unwrap());
        assert_eq!(Quantity::WIDTH, FieldType::Quantity.implied_width().unwrap());
        assert_eq!(f64::WIDTH, FieldType::F64.implied_width().unwrap());
        assert_eq!(DateTime::WIDTH, FieldType::Time.implied_width().unwrap());
        assert_eq!(Price::WIDTH, FieldType::Price.implied_width().unwrap());
    }

    #[test]
    fn integer_widening_is_numeric_not_bitwise() {
        let stored = (-5i32).into_value();
        assert_eq!(i64::from_value(stored), -5);
        assert_eq!(f64::from_value(stored), -5.0);
        assert_eq!(u8::from_value(300u16.into_value()), 44);
        assert!(bool::from_value(2u8.into_value()));
        assert!(!bool::from_value(0.0f64.into_value()));
        assert_eq!(i32::from_value(1.9f64.into_value()), 1);
    }

    #[test]
    fn cast_to_rejects_non_scalars() {
        let v = 7i64.into_value();
        assert_eq!(v.cast_to(FieldType::U8).unwrap(), ScalarValue::U8(7));
        assert!(matches!(
            v.cast_to(FieldType::String),
            Err(PayloadError::WrongFieldType { .. })
        ));
    }

    #[test]
    fn scalar_read_write_roundtrip() {
        let mut buf = [0u8; 8];
        ScalarValue::I16(-300).write_le(&mut buf);
        assert_eq!(ScalarValue::read(FieldType::I16, &buf).unwrap(), ScalarValue::I16(-300));
        assert!(ScalarValue::read(FieldType::I64, &buf[..4]).is_err());
        assert!(ScalarValue::read(FieldType::Time, &buf).is_err());
    }

    #[test]
    fn display_follows_debug_rendering() {
        assert_eq!(ScalarValue::Bool(true).to_string(), "1");
        assert_eq!(ScalarValue::F64(1.5).to_string(), "1.500000");
        assert_eq!(FieldValue::Opaque(b"abc").to_string(), "{3 bytes}");
        assert_eq!(FieldValue::Msg(b"").to_string(), "{...}");

        let bytes: Vec<u8> = [1i32, -2, 3].iter().flat_map(|v| v.to_le_bytes()).collect();
        let value = FieldValue::decode(FieldType::VectorI32, &bytes).unwrap();
        assert_eq!(value.to_string(), "{1,-2,3}");

        let value = FieldValue::decode(FieldType::VectorString, b"ab\0\0c\0").unwrap();
        assert_eq!(value.to_string(), "{ab,,c}");
    }

    #[test]
    fn wire_bytes_reverse_decode() {
        let value = FieldValue::decode(FieldType::String, b"abc\0").unwrap();
        assert_eq!(value.to_wire_bytes().unwrap(), b"abc\0");
        assert!(FieldValue::String("a\0b").to_wire_bytes().is_err());

        let value = FieldValue::Scalar(ScalarValue::U16(0x0102));
        assert_eq!(value.to_wire_bytes().unwrap(), vec![0x02, 0x01]);
    }

    #[test]
    fn decode_strips_string_terminator() {
        let value = FieldValue::decode(FieldType::String, b"teststr\0").unwrap();
        assert_eq!(value, FieldValue::String("teststr"));
        assert_eq!(value.field_type(), FieldType::String);
    }
}
