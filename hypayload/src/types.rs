//! Field type tags and the static width / cast tables closed over them.
//!
//! Every record starts with one of these tags. The tag alone decides whether the
//! value is prefixed by an explicit 4-byte length (the *sized* class) or whether
//! its byte count is implied (the *fixed* class).
use strum::{Display, EnumIs, EnumIter, FromRepr};

/// Wire size of a `Time` value.
pub const DATE_TIME_WIDTH: usize = 8;
/// Wire size of a `Price` value.
pub const PRICE_WIDTH: usize = 10;
/// Wire size of the explicit length prefix carried by sized records.
pub const LENGTH_WIDTH: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, EnumIter, FromRepr, EnumIs, Display)]
#[repr(u8)]
pub enum FieldType {
    // Composite / blob
    Msg = 1,
    Opaque = 7,
    String = 8,

    // Scalars
    Bool = 9,
    Char = 10,
    I8 = 14,
    U8 = 15,
    I16 = 16,
    U16 = 17,
    I32 = 18,
    U32 = 19,
    I64 = 20,
    U64 = 21,
    F32 = 25,
    F64 = 26,
    Price = 27,
    Time = 28,

    // Vectors
    VectorBool = 30,
    VectorChar = 31,
    VectorI8 = 34,
    VectorU8 = 35,
    VectorI16 = 36,
    VectorU16 = 37,
    VectorI32 = 38,
    VectorU32 = 39,
    VectorI64 = 40,
    VectorU64 = 41,
    VectorF32 = 45,
    VectorF64 = 46,
    VectorString = 47,
    VectorMsg = 48,
    VectorTime = 49,
    VectorPrice = 50,

    Quantity = 51,
    Collection = 99,
}

impl FieldType {
    /// Whether the value is prefixed by an explicit 4-byte length.
    #[inline]
    pub const fn is_sized(self) -> bool {
        use FieldType::*;
        matches!(
            self,
            Msg | Opaque
                | String
                | Collection
                | VectorBool
                | VectorChar
                | VectorI8
                | VectorU8
                | VectorI16
                | VectorU16
                | VectorI32
                | VectorU32
                | VectorI64
                | VectorU64
                | VectorF32
                | VectorF64
                | VectorString
                | VectorMsg
                | VectorTime
                | VectorPrice
        )
    }

    /// Whether this is a primitive numeric scalar. `Time` and `Price` have a fixed
    /// size on the wire but are structs, not scalars.
    #[inline]
    pub const fn is_fixed_width(self) -> bool {
        use FieldType::*;
        matches!(
            self,
            Bool | Char | I8 | U8 | I16 | U16 | I32 | U32 | I64 | U64 | F32 | F64 | Quantity
        )
    }

    /// Byte count implied by the tag for every record without a length prefix.
    ///
    /// Returns `None` for sized types.
    pub const fn implied_width(self) -> Option<usize> {
        use FieldType::*;
        match self {
            Bool | Char | I8 | U8 => Some(1),
            I16 | U16 => Some(2),
            I32 | U32 | F32 | Quantity => Some(4),
            I64 | U64 | F64 => Some(8),
            Time => Some(DATE_TIME_WIDTH),
            Price => Some(PRICE_WIDTH),
            _ => None,
        }
    }

    /// Element type of a vector of fixed-size values.
    pub const fn vector_element(self) -> Option<FieldType> {
        use FieldType::*;
        match self {
            VectorBool => Some(Bool),
            VectorChar => Some(Char),
            VectorI8 => Some(I8),
            VectorU8 => Some(U8),
            VectorI16 => Some(I16),
            VectorU16 => Some(U16),
            VectorI32 => Some(I32),
            VectorU32 => Some(U32),
            VectorI64 => Some(I64),
            VectorU64 => Some(U64),
            VectorF32 => Some(F32),
            VectorF64 => Some(F64),
            VectorTime => Some(Time),
            VectorPrice => Some(Price),
            _ => None,
        }
    }

    /// Vector type whose elements are `self`.
    pub const fn vector_of(self) -> Option<FieldType> {
        use FieldType::*;
        match self {
            Bool => Some(VectorBool),
            Char => Some(VectorChar),
            I8 => Some(VectorI8),
            U8 => Some(VectorU8),
            I16 => Some(VectorI16),
            U16 => Some(VectorU16),
            I32 => Some(VectorI32),
            U32 => Some(VectorU32),
            I64 => Some(VectorI64),
            U64 => Some(VectorU64),
            F32 => Some(VectorF32),
            F64 => Some(VectorF64),
            Time => Some(VectorTime),
            Price => Some(VectorPrice),
            String => Some(VectorString),
            Msg => Some(VectorMsg),
            _ => None,
        }
    }
}

/// `true` iff a value stored as `from` may be read or written as `to`.
///
/// Only primitive scalars convert into each other; every other pairing must match
/// exactly.
#[inline]
pub const fn are_castable(from: FieldType, to: FieldType) -> bool {
    from.is_fixed_width() && to.is_fixed_width()
}

/// `true` iff `stored` may be accessed as `requested`, either because the types
/// match or because the cast table allows it.
#[inline]
pub(crate) fn is_compatible(stored: FieldType, requested: FieldType) -> bool {
    stored == requested || are_castable(stored, requested)
}

#[cfg(test)]
mod tests {
    use strum::IntoEnumIterator;

    use super::*;

    #[test]
    fn every_type_is_either_sized_or_has_an_implied_width() {
        for ty in FieldType::iter() {
            assert_ne!(
                ty.is_sized(),
                ty.implied_width().is_some(),
                "{ty} must belong to exactly one width class"
            );
        }
    }

    #[test]
    fn fixed_width_is_a_subset_of_implied_width() {
        for ty in FieldType::iter().filter(|t| t.is_fixed_width()) {
            assert!(matches!(ty.implied_width(), Some(1 | 2 | 4 | 8)));
        }
        assert!(!FieldType::Time.is_fixed_width());
        assert!(!FieldType::Price.is_fixed_width());
        assert!(!FieldType::String.is_fixed_width());
    }

    #[test]
    fn cast_table_is_symmetric() {
        for a in FieldType::iter() {
            for b in FieldType::iter() {
                assert_eq!(are_castable(a, b), are_castable(b, a), "{a} / {b}");
            }
        }
    }

    #[test]
    fn cast_table_rejects_non_scalars() {
        assert!(are_castable(FieldType::I32, FieldType::I64));
        assert!(are_castable(FieldType::Bool, FieldType::F64));
        assert!(!are_castable(FieldType::String, FieldType::I64));
        assert!(!are_castable(FieldType::Price, FieldType::F64));
        assert!(!are_castable(FieldType::Time, FieldType::I64));
        assert!(!are_castable(FieldType::Opaque, FieldType::Opaque));
    }

    #[test]
    fn vector_mapping_roundtrip() {
        for ty in FieldType::iter() {
            if let Some(vector) = ty.vector_of() {
                if let Some(elem) = vector.vector_element() {
                    assert_eq!(elem, ty);
                }
                assert!(vector.is_sized());
            }
        }
    }

    #[test]
    fn tags_roundtrip_through_repr() {
        for ty in FieldType::iter() {
            assert_eq!(FieldType::from_repr(ty as u8), Some(ty));
        }
        assert_eq!(FieldType::from_repr(0), None);
        assert_eq!(FieldType::from_repr(200), None);
    }
}
