use bitflags::bitflags;

use crate::types::PRICE_WIDTH;

bitflags! {
    /// Display hints carried alongside a price value.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct PriceHints: u8 {
        /// `precision` holds the number of decimals to render.
        const EXPLICIT_PRECISION = 0b0000_0001;
    }
}

/// Price value: an `f64` plus its decimal precision.
///
/// Wire layout (10 bytes): value (f64, LE), precision (u8), hints (u8).
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Price {
    value: f64,
    precision: u8,
    hints: PriceHints,
}

impl Price {
    pub fn new(value: f64) -> Self {
        Self {
            value,
            precision: 0,
            hints: PriceHints::empty(),
        }
    }

    pub fn with_precision(value: f64, precision: u8) -> Self {
        Self {
            value,
            precision,
            hints: PriceHints::EXPLICIT_PRECISION,
        }
    }

    #[inline]
    pub fn value(&self) -> f64 {
        self.value
    }

    /// Decimal places, when an explicit precision was set.
    #[inline]
    pub fn precision(&self) -> Option<u8> {
        self.hints
            .contains(PriceHints::EXPLICIT_PRECISION)
            .then_some(self.precision)
    }

    #[inline]
    pub fn hints(&self) -> PriceHints {
        self.hints
    }

    pub fn to_le_bytes(&self) -> [u8; PRICE_WIDTH] {
        let mut out = [0u8; PRICE_WIDTH];
        out[..8].copy_from_slice(&self.value.to_le_bytes());
        out[8] = self.precision;
        out[9] = self.hints.bits();
        out
    }

    pub fn from_le_bytes(bytes: [u8; PRICE_WIDTH]) -> Self {
        let mut value = [0u8; 8];
        value.copy_from_slice(&bytes[..8]);
        Self {
            value: f64::from_le_bytes(value),
            precision: bytes[8],
            hints: PriceHints::from_bits_retain(bytes[9]),
        }
    }

    pub(crate) fn read(src: &[u8]) -> Self {
        let mut bytes = [0u8; PRICE_WIDTH];
        bytes.copy_from_slice(&src[..PRICE_WIDTH]);
        Self::from_le_bytes(bytes)
    }
}

impl From<f64> for Price {
    fn from(value: f64) -> Self {
        Self::new(value)
    }
}

impl std::fmt::Display for Price {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.precision() {
            Some(p) => write!(f, "{:.*}", p as usize, self.value),
            None => write!(f, "{}", self.value),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_honours_precision() {
        assert_eq!(Price::with_precision(1.5, 3).to_string(), "1.500");
        assert_eq!(Price::new(1.25).to_string(), "1.25");
    }

    #[test]
    fn wire_bytes_keep_unknown_hints() {
        let mut bytes = Price::with_precision(99.125, 2).to_le_bytes();
        bytes[9] |= 0b1000_0000;
        let price = Price::from_le_bytes(bytes);
        assert_eq!(price.value(), 99.125);
        assert_eq!(price.precision(), Some(2));
        assert_eq!(price.to_le_bytes(), bytes);
    }
}
