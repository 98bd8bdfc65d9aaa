use chrono::{NaiveDateTime, TimeZone, Utc};

use crate::{
    error::{PayloadError, PayloadResult},
    types::DATE_TIME_WIDTH,
};

/// Point in time stored as signed microseconds since the Unix epoch (UTC).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DateTime {
    micros: i64,
}

impl DateTime {
    pub const fn from_epoch_micros(micros: i64) -> Self {
        Self { micros }
    }

    pub const fn from_epoch_millis(millis: i64) -> Self {
        Self {
            micros: millis.saturating_mul(1_000),
        }
    }

    /// Fractional seconds since the epoch, rounded to the microsecond.
    pub fn from_epoch_seconds(seconds: f64) -> Self {
        Self {
            micros: (seconds * 1_000_000.0).round() as i64,
        }
    }

    #[inline]
    pub const fn epoch_micros(&self) -> i64 {
        self.micros
    }

    pub fn epoch_seconds(&self) -> f64 {
        self.micros as f64 / 1_000_000.0
    }

    pub fn from_chrono(value: chrono::DateTime<Utc>) -> Self {
        Self {
            micros: value.timestamp_micros(),
        }
    }

    /// `None` when the instant is outside chrono's representable range.
    pub fn to_chrono(&self) -> Option<chrono::DateTime<Utc>> {
        chrono::DateTime::from_timestamp_micros(self.micros)
    }

    /// Parse RFC 3339 (`2024-01-02T03:04:05.5Z`) or a naive UTC timestamp
    /// (`2024-01-02 03:04:05.5`).
    pub fn parse(s: &str) -> PayloadResult<Self> {
        if let Ok(dt) = chrono::DateTime::parse_from_rfc3339(s) {
            return Ok(Self::from_chrono(dt.with_timezone(&Utc)));
        }
        NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f")
            .map(|naive| Self::from_chrono(Utc.from_utc_datetime(&naive)))
            .map_err(|e| PayloadError::invalid(format!("cannot parse date-time {s:?}: {e}")))
    }

    pub fn to_le_bytes(&self) -> [u8; DATE_TIME_WIDTH] {
        self.micros.to_le_bytes()
    }

    pub fn from_le_bytes(bytes: [u8; DATE_TIME_WIDTH]) -> Self {
        Self {
            micros: i64::from_le_bytes(bytes),
        }
    }

    pub(crate) fn read(src: &[u8]) -> Self {
        let mut bytes = [0u8; DATE_TIME_WIDTH];
        bytes.copy_from_slice(&src[..DATE_TIME_WIDTH]);
        Self::from_le_bytes(bytes)
    }
}

impl std::fmt::Display for DateTime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.to_chrono() {
            Some(dt) => write!(f, "{}", dt.format("%Y-%m-%d %H:%M:%S%.6f")),
            None => write!(f, "@{}us", self.micros),
        }
    }
}
