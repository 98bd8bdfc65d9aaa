//! The single growable byte arena backing a payload.
//!
//! The arena keeps `capacity` zero-initialised bytes of which `[0, tail)` are in
//! use. Capacity never shrinks on its own. Every mutation bumps a generation
//! counter so that record handles captured before it can be recognised as stale.
//!
//! Handles into the arena are plain offsets, so a reallocation that moves the base
//! address does not invalidate them by itself; only shifts do. The generation
//! counter is the conservative catch-all for both cases.
use log::trace;

use crate::{
    config::PayloadConfig,
    error::{PayloadError, PayloadResult},
};

#[derive(Debug, Clone)]
pub(crate) struct PayloadBuffer {
    // `bytes.len()` is the capacity; everything past `tail` is scratch
    bytes: Vec<u8>,
    tail: usize,
    generation: u32,
    config: PayloadConfig,
}

impl PayloadBuffer {
    pub fn new(config: PayloadConfig, min_capacity: usize) -> Self {
        let capacity = config.initial_capacity.max(min_capacity);
        Self {
            bytes: vec![0u8; capacity],
            tail: 0,
            generation: 0,
            config,
        }
    }

    /// Arena whose used region starts out as a copy of `prefix`. The prefix is
    /// always allocated, whatever the configured limit.
    pub fn with_prefix(config: PayloadConfig, prefix: &[u8]) -> Self {
        let mut buf = Self::new(config, prefix.len());
        buf.bytes[..prefix.len()].copy_from_slice(prefix);
        buf.tail = prefix.len();
        buf
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.bytes.len()
    }

    #[inline]
    pub fn tail(&self) -> usize {
        self.tail
    }

    #[inline]
    pub fn generation(&self) -> u32 {
        self.generation
    }

    #[inline]
    pub fn config(&self) -> &PayloadConfig {
        &self.config
    }

    /// The used region `[0, tail)`.
    #[inline]
    pub fn used(&self) -> &[u8] {
        &self.bytes[..self.tail]
    }

    #[inline]
    fn touch(&mut self) {
        self.generation = self.generation.wrapping_add(1);
    }

    /// Make sure at least `required` bytes are allocated.
    ///
    /// Returns whether the base address moved. Existing bytes are preserved and
    /// nothing is modified when growth is refused.
    pub fn ensure_capacity(&mut self, required: usize) -> PayloadResult<bool> {
        let current = self.capacity();
        if required <= current {
            return Ok(false);
        }

        let limit = self.config.max_capacity;
        let target = self
            .config
            .grown_capacity(current, required)
            .ok_or(PayloadError::OutOfMemory {
                requested: required,
                limit,
            })?;

        let old_base = self.bytes.as_ptr();
        self.bytes
            .try_reserve_exact(target - current)
            .map_err(|_| PayloadError::OutOfMemory {
                requested: target,
                limit,
            })?;
        self.bytes.resize(target, 0);
        let moved = old_base != self.bytes.as_ptr();

        trace!(
            "Payload buffer grown from {} to {} bytes (base moved: {})",
            current, target, moved
        );
        self.touch();
        Ok(moved)
    }

    /// Reserve `len` bytes at the tail and return the offset where they start.
    pub fn append(&mut self, len: usize) -> PayloadResult<usize> {
        let start = self.tail;
        let end = start.checked_add(len).ok_or(PayloadError::OutOfMemory {
            requested: usize::MAX,
            limit: self.config.max_capacity,
        })?;
        self.ensure_capacity(end)?;
        self.tail = end;
        self.touch();
        Ok(start)
    }

    /// Move the bytes `[at, tail)` by `delta` and adjust the tail.
    ///
    /// Positive deltas open a gap of `delta` bytes at `at` (growing the arena first
    /// if needed); negative deltas close the `|delta|` bytes just before `at`. The
    /// freed bytes past the new tail are zeroed.
    pub fn shift_tail(&mut self, at: usize, delta: isize) -> PayloadResult<()> {
        if at > self.tail {
            return Err(PayloadError::invalid(format!(
                "shift origin {at} lies past the tail {}",
                self.tail
            )));
        }

        let old_tail = self.tail;
        match delta {
            0 => return Ok(()),
            d if d > 0 => {
                let d = d as usize;
                let new_tail = old_tail.checked_add(d).ok_or(PayloadError::OutOfMemory {
                    requested: usize::MAX,
                    limit: self.config.max_capacity,
                })?;
                // Capacity is secured before anything moves
                self.ensure_capacity(new_tail)?;
                self.bytes.copy_within(at..old_tail, at + d);
                self.tail = new_tail;
            }
            d => {
                let d = d.unsigned_abs();
                if d > at {
                    return Err(PayloadError::invalid(format!(
                        "cannot shift {d} bytes left from offset {at}"
                    )));
                }
                self.bytes.copy_within(at..old_tail, at - d);
                self.tail = old_tail - d;
                self.bytes[self.tail..old_tail].fill(0);
            }
        }

        trace!(
            "Shifted payload tail at offset {} by {} (tail {} -> {})",
            at, delta, old_tail, self.tail
        );
        self.touch();
        Ok(())
    }

    /// Overwrite bytes inside the used region.
    pub fn write(&mut self, offset: usize, src: &[u8]) {
        debug_assert!(offset + src.len() <= self.tail, "write past tail");
        self.bytes[offset..offset + src.len()].copy_from_slice(src);
        self.touch();
    }

    /// Mutable view of the used region.
    pub fn used_mut(&mut self) -> &mut [u8] {
        self.touch();
        &mut self.bytes[..self.tail]
    }

    /// Drop everything past `tail` and zero the rest of the arena.
    pub fn truncate(&mut self, tail: usize) {
        debug_assert!(tail <= self.capacity());
        self.tail = tail;
        self.bytes[tail..].fill(0);
        self.touch();
    }

    /// Replace the used region wholesale with `src`.
    ///
    /// On failure the previous content is untouched.
    pub fn replace(&mut self, src: &[u8]) -> PayloadResult<()> {
        self.ensure_capacity(src.len())?;
        self.bytes[..src.len()].copy_from_slice(src);
        self.bytes[src.len()..].fill(0);
        self.tail = src.len();
        self.touch();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn buffer_with(content: &[u8], config: PayloadConfig) -> PayloadBuffer {
        PayloadBuffer::with_prefix(config, content)
    }

    #[test]
    fn growth_preserves_content() {
        let config = PayloadConfig {
            initial_capacity: 4,
            ..Default::default()
        };
        let mut buf = buffer_with(b"abcd", config);
        buf.ensure_capacity(64).unwrap();
        assert!(buf.capacity() >= 64);
        assert_eq!(buf.used(), b"abcd");
    }

    #[test]
    fn growth_beyond_limit_is_refused_without_side_effects() {
        let config = PayloadConfig {
            initial_capacity: 8,
            growth_factor: 2.0,
            max_capacity: Some(8),
        };
        let mut buf = buffer_with(b"abcdef", config);
        let generation = buf.generation();
        let err = buf.shift_tail(2, 4).unwrap_err();
        assert!(matches!(err, PayloadError::OutOfMemory { .. }));
        assert_eq!(buf.used(), b"abcdef");
        assert_eq!(buf.capacity(), 8);
        assert_eq!(buf.generation(), generation);
    }

    #[test]
    fn shift_right_opens_gap() {
        let mut buf = buffer_with(b"abcdef", PayloadConfig::default());
        buf.shift_tail(2, 3).unwrap();
        assert_eq!(buf.tail(), 9);
        assert_eq!(&buf.used()[..2], b"ab");
        assert_eq!(&buf.used()[5..], b"cdef");
    }

    #[test]
    fn shift_left_closes_gap_and_zeroes_scratch() {
        let mut buf = buffer_with(b"abcdef", PayloadConfig::default());
        buf.shift_tail(4, -2).unwrap();
        assert_eq!(buf.used(), b"abef");
        assert!(buf.bytes[4..].iter().all(|&b| b == 0));
    }

    #[test]
    fn shift_at_tail_only_moves_tail() {
        let mut buf = buffer_with(b"abc", PayloadConfig::default());
        buf.shift_tail(3, 2).unwrap();
        assert_eq!(buf.tail(), 5);
        buf.shift_tail(5, -2).unwrap();
        assert_eq!(buf.used(), b"abc");
    }

    #[test]
    fn invalid_shifts_are_rejected() {
        let mut buf = buffer_with(b"abc", PayloadConfig::default());
        assert!(buf.shift_tail(4, 1).is_err());
        assert!(buf.shift_tail(1, -2).is_err());
        assert_eq!(buf.used(), b"abc");
    }

    #[test]
    fn replace_is_all_or_nothing() {
        let config = PayloadConfig {
            initial_capacity: 4,
            growth_factor: 2.0,
            max_capacity: Some(4),
        };
        let mut buf = buffer_with(b"abc", config);
        assert!(buf.replace(b"too long").is_err());
        assert_eq!(buf.used(), b"abc");
        buf.replace(b"xy").unwrap();
        assert_eq!(buf.used(), b"xy");
        assert!(buf.bytes[2..].iter().all(|&b| b == 0));
    }

    #[test]
    fn append_reserves_at_tail() {
        let config = PayloadConfig {
            initial_capacity: 2,
            ..Default::default()
        };
        let mut buf = PayloadBuffer::new(config, 0);
        let at = buf.append(5).unwrap();
        assert_eq!(at, 0);
        buf.write(0, b"hello");
        let at = buf.append(3).unwrap();
        assert_eq!(at, 5);
        assert_eq!(buf.tail(), 8);
        assert_eq!(&buf.used()[..5], b"hello");
    }
}
