//! Bit-field masks and pure bit manipulation over register values.
//!
//! Every function here is pure: it takes a register value and returns the
//! updated value. Binding a mask to a live register is done by
//! [`Value`](crate::protocol::Value), which performs one read-modify-write per call.
//!
//! ```
//! use embedded_periph::bit::{self, Mask};
//!
//! let nibble = Mask::new(4, 4);
//! assert_eq!(bit::insert(0x00, nibble, 0xF), Ok(0xF0));
//! assert_eq!(bit::insert(0xF0, Mask::new(0, 4), 0x5), Ok(0xF5));
//! assert_eq!(bit::extract(0xF5, nibble), 0xF);
//! ```

use crate::error::{Error, Result};

/// Contiguous bit field inside a register: `width` bits starting at `position`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Mask {
    pub position: u8,
    pub width: u8,
}

impl Mask {
    pub const fn new(position: u8, width: u8) -> Self {
        Self { position, width }
    }

    /// Mask spanning `low..=high`.
    ///
    /// # Panics
    /// Panics if `low > high` or `high > 31`. In a `const` item this is a
    /// compile error.
    pub const fn from_range(low: u8, high: u8) -> Self {
        assert!(low <= high, "mask low bit must not exceed high bit");
        assert!(high < 32, "mask high bit must be below 32");
        Self {
            position: low,
            width: high - low + 1,
        }
    }

    /// Single-bit mask.
    pub const fn bit(position: u8) -> Self {
        Self { position, width: 1 }
    }

    /// Largest value the field can hold, `2^width - 1`.
    pub const fn field_max(self) -> u32 {
        if self.width >= 32 {
            u32::MAX
        } else {
            (1u32 << self.width) - 1
        }
    }

    /// The mask as it sits in the register.
    pub const fn bits(self) -> u32 {
        match self.field_max().checked_shl(self.position as u32) {
            Some(bits) => bits,
            None => 0,
        }
    }

    /// Checks `width >= 1` and `position + width <= register_bits`.
    pub fn validate(self, register_bits: u8) -> Result<Self> {
        let end = self.position as u16 + self.width as u16;
        if self.width == 0 || end > register_bits as u16 {
            return Err(Error::InvalidMask {
                position: self.position,
                width: self.width,
                register_bits,
            });
        }
        Ok(self)
    }

    /// True if the two masks share at least one bit.
    pub const fn overlaps(self, other: Mask) -> bool {
        self.bits() & other.bits() != 0
    }
}

/// Returns the field right-shifted to bit 0 and truncated to its width.
///
/// ```text
/// register = 0x00FE_DCBA
/// mask     = { position: 4, width: 8 }
/// result   = 0xCB
/// ```
#[inline]
pub fn extract(register: u32, mask: Mask) -> u32 {
    register.checked_shr(mask.position as u32).unwrap_or(0) & mask.field_max()
}

/// Returns `register` with the field replaced by `value`; all other bits unchanged.
///
/// # Errors
/// * [`Error::InvalidMask`] - if the mask does not fit a 32-bit register
/// * [`Error::InvalidFieldValue`] - if `value > 2^width - 1`
#[inline]
pub fn insert(register: u32, mask: Mask, value: u32) -> Result<u32> {
    mask.validate(32)?;
    if value > mask.field_max() {
        return Err(Error::InvalidFieldValue {
            value,
            width: mask.width,
        });
    }
    Ok((register & !mask.bits()) | (value << mask.position))
}

/// Sets every bit covered by the mask.
///
/// # Errors
/// [`Error::InvalidMask`] if the mask does not fit a 32-bit register.
#[inline]
pub fn set(register: u32, mask: Mask) -> Result<u32> {
    Ok(register | mask.validate(32)?.bits())
}

/// Clears every bit covered by the mask.
#[inline]
pub fn clear(register: u32, mask: Mask) -> Result<u32> {
    Ok(register & !mask.validate(32)?.bits())
}

/// Flips exactly the bits covered by the mask.
#[inline]
pub fn toggle(register: u32, mask: Mask) -> Result<u32> {
    Ok(register ^ mask.validate(32)?.bits())
}

/// Tests the bit at `mask.position`, regardless of width.
#[inline]
pub fn read(register: u32, mask: Mask) -> bool {
    extract(register, Mask::bit(mask.position)) == 1
}
