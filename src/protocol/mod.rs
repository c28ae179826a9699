//! Width-checked read/write access to an address space.
//!
//! Two address spaces implement [`MemoryAccessProtocol`]:
//!
//! ```text
//! ┌───────────────────┐        ┌─────────────────────────────┐
//! │  Driver           │        │  HardwareProtocol           │
//! │                   │───────▶│  volatile MMIO (target)     │
//! │  Register / Value │        ├─────────────────────────────┤
//! │                   │───────▶│  MockProtocol               │
//! │                   │        │  address -> byte image      │
//! └───────────────────┘        └─────────────────────────────┘
//! ```
//!
//! Drivers are written once against the trait and verified on the host by
//! comparing the mock's captured image with an expected snapshot.

pub mod hardware;
mod macros;
pub mod mock;
pub mod register;

pub use hardware::HardwareProtocol;
pub use mock::MockProtocol;
pub use register::{Register, Value};

use crate::error::{Error, Result};

/// Access width of a single register read or write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum AccessWidth {
    Byte = 1,
    HalfWord = 2,
    Word = 4,
}

impl AccessWidth {
    #[inline]
    pub const fn bytes(self) -> usize {
        self as usize
    }

    #[inline]
    pub const fn bits(self) -> u8 {
        (self as u8) * 8
    }

    /// Largest value representable at this width.
    #[inline]
    pub const fn max_value(self) -> u32 {
        match self {
            AccessWidth::Byte => u8::MAX as u32,
            AccessWidth::HalfWord => u16::MAX as u32,
            AccessWidth::Word => u32::MAX,
        }
    }

    /// Rejects `value` if it has bits above this width.
    pub fn check_value(self, value: u32) -> Result<()> {
        if value > self.max_value() {
            return Err(Error::InvalidFieldValue {
                value,
                width: self.bits(),
            });
        }
        Ok(())
    }

    /// Rejects addresses that are not a multiple of the width.
    pub fn check_alignment(self, address: u32) -> Result<()> {
        if address % self as u32 != 0 {
            return Err(Error::MisalignedAccess {
                address,
                width: self as u8,
            });
        }
        Ok(())
    }
}

/// Capability to read and write an address space at a declared width.
///
/// Implementations must never touch bytes beyond `address + width`.
pub trait MemoryAccessProtocol {
    /// Reads `width` bytes at `address`, zero-extended to `u32`.
    fn read(&mut self, address: u32, width: AccessWidth) -> Result<u32>;

    /// Writes the low `width` bytes of `value` to `address`.
    ///
    /// Fails with [`Error::InvalidFieldValue`] if `value` does not fit `width`.
    fn write(&mut self, address: u32, width: AccessWidth, value: u32) -> Result<()>;

    /// Reads consecutive bytes starting at `address` into `out`.
    fn read_block(&mut self, address: u32, out: &mut [u8]) -> Result<()> {
        for (offset, byte) in out.iter_mut().enumerate() {
            let addr = block_address(address, offset)?;
            *byte = self.read(addr, AccessWidth::Byte)? as u8;
        }
        Ok(())
    }

    /// Writes `data` to consecutive bytes starting at `address`.
    fn write_block(&mut self, address: u32, data: &[u8]) -> Result<()> {
        for (offset, byte) in data.iter().enumerate() {
            let addr = block_address(address, offset)?;
            self.write(addr, AccessWidth::Byte, *byte as u32)?;
        }
        Ok(())
    }
}

fn block_address(base: u32, offset: usize) -> Result<u32> {
    u32::try_from(offset)
        .ok()
        .and_then(|offset| base.checked_add(offset))
        .ok_or(Error::AddressOutOfRange { address: base })
}

impl<P: MemoryAccessProtocol + ?Sized> MemoryAccessProtocol for &mut P {
    #[inline]
    fn read(&mut self, address: u32, width: AccessWidth) -> Result<u32> {
        (**self).read(address, width)
    }

    #[inline]
    fn write(&mut self, address: u32, width: AccessWidth, value: u32) -> Result<()> {
        (**self).write(address, width, value)
    }
}

/// Typed accessors available on every protocol.
pub trait MemoryAccessExt: MemoryAccessProtocol {
    macros::impl_typed_access!(u8, Byte);
    macros::impl_typed_access!(u16, HalfWord);
    macros::impl_typed_access!(u32, Word);
}

impl<P: MemoryAccessProtocol + ?Sized> MemoryAccessExt for P {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn width_limits() {
        assert_eq!(AccessWidth::Byte.max_value(), 0xFF);
        assert_eq!(AccessWidth::HalfWord.max_value(), 0xFFFF);
        assert_eq!(AccessWidth::Word.bits(), 32);

        assert!(AccessWidth::Byte.check_value(0xFF).is_ok());
        assert_eq!(
            AccessWidth::Byte.check_value(0x100),
            Err(Error::InvalidFieldValue {
                value: 0x100,
                width: 8
            })
        );
    }

    #[test]
    fn alignment() {
        assert!(AccessWidth::Byte.check_alignment(0x4000_0003).is_ok());
        assert!(AccessWidth::HalfWord.check_alignment(0x4000_0002).is_ok());
        assert_eq!(
            AccessWidth::Word.check_alignment(0x4000_0002),
            Err(Error::MisalignedAccess {
                address: 0x4000_0002,
                width: 4
            })
        );
    }

    #[test]
    fn typed_accessors_round_trip_through_mock() {
        let mut mock = MockProtocol::<16>::new();

        mock.write_u32(0x100, 0xDEAD_BEEF).unwrap();
        mock.write_u16(0x104, 0x1234).unwrap();
        mock.write_u8(0x106, 0x56).unwrap();

        assert_eq!(mock.read_u32(0x100).unwrap(), 0xDEAD_BEEF);
        assert_eq!(mock.read_u16(0x104).unwrap(), 0x1234);
        assert_eq!(mock.read_u8(0x106).unwrap(), 0x56);
        // Little-endian byte image
        assert_eq!(mock.read_u8(0x100).unwrap(), 0xEF);
    }

    fn fill_block<P: MemoryAccessProtocol>(mut protocol: P) {
        protocol.write_block(0x20, &[1, 2, 3]).unwrap();
    }

    #[test]
    fn block_access_through_mutable_reference() {
        let mut mock = MockProtocol::<16>::new();
        fill_block(&mut mock);

        let mut out = [0u8; 4];
        mock.read_block(0x20, &mut out).unwrap();
        assert_eq!(out, [1, 2, 3, 0]);
    }
}
