#![allow(unsafe_code)]

use crate::{
    error::Result,
    protocol::{AccessWidth, MemoryAccessProtocol},
};

/// Direct memory-mapped register access.
///
/// Every access is a single volatile load or store of exactly the requested
/// width. Addresses come from compile-time register tables; nothing here checks
/// that an address is backed by a peripheral.
#[derive(Debug)]
pub struct HardwareProtocol {
    _private: (),
}

impl HardwareProtocol {
    /// # Safety
    /// Every address later passed to `read` or `write` must be a valid
    /// memory-mapped register of the declared width, and the caller must be the
    /// only owner accessing those registers (or synchronize externally).
    pub const unsafe fn new() -> Self {
        Self { _private: () }
    }
}

impl MemoryAccessProtocol for HardwareProtocol {
    #[inline]
    fn read(&mut self, address: u32, width: AccessWidth) -> Result<u32> {
        width.check_alignment(address)?;
        let addr = address as usize;
        // SAFETY: validity of `addr` was promised at construction; alignment checked above.
        let value = unsafe {
            match width {
                AccessWidth::Byte => core::ptr::read_volatile(addr as *const u8) as u32,
                AccessWidth::HalfWord => core::ptr::read_volatile(addr as *const u16) as u32,
                AccessWidth::Word => core::ptr::read_volatile(addr as *const u32),
            }
        };
        Ok(value)
    }

    #[inline]
    fn write(&mut self, address: u32, width: AccessWidth, value: u32) -> Result<()> {
        width.check_alignment(address)?;
        width.check_value(value)?;
        let addr = address as usize;
        // SAFETY: validity of `addr` was promised at construction; alignment checked above.
        unsafe {
            match width {
                AccessWidth::Byte => core::ptr::write_volatile(addr as *mut u8, value as u8),
                AccessWidth::HalfWord => core::ptr::write_volatile(addr as *mut u16, value as u16),
                AccessWidth::Word => core::ptr::write_volatile(addr as *mut u32, value),
            }
        }
        Ok(())
    }
}
