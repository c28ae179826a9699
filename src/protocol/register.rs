use crate::{
    bit::{self, Mask},
    error::Result,
    protocol::{AccessWidth, MemoryAccessProtocol},
};

/// A hardware register at a fixed address and width.
///
/// Register tables are `const` items; a driver only reaches its registers
/// through a [`MemoryAccessProtocol`], never through raw pointers.
///
/// ```
/// use embedded_periph::bit::Mask;
/// use embedded_periph::protocol::{MockProtocol, Register};
///
/// const CONTROL: Register = Register::word(0x4001_C000);
/// const ENABLE: Mask = Mask::bit(6);
///
/// let mut mock = MockProtocol::<8>::new();
/// CONTROL.field(&mut mock, ENABLE).set().unwrap();
/// assert_eq!(CONTROL.read(&mut mock), Ok(0x40));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Register {
    address: u32,
    width: AccessWidth,
}

impl Register {
    pub const fn new(address: u32, width: AccessWidth) -> Self {
        Self { address, width }
    }

    pub const fn byte(address: u32) -> Self {
        Self::new(address, AccessWidth::Byte)
    }

    pub const fn half_word(address: u32) -> Self {
        Self::new(address, AccessWidth::HalfWord)
    }

    pub const fn word(address: u32) -> Self {
        Self::new(address, AccessWidth::Word)
    }

    /// Same-width register `bytes` past this one, for register blocks.
    pub const fn offset(self, bytes: u32) -> Self {
        Self::new(self.address + bytes, self.width)
    }

    pub const fn address(&self) -> u32 {
        self.address
    }

    pub const fn width(&self) -> AccessWidth {
        self.width
    }

    #[inline]
    pub fn read<P: MemoryAccessProtocol + ?Sized>(&self, protocol: &mut P) -> Result<u32> {
        protocol.read(self.address, self.width)
    }

    #[inline]
    pub fn write<P: MemoryAccessProtocol + ?Sized>(&self, protocol: &mut P, value: u32) -> Result<()> {
        protocol.write(self.address, self.width, value)
    }

    /// One read-modify-write. Returns the value written.
    pub fn modify<P, F>(&self, protocol: &mut P, f: F) -> Result<u32>
    where
        P: MemoryAccessProtocol + ?Sized,
        F: FnOnce(u32) -> Result<u32>,
    {
        let current = self.read(protocol)?;
        let updated = f(current)?;
        self.write(protocol, updated)?;
        Ok(updated)
    }

    /// Binds `mask` in this register to `protocol`.
    pub fn field<'a, P>(&self, protocol: &'a mut P, mask: Mask) -> Value<'a, P>
    where
        P: MemoryAccessProtocol + ?Sized,
    {
        Value {
            protocol,
            register: *self,
            mask,
        }
    }
}

/// A bit field of a live register.
///
/// Each call is exactly one read-modify-write (or one read for
/// [`Value::extract`]); nothing is cached between calls.
pub struct Value<'a, P: MemoryAccessProtocol + ?Sized> {
    protocol: &'a mut P,
    register: Register,
    mask: Mask,
}

impl<'a, P: MemoryAccessProtocol + ?Sized> Value<'a, P> {
    pub fn mask(&self) -> Mask {
        self.mask
    }

    pub fn register(&self) -> Register {
        self.register
    }

    /// Reads the register and returns the field shifted to bit 0.
    pub fn extract(&mut self) -> Result<u32> {
        let mask = self.checked_mask()?;
        let current = self.register.read(self.protocol)?;
        Ok(bit::extract(current, mask))
    }

    /// Tests the field's first bit.
    pub fn is_set(&mut self) -> Result<bool> {
        let mask = self.checked_mask()?;
        let current = self.register.read(self.protocol)?;
        Ok(bit::read(current, mask))
    }

    /// Replaces the field with `value`, leaving every other bit as read.
    pub fn insert(&mut self, value: u32) -> Result<()> {
        let mask = self.checked_mask()?;
        self.register
            .modify(self.protocol, |current| bit::insert(current, mask, value))?;
        Ok(())
    }

    pub fn set(&mut self) -> Result<()> {
        let mask = self.checked_mask()?;
        self.register
            .modify(self.protocol, |current| bit::set(current, mask))?;
        Ok(())
    }

    pub fn clear(&mut self) -> Result<()> {
        let mask = self.checked_mask()?;
        self.register
            .modify(self.protocol, |current| bit::clear(current, mask))?;
        Ok(())
    }

    pub fn toggle(&mut self) -> Result<()> {
        let mask = self.checked_mask()?;
        self.register
            .modify(self.protocol, |current| bit::toggle(current, mask))?;
        Ok(())
    }

    fn checked_mask(&self) -> Result<Mask> {
        self.mask.validate(self.register.width.bits())
    }
}

impl<'a, P: MemoryAccessProtocol + ?Sized> core::fmt::Debug for Value<'a, P> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Value")
            .field("register", &self.register)
            .field("mask", &self.mask)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{error::Error, protocol::MockProtocol};

    const STATUS: Register = Register::byte(0x4000_0010);
    const CONTROL: Register = Register::word(0x4000_0000);

    #[test]
    fn field_operations_read_modify_write() {
        let mut mock = MockProtocol::<16>::new();
        CONTROL.write(&mut mock, 0xF0).unwrap();

        CONTROL.field(&mut mock, Mask::new(0, 4)).insert(0x5).unwrap();
        assert_eq!(CONTROL.read(&mut mock), Ok(0xF5));

        CONTROL.field(&mut mock, Mask::new(4, 4)).clear().unwrap();
        assert_eq!(CONTROL.read(&mut mock), Ok(0x05));

        CONTROL.field(&mut mock, Mask::bit(31)).set().unwrap();
        assert_eq!(CONTROL.read(&mut mock), Ok(0x8000_0005));

        CONTROL.field(&mut mock, Mask::new(0, 2)).toggle().unwrap();
        assert_eq!(CONTROL.read(&mut mock), Ok(0x8000_0006));

        assert_eq!(CONTROL.field(&mut mock, Mask::new(1, 2)).extract(), Ok(0b11));
        assert_eq!(CONTROL.field(&mut mock, Mask::bit(31)).is_set(), Ok(true));
    }

    #[test]
    fn each_field_call_is_one_read_and_one_write() {
        let mut mock = MockProtocol::<16>::new();
        CONTROL.field(&mut mock, Mask::bit(3)).set().unwrap();

        assert_eq!(mock.read_count(), 1);
        assert_eq!(mock.write_count(), 1);
    }

    #[test]
    fn mask_must_fit_register_width() {
        let mut mock = MockProtocol::<16>::new();
        assert_eq!(
            STATUS.field(&mut mock, Mask::new(6, 4)).insert(1),
            Err(Error::InvalidMask {
                position: 6,
                width: 4,
                register_bits: 8
            })
        );
        assert!(mock.is_untouched());
    }

    #[test]
    fn invalid_value_leaves_register_unwritten() {
        let mut mock = MockProtocol::<16>::new();
        assert_eq!(
            STATUS.field(&mut mock, Mask::new(0, 3)).insert(8),
            Err(Error::InvalidFieldValue { value: 8, width: 3 })
        );
        assert_eq!(mock.write_count(), 0);
    }

    #[test]
    fn offset_builds_register_blocks() {
        let data = CONTROL.offset(8);
        assert_eq!(data.address(), 0x4000_0008);
        assert_eq!(data.width(), AccessWidth::Word);
    }
}
