use heapless::LinearMap;

use crate::{
    error::{Error, Result},
    protocol::{AccessWidth, MemoryAccessProtocol},
};

/// Captured memory image for host-side driver tests.
///
/// Holds up to `N` bytes keyed by address, stored little-endian like the
/// Cortex-M bus. Reads of never-written bytes return zero. Two mocks compare
/// equal when their captured images hold the same address/byte pairs, which is
/// how a test asserts that a driver wrote exactly the expected registers.
///
/// ```
/// use embedded_periph::protocol::{AccessWidth, MemoryAccessProtocol, MockProtocol};
///
/// let mut mock = MockProtocol::<8>::new();
/// mock.write(0x10, AccessWidth::Byte, 0xAB).unwrap();
/// assert_eq!(mock.read(0x10, AccessWidth::Byte), Ok(0xAB));
/// assert_eq!(mock.read(0x20, AccessWidth::Byte), Ok(0x00));
/// ```
#[derive(Debug, Clone)]
pub struct MockProtocol<const N: usize = 64> {
    memory: LinearMap<u32, u8, N>,
    region: Option<Region>,
    reads: usize,
    writes: usize,
}

#[derive(Debug, Clone, Copy)]
struct Region {
    base: u32,
    len: u32,
}

impl Region {
    fn contains(&self, address: u32, width: AccessWidth) -> bool {
        let start = address as u64;
        let end = start + width.bytes() as u64;
        let base = self.base as u64;
        start >= base && end <= base + self.len as u64
    }
}

impl<const N: usize> MockProtocol<N> {
    /// Mock that accepts any aligned address.
    pub const fn new() -> Self {
        Self {
            memory: LinearMap::new(),
            region: None,
            reads: 0,
            writes: 0,
        }
    }

    /// Mock that rejects accesses outside `base..base + len` with
    /// [`Error::AddressOutOfRange`].
    pub const fn with_region(base: u32, len: u32) -> Self {
        Self {
            memory: LinearMap::new(),
            region: Some(Region { base, len }),
            reads: 0,
            writes: 0,
        }
    }

    /// Builds an expected snapshot from `(address, width, value)` register writes.
    pub fn from_registers(registers: &[(u32, AccessWidth, u32)]) -> Result<Self> {
        let mut mock = Self::new();
        for &(address, width, value) in registers {
            mock.preload(address, width, value)?;
        }
        Ok(mock)
    }

    /// Seeds the image without counting as driver activity.
    ///
    /// Use this to place status values a driver will poll.
    pub fn preload(&mut self, address: u32, width: AccessWidth, value: u32) -> Result<()> {
        self.check_access(address, width)?;
        width.check_value(value)?;
        self.store(address, width, value)
    }

    /// Captured byte at `address`, if one was ever written.
    pub fn get(&self, address: u32) -> Option<u8> {
        self.memory.get(&address).copied()
    }

    /// Number of captured bytes.
    pub fn len(&self) -> usize {
        self.memory.len()
    }

    pub fn is_empty(&self) -> bool {
        self.memory.is_empty()
    }

    /// Iterates captured `(address, byte)` pairs in first-write order.
    pub fn iter(&self) -> impl Iterator<Item = (u32, u8)> + '_ {
        self.memory.iter().map(|(address, byte)| (*address, *byte))
    }

    /// Protocol reads performed since construction or [`Self::reset_counters`].
    pub fn read_count(&self) -> usize {
        self.reads
    }

    /// Protocol writes performed since construction or [`Self::reset_counters`].
    pub fn write_count(&self) -> usize {
        self.writes
    }

    /// True if no read or write went through the protocol.
    pub fn is_untouched(&self) -> bool {
        self.reads == 0 && self.writes == 0
    }

    pub fn reset_counters(&mut self) {
        self.reads = 0;
        self.writes = 0;
    }

    /// Drops the captured image and the counters.
    pub fn clear(&mut self) {
        self.memory.clear();
        self.reset_counters();
    }

    fn check_access(&self, address: u32, width: AccessWidth) -> Result<()> {
        width.check_alignment(address)?;
        if let Some(region) = self.region {
            if !region.contains(address, width) {
                return Err(Error::AddressOutOfRange { address });
            }
        }
        Ok(())
    }

    fn store(&mut self, address: u32, width: AccessWidth, value: u32) -> Result<()> {
        // Reserve first so a full image never takes a partial write.
        let new_bytes = (0..width.bytes() as u32)
            .filter(|offset| !self.memory.contains_key(&(address + offset)))
            .count();
        if self.memory.len() + new_bytes > N {
            return Err(Error::CapacityExceeded);
        }

        for (offset, byte) in value.to_le_bytes()[..width.bytes()].iter().enumerate() {
            self.memory
                .insert(address + offset as u32, *byte)
                .map_err(|_| Error::CapacityExceeded)?;
        }
        Ok(())
    }

    fn load(&self, address: u32, width: AccessWidth) -> u32 {
        let mut bytes = [0u8; 4];
        for (offset, byte) in bytes[..width.bytes()].iter_mut().enumerate() {
            *byte = self.get(address + offset as u32).unwrap_or(0);
        }
        u32::from_le_bytes(bytes)
    }
}

impl<const N: usize> Default for MockProtocol<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> MemoryAccessProtocol for MockProtocol<N> {
    fn read(&mut self, address: u32, width: AccessWidth) -> Result<u32> {
        self.check_access(address, width)?;
        self.reads += 1;
        Ok(self.load(address, width))
    }

    fn write(&mut self, address: u32, width: AccessWidth, value: u32) -> Result<()> {
        self.check_access(address, width)?;
        width.check_value(value)?;
        self.store(address, width, value)?;
        self.writes += 1;
        Ok(())
    }
}

impl<const A: usize, const B: usize> PartialEq<MockProtocol<B>> for MockProtocol<A> {
    fn eq(&self, other: &MockProtocol<B>) -> bool {
        self.len() == other.len()
            && self
                .iter()
                .all(|(address, byte)| other.get(address) == Some(byte))
    }
}

impl<const N: usize> Eq for MockProtocol<N> {}
