//! Process-wide system context: peripheral power gating and clock rates.
//!
//! There is exactly one context per running system. It is constructed once
//! (usually as a `static`), never torn down, and handed by reference to every
//! module that needs power or clock information. Tests build their own context
//! over a [`MockProtocol`](crate::protocol::MockProtocol).
//!
//! ```rust,no_run
//! use embedded_periph::protocol::{HardwareProtocol, Register};
//! use embedded_periph::system::SystemContext;
//!
//! // Power control register and clocks of the target part.
//! static SYSTEM: SystemContext<HardwareProtocol> = SystemContext::new(
//!     unsafe { HardwareProtocol::new() },
//!     Register::word(0x400F_C0C4),
//!     120_000_000,
//!     1,
//! );
//! ```

use core::cell::RefCell;

use critical_section::Mutex;

use crate::{
    bit::Mask,
    error::Result,
    protocol::{MemoryAccessProtocol, Register},
};

/// Bit index of a peripheral in the power control register.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ResourceId(pub u8);

/// Power and clock services shared by all peripheral modules.
pub trait SystemController {
    fn power_up(&self, id: ResourceId) -> Result<()>;
    fn power_down(&self, id: ResourceId) -> Result<()>;
    fn is_powered_up(&self, id: ResourceId) -> Result<bool>;
    /// Input clock of the peripheral in hertz.
    fn peripheral_frequency(&self, id: ResourceId) -> u32;
}

impl<S: SystemController + ?Sized> SystemController for &S {
    fn power_up(&self, id: ResourceId) -> Result<()> {
        (**self).power_up(id)
    }

    fn power_down(&self, id: ResourceId) -> Result<()> {
        (**self).power_down(id)
    }

    fn is_powered_up(&self, id: ResourceId) -> Result<bool> {
        (**self).is_powered_up(id)
    }

    fn peripheral_frequency(&self, id: ResourceId) -> u32 {
        (**self).peripheral_frequency(id)
    }
}

/// System controller backed by a power control register.
///
/// The protocol sits behind a critical section so modules running in
/// different tasks can gate their clocks through a shared reference.
pub struct SystemContext<P> {
    protocol: Mutex<RefCell<P>>,
    power_control: Register,
    cpu_frequency_hz: u32,
    peripheral_divider: u32,
}

impl<P> SystemContext<P> {
    pub const fn new(
        protocol: P,
        power_control: Register,
        cpu_frequency_hz: u32,
        peripheral_divider: u32,
    ) -> Self {
        Self {
            protocol: Mutex::new(RefCell::new(protocol)),
            power_control,
            cpu_frequency_hz,
            peripheral_divider,
        }
    }

    pub fn cpu_frequency(&self) -> u32 {
        self.cpu_frequency_hz
    }

    /// Runs `f` with exclusive access to the context's protocol.
    pub fn with_protocol<R>(&self, f: impl FnOnce(&mut P) -> R) -> R {
        critical_section::with(|cs| f(&mut self.protocol.borrow_ref_mut(cs)))
    }

    pub fn into_inner(self) -> P {
        self.protocol.into_inner().into_inner()
    }
}

impl<P: MemoryAccessProtocol> SystemController for SystemContext<P> {
    fn power_up(&self, id: ResourceId) -> Result<()> {
        log::debug!("power up resource {}", id.0);
        let register = self.power_control;
        self.with_protocol(|protocol| register.field(protocol, Mask::bit(id.0)).set())
    }

    fn power_down(&self, id: ResourceId) -> Result<()> {
        log::debug!("power down resource {}", id.0);
        let register = self.power_control;
        self.with_protocol(|protocol| register.field(protocol, Mask::bit(id.0)).clear())
    }

    fn is_powered_up(&self, id: ResourceId) -> Result<bool> {
        let register = self.power_control;
        self.with_protocol(|protocol| register.field(protocol, Mask::bit(id.0)).is_set())
    }

    fn peripheral_frequency(&self, _id: ResourceId) -> u32 {
        self.cpu_frequency_hz / self.peripheral_divider.max(1)
    }
}
