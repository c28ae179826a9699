//! I2C bus contract and a register-level reference controller.
//!
//! Bus drivers accept a [`Transaction`] and build `write`, `read` and
//! `write_then_read` on top of it. Every transfer carries a timeout measured on
//! an [`UptimeClock`](crate::time::UptimeClock), independent of the task
//! scheduler, and every data-path call checks the module lifecycle first.

pub mod controller;

pub use controller::{I2cController, I2cRegisters};

use core::time::Duration;

use crate::{error::Result, module::Peripheral};

/// Timeout used when the caller does not pick one.
pub const I2C_DEFAULT_TIMEOUT: Duration = Duration::from_millis(100);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct I2cSettings {
    pub frequency_hz: u32,
    /// Share of each SCL period held low, in percent.
    pub duty_cycle_percent: u8,
}

impl Default for I2cSettings {
    fn default() -> Self {
        Self {
            frequency_hz: 100_000,
            duty_cycle_percent: 50,
        }
    }
}

/// Direction bit sent with the device address.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Operation {
    Write = 0,
    Read = 1,
}

/// One bus transfer: an optional write phase, then an optional read phase.
///
/// With `repeated` set, the write phase ends in a repeated start instead of a
/// stop and the read phase follows without releasing the bus.
#[derive(Debug)]
pub struct Transaction<'a> {
    pub operation: Operation,
    /// 7-bit device address.
    pub address: u8,
    pub transmit: &'a [u8],
    pub receive: &'a mut [u8],
    pub timeout: Duration,
    pub repeated: bool,
}

impl<'a> Transaction<'a> {
    pub fn write(address: u8, transmit: &'a [u8]) -> Self {
        Self {
            operation: Operation::Write,
            address,
            transmit,
            receive: &mut [],
            timeout: I2C_DEFAULT_TIMEOUT,
            repeated: false,
        }
    }

    pub fn read(address: u8, receive: &'a mut [u8]) -> Self {
        Self {
            operation: Operation::Read,
            address,
            transmit: &[],
            receive,
            timeout: I2C_DEFAULT_TIMEOUT,
            repeated: false,
        }
    }

    pub fn write_then_read(address: u8, transmit: &'a [u8], receive: &'a mut [u8]) -> Self {
        Self {
            operation: Operation::Write,
            address,
            transmit,
            receive,
            timeout: I2C_DEFAULT_TIMEOUT,
            repeated: true,
        }
    }

    pub fn with_timeout(self, timeout: Duration) -> Self {
        Self { timeout, ..self }
    }

    /// Address byte on the wire: the 7-bit address followed by the direction bit.
    pub fn address_byte(&self, operation: Operation) -> u8 {
        (self.address << 1) | operation as u8
    }
}

/// I2C bus driver contract.
///
/// Implementors supply [`I2c::transaction`]; the helpers check that the module
/// is enabled before building the transaction.
pub trait I2c: Peripheral<Settings = I2cSettings> {
    fn transaction(&mut self, transaction: Transaction<'_>) -> Result<()>;

    fn write(&mut self, address: u8, transmit: &[u8]) -> Result<()> {
        self.write_with_timeout(address, transmit, I2C_DEFAULT_TIMEOUT)
    }

    fn write_with_timeout(&mut self, address: u8, transmit: &[u8], timeout: Duration) -> Result<()> {
        self.ensure_enabled()?;
        self.transaction(Transaction::write(address, transmit).with_timeout(timeout))
    }

    fn read(&mut self, address: u8, receive: &mut [u8]) -> Result<()> {
        self.read_with_timeout(address, receive, I2C_DEFAULT_TIMEOUT)
    }

    fn read_with_timeout(&mut self, address: u8, receive: &mut [u8], timeout: Duration) -> Result<()> {
        self.ensure_enabled()?;
        self.transaction(Transaction::read(address, receive).with_timeout(timeout))
    }

    fn write_then_read(&mut self, address: u8, transmit: &[u8], receive: &mut [u8]) -> Result<()> {
        self.write_then_read_with_timeout(address, transmit, receive, I2C_DEFAULT_TIMEOUT)
    }

    fn write_then_read_with_timeout(
        &mut self,
        address: u8,
        transmit: &[u8],
        receive: &mut [u8],
        timeout: Duration,
    ) -> Result<()> {
        self.ensure_enabled()?;
        self.transaction(Transaction::write_then_read(address, transmit, receive).with_timeout(timeout))
    }
}
