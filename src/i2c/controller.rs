use crate::{
    bit::Mask,
    error::{Error, Result},
    i2c::{I2c, I2cSettings, Operation, Transaction},
    module::{Module, Peripheral},
    protocol::{MemoryAccessProtocol, Register},
    system::{ResourceId, SystemController},
    time::{Deadline, UptimeClock},
};

// Control register flags, written through the set and clear registers.
const ASSERT_ACK: Mask = Mask::bit(2);
const INTERRUPT: Mask = Mask::bit(3);
const STOP: Mask = Mask::bit(4);
const START: Mask = Mask::bit(5);
const INTERFACE_ENABLE: Mask = Mask::bit(6);

// SCL high and low counts
const SCL_COUNT: Mask = Mask::new(0, 16);

/// Controller state codes reported in the status register.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
enum MasterState {
    BusError = 0x00,
    Start = 0x08,
    RepeatedStart = 0x10,
    AddressWriteAck = 0x18,
    AddressWriteNack = 0x20,
    DataSentAck = 0x28,
    DataSentNack = 0x30,
    ArbitrationLost = 0x38,
    AddressReadAck = 0x40,
    AddressReadNack = 0x48,
    DataReceivedAck = 0x50,
    DataReceivedNack = 0x58,
    Idle = 0xF8,
}

impl MasterState {
    fn from_code(code: u8) -> Option<Self> {
        let state = match code {
            0x00 => MasterState::BusError,
            0x08 => MasterState::Start,
            0x10 => MasterState::RepeatedStart,
            0x18 => MasterState::AddressWriteAck,
            0x20 => MasterState::AddressWriteNack,
            0x28 => MasterState::DataSentAck,
            0x30 => MasterState::DataSentNack,
            0x38 => MasterState::ArbitrationLost,
            0x40 => MasterState::AddressReadAck,
            0x48 => MasterState::AddressReadNack,
            0x50 => MasterState::DataReceivedAck,
            0x58 => MasterState::DataReceivedNack,
            0xF8 => MasterState::Idle,
            _ => return None,
        };
        Some(state)
    }
}

/// Register block of one I2C controller instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct I2cRegisters {
    /// Write-one-to-set control flags.
    pub control_set: Register,
    pub status: Register,
    pub data: Register,
    pub duty_high: Register,
    pub duty_low: Register,
    /// Write-one-to-clear control flags.
    pub control_clear: Register,
    /// Power gating bit of this controller.
    pub resource: ResourceId,
}

impl I2cRegisters {
    /// Common layout: control set at `base`, status +0x04, data +0x08, SCL high
    /// +0x10, SCL low +0x14, control clear +0x18.
    pub const fn from_base(base: u32, resource: ResourceId) -> Self {
        let control_set = Register::word(base);
        Self {
            control_set,
            status: control_set.offset(0x04),
            data: control_set.offset(0x08),
            duty_high: control_set.offset(0x10),
            duty_low: control_set.offset(0x14),
            control_clear: control_set.offset(0x18),
            resource,
        }
    }
}

/// Polling I2C master over a memory-access protocol.
///
/// `P` reaches the controller's registers, `S` gates its power and reports its
/// input clock, and `C` times out stuck transfers.
///
/// ```
/// use core::time::Duration;
/// use embedded_periph::i2c::{I2c, I2cController, I2cRegisters, I2cSettings};
/// use embedded_periph::module::Peripheral;
/// use embedded_periph::protocol::{MockProtocol, Register};
/// use embedded_periph::system::{ResourceId, SystemContext};
/// use embedded_periph::time::UptimeClock;
/// use embedded_periph::Error;
///
/// struct Uptime;
/// impl UptimeClock for Uptime {
///     fn uptime(&self) -> Duration {
///         Duration::ZERO
///     }
/// }
///
/// let system = SystemContext::new(MockProtocol::<8>::new(), Register::word(0x400F_C0C4), 48_000_000, 4);
/// let registers = I2cRegisters::from_base(0x4001_C000, ResourceId(7));
/// let mut i2c = I2cController::new(
///     MockProtocol::<32>::new(),
///     &system,
///     Uptime,
///     registers,
///     I2cSettings::default(),
/// );
///
/// assert_eq!(i2c.write(0x29, &[0x01]), Err(Error::ModuleNotEnabled));
/// assert!(i2c.protocol().is_untouched());
///
/// i2c.initialize().unwrap();
/// i2c.enable(true).unwrap();
/// ```
pub struct I2cController<P, S, C> {
    protocol: P,
    system: S,
    clock: C,
    registers: I2cRegisters,
    module: Module<I2cSettings>,
}

/// Outcome of handling one controller state.
enum Step {
    Continue,
    Done,
}

/// Progress through the current transaction.
struct Cursor {
    operation: Operation,
    position: usize,
}

impl<P, S, C> I2cController<P, S, C>
where
    P: MemoryAccessProtocol,
    S: SystemController,
    C: UptimeClock,
{
    pub fn new(protocol: P, system: S, clock: C, registers: I2cRegisters, settings: I2cSettings) -> Self {
        Self {
            protocol,
            system,
            clock,
            registers,
            module: Module::new(settings),
        }
    }

    pub fn protocol(&self) -> &P {
        &self.protocol
    }

    pub fn protocol_mut(&mut self) -> &mut P {
        &mut self.protocol
    }

    pub fn registers(&self) -> &I2cRegisters {
        &self.registers
    }

    fn configure_clock(&mut self) -> Result<()> {
        let settings = *self.module.settings();
        let input_hz = self.system.peripheral_frequency(self.registers.resource) as u64;
        let divider = input_hz / settings.frequency_hz.max(1) as u64;
        let low = divider * settings.duty_cycle_percent.min(100) as u64 / 100;
        let high = divider - low;
        log::debug!(
            "i2c at {} Hz: scl high {high}, low {low}",
            settings.frequency_hz
        );

        let high = u32::try_from(high).unwrap_or(u32::MAX);
        let low = u32::try_from(low).unwrap_or(u32::MAX);
        self.registers
            .duty_high
            .field(&mut self.protocol, SCL_COUNT)
            .insert(high)?;
        self.registers
            .duty_low
            .field(&mut self.protocol, SCL_COUNT)
            .insert(low)
    }

    fn set_flags(&mut self, bits: u32) -> Result<()> {
        self.registers.control_set.write(&mut self.protocol, bits)
    }

    fn clear_flags(&mut self, bits: u32) -> Result<()> {
        self.registers.control_clear.write(&mut self.protocol, bits)
    }

    /// Handles one controller state and acknowledges the interrupt flag.
    fn step(&mut self, state: MasterState, transaction: &mut Transaction<'_>, cursor: &mut Cursor) -> Result<Step> {
        let mut set = 0;
        let mut clear = 0;
        let mut outcome = Ok(Step::Continue);

        match state {
            MasterState::BusError => {
                set = ASSERT_ACK.bits() | STOP.bits();
                outcome = Err(Error::BusError);
            }
            MasterState::Start => {
                let address = transaction.address_byte(cursor.operation);
                self.registers.data.write(&mut self.protocol, address as u32)?;
            }
            MasterState::RepeatedStart => {
                cursor.operation = Operation::Read;
                cursor.position = 0;
                let address = transaction.address_byte(Operation::Read);
                self.registers.data.write(&mut self.protocol, address as u32)?;
            }
            MasterState::AddressWriteAck | MasterState::DataSentAck => {
                clear = START.bits();
                if let Some(&byte) = transaction.transmit.get(cursor.position) {
                    self.registers.data.write(&mut self.protocol, byte as u32)?;
                    cursor.position += 1;
                } else if transaction.repeated {
                    set = START.bits();
                    clear = 0;
                } else {
                    set = STOP.bits();
                    outcome = Ok(Step::Done);
                }
            }
            MasterState::AddressWriteNack | MasterState::AddressReadNack => {
                clear = START.bits();
                set = STOP.bits();
                outcome = Err(Error::DeviceNotFound {
                    address: transaction.address,
                });
            }
            MasterState::DataSentNack => {
                set = STOP.bits();
                outcome = Ok(Step::Done);
            }
            MasterState::ArbitrationLost => {
                // Start again once the bus is free
                set = START.bits();
            }
            MasterState::AddressReadAck => {
                clear = START.bits();
                match transaction.receive.len() {
                    0 => {
                        set = STOP.bits();
                        outcome = Ok(Step::Done);
                    }
                    // NACK the only byte
                    1 => clear |= ASSERT_ACK.bits(),
                    _ => set = ASSERT_ACK.bits(),
                }
            }
            MasterState::DataReceivedAck => {
                self.receive_byte(transaction, cursor)?;
                if cursor.position + 1 >= transaction.receive.len() {
                    clear = ASSERT_ACK.bits();
                } else {
                    set = ASSERT_ACK.bits();
                }
            }
            MasterState::DataReceivedNack => {
                self.receive_byte(transaction, cursor)?;
                set = STOP.bits();
                outcome = Ok(Step::Done);
            }
            MasterState::Idle => return Ok(Step::Continue),
        }

        if set != 0 {
            self.set_flags(set)?;
        }
        self.clear_flags(clear | INTERRUPT.bits())?;
        outcome
    }

    fn receive_byte(&mut self, transaction: &mut Transaction<'_>, cursor: &mut Cursor) -> Result<()> {
        let byte = self.registers.data.read(&mut self.protocol)? as u8;
        if let Some(slot) = transaction.receive.get_mut(cursor.position) {
            *slot = byte;
            cursor.position += 1;
        }
        Ok(())
    }

    fn abort(&mut self) -> Result<()> {
        self.set_flags(ASSERT_ACK.bits() | STOP.bits())
    }
}

impl<P, S, C> Peripheral for I2cController<P, S, C>
where
    P: MemoryAccessProtocol,
    S: SystemController,
    C: UptimeClock,
{
    type Settings = I2cSettings;

    fn module(&self) -> &Module<I2cSettings> {
        &self.module
    }

    fn module_mut(&mut self) -> &mut Module<I2cSettings> {
        &mut self.module
    }

    fn module_initialize(&mut self) -> Result<()> {
        self.system.power_up(self.registers.resource)?;
        self.configure_clock()?;
        self.clear_flags(ASSERT_ACK.bits() | INTERRUPT.bits() | STOP.bits() | START.bits())
    }

    fn module_enable(&mut self, enable: bool) -> Result<()> {
        if enable {
            self.set_flags(INTERFACE_ENABLE.bits())
        } else {
            self.clear_flags(INTERFACE_ENABLE.bits())
        }
    }

    fn module_power_down(&mut self) -> Result<()> {
        self.clear_flags(INTERFACE_ENABLE.bits())?;
        self.system.power_down(self.registers.resource)
    }
}

impl<P, S, C> I2c for I2cController<P, S, C>
where
    P: MemoryAccessProtocol,
    S: SystemController,
    C: UptimeClock,
{
    fn transaction(&mut self, mut transaction: Transaction<'_>) -> Result<()> {
        self.module.ensure_enabled()?;

        let deadline = Deadline::after(&self.clock, transaction.timeout);
        let mut cursor = Cursor {
            operation: transaction.operation,
            position: 0,
        };
        self.set_flags(START.bits())?;

        loop {
            if deadline.has_expired(&self.clock) {
                log::error!(
                    "i2c transaction with {:#04x} timed out after {:?}",
                    transaction.address,
                    transaction.timeout
                );
                self.abort()?;
                return Err(Error::TransactionTimeout);
            }

            let code = self.registers.status.read(&mut self.protocol)? as u8;
            let Some(state) = MasterState::from_code(code) else {
                log::error!("i2c controller reported unknown state {code:#04x}");
                self.abort()?;
                return Err(Error::BusError);
            };

            match self.step(state, &mut transaction, &mut cursor) {
                Ok(Step::Continue) => {}
                Ok(Step::Done) => return Ok(()),
                Err(error) => {
                    log::warn!("i2c transaction with {:#04x} failed: {error}", transaction.address);
                    return Err(error);
                }
            }
        }
    }
}

impl<P, S, C> core::fmt::Debug for I2cController<P, S, C> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("I2cController")
            .field("registers", &self.registers)
            .field("state", &self.module.state())
            .field("settings", self.module.settings())
            .finish_non_exhaustive()
    }
}
