//! A `no_std`, no-alloc peripheral and task substrate for Cortex-M microcontrollers.
//!
//! This crate provides the pieces every peripheral driver and application task
//! shares, independent of the silicon vendor:
//!
//! # Features
//!
//! - **Bit fields** - `(position, width)` masks and pure, bit-exact field updates
//! - **Memory access protocols** - width-checked register access over real MMIO
//!   or a captured memory image for host-side tests
//! - **Module lifecycle** - one initialize/enable/power-down state machine for
//!   every peripheral kind
//! - **Tasks** - fixed-stack tasks, periodic tasks and a priority scheduler
//!   layered over a preemptive kernel
//!
//! # Architecture
//!
//! ```text
//! ┌───────────────┐   ┌────────────────┐   ┌──────────────────────────┐
//! │ bit::Mask     │──▶│ protocol       │──▶│ module::Peripheral       │
//! │ (pure fields) │   │ Register/Value │   │ (lifecycle + hooks)      │
//! └───────────────┘   │ Hardware, Mock │   │   └─ i2c::I2cController  │
//!                     └────────────────┘   └──────────────────────────┘
//!                                                       ▲
//!                     system::SystemContext ────────────┘ power, clocks
//!
//! ┌──────────────────────────────────────────────────────────────────┐
//! │ rtos: Task / PeriodicTask ──▶ TaskScheduler ──▶ Kernel (tick)    │
//! └──────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Drivers are written once against [`MemoryAccessProtocol`] and verified on
//! the host by comparing a [`MockProtocol`]'s captured image with the registers
//! they were expected to write.
//!
//! # Example
//!
//! ```rust
//! use embedded_periph::prelude::*;
//!
//! const CONTROL: Register = Register::word(0x4000_8000);
//! const MODE: Mask = Mask::from_range(4, 6);
//!
//! let mut mock = MockProtocol::<8>::new();
//! CONTROL.field(&mut mock, MODE).insert(0b101).unwrap();
//!
//! let expected =
//!     MockProtocol::<8>::from_registers(&[(0x4000_8000, AccessWidth::Word, 0x50)]).unwrap();
//! assert!(mock == expected);
//! ```
//!
//! [`MemoryAccessProtocol`]: protocol::MemoryAccessProtocol
//! [`MockProtocol`]: protocol::MockProtocol

#![deny(unsafe_code)]
#![no_std]

pub mod bit;
pub mod error;
pub mod i2c;
pub mod module;
pub mod protocol;
pub mod rtos;
pub mod system;
pub mod time;

#[cfg(test)]
mod test_support;

pub use error::{Error, Result};

pub mod prelude {
    pub use crate::{
        bit::Mask,
        error::{Error, Result},
        i2c::{I2C_DEFAULT_TIMEOUT, I2c, I2cController, I2cRegisters, I2cSettings, Transaction},
        module::{Module, Peripheral, State},
        protocol::{
            AccessWidth, HardwareProtocol, MemoryAccessExt, MemoryAccessProtocol, MockProtocol,
            Register, Value,
        },
        rtos::{
            Frequency, Kernel, PeriodicTask, Priority, Runnable, RunsPerTick, StackSwitch, Task,
            TaskControl, TaskHandle, TaskInterface, TaskScheduler, TaskSchedulerBuilder,
        },
        system::{ResourceId, SystemContext, SystemController},
        time::{Deadline, UptimeClock},
    };
}
