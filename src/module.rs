//! Generic peripheral lifecycle.
//!
//! Every peripheral driver owns one [`Module`] and implements [`Peripheral`]
//! by supplying the hardware hooks. The provided methods of [`Peripheral`]
//! enforce the state machine below, so a driver never sees a hook called out
//! of order:
//!
//! ```text
//!                initialize()          enable(true)
//!  Uninitialized ────────────▶ Initialized ──────────▶ Enabled
//!        ▲                          ▲  ◀──────────────    │
//!        │ recover()                │    enable(false)    │
//!        │                          │ initialize()        │
//!     Critical               PoweredDown ◀────────────────┘
//!                                    ◀── power_down() from any state
//! ```
//!
//! Out-of-order calls fail at the first offending call without touching the
//! hardware, and are logged at `error` level.

use crate::error::{Error, Result};

/// Lifecycle state of a peripheral.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum State {
    Uninitialized,
    Initialized,
    Enabled,
    PoweredDown,
    /// The driver hit an unrecoverable failure; only [`Module::recover`] leaves it.
    Critical,
}

/// Settings and lifecycle state of one exclusive hardware resource.
///
/// Not `Clone`: a module stands for a single peripheral instance and has
/// exactly one owner.
#[derive(Debug)]
pub struct Module<S> {
    settings: S,
    state: State,
}

impl<S> Module<S> {
    pub const fn new(settings: S) -> Self {
        Self {
            settings,
            state: State::Uninitialized,
        }
    }

    pub fn state(&self) -> State {
        self.state
    }

    pub fn settings(&self) -> &S {
        &self.settings
    }

    pub fn is_enabled(&self) -> bool {
        self.state == State::Enabled
    }

    /// Replaces the settings applied by the next initialize.
    ///
    /// Settings are frozen from initialize until power down.
    pub fn configure(&mut self, settings: S) -> Result<()> {
        match self.state {
            State::Uninitialized | State::PoweredDown => {
                self.settings = settings;
                Ok(())
            }
            State::Critical => Err(violation("configure", Error::ModuleCritical)),
            State::Initialized | State::Enabled => {
                Err(violation("configure", Error::ModuleAlreadyInitialized))
            }
        }
    }

    /// Fails unless the module is enabled. Every data-path call starts here.
    pub fn ensure_enabled(&self) -> Result<()> {
        match self.state {
            State::Enabled => Ok(()),
            State::Critical => Err(violation("data transfer", Error::ModuleCritical)),
            _ => Err(violation("data transfer", Error::ModuleNotEnabled)),
        }
    }

    pub fn mark_critical(&mut self) {
        log::error!("module marked critical in state {:?}", self.state);
        self.state = State::Critical;
    }

    /// Leaves [`State::Critical`]; the module must be initialized again.
    pub fn recover(&mut self) {
        if self.state == State::Critical {
            log::debug!("module recovered");
            self.state = State::Uninitialized;
        }
    }

    fn check_initialize(&self) -> Result<()> {
        match self.state {
            State::Uninitialized | State::PoweredDown => Ok(()),
            State::Critical => Err(violation("initialize", Error::ModuleCritical)),
            State::Initialized | State::Enabled => {
                Err(violation("initialize", Error::ModuleAlreadyInitialized))
            }
        }
    }

    fn check_enable(&self) -> Result<()> {
        match self.state {
            State::Initialized | State::Enabled => Ok(()),
            State::Critical => Err(violation("enable", Error::ModuleCritical)),
            State::Uninitialized | State::PoweredDown => {
                Err(violation("enable", Error::ModuleNotInitialized))
            }
        }
    }

    fn check_power_down(&self) -> Result<()> {
        match self.state {
            State::Critical => Err(violation("power down", Error::ModuleCritical)),
            _ => Ok(()),
        }
    }

    fn transition(&mut self, to: State) {
        log::debug!("module {:?} -> {:?}", self.state, to);
        self.state = to;
    }
}

impl<S: Default> Default for Module<S> {
    fn default() -> Self {
        Self::new(S::default())
    }
}

fn violation(operation: &str, error: Error) -> Error {
    log::error!("{operation} rejected: {error}");
    error
}

/// Lifecycle contract of a peripheral driver.
///
/// Implementors provide access to their [`Module`] and the three hardware
/// hooks; callers use the provided methods, which check the state before a
/// hook runs and record the transition after it succeeds. A failing hook leaves
/// the state unchanged.
pub trait Peripheral {
    /// Configuration applied by [`Peripheral::module_initialize`].
    type Settings;

    fn module(&self) -> &Module<Self::Settings>;
    fn module_mut(&mut self) -> &mut Module<Self::Settings>;

    /// Applies `self.module().settings()` to the hardware.
    fn module_initialize(&mut self) -> Result<()>;

    /// Gates the peripheral's clock and I/O.
    fn module_enable(&mut self, enable: bool) -> Result<()>;

    /// Releases clock and power. Peripherals without a low-power mode keep the
    /// default.
    fn module_power_down(&mut self) -> Result<()> {
        Ok(())
    }

    fn initialize(&mut self) -> Result<()> {
        self.module().check_initialize()?;
        self.module_initialize()?;
        self.module_mut().transition(State::Initialized);
        Ok(())
    }

    fn enable(&mut self, enable: bool) -> Result<()> {
        self.module().check_enable()?;
        let target = if enable {
            State::Enabled
        } else {
            State::Initialized
        };
        if self.module().state() == target {
            return Ok(());
        }
        self.module_enable(enable)?;
        self.module_mut().transition(target);
        Ok(())
    }

    fn power_down(&mut self) -> Result<()> {
        self.module().check_power_down()?;
        if self.module().state() == State::PoweredDown {
            return Ok(());
        }
        self.module_power_down()?;
        self.module_mut().transition(State::PoweredDown);
        Ok(())
    }

    fn state(&self) -> State {
        self.module().state()
    }

    fn ensure_enabled(&self) -> Result<()> {
        self.module().ensure_enabled()
    }
}
