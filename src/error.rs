/// Errors raised by register access, peripheral lifecycle and task scheduling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// Value does not fit in the bit field (or register) it is written to.
    #[error("value {value:#x} does not fit in a {width}-bit field")]
    InvalidFieldValue { value: u32, width: u8 },
    /// Mask is empty or reaches past the end of the register.
    #[error("mask at bit {position} with width {width} does not fit a {register_bits}-bit register")]
    InvalidMask {
        position: u8,
        width: u8,
        register_bits: u8,
    },
    /// Access outside the region a protocol accepts.
    #[error("address {address:#010x} is outside the accessible region")]
    AddressOutOfRange { address: u32 },
    /// Address is not a multiple of the access width.
    #[error("address {address:#010x} is not aligned to a {width}-byte access")]
    MisalignedAccess { address: u32, width: u8 },
    /// Fixed-capacity storage is full.
    #[error("fixed capacity exceeded")]
    CapacityExceeded,
    /// Lifecycle call requires a prior `initialize`.
    #[error("module has not been initialized")]
    ModuleNotInitialized,
    /// `initialize` was called on a module that is already initialized.
    #[error("module is already initialized")]
    ModuleAlreadyInitialized,
    /// Data-path call issued before the module was enabled.
    #[error("module is not enabled")]
    ModuleNotEnabled,
    /// Module was marked critical and must be recovered first.
    #[error("module is in a critical state")]
    ModuleCritical,
    /// Bus transaction exceeded its timeout.
    #[error("bus transaction timed out")]
    TransactionTimeout,
    /// No device acknowledged the bus address.
    #[error("no device acknowledged address {address:#04x}")]
    DeviceNotFound { address: u8 },
    /// Bus line state did not match what the controller drove.
    #[error("bus error")]
    BusError,
    /// A task wrote past the bottom of its stack.
    #[error("stack overflow in task {task}")]
    StackOverflow { task: &'static str },
    /// Scheduler task table is full.
    #[error("task scheduler is full")]
    SchedulerFull,
    /// Registration attempted after the scheduler started.
    #[error("task scheduler has already started")]
    SchedulerStarted,
    /// `start` called with no registered tasks.
    #[error("no tasks registered")]
    NoTasks,
    /// A task's `setup` or `pre_run` hook failed.
    #[error("setup failed for task {task}")]
    TaskSetupFailed { task: &'static str },
    /// No registered task matches the request.
    #[error("task not found")]
    TaskNotFound,
    /// A task with the same name is already registered.
    #[error("task {task} is already registered")]
    DuplicateTask { task: &'static str },
    /// The kernel tick loop returned control.
    #[error("kernel tick loop exited")]
    KernelExited,
}

impl Error {
    /// Bus-level failures the caller may retry a bounded number of times.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Error::TransactionTimeout | Error::BusError | Error::DeviceNotFound { .. }
        )
    }

    /// Failures after which the system is expected to reset.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Error::StackOverflow { .. } | Error::KernelExited)
    }
}

pub type Result<T> = core::result::Result<T, Error>;
