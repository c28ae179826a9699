//! Test support utilities - only compiled in test builds.

use core::{cell::Cell, cell::RefCell, time::Duration};

use crate::{
    error::{Error, Result},
    module::{Module, Peripheral},
    protocol::{MemoryAccessProtocol, MockProtocol, Register},
    rtos::{
        Kernel, Priority, Request, Runnable, StackSwitch, TaskControl, TaskHandle, TaskInterface,
        TaskStack,
    },
    time::UptimeClock,
};

/// Clock that advances by a fixed step on every read.
pub struct FakeClock {
    now: Cell<Duration>,
    step: Duration,
}

impl FakeClock {
    /// Starts at zero; the first read returns `step`.
    pub fn new(step: Duration) -> Self {
        Self {
            now: Cell::new(Duration::ZERO),
            step,
        }
    }

    /// Always reads `at`.
    pub fn frozen(at: Duration) -> Self {
        Self {
            now: Cell::new(at),
            step: Duration::ZERO,
        }
    }
}

impl UptimeClock for FakeClock {
    fn uptime(&self) -> Duration {
        let now = self.now.get().saturating_add(self.step);
        self.now.set(now);
        now
    }
}

/// Kernel that delivers a fixed number of ticks and then returns.
///
/// Every task body it runs is charged `frame_bytes` of stack: that many bytes
/// at the top of the task's arena are overwritten before the body is called.
pub struct FakeKernel {
    pub ticks: u32,
    pub delivered: u32,
    pub frame_bytes: usize,
}

impl FakeKernel {
    pub fn new(ticks: u32) -> Self {
        Self::with_frame(ticks, 8)
    }

    pub fn with_frame(ticks: u32, frame_bytes: usize) -> Self {
        Self {
            ticks,
            delivered: 0,
            frame_bytes,
        }
    }
}

impl StackSwitch for FakeKernel {
    fn call_on(&mut self, stack: &mut [u8], body: &mut dyn FnMut() -> Result<()>) -> Result<()> {
        let top = stack.len().saturating_sub(self.frame_bytes);
        stack[top..].fill(0);
        body()
    }
}

impl Kernel for FakeKernel {
    fn run(&mut self, on_tick: &mut dyn FnMut(&mut dyn StackSwitch) -> Result<()>) -> Result<()> {
        while self.delivered < self.ticks {
            self.delivered += 1;
            on_tick(self)?;
        }
        Ok(())
    }
}

/// Lifecycle hook invocations recorded by [`TestPeripheral`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Hook {
    Initialize,
    Enable(bool),
    PowerDown,
}

const TEST_CONTROL: Register = Register::word(0x4000_0000);

/// Peripheral whose hooks record themselves and write a control register.
pub struct TestPeripheral<S> {
    module: Module<S>,
    protocol: MockProtocol<8>,
    hooks: heapless::Vec<Hook, 16>,
    fail_next: Option<Error>,
}

impl<S> TestPeripheral<S> {
    pub fn new(settings: S) -> Self {
        Self {
            module: Module::new(settings),
            protocol: MockProtocol::new(),
            hooks: heapless::Vec::new(),
            fail_next: None,
        }
    }

    pub fn hooks(&self) -> &[Hook] {
        &self.hooks
    }

    pub fn protocol(&self) -> &MockProtocol<8> {
        &self.protocol
    }

    pub fn fail_next_hook(&mut self, error: Error) {
        self.fail_next = Some(error);
    }

    fn record(&mut self, hook: Hook, control: u32) -> Result<()> {
        if let Some(error) = self.fail_next.take() {
            return Err(error);
        }
        self.protocol.write(TEST_CONTROL.address(), TEST_CONTROL.width(), control)?;
        self.hooks.push(hook).map_err(|_| Error::CapacityExceeded)
    }
}

impl<S> Peripheral for TestPeripheral<S> {
    type Settings = S;

    fn module(&self) -> &Module<S> {
        &self.module
    }

    fn module_mut(&mut self) -> &mut Module<S> {
        &mut self.module
    }

    fn module_initialize(&mut self) -> Result<()> {
        self.record(Hook::Initialize, 0x1)
    }

    fn module_enable(&mut self, enable: bool) -> Result<()> {
        self.record(Hook::Enable(enable), if enable { 0x3 } else { 0x1 })
    }

    fn module_power_down(&mut self) -> Result<()> {
        self.record(Hook::PowerDown, 0x0)
    }
}

/// Shared record of `(tick, task name)` dispatches.
#[derive(Default)]
pub struct RunLog {
    entries: RefCell<heapless::Vec<(u32, &'static str), 128>>,
}

impl RunLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, tick: u32, name: &'static str) {
        // A full log is a test sizing bug
        assert!(self.entries.borrow_mut().push((tick, name)).is_ok(), "run log full");
    }

    pub fn names_at(&self, tick: u32) -> heapless::Vec<&'static str, 16> {
        self.entries
            .borrow()
            .iter()
            .filter(|(at, _)| *at == tick)
            .map(|(_, name)| *name)
            .collect()
    }

    pub fn count(&self, name: &str) -> usize {
        self.entries
            .borrow()
            .iter()
            .filter(|(_, entry)| *entry == name)
            .count()
    }

    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }
}

/// Task body that logs each run and can be told to fail.
pub struct Recorder<'a> {
    pub name: &'static str,
    pub log: &'a RunLog,
    pub setups: u32,
    pub pre_runs: u32,
    pub fail_setup: bool,
    pub fail_at_tick: Option<u32>,
}

impl<'a> Recorder<'a> {
    pub fn new(name: &'static str, log: &'a RunLog) -> Self {
        Self {
            name,
            log,
            setups: 0,
            pre_runs: 0,
            fail_setup: false,
            fail_at_tick: None,
        }
    }
}

impl Runnable for Recorder<'_> {
    fn setup(&mut self) -> Result<()> {
        self.setups += 1;
        if self.fail_setup {
            return Err(Error::BusError);
        }
        Ok(())
    }

    fn pre_run(&mut self) -> Result<()> {
        self.pre_runs += 1;
        Ok(())
    }

    fn run(&mut self, tick: u32) -> Result<()> {
        self.log.push(tick, self.name);
        if self.fail_at_tick == Some(tick) {
            return Err(Error::TransactionTimeout);
        }
        Ok(())
    }
}

/// Hand-written task that posts a control request to itself from inside its
/// own run, on a chosen tick.
pub struct SelfControlledTask<'a> {
    pub control: TaskControl,
    pub stack: TaskStack<32>,
    pub handle: Option<TaskHandle>,
    pub post: Option<(u32, Request)>,
    pub log: &'a RunLog,
}

impl<'a> SelfControlledTask<'a> {
    pub fn new(post_at: u32, request: Request, log: &'a RunLog) -> Self {
        Self {
            control: TaskControl::new(),
            stack: TaskStack::new(),
            handle: None,
            post: Some((post_at, request)),
            log,
        }
    }
}

impl TaskInterface for SelfControlledTask<'_> {
    fn name(&self) -> &'static str {
        "worker"
    }

    fn priority(&self) -> Priority {
        Priority::HIGH
    }

    fn set_priority(&mut self, _priority: Priority) {}

    fn stack_size(&self) -> usize {
        self.stack.size()
    }

    fn handle(&self) -> Option<TaskHandle> {
        self.handle
    }

    fn set_handle(&mut self, handle: TaskHandle) {
        self.handle = Some(handle);
    }

    fn setup(&mut self) -> Result<()> {
        Ok(())
    }

    fn pre_run(&mut self) -> Result<()> {
        Ok(())
    }

    fn is_ready(&self, _tick: u32) -> bool {
        true
    }

    fn run(&mut self, tick: u32) -> Result<()> {
        self.log.push(tick, "worker");
        if let Some((at, request)) = self.post {
            if at == tick {
                self.control.request(request);
            }
        }
        Ok(())
    }

    fn run_on(&mut self, tick: u32, switch: &mut dyn StackSwitch) -> Result<()> {
        let Self {
            control,
            stack,
            post,
            log,
            ..
        } = self;
        switch.call_on(stack.as_mut_slice(), &mut || {
            log.push(tick, "worker");
            if let Some((at, request)) = *post {
                if at == tick {
                    control.request(request);
                }
            }
            Ok(())
        })
    }

    fn control(&self) -> &TaskControl {
        &self.control
    }

    fn check_stack(&self) -> Result<()> {
        self.stack.check(self.name())
    }
}
