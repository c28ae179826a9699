use core::cell::Cell;

use critical_section::Mutex;

use crate::{
    error::Result,
    rtos::{kernel::StackSwitch, stack::TaskStack},
};

/// Task priority; larger runs first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Priority(pub u8);

impl Priority {
    pub const IDLE: Priority = Priority(0);
    pub const LOW: Priority = Priority(1);
    pub const MEDIUM: Priority = Priority(2);
    pub const HIGH: Priority = Priority(3);
    pub const CRITICAL: Priority = Priority(4);
}

/// Scheduler-assigned task identifier, the task's registration slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TaskHandle(pub u8);

/// Lifecycle change a task has asked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Request {
    #[default]
    None,
    Suspend,
    Resume,
    Delete,
}

/// Pending suspend/resume/delete request of one task.
///
/// Requests are posted from any context and applied by the scheduler at the
/// next tick boundary, so a running task is never cut off mid-run. A later
/// request replaces an earlier one that was not applied yet, except that a
/// pending delete is never overridden.
///
/// Every update is a read-modify-write inside a critical section, so an
/// interrupt posting a request cannot interleave with the scheduler taking one.
pub struct TaskControl {
    request: Mutex<Cell<Request>>,
}

impl TaskControl {
    pub const fn new() -> Self {
        Self {
            request: Mutex::new(Cell::new(Request::None)),
        }
    }

    pub fn request(&self, request: Request) {
        critical_section::with(|cs| {
            let pending = self.request.borrow(cs);
            if pending.get() != Request::Delete {
                pending.set(request);
            }
        });
    }

    pub fn pending(&self) -> Request {
        critical_section::with(|cs| self.request.borrow(cs).get())
    }

    /// Takes the pending request. Only the scheduler calls this.
    pub(crate) fn take(&self) -> Request {
        critical_section::with(|cs| self.request.borrow(cs).take())
    }
}

impl Default for TaskControl {
    fn default() -> Self {
        Self::new()
    }
}

impl core::fmt::Debug for TaskControl {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("TaskControl")
            .field("pending", &self.pending())
            .finish()
    }
}

/// Object-safe view of a schedulable task.
///
/// The scheduler stores `&mut dyn TaskInterface`, so tasks with different
/// bodies and stack sizes share one table. [`Task`] and
/// [`PeriodicTask`](crate::rtos::PeriodicTask) implement it; hand-written
/// tasks may too.
pub trait TaskInterface {
    fn name(&self) -> &'static str;
    fn priority(&self) -> Priority;
    fn set_priority(&mut self, priority: Priority);
    fn stack_size(&self) -> usize;

    /// Handle assigned at registration.
    fn handle(&self) -> Option<TaskHandle>;
    fn set_handle(&mut self, handle: TaskHandle);

    /// One-time initialization before the first run.
    fn setup(&mut self) -> Result<()>;

    /// Runs after every task's `setup`, before the first tick.
    fn pre_run(&mut self) -> Result<()>;

    /// Whether the task wants to run on `tick`.
    fn is_ready(&self, tick: u32) -> bool;

    /// Runs the task on the caller's stack.
    fn run(&mut self, tick: u32) -> Result<()>;

    /// Runs the task on its own stack arena through `switch`. This is what
    /// the scheduler calls.
    fn run_on(&mut self, tick: u32, switch: &mut dyn StackSwitch) -> Result<()>;

    fn control(&self) -> &TaskControl;

    /// Checked by the scheduler after every run.
    fn check_stack(&self) -> Result<()>;

    fn suspend(&self) {
        self.control().request(Request::Suspend);
    }

    fn resume(&self) {
        self.control().request(Request::Resume);
    }

    fn delete(&self) {
        self.control().request(Request::Delete);
    }
}

/// Body of a [`Task`].
pub trait Runnable {
    fn setup(&mut self) -> Result<()> {
        Ok(())
    }

    fn pre_run(&mut self) -> Result<()> {
        Ok(())
    }

    fn run(&mut self, tick: u32) -> Result<()>;
}

/// A named, prioritized task with its own stack arena.
///
/// ```
/// use embedded_periph::error::Result;
/// use embedded_periph::rtos::{Priority, Runnable, Task, TaskInterface};
///
/// struct Blink {
///     on: bool,
/// }
///
/// impl Runnable for Blink {
///     fn run(&mut self, _tick: u32) -> Result<()> {
///         self.on = !self.on;
///         Ok(())
///     }
/// }
///
/// let mut task: Task<Blink, 256> = Task::new("blink", Priority::LOW, Blink { on: false });
/// task.set_delay_ticks(500);
/// assert!(task.is_ready(0));
/// assert_eq!(task.stack_size(), 256);
/// ```
pub struct Task<R, const STACK: usize> {
    name: &'static str,
    priority: Priority,
    handle: Option<TaskHandle>,
    control: TaskControl,
    delay_ticks: u32,
    last_run_tick: Option<u32>,
    stack: TaskStack<STACK>,
    body: R,
}

impl<R: Runnable, const STACK: usize> Task<R, STACK> {
    pub const fn new(name: &'static str, priority: Priority, body: R) -> Self {
        Self {
            name,
            priority,
            handle: None,
            control: TaskControl::new(),
            delay_ticks: 0,
            last_run_tick: None,
            stack: TaskStack::new(),
            body,
        }
    }

    /// Minimum ticks between two runs. Zero runs the task on every tick.
    pub fn set_delay_ticks(&mut self, ticks: u32) {
        self.delay_ticks = ticks;
    }

    pub fn delay_ticks(&self) -> u32 {
        self.delay_ticks
    }

    pub fn body(&self) -> &R {
        &self.body
    }

    pub fn body_mut(&mut self) -> &mut R {
        &mut self.body
    }

    pub fn stack(&self) -> &TaskStack<STACK> {
        &self.stack
    }

    pub fn stack_mut(&mut self) -> &mut TaskStack<STACK> {
        &mut self.stack
    }
}

impl<R: Runnable, const STACK: usize> TaskInterface for Task<R, STACK> {
    fn name(&self) -> &'static str {
        self.name
    }

    fn priority(&self) -> Priority {
        self.priority
    }

    fn set_priority(&mut self, priority: Priority) {
        self.priority = priority;
    }

    fn stack_size(&self) -> usize {
        STACK
    }

    fn handle(&self) -> Option<TaskHandle> {
        self.handle
    }

    fn set_handle(&mut self, handle: TaskHandle) {
        self.handle = Some(handle);
    }

    fn setup(&mut self) -> Result<()> {
        self.body.setup()
    }

    fn pre_run(&mut self) -> Result<()> {
        self.body.pre_run()
    }

    fn is_ready(&self, tick: u32) -> bool {
        match self.last_run_tick {
            Some(last) if self.delay_ticks > 0 => tick.wrapping_sub(last) >= self.delay_ticks,
            _ => true,
        }
    }

    fn run(&mut self, tick: u32) -> Result<()> {
        self.last_run_tick = Some(tick);
        self.body.run(tick)
    }

    fn run_on(&mut self, tick: u32, switch: &mut dyn StackSwitch) -> Result<()> {
        self.last_run_tick = Some(tick);
        let body = &mut self.body;
        switch.call_on(self.stack.as_mut_slice(), &mut || body.run(tick))
    }

    fn control(&self) -> &TaskControl {
        &self.control
    }

    fn check_stack(&self) -> Result<()> {
        self.stack.check(self.name)
    }
}

impl<R, const STACK: usize> core::fmt::Debug for Task<R, STACK> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Task")
            .field("name", &self.name)
            .field("priority", &self.priority)
            .field("handle", &self.handle)
            .field("delay_ticks", &self.delay_ticks)
            .field("stack", &self.stack)
            .finish_non_exhaustive()
    }
}
