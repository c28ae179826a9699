use crate::{
    error::Result,
    rtos::{
        stack::TaskStack,
        kernel::StackSwitch,
        task::{Priority, TaskControl, TaskHandle, TaskInterface},
    },
};

/// Common periodic task rates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Frequency {
    Hz1,
    Hz10,
    Hz100,
    Hz1000,
}

impl Frequency {
    pub const fn hz(self) -> u32 {
        match self {
            Frequency::Hz1 => 1,
            Frequency::Hz10 => 10,
            Frequency::Hz100 => 100,
            Frequency::Hz1000 => 1_000,
        }
    }

    /// Ticks between runs at `tick_rate_hz`, never less than one.
    pub const fn period_ticks(self, tick_rate_hz: u32) -> u32 {
        let ticks = tick_rate_hz / self.hz();
        if ticks == 0 { 1 } else { ticks }
    }
}

/// Task that calls `callback` once every `period_ticks` scheduler ticks.
///
/// The callback receives the 1-based run count. When dispatch falls behind by
/// more than one period the task still runs once; the skipped periods are
/// dropped and counted in [`PeriodicTask::missed_count`]. The schedule stays
/// phase-locked to multiples of the period, so jitter never accumulates.
///
/// ```
/// use embedded_periph::rtos::{Frequency, PeriodicTask, Priority, TaskInterface};
///
/// let mut heartbeats = 0;
/// let mut task: PeriodicTask<_, 128> =
///     PeriodicTask::with_frequency("heartbeat", Priority::LOW, Frequency::Hz10, 1_000, |_| {
///         heartbeats += 1;
///         Ok(())
///     });
/// assert_eq!(task.period_ticks(), 100);
///
/// for tick in 1..=1_000 {
///     if task.is_ready(tick) {
///         task.run(tick).unwrap();
///     }
/// }
/// drop(task);
/// assert_eq!(heartbeats, 10);
/// ```
pub struct PeriodicTask<F, const STACK: usize> {
    name: &'static str,
    priority: Priority,
    handle: Option<TaskHandle>,
    control: TaskControl,
    period_ticks: u32,
    last_run_tick: u32,
    run_count: u32,
    missed_count: u32,
    stack: TaskStack<STACK>,
    callback: F,
}

impl<F, const STACK: usize> PeriodicTask<F, STACK>
where
    F: FnMut(u32) -> Result<()>,
{
    /// A zero period is treated as one tick.
    pub fn new(name: &'static str, priority: Priority, period_ticks: u32, callback: F) -> Self {
        Self {
            name,
            priority,
            handle: None,
            control: TaskControl::new(),
            period_ticks: period_ticks.max(1),
            last_run_tick: 0,
            run_count: 0,
            missed_count: 0,
            stack: TaskStack::new(),
            callback,
        }
    }

    pub fn with_frequency(
        name: &'static str,
        priority: Priority,
        frequency: Frequency,
        tick_rate_hz: u32,
        callback: F,
    ) -> Self {
        Self::new(
            name,
            priority,
            frequency.period_ticks(tick_rate_hz),
            callback,
        )
    }

    pub fn period_ticks(&self) -> u32 {
        self.period_ticks
    }

    /// Tick of the last scheduled slot, a multiple of the period.
    pub fn last_run_tick(&self) -> u32 {
        self.last_run_tick
    }

    pub fn run_count(&self) -> u32 {
        self.run_count
    }

    /// Periods forfeited because dispatch fell behind.
    pub fn missed_count(&self) -> u32 {
        self.missed_count
    }

    pub fn stack(&self) -> &TaskStack<STACK> {
        &self.stack
    }

    fn elapsed(&self, tick: u32) -> u32 {
        tick.wrapping_sub(self.last_run_tick)
    }

    /// Moves to the latest slot due at `tick` and returns the new run count,
    /// or `None` if no slot is due.
    fn advance(&mut self, tick: u32) -> Option<u32> {
        let elapsed = self.elapsed(tick);
        if elapsed < self.period_ticks {
            return None;
        }

        let periods = elapsed / self.period_ticks;
        self.last_run_tick = self
            .last_run_tick
            .wrapping_add(periods.wrapping_mul(self.period_ticks));
        if periods > 1 {
            let missed = periods - 1;
            log::warn!("task {} dropped {missed} missed period(s)", self.name);
            self.missed_count = self.missed_count.saturating_add(missed);
        }

        self.run_count = self.run_count.wrapping_add(1);
        Some(self.run_count)
    }
}

impl<F, const STACK: usize> TaskInterface for PeriodicTask<F, STACK>
where
    F: FnMut(u32) -> Result<()>,
{
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
        Ok(())
    }

    fn pre_run(&mut self) -> Result<()> {
        Ok(())
    }

    fn is_ready(&self, tick: u32) -> bool {
        self.elapsed(tick) >= self.period_ticks
    }

    fn run(&mut self, tick: u32) -> Result<()> {
        match self.advance(tick) {
            Some(count) => (self.callback)(count),
            None => Ok(()),
        }
    }

    fn run_on(&mut self, tick: u32, switch: &mut dyn StackSwitch) -> Result<()> {
        let Some(count) = self.advance(tick) else {
            return Ok(());
        };
        let callback = &mut self.callback;
        switch.call_on(self.stack.as_mut_slice(), &mut || callback(count))
    }

    fn control(&self) -> &TaskControl {
        &self.control
    }

    fn check_stack(&self) -> Result<()> {
        self.stack.check(self.name)
    }
}

impl<F, const STACK: usize> core::fmt::Debug for PeriodicTask<F, STACK> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("PeriodicTask")
            .field("name", &self.name)
            .field("priority", &self.priority)
            .field("period_ticks", &self.period_ticks)
            .field("last_run_tick", &self.last_run_tick)
            .field("run_count", &self.run_count)
            .field("missed_count", &self.missed_count)
            .finish_non_exhaustive()
    }
}
