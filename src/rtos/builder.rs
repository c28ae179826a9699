use core::marker::PhantomData;

use bitmaps::{Bits, BitsImpl};

use crate::rtos::scheduler::TaskScheduler;

/// How many ready tasks one tick may run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RunsPerTick {
    /// Every ready task runs once, highest priority first.
    #[default]
    AllReady,
    /// At most `n` tasks run; `Limit(1)` gives a single current task per tick.
    /// `n` must be non-zero.
    Limit(usize),
}

impl RunsPerTick {
    pub(crate) fn assert_valid(self) {
        if let RunsPerTick::Limit(n) = self {
            assert!(n > 0, "Runs per tick limit must be non-zero");
        }
    }

    pub(crate) fn budget(self) -> usize {
        match self {
            RunsPerTick::AllReady => usize::MAX,
            RunsPerTick::Limit(n) => n,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchedulerConfig {
    pub tick_rate_hz: u32,
    pub runs_per_tick: RunsPerTick,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            tick_rate_hz: 1_000,
            runs_per_tick: RunsPerTick::AllReady,
        }
    }
}

// Builder states
pub struct NeedCapacity;
pub struct NeedTickRate;
pub struct Ready;

/// Type-state builder for [`TaskScheduler`].
///
/// ```
/// use embedded_periph::rtos::{RunsPerTick, TaskSchedulerBuilder};
///
/// let scheduler = TaskSchedulerBuilder::new()
///     .capacity::<8>()
///     .tick_rate_hz(1_000)
///     .runs_per_tick(RunsPerTick::Limit(1))
///     .build();
/// assert_eq!(scheduler.config().tick_rate_hz, 1_000);
/// ```
pub struct TaskSchedulerBuilder<const N: usize, State> {
    config: SchedulerConfig,
    _state: PhantomData<State>,
}

impl TaskSchedulerBuilder<0, NeedCapacity> {
    pub fn new() -> Self {
        TaskSchedulerBuilder {
            config: SchedulerConfig::default(),
            _state: PhantomData,
        }
    }

    /// Maximum number of registered tasks.
    ///
    /// # Panics
    /// Panics if `N` is zero or larger than 256, the number of task handles.
    pub fn capacity<const N: usize>(self) -> TaskSchedulerBuilder<N, NeedTickRate> {
        assert!(
            N > 0 && N <= 256,
            "Scheduler capacity {} must be between 1 and 256",
            N
        );

        TaskSchedulerBuilder {
            config: self.config,
            _state: PhantomData,
        }
    }
}

impl Default for TaskSchedulerBuilder<0, NeedCapacity> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> TaskSchedulerBuilder<N, NeedTickRate> {
    /// # Panics
    /// Panics if `hz` is zero.
    pub fn tick_rate_hz(self, hz: u32) -> TaskSchedulerBuilder<N, Ready> {
        assert!(hz > 0, "Tick rate must be non-zero");

        TaskSchedulerBuilder {
            config: SchedulerConfig {
                tick_rate_hz: hz,
                ..self.config
            },
            _state: PhantomData,
        }
    }
}

impl<const N: usize> TaskSchedulerBuilder<N, Ready> {
    /// # Panics
    /// Panics on `RunsPerTick::Limit(0)`, which would never run a task.
    pub fn runs_per_tick(mut self, runs: RunsPerTick) -> Self {
        runs.assert_valid();
        self.config.runs_per_tick = runs;
        self
    }

    pub fn config(&self) -> SchedulerConfig {
        self.config
    }

    pub fn build<'a>(self) -> TaskScheduler<'a, N>
    where
        BitsImpl<N>: Bits,
    {
        TaskScheduler::new(self.config)
    }
}
