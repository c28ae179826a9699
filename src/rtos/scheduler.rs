use core::{cmp::Reverse, convert::Infallible};

use bitmaps::{Bitmap, Bits, BitsImpl};
use heapless::{LinearMap, Vec};

use crate::{
    error::{Error, Result},
    rtos::{
        builder::SchedulerConfig,
        kernel::{Kernel, StackSwitch},
        task::{Priority, Request, TaskHandle, TaskInterface},
    },
};

/// Dispatch state of a registered task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskState {
    /// Eligible whenever the task reports itself ready.
    Active,
    Suspended,
    Deleted,
}

/// Snapshot of one registered task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaskInfo {
    pub name: &'static str,
    pub priority: Priority,
    pub stack_size: usize,
    pub state: TaskState,
    pub handle: TaskHandle,
}

struct Slot<'a> {
    task: &'a mut dyn TaskInterface,
    state: TaskState,
}

/// Registration and per-tick dispatch policy above a preemptive kernel.
///
/// Tasks are registered before [`TaskScheduler::start`]; the table is frozen
/// from then on, so the dispatch path needs no locking. On every tick:
///
/// 1. Pending suspend/resume/delete requests are applied.
/// 2. Active tasks that report themselves ready form the ready set.
/// 3. Ready tasks run highest priority first. Within one priority, tasks take
///    turns in registration order, starting after the one that ran last.
/// 4. At most [`RunsPerTick`](crate::rtos::RunsPerTick) tasks run.
///
/// Each task runs on its own stack arena through the kernel's
/// [`StackSwitch`], and its guard word is checked right after. A task whose
/// `run` fails is suspended and the others keep running; a stack overflow
/// stops the scheduler.
pub struct TaskScheduler<'a, const N: usize> {
    slots: Vec<Slot<'a>, N>,
    config: SchedulerConfig,
    tick: u32,
    started: bool,
    // Slot index each priority's round robin resumes from.
    cursors: LinearMap<Priority, usize, N>,
}

impl<'a, const N: usize> TaskScheduler<'a, N>
where
    BitsImpl<N>: Bits,
{
    /// # Panics
    /// Panics on `RunsPerTick::Limit(0)`.
    pub fn new(config: SchedulerConfig) -> Self {
        config.runs_per_tick.assert_valid();
        Self {
            slots: Vec::new(),
            config,
            tick: 0,
            started: false,
            cursors: LinearMap::new(),
        }
    }

    pub fn config(&self) -> SchedulerConfig {
        self.config
    }

    /// Registers `task` and assigns its handle.
    pub fn add_task(&mut self, task: &'a mut dyn TaskInterface) -> Result<TaskHandle> {
        if self.started {
            log::error!("task {} added after start", task.name());
            return Err(Error::SchedulerStarted);
        }
        if self.task_index(task.name()).is_some() {
            return Err(Error::DuplicateTask { task: task.name() });
        }

        if self.slots.is_full() {
            return Err(Error::SchedulerFull);
        }

        let index = self.slots.len();
        let handle = u8::try_from(index)
            .map(TaskHandle)
            .map_err(|_| Error::SchedulerFull)?;
        task.set_handle(handle);
        log::debug!(
            "registered task {} (priority {}, {} byte stack)",
            task.name(),
            task.priority().0,
            task.stack_size()
        );
        self.slots
            .push(Slot {
                task,
                state: TaskState::Active,
            })
            .map_err(|_| Error::SchedulerFull)?;
        Ok(handle)
    }

    /// Unregisters the task named `name` and hands it back.
    ///
    /// Later tasks move up one slot and are given new handles.
    pub fn remove_task(&mut self, name: &str) -> Result<&'a mut dyn TaskInterface> {
        if self.started {
            return Err(Error::SchedulerStarted);
        }
        let index = self.task_index(name).ok_or(Error::TaskNotFound)?;
        let removed = self.slots.remove(index);

        for (index, slot) in self.slots.iter_mut().enumerate().skip(index) {
            slot.task.set_handle(TaskHandle(index as u8));
        }
        self.cursors.clear();
        log::debug!("removed task {name}");
        Ok(removed.task)
    }

    pub fn task(&self, name: &str) -> Option<&dyn TaskInterface> {
        self.slots
            .iter()
            .find(|slot| slot.task.name() == name)
            .map(|slot| &*slot.task)
    }

    pub fn task_index(&self, name: &str) -> Option<usize> {
        self.slots.iter().position(|slot| slot.task.name() == name)
    }

    pub fn task_count(&self) -> usize {
        self.slots.len()
    }

    /// Registered tasks in registration order.
    pub fn tasks(&self) -> impl Iterator<Item = TaskInfo> + '_ {
        self.slots.iter().enumerate().map(|(index, slot)| TaskInfo {
            name: slot.task.name(),
            priority: slot.task.priority(),
            stack_size: slot.task.stack_size(),
            state: slot.state,
            handle: TaskHandle(index as u8),
        })
    }

    pub fn state(&self, name: &str) -> Option<TaskState> {
        self.task_index(name).map(|index| self.slots[index].state)
    }

    pub fn current_tick(&self) -> u32 {
        self.tick
    }

    pub fn is_started(&self) -> bool {
        self.started
    }

    /// Posts a suspend request, applied at the next tick.
    pub fn suspend(&self, name: &str) -> Result<()> {
        self.task(name).ok_or(Error::TaskNotFound)?.suspend();
        Ok(())
    }

    pub fn resume(&self, name: &str) -> Result<()> {
        self.task(name).ok_or(Error::TaskNotFound)?.resume();
        Ok(())
    }

    pub fn delete(&self, name: &str) -> Result<()> {
        self.task(name).ok_or(Error::TaskNotFound)?.delete();
        Ok(())
    }

    /// Runs every task's `setup`, then every `pre_run`, then hands control to
    /// `kernel` for good.
    ///
    /// Only returns on a fault: the setup failure, the fatal dispatch error
    /// the kernel passed back, or [`Error::KernelExited`] if the kernel
    /// returned on its own.
    pub fn start<K: Kernel>(&mut self, mut kernel: K) -> Result<Infallible> {
        if self.started {
            return Err(Error::SchedulerStarted);
        }
        if self.slots.is_empty() {
            log::error!("scheduler started without tasks");
            return Err(Error::NoTasks);
        }
        self.started = true;

        for slot in self.slots.iter_mut() {
            slot.task.setup().map_err(|error| setup_failed(slot.task.name(), error))?;
        }
        for slot in self.slots.iter_mut() {
            slot.task.pre_run().map_err(|error| setup_failed(slot.task.name(), error))?;
        }

        log::debug!(
            "starting kernel with {} tasks at {} Hz",
            self.slots.len(),
            self.config.tick_rate_hz
        );
        let result =
            kernel.run(&mut |switch: &mut dyn StackSwitch| self.dispatch(switch).map(|_| ()));
        match result {
            Ok(()) => {
                log::error!("kernel returned at tick {}", self.tick);
                Err(Error::KernelExited)
            }
            Err(error) => {
                log::error!("scheduler fault at tick {}: {error}", self.tick);
                Err(error)
            }
        }
    }

    /// One tick of the dispatch policy. Returns the number of tasks run.
    fn dispatch(&mut self, switch: &mut dyn StackSwitch) -> Result<usize> {
        self.tick = self.tick.wrapping_add(1);
        let tick = self.tick;
        self.apply_requests();

        let mut ready = Bitmap::<N>::new();
        for (index, slot) in self.slots.iter().enumerate() {
            if slot.state == TaskState::Active && slot.task.is_ready(tick) {
                ready.set(index, true);
            }
        }

        let order = self.dispatch_order(&ready);
        let mut ran = 0;
        for &index in order.iter().take(self.config.runs_per_tick.budget()) {
            let slot = &mut self.slots[index];
            let priority = slot.task.priority();
            log::trace!("tick {tick}: run {}", slot.task.name());

            if let Err(error) = slot.task.run_on(tick, switch) {
                log::warn!("task {} failed: {error}; suspending it", slot.task.name());
                slot.state = TaskState::Suspended;
            }
            slot.task.check_stack()?;

            // Capacity: at most one cursor per slot
            let _ = self.cursors.insert(priority, index + 1);
            ran += 1;
        }
        Ok(ran)
    }

    fn apply_requests(&mut self) {
        for slot in self.slots.iter_mut() {
            let next = match (slot.task.control().take(), slot.state) {
                (_, TaskState::Deleted) | (Request::None, _) => continue,
                (Request::Suspend, _) => TaskState::Suspended,
                (Request::Resume, _) => TaskState::Active,
                (Request::Delete, _) => TaskState::Deleted,
            };
            log::debug!("task {}: {:?} -> {:?}", slot.task.name(), slot.state, next);
            slot.state = next;
        }
    }

    fn dispatch_order(&self, ready: &Bitmap<N>) -> Vec<usize, N> {
        let mut order = Vec::<usize, N>::new();
        let mut next = ready.first_index();
        while let Some(index) = next {
            // At most one entry per slot
            let _ = order.push(index);
            next = ready.next_index(index);
        }

        let len = self.slots.len().max(1);
        order.sort_unstable_by_key(|&index| {
            let priority = self.slots[index].task.priority();
            let start = self.cursors.get(&priority).copied().unwrap_or(0) % len;
            (Reverse(priority), (index + len - start) % len)
        });
        order
    }
}

fn setup_failed(task: &'static str, error: Error) -> Error {
    log::error!("setup of task {task} failed: {error}");
    Error::TaskSetupFailed { task }
}

impl<const N: usize> core::fmt::Debug for TaskScheduler<'_, N> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("TaskScheduler")
            .field("tasks", &self.slots.len())
            .field("capacity", &N)
            .field("tick", &self.tick)
            .field("started", &self.started)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        rtos::{PeriodicTask, RunsPerTick, Task, TaskSchedulerBuilder},
        test_support::{FakeKernel, Recorder, RunLog, SelfControlledTask},
    };

    type TestTask<'a> = Task<Recorder<'a>, 64>;

    fn task<'a>(name: &'static str, priority: Priority, log: &'a RunLog) -> TestTask<'a> {
        Task::new(name, priority, Recorder::new(name, log))
    }

    fn scheduler<'a, const N: usize>(runs: RunsPerTick) -> TaskScheduler<'a, N>
    where
        BitsImpl<N>: Bits,
    {
        TaskScheduler::new(SchedulerConfig {
            tick_rate_hz: 1_000,
            runs_per_tick: runs,
        })
    }

    #[test]
    fn higher_priority_runs_first_every_tick() {
        let log = RunLog::new();
        let mut high = task("high", Priority(2), &log);
        let mut low = task("low", Priority(1), &log);

        let mut scheduler = scheduler::<4>(RunsPerTick::AllReady);
        scheduler.add_task(&mut high).unwrap();
        scheduler.add_task(&mut low).unwrap();

        assert_eq!(scheduler.start(FakeKernel::new(5)), Err(Error::KernelExited));
        for tick in 1..=5 {
            assert_eq!(log.names_at(tick).as_slice(), &["high", "low"]);
        }
    }

    #[test]
    fn priority_wins_over_registration_order() {
        let log = RunLog::new();
        let mut low = task("low", Priority::LOW, &log);
        let mut high = task("high", Priority::HIGH, &log);

        let mut scheduler = scheduler::<4>(RunsPerTick::AllReady);
        scheduler.add_task(&mut low).unwrap();
        scheduler.add_task(&mut high).unwrap();

        let _ = scheduler.start(FakeKernel::new(3));
        for tick in 1..=3 {
            assert_eq!(log.names_at(tick).as_slice(), &["high", "low"]);
        }
    }

    #[test]
    fn single_run_per_tick_starves_lower_priority() {
        let log = RunLog::new();
        let mut high = task("high", Priority::HIGH, &log);
        let mut low = task("low", Priority::LOW, &log);

        let mut scheduler = scheduler::<4>(RunsPerTick::Limit(1));
        scheduler.add_task(&mut low).unwrap();
        scheduler.add_task(&mut high).unwrap();

        let _ = scheduler.start(FakeKernel::new(4));
        assert_eq!(log.count("high"), 4);
        assert_eq!(log.count("low"), 0);
    }

    #[test]
    fn equal_priorities_take_turns_in_registration_order() {
        let log = RunLog::new();
        let mut a = task("a", Priority::MEDIUM, &log);
        let mut b = task("b", Priority::MEDIUM, &log);
        let mut c = task("c", Priority::MEDIUM, &log);

        let mut scheduler = scheduler::<4>(RunsPerTick::Limit(1));
        scheduler.add_task(&mut a).unwrap();
        scheduler.add_task(&mut b).unwrap();
        scheduler.add_task(&mut c).unwrap();

        let _ = scheduler.start(FakeKernel::new(6));
        let order: heapless::Vec<&str, 6> = (1..=6).map(|tick| log.names_at(tick)[0]).collect();
        assert_eq!(order.as_slice(), &["a", "b", "c", "a", "b", "c"]);
    }

    #[test]
    fn lower_priority_runs_when_higher_is_not_ready() {
        let log = RunLog::new();
        let mut high = task("high", Priority::HIGH, &log);
        high.set_delay_ticks(2);
        let mut low = task("low", Priority::LOW, &log);

        let mut scheduler = scheduler::<4>(RunsPerTick::Limit(1));
        scheduler.add_task(&mut high).unwrap();
        scheduler.add_task(&mut low).unwrap();

        let _ = scheduler.start(FakeKernel::new(4));
        assert_eq!(log.names_at(1).as_slice(), &["high"]);
        assert_eq!(log.names_at(2).as_slice(), &["low"]);
        assert_eq!(log.names_at(3).as_slice(), &["high"]);
        assert_eq!(log.names_at(4).as_slice(), &["low"]);
    }

    #[test]
    fn periodic_task_runs_once_per_period() {
        let log = RunLog::new();
        let mut calls = 0;
        let mut periodic: PeriodicTask<_, 64> =
            PeriodicTask::new("periodic", Priority::HIGH, 10, |_| {
                calls += 1;
                Ok(())
            });
        let mut idle = task("idle", Priority::IDLE, &log);

        let mut scheduler = scheduler::<4>(RunsPerTick::AllReady);
        scheduler.add_task(&mut periodic).unwrap();
        scheduler.add_task(&mut idle).unwrap();

        let _ = scheduler.start(FakeKernel::new(100));
        assert_eq!(scheduler.current_tick(), 100);
        drop(scheduler);
        assert_eq!(periodic.run_count(), 10);
        assert_eq!(periodic.missed_count(), 0);
        drop(periodic);
        assert_eq!(calls, 10);
        assert_eq!(log.count("idle"), 100);
    }

    #[test]
    fn registration_rules() {
        let log = RunLog::new();
        let mut first = task("first", Priority::LOW, &log);
        let mut again = task("first", Priority::HIGH, &log);
        let mut second = task("second", Priority::LOW, &log);
        let mut third = task("third", Priority::LOW, &log);

        let mut scheduler = scheduler::<2>(RunsPerTick::AllReady);
        assert_eq!(scheduler.add_task(&mut first), Ok(TaskHandle(0)));
        assert_eq!(
            scheduler.add_task(&mut again),
            Err(Error::DuplicateTask { task: "first" })
        );
        assert_eq!(scheduler.add_task(&mut second), Ok(TaskHandle(1)));
        assert_eq!(scheduler.add_task(&mut third), Err(Error::SchedulerFull));
        assert_eq!(scheduler.task_count(), 2);
    }

    #[test]
    fn registration_is_closed_after_start() {
        let log = RunLog::new();
        let mut first = task("first", Priority::LOW, &log);
        let mut late = task("late", Priority::LOW, &log);

        let mut scheduler = scheduler::<4>(RunsPerTick::AllReady);
        scheduler.add_task(&mut first).unwrap();
        let _ = scheduler.start(FakeKernel::new(1));

        assert!(scheduler.is_started());
        assert_eq!(scheduler.add_task(&mut late), Err(Error::SchedulerStarted));
        assert_eq!(scheduler.remove_task("first").err(), Some(Error::SchedulerStarted));
        assert_eq!(
            scheduler.start(FakeKernel::new(1)),
            Err(Error::SchedulerStarted)
        );
    }

    #[test]
    fn start_without_tasks_fails() {
        let mut scheduler = scheduler::<2>(RunsPerTick::AllReady);
        assert_eq!(scheduler.start(FakeKernel::new(1)), Err(Error::NoTasks));
        assert!(!scheduler.is_started());
    }

    #[test]
    fn setup_then_pre_run_before_first_tick() {
        let log = RunLog::new();
        let mut a = task("a", Priority::LOW, &log);
        let mut b = task("b", Priority::LOW, &log);

        let mut scheduler = scheduler::<2>(RunsPerTick::AllReady);
        scheduler.add_task(&mut a).unwrap();
        scheduler.add_task(&mut b).unwrap();
        let _ = scheduler.start(FakeKernel::new(0));
        drop(scheduler);

        assert_eq!((a.body().setups, a.body().pre_runs), (1, 1));
        assert_eq!((b.body().setups, b.body().pre_runs), (1, 1));
        assert_eq!(log.len(), 0);
    }

    #[test]
    fn failed_setup_stops_start() {
        let log = RunLog::new();
        let mut ok = task("ok", Priority::LOW, &log);
        let mut broken = task("broken", Priority::LOW, &log);
        broken.body_mut().fail_setup = true;

        let mut scheduler = scheduler::<2>(RunsPerTick::AllReady);
        scheduler.add_task(&mut ok).unwrap();
        scheduler.add_task(&mut broken).unwrap();

        let mut kernel = FakeKernel::new(3);
        assert_eq!(
            scheduler.start(&mut kernel),
            Err(Error::TaskSetupFailed { task: "broken" })
        );
        assert_eq!(kernel.delivered, 0);
    }

    #[test]
    fn failing_task_is_isolated() {
        let log = RunLog::new();
        let mut flaky = task("flaky", Priority::HIGH, &log);
        flaky.body_mut().fail_at_tick = Some(2);
        let mut steady = task("steady", Priority::LOW, &log);

        let mut scheduler = scheduler::<2>(RunsPerTick::AllReady);
        scheduler.add_task(&mut flaky).unwrap();
        scheduler.add_task(&mut steady).unwrap();

        assert_eq!(scheduler.start(FakeKernel::new(5)), Err(Error::KernelExited));
        assert_eq!(scheduler.state("flaky"), Some(TaskState::Suspended));
        assert_eq!(log.count("flaky"), 2);
        assert_eq!(log.count("steady"), 5);
    }

    #[test]
    fn tasks_run_on_their_own_stacks() {
        let log = RunLog::new();
        let mut a = task("a", Priority::LOW, &log);
        let mut b: Task<_, 128> = Task::new("b", Priority::LOW, Recorder::new("b", &log));

        let mut scheduler = scheduler::<2>(RunsPerTick::AllReady);
        scheduler.add_task(&mut a).unwrap();
        scheduler.add_task(&mut b).unwrap();

        assert_eq!(
            scheduler.start(FakeKernel::with_frame(3, 40)),
            Err(Error::KernelExited)
        );
        drop(scheduler);
        assert_eq!(a.stack().used(), 40);
        assert_eq!(b.stack().used(), 40);
        assert_eq!(log.count("a"), 3);
    }

    #[test]
    fn stack_overflow_is_fatal() {
        let log = RunLog::new();
        let mut small: Task<_, 16> = Task::new("small", Priority::HIGH, Recorder::new("small", &log));
        let mut other = task("other", Priority::LOW, &log);

        let mut scheduler = scheduler::<2>(RunsPerTick::AllReady);
        scheduler.add_task(&mut small).unwrap();
        scheduler.add_task(&mut other).unwrap();

        // A 16-byte frame reaches the guard word of the 16-byte arena
        let mut kernel = FakeKernel::with_frame(10, 16);
        let result = scheduler.start(&mut kernel);
        assert_eq!(result, Err(Error::StackOverflow { task: "small" }));
        assert!(result.unwrap_err().is_fatal());
        assert_eq!(kernel.delivered, 1);
        assert_eq!(log.names_at(1).as_slice(), &["small"]);
    }

    #[test]
    fn control_requests_apply_at_the_next_tick() {
        let log = RunLog::new();
        let mut a = task("a", Priority::LOW, &log);
        let mut b = task("b", Priority::LOW, &log);

        let mut scheduler = scheduler::<2>(RunsPerTick::AllReady);
        scheduler.add_task(&mut a).unwrap();
        scheduler.add_task(&mut b).unwrap();
        scheduler.started = true;
        let mut cpu = FakeKernel::new(0);

        scheduler.dispatch(&mut cpu).unwrap();
        scheduler.suspend("a").unwrap();
        scheduler.delete("b").unwrap();
        assert_eq!(scheduler.state("a"), Some(TaskState::Active));

        assert_eq!(scheduler.dispatch(&mut cpu), Ok(0));
        assert_eq!(scheduler.state("a"), Some(TaskState::Suspended));
        assert_eq!(scheduler.state("b"), Some(TaskState::Deleted));

        scheduler.resume("a").unwrap();
        scheduler.resume("b").unwrap();
        assert_eq!(scheduler.dispatch(&mut cpu), Ok(1));
        assert_eq!(scheduler.state("b"), Some(TaskState::Deleted));
        assert_eq!(log.names_at(3).as_slice(), &["a"]);

        assert_eq!(scheduler.suspend("missing"), Err(Error::TaskNotFound));
    }

    #[test]
    fn request_posted_from_inside_a_run_applies_at_the_next_tick() {
        let log = RunLog::new();
        let mut worker = SelfControlledTask::new(2, Request::Suspend, &log);
        let mut idle = task("idle", Priority::IDLE, &log);

        let mut scheduler = scheduler::<2>(RunsPerTick::AllReady);
        scheduler.add_task(&mut worker).unwrap();
        scheduler.add_task(&mut idle).unwrap();
        scheduler.started = true;
        let mut cpu = FakeKernel::new(0);

        scheduler.dispatch(&mut cpu).unwrap();
        // Suspends itself during tick 2 but finishes that run
        assert_eq!(scheduler.dispatch(&mut cpu), Ok(2));
        assert_eq!(scheduler.state("worker"), Some(TaskState::Active));

        assert_eq!(scheduler.dispatch(&mut cpu), Ok(1));
        assert_eq!(scheduler.state("worker"), Some(TaskState::Suspended));

        // Posted from outside between ticks
        scheduler.resume("worker").unwrap();
        scheduler.delete("worker").unwrap();
        scheduler.resume("worker").unwrap();
        assert_eq!(scheduler.dispatch(&mut cpu), Ok(1));
        assert_eq!(scheduler.state("worker"), Some(TaskState::Deleted));
        assert_eq!(log.count("worker"), 2);
        assert_eq!(log.count("idle"), 4);
    }

    #[test]
    fn introspection_lists_tasks_in_registration_order() {
        let log = RunLog::new();
        let mut a = task("a", Priority::LOW, &log);
        let mut b: Task<_, 128> = Task::new("b", Priority::HIGH, Recorder::new("b", &log));

        let mut scheduler = scheduler::<4>(RunsPerTick::AllReady);
        scheduler.add_task(&mut a).unwrap();
        scheduler.add_task(&mut b).unwrap();

        let infos: heapless::Vec<TaskInfo, 4> = scheduler.tasks().collect();
        assert_eq!(
            infos.as_slice(),
            &[
                TaskInfo {
                    name: "a",
                    priority: Priority::LOW,
                    stack_size: 64,
                    state: TaskState::Active,
                    handle: TaskHandle(0),
                },
                TaskInfo {
                    name: "b",
                    priority: Priority::HIGH,
                    stack_size: 128,
                    state: TaskState::Active,
                    handle: TaskHandle(1),
                },
            ]
        );
        assert_eq!(scheduler.task_index("b"), Some(1));
        assert_eq!(scheduler.task("b").map(|t| t.priority()), Some(Priority::HIGH));
        assert!(scheduler.task("c").is_none());
        assert_eq!(scheduler.current_tick(), 0);
    }

    #[test]
    fn remove_task_renumbers_handles() {
        let log = RunLog::new();
        let mut a = task("a", Priority::LOW, &log);
        let mut b = task("b", Priority::LOW, &log);
        let mut c = task("c", Priority::LOW, &log);

        let mut scheduler = scheduler::<4>(RunsPerTick::AllReady);
        scheduler.add_task(&mut a).unwrap();
        scheduler.add_task(&mut b).unwrap();
        scheduler.add_task(&mut c).unwrap();

        let removed = scheduler.remove_task("a").unwrap();
        assert_eq!(removed.name(), "a");
        assert_eq!(scheduler.task("c").and_then(|t| t.handle()), Some(TaskHandle(1)));
        assert_eq!(scheduler.remove_task("a").err(), Some(Error::TaskNotFound));
        assert_eq!(scheduler.task_count(), 2);
    }

    #[test]
    fn builder_produces_a_working_scheduler() {
        let log = RunLog::new();
        let mut only = task("only", Priority::LOW, &log);

        let mut scheduler = TaskSchedulerBuilder::new()
            .capacity::<1>()
            .tick_rate_hz(100)
            .build();
        scheduler.add_task(&mut only).unwrap();
        let _ = scheduler.start(FakeKernel::new(2));
        assert_eq!(log.count("only"), 2);
    }
}
