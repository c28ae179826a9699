use crate::error::Result;

/// Runs task bodies on their own stack arenas.
///
/// Handed to `on_tick` by the [`Kernel`]; every task's `run_on` goes through
/// it so the body's frames land in the task's [`TaskStack`](crate::rtos::TaskStack)
/// and the scheduler's guard-word check sees them.
pub trait StackSwitch {
    /// Calls `body` with the stack pointer at the top of `stack` and switches
    /// back to the kernel stack before returning.
    fn call_on(&mut self, stack: &mut [u8], body: &mut dyn FnMut() -> Result<()>) -> Result<()>;
}

impl<S: StackSwitch + ?Sized> StackSwitch for &mut S {
    fn call_on(&mut self, stack: &mut [u8], body: &mut dyn FnMut() -> Result<()>) -> Result<()> {
        (**self).call_on(stack, body)
    }
}

/// The preemptive kernel underneath the scheduler.
///
/// A kernel owns the tick interrupt and context switching. The scheduler hands
/// it control exactly once, from [`TaskScheduler::start`], and the kernel calls
/// `on_tick` once per tick from then on, passing the [`StackSwitch`] tasks run
/// through. On a healthy system `run` never returns; an `Err` from `on_tick`
/// is a fatal scheduler fault the kernel must pass back up.
///
/// [`TaskScheduler::start`]: crate::rtos::TaskScheduler::start
pub trait Kernel {
    fn run(&mut self, on_tick: &mut dyn FnMut(&mut dyn StackSwitch) -> Result<()>) -> Result<()>;
}

impl<K: Kernel + ?Sized> Kernel for &mut K {
    fn run(&mut self, on_tick: &mut dyn FnMut(&mut dyn StackSwitch) -> Result<()>) -> Result<()> {
        (**self).run(on_tick)
    }
}
