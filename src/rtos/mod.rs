//! Task and scheduling policy layer above a preemptive kernel.
//!
//! ```text
//!   Kernel (tick interrupt, context switch)
//!      │ on_tick(&mut dyn StackSwitch), once per tick
//!      ▼
//!   TaskScheduler ── requests ─▶ ready set ─▶ priority order ─▶ run_on
//!      │                                                          │
//!      │                  StackSwitch::call_on(task stack, body) ◀┘
//!      │
//!      ├── &mut Task<R, STACK>            (Runnable body, optional delay)
//!      ├── &mut PeriodicTask<F, STACK>    (callback every period_ticks)
//!      └── &mut dyn TaskInterface         (hand-written tasks)
//! ```
//!
//! Tasks and their stacks are usually `static`; the scheduler only borrows
//! them, so nothing is allocated at registration or at run time. The kernel
//! moves each run onto its task's arena, and the guard word of that arena is
//! checked after every run.

pub mod builder;
pub mod kernel;
pub mod periodic;
pub mod scheduler;
pub mod stack;
pub mod task;

pub use builder::{RunsPerTick, SchedulerConfig, TaskSchedulerBuilder};
pub use kernel::{Kernel, StackSwitch};
pub use periodic::{Frequency, PeriodicTask};
pub use scheduler::{TaskInfo, TaskScheduler, TaskState};
pub use stack::TaskStack;
pub use task::{Priority, Request, Runnable, Task, TaskControl, TaskHandle, TaskInterface};
