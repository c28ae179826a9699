use crate::error::{Error, Result};

/// Fill byte painted over a fresh stack.
pub const WATERMARK: u8 = 0xA5;

/// Bytes at the bottom of the arena that must keep the watermark.
pub const GUARD_BYTES: usize = 4;

/// Fixed-size task stack arena.
///
/// The arena is a plain byte array sized by `N`, so a task's stack lives
/// wherever the task does (usually a `static`) and is never reallocated. The
/// stack grows down from the end of the array towards index 0; the lowest
/// [`GUARD_BYTES`] form the guard word checked after every run.
pub struct TaskStack<const N: usize> {
    bytes: [u8; N],
}

impl<const N: usize> TaskStack<N> {
    pub const fn new() -> Self {
        const { assert!(N > GUARD_BYTES, "task stack must be larger than its guard word") };
        Self {
            bytes: [WATERMARK; N],
        }
    }

    pub const fn size(&self) -> usize {
        N
    }

    /// Bytes at the bottom of the arena never touched since painting.
    pub fn high_water_mark(&self) -> usize {
        self.bytes
            .iter()
            .position(|byte| *byte != WATERMARK)
            .unwrap_or(N)
    }

    /// Peak usage in bytes.
    pub fn used(&self) -> usize {
        N - self.high_water_mark()
    }

    pub fn is_overflowed(&self) -> bool {
        self.bytes[..GUARD_BYTES].iter().any(|byte| *byte != WATERMARK)
    }

    /// Fails with [`Error::StackOverflow`] once the guard word was overwritten.
    pub fn check(&self, task: &'static str) -> Result<()> {
        if self.is_overflowed() {
            log::error!("task {task} overflowed its {N}-byte stack");
            return Err(Error::StackOverflow { task });
        }
        Ok(())
    }

    /// The arena handed to the kernel for the task's context.
    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        &mut self.bytes
    }

    /// Repaints the whole arena, resetting the high-water mark.
    pub fn repaint(&mut self) {
        self.bytes.fill(WATERMARK);
    }
}

impl<const N: usize> Default for TaskStack<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> core::fmt::Debug for TaskStack<N> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("TaskStack")
            .field("size", &N)
            .field("high_water_mark", &self.high_water_mark())
            .finish()
    }
}
