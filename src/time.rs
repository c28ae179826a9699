//! Wall-clock time for bus timeouts, independent of the task scheduler.

use core::time::Duration;

/// Monotonic time since boot.
pub trait UptimeClock {
    fn uptime(&self) -> Duration;
}

impl<C: UptimeClock + ?Sized> UptimeClock for &C {
    fn uptime(&self) -> Duration {
        (**self).uptime()
    }
}

/// Point in uptime after which an operation is abandoned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Deadline {
    expires_at: Duration,
}

impl Deadline {
    pub fn after<C: UptimeClock + ?Sized>(clock: &C, timeout: Duration) -> Self {
        Self {
            expires_at: clock.uptime().saturating_add(timeout),
        }
    }

    pub fn has_expired<C: UptimeClock + ?Sized>(&self, clock: &C) -> bool {
        clock.uptime() >= self.expires_at
    }

    pub fn expires_at(&self) -> Duration {
        self.expires_at
    }
}
