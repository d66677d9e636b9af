//! Millisecond time sources.
//!
//! Time is a wrapping 32-bit millisecond counter, the same shape as a
//! microcontroller's `millis()`. Elapsed time is always computed with
//! [`Millis::elapsed_since`], which stays correct across the wrap at
//! `u32::MAX`.

use core::cell::Cell;
use core::fmt;

/// A wrapping millisecond timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Millis(pub u32);

impl Millis {
    pub const ZERO: Millis = Millis(0);

    #[must_use]
    pub const fn as_u32(self) -> u32 {
        self.0
    }

    #[must_use]
    pub const fn wrapping_add(self, ms: u32) -> Millis {
        Millis(self.0.wrapping_add(ms))
    }

    /// Milliseconds from `earlier` to `self`, modulo 2^32.
    #[must_use]
    pub const fn elapsed_since(self, earlier: Millis) -> u32 {
        self.0.wrapping_sub(earlier.0)
    }
}

impl From<u32> for Millis {
    fn from(ms: u32) -> Self {
        Millis(ms)
    }
}

impl fmt::Display for Millis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}ms", self.0)
    }
}

pub trait Clock {
    fn now(&self) -> Millis;
}

impl<C: Clock + ?Sized> Clock for &C {
    fn now(&self) -> Millis {
        (**self).now()
    }
}

/// A clock that only moves when told to. Used by tests and simulations.
#[derive(Debug, Default)]
pub struct ManualClock {
    now: Cell<u32>,
}

impl ManualClock {
    #[must_use]
    pub const fn new(start: u32) -> Self {
        Self {
            now: Cell::new(start),
        }
    }

    pub fn advance(&self, ms: u32) {
        self.now.set(self.now.get().wrapping_add(ms));
    }

    pub fn set(&self, ms: u32) {
        self.now.set(ms);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Millis {
        Millis(self.now.get())
    }
}

/// Wall-clock milliseconds since the clock was created.
#[cfg(feature = "std")]
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    origin: std::time::Instant,
}

#[cfg(feature = "std")]
impl SystemClock {
    #[must_use]
    pub fn new() -> Self {
        Self {
            origin: std::time::Instant::now(),
        }
    }
}

#[cfg(feature = "std")]
impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(feature = "std")]
impl Clock for SystemClock {
    #[allow(clippy::cast_possible_truncation)]
    fn now(&self) -> Millis {
        // Truncation wraps the counter exactly like the 32-bit hardware one.
        Millis(self.origin.elapsed().as_millis() as u32)
    }
}

/// Reads the embassy time driver.
#[cfg(feature = "async-embassy")]
#[derive(Debug, Clone, Copy, Default)]
pub struct EmbassyClock;

#[cfg(feature = "async-embassy")]
impl Clock for EmbassyClock {
    #[allow(clippy::cast_possible_truncation)]
    fn now(&self) -> Millis {
        Millis(embassy_time::Instant::now().as_millis() as u32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manual_clock_wraps() {
        let clock = ManualClock::new(u32::MAX - 5);
        let start = clock.now();
        clock.advance(10);
        assert_eq!(clock.now(), Millis(4));
        assert_eq!(clock.now().elapsed_since(start), 10);
    }

    #[test]
    fn references_are_clocks() {
        fn read<C: Clock>(clock: C) -> Millis {
            clock.now()
        }
        let clock = ManualClock::default();
        clock.set(42);
        assert_eq!(read(&clock), Millis(42));
    }

    #[test]
    fn elapsed_is_modular() {
        assert_eq!(Millis(3).elapsed_since(Millis(u32::MAX)), 4);
        assert_eq!(Millis(100).wrapping_add(u32::MAX), Millis(99));
    }

    #[cfg(feature = "std")]
    #[test]
    fn system_clock_starts_near_zero() {
        let clock = SystemClock::new();
        assert!(clock.now().as_u32() < 1_000);
    }
}
