//! # Tick driver
//!
//! Runtime-neutral sleeping plus [`drive`], the cooperative loop that ticks a
//! set of machines once per period. The driver adds no parallelism: it awaits
//! one sleep, then steps every machine in order on the same task.

use core::time::Duration;

use crate::Tick;

/// Converts a Duration to u64 microseconds, clamping to u64::MAX on overflow.
#[cfg(any(feature = "async-embassy", test))]
fn duration_to_u64_micros(duration: Duration) -> u64 {
    u64::try_from(duration.as_micros()).unwrap_or(u64::MAX)
}

/// Platform-neutral async sleep.
///
/// The associated future type keeps the sleep on the stack; no allocation is
/// needed on either runtime.
pub trait TimerService {
    type SleepFuture: core::future::Future<Output = ()> + Send;

    fn sleep(duration: Duration) -> Self::SleepFuture;
}

#[cfg(feature = "async-tokio")]
pub struct TokioTimer;

#[cfg(feature = "async-tokio")]
impl TimerService for TokioTimer {
    type SleepFuture = tokio::time::Sleep;

    fn sleep(duration: Duration) -> Self::SleepFuture {
        tokio::time::sleep(duration)
    }
}

#[cfg(feature = "async-embassy")]
pub struct EmbassyTimer;

#[cfg(feature = "async-embassy")]
impl TimerService for EmbassyTimer {
    type SleepFuture = embassy_time::Timer;

    fn sleep(duration: Duration) -> Self::SleepFuture {
        let micros = duration_to_u64_micros(duration);
        embassy_time::Timer::after(embassy_time::Duration::from_micros(micros))
    }
}

#[cfg(all(feature = "async-tokio", feature = "async-embassy"))]
compile_error!(
    "Features 'async-tokio' and 'async-embassy' are mutually exclusive. \
     Please enable only one async runtime feature at a time."
);

#[cfg(all(feature = "async-tokio", not(feature = "async-embassy")))]
pub type Timer = TokioTimer;

#[cfg(all(feature = "async-embassy", not(feature = "async-tokio")))]
pub type Timer = EmbassyTimer;

/// Completes immediately. Selected when `async` is on without a runtime, so
/// feature-matrix builds still compile.
#[cfg(all(
    feature = "async",
    not(feature = "async-tokio"),
    not(feature = "async-embassy")
))]
pub struct NoOpTimer;

#[cfg(all(
    feature = "async",
    not(feature = "async-tokio"),
    not(feature = "async-embassy")
))]
impl TimerService for NoOpTimer {
    type SleepFuture = core::future::Ready<()>;

    fn sleep(_duration: Duration) -> Self::SleepFuture {
        core::future::ready(())
    }
}

#[cfg(all(
    feature = "async",
    not(feature = "async-tokio"),
    not(feature = "async-embassy")
))]
pub type Timer = NoOpTimer;

/// Ticks every machine once per `period`, in slice order.
///
/// Runs `ticks` rounds, or forever with `None`. Returns how many rounds
/// included at least one transition.
///
/// ```rust,ignore
/// let mut machines: [&mut dyn Tick; 2] = [&mut north, &mut south];
/// drive::<TokioTimer>(&mut machines, Duration::from_millis(10), Some(100)).await;
/// ```
pub async fn drive<T: TimerService>(
    machines: &mut [&mut dyn Tick],
    period: Duration,
    ticks: Option<u32>,
) -> u32 {
    let mut round: u32 = 0;
    let mut busy_rounds: u32 = 0;
    while ticks.is_none_or(|limit| round < limit) {
        T::sleep(period).await;
        let mut moved = false;
        for machine in machines.iter_mut() {
            moved |= machine.tick().transitioned();
        }
        if moved {
            busy_rounds = busy_rounds.saturating_add(1);
        }
        round = round.wrapping_add(1);
    }
    fsm_trace!("[DRIVE] {} rounds, {} with transitions", round, busy_rounds);
    busy_rounds
}

/// Deterministic timer for unit tests: completes at once and remembers the
/// requested duration.
#[cfg(test)]
pub struct TestTimer;

#[cfg(test)]
pub struct TestSleepFuture {
    pub duration: Duration,
}

#[cfg(test)]
impl TestSleepFuture {
    pub fn requested_duration(&self) -> Duration {
        self.duration
    }
}

#[cfg(test)]
impl core::future::Future for TestSleepFuture {
    type Output = ();

    fn poll(
        self: core::pin::Pin<&mut Self>,
        _cx: &mut core::task::Context<'_>,
    ) -> core::task::Poll<Self::Output> {
        core::task::Poll::Ready(())
    }
}

#[cfg(test)]
impl TimerService for TestTimer {
    type SleepFuture = TestSleepFuture;

    fn sleep(duration: Duration) -> Self::SleepFuture {
        TestSleepFuture { duration }
    }
}
