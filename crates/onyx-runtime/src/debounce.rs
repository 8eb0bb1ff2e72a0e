#![forbid(unsafe_code)]

//! Trailing-edge debouncer with a single pending slot.
//!
//! Time is passed in by the caller, so the type is deterministic under test.
//! Every [`schedule`](Debouncer::schedule) replaces the pending value and
//! re-arms the deadline; [`poll`](Debouncer::poll) releases the value once
//! the deadline has passed.
//!
//! ```
//! use onyx_runtime::debounce::Debouncer;
//! use web_time::{Duration, Instant};
//!
//! let mut debouncer = Debouncer::new(Duration::from_millis(3000));
//! let t0 = Instant::now();
//! debouncer.schedule("first", t0);
//! debouncer.schedule("second", t0 + Duration::from_millis(1000));
//! assert_eq!(debouncer.poll(t0 + Duration::from_millis(3500)), None);
//! assert_eq!(debouncer.poll(t0 + Duration::from_millis(4000)), Some("second"));
//! ```

use web_time::{Duration, Instant};

#[derive(Debug)]
struct Pending<T> {
    value: T,
    deadline: Instant,
}

/// Holds at most one value until its quiet period elapses.
#[derive(Debug)]
pub struct Debouncer<T> {
    delay: Duration,
    pending: Option<Pending<T>>,
}

impl<T> Debouncer<T> {
    #[must_use]
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            pending: None,
        }
    }

    #[must_use]
    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Arm with `value`, returning the value it displaced.
    pub fn schedule(&mut self, value: T, now: Instant) -> Option<T> {
        let deadline = now + self.delay;
        self.pending
            .replace(Pending { value, deadline })
            .map(|old| old.value)
    }

    /// Release the value if its deadline has passed.
    pub fn poll(&mut self, now: Instant) -> Option<T> {
        let due = self
            .pending
            .as_ref()
            .is_some_and(|pending| now >= pending.deadline);
        if due { self.take() } else { None }
    }

    /// Release the value regardless of its deadline.
    pub fn take(&mut self) -> Option<T> {
        self.pending.take().map(|pending| pending.value)
    }

    /// Drop the pending value without firing it.
    pub fn cancel(&mut self) -> Option<T> {
        self.take()
    }

    #[must_use]
    pub fn next_deadline(&self) -> Option<Instant> {
        self.pending.as_ref().map(|pending| pending.deadline)
    }

    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    #[must_use]
    pub fn pending(&self) -> Option<&T> {
        self.pending.as_ref().map(|pending| &pending.value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DELAY: Duration = Duration::from_millis(3000);

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn nothing_fires_before_deadline() {
        let mut d = Debouncer::new(DELAY);
        let t0 = Instant::now();
        assert_eq!(d.schedule(1, t0), None);
        assert_eq!(d.poll(t0 + ms(2999)), None);
        assert!(d.is_pending());
        assert_eq!(d.poll(t0 + ms(3000)), Some(1));
        assert!(!d.is_pending());
        assert_eq!(d.poll(t0 + ms(9000)), None);
    }

    #[test]
    fn burst_collapses_to_last_value() {
        let mut d = Debouncer::new(DELAY);
        let t0 = Instant::now();
        for i in 0..5u64 {
            d.schedule(i, t0 + ms(i * 500));
        }
        // Last schedule was at 2000ms, so the deadline is 5000ms.
        assert_eq!(d.next_deadline(), Some(t0 + ms(5000)));
        assert_eq!(d.poll(t0 + ms(4999)), None);
        assert_eq!(d.poll(t0 + ms(5000)), Some(4));
    }

    #[test]
    fn schedule_returns_displaced_value() {
        let mut d = Debouncer::new(DELAY);
        let t0 = Instant::now();
        d.schedule("a", t0);
        assert_eq!(d.schedule("b", t0), Some("a"));
        assert_eq!(d.pending(), Some(&"b"));
    }

    #[test]
    fn cancel_clears_slot() {
        let mut d = Debouncer::new(DELAY);
        let t0 = Instant::now();
        d.schedule(7, t0);
        assert_eq!(d.cancel(), Some(7));
        assert_eq!(d.next_deadline(), None);
        assert_eq!(d.poll(t0 + ms(10_000)), None);
    }

    #[test]
    fn take_ignores_deadline() {
        let mut d = Debouncer::new(DELAY);
        let t0 = Instant::now();
        d.schedule(3, t0);
        assert_eq!(d.take(), Some(3));
    }

    #[test]
    fn zero_delay_fires_on_same_instant() {
        let mut d = Debouncer::new(Duration::ZERO);
        let t0 = Instant::now();
        d.schedule(1, t0);
        assert_eq!(d.poll(t0), Some(1));
    }
}
