//! Timers driven by an explicit clock.
//!
//! Nothing here reads the system time: callers pass a [`Timestamp`] with
//! every event and advance the timers by polling them with the current time.
//! Cancelling a timer is just dropping its pending state.

use serde::{
    Deserialize,
    Serialize,
};

/// Milliseconds on the caller's clock.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
pub struct Timestamp(pub f64);

impl Timestamp {
    pub fn from_millis(ms: f64) -> Self {
        Self(ms)
    }

    pub fn as_millis(&self) -> f64 {
        self.0
    }

    pub fn after(&self, ms: f64) -> Self {
        Self(self.0 + ms)
    }
}

/// Delivers the last value scheduled, once `delay` has passed without a new
/// one arriving.
#[derive(Debug, Clone)]
pub struct Debouncer<T> {
    delay: f64,
    pending: Option<(Timestamp, T)>,
}

impl<T> Debouncer<T> {
    pub fn new(delay: f64) -> Self {
        Self {
            delay,
            pending: None,
        }
    }

    pub fn schedule(&mut self, now: Timestamp, value: T) {
        self.pending = Some((now.after(self.delay), value));
    }

    pub fn poll(&mut self, now: Timestamp) -> Option<T> {
        match &self.pending {
            Some((deadline, _)) if *deadline <= now => self.pending.take().map(|(_, v)| v),
            _ => None,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    pub fn cancel(&mut self) {
        self.pending = None;
    }
}

/// Trailing-edge throttle: the first call opens a window of `interval`,
/// calls inside the window replace the payload, and only the latest payload
/// is delivered when the window closes.
#[derive(Debug, Clone)]
pub struct Throttle<T> {
    interval: f64,
    pending: Option<(Timestamp, T)>,
}

impl<T> Throttle<T> {
    pub fn new(interval: f64) -> Self {
        Self {
            interval,
            pending: None,
        }
    }

    pub fn call(&mut self, now: Timestamp, value: T) {
        let deadline = match &self.pending {
            Some((deadline, _)) => *deadline,
            None => now.after(self.interval),
        };
        self.pending = Some((deadline, value));
    }

    /// Delivers the payload once its window has closed, together with the
    /// time the window closed at.
    pub fn poll(&mut self, now: Timestamp) -> Option<(Timestamp, T)> {
        match &self.pending {
            Some((deadline, _)) if *deadline <= now => self.pending.take(),
            _ => None,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    pub fn cancel(&mut self) {
        self.pending = None;
    }
}

/// One-shot timeout that only records whether it is still running.
#[derive(Debug, Clone)]
pub struct IdleTimeout {
    delay: f64,
    deadline: Option<Timestamp>,
}

impl IdleTimeout {
    pub fn new(delay: f64) -> Self {
        Self {
            delay,
            deadline: None,
        }
    }

    pub fn arm(&mut self, now: Timestamp) {
        self.deadline = Some(now.after(self.delay));
    }

    pub fn is_armed(&self) -> bool {
        self.deadline.is_some()
    }

    /// Whether the timeout is armed and has not expired by `at`.
    pub fn is_running_at(&self, at: Timestamp) -> bool {
        self.deadline.is_some_and(|deadline| at < deadline)
    }

    /// Disarms the timeout if it has expired. Returns whether it did.
    pub fn poll(&mut self, now: Timestamp) -> bool {
        match self.deadline {
            Some(deadline) if deadline <= now => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }

    pub fn disarm(&mut self) {
        self.deadline = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debouncer_keeps_last_value() {
        let mut debouncer = Debouncer::new(5.0);
        debouncer.schedule(Timestamp(0.0), 1);
        debouncer.schedule(Timestamp(3.0), 2);
        // Test: The second call pushes the deadline back to 8
        assert_eq!(debouncer.poll(Timestamp(5.0)), None);
        assert_eq!(debouncer.poll(Timestamp(8.0)), Some(2));
        assert!(!debouncer.is_pending());
    }

    #[test]
    fn test_throttle_is_trailing_edge() {
        let mut throttle = Throttle::new(200.0);
        throttle.call(Timestamp(0.0), "a");
        throttle.call(Timestamp(150.0), "b");
        assert_eq!(throttle.poll(Timestamp(199.0)), None);
        // Test: The window does not move, the payload does
        assert_eq!(throttle.poll(Timestamp(200.0)), Some((Timestamp(200.0), "b")));
        assert_eq!(throttle.poll(Timestamp(400.0)), None);
    }

    #[test]
    fn test_late_poll_reports_window_close() {
        let mut throttle = Throttle::new(200.0);
        throttle.call(Timestamp(300.0), 1);
        assert_eq!(throttle.poll(Timestamp(900.0)), Some((Timestamp(500.0), 1)));
    }

    #[test]
    fn test_idle_timeout_expires_once() {
        let mut idle = IdleTimeout::new(350.0);
        idle.arm(Timestamp(10.0));
        assert!(idle.is_armed());
        assert!(!idle.poll(Timestamp(100.0)));
        assert!(idle.is_running_at(Timestamp(359.0)));
        assert!(!idle.is_running_at(Timestamp(360.0)));
        assert!(idle.poll(Timestamp(360.0)));
        assert!(!idle.is_armed());
        assert!(!idle.poll(Timestamp(1000.0)));
    }
}
