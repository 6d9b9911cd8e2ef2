use tracing::debug;

use super::timers::{
    IdleTimeout,
    Throttle,
    Timestamp,
};

/// A brush selection in pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Selection {
    Empty,
    /// Horizontal span.
    Range(f64, f64),
    /// Two opposite corners.
    Rect { x0: f64, y0: f64, x1: f64, y1: f64 },
}

impl Selection {
    /// Zero-area selections count as empty.
    pub fn is_empty(&self) -> bool {
        match *self {
            Selection::Empty => true,
            Selection::Range(a, b) => a == b,
            Selection::Rect { x0, y0, x1, y1 } => x0 == x1 || y0 == y1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum BrushState {
    #[default]
    Idle,
    Brushing(Selection),
    Committed(Selection),
}

/// What the canvas has to do once a brush gesture is committed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BrushOutcome {
    /// Zoom onto the selection.
    Commit(Selection),
    /// A second empty brush before the idle timeout ran out.
    Reset,
    /// A first empty brush, the idle timeout is now running.
    Armed,
}

/// Tracks one brush gesture at a time and rate-limits its end events.
#[derive(Debug, Clone)]
pub struct BrushController {
    state: BrushState,
    throttle: Throttle<Selection>,
    idle: IdleTimeout,
}

impl BrushController {
    pub fn new(throttle_ms: f64, idle_ms: f64) -> Self {
        Self {
            state: BrushState::Idle,
            throttle: Throttle::new(throttle_ms),
            idle: IdleTimeout::new(idle_ms),
        }
    }

    pub fn state(&self) -> BrushState {
        self.state
    }

    pub fn idle_armed(&self) -> bool {
        self.idle.is_armed()
    }

    pub fn start(&mut self) {
        self.state = BrushState::Brushing(Selection::Empty);
    }

    pub fn moved(&mut self, selection: Selection) {
        self.state = BrushState::Brushing(selection);
    }

    /// Queues the end of a gesture. It takes effect in [`Self::poll`] once
    /// the throttle window closes.
    pub fn end(&mut self, selection: Selection, now: Timestamp) {
        self.throttle.call(now, selection);
    }

    /// Resolves a queued gesture whose throttle window has closed by `now`.
    /// Empty brushes are judged at the time their window closed, so a late
    /// poll still sees an idle timeout that was running back then.
    pub fn poll(&mut self, now: Timestamp) -> Option<BrushOutcome> {
        let Some((due, selection)) = self.throttle.poll(now) else {
            if self.idle.poll(now) {
                debug!("Brush idle timeout expired");
            }
            return None;
        };
        self.state = BrushState::Committed(selection);
        if !selection.is_empty() {
            self.idle.poll(now);
            return Some(BrushOutcome::Commit(selection));
        }
        if self.idle.is_running_at(due) {
            self.idle.disarm();
            Some(BrushOutcome::Reset)
        } else {
            self.idle.arm(due);
            self.idle.poll(now);
            Some(BrushOutcome::Armed)
        }
    }

    /// Drops any queued gesture and stops the idle timeout.
    pub fn cancel(&mut self) {
        self.throttle.cancel();
        self.idle.disarm();
        self.state = BrushState::Idle;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_double_empty_brush_resets() {
        let mut brush = BrushController::new(200.0, 350.0);
        brush.end(Selection::Empty, Timestamp(0.0));
        assert_eq!(brush.poll(Timestamp(200.0)), Some(BrushOutcome::Armed));
        brush.end(Selection::Empty, Timestamp(300.0));
        // Test: The timeout armed at 200 still runs at 500
        assert_eq!(brush.poll(Timestamp(500.0)), Some(BrushOutcome::Reset));
        assert!(!brush.idle_armed());
    }

    #[test]
    fn test_late_tick_still_resets() {
        let mut brush = BrushController::new(200.0, 350.0);
        brush.end(Selection::Empty, Timestamp(0.0));
        assert_eq!(brush.poll(Timestamp(200.0)), Some(BrushOutcome::Armed));
        brush.end(Selection::Empty, Timestamp(300.0));
        // Test: Due at 500, before the timeout ends at 550, polled after both
        assert_eq!(brush.poll(Timestamp(600.0)), Some(BrushOutcome::Reset));
        assert!(!brush.idle_armed());
    }

    #[test]
    fn test_late_first_brush_arms_from_window_close() {
        let mut brush = BrushController::new(200.0, 350.0);
        brush.end(Selection::Empty, Timestamp(0.0));
        // Test: Armed at 200, so the timeout is still running at 500
        assert_eq!(brush.poll(Timestamp(500.0)), Some(BrushOutcome::Armed));
        assert!(brush.idle_armed());
        assert_eq!(brush.poll(Timestamp(550.0)), None);
        assert!(!brush.idle_armed());
    }

    #[test]
    fn test_expired_timeout_rearms() {
        let mut brush = BrushController::new(200.0, 350.0);
        brush.end(Selection::Empty, Timestamp(0.0));
        assert_eq!(brush.poll(Timestamp(200.0)), Some(BrushOutcome::Armed));
        assert_eq!(brush.poll(Timestamp(600.0)), None);
        brush.end(Selection::Empty, Timestamp(700.0));
        assert_eq!(brush.poll(Timestamp(900.0)), Some(BrushOutcome::Armed));
    }

    #[test]
    fn test_selection_commits() {
        let mut brush = BrushController::new(200.0, 350.0);
        brush.start();
        brush.moved(Selection::Range(10.0, 20.0));
        assert_eq!(brush.state(), BrushState::Brushing(Selection::Range(10.0, 20.0)));
        brush.end(Selection::Range(10.0, 40.0), Timestamp(0.0));
        assert_eq!(
            brush.poll(Timestamp(200.0)),
            Some(BrushOutcome::Commit(Selection::Range(10.0, 40.0)))
        );
        assert_eq!(brush.state(), BrushState::Committed(Selection::Range(10.0, 40.0)));
        assert!(Selection::Range(5.0, 5.0).is_empty());
    }
}
