//! Press-and-hold gesture machine
//!
//! One physical press/release is overloaded into two actions keyed by
//! hold duration: a short press is a tap, a long press arms listening.
//! Modeled as an explicit timer-armed state machine so it stays
//! independent of any input framework; callers feed it instants.
//!
//! States: `Idle -> Pending(pressed_at) -> Listening -> Idle`.

use std::time::{Duration, Instant};

/// Current state of the hold gesture
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HoldState {
    /// No finger down
    Idle,
    /// Finger down, timer armed
    Pending { pressed_at: Instant },
    /// Hold threshold elapsed; microphone should be live
    Listening,
}

/// Transition outputs the orchestrator acts on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GestureEvent {
    /// The hold threshold elapsed; begin recording
    HoldBegan,
    /// Released while listening; stop recording
    HoldEnded,
    /// Released before the threshold; treat as a tap
    Tap,
}

/// Timer-armed press-and-hold state machine
pub struct HoldGesture {
    state: HoldState,
    threshold: Duration,
}

impl HoldGesture {
    pub fn new(threshold: Duration) -> Self {
        Self {
            state: HoldState::Idle,
            threshold,
        }
    }

    pub fn state(&self) -> HoldState {
        self.state
    }

    /// Press down: arms the timer. Ignored unless idle.
    pub fn press(&mut self, now: Instant) {
        if self.state == HoldState::Idle {
            self.state = HoldState::Pending { pressed_at: now };
        }
    }

    /// Advance the timer
    ///
    /// Returns `HoldBegan` exactly once, when a pending press crosses
    /// the threshold.
    pub fn tick(&mut self, now: Instant) -> Option<GestureEvent> {
        match self.state {
            HoldState::Pending { pressed_at }
                if now.duration_since(pressed_at) >= self.threshold =>
            {
                self.state = HoldState::Listening;
                Some(GestureEvent::HoldBegan)
            }
            _ => None,
        }
    }

    /// Release: resolves to a tap or the end of a hold
    ///
    /// A pending press past the threshold counts as a hold even if no
    /// tick observed the crossing.
    pub fn release(&mut self, now: Instant) -> Option<GestureEvent> {
        let event = match self.state {
            HoldState::Idle => None,
            HoldState::Pending { pressed_at } => {
                if now.duration_since(pressed_at) < self.threshold {
                    Some(GestureEvent::Tap)
                } else {
                    Some(GestureEvent::HoldEnded)
                }
            }
            HoldState::Listening => Some(GestureEvent::HoldEnded),
        };
        self.state = HoldState::Idle;
        event
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const THRESHOLD: Duration = Duration::from_millis(2000);

    fn gesture() -> HoldGesture {
        HoldGesture::new(THRESHOLD)
    }

    #[test]
    fn test_press_arms_timer() {
        let mut g = gesture();
        let t0 = Instant::now();
        g.press(t0);
        assert!(matches!(g.state(), HoldState::Pending { .. }));
    }

    #[test]
    fn test_short_press_is_a_tap() {
        let mut g = gesture();
        let t0 = Instant::now();
        g.press(t0);
        assert_eq!(g.tick(t0 + Duration::from_millis(400)), None);
        assert_eq!(
            g.release(t0 + Duration::from_millis(500)),
            Some(GestureEvent::Tap)
        );
        assert_eq!(g.state(), HoldState::Idle);
    }

    #[test]
    fn test_threshold_crossing_begins_hold_once() {
        let mut g = gesture();
        let t0 = Instant::now();
        g.press(t0);

        assert_eq!(g.tick(t0 + Duration::from_millis(1999)), None);
        assert_eq!(g.tick(t0 + THRESHOLD), Some(GestureEvent::HoldBegan));
        assert_eq!(g.state(), HoldState::Listening);

        // Further ticks stay quiet.
        assert_eq!(g.tick(t0 + Duration::from_millis(2050)), None);
    }

    #[test]
    fn test_release_while_listening_ends_hold() {
        let mut g = gesture();
        let t0 = Instant::now();
        g.press(t0);
        g.tick(t0 + THRESHOLD);

        assert_eq!(
            g.release(t0 + Duration::from_millis(2100)),
            Some(GestureEvent::HoldEnded)
        );
        assert_eq!(g.state(), HoldState::Idle);
    }

    #[test]
    fn test_late_release_without_tick_is_still_a_hold() {
        let mut g = gesture();
        let t0 = Instant::now();
        g.press(t0);
        assert_eq!(
            g.release(t0 + Duration::from_millis(2100)),
            Some(GestureEvent::HoldEnded)
        );
    }

    #[test]
    fn test_release_when_idle_is_ignored() {
        let mut g = gesture();
        assert_eq!(g.release(Instant::now()), None);
        assert_eq!(g.state(), HoldState::Idle);
    }

    #[test]
    fn test_second_press_does_not_rearm() {
        let mut g = gesture();
        let t0 = Instant::now();
        g.press(t0);
        g.press(t0 + Duration::from_millis(1900));

        // The original press time still governs the threshold.
        assert_eq!(g.tick(t0 + THRESHOLD), Some(GestureEvent::HoldBegan));
    }
}
