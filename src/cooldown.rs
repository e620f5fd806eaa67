//! Per-window action cooldown. OCR and classification carry false-positive
//! risk, and an answered prompt may keep rendering for a few frames; the
//! cooldown keeps one noisy window from eating repeated keystrokes.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use crate::window::WindowId;

pub struct CooldownTracker {
    interval: Duration,
    /// One entry per window ever acted on. Entries age out by comparison,
    /// never by removal.
    last_action: HashMap<WindowId, Instant>,
}

impl CooldownTracker {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last_action: HashMap::new(),
        }
    }

    pub fn should_act(&self, id: WindowId) -> bool {
        self.should_act_at(id, Instant::now())
    }

    pub fn record_action(&mut self, id: WindowId) {
        self.record_action_at(id, Instant::now());
    }

    fn should_act_at(&self, id: WindowId, now: Instant) -> bool {
        match self.last_action.get(&id) {
            Some(last) => now.duration_since(*last) >= self.interval,
            None => true,
        }
    }

    fn record_action_at(&mut self, id: WindowId, now: Instant) {
        self.last_action.insert(id, now);
    }

    pub fn tracked_windows(&self) -> usize {
        self.last_action.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_window_is_eligible() {
        let tracker = CooldownTracker::new(Duration::from_secs(20));
        assert!(tracker.should_act(42));
    }

    #[test]
    fn action_suppresses_until_interval_elapses() {
        let mut tracker = CooldownTracker::new(Duration::from_secs(20));
        let t0 = Instant::now();
        tracker.record_action_at(7, t0);

        assert!(!tracker.should_act_at(7, t0));
        assert!(!tracker.should_act_at(7, t0 + Duration::from_secs(10)));
        assert!(!tracker.should_act_at(7, t0 + Duration::from_secs(19)));
        assert!(tracker.should_act_at(7, t0 + Duration::from_secs(20)));
        assert!(tracker.should_act_at(7, t0 + Duration::from_secs(90)));
    }

    #[test]
    fn windows_cool_down_independently() {
        let mut tracker = CooldownTracker::new(Duration::from_secs(20));
        let t0 = Instant::now();
        tracker.record_action_at(1, t0);

        assert!(!tracker.should_act_at(1, t0 + Duration::from_secs(5)));
        assert!(tracker.should_act_at(2, t0 + Duration::from_secs(5)));
        assert_eq!(tracker.tracked_windows(), 1);
    }

    #[test]
    fn re_recording_restarts_the_clock() {
        let mut tracker = CooldownTracker::new(Duration::from_secs(20));
        let t0 = Instant::now();
        tracker.record_action_at(1, t0);
        tracker.record_action_at(1, t0 + Duration::from_secs(25));

        assert!(!tracker.should_act_at(1, t0 + Duration::from_secs(40)));
        assert!(tracker.should_act_at(1, t0 + Duration::from_secs(45)));
        assert_eq!(tracker.tracked_windows(), 1);
    }
}
