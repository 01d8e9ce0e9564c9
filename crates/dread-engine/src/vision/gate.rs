//! Gates layered on top of the raw blink detector by the game session:
//! an intro grace period whose blinks are never reported, and a watchdog
//! that sends the player back to calibration when the face is lost.

use serde::{Deserialize, Serialize};

/// Session timing, in seconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Length of the intro during which blinks are not reported.
    pub grace_period: f64,
    /// Continuous face loss before the warning appears.
    pub face_lost_warning_after: f64,
    /// Countdown shown with the warning before recalibration is forced.
    pub face_lost_countdown: f64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            grace_period: 5.0,
            face_lost_warning_after: 2.0,
            face_lost_countdown: 5.0,
        }
    }
}

/// Suppresses blinks during the intro by subtracting a baseline captured
/// when the intro ends.
#[derive(Debug, Clone, Default)]
pub struct GracePeriod {
    duration: f64,
    started_at: Option<f64>,
    baseline: Option<u32>,
}

impl GracePeriod {
    pub fn new(duration: f64) -> Self {
        Self {
            duration,
            started_at: None,
            baseline: None,
        }
    }

    pub fn start(&mut self, now: f64) {
        self.started_at = Some(now);
        self.baseline = None;
    }

    pub fn is_started(&self) -> bool {
        self.started_at.is_some()
    }

    /// True while the intro window is running.
    pub fn is_active(&self, now: f64) -> bool {
        match (self.started_at, self.baseline) {
            (Some(start), None) => now - start < self.duration,
            _ => false,
        }
    }

    /// Seconds left in the intro window.
    pub fn remaining(&self, now: f64) -> f64 {
        match (self.started_at, self.baseline) {
            (Some(start), None) => (self.duration - (now - start)).max(0.0),
            _ => 0.0,
        }
    }

    /// Call every tick with the detector's raw count. Returns true on the
    /// tick the grace period ends and the baseline is captured.
    pub fn update(&mut self, now: f64, raw_count: u32) -> bool {
        let Some(start) = self.started_at else {
            return false;
        };
        if self.baseline.is_none() && now - start >= self.duration {
            self.baseline = Some(raw_count);
            log::info!("grace period over, baseline {} blinks", raw_count);
            return true;
        }
        false
    }

    pub fn baseline(&self) -> Option<u32> {
        self.baseline
    }

    /// Count visible to the player: zero until the baseline exists.
    pub fn reported(&self, raw_count: u32) -> u32 {
        match self.baseline {
            Some(baseline) => raw_count.saturating_sub(baseline),
            None => 0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum WatchdogSignal {
    Tracking,
    /// Face lost long enough to warn; `remaining` seconds until recalibration.
    Warning { remaining: f64 },
    /// Countdown elapsed. Fired once per loss.
    Recalibrate,
    /// Face came back while a warning was showing.
    Recovered,
}

/// Watches for continuous face loss.
#[derive(Debug, Clone)]
pub struct FaceLostWatchdog {
    warn_after: f64,
    countdown: f64,
    lost_since: Option<f64>,
    warned: bool,
    fired: bool,
}

impl FaceLostWatchdog {
    pub fn new(warn_after: f64, countdown: f64) -> Self {
        Self {
            warn_after,
            countdown,
            lost_since: None,
            warned: false,
            fired: false,
        }
    }

    pub fn from_config(config: &SessionConfig) -> Self {
        Self::new(config.face_lost_warning_after, config.face_lost_countdown)
    }

    pub fn is_warning(&self) -> bool {
        self.warned && !self.fired
    }

    pub fn observe(&mut self, now: f64, has_face: bool) -> WatchdogSignal {
        if has_face {
            let was_warning = self.warned;
            self.reset();
            return if was_warning {
                WatchdogSignal::Recovered
            } else {
                WatchdogSignal::Tracking
            };
        }

        let since = *self.lost_since.get_or_insert(now);
        let lost_for = now - since;

        if self.fired {
            return WatchdogSignal::Tracking;
        }
        if lost_for >= self.warn_after + self.countdown {
            self.fired = true;
            log::warn!("face lost for {:.1}s, forcing recalibration", lost_for);
            return WatchdogSignal::Recalibrate;
        }
        if lost_for >= self.warn_after {
            if !self.warned {
                log::info!("face lost, warning player");
            }
            self.warned = true;
            return WatchdogSignal::Warning {
                remaining: self.warn_after + self.countdown - lost_for,
            };
        }
        WatchdogSignal::Tracking
    }

    pub fn reset(&mut self) {
        self.lost_since = None;
        self.warned = false;
        self.fired = false;
    }
}

impl Default for FaceLostWatchdog {
    fn default() -> Self {
        Self::from_config(&SessionConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blinks_during_grace_are_not_reported() {
        let mut grace = GracePeriod::new(5.0);
        grace.start(10.0);
        assert!(grace.is_active(12.0));
        assert!(!grace.update(12.0, 3));
        assert_eq!(grace.reported(3), 0);

        assert!(grace.update(15.0, 4));
        assert!(!grace.is_active(15.0));
        assert_eq!(grace.baseline(), Some(4));
        assert_eq!(grace.reported(4), 0);
        assert_eq!(grace.reported(6), 2);
    }

    #[test]
    fn baseline_is_captured_once() {
        let mut grace = GracePeriod::new(1.0);
        grace.start(0.0);
        assert!(grace.update(1.5, 2));
        assert!(!grace.update(2.0, 9));
        assert_eq!(grace.baseline(), Some(2));
    }

    #[test]
    fn unstarted_grace_reports_nothing() {
        let mut grace = GracePeriod::new(1.0);
        assert!(!grace.update(100.0, 5));
        assert_eq!(grace.reported(5), 0);
        assert_eq!(grace.remaining(0.0), 0.0);
    }

    #[test]
    fn watchdog_warns_then_forces_recalibration() {
        let mut dog = FaceLostWatchdog::new(2.0, 5.0);
        assert_eq!(dog.observe(0.0, true), WatchdogSignal::Tracking);
        assert_eq!(dog.observe(1.0, false), WatchdogSignal::Tracking);
        assert_eq!(dog.observe(2.5, false), WatchdogSignal::Tracking);
        match dog.observe(4.0, false) {
            WatchdogSignal::Warning { remaining } => assert!((remaining - 4.0).abs() < 1e-9),
            other => panic!("expected warning, got {:?}", other),
        }
        assert!(dog.is_warning());
        assert_eq!(dog.observe(8.0, false), WatchdogSignal::Recalibrate);
        assert_eq!(dog.observe(9.0, false), WatchdogSignal::Tracking);
    }

    #[test]
    fn face_returning_cancels_the_warning() {
        let mut dog = FaceLostWatchdog::new(1.0, 3.0);
        dog.observe(0.0, false);
        assert!(matches!(dog.observe(1.5, false), WatchdogSignal::Warning { .. }));
        assert_eq!(dog.observe(2.0, true), WatchdogSignal::Recovered);
        assert_eq!(dog.observe(2.1, true), WatchdogSignal::Tracking);
        // The loss timer restarts from scratch.
        assert_eq!(dog.observe(3.0, false), WatchdogSignal::Tracking);
        assert_eq!(dog.observe(3.5, false), WatchdogSignal::Tracking);
    }

    #[test]
    fn short_glances_away_never_warn() {
        let mut dog = FaceLostWatchdog::default();
        for i in 0..10 {
            let t = i as f64 * 0.5;
            assert_eq!(dog.observe(t, i % 3 != 0), WatchdogSignal::Tracking);
        }
    }
}
