//! Blink detection over a stream of EAR samples, with a two-step
//! user-driven calibration that personalizes the closed-eye threshold.
//!
//! ```text
//!            start_calibrate_open            save_calibrate_open
//!   Idle ───────────────────────▶ CalibratingOpen ─────────────────▶ Idle
//!   Idle ───────────────────────▶ CalibratingClosed ───────────────▶ Idle (+ calibrated)
//!            start_calibrate_closed          save_calibrate_closed
//! ```
//!
//! Detection only runs once the profile is calibrated. A blink is counted on
//! the open→closed edge, never per closed frame. A calibrated profile is
//! final: calibration restarts only after `reset_calibration`.

use serde::{Deserialize, Serialize};

use crate::vision::ear::EarSample;

/// Threshold used before the player has calibrated.
pub const DEFAULT_THRESHOLD: f32 = 0.18;
/// Weight of the open-eye mean in the derived threshold.
pub const OPEN_WEIGHT: f32 = 0.4;
/// Weight of the closed-eye mean in the derived threshold.
pub const CLOSED_WEIGHT: f32 = 0.6;

/// Detector tuning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectionConfig {
    /// Consecutive below-threshold frames before a closure counts as a blink.
    pub min_consecutive_frames: u32,
    /// Threshold of an uncalibrated profile.
    pub default_threshold: f32,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            min_consecutive_frames: 1,
            default_threshold: DEFAULT_THRESHOLD,
        }
    }
}

/// Personalized open/closed baseline. Persisted between sessions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalibrationProfile {
    #[serde(rename = "eyesOpenEAR")]
    pub eyes_open_ear: Option<f32>,
    #[serde(rename = "eyesClosedEAR")]
    pub eyes_closed_ear: Option<f32>,
    pub threshold: f32,
    #[serde(rename = "isCalibrated")]
    pub is_calibrated: bool,
}

impl CalibrationProfile {
    pub fn uncalibrated(threshold: f32) -> Self {
        Self {
            eyes_open_ear: None,
            eyes_closed_ear: None,
            threshold,
            is_calibrated: false,
        }
    }

    /// Build a calibrated profile from the two baselines.
    pub fn from_baselines(open: f32, closed: f32) -> Self {
        Self {
            eyes_open_ear: Some(open),
            eyes_closed_ear: Some(closed),
            threshold: blend_threshold(open, closed),
            is_calibrated: true,
        }
    }

    /// A stored profile is only trusted if it is internally consistent.
    pub fn is_consistent(&self) -> bool {
        match (self.eyes_open_ear, self.eyes_closed_ear) {
            (Some(open), Some(closed)) => {
                self.is_calibrated && (self.threshold - blend_threshold(open, closed)).abs() < 1e-4
            }
            _ => !self.is_calibrated,
        }
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

impl Default for CalibrationProfile {
    fn default() -> Self {
        Self::uncalibrated(DEFAULT_THRESHOLD)
    }
}

/// Biased toward the closed value so squinting does not read as a blink
/// while real blinks still cross it.
pub fn blend_threshold(open: f32, closed: f32) -> f32 {
    open * OPEN_WEIGHT + closed * CLOSED_WEIGHT
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CalibrationPhase {
    #[default]
    Idle,
    CalibratingOpen,
    CalibratingClosed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BlinkState {
    pub consecutive_closed_frames: u32,
    pub is_blinking: bool,
    pub blink_count: u32,
    pub was_blinking_prev: bool,
}

/// What one processed sample did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BlinkUpdate {
    /// True exactly on the frame a new blink was counted.
    pub blinked: bool,
    pub is_blinking: bool,
    pub blink_count: u32,
}

pub struct BlinkDetector {
    config: DetectionConfig,
    profile: CalibrationProfile,
    phase: CalibrationPhase,
    samples: Vec<f32>,
    state: BlinkState,
    last_sample: EarSample,
}

impl BlinkDetector {
    pub fn new(config: DetectionConfig) -> Self {
        let profile = CalibrationProfile::uncalibrated(config.default_threshold);
        Self {
            config,
            profile,
            phase: CalibrationPhase::Idle,
            samples: Vec::with_capacity(128),
            state: BlinkState::default(),
            last_sample: EarSample::NO_FACE,
        }
    }

    /// Restore a previously saved profile.
    pub fn with_profile(mut self, profile: CalibrationProfile) -> Self {
        self.profile = profile;
        self
    }

    pub fn profile(&self) -> &CalibrationProfile {
        &self.profile
    }

    pub fn phase(&self) -> CalibrationPhase {
        self.phase
    }

    pub fn state(&self) -> &BlinkState {
        &self.state
    }

    pub fn blink_count(&self) -> u32 {
        self.state.blink_count
    }

    pub fn is_blinking(&self) -> bool {
        self.state.is_blinking
    }

    pub fn is_calibrated(&self) -> bool {
        self.profile.is_calibrated
    }

    pub fn threshold(&self) -> f32 {
        self.profile.threshold
    }

    pub fn last_sample(&self) -> EarSample {
        self.last_sample
    }

    /// Number of samples collected in the current calibration step.
    pub fn pending_samples(&self) -> usize {
        self.samples.len()
    }

    pub fn start_calibrate_open(&mut self) {
        if self.refuse_recalibration() {
            return;
        }
        self.samples.clear();
        self.phase = CalibrationPhase::CalibratingOpen;
    }

    /// Store the mean of the collected samples as the open-eye baseline.
    /// Returns `None` (and stays in the current phase) if nothing was collected.
    pub fn save_calibrate_open(&mut self) -> Option<f32> {
        let mean = self.take_mean(CalibrationPhase::CalibratingOpen)?;
        self.profile.eyes_open_ear = Some(mean);
        log::info!("open-eye baseline saved: {:.3}", mean);
        Some(mean)
    }

    /// Expected to follow a saved open baseline; not enforced here.
    pub fn start_calibrate_closed(&mut self) {
        if self.refuse_recalibration() {
            return;
        }
        if self.profile.eyes_open_ear.is_none() {
            log::debug!("closed-eye calibration started before open baseline");
        }
        self.samples.clear();
        self.phase = CalibrationPhase::CalibratingClosed;
    }

    /// Store the closed-eye baseline; derives the threshold when the open
    /// baseline is already present.
    pub fn save_calibrate_closed(&mut self) -> Option<f32> {
        let mean = self.take_mean(CalibrationPhase::CalibratingClosed)?;
        self.profile.eyes_closed_ear = Some(mean);
        log::info!("closed-eye baseline saved: {:.3}", mean);

        if let Some(open) = self.profile.eyes_open_ear {
            self.profile = CalibrationProfile::from_baselines(open, mean);
            log::info!("calibrated, threshold {:.3}", self.profile.threshold);
        }
        Some(mean)
    }

    fn refuse_recalibration(&self) -> bool {
        if self.profile.is_calibrated {
            log::warn!("already calibrated; reset calibration before recalibrating");
        }
        self.profile.is_calibrated
    }

    fn take_mean(&mut self, expected: CalibrationPhase) -> Option<f32> {
        if self.phase != expected {
            log::debug!("calibration save ignored in phase {:?}", self.phase);
            return None;
        }
        if self.samples.is_empty() {
            log::debug!("calibration save ignored: no samples collected yet");
            return None;
        }
        let mean = self.samples.iter().sum::<f32>() / self.samples.len() as f32;
        self.samples.clear();
        self.phase = CalibrationPhase::Idle;
        Some(mean)
    }

    /// Feed one EAR sample.
    pub fn process(&mut self, sample: EarSample) -> BlinkUpdate {
        self.last_sample = sample;

        if self.phase != CalibrationPhase::Idle {
            if sample.has_face() {
                self.samples.push(sample.average);
            }
            return self.update(false);
        }

        if !self.profile.is_calibrated {
            return self.update(false);
        }

        let mut blinked = false;
        if sample.average < self.profile.threshold {
            self.state.consecutive_closed_frames += 1;
            if self.state.consecutive_closed_frames >= self.config.min_consecutive_frames.max(1) {
                self.state.is_blinking = true;
                if !self.state.was_blinking_prev {
                    self.state.blink_count += 1;
                    blinked = true;
                }
            }
        } else {
            self.state.consecutive_closed_frames = 0;
            self.state.is_blinking = false;
        }
        self.state.was_blinking_prev = self.state.is_blinking;

        self.update(blinked)
    }

    fn update(&self, blinked: bool) -> BlinkUpdate {
        BlinkUpdate {
            blinked,
            is_blinking: self.state.is_blinking,
            blink_count: self.state.blink_count,
        }
    }

    /// Zero the blink count; calibration is untouched.
    pub fn reset_counter(&mut self) {
        self.state.blink_count = 0;
    }

    /// Forget both baselines and go back to the default threshold.
    pub fn reset_calibration(&mut self) {
        self.profile = CalibrationProfile::uncalibrated(self.config.default_threshold);
        self.phase = CalibrationPhase::Idle;
        self.samples.clear();
        self.state = BlinkState::default();
        log::info!("calibration reset");
    }
}

impl Default for BlinkDetector {
    fn default() -> Self {
        Self::new(DetectionConfig::default())
    }
}
