use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::typing::stats::calculate_score;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ScoreError {
    #[error("accuracy must be between 0 and 100, got {0}")]
    InvalidAccuracy(f64),
    #[error("wpm must be between 0 and 500 (exclusive), got {0}")]
    InvalidWpm(f64),
    #[error("time taken must be positive, got {0}")]
    InvalidTime(f64),
    #[error("story {0} does not exist")]
    StoryNotFound(String),
}

/// A finished run, as sent to the score service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreSubmission {
    pub story_id: String,
    pub wpm: f64,
    pub accuracy: f64,
    /// Seconds.
    pub time_taken: f64,
}

impl ScoreSubmission {
    pub fn validate(&self) -> Result<(), ScoreError> {
        if !(0.0..=100.0).contains(&self.accuracy) {
            return Err(ScoreError::InvalidAccuracy(self.accuracy));
        }
        if !(self.wpm > 0.0 && self.wpm < 500.0) {
            return Err(ScoreError::InvalidWpm(self.wpm));
        }
        if self.time_taken.is_nan() || self.time_taken <= 0.0 {
            return Err(ScoreError::InvalidTime(self.time_taken));
        }
        Ok(())
    }

    /// Validated score for this run.
    pub fn score(&self) -> Result<f64, ScoreError> {
        self.validate()?;
        Ok(calculate_score(self.accuracy, self.wpm, self.time_taken))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreRecord {
    pub story_id: String,
    pub user_id: String,
    pub score: f64,
    pub wpm: f64,
    pub accuracy: f64,
    pub time_taken: f64,
}

/// Outcome of a submission that passed validation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SubmitOutcome {
    /// New personal best, persisted.
    Accepted { score: f64 },
    /// Valid, but not better than the stored best.
    NotImproved { score: f64, best: f64 },
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(wpm: f64, accuracy: f64, time_taken: f64) -> ScoreSubmission {
        ScoreSubmission { story_id: "s1".into(), wpm, accuracy, time_taken }
    }

    #[test]
    fn valid_run_scores() {
        assert_eq!(run(60.0, 90.0, 120.0).score(), Ok(4_050_000.0));
    }

    #[test]
    fn bounds_are_enforced() {
        assert_eq!(run(60.0, 101.0, 10.0).validate(), Err(ScoreError::InvalidAccuracy(101.0)));
        assert_eq!(run(60.0, -1.0, 10.0).validate(), Err(ScoreError::InvalidAccuracy(-1.0)));
        assert_eq!(run(0.0, 50.0, 10.0).validate(), Err(ScoreError::InvalidWpm(0.0)));
        assert_eq!(run(500.0, 50.0, 10.0).validate(), Err(ScoreError::InvalidWpm(500.0)));
        assert_eq!(run(60.0, 50.0, 0.0).validate(), Err(ScoreError::InvalidTime(0.0)));
        assert!(run(499.9, 100.0, 0.1).validate().is_ok());
        assert!(run(1.0, 0.0, 1.0).validate().is_ok());
    }

    #[test]
    fn nan_inputs_are_rejected() {
        assert!(run(f64::NAN, 50.0, 10.0).validate().is_err());
        assert!(run(60.0, 50.0, f64::NAN).validate().is_err());
    }

    #[test]
    fn submission_json_is_camel_case() {
        let json = serde_json::to_string(&run(60.0, 90.0, 120.0)).unwrap();
        assert!(json.contains("\"storyId\":\"s1\""));
        assert!(json.contains("\"timeTaken\":120.0"));
    }
}
