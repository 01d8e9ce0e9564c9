/// `MM:SS`, zero padded. Minutes are not wrapped at 60.
pub fn format_time(seconds: u32) -> String {
    format!("{:02}:{:02}", seconds / 60, seconds % 60)
}

/// Words per minute with the usual five-characters-per-word convention.
pub fn calculate_wpm(chars: u32, seconds: f64) -> u32 {
    if seconds <= 0.0 {
        return 0;
    }
    ((chars as f64 / 5.0) / (seconds / 60.0)).round() as u32
}

/// Percentage of correct keystrokes, 100 when nothing was typed.
pub fn calculate_accuracy(correct: u32, total: u32) -> u32 {
    if total == 0 {
        return 100;
    }
    (100.0 * correct as f64 / total as f64).round() as u32
}

/// `((accuracy² × wpm) / time_taken) × 1000`
pub fn calculate_score(accuracy: f64, wpm: f64, time_taken: f64) -> f64 {
    ((accuracy * accuracy * wpm) / time_taken) * 1000.0
}

/// Keystroke accounting for one run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TypingStats {
    pub keystrokes: u32,
    pub correct_keystrokes: u32,
    pub total_errors: u32,
    /// Characters of fully completed words, including separating spaces.
    pub completed_chars: u32,
    pub started_at: Option<f64>,
    pub finished_at: Option<f64>,
}

impl TypingStats {
    pub fn start_if_needed(&mut self, now: f64) {
        if self.started_at.is_none() {
            self.started_at = Some(now);
        }
    }

    pub fn finish(&mut self, now: f64) {
        if self.finished_at.is_none() {
            self.finished_at = Some(now);
        }
    }

    pub fn record_keystroke(&mut self, correct: bool) {
        self.keystrokes += 1;
        if correct {
            self.correct_keystrokes += 1;
        } else {
            self.total_errors += 1;
        }
    }

    pub fn elapsed(&self, now: f64) -> f64 {
        match self.started_at {
            Some(start) => self.finished_at.unwrap_or(now) - start,
            None => 0.0,
        }
    }

    pub fn wpm(&self, now: f64) -> u32 {
        calculate_wpm(self.completed_chars, self.elapsed(now))
    }

    pub fn accuracy(&self) -> u32 {
        calculate_accuracy(self.correct_keystrokes, self.keystrokes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_time_pads() {
        assert_eq!(format_time(125), "02:05");
        assert_eq!(format_time(0), "00:00");
        assert_eq!(format_time(3600), "60:00");
    }

    #[test]
    fn wpm_rounds_and_handles_zero() {
        assert_eq!(calculate_wpm(0, 30.0), 0);
        assert_eq!(calculate_wpm(100, 0.0), 0);
        assert_eq!(calculate_wpm(300, 60.0), 60);
        assert_eq!(calculate_wpm(52, 10.0), 62);
    }

    #[test]
    fn accuracy_defaults_to_perfect() {
        assert_eq!(calculate_accuracy(0, 0), 100);
        assert_eq!(calculate_accuracy(7, 0), 100);
        assert_eq!(calculate_accuracy(2, 3), 67);
    }

    #[test]
    fn score_formula() {
        assert_eq!(calculate_score(90.0, 60.0, 120.0), 4_050_000.0);
    }

    #[test]
    fn stats_track_elapsed_from_first_keystroke() {
        let mut stats = TypingStats::default();
        assert_eq!(stats.elapsed(10.0), 0.0);
        stats.start_if_needed(2.0);
        stats.start_if_needed(5.0);
        stats.completed_chars = 50;
        assert_eq!(stats.elapsed(12.0), 10.0);
        assert_eq!(stats.wpm(12.0), 60);
        stats.finish(14.0);
        assert_eq!(stats.elapsed(100.0), 12.0);
    }

    #[test]
    fn keystrokes_feed_accuracy() {
        let mut stats = TypingStats::default();
        for correct in [true, true, false, true] {
            stats.record_keystroke(correct);
        }
        assert_eq!(stats.accuracy(), 75);
        assert_eq!(stats.total_errors, 1);
    }
}
