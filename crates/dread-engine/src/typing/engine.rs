//! Word-by-word typing validation.
//!
//! The input box holds the attempt at the current word. Its longest prefix
//! matching the target is the caret position; anything past that prefix is
//! an error. Wrong characters stay visible (up to `max_trailing_errors`) so
//! the UI can shake the word, then the input is truncated.

use serde::{Deserialize, Serialize};

use crate::typing::challenge::ChallengeSet;
use crate::typing::stats::TypingStats;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TypingConfig {
    /// Delay before the next challenge loads after the last word is typed (seconds).
    pub auto_advance_delay: f64,
    /// Wrong trailing characters kept visible before truncation.
    pub max_trailing_errors: usize,
}

impl Default for TypingConfig {
    fn default() -> Self {
        Self {
            auto_advance_delay: 0.5,
            max_trailing_errors: 10,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Space,
    Enter,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Progress {
    WordComplete { word_index: usize },
    /// Last word typed; the next challenge loads after the auto-advance delay.
    ChallengeComplete { challenge_index: usize },
    NextChallenge { challenge_index: usize },
    AllComplete,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputOutcome {
    Ignored,
    /// Pasted text is never accepted.
    Rejected,
    Typing { has_error: bool, error_count: u32 },
    Progress(Progress),
}

/// Number of leading chars `input` shares with `target`.
fn common_prefix_chars(input: &str, target: &str) -> usize {
    input
        .chars()
        .zip(target.chars())
        .take_while(|(a, b)| a == b)
        .count()
}

pub struct TypingEngine {
    config: TypingConfig,
    challenges: ChallengeSet,
    challenge_index: usize,
    words: Vec<String>,
    current_word_index: usize,
    current_char_index: usize,
    input_value: String,
    has_error: bool,
    error_count: u32,
    completed_words: Vec<bool>,
    is_challenge_complete: bool,
    is_all_complete: bool,
    pending_advance: Option<f64>,
    stats: TypingStats,
}

impl TypingEngine {
    pub fn new(challenges: ChallengeSet, config: TypingConfig) -> Self {
        let mut engine = Self {
            config,
            challenges: ChallengeSet::default(),
            challenge_index: 0,
            words: Vec::new(),
            current_word_index: 0,
            current_char_index: 0,
            input_value: String::new(),
            has_error: false,
            error_count: 0,
            completed_words: Vec::new(),
            is_challenge_complete: false,
            is_all_complete: false,
            pending_advance: None,
            stats: TypingStats::default(),
        };
        engine.load(challenges);
        engine
    }

    /// Replace the challenge list and start over from the first one.
    pub fn load(&mut self, challenges: ChallengeSet) {
        self.challenges = challenges;
        self.stats = TypingStats::default();
        self.is_all_complete = self.challenges.is_empty();
        self.load_challenge(0);
    }

    fn load_challenge(&mut self, index: usize) {
        self.challenge_index = index;
        self.words = self.challenges.get(index).map(|c| c.words()).unwrap_or_default();
        self.completed_words = vec![false; self.words.len()];
        self.current_word_index = 0;
        self.current_char_index = 0;
        self.input_value.clear();
        self.has_error = false;
        self.error_count = 0;
        self.is_challenge_complete = false;
        self.pending_advance = None;
    }

    // -- Accessors --

    pub fn words(&self) -> &[String] {
        &self.words
    }

    pub fn current_word(&self) -> Option<&str> {
        self.words.get(self.current_word_index).map(String::as_str)
    }

    pub fn current_word_index(&self) -> usize {
        self.current_word_index
    }

    pub fn current_char_index(&self) -> usize {
        self.current_char_index
    }

    pub fn input_value(&self) -> &str {
        &self.input_value
    }

    pub fn has_error(&self) -> bool {
        self.has_error
    }

    /// Bumps on every erroneous keystroke; drives the shake animation.
    pub fn error_count(&self) -> u32 {
        self.error_count
    }

    pub fn completed_words(&self) -> &[bool] {
        &self.completed_words
    }

    pub fn challenge_index(&self) -> usize {
        self.challenge_index
    }

    pub fn challenge_count(&self) -> usize {
        self.challenges.len()
    }

    pub fn is_challenge_complete(&self) -> bool {
        self.is_challenge_complete
    }

    pub fn is_all_complete(&self) -> bool {
        self.is_all_complete
    }

    pub fn stats(&self) -> &TypingStats {
        &self.stats
    }

    fn is_last_word(&self) -> bool {
        self.current_word_index + 1 == self.words.len()
    }

    fn accepts_input(&self) -> bool {
        !self.is_all_complete && !self.is_challenge_complete && !self.words.is_empty()
    }

    // -- Input --

    /// Handle a change of the input box value.
    pub fn on_input(&mut self, value: &str, now: f64) -> InputOutcome {
        if !self.accepts_input() {
            return InputOutcome::Ignored;
        }
        let Some(target) = self.current_word().map(str::to_owned) else {
            return InputOutcome::Ignored;
        };

        // Browsers deliver the separator as part of the value.
        if let Some(word) = value.strip_suffix(' ') {
            if word == target {
                self.set_valid_input(word, now);
                return self.on_key(Key::Space, now);
            }
        }

        self.stats.start_if_needed(now);

        let old_len = self.input_value.chars().count();
        let prefix = common_prefix_chars(value, &target);
        let typed_len = value.chars().count();
        let mut new_value: String = value.to_owned();
        let mut new_len = typed_len;

        for pos in old_len..new_len {
            self.stats.record_keystroke(pos < prefix);
        }

        let trailing = new_len - prefix;
        if trailing > self.config.max_trailing_errors {
            new_value = value.chars().take(prefix + self.config.max_trailing_errors).collect();
            new_len = prefix + self.config.max_trailing_errors;
        }

        // Compared before truncation so typing at the cap still counts.
        let has_error = new_len > prefix;
        if has_error && (!self.has_error || typed_len > old_len) {
            self.error_count += 1;
        }

        self.input_value = new_value;
        self.current_char_index = prefix;
        self.has_error = has_error;

        if !has_error && self.input_value == target && self.is_last_word() {
            return InputOutcome::Progress(self.complete_challenge(now));
        }

        InputOutcome::Typing {
            has_error: self.has_error,
            error_count: self.error_count,
        }
    }

    fn set_valid_input(&mut self, word: &str, now: f64) {
        self.stats.start_if_needed(now);
        let old_len = self.input_value.chars().count();
        let new_len = word.chars().count();
        for _ in old_len..new_len {
            self.stats.record_keystroke(true);
        }
        self.input_value = word.to_owned();
        self.current_char_index = new_len;
        self.has_error = false;
    }

    /// Explicit advance via space or enter.
    pub fn on_key(&mut self, key: Key, now: f64) -> InputOutcome {
        if self.is_all_complete {
            return InputOutcome::Ignored;
        }
        if self.is_challenge_complete {
            // Skip the remaining auto-advance delay.
            return InputOutcome::Progress(self.advance_challenge(now));
        }

        let Some(target) = self.current_word() else {
            return InputOutcome::Ignored;
        };
        if self.has_error || self.input_value != target {
            return InputOutcome::Ignored;
        }

        if self.is_last_word() {
            self.complete_challenge(now);
            return InputOutcome::Progress(self.advance_challenge(now));
        }
        if key == Key::Enter {
            return InputOutcome::Ignored;
        }

        let word_index = self.current_word_index;
        // +1 for the separating space.
        self.stats.completed_chars += self.input_value.chars().count() as u32 + 1;
        self.stats.record_keystroke(true);
        self.completed_words[word_index] = true;
        self.current_word_index += 1;
        self.current_char_index = 0;
        self.input_value.clear();
        self.has_error = false;
        InputOutcome::Progress(Progress::WordComplete { word_index })
    }

    pub fn on_paste(&mut self) -> InputOutcome {
        log::debug!("paste rejected");
        InputOutcome::Rejected
    }

    /// Fire a pending auto-advance once its deadline has passed.
    pub fn tick(&mut self, now: f64) -> Option<Progress> {
        match self.pending_advance {
            Some(deadline) if now >= deadline => Some(self.advance_challenge(now)),
            _ => None,
        }
    }

    fn complete_challenge(&mut self, now: f64) -> Progress {
        let last = self.current_word_index;
        self.completed_words[last] = true;
        self.stats.completed_chars += self.input_value.chars().count() as u32;
        self.is_challenge_complete = true;
        self.pending_advance = Some(now + self.config.auto_advance_delay);
        if self.challenge_index + 1 == self.challenges.len() {
            self.stats.finish(now);
        }
        Progress::ChallengeComplete { challenge_index: self.challenge_index }
    }

    fn advance_challenge(&mut self, now: f64) -> Progress {
        self.pending_advance = None;
        let next = self.challenge_index + 1;
        if next < self.challenges.len() {
            // Challenges are joined by a space for WPM purposes.
            self.stats.completed_chars += 1;
            self.load_challenge(next);
            Progress::NextChallenge { challenge_index: next }
        } else {
            self.is_all_complete = true;
            self.stats.finish(now);
            log::info!("all challenges complete");
            Progress::AllComplete
        }
    }
}
