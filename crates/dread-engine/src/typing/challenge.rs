use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    /// Rough grading of a passage by word count and average word length.
    pub fn grade(text: &str) -> Self {
        let words: Vec<&str> = text.split_whitespace().collect();
        if words.is_empty() {
            return Difficulty::Easy;
        }
        let avg_len = words.iter().map(|w| w.chars().count()).sum::<usize>() as f32 / words.len() as f32;
        match (words.len(), avg_len) {
            (n, l) if n <= 12 && l < 6.0 => Difficulty::Easy,
            (n, l) if n <= 30 && l < 7.0 => Difficulty::Medium,
            _ => Difficulty::Hard,
        }
    }
}

/// A passage to be typed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypingChallenge {
    pub text: String,
    pub difficulty: Difficulty,
}

impl TypingChallenge {
    pub fn new(text: impl Into<String>, difficulty: Difficulty) -> Self {
        Self { text: text.into(), difficulty }
    }

    pub fn words(&self) -> Vec<String> {
        self.text.split_whitespace().map(str::to_owned).collect()
    }

    pub fn char_count(&self) -> usize {
        self.words().join(" ").chars().count()
    }
}

/// Ordered list of challenges for one run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChallengeSet {
    challenges: Vec<TypingChallenge>,
}

impl ChallengeSet {
    pub fn new(challenges: Vec<TypingChallenge>) -> Self {
        let challenges = challenges
            .into_iter()
            .filter(|c| !c.text.trim().is_empty())
            .collect();
        Self { challenges }
    }

    /// Parse a JSON array of `{ "text": ..., "difficulty": ... }`.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let challenges: Vec<TypingChallenge> = serde_json::from_str(json)?;
        Ok(Self::new(challenges))
    }

    /// One challenge per paragraph (blank-line separated) of a story.
    pub fn from_passages(text: &str) -> Self {
        let challenges = text
            .split("\n\n")
            .map(|p| p.split_whitespace().collect::<Vec<_>>().join(" "))
            .filter(|p| !p.is_empty())
            .map(|p| {
                let difficulty = Difficulty::grade(&p);
                TypingChallenge::new(p, difficulty)
            })
            .collect();
        Self { challenges }
    }

    pub fn get(&self, index: usize) -> Option<&TypingChallenge> {
        self.challenges.get(index)
    }

    pub fn len(&self) -> usize {
        self.challenges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.challenges.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &TypingChallenge> {
        self.challenges.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_challenges() {
        let json = r#"[
            { "text": "The door creaked.", "difficulty": "easy" },
            { "text": "   ", "difficulty": "hard" },
            { "text": "Something breathed behind the wallpaper.", "difficulty": "medium" }
        ]"#;
        let set = ChallengeSet::from_json(json).unwrap();
        assert_eq!(set.len(), 2);
        assert_eq!(set.get(1).unwrap().difficulty, Difficulty::Medium);
    }

    #[test]
    fn unknown_difficulty_is_rejected() {
        let json = r#"[{ "text": "x", "difficulty": "nightmare" }]"#;
        assert!(ChallengeSet::from_json(json).is_err());
    }

    #[test]
    fn passages_split_on_blank_lines() {
        let story = "It was late.\nThe hall was dark.\n\n\n\nShe heard it again.";
        let set = ChallengeSet::from_passages(story);
        assert_eq!(set.len(), 2);
        assert_eq!(set.get(0).unwrap().text, "It was late. The hall was dark.");
        assert_eq!(set.get(1).unwrap().words(), vec!["She", "heard", "it", "again."]);
    }

    #[test]
    fn grading_scales_with_length() {
        assert_eq!(Difficulty::grade("run now"), Difficulty::Easy);
        let long = "unspeakable ".repeat(40);
        assert_eq!(Difficulty::grade(&long), Difficulty::Hard);
    }

    #[test]
    fn char_count_normalizes_whitespace() {
        let c = TypingChallenge::new("Hello   world", Difficulty::Easy);
        assert_eq!(c.char_count(), 11);
    }
}
