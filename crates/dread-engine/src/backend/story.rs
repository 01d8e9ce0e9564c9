use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::backend::score::{ScoreError, ScoreRecord, ScoreSubmission, SubmitOutcome};
use crate::typing::challenge::ChallengeSet;

/// A generated horror story.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Story {
    pub id: String,
    pub slug: String,
    pub title: String,
    pub content: String,
    /// Unix milliseconds.
    pub created_at: u64,
}

impl Story {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// One typing challenge per paragraph.
    pub fn challenges(&self) -> ChallengeSet {
        ChallengeSet::from_passages(&self.content)
    }
}

/// The hosted story/score backend, seen from the game.
pub trait StoryService {
    fn latest_story(&self) -> Option<Story>;

    fn story_by_slug(&self, slug: &str) -> Option<Story>;

    /// Validate and record a run; only a strictly better score replaces the
    /// user's stored best for that story.
    fn submit_score(&mut self, user_id: &str, submission: &ScoreSubmission) -> Result<SubmitOutcome, ScoreError>;
}

/// In-process implementation, used headless and in tests.
#[derive(Debug, Default)]
pub struct InMemoryStoryService {
    stories: Vec<Story>,
    best: HashMap<(String, String), ScoreRecord>,
}

impl InMemoryStoryService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn publish(&mut self, story: Story) {
        self.stories.push(story);
    }

    pub fn best_score(&self, story_id: &str, user_id: &str) -> Option<&ScoreRecord> {
        self.best.get(&(story_id.to_owned(), user_id.to_owned()))
    }

    /// Best scores for a story, highest first.
    pub fn leaderboard(&self, story_id: &str) -> Vec<&ScoreRecord> {
        let mut rows: Vec<&ScoreRecord> = self
            .best
            .values()
            .filter(|r| r.story_id == story_id)
            .collect();
        rows.sort_by(|a, b| b.score.total_cmp(&a.score));
        rows
    }
}

impl StoryService for InMemoryStoryService {
    fn latest_story(&self) -> Option<Story> {
        self.stories.iter().max_by_key(|s| s.created_at).cloned()
    }

    fn story_by_slug(&self, slug: &str) -> Option<Story> {
        self.stories.iter().find(|s| s.slug == slug).cloned()
    }

    fn submit_score(&mut self, user_id: &str, submission: &ScoreSubmission) -> Result<SubmitOutcome, ScoreError> {
        let score = submission.score()?;
        if !self.stories.iter().any(|s| s.id == submission.story_id) {
            return Err(ScoreError::StoryNotFound(submission.story_id.clone()));
        }

        let key = (submission.story_id.clone(), user_id.to_owned());
        if let Some(existing) = self.best.get(&key) {
            if score <= existing.score {
                return Ok(SubmitOutcome::NotImproved { score, best: existing.score });
            }
        }

        self.best.insert(
            key,
            ScoreRecord {
                story_id: submission.story_id.clone(),
                user_id: user_id.to_owned(),
                score,
                wpm: submission.wpm,
                accuracy: submission.accuracy,
                time_taken: submission.time_taken,
            },
        );
        log::info!("new best {:.0} for {} on {}", score, user_id, submission.story_id);
        Ok(SubmitOutcome::Accepted { score })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn story(id: &str, slug: &str, created_at: u64) -> Story {
        Story {
            id: id.into(),
            slug: slug.into(),
            title: "The Hollow".into(),
            content: "First.\n\nSecond.".into(),
            created_at,
        }
    }

    fn run(wpm: f64) -> ScoreSubmission {
        ScoreSubmission { story_id: "a".into(), wpm, accuracy: 90.0, time_taken: 60.0 }
    }

    #[test]
    fn latest_and_by_slug() {
        let mut svc = InMemoryStoryService::new();
        assert!(svc.latest_story().is_none());
        svc.publish(story("a", "hollow", 10));
        svc.publish(story("b", "attic", 20));
        assert_eq!(svc.latest_story().unwrap().id, "b");
        assert_eq!(svc.story_by_slug("hollow").unwrap().id, "a");
        assert!(svc.story_by_slug("cellar").is_none());
    }

    #[test]
    fn only_better_scores_replace_the_best() {
        let mut svc = InMemoryStoryService::new();
        svc.publish(story("a", "hollow", 1));

        assert!(matches!(svc.submit_score("u", &run(50.0)), Ok(SubmitOutcome::Accepted { .. })));
        assert!(matches!(svc.submit_score("u", &run(50.0)), Ok(SubmitOutcome::NotImproved { .. })));
        assert!(matches!(svc.submit_score("u", &run(40.0)), Ok(SubmitOutcome::NotImproved { .. })));
        assert!(matches!(svc.submit_score("u", &run(70.0)), Ok(SubmitOutcome::Accepted { .. })));
        assert_eq!(svc.best_score("a", "u").unwrap().wpm, 70.0);
    }

    #[test]
    fn invalid_or_unknown_submissions_fail() {
        let mut svc = InMemoryStoryService::new();
        assert_eq!(
            svc.submit_score("u", &run(60.0)),
            Err(ScoreError::StoryNotFound("a".into()))
        );
        svc.publish(story("a", "hollow", 1));
        assert!(matches!(svc.submit_score("u", &run(0.0)), Err(ScoreError::InvalidWpm(_))));
        assert!(svc.best_score("a", "u").is_none());
    }

    #[test]
    fn leaderboard_is_sorted() {
        let mut svc = InMemoryStoryService::new();
        svc.publish(story("a", "hollow", 1));
        svc.submit_score("slow", &run(20.0)).unwrap();
        svc.submit_score("fast", &run(90.0)).unwrap();
        let board = svc.leaderboard("a");
        assert_eq!(board.len(), 2);
        assert_eq!(board[0].user_id, "fast");
    }

    #[test]
    fn story_json_and_challenges() {
        let json = r#"{"id":"x","slug":"hollow","title":"T","content":"One two.\n\nThree.","createdAt":5}"#;
        let s = Story::from_json(json).unwrap();
        assert_eq!(s.challenges().len(), 2);
    }
}
