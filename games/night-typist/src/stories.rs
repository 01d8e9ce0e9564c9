use dread_engine::{InMemoryStoryService, Story};

/// Stories shipped with the build, used when the backend has nothing newer.
const BUNDLED: &str = r#"[
  {
    "id": "bundled-1",
    "slug": "the-night-shift",
    "title": "The Night Shift",
    "content": "The office lights hum after midnight. Every desk is empty except yours.\n\nYou hear typing from the dark end of the floor, slow and careful, matching your keys.\n\nWhen you stop, it stops. When you blink, it moves closer.",
    "createdAt": 1704067200000
  },
  {
    "id": "bundled-2",
    "slug": "the-lighthouse",
    "title": "The Lighthouse",
    "content": "The keeper left a note on the stairs: do not look away from the lamp.\n\nThe light turns once every ten seconds. Something on the rocks turns with it.\n\nBy morning the lamp was dark and the note had a second line in your handwriting.",
    "createdAt": 1706745600000
  }
]"#;

pub fn bundled() -> Vec<Story> {
    match serde_json::from_str(BUNDLED) {
        Ok(stories) => stories,
        Err(err) => {
            log::error!("bundled stories are malformed: {}", err);
            Vec::new()
        }
    }
}

/// A local story service preloaded with the bundled stories.
pub fn local_service() -> InMemoryStoryService {
    let mut service = InMemoryStoryService::new();
    for story in bundled() {
        service.publish(story);
    }
    service
}

#[cfg(test)]
mod tests {
    use super::*;
    use dread_engine::StoryService;

    #[test]
    fn bundled_stories_parse() {
        let stories = bundled();
        assert_eq!(stories.len(), 2);
        assert!(stories.iter().all(|s| s.challenges().len() == 3));
    }

    #[test]
    fn latest_bundled_story_is_served_first() {
        let service = local_service();
        assert_eq!(service.latest_story().map(|s| s.slug), Some("the-lighthouse".to_owned()));
        assert!(service.story_by_slug("the-night-shift").is_some());
    }
}
