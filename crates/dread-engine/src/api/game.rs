use serde::{Deserialize, Serialize};

use crate::api::types::{GameEvent, HudState};
use crate::input::queue::InputQueue;
use crate::store::profile::{MemoryProfileStore, ProfileStore};
use crate::typing::engine::TypingConfig;
use crate::vision::blink::DetectionConfig;
use crate::vision::gate::SessionConfig;

/// Configuration for the engine, provided by the game.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// Fixed timestep in seconds (default: 1/60).
    pub fixed_dt: f64,
    /// Maximum number of game events per frame (default: 32).
    pub max_events: usize,
    pub detection: DetectionConfig,
    pub session: SessionConfig,
    pub typing: TypingConfig,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            fixed_dt: 1.0 / 60.0,
            max_events: 32,
            detection: DetectionConfig::default(),
            session: SessionConfig::default(),
            typing: TypingConfig::default(),
        }
    }
}

impl GameConfig {
    /// Parse a (possibly partial) JSON config; missing fields keep defaults.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

/// The core contract every game must fulfill.
pub trait Game {
    /// Return engine configuration. Called once before init.
    fn config(&self) -> GameConfig {
        GameConfig::default()
    }

    /// Setup initial state: read the stored profile, load challenges.
    fn init(&mut self, ctx: &mut EngineContext);

    /// The game loop tick. Consume input, advance state machines, emit events.
    fn update(&mut self, ctx: &mut EngineContext, input: &InputQueue);

    /// Snapshot for the HUD, read after each frame.
    fn hud(&self) -> HudState {
        HudState::default()
    }
}

/// Mutable access to engine state, passed to Game::init and Game::update.
pub struct EngineContext {
    pub events: Vec<GameEvent>,
    /// Session clock in seconds, advanced by the runner per fixed step.
    pub now: f64,
    max_events: usize,
    profiles: Box<dyn ProfileStore>,
}

impl EngineContext {
    pub fn new() -> Self {
        Self::with_store(Box::new(MemoryProfileStore::new()))
    }

    pub fn with_store(profiles: Box<dyn ProfileStore>) -> Self {
        Self {
            events: Vec::new(),
            now: 0.0,
            max_events: GameConfig::default().max_events,
            profiles,
        }
    }

    pub fn set_max_events(&mut self, max_events: usize) {
        self.max_events = max_events;
    }

    /// Emit a game event to be forwarded to TypeScript.
    /// Events beyond the per-frame capacity are dropped.
    pub fn emit_event(&mut self, event: GameEvent) {
        if self.events.len() >= self.max_events {
            log::warn!("event buffer full, dropping event kind {}", event.kind);
            return;
        }
        self.events.push(event);
    }

    pub fn profiles(&self) -> &dyn ProfileStore {
        self.profiles.as_ref()
    }

    pub fn profiles_mut(&mut self) -> &mut dyn ProfileStore {
        self.profiles.as_mut()
    }

    /// Clear per-frame transient data.
    pub fn clear_frame_data(&mut self) {
        self.events.clear();
    }
}

impl Default for EngineContext {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::types::event_kind;
    use crate::vision::blink::CalibrationProfile;

    #[test]
    fn partial_config_json_keeps_defaults() {
        let config = GameConfig::from_json(r#"{ "session": { "grace_period": 8.0 } }"#).unwrap();
        assert_eq!(config.session.grace_period, 8.0);
        assert_eq!(config.session.face_lost_countdown, SessionConfig::default().face_lost_countdown);
        assert_eq!(config.typing, TypingConfig::default());
        assert_eq!(config.max_events, 32);
    }

    #[test]
    fn events_are_capped_per_frame() {
        let mut ctx = EngineContext::new();
        ctx.set_max_events(2);
        for _ in 0..5 {
            ctx.emit_event(GameEvent::new(event_kind::BLINK, 0.0, 0.0, 0.0));
        }
        assert_eq!(ctx.events.len(), 2);
        ctx.clear_frame_data();
        assert!(ctx.events.is_empty());
    }

    #[test]
    fn context_owns_the_profile_store() {
        let mut ctx = EngineContext::new();
        assert!(ctx.profiles().load().is_none());
        ctx.profiles_mut().save(&CalibrationProfile::from_baselines(0.3, 0.05));
        assert!(ctx.profiles().load().is_some());
    }
}
