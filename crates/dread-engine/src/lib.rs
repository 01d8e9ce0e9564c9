pub mod api;
pub mod core;
pub mod input;
pub mod bridge;
pub mod store;
pub mod vision;
pub mod typing;
pub mod backend;

// Re-export key types at crate root for convenience
pub use api::game::{Game, GameConfig, EngineContext};
pub use api::types::{GameEvent, HudState, event_kind};
pub use core::time::FixedTimestep;
pub use core::debounce::Debouncer;
pub use input::queue::{InputEvent, InputQueue, KEY_ENTER, KEY_SPACE};
pub use bridge::protocol::ProtocolLayout;
pub use store::profile::{ProfileStore, MemoryProfileStore, PROFILE_KEY, decode_profile};

pub use vision::blink::{
    BlinkDetector, BlinkState, BlinkUpdate, CalibrationPhase, CalibrationProfile,
    DetectionConfig, DEFAULT_THRESHOLD,
};
pub use vision::capture::{
    CaptureConstraints, CaptureError, CaptureState, CaptureStatus, FacingMode,
    PermissionState, VideoDevice,
};
pub use vision::ear::{EarSample, estimate};
pub use vision::error::VisionError;
pub use vision::gate::{FaceLostWatchdog, GracePeriod, SessionConfig, WatchdogSignal};
pub use vision::landmarks::{
    Detection, FrameSampler, InferenceAdapter, LandmarkModel, LandmarkSet, landmarks_from_flat,
};

pub use typing::challenge::{ChallengeSet, Difficulty, TypingChallenge};
pub use typing::engine::{InputOutcome, Key, Progress, TypingConfig, TypingEngine};
pub use typing::stats::{
    TypingStats, calculate_accuracy, calculate_score, calculate_wpm, format_time,
};

pub use backend::score::{ScoreError, ScoreRecord, ScoreSubmission, SubmitOutcome};
pub use backend::story::{InMemoryStoryService, Story, StoryService};
