use bytemuck::{Pod, Zeroable};

/// A game event communicated from Rust to TypeScript via the shared buffer.
/// Generic container: `kind` identifies the event, `a/b/c` carry payload.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Pod, Zeroable)]
pub struct GameEvent {
    pub kind: f32,
    pub a: f32,
    pub b: f32,
    pub c: f32,
}

impl GameEvent {
    pub const FLOATS: usize = 4;

    pub fn new(kind: f32, a: f32, b: f32, c: f32) -> Self {
        Self { kind, a, b, c }
    }

    pub fn is(&self, kind: f32) -> bool {
        self.kind == kind
    }
}

/// Event kinds the web runner forwards to the embedded game engine.
/// Games define their own kinds from 10 upward.
pub mod event_kind {
    /// A reported blink. `a` = reported blink count.
    pub const BLINK: f32 = 1.0;
    /// The player pressed start. No payload.
    pub const SCENE_START: f32 = 2.0;
}

/// What the on-screen HUD shows, refreshed every frame.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct HudState {
    /// Game-defined phase id.
    pub phase: u32,
    pub blink_count: u32,
    pub ear: f32,
    pub threshold: f32,
    /// 0 idle, 1 calibrating open, 2 calibrating closed.
    pub calibration_phase: u32,
    pub is_calibrated: bool,
    pub is_blinking: bool,
    pub face_detected: bool,
    pub challenge_index: u32,
    pub word_index: u32,
    pub char_index: u32,
    pub has_error: bool,
    pub error_count: u32,
    pub wpm: u32,
    pub accuracy: u32,
    /// Seconds.
    pub elapsed: f32,
}
