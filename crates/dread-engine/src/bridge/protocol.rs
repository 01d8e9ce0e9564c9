/// Shared buffer layout.
/// Must stay in sync with TypeScript `protocol.ts`.
///
/// Layout (all values in f32 / 4 bytes):
/// ```text
/// [Header: 24 floats]
/// [Events: max_events × 4 floats]
/// ```
///
/// The header carries the HUD snapshot. TypeScript reads `max_events` from
/// the header to find the end of the event section.

use crate::api::game::GameConfig;
use crate::api::types::{GameEvent, HudState};

/// Number of floats in the header section.
pub const HEADER_FLOATS: usize = 24;

/// Header field indices.
pub const HEADER_LOCK: usize = 0;
pub const HEADER_FRAME_COUNTER: usize = 1;
pub const HEADER_PROTOCOL_VERSION: usize = 2;
pub const HEADER_MAX_EVENTS: usize = 3;
pub const HEADER_EVENT_COUNT: usize = 4;
pub const HEADER_PHASE: usize = 5;
pub const HEADER_BLINK_COUNT: usize = 6;
pub const HEADER_EAR: usize = 7;
pub const HEADER_THRESHOLD: usize = 8;
pub const HEADER_CALIBRATION_PHASE: usize = 9;
pub const HEADER_IS_CALIBRATED: usize = 10;
pub const HEADER_IS_BLINKING: usize = 11;
pub const HEADER_FACE_DETECTED: usize = 12;
pub const HEADER_CHALLENGE_INDEX: usize = 13;
pub const HEADER_WORD_INDEX: usize = 14;
pub const HEADER_CHAR_INDEX: usize = 15;
pub const HEADER_HAS_ERROR: usize = 16;
pub const HEADER_ERROR_COUNT: usize = 17;
pub const HEADER_WPM: usize = 18;
pub const HEADER_ACCURACY: usize = 19;
pub const HEADER_ELAPSED: usize = 20;

/// Protocol version written into the header.
pub const PROTOCOL_VERSION: f32 = 1.0;

/// Floats per game event: kind, a, b, c. Fixed by the wire format.
pub const EVENT_FLOATS: usize = GameEvent::FLOATS;

/// Runtime-computed buffer layout.
#[derive(Debug, Clone, PartialEq)]
pub struct ProtocolLayout {
    /// Maximum game events per frame.
    pub max_events: usize,
    /// Size of event data section in floats.
    pub event_data_floats: usize,
    /// Offset (in floats) where event data begins.
    pub event_data_offset: usize,
    /// Total buffer size in floats.
    pub buffer_total_floats: usize,
    /// Total buffer size in bytes.
    pub buffer_total_bytes: usize,
}

fn flag(value: bool) -> f32 {
    if value { 1.0 } else { 0.0 }
}

impl ProtocolLayout {
    pub fn new(max_events: usize) -> Self {
        let event_data_floats = max_events * EVENT_FLOATS;
        let event_data_offset = HEADER_FLOATS;
        let buffer_total_floats = event_data_offset + event_data_floats;
        Self {
            max_events,
            event_data_floats,
            event_data_offset,
            buffer_total_floats,
            buffer_total_bytes: buffer_total_floats * 4,
        }
    }

    pub fn from_config(config: &GameConfig) -> Self {
        Self::new(config.max_events)
    }

    /// A zeroed buffer of the right size.
    pub fn allocate(&self) -> Vec<f32> {
        vec![0.0; self.buffer_total_floats]
    }

    /// Write one frame into `buf`. Events beyond capacity are not written.
    pub fn write_frame(&self, buf: &mut [f32], frame: u32, hud: &HudState, events: &[GameEvent]) {
        debug_assert!(buf.len() >= self.buffer_total_floats);
        let count = events.len().min(self.max_events);

        buf[HEADER_LOCK] = 1.0;
        buf[HEADER_FRAME_COUNTER] = frame as f32;
        buf[HEADER_PROTOCOL_VERSION] = PROTOCOL_VERSION;
        buf[HEADER_MAX_EVENTS] = self.max_events as f32;
        buf[HEADER_EVENT_COUNT] = count as f32;
        buf[HEADER_PHASE] = hud.phase as f32;
        buf[HEADER_BLINK_COUNT] = hud.blink_count as f32;
        buf[HEADER_EAR] = hud.ear;
        buf[HEADER_THRESHOLD] = hud.threshold;
        buf[HEADER_CALIBRATION_PHASE] = hud.calibration_phase as f32;
        buf[HEADER_IS_CALIBRATED] = flag(hud.is_calibrated);
        buf[HEADER_IS_BLINKING] = flag(hud.is_blinking);
        buf[HEADER_FACE_DETECTED] = flag(hud.face_detected);
        buf[HEADER_CHALLENGE_INDEX] = hud.challenge_index as f32;
        buf[HEADER_WORD_INDEX] = hud.word_index as f32;
        buf[HEADER_CHAR_INDEX] = hud.char_index as f32;
        buf[HEADER_HAS_ERROR] = flag(hud.has_error);
        buf[HEADER_ERROR_COUNT] = hud.error_count as f32;
        buf[HEADER_WPM] = hud.wpm as f32;
        buf[HEADER_ACCURACY] = hud.accuracy as f32;
        buf[HEADER_ELAPSED] = hud.elapsed;

        let floats: &[f32] = bytemuck::cast_slice(&events[..count]);
        let start = self.event_data_offset;
        buf[start..start + floats.len()].copy_from_slice(floats);

        buf[HEADER_LOCK] = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_layout() {
        let layout = ProtocolLayout::from_config(&GameConfig::default());
        assert_eq!(layout.max_events, 32);
        assert_eq!(layout.event_data_offset, HEADER_FLOATS);
        assert_eq!(layout.buffer_total_floats, HEADER_FLOATS + 32 * 4);
        assert_eq!(layout.buffer_total_bytes, layout.buffer_total_floats * 4);
    }

    #[test]
    fn header_fields_fit_in_header() {
        assert!(HEADER_ELAPSED < HEADER_FLOATS);
    }

    #[test]
    fn frame_is_written_in_place() {
        let layout = ProtocolLayout::new(2);
        let mut buf = layout.allocate();
        let hud = HudState {
            blink_count: 3,
            ear: 0.25,
            is_calibrated: true,
            has_error: true,
            ..HudState::default()
        };
        let events = [
            GameEvent::new(1.0, 3.0, 0.0, 0.0),
            GameEvent::new(2.0, 0.0, 0.0, 0.0),
            GameEvent::new(9.0, 9.0, 9.0, 9.0),
        ];
        layout.write_frame(&mut buf, 7, &hud, &events);

        assert_eq!(buf[HEADER_LOCK], 0.0);
        assert_eq!(buf[HEADER_FRAME_COUNTER], 7.0);
        assert_eq!(buf[HEADER_EVENT_COUNT], 2.0);
        assert_eq!(buf[HEADER_BLINK_COUNT], 3.0);
        assert_eq!(buf[HEADER_EAR], 0.25);
        assert_eq!(buf[HEADER_IS_CALIBRATED], 1.0);
        assert_eq!(buf[HEADER_IS_BLINKING], 0.0);
        assert_eq!(buf[HEADER_HAS_ERROR], 1.0);
        let off = layout.event_data_offset;
        assert_eq!(&buf[off..off + 8], &[1.0, 3.0, 0.0, 0.0, 2.0, 0.0, 0.0, 0.0]);
    }
}
