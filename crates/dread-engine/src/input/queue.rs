use crate::vision::ear::EarSample;
use crate::vision::error::VisionError;

/// Key codes the typing engine reacts to.
pub const KEY_ENTER: u32 = 13;
pub const KEY_SPACE: u32 = 32;

/// Input event types the engine understands.
#[derive(Debug, Clone, PartialEq)]
pub enum InputEvent {
    /// A key was pressed.
    KeyDown { key_code: u32 },
    /// A key was released.
    KeyUp { key_code: u32 },
    /// The typing box value changed.
    TextInput { value: String },
    /// The player tried to paste into the typing box.
    Paste,
    /// One processed video frame. `EarSample::NO_FACE` when no face was found.
    EyeSample { sample: EarSample, timestamp_ms: f64 },
    /// The vision pipeline failed (camera, model or runtime).
    VisionFailed { error: VisionError },
    /// A custom event from the UI layer (React buttons, etc.).
    /// `kind` identifies the event type; `a`, `b`, `c` carry arbitrary data.
    Custom { kind: u32, a: f32, b: f32, c: f32 },
}

/// A queue of input events.
/// JS writes events into the queue; Rust reads and drains them each frame.
pub struct InputQueue {
    events: Vec<InputEvent>,
}

impl InputQueue {
    pub fn new() -> Self {
        Self {
            events: Vec::with_capacity(32),
        }
    }

    pub fn push(&mut self, event: InputEvent) {
        self.events.push(event);
    }

    /// Forget pending events once a fixed step has consumed them.
    pub fn clear(&mut self) {
        self.events.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = &InputEvent> {
        self.events.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }
}

impl Default for InputQueue {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn typed_text_then_space_keeps_order() {
        let mut q = InputQueue::new();
        q.push(InputEvent::TextInput { value: "Hel".into() });
        q.push(InputEvent::KeyDown { key_code: KEY_SPACE });
        assert_eq!(q.len(), 2);
        let events: Vec<&InputEvent> = q.iter().collect();
        assert!(matches!(events[0], InputEvent::TextInput { .. }));
        assert!(matches!(events[1], InputEvent::KeyDown { key_code: KEY_SPACE }));
    }

    #[test]
    fn clear_forgets_pending_input() {
        let mut q = InputQueue::new();
        q.push(InputEvent::TextInput { value: "th".into() });
        q.push(InputEvent::Paste);
        q.clear();
        assert!(q.is_empty());
        assert_eq!(q.iter().count(), 0);
    }

    #[test]
    fn eye_samples_keep_order() {
        let mut q = InputQueue::new();
        q.push(InputEvent::EyeSample { sample: EarSample::uniform(0.3), timestamp_ms: 16.0 });
        q.push(InputEvent::EyeSample { sample: EarSample::NO_FACE, timestamp_ms: 33.0 });
        let stamps: Vec<f64> = q
            .iter()
            .filter_map(|e| match e {
                InputEvent::EyeSample { timestamp_ms, .. } => Some(*timestamp_ms),
                _ => None,
            })
            .collect();
        assert_eq!(stamps, vec![16.0, 33.0]);
    }
}
