use dread_engine::{event_kind, GameEvent};
use js_sys::{Function, Reflect};
use wasm_bindgen::{JsCast, JsValue};

/// Outbound signal to the embedded game runtime.
#[derive(Debug, Clone, PartialEq)]
pub enum Signal {
    Blink { count: u32 },
    Start,
}

impl Signal {
    fn method(&self) -> &'static str {
        match self {
            Signal::Blink { .. } => "OnBlink",
            Signal::Start => "StartGame",
        }
    }

    fn argument(&self) -> JsValue {
        match self {
            Signal::Blink { count } => JsValue::from_str(&count.to_string()),
            Signal::Start => JsValue::from_str(""),
        }
    }
}

/// Signals for one tick: at most one of each kind. Several blinks in one
/// tick are merged into a single `OnBlink` carrying the latest count, so the
/// receiver must read the count rather than count calls.
pub fn signals(events: &[GameEvent]) -> Vec<Signal> {
    let blink = events
        .iter()
        .rev()
        .find(|e| e.is(event_kind::BLINK))
        .map(|e| Signal::Blink { count: e.a.max(0.0) as u32 });
    let start = events
        .iter()
        .any(|e| e.is(event_kind::SCENE_START))
        .then_some(Signal::Start);
    start.into_iter().chain(blink).collect()
}

/// Fire-and-forget `SendMessage` channel into the Unity instance.
#[derive(Default)]
pub struct EngineBridge {
    instance: Option<JsValue>,
    send: Option<Function>,
    object_name: String,
}

impl EngineBridge {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn connect(&mut self, instance: JsValue, object_name: &str) {
        let send = Reflect::get(&instance, &JsValue::from_str("SendMessage"))
            .ok()
            .and_then(|f| f.dyn_into::<Function>().ok());
        if send.is_none() {
            log::warn!("engine instance has no SendMessage(); signals will be dropped");
        }
        self.instance = Some(instance);
        self.send = send;
        self.object_name = object_name.to_owned();
    }

    pub fn disconnect(&mut self) {
        self.instance = None;
        self.send = None;
    }

    pub fn forward(&self, events: &[GameEvent]) {
        let (Some(instance), Some(send)) = (&self.instance, &self.send) else {
            return;
        };
        for signal in signals(events) {
            let result = send.call3(
                instance,
                &JsValue::from_str(&self.object_name),
                &JsValue::from_str(signal.method()),
                &signal.argument(),
            );
            if let Err(err) = result {
                log::warn!("SendMessage({}) failed: {:?}", signal.method(), err);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn one_signal_per_kind_per_tick() {
        let events = [
            GameEvent::new(event_kind::BLINK, 1.0, 0.0, 0.0),
            GameEvent::new(20.0, 0.0, 0.0, 0.0),
            GameEvent::new(event_kind::SCENE_START, 0.0, 0.0, 0.0),
            GameEvent::new(event_kind::BLINK, 2.0, 0.0, 0.0),
        ];
        assert_eq!(signals(&events), vec![Signal::Start, Signal::Blink { count: 2 }]);
    }

    #[test]
    fn blinks_in_one_tick_merge_into_latest_count() {
        let events: Vec<GameEvent> = (3..6)
            .map(|n| GameEvent::new(event_kind::BLINK, n as f32, 0.0, 0.0))
            .collect();
        assert_eq!(signals(&events), vec![Signal::Blink { count: 5 }]);
    }

    #[test]
    fn unrelated_events_send_nothing() {
        assert!(signals(&[GameEvent::new(15.0, 1.0, 1.0, 1.0)]).is_empty());
    }
}
