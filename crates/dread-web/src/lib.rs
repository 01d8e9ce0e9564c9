pub mod bridge;
pub mod camera;
pub mod landmarker;
pub mod runner;
pub mod storage;
pub mod username;

pub use landmarker::JsLandmarker;
pub use runner::GameRunner;

// Re-exported for `export_game!` so game crates only depend on wasm-bindgen.
pub use js_sys;
pub use wasm_bindgen_futures::future_to_promise;
pub use web_sys;

use dread_engine::{CaptureConstraints, InputEvent};
use wasm_bindgen::JsValue;

/// Camera constraints from an optional JSON string; malformed or missing
/// input falls back to defaults.
pub fn parse_constraints(json: Option<String>) -> CaptureConstraints {
    match json.as_deref().map(serde_json::from_str::<CaptureConstraints>) {
        Some(Ok(constraints)) => constraints,
        Some(Err(err)) => {
            log::warn!("ignoring camera constraints: {}", err);
            CaptureConstraints::default()
        }
        None => CaptureConstraints::default(),
    }
}

/// Resolves to a JSON array of `{ device_id, label }`.
pub async fn enumerate_cameras_json() -> Result<JsValue, JsValue> {
    let devices = camera::enumerate()
        .await
        .map_err(|e| JsValue::from_str(e.code()))?;
    serde_json::to_string(&devices)
        .map(|json| JsValue::from_str(&json))
        .map_err(|e| JsValue::from_str(&e.to_string()))
}

/// Key code plus direction to an input event.
pub fn key_event(key_code: u32, down: bool) -> InputEvent {
    if down {
        InputEvent::KeyDown { key_code }
    } else {
        InputEvent::KeyUp { key_code }
    }
}

/// Generate all `#[wasm_bindgen]` exports for a game.
///
/// Generates the `thread_local!` GameRunner, a `with_runner()` helper and the
/// exports the page calls: lifecycle, input, camera, landmarker, engine
/// bridge and shared-buffer accessors.
///
/// # Usage
///
/// ```ignore
/// use wasm_bindgen::prelude::*;
/// use dread_engine::*;
///
/// mod game;
/// use game::MyGame;
///
/// dread_web::export_game!(MyGame, "my-game");
/// ```
///
/// Async exports (camera, landmarker) return Promises. The runner is never
/// borrowed across an await: work is split into a synchronous begin, a free
/// async part, and a synchronous finish.
#[macro_export]
macro_rules! export_game {
    ($game_type:ty, $game_name:literal) => {
        use std::cell::RefCell;

        thread_local! {
            static RUNNER: RefCell<Option<$crate::GameRunner<$game_type>>> = RefCell::new(None);
        }

        fn with_runner<R>(f: impl FnOnce(&mut $crate::GameRunner<$game_type>) -> R) -> Option<R> {
            RUNNER.with(|cell| {
                let mut borrow = cell.borrow_mut();
                match borrow.as_mut() {
                    Some(runner) => Some(f(runner)),
                    None => {
                        log::warn!("{}: game_init() has not been called", $game_name);
                        None
                    }
                }
            })
        }

        #[wasm_bindgen]
        pub fn game_init() {
            console_error_panic_hook::set_once();
            let _ = console_log::init_with_level(log::Level::Info);

            let game = <$game_type>::new();
            let runner = $crate::GameRunner::new(game);

            RUNNER.with(|cell| {
                *cell.borrow_mut() = Some(runner);
            });

            with_runner(|r| r.init());
            log::info!("{}: initialized", $game_name);
        }

        #[wasm_bindgen]
        pub fn game_tick(dt: f64) {
            with_runner(|r| r.tick(dt));
        }

        // ---- Input ----

        #[wasm_bindgen]
        pub fn game_key_down(key_code: u32) {
            with_runner(|r| r.push_input($crate::key_event(key_code, true)));
        }

        #[wasm_bindgen]
        pub fn game_key_up(key_code: u32) {
            with_runner(|r| r.push_input($crate::key_event(key_code, false)));
        }

        #[wasm_bindgen]
        pub fn game_text_input(value: String) {
            with_runner(|r| r.push_input(InputEvent::TextInput { value }));
        }

        /// Paste is always rejected; the page should also `preventDefault()`.
        #[wasm_bindgen]
        pub fn game_paste() {
            with_runner(|r| r.push_input(InputEvent::Paste));
        }

        #[wasm_bindgen]
        pub fn game_custom_event(kind: u32, a: f32, b: f32, c: f32) {
            with_runner(|r| r.push_input(InputEvent::Custom { kind, a, b, c }));
        }

        // ---- Camera ----

        /// Resolves to `true` once streaming, rejects with an error code.
        #[wasm_bindgen]
        pub fn game_start_camera(
            video: $crate::web_sys::HtmlVideoElement,
            constraints_json: Option<String>,
        ) -> $crate::js_sys::Promise {
            let ticket = with_runner(|r| r.begin_camera());
            let constraints = $crate::parse_constraints(constraints_json);
            $crate::future_to_promise(async move {
                let ticket = ticket.ok_or_else(|| JsValue::from_str("not-initialized"))?;
                let result = $crate::camera::acquire(&constraints).await;
                match with_runner(|r| r.finish_camera(ticket, video, result)) {
                    Some(Ok(())) => Ok(JsValue::TRUE),
                    Some(Err(err)) => Err(JsValue::from_str(err.code())),
                    None => Err(JsValue::from_str("not-initialized")),
                }
            })
        }

        #[wasm_bindgen]
        pub fn game_stop_camera() {
            with_runner(|r| r.stop_camera());
        }

        #[wasm_bindgen]
        pub fn game_enumerate_cameras() -> $crate::js_sys::Promise {
            $crate::future_to_promise($crate::enumerate_cameras_json())
        }

        #[wasm_bindgen]
        pub fn game_camera_permission() -> $crate::js_sys::Promise {
            $crate::future_to_promise(async {
                let state = $crate::camera::permission_state().await;
                with_runner(|r| r.camera_mut().status_mut().set_permission(state));
                Ok(JsValue::from_str(state.as_str()))
            })
        }

        /// Error code of the last failed camera start, if any.
        #[wasm_bindgen]
        pub fn get_camera_error() -> Option<String> {
            with_runner(|r| r.camera_error_code().map(str::to_owned)).flatten()
        }

        // ---- Landmarker ----

        /// `factory` is an async JS function resolving to a FaceLandmarker.
        #[wasm_bindgen]
        pub fn game_init_landmarker(factory: $crate::js_sys::Function) -> $crate::js_sys::Promise {
            $crate::future_to_promise(async move {
                let result = $crate::JsLandmarker::load(factory).await;
                let outcome = result.as_ref().map(|_| ()).map_err(|e| JsValue::from_str(e.code()));
                with_runner(|r| r.attach_landmarker(result));
                outcome.map(|()| JsValue::TRUE)
            })
        }

        /// Process the current video frame. Call once per animation frame.
        #[wasm_bindgen]
        pub fn game_sample_frame() -> bool {
            with_runner(|r| r.sample_frame()).unwrap_or(false)
        }

        #[wasm_bindgen]
        pub fn get_landmark_count() -> u32 {
            with_runner(|r| r.landmark_count()).unwrap_or(0)
        }

        #[wasm_bindgen]
        pub fn get_landmarker_ready() -> bool {
            with_runner(|r| r.landmarker_ready()).unwrap_or(false)
        }

        // ---- Outer surfaces ----

        /// Blinks and scene starts are forwarded via `SendMessage(object_name, ...)`.
        #[wasm_bindgen]
        pub fn game_set_engine_bridge(instance: JsValue, object_name: String) {
            with_runner(|r| r.connect_engine(instance, &object_name));
        }

        #[wasm_bindgen]
        pub fn game_clear_engine_bridge() {
            with_runner(|r| r.disconnect_engine());
        }

        #[wasm_bindgen]
        pub fn game_username_input(value: String) {
            with_runner(|r| r.username_input(&value));
        }

        /// `query(name)` is called at most once per pause in typing.
        #[wasm_bindgen]
        pub fn game_set_username_checker(query: $crate::js_sys::Function) {
            with_runner(|r| r.set_username_query(query));
        }

        // ---- Shared buffer ----

        #[wasm_bindgen]
        pub fn get_buffer_ptr() -> *const f32 {
            with_runner(|r| r.buffer_ptr()).unwrap_or(std::ptr::null())
        }

        #[wasm_bindgen]
        pub fn get_buffer_total_floats() -> u32 {
            with_runner(|r| r.buffer_total_floats()).unwrap_or(0)
        }

        #[wasm_bindgen]
        pub fn get_max_events() -> u32 {
            with_runner(|r| r.max_events()).unwrap_or(0)
        }
    };
}
