use dread_engine::{
    CaptureError, FrameSampler, Game, GameConfig, EngineContext, InputEvent, InputQueue,
    FixedTimestep, ProtocolLayout, VisionError,
};
use js_sys::Function;
use wasm_bindgen::JsValue;
use web_sys::{HtmlVideoElement, MediaStream};

use crate::bridge::EngineBridge;
use crate::camera::WebCamera;
use crate::landmarker::JsLandmarker;
use crate::storage::LocalStorageProfileStore;
use crate::username::UsernameCheck;

/// Generic game runner that wires up the engine loop.
///
/// Each concrete game creates a `thread_local!` GameRunner and exports free
/// functions via `#[wasm_bindgen]`, because wasm-bindgen cannot export
/// generic structs directly.
pub struct GameRunner<G: Game> {
    game: G,
    ctx: EngineContext,
    input: InputQueue,
    /// Handed to the extra fixed steps of a frame so input is seen once.
    no_input: InputQueue,
    timestep: FixedTimestep,
    config: GameConfig,
    layout: ProtocolLayout,
    buffer: Vec<f32>,
    frame: u32,
    initialized: bool,
    camera: WebCamera,
    sampler: FrameSampler<JsLandmarker>,
    bridge: EngineBridge,
    username: UsernameCheck,
    last_vision_error: Option<VisionError>,
}

impl<G: Game> GameRunner<G> {
    pub fn new(game: G) -> Self {
        let config = game.config();
        let layout = ProtocolLayout::from_config(&config);

        Self {
            game,
            ctx: EngineContext::with_store(Box::new(LocalStorageProfileStore::new())),
            input: InputQueue::new(),
            no_input: InputQueue::new(),
            timestep: FixedTimestep::new(config.fixed_dt),
            buffer: layout.allocate(),
            layout,
            config,
            frame: 0,
            initialized: false,
            camera: WebCamera::new(),
            sampler: FrameSampler::new(),
            bridge: EngineBridge::new(),
            username: UsernameCheck::new(),
            last_vision_error: None,
        }
    }

    /// Initialize the game. Call once after construction.
    pub fn init(&mut self) {
        self.config = self.game.config();
        self.layout = ProtocolLayout::from_config(&self.config);
        self.buffer = self.layout.allocate();
        self.timestep = FixedTimestep::new(self.config.fixed_dt);
        self.ctx.set_max_events(self.config.max_events);
        self.game.init(&mut self.ctx);
        self.initialized = true;
    }

    /// Push an input event into the queue.
    pub fn push_input(&mut self, event: InputEvent) {
        self.input.push(event);
    }

    /// Run one frame tick: step the game, publish HUD and events.
    pub fn tick(&mut self, dt: f64) {
        if !self.initialized {
            return;
        }

        self.ctx.clear_frame_data();

        // Input stays queued until a step actually consumes it.
        let steps = self.timestep.accumulate(dt);
        for step in 0..steps {
            self.ctx.now = self.timestep.step();
            let input = if step == 0 { &self.input } else { &self.no_input };
            self.game.update(&mut self.ctx, input);
        }
        if steps > 0 {
            self.input.clear();
        }

        self.frame = self.frame.wrapping_add(1);
        let hud = self.game.hud();
        self.layout.write_frame(&mut self.buffer, self.frame, &hud, &self.ctx.events);
        self.bridge.forward(&self.ctx.events);
        self.username.poll(self.timestep.now());
    }

    // ---- Vision ----

    /// Run inference on the current video frame and queue the EAR sample.
    /// Returns true when a new frame was processed.
    pub fn sample_frame(&mut self) -> bool {
        let Some((video, timestamp_ms)) = self.camera.frame() else {
            return false;
        };
        match self.sampler.sample(video, timestamp_ms) {
            Ok(Some(sample)) => {
                self.input.push(InputEvent::EyeSample { sample, timestamp_ms });
                true
            }
            Ok(None) | Err(VisionError::NotReady) => false,
            Err(err) => {
                self.report_vision_error(err);
                false
            }
        }
    }

    /// Forward a vision failure to the game once per distinct error.
    fn report_vision_error(&mut self, err: VisionError) {
        if self.last_vision_error.as_ref() == Some(&err) {
            return;
        }
        log::error!("vision: {} ({})", err, err.code());
        self.last_vision_error = Some(err.clone());
        self.input.push(InputEvent::VisionFailed { error: err });
    }

    pub fn attach_landmarker(&mut self, result: Result<JsLandmarker, VisionError>) {
        match result {
            Ok(model) => {
                self.sampler.adapter_mut().attach(model);
                self.last_vision_error = None;
            }
            Err(err) => {
                self.sampler.adapter_mut().fail(err.clone());
                self.report_vision_error(err);
            }
        }
    }

    pub fn landmarker_ready(&self) -> bool {
        self.sampler.adapter().is_ready()
    }

    pub fn landmark_count(&self) -> u32 {
        self.sampler.last_landmarks().map_or(0, |l| l.len() as u32)
    }

    // ---- Camera ----

    pub fn begin_camera(&mut self) -> u32 {
        self.camera.begin_start()
    }

    pub fn finish_camera(
        &mut self,
        ticket: u32,
        video: HtmlVideoElement,
        result: Result<MediaStream, CaptureError>,
    ) -> Result<(), CaptureError> {
        let outcome = self.camera.finish_start(ticket, video, result);
        match &outcome {
            Ok(()) => {
                self.sampler.adapter_mut().reset_clock();
                self.last_vision_error = None;
            }
            Err(err) => self.report_vision_error(VisionError::from(err.clone())),
        }
        outcome
    }

    pub fn stop_camera(&mut self) {
        self.camera.stop();
    }

    pub fn camera_error_code(&self) -> Option<&'static str> {
        self.camera.status().error().map(CaptureError::code)
    }

    pub fn camera_mut(&mut self) -> &mut WebCamera {
        &mut self.camera
    }

    // ---- Outer surfaces ----

    pub fn connect_engine(&mut self, instance: JsValue, object_name: &str) {
        self.bridge.connect(instance, object_name);
    }

    pub fn disconnect_engine(&mut self) {
        self.bridge.disconnect();
    }

    pub fn username_input(&mut self, value: &str) {
        self.username.input(value, self.timestep.now());
    }

    pub fn set_username_query(&mut self, query: Function) {
        self.username.set_query(query);
    }

    // ---- Shared buffer ----

    pub fn buffer_ptr(&self) -> *const f32 {
        self.buffer.as_ptr()
    }

    pub fn max_events(&self) -> u32 {
        self.layout.max_events as u32
    }

    pub fn buffer_total_floats(&self) -> u32 {
        self.layout.buffer_total_floats as u32
    }
}
