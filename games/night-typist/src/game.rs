use dread_engine::*;
use dread_engine::input::queue::InputQueue;

use crate::stories;

/// Custom event kinds from the page UI
pub mod commands {
    pub const START_CALIBRATE_OPEN: u32 = 1;
    pub const SAVE_CALIBRATE_OPEN: u32 = 2;
    pub const START_CALIBRATE_CLOSED: u32 = 3;
    pub const SAVE_CALIBRATE_CLOSED: u32 = 4;
    pub const RESET_CALIBRATION: u32 = 5;
    pub const RESET_COUNTER: u32 = 6;
    pub const START_GAME: u32 = 7;
}

/// Game event kinds to the page. Blink and scene start use the engine kinds.
pub mod game_events {
    /// `a` = 1 open / 2 closed, `b` = saved mean EAR.
    pub const BASELINE_SAVED: f32 = 10.0;
    /// `a` = derived threshold.
    pub const CALIBRATED: f32 = 11.0;
    /// `a` = reason, see `reasons`.
    pub const CALIBRATION_REQUIRED: f32 = 12.0;
    /// `a` = baseline blink count.
    pub const GRACE_OVER: f32 = 13.0;
    /// `a` = whole seconds left before recalibration is forced.
    pub const FACE_LOST_WARNING: f32 = 14.0;
    pub const FACE_RECOVERED: f32 = 15.0;
    /// `a` = word index.
    pub const WORD_COMPLETE: f32 = 16.0;
    /// `a` = challenge index.
    pub const CHALLENGE_COMPLETE: f32 = 17.0;
    /// `a` = challenge index now showing.
    pub const NEXT_CHALLENGE: f32 = 18.0;
    /// `a` = wpm, `b` = accuracy, `c` = seconds.
    pub const ALL_COMPLETE: f32 = 19.0;
    /// `a` = errors in the current challenge.
    pub const TYPING_ERROR: f32 = 20.0;
    pub const PASTE_REJECTED: f32 = 21.0;
    /// `a` = error class, see `vision_error_class`.
    pub const VISION_FAILED: f32 = 22.0;
    /// `a` = score, `b` = 1.0 when it is a new best, `c` = best score.
    pub const SCORE: f32 = 23.0;
}

/// Payload of `CALIBRATION_REQUIRED`.
pub mod reasons {
    pub const NO_PROFILE: f32 = 0.0;
    pub const FACE_LOST: f32 = 1.0;
    pub const PLAYER_RESET: f32 = 2.0;
    /// Calibration restarted over an existing profile.
    pub const RECALIBRATE: f32 = 3.0;
}

/// Scores of this device's player.
const LOCAL_USER: &str = "local";

/// Tuning shipped with the game.
const CONFIG_JSON: &str = include_str!("../config.json");

fn load_config(json: &str) -> GameConfig {
    match GameConfig::from_json(json) {
        Ok(config) => config,
        Err(err) => {
            log::error!("game config is malformed, using defaults: {}", err);
            GameConfig::default()
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Calibrating,
    Ready,
    /// Intro animation; blinks are counted but never reported.
    Intro,
    Playing,
    Finished,
}

impl Phase {
    pub fn id(self) -> u32 {
        match self {
            Phase::Calibrating => 0,
            Phase::Ready => 1,
            Phase::Intro => 2,
            Phase::Playing => 3,
            Phase::Finished => 4,
        }
    }

    fn in_session(self) -> bool {
        matches!(self, Phase::Intro | Phase::Playing)
    }
}

fn vision_error_class(err: &VisionError) -> f32 {
    match err {
        VisionError::Capture(_) => 1.0,
        VisionError::ModelInit(_) => 2.0,
        VisionError::ModelLoad(_) => 3.0,
        VisionError::Detection(_) => 4.0,
        VisionError::NotReady => 5.0,
    }
}

fn event(kind: f32, a: f32) -> GameEvent {
    GameEvent::new(kind, a, 0.0, 0.0)
}

pub struct NightTypist {
    config: GameConfig,
    phase: Phase,
    detector: BlinkDetector,
    grace: GracePeriod,
    watchdog: FaceLostWatchdog,
    typing: TypingEngine,
    scores: InMemoryStoryService,
    story: Option<Story>,
    face_detected: bool,
    /// Last countdown second announced while the face is lost.
    warning_second: Option<u32>,
    now: f64,
}

impl NightTypist {
    pub fn new() -> Self {
        Self::with_config(load_config(CONFIG_JSON))
    }

    pub fn with_config(config: GameConfig) -> Self {
        let scores = stories::local_service();
        let story = scores.latest_story();
        let challenges = story.as_ref().map(Story::challenges).unwrap_or_default();
        Self {
            phase: Phase::Calibrating,
            detector: BlinkDetector::new(config.detection.clone()),
            grace: GracePeriod::new(config.session.grace_period),
            watchdog: FaceLostWatchdog::from_config(&config.session),
            typing: TypingEngine::new(challenges, config.typing.clone()),
            scores,
            story,
            face_detected: false,
            warning_second: None,
            now: 0.0,
            config,
        }
    }

    /// Play `story` instead of the latest bundled one.
    pub fn with_story(mut self, story: Story) -> Self {
        self.typing.load(story.challenges());
        self.scores.publish(story.clone());
        self.story = Some(story);
        self
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Blink count the player sees: raw until a session starts, then
    /// relative to the intro baseline.
    fn reported_count(&self) -> u32 {
        let raw = self.detector.blink_count();
        match self.phase {
            Phase::Intro | Phase::Playing | Phase::Finished => self.grace.reported(raw),
            Phase::Calibrating | Phase::Ready => raw,
        }
    }

    fn command(&mut self, ctx: &mut EngineContext, kind: u32) {
        use commands::*;

        if self.phase.in_session() && kind != RESET_CALIBRATION {
            log::debug!("command {} ignored during a session", kind);
            return;
        }

        match kind {
            START_CALIBRATE_OPEN => {
                self.leave_profile(ctx);
                self.phase = Phase::Calibrating;
                self.detector.start_calibrate_open();
            }
            SAVE_CALIBRATE_OPEN => {
                if let Some(mean) = self.detector.save_calibrate_open() {
                    ctx.emit_event(GameEvent::new(game_events::BASELINE_SAVED, 1.0, mean, 0.0));
                }
            }
            START_CALIBRATE_CLOSED => {
                self.leave_profile(ctx);
                self.phase = Phase::Calibrating;
                self.detector.start_calibrate_closed();
            }
            SAVE_CALIBRATE_CLOSED => {
                let Some(mean) = self.detector.save_calibrate_closed() else {
                    return;
                };
                ctx.emit_event(GameEvent::new(game_events::BASELINE_SAVED, 2.0, mean, 0.0));
                if self.detector.is_calibrated() {
                    ctx.profiles_mut().save(self.detector.profile());
                    self.phase = Phase::Ready;
                    ctx.emit_event(event(game_events::CALIBRATED, self.detector.threshold()));
                }
            }
            RESET_CALIBRATION => {
                ctx.profiles_mut().clear();
                self.require_calibration(ctx, reasons::PLAYER_RESET);
            }
            RESET_COUNTER => self.detector.reset_counter(),
            START_GAME => self.start_session(ctx),
            other => log::warn!("unknown command {}", other),
        }
    }

    /// A calibrated profile is only left through a full reset. The stored
    /// copy stays until the new calibration completes.
    fn leave_profile(&mut self, ctx: &mut EngineContext) {
        if self.detector.is_calibrated() {
            self.require_calibration(ctx, reasons::RECALIBRATE);
        }
    }

    fn require_calibration(&mut self, ctx: &mut EngineContext, reason: f32) {
        self.detector.reset_calibration();
        self.grace = GracePeriod::new(self.config.session.grace_period);
        self.watchdog.reset();
        self.warning_second = None;
        self.phase = Phase::Calibrating;
        ctx.emit_event(event(game_events::CALIBRATION_REQUIRED, reason));
    }

    fn start_session(&mut self, ctx: &mut EngineContext) {
        if !self.detector.is_calibrated() || self.detector.phase() != CalibrationPhase::Idle {
            log::warn!("start ignored: calibration incomplete");
            return;
        }

        self.detector.reset_counter();
        self.grace.start(ctx.now);
        self.watchdog.reset();
        self.warning_second = None;
        let challenges = self.story.as_ref().map(Story::challenges).unwrap_or_default();
        self.typing.load(challenges);
        self.phase = Phase::Intro;
        ctx.emit_event(event(event_kind::SCENE_START, 0.0));
        log::info!("session started, {} challenges", self.typing.challenge_count());
    }

    fn eye_sample(&mut self, ctx: &mut EngineContext, sample: EarSample) {
        self.face_detected = sample.has_face();

        if self.phase.in_session() {
            match self.watchdog.observe(ctx.now, sample.has_face()) {
                WatchdogSignal::Tracking => {}
                WatchdogSignal::Warning { remaining } => {
                    let second = remaining.ceil() as u32;
                    if self.warning_second != Some(second) {
                        self.warning_second = Some(second);
                        ctx.emit_event(event(game_events::FACE_LOST_WARNING, second as f32));
                    }
                }
                WatchdogSignal::Recovered => {
                    self.warning_second = None;
                    ctx.emit_event(event(game_events::FACE_RECOVERED, 0.0));
                }
                WatchdogSignal::Recalibrate => {
                    self.require_calibration(ctx, reasons::FACE_LOST);
                    return;
                }
            }
        }

        // A zero reading is "no face", not closed eyes.
        if !sample.has_face() {
            return;
        }
        let update = self.detector.process(sample);
        if update.blinked && self.phase == Phase::Playing {
            ctx.emit_event(event(event_kind::BLINK, self.grace.reported(update.blink_count) as f32));
        }
    }

    fn typing_outcome(&mut self, ctx: &mut EngineContext, outcome: InputOutcome, errors_before: u32) {
        match outcome {
            InputOutcome::Ignored => {}
            InputOutcome::Rejected => ctx.emit_event(event(game_events::PASTE_REJECTED, 0.0)),
            InputOutcome::Typing { has_error, error_count } => {
                if has_error && error_count > errors_before {
                    ctx.emit_event(event(game_events::TYPING_ERROR, error_count as f32));
                }
            }
            InputOutcome::Progress(progress) => self.progress(ctx, progress),
        }
    }

    fn progress(&mut self, ctx: &mut EngineContext, progress: Progress) {
        match progress {
            Progress::WordComplete { word_index } => {
                ctx.emit_event(event(game_events::WORD_COMPLETE, word_index as f32));
            }
            Progress::ChallengeComplete { challenge_index } => {
                ctx.emit_event(event(game_events::CHALLENGE_COMPLETE, challenge_index as f32));
            }
            Progress::NextChallenge { challenge_index } => {
                ctx.emit_event(event(game_events::NEXT_CHALLENGE, challenge_index as f32));
            }
            Progress::AllComplete => self.finish(ctx),
        }
    }

    fn finish(&mut self, ctx: &mut EngineContext) {
        self.phase = Phase::Finished;
        let stats = self.typing.stats();
        let elapsed = stats.elapsed(ctx.now);
        let wpm = stats.wpm(ctx.now);
        let accuracy = stats.accuracy();
        ctx.emit_event(GameEvent::new(
            game_events::ALL_COMPLETE,
            wpm as f32,
            accuracy as f32,
            elapsed as f32,
        ));
        log::info!(
            "run finished: {} wpm, {}% accuracy in {}",
            wpm,
            accuracy,
            format_time(elapsed as u32)
        );

        let Some(story) = &self.story else {
            return;
        };
        let submission = ScoreSubmission {
            story_id: story.id.clone(),
            wpm: wpm as f64,
            accuracy: accuracy as f64,
            time_taken: elapsed,
        };
        match self.scores.submit_score(LOCAL_USER, &submission) {
            Ok(SubmitOutcome::Accepted { score }) => {
                ctx.emit_event(GameEvent::new(game_events::SCORE, score as f32, 1.0, score as f32));
            }
            Ok(SubmitOutcome::NotImproved { score, best }) => {
                ctx.emit_event(GameEvent::new(game_events::SCORE, score as f32, 0.0, best as f32));
            }
            Err(err) => log::warn!("run not scored: {}", err),
        }
    }
}

impl Game for NightTypist {
    fn config(&self) -> GameConfig {
        self.config.clone()
    }

    fn init(&mut self, ctx: &mut EngineContext) {
        match ctx.profiles().load() {
            Some(profile) => {
                log::info!("restored calibration, threshold {:.3}", profile.threshold);
                self.detector = BlinkDetector::new(self.config.detection.clone()).with_profile(profile);
                self.phase = Phase::Ready;
            }
            None => {
                self.phase = Phase::Calibrating;
                ctx.emit_event(event(game_events::CALIBRATION_REQUIRED, reasons::NO_PROFILE));
            }
        }
    }

    fn update(&mut self, ctx: &mut EngineContext, input: &InputQueue) {
        self.now = ctx.now;

        for ev in input.iter() {
            match ev {
                InputEvent::Custom { kind, .. } => self.command(ctx, *kind),
                InputEvent::EyeSample { sample, .. } => self.eye_sample(ctx, *sample),
                InputEvent::VisionFailed { error } => {
                    log::warn!("vision failed: {}", error);
                    ctx.emit_event(event(game_events::VISION_FAILED, vision_error_class(error)));
                }
                InputEvent::TextInput { value } if self.phase.in_session() => {
                    let before = self.typing.error_count();
                    let outcome = self.typing.on_input(value, ctx.now);
                    self.typing_outcome(ctx, outcome, before);
                }
                InputEvent::KeyDown { key_code } if self.phase.in_session() => {
                    let key = match *key_code {
                        KEY_SPACE => Key::Space,
                        KEY_ENTER => Key::Enter,
                        _ => continue,
                    };
                    let before = self.typing.error_count();
                    let outcome = self.typing.on_key(key, ctx.now);
                    self.typing_outcome(ctx, outcome, before);
                }
                InputEvent::Paste if self.phase.in_session() => {
                    let outcome = self.typing.on_paste();
                    self.typing_outcome(ctx, outcome, 0);
                }
                _ => {}
            }
        }

        if self.phase == Phase::Intro && self.grace.update(ctx.now, self.detector.blink_count()) {
            self.phase = Phase::Playing;
            let baseline = self.grace.baseline().unwrap_or(0);
            ctx.emit_event(event(game_events::GRACE_OVER, baseline as f32));
        }

        if self.phase.in_session() {
            if let Some(progress) = self.typing.tick(ctx.now) {
                self.progress(ctx, progress);
            }
        }
    }

    fn hud(&self) -> HudState {
        let stats = self.typing.stats();
        HudState {
            phase: self.phase.id(),
            blink_count: self.reported_count(),
            ear: self.detector.last_sample().average,
            threshold: self.detector.threshold(),
            calibration_phase: match self.detector.phase() {
                CalibrationPhase::Idle => 0,
                CalibrationPhase::CalibratingOpen => 1,
                CalibrationPhase::CalibratingClosed => 2,
            },
            is_calibrated: self.detector.is_calibrated(),
            is_blinking: self.detector.is_blinking(),
            face_detected: self.face_detected,
            challenge_index: self.typing.challenge_index() as u32,
            word_index: self.typing.current_word_index() as u32,
            char_index: self.typing.current_char_index() as u32,
            has_error: self.typing.has_error(),
            error_count: self.typing.error_count(),
            wpm: stats.wpm(self.now),
            accuracy: stats.accuracy(),
            elapsed: stats.elapsed(self.now) as f32,
        }
    }
}
