use glam::Vec3;

use crate::vision::ear::{self, EarSample};
use crate::vision::error::VisionError;

/// Normalized face-mesh points: x, y in [0, 1] of the frame, z relative depth.
pub type LandmarkSet = Vec<Vec3>;

/// A per-frame facial landmark model.
///
/// `Ok(None)` means the frame was processed and contains no face.
/// `Err` is reserved for real failures of the runtime.
pub trait LandmarkModel {
    /// Whatever the model reads pixels from (a video element in the browser).
    type Frame: ?Sized;

    fn detect(
        &mut self,
        frame: &Self::Frame,
        timestamp_ms: f64,
    ) -> Result<Option<LandmarkSet>, VisionError>;
}

/// Parse a flat `[x0, y0, z0, x1, y1, z1, ...]` buffer into landmarks.
/// A trailing partial triple is ignored.
pub fn landmarks_from_flat(flat: &[f32]) -> LandmarkSet {
    flat.chunks_exact(3)
        .map(|p| Vec3::new(p[0], p[1], p[2]))
        .collect()
}

/// Result of asking the adapter to look at a frame.
#[derive(Debug, Clone, PartialEq)]
pub enum Detection {
    /// Frame timestamp was already processed; inference did not run.
    Skipped,
    NoFace,
    Face(LandmarkSet),
}

enum ModelSlot<M> {
    NotReady,
    Ready(M),
    Failed(VisionError),
}

/// Owns the landmark model and guarantees at most one inference per frame.
pub struct InferenceAdapter<M: LandmarkModel> {
    slot: ModelSlot<M>,
    last_timestamp: Option<f64>,
}

impl<M: LandmarkModel> InferenceAdapter<M> {
    pub fn new() -> Self {
        Self {
            slot: ModelSlot::NotReady,
            last_timestamp: None,
        }
    }

    /// Complete initialization with a loaded model.
    pub fn attach(&mut self, model: M) {
        log::info!("landmark model ready");
        self.slot = ModelSlot::Ready(model);
        self.last_timestamp = None;
    }

    /// Record that initialization failed.
    pub fn fail(&mut self, err: VisionError) {
        log::error!("landmark model unavailable: {}", err);
        self.slot = ModelSlot::Failed(err);
    }

    pub fn is_ready(&self) -> bool {
        matches!(self.slot, ModelSlot::Ready(_))
    }

    pub fn init_error(&self) -> Option<&VisionError> {
        match &self.slot {
            ModelSlot::Failed(err) => Some(err),
            _ => None,
        }
    }

    /// Forget the last processed timestamp (e.g. after the stream restarts
    /// and the video clock goes back to zero).
    pub fn reset_clock(&mut self) {
        self.last_timestamp = None;
    }

    /// Run inference on `frame` unless `timestamp_ms` was already processed.
    pub fn detect(&mut self, frame: &M::Frame, timestamp_ms: f64) -> Result<Detection, VisionError> {
        let model = match &mut self.slot {
            ModelSlot::Ready(model) => model,
            ModelSlot::NotReady => return Err(VisionError::NotReady),
            ModelSlot::Failed(err) => return Err(err.clone()),
        };

        if let Some(last) = self.last_timestamp {
            if timestamp_ms <= last {
                return Ok(Detection::Skipped);
            }
        }
        self.last_timestamp = Some(timestamp_ms);

        Ok(match model.detect(frame, timestamp_ms)? {
            Some(landmarks) => Detection::Face(landmarks),
            None => Detection::NoFace,
        })
    }
}

impl<M: LandmarkModel> Default for InferenceAdapter<M> {
    fn default() -> Self {
        Self::new()
    }
}

/// Inference adapter + EAR estimator: turns frames into EAR samples.
pub struct FrameSampler<M: LandmarkModel> {
    adapter: InferenceAdapter<M>,
    /// Kept for debug overlays.
    last_landmarks: Option<LandmarkSet>,
}

impl<M: LandmarkModel> FrameSampler<M> {
    pub fn new() -> Self {
        Self {
            adapter: InferenceAdapter::new(),
            last_landmarks: None,
        }
    }

    pub fn adapter(&self) -> &InferenceAdapter<M> {
        &self.adapter
    }

    pub fn adapter_mut(&mut self) -> &mut InferenceAdapter<M> {
        &mut self.adapter
    }

    pub fn last_landmarks(&self) -> Option<&LandmarkSet> {
        self.last_landmarks.as_ref()
    }

    /// `Ok(None)` for a duplicate frame. A frame without a face yields
    /// `EarSample::NO_FACE`.
    pub fn sample(&mut self, frame: &M::Frame, timestamp_ms: f64) -> Result<Option<EarSample>, VisionError> {
        match self.adapter.detect(frame, timestamp_ms)? {
            Detection::Skipped => Ok(None),
            Detection::NoFace => {
                self.last_landmarks = None;
                Ok(Some(EarSample::NO_FACE))
            }
            Detection::Face(landmarks) => {
                let sample = ear::estimate(&landmarks);
                self.last_landmarks = Some(landmarks);
                Ok(Some(sample))
            }
        }
    }
}

impl<M: LandmarkModel> Default for FrameSampler<M> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vision::ear::tests::mesh_with_ear;

    /// Replays a script of detection results and counts invocations.
    struct ScriptedModel {
        script: Vec<Result<Option<LandmarkSet>, VisionError>>,
        calls: usize,
    }

    impl LandmarkModel for ScriptedModel {
        type Frame = ();

        fn detect(&mut self, _frame: &(), _ts: f64) -> Result<Option<LandmarkSet>, VisionError> {
            let result = self.script[self.calls % self.script.len()].clone();
            self.calls += 1;
            result
        }
    }

    fn model(script: Vec<Result<Option<LandmarkSet>, VisionError>>) -> ScriptedModel {
        ScriptedModel { script, calls: 0 }
    }

    #[test]
    fn not_ready_until_attached() {
        let mut adapter: InferenceAdapter<ScriptedModel> = InferenceAdapter::new();
        assert!(!adapter.is_ready());
        assert_eq!(adapter.detect(&(), 1.0), Err(VisionError::NotReady));
        adapter.attach(model(vec![Ok(None)]));
        assert!(adapter.is_ready());
        assert_eq!(adapter.detect(&(), 1.0), Ok(Detection::NoFace));
    }

    #[test]
    fn failed_init_is_reported_on_detect() {
        let mut adapter: InferenceAdapter<ScriptedModel> = InferenceAdapter::new();
        adapter.fail(VisionError::ModelLoad("404".into()));
        assert_eq!(adapter.init_error().map(|e| e.code()), Some("model-load-failed"));
        assert_eq!(adapter.detect(&(), 1.0), Err(VisionError::ModelLoad("404".into())));
    }

    #[test]
    fn duplicate_timestamps_skip_inference() {
        let mut adapter = InferenceAdapter::new();
        adapter.attach(model(vec![Ok(None)]));
        assert_eq!(adapter.detect(&(), 16.0), Ok(Detection::NoFace));
        assert_eq!(adapter.detect(&(), 16.0), Ok(Detection::Skipped));
        assert_eq!(adapter.detect(&(), 10.0), Ok(Detection::Skipped));
        assert_eq!(adapter.detect(&(), 33.0), Ok(Detection::NoFace));
        match &adapter.slot {
            ModelSlot::Ready(m) => assert_eq!(m.calls, 2),
            _ => panic!("adapter should be ready"),
        }
    }

    #[test]
    fn runtime_errors_propagate_distinct_from_no_face() {
        let mut adapter = InferenceAdapter::new();
        adapter.attach(model(vec![Err(VisionError::Detection("context lost".into()))]));
        let err = adapter.detect(&(), 1.0).unwrap_err();
        assert_eq!(err.code(), "runtime-detection-error");
    }

    #[test]
    fn sampler_turns_faces_into_ear() {
        let mut sampler = FrameSampler::new();
        sampler
            .adapter_mut()
            .attach(model(vec![Ok(Some(mesh_with_ear(0.3))), Ok(None)]));

        let face = sampler.sample(&(), 1.0).unwrap().unwrap();
        assert!((face.average - 0.3).abs() < 1e-5);
        assert!(sampler.last_landmarks().is_some());

        assert_eq!(sampler.sample(&(), 1.0), Ok(None));

        let empty = sampler.sample(&(), 2.0).unwrap().unwrap();
        assert!(!empty.has_face());
        assert!(sampler.last_landmarks().is_none());
    }

    #[test]
    fn flat_buffers_parse_into_points() {
        let points = landmarks_from_flat(&[0.1, 0.2, 0.3, 0.4, 0.5, 0.6, 0.7]);
        assert_eq!(points.len(), 2);
        assert_eq!(points[1], Vec3::new(0.4, 0.5, 0.6));
    }
}
