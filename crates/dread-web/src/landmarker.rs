use dread_engine::{LandmarkModel, LandmarkSet, VisionError};
use glam::Vec3;
use js_sys::{Array, Function, Promise, Reflect};
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;
use web_sys::HtmlVideoElement;

/// Handle to a JS face landmarker (MediaPipe `FaceLandmarker` in video mode).
pub struct JsLandmarker {
    inner: JsValue,
    detect_fn: Function,
}

fn describe(err: &JsValue) -> String {
    err.as_string()
        .or_else(|| err.dyn_ref::<js_sys::Error>().map(|e| String::from(e.message())))
        .unwrap_or_else(|| format!("{:?}", err))
}

impl JsLandmarker {
    /// Wrap an already constructed landmarker object.
    pub fn from_js(inner: JsValue) -> Result<Self, VisionError> {
        let detect_fn = Reflect::get(&inner, &JsValue::from_str("detectForVideo"))
            .ok()
            .and_then(|f| f.dyn_into::<Function>().ok())
            .ok_or_else(|| VisionError::ModelInit("object has no detectForVideo()".into()))?;
        Ok(Self { inner, detect_fn })
    }

    /// Run the page-supplied async factory (which loads the WASM runtime and
    /// the model file) and wrap what it resolves to.
    pub async fn load(factory: Function) -> Result<Self, VisionError> {
        let pending = factory
            .call0(&JsValue::NULL)
            .map_err(|e| VisionError::ModelInit(describe(&e)))?;
        let promise: Promise = pending
            .dyn_into()
            .map_err(|_| VisionError::ModelInit("factory did not return a promise".into()))?;
        let landmarker = JsFuture::from(promise)
            .await
            .map_err(|e| VisionError::ModelLoad(describe(&e)))?;
        Self::from_js(landmarker)
    }
}

fn coord(point: &JsValue, key: &str) -> Option<f32> {
    Reflect::get(point, &JsValue::from_str(key)).ok()?.as_f64().map(|v| v as f32)
}

/// First face of a `FaceLandmarkerResult`, if any.
fn first_face(result: &JsValue) -> Option<LandmarkSet> {
    let faces: Array = Reflect::get(result, &JsValue::from_str("faceLandmarks")).ok()?.dyn_into().ok()?;
    let face: Array = faces.get(0).dyn_into().ok()?;
    if face.length() == 0 {
        return None;
    }
    Some(
        face.iter()
            .map(|p| {
                Vec3::new(
                    coord(&p, "x").unwrap_or(0.0),
                    coord(&p, "y").unwrap_or(0.0),
                    coord(&p, "z").unwrap_or(0.0),
                )
            })
            .collect(),
    )
}

impl LandmarkModel for JsLandmarker {
    type Frame = HtmlVideoElement;

    fn detect(&mut self, frame: &HtmlVideoElement, timestamp_ms: f64) -> Result<Option<LandmarkSet>, VisionError> {
        let result = self
            .detect_fn
            .call2(&self.inner, frame, &JsValue::from_f64(timestamp_ms))
            .map_err(|e| VisionError::Detection(describe(&e)))?;
        Ok(first_face(&result))
    }
}
