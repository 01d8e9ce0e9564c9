use dread_engine::{
    CaptureConstraints, CaptureError, CaptureStatus, PermissionState, VideoDevice,
};
use js_sys::{Array, Object, Reflect};
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;
use web_sys::{
    DomException, HtmlVideoElement, MediaDeviceInfo, MediaDeviceKind, MediaDevices, MediaStream,
    MediaStreamConstraints, MediaStreamTrack,
};

/// `HTMLMediaElement.HAVE_CURRENT_DATA`
const HAVE_CURRENT_DATA: u16 = 2;

/// Webcam owned by the runner: the live stream and the video element it is
/// attached to.
#[derive(Default)]
pub struct WebCamera {
    status: CaptureStatus,
    stream: Option<MediaStream>,
    video: Option<HtmlVideoElement>,
}

impl WebCamera {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn status(&self) -> &CaptureStatus {
        &self.status
    }

    pub fn status_mut(&mut self) -> &mut CaptureStatus {
        &mut self.status
    }

    /// Mark an acquisition as in flight. Pass the ticket to `finish_start`.
    pub fn begin_start(&mut self) -> u32 {
        self.release();
        self.status.begin_start()
    }

    /// Attach the stream from `acquire`, unless `stop` was called meanwhile,
    /// in which case the stream is released immediately.
    pub fn finish_start(
        &mut self,
        ticket: u32,
        video: HtmlVideoElement,
        result: Result<MediaStream, CaptureError>,
    ) -> Result<(), CaptureError> {
        let outcome = result.as_ref().map(|_| ()).map_err(Clone::clone);
        if !self.status.finish_start(ticket, outcome) {
            if let Ok(stream) = result {
                stop_tracks(&stream);
            }
            log::info!("camera start superseded, stream released");
            return Ok(());
        }

        let stream = result?;
        video.set_muted(true);
        video.set_src_object(Some(&stream));
        if let Err(err) = video.play() {
            log::warn!("video.play() failed: {:?}", err);
        }
        self.stream = Some(stream);
        self.video = Some(video);
        log::info!("camera streaming");
        Ok(())
    }

    /// Release every track and detach the sink. Safe to call at any time.
    pub fn stop(&mut self) {
        self.release();
        self.status.stop();
    }

    fn release(&mut self) {
        if let Some(stream) = self.stream.take() {
            stop_tracks(&stream);
        }
        if let Some(video) = self.video.take() {
            video.set_src_object(None);
        }
    }

    /// The video element, once it has a decodable frame.
    pub fn frame(&self) -> Option<(&HtmlVideoElement, f64)> {
        if !self.status.is_streaming() {
            return None;
        }
        let video = self.video.as_ref()?;
        if video.ready_state() < HAVE_CURRENT_DATA {
            return None;
        }
        Some((video, video.current_time() * 1000.0))
    }
}

fn stop_tracks(stream: &MediaStream) {
    for track in stream.get_tracks().iter() {
        if let Ok(track) = track.dyn_into::<MediaStreamTrack>() {
            track.stop();
        }
    }
}

fn media_devices() -> Result<MediaDevices, CaptureError> {
    let window = web_sys::window().ok_or(CaptureError::ApiUnsupported)?;
    if !window.is_secure_context() {
        return Err(CaptureError::InsecureContext);
    }
    let navigator = window.navigator();
    let devices = Reflect::get(&navigator, &JsValue::from_str("mediaDevices"))
        .map_err(|_| CaptureError::ApiUnsupported)?;
    if devices.is_undefined() || devices.is_null() {
        return Err(CaptureError::ApiUnsupported);
    }
    Ok(devices.unchecked_into::<MediaDevices>())
}

/// Map a rejected `getUserMedia` promise to the capture taxonomy.
fn classify(err: JsValue) -> CaptureError {
    if let Some(dom) = err.dyn_ref::<DomException>() {
        return CaptureError::from_dom_exception(&dom.name(), &dom.message());
    }
    if let Some(js) = err.dyn_ref::<js_sys::Error>() {
        let name: String = js.name().into();
        let message: String = js.message().into();
        return CaptureError::from_dom_exception(&name, &message);
    }
    CaptureError::Unknown(format!("{:?}", err))
}

fn set(target: &Object, key: &str, value: &JsValue) {
    let _ = Reflect::set(target, &JsValue::from_str(key), value);
}

fn ideal(value: u32) -> Object {
    let obj = Object::new();
    set(&obj, "ideal", &JsValue::from(value));
    obj
}

fn build_constraints(constraints: &CaptureConstraints) -> MediaStreamConstraints {
    let video = Object::new();
    set(&video, "width", &ideal(constraints.width));
    set(&video, "height", &ideal(constraints.height));
    match &constraints.device_id {
        Some(id) => {
            let exact = Object::new();
            set(&exact, "exact", &JsValue::from_str(id));
            set(&video, "deviceId", &exact);
        }
        None => set(&video, "facingMode", &JsValue::from_str(constraints.facing_mode.as_str())),
    }

    let root = Object::new();
    set(&root, "video", &video);
    set(&root, "audio", &JsValue::FALSE);
    root.unchecked_into::<MediaStreamConstraints>()
}

/// Request a camera stream. Does not touch runner state, so it can be
/// awaited without holding the runner borrow.
pub async fn acquire(constraints: &CaptureConstraints) -> Result<MediaStream, CaptureError> {
    let devices = media_devices()?;
    let promise = devices
        .get_user_media_with_constraints(&build_constraints(constraints))
        .map_err(classify)?;
    let stream = JsFuture::from(promise).await.map_err(classify)?;
    stream
        .dyn_into::<MediaStream>()
        .map_err(|_| CaptureError::Unknown("getUserMedia returned a non-stream".into()))
}

/// Video inputs. Labels stay empty until permission was granted once.
pub async fn enumerate() -> Result<Vec<VideoDevice>, CaptureError> {
    let devices = media_devices()?;
    let promise = devices.enumerate_devices().map_err(classify)?;
    let list = JsFuture::from(promise).await.map_err(classify)?;
    let list: Array = list.unchecked_into();
    Ok(list
        .iter()
        .filter_map(|d| d.dyn_into::<MediaDeviceInfo>().ok())
        .filter(|d| d.kind() == MediaDeviceKind::Videoinput)
        .map(|d| VideoDevice {
            device_id: d.device_id(),
            label: d.label(),
        })
        .collect())
}

/// Current camera permission without prompting. Falls back to `Prompt`
/// where the Permissions API (or the "camera" name) is unsupported.
pub async fn permission_state() -> PermissionState {
    match query_permission().await {
        Ok(state) => state,
        Err(err) => {
            log::debug!("permission query unsupported: {:?}", err);
            PermissionState::Prompt
        }
    }
}

async fn query_permission() -> Result<PermissionState, JsValue> {
    let window = web_sys::window().ok_or_else(|| JsValue::from_str("no window"))?;
    let permissions = Reflect::get(&window.navigator(), &JsValue::from_str("permissions"))?;
    if permissions.is_undefined() {
        return Err(JsValue::from_str("no permissions api"));
    }
    let query: js_sys::Function = Reflect::get(&permissions, &JsValue::from_str("query"))?.dyn_into()?;
    let descriptor = Object::new();
    set(&descriptor, "name", &JsValue::from_str("camera"));
    let promise: js_sys::Promise = query.call1(&permissions, &descriptor)?.dyn_into()?;
    let status = JsFuture::from(promise).await?;
    let state = Reflect::get(&status, &JsValue::from_str("state"))?;
    Ok(PermissionState::parse(&state.as_string().unwrap_or_default()))
}
