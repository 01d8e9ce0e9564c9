use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Camera acquisition failures.
/// Every variant is recoverable by re-running acquisition ("try again").
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CaptureError {
    #[error("camera permission was denied")]
    PermissionDenied,
    #[error("no camera device was found")]
    DeviceNotFound,
    #[error("camera access requires HTTPS or localhost")]
    InsecureContext,
    #[error("this browser does not support camera capture")]
    ApiUnsupported,
    #[error("the camera cannot satisfy the requested constraints")]
    ConstraintsUnsupported,
    #[error("camera error: {0}")]
    Unknown(String),
}

impl CaptureError {
    /// Classify a DOMException (by its `name`) raised from `getUserMedia`.
    pub fn from_dom_exception(name: &str, message: &str) -> Self {
        match name {
            "NotAllowedError" | "PermissionDeniedError" => Self::PermissionDenied,
            "NotFoundError" | "DevicesNotFoundError" => Self::DeviceNotFound,
            "SecurityError" => Self::InsecureContext,
            "OverconstrainedError" | "ConstraintNotSatisfiedError" => {
                Self::ConstraintsUnsupported
            }
            "NotSupportedError" | "TypeError" => Self::ApiUnsupported,
            _ => Self::Unknown(format!("{}: {}", name, message)),
        }
    }

    /// Stable kebab-case code, read by the presentation layer.
    pub fn code(&self) -> &'static str {
        match self {
            Self::PermissionDenied => "permission-denied",
            Self::DeviceNotFound => "device-not-found",
            Self::InsecureContext => "insecure-context",
            Self::ApiUnsupported => "api-unsupported",
            Self::ConstraintsUnsupported => "constraints-unsupported",
            Self::Unknown(_) => "unknown",
        }
    }

    /// Guidance shown next to the "try again" action.
    pub fn remediation(&self) -> &'static str {
        match self {
            Self::PermissionDenied => {
                "Allow camera access in your browser's site settings, then try again."
            }
            Self::DeviceNotFound => "Connect a webcam and make sure no other app is using it.",
            Self::InsecureContext => "Open the game over https:// or from localhost.",
            Self::ApiUnsupported => "Use a recent version of Chrome, Edge, Firefox or Safari.",
            Self::ConstraintsUnsupported => {
                "Your camera does not support the requested resolution. Try another camera."
            }
            Self::Unknown(_) => "Something went wrong starting the camera. Try again.",
        }
    }
}

/// Which way the camera should face.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FacingMode {
    #[default]
    User,
    Environment,
}

impl FacingMode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Environment => "environment",
        }
    }
}

/// Requested stream properties. Resolutions are hints ("ideal"), not hard limits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaptureConstraints {
    #[serde(default = "default_width")]
    pub width: u32,
    #[serde(default = "default_height")]
    pub height: u32,
    #[serde(default)]
    pub facing_mode: FacingMode,
    /// Pin a specific device (from `enumerate`). Overrides `facing_mode`.
    #[serde(default)]
    pub device_id: Option<String>,
}

fn default_width() -> u32 {
    640
}

fn default_height() -> u32 {
    480
}

impl Default for CaptureConstraints {
    fn default() -> Self {
        Self {
            width: default_width(),
            height: default_height(),
            facing_mode: FacingMode::User,
            device_id: None,
        }
    }
}

/// Browser permission state for the camera.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PermissionState {
    Granted,
    Denied,
    #[default]
    Prompt,
}

impl PermissionState {
    /// Parse the Permissions API state string. Anything unrecognised is `Prompt`.
    pub fn parse(state: &str) -> Self {
        match state {
            "granted" => Self::Granted,
            "denied" => Self::Denied,
            _ => Self::Prompt,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Granted => "granted",
            Self::Denied => "denied",
            Self::Prompt => "prompt",
        }
    }
}

/// A video input device. Labels are empty until permission has been granted once.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoDevice {
    pub device_id: String,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum CaptureState {
    #[default]
    Idle,
    Starting,
    Streaming,
    Failed(CaptureError),
}

/// Tracks where the capture manager is in its lifecycle.
#[derive(Debug, Default)]
pub struct CaptureStatus {
    state: CaptureState,
    permission: PermissionState,
    /// Bumped on every start/stop so a late `start` completion can be discarded.
    generation: u32,
}

impl CaptureStatus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &CaptureState {
        &self.state
    }

    pub fn permission(&self) -> PermissionState {
        self.permission
    }

    pub fn set_permission(&mut self, permission: PermissionState) {
        self.permission = permission;
    }

    pub fn is_streaming(&self) -> bool {
        self.state == CaptureState::Streaming
    }

    pub fn error(&self) -> Option<&CaptureError> {
        match &self.state {
            CaptureState::Failed(err) => Some(err),
            _ => None,
        }
    }

    /// Begin an acquisition attempt. Returns the ticket that must be passed
    /// to `finish_start`.
    pub fn begin_start(&mut self) -> u32 {
        self.generation = self.generation.wrapping_add(1);
        self.state = CaptureState::Starting;
        self.generation
    }

    /// Record the outcome of an acquisition attempt.
    /// Returns false if the attempt was superseded by `stop` or a newer `start`;
    /// the caller must then release the stream it obtained.
    pub fn finish_start(&mut self, ticket: u32, result: Result<(), CaptureError>) -> bool {
        if ticket != self.generation || self.state != CaptureState::Starting {
            return false;
        }
        match result {
            Ok(()) => {
                self.state = CaptureState::Streaming;
                self.permission = PermissionState::Granted;
            }
            Err(err) => {
                if err == CaptureError::PermissionDenied {
                    self.permission = PermissionState::Denied;
                }
                log::warn!("camera start failed: {}", err);
                self.state = CaptureState::Failed(err);
            }
        }
        true
    }

    /// Idempotent.
    pub fn stop(&mut self) {
        self.generation = self.generation.wrapping_add(1);
        self.state = CaptureState::Idle;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dom_exceptions_map_to_taxonomy() {
        assert_eq!(
            CaptureError::from_dom_exception("NotAllowedError", ""),
            CaptureError::PermissionDenied
        );
        assert_eq!(
            CaptureError::from_dom_exception("NotFoundError", ""),
            CaptureError::DeviceNotFound
        );
        assert_eq!(
            CaptureError::from_dom_exception("SecurityError", ""),
            CaptureError::InsecureContext
        );
        assert_eq!(
            CaptureError::from_dom_exception("OverconstrainedError", "width"),
            CaptureError::ConstraintsUnsupported
        );
        let other = CaptureError::from_dom_exception("NotReadableError", "busy");
        assert_eq!(other.code(), "unknown");
        assert!(other.to_string().contains("busy"));
    }

    #[test]
    fn permission_falls_back_to_prompt() {
        assert_eq!(PermissionState::parse("granted"), PermissionState::Granted);
        assert_eq!(PermissionState::parse("denied"), PermissionState::Denied);
        assert_eq!(PermissionState::parse("prompt"), PermissionState::Prompt);
        assert_eq!(PermissionState::parse(""), PermissionState::Prompt);
    }

    #[test]
    fn successful_start_streams_and_grants() {
        let mut status = CaptureStatus::new();
        let ticket = status.begin_start();
        assert_eq!(status.state(), &CaptureState::Starting);
        assert!(status.finish_start(ticket, Ok(())));
        assert!(status.is_streaming());
        assert_eq!(status.permission(), PermissionState::Granted);
    }

    #[test]
    fn denied_start_records_error() {
        let mut status = CaptureStatus::new();
        let ticket = status.begin_start();
        status.finish_start(ticket, Err(CaptureError::PermissionDenied));
        assert_eq!(status.error(), Some(&CaptureError::PermissionDenied));
        assert_eq!(status.permission(), PermissionState::Denied);
    }

    #[test]
    fn stop_before_start_completes_discards_stream() {
        let mut status = CaptureStatus::new();
        let ticket = status.begin_start();
        status.stop();
        assert!(!status.finish_start(ticket, Ok(())));
        assert_eq!(status.state(), &CaptureState::Idle);
    }

    #[test]
    fn stop_is_idempotent() {
        let mut status = CaptureStatus::new();
        status.stop();
        status.stop();
        assert_eq!(status.state(), &CaptureState::Idle);
    }

    #[test]
    fn constraints_default_from_empty_json() {
        let c: CaptureConstraints = serde_json::from_str("{}").unwrap();
        assert_eq!(c, CaptureConstraints::default());
        assert_eq!(c.facing_mode.as_str(), "user");
    }
}
