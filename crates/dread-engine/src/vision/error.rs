use thiserror::Error;

use crate::vision::capture::CaptureError;

/// Errors from the vision pipeline.
///
/// "No face in frame" is deliberately absent: it is a normal outcome
/// (`Ok(None)` from detection), not a failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VisionError {
    #[error(transparent)]
    Capture(#[from] CaptureError),
    #[error("failed to initialize the landmark runtime: {0}")]
    ModelInit(String),
    #[error("failed to load the landmark model: {0}")]
    ModelLoad(String),
    #[error("landmark detection failed: {0}")]
    Detection(String),
    #[error("landmark model is not ready")]
    NotReady,
}

impl VisionError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::Capture(err) => err.code(),
            Self::ModelInit(_) => "model-init-failed",
            Self::ModelLoad(_) => "model-load-failed",
            Self::Detection(_) => "runtime-detection-error",
            Self::NotReady => "model-not-ready",
        }
    }

    pub fn remediation(&self) -> &'static str {
        match self {
            Self::Capture(err) => err.remediation(),
            Self::ModelInit(_) | Self::ModelLoad(_) => {
                "The face tracker could not be loaded. Check your connection and try again."
            }
            Self::Detection(_) => "Face tracking stopped unexpectedly. Try again.",
            Self::NotReady => "The face tracker is still loading.",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_are_stable() {
        assert_eq!(VisionError::from(CaptureError::InsecureContext).code(), "insecure-context");
        assert_eq!(VisionError::ModelInit("wasm".into()).code(), "model-init-failed");
        assert_eq!(VisionError::ModelLoad("404".into()).code(), "model-load-failed");
        assert_eq!(VisionError::Detection("gl".into()).code(), "runtime-detection-error");
    }

    #[test]
    fn capture_errors_display_transparently() {
        let err = VisionError::from(CaptureError::PermissionDenied);
        assert_eq!(err.to_string(), CaptureError::PermissionDenied.to_string());
    }
}
