use crate::vision::blink::CalibrationProfile;

/// Storage key of the calibration profile.
pub const PROFILE_KEY: &str = "dread.calibration";

/// Device-local persistence of the calibration profile.
///
/// `load` returning `None` (missing, unreadable or inconsistent record)
/// sends the player through calibration before gameplay.
pub trait ProfileStore {
    fn load(&self) -> Option<CalibrationProfile>;

    fn save(&mut self, profile: &CalibrationProfile);

    fn clear(&mut self);
}

/// Decode a stored record, discarding anything that does not hold a
/// consistent calibrated profile.
pub fn decode_profile(raw: &str) -> Option<CalibrationProfile> {
    match CalibrationProfile::from_json(raw) {
        Ok(profile) if profile.is_calibrated && profile.is_consistent() => Some(profile),
        Ok(_) => {
            log::warn!("stored calibration profile is incomplete, ignoring it");
            None
        }
        Err(err) => {
            log::warn!("stored calibration profile is unreadable: {}", err);
            None
        }
    }
}

/// Keeps the serialized record in memory, exactly as a key-value store would.
#[derive(Debug, Default)]
pub struct MemoryProfileStore {
    raw: Option<String>,
}

impl MemoryProfileStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_raw(raw: impl Into<String>) -> Self {
        Self { raw: Some(raw.into()) }
    }

    pub fn raw(&self) -> Option<&str> {
        self.raw.as_deref()
    }
}

impl ProfileStore for MemoryProfileStore {
    fn load(&self) -> Option<CalibrationProfile> {
        self.raw.as_deref().and_then(decode_profile)
    }

    fn save(&mut self, profile: &CalibrationProfile) {
        match profile.to_json() {
            Ok(json) => self.raw = Some(json),
            Err(err) => log::error!("failed to encode calibration profile: {}", err),
        }
    }

    fn clear(&mut self) {
        self.raw = None;
    }
}
