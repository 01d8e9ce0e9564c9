use dread_engine::{decode_profile, CalibrationProfile, ProfileStore, PROFILE_KEY};
use web_sys::Storage;

/// Calibration profile in `window.localStorage`.
/// Storage can be unavailable (private mode, sandboxed iframes); every
/// operation then degrades to "no profile".
pub struct LocalStorageProfileStore {
    key: String,
}

impl LocalStorageProfileStore {
    pub fn new() -> Self {
        Self { key: PROFILE_KEY.to_owned() }
    }

    fn storage(&self) -> Option<Storage> {
        match web_sys::window()?.local_storage() {
            Ok(storage) => storage,
            Err(err) => {
                log::warn!("localStorage unavailable: {:?}", err);
                None
            }
        }
    }
}

impl Default for LocalStorageProfileStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ProfileStore for LocalStorageProfileStore {
    fn load(&self) -> Option<CalibrationProfile> {
        let raw = self.storage()?.get_item(&self.key).ok()??;
        decode_profile(&raw)
    }

    fn save(&mut self, profile: &CalibrationProfile) {
        let Some(storage) = self.storage() else {
            return;
        };
        match profile.to_json() {
            Ok(json) => {
                if let Err(err) = storage.set_item(&self.key, &json) {
                    log::warn!("failed to persist calibration: {:?}", err);
                }
            }
            Err(err) => log::error!("failed to encode calibration profile: {}", err),
        }
    }

    fn clear(&mut self) {
        if let Some(storage) = self.storage() {
            let _ = storage.remove_item(&self.key);
        }
    }
}
