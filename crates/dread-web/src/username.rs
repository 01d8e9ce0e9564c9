use dread_engine::Debouncer;
use js_sys::Function;
use wasm_bindgen::JsValue;

/// Quiet time before an availability query goes out (seconds).
pub const CHECK_DELAY: f64 = 0.4;

const MIN_LEN: usize = 3;
const MAX_LEN: usize = 20;

/// Local shape check; only well-formed names are sent to the backend.
pub fn is_valid_username(name: &str) -> bool {
    let len = name.chars().count();
    (MIN_LEN..=MAX_LEN).contains(&len)
        && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

/// Debounced username-availability check. The page supplies the query
/// function; it receives the candidate name and owns the network call.
pub struct UsernameCheck {
    debouncer: Debouncer<String>,
    query: Option<Function>,
}

impl UsernameCheck {
    pub fn new() -> Self {
        Self {
            debouncer: Debouncer::new(CHECK_DELAY),
            query: None,
        }
    }

    pub fn set_query(&mut self, query: Function) {
        self.query = Some(query);
    }

    /// Record a keystroke in the username field. Invalid names cancel any
    /// pending query instead of scheduling one.
    pub fn input(&mut self, value: &str, now: f64) {
        let name = value.trim();
        if is_valid_username(name) {
            self.debouncer.submit(name.to_owned(), now);
        } else {
            self.debouncer.cancel();
        }
    }

    pub fn poll(&mut self, now: f64) {
        let Some(name) = self.debouncer.poll(now) else {
            return;
        };
        match &self.query {
            Some(query) => {
                if let Err(err) = query.call1(&JsValue::NULL, &JsValue::from_str(&name)) {
                    log::warn!("username query failed: {:?}", err);
                }
            }
            None => log::debug!("no username query registered, dropping '{}'", name),
        }
    }
}

impl Default for UsernameCheck {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn username_shape() {
        assert!(is_valid_username("night_owl"));
        assert!(is_valid_username("abc"));
        assert!(!is_valid_username("ab"));
        assert!(!is_valid_username("has space"));
        assert!(!is_valid_username(&"x".repeat(21)));
    }
}
