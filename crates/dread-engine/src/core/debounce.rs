/// Holds at most one pending value and releases it after `delay` seconds of
/// quiet. A newer `submit` replaces the pending value and restarts the timer.
#[derive(Debug, Clone)]
pub struct Debouncer<T> {
    delay: f64,
    pending: Option<(T, f64)>,
}

impl<T> Debouncer<T> {
    pub fn new(delay: f64) -> Self {
        Self { delay, pending: None }
    }

    pub fn submit(&mut self, value: T, now: f64) {
        self.pending = Some((value, now + self.delay));
    }

    pub fn cancel(&mut self) {
        self.pending = None;
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Release the pending value once its deadline has passed.
    pub fn poll(&mut self, now: f64) -> Option<T> {
        match &self.pending {
            Some((_, due)) if now >= *due => self.pending.take().map(|(value, _)| value),
            _ => None,
        }
    }
}
