/// Fixed timestep accumulator that also keeps the session clock.
///
/// Game logic sees time only through `now()`: seconds of simulated time
/// since the runner started, advanced by `dt` per fixed step.
pub struct FixedTimestep {
    dt: f64,
    accumulator: f64,
    now: f64,
}

/// Upper bound on steps per frame, so a backgrounded tab does not replay
/// minutes of game logic when it comes back.
const MAX_STEPS_PER_FRAME: u32 = 10;

impl FixedTimestep {
    pub fn new(dt: f64) -> Self {
        Self {
            dt,
            accumulator: 0.0,
            now: 0.0,
        }
    }

    /// Add frame time. Returns the number of fixed steps to run.
    pub fn accumulate(&mut self, frame_dt: f64) -> u32 {
        self.accumulator += frame_dt.max(0.0);
        self.accumulator = self.accumulator.min(self.dt * MAX_STEPS_PER_FRAME as f64);
        let steps = (self.accumulator / self.dt) as u32;
        self.accumulator -= steps as f64 * self.dt;
        steps
    }

    /// Advance the clock by one step. Call once per step returned by `accumulate`.
    pub fn step(&mut self) -> f64 {
        self.now += self.dt;
        self.now
    }

    pub fn now(&self) -> f64 {
        self.now
    }

    pub fn dt(&self) -> f64 {
        self.dt
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn one_step_exact() {
        let mut ts = FixedTimestep::new(1.0 / 60.0);
        assert_eq!(ts.accumulate(1.0 / 60.0), 1);
    }

    #[test]
    fn accumulates_partial() {
        let mut ts = FixedTimestep::new(1.0 / 60.0);
        assert_eq!(ts.accumulate(0.008), 0);
        assert_eq!(ts.accumulate(0.010), 1);
    }

    #[test]
    fn caps_steps_after_a_stall() {
        let mut ts = FixedTimestep::new(1.0 / 60.0);
        assert_eq!(ts.accumulate(30.0), MAX_STEPS_PER_FRAME);
    }

    #[test]
    fn clock_advances_per_step() {
        let mut ts = FixedTimestep::new(0.25);
        let steps = ts.accumulate(0.5);
        for _ in 0..steps {
            ts.step();
        }
        assert_eq!(ts.now(), 0.5);
    }

    #[test]
    fn negative_frame_time_is_ignored() {
        let mut ts = FixedTimestep::new(0.1);
        assert_eq!(ts.accumulate(-5.0), 0);
        assert_eq!(ts.accumulate(0.1), 1);
    }
}
