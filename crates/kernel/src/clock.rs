/// Fixed-timestep accumulator.
///
/// Variable frame deltas are accumulated; every whole `step` of accumulated
/// time yields one fixed update. The fractional remainder carries into the
/// next frame. At most `max_steps` updates run per frame; older backlog is
/// dropped so a slow frame cannot snowball.
#[derive(Debug, Clone)]
pub struct FixedTimestep {
    step: f64,
    max_steps: u32,
    accumulator: f64,
    dropped: u64,
}

impl FixedTimestep {
    /// # Panics
    /// Panics if `step` is not positive and finite.
    pub fn new(step: f64, max_steps: u32) -> Self {
        assert!(step.is_finite() && step > 0.0, "fixed step must be positive and finite");
        Self {
            step,
            max_steps: max_steps.max(1),
            accumulator: 0.0,
            dropped: 0,
        }
    }

    pub fn step(&self) -> f64 {
        self.step
    }

    /// Leftover time not yet consumed by a fixed step.
    pub fn accumulator(&self) -> f64 {
        self.accumulator
    }

    /// Total fixed steps discarded by the per-frame cap.
    pub fn dropped_steps(&self) -> u64 {
        self.dropped
    }

    /// Interpolation factor in `[0, 1)` between the last two fixed states.
    pub fn alpha(&self) -> f64 {
        self.accumulator / self.step
    }

    /// Feed a frame delta and return how many fixed steps to run now.
    ///
    /// Negative deltas count as zero; non-finite deltas are ignored.
    pub fn advance(&mut self, frame_dt: f64) -> u32 {
        if !frame_dt.is_finite() {
            tracing::warn!(frame_dt, "non-finite frame delta ignored");
            return 0;
        }
        self.accumulator += frame_dt.max(0.0);
        let whole = (self.accumulator / self.step).floor();
        if whole < 1.0 {
            return 0;
        }
        self.accumulator = (self.accumulator - whole * self.step).max(0.0);

        let steps = whole.min(f64::from(self.max_steps)) as u32;
        let dropped = (whole - f64::from(steps)) as u64;
        if dropped > 0 {
            self.dropped = self.dropped.saturating_add(dropped);
            tracing::warn!(dropped, "fixed-step backlog exceeded cap");
        }
        steps
    }
}
