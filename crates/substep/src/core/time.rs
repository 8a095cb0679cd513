use crate::api::simulation::SteppedSimulation;

/// Step size used until the first `pre_simulation` call supplies one.
pub const DEFAULT_FIXED_STEP: f64 = 1.0 / 60.0;

/// Fixed-step scheduler wrapped around a stepped simulation.
///
/// Converts variable wall-clock frame deltas into whole sub-steps of a fixed
/// size, carrying the fractional remainder over to the next frame. When a
/// frame produces more whole steps than the caller allows, the excess is
/// dropped rather than deferred, so a slow machine falls behind wall-clock
/// time instead of spiralling into ever longer frames.
///
/// Per frame the caller runs `pre_simulation`, then `single_step_simulation`
/// once per returned sub-step, then `post_simulation` if at least one
/// sub-step ran. Frames must not overlap.
#[derive(Debug)]
pub struct FixedStepScheduler<E> {
    engine: E,
    /// Fractional time below one fixed step, carried across frames.
    leftover_time: f64,
    /// Step size supplied by the most recent `pre_simulation`.
    fixed_step: f64,
    /// Whole steps discarded by clamping since creation (or `reset`).
    dropped_steps: u64,
}

impl<E: SteppedSimulation> FixedStepScheduler<E> {
    pub fn new(engine: E) -> Self {
        Self {
            engine,
            leftover_time: 0.0,
            fixed_step: DEFAULT_FIXED_STEP,
            dropped_steps: 0,
        }
    }

    /// Accumulate `elapsed_time` and return how many fixed sub-steps to run.
    ///
    /// Frames yielding at least one step snapshot kinematic motion over the
    /// whole clamped span and apply external forces once. Frames yielding
    /// none publish the current (unstepped) transforms instead.
    ///
    /// # Panics
    ///
    /// If `max_sub_steps` is zero. Variable-timestep stepping is not supported.
    pub fn pre_simulation(&mut self, elapsed_time: f64, max_sub_steps: u32, fixed_step: f64) -> u32 {
        assert!(max_sub_steps > 0, "max_sub_steps must be positive: variable timestep is not supported");
        debug_assert!(fixed_step > 0.0, "fixed_step must be positive, got {fixed_step}");
        debug_assert!(
            elapsed_time.is_finite() && elapsed_time >= 0.0,
            "elapsed_time must be finite and non-negative, got {elapsed_time}"
        );

        self.fixed_step = fixed_step;
        self.leftover_time += elapsed_time;

        let mut raw_steps: u64 = 0;
        if self.leftover_time >= fixed_step {
            raw_steps = (self.leftover_time / fixed_step).floor() as u64;
            self.leftover_time -= raw_steps as f64 * fixed_step;
            // The division can round across an integer boundary either way.
            if self.leftover_time >= fixed_step {
                self.leftover_time -= fixed_step;
                raw_steps += 1;
            }
            self.leftover_time = self.leftover_time.max(0.0);
        }

        if raw_steps == 0 {
            log::trace!("frame: no sub-step, leftover={:.6}s", self.leftover_time);
            self.engine.synchronize_external_state();
            return 0;
        }

        let clamped = raw_steps.min(max_sub_steps as u64) as u32;
        if raw_steps > clamped as u64 {
            let dropped = raw_steps - clamped as u64;
            self.dropped_steps += dropped;
            log::debug!(
                "simulation behind wall clock: dropping {} of {} sub-steps",
                dropped,
                raw_steps
            );
        }
        log::trace!(
            "frame: {} sub-step(s) of {:.6}s, leftover={:.6}s",
            clamped,
            fixed_step,
            self.leftover_time
        );

        self.engine.snapshot_kinematic_state(fixed_step * clamped as f64);
        self.engine.apply_external_forces();
        clamped
    }

    /// Simulated timestamp of sub-step `step_index` out of `clamped_steps`.
    ///
    /// Sub-steps are laid out backwards from `timeline_now - leftover_time`:
    /// the last sub-step lands there, earlier ones one fixed step apart.
    pub fn calc_sim_time(&self, timeline_now: f64, step_index: u32, clamped_steps: u32) -> f64 {
        let steps_back = clamped_steps as f64 - 1.0 - step_index as f64;
        timeline_now - self.leftover_time - steps_back * self.fixed_step
    }

    /// Advance the engine by one fixed step and publish the result.
    ///
    /// `sim_time` does not affect integration; it is the caller's timestamp
    /// for this sub-step.
    pub fn single_step_simulation(&mut self, sim_time: f64) {
        log::trace!("sub-step at t={:.6}s", sim_time);
        self.engine.advance_one_step(self.fixed_step);
        self.engine.synchronize_external_state();
    }

    /// Clear forces accumulated for this frame. Call once after the last sub-step.
    pub fn post_simulation(&mut self) {
        self.engine.clear_forces();
    }
}

impl<E> FixedStepScheduler<E> {
    /// Carried-over time below one fixed step.
    pub fn leftover_time(&self) -> f64 {
        self.leftover_time
    }

    /// The fixed step size in use.
    pub fn fixed_step(&self) -> f64 {
        self.fixed_step
    }

    /// Interpolation factor between the last two sub-steps, in `[0, 1)`.
    pub fn alpha(&self) -> f64 {
        self.leftover_time / self.fixed_step
    }

    /// Total whole steps dropped by clamping.
    pub fn dropped_steps(&self) -> u64 {
        self.dropped_steps
    }

    /// Forget any accumulated time, e.g. after resuming from a pause.
    pub fn reset(&mut self) {
        self.leftover_time = 0.0;
        self.dropped_steps = 0;
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut E {
        &mut self.engine
    }

    pub fn into_engine(self) -> E {
        self.engine
    }
}
