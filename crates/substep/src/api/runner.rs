use crate::api::config::StepConfig;
use crate::api::simulation::SteppedSimulation;
use crate::core::time::FixedStepScheduler;

/// Time constant, in seconds, of the smoothed physics rate.
pub const RATE_SMOOTHING_PERIOD: f64 = 1.0;

/// Frame driver that wires a stepped simulation to the fixed-step scheduler.
///
/// Call `tick` (or `tick_with`) once per rendered frame with the wall-clock
/// delta. The runner keeps the timeline used to timestamp sub-steps.
pub struct SimulationRunner<E: SteppedSimulation> {
    scheduler: FixedStepScheduler<E>,
    config: StepConfig,
    /// Wall-clock time accumulated over all frames, in seconds.
    timeline: f64,
    frame_count: u64,
    paused: bool,
    /// Exponentially smoothed sub-steps per wall-clock second.
    physics_rate: f64,
}

impl<E: SteppedSimulation> SimulationRunner<E> {
    pub fn new(engine: E, config: StepConfig) -> Self {
        log::info!(
            "simulation runner: fixed_dt={:.6}s, max_sub_steps={}",
            config.fixed_dt,
            config.max_sub_steps
        );
        Self {
            scheduler: FixedStepScheduler::new(engine),
            config,
            timeline: 0.0,
            frame_count: 0,
            paused: false,
            physics_rate: 0.0,
        }
    }

    /// Stop stepping. Frames ticked while paused do nothing.
    pub fn pause(&mut self) {
        if !self.paused {
            log::debug!("simulation paused at t={:.6}s", self.timeline);
        }
        self.paused = true;
    }

    /// Continue stepping. Time accumulated before the pause is discarded.
    pub fn resume(&mut self) {
        if self.paused {
            log::debug!("simulation resumed at t={:.6}s", self.timeline);
            self.scheduler.reset();
        }
        self.paused = false;
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Run one frame. Returns the number of sub-steps executed.
    pub fn tick(&mut self, dt: f64) -> u32 {
        self.tick_with(dt, |_, _| {})
    }

    /// Run one frame, calling `on_sub_step(sim_time, engine)` after each sub-step.
    ///
    /// While paused this returns 0 without touching the engine, and the
    /// timeline does not advance.
    pub fn tick_with<F>(&mut self, dt: f64, mut on_sub_step: F) -> u32
    where
        F: FnMut(f64, &mut E),
    {
        if self.paused {
            return 0;
        }
        self.timeline += dt;
        self.frame_count += 1;

        let steps = self.scheduler.pre_simulation(
            dt,
            self.config.max_sub_steps.get(),
            self.config.fixed_dt,
        );
        self.update_physics_rate(dt, steps);
        if steps == 0 {
            return 0;
        }

        for step in 0..steps {
            let sim_time = self.scheduler.calc_sim_time(self.timeline, step, steps);
            self.scheduler.single_step_simulation(sim_time);
            on_sub_step(sim_time, self.scheduler.engine_mut());
        }

        self.scheduler.post_simulation();
        steps
    }

    fn update_physics_rate(&mut self, dt: f64, steps: u32) {
        if dt <= 0.0 {
            return;
        }
        let keep = (-dt / RATE_SMOOTHING_PERIOD).exp();
        self.physics_rate = (1.0 - keep) * (steps as f64 / dt) + keep * self.physics_rate;
    }

    /// Smoothed number of sub-steps executed per wall-clock second.
    /// Starts at zero and converges over roughly `RATE_SMOOTHING_PERIOD`.
    pub fn physics_rate(&self) -> f64 {
        self.physics_rate
    }

    /// Wall-clock time fed to the runner so far (paused frames excluded).
    pub fn timeline(&self) -> f64 {
        self.timeline
    }

    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    /// Render interpolation factor between the last two sub-steps.
    pub fn alpha(&self) -> f64 {
        self.scheduler.alpha()
    }

    pub fn config(&self) -> &StepConfig {
        &self.config
    }

    pub fn scheduler(&self) -> &FixedStepScheduler<E> {
        &self.scheduler
    }

    pub fn engine(&self) -> &E {
        self.scheduler.engine()
    }

    pub fn engine_mut(&mut self) -> &mut E {
        self.scheduler.engine_mut()
    }

    pub fn into_engine(self) -> E {
        self.scheduler.into_engine()
    }
}
