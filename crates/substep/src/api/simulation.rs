/// The capability set a physics engine exposes to the fixed-step scheduler.
///
/// The scheduler never integrates anything itself; it decides *when* and
/// *how often* these are called. Implementations own the bodies, the solver
/// and the collision pipeline.
pub trait SteppedSimulation {
    /// Integrate every body by exactly `dt` seconds of simulated time.
    fn advance_one_step(&mut self, dt: f64);

    /// Copy internal body transforms out to the externally visible ones.
    fn synchronize_external_state(&mut self);

    /// Apply global forces (gravity) to every active body, once.
    fn apply_external_forces(&mut self);

    /// Precompute kinematic (scripted) body motion over the next `span` seconds.
    fn snapshot_kinematic_state(&mut self, span: f64);

    /// Reset accumulated force and torque on every body.
    fn clear_forces(&mut self);
}

impl<T: SteppedSimulation + ?Sized> SteppedSimulation for &mut T {
    fn advance_one_step(&mut self, dt: f64) {
        (**self).advance_one_step(dt);
    }

    fn synchronize_external_state(&mut self) {
        (**self).synchronize_external_state();
    }

    fn apply_external_forces(&mut self) {
        (**self).apply_external_forces();
    }

    fn snapshot_kinematic_state(&mut self, span: f64) {
        (**self).snapshot_kinematic_state(span);
    }

    fn clear_forces(&mut self) {
        (**self).clear_forces();
    }
}

impl<T: SteppedSimulation + ?Sized> SteppedSimulation for Box<T> {
    fn advance_one_step(&mut self, dt: f64) {
        (**self).advance_one_step(dt);
    }

    fn synchronize_external_state(&mut self) {
        (**self).synchronize_external_state();
    }

    fn apply_external_forces(&mut self) {
        (**self).apply_external_forces();
    }

    fn snapshot_kinematic_state(&mut self, span: f64) {
        (**self).snapshot_kinematic_state(span);
    }

    fn clear_forces(&mut self) {
        (**self).clear_forces();
    }
}
