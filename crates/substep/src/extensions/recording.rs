// extensions/recording.rs
//
// Per-sub-step pose history for interpolated playback.
// Feed it from `SimulationRunner::tick_with` using the sub-step timestamps.

use std::collections::{HashMap, VecDeque};
use std::f32::consts::{PI, TAU};

use glam::Vec2;

use crate::api::types::EntityId;
use crate::components::entity::Entity;

/// Default number of samples kept per entity.
pub const DEFAULT_HISTORY: usize = 64;

/// One recorded pose.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PoseSample {
    /// Simulated timestamp of the sub-step that produced this pose.
    pub time: f64,
    pub pos: Vec2,
    pub rotation: f32,
}

/// Bounded pose history per entity, queried by simulated time.
#[derive(Debug)]
pub struct MotionRecorder {
    capacity: usize,
    tracks: HashMap<EntityId, VecDeque<PoseSample>>,
    latest_time: Option<f64>,
}

impl MotionRecorder {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_HISTORY)
    }

    /// Keep at most `capacity` samples per entity (at least 2, to interpolate).
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(2),
            tracks: HashMap::new(),
            latest_time: None,
        }
    }

    /// Record the published pose of every active entity at `sim_time`.
    ///
    /// Samples must arrive in non-decreasing time order; an older sample
    /// than the newest recorded one is ignored.
    pub fn record<'a>(&mut self, sim_time: f64, entities: impl IntoIterator<Item = &'a Entity>) {
        if self.latest_time.is_some_and(|t| sim_time < t) {
            log::trace!("recording skipped: t={:.6}s is older than the newest sample", sim_time);
            return;
        }
        for entity in entities.into_iter().filter(|e| e.active) {
            let track = self.tracks.entry(entity.id).or_default();
            if track.len() == self.capacity {
                track.pop_front();
            }
            track.push_back(PoseSample {
                time: sim_time,
                pos: entity.pos,
                rotation: entity.rotation,
            });
        }
        self.latest_time = Some(sim_time);
    }

    /// Interpolated pose of `id` at `time`, clamped to the recorded range.
    pub fn pose_at(&self, id: EntityId, time: f64) -> Option<(Vec2, f32)> {
        let track = self.tracks.get(&id)?;
        let first = track.front()?;
        let last = track.back()?;
        if time <= first.time {
            return Some((first.pos, first.rotation));
        }
        if time >= last.time {
            return Some((last.pos, last.rotation));
        }

        // First sample strictly after `time`; its predecessor is at or before it.
        let next = track.partition_point(|s| s.time <= time);
        let a = &track[next - 1];
        let b = &track[next];
        let span = b.time - a.time;
        let t = if span > 0.0 { ((time - a.time) / span) as f32 } else { 1.0 };

        let delta = (b.rotation - a.rotation + PI).rem_euclid(TAU) - PI;
        Some((a.pos.lerp(b.pos, t), a.rotation + delta * t))
    }

    /// Timestamp of the newest recorded sample.
    pub fn latest_time(&self) -> Option<f64> {
        self.latest_time
    }

    pub fn sample_count(&self, id: EntityId) -> usize {
        self.tracks.get(&id).map_or(0, VecDeque::len)
    }

    /// Drop the history of one entity, e.g. after it is despawned.
    pub fn forget(&mut self, id: EntityId) {
        self.tracks.remove(&id);
    }

    pub fn clear(&mut self) {
        self.tracks.clear();
        self.latest_time = None;
    }
}

impl Default for MotionRecorder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(id: u32, x: f32, rotation: f32) -> Entity {
        Entity::new(EntityId(id))
            .with_pos(Vec2::new(x, 0.0))
            .with_rotation(rotation)
    }

    #[test]
    fn interpolates_between_samples() {
        let mut rec = MotionRecorder::new();
        rec.record(1.0, &[at(1, 0.0, 0.0)]);
        rec.record(2.0, &[at(1, 10.0, 1.0)]);

        let (pos, rot) = rec.pose_at(EntityId(1), 1.25).unwrap();
        assert!((pos.x - 2.5).abs() < 1e-5);
        assert!((rot - 0.25).abs() < 1e-5);
    }

    #[test]
    fn clamps_outside_recorded_range() {
        let mut rec = MotionRecorder::new();
        rec.record(1.0, &[at(1, 0.0, 0.0)]);
        rec.record(2.0, &[at(1, 10.0, 0.0)]);

        assert_eq!(rec.pose_at(EntityId(1), 0.0).unwrap().0.x, 0.0);
        assert_eq!(rec.pose_at(EntityId(1), 5.0).unwrap().0.x, 10.0);
        assert!(rec.pose_at(EntityId(2), 1.5).is_none());
    }

    #[test]
    fn rotation_takes_short_way_round() {
        let mut rec = MotionRecorder::new();
        rec.record(0.0, &[at(1, 0.0, 3.0)]);
        rec.record(1.0, &[at(1, 0.0, -3.0)]);

        // 3.0 → -3.0 is 0.283 rad across PI, not 6 rad back through zero.
        let (_, rot) = rec.pose_at(EntityId(1), 0.5).unwrap();
        assert!(rot.abs() > 3.0, "rot={rot}");
    }

    #[test]
    fn history_is_bounded() {
        let mut rec = MotionRecorder::with_capacity(3);
        for i in 0..10 {
            rec.record(i as f64, &[at(1, i as f32, 0.0)]);
        }
        assert_eq!(rec.sample_count(EntityId(1)), 3);
        assert_eq!(rec.pose_at(EntityId(1), 0.0).unwrap().0.x, 7.0);
        assert_eq!(rec.latest_time(), Some(9.0));
    }

    #[test]
    fn ignores_inactive_and_out_of_order_samples() {
        let mut rec = MotionRecorder::new();
        rec.record(1.0, &[at(1, 0.0, 0.0), at(2, 0.0, 0.0).with_active(false)]);
        rec.record(0.5, &[at(1, 99.0, 0.0)]);

        assert_eq!(rec.sample_count(EntityId(1)), 1);
        assert_eq!(rec.sample_count(EntityId(2)), 0);
    }

    #[test]
    fn forget_and_clear() {
        let mut rec = MotionRecorder::new();
        rec.record(1.0, &[at(1, 0.0, 0.0), at(2, 0.0, 0.0)]);
        rec.forget(EntityId(1));
        assert_eq!(rec.sample_count(EntityId(1)), 0);
        assert_eq!(rec.sample_count(EntityId(2)), 1);
        rec.clear();
        assert_eq!(rec.latest_time(), None);
    }

    #[cfg(feature = "physics")]
    #[test]
    fn records_each_sub_step_from_runner() {
        use crate::api::config::StepConfig;
        use crate::api::runner::SimulationRunner;
        use crate::core::physics::{BodyDesc, ColliderDesc, ColliderMaterial};
        use crate::core::world::DynamicsWorld;

        let mut world = DynamicsWorld::default();
        let id = world.next_id();
        world.spawn_with_body(
            Entity::new(id),
            BodyDesc::dynamic(ColliderDesc::Ball { radius: 1.0 }).with_velocity(Vec2::new(60.0, 0.0)),
            ColliderMaterial::default(),
        );

        let dt = 1.0 / 60.0;
        let mut runner = SimulationRunner::new(world, StepConfig::default().with_fixed_dt(dt));
        let mut rec = MotionRecorder::new();
        let steps = runner.tick_with(dt * 4.5, |t, world| rec.record(t, world.scene().iter()));

        assert_eq!(steps, 4);
        assert_eq!(rec.sample_count(id), 4);
        let newest = rec.latest_time().unwrap();
        assert!((newest - (runner.timeline() - runner.scheduler().leftover_time())).abs() < 1e-9);

        // Half-way between the first two sub-steps the ball is ~1.5 units along.
        let first = newest - 3.0 * dt;
        let (pos, _) = rec.pose_at(id, first + 0.5 * dt).unwrap();
        assert!((pos.x - 1.5).abs() < 1e-2, "x={}", pos.x);
    }
}
