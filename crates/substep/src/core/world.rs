use glam::Vec2;

use crate::api::config::StepConfig;
use crate::api::simulation::SteppedSimulation;
use crate::api::types::EntityId;
use crate::bridge::transforms::TransformBuffer;
use crate::components::entity::Entity;
use crate::core::physics::{BodyDesc, ColliderMaterial, CollisionPair, PhysicsWorld};
use crate::core::scene::Scene;

/// rapier-backed simulation world: the physics pipeline plus the scene of
/// entities its body transforms are published to.
pub struct DynamicsWorld {
    physics: PhysicsWorld,
    scene: Scene,
    next_id: u32,
    /// Collision pairs from every sub-step since the last drain.
    collision_events: Vec<CollisionPair>,
}

impl DynamicsWorld {
    pub fn new(gravity: Vec2) -> Self {
        Self {
            physics: PhysicsWorld::new(gravity),
            scene: Scene::new(),
            next_id: 1,
            collision_events: Vec::new(),
        }
    }

    /// Create a world whose gravity comes from the stepping configuration.
    pub fn from_config(config: &StepConfig) -> Self {
        Self::new(config.gravity_vec())
    }

    pub fn physics(&self) -> &PhysicsWorld {
        &self.physics
    }

    pub fn gravity(&self) -> Vec2 {
        self.physics.gravity()
    }

    /// Change gravity. Takes effect on the next stepping frame.
    pub fn set_gravity(&mut self, gravity: Vec2) {
        self.physics.set_gravity(gravity);
    }

    /// Generate the next unique entity ID.
    pub fn next_id(&mut self) -> EntityId {
        let id = EntityId(self.next_id);
        self.next_id += 1;
        id
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    /// Spawn an entity with a physics body. The published pose starts at the body's pose.
    pub fn spawn_with_body(
        &mut self,
        entity: Entity,
        desc: BodyDesc,
        material: ColliderMaterial,
    ) -> EntityId {
        let id = entity.id;
        let body = self.physics.create_body(id, &desc, material);
        let entity = entity
            .with_pos(desc.position)
            .with_rotation(desc.rotation)
            .with_body(body);
        self.scene.spawn(entity);
        id
    }

    /// Despawn an entity, removing its physics body if present.
    pub fn despawn(&mut self, id: EntityId) -> Option<Entity> {
        let entity = self.scene.despawn(id)?;
        if let Some(body) = &entity.body {
            self.physics.remove_body(body);
        }
        Some(entity)
    }

    /// Add a force to an entity's body. Cleared after the next stepping frame.
    pub fn apply_force(&mut self, id: EntityId, force: Vec2) {
        if let Some(body) = self.scene.get(id).and_then(|e| e.body) {
            self.physics.apply_force(&body, force);
        }
    }

    pub fn apply_impulse(&mut self, id: EntityId, impulse: Vec2) {
        if let Some(body) = self.scene.get(id).and_then(|e| e.body) {
            self.physics.apply_impulse(&body, impulse);
        }
    }

    pub fn set_velocity(&mut self, id: EntityId, vel: Vec2) {
        if let Some(body) = self.scene.get(id).and_then(|e| e.body) {
            self.physics.set_velocity(&body, vel);
        }
    }

    pub fn velocity(&self, id: EntityId) -> Vec2 {
        self.scene
            .get(id)
            .and_then(|e| e.body.as_ref())
            .map(|body| self.physics.velocity(body))
            .unwrap_or(Vec2::ZERO)
    }

    pub fn angular_velocity(&self, id: EntityId) -> f32 {
        self.scene
            .get(id)
            .and_then(|e| e.body.as_ref())
            .map(|body| self.physics.angular_velocity(body))
            .unwrap_or(0.0)
    }

    /// Move a position-based kinematic entity to `pos` on the next sub-step.
    pub fn set_kinematic_position(&mut self, id: EntityId, pos: Vec2, rotation: f32) {
        if let Some(body) = self.scene.get(id).and_then(|e| e.body) {
            self.physics.set_kinematic_position(&body, pos, rotation);
        }
    }

    /// Pose a kinematic entity should reach by the end of the next stepping frame.
    pub fn set_kinematic_target(&mut self, id: EntityId, pos: Vec2, rotation: f32) {
        if let Some(body) = self.scene.get(id).and_then(|e| e.body) {
            self.physics.set_kinematic_target(&body, pos, rotation);
        }
    }

    /// Take the collision pairs gathered since the last call.
    pub fn drain_collisions(&mut self) -> Vec<CollisionPair> {
        std::mem::take(&mut self.collision_events)
    }

    /// Write the published transforms of all active simulated entities into `buffer`.
    pub fn publish_transforms(&self, buffer: &mut TransformBuffer) {
        buffer.rebuild(self.scene.iter());
    }
}

impl Default for DynamicsWorld {
    fn default() -> Self {
        Self::new(Vec2::ZERO)
    }
}

impl SteppedSimulation for DynamicsWorld {
    fn advance_one_step(&mut self, dt: f64) {
        self.physics.step_into(dt as f32, &mut self.collision_events);
    }

    fn synchronize_external_state(&mut self) {
        for entity in self.scene.iter_mut() {
            if let Some(body) = &entity.body {
                let (pos, rot) = self.physics.body_position(body);
                entity.pos = pos;
                entity.rotation = rot;
            }
        }
    }

    fn apply_external_forces(&mut self) {
        self.physics.apply_gravity();
    }

    fn snapshot_kinematic_state(&mut self, span: f64) {
        self.physics.save_kinematic_state(span as f32);
    }

    fn clear_forces(&mut self) {
        self.physics.reset_forces();
    }
}

#[cfg(test)]
mod tests {
    use std::num::NonZeroU32;

    use super::*;
    use crate::api::runner::SimulationRunner;
    use crate::core::physics::ColliderDesc;

    const DT: f64 = 1.0 / 60.0;

    fn spawn_ball(world: &mut DynamicsWorld, desc: BodyDesc) -> EntityId {
        let id = world.next_id();
        world.spawn_with_body(Entity::new(id), desc, ColliderMaterial::default())
    }

    #[test]
    fn spawn_with_body_creates_entity_and_physics() {
        let mut world = DynamicsWorld::default();
        let id = spawn_ball(
            &mut world,
            BodyDesc::dynamic(ColliderDesc::Ball { radius: 10.0 }).with_position(Vec2::new(100.0, 200.0)),
        );

        assert_eq!(world.scene().len(), 1);
        assert_eq!(world.physics().body_count(), 1);
        let entity = world.scene().get(id).unwrap();
        assert!(entity.body.is_some());
        assert_eq!(entity.pos, Vec2::new(100.0, 200.0));
    }

    #[test]
    fn despawn_cleans_up_physics() {
        let mut world = DynamicsWorld::default();
        let id = spawn_ball(&mut world, BodyDesc::dynamic(ColliderDesc::Ball { radius: 10.0 }));
        assert!(world.despawn(id).is_some());
        assert_eq!(world.scene().len(), 0);
        assert_eq!(world.physics().body_count(), 0);
        assert!(world.despawn(id).is_none());
    }

    #[test]
    fn sync_publishes_body_pose() {
        let mut world = DynamicsWorld::default();
        let id = spawn_ball(&mut world, BodyDesc::dynamic(ColliderDesc::Ball { radius: 5.0 }));
        world.set_velocity(id, Vec2::new(60.0, 0.0));

        world.advance_one_step(DT);
        // Not published until synchronized.
        assert_eq!(world.scene().get(id).unwrap().pos, Vec2::ZERO);

        world.synchronize_external_state();
        let pos = world.scene().get(id).unwrap().pos;
        assert!((pos.x - 1.0).abs() < 1e-3, "x={}", pos.x);
    }

    #[test]
    fn runner_drops_body_under_gravity() {
        let mut world = DynamicsWorld::new(Vec2::new(0.0, 100.0));
        let id = spawn_ball(&mut world, BodyDesc::dynamic(ColliderDesc::Ball { radius: 5.0 }));

        let mut runner = SimulationRunner::new(world, StepConfig::default());
        for _ in 0..30 {
            runner.tick(DT);
        }

        let entity = runner.engine().scene().get(id).unwrap();
        assert!(entity.pos.y > 0.0, "Entity should have moved down: y={}", entity.pos.y);
    }

    #[test]
    fn config_gravity_drives_world() {
        let config = StepConfig::default().with_gravity(Vec2::new(0.0, 100.0));
        let mut world = DynamicsWorld::from_config(&config);
        assert_eq!(world.gravity(), Vec2::new(0.0, 100.0));
        let id = spawn_ball(&mut world, BodyDesc::dynamic(ColliderDesc::Ball { radius: 5.0 }));

        let mut runner = SimulationRunner::new(world, config);
        for _ in 0..30 {
            runner.tick(DT);
        }

        let entity = runner.engine().scene().get(id).unwrap();
        assert!(entity.pos.y > 0.0, "config gravity should pull down: y={}", entity.pos.y);
    }

    #[test]
    fn set_gravity_applies_from_next_frame() {
        let mut world = DynamicsWorld::default();
        let id = spawn_ball(&mut world, BodyDesc::dynamic(ColliderDesc::Ball { radius: 5.0 }));
        let mut runner = SimulationRunner::new(world, StepConfig::default());

        runner.tick(DT);
        assert_eq!(runner.engine().velocity(id), Vec2::ZERO);

        runner.engine_mut().set_gravity(Vec2::new(-50.0, 0.0));
        for _ in 0..5 {
            runner.tick(DT);
        }
        assert!(runner.engine().velocity(id).x < 0.0);
    }

    #[test]
    fn position_kinematic_entity_lands_on_next_sub_step() {
        let mut world = DynamicsWorld::default();
        let id = spawn_ball(
            &mut world,
            BodyDesc::kinematic_position_based(ColliderDesc::Ball { radius: 5.0 }),
        );
        let mut runner = SimulationRunner::new(world, StepConfig::default());

        runner.engine_mut().set_kinematic_position(id, Vec2::new(7.0, -2.0), 0.25);
        assert_eq!(runner.tick(DT), 1);

        let entity = runner.engine().scene().get(id).unwrap();
        assert!((entity.pos - Vec2::new(7.0, -2.0)).length() < 1e-4, "pos={:?}", entity.pos);
        assert!((entity.rotation - 0.25).abs() < 1e-4);
    }

    #[test]
    fn forces_cleared_after_stepping_frame() {
        let mut world = DynamicsWorld::default();
        let id = spawn_ball(&mut world, BodyDesc::dynamic(ColliderDesc::Ball { radius: 5.0 }));
        let config = StepConfig::default().with_max_sub_steps(NonZeroU32::new(2).unwrap());
        let mut runner = SimulationRunner::new(world, config);

        runner.engine_mut().apply_force(id, Vec2::new(500.0, 0.0));
        assert_eq!(runner.tick(DT * 1.5), 1);
        let after_push = runner.engine().velocity(id);
        assert!(after_push.x > 0.0);

        // Force was cleared by post-simulation, so velocity stays constant.
        runner.tick(DT);
        let coasting = runner.engine().velocity(id);
        assert!((coasting.x - after_push.x).abs() < 1e-3);
    }

    #[test]
    fn force_survives_zero_step_frame() {
        let mut world = DynamicsWorld::default();
        let id = spawn_ball(&mut world, BodyDesc::dynamic(ColliderDesc::Ball { radius: 5.0 }));
        let mut runner = SimulationRunner::new(world, StepConfig::default());

        runner.engine_mut().apply_force(id, Vec2::new(500.0, 0.0));
        assert_eq!(runner.tick(DT * 0.5), 0);
        assert_eq!(runner.engine().velocity(id), Vec2::ZERO);

        assert_eq!(runner.tick(DT * 0.75), 1);
        assert!(runner.engine().velocity(id).x > 0.0);
    }

    #[test]
    fn kinematic_entity_reaches_target_within_frame() {
        let mut world = DynamicsWorld::default();
        let id = spawn_ball(&mut world, BodyDesc::kinematic(ColliderDesc::Ball { radius: 5.0 }));
        let mut runner = SimulationRunner::new(world, StepConfig::default());

        runner.engine_mut().set_kinematic_target(id, Vec2::new(3.0, 0.0), 0.0);
        assert_eq!(runner.tick(DT * 3.5), 3);

        let pos = runner.engine().scene().get(id).unwrap().pos;
        assert!((pos.x - 3.0).abs() < 1e-2, "x={}", pos.x);
    }

    #[test]
    fn kinematic_target_turns_entity() {
        let mut world = DynamicsWorld::default();
        let id = spawn_ball(&mut world, BodyDesc::kinematic(ColliderDesc::Ball { radius: 5.0 }));
        let mut runner = SimulationRunner::new(world, StepConfig::default());

        runner.engine_mut().set_kinematic_target(id, Vec2::ZERO, 0.5);
        runner.tick(DT * 2.5);
        // Two sub-steps: 0.5 rad over 2/60 s.
        assert!((runner.engine().angular_velocity(id) - 15.0).abs() < 1e-2);
    }

    #[test]
    fn collisions_accumulate_across_sub_steps() {
        let mut world = DynamicsWorld::default();
        spawn_ball(
            &mut world,
            BodyDesc::dynamic(ColliderDesc::Ball { radius: 10.0 }).with_velocity(Vec2::new(200.0, 0.0)),
        );
        spawn_ball(
            &mut world,
            BodyDesc::dynamic(ColliderDesc::Ball { radius: 10.0 })
                .with_position(Vec2::new(30.0, 0.0))
                .with_velocity(Vec2::new(-200.0, 0.0)),
        );
        let mut runner = SimulationRunner::new(world, StepConfig::default());

        // Ten sub-steps in one frame: contact begins inside the frame.
        runner.tick(DT * 10.0);
        let events = runner.engine_mut().drain_collisions();
        assert!(events.iter().any(|e| e.started));
        assert!(runner.engine_mut().drain_collisions().is_empty());
    }

    #[test]
    fn publish_transforms_exports_simulated_entities() {
        let mut world = DynamicsWorld::default();
        let id = spawn_ball(
            &mut world,
            BodyDesc::dynamic(ColliderDesc::Ball { radius: 5.0 }).with_position(Vec2::new(4.0, 2.0)),
        );
        let mut buffer = TransformBuffer::new();
        world.publish_transforms(&mut buffer);
        assert_eq!(buffer.len(), 1);
        assert_eq!(buffer.records()[0].entity, id.0);
        assert_eq!(buffer.records()[0].x, 4.0);
    }
}
