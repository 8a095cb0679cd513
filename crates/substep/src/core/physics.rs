use std::collections::HashMap;
use std::f32::consts::{PI, TAU};
use std::sync::Mutex;

use glam::Vec2;
use rapier2d::prelude::*;

use crate::api::types::EntityId;

// ---------------------------------------------------------------------------
// Conversion helpers (private): glam to nalgebra and back
// ---------------------------------------------------------------------------

fn vec2_to_na(v: Vec2) -> nalgebra::Vector2<f32> {
    nalgebra::Vector2::new(v.x, v.y)
}

fn na_to_vec2(v: &nalgebra::Vector2<f32>) -> Vec2 {
    Vec2::new(v.x, v.y)
}

fn na_iso_to_pos_rot(iso: &nalgebra::Isometry2<f32>) -> (Vec2, f32) {
    let pos = Vec2::new(iso.translation.x, iso.translation.y);
    let rot = iso.rotation.angle();
    (pos, rot)
}

/// Wrap an angle difference into `[-PI, PI)` so kinematic bodies turn the short way.
fn shortest_angle(delta: f32) -> f32 {
    (delta + PI).rem_euclid(TAU) - PI
}

// ---------------------------------------------------------------------------
// Public types
// ---------------------------------------------------------------------------

/// The kind of rigid body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyType {
    Dynamic,
    Fixed,
    /// Moved by setting the next pose directly, once per sub-step.
    KinematicPositionBased,
    /// Moved by velocity; follows targets set with `set_kinematic_target`.
    KinematicVelocityBased,
}

impl BodyType {
    fn to_rapier(self) -> RigidBodyType {
        match self {
            BodyType::Dynamic => RigidBodyType::Dynamic,
            BodyType::Fixed => RigidBodyType::Fixed,
            BodyType::KinematicPositionBased => RigidBodyType::KinematicPositionBased,
            BodyType::KinematicVelocityBased => RigidBodyType::KinematicVelocityBased,
        }
    }
}

/// Shape description for a collider.
#[derive(Debug, Clone, Copy)]
pub enum ColliderDesc {
    Ball { radius: f32 },
    Cuboid { half_width: f32, half_height: f32 },
}

impl ColliderDesc {
    fn build_collider(&self) -> ColliderBuilder {
        match *self {
            ColliderDesc::Ball { radius } => ColliderBuilder::ball(radius),
            ColliderDesc::Cuboid { half_width, half_height } => {
                ColliderBuilder::cuboid(half_width, half_height)
            }
        }
    }
}

/// Physical material properties for a collider.
#[derive(Debug, Clone, Copy)]
pub struct ColliderMaterial {
    pub restitution: f32,
    pub friction: f32,
    pub density: f32,
}

impl Default for ColliderMaterial {
    fn default() -> Self {
        Self {
            restitution: 0.3,
            friction: 0.5,
            density: 1.0,
        }
    }
}

/// Description of a rigid body before creation.
#[derive(Debug, Clone)]
pub struct BodyDesc {
    pub body_type: BodyType,
    pub position: Vec2,
    pub rotation: f32,
    pub velocity: Vec2,
    /// Multiplier on the world gravity force. Ignored for non-dynamic bodies.
    pub gravity_scale: f32,
    pub collider: ColliderDesc,
}

impl BodyDesc {
    pub fn dynamic(collider: ColliderDesc) -> Self {
        Self::of_type(BodyType::Dynamic, collider)
    }

    pub fn fixed(collider: ColliderDesc) -> Self {
        Self::of_type(BodyType::Fixed, collider).with_gravity_scale(0.0)
    }

    /// A velocity-based kinematic body, driven by kinematic targets.
    pub fn kinematic(collider: ColliderDesc) -> Self {
        Self::of_type(BodyType::KinematicVelocityBased, collider).with_gravity_scale(0.0)
    }

    /// A position-based kinematic body, moved with `set_kinematic_position`.
    pub fn kinematic_position_based(collider: ColliderDesc) -> Self {
        Self::of_type(BodyType::KinematicPositionBased, collider).with_gravity_scale(0.0)
    }

    pub fn of_type(body_type: BodyType, collider: ColliderDesc) -> Self {
        Self {
            body_type,
            position: Vec2::ZERO,
            rotation: 0.0,
            velocity: Vec2::ZERO,
            gravity_scale: 1.0,
            collider,
        }
    }

    pub fn with_position(mut self, pos: Vec2) -> Self {
        self.position = pos;
        self
    }

    pub fn with_rotation(mut self, rotation: f32) -> Self {
        self.rotation = rotation;
        self
    }

    pub fn with_velocity(mut self, vel: Vec2) -> Self {
        self.velocity = vel;
        self
    }

    pub fn with_gravity_scale(mut self, scale: f32) -> Self {
        self.gravity_scale = scale;
        self
    }
}

/// Handle pair stored on an Entity, referencing rapier internals.
#[derive(Debug, Clone, Copy)]
pub struct PhysicsBody {
    pub body_handle: RigidBodyHandle,
    pub collider_handle: ColliderHandle,
}

/// A collision event between two entities.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CollisionPair {
    pub entity_a: EntityId,
    pub entity_b: EntityId,
    /// `true` when the collision just started, `false` when it ended.
    pub started: bool,
}

/// Pose a kinematic body should reach by the end of the next stepping frame.
#[derive(Debug, Clone, Copy, PartialEq)]
struct KinematicTarget {
    position: Vec2,
    rotation: f32,
}

// ---------------------------------------------------------------------------
// Event collector
// ---------------------------------------------------------------------------

struct DirectEventCollector {
    collisions: Mutex<Vec<CollisionEvent>>,
}

impl DirectEventCollector {
    fn new() -> Self {
        Self {
            collisions: Mutex::new(Vec::new()),
        }
    }

    fn drain_collisions(&self) -> Vec<CollisionEvent> {
        let mut guard = self.collisions.lock().unwrap_or_else(|e| e.into_inner());
        std::mem::take(&mut *guard)
    }
}

impl EventHandler for DirectEventCollector {
    fn handle_collision_event(
        &self,
        _bodies: &RigidBodySet,
        _colliders: &ColliderSet,
        event: CollisionEvent,
        _contact_pair: Option<&ContactPair>,
    ) {
        self.collisions
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(event);
    }

    fn handle_contact_force_event(
        &self,
        _dt: f32,
        _bodies: &RigidBodySet,
        _colliders: &ColliderSet,
        _contact_pair: &ContactPair,
        _total_force_magnitude: f32,
    ) {
    }
}

// ---------------------------------------------------------------------------
// PhysicsWorld
// ---------------------------------------------------------------------------

/// rapier2d pipeline split into the primitive operations the scheduler drives.
///
/// The pipeline itself always runs with zero gravity: gravity is added as a
/// force by `apply_gravity` and removed by `reset_forces`, so it is applied
/// once per stepping frame instead of implicitly inside every step.
pub struct PhysicsWorld {
    gravity: Vec2,
    integration_parameters: IntegrationParameters,
    physics_pipeline: PhysicsPipeline,
    island_manager: IslandManager,
    broad_phase: DefaultBroadPhase,
    narrow_phase: NarrowPhase,
    bodies: RigidBodySet,
    colliders: ColliderSet,
    impulse_joints: ImpulseJointSet,
    multibody_joints: MultibodyJointSet,
    ccd_solver: CCDSolver,
    query_pipeline: QueryPipeline,
    event_collector: DirectEventCollector,
    kinematic_targets: HashMap<RigidBodyHandle, KinematicTarget>,
}

impl PhysicsWorld {
    /// Create a new physics world with the given gravity vector.
    /// For Y-down coordinate systems, use positive Y for downward gravity.
    pub fn new(gravity: Vec2) -> Self {
        Self {
            gravity,
            integration_parameters: IntegrationParameters::default(),
            physics_pipeline: PhysicsPipeline::new(),
            island_manager: IslandManager::new(),
            broad_phase: DefaultBroadPhase::new(),
            narrow_phase: NarrowPhase::new(),
            bodies: RigidBodySet::new(),
            colliders: ColliderSet::new(),
            impulse_joints: ImpulseJointSet::new(),
            multibody_joints: MultibodyJointSet::new(),
            ccd_solver: CCDSolver::new(),
            query_pipeline: QueryPipeline::new(),
            event_collector: DirectEventCollector::new(),
            kinematic_targets: HashMap::new(),
        }
    }

    pub fn gravity(&self) -> Vec2 {
        self.gravity
    }

    pub fn set_gravity(&mut self, gravity: Vec2) {
        self.gravity = gravity;
    }

    /// Create a rigid body + collider and return handles.
    /// The EntityId is stored in the body's `user_data` for collision lookups.
    pub fn create_body(
        &mut self,
        entity_id: EntityId,
        desc: &BodyDesc,
        material: ColliderMaterial,
    ) -> PhysicsBody {
        let rb = RigidBodyBuilder::new(desc.body_type.to_rapier())
            .translation(vec2_to_na(desc.position))
            .rotation(desc.rotation)
            .linvel(vec2_to_na(desc.velocity))
            .gravity_scale(desc.gravity_scale)
            .user_data(entity_id.0 as u128)
            .build();

        let body_handle = self.bodies.insert(rb);

        let collider = desc
            .collider
            .build_collider()
            .restitution(material.restitution)
            .friction(material.friction)
            .density(material.density)
            .active_events(ActiveEvents::COLLISION_EVENTS)
            .build();

        let collider_handle =
            self.colliders
                .insert_with_parent(collider, body_handle, &mut self.bodies);

        PhysicsBody {
            body_handle,
            collider_handle,
        }
    }

    /// Remove a body and all its colliders from the simulation.
    pub fn remove_body(&mut self, body: &PhysicsBody) {
        self.kinematic_targets.remove(&body.body_handle);
        self.bodies.remove(
            body.body_handle,
            &mut self.island_manager,
            &mut self.colliders,
            &mut self.impulse_joints,
            &mut self.multibody_joints,
            true,
        );
    }

    /// Integrate by `dt` seconds and append collision events to `collision_events`.
    pub fn step_into(&mut self, dt: f32, collision_events: &mut Vec<CollisionPair>) {
        self.integration_parameters.dt = dt;
        self.physics_pipeline.step(
            &nalgebra::Vector2::zeros(),
            &self.integration_parameters,
            &mut self.island_manager,
            &mut self.broad_phase,
            &mut self.narrow_phase,
            &mut self.bodies,
            &mut self.colliders,
            &mut self.impulse_joints,
            &mut self.multibody_joints,
            &mut self.ccd_solver,
            Some(&mut self.query_pipeline),
            &(),
            &self.event_collector,
        );

        // Resolve collider handles → body handles → entity IDs
        for event in self.event_collector.drain_collisions() {
            let (h1, h2, started) = match event {
                CollisionEvent::Started(h1, h2, _) => (h1, h2, true),
                CollisionEvent::Stopped(h1, h2, _) => (h1, h2, false),
            };

            let entity_a = self.collider_to_entity(h1);
            let entity_b = self.collider_to_entity(h2);

            if let (Some(a), Some(b)) = (entity_a, entity_b) {
                collision_events.push(CollisionPair {
                    entity_a: a,
                    entity_b: b,
                    started,
                });
            }
        }
    }

    /// Add `mass * gravity * gravity_scale` to every awake dynamic body.
    pub fn apply_gravity(&mut self) {
        let gravity = self.gravity;
        if gravity == Vec2::ZERO {
            return;
        }
        for (_, rb) in self.bodies.iter_mut() {
            if rb.is_dynamic() && !rb.is_sleeping() {
                let force = gravity * rb.mass() * rb.gravity_scale();
                rb.add_force(vec2_to_na(force), false);
            }
        }
    }

    /// Zero the accumulated force and torque of every body.
    pub fn reset_forces(&mut self) {
        for (_, rb) in self.bodies.iter_mut() {
            rb.reset_forces(false);
            rb.reset_torques(false);
        }
    }

    /// Set kinematic velocities so every targeted body arrives after `span` seconds.
    ///
    /// Velocity-based kinematic bodies without a target (or already on it)
    /// are brought to rest.
    pub fn save_kinematic_state(&mut self, span: f32) {
        if span <= 0.0 {
            return;
        }
        for (handle, rb) in self.bodies.iter_mut() {
            if rb.body_type() != RigidBodyType::KinematicVelocityBased {
                continue;
            }
            let (linvel, angvel) = match self.kinematic_targets.get(&handle) {
                Some(target) => {
                    let (pos, rot) = na_iso_to_pos_rot(rb.position());
                    (
                        (target.position - pos) / span,
                        shortest_angle(target.rotation - rot) / span,
                    )
                }
                None => (Vec2::ZERO, 0.0),
            };
            rb.set_linvel(vec2_to_na(linvel), true);
            rb.set_angvel(angvel, true);
        }
    }

    /// Pose a velocity-based kinematic body should reach over the next stepping frame.
    /// The target persists until replaced or the body is removed.
    pub fn set_kinematic_target(&mut self, body: &PhysicsBody, pos: Vec2, rotation: f32) {
        let Some(rb) = self.bodies.get(body.body_handle) else {
            return;
        };
        if rb.body_type() != RigidBodyType::KinematicVelocityBased {
            log::warn!(
                "kinematic target ignored: body {:?} is {:?}, not velocity-based kinematic",
                body.body_handle,
                rb.body_type()
            );
            return;
        }
        self.kinematic_targets.insert(
            body.body_handle,
            KinematicTarget {
                position: pos,
                rotation,
            },
        );
    }

    /// Set the next pose of a position-based kinematic body (applied on the next step).
    pub fn set_kinematic_position(&mut self, body: &PhysicsBody, pos: Vec2, rotation: f32) {
        if let Some(rb) = self.bodies.get_mut(body.body_handle) {
            rb.set_next_kinematic_position(nalgebra::Isometry2::new(vec2_to_na(pos), rotation));
        }
    }

    /// Add a force to a body. It persists until the next `reset_forces`.
    pub fn apply_force(&mut self, body: &PhysicsBody, force: Vec2) {
        if let Some(rb) = self.bodies.get_mut(body.body_handle) {
            rb.add_force(vec2_to_na(force), true);
        }
    }

    /// Apply an instantaneous impulse to a body.
    pub fn apply_impulse(&mut self, body: &PhysicsBody, impulse: Vec2) {
        if let Some(rb) = self.bodies.get_mut(body.body_handle) {
            rb.apply_impulse(vec2_to_na(impulse), true);
        }
    }

    pub fn set_velocity(&mut self, body: &PhysicsBody, vel: Vec2) {
        if let Some(rb) = self.bodies.get_mut(body.body_handle) {
            rb.set_linvel(vec2_to_na(vel), true);
        }
    }

    pub fn velocity(&self, body: &PhysicsBody) -> Vec2 {
        self.bodies
            .get(body.body_handle)
            .map(|rb| na_to_vec2(rb.linvel()))
            .unwrap_or(Vec2::ZERO)
    }

    pub fn angular_velocity(&self, body: &PhysicsBody) -> f32 {
        self.bodies
            .get(body.body_handle)
            .map(|rb| rb.angvel())
            .unwrap_or(0.0)
    }

    /// Accumulated user force on a body (gravity included once applied).
    pub fn accumulated_force(&self, body: &PhysicsBody) -> Vec2 {
        self.bodies
            .get(body.body_handle)
            .map(|rb| na_to_vec2(&rb.user_force()))
            .unwrap_or(Vec2::ZERO)
    }

    /// Current position and rotation of a body.
    pub fn body_position(&self, body: &PhysicsBody) -> (Vec2, f32) {
        self.bodies
            .get(body.body_handle)
            .map(|rb| na_iso_to_pos_rot(rb.position()))
            .unwrap_or((Vec2::ZERO, 0.0))
    }

    pub fn body_count(&self) -> usize {
        self.bodies.len()
    }

    fn collider_to_entity(&self, collider_handle: ColliderHandle) -> Option<EntityId> {
        let collider = self.colliders.get(collider_handle)?;
        let body_handle = collider.parent()?;
        let body = self.bodies.get(body_handle)?;
        Some(EntityId(body.user_data as u32))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
