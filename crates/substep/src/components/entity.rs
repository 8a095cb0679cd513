use glam::Vec2;
use crate::api::types::EntityId;
#[cfg(feature = "physics")]
use crate::core::physics::PhysicsBody;

/// Externally visible state of a simulated object.
///
/// `pos` and `rotation` are what the rest of the application reads. The
/// physics engine writes them on every synchronization; between
/// synchronizations they hold the last published pose.
#[derive(Debug, Clone)]
pub struct Entity {
    pub id: EntityId,
    /// Free-form name for lookups.
    pub tag: String,
    /// Inactive entities are skipped by export and recording.
    pub active: bool,
    /// Last published position in world space.
    pub pos: Vec2,
    /// Last published rotation in radians.
    pub rotation: f32,
    #[cfg(feature = "physics")]
    pub body: Option<PhysicsBody>,
}

impl Entity {
    pub fn new(id: EntityId) -> Self {
        Self {
            id,
            tag: String::new(),
            active: true,
            pos: Vec2::ZERO,
            rotation: 0.0,
            #[cfg(feature = "physics")]
            body: None,
        }
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = tag.into();
        self
    }

    pub fn with_pos(mut self, pos: Vec2) -> Self {
        self.pos = pos;
        self
    }

    pub fn with_rotation(mut self, rotation: f32) -> Self {
        self.rotation = rotation;
        self
    }

    pub fn with_active(mut self, active: bool) -> Self {
        self.active = active;
        self
    }

    #[cfg(feature = "physics")]
    pub fn with_body(mut self, body: PhysicsBody) -> Self {
        self.body = Some(body);
        self
    }

    /// Whether this entity is driven by the physics engine.
    #[cfg(feature = "physics")]
    pub fn is_simulated(&self) -> bool {
        self.body.is_some()
    }

    #[cfg(not(feature = "physics"))]
    pub fn is_simulated(&self) -> bool {
        false
    }
}
