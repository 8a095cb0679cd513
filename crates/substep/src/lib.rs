pub mod api;
pub mod bridge;
pub mod components;
pub mod core;
pub mod extensions;

// Re-export key types at crate root for convenience
pub use api::config::StepConfig;
pub use api::runner::SimulationRunner;
pub use api::simulation::SteppedSimulation;
pub use api::types::EntityId;
pub use bridge::transforms::{TransformBuffer, TransformRecord};
pub use components::entity::Entity;
pub use core::scene::Scene;
pub use core::time::{FixedStepScheduler, DEFAULT_FIXED_STEP};
pub use extensions::{MotionRecorder, PoseSample};

#[cfg(feature = "physics")]
pub use core::physics::{
    PhysicsWorld, PhysicsBody, BodyDesc, BodyType,
    ColliderDesc, ColliderMaterial, CollisionPair,
};
#[cfg(feature = "physics")]
pub use core::world::DynamicsWorld;
