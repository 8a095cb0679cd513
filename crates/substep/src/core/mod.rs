#[cfg(feature = "physics")]
pub mod physics;
pub mod scene;
pub mod time;
#[cfg(feature = "physics")]
pub mod world;
