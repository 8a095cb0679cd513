// extensions/mod.rs
//
// Optional add-ons built on the scheduler's output.
// Nothing in the core depends on these.

pub mod recording;

pub use recording::{MotionRecorder, PoseSample};
