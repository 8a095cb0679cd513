pub mod config;
pub mod runner;
pub mod simulation;
pub mod types;
