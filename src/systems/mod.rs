//! Subsystems that run on the engine, plus the profiling they are measured with.

pub mod collision;
pub mod diagnostics;
pub mod difficulty;
pub mod formatting;
pub mod profiling;
pub mod render;
pub mod world;

pub use collision::CollisionResolver;
pub use difficulty::DifficultyController;
pub use world::WorldSystem;
