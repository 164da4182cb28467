//! Rotation state: the cyclic pool view, the set of unpaused screens, and
//! the engine that drives both.

pub mod active_set;
pub mod cycle;
pub mod engine;

pub use active_set::ActiveSet;
pub use cycle::Cycle;
pub use engine::RotationEngine;
