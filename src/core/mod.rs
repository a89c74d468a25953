//! Core deterministic primitives.
//!
//! Math, randomness, hashing and timers shared by the simulation.
//! Nothing in here knows about enemies, players or content files.

pub mod vec2;
pub mod geometry;
pub mod rng;
pub mod hash;
pub mod timer;

// Re-export core types
pub use vec2::Vec2;
pub use geometry::{divide_dist_x_and_y, degree_to_radian, RectBounds, Percentages};
pub use rng::DeterministicRng;
pub use hash::{compute_state_hash, StateHash};
pub use timer::{Scheduler, TimerId};
