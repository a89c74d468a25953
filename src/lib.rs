//! # Bullet Hell
//!
//! Deterministic simulation core of a bullet-hell shooter: scripted enemy
//! routines, shot patterns, player kinematics and fight bookkeeping.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                        BULLET HELL                           │
//! ├─────────────────────────────────────────────────────────────┤
//! │  core/           - Deterministic primitives                  │
//! │  ├── vec2.rs     - 2D vector                                 │
//! │  ├── geometry.rs - Angles, rectangles, viewport placement    │
//! │  ├── rng.rs      - Deterministic Xorshift128+ PRNG           │
//! │  ├── hash.rs     - State hashing for replay verification     │
//! │  └── timer.rs    - Frame-based timer queue                   │
//! │                                                              │
//! │  game/           - Fight logic (deterministic)               │
//! │  ├── content.rs  - Descriptors and asset cache               │
//! │  ├── routine.rs  - Routines and pattern expansion            │
//! │  ├── tracker.rs  - Routine sequencing                        │
//! │  ├── enemy.rs    - Enemy frame update                        │
//! │  ├── player.rs   - Player movement and weapon                │
//! │  ├── state.rs    - Lives and energy                          │
//! │  ├── collision.rs- Overlap handling                          │
//! │  └── fight.rs    - Fight session and frame loop              │
//! │                                                              │
//! │  config.rs       - Fight tunables                            │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Determinism Guarantee
//!
//! Given identical content, config and input, a fight produces
//! **identical results** on every run:
//! - No HashMap (uses BTreeMap for sorted iteration)
//! - No system time dependencies
//! - All randomness from the session's seeded Xorshift128+
//! - Timers carry data, never callbacks

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod config;
pub mod core;
pub mod game;

// Re-export commonly used types
pub use config::FightConfig;
pub use core::rng::DeterministicRng;
pub use core::vec2::Vec2;
pub use game::content::{ContentCache, ContentError};
pub use game::fight::{replay_fight, Fight, TickResult};
pub use game::input::{Action, InputFrame, InputRecording};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Simulation frame rate (Hz)
pub const FRAME_RATE: u32 = 60;
