//! Game Logic Module
//!
//! All fight simulation code. Deterministic for a given seed and input.
//!
//! ## Module Structure
//!
//! - `physics`: Bodies, collision groups, integration
//! - `content`: Content descriptors and the JSON asset cache
//! - `shot`: Shot descriptors and spawning
//! - `routine`: Enemy routines and pattern expansion
//! - `tracker`: Routine sequencing per enemy
//! - `limits`: Movement limits and the clamp primitive
//! - `enemy`: Enemy frame update
//! - `input`: Actions, key tracking, input recording
//! - `player`: Player movement, weapon, invincibility
//! - `state`: Lives and special energy
//! - `specials`: Player specials (blink)
//! - `collision`: Overlap handling
//! - `events`: Fight events and timer actions
//! - `fight`: The fight session and its frame loop

pub mod physics;
pub mod content;
pub mod shot;
pub mod routine;
pub mod tracker;
pub mod limits;
pub mod enemy;
pub mod input;
pub mod player;
pub mod state;
pub mod specials;
pub mod collision;
pub mod events;
pub mod fight;

// Re-export key types
pub use content::{ContentCache, ContentError};
pub use enemy::{Enemy, EnemyUpdate};
pub use events::{FightEvent, FightEventData, TimerAction};
pub use fight::{replay_fight, Fight, TickResult};
pub use input::{Action, InputFrame, InputRecording, KeyTracker};
pub use player::Player;
pub use routine::{Movement, Routine};
pub use state::GameState;
pub use tracker::EnemyEventTracker;
