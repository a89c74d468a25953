//! Fight Configuration
//!
//! Tunables of a fight session. Every field has a default, so a JSON
//! config file only needs the values it overrides.

use serde::{Serialize, Deserialize};

use crate::core::geometry::Percentages;

/// Limits expressed as fractions of the viewport. `None` leaves an edge open.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct LimitFractions {
    /// Left edge
    pub x_min: Option<f64>,
    /// Right edge
    pub x_max: Option<f64>,
    /// Top edge
    pub y_min: Option<f64>,
    /// Bottom edge
    pub y_max: Option<f64>,
}

/// Configuration for a fight session.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FightConfig {
    /// Playfield width
    pub viewport_width: f64,
    /// Playfield height
    pub viewport_height: f64,
    /// Seconds per frame
    pub frame_dt: f64,
    /// Seed of the session RNG
    pub rng_seed: u64,
    /// Player start position as a fraction of the viewport
    pub player_offsets: Percentages,
    /// Enemy spawn position as a fraction of the viewport
    pub boss_offsets: Percentages,
    /// Band a boss stays inside while moving randomly
    pub boss_limits: LimitFractions,
    /// Upper bound on lives
    pub player_max_lives: i32,
    /// Energy gained per accrual tick
    pub energy_passive_accumulation: u32,
    /// Frames between accrual ticks
    pub energy_accumulation_interval: u64,
    /// Distance covered by the blink special
    pub player_blink_distance: f64,
    /// Sprite size when the size table has no entry
    pub default_sprite_size: (f64, f64),
    /// Damage of a player bullet without a damage tag
    pub default_shot_damage: u32,
}

impl Default for FightConfig {
    fn default() -> Self {
        Self {
            viewport_width: 1920.0,
            viewport_height: 1080.0,
            frame_dt: 1.0 / 60.0,
            rng_seed: 0x5EED,
            player_offsets: Percentages { x: 0.5, y: 0.9 },
            boss_offsets: Percentages { x: 0.5, y: 0.1 },
            boss_limits: LimitFractions {
                x_min: Some(0.0),
                x_max: Some(1.0),
                y_min: Some(0.0),
                y_max: Some(0.42),
            },
            player_max_lives: 99,
            energy_passive_accumulation: 2,
            energy_accumulation_interval: 6, // 100 ms at 60 fps
            player_blink_distance: 300.0,
            default_sprite_size: (32.0, 32.0),
            default_shot_damage: 1,
        }
    }
}
