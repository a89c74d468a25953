//! Game State
//!
//! Lives and the special's energy resource. Every change is clamped;
//! nothing here can fail.

use serde::{Serialize, Deserialize};

use crate::game::content::SpecialDesc;

/// The special resource.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Special {
    /// Special identifier
    pub name: String,
    /// Current energy, in `[0, energy_required]`
    pub energy: u32,
    /// Energy for one use
    pub energy_required: u32,
}

/// Lives and energy bookkeeping of a fight.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameState {
    cur_lives: i32,
    max_lives: i32,
    special: Special,
}

impl GameState {
    /// Start with `lives` (clamped to `max_lives`) and an empty special.
    pub fn new(lives: i32, max_lives: i32, special: &SpecialDesc) -> Self {
        let max_lives = max_lives.max(0);
        Self {
            cur_lives: lives.clamp(0, max_lives),
            max_lives,
            special: Special {
                name: special.name.clone(),
                energy: 0,
                energy_required: special.energy_required,
            },
        }
    }

    /// Remaining lives.
    pub fn cur_lives(&self) -> i32 {
        self.cur_lives
    }

    /// Upper bound on lives.
    pub fn max_lives(&self) -> i32 {
        self.max_lives
    }

    /// The special resource.
    pub fn special(&self) -> &Special {
        &self.special
    }

    /// Name of the special.
    pub fn special_name(&self) -> &str {
        &self.special.name
    }

    /// Change lives, clamped to `[0, max_lives]`.
    pub fn add_to_lives(&mut self, delta: i32) {
        self.cur_lives = self.cur_lives.saturating_add(delta).clamp(0, self.max_lives);
    }

    /// Change energy, clamped to `[0, energy_required]`.
    pub fn add_energy(&mut self, delta: i64) {
        let energy = (self.special.energy as i64).saturating_add(delta);
        self.special.energy = energy.clamp(0, self.special.energy_required as i64) as u32;
    }

    /// The special can be used.
    pub fn is_special_ready(&self) -> bool {
        self.special.energy == self.special.energy_required
    }

    /// Energy over the energy needed, in `[0, 1]`.
    pub fn energy_percentage(&self) -> f64 {
        if self.special.energy_required == 0 {
            return 1.0;
        }
        self.special.energy as f64 / self.special.energy_required as f64
    }

    /// Spend all energy.
    pub fn clear_energy(&mut self) {
        self.special.energy = 0;
    }

    /// No lives left.
    pub fn is_game_over(&self) -> bool {
        self.cur_lives <= 0
    }
}
