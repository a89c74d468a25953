//! Fight Events
//!
//! Events generated during a fight for logging, UI and replay comparison,
//! plus the actions carried by the fight's frame timers.

use serde::{Serialize, Deserialize};

use crate::game::physics::BodyId;

/// Actions delivered by the fight scheduler between frames.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimerAction {
    /// The player's invincibility window ran out
    EndInvincibility,
    /// Passive energy accrual tick
    AccrueEnergy,
}

/// Priority for event processing order.
///
/// Lower value = processed first.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[repr(u8)]
pub enum EventPriority {
    /// Player damage first
    PlayerHit = 0,
    /// Then enemy damage
    EnemyHit = 1,
    /// Then specials
    Special = 2,
    /// Then enemy lifecycle
    EnemyLifecycle = 3,
    /// Lowest priority
    Other = 255,
}

/// Fight event data.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum FightEventData {
    /// An enemy entered the fight
    EnemySpawned {
        /// Body of the new enemy
        enemy: BodyId,
        /// Sprite the enemy was spawned with
        sprite_id: String,
    },

    /// An enemy moved on to its next routine
    RoutineChanged {
        /// Enemy whose routine changed
        enemy: BodyId,
        /// Name of the routine now running
        routine: String,
    },

    /// An enemy ran out of routines and was removed
    EnemyExhausted {
        /// Enemy that was removed
        enemy: BodyId,
    },

    /// The player took a hit
    PlayerHit {
        /// Lives remaining after the hit
        lives_left: i32,
    },

    /// A player bullet hit an enemy
    EnemyHit {
        /// Enemy that was hit
        enemy: BodyId,
        /// Damage applied to its routine
        damage: u32,
    },

    /// The player used the special
    SpecialExecuted {
        /// Name of the special
        name: String,
    },

    /// The invincibility window closed
    InvincibilityEnded,

    /// No lives left
    GameOver {
        /// Frames the fight lasted
        duration_frames: u32,
    },
}

/// A fight event with timing and priority.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FightEvent {
    /// Frame when the event occurred
    pub frame: u32,

    /// Processing priority
    pub priority: EventPriority,

    /// Body involved (for tie-breaking)
    pub subject: Option<BodyId>,

    /// Event data
    pub data: FightEventData,
}

impl FightEvent {
    /// Create a new event.
    pub fn new(frame: u32, priority: EventPriority, data: FightEventData) -> Self {
        let subject = match &data {
            FightEventData::EnemySpawned { enemy, .. }
            | FightEventData::RoutineChanged { enemy, .. }
            | FightEventData::EnemyExhausted { enemy }
            | FightEventData::EnemyHit { enemy, .. } => Some(*enemy),
            _ => None,
        };

        Self {
            frame,
            priority,
            subject,
            data,
        }
    }

    /// Create enemy spawned event.
    pub fn enemy_spawned(frame: u32, enemy: BodyId, sprite_id: &str) -> Self {
        Self::new(
            frame,
            EventPriority::EnemyLifecycle,
            FightEventData::EnemySpawned { enemy, sprite_id: sprite_id.to_string() },
        )
    }

    /// Create routine changed event.
    pub fn routine_changed(frame: u32, enemy: BodyId, routine: &str) -> Self {
        Self::new(
            frame,
            EventPriority::EnemyLifecycle,
            FightEventData::RoutineChanged { enemy, routine: routine.to_string() },
        )
    }

    /// Create enemy exhausted event.
    pub fn enemy_exhausted(frame: u32, enemy: BodyId) -> Self {
        Self::new(frame, EventPriority::EnemyLifecycle, FightEventData::EnemyExhausted { enemy })
    }

    /// Create player hit event.
    pub fn player_hit(frame: u32, lives_left: i32) -> Self {
        Self::new(frame, EventPriority::PlayerHit, FightEventData::PlayerHit { lives_left })
    }

    /// Create enemy hit event.
    pub fn enemy_hit(frame: u32, enemy: BodyId, damage: u32) -> Self {
        Self::new(frame, EventPriority::EnemyHit, FightEventData::EnemyHit { enemy, damage })
    }

    /// Create special executed event.
    pub fn special_executed(frame: u32, name: &str) -> Self {
        Self::new(
            frame,
            EventPriority::Special,
            FightEventData::SpecialExecuted { name: name.to_string() },
        )
    }

    /// Create invincibility ended event.
    pub fn invincibility_ended(frame: u32) -> Self {
        Self::new(frame, EventPriority::Other, FightEventData::InvincibilityEnded)
    }

    /// Create game over event.
    pub fn game_over(frame: u32) -> Self {
        Self::new(
            frame,
            EventPriority::Other,
            FightEventData::GameOver { duration_frames: frame },
        )
    }
}

impl PartialEq for FightEvent {
    fn eq(&self, other: &Self) -> bool {
        self.frame == other.frame
            && self.priority == other.priority
            && self.subject == other.subject
    }
}

impl Eq for FightEvent {}

impl PartialOrd for FightEvent {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for FightEvent {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        // Sort by: frame, then priority, then subject
        self.frame
            .cmp(&other.frame)
            .then(self.priority.cmp(&other.priority))
            .then(self.subject.cmp(&other.subject))
    }
}
