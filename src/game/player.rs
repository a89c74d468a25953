//! Player
//!
//! Input-driven movement, weapon cooldown and the invincibility window.

use tracing::debug;

use crate::config::FightConfig;
use crate::core::geometry::position_from_percentages;
use crate::core::timer::Scheduler;
use crate::core::vec2::Vec2;
use crate::game::content::{MovementDesc, PlayerBlueprint};
use crate::game::events::TimerAction;
use crate::game::input::{Action, InputFrame};
use crate::game::physics::{BodyId, GroupId, World};
use crate::game::shot::{spawn_shots, ShotSpec};

/// Sprite asset id of the player ship.
pub const PLAYER_SPRITE_ID: &str = "player_sprite";

/// Weapon state.
#[derive(Clone, Debug, PartialEq)]
pub struct Weapon {
    /// Frames between volleys
    pub fire_rate: u32,
    /// Shots of one volley
    pub shots: Vec<ShotSpec>,
    /// Frames until the next volley is allowed
    pub cooldown: u32,
}

/// Invincibility after a hit.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct InvincibilityWindow {
    /// Length of the window in frames
    pub max: u64,
    /// A window is running
    pub active: bool,
}

/// The player ship.
#[derive(Clone, Debug)]
pub struct Player {
    asset_folder: String,
    body: BodyId,
    weapon: Weapon,
    movement: MovementDesc,
    invincibility: InvincibilityWindow,
}

impl Player {
    /// Create the player body at the configured start position.
    pub fn spawn(
        blueprint: &PlayerBlueprint,
        world: &mut World,
        group: GroupId,
        config: &FightConfig,
        size: (f64, f64),
    ) -> Self {
        let position = position_from_percentages(
            config.player_offsets,
            config.viewport_width,
            config.viewport_height,
        );
        let body = world.create_body(PLAYER_SPRITE_ID, position, size.0, size.1);
        if let Some(b) = world.body_mut(body) {
            b.collide_world_bounds = true;
        }
        world.add_to_group(group, body);

        Self::new(blueprint, body)
    }

    /// Wrap an existing body.
    pub fn new(blueprint: &PlayerBlueprint, body: BodyId) -> Self {
        Self {
            asset_folder: blueprint.asset_folder.clone(),
            body,
            weapon: Weapon {
                fire_rate: blueprint.weapon.fire_rate,
                shots: blueprint.weapon.shots.clone(),
                cooldown: 0,
            },
            movement: blueprint.movement,
            invincibility: InvincibilityWindow {
                max: blueprint.invincibility_window,
                active: false,
            },
        }
    }

    /// Folder of the player's sprites.
    pub fn asset_folder(&self) -> &str {
        &self.asset_folder
    }

    /// The player's body.
    pub fn body(&self) -> BodyId {
        self.body
    }

    /// Weapon state.
    pub fn weapon(&self) -> &Weapon {
        &self.weapon
    }

    /// Whether an invincibility window is running.
    pub fn is_invincible(&self) -> bool {
        self.invincibility.active
    }

    /// Apply one frame of input; returns the number of shots fired.
    pub fn update<F>(&mut self, active: InputFrame, world: &mut World, shot_group: GroupId, size_of: F) -> usize
    where
        F: Fn(&str) -> (f64, f64),
    {
        world.set_velocity(self.body, self.velocity_for(active));
        self.fire(active, world, shot_group, size_of)
    }

    /// Velocity for the held direction keys. Diagonals are not normalized.
    pub fn velocity_for(&self, active: InputFrame) -> Vec2 {
        let speed = if active.is_active(Action::Slow) {
            self.movement.slowed
        } else {
            self.movement.normal
        };

        let mut velocity = Vec2::ZERO;
        if active.is_active(Action::Up) {
            velocity.y -= speed;
        }
        if active.is_active(Action::Down) {
            velocity.y += speed;
        }
        if active.is_active(Action::Left) {
            velocity.x -= speed;
        }
        if active.is_active(Action::Right) {
            velocity.x += speed;
        }
        velocity
    }

    fn fire<F>(&mut self, active: InputFrame, world: &mut World, shot_group: GroupId, size_of: F) -> usize
    where
        F: Fn(&str) -> (f64, f64),
    {
        if active.is_active(Action::Fire) && self.weapon.cooldown == 0 {
            self.weapon.cooldown = self.weapon.fire_rate;
            return spawn_shots(world, &self.weapon.shots, self.body, shot_group, size_of).len();
        }
        self.weapon.cooldown = self.weapon.cooldown.saturating_sub(1);
        0
    }

    /// Start the invincibility window and schedule its end.
    pub fn trigger_invincibility(&mut self, scheduler: &mut Scheduler<TimerAction>) {
        self.invincibility.active = true;
        scheduler.schedule_once(self.invincibility.max, TimerAction::EndInvincibility);
        debug!("Invincible for {} frames", self.invincibility.max);
    }

    /// Close the invincibility window.
    pub fn end_invincibility(&mut self) {
        self.invincibility.active = false;
    }
}
