//! Shot Spawning
//!
//! Turns a shot description into a physics body next to a reference sprite.
//! Shared by enemy routines and the player's weapon.

use serde::{Serialize, Deserialize};

use crate::core::geometry::divide_dist_x_and_y;
use crate::core::vec2::Vec2;
use crate::game::physics::{BodyId, GroupId, World};

/// Shot size used when the sprite table has no entry for a shot id.
pub const DEFAULT_SHOT_SIZE: f64 = 8.0;

/// Edge (or centre) of the reference sprite a shot offset is measured from.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Anchor {
    /// Upper edge
    Top,
    /// Lower edge
    Bottom,
    /// Left edge
    Left,
    /// Right edge
    Right,
    /// Centre of the sprite
    #[default]
    #[serde(other)]
    Middle,
}

impl Anchor {
    /// Shift from the sprite centre to the anchor point.
    pub fn shift(self, half_size: Vec2) -> Vec2 {
        match self {
            Anchor::Top => Vec2::new(0.0, -half_size.y),
            Anchor::Bottom => Vec2::new(0.0, half_size.y),
            Anchor::Left => Vec2::new(-half_size.x, 0.0),
            Anchor::Right => Vec2::new(half_size.x, 0.0),
            Anchor::Middle => Vec2::ZERO,
        }
    }
}

/// The two ways content expresses a shot's velocity.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ShotVelocity {
    /// Explicit per-axis velocity
    Components {
        /// Velocity along X
        x_velo: f64,
        /// Velocity along Y
        y_velo: f64,
    },
    /// Speed travelling at an angle in degrees (0 = down the screen)
    Polar {
        /// Speed of the shot
        speed: f64,
        /// Travel angle in degrees
        degree: f64,
    },
}

impl ShotVelocity {
    /// Resolve to a velocity vector.
    pub fn resolve(self) -> Vec2 {
        match self {
            ShotVelocity::Components { x_velo, y_velo } => Vec2::new(x_velo, y_velo),
            ShotVelocity::Polar { speed, degree } => divide_dist_x_and_y(speed, degree),
        }
    }

    /// Convert to explicit components.
    pub fn to_components(self) -> Self {
        let v = self.resolve();
        ShotVelocity::Components { x_velo: v.x, y_velo: v.y }
    }
}

/// Description of a single shot relative to a reference sprite.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ShotSpec {
    /// Asset key of the shot image
    pub shot_id: String,
    /// Offset along X from the anchor
    #[serde(default)]
    pub x_offset: f64,
    /// Offset along Y from the anchor
    #[serde(default)]
    pub y_offset: f64,
    /// Which part of the reference sprite the offset starts from
    #[serde(default)]
    pub anchor: Anchor,
    /// Damage dealt on hit
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub damage: Option<u32>,
    /// Velocity of the shot
    #[serde(flatten)]
    pub velocity: ShotVelocity,
}

impl ShotSpec {
    /// World-space spawn point next to a reference body.
    pub fn spawn_point(&self, reference_position: Vec2, reference_half_size: Vec2) -> Vec2 {
        reference_position
            .add(Vec2::new(self.x_offset, self.y_offset))
            .add(self.anchor.shift(reference_half_size))
    }
}

/// Spawn one shot next to `reference` and add it to `group`.
///
/// The shot joins the group *before* its velocity is set: group insertion
/// resets kinematics to the group defaults.
///
/// Returns `None` if the reference body no longer exists.
pub fn spawn_shot(
    world: &mut World,
    spec: &ShotSpec,
    reference: BodyId,
    group: GroupId,
    size: (f64, f64),
) -> Option<BodyId> {
    let (position, half_size) = {
        let body = world.body(reference)?;
        (body.position, body.half_size)
    };

    let spawn = spec.spawn_point(position, half_size);
    let shot = world.create_body(&spec.shot_id, spawn, size.0, size.1);
    if let Some(damage) = spec.damage {
        world.tag_damage(shot, damage);
    }

    world.add_to_group(group, shot);
    world.set_velocity(shot, spec.velocity.resolve());

    Some(shot)
}

/// Spawn every shot of `specs` next to `reference`.
///
/// `size_of` maps a shot id to its sprite size.
pub fn spawn_shots<F>(
    world: &mut World,
    specs: &[ShotSpec],
    reference: BodyId,
    group: GroupId,
    size_of: F,
) -> Vec<BodyId>
where
    F: Fn(&str) -> (f64, f64),
{
    specs
        .iter()
        .filter_map(|spec| spawn_shot(world, spec, reference, group, size_of(&spec.shot_id)))
        .collect()
}
