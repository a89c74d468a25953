//! Collision Handling
//!
//! Deterministic overlap checks between the fight's collision groups and
//! the handlers applied to each overlapping pair.

use tracing::debug;

use crate::core::timer::Scheduler;
use crate::game::enemy::Enemy;
use crate::game::events::TimerAction;
use crate::game::physics::{Body, BodyId, GroupId, World};
use crate::game::player::Player;
use crate::game::state::GameState;

/// A player bullet overlapping an enemy.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EnemyHit {
    /// The player bullet
    pub bullet: BodyId,
    /// The enemy body
    pub enemy: BodyId,
}

/// Count the bodies of the hostile groups overlapping the player.
///
/// Enemy bodies are checked before enemy bullets; the order of members
/// within a group is insertion order.
pub fn check_player_hits(world: &World, player: BodyId, hostile_groups: &[GroupId]) -> usize {
    hostile_groups
        .iter()
        .map(|&group| world.overlaps_with_group(player, group).len())
        .sum()
}

/// All player bullet vs enemy overlaps, in bullet then enemy order.
pub fn check_all_enemy_hits(world: &World, player_bullets: GroupId, enemies: GroupId) -> Vec<EnemyHit> {
    world
        .overlaps_between_groups(player_bullets, enemies)
        .into_iter()
        .map(|(bullet, enemy)| EnemyHit { bullet, enemy })
        .collect()
}

/// The player touched something hostile.
///
/// Ignored while invincible; otherwise costs a life and starts the
/// invincibility window. The hostile body is left alone.
/// Returns whether the hit counted.
pub fn handle_player_hit(player: &mut Player, state: &mut GameState, scheduler: &mut Scheduler<TimerAction>) -> bool {
    if player.is_invincible() {
        return false;
    }
    state.add_to_lives(-1);
    player.trigger_invincibility(scheduler);
    debug!("Player hit, {} lives left", state.cur_lives());
    true
}

/// A player bullet reached an enemy.
///
/// Destroys the bullet and applies its damage (or `default_damage` when
/// untagged). Returns the damage dealt, or `None` if the bullet was
/// already gone.
pub fn handle_enemy_hit(world: &mut World, bullet: BodyId, enemy: &mut Enemy, default_damage: u32) -> Option<u32> {
    if !world.contains(bullet) {
        return None;
    }
    let damage = world.damage_of(bullet).unwrap_or(default_damage);
    world.destroy(bullet);
    enemy.apply_damage(damage);
    debug!("Enemy '{}' took {} damage", enemy.sprite_id(), damage);
    Some(damage)
}

/// Whether a bullet left the viewport.
///
/// Uses the full width and height as margin, so a bullet is only removed
/// once it is certainly invisible.
pub fn is_out_of_bounds(body: &Body, viewport_width: f64, viewport_height: f64) -> bool {
    let (x, y) = (body.position.x, body.position.y);
    let (width, height) = (body.width(), body.height());
    x + width < 0.0 || x - width > viewport_width || y + height < 0.0 || y - height > viewport_height
}

/// Destroy every member of `group` that left the viewport. Returns the count.
pub fn remove_out_of_bounds(world: &mut World, group: GroupId, viewport_width: f64, viewport_height: f64) -> usize {
    let gone: Vec<BodyId> = world
        .group_members(group)
        .iter()
        .copied()
        .filter(|&id| world.body(id).is_some_and(|b| is_out_of_bounds(b, viewport_width, viewport_height)))
        .collect();
    for &id in &gone {
        world.destroy(id);
    }
    gone.len()
}
