//! Player Specials
//!
//! A special fires once when the energy is full and its key is active,
//! then the energy is cleared. `blink` teleports the player a fixed
//! distance in the held direction, stopping at the playfield edge.

use tracing::{info, warn};

use crate::core::geometry::divide_dist_x_and_y;
use crate::game::input::{Action, InputFrame};
use crate::game::limits::{move_within_limits, Limits, MoveMode};
use crate::game::physics::{BodyId, World};
use crate::game::state::GameState;

/// Name of the teleport special.
pub const BLINK: &str = "blink";

/// Execute the special if it is charged and requested.
///
/// Returns the name of the executed special.
pub fn handle_player_special(
    active: InputFrame,
    state: &mut GameState,
    world: &mut World,
    player: BodyId,
    playfield: &Limits,
    blink_distance: f64,
) -> Option<String> {
    if !state.is_special_ready() || !active.is_active(Action::Special) {
        return None;
    }

    let name = state.special_name().to_string();
    match name.as_str() {
        BLINK => execute_blink(active, world, player, playfield, blink_distance),
        other => warn!("Unknown special '{}', spending energy anyway", other),
    }
    state.clear_energy();
    info!("Special '{}' executed", name);
    Some(name)
}

/// Travel angle for the held direction keys.
///
/// Opposite keys cancel each other; no direction defaults to straight up.
pub fn blink_degree(active: InputFrame) -> f64 {
    let (up, down) = (active.up_only(), active.down_only());
    let (left, right) = (active.left_only(), active.right_only());

    match (up, down, left, right) {
        (true, _, true, _) => 225.0,
        (true, _, _, true) => 135.0,
        (true, _, _, _) => 180.0,
        (_, true, true, _) => 315.0,
        (_, true, _, true) => 45.0,
        (_, true, _, _) => 0.0,
        (_, _, true, _) => 270.0,
        (_, _, _, true) => 90.0,
        _ => 180.0,
    }
}

/// Teleport the player `distance` in the held direction, clamped to the playfield.
pub fn execute_blink(active: InputFrame, world: &mut World, player: BodyId, playfield: &Limits, distance: f64) {
    let delta = divide_dist_x_and_y(distance, blink_degree(active));
    if let Some(body) = world.body_mut(player) {
        move_within_limits(body, playfield, delta, MoveMode::Teleport);
    }
}
