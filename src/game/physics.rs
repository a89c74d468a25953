//! Arcade Physics World
//!
//! Minimal kinematic bodies, collision groups and overlap queries.
//! Bodies are axis-aligned boxes: position is the box centre, and velocity
//! and acceleration are in units per second.
//!
//! Uses BTreeMap everywhere so iteration order (and therefore the order of
//! overlap pairs) is deterministic.

use std::collections::BTreeMap;

use serde::{Serialize, Deserialize};

use crate::core::geometry::RectBounds;
use crate::core::vec2::Vec2;

/// Handle of a body in the world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct BodyId(u32);

impl BodyId {
    /// Raw handle value.
    pub fn raw(self) -> u32 {
        self.0
    }
}

/// Handle of a collision group.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct GroupId(u32);

/// A physical sprite.
#[derive(Clone, Debug, PartialEq)]
pub struct Body {
    /// Asset key of the sprite image
    pub sprite_id: String,
    /// Centre of the body
    pub position: Vec2,
    /// Half width / half height
    pub half_size: Vec2,
    /// Velocity (units per second)
    pub velocity: Vec2,
    /// Acceleration (units per second squared)
    pub acceleration: Vec2,
    /// Keep the body inside the world bounds
    pub collide_world_bounds: bool,
}

impl Body {
    /// Full width of the body.
    #[inline]
    pub fn width(&self) -> f64 {
        self.half_size.x * 2.0
    }

    /// Full height of the body.
    #[inline]
    pub fn height(&self) -> f64 {
        self.half_size.y * 2.0
    }

    /// Borders of the body's box.
    pub fn rect(&self) -> RectBounds {
        RectBounds::from_midpoint(self.position, self.width(), self.height())
    }

    /// Check AABB overlap with another body.
    pub fn overlaps(&self, other: &Body) -> bool {
        let dx = (self.position.x - other.position.x).abs();
        let dy = (self.position.y - other.position.y).abs();
        dx < self.half_size.x + other.half_size.x && dy < self.half_size.y + other.half_size.y
    }
}

/// Kinematics a group applies to every body added to it.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct GroupDefaults {
    /// Velocity assigned on insertion
    pub velocity: Vec2,
    /// Acceleration assigned on insertion
    pub acceleration: Vec2,
}

#[derive(Clone, Debug, Default)]
struct Group {
    defaults: GroupDefaults,
    /// Members in insertion order
    members: Vec<BodyId>,
}

/// The physics world.
#[derive(Clone, Debug)]
pub struct World {
    bounds: RectBounds,
    bodies: BTreeMap<BodyId, Body>,
    groups: BTreeMap<GroupId, Group>,
    /// Damage carried by shot bodies
    damage: BTreeMap<BodyId, u32>,
    next_body: u32,
    next_group: u32,
}

impl World {
    /// Create a world whose bounds limit bodies that collide with them.
    pub fn new(bounds: RectBounds) -> Self {
        Self {
            bounds,
            bodies: BTreeMap::new(),
            groups: BTreeMap::new(),
            damage: BTreeMap::new(),
            next_body: 0,
            next_group: 0,
        }
    }

    /// World bounds.
    pub fn bounds(&self) -> RectBounds {
        self.bounds
    }

    /// Create a body at rest centred on `position`.
    pub fn create_body(&mut self, sprite_id: &str, position: Vec2, width: f64, height: f64) -> BodyId {
        let id = BodyId(self.next_body);
        self.next_body += 1;
        self.bodies.insert(id, Body {
            sprite_id: sprite_id.to_string(),
            position,
            half_size: Vec2::new(width / 2.0, height / 2.0),
            velocity: Vec2::ZERO,
            acceleration: Vec2::ZERO,
            collide_world_bounds: false,
        });
        id
    }

    /// Look up a body.
    pub fn body(&self, id: BodyId) -> Option<&Body> {
        self.bodies.get(&id)
    }

    /// Look up a body mutably.
    pub fn body_mut(&mut self, id: BodyId) -> Option<&mut Body> {
        self.bodies.get_mut(&id)
    }

    /// Check whether a body still exists.
    pub fn contains(&self, id: BodyId) -> bool {
        self.bodies.contains_key(&id)
    }

    /// Number of live bodies.
    pub fn body_count(&self) -> usize {
        self.bodies.len()
    }

    /// Iterate all bodies in creation order.
    pub fn bodies(&self) -> impl Iterator<Item = (BodyId, &Body)> {
        self.bodies.iter().map(|(id, body)| (*id, body))
    }

    /// Set a body's velocity.
    pub fn set_velocity(&mut self, id: BodyId, velocity: Vec2) {
        if let Some(body) = self.bodies.get_mut(&id) {
            body.velocity = velocity;
        }
    }

    /// Set a body's acceleration.
    pub fn set_acceleration(&mut self, id: BodyId, acceleration: Vec2) {
        if let Some(body) = self.bodies.get_mut(&id) {
            body.acceleration = acceleration;
        }
    }

    /// Remove a body from the world, its groups and the damage table.
    pub fn destroy(&mut self, id: BodyId) {
        if self.bodies.remove(&id).is_none() {
            return;
        }
        self.damage.remove(&id);
        for group in self.groups.values_mut() {
            group.members.retain(|member| *member != id);
        }
    }

    // =========================================================================
    // Groups
    // =========================================================================

    /// Create an empty group with zero default kinematics.
    pub fn create_group(&mut self) -> GroupId {
        self.create_group_with_defaults(GroupDefaults::default())
    }

    /// Create an empty group with the given default kinematics.
    pub fn create_group_with_defaults(&mut self, defaults: GroupDefaults) -> GroupId {
        let id = GroupId(self.next_group);
        self.next_group += 1;
        self.groups.insert(id, Group { defaults, members: Vec::new() });
        id
    }

    /// Add a body to a group.
    ///
    /// The group's default kinematics overwrite the body's velocity and
    /// acceleration, so callers set velocity *after* insertion.
    pub fn add_to_group(&mut self, group: GroupId, id: BodyId) {
        let (Some(group), Some(body)) = (self.groups.get_mut(&group), self.bodies.get_mut(&id)) else {
            return;
        };
        if group.members.contains(&id) {
            return;
        }
        body.velocity = group.defaults.velocity;
        body.acceleration = group.defaults.acceleration;
        group.members.push(id);
    }

    /// Members of a group in insertion order.
    pub fn group_members(&self, group: GroupId) -> &[BodyId] {
        self.groups
            .get(&group)
            .map(|g| g.members.as_slice())
            .unwrap_or(&[])
    }

    // =========================================================================
    // Damage side table
    // =========================================================================

    /// Record the damage a body deals on hit.
    pub fn tag_damage(&mut self, id: BodyId, damage: u32) {
        if self.bodies.contains_key(&id) {
            self.damage.insert(id, damage);
        }
    }

    /// Damage a body deals on hit, if tagged.
    pub fn damage_of(&self, id: BodyId) -> Option<u32> {
        self.damage.get(&id).copied()
    }

    // =========================================================================
    // Simulation
    // =========================================================================

    /// Integrate all bodies by `dt` seconds.
    pub fn step(&mut self, dt: f64) {
        let bounds = self.bounds;
        for body in self.bodies.values_mut() {
            body.velocity = body.velocity.add(body.acceleration.scale(dt));
            body.position = body.position.add(body.velocity.scale(dt));

            if body.collide_world_bounds {
                clamp_to_bounds(body, &bounds);
            }
        }
    }

    /// Bodies of `group` overlapping `id`.
    pub fn overlaps_with_group(&self, id: BodyId, group: GroupId) -> Vec<BodyId> {
        let Some(body) = self.bodies.get(&id) else {
            return Vec::new();
        };
        self.group_members(group)
            .iter()
            .copied()
            .filter(|other| *other != id)
            .filter(|other| self.bodies.get(other).is_some_and(|o| body.overlaps(o)))
            .collect()
    }

    /// Overlapping pairs between two groups, each pair reported once.
    pub fn overlaps_between_groups(&self, a: GroupId, b: GroupId) -> Vec<(BodyId, BodyId)> {
        let mut pairs = Vec::new();
        for &first in self.group_members(a) {
            for second in self.overlaps_with_group(first, b) {
                pairs.push((first, second));
            }
        }
        pairs
    }
}

fn clamp_to_bounds(body: &mut Body, bounds: &RectBounds) {
    let min_x = bounds.x_min + body.half_size.x;
    let max_x = bounds.x_max - body.half_size.x;
    if body.position.x < min_x {
        body.position.x = min_x;
        body.velocity.x = 0.0;
    } else if body.position.x > max_x {
        body.position.x = max_x;
        body.velocity.x = 0.0;
    }

    let min_y = bounds.y_min + body.half_size.y;
    let max_y = bounds.y_max - body.half_size.y;
    if body.position.y < min_y {
        body.position.y = min_y;
        body.velocity.y = 0.0;
    } else if body.position.y > max_y {
        body.position.y = max_y;
        body.velocity.y = 0.0;
    }
}
