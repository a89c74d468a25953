//! Enemies
//!
//! An enemy binds an event tracker to one physics body. Each frame it
//! handles routine transitions, applies the routine's movement (kept
//! inside its limits when the movement asks for it), spawns the routine's
//! shots and finally advances the routine timer.

use tracing::{debug, info, trace};

use crate::config::FightConfig;
use crate::core::geometry::position_from_percentages;
use crate::core::rng::DeterministicRng;
use crate::core::vec2::Vec2;
use crate::game::content::{ContentCache, ContentError, EnemyBlueprint, EnemyKind};
use crate::game::limits::{move_within_limits, Limits, MoveMode};
use crate::game::physics::{BodyId, GroupId, World};
use crate::game::routine::Routine;
use crate::game::shot::spawn_shots;
use crate::game::tracker::EnemyEventTracker;

/// Result of one enemy update.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EnemyUpdate {
    /// The enemy acted this frame
    Active {
        /// Shots spawned this frame
        shots_fired: usize,
    },
    /// No routine is left; the owner destroys the enemy
    Finished,
}

/// Per-frame environment of an enemy update.
pub struct EnemyFrame<'a, F> {
    /// Physics world
    pub world: &'a mut World,
    /// Group receiving enemy bullets
    pub shot_group: GroupId,
    /// Session RNG
    pub rng: &'a mut DeterministicRng,
    /// Seconds per frame
    pub dt: f64,
    /// Sprite size lookup for shots
    pub size_of: F,
}

/// A scripted enemy.
#[derive(Clone, Debug)]
pub struct Enemy {
    kind: EnemyKind,
    sprite_id: String,
    body: BodyId,
    tracker: EnemyEventTracker,
    limits: Limits,
}

impl Enemy {
    /// Build an enemy from its blueprint and add its body to `group`.
    ///
    /// Every routine is loaded before the body is created, so a content
    /// error leaves the world untouched.
    pub fn spawn(
        blueprint: &EnemyBlueprint,
        content: &ContentCache,
        world: &mut World,
        group: GroupId,
        config: &FightConfig,
        size: (f64, f64),
    ) -> Result<Self, ContentError> {
        let routines = blueprint
            .routines
            .iter()
            .map(|r| content.routine(&r.name).map(|desc| Routine::from_desc(&desc)))
            .collect::<Result<Vec<_>, _>>()?;

        let position = position_from_percentages(
            config.boss_offsets,
            config.viewport_width,
            config.viewport_height,
        );
        let body = world.create_body(&blueprint.id, position, size.0, size.1);
        world.add_to_group(group, body);

        let limits = match blueprint.kind {
            EnemyKind::Boss => Limits::from_fractions(
                &config.boss_limits,
                config.viewport_width,
                config.viewport_height,
            ),
            EnemyKind::Default => Limits::UNBOUNDED,
        };

        Ok(Self::new(blueprint.kind, &blueprint.id, body, EnemyEventTracker::new(routines), limits))
    }

    /// Wrap an existing body.
    pub fn new(kind: EnemyKind, sprite_id: &str, body: BodyId, tracker: EnemyEventTracker, limits: Limits) -> Self {
        Self {
            kind,
            sprite_id: sprite_id.to_string(),
            body,
            tracker,
            limits,
        }
    }

    /// Behaviour class.
    pub fn kind(&self) -> EnemyKind {
        self.kind
    }

    /// Sprite asset id.
    pub fn sprite_id(&self) -> &str {
        &self.sprite_id
    }

    /// The enemy's body.
    pub fn body(&self) -> BodyId {
        self.body
    }

    /// Movement limits in world coordinates.
    pub fn limits(&self) -> &Limits {
        &self.limits
    }

    /// The routine sequencer.
    pub fn tracker(&self) -> &EnemyEventTracker {
        &self.tracker
    }

    /// Damage the active routine.
    pub fn apply_damage(&mut self, damage: u32) {
        self.tracker.apply_damage(damage);
    }

    /// Health of the active routine in `[0, 1]`, if it tracks hit points.
    pub fn current_health_percentage(&self) -> Option<f64> {
        self.tracker.current_routine().and_then(Routine::health_fraction)
    }

    /// Run one frame.
    pub fn update<F>(&mut self, frame: &mut EnemyFrame<'_, F>) -> EnemyUpdate
    where
        F: Fn(&str) -> (f64, f64),
    {
        if !self.handle_routine_transition() {
            return EnemyUpdate::Finished;
        }

        self.update_movement(frame.world, frame.rng, frame.dt);

        let shots_fired = match self.tracker.get_next_shots() {
            Some(shots) => spawn_shots(frame.world, shots, self.body, frame.shot_group, &frame.size_of).len(),
            None => 0,
        };
        if shots_fired > 0 {
            trace!("Enemy '{}' fired {} shots", self.sprite_id, shots_fired);
        }

        // Must come last: reading after the advance would skip this frame's events
        self.tracker.update_current_routine();

        EnemyUpdate::Active { shots_fired }
    }

    /// Move to the next routine when the active one is done.
    /// Returns false when no routine is left.
    fn handle_routine_transition(&mut self) -> bool {
        if !self.tracker.is_current_routine_finished() {
            return true;
        }
        if self.tracker.exist_next_routine() {
            self.tracker.advance_routine();
            true
        } else {
            info!("Enemy '{}' exhausted its routines", self.sprite_id);
            false
        }
    }

    fn update_movement(&mut self, world: &mut World, rng: &mut DeterministicRng, dt: f64) {
        let mut movement = self.tracker.get_next_moves(rng);

        let Some(body) = world.body_mut(self.body) else {
            return;
        };

        if !movement.can_leave {
            // Displacement the physics step is about to apply
            let delta = Vec2::new(
                (movement.x_velo + movement.x_acceleration * dt) * dt,
                (movement.y_velo + movement.y_acceleration * dt) * dt,
            );
            let moves = move_within_limits(body, &self.limits, delta, MoveMode::Velocity);

            if !moves.x {
                debug!("Enemy '{}' blocked on X at {:.1}", self.sprite_id, body.position.x);
                self.tracker.disable_ongoing_x_movement();
                movement.x_velo = 0.0;
                movement.x_acceleration = 0.0;
            }
            if !moves.y {
                debug!("Enemy '{}' blocked on Y at {:.1}", self.sprite_id, body.position.y);
                self.tracker.disable_ongoing_y_movement();
                movement.y_velo = 0.0;
                movement.y_acceleration = 0.0;
            }
        }

        body.velocity = Vec2::new(movement.x_velo, movement.y_velo);
        body.acceleration = Vec2::new(movement.x_acceleration, movement.y_acceleration);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::geometry::RectBounds;
    use crate::game::content::MoveDesc;
    use crate::game::routine::Movement;
    use serde_json::json;

    const DT: f64 = 1.0 / 60.0;

    struct Harness {
        world: World,
        enemies: GroupId,
        shots: GroupId,
        rng: DeterministicRng,
    }

    impl Harness {
        fn new() -> Self {
            let mut world = World::new(RectBounds::from_origin(0.0, 0.0, 800.0, 600.0));
            let enemies = world.create_group();
            let shots = world.create_group();
            Self { world, enemies, shots, rng: DeterministicRng::new(9) }
        }

        fn update(&mut self, enemy: &mut Enemy) -> EnemyUpdate {
            let mut frame = EnemyFrame {
                world: &mut self.world,
                shot_group: self.shots,
                rng: &mut self.rng,
                dt: DT,
                size_of: |_: &str| (8.0, 8.0),
            };
            enemy.update(&mut frame)
        }
    }

    fn content() -> ContentCache {
        let mut cache = ContentCache::new();
        cache.insert("opening", json!({
            "name": "opening", "duration": 2,
            "shots": [{"type": "ShotArray", "times": [1], "shots": [{"shot_id": "pellet", "speed": 100, "degree": 0}]}]
        }));
        cache.insert("finale", json!({"name": "finale", "duration": 50, "hp": 20}));
        cache.insert("boss", json!({
            "type": "boss", "id": "boss", "routines": [{"name": "opening"}, {"name": "finale"}]
        }));
        cache
    }

    #[test]
    fn test_spawn_places_boss_with_limits() {
        let mut h = Harness::new();
        let cache = content();
        let blueprint = cache.enemy("boss").unwrap();
        let config = FightConfig { viewport_width: 800.0, viewport_height: 600.0, ..FightConfig::default() };

        let enemy = Enemy::spawn(&blueprint, &cache, &mut h.world, h.enemies, &config, (64.0, 64.0)).unwrap();

        let body = h.world.body(enemy.body()).unwrap();
        assert_eq!(body.position, Vec2::new(400.0, 60.0));
        assert_eq!(h.world.group_members(h.enemies), &[enemy.body()]);
        assert!((enemy.limits().y_max.unwrap() - 252.0).abs() < 1e-9);
        assert_eq!(enemy.tracker().routine_count(), 2);
    }

    #[test]
    fn test_spawn_fails_on_missing_routine() {
        let mut h = Harness::new();
        let mut cache = content();
        cache.insert("broken", json!({"id": "broken", "routines": [{"name": "nowhere"}]}));
        let blueprint = cache.enemy("broken").unwrap();

        let result = Enemy::spawn(&blueprint, &cache, &mut h.world, h.enemies, &FightConfig::default(), (8.0, 8.0));

        assert!(matches!(result, Err(ContentError::MissingAsset(k)) if k == "nowhere"));
        assert_eq!(h.world.body_count(), 0);
    }

    #[test]
    fn test_axis_independent_clamp() {
        let mut h = Harness::new();
        let x_max = 100.0;
        // Right edge sits just inside x_max
        let body = h.world.create_body("boss", Vec2::new(89.99, 50.0), 20.0, 20.0);

        let mut routine = Routine::new("drift", false, 100, None);
        routine.add_moves(&serde_json::from_value::<MoveDesc>(json!({
            "type": "Randomized", "times": [0], "x_velo_range": [5, 5], "y_velo_range": [-3, -3]
        })).unwrap());
        let limits = Limits { x_min: Some(0.0), x_max: Some(x_max), y_min: Some(0.0), y_max: Some(200.0) };
        let mut enemy = Enemy::new(EnemyKind::Boss, "boss", body, EnemyEventTracker::new(vec![routine]), limits);

        h.update(&mut enemy);

        let b = h.world.body(body).unwrap();
        assert_eq!(b.velocity.x, 0.0);
        assert_eq!(b.velocity.y, -3.0);
        assert!((b.position.x - (x_max - 10.0)).abs() < 1e-9);

        let ongoing = enemy.tracker().current_routine().unwrap().ongoing_movement();
        assert_eq!(ongoing, Movement { x_velo: 0.0, y_velo: -3.0, can_leave: false, ..Movement::default() });
    }

    #[test]
    fn test_can_leave_ignores_limits() {
        let mut h = Harness::new();
        let body = h.world.create_body("boss", Vec2::new(89.99, 50.0), 20.0, 20.0);

        let mut routine = Routine::new("exit", false, 100, None);
        routine.add_moves(&serde_json::from_value::<MoveDesc>(json!({
            "type": "Fixed", "times": [0], "x_velo": 500
        })).unwrap());
        let limits = Limits { x_max: Some(100.0), ..Limits::UNBOUNDED };
        let mut enemy = Enemy::new(EnemyKind::Boss, "boss", body, EnemyEventTracker::new(vec![routine]), limits);

        h.update(&mut enemy);

        assert_eq!(h.world.body(body).unwrap().velocity.x, 500.0);
    }

    #[test]
    fn test_routine_switch_happens_on_update_after_finish() {
        let mut h = Harness::new();
        let cache = content();
        let blueprint = cache.enemy("boss").unwrap();
        let mut enemy = Enemy::spawn(&blueprint, &cache, &mut h.world, h.enemies, &FightConfig::default(), (32.0, 32.0)).unwrap();

        let mut fired = Vec::new();
        for _ in 0..3 {
            match h.update(&mut enemy) {
                EnemyUpdate::Active { shots_fired } => fired.push(shots_fired),
                EnemyUpdate::Finished => panic!("enemy finished early"),
            }
        }
        // Frames 0, 1, 2 of the opening ran; the shot at frame 1 fired once.
        // The transition check runs at the start of an update, so the
        // finished opening is only replaced on the 4th update.
        assert_eq!(fired, vec![0, 1, 0]);
        assert_eq!(enemy.tracker().cur_routine_index(), 0);
        assert!(enemy.tracker().is_current_routine_finished());

        assert!(matches!(h.update(&mut enemy), EnemyUpdate::Active { .. }));
        assert_eq!(enemy.tracker().cur_routine_index(), 1);
        assert_eq!(enemy.tracker().current_routine().unwrap().time(), 1);

        h.update(&mut enemy);
        assert_eq!(enemy.tracker().cur_routine_index(), 1);
        assert_eq!(enemy.current_health_percentage(), Some(1.0));
    }

    #[test]
    fn test_finishes_when_last_routine_depleted() {
        let mut h = Harness::new();
        let cache = content();
        let blueprint = cache.enemy("boss").unwrap();
        let mut enemy = Enemy::spawn(&blueprint, &cache, &mut h.world, h.enemies, &FightConfig::default(), (32.0, 32.0)).unwrap();

        for _ in 0..4 {
            h.update(&mut enemy);
        }
        enemy.apply_damage(5);
        assert_eq!(enemy.current_health_percentage(), Some(0.75));

        enemy.apply_damage(100);
        assert_eq!(h.update(&mut enemy), EnemyUpdate::Finished);
    }

    #[test]
    fn test_shots_use_enemy_group() {
        let mut h = Harness::new();
        let cache = content();
        let blueprint = cache.enemy("boss").unwrap();
        let mut enemy = Enemy::spawn(&blueprint, &cache, &mut h.world, h.enemies, &FightConfig::default(), (32.0, 32.0)).unwrap();

        h.update(&mut enemy);
        h.update(&mut enemy);

        let shots = h.world.group_members(h.shots);
        assert_eq!(shots.len(), 1);
        let shot = h.world.body(shots[0]).unwrap();
        assert!(shot.velocity.approx_eq(Vec2::new(0.0, 100.0), 1e-9));
        assert_eq!(shot.position, h.world.body(enemy.body()).unwrap().position);
    }
}
