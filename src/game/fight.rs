//! Fight Session
//!
//! The single context object of a fight. It owns the physics world, the
//! player, the enemies, the game state, the frame timers, the spawn
//! timeline and the session RNG, and advances all of them one frame per
//! [`Fight::tick`].
//!
//! Given identical content, config and raw input, a fight produces
//! identical state on every run; [`replay_fight`] relies on that.

use std::collections::BTreeMap;

use tracing::{debug, info, warn};

use crate::config::FightConfig;
use crate::core::geometry::RectBounds;
use crate::core::hash::{compute_state_hash, StateHash};
use crate::core::rng::DeterministicRng;
use crate::core::timer::Scheduler;
use crate::game::collision::{
    check_all_enemy_hits, check_player_hits, handle_enemy_hit, handle_player_hit, remove_out_of_bounds,
};
use crate::game::content::{ContentCache, ContentError, EnemyBlueprint, EnemyKind, SpriteSize};
use crate::game::enemy::{Enemy, EnemyFrame, EnemyUpdate};
use crate::game::events::{FightEvent, TimerAction};
use crate::game::input::{Action, InputFrame, InputRecording, KeyTracker};
use crate::game::limits::Limits;
use crate::game::physics::{GroupId, World};
use crate::game::player::{Player, PLAYER_SPRITE_ID};
use crate::game::specials::handle_player_special;
use crate::game::state::GameState;

/// Level event type that spawns an enemy.
pub const ENEMY_EVENT: &str = "enemy";

/// Result of a tick.
#[derive(Debug, Default)]
pub struct TickResult {
    /// Events generated this tick, in (frame, priority, subject) order
    pub events: Vec<FightEvent>,
    /// The pause key went down; nothing was simulated
    pub pause_requested: bool,
    /// The player has no lives left
    pub game_over: bool,
}

/// Collision groups of a fight.
#[derive(Clone, Copy, Debug)]
struct Groups {
    player: GroupId,
    player_bullets: GroupId,
    enemies: GroupId,
    enemy_bullets: GroupId,
}

/// A running fight.
pub struct Fight {
    config: FightConfig,
    content: ContentCache,
    world: World,
    groups: Groups,
    playfield: Limits,
    player: Player,
    enemies: Vec<Enemy>,
    state: GameState,
    timers: Scheduler<TimerAction>,
    keys: KeyTracker,
    /// Enemy ids to spawn, by fight frame
    timeline: BTreeMap<u32, Vec<String>>,
    roster: BTreeMap<String, EnemyBlueprint>,
    sprite_sizes: BTreeMap<String, SpriteSize>,
    rng: DeterministicRng,
    frame: u32,
    game_over: bool,
    events: Vec<FightEvent>,
}

impl Fight {
    /// Set up a fight from loaded content.
    ///
    /// Every asset the fight will touch is read here: the player, the level
    /// timeline, each scheduled enemy and its routines. A missing or
    /// malformed asset fails construction instead of a later frame.
    pub fn new(content: ContentCache, config: FightConfig) -> Result<Self, ContentError> {
        let player_blueprint = content.player()?;
        let sprite_sizes = content.sprite_sizes()?;

        let mut timeline: BTreeMap<u32, Vec<String>> = BTreeMap::new();
        let mut roster = BTreeMap::new();
        for event in content.level_events()? {
            if event.kind != ENEMY_EVENT {
                warn!("Ignoring level event '{}' of unknown type '{}'", event.id, event.kind);
                continue;
            }
            if !roster.contains_key(&event.id) {
                let blueprint = content.enemy(&event.id)?;
                for routine in &blueprint.routines {
                    content.routine(&routine.name)?;
                }
                roster.insert(event.id.clone(), blueprint);
            }
            timeline.entry(event.time).or_default().push(event.id);
        }

        let bounds = RectBounds::from_origin(0.0, 0.0, config.viewport_width, config.viewport_height);
        let mut world = World::new(bounds);
        let groups = Groups {
            player: world.create_group(),
            player_bullets: world.create_group(),
            enemies: world.create_group(),
            enemy_bullets: world.create_group(),
        };

        let player_size = sprite_size(&sprite_sizes, PLAYER_SPRITE_ID, config.default_sprite_size);
        let player = Player::spawn(&player_blueprint, &mut world, groups.player, &config, player_size);
        let state = GameState::new(player_blueprint.lives, config.player_max_lives, &player_blueprint.special);

        let mut timers = Scheduler::new();
        timers.schedule_repeating(config.energy_accumulation_interval, TimerAction::AccrueEnergy);

        info!(
            "Fight ready: {} enemies on the timeline, seed {:#x}",
            timeline.values().map(Vec::len).sum::<usize>(),
            config.rng_seed
        );

        Ok(Self {
            rng: DeterministicRng::new(config.rng_seed),
            playfield: Limits::from_rect(bounds),
            config,
            content,
            world,
            groups,
            player,
            enemies: Vec::new(),
            state,
            timers,
            keys: KeyTracker::new(),
            timeline,
            roster,
            sprite_sizes,
            frame: 0,
            game_over: false,
            events: Vec::new(),
        })
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// Fight frames simulated so far (paused frames excluded).
    pub fn frame(&self) -> u32 {
        self.frame
    }

    /// The session config.
    pub fn config(&self) -> &FightConfig {
        &self.config
    }

    /// The physics world.
    pub fn world(&self) -> &World {
        &self.world
    }

    /// The player.
    pub fn player(&self) -> &Player {
        &self.player
    }

    /// Active enemies in spawn order.
    pub fn enemies(&self) -> &[Enemy] {
        &self.enemies
    }

    /// Lives and energy.
    pub fn state(&self) -> &GameState {
        &self.state
    }

    /// The key tracker.
    pub fn keys(&self) -> &KeyTracker {
        &self.keys
    }

    /// Whether the fight ended.
    pub fn is_game_over(&self) -> bool {
        self.game_over
    }

    /// Live bullets as (player, enemy).
    pub fn bullet_counts(&self) -> (usize, usize) {
        (
            self.world.group_members(self.groups.player_bullets).len(),
            self.world.group_members(self.groups.enemy_bullets).len(),
        )
    }

    /// Energy over the energy needed, in `[0, 1]`.
    pub fn energy_percentage(&self) -> f64 {
        self.state.energy_percentage()
    }

    /// Health of the first active boss, if its routine tracks hit points.
    pub fn boss_health_percentage(&self) -> Option<f64> {
        self.enemies
            .iter()
            .find(|e| e.kind() == EnemyKind::Boss)
            .and_then(Enemy::current_health_percentage)
    }

    // =========================================================================
    // Frame
    // =========================================================================

    /// Run one frame with the raw pressed state of the keys.
    pub fn tick(&mut self, raw: InputFrame) -> TickResult {
        let mut result = TickResult::default();
        if self.game_over {
            result.game_over = true;
            return result;
        }

        // 1. Key tracking; pause hands control to the caller
        let active = self.keys.update(raw);
        if active.is_active(Action::Pause) {
            debug!("Pause requested on frame {}", self.frame);
            result.pause_requested = true;
            return result;
        }

        // 2. Timers
        self.process_timers();

        // 3. Physics, then overlaps
        self.world.step(self.config.frame_dt);
        #[cfg(feature = "debug-tracing")]
        if let Some(body) = self.world.body(self.player.body()) {
            tracing::trace!(
                "Frame {}: player at ({:.1}, {:.1}) moving ({:.1}, {:.1})",
                self.frame, body.position.x, body.position.y, body.velocity.x, body.velocity.y
            );
        }
        self.process_player_hits();
        self.process_enemy_hits();

        // 4. Player, then special
        self.update_player(active);

        // 5. Enemies scheduled for this frame
        self.spawn_scheduled_enemies();

        // 6. Enemy routines
        self.update_enemies();

        // 7. Bullets that left the screen
        let (width, height) = (self.config.viewport_width, self.config.viewport_height);
        remove_out_of_bounds(&mut self.world, self.groups.player_bullets, width, height);
        remove_out_of_bounds(&mut self.world, self.groups.enemy_bullets, width, height);

        // 8. Frame counter and end condition
        self.frame += 1;
        if self.state.is_game_over() {
            self.game_over = true;
            info!("Game over after {} frames", self.frame);
            self.events.push(FightEvent::game_over(self.frame));
        }

        result.events = std::mem::take(&mut self.events);
        result.events.sort();
        result.game_over = self.game_over;
        result
    }

    /// Leave the pause menu: drop every key block and pending debounce.
    pub fn resume(&mut self) {
        self.keys.release_all();
        debug!("Resumed on frame {}", self.frame);
    }

    fn process_timers(&mut self) {
        for action in self.timers.advance() {
            match action {
                TimerAction::EndInvincibility => {
                    self.player.end_invincibility();
                    self.events.push(FightEvent::invincibility_ended(self.frame));
                }
                TimerAction::AccrueEnergy => {
                    self.state.add_energy(i64::from(self.config.energy_passive_accumulation));
                }
            }
        }
    }

    fn process_player_hits(&mut self) {
        let hostile = [self.groups.enemies, self.groups.enemy_bullets];
        let hits = check_player_hits(&self.world, self.player.body(), &hostile);
        for _ in 0..hits {
            if handle_player_hit(&mut self.player, &mut self.state, &mut self.timers) {
                self.events.push(FightEvent::player_hit(self.frame, self.state.cur_lives()));
            }
        }
    }

    fn process_enemy_hits(&mut self) {
        for hit in check_all_enemy_hits(&self.world, self.groups.player_bullets, self.groups.enemies) {
            let Some(enemy) = self.enemies.iter_mut().find(|e| e.body() == hit.enemy) else {
                continue;
            };
            if let Some(damage) =
                handle_enemy_hit(&mut self.world, hit.bullet, enemy, self.config.default_shot_damage)
            {
                self.events.push(FightEvent::enemy_hit(self.frame, hit.enemy, damage));
            }
        }
    }

    fn update_player(&mut self, active: InputFrame) {
        let sizes = &self.sprite_sizes;
        let default = self.config.default_sprite_size;
        self.player.update(active, &mut self.world, self.groups.player_bullets, |id| {
            sprite_size(sizes, id, default)
        });

        if let Some(name) = handle_player_special(
            active,
            &mut self.state,
            &mut self.world,
            self.player.body(),
            &self.playfield,
            self.config.player_blink_distance,
        ) {
            self.events.push(FightEvent::special_executed(self.frame, &name));
        }
    }

    fn spawn_scheduled_enemies(&mut self) {
        let Some(ids) = self.timeline.get(&self.frame) else {
            return;
        };

        for id in ids {
            let Some(blueprint) = self.roster.get(id) else {
                continue;
            };
            let size = sprite_size(&self.sprite_sizes, &blueprint.id, self.config.default_sprite_size);
            match Enemy::spawn(blueprint, &self.content, &mut self.world, self.groups.enemies, &self.config, size) {
                Ok(enemy) => {
                    info!("Enemy '{}' spawned on frame {}", id, self.frame);
                    self.events.push(FightEvent::enemy_spawned(self.frame, enemy.body(), enemy.sprite_id()));
                    self.enemies.push(enemy);
                }
                Err(e) => warn!("Enemy '{}' could not spawn: {}", id, e),
            }
        }
    }

    fn update_enemies(&mut self) {
        let sizes = &self.sprite_sizes;
        let default = self.config.default_sprite_size;
        let mut frame = EnemyFrame {
            world: &mut self.world,
            shot_group: self.groups.enemy_bullets,
            rng: &mut self.rng,
            dt: self.config.frame_dt,
            size_of: |id: &str| sprite_size(sizes, id, default),
        };

        let mut finished = Vec::new();
        for enemy in self.enemies.iter_mut() {
            let before = enemy.tracker().cur_routine_index();
            match enemy.update(&mut frame) {
                EnemyUpdate::Finished => finished.push(enemy.body()),
                EnemyUpdate::Active { .. } => {
                    if enemy.tracker().cur_routine_index() != before {
                        if let Some(routine) = enemy.tracker().current_routine() {
                            self.events.push(FightEvent::routine_changed(self.frame, enemy.body(), routine.name()));
                        }
                    }
                }
            }
        }

        for &body in &finished {
            self.world.destroy(body);
            self.events.push(FightEvent::enemy_exhausted(self.frame, body));
        }
        self.enemies.retain(|e| !finished.contains(&e.body()));
    }

    // =========================================================================
    // Verification
    // =========================================================================

    /// Fingerprint of the session state.
    pub fn compute_hash(&self) -> StateHash {
        compute_state_hash(self.frame, self.config.rng_seed, |h| {
            let [s0, s1] = self.rng.state();
            h.update_u64(s0);
            h.update_u64(s1);

            h.update_i32(self.state.cur_lives());
            h.update_u32(self.state.special().energy);

            if let Some(body) = self.world.body(self.player.body()) {
                h.update_vec2(body.position);
                h.update_vec2(body.velocity);
            }
            h.update_bool(self.player.is_invincible());
            h.update_u32(self.player.weapon().cooldown);

            h.update_u32(self.enemies.len() as u32);
            for enemy in &self.enemies {
                h.update_u32(enemy.body().raw());
                h.update_str(enemy.sprite_id());
                if let Some(body) = self.world.body(enemy.body()) {
                    h.update_vec2(body.position);
                    h.update_vec2(body.velocity);
                    h.update_vec2(body.acceleration);
                }
                h.update_u32(enemy.tracker().cur_routine_index() as u32);
                if let Some(routine) = enemy.tracker().current_routine() {
                    h.update_str(routine.name());
                    h.update_u32(routine.time());
                    h.update_u32(routine.cur_hp().unwrap_or(0));
                }
            }

            let (player_bullets, enemy_bullets) = self.bullet_counts();
            h.update_u32(player_bullets as u32);
            h.update_u32(enemy_bullets as u32);
        })
    }
}

/// Sprite size from the size table, or `default` for unknown ids.
fn sprite_size(sizes: &BTreeMap<String, SpriteSize>, id: &str, default: (f64, f64)) -> (f64, f64) {
    sizes.get(id).map_or(default, |s| (s.width, s.height))
}

/// Replay a recorded input stream from a fresh fight.
///
/// Every recorded raw input is fed to [`Fight::tick`]; a pause request
/// resumes immediately, the same way the runner handles it.
pub fn replay_fight(
    content: ContentCache,
    config: FightConfig,
    recording: &InputRecording,
) -> Result<Fight, ContentError> {
    let config = FightConfig { rng_seed: recording.rng_seed, ..config };
    let mut fight = Fight::new(content, config)?;

    for (_, raw) in recording.replay_iter() {
        let result = fight.tick(raw);
        if result.pause_requested {
            fight.resume();
        }
    }
    Ok(fight)
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::geometry::Percentages;
    use crate::game::events::FightEventData;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};
    use serde_json::{json, Value};

    fn config() -> FightConfig {
        FightConfig {
            viewport_width: 400.0,
            viewport_height: 400.0,
            ..FightConfig::default()
        }
    }

    /// A player at the bottom and one boss running `routines`.
    fn content(routines: Vec<Value>, lives: i32) -> ContentCache {
        let mut cache = ContentCache::new();
        cache.insert("player_info", json!({
            "asset_folder": "ship",
            "weapon": {
                "fire_rate": 5,
                "shots": [{"shot_id": "bolt", "anchor": "Top", "speed": 600, "degree": 180, "damage": 2}]
            },
            "movement": {"normal": 240, "slowed": 90},
            "invincibility_window": 30,
            "lives": lives,
            "special": {"name": "blink", "energy_required": 100}
        }));
        cache.insert("level_event_info", json!([
            {"time": 0, "type": "enemy", "id": "boss"},
            {"time": 3, "type": "dialog", "id": "intro"}
        ]));
        cache.insert("sprite_sizes", json!({
            "boss": {"width": 64, "height": 64},
            "player_sprite": {"width": 24, "height": 24},
            "bolt": {"width": 6, "height": 12}
        }));

        let refs: Vec<Value> = routines.iter().map(|r| json!({"name": r["name"]})).collect();
        cache.insert("boss", json!({"type": "boss", "id": "boss", "routines": refs}));
        for routine in routines {
            let name = routine["name"].as_str().unwrap().to_string();
            cache.insert(&name, routine);
        }
        cache
    }

    fn idle_boss() -> Value {
        json!({"name": "idle", "loops": true, "duration": 120, "hp": 50})
    }

    fn run(fight: &mut Fight, input: InputFrame, frames: usize) -> Vec<FightEvent> {
        (0..frames).flat_map(|_| fight.tick(input).events).collect()
    }

    #[test]
    fn test_new_fails_on_missing_enemy() {
        let mut cache = content(vec![idle_boss()], 3);
        cache.insert("level_event_info", json!([{"time": 0, "type": "enemy", "id": "ghost"}]));

        let result = Fight::new(cache, config());
        assert!(matches!(result, Err(ContentError::MissingAsset(k)) if k == "ghost"));
    }

    #[test]
    fn test_new_fails_on_missing_routine() {
        let mut cache = content(vec![idle_boss()], 3);
        cache.insert("boss", json!({"type": "boss", "id": "boss", "routines": [{"name": "lost"}]}));

        assert!(matches!(Fight::new(cache, config()), Err(ContentError::MissingAsset(k)) if k == "lost"));
    }

    #[test]
    fn test_enemy_spawns_on_timeline() {
        let mut fight = Fight::new(content(vec![idle_boss()], 3), config()).unwrap();
        assert!(fight.enemies().is_empty());

        let events = fight.tick(InputFrame::new()).events;
        assert_eq!(fight.enemies().len(), 1);
        assert!(matches!(&events[0].data, FightEventData::EnemySpawned { sprite_id, .. } if sprite_id == "boss"));

        // Unknown level event types are skipped
        run(&mut fight, InputFrame::new(), 5);
        assert_eq!(fight.enemies().len(), 1);
        assert_eq!(fight.boss_health_percentage(), Some(1.0));
    }

    #[test]
    fn test_pause_freezes_simulation() {
        let mut fight = Fight::new(content(vec![idle_boss()], 3), config()).unwrap();
        run(&mut fight, InputFrame::new(), 2);
        let hash = fight.compute_hash();

        let pause = InputFrame::with_actions(&[Action::Pause]);
        let result = fight.tick(pause);
        assert!(result.pause_requested);
        assert!(result.events.is_empty());
        assert_eq!(fight.frame(), 2);
        assert_eq!(fight.compute_hash(), hash);

        // Holding the key does not pause again
        fight.resume();
        assert!(!fight.tick(pause).pause_requested);
        assert_eq!(fight.frame(), 3);
    }

    #[test]
    fn test_energy_accrues_passively() {
        let mut fight = Fight::new(content(vec![idle_boss()], 3), config()).unwrap();

        run(&mut fight, InputFrame::new(), 5);
        assert_eq!(fight.state().special().energy, 0);
        run(&mut fight, InputFrame::new(), 1);
        assert_eq!(fight.state().special().energy, 2);
        run(&mut fight, InputFrame::new(), 6);
        assert_eq!(fight.energy_percentage(), 0.04);
    }

    #[test]
    fn test_contact_hit_and_invincibility() {
        let config = FightConfig {
            player_offsets: Percentages { x: 0.5, y: 0.2 },
            ..config()
        };
        let mut fight = Fight::new(content(vec![idle_boss()], 3), config).unwrap();

        // Boss appears on frame 0, the overlap counts from the next step
        let events = run(&mut fight, InputFrame::new(), 2);
        let hits: Vec<_> = events.iter().filter(|e| matches!(e.data, FightEventData::PlayerHit { .. })).collect();
        assert_eq!(hits.len(), 1);
        assert_eq!(fight.state().cur_lives(), 2);
        assert!(fight.player().is_invincible());

        // Still overlapping, but invincible for 30 frames
        run(&mut fight, InputFrame::new(), 29);
        assert_eq!(fight.state().cur_lives(), 2);

        let events = run(&mut fight, InputFrame::new(), 2);
        assert!(events.iter().any(|e| e.data == FightEventData::InvincibilityEnded));
        assert_eq!(fight.state().cur_lives(), 1);
    }

    #[test]
    fn test_game_over_reported_once() {
        let config = FightConfig {
            player_offsets: Percentages { x: 0.5, y: 0.2 },
            ..config()
        };
        let mut fight = Fight::new(content(vec![idle_boss()], 1), config).unwrap();

        let events = run(&mut fight, InputFrame::new(), 2);
        assert!(fight.is_game_over());
        let game_overs = events
            .iter()
            .filter(|e| matches!(e.data, FightEventData::GameOver { .. }))
            .count();
        assert_eq!(game_overs, 1);

        let result = fight.tick(InputFrame::new());
        assert!(result.game_over);
        assert!(result.events.is_empty());
        assert_eq!(fight.frame(), 2);
    }

    #[test]
    fn test_player_bullets_damage_boss() {
        let mut fight = Fight::new(content(vec![idle_boss()], 3), config()).unwrap();
        let fire = InputFrame::with_actions(&[Action::Fire]);

        let events = run(&mut fight, fire, 60);

        let damage: u32 = events
            .iter()
            .filter_map(|e| match e.data {
                FightEventData::EnemyHit { damage, .. } => Some(damage),
                _ => None,
            })
            .sum();
        assert!(damage > 0);
        assert_eq!(damage % 2, 0);
        let expected = 1.0 - f64::from(damage) / 50.0;
        assert!((fight.boss_health_percentage().unwrap() - expected).abs() < 1e-9);
    }

    #[test]
    fn test_exhausted_enemy_removed() {
        let brief = json!({"name": "brief", "duration": 3});
        let mut fight = Fight::new(content(vec![brief], 3), config()).unwrap();

        let events = run(&mut fight, InputFrame::new(), 10);

        assert!(fight.enemies().is_empty());
        assert!(events.iter().any(|e| matches!(e.data, FightEventData::EnemyExhausted { .. })));
        // Player body only
        assert_eq!(fight.world().body_count(), 1);
    }

    #[test]
    fn test_routine_change_reported() {
        let first = json!({"name": "opening", "duration": 2});
        let second = json!({"name": "finale", "loops": true, "duration": 30, "hp": 10});
        let mut fight = Fight::new(content(vec![first, second], 3), config()).unwrap();

        let events = run(&mut fight, InputFrame::new(), 6);

        let changes: Vec<&str> = events
            .iter()
            .filter_map(|e| match &e.data {
                FightEventData::RoutineChanged { routine, .. } => Some(routine.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(changes, vec!["finale"]);
        assert_eq!(fight.enemies()[0].tracker().cur_routine_index(), 1);
    }

    #[test]
    fn test_bullets_leave_the_screen() {
        let mut fight = Fight::new(content(vec![idle_boss()], 3), config()).unwrap();
        // Strafe so the stream misses the boss
        let fire = InputFrame::with_actions(&[Action::Fire, Action::Left]);

        run(&mut fight, fire, 240);

        let (player_bullets, _) = fight.bullet_counts();
        assert!(player_bullets > 0);
        assert!(player_bullets < 20);
    }

    #[test]
    fn test_replay_reproduces_state() {
        let drift = json!({
            "name": "drift", "loops": true, "duration": 40,
            "moves": [{"type": "Randomized", "times": [0, 20], "x_velo_range": [-150, 150], "y_velo_range": [-40, 40]}],
            "shots": [{
                "type": "ShotCircle", "nr_shots": 8, "shot_spread": true, "anchor": "Bottom", "shot_ids": ["pellet"],
                "speeds": [120], "continuous": true, "interval": 10, "start_time": 0
            }]
        });
        let cache = content(vec![drift], 99);
        let mut rng = StdRng::seed_from_u64(42);

        let mut fight = Fight::new(cache.clone(), config()).unwrap();
        let mut recording = InputRecording::new(fight.config().rng_seed);
        for frame in 0..600u32 {
            let actions: Vec<Action> = Action::ALL
                .into_iter()
                .filter(|a| *a != Action::Pause && rng.gen_bool(0.3))
                .collect();
            let raw = InputFrame::with_actions(&actions);
            recording.record(frame, raw);
            if fight.tick(raw).pause_requested {
                fight.resume();
            }
        }

        let replayed = replay_fight(cache, config(), &recording).unwrap();
        assert_eq!(replayed.frame(), fight.frame());
        assert_eq!(replayed.compute_hash(), fight.compute_hash());
    }
}
