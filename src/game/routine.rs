//! Routine Interpreter
//!
//! A routine is one timed phase of an enemy: a frame counter plus two
//! time-indexed tables, one of movement commands and one of shot batches.
//!
//! All pattern descriptors are expanded eagerly when the routine is built.
//! Per frame the owner reads moves and shots for the current time and only
//! then calls `advance_timer()`; advancing first would skip the events
//! scheduled for the current frame.

use std::collections::BTreeMap;

use serde::{Serialize, Deserialize};
use tracing::warn;

use crate::core::geometry::divide_dist_x_and_y;
use crate::core::rng::DeterministicRng;
use crate::game::content::{
    FixedMoveDesc, MoveDesc, RandomizedMoveDesc, RoutineDesc, ShotArrayDesc, ShotCircleDesc,
    ShotPatternDesc, ShotRowDesc, ShotTwisterDesc, SpawnTiming,
};
use crate::game::shot::{Anchor, ShotSpec, ShotVelocity};

// =============================================================================
// MOVEMENT
// =============================================================================

/// Kinematics an enemy applies on a frame.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Movement {
    /// Acceleration along X
    pub x_acceleration: f64,
    /// Acceleration along Y
    pub y_acceleration: f64,
    /// Velocity along X
    pub x_velo: f64,
    /// Velocity along Y
    pub y_velo: f64,
    /// The enemy may leave its limits while this movement is active
    pub can_leave: bool,
}

impl Movement {
    /// No motion; limits are not enforced.
    pub const STILL: Movement = Movement {
        x_acceleration: 0.0,
        y_acceleration: 0.0,
        x_velo: 0.0,
        y_velo: 0.0,
        can_leave: true,
    };
}

/// A scheduled movement entry.
#[derive(Clone, Copy, Debug, PartialEq)]
enum MoveCommand {
    /// Explicit kinematics
    Fixed(Movement),
    /// Velocity sampled when the entry becomes current
    Randomized {
        x_velo_range: (i64, i64),
        y_velo_range: (i64, i64),
        x_acceleration: f64,
        y_acceleration: f64,
    },
}

impl MoveCommand {
    fn resolve(&self, rng: &mut DeterministicRng) -> Movement {
        match *self {
            MoveCommand::Fixed(movement) => movement,
            MoveCommand::Randomized { x_velo_range, y_velo_range, x_acceleration, y_acceleration } => {
                let x_velo = rng.next_int_range(x_velo_range.0, x_velo_range.1) as f64;
                let y_velo = rng.next_int_range(y_velo_range.0, y_velo_range.1) as f64;
                Movement { x_acceleration, y_acceleration, x_velo, y_velo, can_leave: false }
            }
        }
    }
}

/// Order a range so the lower bound comes first.
fn ordered(range: [i64; 2]) -> (i64, i64) {
    (range[0].min(range[1]), range[0].max(range[1]))
}

// =============================================================================
// ROUTINE
// =============================================================================

/// One scripted phase of an enemy.
#[derive(Clone, Debug)]
pub struct Routine {
    name: String,
    loops: bool,
    duration: u32,
    /// (max, current) when the routine tracks hit points
    hp: Option<(u32, u32)>,
    time: u32,
    moves: BTreeMap<u32, MoveCommand>,
    shots: BTreeMap<u32, Vec<ShotSpec>>,
    ongoing_movement: Movement,
}

impl Routine {
    /// Create an empty routine.
    pub fn new(name: &str, loops: bool, duration: u32, hp: Option<u32>) -> Self {
        Self {
            name: name.to_string(),
            loops,
            duration,
            hp: hp.map(|hp| (hp, hp)),
            time: 0,
            moves: BTreeMap::new(),
            shots: BTreeMap::new(),
            ongoing_movement: Movement::STILL,
        }
    }

    /// Build a routine and expand all of its descriptors.
    pub fn from_desc(desc: &RoutineDesc) -> Self {
        let mut routine = Self::new(&desc.name, desc.loops, desc.duration, desc.hp);
        for move_desc in &desc.moves {
            routine.add_moves(move_desc);
        }
        for shot_desc in &desc.shots {
            routine.add_shots(shot_desc);
        }
        routine
    }

    /// Routine identifier.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether the routine restarts after `duration`.
    pub fn loops(&self) -> bool {
        self.loops
    }

    /// Last frame of the routine.
    pub fn duration(&self) -> u32 {
        self.duration
    }

    /// Current frame counter.
    pub fn time(&self) -> u32 {
        self.time
    }

    /// Maximum hit points, if tracked.
    pub fn max_hp(&self) -> Option<u32> {
        self.hp.map(|(max, _)| max)
    }

    /// Current hit points, if tracked.
    pub fn cur_hp(&self) -> Option<u32> {
        self.hp.map(|(_, cur)| cur)
    }

    /// Current over maximum hit points, if tracked.
    pub fn health_fraction(&self) -> Option<f64> {
        match self.hp {
            Some((0, _)) => Some(0.0),
            Some((max, cur)) => Some(cur as f64 / max as f64),
            None => None,
        }
    }

    /// The movement carried over from the last scheduled entry.
    pub fn ongoing_movement(&self) -> Movement {
        self.ongoing_movement
    }

    /// Frames with at least one scheduled shot.
    pub fn shot_times(&self) -> impl Iterator<Item = u32> + '_ {
        self.shots.keys().copied()
    }

    /// Total number of scheduled shots over all frames.
    pub fn shot_count(&self) -> usize {
        self.shots.values().map(Vec::len).sum()
    }

    // =========================================================================
    // Frame operations
    // =========================================================================

    /// Advance the frame counter, wrapping a looping routine past `duration`.
    pub fn advance_timer(&mut self) {
        self.time = self.time.saturating_add(1);
        if self.loops && self.time > self.duration {
            self.time = 0;
        }
    }

    /// True once a non-looping routine ran past `duration` or its hit points are gone.
    pub fn is_finished(&self) -> bool {
        let out_of_time = self.time > self.duration;
        let out_of_hp = matches!(self.hp, Some((_, 0)));
        out_of_time || out_of_hp
    }

    /// Subtract damage from the routine's hit points (floored at zero).
    pub fn apply_damage(&mut self, damage: u32) {
        if let Some((_, cur)) = self.hp.as_mut() {
            *cur = cur.saturating_sub(damage);
        }
    }

    /// Movement for the current frame.
    ///
    /// A scheduled entry replaces the ongoing movement; randomized entries
    /// sample their velocity here, once. Frames without an entry keep the
    /// ongoing movement unchanged.
    pub fn get_moves_current_time(&mut self, rng: &mut DeterministicRng) -> Movement {
        if let Some(command) = self.moves.get(&self.time) {
            self.ongoing_movement = command.resolve(rng);
        }
        self.ongoing_movement
    }

    /// Stop the ongoing movement along X.
    pub fn disable_ongoing_x_movement(&mut self) {
        self.ongoing_movement.x_acceleration = 0.0;
        self.ongoing_movement.x_velo = 0.0;
    }

    /// Stop the ongoing movement along Y.
    pub fn disable_ongoing_y_movement(&mut self) {
        self.ongoing_movement.y_acceleration = 0.0;
        self.ongoing_movement.y_velo = 0.0;
    }

    /// Shots scheduled for the current frame.
    pub fn get_shots_current_time(&self) -> Option<&[ShotSpec]> {
        self.shots.get(&self.time).map(Vec::as_slice)
    }

    // =========================================================================
    // Move expansion
    // =========================================================================

    /// Expand a movement descriptor into the move table.
    pub fn add_moves(&mut self, desc: &MoveDesc) {
        match desc {
            MoveDesc::Fixed(fixed) => self.add_fixed_moves(fixed),
            MoveDesc::Randomized(randomized) => self.add_randomized_moves(randomized),
            MoveDesc::Stop { times } => {
                for &time in times {
                    self.moves.insert(time, MoveCommand::Fixed(Movement::STILL));
                }
            }
            MoveDesc::Unknown => {
                warn!("Routine '{}': ignoring move descriptor of unknown type", self.name);
            }
        }
    }

    fn add_fixed_moves(&mut self, desc: &FixedMoveDesc) {
        let movement = Movement {
            x_acceleration: desc.x_acceleration,
            y_acceleration: desc.y_acceleration,
            x_velo: desc.x_velo,
            y_velo: desc.y_velo,
            can_leave: true,
        };
        for &time in &desc.times {
            self.moves.insert(time, MoveCommand::Fixed(movement));
        }
    }

    fn add_randomized_moves(&mut self, desc: &RandomizedMoveDesc) {
        let command = MoveCommand::Randomized {
            x_velo_range: ordered(desc.x_velo_range),
            y_velo_range: ordered(desc.y_velo_range),
            x_acceleration: desc.x_acceleration,
            y_acceleration: desc.y_acceleration,
        };
        for &time in &desc.times {
            self.moves.insert(time, command);
        }
    }

    // =========================================================================
    // Shot expansion
    // =========================================================================

    /// Expand a shot pattern descriptor into the shot table.
    pub fn add_shots(&mut self, desc: &ShotPatternDesc) {
        match desc {
            ShotPatternDesc::ShotArray(array) => self.add_shot_array(array),
            ShotPatternDesc::ShotRow(row) => self.add_shot_row(row),
            ShotPatternDesc::ShotCircle(circle) => self.add_shot_circle(circle),
            ShotPatternDesc::ShotTwister(twister) => self.add_shot_twister(twister),
            ShotPatternDesc::Unknown => {
                warn!("Routine '{}': ignoring shot pattern of unknown type", self.name);
            }
        }
    }

    fn push_shot(&mut self, time: u32, shot: ShotSpec) {
        self.shots.entry(time).or_default().push(shot);
    }

    fn add_shot_array(&mut self, desc: &ShotArrayDesc) {
        for shot in &desc.shots {
            let primitive = ShotSpec {
                anchor: desc.anchor,
                velocity: shot.velocity.to_components(),
                ..shot.clone()
            };
            for &time in &desc.times {
                self.push_shot(time, primitive.clone());
            }
        }
    }

    fn add_shot_row(&mut self, desc: &ShotRowDesc) {
        if desc.nr_shots <= 0 {
            return;
        }
        if desc.shot_ids.is_empty() || desc.speeds.is_empty() || desc.degrees.is_empty() {
            warn!("Routine '{}': ShotRow needs shot_ids, speeds and degrees", self.name);
            return;
        }

        let times = self.spawn_times(&desc.timing, "ShotRow");
        let x_interval = (desc.x_offset_end - desc.x_offset_start) / desc.nr_shots as f64;

        for i in 0..desc.nr_shots as usize {
            let shot = primitive_shot(
                entry_modulo(&desc.shot_ids, i).as_str(),
                *entry_modulo(&desc.speeds, i),
                *entry_modulo(&desc.degrees, i),
                desc.x_offset_start + x_interval * i as f64,
                desc.y_offset,
                desc.anchor,
                desc.damage,
            );
            for &time in &times {
                self.push_shot(time, shot.clone());
            }
        }
    }

    fn add_shot_circle(&mut self, desc: &ShotCircleDesc) {
        if desc.nr_shots <= 0 {
            return;
        }
        let needs_degrees = !desc.shot_spread && desc.degrees.is_empty();
        if desc.shot_ids.is_empty() || desc.speeds.is_empty() || needs_degrees {
            warn!("Routine '{}': ShotCircle needs shot_ids, speeds and degrees", self.name);
            return;
        }

        let times = self.spawn_times(&desc.timing, "ShotCircle");
        let start_degree = desc.start_degree.unwrap_or(0.0);
        let end_degree = desc.end_degree.unwrap_or(360.0);
        let degree_interval = (end_degree - start_degree) / desc.nr_shots as f64;

        for i in 0..desc.nr_shots as usize {
            let spawn_degree = start_degree + degree_interval * i as f64;
            let offset = divide_dist_x_and_y(desc.radius, spawn_degree);
            let shot_degree = if desc.shot_spread {
                spawn_degree
            } else {
                *entry_modulo(&desc.degrees, i)
            };
            let shot = primitive_shot(
                entry_modulo(&desc.shot_ids, i).as_str(),
                *entry_modulo(&desc.speeds, i),
                shot_degree,
                desc.x_offset + offset.x,
                desc.y_offset + offset.y,
                desc.anchor,
                desc.damage,
            );
            for &time in &times {
                self.push_shot(time, shot.clone());
            }
        }
    }

    fn add_shot_twister(&mut self, desc: &ShotTwisterDesc) {
        let nr_shots = ((desc.finish_degree - desc.start_degree) / desc.degree_offset).floor();
        if !nr_shots.is_finite() || nr_shots <= 0.0 {
            return;
        }
        if desc.shot_ids.is_empty() || desc.speeds.is_empty() {
            warn!("Routine '{}': ShotTwister needs shot_ids and speeds", self.name);
            return;
        }
        let nr_shots = nr_shots as u32;

        let full_time = (nr_shots - 1).saturating_mul(desc.time_interval);
        let cycle = full_time.saturating_add(desc.repeat_interval);
        if desc.continuous && cycle == 0 {
            warn!("Routine '{}': ShotTwister cycle length is zero, firing once", self.name);
        }
        let direction = desc.direction.multiplier();

        let mut cur_degree = desc.start_degree;
        let mut cur_time = desc.start_time;
        for i in 0..nr_shots as usize {
            let offset = divide_dist_x_and_y(desc.radius, cur_degree);
            let shot = primitive_shot(
                entry_modulo(&desc.shot_ids, i).as_str(),
                *entry_modulo(&desc.speeds, i),
                cur_degree,
                desc.x_offset + offset.x,
                desc.y_offset + offset.y,
                desc.anchor,
                desc.damage,
            );

            let times = if desc.continuous {
                let mut times = Vec::new();
                let mut next = cur_time;
                while next < self.duration {
                    times.push(next);
                    if cycle == 0 {
                        break;
                    }
                    next = next.saturating_add(cycle);
                }
                times
            } else {
                vec![cur_time]
            };
            for time in times {
                self.push_shot(time, shot.clone());
            }

            cur_degree += direction * desc.degree_offset;
            cur_time = cur_time.saturating_add(desc.time_interval);
        }
    }

    /// Spawn frames of a row or circle pattern.
    fn spawn_times(&self, timing: &SpawnTiming, pattern: &str) -> Vec<u32> {
        if !timing.continuous {
            return timing.times.clone();
        }
        if timing.interval == 0 {
            warn!("Routine '{}': {} has a zero interval, firing once", self.name, pattern);
            return if timing.start_time <= self.duration {
                vec![timing.start_time]
            } else {
                Vec::new()
            };
        }
        (timing.start_time..=self.duration)
            .step_by(timing.interval as usize)
            .collect()
    }
}

/// Cycle through a non-empty list.
fn entry_modulo<T>(items: &[T], index: usize) -> &T {
    &items[index % items.len()]
}

fn primitive_shot(
    shot_id: &str,
    speed: f64,
    degree: f64,
    x_offset: f64,
    y_offset: f64,
    anchor: Anchor,
    damage: Option<u32>,
) -> ShotSpec {
    ShotSpec {
        shot_id: shot_id.to_string(),
        x_offset,
        y_offset,
        anchor,
        damage,
        velocity: ShotVelocity::Polar { speed, degree }.to_components(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::vec2::Vec2;
    use serde_json::json;

    fn routine(value: serde_json::Value) -> Routine {
        let desc: RoutineDesc = serde_json::from_value(value).unwrap();
        Routine::from_desc(&desc)
    }

    fn velocity(shot: &ShotSpec) -> Vec2 {
        shot.velocity.resolve()
    }

    #[test]
    fn test_looping_wraps_to_zero() {
        let mut r = Routine::new("loop", true, 10, None);
        for _ in 0..11 {
            r.advance_timer();
        }
        assert_eq!(r.time(), 0);
        assert!(!r.is_finished());
    }

    #[test]
    fn test_non_looping_termination() {
        let mut r = Routine::new("once", false, 5, None);
        for t in 0..=5 {
            assert_eq!(r.time(), t);
            assert!(!r.is_finished());
            r.advance_timer();
        }
        assert_eq!(r.time(), 6);
        assert!(r.is_finished());
        r.advance_timer();
        assert!(r.is_finished());
    }

    #[test]
    fn test_hp_termination_precedence() {
        let mut r = Routine::new("tank", true, 1000, Some(1));
        assert_eq!(r.health_fraction(), Some(1.0));
        r.apply_damage(1);
        assert!(r.is_finished());
        assert_eq!(r.time(), 0);

        r.apply_damage(50);
        assert_eq!(r.cur_hp(), Some(0));
    }

    #[test]
    fn test_damage_without_hp_is_ignored() {
        let mut r = Routine::new("immortal", false, 10, None);
        r.apply_damage(100);
        assert!(!r.is_finished());
        assert_eq!(r.health_fraction(), None);
    }

    #[test]
    fn test_row_expansion_offsets() {
        let mut r = routine(json!({
            "name": "row", "duration": 10,
            "shots": [{
                "type": "ShotRow", "nr_shots": 4,
                "shot_ids": ["a", "b"], "speeds": [100], "degrees": [0],
                "x_offset_start": 0, "x_offset_end": 100, "y_offset": 7,
                "times": [3]
            }]
        }));

        for _ in 0..3 {
            r.advance_timer();
        }
        let shots = r.get_shots_current_time().unwrap();
        let offsets: Vec<f64> = shots.iter().map(|s| s.x_offset).collect();
        let ids: Vec<&str> = shots.iter().map(|s| s.shot_id.as_str()).collect();
        assert_eq!(offsets, vec![0.0, 25.0, 50.0, 75.0]);
        assert_eq!(ids, vec!["a", "b", "a", "b"]);
        assert!(shots.iter().all(|s| s.y_offset == 7.0));
        assert!(velocity(&shots[0]).approx_eq(Vec2::new(0.0, 100.0), 1e-9));
    }

    #[test]
    fn test_circle_full_sweep_angles() {
        let r = routine(json!({
            "name": "circle", "duration": 10,
            "shots": [{
                "type": "ShotCircle", "nr_shots": 4, "shot_spread": true,
                "shot_ids": ["orb"], "speeds": [10], "radius": 20,
                "times": [0]
            }]
        }));

        let shots = r.get_shots_current_time().unwrap();
        assert_eq!(shots.len(), 4);
        let expected_dirs = [(0.0, 1.0), (1.0, 0.0), (0.0, -1.0), (-1.0, 0.0)];
        for (shot, (dx, dy)) in shots.iter().zip(expected_dirs) {
            assert!(velocity(shot).approx_eq(Vec2::new(10.0 * dx, 10.0 * dy), 1e-9));
            assert!(Vec2::new(shot.x_offset, shot.y_offset).approx_eq(Vec2::new(20.0 * dx, 20.0 * dy), 1e-9));
        }
    }

    #[test]
    fn test_circle_without_spread_cycles_degrees() {
        let r = routine(json!({
            "name": "circle", "duration": 10,
            "shots": [{
                "type": "ShotCircle", "nr_shots": 2,
                "shot_ids": ["orb"], "speeds": [10], "degrees": [90],
                "start_degree": 0, "end_degree": 180,
                "times": [0]
            }]
        }));

        let shots = r.get_shots_current_time().unwrap();
        assert!(shots.iter().all(|s| velocity(s).approx_eq(Vec2::new(10.0, 0.0), 1e-9)));
    }

    #[test]
    fn test_twister_non_positive_guard() {
        let r = routine(json!({
            "name": "twister", "duration": 100,
            "shots": [
                {
                    "type": "ShotTwister", "speeds": [10], "shot_ids": ["s"],
                    "start_degree": 0, "finish_degree": 20, "degree_offset": 30,
                    "time_interval": 2
                },
                {
                    "type": "ShotTwister", "speeds": [10], "shot_ids": ["s"],
                    "start_degree": 90, "finish_degree": 0, "degree_offset": 10
                },
                {
                    "type": "ShotTwister", "speeds": [10], "shot_ids": ["s"],
                    "start_degree": 0, "finish_degree": 90, "degree_offset": 0
                }
            ]
        }));
        assert_eq!(r.shot_count(), 0);
    }

    #[test]
    fn test_twister_sweep_and_cycle() {
        let r = routine(json!({
            "name": "twister", "duration": 20,
            "shots": [{
                "type": "ShotTwister", "speeds": [10], "shot_ids": ["s"],
                "start_degree": 0, "finish_degree": 90, "degree_offset": 30,
                "direction": "clockwise", "start_time": 1, "time_interval": 2,
                "continuous": true, "repeat_interval": 4
            }]
        }));

        // 3 shots at times 1, 3, 5; cycle = 2 * 2 + 4 = 8
        let times: Vec<u32> = r.shot_times().collect();
        assert_eq!(times, vec![1, 3, 5, 9, 11, 13, 17, 19]);
        assert_eq!(r.shot_count(), 8);

        let mut r = r;
        for _ in 0..3 {
            r.advance_timer();
        }
        let shot = &r.get_shots_current_time().unwrap()[0];
        assert!(velocity(shot).approx_eq(Vec2::new(5.0, 10.0 * 30f64.to_radians().cos()), 1e-9));
    }

    #[test]
    fn test_twister_counterclockwise() {
        let r = routine(json!({
            "name": "twister", "duration": 20,
            "shots": [{
                "type": "ShotTwister", "speeds": [10], "shot_ids": ["s"],
                "start_degree": 90, "finish_degree": 180, "degree_offset": 90,
                "direction": "counterclockwise", "time_interval": 1
            }]
        }));
        let shot = &r.get_shots_current_time().unwrap()[0];
        assert!(velocity(shot).approx_eq(Vec2::new(10.0, 0.0), 1e-9));
        assert_eq!(r.shot_count(), 1);
    }

    #[test]
    fn test_continuous_row_includes_duration() {
        let r = routine(json!({
            "name": "row", "duration": 10,
            "shots": [{
                "type": "ShotRow", "nr_shots": 1,
                "shot_ids": ["a"], "speeds": [1], "degrees": [0],
                "x_offset_start": 0, "x_offset_end": 0,
                "continuous": true, "start_time": 0, "interval": 5
            }]
        }));
        assert_eq!(r.shot_times().collect::<Vec<_>>(), vec![0, 5, 10]);
    }

    #[test]
    fn test_zero_interval_fires_once() {
        let r = routine(json!({
            "name": "row", "duration": 10,
            "shots": [{
                "type": "ShotRow", "nr_shots": 2,
                "shot_ids": ["a"], "speeds": [1], "degrees": [0],
                "x_offset_start": 0, "x_offset_end": 10,
                "continuous": true, "start_time": 4, "interval": 0
            }]
        }));
        assert_eq!(r.shot_times().collect::<Vec<_>>(), vec![4]);
        assert_eq!(r.shot_count(), 2);
    }

    #[test]
    fn test_array_is_cartesian_in_insertion_order() {
        let r = routine(json!({
            "name": "array", "duration": 10,
            "shots": [
                {
                    "type": "ShotArray", "times": [0, 2], "anchor": "Bottom",
                    "shots": [
                        {"shot_id": "first", "speed": 1, "degree": 0, "damage": 3},
                        {"shot_id": "second", "x_velo": 2, "y_velo": 0, "anchor": "Top"}
                    ]
                },
                {
                    "type": "ShotArray", "times": [0],
                    "shots": [{"shot_id": "third", "speed": 1, "degree": 0}]
                }
            ]
        }));

        let at_zero: Vec<&str> = r
            .get_shots_current_time()
            .unwrap()
            .iter()
            .map(|s| s.shot_id.as_str())
            .collect();
        assert_eq!(at_zero, vec!["first", "second", "third"]);

        let first = &r.get_shots_current_time().unwrap()[0];
        assert_eq!(first.anchor, Anchor::Bottom);
        assert_eq!(first.damage, Some(3));
        assert!(matches!(first.velocity, ShotVelocity::Components { .. }));
        assert_eq!(r.shot_count(), 5);
    }

    #[test]
    fn test_no_shots_on_empty_frame() {
        let mut r = Routine::new("quiet", false, 5, None);
        r.advance_timer();
        assert!(r.get_shots_current_time().is_none());
    }

    #[test]
    fn test_fixed_movement_persists() {
        let mut r = routine(json!({
            "name": "move", "duration": 10,
            "moves": [{"type": "Fixed", "times": [1], "x_velo": 30, "y_acceleration": 2}]
        }));
        let mut rng = DeterministicRng::new(1);

        assert_eq!(r.get_moves_current_time(&mut rng), Movement::STILL);
        r.advance_timer();
        let at_one = r.get_moves_current_time(&mut rng);
        assert_eq!(at_one.x_velo, 30.0);
        assert_eq!(at_one.y_acceleration, 2.0);
        assert!(at_one.can_leave);

        r.advance_timer();
        r.advance_timer();
        assert_eq!(r.get_moves_current_time(&mut rng), at_one);
    }

    #[test]
    fn test_randomized_movement_sampled_once() {
        let mut r = routine(json!({
            "name": "wander", "duration": 10,
            "moves": [{"type": "Randomized", "times": [1], "x_velo_range": [50, -50], "y_velo_range": [10, 20]}]
        }));
        let mut rng = DeterministicRng::new(42);

        r.advance_timer();
        let sampled = r.get_moves_current_time(&mut rng);
        assert!(!sampled.can_leave);
        assert!((-50.0..=50.0).contains(&sampled.x_velo));
        assert!((10.0..=20.0).contains(&sampled.y_velo));

        // Consume randomness elsewhere; the ongoing movement must not change
        for _ in 0..10 {
            rng.next_u64();
        }
        r.advance_timer();
        r.advance_timer();
        assert_eq!(r.get_moves_current_time(&mut rng), sampled);
    }

    #[test]
    fn test_disable_single_axis() {
        let mut r = routine(json!({
            "name": "move", "duration": 10,
            "moves": [{"type": "Fixed", "times": [0], "x_velo": 5, "x_acceleration": 1, "y_velo": -3}]
        }));
        let mut rng = DeterministicRng::new(1);
        r.get_moves_current_time(&mut rng);

        r.disable_ongoing_x_movement();
        let movement = r.ongoing_movement();
        assert_eq!(movement.x_velo, 0.0);
        assert_eq!(movement.x_acceleration, 0.0);
        assert_eq!(movement.y_velo, -3.0);

        r.disable_ongoing_y_movement();
        assert_eq!(r.ongoing_movement().y_velo, 0.0);
    }

    #[test]
    fn test_stop_moves() {
        let mut r = routine(json!({
            "name": "halt", "duration": 10,
            "moves": [
                {"type": "Fixed", "times": [0], "x_velo": 5},
                {"type": "Stop", "times": [2]}
            ]
        }));
        let mut rng = DeterministicRng::new(1);
        assert_eq!(r.get_moves_current_time(&mut rng).x_velo, 5.0);
        r.advance_timer();
        r.advance_timer();
        assert_eq!(r.get_moves_current_time(&mut rng), Movement::STILL);
    }

    #[test]
    fn test_unknown_descriptors_expand_to_nothing() {
        let mut r = routine(json!({
            "name": "odd", "duration": 10,
            "moves": [{"type": "Teleport", "times": [0]}],
            "shots": [{"type": "ShotSpiral", "times": [0]}]
        }));
        let mut rng = DeterministicRng::new(1);
        assert_eq!(r.shot_count(), 0);
        assert_eq!(r.get_moves_current_time(&mut rng), Movement::STILL);
    }

    #[test]
    fn test_non_positive_nr_shots() {
        let r = routine(json!({
            "name": "empty", "duration": 10,
            "shots": [
                {
                    "type": "ShotRow", "nr_shots": 0,
                    "shot_ids": ["a"], "speeds": [1], "degrees": [0],
                    "x_offset_start": 0, "x_offset_end": 10, "times": [0]
                },
                {
                    "type": "ShotCircle", "nr_shots": -2, "shot_spread": true,
                    "shot_ids": ["a"], "speeds": [1], "times": [0]
                }
            ]
        }));
        assert_eq!(r.shot_count(), 0);
    }
}
