//! Enemy Event Tracker
//!
//! Sequences the routines of one enemy. The cursor only moves forward;
//! running out of routines means the enemy is done.

use tracing::info;

use crate::core::rng::DeterministicRng;
use crate::game::routine::{Movement, Routine};
use crate::game::shot::ShotSpec;

/// Ordered routines plus a forward-only cursor.
#[derive(Clone, Debug)]
pub struct EnemyEventTracker {
    routines: Vec<Routine>,
    cur_routine: usize,
}

impl EnemyEventTracker {
    /// Create a tracker positioned on the first routine.
    pub fn new(routines: Vec<Routine>) -> Self {
        Self { routines, cur_routine: 0 }
    }

    /// Index of the active routine.
    pub fn cur_routine_index(&self) -> usize {
        self.cur_routine
    }

    /// Number of routines.
    pub fn routine_count(&self) -> usize {
        self.routines.len()
    }

    /// The active routine, if any.
    pub fn current_routine(&self) -> Option<&Routine> {
        self.routines.get(self.cur_routine)
    }

    fn current_routine_mut(&mut self) -> Option<&mut Routine> {
        self.routines.get_mut(self.cur_routine)
    }

    /// Whether the active routine has finished. A tracker without routines
    /// counts as finished.
    pub fn is_current_routine_finished(&self) -> bool {
        self.current_routine().map_or(true, Routine::is_finished)
    }

    /// Whether a routine follows the active one.
    pub fn exist_next_routine(&self) -> bool {
        self.cur_routine + 1 < self.routines.len()
    }

    /// Move the cursor to the next routine. Does nothing past the last one.
    pub fn advance_routine(&mut self) {
        if !self.exist_next_routine() {
            return;
        }
        self.cur_routine += 1;
        if let Some(routine) = self.current_routine() {
            info!("Routine transition -> '{}' ({}/{})", routine.name(), self.cur_routine + 1, self.routines.len());
        }
    }

    /// Movement of the active routine for this frame.
    pub fn get_next_moves(&mut self, rng: &mut DeterministicRng) -> Movement {
        self.current_routine_mut()
            .map_or(Movement::STILL, |routine| routine.get_moves_current_time(rng))
    }

    /// Shots of the active routine for this frame.
    pub fn get_next_shots(&self) -> Option<&[ShotSpec]> {
        self.current_routine().and_then(Routine::get_shots_current_time)
    }

    /// Damage the active routine.
    pub fn apply_damage(&mut self, damage: u32) {
        if let Some(routine) = self.current_routine_mut() {
            routine.apply_damage(damage);
        }
    }

    /// Stop the active routine's ongoing X movement.
    pub fn disable_ongoing_x_movement(&mut self) {
        if let Some(routine) = self.current_routine_mut() {
            routine.disable_ongoing_x_movement();
        }
    }

    /// Stop the active routine's ongoing Y movement.
    pub fn disable_ongoing_y_movement(&mut self) {
        if let Some(routine) = self.current_routine_mut() {
            routine.disable_ongoing_y_movement();
        }
    }

    /// Advance the active routine's frame counter.
    pub fn update_current_routine(&mut self) {
        if let Some(routine) = self.current_routine_mut() {
            routine.advance_timer();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tracker() -> EnemyEventTracker {
        EnemyEventTracker::new(vec![
            Routine::new("first", false, 1, Some(5)),
            Routine::new("second", false, 3, Some(10)),
        ])
    }

    #[test]
    fn test_cursor_moves_forward_only() {
        let mut t = tracker();
        assert_eq!(t.cur_routine_index(), 0);
        assert!(t.exist_next_routine());

        t.advance_routine();
        assert_eq!(t.cur_routine_index(), 1);
        assert!(!t.exist_next_routine());

        t.advance_routine();
        assert_eq!(t.cur_routine_index(), 1);
    }

    #[test]
    fn test_damage_goes_to_active_routine() {
        let mut t = tracker();
        t.apply_damage(5);
        assert!(t.is_current_routine_finished());

        t.advance_routine();
        assert_eq!(t.current_routine().unwrap().cur_hp(), Some(10));
        assert!(!t.is_current_routine_finished());
    }

    #[test]
    fn test_timer_delegation() {
        let mut t = tracker();
        t.update_current_routine();
        t.update_current_routine();
        assert!(t.is_current_routine_finished());
        assert_eq!(t.routines[1].time(), 0);
    }

    #[test]
    fn test_empty_tracker_is_finished() {
        let mut t = EnemyEventTracker::new(Vec::new());
        let mut rng = DeterministicRng::new(0);
        assert!(t.is_current_routine_finished());
        assert!(!t.exist_next_routine());
        assert_eq!(t.get_next_moves(&mut rng), Movement::STILL);
        assert!(t.get_next_shots().is_none());
    }
}
