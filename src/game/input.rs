//! Input Capture and Key Tracking
//!
//! The simulation only ever reads whether a logical action is active.
//! `InputFrame` packs the nine actions into one bit set; `KeyTracker` turns
//! raw pressed state into active state (blocking, debouncing, pause edge
//! detection); `InputRecording` stores a delta-compressed input stream for
//! replay verification.

use std::collections::BTreeMap;

use serde::{Serialize, Deserialize};
use tracing::debug;

use crate::core::timer::{Scheduler, TimerId};

// =============================================================================
// ACTIONS
// =============================================================================

/// Logical input actions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Action {
    /// Move up
    Up,
    /// Move down
    Down,
    /// Move left
    Left,
    /// Move right
    Right,
    /// Slow movement modifier
    Slow,
    /// Fire the weapon
    Fire,
    /// Trigger the special
    Special,
    /// Pause the fight
    Pause,
    /// Accept a prompt
    Enter,
}

impl Action {
    /// Every action, in bit order.
    pub const ALL: [Action; 9] = [
        Action::Up,
        Action::Down,
        Action::Left,
        Action::Right,
        Action::Slow,
        Action::Fire,
        Action::Special,
        Action::Pause,
        Action::Enter,
    ];

    /// Bit of this action inside an `InputFrame`.
    #[inline]
    pub const fn bit(self) -> u16 {
        1 << (self as u16)
    }
}

// =============================================================================
// INPUT FRAME
// =============================================================================

/// Active actions of a single frame, one bit per action.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct InputFrame {
    /// Packed action bits (see `Action::bit`)
    pub flags: u16,
}

impl InputFrame {
    /// Size in bytes
    pub const SIZE: usize = 2;

    /// Create an idle frame.
    pub const fn new() -> Self {
        Self { flags: 0 }
    }

    /// Create a frame with the given actions active.
    pub fn with_actions(actions: &[Action]) -> Self {
        let mut frame = Self::new();
        for &action in actions {
            frame.set(action, true);
        }
        frame
    }

    /// Check whether an action is active.
    #[inline]
    pub fn is_active(&self, action: Action) -> bool {
        self.flags & action.bit() != 0
    }

    /// Set or clear an action.
    #[inline]
    pub fn set(&mut self, action: Action, active: bool) {
        if active {
            self.flags |= action.bit();
        } else {
            self.flags &= !action.bit();
        }
    }

    /// Check if no action is active.
    #[inline]
    pub fn is_idle(&self) -> bool {
        self.flags == 0
    }

    /// Up held without down.
    pub fn up_only(&self) -> bool {
        self.is_active(Action::Up) && !self.is_active(Action::Down)
    }

    /// Down held without up.
    pub fn down_only(&self) -> bool {
        self.is_active(Action::Down) && !self.is_active(Action::Up)
    }

    /// Left held without right.
    pub fn left_only(&self) -> bool {
        self.is_active(Action::Left) && !self.is_active(Action::Right)
    }

    /// Right held without left.
    pub fn right_only(&self) -> bool {
        self.is_active(Action::Right) && !self.is_active(Action::Left)
    }
}

// =============================================================================
// KEY TRACKER
// =============================================================================

/// Turns raw pressed state into active state.
///
/// A pressed key is active unless it is blocked. The pause key only counts
/// as active on the frame it goes down. Debounced keys are blocked until
/// their timer runs out or the key is released.
#[derive(Clone, Debug, Default)]
pub struct KeyTracker {
    active: InputFrame,
    pressed: InputFrame,
    first_pressed: InputFrame,
    blocked: InputFrame,
    pause_held: bool,
    debounce: Scheduler<Action>,
    debounce_timers: BTreeMap<Action, Vec<TimerId>>,
}

impl KeyTracker {
    /// Create a tracker with nothing pressed.
    pub fn new() -> Self {
        Self::default()
    }

    /// Actions active after the last update.
    pub fn active(&self) -> InputFrame {
        self.active
    }

    /// Whether a key is physically held.
    pub fn is_pressed(&self, action: Action) -> bool {
        self.pressed.is_active(action)
    }

    /// Whether a key went down on the last update.
    pub fn is_first_pressed(&self, action: Action) -> bool {
        self.first_pressed.is_active(action)
    }

    /// Whether a key is blocked.
    pub fn is_blocked(&self, action: Action) -> bool {
        self.blocked.is_active(action)
    }

    /// Feed one frame of raw pressed state; returns the active actions.
    pub fn update(&mut self, raw: InputFrame) -> InputFrame {
        for action in self.debounce.advance() {
            self.set_key_unblocked(action);
        }
        let debounce = &self.debounce;
        self.debounce_timers.retain(|_, timers| {
            timers.retain(|id| debounce.is_pending(*id));
            !timers.is_empty()
        });

        for action in Action::ALL {
            let pressed = raw.is_active(action);
            let released = !pressed && self.is_pressed(action);
            if released && self.debounce_timers.contains_key(&action) {
                self.clear_debounce(action);
            }
            self.mark_pressed(action, pressed);

            let mut active = pressed && !self.is_blocked(action);
            if action == Action::Pause {
                active = active && !self.pause_held;
                self.pause_held = pressed && !self.is_blocked(action);
            }
            self.active.set(action, active);
        }
        self.active
    }

    fn mark_pressed(&mut self, action: Action, pressed: bool) {
        if pressed {
            let first = !self.pressed.is_active(action);
            self.pressed.set(action, true);
            self.first_pressed.set(action, first);
        } else {
            self.pressed.set(action, false);
            self.first_pressed.set(action, false);
        }
    }

    /// Block a key.
    pub fn set_key_blocked(&mut self, action: Action) {
        self.blocked.set(action, true);
    }

    /// Unblock a key.
    pub fn set_key_unblocked(&mut self, action: Action) {
        self.blocked.set(action, false);
    }

    /// Lift every block.
    pub fn remove_all_blocks(&mut self) {
        self.blocked = InputFrame::new();
    }

    /// Block a key for `delay` frames.
    pub fn debounce_key(&mut self, action: Action, delay: u64) -> TimerId {
        self.set_key_blocked(action);
        let id = self.debounce.schedule_once(delay, action);
        self.debounce_timers.entry(action).or_default().push(id);
        debug!("Debouncing {:?} for {} frames", action, delay);
        id
    }

    /// Cancel every pending debounce timer of a key and unblock it.
    pub fn clear_debounce(&mut self, action: Action) {
        if let Some(timers) = self.debounce_timers.remove(&action) {
            for id in timers {
                self.debounce.cancel(id);
            }
        }
        self.set_key_unblocked(action);
    }

    /// Drop all debounce timers and blocks (leaving a menu).
    pub fn release_all(&mut self) {
        let actions: Vec<Action> = self.debounce_timers.keys().copied().collect();
        for action in actions {
            self.clear_debounce(action);
        }
        self.remove_all_blocks();
    }
}

// =============================================================================
// RECORDING
// =============================================================================

/// Input state that started on a frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputDelta {
    /// Frame when this input state began
    pub frame: u32,
    /// The new input state
    pub input: InputFrame,
}

impl InputDelta {
    /// Size in bytes (approximate)
    pub const SIZE: usize = 6;
}

/// Delta-compressed input stream of one fight.
///
/// Only frames where the input changes are stored.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct InputRecording {
    /// RNG seed used for the fight
    pub rng_seed: u64,
    /// Last recorded frame
    pub end_frame: u32,
    deltas: Vec<InputDelta>,
    #[serde(skip)]
    last_input: InputFrame,
}

impl InputRecording {
    /// Create an empty recording.
    pub fn new(rng_seed: u64) -> Self {
        Self {
            rng_seed,
            end_frame: 0,
            deltas: Vec::with_capacity(256),
            last_input: InputFrame::new(),
        }
    }

    /// Record the input of a frame.
    pub fn record(&mut self, frame: u32, input: InputFrame) {
        self.end_frame = frame;
        if input != self.last_input || self.deltas.is_empty() {
            self.deltas.push(InputDelta { frame, input });
            self.last_input = input;
        }
    }

    /// Input in effect on a frame.
    pub fn get_input_at(&self, frame: u32) -> InputFrame {
        let idx = self.deltas.partition_point(|d| d.frame <= frame);
        if idx == 0 {
            InputFrame::new()
        } else {
            self.deltas[idx - 1].input
        }
    }

    /// All stored deltas.
    pub fn deltas(&self) -> &[InputDelta] {
        &self.deltas
    }

    /// Number of stored deltas.
    pub fn delta_count(&self) -> usize {
        self.deltas.len()
    }

    /// Estimated size in bytes.
    pub fn estimated_size(&self) -> usize {
        12 + self.deltas.len() * InputDelta::SIZE
    }

    /// Iterate the input of every frame from 0 to `end_frame`.
    pub fn replay_iter(&self) -> ReplayIterator<'_> {
        ReplayIterator {
            recording: self,
            current_frame: 0,
            delta_idx: 0,
            current_input: InputFrame::new(),
        }
    }
}

/// Iterator for replaying inputs frame by frame.
pub struct ReplayIterator<'a> {
    recording: &'a InputRecording,
    current_frame: u32,
    delta_idx: usize,
    current_input: InputFrame,
}

impl<'a> Iterator for ReplayIterator<'a> {
    type Item = (u32, InputFrame);

    fn next(&mut self) -> Option<Self::Item> {
        if self.recording.deltas.is_empty() || self.current_frame > self.recording.end_frame {
            return None;
        }

        while let Some(delta) = self.recording.deltas.get(self.delta_idx) {
            if delta.frame > self.current_frame {
                break;
            }
            self.current_input = delta.input;
            self.delta_idx += 1;
        }

        let item = (self.current_frame, self.current_input);
        self.current_frame += 1;
        Some(item)
    }
}

// =============================================================================
// TESTS
// =============================================================================
