//! Content Descriptors and Asset Cache
//!
//! JSON blueprints for routines, enemies, the player and the level
//! timeline. Field names here are the content contract: they match the
//! files authored for the game exactly.
//!
//! Descriptor families are closed sum types. A `type` string the
//! interpreter does not know deserializes to `Unknown` and expands to
//! nothing (reported as a warning when the routine is built).

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Serialize, Deserialize};
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::debug;

use crate::game::shot::{Anchor, ShotSpec};

/// Key of the player blueprint.
pub const PLAYER_INFO_KEY: &str = "player_info";

/// Key of the level spawn timeline.
pub const LEVEL_EVENT_INFO_KEY: &str = "level_event_info";

/// Key of the optional sprite size table.
pub const SPRITE_SIZES_KEY: &str = "sprite_sizes";

// =============================================================================
// ERRORS
// =============================================================================

/// Errors raised while loading content. Always surfaced at load time.
#[derive(Debug, Error)]
pub enum ContentError {
    /// No asset stored under the key
    #[error("missing content asset '{0}'")]
    MissingAsset(String),

    /// The asset does not match the expected shape
    #[error("malformed content asset '{key}': {source}")]
    Malformed {
        /// Asset key
        key: String,
        /// Underlying parse error
        #[source]
        source: serde_json::Error,
    },

    /// Reading a content file failed
    #[error("failed to read content file {path}: {source}")]
    Io {
        /// File that failed
        path: PathBuf,
        /// Underlying IO error
        #[source]
        source: std::io::Error,
    },
}

// =============================================================================
// MOVE DESCRIPTORS
// =============================================================================

/// Scripted movement entries of a routine.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum MoveDesc {
    /// Explicit kinematics; the enemy may leave its limits
    Fixed(FixedMoveDesc),
    /// Velocity sampled from ranges; the enemy stays inside its limits
    Randomized(RandomizedMoveDesc),
    /// Halt all motion at the listed times
    Stop {
        /// Frames at which to stop
        times: Vec<u32>,
    },
    /// Unrecognised `type`
    #[serde(other)]
    Unknown,
}

/// Explicit movement.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FixedMoveDesc {
    /// Frames at which this movement becomes current
    pub times: Vec<u32>,
    /// Acceleration along X
    #[serde(default)]
    pub x_acceleration: f64,
    /// Acceleration along Y
    #[serde(default)]
    pub y_acceleration: f64,
    /// Velocity along X
    #[serde(default)]
    pub x_velo: f64,
    /// Velocity along Y
    #[serde(default)]
    pub y_velo: f64,
}

/// Movement with a randomly sampled velocity.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RandomizedMoveDesc {
    /// Frames at which a fresh velocity is sampled
    pub times: Vec<u32>,
    /// Inclusive integer range for the X velocity
    pub x_velo_range: [i64; 2],
    /// Inclusive integer range for the Y velocity
    pub y_velo_range: [i64; 2],
    /// Acceleration along X
    #[serde(default)]
    pub x_acceleration: f64,
    /// Acceleration along Y
    #[serde(default)]
    pub y_acceleration: f64,
}

// =============================================================================
// SHOT PATTERN DESCRIPTORS
// =============================================================================

/// Shot patterns of a routine, expanded into single shots at build time.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ShotPatternDesc {
    /// Every listed shot at every listed time
    ShotArray(ShotArrayDesc),
    /// Shots spread along a horizontal line
    ShotRow(ShotRowDesc),
    /// Shots spread around a circle
    ShotCircle(ShotCircleDesc),
    /// Shots sweeping around a circle over time
    ShotTwister(ShotTwisterDesc),
    /// Unrecognised `type`
    #[serde(other)]
    Unknown,
}

impl ShotPatternDesc {
    /// Name of the pattern family, for diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            ShotPatternDesc::ShotArray(_) => "ShotArray",
            ShotPatternDesc::ShotRow(_) => "ShotRow",
            ShotPatternDesc::ShotCircle(_) => "ShotCircle",
            ShotPatternDesc::ShotTwister(_) => "ShotTwister",
            ShotPatternDesc::Unknown => "Unknown",
        }
    }
}

/// Explicit shots at explicit times.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ShotArrayDesc {
    /// Frames at which every shot fires
    pub times: Vec<u32>,
    /// The shots (anchor is overridden by the pattern's anchor)
    pub shots: Vec<ShotSpec>,
    /// Anchor for all shots
    #[serde(default)]
    pub anchor: Anchor,
}

/// When a row or circle pattern fires.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SpawnTiming {
    /// Repeat every `interval` frames from `start_time` to the routine's end
    #[serde(default)]
    pub continuous: bool,
    /// Explicit frames (non-continuous)
    #[serde(default)]
    pub times: Vec<u32>,
    /// Frames between repeats (continuous)
    #[serde(default)]
    pub interval: u32,
    /// First frame (continuous)
    #[serde(default)]
    pub start_time: u32,
}

/// Shots evenly spaced along a line.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ShotRowDesc {
    /// Number of shots in the row
    pub nr_shots: i64,
    /// Anchor for the row
    #[serde(default)]
    pub anchor: Anchor,
    /// Shot asset ids, cycled
    pub shot_ids: Vec<String>,
    /// Shot speeds, cycled
    pub speeds: Vec<f64>,
    /// Shot travel angles, cycled
    pub degrees: Vec<f64>,
    /// X offset of the first shot
    pub x_offset_start: f64,
    /// End of the row's X span
    pub x_offset_end: f64,
    /// Y offset of every shot
    #[serde(default)]
    pub y_offset: f64,
    /// Damage of every shot
    #[serde(default)]
    pub damage: Option<u32>,
    /// Spawn times
    #[serde(flatten)]
    pub timing: SpawnTiming,
}

/// Shots evenly spaced around a circle.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ShotCircleDesc {
    /// Number of shots on the circle
    pub nr_shots: i64,
    /// Anchor for the circle centre
    #[serde(default)]
    pub anchor: Anchor,
    /// Shot asset ids, cycled
    pub shot_ids: Vec<String>,
    /// Shot speeds, cycled
    pub speeds: Vec<f64>,
    /// Travel angle equals spawn angle
    #[serde(default)]
    pub shot_spread: bool,
    /// Travel angles, cycled (ignored with `shot_spread`)
    #[serde(default)]
    pub degrees: Vec<f64>,
    /// X offset of the circle centre
    #[serde(default)]
    pub x_offset: f64,
    /// Y offset of the circle centre
    #[serde(default)]
    pub y_offset: f64,
    /// Angle of the first shot (default 0)
    #[serde(default)]
    pub start_degree: Option<f64>,
    /// End of the angular span (default 360)
    #[serde(default)]
    pub end_degree: Option<f64>,
    /// Circle radius
    #[serde(default)]
    pub radius: f64,
    /// Damage of every shot
    #[serde(default)]
    pub damage: Option<u32>,
    /// Spawn times
    #[serde(flatten)]
    pub timing: SpawnTiming,
}

/// Rotation of a twister sweep.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Increasing angles
    Clockwise,
    /// Decreasing angles
    #[default]
    #[serde(other)]
    Counterclockwise,
}

impl Direction {
    /// Sign applied to the degree step.
    pub fn multiplier(self) -> f64 {
        match self {
            Direction::Clockwise => 1.0,
            Direction::Counterclockwise => -1.0,
        }
    }
}

/// A sweep of shots at increasing angle and time offsets.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ShotTwisterDesc {
    /// Anchor for the sweep centre
    #[serde(default)]
    pub anchor: Anchor,
    /// X offset of the sweep centre
    #[serde(default)]
    pub x_offset: f64,
    /// Y offset of the sweep centre
    #[serde(default)]
    pub y_offset: f64,
    /// Shot speeds, cycled
    pub speeds: Vec<f64>,
    /// Angle of the first shot
    pub start_degree: f64,
    /// End of the angular sweep
    pub finish_degree: f64,
    /// Rotation direction
    #[serde(default)]
    pub direction: Direction,
    /// Angle between consecutive shots
    pub degree_offset: f64,
    /// Shot asset ids, cycled
    pub shot_ids: Vec<String>,
    /// Frame of the first shot
    #[serde(default)]
    pub start_time: u32,
    /// Frames between consecutive shots
    #[serde(default)]
    pub time_interval: u32,
    /// Distance of spawn points from the centre
    #[serde(default)]
    pub radius: f64,
    /// Repeat the sweep until the routine ends
    #[serde(default)]
    pub continuous: bool,
    /// Pause between sweeps (continuous)
    #[serde(default)]
    pub repeat_interval: u32,
    /// Damage of every shot
    #[serde(default)]
    pub damage: Option<u32>,
}

// =============================================================================
// BLUEPRINTS
// =============================================================================

/// One routine (phase) of an enemy.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RoutineDesc {
    /// Routine identifier
    pub name: String,
    /// Restart from frame 0 after `duration`
    #[serde(default)]
    pub loops: bool,
    /// Last frame of the routine
    pub duration: u32,
    /// Hit points; the routine ends when they run out
    #[serde(default)]
    pub hp: Option<u32>,
    /// Movement descriptors
    #[serde(default)]
    pub moves: Vec<MoveDesc>,
    /// Shot pattern descriptors
    #[serde(default)]
    pub shots: Vec<ShotPatternDesc>,
}

/// Behaviour class of an enemy.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EnemyKind {
    /// Confined to the upper band of the screen
    Boss,
    /// No movement limits
    #[default]
    #[serde(other)]
    Default,
}

/// Reference to a routine asset.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoutineRef {
    /// Asset key of the routine
    pub name: String,
}

/// Enemy blueprint.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EnemyBlueprint {
    /// Behaviour class
    #[serde(rename = "type", default)]
    pub kind: EnemyKind,
    /// Sprite asset id
    pub id: String,
    /// Routines in play order
    pub routines: Vec<RoutineRef>,
}

/// Player weapon.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WeaponDesc {
    /// Frames between volleys
    pub fire_rate: u32,
    /// Shots of one volley
    pub shots: Vec<ShotSpec>,
    /// Nominal bullet speed (informational)
    #[serde(default)]
    pub bullet_speed: Option<f64>,
}

/// Player speeds.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct MovementDesc {
    /// Speed without the slow modifier
    pub normal: f64,
    /// Speed with the slow modifier held
    pub slowed: f64,
}

/// Player special action.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SpecialDesc {
    /// Special identifier (e.g. `blink`)
    pub name: String,
    /// Energy needed to trigger it
    pub energy_required: u32,
}

/// Player blueprint.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PlayerBlueprint {
    /// Folder of the player's sprites
    pub asset_folder: String,
    /// Weapon
    pub weapon: WeaponDesc,
    /// Speeds
    pub movement: MovementDesc,
    /// Invincibility after a hit, in frames
    pub invincibility_window: u64,
    /// Starting lives
    pub lives: i32,
    /// Special action
    pub special: SpecialDesc,
}

/// One entry of the level timeline.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelEvent {
    /// Fight frame at which the event fires
    pub time: u32,
    /// Event kind (`enemy`)
    #[serde(rename = "type")]
    pub kind: String,
    /// Asset key of the subject (enemy blueprint)
    pub id: String,
}

/// Pixel size of a sprite.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct SpriteSize {
    /// Width
    pub width: f64,
    /// Height
    pub height: f64,
}

// =============================================================================
// CACHE
// =============================================================================

/// Keyed JSON asset cache.
#[derive(Clone, Debug, Default)]
pub struct ContentCache {
    entries: BTreeMap<String, serde_json::Value>,
}

impl ContentCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Load every `*.json` file of a directory, keyed by file stem.
    pub fn from_dir(dir: impl AsRef<Path>) -> Result<Self, ContentError> {
        let dir = dir.as_ref();
        let io_err = |source| ContentError::Io { path: dir.to_path_buf(), source };

        let mut paths: Vec<PathBuf> = fs::read_dir(dir)
            .map_err(io_err)?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| path.extension().is_some_and(|ext| ext == "json"))
            .collect();
        paths.sort();

        let mut cache = Self::new();
        for path in paths {
            let Some(key) = path.file_stem().and_then(|s| s.to_str()).map(str::to_string) else {
                continue;
            };
            let text = fs::read_to_string(&path)
                .map_err(|source| ContentError::Io { path: path.clone(), source })?;
            cache.insert_str(&key, &text)?;
            debug!("Loaded content asset '{}' from {}", key, path.display());
        }
        Ok(cache)
    }

    /// Store a parsed value.
    pub fn insert(&mut self, key: &str, value: serde_json::Value) {
        self.entries.insert(key.to_string(), value);
    }

    /// Parse and store a JSON document.
    pub fn insert_str(&mut self, key: &str, json: &str) -> Result<(), ContentError> {
        let value = serde_json::from_str(json)
            .map_err(|source| ContentError::Malformed { key: key.to_string(), source })?;
        self.insert(key, value);
        Ok(())
    }

    /// Check whether a key is present.
    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Number of stored assets.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Raw JSON of an asset.
    pub fn raw(&self, key: &str) -> Option<&serde_json::Value> {
        self.entries.get(key)
    }

    /// Deserialize an asset.
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Result<T, ContentError> {
        let value = self
            .entries
            .get(key)
            .ok_or_else(|| ContentError::MissingAsset(key.to_string()))?;
        T::deserialize(value)
            .map_err(|source| ContentError::Malformed { key: key.to_string(), source })
    }

    /// Routine descriptor by name.
    pub fn routine(&self, name: &str) -> Result<RoutineDesc, ContentError> {
        self.get(name)
    }

    /// Enemy blueprint by id.
    pub fn enemy(&self, id: &str) -> Result<EnemyBlueprint, ContentError> {
        self.get(id)
    }

    /// The player blueprint.
    pub fn player(&self) -> Result<PlayerBlueprint, ContentError> {
        self.get(PLAYER_INFO_KEY)
    }

    /// The level timeline.
    pub fn level_events(&self) -> Result<Vec<LevelEvent>, ContentError> {
        self.get(LEVEL_EVENT_INFO_KEY)
    }

    /// The sprite size table (empty if absent).
    pub fn sprite_sizes(&self) -> Result<BTreeMap<String, SpriteSize>, ContentError> {
        if self.contains(SPRITE_SIZES_KEY) {
            self.get(SPRITE_SIZES_KEY)
        } else {
            Ok(BTreeMap::new())
        }
    }
}
