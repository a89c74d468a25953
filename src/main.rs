//! Bullet Hell Runner
//!
//! Headless fight runner. Plays a fight with scripted input, then replays
//! the recorded input and checks that both runs end in the same state.
//!
//! Usage: `bullet-hell [content_dir] [frames]`

use anyhow::{bail, Context, Result};
use serde_json::json;
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use bullet_hell::{
    replay_fight, Action, ContentCache, Fight, FightConfig, InputFrame, InputRecording, FRAME_RATE, VERSION,
    game::events::FightEventData,
};

/// Frames simulated when no count is given (one minute).
const DEFAULT_FRAMES: u32 = 60 * FRAME_RATE;

/// Optional content asset overriding the fight config.
const FIGHT_CONFIG_KEY: &str = "fight_config";

fn main() -> Result<()> {
    // Initialize logging
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = FmtSubscriber::builder().with_env_filter(filter).finish();
    tracing::subscriber::set_global_default(subscriber).context("Failed to set tracing subscriber")?;

    info!("Bullet Hell v{}", VERSION);

    let mut args = std::env::args().skip(1);
    let content = match args.next() {
        Some(dir) => ContentCache::from_dir(&dir).with_context(|| format!("Failed to load content from {}", dir))?,
        None => {
            info!("No content directory given, using the demo fight");
            demo_content()
        }
    };
    let frames = match args.next() {
        Some(n) => n.parse::<u32>().with_context(|| format!("Invalid frame count '{}'", n))?,
        None => DEFAULT_FRAMES,
    };

    let config = if content.contains(FIGHT_CONFIG_KEY) {
        content.get::<FightConfig>(FIGHT_CONFIG_KEY).context("Invalid fight config")?
    } else {
        FightConfig::default()
    };

    run_fight(content, config, frames)
}

/// Play the fight, then verify it by replay.
fn run_fight(content: ContentCache, config: FightConfig, frames: u32) -> Result<()> {
    info!("=== Starting Fight ===");
    info!("RNG Seed: {:#x}", config.rng_seed);

    let mut fight = Fight::new(content.clone(), config.clone()).context("Failed to set up the fight")?;
    let mut recording = InputRecording::new(config.rng_seed);
    let mut total_events = 0;

    for t in 0..frames {
        let raw = scripted_input(t);
        recording.record(t, raw);

        let result = fight.tick(raw);
        if result.pause_requested {
            info!("Pause requested at input frame {}, resuming", t);
            fight.resume();
        }
        total_events += result.events.len();

        for event in &result.events {
            match &event.data {
                FightEventData::PlayerHit { lives_left } => {
                    info!("Frame {}: player hit, {} lives left", event.frame, lives_left);
                }
                FightEventData::RoutineChanged { routine, .. } => {
                    info!("Frame {}: enemy switched to '{}'", event.frame, routine);
                }
                FightEventData::SpecialExecuted { name } => {
                    info!("Frame {}: special '{}'", event.frame, name);
                }
                _ => {}
            }
        }

        if t % (10 * FRAME_RATE) == 0 {
            let (player_bullets, enemy_bullets) = fight.bullet_counts();
            info!(
                "Frame {}: {} enemies, {}/{} bullets, energy {:.0}%",
                fight.frame(),
                fight.enemies().len(),
                player_bullets,
                enemy_bullets,
                fight.energy_percentage() * 100.0
            );
        }

        if result.game_over {
            info!("Fight over at input frame {}", t);
            break;
        }
    }

    info!("=== Fight Results ===");
    info!("Frames simulated: {}", fight.frame());
    info!("Lives left: {}", fight.state().cur_lives());
    if let Some(health) = fight.boss_health_percentage() {
        info!("Boss health: {:.0}%", health * 100.0);
    }
    info!("Total events: {}", total_events);
    info!("Recorded {} input changes (~{} bytes)", recording.delta_count(), recording.estimated_size());

    let hash = fight.compute_hash();
    info!("Final State Hash: {}", hex::encode(hash));

    info!("=== Verifying Determinism ===");
    let replayed = replay_fight(content, config, &recording).context("Failed to set up the replay")?;
    let replay_hash = replayed.compute_hash();
    info!("Replay State Hash: {}", hex::encode(replay_hash));

    if hash != replay_hash {
        bail!("Determinism failure: hashes differ");
    }
    info!("DETERMINISM VERIFIED: Hashes match!");
    Ok(())
}

/// Raw input of a scripted player.
///
/// Holds fire, strafes in 1.5 s legs, focuses every fourth leg, tries the
/// special every 5 s and taps pause once.
fn scripted_input(t: u32) -> InputFrame {
    let mut actions = vec![Action::Fire];

    let leg = t / 90;
    actions.push(if leg % 2 == 0 { Action::Left } else { Action::Right });
    if leg % 4 == 3 {
        actions.push(Action::Slow);
    }
    if t % 300 == 299 {
        actions.push(Action::Special);
        actions.push(Action::Up);
    }
    if t == 600 {
        actions.push(Action::Pause);
    }

    InputFrame::with_actions(&actions)
}

/// A small two-enemy fight.
fn demo_content() -> ContentCache {
    let mut cache = ContentCache::new();

    cache.insert("player_info", json!({
        "asset_folder": "ship",
        "weapon": {
            "fire_rate": 6,
            "bullet_speed": 900,
            "shots": [
                {"shot_id": "bolt", "x_offset": -8, "anchor": "Top", "speed": 900, "degree": 180},
                {"shot_id": "bolt", "x_offset": 8, "anchor": "Top", "speed": 900, "degree": 180}
            ]
        },
        "movement": {"normal": 420, "slowed": 160},
        "invincibility_window": 90,
        "lives": 5,
        "special": {"name": "blink", "energy_required": 100}
    }));

    cache.insert("level_event_info", json!([
        {"time": 30, "type": "enemy", "id": "warden"},
        {"time": 900, "type": "enemy", "id": "drone"}
    ]));

    cache.insert("sprite_sizes", json!({
        "player_sprite": {"width": 48, "height": 48},
        "warden": {"width": 160, "height": 128},
        "drone": {"width": 64, "height": 48},
        "bolt": {"width": 8, "height": 24},
        "pellet": {"width": 16, "height": 16},
        "needle": {"width": 8, "height": 32}
    }));

    cache.insert("warden", json!({
        "type": "boss", "id": "warden",
        "routines": [{"name": "warden_opening"}, {"name": "warden_spiral"}]
    }));
    cache.insert("warden_opening", json!({
        "name": "warden_opening", "duration": 600,
        "moves": [
            {"type": "Fixed", "times": [0], "y_velo": 60},
            {"type": "Stop", "times": [120]},
            {"type": "Randomized", "times": [240, 420], "x_velo_range": [-200, 200], "y_velo_range": [-30, 30]}
        ],
        "shots": [
            {
                "type": "ShotRow", "nr_shots": 8, "anchor": "Bottom",
                "shot_ids": ["pellet"], "speeds": [240], "degrees": [0],
                "x_offset_start": -160, "x_offset_end": 160,
                "continuous": true, "interval": 45, "start_time": 150
            },
            {
                "type": "ShotArray", "times": [300, 450], "anchor": "Bottom",
                "shots": [
                    {"shot_id": "needle", "speed": 420, "degree": -15},
                    {"shot_id": "needle", "speed": 420, "degree": 0},
                    {"shot_id": "needle", "speed": 420, "degree": 15}
                ]
            }
        ]
    }));
    cache.insert("warden_spiral", json!({
        "name": "warden_spiral", "loops": true, "duration": 480, "hp": 400,
        "moves": [
            {"type": "Randomized", "times": [0, 240], "x_velo_range": [-120, 120], "y_velo_range": [-20, 20]}
        ],
        "shots": [
            {
                "type": "ShotTwister", "speeds": [200], "shot_ids": ["pellet"],
                "start_degree": 0, "finish_degree": 360, "degree_offset": 20,
                "time_interval": 3, "radius": 40, "continuous": true, "repeat_interval": 30
            },
            {
                "type": "ShotCircle", "nr_shots": 12, "shot_spread": true,
                "shot_ids": ["needle"], "speeds": [150], "radius": 60,
                "times": [120, 360]
            }
        ]
    }));

    cache.insert("drone", json!({
        "id": "drone",
        "routines": [{"name": "drone_pass"}]
    }));
    cache.insert("drone_pass", json!({
        "name": "drone_pass", "duration": 420, "hp": 30,
        "moves": [{"type": "Fixed", "times": [0], "x_velo": 180, "y_velo": 40}],
        "shots": [{
            "type": "ShotCircle", "nr_shots": 6, "anchor": "Bottom",
            "shot_ids": ["pellet"], "speeds": [180], "degrees": [-30, 0, 30],
            "continuous": true, "interval": 60
        }]
    }));

    cache
}
