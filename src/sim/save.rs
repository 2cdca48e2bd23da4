/// Save and load run progress.
///
/// A single auto-save file, written when the player leaves a run via
/// Escape. Key-value lines:
///
///   level=1
///   score=240
///   coins=4
///   health=2
///   player=812.5,1340.0,R
///
/// Corrupt or partial files parse to None and are treated as no save.

use std::path::PathBuf;

use crate::domain::entity::Facing;
use crate::sim::world::WorldState;

const SAVE_FILE: &str = "save.dat";

#[derive(Clone, Debug, PartialEq)]
pub struct SaveData {
    pub level: usize,
    pub score: u32,
    pub coins_collected: usize,
    pub health: u32,
    pub player_x: f32,
    pub player_y: f32,
    pub facing: Facing,
}

// ══════════════════════════════════════════════════════════════
// Paths
// ══════════════════════════════════════════════════════════════

fn save_dir() -> PathBuf {
    // 1. Try exe directory (works for local/portable installs)
    if let Ok(exe) = std::env::current_exe() {
        let resolved = exe.canonicalize().unwrap_or(exe);
        if let Some(parent) = resolved.parent() {
            // Check if writable (system installs won't be)
            let test_path = parent.join(".write_test_thicket");
            if std::fs::write(&test_path, "").is_ok() {
                let _ = std::fs::remove_file(&test_path);
                return parent.to_path_buf();
            }
        }
    }

    // 2. XDG data home (~/.local/share/thicket) for system installs
    if let Ok(home) = std::env::var("HOME") {
        let xdg = PathBuf::from(&home).join(".local/share/thicket");
        if std::fs::create_dir_all(&xdg).is_ok() {
            return xdg;
        }
    }

    // 3. Fallback to CWD
    std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."))
}

fn save_path() -> PathBuf {
    save_dir().join(SAVE_FILE)
}

// ══════════════════════════════════════════════════════════════
// Public API
// ══════════════════════════════════════════════════════════════

pub fn capture(world: &WorldState) -> SaveData {
    SaveData {
        level: world.current_level,
        score: world.score,
        coins_collected: world.coins_collected,
        health: world.player.health,
        player_x: world.player.rect.x,
        player_y: world.player.rect.y,
        facing: world.player.facing,
    }
}

/// Apply a save on top of a freshly loaded level.
pub fn restore(world: &mut WorldState, data: &SaveData) {
    world.score = data.score;
    world.coins_collected = data.coins_collected;
    world.player.health = data.health.clamp(1, world.player.max_health);
    world.player.rect.x = data.player_x;
    world.player.rect.y = data.player_y;
    world.player.facing = data.facing;
    world.camera.snap_to(&world.player.rect);
}

pub fn save_game(data: &SaveData) -> Result<(), String> {
    std::fs::write(save_path(), serialize(data)).map_err(|e| format!("Save failed: {}", e))
}

pub fn load_save() -> Option<SaveData> {
    let candidates = [save_path(), PathBuf::from(SAVE_FILE)];
    for path in &candidates {
        if let Ok(content) = std::fs::read_to_string(path) {
            return parse_save(&content);
        }
    }
    None
}

pub fn has_save() -> bool {
    load_save().is_some()
}

pub fn delete_save() {
    let _ = std::fs::remove_file(save_path());
    let _ = std::fs::remove_file(SAVE_FILE);
}

// ══════════════════════════════════════════════════════════════
// Serialization
// ══════════════════════════════════════════════════════════════

fn facing_str(f: Facing) -> &'static str {
    match f {
        Facing::Left => "L",
        Facing::Right => "R",
    }
}

fn parse_facing(s: &str) -> Facing {
    if s == "L" { Facing::Left } else { Facing::Right }
}

fn serialize(data: &SaveData) -> String {
    let mut out = String::with_capacity(128);
    out.push_str(&format!("level={}\n", data.level));
    out.push_str(&format!("score={}\n", data.score));
    out.push_str(&format!("coins={}\n", data.coins_collected));
    out.push_str(&format!("health={}\n", data.health));
    out.push_str(&format!(
        "player={},{},{}\n",
        data.player_x,
        data.player_y,
        facing_str(data.facing)
    ));
    out
}

fn parse_save(content: &str) -> Option<SaveData> {
    let mut level = None;
    let mut score = None;
    let mut coins = None;
    let mut health = None;
    let mut player: Option<(f32, f32, Facing)> = None;

    for line in content.lines() {
        let line = line.trim();
        if let Some(val) = line.strip_prefix("level=") {
            level = val.parse().ok();
        } else if let Some(val) = line.strip_prefix("score=") {
            score = val.parse().ok();
        } else if let Some(val) = line.strip_prefix("coins=") {
            coins = val.parse().ok();
        } else if let Some(val) = line.strip_prefix("health=") {
            health = val.parse().ok();
        } else if let Some(val) = line.strip_prefix("player=") {
            let parts: Vec<&str> = val.split(',').collect();
            if parts.len() == 3 {
                if let (Ok(x), Ok(y)) = (parts[0].trim().parse(), parts[1].trim().parse()) {
                    player = Some((x, y, parse_facing(parts[2].trim())));
                }
            }
        }
    }

    let (player_x, player_y, facing) = player?;
    Some(SaveData {
        level: level?,
        score: score?,
        coins_collected: coins?,
        health: health?,
        player_x,
        player_y,
        facing,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> SaveData {
        SaveData {
            level: 1,
            score: 240,
            coins_collected: 4,
            health: 2,
            player_x: 812.5,
            player_y: 1340.0,
            facing: Facing::Left,
        }
    }

    #[test]
    fn roundtrip_preserves_everything() {
        let data = sample();
        let parsed = parse_save(&serialize(&data)).unwrap();
        assert_eq!(parsed, data);
    }

    #[test]
    fn garbage_is_no_save() {
        assert!(parse_save("").is_none());
        assert!(parse_save("not a save file\nat all\n").is_none());
        assert!(parse_save("level=banana\nscore=1\n").is_none());
    }

    #[test]
    fn missing_field_is_no_save() {
        let mut text = serialize(&sample());
        text = text.replace("score=240\n", "");
        assert!(parse_save(&text).is_none());
    }

    #[test]
    fn restore_clamps_health() {
        let mut world = WorldState::new(1);
        let mut data = sample();
        data.health = 99;
        restore(&mut world, &data);
        assert_eq!(world.player.health, world.player.max_health);
        data.health = 0;
        restore(&mut world, &data);
        assert_eq!(world.player.health, 1);
    }

    #[test]
    fn capture_reflects_world() {
        let mut world = WorldState::new(1);
        world.current_level = 2;
        world.score = 500;
        world.coins_collected = 7;
        world.player.health = 1;
        world.player.rect.x = 42.0;
        let data = capture(&world);
        assert_eq!(data.level, 2);
        assert_eq!(data.score, 500);
        assert_eq!(data.coins_collected, 7);
        assert_eq!(data.health, 1);
        assert_eq!(data.player_x, 42.0);
    }
}
