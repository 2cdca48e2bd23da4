/// Level loader.
///
/// ## Sources (priority order):
///   1. `levels/` directory (individual `.toml` descriptor files,
///      sorted by filename)
///   2. Built-in embedded levels
///
/// ## Descriptor format (TOML):
///   ```toml
///   name = "Sprout Hollow"
///   player_spawn = [100.0, 1200.0]
///   exit_x = 2400.0
///
///   # Root-level arrays must come before the first [[...]] table header,
///   # or TOML scopes them into that table.
///   coins = [[300.0, 1300.0], [500.0, 1300.0]]
///   turrets = [[900.0, 300.0]]
///
///   [[platforms]]
///   x = 0.0
///   y = 1390.0
///   w = 1200.0
///   h = 50.0
///   style = "ground"     # optional, "ground" | "ledge"
///   hidden = false       # optional
///
///   [[enemies]]
///   x = 700.0
///   y = 1340.0
///   patrol = 150.0       # optional half-distance; omit for free roam
///
///   [[death_zones]]
///   x = 1200.0
///   y = 1440.0
///   w = 200.0
///   h = 100.0
///
///   [end_zone]
///   x = 2440.0
///   y = 1290.0
///   w = 100.0
///   h = 100.0
///   ```
///
/// Loading is all-or-nothing: every rect is validated before anything
/// touches the world, so a bad descriptor leaves the current level
/// running.

use std::fmt;
use std::path::Path;

use serde::Deserialize;

use crate::config::GameConfig;
use crate::domain::entity::{
    DeathZone, Enemy, InvariantViolation, Pickup, Platform, PlatformStyle, Player, Rect, Turret,
};
use crate::sim::world::{WorldState, WORLD_H, WORLD_W};

#[derive(Clone, Debug, Deserialize)]
pub struct LevelDef {
    pub name: String,
    #[serde(default = "default_world_w")]
    pub world_w: f32,
    #[serde(default = "default_world_h")]
    pub world_h: f32,
    pub player_spawn: [f32; 2],
    #[serde(default)]
    pub platforms: Vec<PlatformDef>,
    #[serde(default)]
    pub coins: Vec<[f32; 2]>,
    #[serde(default)]
    pub enemies: Vec<EnemyDef>,
    #[serde(default)]
    pub turrets: Vec<[f32; 2]>,
    #[serde(default)]
    pub death_zones: Vec<RectDef>,
    pub end_zone: Option<RectDef>,
    /// Where the exit plant grows. Defaults to the end zone's center,
    /// falling back to the spawn point.
    pub exit_x: Option<f32>,
    /// Ambient enemy spawning on or off for this level.
    #[serde(default = "default_true")]
    pub ambient_spawns: bool,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PlatformDef {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
    #[serde(default)]
    pub style: Option<String>,
    #[serde(default)]
    pub hidden: bool,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EnemyDef {
    pub x: f32,
    pub y: f32,
    pub patrol: Option<f32>,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RectDef {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

impl RectDef {
    fn to_rect(&self) -> Result<Rect, InvariantViolation> {
        Rect::new(self.x, self.y, self.w, self.h)
    }
}

fn default_world_w() -> f32 {
    WORLD_W
}

fn default_world_h() -> f32 {
    WORLD_H
}

fn default_true() -> bool {
    true
}

#[derive(Debug)]
pub enum LevelError {
    OutOfRange { index: usize, count: usize },
    BadEntity(InvariantViolation),
}

impl fmt::Display for LevelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LevelError::OutOfRange { index, count } => {
                write!(f, "level index {index} out of range ({count} levels)")
            }
            LevelError::BadEntity(e) => write!(f, "bad level geometry: {e}"),
        }
    }
}

impl std::error::Error for LevelError {}

impl From<InvariantViolation> for LevelError {
    fn from(e: InvariantViolation) -> Self {
        LevelError::BadEntity(e)
    }
}

// ══════════════════════════════════════════════════════════════
// Public API
// ══════════════════════════════════════════════════════════════

/// Level list for this run: descriptor files if any parse, otherwise
/// the embedded set.
pub fn load_levels(config: &GameConfig) -> Vec<LevelDef> {
    let dir = &config.levels_dir;
    if dir.is_dir() {
        let from_dir = load_from_directory(dir);
        if !from_dir.is_empty() {
            return from_dir;
        }
    }
    embedded_levels()
}

/// Load one level into the world. Preserves score and run progress.
/// Validates every rect before mutating anything, so on error the
/// world is exactly as it was.
pub fn load_level(
    world: &mut WorldState,
    levels: &[LevelDef],
    index: usize,
) -> Result<(), LevelError> {
    let def = levels
        .get(index)
        .ok_or(LevelError::OutOfRange { index, count: levels.len() })?;

    // ── Build everything first ──
    let mut platforms = Vec::with_capacity(def.platforms.len());
    for p in &def.platforms {
        let rect = Rect::new(p.x, p.y, p.w, p.h)?;
        let style = match p.style.as_deref() {
            Some("ledge") => PlatformStyle::Ledge,
            _ => PlatformStyle::Ground,
        };
        platforms.push(if p.hidden {
            Platform::hidden(rect, style)
        } else {
            Platform::new(rect, style)
        });
    }

    let pickups: Vec<Pickup> = def.coins.iter().map(|&[x, y]| Pickup::coin(x, y)).collect();
    let enemies: Vec<Enemy> = def
        .enemies
        .iter()
        .map(|e| Enemy::grunt(e.x, e.y, e.patrol))
        .collect();
    let turrets: Vec<Turret> = def.turrets.iter().map(|&[x, y]| Turret::new(x, y)).collect();

    let mut death_zones = Vec::with_capacity(def.death_zones.len());
    for dz in &def.death_zones {
        death_zones.push(DeathZone { rect: dz.to_rect()? });
    }
    let end_zone = match &def.end_zone {
        Some(ez) => Some(ez.to_rect()?),
        None => None,
    };

    // ── Commit ──
    world.current_level = index;
    world.total_levels = levels.len();
    world.level_name = def.name.clone();
    world.world_w = def.world_w;
    world.world_h = def.world_h;

    world.total_coins = pickups.len();
    world.coins_collected = 0;
    world.platforms = platforms;
    world.pickups = pickups;
    world.enemies = enemies;
    world.turrets = turrets;
    world.death_zones = death_zones;
    world.end_zone = end_zone;
    world.projectiles.clear();
    world.vine = None;
    world.transition = None;

    world.exit_x = def
        .exit_x
        .or_else(|| world.end_zone.as_ref().map(|r| r.center_x()))
        .unwrap_or(def.player_spawn[0]);

    let (sx, sy) = (def.player_spawn[0], def.player_spawn[1]);
    let health = world.player.health.max(1);
    world.player = Player::new(sx, sy);
    world.player.health = health.min(world.player.max_health);
    world.player_spawn = (sx, sy);

    world.spawner.enabled = def.ambient_spawns;
    world.spawner.reset_ramp();

    world.camera = crate::sim::camera::Camera::new(def.world_w, def.world_h);
    world.camera.snap_to(&world.player.rect);

    world.set_message(&def.name, 2500.0);
    Ok(())
}

// ══════════════════════════════════════════════════════════════
// Directory loading
// ══════════════════════════════════════════════════════════════

fn load_from_directory(dir: &Path) -> Vec<LevelDef> {
    let mut named: Vec<(String, LevelDef)> = vec![];

    let entries = match std::fs::read_dir(dir) {
        Ok(e) => e,
        Err(_) => return vec![],
    };

    for entry in entries.flatten() {
        let path = entry.path();
        if !path.extension().map_or(false, |e| e == "toml") {
            continue;
        }
        let content = match std::fs::read_to_string(&path) {
            Ok(c) => c,
            Err(_) => continue,
        };
        match toml::from_str::<LevelDef>(&content) {
            Ok(def) => {
                let filename = path.file_name().unwrap_or_default().to_string_lossy().to_string();
                named.push((filename, def));
            }
            Err(e) => {
                eprintln!("warning: skipping level file {}: {}", path.display(), e);
            }
        }
    }

    named.sort_by(|a, b| a.0.cmp(&b.0));
    named.into_iter().map(|(_, def)| def).collect()
}

// ══════════════════════════════════════════════════════════════
// Embedded fallback levels
// ══════════════════════════════════════════════════════════════

fn embedded_levels() -> Vec<LevelDef> {
    let sources = [
        include_level_1(),
        include_level_2(),
        include_level_3(),
    ];
    let mut levels = Vec::with_capacity(sources.len());
    for src in sources {
        match toml::from_str::<LevelDef>(src) {
            Ok(def) => levels.push(def),
            Err(e) => eprintln!("warning: embedded level failed to parse: {e}"),
        }
    }
    levels
}

fn include_level_1() -> &'static str {
    r#"
name = "Sprout Hollow"
player_spawn = [100.0, 1200.0]
exit_x = 2400.0

coins = [
  [460.0, 1160.0],
  [880.0, 1020.0],
  [1240.0, 1180.0],
  [1700.0, 1120.0],
  [2000.0, 1330.0],
  [2250.0, 1330.0],
]

# Ground, split by a pit in the middle
[[platforms]]
x = 0.0
y = 1390.0
w = 1150.0
h = 50.0

[[platforms]]
x = 1350.0
y = 1390.0
w = 1212.0
h = 50.0

[[platforms]]
x = 400.0
y = 1220.0
w = 220.0
h = 30.0
style = "ledge"

[[platforms]]
x = 800.0
y = 1080.0
w = 220.0
h = 30.0
style = "ledge"

[[platforms]]
x = 1180.0
y = 1240.0
w = 150.0
h = 30.0
style = "ledge"

[[platforms]]
x = 1600.0
y = 1180.0
w = 260.0
h = 30.0
style = "ledge"

[[enemies]]
x = 700.0
y = 1340.0
patrol = 180.0

[[enemies]]
x = 1800.0
y = 1340.0

[[death_zones]]
x = 1150.0
y = 1440.0
w = 200.0
h = 120.0

[end_zone]
x = 2420.0
y = 1290.0
w = 120.0
h = 100.0
"#
}

fn include_level_2() -> &'static str {
    r#"
name = "Turret Terrace"
player_spawn = [80.0, 1200.0]
exit_x = 2450.0

coins = [
  [420.0, 1140.0],
  [770.0, 990.0],
  [1380.0, 1090.0],
  [1880.0, 1200.0],
  [600.0, 1330.0],
  [1500.0, 1330.0],
  [2200.0, 1330.0],
]

turrets = [[800.0, 300.0], [1700.0, 260.0]]

[[platforms]]
x = 0.0
y = 1390.0
w = 900.0
h = 50.0

[[platforms]]
x = 1100.0
y = 1390.0
w = 700.0
h = 50.0

[[platforms]]
x = 2000.0
y = 1390.0
w = 562.0
h = 50.0

[[platforms]]
x = 350.0
y = 1200.0
w = 200.0
h = 30.0
style = "ledge"

[[platforms]]
x = 700.0
y = 1050.0
w = 200.0
h = 30.0
style = "ledge"

[[platforms]]
x = 1300.0
y = 1150.0
w = 240.0
h = 30.0
style = "ledge"

# Secret route over the second pit
[[platforms]]
x = 1830.0
y = 1260.0
w = 140.0
h = 30.0
style = "ledge"
hidden = true

[[enemies]]
x = 500.0
y = 1340.0
patrol = 200.0

[[enemies]]
x = 1400.0
y = 1340.0
patrol = 140.0

[[enemies]]
x = 2200.0
y = 1340.0

[[death_zones]]
x = 900.0
y = 1440.0
w = 200.0
h = 120.0

[[death_zones]]
x = 1800.0
y = 1440.0
w = 200.0
h = 120.0

[end_zone]
x = 2440.0
y = 1290.0
w = 120.0
h = 100.0
"#
}

fn include_level_3() -> &'static str {
    r#"
name = "Root Cellar"
player_spawn = [60.0, 300.0]
exit_x = 2460.0

coins = [
  [200.0, 360.0],
  [760.0, 500.0],
  [1160.0, 660.0],
  [790.0, 840.0],
  [1560.0, 820.0],
  [1220.0, 1000.0],
  [400.0, 1330.0],
  [1600.0, 1330.0],
  [2100.0, 1330.0],
]

turrets = [[1250.0, 200.0], [600.0, 700.0]]

[[platforms]]
x = 0.0
y = 420.0
w = 500.0
h = 40.0

[[platforms]]
x = 650.0
y = 560.0
w = 300.0
h = 30.0
style = "ledge"

[[platforms]]
x = 1050.0
y = 720.0
w = 300.0
h = 30.0
style = "ledge"

[[platforms]]
x = 700.0
y = 900.0
w = 250.0
h = 30.0
style = "ledge"

[[platforms]]
x = 1450.0
y = 880.0
w = 300.0
h = 30.0
style = "ledge"

[[platforms]]
x = 1150.0
y = 1060.0
w = 200.0
h = 30.0
style = "ledge"
hidden = true

[[platforms]]
x = 0.0
y = 1390.0
w = 1000.0
h = 50.0

[[platforms]]
x = 1200.0
y = 1390.0
w = 1362.0
h = 50.0

[[enemies]]
x = 300.0
y = 1340.0
patrol = 250.0

[[enemies]]
x = 1500.0
y = 1340.0
patrol = 200.0

[[enemies]]
x = 2100.0
y = 1340.0

[[enemies]]
x = 800.0
y = 850.0
patrol = 80.0

[[death_zones]]
x = 1000.0
y = 1440.0
w = 200.0
h = 120.0

[end_zone]
x = 2440.0
y = 1290.0
w = 122.0
h = 100.0
"#
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn embedded_levels_all_parse() {
        let levels = embedded_levels();
        assert_eq!(levels.len(), 3);
        for def in &levels {
            assert!(!def.name.is_empty());
            assert!(!def.platforms.is_empty());
            assert!(!def.coins.is_empty());
            assert!(def.end_zone.is_some());
        }
        // Turret Terrace and Root Cellar both mount turrets
        assert_eq!(levels[1].turrets.len(), 2);
        assert_eq!(levels[2].turrets.len(), 2);
    }

    #[test]
    fn root_arrays_after_a_table_fail_to_parse() {
        // A root-level array placed below a [[...]] header is scoped into
        // that table by TOML; the strict table schema rejects it instead
        // of dropping the coins on the floor.
        let result = toml::from_str::<LevelDef>(
            r#"
            name = "Bad"
            player_spawn = [0.0, 0.0]

            [[platforms]]
            x = 0.0
            y = 0.0
            w = 10.0
            h = 10.0

            coins = [[1.0, 2.0]]
            "#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn embedded_levels_all_load() {
        let levels = embedded_levels();
        let mut world = WorldState::new(1);
        for i in 0..levels.len() {
            load_level(&mut world, &levels, i).unwrap();
            assert_eq!(world.current_level, i);
            assert_eq!(world.total_coins, world.pickups.len());
            assert!(world.total_coins > 0);
            assert_eq!(world.coins_collected, 0);
            assert_eq!(world.turrets.len(), levels[i].turrets.len());
            assert!(world.end_zone.is_some());
        }
    }

    #[test]
    fn out_of_range_leaves_world_untouched() {
        let levels = embedded_levels();
        let mut world = WorldState::new(1);
        load_level(&mut world, &levels, 0).unwrap();
        world.score = 123;
        let coins_before = world.pickups.len();

        let err = load_level(&mut world, &levels, 99).unwrap_err();
        assert!(matches!(err, LevelError::OutOfRange { index: 99, .. }));
        assert_eq!(world.current_level, 0);
        assert_eq!(world.score, 123);
        assert_eq!(world.pickups.len(), coins_before);
    }

    #[test]
    fn bad_geometry_never_partially_loads() {
        let mut levels = embedded_levels();
        levels[1].platforms[0].w = -10.0;
        let mut world = WorldState::new(1);
        load_level(&mut world, &levels, 0).unwrap();
        let name_before = world.level_name.clone();

        assert!(matches!(
            load_level(&mut world, &levels, 1),
            Err(LevelError::BadEntity(_))
        ));
        assert_eq!(world.current_level, 0);
        assert_eq!(world.level_name, name_before);
    }

    #[test]
    fn player_health_carries_between_levels() {
        let levels = embedded_levels();
        let mut world = WorldState::new(1);
        load_level(&mut world, &levels, 0).unwrap();
        world.player.health = 1;
        load_level(&mut world, &levels, 1).unwrap();
        assert_eq!(world.player.health, 1);
    }

    #[test]
    fn descriptor_parses_minimal_fields() {
        let def: LevelDef = toml::from_str(
            r#"
            name = "Bare"
            player_spawn = [10.0, 20.0]
            "#,
        )
        .unwrap();
        assert_eq!(def.name, "Bare");
        assert!(def.platforms.is_empty());
        assert!(def.ambient_spawns);
        assert_eq!(def.world_w, WORLD_W);
    }

    #[test]
    fn exit_defaults_to_end_zone_center() {
        let levels = embedded_levels();
        let mut world = WorldState::new(1);
        // Level 1 declares an explicit exit_x
        load_level(&mut world, &levels, 0).unwrap();
        assert_eq!(world.exit_x, 2400.0);

        let mut no_exit = embedded_levels();
        no_exit[0].exit_x = None;
        load_level(&mut world, &no_exit, 0).unwrap();
        let ez = world.end_zone.clone().unwrap();
        assert_eq!(world.exit_x, ez.center_x());
    }

    #[test]
    fn hidden_platforms_start_unrevealed() {
        let levels = embedded_levels();
        let mut world = WorldState::new(1);
        load_level(&mut world, &levels, 1).unwrap();
        let hidden: Vec<_> = world.platforms.iter().filter(|p| p.hidden).collect();
        assert!(!hidden.is_empty());
        assert!(hidden.iter().all(|p| !p.revealed && !p.visible()));
    }
}
