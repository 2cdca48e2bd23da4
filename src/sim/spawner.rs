/// Timer-driven enemy spawner with a difficulty ramp and a boss phase.
///
/// Regular spawns drop from the ceiling at a shrinking interval. When
/// the score crosses the boss threshold a boss is injected; while any
/// boss is alive the ramp pauses and regular spawns slow to a trickle.
/// The spawner owns its RNG so a run (and a test) can be seeded.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::domain::entity::{Enemy, ENEMY_SIZE};

pub const INTERVAL_START_MS: f32 = 1500.0;
pub const INTERVAL_FLOOR_MS: f32 = 500.0;
pub const INTERVAL_STEP_MS: f32 = 50.0;
pub const TRICKLE_INTERVAL_MS: f32 = 3000.0;
pub const BOSS_THRESHOLD: u32 = 2000;
pub const BOSS_THRESHOLD_STEP: u32 = 3000;
/// Spawn height: just above the world so enemies fall into view.
pub const SPAWN_Y: f32 = -60.0;

#[derive(Clone, Debug)]
pub struct Spawner {
    timer_ms: f32,
    interval_ms: f32,
    boss_threshold: u32,
    boss_level: u32,
    /// Levels can turn ambient spawning off entirely.
    pub enabled: bool,
    rng: StdRng,
}

impl Spawner {
    pub fn new(seed: u64) -> Self {
        Spawner {
            timer_ms: 0.0,
            interval_ms: INTERVAL_START_MS,
            boss_threshold: BOSS_THRESHOLD,
            boss_level: 0,
            enabled: true,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Restart the ramp for a fresh level. Boss escalation carries over
    /// the run, so the threshold and level are left alone.
    pub fn reset_ramp(&mut self) {
        self.timer_ms = 0.0;
        self.interval_ms = INTERVAL_START_MS;
    }

    /// Full reset for a new run: ramp and boss escalation both restart.
    pub fn reset_run(&mut self) {
        self.reset_ramp();
        self.boss_threshold = BOSS_THRESHOLD;
        self.boss_level = 0;
        self.enabled = true;
    }

    pub fn current_interval(&self) -> f32 {
        self.interval_ms
    }

    pub fn next_boss_at(&self) -> u32 {
        self.boss_threshold
    }

    fn random_x(&mut self, world_w: f32, width: f32) -> f32 {
        self.rng.gen_range(0.0..(world_w - width).max(1.0))
    }

    /// Advance the spawn timers. Pushes any enemies due this frame.
    pub fn update(&mut self, dt: f32, score: u32, boss_alive: bool, world_w: f32) -> Vec<Enemy> {
        let mut spawned = Vec::new();
        if !self.enabled {
            return spawned;
        }

        if score >= self.boss_threshold && !boss_alive {
            let x = self.random_x(world_w, 80.0);
            spawned.push(Enemy::boss(x, SPAWN_Y, self.boss_level));
            self.boss_level += 1;
            self.boss_threshold += BOSS_THRESHOLD_STEP;
            return spawned;
        }

        self.timer_ms += dt;
        let interval = if boss_alive { TRICKLE_INTERVAL_MS } else { self.interval_ms };
        if self.timer_ms >= interval {
            self.timer_ms = 0.0;
            let x = self.random_x(world_w, ENEMY_SIZE);
            spawned.push(Enemy::grunt(x, SPAWN_Y, None));
            if !boss_alive {
                self.interval_ms = (self.interval_ms - INTERVAL_STEP_MS).max(INTERVAL_FLOOR_MS);
            }
        }
        spawned
    }

    /// One drop-chance roll, 0.0..=1.0.
    pub fn roll_drop(&mut self, chance: f32) -> bool {
        self.rng.gen::<f32>() < chance
    }
}
