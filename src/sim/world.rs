/// WorldState: the complete snapshot of a running game.
///
/// ## Coordinates
///
/// Everything in the world is in world pixels (f32). The camera owns the
/// world→screen mapping; the renderer decides how many world pixels one
/// terminal cell covers. The sim never sees terminal coordinates.
///
/// ## State machine
///
/// `GameState` is the outer machine: Menu → Playing → GameOver | Win,
/// with restart legal only from the two terminal states. The level
/// transition script is orthogonal: it runs as `Option<Transition>`
/// alongside Playing and freezes ordinary simulation while set.

use crate::domain::entity::{
    DeathZone, Enemy, Pickup, Platform, Player, Projectile, Rect, Turret, Vine,
};
use crate::domain::physics::Tuning;
use crate::sim::camera::Camera;
use crate::sim::spawner::Spawner;

pub const WORLD_W: f32 = 2562.0;
pub const WORLD_H: f32 = 1440.0;

pub const WATERING_MS: f32 = 800.0;
pub const CLIMB_SPEED: f32 = 0.2;
pub const WIPE_MS: f32 = 1000.0;
/// Hidden platforms reveal inside this center-to-center distance.
pub const REVEAL_DISTANCE: f32 = 150.0;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum GameState {
    Menu,
    Playing,
    GameOver,
    Win,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum TransitionStage {
    /// Player walks to the exit marker; ordinary physics frozen.
    Approach,
    /// Watering animation at the exit.
    Watering,
    /// The vine grows to full height.
    Growing,
    /// Player ascends the vine and continues off-screen.
    Climbing,
    /// Full-screen circle shrinks to nothing, then the next level loads.
    Wipe,
}

/// Scripted end-of-level sequence. Only ever started from Playing.
#[derive(Clone, Debug)]
pub struct Transition {
    pub stage: TransitionStage,
    pub timer_ms: f32,
    /// World x of the exit marker the player walks to and the vine
    /// grows from.
    pub exit_x: f32,
}

impl Transition {
    pub fn new(exit_x: f32) -> Self {
        Transition { stage: TransitionStage::Approach, timer_ms: 0.0, exit_x }
    }

    /// Remaining wipe fraction: 1.0 at wipe start, 0.0 when done.
    /// Monotonically non-increasing; 1.0 before the wipe stage.
    pub fn wipe_progress(&self) -> f32 {
        match self.stage {
            TransitionStage::Wipe => (1.0 - self.timer_ms / WIPE_MS).max(0.0),
            _ => 1.0,
        }
    }
}

pub struct WorldState {
    pub state: GameState,
    pub transition: Option<Transition>,

    // ── Entities ──
    pub player: Player,
    pub platforms: Vec<Platform>,
    pub pickups: Vec<Pickup>,
    pub enemies: Vec<Enemy>,
    pub projectiles: Vec<Projectile>,
    pub turrets: Vec<Turret>,
    pub death_zones: Vec<DeathZone>,
    pub end_zone: Option<Rect>,
    pub vine: Option<Vine>,
    /// World x of the level exit marker; the transition walks here.
    pub exit_x: f32,

    // ── Systems ──
    pub spawner: Spawner,
    pub camera: Camera,
    pub tuning: Tuning,

    // ── World bounds ──
    pub world_w: f32,
    pub world_h: f32,

    // ── Run tracking ──
    pub score: u32,
    pub coins_collected: usize,
    pub total_coins: usize,
    pub current_level: usize,
    pub total_levels: usize,
    pub level_name: String,
    pub player_spawn: (f32, f32),
    pub tick: u64,

    // ── UI ──
    pub message: String,
    pub message_timer_ms: f32,
    pub debug_draw: bool,
    pub has_save: bool,
}

impl WorldState {
    pub fn new(seed: u64) -> Self {
        WorldState {
            state: GameState::Menu,
            transition: None,
            player: Player::new(0.0, 0.0),
            platforms: vec![],
            pickups: vec![],
            enemies: vec![],
            projectiles: vec![],
            turrets: vec![],
            death_zones: vec![],
            end_zone: None,
            vine: None,
            exit_x: 0.0,
            spawner: Spawner::new(seed),
            camera: Camera::new(WORLD_W, WORLD_H),
            tuning: Tuning::default(),
            world_w: WORLD_W,
            world_h: WORLD_H,
            score: 0,
            coins_collected: 0,
            total_coins: 0,
            current_level: 0,
            total_levels: 0,
            level_name: String::new(),
            player_spawn: (0.0, 0.0),
            tick: 0,
            message: String::new(),
            message_timer_ms: 0.0,
            debug_draw: false,
            has_save: false,
        }
    }

    pub fn is_playing(&self) -> bool {
        self.state == GameState::Playing
    }

    pub fn boss_alive(&self) -> bool {
        self.enemies.iter().any(|e| e.boss && !e.deleted)
    }

    pub fn all_coins_collected(&self) -> bool {
        self.total_coins > 0 && self.coins_collected >= self.total_coins
    }

    /// Restart after GameOver/Win: wipe run progress so the caller can
    /// load the first level. A silent no-op from any other state.
    pub fn restart(&mut self) -> bool {
        match self.state {
            GameState::GameOver | GameState::Win => {
                self.score = 0;
                self.coins_collected = 0;
                self.current_level = 0;
                self.transition = None;
                self.player = Player::new(0.0, 0.0);
                self.spawner.reset_run();
                self.state = GameState::Playing;
                true
            }
            _ => false,
        }
    }

    pub fn set_message(&mut self, msg: &str, duration_ms: f32) {
        self.message = msg.to_string();
        self.message_timer_ms = duration_ms;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn restart_only_from_terminal_states() {
        let mut w = WorldState::new(1);
        assert!(!w.restart());
        assert_eq!(w.state, GameState::Menu);

        w.state = GameState::Playing;
        w.score = 500;
        assert!(!w.restart());
        assert_eq!(w.score, 500);

        w.state = GameState::GameOver;
        w.coins_collected = 7;
        w.current_level = 2;
        w.player.health = 0;
        assert!(w.restart());
        assert_eq!(w.state, GameState::Playing);
        assert_eq!(w.score, 0);
        assert_eq!(w.coins_collected, 0);
        assert_eq!(w.current_level, 0);
        assert_eq!(w.player.health, w.player.max_health);
    }

    #[test]
    fn restart_from_win_clears_transition() {
        let mut w = WorldState::new(1);
        w.state = GameState::Win;
        w.transition = Some(Transition::new(100.0));
        assert!(w.restart());
        assert!(w.transition.is_none());
    }

    #[test]
    fn wipe_progress_shrinks_from_one_to_zero() {
        let mut t = Transition::new(0.0);
        assert_eq!(t.wipe_progress(), 1.0);
        t.stage = TransitionStage::Wipe;
        t.timer_ms = 0.0;
        assert_eq!(t.wipe_progress(), 1.0);
        t.timer_ms = WIPE_MS / 2.0;
        assert!((t.wipe_progress() - 0.5).abs() < 1e-6);
        t.timer_ms = WIPE_MS * 2.0;
        assert_eq!(t.wipe_progress(), 0.0);
    }

    #[test]
    fn all_coins_needs_a_nonzero_total() {
        let mut w = WorldState::new(1);
        assert!(!w.all_coins_collected());
        w.total_coins = 3;
        w.coins_collected = 3;
        assert!(w.all_coins_collected());
    }
}
