/// Entity records: Player, Enemy, Projectile, Pickup, Turret, Platform,
/// DeathZone, Vine. Plain data plus constructors and small state helpers;
/// movement and collision live in physics.rs / collision.rs.

use std::fmt;

// ── Intrinsic sizes and tuning (world pixels / milliseconds) ──

pub const PLAYER_SIZE: f32 = 50.0;
pub const ENEMY_SIZE: f32 = 40.0;
pub const BOSS_W: f32 = 80.0;
pub const BOSS_H: f32 = 80.0;
pub const PROJECTILE_W: f32 = 12.0;
pub const PROJECTILE_H: f32 = 6.0;
pub const COIN_SIZE: f32 = 20.0;
pub const HEART_SIZE: f32 = 30.0;
pub const TURRET_SIZE: f32 = 40.0;
pub const VINE_WIDTH: f32 = 20.0;

pub const PLAYER_MAX_HEALTH: u32 = 3;
pub const PROJECTILE_SPEED: f32 = 0.5;
pub const PROJECTILE_RANGE: f32 = 800.0;
pub const COIN_VALUE: u32 = 10;
pub const HEART_LIFETIME_MS: f32 = 8000.0;
pub const HEART_FALL_SPEED: f32 = 0.1;
pub const COIN_BOB_RATE: f32 = 0.006;
pub const COIN_BOB_DISTANCE: f32 = 5.0;
pub const TURRET_HOVER_RATE: f32 = 0.0005;
pub const TURRET_HOVER_AMOUNT: f32 = 20.0;
pub const TURRET_SHOT_COOLDOWN_MS: f32 = 1500.0;
pub const VINE_MAX_HEIGHT: f32 = 120.0;
pub const VINE_GROWTH_SPEED: f32 = 0.1;

/// Raised when an entity would be built with a degenerate collision box.
/// Collision direction is undefined for zero or negative extents, so
/// these are rejected at construction instead of surfacing mid-frame.
#[derive(Clone, Debug, PartialEq)]
pub struct InvariantViolation {
    pub what: String,
}

impl fmt::Display for InvariantViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invariant violation: {}", self.what)
    }
}

impl std::error::Error for InvariantViolation {}

/// Axis-aligned rectangle, the one collision shape in the game.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

impl Rect {
    /// Validated construction: both extents must be strictly positive.
    pub fn new(x: f32, y: f32, w: f32, h: f32) -> Result<Rect, InvariantViolation> {
        if w <= 0.0 || h <= 0.0 {
            return Err(InvariantViolation {
                what: format!("rect size must be positive, got {w}x{h}"),
            });
        }
        Ok(Rect { x, y, w, h })
    }

    #[inline]
    pub fn right(&self) -> f32 {
        self.x + self.w
    }

    #[inline]
    pub fn bottom(&self) -> f32 {
        self.y + self.h
    }

    #[inline]
    pub fn center_x(&self) -> f32 {
        self.x + self.w / 2.0
    }

    #[inline]
    pub fn center_y(&self) -> f32 {
        self.y + self.h / 2.0
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Facing {
    Left,
    Right,
}

impl Facing {
    /// Unit sign: -1 for Left, +1 for Right.
    pub fn sign(self) -> f32 {
        match self {
            Facing::Left => -1.0,
            Facing::Right => 1.0,
        }
    }
}

/// Player animation tag. Exactly one active at a time; the ordinary tags
/// are derived from physics state each frame, Watering/Climb/Dead are set
/// by the transition script and death handling.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum AnimState {
    Idle,
    Run,
    Jump,
    Fall,
    Climb,
    Watering,
    Dead,
}

/// Frame input: immutable snapshot of held actions, built once from the
/// key tracker before the simulation step. The sim only reads it.
#[derive(Clone, Copy, Debug, Default)]
pub struct FrameInput {
    pub left: bool,
    pub right: bool,
    pub jump: bool,
    pub shoot: bool,
}

#[derive(Clone, Debug)]
pub struct Player {
    pub rect: Rect,
    pub vx: f32,
    pub vy: f32,
    pub grounded: bool,
    pub facing: Facing,
    pub health: u32,
    pub max_health: u32,
    pub invuln_ms: f32,        // remaining grace window, never negative
    pub shoot_cooldown_ms: f32,
    pub anim: AnimState,
}

impl Player {
    pub fn new(x: f32, y: f32) -> Self {
        Player {
            rect: Rect { x, y, w: PLAYER_SIZE, h: PLAYER_SIZE },
            vx: 0.0,
            vy: 0.0,
            grounded: false,
            facing: Facing::Right,
            health: PLAYER_MAX_HEALTH,
            max_health: PLAYER_MAX_HEALTH,
            invuln_ms: 0.0,
            shoot_cooldown_ms: 0.0,
            anim: AnimState::Idle,
        }
    }

    pub fn is_invulnerable(&self) -> bool {
        self.invuln_ms > 0.0
    }

    /// Apply contact damage. Blocked while invulnerable; otherwise clamps
    /// health at 0 and opens the grace window.
    /// Returns true if the damage actually landed.
    pub fn take_damage(&mut self, amount: u32, invuln_window_ms: f32) -> bool {
        if self.is_invulnerable() {
            return false;
        }
        self.health = self.health.saturating_sub(amount);
        self.invuln_ms = invuln_window_ms;
        true
    }

    /// Instant kill: zeroes health unconditionally, bypassing the grace
    /// window. Death zones use this.
    pub fn kill(&mut self) {
        self.health = 0;
        self.anim = AnimState::Dead;
    }

    /// Restore health, capped at max.
    pub fn heal(&mut self, amount: u32) {
        self.health = (self.health + amount).min(self.max_health);
    }

    pub fn can_shoot(&self) -> bool {
        self.shoot_cooldown_ms <= 0.0
    }

    pub fn tick_timers(&mut self, dt: f32) {
        self.invuln_ms = (self.invuln_ms - dt).max(0.0);
        self.shoot_cooldown_ms = (self.shoot_cooldown_ms - dt).max(0.0);
    }
}

#[derive(Clone, Debug)]
pub struct Enemy {
    pub rect: Rect,
    pub vx: f32,
    pub vy: f32,
    pub grounded: bool,
    /// Patrol anchor (spawn x). With `patrol_half` set, the enemy walks
    /// between anchor - half and anchor + half; without it, it walks
    /// until a wall or the world edge turns it around.
    pub anchor_x: f32,
    pub patrol_half: Option<f32>,
    /// +1.0 right, -1.0 left.
    pub direction: f32,
    pub speed: f32,
    pub damage: u32,
    pub points: u32,
    pub health: u32,
    /// Probability of leaving a heart pickup on death, 0.0..=1.0.
    pub drop_chance: f32,
    pub boss: bool,
    /// Time between aimed volleys. Zero means this enemy never fires;
    /// only bosses get a nonzero interval.
    pub shot_interval_ms: f32,
    pub shot_cooldown_ms: f32,
    pub deleted: bool,
}

impl Enemy {
    pub fn grunt(x: f32, y: f32, patrol_half: Option<f32>) -> Self {
        Enemy {
            rect: Rect { x, y, w: ENEMY_SIZE, h: ENEMY_SIZE },
            vx: 0.0,
            vy: 0.0,
            grounded: false,
            anchor_x: x,
            patrol_half,
            direction: 1.0,
            speed: 0.1,
            damage: 1,
            points: 50,
            health: 1,
            drop_chance: 0.15,
            boss: false,
            shot_interval_ms: 0.0,
            shot_cooldown_ms: 0.0,
            deleted: false,
        }
    }

    /// Boss stats scale with the escalation level.
    pub fn boss(x: f32, y: f32, level: u32) -> Self {
        let shot_interval_ms = (1500.0 - level as f32 * 100.0).max(800.0);
        Enemy {
            rect: Rect { x, y, w: BOSS_W, h: BOSS_H },
            vx: 0.0,
            vy: 0.0,
            grounded: false,
            anchor_x: x,
            patrol_half: None,
            direction: 1.0,
            speed: 0.1 + level as f32 * 0.02,
            damage: 2,
            points: 500,
            health: 20 + level * 10,
            drop_chance: 1.0,
            boss: true,
            shot_interval_ms,
            shot_cooldown_ms: shot_interval_ms,
            deleted: false,
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum ProjectileOwner {
    Player,
    /// Index of the turret that fired, at fire time. Used to skip
    /// self-hits and pick a color; never dereferenced after a sweep.
    Turret(usize),
    Boss,
}

#[derive(Clone, Debug)]
pub struct Projectile {
    pub rect: Rect,
    /// Unit direction of travel. No gravity applies.
    pub dir_x: f32,
    pub dir_y: f32,
    pub speed: f32,
    pub owner: ProjectileOwner,
    /// Euclidean distance covered since spawn.
    pub traveled: f32,
    pub max_range: f32,
    pub deleted: bool,
}

impl Projectile {
    /// Spawn centered on (cx, cy), travelling along (dir_x, dir_y).
    /// The direction is normalized so range accounting stays Euclidean.
    pub fn new(cx: f32, cy: f32, dir_x: f32, dir_y: f32, owner: ProjectileOwner) -> Self {
        let len = (dir_x * dir_x + dir_y * dir_y).sqrt();
        let (nx, ny) = if len > 0.0 { (dir_x / len, dir_y / len) } else { (1.0, 0.0) };
        Projectile {
            rect: Rect {
                x: cx - PROJECTILE_W / 2.0,
                y: cy - PROJECTILE_H / 2.0,
                w: PROJECTILE_W,
                h: PROJECTILE_H,
            },
            dir_x: nx,
            dir_y: ny,
            speed: PROJECTILE_SPEED,
            owner,
            traveled: 0.0,
            max_range: PROJECTILE_RANGE,
            deleted: false,
        }
    }
}

#[derive(Clone, Copy, PartialEq, Debug)]
pub enum PickupKind {
    /// Level collectible; counts toward the level's coin total.
    Coin { value: u32 },
    /// Dropped by killed enemies; restores 1 health, expires if ignored.
    Heart,
}

#[derive(Clone, Debug)]
pub struct Pickup {
    pub rect: Rect,
    pub kind: PickupKind,
    pub age_ms: f32,   // hearts expire on this
    pub bob_phase: f32, // coins only
    pub deleted: bool,
}

impl Pickup {
    pub fn coin(x: f32, y: f32) -> Self {
        Pickup {
            rect: Rect { x, y, w: COIN_SIZE, h: COIN_SIZE },
            kind: PickupKind::Coin { value: COIN_VALUE },
            age_ms: 0.0,
            bob_phase: 0.0,
            deleted: false,
        }
    }

    pub fn heart(x: f32, y: f32) -> Self {
        Pickup {
            rect: Rect { x, y, w: HEART_SIZE, h: HEART_SIZE },
            kind: PickupKind::Heart,
            age_ms: 0.0,
            bob_phase: 0.0,
            deleted: false,
        }
    }
}

/// Hovering hazard that fires straight down on a cooldown.
#[derive(Clone, Debug)]
pub struct Turret {
    pub rect: Rect,
    /// Hover center; y oscillates around this.
    pub anchor_y: f32,
    pub hover_phase: f32,
    pub shot_cooldown_ms: f32,
    pub damage: u32,
    pub points: u32,
    pub deleted: bool,
}

impl Turret {
    pub fn new(x: f32, y: f32) -> Self {
        Turret {
            rect: Rect { x, y, w: TURRET_SIZE, h: TURRET_SIZE },
            anchor_y: y,
            hover_phase: 0.0,
            shot_cooldown_ms: TURRET_SHOT_COOLDOWN_MS,
            damage: 1,
            points: 100,
            deleted: false,
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum PlatformStyle {
    Ground,
    Ledge,
}

#[derive(Clone, Debug)]
pub struct Platform {
    pub rect: Rect,
    pub style: PlatformStyle,
    /// Hidden platforms render only after the player has come close once.
    /// They collide normally either way.
    pub hidden: bool,
    pub revealed: bool,
}

impl Platform {
    pub fn new(rect: Rect, style: PlatformStyle) -> Self {
        Platform { rect, style, hidden: false, revealed: false }
    }

    pub fn hidden(rect: Rect, style: PlatformStyle) -> Self {
        Platform { rect, style, hidden: true, revealed: false }
    }

    pub fn visible(&self) -> bool {
        !self.hidden || self.revealed
    }
}

/// Instant-kill region (pits below the level floor).
#[derive(Clone, Debug)]
pub struct DeathZone {
    pub rect: Rect,
}

/// The exit plant. Exists only while a level transition is running;
/// grows upward from the exit marker, then the player climbs it.
#[derive(Clone, Debug)]
pub struct Vine {
    pub x: f32,
    /// Ground line the vine grows up from.
    pub base_y: f32,
    pub height: f32,
    pub max_height: f32,
}

impl Vine {
    pub fn new(x: f32, base_y: f32) -> Self {
        Vine { x, base_y, height: 0.0, max_height: VINE_MAX_HEIGHT }
    }

    pub fn fully_grown(&self) -> bool {
        self.height >= self.max_height
    }

    /// Grow toward max height. Returns true on the frame growth finishes.
    pub fn grow(&mut self, dt: f32) -> bool {
        if self.fully_grown() {
            return false;
        }
        self.height = (self.height + VINE_GROWTH_SPEED * dt).min(self.max_height);
        self.fully_grown()
    }

    pub fn top_y(&self) -> f32 {
        self.base_y - self.height
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rect_rejects_degenerate_sizes() {
        assert!(Rect::new(0.0, 0.0, 0.0, 10.0).is_err());
        assert!(Rect::new(0.0, 0.0, 10.0, -1.0).is_err());
        assert!(Rect::new(-5.0, -5.0, 1.0, 1.0).is_ok());
    }

    #[test]
    fn damage_clamps_at_zero() {
        let mut p = Player::new(0.0, 0.0);
        assert_eq!(p.health, 3);
        assert!(p.take_damage(10, 1000.0));
        assert_eq!(p.health, 0);
    }

    #[test]
    fn invulnerability_blocks_second_hit() {
        let mut p = Player::new(0.0, 0.0);
        assert!(p.take_damage(1, 1000.0));
        assert!(!p.take_damage(1, 1000.0));
        assert_eq!(p.health, 2);

        // Window expires exactly at zero
        p.tick_timers(1000.0);
        assert!(!p.is_invulnerable());
        assert!(p.take_damage(1, 1000.0));
        assert_eq!(p.health, 1);
    }

    #[test]
    fn kill_bypasses_invulnerability() {
        let mut p = Player::new(0.0, 0.0);
        p.take_damage(1, 1000.0);
        assert!(p.is_invulnerable());
        p.kill();
        assert_eq!(p.health, 0);
        assert_eq!(p.anim, AnimState::Dead);
    }

    #[test]
    fn heal_caps_at_max() {
        let mut p = Player::new(0.0, 0.0);
        p.heal(5);
        assert_eq!(p.health, 3);
        p.take_damage(2, 0.0);
        p.heal(1);
        assert_eq!(p.health, 2);
    }

    #[test]
    fn timers_never_go_negative() {
        let mut p = Player::new(0.0, 0.0);
        p.take_damage(1, 100.0);
        p.tick_timers(5000.0);
        assert_eq!(p.invuln_ms, 0.0);
        assert_eq!(p.shoot_cooldown_ms, 0.0);
    }

    #[test]
    fn projectile_direction_is_normalized() {
        let pr = Projectile::new(0.0, 0.0, 3.0, 4.0, ProjectileOwner::Player);
        let len = (pr.dir_x * pr.dir_x + pr.dir_y * pr.dir_y).sqrt();
        assert!((len - 1.0).abs() < 1e-6);
    }

    #[test]
    fn vine_grows_to_max_and_stops() {
        let mut v = Vine::new(100.0, 400.0);
        assert!(!v.fully_grown());
        // 0.1 px/ms over 1200 ms reaches the 120 px cap exactly
        let finished = v.grow(1200.0);
        assert!(finished);
        assert_eq!(v.height, VINE_MAX_HEIGHT);
        assert_eq!(v.top_y(), 280.0);
        assert!(!v.grow(16.0));
    }

    #[test]
    fn boss_stats_scale_with_level() {
        let b0 = Enemy::boss(0.0, 0.0, 0);
        let b2 = Enemy::boss(0.0, 0.0, 2);
        assert_eq!(b0.health, 20);
        assert_eq!(b2.health, 40);
        assert!(b2.speed > b0.speed);
        assert_eq!(b2.drop_chance, 1.0);
    }

    #[test]
    fn boss_fire_rate_speeds_up_to_a_floor() {
        assert_eq!(Enemy::boss(0.0, 0.0, 0).shot_interval_ms, 1500.0);
        assert_eq!(Enemy::boss(0.0, 0.0, 3).shot_interval_ms, 1200.0);
        assert_eq!(Enemy::boss(0.0, 0.0, 20).shot_interval_ms, 800.0);
        // Grunts never fire
        assert_eq!(Enemy::grunt(0.0, 0.0, None).shot_interval_ms, 0.0);
    }
}
