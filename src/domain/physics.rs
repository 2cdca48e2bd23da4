/// Physics layer: AABB overlap queries, minimum-overlap direction
/// resolution, and per-kind integration.
///
/// ## Units
///
/// Positions and sizes are world pixels (f32), time is milliseconds.
/// Velocities are px/ms, accelerations px/ms². The caller clamps dt to
/// 100 ms before any of this runs, so a single frame can never tunnel
/// an entity through a platform at the speeds in play here.
///
/// ## Direction resolution
///
/// `resolve_direction(a, b)` names the side of `b` that `a` ran into,
/// picked by minimum penetration depth. Ties resolve top > bottom >
/// left > right, which keeps landings stable when an entity clips a
/// platform corner dead-on. Only meaningful while `overlaps(a, b)`.

use super::entity::{
    Enemy, FrameInput, Pickup, PickupKind, Player, Projectile, Turret,
    COIN_BOB_RATE, HEART_FALL_SPEED, HEART_LIFETIME_MS,
    TURRET_HOVER_AMOUNT, TURRET_HOVER_RATE,
};
use super::entity::{AnimState, Facing, Rect};

/// Movement tuning. Defaults are the shipped game feel; config.toml can
/// override individual values.
#[derive(Clone, Copy, Debug)]
pub struct Tuning {
    pub gravity: f32,
    /// Air drag, applied only while falling and clamped so it never
    /// reverses the fall into a rise.
    pub drag: f32,
    pub move_speed: f32,
    pub jump_power: f32,
    pub invuln_window_ms: f32,
    pub shoot_cooldown_ms: f32,
}

impl Default for Tuning {
    fn default() -> Self {
        Tuning {
            gravity: 0.001,
            drag: 0.00015,
            move_speed: 0.3,
            jump_power: -0.6,
            invuln_window_ms: 1000.0,
            shoot_cooldown_ms: 300.0,
        }
    }
}

/// Strict-inequality overlap: rects that merely touch do not overlap.
#[inline]
pub fn overlaps(a: &Rect, b: &Rect) -> bool {
    a.x < b.right() && a.right() > b.x && a.y < b.bottom() && a.bottom() > b.y
}

/// Which side of the obstacle the moving rect hit.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Side {
    Top,
    Bottom,
    Left,
    Right,
}

/// Side of minimum penetration of `a` into `b`, or None when the rects
/// do not overlap. Tie order: Top, Bottom, Left, Right.
pub fn resolve_direction(a: &Rect, b: &Rect) -> Option<Side> {
    if !overlaps(a, b) {
        return None;
    }
    let top = a.bottom() - b.y;    // a came down onto b's top
    let bottom = b.bottom() - a.y; // a came up into b's underside
    let left = a.right() - b.x;    // a moved right into b's left face
    let right = b.right() - a.x;   // a moved left into b's right face

    let min = top.min(bottom).min(left).min(right);
    if min == top {
        Some(Side::Top)
    } else if min == bottom {
        Some(Side::Bottom)
    } else if min == left {
        Some(Side::Left)
    } else {
        Some(Side::Right)
    }
}

/// Gravity then drag. Drag only resists a fall (vy > 0) and is clamped
/// so it can at most zero the fall speed, never flip its sign.
#[inline]
fn fall_step(vy: f32, t: &Tuning, dt: f32) -> f32 {
    let mut vy = vy + t.gravity * dt;
    if vy > 0.0 {
        vy = (vy - t.drag * dt).max(0.0);
    }
    vy
}

/// Player integration: horizontal intent from held keys, jump impulse
/// when grounded, gravity + drag, then position. Shot spawning stays in
/// the step pipeline; this only advances the cooldown timers.
pub fn integrate_player(p: &mut Player, input: &FrameInput, t: &Tuning, dt: f32) {
    p.vx = 0.0;
    if input.left {
        p.vx = -t.move_speed;
        p.facing = Facing::Left;
    }
    if input.right {
        p.vx = t.move_speed;
        p.facing = Facing::Right;
    }
    if input.jump && p.grounded {
        p.vy = t.jump_power;
        p.grounded = false;
    }
    p.vy = fall_step(p.vy, t, dt);
    p.rect.x += p.vx * dt;
    p.rect.y += p.vy * dt;
    p.tick_timers(dt);
}

/// Derive the player's animation tag from physics state. Dead sticks;
/// Climb and Watering are owned by the transition script, which freezes
/// ordinary integration, so they never reach this function.
pub fn update_player_anim(p: &mut Player) {
    if p.anim == AnimState::Dead {
        return;
    }
    p.anim = if !p.grounded {
        if p.vy < 0.0 { AnimState::Jump } else { AnimState::Fall }
    } else if p.vx != 0.0 {
        AnimState::Run
    } else {
        AnimState::Idle
    };
}

/// Enemy integration: patrol intent applies only while grounded (a
/// falling enemy drops straight down), bounded patrols clamp to the
/// anchor range and turn around, then gravity + drag + position.
pub fn integrate_enemy(e: &mut Enemy, t: &Tuning, dt: f32) {
    e.vx = if e.grounded { e.speed * e.direction } else { 0.0 };
    e.vy = fall_step(e.vy, t, dt);
    e.rect.x += e.vx * dt;
    e.rect.y += e.vy * dt;

    if let Some(half) = e.patrol_half {
        if e.rect.x > e.anchor_x + half {
            e.rect.x = e.anchor_x + half;
            e.direction = -1.0;
        } else if e.rect.x < e.anchor_x - half {
            e.rect.x = e.anchor_x - half;
            e.direction = 1.0;
        }
    }
}

/// Straight-line flight with Euclidean range accounting. The projectile
/// is marked deleted strictly after its travel exceeds max range, never
/// at exactly max range.
pub fn integrate_projectile(pr: &mut Projectile, dt: f32) {
    let step = pr.speed * dt;
    pr.rect.x += pr.dir_x * step;
    pr.rect.y += pr.dir_y * step;
    pr.traveled += step;
    if pr.traveled > pr.max_range {
        pr.deleted = true;
    }
}

/// Coins advance their bob phase in place; hearts drift down and expire
/// after their lifetime.
pub fn integrate_pickup(pk: &mut Pickup, dt: f32) {
    pk.age_ms += dt;
    match pk.kind {
        PickupKind::Coin { .. } => {
            pk.bob_phase += COIN_BOB_RATE * dt;
        }
        PickupKind::Heart => {
            pk.rect.y += HEART_FALL_SPEED * dt;
            if pk.age_ms > HEART_LIFETIME_MS {
                pk.deleted = true;
            }
        }
    }
}

/// Sinusoidal hover around the anchor plus the shot cooldown. Returns
/// true when the cooldown has elapsed; the caller resets it and spawns
/// the shot.
pub fn integrate_turret(tr: &mut Turret, dt: f32) -> bool {
    tr.hover_phase += TURRET_HOVER_RATE * dt;
    tr.rect.y = tr.anchor_y + tr.hover_phase.sin() * TURRET_HOVER_AMOUNT;
    tr.shot_cooldown_ms -= dt;
    tr.shot_cooldown_ms <= 0.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entity::ProjectileOwner;

    fn r(x: f32, y: f32, w: f32, h: f32) -> Rect {
        Rect { x, y, w, h }
    }

    #[test]
    fn overlap_is_strict() {
        let a = r(0.0, 0.0, 10.0, 10.0);
        // Touching edges do not overlap
        assert!(!overlaps(&a, &r(10.0, 0.0, 10.0, 10.0)));
        assert!(!overlaps(&a, &r(0.0, 10.0, 10.0, 10.0)));
        // Any positive penetration does
        assert!(overlaps(&a, &r(9.9, 0.0, 10.0, 10.0)));
        assert!(overlaps(&a, &r(0.0, 9.9, 10.0, 10.0)));
    }

    #[test]
    fn overlap_is_symmetric() {
        let a = r(0.0, 0.0, 10.0, 10.0);
        let b = r(5.0, 5.0, 10.0, 10.0);
        assert_eq!(overlaps(&a, &b), overlaps(&b, &a));
        let c = r(50.0, 50.0, 10.0, 10.0);
        assert_eq!(overlaps(&a, &c), overlaps(&c, &a));
    }

    #[test]
    fn containment_overlaps() {
        let outer = r(0.0, 0.0, 100.0, 100.0);
        let inner = r(40.0, 40.0, 10.0, 10.0);
        assert!(overlaps(&outer, &inner));
        assert!(overlaps(&inner, &outer));
    }

    #[test]
    fn resolve_picks_shallowest_side() {
        let plat = r(0.0, 100.0, 200.0, 20.0);
        // Falling onto the top: small vertical depth, huge horizontal
        let from_above = r(80.0, 60.0, 50.0, 45.0);
        assert_eq!(resolve_direction(&from_above, &plat), Some(Side::Top));
        // Rising into the underside
        let from_below = r(80.0, 115.0, 50.0, 50.0);
        assert_eq!(resolve_direction(&from_below, &plat), Some(Side::Bottom));
        // Walking right into the left face
        let wall = r(100.0, 0.0, 50.0, 200.0);
        let from_left = r(55.0, 80.0, 50.0, 50.0);
        assert_eq!(resolve_direction(&from_left, &wall), Some(Side::Left));
        // Walking left into the right face
        let from_right = r(145.0, 80.0, 50.0, 50.0);
        assert_eq!(resolve_direction(&from_right, &wall), Some(Side::Right));
    }

    #[test]
    fn resolve_tie_prefers_top() {
        // Identical rects: all four depths equal, Top wins
        let a = r(0.0, 0.0, 10.0, 10.0);
        assert_eq!(resolve_direction(&a, &a), Some(Side::Top));
    }

    #[test]
    fn resolve_none_without_overlap() {
        let a = r(0.0, 0.0, 10.0, 10.0);
        assert_eq!(resolve_direction(&a, &r(100.0, 100.0, 10.0, 10.0)), None);
        // Touching is not overlapping
        assert_eq!(resolve_direction(&a, &r(10.0, 0.0, 10.0, 10.0)), None);
    }

    #[test]
    fn drag_never_reverses_a_fall() {
        let t = Tuning { gravity: 0.0, drag: 0.5, ..Tuning::default() };
        // A tiny fall speed with outsized drag over a long dt clamps to 0
        assert_eq!(fall_step(0.001, &t, 100.0), 0.0);
        // Upward motion is untouched by drag
        assert_eq!(fall_step(-0.4, &t, 100.0), -0.4);
    }

    #[test]
    fn gravity_accumulates_per_ms() {
        let t = Tuning { drag: 0.0, ..Tuning::default() };
        let vy = fall_step(0.0, &t, 100.0);
        assert!((vy - 0.1).abs() < 1e-6);
    }

    #[test]
    fn jump_requires_ground() {
        let t = Tuning::default();
        let input = FrameInput { jump: true, ..FrameInput::default() };

        let mut airborne = Player::new(0.0, 0.0);
        airborne.grounded = false;
        airborne.vy = 0.2;
        integrate_player(&mut airborne, &input, &t, 16.0);
        assert!(airborne.vy > 0.0);

        let mut grounded = Player::new(0.0, 0.0);
        grounded.grounded = true;
        integrate_player(&mut grounded, &input, &t, 16.0);
        assert!(grounded.vy < 0.0);
        assert!(!grounded.grounded);
    }

    #[test]
    fn facing_follows_intent() {
        let t = Tuning::default();
        let mut p = Player::new(0.0, 0.0);
        integrate_player(&mut p, &FrameInput { left: true, ..Default::default() }, &t, 16.0);
        assert_eq!(p.facing, Facing::Left);
        assert!(p.vx < 0.0);
        integrate_player(&mut p, &FrameInput { right: true, ..Default::default() }, &t, 16.0);
        assert_eq!(p.facing, Facing::Right);
        assert!(p.vx > 0.0);
        // No intent: horizontal stop, facing retained
        integrate_player(&mut p, &FrameInput::default(), &t, 16.0);
        assert_eq!(p.vx, 0.0);
        assert_eq!(p.facing, Facing::Right);
    }

    #[test]
    fn bounded_patrol_turns_at_range() {
        let t = Tuning { gravity: 0.0, ..Tuning::default() };
        let mut e = Enemy::grunt(100.0, 0.0, Some(50.0));
        e.grounded = true;
        // Walk right until the clamp fires
        for _ in 0..40 {
            integrate_enemy(&mut e, &t, 16.0);
        }
        assert!(e.rect.x <= 150.0);
        assert_eq!(e.direction, -1.0);
    }

    #[test]
    fn airborne_enemy_stops_patrolling() {
        let t = Tuning { gravity: 0.0, ..Tuning::default() };
        let mut e = Enemy::grunt(100.0, 0.0, None);
        e.grounded = false;
        integrate_enemy(&mut e, &t, 16.0);
        assert_eq!(e.rect.x, 100.0);
    }

    #[test]
    fn projectile_deleted_strictly_past_range() {
        let mut pr = Projectile::new(0.0, 0.0, 1.0, 0.0, ProjectileOwner::Player);
        // speed 0.5 px/ms: 1600 ms covers exactly 800 px, the full range
        integrate_projectile(&mut pr, 1600.0 / 2.0);
        integrate_projectile(&mut pr, 1600.0 / 2.0);
        assert!((pr.traveled - 800.0).abs() < 1e-3);
        assert!(!pr.deleted);
        // One more step crosses the line
        integrate_projectile(&mut pr, 1.0);
        assert!(pr.deleted);
    }

    #[test]
    fn heart_expires_after_lifetime() {
        let mut h = Pickup::heart(0.0, 0.0);
        integrate_pickup(&mut h, HEART_LIFETIME_MS);
        assert!(!h.deleted);
        integrate_pickup(&mut h, 1.0);
        assert!(h.deleted);
    }

    #[test]
    fn heart_falls_and_coin_stays() {
        let mut h = Pickup::heart(0.0, 100.0);
        integrate_pickup(&mut h, 100.0);
        assert!(h.rect.y > 100.0);

        let mut c = Pickup::coin(0.0, 100.0);
        integrate_pickup(&mut c, 100.0);
        assert_eq!(c.rect.y, 100.0);
        assert!(c.bob_phase > 0.0);
    }

    #[test]
    fn turret_fires_on_cooldown() {
        let mut tr = Turret::new(0.0, 200.0);
        assert!(!integrate_turret(&mut tr, 1000.0));
        assert!(integrate_turret(&mut tr, 600.0));
    }

    #[test]
    fn anim_tracks_motion() {
        let mut p = Player::new(0.0, 0.0);
        p.grounded = true;
        p.vx = 0.0;
        update_player_anim(&mut p);
        assert_eq!(p.anim, AnimState::Idle);
        p.vx = 0.3;
        update_player_anim(&mut p);
        assert_eq!(p.anim, AnimState::Run);
        p.grounded = false;
        p.vy = -0.5;
        update_player_anim(&mut p);
        assert_eq!(p.anim, AnimState::Jump);
        p.vy = 0.2;
        update_player_anim(&mut p);
        assert_eq!(p.anim, AnimState::Fall);
        p.anim = AnimState::Dead;
        p.vy = 0.0;
        update_player_anim(&mut p);
        assert_eq!(p.anim, AnimState::Dead);
    }
}
