/// Collision resolution against solid geometry: snap-out positioning and
/// the side effects that go with each contact side. The frame pipeline in
/// sim/step.rs calls these in its fixed pass order; nothing here deletes
/// an entity, deletion is a separate sweep after all passes.

use super::entity::{Enemy, Player, Rect};
use super::physics::{resolve_direction, Side};

/// Resolve the player against one solid rect. Velocity-gated so that an
/// entity already moving away from a face is left alone:
///   Top while falling     → snap on top, stop fall, grounded
///   Bottom while rising   → snap under, stop rise (head bump)
///   Left while moving right / Right while moving left → snap sideways
pub fn collide_player_platform(p: &mut Player, plat: &Rect) {
    match resolve_direction(&p.rect, plat) {
        Some(Side::Top) if p.vy > 0.0 => {
            p.rect.y = plat.y - p.rect.h;
            p.vy = 0.0;
            p.grounded = true;
        }
        Some(Side::Bottom) if p.vy < 0.0 => {
            p.rect.y = plat.bottom();
            p.vy = 0.0;
        }
        Some(Side::Left) if p.vx > 0.0 => {
            p.rect.x = plat.x - p.rect.w;
        }
        Some(Side::Right) if p.vx < 0.0 => {
            p.rect.x = plat.right();
        }
        _ => {}
    }
}

/// Same snapping as the player, plus side hits turn the patrol around.
pub fn collide_enemy_platform(e: &mut Enemy, plat: &Rect) {
    match resolve_direction(&e.rect, plat) {
        Some(Side::Top) if e.vy > 0.0 => {
            e.rect.y = plat.y - e.rect.h;
            e.vy = 0.0;
            e.grounded = true;
        }
        Some(Side::Bottom) if e.vy < 0.0 => {
            e.rect.y = plat.bottom();
            e.vy = 0.0;
        }
        Some(Side::Left) if e.vx > 0.0 => {
            e.rect.x = plat.x - e.rect.w;
            e.direction = -1.0;
        }
        Some(Side::Right) if e.vx < 0.0 => {
            e.rect.x = plat.right();
            e.direction = 1.0;
        }
        _ => {}
    }
}

/// Keep the player inside the world horizontally. Falling off the bottom
/// is a death zone's job, not a clamp.
pub fn clamp_player_x(p: &mut Player, world_w: f32) {
    if p.rect.x < 0.0 {
        p.rect.x = 0.0;
    } else if p.rect.right() > world_w {
        p.rect.x = world_w - p.rect.w;
    }
}

/// World edges turn an unbounded patrol around.
pub fn clamp_enemy_to_world(e: &mut Enemy, world_w: f32) {
    if e.rect.x < 0.0 {
        e.rect.x = 0.0;
        e.direction = 1.0;
    } else if e.rect.right() > world_w {
        e.rect.x = world_w - e.rect.w;
        e.direction = -1.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn r(x: f32, y: f32, w: f32, h: f32) -> Rect {
        Rect { x, y, w, h }
    }

    #[test]
    fn landing_snaps_and_grounds() {
        let plat = r(0.0, 100.0, 300.0, 20.0);
        // 10 px into the top face, the shallowest of the four depths
        let mut p = Player::new(50.0, 60.0);
        p.vy = 0.3;
        collide_player_platform(&mut p, &plat);
        assert_eq!(p.rect.y, 100.0 - p.rect.h);
        assert_eq!(p.vy, 0.0);
        assert!(p.grounded);
    }

    #[test]
    fn rising_through_top_is_left_alone() {
        // Overlapping the top but moving up: no snap, no grounding
        let plat = r(0.0, 100.0, 300.0, 20.0);
        let mut p = Player::new(50.0, 95.0 - 50.0);
        p.rect.y = 95.0 - p.rect.h + 15.0;
        let y_before = p.rect.y;
        p.vy = -0.3;
        collide_player_platform(&mut p, &plat);
        assert_eq!(p.rect.y, y_before);
        assert!(!p.grounded);
    }

    #[test]
    fn head_bump_stops_rise() {
        let plat = r(0.0, 100.0, 300.0, 20.0);
        let mut p = Player::new(50.0, 110.0);
        p.vy = -0.5;
        collide_player_platform(&mut p, &plat);
        assert_eq!(p.rect.y, 120.0);
        assert_eq!(p.vy, 0.0);
        assert!(!p.grounded);
    }

    #[test]
    fn wall_hit_snaps_sideways() {
        let wall = r(100.0, 0.0, 50.0, 500.0);
        let mut p = Player::new(55.0, 100.0);
        p.vx = 0.3;
        collide_player_platform(&mut p, &wall);
        assert_eq!(p.rect.x, 100.0 - p.rect.w);

        let mut q = Player::new(145.0, 100.0);
        q.vx = -0.3;
        collide_player_platform(&mut q, &wall);
        assert_eq!(q.rect.x, 150.0);
    }

    #[test]
    fn enemy_reverses_on_walls() {
        let wall = r(100.0, 0.0, 50.0, 500.0);
        let mut e = Enemy::grunt(65.0, 100.0, None);
        e.vx = 0.1;
        e.direction = 1.0;
        collide_enemy_platform(&mut e, &wall);
        assert_eq!(e.rect.x, 100.0 - e.rect.w);
        assert_eq!(e.direction, -1.0);

        let mut f = Enemy::grunt(145.0, 100.0, None);
        f.vx = -0.1;
        f.direction = -1.0;
        collide_enemy_platform(&mut f, &wall);
        assert_eq!(f.rect.x, 150.0);
        assert_eq!(f.direction, 1.0);
    }

    #[test]
    fn enemy_lands_without_reversing() {
        let plat = r(0.0, 100.0, 300.0, 20.0);
        let mut e = Enemy::grunt(50.0, 90.0, None);
        e.vy = 0.2;
        e.direction = 1.0;
        collide_enemy_platform(&mut e, &plat);
        assert!(e.grounded);
        assert_eq!(e.direction, 1.0);
    }

    #[test]
    fn player_clamped_inside_world() {
        let mut p = Player::new(-10.0, 0.0);
        clamp_player_x(&mut p, 2562.0);
        assert_eq!(p.rect.x, 0.0);
        p.rect.x = 2560.0;
        clamp_player_x(&mut p, 2562.0);
        assert_eq!(p.rect.x, 2562.0 - p.rect.w);
    }

    #[test]
    fn world_edge_turns_enemy() {
        let mut e = Enemy::grunt(-5.0, 0.0, None);
        e.direction = -1.0;
        clamp_enemy_to_world(&mut e, 2562.0);
        assert_eq!(e.rect.x, 0.0);
        assert_eq!(e.direction, 1.0);
    }
}
