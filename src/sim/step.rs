/// The step function: advances the world by one frame of dt milliseconds.
///
/// Processing order (fixed, total):
///   1. Spawner update (ambient enemies, boss phase)
///   2. Player shot spawning
///   3. Physics integration (player, enemies + boss volleys, turrets,
///      projectiles, pickups)
///   4. Collision passes:
///        player ↔ platforms (grounded reset immediately before)
///        enemies ↔ platforms, enemy ↔ enemy
///        player ↔ pickups
///        player ↔ enemies (contact damage)
///        player ↔ turrets
///        player ↔ death zones
///        projectiles ↔ enemies / turrets / player, then terrain
///        hidden platform reveal
///   5. Lifecycle sweep (single retain per collection, after all passes)
///   6. Player world-bounds clamp (x only)
///   7. Camera follow
///   8. Win / lose evaluation
///
/// The level transition script replaces the whole pipeline while active:
/// entities freeze and only the scripted player/vine motion runs.

use crate::domain::collision;
use crate::domain::entity::{FrameInput, Pickup, PickupKind, Projectile, ProjectileOwner, Vine};
use crate::domain::entity::{AnimState, Facing, TURRET_SHOT_COOLDOWN_MS};
use crate::domain::physics;
use super::event::GameEvent;
use super::world::{
    GameState, Transition, TransitionStage, WorldState, CLIMB_SPEED, REVEAL_DISTANCE,
    WATERING_MS, WIPE_MS,
};

/// How far past the vine top the player keeps climbing before the wipe.
const CLIMB_OVERSHOOT: f32 = 100.0;

// ══════════════════════════════════════════════════════════════
// Main entry point
// ══════════════════════════════════════════════════════════════

pub fn step(world: &mut WorldState, input: FrameInput, dt: f32) -> Vec<GameEvent> {
    let mut events: Vec<GameEvent> = Vec::new();

    if world.transition.is_some() {
        resolve_transition(world, dt, &mut events);
        world.camera.follow(&world.player.rect);
        return events;
    }
    if world.state != GameState::Playing {
        return events;
    }

    world.tick += 1;
    tick_message(world, dt);

    resolve_spawner(world, dt, &mut events);
    resolve_player_shot(world, &input, &mut events);
    resolve_integration(world, &input, dt, &mut events);

    resolve_player_platforms(world);
    resolve_enemy_platforms(world);
    resolve_enemy_pairs(world);
    resolve_pickup_contact(world, &mut events);
    resolve_enemy_contact(world, &mut events);
    resolve_turret_contact(world, &mut events);
    resolve_death_zones(world, &mut events);
    resolve_projectile_hits(world, &mut events);
    resolve_hidden_reveal(world);

    sweep(world);
    collision::clamp_player_x(&mut world.player, world.world_w);
    physics::update_player_anim(&mut world.player);
    world.camera.follow(&world.player.rect);
    resolve_win_lose(world, &mut events);

    events
}

fn tick_message(world: &mut WorldState, dt: f32) {
    if world.message_timer_ms > 0.0 {
        world.message_timer_ms -= dt;
        if world.message_timer_ms <= 0.0 {
            world.message_timer_ms = 0.0;
            world.message.clear();
        }
    }
}

// ══════════════════════════════════════════════════════════════
// Spawning and integration
// ══════════════════════════════════════════════════════════════

fn resolve_spawner(world: &mut WorldState, dt: f32, events: &mut Vec<GameEvent>) {
    let boss_alive = world.boss_alive();
    let spawned = world.spawner.update(dt, world.score, boss_alive, world.world_w);
    for e in spawned {
        events.push(GameEvent::EnemySpawned { boss: e.boss });
        world.enemies.push(e);
    }
}

fn resolve_player_shot(world: &mut WorldState, input: &FrameInput, events: &mut Vec<GameEvent>) {
    if !input.shoot || !world.player.can_shoot() {
        return;
    }
    let p = &mut world.player;
    let dir = p.facing.sign();
    world.projectiles.push(Projectile::new(
        p.rect.center_x() + dir * p.rect.w / 2.0,
        p.rect.center_y(),
        dir,
        0.0,
        ProjectileOwner::Player,
    ));
    p.shoot_cooldown_ms = world.tuning.shoot_cooldown_ms;
    events.push(GameEvent::ShotFired);
}

fn resolve_integration(
    world: &mut WorldState,
    input: &FrameInput,
    dt: f32,
    events: &mut Vec<GameEvent>,
) {
    if input.jump && world.player.grounded {
        events.push(GameEvent::PlayerJumped);
    }
    physics::integrate_player(&mut world.player, input, &world.tuning, dt);

    let tuning = world.tuning;
    let (px, py) = (world.player.rect.center_x(), world.player.rect.center_y());
    for e in world.enemies.iter_mut() {
        physics::integrate_enemy(e, &tuning, dt);
        collision::clamp_enemy_to_world(e, world.world_w);

        if e.shot_interval_ms > 0.0 {
            e.shot_cooldown_ms -= dt;
            if e.shot_cooldown_ms <= 0.0 {
                e.shot_cooldown_ms = e.shot_interval_ms;
                let (cx, cy) = (e.rect.center_x(), e.rect.center_y());
                let (dx, dy) = (px - cx, py - cy);
                // One shot straight at the player, two fanned off it
                for tilt in [-0.3_f32, 0.0, 0.3] {
                    world.projectiles.push(Projectile::new(
                        cx,
                        cy,
                        dx - dy * tilt,
                        dy + dx * tilt,
                        ProjectileOwner::Boss,
                    ));
                }
                events.push(GameEvent::BossFired);
            }
        }
    }

    for (i, tr) in world.turrets.iter_mut().enumerate() {
        if physics::integrate_turret(tr, dt) {
            tr.shot_cooldown_ms = TURRET_SHOT_COOLDOWN_MS;
            world.projectiles.push(Projectile::new(
                tr.rect.center_x(),
                tr.rect.bottom(),
                0.0,
                1.0,
                ProjectileOwner::Turret(i),
            ));
            events.push(GameEvent::TurretFired);
        }
    }

    for pr in world.projectiles.iter_mut() {
        physics::integrate_projectile(pr, dt);
    }
    for pk in world.pickups.iter_mut() {
        physics::integrate_pickup(pk, dt);
    }
}

// ══════════════════════════════════════════════════════════════
// Collision passes
// ══════════════════════════════════════════════════════════════

fn resolve_player_platforms(world: &mut WorldState) {
    world.player.grounded = false;
    for plat in &world.platforms {
        if physics::overlaps(&world.player.rect, &plat.rect) {
            collision::collide_player_platform(&mut world.player, &plat.rect);
        }
    }
}

fn resolve_enemy_platforms(world: &mut WorldState) {
    for e in world.enemies.iter_mut() {
        e.grounded = false;
        for plat in &world.platforms {
            if physics::overlaps(&e.rect, &plat.rect) {
                collision::collide_enemy_platform(e, &plat.rect);
            }
        }
    }
}

/// Overlapping enemies both turn around. Purely cosmetic, keeps patrols
/// from stacking up on one platform.
fn resolve_enemy_pairs(world: &mut WorldState) {
    for i in 0..world.enemies.len() {
        for j in (i + 1)..world.enemies.len() {
            let (a, b) = world.enemies.split_at_mut(j);
            let (a, b) = (&mut a[i], &mut b[0]);
            if a.deleted || b.deleted {
                continue;
            }
            if physics::overlaps(&a.rect, &b.rect) {
                a.direction *= -1.0;
                b.direction *= -1.0;
            }
        }
    }
}

fn resolve_pickup_contact(world: &mut WorldState, events: &mut Vec<GameEvent>) {
    let mut all_collected = false;
    for pk in world.pickups.iter_mut() {
        if pk.deleted || !physics::overlaps(&world.player.rect, &pk.rect) {
            continue;
        }
        pk.deleted = true;
        match pk.kind {
            PickupKind::Coin { value } => {
                world.score += value;
                world.coins_collected += 1;
                events.push(GameEvent::CoinPicked { x: pk.rect.x, y: pk.rect.y });
                if world.total_coins > 0 && world.coins_collected >= world.total_coins {
                    all_collected = true;
                }
            }
            PickupKind::Heart => {
                world.player.heal(1);
                events.push(GameEvent::HeartPicked);
            }
        }
    }
    if all_collected {
        events.push(GameEvent::AllCoinsCollected);
    }
}

fn resolve_enemy_contact(world: &mut WorldState, events: &mut Vec<GameEvent>) {
    let window = world.tuning.invuln_window_ms;
    for e in &world.enemies {
        if e.deleted {
            continue;
        }
        if physics::overlaps(&world.player.rect, &e.rect)
            && world.player.take_damage(e.damage, window)
        {
            events.push(GameEvent::PlayerDamaged);
        }
    }
}

fn resolve_projectile_hits(world: &mut WorldState, events: &mut Vec<GameEvent>) {
    let window = world.tuning.invuln_window_ms;
    for pr in world.projectiles.iter_mut() {
        if pr.deleted {
            continue;
        }

        match pr.owner {
            ProjectileOwner::Player => {
                for e in world.enemies.iter_mut() {
                    if e.deleted || !physics::overlaps(&pr.rect, &e.rect) {
                        continue;
                    }
                    pr.deleted = true;
                    e.health = e.health.saturating_sub(1);
                    if e.health == 0 {
                        e.deleted = true;
                        world.score += e.points;
                        events.push(GameEvent::EnemyKilled { points: e.points, boss: e.boss });
                        if world.spawner.roll_drop(e.drop_chance) {
                            let (cx, cy) = (e.rect.center_x(), e.rect.center_y());
                            world.pickups.push(Pickup::heart(cx - 15.0, cy - 15.0));
                            events.push(GameEvent::HeartDropped { x: cx, y: cy });
                        }
                    }
                    break;
                }
                if !pr.deleted {
                    for tr in world.turrets.iter_mut() {
                        if tr.deleted || !physics::overlaps(&pr.rect, &tr.rect) {
                            continue;
                        }
                        pr.deleted = true;
                        tr.deleted = true;
                        world.score += tr.points;
                        events.push(GameEvent::EnemyKilled { points: tr.points, boss: false });
                        break;
                    }
                }
            }
            ProjectileOwner::Turret(owner_idx) => {
                if physics::overlaps(&pr.rect, &world.player.rect) {
                    pr.deleted = true;
                    if world.player.take_damage(1, window) {
                        events.push(GameEvent::PlayerDamaged);
                    }
                    continue;
                }
                // A turret never shoots itself down
                for (i, tr) in world.turrets.iter().enumerate() {
                    if i != owner_idx && !tr.deleted && physics::overlaps(&pr.rect, &tr.rect) {
                        pr.deleted = true;
                        break;
                    }
                }
            }
            ProjectileOwner::Boss => {
                if physics::overlaps(&pr.rect, &world.player.rect) {
                    pr.deleted = true;
                    if world.player.take_damage(2, window) {
                        events.push(GameEvent::PlayerDamaged);
                    }
                }
            }
        }

        // Terrain last: entity hits win when a shot overlaps both in the
        // same frame.
        if !pr.deleted {
            for plat in &world.platforms {
                if physics::overlaps(&pr.rect, &plat.rect) {
                    pr.deleted = true;
                    break;
                }
            }
        }
    }
}

fn resolve_turret_contact(world: &mut WorldState, events: &mut Vec<GameEvent>) {
    let window = world.tuning.invuln_window_ms;
    for tr in &world.turrets {
        if tr.deleted {
            continue;
        }
        if physics::overlaps(&world.player.rect, &tr.rect)
            && world.player.take_damage(tr.damage, window)
        {
            events.push(GameEvent::PlayerDamaged);
        }
    }
}

fn resolve_death_zones(world: &mut WorldState, events: &mut Vec<GameEvent>) {
    if world.player.health == 0 {
        return;
    }
    for dz in &world.death_zones {
        if physics::overlaps(&world.player.rect, &dz.rect) {
            world.player.kill();
            events.push(GameEvent::PlayerKilled);
            return;
        }
    }
}

fn resolve_hidden_reveal(world: &mut WorldState) {
    let (px, py) = (world.player.rect.center_x(), world.player.rect.center_y());
    for plat in world.platforms.iter_mut() {
        if !plat.hidden || plat.revealed {
            continue;
        }
        let dx = plat.rect.center_x() - px;
        let dy = plat.rect.center_y() - py;
        if (dx * dx + dy * dy).sqrt() < REVEAL_DISTANCE {
            plat.revealed = true;
        }
    }
}

/// One retain per collection. Runs strictly after every pass so deletion
/// order can never affect what the passes saw this frame.
fn sweep(world: &mut WorldState) {
    world.pickups.retain(|p| !p.deleted);
    world.enemies.retain(|e| !e.deleted);
    world.projectiles.retain(|p| !p.deleted);
    world.turrets.retain(|t| !t.deleted);
}

// ══════════════════════════════════════════════════════════════
// Win / lose and the transition script
// ══════════════════════════════════════════════════════════════

fn resolve_win_lose(world: &mut WorldState, events: &mut Vec<GameEvent>) {
    if world.player.health == 0 {
        if world.player.anim != AnimState::Dead {
            world.player.anim = AnimState::Dead;
            events.push(GameEvent::PlayerKilled);
        }
        world.state = GameState::GameOver;
        return;
    }

    let at_exit = world
        .end_zone
        .as_ref()
        .map_or(false, |ez| physics::overlaps(&world.player.rect, ez));
    if at_exit || world.all_coins_collected() {
        start_transition(world, events);
    }
}

/// Begin the end-of-level script. Legal only while Playing with no
/// script already running; a silent no-op otherwise.
pub fn start_transition(world: &mut WorldState, events: &mut Vec<GameEvent>) -> bool {
    if world.state != GameState::Playing || world.transition.is_some() {
        return false;
    }
    world.transition = Some(Transition::new(world.exit_x));
    world.player.vx = 0.0;
    world.player.vy = 0.0;
    events.push(GameEvent::TransitionStarted);
    true
}

fn resolve_transition(world: &mut WorldState, dt: f32, events: &mut Vec<GameEvent>) {
    let Some(tr) = world.transition.as_mut() else { return };

    match tr.stage {
        TransitionStage::Approach => {
            let target = tr.exit_x - world.player.rect.w / 2.0;
            let dx = target - world.player.rect.x;
            let step = world.tuning.move_speed * dt;
            world.player.facing = if dx < 0.0 { Facing::Left } else { Facing::Right };
            world.player.anim = AnimState::Run;
            if dx.abs() <= step {
                world.player.rect.x = target;
                world.player.anim = AnimState::Watering;
                world.vine = Some(Vine::new(tr.exit_x, world.player.rect.bottom()));
                tr.stage = TransitionStage::Watering;
                tr.timer_ms = 0.0;
            } else {
                world.player.rect.x += step * dx.signum();
            }
        }
        TransitionStage::Watering => {
            tr.timer_ms += dt;
            if tr.timer_ms >= WATERING_MS {
                tr.stage = TransitionStage::Growing;
                tr.timer_ms = 0.0;
            }
        }
        TransitionStage::Growing => {
            if let Some(vine) = world.vine.as_mut() {
                if vine.grow(dt) {
                    world.player.anim = AnimState::Climb;
                    tr.stage = TransitionStage::Climbing;
                    events.push(GameEvent::VineGrown);
                }
            } else {
                // No vine to grow; skip straight to the wipe
                tr.stage = TransitionStage::Wipe;
                tr.timer_ms = 0.0;
            }
        }
        TransitionStage::Climbing => {
            world.player.rect.y -= CLIMB_SPEED * dt;
            let past_top = world
                .vine
                .as_ref()
                .map_or(true, |v| world.player.rect.bottom() < v.top_y() - CLIMB_OVERSHOOT);
            if past_top {
                tr.stage = TransitionStage::Wipe;
                tr.timer_ms = 0.0;
            }
        }
        TransitionStage::Wipe => {
            tr.timer_ms += dt;
            if tr.timer_ms >= WIPE_MS {
                world.transition = None;
                world.vine = None;
                let next = world.current_level + 1;
                if next < world.total_levels {
                    events.push(GameEvent::LevelAdvanced { index: next });
                } else {
                    world.state = GameState::Win;
                    events.push(GameEvent::GameWon);
                }
            }
        }
    }
}

// ══════════════════════════════════════════════════════════════
// Tests
// ══════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entity::{DeathZone, Enemy, Platform, PlatformStyle, Rect, Turret};
    use crate::sim::world::WorldState;

    const DT: f32 = 16.0;

    fn ground(x: f32, w: f32) -> Platform {
        Platform::new(Rect { x, y: 400.0, w, h: 50.0 }, PlatformStyle::Ground)
    }

    /// Minimal playable world: one ground slab, player standing on it.
    fn world() -> WorldState {
        let mut w = WorldState::new(1);
        w.state = GameState::Playing;
        w.world_w = 2562.0;
        w.world_h = 1440.0;
        w.total_levels = 2;
        w.current_level = 0;
        w.exit_x = 2000.0;
        w.platforms.push(ground(0.0, 2562.0));
        w.player.rect.x = 100.0;
        w.player.rect.y = 400.0 - w.player.rect.h;
        w.player.grounded = true;
        w.spawner.enabled = false;
        w
    }

    fn run(w: &mut WorldState, frames: usize, input: FrameInput) -> Vec<GameEvent> {
        let mut all = vec![];
        for _ in 0..frames {
            all.extend(step(w, input, DT));
        }
        all
    }

    #[test]
    fn player_falls_and_lands() {
        let mut w = world();
        w.player.rect.y = 200.0;
        w.player.grounded = false;
        run(&mut w, 200, FrameInput::default());
        assert!(w.player.grounded);
        assert_eq!(w.player.rect.bottom(), 400.0);
        assert_eq!(w.player.vy, 0.0);
    }

    #[test]
    fn coin_pickup_is_idempotent() {
        let mut w = world();
        w.total_coins = 2;
        w.pickups.push(Pickup::coin(100.0, 360.0));
        let events = run(&mut w, 3, FrameInput::default());
        let picked = events
            .iter()
            .filter(|e| matches!(e, GameEvent::CoinPicked { .. }))
            .count();
        assert_eq!(picked, 1);
        assert_eq!(w.score, 10);
        assert_eq!(w.coins_collected, 1);
        assert!(w.pickups.is_empty());
    }

    #[test]
    fn contact_damage_respects_invulnerability() {
        let mut w = world();
        let mut e = Enemy::grunt(100.0, 400.0 - 40.0, Some(0.0));
        e.speed = 0.0;
        w.enemies.push(e);
        let events = run(&mut w, 10, FrameInput::default());
        let hits = events.iter().filter(|e| **e == GameEvent::PlayerDamaged).count();
        assert_eq!(hits, 1);
        assert_eq!(w.player.health, 2);
    }

    #[test]
    fn death_zone_kills_through_invulnerability() {
        let mut w = world();
        w.player.invuln_ms = 1000.0;
        w.death_zones.push(DeathZone { rect: Rect { x: 80.0, y: 300.0, w: 100.0, h: 200.0 } });
        let events = run(&mut w, 1, FrameInput::default());
        assert!(events.contains(&GameEvent::PlayerKilled));
        assert_eq!(w.player.health, 0);
        assert_eq!(w.state, GameState::GameOver);
    }

    #[test]
    fn game_over_freezes_the_world() {
        let mut w = world();
        w.player.health = 0;
        run(&mut w, 1, FrameInput::default());
        assert_eq!(w.state, GameState::GameOver);
        let tick = w.tick;
        run(&mut w, 5, FrameInput::default());
        assert_eq!(w.tick, tick);
    }

    #[test]
    fn shot_kills_enemy_and_scores() {
        let mut w = world();
        let mut e = Enemy::grunt(300.0, 400.0 - 40.0, Some(0.0));
        e.speed = 0.0;
        e.drop_chance = 0.0;
        w.enemies.push(e);
        let events = run(&mut w, 60, FrameInput { shoot: true, ..Default::default() });
        assert!(events.iter().any(|e| matches!(e, GameEvent::EnemyKilled { points: 50, boss: false })));
        assert!(w.enemies.is_empty());
        assert_eq!(w.score, 50);
    }

    #[test]
    fn guaranteed_drop_spawns_heart() {
        let mut w = world();
        let mut e = Enemy::grunt(300.0, 400.0 - 40.0, Some(0.0));
        e.speed = 0.0;
        e.drop_chance = 1.0;
        w.enemies.push(e);
        let events = run(&mut w, 60, FrameInput { shoot: true, ..Default::default() });
        assert!(events.iter().any(|e| matches!(e, GameEvent::HeartDropped { .. })));
        assert!(w.pickups.iter().any(|p| p.kind == PickupKind::Heart));
    }

    #[test]
    fn shot_cooldown_limits_fire_rate() {
        let mut w = world();
        // 10 frames at 16 ms = 160 ms, under the 300 ms cooldown
        let events = run(&mut w, 10, FrameInput { shoot: true, ..Default::default() });
        let shots = events.iter().filter(|e| **e == GameEvent::ShotFired).count();
        assert_eq!(shots, 1);
    }

    #[test]
    fn turret_fires_downward_and_hits_player() {
        let mut w = world();
        w.turrets.push(Turret::new(
            w.player.rect.center_x() - 20.0,
            100.0,
        ));
        let events = run(&mut w, 400, FrameInput::default());
        assert!(events.contains(&GameEvent::TurretFired));
        assert!(events.contains(&GameEvent::PlayerDamaged));
    }

    #[test]
    fn player_shot_destroys_turret() {
        let mut w = world();
        w.turrets.push(Turret::new(400.0, 400.0 - 45.0));
        run(&mut w, 120, FrameInput { shoot: true, ..Default::default() });
        assert!(w.turrets.is_empty());
        assert_eq!(w.score, 100);
    }

    #[test]
    fn shot_kills_enemy_pressed_against_a_wall() {
        let mut w = world();
        let mut e = Enemy::grunt(300.0, 400.0 - 40.0, Some(0.0));
        e.speed = 0.0;
        e.drop_chance = 0.0;
        w.enemies.push(e);
        w.platforms.push(Platform::new(
            Rect { x: 325.0, y: 0.0, w: 50.0, h: 400.0 },
            PlatformStyle::Ground,
        ));
        // After one step the shot overlaps the enemy and the wall at once;
        // the enemy check runs first, so the wall never absorbs the hit
        w.projectiles.push(Projectile::new(316.0, 380.0, 1.0, 0.0, ProjectileOwner::Player));
        let events = run(&mut w, 1, FrameInput::default());
        assert!(events.iter().any(|e| matches!(e, GameEvent::EnemyKilled { .. })));
        assert!(w.enemies.is_empty());
        assert!(w.projectiles.is_empty());
    }

    #[test]
    fn boss_fires_an_aimed_volley() {
        let mut w = world();
        let mut b = Enemy::boss(800.0, 0.0, 0);
        b.rect.y = 400.0 - b.rect.h;
        b.speed = 0.0;
        w.enemies.push(b);
        // 1500 ms interval at escalation level 0
        let events = run(&mut w, 95, FrameInput::default());
        assert!(events.contains(&GameEvent::BossFired));
        let boss_shots = w
            .projectiles
            .iter()
            .filter(|p| p.owner == ProjectileOwner::Boss)
            .count();
        assert_eq!(boss_shots, 3);
    }

    #[test]
    fn boss_shot_hits_for_two() {
        let mut w = world();
        w.projectiles.push(Projectile::new(
            w.player.rect.center_x() - 20.0,
            w.player.rect.center_y(),
            1.0,
            0.0,
            ProjectileOwner::Boss,
        ));
        let events = run(&mut w, 1, FrameInput::default());
        assert!(events.contains(&GameEvent::PlayerDamaged));
        assert_eq!(w.player.health, 1);
        assert!(w.projectiles.is_empty());
    }

    #[test]
    fn projectile_stops_at_terrain() {
        let mut w = world();
        w.platforms.push(Platform::new(
            Rect { x: 300.0, y: 0.0, w: 50.0, h: 400.0 },
            PlatformStyle::Ground,
        ));
        run(&mut w, 60, FrameInput { shoot: true, ..Default::default() });
        // Let the last shot reach the wall before checking
        run(&mut w, 40, FrameInput::default());
        assert!(w.projectiles.is_empty());
    }

    #[test]
    fn enemies_reverse_on_meeting() {
        let mut w = world();
        let mut a = Enemy::grunt(200.0, 400.0 - 40.0, None);
        let mut b = Enemy::grunt(230.0, 400.0 - 40.0, None);
        a.direction = 1.0;
        b.direction = -1.0;
        a.grounded = true;
        b.grounded = true;
        w.enemies.push(a);
        w.enemies.push(b);
        run(&mut w, 1, FrameInput::default());
        assert_eq!(w.enemies[0].direction, -1.0);
        assert_eq!(w.enemies[1].direction, 1.0);
    }

    #[test]
    fn hidden_platform_reveals_near_player_and_stays() {
        let mut w = world();
        w.platforms.push(Platform::hidden(
            Rect { x: 2000.0, y: 300.0, w: 100.0, h: 30.0 },
            PlatformStyle::Ledge,
        ));
        run(&mut w, 1, FrameInput::default());
        assert!(!w.platforms[1].revealed);

        w.player.rect.x = 2000.0;
        w.player.rect.y = 320.0 - w.player.rect.h;
        run(&mut w, 1, FrameInput::default());
        assert!(w.platforms[1].revealed);

        w.player.rect.x = 100.0;
        run(&mut w, 1, FrameInput::default());
        assert!(w.platforms[1].revealed);
    }

    #[test]
    fn transition_starts_only_while_playing() {
        let mut w = world();
        w.state = GameState::Menu;
        let mut events = vec![];
        assert!(!start_transition(&mut w, &mut events));
        assert!(w.transition.is_none());

        w.state = GameState::Playing;
        assert!(start_transition(&mut w, &mut events));
        assert!(w.transition.is_some());
        // Already running: second start is refused
        assert!(!start_transition(&mut w, &mut events));
    }

    #[test]
    fn all_coins_collected_triggers_transition() {
        let mut w = world();
        w.total_coins = 1;
        w.pickups.push(Pickup::coin(100.0, 360.0));
        let events = run(&mut w, 2, FrameInput::default());
        assert!(events.contains(&GameEvent::AllCoinsCollected));
        assert!(events.contains(&GameEvent::TransitionStarted));
        assert!(w.transition.is_some());
    }

    #[test]
    fn end_zone_overlap_triggers_transition() {
        let mut w = world();
        w.end_zone = Some(Rect { x: 90.0, y: 300.0, w: 100.0, h: 100.0 });
        let events = run(&mut w, 1, FrameInput::default());
        assert!(events.contains(&GameEvent::TransitionStarted));
    }

    #[test]
    fn transition_runs_every_stage_in_order() {
        let mut w = world();
        w.exit_x = 200.0;
        let mut events = vec![];
        start_transition(&mut w, &mut events);

        let mut seen = vec![TransitionStage::Approach];
        let mut all_events = vec![];
        for _ in 0..2000 {
            all_events.extend(step(&mut w, FrameInput::default(), DT));
            match &w.transition {
                Some(tr) => {
                    if *seen.last().unwrap() != tr.stage {
                        seen.push(tr.stage);
                    }
                }
                None => break,
            }
        }
        assert_eq!(
            seen,
            vec![
                TransitionStage::Approach,
                TransitionStage::Watering,
                TransitionStage::Growing,
                TransitionStage::Climbing,
                TransitionStage::Wipe,
            ]
        );
        assert!(all_events.contains(&GameEvent::LevelAdvanced { index: 1 }));
        assert!(w.transition.is_none());
    }

    #[test]
    fn last_level_transition_wins_the_game() {
        let mut w = world();
        w.total_levels = 1;
        w.exit_x = 120.0;
        let mut events = vec![];
        start_transition(&mut w, &mut events);
        let mut all_events = vec![];
        for _ in 0..2000 {
            all_events.extend(step(&mut w, FrameInput::default(), DT));
            if w.transition.is_none() {
                break;
            }
        }
        assert_eq!(w.state, GameState::Win);
        assert!(all_events.contains(&GameEvent::GameWon));
    }

    #[test]
    fn wipe_progress_never_increases() {
        let mut w = world();
        w.exit_x = 120.0;
        let mut events = vec![];
        start_transition(&mut w, &mut events);
        let mut last = 1.0_f32;
        for _ in 0..2000 {
            step(&mut w, FrameInput::default(), DT);
            let Some(tr) = &w.transition else { break };
            let p = tr.wipe_progress();
            assert!(p <= last + 1e-6);
            last = p;
        }
    }

    #[test]
    fn player_stays_inside_world() {
        let mut w = world();
        w.player.rect.x = 5.0;
        run(&mut w, 100, FrameInput { left: true, ..Default::default() });
        assert_eq!(w.player.rect.x, 0.0);
        run(&mut w, 10_000, FrameInput { right: true, ..Default::default() });
        assert_eq!(w.player.rect.right(), w.world_w);
    }

    #[test]
    fn boss_spawn_emits_event() {
        let mut w = world();
        w.spawner.enabled = true;
        w.score = 2000;
        let events = run(&mut w, 1, FrameInput::default());
        assert!(events.contains(&GameEvent::EnemySpawned { boss: true }));
        assert!(w.boss_alive());
    }

    #[test]
    fn heart_pickup_heals_one_capped() {
        let mut w = world();
        w.player.health = 3;
        w.pickups.push(Pickup::heart(100.0, 360.0));
        run(&mut w, 2, FrameInput::default());
        assert_eq!(w.player.health, 3);

        w.player.health = 1;
        w.pickups.push(Pickup::heart(100.0, 360.0));
        let events = run(&mut w, 2, FrameInput::default());
        assert!(events.contains(&GameEvent::HeartPicked));
        assert_eq!(w.player.health, 2);
    }
}
