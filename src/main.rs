/// Entry point and game loop.

mod config;
mod domain;
mod sim;
mod ui;

use std::io;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use crossterm::event::{
    KeyCode, KeyboardEnhancementFlags, PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags,
};
use crossterm::{execute, terminal};

use config::GameConfig;
use domain::entity::FrameInput;
use sim::event::GameEvent;
use sim::level::{self, LevelDef};
use sim::save;
use sim::step;
use sim::world::{GameState, WorldState};
use ui::gamepad::GamepadState;
use ui::input::InputState;
use ui::renderer::Renderer;
use ui::sound::SoundEngine;

const FRAME_SLEEP: Duration = Duration::from_millis(5);
/// A stalled terminal produces huge frame gaps; one clamped step keeps
/// the physics stable instead of tunnelling through platforms.
const MAX_DT_MS: f32 = 100.0;

fn main() {
    let config = GameConfig::load();
    let levels = level::load_levels(&config);
    if levels.is_empty() {
        eprintln!("No playable levels found");
        return;
    }

    let seed = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or(0x5eed);

    let mut world = WorldState::new(seed);
    world.total_levels = levels.len();
    world.has_save = save::has_save();

    let mut renderer = Renderer::new();
    if let Err(e) = renderer.init() {
        eprintln!("Terminal init failed: {e}");
        return;
    }

    let enhanced = enable_key_enhancement();

    let sound = SoundEngine::new();

    let result = game_loop(
        &mut world,
        &mut renderer,
        sound.as_ref(),
        &config,
        &levels,
        enhanced,
    );

    if enhanced {
        let _ = execute!(io::stdout(), PopKeyboardEnhancementFlags);
    }
    if let Err(e) = renderer.cleanup() {
        eprintln!("Terminal cleanup failed: {e}");
    }
    if let Err(e) = result {
        eprintln!("Game error: {e}");
    }

    println!();
    println!("Thanks for tending the thicket!");
    println!("Final Score: {}", world.score);
}

/// Ask the terminal to report key release events. Returns whether the
/// enhancement is active; without it, held keys fall back to
/// timeout-based release detection in InputState.
fn enable_key_enhancement() -> bool {
    if !terminal::supports_keyboard_enhancement().unwrap_or(false) {
        return false;
    }
    execute!(
        io::stdout(),
        PushKeyboardEnhancementFlags(KeyboardEnhancementFlags::REPORT_EVENT_TYPES)
    )
    .is_ok()
}

fn game_loop(
    world: &mut WorldState,
    renderer: &mut Renderer,
    sound: Option<&SoundEngine>,
    config: &GameConfig,
    levels: &[LevelDef],
    enhanced: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut kb = InputState::new();
    kb.honor_release = enhanced;
    let mut gp = GamepadState::new();
    gp.load_button_config(&config.gamepad);

    world.tuning = config.physics;

    let mut last_frame = Instant::now();

    loop {
        kb.drain_events();
        gp.update();

        if kb.ctrl_c_pressed() {
            break;
        }
        if handle_meta(world, &mut kb, &gp, levels) {
            break;
        }

        let now = Instant::now();
        let dt = (now.duration_since(last_frame).as_secs_f32() * 1000.0).min(MAX_DT_MS);
        last_frame = now;

        if world.state == GameState::Playing {
            let input = merge_input(&kb, &gp);
            let events = step::step(world, input, dt);
            dispatch_events(world, sound, levels, &events);
        }

        renderer.render(world)?;
        std::thread::sleep(FRAME_SLEEP);
    }

    Ok(())
}

/// Keyboard and gamepad both drive the same four intents; either source
/// holding a direction counts.
fn merge_input(kb: &InputState, gp: &GamepadState) -> FrameInput {
    let keys = kb.frame_input();
    FrameInput {
        left: keys.left || gp.left_held(),
        right: keys.right || gp.right_held(),
        jump: keys.jump || gp.jump_held(),
        shoot: keys.shoot || gp.shoot_held(),
    }
}

fn dispatch_events(
    world: &mut WorldState,
    sound: Option<&SoundEngine>,
    levels: &[LevelDef],
    events: &[GameEvent],
) {
    for event in events {
        if let GameEvent::LevelAdvanced { index } = event {
            if let Err(e) = level::load_level(world, levels, *index) {
                world.set_message(&format!("Level load failed: {e}"), 4000.0);
                world.state = GameState::Win;
            }
        }
    }

    let sfx = match sound {
        Some(s) => s,
        None => return,
    };
    for event in events {
        match event {
            GameEvent::CoinPicked { .. } => sfx.play_coin(),
            GameEvent::HeartPicked => sfx.play_heart(),
            GameEvent::PlayerJumped => sfx.play_jump(),
            GameEvent::PlayerDamaged => sfx.play_hurt(),
            GameEvent::PlayerKilled => sfx.play_die(),
            GameEvent::ShotFired | GameEvent::TurretFired | GameEvent::BossFired => {
                sfx.play_shot()
            }
            GameEvent::EnemySpawned { boss: true } => sfx.play_boss(),
            GameEvent::VineGrown => sfx.play_grow(),
            GameEvent::TransitionStarted => sfx.play_clear(),
            GameEvent::GameWon => sfx.play_clear(),
            _ => {}
        }
    }
}

// ── Meta keys ──

const KEYS_CONFIRM: &[KeyCode] = &[KeyCode::Enter];
const KEYS_RESTART: &[KeyCode] = &[KeyCode::Char('r'), KeyCode::Char('R')];
const KEYS_CONTINUE: &[KeyCode] = &[KeyCode::Char('c'), KeyCode::Char('C')];
const KEYS_QUIT: &[KeyCode] = &[KeyCode::Char('q'), KeyCode::Char('Q')];

/// Handle menu/terminal-state input. Returns true to quit the program.
fn handle_meta(
    world: &mut WorldState,
    kb: &mut InputState,
    gp: &GamepadState,
    levels: &[LevelDef],
) -> bool {
    let confirm = kb.any_pressed(KEYS_CONFIRM) || gp.confirm_pressed();
    let esc = kb.was_pressed(KeyCode::Esc) || gp.cancel_pressed();

    // Debug overlay toggle works everywhere
    if kb.was_pressed(KeyCode::F(1)) {
        world.debug_draw = !world.debug_draw;
    }

    match world.state {
        GameState::Menu => {
            if confirm {
                start_new_game(world, levels);
                kb.clear();
            } else if kb.any_pressed(KEYS_CONTINUE) {
                if let Some(data) = save::load_save() {
                    if level::load_level(world, levels, data.level).is_ok() {
                        save::restore(world, &data);
                        world.state = GameState::Playing;
                        kb.clear();
                    } else {
                        world.set_message("Save points at a missing level", 3000.0);
                    }
                }
            } else if kb.any_pressed(KEYS_QUIT) || esc {
                return true;
            }
        }

        GameState::Playing => {
            if esc {
                let _ = save::save_game(&save::capture(world));
                world.state = GameState::Menu;
                world.has_save = save::has_save();
                kb.clear();
            }
        }

        GameState::GameOver | GameState::Win => {
            if confirm || kb.any_pressed(KEYS_RESTART) || gp.restart_pressed() {
                save::delete_save();
                world.has_save = false;
                if world.restart() {
                    if let Err(e) = level::load_level(world, levels, 0) {
                        world.set_message(&format!("Level load failed: {e}"), 4000.0);
                        world.state = GameState::Menu;
                    }
                }
                kb.clear();
            } else if esc {
                world.state = GameState::Menu;
                world.has_save = save::has_save();
                kb.clear();
            }
        }
    }

    false
}

/// Fresh run from the first level with a full-health player.
fn start_new_game(world: &mut WorldState, levels: &[LevelDef]) {
    let seed = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or(0x5eed);
    let total = world.total_levels;
    let debug = world.debug_draw;
    let has_save = world.has_save;
    let tuning = world.tuning;

    *world = WorldState::new(seed);
    world.total_levels = total;
    world.debug_draw = debug;
    world.has_save = has_save;
    world.tuning = tuning;

    match level::load_level(world, levels, 0) {
        Ok(()) => world.state = GameState::Playing,
        Err(e) => world.set_message(&format!("Level load failed: {e}"), 4000.0),
    }
}
