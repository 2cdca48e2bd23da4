/// Presentation layer: double-buffered, diff-based terminal renderer.
///
/// How it works:
///   1. Build the next frame into `front` buffer (grid of Cell)
///   2. Compare each cell with `back` buffer (previous frame)
///   3. Only emit terminal commands for cells that changed
///   4. All commands are batched with `queue!`, flushed once at the end
///   5. Swap front/back
///
/// World space is in pixels; one terminal column covers PX_PER_COL
/// world pixels and one row covers PX_PER_ROW (terminal cells are
/// roughly twice as tall as wide).

use std::io::{self, BufWriter, Write};

use crossterm::{
    cursor::{self, MoveTo},
    execute, queue,
    style::{Color, Print, ResetColor, SetBackgroundColor, SetForegroundColor},
    terminal::{self, Clear, ClearType},
};

use crate::domain::entity::{
    AnimState, PickupKind, ProjectileOwner, Rect, HEART_LIFETIME_MS, COIN_BOB_DISTANCE,
};
use crate::domain::entity::PlatformStyle;
use crate::sim::world::{GameState, WorldState};

const PX_PER_COL: f32 = 8.0;
const PX_PER_ROW: f32 = 16.0;

/// Vertical layout: HUD on top, map below, message + help at the bottom.
const HUD_ROW: usize = 0;
const MAP_ROW: usize = 2;
const BOTTOM_ROWS: usize = 3; // gap + message + help

// ── Cell: the unit of the back-buffer ──

#[derive(Clone, Copy, PartialEq, Eq)]
struct Cell {
    ch: char,
    fg: Color,
    bg: Color,
}

impl Cell {
    /// Explicit dark background for all "empty" terminal cells, so the
    /// inter-row gap pixels on VTE terminals match the cell color.
    const BASE_BG: Color = Color::Rgb { r: 16, g: 24, b: 20 };

    const BLANK: Cell = Cell {
        ch: ' ',
        fg: Color::White,
        bg: Cell::BASE_BG,
    };

    /// Sentinel cell used to invalidate the back buffer.
    const INVALID: Cell = Cell {
        ch: '?',
        fg: Color::Magenta,
        bg: Color::Magenta,
    };

    fn new(ch: char, fg: Color, bg: Color) -> Self {
        let bg = match bg {
            Color::Reset => Self::BASE_BG,
            other => other,
        };
        Cell { ch, fg, bg }
    }
}

// ── FrameBuffer: a 2D grid of Cells ──

struct FrameBuffer {
    width: usize,
    height: usize,
    cells: Vec<Cell>,
}

impl FrameBuffer {
    fn new(w: usize, h: usize) -> Self {
        FrameBuffer {
            width: w,
            height: h,
            cells: vec![Cell::BLANK; w * h],
        }
    }

    fn resize(&mut self, w: usize, h: usize) {
        if self.width != w || self.height != h {
            self.width = w;
            self.height = h;
            self.cells = vec![Cell::BLANK; w * h];
        }
    }

    fn clear(&mut self) {
        self.cells.fill(Cell::BLANK);
    }

    fn set(&mut self, x: usize, y: usize, cell: Cell) {
        if x < self.width && y < self.height {
            self.cells[y * self.width + x] = cell;
        }
    }

    fn get(&self, x: usize, y: usize) -> Cell {
        if x < self.width && y < self.height {
            self.cells[y * self.width + x]
        } else {
            Cell::BLANK
        }
    }

    fn put_str(&mut self, x: usize, y: usize, s: &str, fg: Color, bg: Color) {
        let mut cx = x;
        for ch in s.chars() {
            if cx >= self.width {
                break;
            }
            self.set(cx, y, Cell::new(ch, fg, bg));
            cx += 1;
        }
    }

    fn fill_row(&mut self, y: usize, fg: Color, bg: Color) {
        for x in 0..self.width {
            self.set(x, y, Cell::new(' ', fg, bg));
        }
    }
}

// ── Renderer ──

pub struct Renderer {
    writer: BufWriter<io::Stdout>,
    front: FrameBuffer,
    back: FrameBuffer,
    term_w: usize,
    term_h: usize,
    view_cols: usize,
    view_rows: usize,
    last_state: Option<GameState>,
}

impl Renderer {
    pub fn new() -> Self {
        Renderer {
            writer: BufWriter::with_capacity(16384, io::stdout()),
            front: FrameBuffer::new(0, 0),
            back: FrameBuffer::new(0, 0),
            term_w: 0,
            term_h: 0,
            view_cols: 0,
            view_rows: 0,
            last_state: None,
        }
    }

    pub fn init(&mut self) -> io::Result<()> {
        terminal::enable_raw_mode()?;
        execute!(
            self.writer,
            terminal::EnterAlternateScreen,
            cursor::Hide,
            SetBackgroundColor(Cell::BASE_BG),
            Clear(ClearType::All)
        )?;

        let (tw, th) = terminal::size().unwrap_or((80, 24));
        self.term_w = tw as usize;
        self.term_h = th as usize;
        self.front.resize(self.term_w, self.term_h);
        self.back.resize(self.term_w, self.term_h);
        // Force full repaint on first frame
        self.back.cells.fill(Cell::INVALID);

        Ok(())
    }

    pub fn cleanup(&mut self) -> io::Result<()> {
        execute!(
            self.writer,
            ResetColor,
            cursor::Show,
            terminal::LeaveAlternateScreen
        )?;
        terminal::disable_raw_mode()
    }

    pub fn render(&mut self, world: &mut WorldState) -> io::Result<()> {
        // Detect terminal resize
        let (tw, th) = terminal::size().unwrap_or((80, 24));
        if tw as usize != self.term_w || th as usize != self.term_h {
            self.term_w = tw as usize;
            self.term_h = th as usize;
            self.front.resize(self.term_w, self.term_h);
            self.back.resize(self.term_w, self.term_h);
            self.back.cells.fill(Cell::INVALID);
            queue!(
                self.writer,
                SetBackgroundColor(Cell::BASE_BG),
                Clear(ClearType::All)
            )?;
        }

        // Viewport dimensions in terminal cells, then world pixels
        self.view_cols = self.term_w;
        self.view_rows = if self.term_h > MAP_ROW + BOTTOM_ROWS {
            self.term_h - MAP_ROW - BOTTOM_ROWS
        } else {
            1
        };
        world.camera.set_viewport(
            self.view_cols as f32 * PX_PER_COL,
            self.view_rows as f32 * PX_PER_ROW,
        );

        // State change → clear for a clean transition
        if self.last_state != Some(world.state) {
            self.back.cells.fill(Cell::INVALID);
            queue!(
                self.writer,
                SetBackgroundColor(Cell::BASE_BG),
                Clear(ClearType::All)
            )?;
            self.last_state = Some(world.state);
        }

        self.front.clear();

        match world.state {
            GameState::Menu => self.compose_menu(world),
            GameState::Playing => self.compose_game(world),
            GameState::GameOver => {
                self.compose_game(world);
                self.compose_game_over(world);
            }
            GameState::Win => {
                self.compose_game(world);
                self.compose_win(world);
            }
        }

        self.flush_diff()?;
        std::mem::swap(&mut self.front, &mut self.back);

        Ok(())
    }

    // ── Diff flush: only write changed cells ──

    fn flush_diff(&mut self) -> io::Result<()> {
        let mut last_fg = Color::White;
        let mut last_bg = Cell::BASE_BG;
        let mut need_move = true;
        let mut last_x: usize = 0;
        let mut last_y: usize = 0;
        let mut buf = [0u8; 4];

        queue!(
            self.writer,
            SetForegroundColor(Color::White),
            SetBackgroundColor(Cell::BASE_BG),
        )?;

        for y in 0..self.front.height {
            for x in 0..self.front.width {
                let cell = self.front.get(x, y);
                if cell == self.back.get(x, y) {
                    need_move = true;
                    continue;
                }

                if need_move || x != last_x + 1 || y != last_y {
                    queue!(self.writer, MoveTo(x as u16, y as u16))?;
                    need_move = false;
                }

                if cell.fg != last_fg {
                    queue!(self.writer, SetForegroundColor(cell.fg))?;
                    last_fg = cell.fg;
                }
                if cell.bg != last_bg {
                    queue!(self.writer, SetBackgroundColor(cell.bg))?;
                    last_bg = cell.bg;
                }

                queue!(self.writer, Print(cell.ch.encode_utf8(&mut buf)))?;
                last_x = x;
                last_y = y;
            }
        }

        self.writer.flush()
    }

    // ── World-to-screen blitting ──

    /// Fill the terminal cells covered by a world-space rect.
    fn blit_rect(&mut self, w: &WorldState, rect: &Rect, ch: char, fg: Color, bg: Color) {
        if !w.camera.is_visible(rect) {
            return;
        }
        let ox = w.camera.draw_x();
        let oy = w.camera.draw_y();
        let c0 = ((rect.x - ox) / PX_PER_COL).floor() as i64;
        let c1 = ((rect.right() - ox) / PX_PER_COL).ceil() as i64;
        let r0 = ((rect.y - oy) / PX_PER_ROW).floor() as i64;
        let r1 = ((rect.bottom() - oy) / PX_PER_ROW).ceil() as i64;

        for row in r0.max(0)..r1.min(self.view_rows as i64) {
            for col in c0.max(0)..c1.min(self.view_cols as i64) {
                self.front
                    .set(col as usize, MAP_ROW + row as usize, Cell::new(ch, fg, bg));
            }
        }
    }

    // ── Compose: in-game view ──

    fn compose_game(&mut self, w: &WorldState) {
        self.compose_platforms(w);
        self.compose_debug_zones(w);
        self.compose_vine(w);
        self.compose_pickups(w);
        self.compose_turrets(w);
        self.compose_enemies(w);
        self.compose_projectiles(w);
        self.compose_player(w);
        self.compose_wipe(w);
        self.compose_hud(w);
        self.compose_message(w);
        self.compose_help(w);
    }

    fn compose_platforms(&mut self, w: &WorldState) {
        for p in &w.platforms {
            if p.visible() {
                let (ch, fg, bg) = match p.style {
                    PlatformStyle::Ground => (
                        '█',
                        Color::Rgb { r: 95, g: 70, b: 45 },
                        Color::Rgb { r: 60, g: 45, b: 30 },
                    ),
                    PlatformStyle::Ledge => (
                        '▓',
                        Color::Rgb { r: 110, g: 130, b: 80 },
                        Color::Rgb { r: 55, g: 70, b: 40 },
                    ),
                };
                // Revealed secrets keep a faint shimmer so the player can
                // tell them from ordinary ledges.
                let fg = if p.hidden {
                    Color::Rgb { r: 150, g: 200, b: 170 }
                } else {
                    fg
                };
                self.blit_rect(w, &p.rect, ch, fg, bg);
            } else if w.debug_draw {
                self.blit_rect(
                    w,
                    &p.rect,
                    '?',
                    Color::Rgb { r: 0, g: 120, b: 120 },
                    Color::Reset,
                );
            }
        }
    }

    fn compose_debug_zones(&mut self, w: &WorldState) {
        if !w.debug_draw {
            return;
        }
        for dz in &w.death_zones {
            self.blit_rect(
                w,
                &dz.rect,
                '░',
                Color::Rgb { r: 200, g: 50, b: 50 },
                Color::Reset,
            );
        }
        if let Some(end) = &w.end_zone {
            self.blit_rect(
                w,
                end,
                '▒',
                Color::Rgb { r: 80, g: 220, b: 80 },
                Color::Reset,
            );
        }
    }

    fn compose_vine(&mut self, w: &WorldState) {
        let vine = match &w.vine {
            Some(v) => v,
            None => return,
        };
        if vine.height <= 0.0 {
            return;
        }
        let rect = Rect {
            x: vine.x - 4.0,
            y: vine.top_y(),
            w: 8.0,
            h: vine.height,
        };
        self.blit_rect(
            w,
            &rect,
            '║',
            Color::Rgb { r: 60, g: 200, b: 80 },
            Color::Reset,
        );
        // Leaf crown once fully grown
        if vine.fully_grown() {
            let crown = Rect {
                x: vine.x - 12.0,
                y: vine.top_y() - 8.0,
                w: 24.0,
                h: 8.0,
            };
            self.blit_rect(
                w,
                &crown,
                '❦',
                Color::Rgb { r: 100, g: 230, b: 100 },
                Color::Reset,
            );
        }
    }

    fn compose_pickups(&mut self, w: &WorldState) {
        for p in &w.pickups {
            if p.deleted {
                continue;
            }
            match p.kind {
                PickupKind::Coin { .. } => {
                    let bob = p.bob_phase.sin() * COIN_BOB_DISTANCE;
                    let rect = Rect { y: p.rect.y + bob, ..p.rect };
                    self.blit_rect(
                        w,
                        &rect,
                        'o',
                        Color::Rgb { r: 255, g: 210, b: 60 },
                        Color::Reset,
                    );
                }
                PickupKind::Heart => {
                    // Blink during the last two seconds before expiry
                    let expiring = p.age_ms > HEART_LIFETIME_MS - 2000.0;
                    if expiring && (w.tick / 4) % 2 == 1 {
                        continue;
                    }
                    self.blit_rect(
                        w,
                        &p.rect,
                        '♥',
                        Color::Rgb { r: 240, g: 80, b: 100 },
                        Color::Reset,
                    );
                }
            }
        }
    }

    fn compose_turrets(&mut self, w: &WorldState) {
        for t in &w.turrets {
            if t.deleted {
                continue;
            }
            self.blit_rect(
                w,
                &t.rect,
                '▼',
                Color::Rgb { r: 120, g: 190, b: 220 },
                Color::Rgb { r: 40, g: 60, b: 70 },
            );
        }
    }

    fn compose_enemies(&mut self, w: &WorldState) {
        for e in &w.enemies {
            if e.deleted {
                continue;
            }
            let (ch, fg, bg) = if e.boss {
                (
                    '█',
                    Color::Rgb { r: 200, g: 70, b: 220 },
                    Color::Rgb { r: 70, g: 20, b: 80 },
                )
            } else {
                (
                    '▓',
                    Color::Rgb { r: 220, g: 90, b: 60 },
                    Color::Rgb { r: 80, g: 30, b: 20 },
                )
            };
            self.blit_rect(w, &e.rect, ch, fg, bg);
        }
    }

    fn compose_projectiles(&mut self, w: &WorldState) {
        for pr in &w.projectiles {
            if pr.deleted {
                continue;
            }
            let ch = if pr.dir_y.abs() > pr.dir_x.abs() { '|' } else { '-' };
            let fg = match pr.owner {
                ProjectileOwner::Player => Color::Rgb { r: 240, g: 240, b: 200 },
                _ => Color::Rgb { r: 255, g: 140, b: 60 },
            };
            self.blit_rect(w, &pr.rect, ch, fg, Color::Reset);
        }
    }

    fn compose_player(&mut self, w: &WorldState) {
        let p = &w.player;
        // Invulnerability blink
        if p.is_invulnerable() && (w.tick / 3) % 2 == 1 {
            return;
        }
        let (ch, fg) = match p.anim {
            AnimState::Dead => ('▒', Color::Rgb { r: 130, g: 130, b: 130 }),
            AnimState::Watering => ('█', Color::Rgb { r: 120, g: 200, b: 240 }),
            AnimState::Climb => ('█', Color::Rgb { r: 90, g: 220, b: 120 }),
            AnimState::Jump | AnimState::Fall => ('█', Color::Rgb { r: 110, g: 230, b: 150 }),
            _ => ('█', Color::Rgb { r: 90, g: 210, b: 110 }),
        };
        self.blit_rect(w, &p.rect, ch, fg, Color::Reset);
    }

    /// Circular wipe: the visible disc shrinks around the player as the
    /// level transition ends. Rows count double to correct the cell
    /// aspect ratio.
    fn compose_wipe(&mut self, w: &WorldState) {
        let progress = match &w.transition {
            Some(tr) => tr.wipe_progress(),
            None => return,
        };
        if progress >= 1.0 {
            return;
        }

        let ox = w.camera.draw_x();
        let oy = w.camera.draw_y();
        let pcol = ((w.player.rect.center_x() - ox) / PX_PER_COL) as i64;
        let prow = ((w.player.rect.center_y() - oy) / PX_PER_ROW) as i64;

        // Radius that covers the whole viewport at progress 1.0
        let max_r = (self.view_cols as f32).hypot(self.view_rows as f32 * 2.0);
        let r2 = (max_r * progress).powi(2);

        let black = Cell::new(' ', Color::White, Color::Rgb { r: 0, g: 0, b: 0 });
        for row in 0..self.view_rows as i64 {
            for col in 0..self.view_cols as i64 {
                let dx = (col - pcol) as f32;
                let dy = (row - prow) as f32 * 2.0;
                if dx * dx + dy * dy > r2 {
                    self.front
                        .set(col as usize, MAP_ROW + row as usize, black);
                }
            }
        }
    }

    fn compose_hud(&mut self, w: &WorldState) {
        let hud_bg = Color::Rgb { r: 20, g: 45, b: 30 };
        self.front.fill_row(HUD_ROW, Color::White, hud_bg);

        let hearts: String = (0..w.player.max_health)
            .map(|i| if i < w.player.health { '♥' } else { '·' })
            .collect();
        let boss_tag = if w.boss_alive() { "  !! BOSS !!" } else { "" };
        let hud = format!(
            " {}  Score:{:<7} {}  Coins {}/{}{}",
            w.level_name, w.score, hearts, w.coins_collected, w.total_coins, boss_tag,
        );
        self.front.put_str(0, HUD_ROW, &hud, Color::White, hud_bg);
    }

    fn compose_message(&mut self, w: &WorldState) {
        let msg_row = MAP_ROW + self.view_rows;
        if msg_row >= self.front.height || w.message.is_empty() {
            return;
        }
        let bg = Color::Rgb { r: 190, g: 170, b: 60 };
        self.front.fill_row(msg_row, Color::Black, bg);
        let msg = format!(" ◈ {} ", w.message);
        self.front.put_str(0, msg_row, &msg, Color::Black, bg);
    }

    fn compose_help(&mut self, w: &WorldState) {
        let help_row = MAP_ROW + self.view_rows + 1;
        if help_row >= self.front.height {
            return;
        }
        let help = if w.debug_draw {
            " A/D:Move  W/Space:Jump  J/X:Shoot  ESC:Save+Menu  F1:Debug(on)"
        } else {
            " A/D:Move  W/Space:Jump  J/X:Shoot  ESC:Save+Menu"
        };
        self.front
            .put_str(0, help_row, help, Color::DarkGrey, Color::Reset);
    }

    // ── Static screens ──

    fn compose_menu(&mut self, w: &WorldState) {
        let title = [
            r" _____  _   _  _  ____  _  __ _____  _____ ",
            r"|_   _|| |_| || |/ ___|| |/ /| ____||_   _|",
            r"  | |  |  _  || || |   |   < |  _|    | |  ",
            r"  | |  | | | || || |___| |\ \| |___   | |  ",
            r"  |_|  |_| |_||_|\____||_| \_\_____|  |_|  ",
        ];
        let gold = Color::Rgb { r: 255, g: 210, b: 80 };
        for (i, line) in title.iter().enumerate() {
            self.front.put_str(4, 2 + i, line, gold, Color::Reset);
        }

        let green = Color::Rgb { r: 90, g: 220, b: 110 };
        let subtitle = "── a garden worth fighting for ──";
        self.front.put_str(9, 8, subtitle, green, Color::Reset);

        let menu_base = 11;
        let dim = Color::DarkGrey;
        self.front
            .put_str(8, menu_base, "ENTER   New Game", green, Color::Reset);
        if w.has_save {
            self.front.put_str(
                8,
                menu_base + 1,
                "  C     Continue",
                gold,
                Color::Reset,
            );
        } else {
            self.front.put_str(
                8,
                menu_base + 1,
                "  C     Continue  (no save)",
                dim,
                Color::Reset,
            );
        }
        self.front
            .put_str(8, menu_base + 2, "  Q     Quit", Color::White, Color::Reset);

        let help = [
            "Controls",
            "  A/D or arrows   Move        W / Space  Jump",
            "  J / X           Shoot       ESC        Save + menu",
            "  F1              Debug overlay",
        ];
        for (i, line) in help.iter().enumerate() {
            let fg = if i == 0 { gold } else { Color::White };
            self.front.put_str(8, menu_base + 4 + i, line, fg, Color::Reset);
        }

        let levels = format!("  {} levels loaded", w.total_levels);
        self.front
            .put_str(8, menu_base + 9, &levels, dim, Color::Reset);
    }

    fn compose_game_over(&mut self, w: &WorldState) {
        let red = Color::Rgb { r: 255, g: 70, b: 70 };
        let bg = Color::Rgb { r: 40, g: 10, b: 10 };
        let cy = MAP_ROW + self.view_rows / 2;
        let box_art = [
            "╔══════════════════════════════╗",
            "║       ✕  WILTED  ✕           ║",
            "╚══════════════════════════════╝",
        ];
        let cx = self.front.width.saturating_sub(box_art[0].chars().count()) / 2;
        for (i, l) in box_art.iter().enumerate() {
            self.front.put_str(cx, cy.saturating_sub(3) + i, l, red, bg);
        }
        let score = format!("Final Score: {}", w.score);
        let level = format!("Reached: {}", w.level_name);
        self.front.put_str(cx + 2, cy + 1, &score, Color::White, Color::Reset);
        self.front.put_str(cx + 2, cy + 2, &level, Color::White, Color::Reset);
        self.front.put_str(
            cx + 2,
            cy + 4,
            "R: Retry    ESC: Menu",
            Color::Rgb { r: 90, g: 220, b: 110 },
            Color::Reset,
        );
    }

    fn compose_win(&mut self, w: &WorldState) {
        let gold = Color::Rgb { r: 255, g: 210, b: 80 };
        let bg = Color::Rgb { r: 15, g: 45, b: 20 };
        let cy = MAP_ROW + self.view_rows / 2;
        let box_art = [
            "╔════════════════════════════════════╗",
            "║   ★  THE GARDEN BLOOMS AGAIN  ★    ║",
            "╚════════════════════════════════════╝",
        ];
        let cx = self.front.width.saturating_sub(box_art[0].chars().count()) / 2;
        for (i, l) in box_art.iter().enumerate() {
            self.front.put_str(cx, cy.saturating_sub(3) + i, l, gold, bg);
        }
        let score = format!("Final Score: {}", w.score);
        let cleared = format!("All {} levels cleared", w.total_levels);
        self.front.put_str(cx + 2, cy + 1, &score, Color::White, Color::Reset);
        self.front.put_str(
            cx + 2,
            cy + 2,
            &cleared,
            Color::Rgb { r: 90, g: 220, b: 110 },
            Color::Reset,
        );
        self.front.put_str(
            cx + 2,
            cy + 4,
            "R: Play Again    ESC: Menu",
            Color::Rgb { r: 90, g: 220, b: 110 },
            Color::Reset,
        );
    }
}
