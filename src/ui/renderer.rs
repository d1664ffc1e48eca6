//! Presentation layer: double-buffered, diff-based terminal renderer.
//!
//! How it works:
//!   1. Build the next frame into `front` buffer (array of ScreenCell)
//!   2. Compare each cell with `back` buffer (previous frame)
//!   3. Only emit terminal commands for cells that changed
//!   4. All commands are batched with `queue!`, flushed once at the end
//!   5. Swap front/back
//!
//! Screen layout (rows):
//!   0        HUD: score, best, moves, tiles
//!   2 ..     board, TILE_H rows per grid row plus a gutter row
//!   board+1  message bar
//!   board+2  help bar

use std::io::{self, BufWriter, Write};

use crossterm::{
    cursor::{self, MoveTo},
    execute, queue,
    style::{Color, Print, ResetColor, SetBackgroundColor, SetForegroundColor},
    terminal::{self, Clear, ClearType},
};

use crate::domain::grid::Cell;
use crate::domain::tile::{Modifier, TileView};
use crate::sim::world::{Phase, WorldState};

// ── ScreenCell: the unit of the back-buffer ──

#[derive(Clone, Copy, PartialEq, Eq)]
struct ScreenCell {
    ch: char,
    fg: Color,
    bg: Color,
}

impl ScreenCell {
    /// Explicit dark background for every "empty" terminal cell, so the
    /// gaps between rows match the cell colour on VTE terminals.
    const BASE_BG: Color = Color::Rgb { r: 22, g: 22, b: 35 };

    const BLANK: ScreenCell = ScreenCell { ch: ' ', fg: Color::White, bg: ScreenCell::BASE_BG };

    /// Sentinel used to invalidate the back buffer.
    const INVALID: ScreenCell = ScreenCell { ch: '?', fg: Color::Magenta, bg: Color::Magenta };

    fn new(ch: char, fg: Color, bg: Color) -> Self {
        let bg = match bg {
            Color::Reset => Self::BASE_BG,
            other => other,
        };
        ScreenCell { ch, fg, bg }
    }
}

// ── FrameBuffer: a 2D grid of ScreenCells ──

struct FrameBuffer {
    width: usize,
    height: usize,
    cells: Vec<ScreenCell>,
}

impl FrameBuffer {
    fn new(w: usize, h: usize) -> Self {
        FrameBuffer { width: w, height: h, cells: vec![ScreenCell::BLANK; w * h] }
    }

    fn resize(&mut self, w: usize, h: usize) {
        if self.width != w || self.height != h {
            self.width = w;
            self.height = h;
            self.cells = vec![ScreenCell::BLANK; w * h];
        }
    }

    fn clear(&mut self) {
        self.cells.fill(ScreenCell::BLANK);
    }

    fn set(&mut self, x: usize, y: usize, cell: ScreenCell) {
        if x < self.width && y < self.height {
            self.cells[y * self.width + x] = cell;
        }
    }

    fn get(&self, x: usize, y: usize) -> ScreenCell {
        if x < self.width && y < self.height {
            self.cells[y * self.width + x]
        } else {
            ScreenCell::BLANK
        }
    }

    fn put_str(&mut self, x: usize, y: usize, s: &str, fg: Color, bg: Color) {
        for (i, ch) in s.chars().enumerate() {
            if x + i >= self.width { break; }
            self.set(x + i, y, ScreenCell::new(ch, fg, bg));
        }
    }

    fn fill_rect(&mut self, x: usize, y: usize, w: usize, h: usize, bg: Color) {
        for yy in y..y + h {
            for xx in x..x + w {
                self.set(xx, yy, ScreenCell::new(' ', Color::White, bg));
            }
        }
    }

    #[cfg(test)]
    fn row_text(&self, y: usize) -> String {
        (0..self.width).map(|x| self.get(x, y).ch).collect()
    }
}

// ── Layout ──

/// Terminal columns / rows per board cell.
const TILE_W: usize = 8;
const TILE_H: usize = 3;
/// Gap between adjacent board cells.
const GUTTER: usize = 1;

const HUD_ROW: usize = 0;
const BOARD_ROW: usize = 2;

const BOARD_BG: Color = Color::Rgb { r: 60, g: 58, b: 70 };
const EMPTY_BG: Color = Color::Rgb { r: 44, g: 42, b: 54 };
const DOUBLER_BG: Color = Color::Rgb { r: 40, g: 150, b: 90 };
const HALVER_BG: Color = Color::Rgb { r: 120, g: 70, b: 160 };

/// Background per tier (tier 0 = value 2).
const TIER_BG: [Color; 11] = [
    Color::Rgb { r: 238, g: 228, b: 218 },
    Color::Rgb { r: 237, g: 224, b: 200 },
    Color::Rgb { r: 242, g: 177, b: 121 },
    Color::Rgb { r: 245, g: 149, b: 99 },
    Color::Rgb { r: 246, g: 124, b: 95 },
    Color::Rgb { r: 246, g: 94, b: 59 },
    Color::Rgb { r: 237, g: 207, b: 114 },
    Color::Rgb { r: 237, g: 204, b: 97 },
    Color::Rgb { r: 237, g: 200, b: 80 },
    Color::Rgb { r: 237, g: 197, b: 63 },
    Color::Rgb { r: 237, g: 194, b: 46 },
];

fn tile_colors(t: &TileView) -> (Color, Color) {
    match t.modifier {
        Modifier::Doubler => (Color::White, DOUBLER_BG),
        Modifier::Halver => (Color::White, HALVER_BG),
        Modifier::None => {
            let bg = TIER_BG[(t.tier as usize).min(TIER_BG.len() - 1)];
            let fg = if t.tier < 2 {
                Color::Rgb { r: 119, g: 110, b: 101 }
            } else {
                Color::Rgb { r: 249, g: 246, b: 242 }
            };
            (fg, bg)
        }
    }
}

/// Value text that fits inside a tile.
fn label(value: u32) -> String {
    match value {
        v if v >= 10_000_000 => format!("{}M", v / 1_000_000),
        v if v >= 1_000_000 => format!("{}k", v / 1_000),
        v => v.to_string(),
    }
}

// ── Renderer ──

pub struct Renderer {
    writer: BufWriter<io::Stdout>,
    front: FrameBuffer,
    back: FrameBuffer,
    term_w: usize,
    term_h: usize,
}

impl Renderer {
    pub fn new() -> Self {
        Renderer {
            writer: BufWriter::with_capacity(16384, io::stdout()),
            front: FrameBuffer::new(0, 0),
            back: FrameBuffer::new(0, 0),
            term_w: 0,
            term_h: 0,
        }
    }

    pub fn init(&mut self) -> io::Result<()> {
        terminal::enable_raw_mode()?;
        execute!(
            self.writer,
            terminal::EnterAlternateScreen,
            cursor::Hide,
            SetBackgroundColor(ScreenCell::BASE_BG),
            Clear(ClearType::All)
        )?;

        let (tw, th) = terminal::size().unwrap_or((80, 24));
        self.resize(tw as usize, th as usize);
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

    fn resize(&mut self, w: usize, h: usize) {
        self.term_w = w;
        self.term_h = h;
        self.front.resize(w, h);
        self.back.resize(w, h);
        // Force full repaint: back differs from front everywhere.
        self.back.cells.fill(ScreenCell::INVALID);
    }

    pub fn render(&mut self, world: &WorldState) -> io::Result<()> {
        let (tw, th) = terminal::size().unwrap_or((80, 24));
        if tw as usize != self.term_w || th as usize != self.term_h {
            self.resize(tw as usize, th as usize);
            queue!(self.writer, SetBackgroundColor(ScreenCell::BASE_BG), Clear(ClearType::All))?;
        }

        self.front.clear();
        self.compose(world);
        self.flush_diff()?;
        std::mem::swap(&mut self.front, &mut self.back);
        Ok(())
    }

    // ── Diff flush: only write changed cells ──

    fn flush_diff(&mut self) -> io::Result<()> {
        let mut last_fg = Color::White;
        let mut last_bg = ScreenCell::BASE_BG;
        // Cursor position after the last print, if known.
        let mut cursor_at: Option<(usize, usize)> = None;

        queue!(self.writer,
            SetForegroundColor(last_fg),
            SetBackgroundColor(last_bg),
        )?;

        for y in 0..self.front.height {
            for x in 0..self.front.width {
                let cell = self.front.get(x, y);
                if cell == self.back.get(x, y) { continue; }

                if cursor_at != Some((x, y)) {
                    queue!(self.writer, MoveTo(x as u16, y as u16))?;
                }
                if cell.fg != last_fg {
                    queue!(self.writer, SetForegroundColor(cell.fg))?;
                    last_fg = cell.fg;
                }
                if cell.bg != last_bg {
                    queue!(self.writer, SetBackgroundColor(cell.bg))?;
                    last_bg = cell.bg;
                }
                queue!(self.writer, Print(cell.ch))?;
                cursor_at = Some((x + 1, y));
            }
        }

        self.writer.flush()
    }

    // ── Compose: build front buffer content ──

    fn compose(&mut self, w: &WorldState) {
        let board_cols = w.board.width() * (TILE_W + GUTTER) + GUTTER;
        let board_rows = w.board.height() * (TILE_H + GUTTER) + GUTTER;
        let ox = self.front.width.saturating_sub(board_cols) / 2;
        let oy = BOARD_ROW;

        self.compose_hud(w, ox);
        self.compose_board(w, ox, oy, board_cols, board_rows);

        let msg_row = oy + board_rows + 1;
        if !w.message.is_empty() {
            let accent = Color::Rgb { r: 255, g: 220, b: 50 };
            self.front.put_str(ox, msg_row, &w.message, accent, Color::Reset);
        }
        let help = "←↑↓→/WASD: Slide   R/Enter: New game   Esc/Q: Quit";
        self.front.put_str(ox, msg_row + 1, help, Color::DarkGrey, Color::Reset);

        if w.phase == Phase::GameOver {
            self.compose_game_over(w, ox, oy, board_cols, board_rows);
        }
    }

    fn compose_hud(&mut self, w: &WorldState, ox: usize) {
        let hud = format!(
            "Score {:>7}   Best {:>7}   Top {:>5}   Moves {:>4}   Tiles {}/{}",
            w.score,
            w.best_score,
            w.board.max_value(),
            w.moves,
            w.board.len(),
            w.board.capacity(),
        );
        let x = ox.min(self.front.width.saturating_sub(hud.chars().count()));
        self.front.put_str(x, HUD_ROW, &hud, Color::White, Color::Reset);
    }

    fn compose_board(&mut self, w: &WorldState, ox: usize, oy: usize, cols: usize, rows: usize) {
        self.front.fill_rect(ox, oy, cols, rows, BOARD_BG);

        for cell in w.board.grid().cells() {
            let (x, y) = tile_origin(ox, oy, cell);
            self.front.fill_rect(x, y, TILE_W, TILE_H, EMPTY_BG);
        }

        let settling = w.is_settling();
        for t in w.board.snapshot() {
            let (x, y) = tile_origin(ox, oy, t.cell);
            let (fg, bg) = tile_colors(&t);
            self.front.fill_rect(x, y, TILE_W, TILE_H, bg);

            let text = label(t.value);
            let tx = x + TILE_W.saturating_sub(text.chars().count()) / 2;
            self.front.put_str(tx, y + TILE_H / 2, &text, fg, bg);

            let badge = t.modifier.badge();
            if !badge.is_empty() {
                self.front.put_str(x + 1, y, badge, fg, bg);
            }
            // Merged this turn: mark until the turn settles.
            if settling && t.locked {
                self.front.put_str(x + TILE_W - 2, y, "*", fg, bg);
            }
        }
    }

    fn compose_game_over(&mut self, w: &WorldState, ox: usize, oy: usize, cols: usize, rows: usize) {
        let panel = Color::Rgb { r: 30, g: 20, b: 30 };
        let red = Color::Rgb { r: 255, g: 80, b: 80 };
        let box_w = 28_usize.min(cols);
        let box_h = 5;
        let bx = ox + cols.saturating_sub(box_w) / 2;
        let by = oy + rows.saturating_sub(box_h) / 2;
        self.front.fill_rect(bx, by, box_w, box_h, panel);

        let lines = [
            ("GAME OVER".to_string(), red),
            (format!("Final score {}", w.score), Color::White),
            ("Enter: new game".to_string(), Color::Rgb { r: 80, g: 255, b: 80 }),
        ];
        for (i, (text, fg)) in lines.iter().enumerate() {
            let tx = bx + box_w.saturating_sub(text.chars().count()) / 2;
            self.front.put_str(tx, by + 1 + i, text, *fg, panel);
        }
    }
}

fn tile_origin(ox: usize, oy: usize, cell: Cell) -> (usize, usize) {
    (
        ox + GUTTER + cell.x * (TILE_W + GUTTER),
        oy + GUTTER + cell.y * (TILE_H + GUTTER),
    )
}
