//! WorldState: the complete snapshot of a running game.
//!
//! ## Turn phases
//!
//!   Idle ──submit_move──▶ Resolving ──no change──▶ Idle
//!                              │
//!                              └──changed──▶ Settling { remaining_ms }
//!                                                 │ advance() runs the clock down
//!                                                 ▼
//!                                   unlock → spawn → terminal check
//!                                                 │
//!                                       Idle ◀────┴────▶ GameOver
//!
//! Only `Idle` accepts a direction. `GameOver` accepts nothing until a new
//! game is started.

use crate::config::GameConfig;
use crate::domain::rules::MergeRules;
use crate::domain::spawn::{RandomSource, SpawnPolicy};
use crate::domain::tile::TileView;
use super::board::{Board, BoardError};

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Phase {
    Idle,
    Resolving,
    Settling { remaining_ms: u64 },
    GameOver,
}

pub struct WorldState {
    pub board: Board,
    pub phase: Phase,

    // ── Session ──
    pub score: u64,
    /// Highest score this session. Not persisted.
    pub best_score: u64,
    pub moves: u32,

    // ── Tuning ──
    pub spawn: SpawnPolicy,
    pub rules: MergeRules,
    pub settle_delay_ms: u64,
    pub initial_tiles: usize,

    // ── UI ──
    pub message: String,
    pub message_timer: u32,

    rng: Box<dyn RandomSource>,
}

// ── Construction ──

impl WorldState {
    /// Empty board sized from `config`. Call `turn::new_game` to deal tiles.
    pub fn new(config: &GameConfig, rng: Box<dyn RandomSource>) -> Self {
        WorldState {
            board: Board::new(config.board_width, config.board_height),
            phase: Phase::Idle,
            score: 0,
            best_score: 0,
            moves: 0,
            spawn: config.spawn,
            rules: config.rules,
            settle_delay_ms: config.turn.settle_delay_ms,
            initial_tiles: config.initial_tiles,
            message: String::new(),
            message_timer: 0,
            rng,
        }
    }

    pub fn set_message(&mut self, msg: &str, duration: u32) {
        self.message = msg.to_string();
        self.message_timer = duration;
    }

    /// Count the message timer down by one frame.
    pub fn tick_message(&mut self) {
        if self.message_timer > 0 {
            self.message_timer -= 1;
            if self.message_timer == 0 { self.message.clear(); }
        }
    }
}

// ── Session bookkeeping ──

impl WorldState {
    pub fn add_score(&mut self, points: u64) {
        self.score = self.score.saturating_add(points);
        self.best_score = self.best_score.max(self.score);
    }

    /// Spawn one tile using the world's policy and randomness.
    pub fn spawn_tile(&mut self) -> Result<TileView, BoardError> {
        self.board.spawn_random(&self.spawn, self.rng.as_mut())
    }

    pub fn is_settling(&self) -> bool {
        matches!(self.phase, Phase::Settling { .. })
    }
}
