//! Turn lifecycle: accept a move, resolve it, settle, spawn, check for the end.
//!
//! Processing order for one turn:
//!   1. `submit_move`  (Idle only) runs the resolver once
//!   2. no change      → back to Idle; nothing else happens
//!   3. change         → Settling for `settle_delay_ms`
//!   4. `advance`      counts the delay down; on expiry, exactly once:
//!        a. unlock every tile
//!        b. spawn one tile if the board has room
//!        c. terminal check → Idle or GameOver

use crate::domain::grid::Direction;
use crate::domain::rules;
use super::board::Board;
use super::event::GameEvent;
use super::resolve::resolve_move;
use super::world::{Phase, WorldState};

/// Frames a status message stays up.
const MESSAGE_FRAMES: u32 = 120;

// ══════════════════════════════════════════════════════════════
// Entry points
// ══════════════════════════════════════════════════════════════

/// Clear the board, reset the session score, and deal the opening tiles.
/// The best score survives.
pub fn new_game(world: &mut WorldState) -> Vec<GameEvent> {
    let mut events = Vec::new();
    world.board.clear();
    world.score = 0;
    world.moves = 0;
    world.phase = Phase::Idle;
    world.message.clear();
    world.message_timer = 0;

    let deal = world.initial_tiles.min(world.board.capacity());
    for _ in 0..deal {
        match world.spawn_tile() {
            Ok(t) => events.push(GameEvent::TileSpawned { id: t.id, at: t.cell, modifier: t.modifier }),
            Err(e) => unreachable!("opening deal exceeded board capacity: {e}"),
        }
    }
    if is_terminal(&world.board) {
        enter_game_over(world, &mut events);
    }
    events
}

/// Apply a direction. Ignored unless the world is Idle.
pub fn submit_move(world: &mut WorldState, dir: Direction) -> Vec<GameEvent> {
    if world.phase != Phase::Idle { return vec![]; }

    world.phase = Phase::Resolving;
    let outcome = resolve_move(&mut world.board, dir, &world.rules);
    if !outcome.changed {
        world.phase = Phase::Idle;
        return outcome.events;
    }

    world.moves += 1;
    world.add_score(outcome.score_gained);
    if outcome.events.iter().any(|e| matches!(e, GameEvent::MilestoneReached { .. })) {
        let msg = format!("{}! Neighbours cleared", world.rules.milestone);
        world.set_message(&msg, MESSAGE_FRAMES);
    }
    world.phase = Phase::Settling { remaining_ms: world.settle_delay_ms };
    outcome.events
}

/// Run the settle clock forward by `elapsed_ms`.
/// Does nothing outside Settling.
pub fn advance(world: &mut WorldState, elapsed_ms: u64) -> Vec<GameEvent> {
    let remaining = match world.phase {
        Phase::Settling { remaining_ms } => remaining_ms,
        _ => return vec![],
    };
    if elapsed_ms < remaining {
        world.phase = Phase::Settling { remaining_ms: remaining - elapsed_ms };
        return vec![];
    }
    settle(world)
}

// ══════════════════════════════════════════════════════════════
// Settle
// ══════════════════════════════════════════════════════════════

fn settle(world: &mut WorldState) -> Vec<GameEvent> {
    let mut events = Vec::new();
    world.board.unlock_all();

    if !world.board.is_full() {
        match world.spawn_tile() {
            Ok(t) => events.push(GameEvent::TileSpawned { id: t.id, at: t.cell, modifier: t.modifier }),
            Err(e) => unreachable!("spawn on a board with free cells failed: {e}"),
        }
    }

    if is_terminal(&world.board) {
        enter_game_over(world, &mut events);
    } else {
        world.phase = Phase::Idle;
    }
    events
}

fn enter_game_over(world: &mut WorldState, events: &mut Vec<GameEvent>) {
    world.phase = Phase::GameOver;
    world.set_message("No moves left", MESSAGE_FRAMES);
    events.push(GameEvent::GameOver { score: world.score });
}

// ══════════════════════════════════════════════════════════════
// Terminal check
// ══════════════════════════════════════════════════════════════

/// True only for a full board where no tile can merge with any
/// orthogonal neighbour. A board with a free cell is never terminal.
pub fn is_terminal(board: &Board) -> bool {
    if !board.is_full() { return false; }

    for tile in board.tiles() {
        // Right and Down cover every adjacent pair once.
        for dir in [Direction::Right, Direction::Down] {
            let neighbour = board
                .grid()
                .adjacent(tile.cell, dir)
                .and_then(|c| board.tile_at(c));
            if let Some(n) = neighbour {
                if rules::can_merge(tile, n) {
                    return false;
                }
            }
        }
    }
    true
}

// ══════════════════════════════════════════════════════════════
// Unit tests
// ══════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GameConfig;
    use crate::domain::grid::Cell;
    use crate::domain::spawn::ScriptedRandom;
    use crate::domain::tile::Modifier;

    fn world_from(rows: &[&str], units: &[f64], picks: &[usize]) -> WorldState {
        let cfg = GameConfig::default();
        let mut w = WorldState::new(&cfg, Box::new(ScriptedRandom::new(units, picks)));
        w.board = Board::from_diagram(rows);
        w
    }

    fn count<F: Fn(&GameEvent) -> bool>(events: &[GameEvent], f: F) -> usize {
        events.iter().filter(|e| f(e)).count()
    }

    // ── Terminal check ──

    #[test]
    fn board_with_free_cell_is_never_terminal() {
        let b = Board::from_diagram(&["2 4", "8 ."]);
        assert!(!is_terminal(&b));
    }

    #[test]
    fn full_board_without_pairs_is_terminal() {
        let b = Board::from_diagram(&["2 4 2", "4 2 4", "2 4 2"]);
        assert!(is_terminal(&b));
    }

    #[test]
    fn vertical_pair_keeps_game_alive() {
        let b = Board::from_diagram(&["2 4", "2 8"]);
        assert!(!is_terminal(&b));
    }

    #[test]
    fn modifier_on_full_board_keeps_game_alive() {
        let b = Board::from_diagram(&["2 4", "8 2h"]);
        assert!(!is_terminal(&b));
    }

    // ── submit_move ──

    #[test]
    fn no_op_move_stays_idle_and_costs_nothing() {
        let mut w = world_from(&["2 4", "4 2"], &[], &[]);
        let before = w.board.clone();
        let events = submit_move(&mut w, Direction::Left);
        assert!(events.is_empty());
        assert_eq!(w.phase, Phase::Idle);
        assert_eq!(w.moves, 0);
        assert_eq!(w.board, before);
    }

    #[test]
    fn empty_board_move_stays_idle() {
        for dir in Direction::ALL {
            let mut w = world_from(&[". .", ". ."], &[], &[]);
            assert!(submit_move(&mut w, dir).is_empty());
            assert_eq!(w.phase, Phase::Idle);
        }
    }

    #[test]
    fn changed_move_enters_settling() {
        let mut w = world_from(&["2 . . .", ". . . .", ". . . .", ". . . ."], &[], &[]);
        let events = submit_move(&mut w, Direction::Right);
        assert_eq!(events.len(), 1);
        assert_eq!(w.board.diagram()[0], ". . . 2");
        assert_eq!(w.phase, Phase::Settling { remaining_ms: 100 });
        assert_eq!(w.moves, 1);
    }

    #[test]
    fn input_ignored_while_settling() {
        let mut w = world_from(&["2 . 4 ."], &[], &[]);
        submit_move(&mut w, Direction::Right);
        let snapshot = w.board.clone();
        assert!(submit_move(&mut w, Direction::Left).is_empty());
        assert_eq!(w.board, snapshot);
    }

    #[test]
    fn merge_adds_score_and_tracks_best() {
        let mut w = world_from(&["2 2 . ."], &[], &[]);
        w.best_score = 3;
        submit_move(&mut w, Direction::Right);
        assert_eq!(w.score, 4);
        assert_eq!(w.best_score, 4);
    }

    // ── advance / settle ──

    #[test]
    fn settle_runs_only_after_full_delay() {
        // spawn roll 0.5 → plain; pick 0 → first empty cell
        let mut w = world_from(&["2 2 . ."], &[0.5], &[0]);
        submit_move(&mut w, Direction::Right);
        assert_eq!(w.board.diagram(), vec![". . . 4!"]);

        assert!(advance(&mut w, 60).is_empty());
        assert_eq!(w.phase, Phase::Settling { remaining_ms: 40 });
        assert_eq!(w.board.len(), 1);

        let events = advance(&mut w, 60);
        assert_eq!(w.phase, Phase::Idle);
        assert_eq!(w.board.diagram(), vec!["2 . . 4"]);
        assert_eq!(count(&events, |e| matches!(e, GameEvent::TileSpawned { .. })), 1);

        // Nothing left to settle.
        assert!(advance(&mut w, 1000).is_empty());
        assert_eq!(w.board.len(), 2);
    }

    #[test]
    fn zero_delay_settles_on_next_advance() {
        let mut w = world_from(&["2 . ."], &[0.01], &[0]);
        w.settle_delay_ms = 0;
        submit_move(&mut w, Direction::Right);
        assert_eq!(w.phase, Phase::Settling { remaining_ms: 0 });
        let events = advance(&mut w, 0);
        assert_eq!(w.phase, Phase::Idle);
        assert!(matches!(
            events[0],
            GameEvent::TileSpawned { at, modifier: Modifier::Doubler, .. } if at == Cell::new(0, 0)
        ));
    }

    #[test]
    fn settle_fills_last_free_cell_without_ending_game() {
        let mut w = world_from(&["2 4 8", "16 32 .", "8 4 2"], &[], &[]);
        submit_move(&mut w, Direction::Right);
        assert_eq!(w.board.diagram(), vec!["2 4 8", ". 16 32", "8 4 2"]);

        let events = advance(&mut w, 100);
        assert_eq!(count(&events, |e| matches!(e, GameEvent::TileSpawned { .. })), 1);
        assert_eq!(w.board.diagram(), vec!["2 4 8", "2 16 32", "8 4 2"]);
        assert!(w.board.is_full());
        // The two 2s stacked in the first column can still merge.
        assert_eq!(w.phase, Phase::Idle);
    }

    #[test]
    fn game_over_emitted_exactly_once() {
        let mut w = world_from(&["4 .", "8 16"], &[0.5], &[0]);
        submit_move(&mut w, Direction::Right);
        assert_eq!(w.board.diagram(), vec![". 4", "8 16"]);

        let events = advance(&mut w, 100);
        assert_eq!(w.board.diagram(), vec!["2 4", "8 16"]);
        assert_eq!(w.phase, Phase::GameOver);
        assert_eq!(count(&events, |e| matches!(e, GameEvent::GameOver { .. })), 1);

        assert!(advance(&mut w, 100).is_empty());
        for dir in Direction::ALL {
            assert!(submit_move(&mut w, dir).is_empty());
        }
        assert_eq!(w.phase, Phase::GameOver);
    }

    #[test]
    fn locks_cleared_on_settle() {
        let mut w = world_from(&["2 2 2 2"], &[0.5], &[0]);
        submit_move(&mut w, Direction::Right);
        assert_eq!(w.board.diagram(), vec![". . 4! 4!"]);
        advance(&mut w, 100);
        assert!(w.board.tiles().all(|t| !t.locked));
        assert_eq!(w.board.diagram(), vec!["2 . 4 4"]);
    }

    // ── new_game ──

    #[test]
    fn new_game_deals_opening_tiles_and_keeps_best() {
        let mut w = world_from(&["2 4", "8 16"], &[0.5, 0.5], &[0, 0]);
        w.score = 50;
        w.best_score = 80;
        w.phase = Phase::GameOver;
        let events = new_game(&mut w);
        assert_eq!(count(&events, |e| matches!(e, GameEvent::TileSpawned { .. })), 2);
        assert_eq!(w.board.len(), 2);
        assert_eq!(w.board.diagram(), vec!["2 2", ". ."]);
        assert_eq!((w.score, w.best_score, w.moves), (0, 80, 0));
        assert_eq!(w.phase, Phase::Idle);
    }

    #[test]
    fn new_game_on_one_cell_board_is_immediately_over() {
        let mut cfg = GameConfig::default();
        cfg.board_width = 1;
        cfg.board_height = 1;
        cfg.initial_tiles = 2;
        let mut w = WorldState::new(&cfg, Box::new(ScriptedRandom::new(&[0.5], &[0])));
        let events = new_game(&mut w);
        assert_eq!(w.board.len(), 1);
        assert_eq!(w.phase, Phase::GameOver);
        assert_eq!(count(&events, |e| matches!(e, GameEvent::GameOver { .. })), 1);
    }
}
