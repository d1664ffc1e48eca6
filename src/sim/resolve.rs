//! Move resolution: one directional pass over the board.
//!
//! ## Scan order
//!
//! Cells are visited starting next to the wall the tiles move toward and
//! working backward, so a tile closer to its destination settles before
//! the tiles behind it. The outer loop runs over x, the inner over y:
//!
//!   Right  x = w-2 ..= 0   y = 0 .. h
//!   Left   x = 1 .. w      y = 0 .. h
//!   Down   x = 0 .. w      y = h-2 ..= 0
//!   Up     x = 0 .. w      y = 1 .. h
//!
//! The line against the target wall is never visited: those tiles cannot
//! move, they can only be merged into.
//!
//! ## Slide-then-merge probe
//!
//! For each visited cell holding a tile, walk the adjacent-cell chain in
//! the move direction, remembering the last empty cell:
//!   - first occupied cell, eligible pair  → merge, no slide
//!   - first occupied cell, not eligible   → slide to the remembered cell
//!   - chain ends                          → slide to the remembered cell
//!
//! Cells are read from live occupancy, so later cells in the same pass
//! see the results of earlier merges, slides, and cascades.

use crate::domain::grid::{Cell, Direction};
use crate::domain::rules::{self, MergeKind, MergePlan, MergeRules};
use crate::domain::tile::TileId;
use super::board::Board;
use super::event::GameEvent;

/// Result of one directional pass.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MoveOutcome {
    /// At least one tile slid, merged, or was destroyed.
    pub changed: bool,
    pub events: Vec<GameEvent>,
    pub score_gained: u64,
}

// ══════════════════════════════════════════════════════════════
// Scan order
// ══════════════════════════════════════════════════════════════

pub fn scan_order(dir: Direction, width: usize, height: usize) -> Vec<Cell> {
    let xs: Vec<usize> = match dir {
        Direction::Right => (0..width.saturating_sub(1)).rev().collect(),
        Direction::Left  => (1..width).collect(),
        Direction::Up | Direction::Down => (0..width).collect(),
    };
    let ys: Vec<usize> = match dir {
        Direction::Down  => (0..height.saturating_sub(1)).rev().collect(),
        Direction::Up    => (1..height).collect(),
        Direction::Left | Direction::Right => (0..height).collect(),
    };
    let mut cells = Vec::with_capacity(xs.len() * ys.len());
    for &x in &xs {
        for &y in &ys {
            cells.push(Cell::new(x, y));
        }
    }
    cells
}

// ══════════════════════════════════════════════════════════════
// Main entry point
// ══════════════════════════════════════════════════════════════

pub fn resolve_move(board: &mut Board, dir: Direction, rules: &MergeRules) -> MoveOutcome {
    let mut outcome = MoveOutcome::default();

    for cell in scan_order(dir, board.width(), board.height()) {
        let id = match board.grid().occupant(cell) {
            Some(id) => id,
            None => continue,
        };
        if probe(board, id, dir, rules, &mut outcome) {
            outcome.changed = true;
        }
    }

    debug_assert!(
        board.check_invariants().is_ok(),
        "board invariants broken after {:?} pass: {:?}",
        dir,
        board.check_invariants()
    );
    outcome
}

/// Resolve one tile. Returns true when it slid or merged.
fn probe(
    board: &mut Board,
    id: TileId,
    dir: Direction,
    rules: &MergeRules,
    outcome: &mut MoveOutcome,
) -> bool {
    let from = match board.tile(id) {
        Some(t) => t.cell,
        None => return false,
    };
    let mut dest: Option<Cell> = None;
    let mut cursor = from;

    while let Some(next) = board.grid().adjacent(cursor, dir) {
        match board.grid().occupant(next) {
            None => {
                dest = Some(next);
                cursor = next;
            }
            Some(other) => {
                let plan = match (board.tile(id), board.tile(other)) {
                    (Some(a), Some(b)) => rules::plan_merge(a, b, rules),
                    _ => None,
                };
                if let Some(plan) = plan {
                    apply_merge(board, plan, outcome);
                    return true;
                }
                break;
            }
        }
    }

    match dest {
        Some(to) => {
            board.relocate(id, to);
            outcome.events.push(GameEvent::TileSlid { id, from, to });
            true
        }
        None => false,
    }
}

// ══════════════════════════════════════════════════════════════
// Merge application
// ══════════════════════════════════════════════════════════════

fn apply_merge(board: &mut Board, plan: MergePlan, outcome: &mut MoveOutcome) {
    board.remove(plan.consumed);
    board.update_tile(plan.survivor, plan.value, plan.tier, plan.lock);

    let at = match board.tile(plan.survivor) {
        Some(t) => t.cell,
        None => return,
    };
    outcome.events.push(GameEvent::TilesMerged {
        survivor: plan.survivor,
        consumed: plan.consumed,
        at,
        value: plan.value,
        kind: plan.kind,
    });
    if plan.kind == MergeKind::Combined {
        outcome.score_gained += u64::from(plan.value);
    }

    if plan.cascade {
        outcome.events.push(GameEvent::MilestoneReached { at, value: plan.value });
        destroy_neighbours(board, at, outcome);
    }
}

/// Milestone cascade: every orthogonal neighbour goes, locked or not.
fn destroy_neighbours(board: &mut Board, at: Cell, outcome: &mut MoveOutcome) {
    for dir in Direction::ALL {
        let Some(n) = board.grid().adjacent(at, dir) else { continue };
        let Some(victim) = board.grid().occupant(n) else { continue };
        board.remove(victim);
        outcome.events.push(GameEvent::TileDestroyed { id: victim, at: n });
    }
}

// ══════════════════════════════════════════════════════════════
// Unit tests
// ══════════════════════════════════════════════════════════════
