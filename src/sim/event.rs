//! Events emitted while resolving a move and settling a turn.
//! The presentation layer consumes these for sound and messages.

use crate::domain::grid::Cell;
use crate::domain::rules::MergeKind;
use crate::domain::tile::{Modifier, TileId};

#[derive(Clone, Debug, PartialEq)]
#[allow(dead_code)]
pub enum GameEvent {
    TileSlid { id: TileId, from: Cell, to: Cell },
    TilesMerged { survivor: TileId, consumed: TileId, at: Cell, value: u32, kind: MergeKind },
    MilestoneReached { at: Cell, value: u32 },
    TileDestroyed { id: TileId, at: Cell },
    TileSpawned { id: TileId, at: Cell, modifier: Modifier },
    GameOver { score: u64 },
}
