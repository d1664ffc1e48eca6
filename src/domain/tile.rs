//! Tile entities and their modifiers.
//! Modifier properties are queried via methods, not stored as flags,
//! so modifier semantics are centralized here.

use super::grid::Cell;

/// Value every freshly spawned tile starts with.
pub const SPAWN_VALUE: u32 = 2;

/// Smallest value a Halver can reduce a tile to.
pub const MIN_VALUE: u32 = 2;

/// Unique tile identity. Ids are never reused within a game.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, PartialOrd, Ord)]
pub struct TileId(pub u64);

#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum Modifier {
    #[default]
    None,
    Doubler, // Doubles whatever it merges with, then vanishes
    Halver,  // Halves whatever it merges with (floor 2), then vanishes
}

impl Modifier {
    /// Does this modifier make the tile merge with any unlocked neighbour?
    pub fn is_special(self) -> bool {
        !matches!(self, Modifier::None)
    }

    /// Short badge for the renderer.
    pub fn badge(self) -> &'static str {
        match self {
            Modifier::None => "",
            Modifier::Doubler => "x2",
            Modifier::Halver => "/2",
        }
    }
}

/// A live tile. Owned by exactly one cell; `cell` is the back-reference the
/// board keeps consistent with the grid's occupant slot.
#[derive(Clone, Debug, PartialEq)]
pub struct Tile {
    pub id: TileId,
    pub value: u32,
    pub modifier: Modifier,
    /// Set once the tile took part in a plain merge this turn.
    pub locked: bool,
    /// Presentation rank, advanced by plain merges only.
    pub tier: u8,
    pub cell: Cell,
}

impl Tile {
    pub fn new(id: TileId, cell: Cell, value: u32, modifier: Modifier) -> Self {
        Tile {
            id,
            value,
            modifier,
            locked: false,
            tier: 0,
            cell,
        }
    }
}

/// Read-only view of a tile for rendering and tests.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TileView {
    pub id: TileId,
    pub value: u32,
    pub modifier: Modifier,
    pub cell: Cell,
    pub locked: bool,
    pub tier: u8,
}

impl From<&Tile> for TileView {
    fn from(t: &Tile) -> Self {
        TileView {
            id: t.id,
            value: t.value,
            modifier: t.modifier,
            cell: t.cell,
            locked: t.locked,
            tier: t.tier,
        }
    }
}
