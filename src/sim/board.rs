//! Board: the grid plus the set of live tiles.
//!
//! ## Ownership
//!
//! A tile is owned by exactly one cell. Two links describe that ownership
//! and are always kept in step:
//!   - `grid.occupant(cell) == Some(tile.id)`
//!   - `tiles[id].cell == cell`
//!
//! All mutations go through `place()` / `relocate()` / `remove()`, which
//! update both sides at once. Contract violations (placing onto an occupied
//! cell, moving a missing tile) are programming errors and assert.

use std::collections::BTreeMap;

use crate::domain::grid::{Cell, Grid};
use crate::domain::spawn::{RandomSource, SpawnPolicy};
use crate::domain::tile::{Modifier, Tile, TileId, TileView, SPAWN_VALUE};

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum BoardError {
    #[error("board is full ({0} tiles)")]
    Full(usize),
    #[error("cell {0} is outside the board")]
    OutOfBounds(Cell),
    #[error("cell {cell} is already occupied by {by:?}")]
    Occupied { cell: Cell, by: TileId },
    #[error("tile {tile:?} claims cell {cell} but the cell holds {occupant:?}")]
    Dangling { tile: TileId, cell: Cell, occupant: Option<TileId> },
    #[error("cell {cell} points at missing or mismatched tile {tile:?}")]
    Orphaned { cell: Cell, tile: TileId },
    #[error("{tiles} tiles exceed board capacity {capacity}")]
    OverCapacity { tiles: usize, capacity: usize },
}

#[derive(Clone, Debug, PartialEq)]
pub struct Board {
    grid: Grid,
    tiles: BTreeMap<TileId, Tile>,
    next_id: u64,
}

// ── Queries ──

impl Board {
    pub fn new(width: usize, height: usize) -> Self {
        Board {
            grid: Grid::new(width, height),
            tiles: BTreeMap::new(),
            next_id: 1,
        }
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn width(&self) -> usize {
        self.grid.width()
    }

    pub fn height(&self) -> usize {
        self.grid.height()
    }

    /// Maximum number of live tiles.
    pub fn capacity(&self) -> usize {
        self.grid.size()
    }

    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    pub fn is_full(&self) -> bool {
        self.tiles.len() >= self.capacity()
    }

    pub fn tile(&self, id: TileId) -> Option<&Tile> {
        self.tiles.get(&id)
    }

    pub fn tile_at(&self, cell: Cell) -> Option<&Tile> {
        self.grid.occupant(cell).and_then(|id| self.tiles.get(&id))
    }

    /// Live tiles in id order.
    pub fn tiles(&self) -> impl Iterator<Item = &Tile> {
        self.tiles.values()
    }

    /// Read-only view of every live tile, sorted by id.
    pub fn snapshot(&self) -> Vec<TileView> {
        self.tiles.values().map(TileView::from).collect()
    }

    /// Highest value on the board (0 when empty).
    pub fn max_value(&self) -> u32 {
        self.tiles.values().map(|t| t.value).max().unwrap_or(0)
    }
}

// ── Mutation ──

impl Board {
    fn alloc_id(&mut self) -> TileId {
        let id = TileId(self.next_id);
        self.next_id += 1;
        id
    }

    /// Create a tile at `cell`.
    pub fn place(&mut self, cell: Cell, value: u32, modifier: Modifier) -> Result<TileId, BoardError> {
        if !self.grid.contains(cell) {
            return Err(BoardError::OutOfBounds(cell));
        }
        if let Some(by) = self.grid.occupant(cell) {
            return Err(BoardError::Occupied { cell, by });
        }
        if self.is_full() {
            return Err(BoardError::Full(self.len()));
        }
        let id = self.alloc_id();
        self.tiles.insert(id, Tile::new(id, cell, value, modifier));
        self.grid.set_occupant(cell, Some(id));
        Ok(id)
    }

    /// Spawn a value-2 tile at a random empty cell with a rolled modifier.
    /// Fails with `BoardError::Full` when no cell is free.
    pub fn spawn_random(
        &mut self,
        policy: &SpawnPolicy,
        rng: &mut dyn RandomSource,
    ) -> Result<TileView, BoardError> {
        if self.is_full() {
            return Err(BoardError::Full(self.len()));
        }
        let modifier = policy.roll_modifier(rng);
        let cell = self
            .grid
            .random_empty_cell(rng)
            .ok_or(BoardError::Full(self.len()))?;
        let id = self.place(cell, SPAWN_VALUE, modifier)?;
        self.tile(id)
            .map(TileView::from)
            .ok_or(BoardError::Orphaned { cell, tile: id })
    }

    /// Transfer ownership of `id` to the empty cell `to`.
    pub fn relocate(&mut self, id: TileId, to: Cell) {
        assert!(self.grid.contains(to), "relocate target {:?} outside board", to);
        assert!(
            !self.grid.is_occupied(to),
            "relocate target {:?} occupied by {:?}",
            to,
            self.grid.occupant(to)
        );
        let tile = match self.tiles.get_mut(&id) {
            Some(t) => t,
            None => panic!("relocate of missing tile {:?}", id),
        };
        let from = tile.cell;
        tile.cell = to;
        self.grid.set_occupant(from, None);
        self.grid.set_occupant(to, Some(id));
    }

    /// Remove a tile from the live set and free its cell.
    pub fn remove(&mut self, id: TileId) -> Option<Tile> {
        let tile = self.tiles.remove(&id)?;
        if self.grid.occupant(tile.cell) == Some(id) {
            self.grid.set_occupant(tile.cell, None);
        }
        Some(tile)
    }

    /// Apply a merge result to the surviving tile.
    pub fn update_tile(&mut self, id: TileId, value: u32, tier: u8, lock: bool) {
        let tile = match self.tiles.get_mut(&id) {
            Some(t) => t,
            None => panic!("update of missing tile {:?}", id),
        };
        tile.value = value;
        tile.tier = tier;
        tile.modifier = Modifier::None;
        if lock {
            tile.locked = true;
        }
    }

    pub fn unlock_all(&mut self) {
        for tile in self.tiles.values_mut() {
            tile.locked = false;
        }
    }

    /// Remove every tile. Ids keep counting up.
    pub fn clear(&mut self) {
        self.tiles.clear();
        self.grid.clear();
    }
}

// ── Invariants ──

impl Board {
    /// Verify both ownership links and the capacity bound.
    pub fn check_invariants(&self) -> Result<(), BoardError> {
        if self.tiles.len() > self.capacity() {
            return Err(BoardError::OverCapacity {
                tiles: self.tiles.len(),
                capacity: self.capacity(),
            });
        }
        for tile in self.tiles.values() {
            let occupant = self.grid.occupant(tile.cell);
            if occupant != Some(tile.id) {
                return Err(BoardError::Dangling { tile: tile.id, cell: tile.cell, occupant });
            }
        }
        for cell in self.grid.cells() {
            if let Some(id) = self.grid.occupant(cell) {
                match self.tiles.get(&id) {
                    Some(t) if t.cell == cell => {}
                    _ => return Err(BoardError::Orphaned { cell, tile: id }),
                }
            }
        }
        Ok(())
    }
}

// ── Test diagrams ──
//
// One string per row, tokens separated by spaces:
//   "."     empty cell
//   "8"     plain tile of value 8
//   "2d"    Doubler, "2h" Halver
//   "16!"   locked tile
// Tiers are derived from the value (2 → 0, 4 → 1, ...).

#[cfg(test)]
impl Board {
    pub fn from_diagram(rows: &[&str]) -> Self {
        let height = rows.len();
        let width = rows[0].split_whitespace().count();
        let mut board = Board::new(width, height);
        for (y, row) in rows.iter().enumerate() {
            for (x, tok) in row.split_whitespace().enumerate() {
                if tok == "." { continue; }
                let locked = tok.ends_with('!');
                let tok = tok.trim_end_matches('!');
                let (digits, modifier) = match tok.chars().last() {
                    Some('d') => (&tok[..tok.len() - 1], Modifier::Doubler),
                    Some('h') => (&tok[..tok.len() - 1], Modifier::Halver),
                    _ => (tok, Modifier::None),
                };
                let value: u32 = digits.parse().expect("tile value");
                let id = board.place(Cell::new(x, y), value, modifier).expect("place");
                let tier = value.trailing_zeros().saturating_sub(1) as u8;
                let t = board.tiles.get_mut(&id).expect("placed tile");
                t.tier = tier;
                t.locked = locked;
            }
        }
        board
    }

    pub fn diagram(&self) -> Vec<String> {
        (0..self.height())
            .map(|y| {
                (0..self.width())
                    .map(|x| match self.tile_at(Cell::new(x, y)) {
                        None => ".".to_string(),
                        Some(t) => {
                            let m = match t.modifier {
                                Modifier::None => "",
                                Modifier::Doubler => "d",
                                Modifier::Halver => "h",
                            };
                            let l = if t.locked { "!" } else { "" };
                            format!("{}{}{}", t.value, m, l)
                        }
                    })
                    .collect::<Vec<_>>()
                    .join(" ")
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::spawn::ScriptedRandom;

    #[test]
    fn diagram_round_trip() {
        let rows = [". 2d 4", "16! . 2h"];
        let b = Board::from_diagram(&rows);
        assert_eq!(b.diagram(), rows);
        assert_eq!(b.len(), 4);
        assert!(b.check_invariants().is_ok());
    }

    #[test]
    fn place_rejects_occupied_and_out_of_bounds() {
        let mut b = Board::new(2, 2);
        let id = b.place(Cell::new(0, 0), 2, Modifier::None).unwrap();
        assert_eq!(
            b.place(Cell::new(0, 0), 4, Modifier::None),
            Err(BoardError::Occupied { cell: Cell::new(0, 0), by: id })
        );
        assert_eq!(
            b.place(Cell::new(2, 0), 4, Modifier::None),
            Err(BoardError::OutOfBounds(Cell::new(2, 0)))
        );
    }

    #[test]
    fn relocate_transfers_ownership() {
        let mut b = Board::from_diagram(&["2 . ."]);
        let id = b.tile_at(Cell::new(0, 0)).unwrap().id;
        b.relocate(id, Cell::new(2, 0));
        assert_eq!(b.diagram(), vec![". . 2"]);
        assert_eq!(b.tile(id).unwrap().cell, Cell::new(2, 0));
        assert!(b.check_invariants().is_ok());
    }

    #[test]
    #[should_panic]
    fn relocate_onto_occupied_cell_panics() {
        let mut b = Board::from_diagram(&["2 4"]);
        let id = b.tile_at(Cell::new(0, 0)).unwrap().id;
        b.relocate(id, Cell::new(1, 0));
    }

    #[test]
    fn remove_frees_cell() {
        let mut b = Board::from_diagram(&["2 4"]);
        let id = b.tile_at(Cell::new(1, 0)).unwrap().id;
        let removed = b.remove(id).unwrap();
        assert_eq!(removed.value, 4);
        assert_eq!(b.diagram(), vec!["2 ."]);
        assert!(b.remove(id).is_none());
        assert!(b.check_invariants().is_ok());
    }

    #[test]
    fn spawn_random_places_value_two_with_rolled_modifier() {
        let mut b = Board::from_diagram(&["4 .", ". 8"]);
        // roll 0.01 → Doubler; pick index 1 of [(1,0), (0,1)] → (0,1)
        let mut rng = ScriptedRandom::new(&[0.01], &[1]);
        let view = b.spawn_random(&SpawnPolicy::default(), &mut rng).unwrap();
        assert_eq!(view.value, 2);
        assert_eq!(view.modifier, Modifier::Doubler);
        assert_eq!(view.cell, Cell::new(0, 1));
        assert!(!view.locked);
        assert_eq!(b.diagram(), vec!["4 .", "2d 8"]);
    }

    #[test]
    fn spawn_random_on_full_board_fails() {
        let mut b = Board::from_diagram(&["2 4"]);
        let mut rng = ScriptedRandom::new(&[], &[]);
        assert_eq!(
            b.spawn_random(&SpawnPolicy::default(), &mut rng),
            Err(BoardError::Full(2))
        );
        assert_eq!(b.diagram(), vec!["2 4"]);
    }

    #[test]
    fn snapshot_lists_tiles_in_id_order() {
        let b = Board::from_diagram(&["2 .", "4h 8!"]);
        let snap = b.snapshot();
        assert_eq!(snap.len(), 3);
        assert!(snap.windows(2).all(|w| w[0].id < w[1].id));
        assert_eq!(snap[1].modifier, Modifier::Halver);
        assert!(snap[2].locked);
        assert_eq!(snap[2].tier, 2);
    }

    #[test]
    fn check_invariants_detects_dangling_link() {
        let mut b = Board::from_diagram(&["2 ."]);
        let id = b.tile_at(Cell::new(0, 0)).unwrap().id;
        // Corrupt the back-reference on purpose.
        b.tiles.get_mut(&id).unwrap().cell = Cell::new(1, 0);
        assert!(matches!(b.check_invariants(), Err(BoardError::Dangling { .. })));
    }

    #[test]
    fn clear_keeps_ids_unique() {
        let mut b = Board::from_diagram(&["2 4"]);
        let before = b.snapshot().iter().map(|t| t.id).max().unwrap();
        b.clear();
        assert_eq!(b.len(), 0);
        let id = b.place(Cell::new(0, 0), 2, Modifier::None).unwrap();
        assert!(id > before);
    }

    #[test]
    fn unlock_all_clears_locks() {
        let mut b = Board::from_diagram(&["4! 8!"]);
        b.unlock_all();
        assert_eq!(b.diagram(), vec!["4 8"]);
    }
}
