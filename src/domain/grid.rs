//! Grid topology: fixed cells, adjacency, and occupancy slots.
//!
//! Coordinates: (x, y) with x growing left to right and y growing top to
//! bottom. Row 0 is the top row. Cells never change for the lifetime of a
//! board; only the occupant id stored in each slot does.

use std::fmt;

use super::spawn::RandomSource;
use super::tile::TileId;

/// One addressable grid position.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, PartialOrd, Ord)]
pub struct Cell {
    pub x: usize,
    pub y: usize,
}

impl Cell {
    pub fn new(x: usize, y: usize) -> Self {
        Cell { x, y }
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Move direction supplied by the input layer.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    pub const ALL: [Direction; 4] = [
        Direction::Up,
        Direction::Down,
        Direction::Left,
        Direction::Right,
    ];

    /// Unit offset (dx, dy) in grid space.
    pub fn offset(self) -> (i32, i32) {
        match self {
            Direction::Up    => (0, -1),
            Direction::Down  => (0, 1),
            Direction::Left  => (-1, 0),
            Direction::Right => (1, 0),
        }
    }
}

/// Occupancy grid. Each slot holds the id of the tile owning that cell.
#[derive(Clone, Debug, PartialEq)]
pub struct Grid {
    width: usize,
    height: usize,
    occupants: Vec<Option<TileId>>,
}

impl Grid {
    pub fn new(width: usize, height: usize) -> Self {
        Grid {
            width,
            height,
            occupants: vec![None; width * height],
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Total number of cells.
    pub fn size(&self) -> usize {
        self.width * self.height
    }

    #[inline]
    fn index(&self, cell: Cell) -> usize {
        cell.y * self.width + cell.x
    }

    /// Cell at (x, y), or None outside the board.
    pub fn cell_at(&self, x: i32, y: i32) -> Option<Cell> {
        if x < 0 || y < 0 || x >= self.width as i32 || y >= self.height as i32 {
            return None;
        }
        Some(Cell::new(x as usize, y as usize))
    }

    /// Neighbour of `cell` one step in `dir`. None at the boundary.
    pub fn adjacent(&self, cell: Cell, dir: Direction) -> Option<Cell> {
        let (dx, dy) = dir.offset();
        self.cell_at(cell.x as i32 + dx, cell.y as i32 + dy)
    }

    /// Whether `cell` lies inside this grid.
    pub fn contains(&self, cell: Cell) -> bool {
        cell.x < self.width && cell.y < self.height
    }

    pub fn occupant(&self, cell: Cell) -> Option<TileId> {
        if !self.contains(cell) {
            return None;
        }
        self.occupants[self.index(cell)]
    }

    pub fn is_occupied(&self, cell: Cell) -> bool {
        self.occupant(cell).is_some()
    }

    /// Assign occupancy. Only the board calls this; it keeps the tile's
    /// back-reference in step.
    pub(crate) fn set_occupant(&mut self, cell: Cell, tile: Option<TileId>) {
        assert!(self.contains(cell), "cell {:?} outside {}x{} grid", cell, self.width, self.height);
        let idx = self.index(cell);
        self.occupants[idx] = tile;
    }

    /// Drop every occupant.
    pub(crate) fn clear(&mut self) {
        self.occupants.fill(None);
    }

    /// All cells in row-major order.
    pub fn cells(&self) -> impl Iterator<Item = Cell> + '_ {
        (0..self.height).flat_map(move |y| (0..self.width).map(move |x| Cell::new(x, y)))
    }

    /// Empty cells in row-major order.
    pub fn empty_cells(&self) -> Vec<Cell> {
        self.cells().filter(|&c| !self.is_occupied(c)).collect()
    }

    /// Uniformly random empty cell. None when the grid is full; callers
    /// are expected to check for free space first.
    pub fn random_empty_cell(&self, rng: &mut dyn RandomSource) -> Option<Cell> {
        let empty = self.empty_cells();
        if empty.is_empty() {
            return None;
        }
        let i = rng.pick(empty.len());
        empty.get(i).copied()
    }
}
