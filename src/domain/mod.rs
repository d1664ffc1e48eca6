//! Domain model: grid topology, tiles, merge rules, spawn policy.
//! Nothing here knows about turns, timing, or the terminal.

pub mod grid;
pub mod rules;
pub mod spawn;
pub mod tile;
