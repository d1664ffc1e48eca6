//! Spawn policy and the injectable randomness source.
//!
//! A new tile always starts at value 2. Its modifier comes from a single
//! uniform roll `r ∈ [0, 1)`:
//!
//!   r < doubler_chance                   → Doubler
//!   r < doubler_chance + halver_chance   → Halver
//!   otherwise                            → None
//!
//! The cell is drawn uniformly from the empty cells.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::tile::Modifier;

pub const DEFAULT_DOUBLER_CHANCE: f64 = 0.05;
pub const DEFAULT_HALVER_CHANCE: f64 = 0.05;

/// Source of uniform draws. Boxed into the world so tests can script it.
pub trait RandomSource {
    /// Uniform draw in [0, 1).
    fn next_unit(&mut self) -> f64;
    /// Uniform index in [0, n). `n` must be non-zero.
    fn pick(&mut self, n: usize) -> usize;
}

/// Production source backed by `StdRng`.
pub struct SeededRandom {
    rng: StdRng,
}

impl SeededRandom {
    pub fn new(seed: u64) -> Self {
        SeededRandom { rng: StdRng::seed_from_u64(seed) }
    }

    pub fn from_entropy() -> Self {
        SeededRandom { rng: StdRng::from_entropy() }
    }
}

impl RandomSource for SeededRandom {
    fn next_unit(&mut self) -> f64 {
        self.rng.gen::<f64>()
    }

    fn pick(&mut self, n: usize) -> usize {
        self.rng.gen_range(0..n)
    }
}

/// Modifier distribution for new tiles.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SpawnPolicy {
    pub doubler_chance: f64,
    pub halver_chance: f64,
}

impl Default for SpawnPolicy {
    fn default() -> Self {
        SpawnPolicy {
            doubler_chance: DEFAULT_DOUBLER_CHANCE,
            halver_chance: DEFAULT_HALVER_CHANCE,
        }
    }
}

impl SpawnPolicy {
    /// Map a roll in [0, 1) to a modifier.
    pub fn modifier_for(&self, roll: f64) -> Modifier {
        if roll < self.doubler_chance {
            Modifier::Doubler
        } else if roll < self.doubler_chance + self.halver_chance {
            Modifier::Halver
        } else {
            Modifier::None
        }
    }

    pub fn roll_modifier(&self, rng: &mut dyn RandomSource) -> Modifier {
        self.modifier_for(rng.next_unit())
    }
}

/// Deterministic source for tests: replays the given draws, then falls back
/// to 0.5 / index 0 once exhausted.
#[cfg(test)]
pub struct ScriptedRandom {
    units: std::collections::VecDeque<f64>,
    picks: std::collections::VecDeque<usize>,
}

#[cfg(test)]
impl ScriptedRandom {
    pub fn new(units: &[f64], picks: &[usize]) -> Self {
        ScriptedRandom {
            units: units.iter().copied().collect(),
            picks: picks.iter().copied().collect(),
        }
    }
}

#[cfg(test)]
impl RandomSource for ScriptedRandom {
    fn next_unit(&mut self) -> f64 {
        self.units.pop_front().unwrap_or(0.5)
    }

    fn pick(&mut self, n: usize) -> usize {
        self.picks.pop_front().unwrap_or(0).min(n - 1)
    }
}
