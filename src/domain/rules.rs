//! Merge rules, truth-table driven.
//!
//! Pure functions over tiles with no side effects.
//! These encode "what is legal" and "what a merge produces" without
//! touching the board; the resolver applies the resulting plan.
//!
//! Naming: `a` is the moving tile, `b` is the stationary tile it ran into.
//!
//! ## Eligibility (`can_merge`)
//! ┌───────────────────────────────┬────────┐
//! │ Condition (priority order)     │ Merge? │
//! ├───────────────────────────────┼────────┤
//! │ a or b locked                  │ NO     │
//! │ a or b carries a modifier      │ YES    │
//! │ a.value == b.value             │ YES    │
//! │ Otherwise                      │ NO     │
//! └───────────────────────────────┴────────┘
//!
//! ## Resolution (`plan_merge`, first match wins)
//! ┌──────────────┬──────────┬──────────────────┬────────┬─────────┐
//! │ Condition     │ Survivor │ New value        │ Locked │ Tier    │
//! ├──────────────┼──────────┼──────────────────┼────────┼─────────┤
//! │ a Doubler     │ b        │ b × 2            │ no     │ kept    │
//! │ b Doubler     │ a        │ a × 2            │ no     │ kept    │
//! │ a Halver      │ b        │ max(2, b / 2)    │ no     │ kept    │
//! │ b Halver      │ a        │ max(2, a / 2)    │ no     │ kept    │
//! │ equal plain   │ b        │ b × 2            │ YES    │ +1      │
//! └──────────────┴──────────┴──────────────────┴────────┴─────────┘
//!
//! The survivor keeps its own cell; the consumed tile's cell empties.
//! Only the equal-plain row can trigger the milestone cascade: reaching
//! exactly `milestone` destroys every tile orthogonally adjacent to the
//! survivor, locked or not.

use super::tile::{Modifier, Tile, TileId, MIN_VALUE};

pub const DEFAULT_MILESTONE: u32 = 2048;

/// Highest presentation tier (tier 0 = value 2, tier 10 = value 2048).
pub const DEFAULT_MAX_TIER: u8 = 10;

/// Tunable merge constants.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MergeRules {
    pub milestone: u32,
    pub max_tier: u8,
}

impl Default for MergeRules {
    fn default() -> Self {
        MergeRules {
            milestone: DEFAULT_MILESTONE,
            max_tier: DEFAULT_MAX_TIER,
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum MergeKind {
    /// A Doubler was consumed.
    Doubled,
    /// A Halver was consumed.
    Halved,
    /// Two equal plain tiles combined.
    Combined,
}

/// What a merge does, computed before the board is touched.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct MergePlan {
    pub kind: MergeKind,
    pub survivor: TileId,
    pub consumed: TileId,
    pub value: u32,
    pub tier: u8,
    pub lock: bool,
    /// Destroy the survivor's orthogonal neighbours afterwards.
    pub cascade: bool,
}

// ── Eligibility ──

pub fn can_merge(a: &Tile, b: &Tile) -> bool {
    if a.locked || b.locked { return false; }
    if a.modifier.is_special() || b.modifier.is_special() { return true; }
    a.value == b.value
}

// ── Resolution ──

#[inline]
fn doubled(v: u32) -> u32 {
    v.saturating_mul(2)
}

#[inline]
fn halved(v: u32) -> u32 {
    (v / 2).max(MIN_VALUE)
}

fn modifier_plan(kind: MergeKind, survivor: &Tile, consumed: &Tile) -> MergePlan {
    let value = match kind {
        MergeKind::Doubled => doubled(survivor.value),
        _ => halved(survivor.value),
    };
    MergePlan {
        kind,
        survivor: survivor.id,
        consumed: consumed.id,
        value,
        tier: survivor.tier,
        lock: false,
        cascade: false,
    }
}

/// Decide the outcome of `a` running into `b`.
/// Returns None when the pair is not eligible.
pub fn plan_merge(a: &Tile, b: &Tile, rules: &MergeRules) -> Option<MergePlan> {
    if !can_merge(a, b) { return None; }

    let plan = match (a.modifier, b.modifier) {
        (Modifier::Doubler, _) => modifier_plan(MergeKind::Doubled, b, a),
        (_, Modifier::Doubler) => modifier_plan(MergeKind::Doubled, a, b),
        (Modifier::Halver, _)  => modifier_plan(MergeKind::Halved, b, a),
        (_, Modifier::Halver)  => modifier_plan(MergeKind::Halved, a, b),
        (Modifier::None, Modifier::None) => {
            let value = doubled(b.value);
            MergePlan {
                kind: MergeKind::Combined,
                survivor: b.id,
                consumed: a.id,
                value,
                tier: b.tier.saturating_add(1).min(rules.max_tier),
                lock: true,
                cascade: value == rules.milestone,
            }
        }
    };
    Some(plan)
}

// ══════════════════════════════════════════════════════════════
// Unit tests
// ══════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::grid::Cell;

    fn tile(id: u64, value: u32, modifier: Modifier) -> Tile {
        Tile::new(TileId(id), Cell::new(id as usize, 0), value, modifier)
    }

    fn plain(id: u64, value: u32) -> Tile {
        tile(id, value, Modifier::None)
    }

    // ── Eligibility ──

    #[test]
    fn equal_plain_tiles_merge() {
        assert!(can_merge(&plain(1, 8), &plain(2, 8)));
    }

    #[test]
    fn unequal_plain_tiles_do_not_merge() {
        assert!(!can_merge(&plain(1, 8), &plain(2, 16)));
    }

    #[test]
    fn modifier_merges_with_any_value() {
        assert!(can_merge(&tile(1, 2, Modifier::Doubler), &plain(2, 512)));
        assert!(can_merge(&plain(1, 64), &tile(2, 2, Modifier::Halver)));
    }

    #[test]
    fn locked_tile_never_merges() {
        let mut b = plain(2, 8);
        b.locked = true;
        assert!(!can_merge(&plain(1, 8), &b));
        assert!(!can_merge(&b, &plain(1, 8)));

        let mut d = tile(3, 2, Modifier::Doubler);
        d.locked = true;
        assert!(!can_merge(&d, &plain(1, 8)));
    }

    // ── Resolution ──

    #[test]
    fn plain_merge_doubles_locks_and_advances_tier() {
        let a = plain(1, 4);
        let mut b = plain(2, 4);
        b.tier = 1;
        let p = plan_merge(&a, &b, &MergeRules::default()).unwrap();
        assert_eq!(p.kind, MergeKind::Combined);
        assert_eq!(p.survivor, TileId(2));
        assert_eq!(p.consumed, TileId(1));
        assert_eq!(p.value, 8);
        assert_eq!(p.tier, 2);
        assert!(p.lock);
        assert!(!p.cascade);
    }

    #[test]
    fn plain_merge_tier_is_clamped() {
        let mut b = plain(2, 4096);
        b.tier = DEFAULT_MAX_TIER;
        let p = plan_merge(&plain(1, 4096), &b, &MergeRules::default()).unwrap();
        assert_eq!(p.tier, DEFAULT_MAX_TIER);
    }

    #[test]
    fn moving_doubler_doubles_stationary_tile() {
        let p = plan_merge(&tile(1, 2, Modifier::Doubler), &plain(2, 32), &MergeRules::default()).unwrap();
        assert_eq!(p.kind, MergeKind::Doubled);
        assert_eq!(p.survivor, TileId(2));
        assert_eq!(p.consumed, TileId(1));
        assert_eq!(p.value, 64);
        assert!(!p.lock);
    }

    #[test]
    fn stationary_doubler_doubles_moving_tile() {
        let p = plan_merge(&plain(1, 32), &tile(2, 2, Modifier::Doubler), &MergeRules::default()).unwrap();
        assert_eq!(p.survivor, TileId(1));
        assert_eq!(p.consumed, TileId(2));
        assert_eq!(p.value, 64);
        assert!(!p.lock);
    }

    #[test]
    fn halver_never_goes_below_two() {
        let r = MergeRules::default();
        let p = plan_merge(&tile(1, 2, Modifier::Halver), &plain(2, 64), &r).unwrap();
        assert_eq!((p.kind, p.value, p.survivor), (MergeKind::Halved, 32, TileId(2)));

        let p = plan_merge(&tile(1, 2, Modifier::Halver), &plain(2, 2), &r).unwrap();
        assert_eq!(p.value, 2);

        let p = plan_merge(&plain(1, 4), &tile(2, 2, Modifier::Halver), &r).unwrap();
        assert_eq!((p.value, p.survivor), (2, TileId(1)));
    }

    #[test]
    fn doubler_outranks_halver_regardless_of_side() {
        let r = MergeRules::default();
        // a Halver, b Doubler: rule "b Doubler" comes before "a Halver"
        let p = plan_merge(&tile(1, 8, Modifier::Halver), &tile(2, 2, Modifier::Doubler), &r).unwrap();
        assert_eq!((p.kind, p.survivor, p.value), (MergeKind::Doubled, TileId(1), 16));

        // both Doublers: the moving one is consumed
        let p = plan_merge(&tile(1, 2, Modifier::Doubler), &tile(2, 4, Modifier::Doubler), &r).unwrap();
        assert_eq!((p.survivor, p.consumed, p.value), (TileId(2), TileId(1), 8));
    }

    #[test]
    fn modifier_merge_keeps_tier() {
        let mut b = plain(2, 16);
        b.tier = 3;
        let p = plan_merge(&tile(1, 2, Modifier::Doubler), &b, &MergeRules::default()).unwrap();
        assert_eq!(p.tier, 3);
    }

    #[test]
    fn milestone_only_via_plain_merge() {
        let r = MergeRules::default();
        let p = plan_merge(&plain(1, 1024), &plain(2, 1024), &r).unwrap();
        assert!(p.cascade);

        let p = plan_merge(&tile(1, 2, Modifier::Doubler), &plain(2, 1024), &r).unwrap();
        assert_eq!(p.value, 2048);
        assert!(!p.cascade);
    }

    #[test]
    fn milestone_is_exact() {
        let r = MergeRules::default();
        let p = plan_merge(&plain(1, 2048), &plain(2, 2048), &r).unwrap();
        assert!(!p.cascade);
    }

    #[test]
    fn ineligible_pair_has_no_plan() {
        assert_eq!(plan_merge(&plain(1, 2), &plain(2, 4), &MergeRules::default()), None);
    }
}
