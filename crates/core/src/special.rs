//! Special piece rules - which matches create a special, and what a special clears
//!
//! This is the deterministic half of the special effect subsystem: shape recognition and
//! detonation targets. Popping and spawning pieces is driven by the engine.
//!
//! | Kind | Created from | Detonation |
//! |------|--------------|------------|
//! | Row | row-aligned run of exactly 4 | whole row |
//! | Column | column-aligned run of exactly 4 | whole column |
//! | Colour | run of 5 or more, either axis | every cell of the most numerous common type |
//! | Blast | position shared by two or more runs | 12-cell diamond around the piece |

use arrayvec::ArrayVec;

use crate::grid::Grid;
use crate::matches::{positions_in_multiple_matches, Match};
use crate::registry::TypeRegistry;
use crate::types::{PieceType, Position, SpecialKind};

/// Exact run length that creates a Row or Column special.
pub const LINE_SPECIAL_LENGTH: usize = 4;

/// Minimum run length that creates a Colour special.
pub const COLOUR_SPECIAL_LENGTH: usize = 5;

/// Offsets cleared by a Blast: Manhattan distance 1..=2, centre excluded.
pub const BLAST_OFFSETS: [(i32, i32); 12] = [
    (-2, 0),
    (-1, -1),
    (-1, 0),
    (-1, 1),
    (0, -2),
    (0, -1),
    (0, 1),
    (0, 2),
    (1, -1),
    (1, 0),
    (1, 1),
    (2, 0),
];

/// Does a single match qualify to create this special?
///
/// Blast works on overlaps between matches rather than on one match, so it never
/// qualifies here; see [`blast_overlaps`].
pub fn qualifies(kind: SpecialKind, m: &Match) -> bool {
    match kind {
        SpecialKind::Row => m.is_horizontal() && m.len() == LINE_SPECIAL_LENGTH,
        SpecialKind::Column => m.is_vertical() && m.len() == LINE_SPECIAL_LENGTH,
        SpecialKind::Colour => m.len() >= COLOUR_SPECIAL_LENGTH,
        SpecialKind::Blast => false,
    }
}

/// Indices of the matches a line special consumes, last match first.
pub fn qualifying_matches(kind: SpecialKind, matches: &[Match]) -> Vec<usize> {
    (0..matches.len())
        .rev()
        .filter(|&i| qualifies(kind, &matches[i]))
        .collect()
}

/// Overlap positions and, for each, the indices of every match touching it
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BlastPlan {
    pub overlaps: Vec<Position>,
    pub consumed: Vec<usize>,
}

/// Work out where Blast specials land and which matches they consume
pub fn blast_overlaps(matches: &[Match]) -> BlastPlan {
    let overlaps = positions_in_multiple_matches(matches);
    let consumed = (0..matches.len())
        .filter(|&i| overlaps.iter().any(|&p| matches[i].contains(p)))
        .collect();
    BlastPlan { overlaps, consumed }
}

/// Positions a detonation of `kind` at `position` clears.
///
/// Targets outside the grid are dropped. The triggering cell itself is included for Row
/// and Column; it is usually already empty by the time this runs.
pub fn trigger_targets(
    kind: SpecialKind,
    grid: &Grid,
    registry: &TypeRegistry,
    position: Position,
) -> Vec<Position> {
    match kind {
        SpecialKind::Row => (0..grid.columns() as i32)
            .map(|column| Position::new(position.row, column))
            .filter(|&p| grid.is_valid_position(p))
            .collect(),
        SpecialKind::Column => (0..grid.rows() as i32)
            .map(|row| Position::new(row, position.column))
            .filter(|&p| grid.is_valid_position(p))
            .collect(),
        SpecialKind::Colour => match dominant_common_type(grid, registry) {
            Some(target) => grid
                .iter()
                .filter(|&(_, ty)| ty == target)
                .map(|(p, _)| p)
                .collect(),
            None => Vec::new(),
        },
        SpecialKind::Blast => blast_targets(grid, position).into_iter().collect(),
    }
}

fn blast_targets(grid: &Grid, position: Position) -> ArrayVec<Position, 12> {
    BLAST_OFFSETS
        .iter()
        .map(|&(dr, dc)| position.offset(dr, dc))
        .filter(|&p| grid.is_valid_position(p))
        .collect()
}

/// Most numerous common type on the grid.
///
/// Ties go to the type that reached the winning count first during a row-major scan.
pub fn dominant_common_type(grid: &Grid, registry: &TypeRegistry) -> Option<PieceType> {
    let common = registry.common_types();
    let mut counts = vec![0usize; common.len()];
    let mut best: Option<(PieceType, usize)> = None;

    for (_, ty) in grid.iter() {
        let Some(slot) = common.iter().position(|&c| c == ty) else {
            continue;
        };
        counts[slot] += 1;
        if best.map_or(true, |(_, count)| counts[slot] > count) {
            best = Some((ty, counts[slot]));
        }
    }

    best.map(|(ty, _)| ty)
}
