//! Swap validation
//!
//! A swap is legal when free moves are on, when either endpoint holds a special, or when
//! exchanging the two cells creates a match through at least one of them. The check runs
//! on a scratch copy; the caller's grid is never touched.

use crate::grid::Grid;
use crate::matches::find_matches_with;
use crate::registry::TypeRegistry;
use crate::types::{Position, MIN_MATCH};

/// Check whether swapping `from` and `to` is a legal move. Adjacency is not checked here.
pub fn is_valid_swap(
    grid: &Grid,
    registry: &TypeRegistry,
    from: Position,
    to: Position,
    free_moves: bool,
) -> bool {
    if free_moves {
        return true;
    }

    let special_from = grid.get(from).is_some_and(|ty| registry.is_special(ty));
    let special_to = grid.get(to).is_some_and(|ty| registry.is_special(ty));
    if special_from || special_to {
        return true;
    }

    let mut scratch = grid.clone();
    if !scratch.swap(from, to) {
        return false;
    }

    !find_matches_with(&scratch, MIN_MATCH, &[from, to]).is_empty()
}

/// Orthogonal neighbours of two positions
pub fn are_adjacent(a: Position, b: Position) -> bool {
    (a.row - b.row).abs() + (a.column - b.column).abs() == 1
}
