//! Match detection - runs of equal piece types
//!
//! Rows are scanned left to right and columns top to bottom. Each line accumulates a run of
//! equal consecutive types; when the type changes the run is emitted if it is long enough,
//! and the last run of every line is flushed the same way.
//!
//! Results list every horizontal match (row order) before every vertical match (column
//! order). Matches from the two orientations may share positions and are never merged:
//! an L-shaped cluster yields two matches with one common position.

use crate::grid::Grid;
use crate::types::{Orientation, PieceType, Position, EMPTY, MIN_MATCH};

/// A run of same-type positions in one orientation
#[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct Match {
    pub orientation: Orientation,
    /// Positions in scan order (left to right, or top to bottom)
    pub positions: Vec<Position>,
}

impl Match {
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub fn contains(&self, position: Position) -> bool {
        self.positions.contains(&position)
    }

    /// Position at index `len / 2`, where a spawned special lands
    pub fn middle(&self) -> Option<Position> {
        self.positions.get(self.positions.len() / 2).copied()
    }

    pub fn is_horizontal(&self) -> bool {
        self.orientation == Orientation::Horizontal
    }

    pub fn is_vertical(&self) -> bool {
        self.orientation == Orientation::Vertical
    }
}

/// All matches of at least [`MIN_MATCH`] pieces
pub fn find_matches(grid: &Grid) -> Vec<Match> {
    find_matches_with(grid, MIN_MATCH, &[])
}

/// All matches of at least `min_len` pieces.
///
/// With a non-empty `filter`, only matches containing at least one filter position are kept.
pub fn find_matches_with(grid: &Grid, min_len: usize, filter: &[Position]) -> Vec<Match> {
    let mut matches = Vec::new();
    scan_lines(grid, min_len, Orientation::Horizontal, &mut matches);
    scan_lines(grid, min_len, Orientation::Vertical, &mut matches);

    debug_assert!(matches.iter().all(|m| m.len() >= min_len));

    if filter.is_empty() {
        return matches;
    }
    matches.retain(|m| m.positions.iter().any(|p| filter.contains(p)));
    matches
}

fn scan_lines(grid: &Grid, min_len: usize, orientation: Orientation, out: &mut Vec<Match>) {
    let (lines, cells) = match orientation {
        Orientation::Horizontal => (grid.rows(), grid.columns()),
        Orientation::Vertical => (grid.columns(), grid.rows()),
    };

    for line in 0..lines as i32 {
        let mut run: Vec<Position> = Vec::new();
        let mut run_type: Option<PieceType> = None;

        for cell in 0..cells as i32 {
            let position = match orientation {
                Orientation::Horizontal => Position::new(line, cell),
                Orientation::Vertical => Position::new(cell, line),
            };
            let ty = grid.get(position);

            if ty == run_type {
                run.push(position);
            } else {
                flush_run(&mut run, run_type, min_len, orientation, out);
                run.push(position);
                run_type = ty;
            }
        }

        flush_run(&mut run, run_type, min_len, orientation, out);
    }
}

fn flush_run(
    run: &mut Vec<Position>,
    run_type: Option<PieceType>,
    min_len: usize,
    orientation: Orientation,
    out: &mut Vec<Match>,
) {
    let occupied = run_type.is_some_and(|ty| ty != EMPTY);
    if occupied && run.len() >= min_len {
        out.push(Match {
            orientation,
            positions: std::mem::take(run),
        });
    } else {
        run.clear();
    }
}

/// Positions that appear in two or more matches, in order of first appearance
pub fn positions_in_multiple_matches(matches: &[Match]) -> Vec<Position> {
    let mut seen: Vec<Position> = Vec::new();
    let mut repeated: Vec<Position> = Vec::new();

    for position in matches.iter().flat_map(|m| m.positions.iter().copied()) {
        if seen.contains(&position) {
            continue;
        }
        seen.push(position);
        let count = matches.iter().filter(|m| m.contains(position)).count();
        if count >= 2 {
            repeated.push(position);
        }
    }

    repeated
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(row: i32, column: i32) -> Position {
        Position::new(row, column)
    }

    #[test]
    fn test_single_row_match() {
        let grid = Grid::from_rows(&[vec![1, 1, 1], vec![2, 3, 2], vec![3, 2, 3]]);
        let matches = find_matches(&grid);

        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].orientation, Orientation::Horizontal);
        assert_eq!(matches[0].positions, vec![p(0, 0), p(0, 1), p(0, 2)]);
    }

    #[test]
    fn test_horizontal_matches_come_first() {
        // Column 0 is a vertical run; row 2 is a horizontal run.
        let grid = Grid::from_rows(&[
            vec![4, 1, 2, 3],
            vec![4, 2, 3, 1],
            vec![4, 5, 5, 5],
        ]);
        let matches = find_matches(&grid);

        assert_eq!(matches.len(), 2);
        assert!(matches[0].is_horizontal());
        assert_eq!(matches[0].positions, vec![p(2, 1), p(2, 2), p(2, 3)]);
        assert!(matches[1].is_vertical());
        assert_eq!(matches[1].positions, vec![p(0, 0), p(1, 0), p(2, 0)]);
    }

    #[test]
    fn test_run_flushed_on_type_change_and_line_end() {
        let grid = Grid::from_rows(&[vec![1, 1, 1, 2, 2, 2, 2]]);
        let matches = find_matches(&grid);

        assert_eq!(matches.len(), 2);
        assert_eq!(matches[0].len(), 3);
        assert_eq!(matches[1].len(), 4);
        assert_eq!(matches[1].positions[0], p(0, 3));
    }

    #[test]
    fn test_l_shape_yields_two_overlapping_matches() {
        let grid = Grid::from_rows(&[
            vec![1, 2, 3],
            vec![1, 3, 2],
            vec![1, 1, 1],
        ]);
        let matches = find_matches(&grid);

        assert_eq!(matches.len(), 2);
        assert!(matches.iter().all(|m| m.contains(p(2, 0))));
        assert_eq!(positions_in_multiple_matches(&matches), vec![p(2, 0)]);
    }

    #[test]
    fn test_empty_cells_never_match() {
        let grid = Grid::from_rows(&[vec![0, 0, 0], vec![0, 0, 0], vec![1, 2, 1]]);
        assert!(find_matches(&grid).is_empty());
    }

    #[test]
    fn test_filter_keeps_intersecting_matches() {
        let grid = Grid::from_rows(&[
            vec![1, 1, 1, 4],
            vec![2, 3, 2, 4],
            vec![3, 2, 3, 4],
        ]);

        assert_eq!(find_matches(&grid).len(), 2);

        let filtered = find_matches_with(&grid, MIN_MATCH, &[p(1, 3)]);
        assert_eq!(filtered.len(), 1);
        assert!(filtered[0].is_vertical());

        let none = find_matches_with(&grid, MIN_MATCH, &[p(1, 1)]);
        assert!(none.is_empty());
    }

    #[test]
    fn test_custom_minimum_length() {
        let grid = Grid::from_rows(&[vec![1, 1, 1, 2, 2, 2, 2]]);
        let matches = find_matches_with(&grid, 4, &[]);
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].len(), 4);
    }

    #[test]
    fn test_middle_position() {
        let m = Match {
            orientation: Orientation::Horizontal,
            positions: vec![p(0, 0), p(0, 1), p(0, 2), p(0, 3)],
        };
        assert_eq!(m.middle(), Some(p(0, 2)));
    }
}
