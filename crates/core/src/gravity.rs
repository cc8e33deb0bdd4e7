//! Gravity and refill
//!
//! Gravity compacts every column downward. Refill then assigns new random common types to
//! whatever is still empty.

use rand::Rng;

use crate::grid::{random_type, Grid};
use crate::types::{PieceType, Position, EMPTY};

/// A piece that came to rest on a different row
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Movement {
    pub from: Position,
    pub to: Position,
}

/// Let pieces fall into empty cells below them.
///
/// Rows are scanned from the bottom up and columns left to right. Each non-empty cell keeps
/// swapping with the cell below while that cell is empty, so every column ends up with all
/// of its pieces packed at the bottom. Returns one [`Movement`] per piece whose row changed,
/// in scan order.
pub fn apply_gravity(grid: &mut Grid) -> Vec<Movement> {
    let mut movements = Vec::new();

    for row in (0..grid.rows() as i32).rev() {
        for column in 0..grid.columns() as i32 {
            let from = Position::new(row, column);
            if grid.get(from).unwrap_or(EMPTY) == EMPTY {
                continue;
            }

            let mut current = from;
            let mut below = current.offset(1, 0);
            while grid.get(below) == Some(EMPTY) {
                grid.swap(current, below);
                current = below;
                below = current.offset(1, 0);
            }

            if current != from {
                movements.push(Movement { from, to: current });
            }
        }
    }

    movements
}

/// Fill every empty cell with a random common type.
///
/// Cells are filled in row-major order; the filled positions are returned in reverse
/// row-major order (bottom-most, right-most first). Callers stack drop-in animations per
/// column in this order.
pub fn refill<R: Rng + ?Sized>(grid: &mut Grid, common: &[PieceType], rng: &mut R) -> Vec<Position> {
    let mut filled = grid.empty_positions();
    for &position in &filled {
        let ty = random_type(common, &[], rng).unwrap_or(EMPTY);
        grid.set(position, ty);
    }
    filled.reverse();
    filled
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn p(row: i32, column: i32) -> Position {
        Position::new(row, column)
    }

    fn assert_settled(grid: &Grid) {
        for column in 0..grid.columns() as i32 {
            let mut seen_gap = false;
            for row in (0..grid.rows() as i32).rev() {
                let ty = grid.get(p(row, column)).unwrap();
                if ty == EMPTY {
                    seen_gap = true;
                } else {
                    assert!(!seen_gap, "floating piece at {}", p(row, column));
                }
            }
        }
    }

    #[test]
    fn test_gravity_drops_row_into_gap() {
        let mut grid = Grid::from_rows(&[vec![0, 0, 0], vec![2, 3, 2], vec![3, 2, 3]]);
        let movements = apply_gravity(&mut grid);

        assert!(movements.is_empty());
        assert_eq!(grid.to_rows(), vec![vec![0, 0, 0], vec![2, 3, 2], vec![3, 2, 3]]);
    }

    #[test]
    fn test_gravity_reports_moved_pieces() {
        let mut grid = Grid::from_rows(&[vec![1, 4], vec![2, 0], vec![0, 0]]);
        let movements = apply_gravity(&mut grid);

        assert_eq!(grid.to_rows(), vec![vec![0, 0], vec![1, 0], vec![2, 4]]);
        assert_eq!(
            movements,
            vec![
                Movement { from: p(1, 0), to: p(2, 0) },
                Movement { from: p(0, 0), to: p(1, 0) },
                Movement { from: p(0, 1), to: p(2, 1) },
            ]
        );
    }

    #[test]
    fn test_gravity_conserves_pieces() {
        let mut grid = Grid::from_rows(&[
            vec![1, 0, 3, 0],
            vec![0, 2, 0, 4],
            vec![5, 0, 0, 0],
            vec![0, 6, 7, 0],
        ]);
        let before = grid.occupied_count();
        apply_gravity(&mut grid);

        assert_eq!(grid.occupied_count(), before);
        assert_settled(&grid);
    }

    #[test]
    fn test_refill_fills_everything_in_reverse_order() {
        let mut rng = StdRng::seed_from_u64(3);
        let mut grid = Grid::from_rows(&[vec![0, 0], vec![0, 1], vec![2, 0]]);
        let empties = grid.empty_positions().len();
        let filled = refill(&mut grid, &[5, 6, 7], &mut rng);

        assert_eq!(filled.len(), empties);
        assert_eq!(filled, vec![p(2, 1), p(1, 0), p(0, 1), p(0, 0)]);
        assert!(grid.empty_positions().is_empty());
        assert_eq!(grid.get(p(1, 1)), Some(1));
        assert!(filled.iter().all(|&pos| [5, 6, 7].contains(&grid.get(pos).unwrap())));
    }
}
