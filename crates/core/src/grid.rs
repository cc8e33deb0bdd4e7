//! Grid module - the typed piece matrix
//!
//! The grid is a rows x columns matrix where each cell holds a piece type or [`EMPTY`].
//! Uses a flat row-major vector; dimensions are fixed once the grid is created.
//! Coordinates: (row, column) with row 0 at the top and column 0 at the left.
//!
//! Out-of-bounds access is inert: reads return `None`, writes return `false`.

use std::fmt;

use rand::Rng;

use crate::types::{PieceType, Position, EMPTY};

/// The game grid
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grid {
    rows: usize,
    columns: usize,
    /// Flat array of cells, row-major order (row * columns + column)
    cells: Vec<PieceType>,
}

impl Grid {
    /// Create an empty grid
    pub fn new(rows: usize, columns: usize) -> Self {
        Self {
            rows,
            columns,
            cells: vec![EMPTY; rows * columns],
        }
    }

    /// Create a grid from row vectors (row 0 first).
    ///
    /// Panics if the rows are ragged.
    pub fn from_rows(rows: &[Vec<PieceType>]) -> Self {
        let columns = rows.first().map_or(0, Vec::len);
        assert!(
            rows.iter().all(|row| row.len() == columns),
            "grid rows must all have {} columns",
            columns
        );
        Self {
            rows: rows.len(),
            columns,
            cells: rows.iter().flatten().copied().collect(),
        }
    }

    /// Create a grid filled with random common types and no initial matches.
    ///
    /// A candidate that would complete a run of three with the two cells to its left or
    /// the two cells above is rejected and redrawn from the remaining candidates. If every
    /// candidate has been rejected the cell takes an unconstrained draw, which only happens
    /// with fewer than three common types.
    pub fn random<R: Rng + ?Sized>(
        rows: usize,
        columns: usize,
        common: &[PieceType],
        rng: &mut R,
    ) -> Self {
        let mut grid = Self::new(rows, columns);
        let mut rejected: Vec<PieceType> = Vec::with_capacity(common.len());

        for position in grid.positions() {
            rejected.clear();
            let mut candidate = random_type(common, &[], rng).unwrap_or(EMPTY);

            while grid.completes_run(position, candidate) {
                rejected.push(candidate);
                match random_type(common, &rejected, rng) {
                    Some(next) => candidate = next,
                    None => {
                        candidate = random_type(common, &[], rng).unwrap_or(EMPTY);
                        break;
                    }
                }
            }

            grid.set(position, candidate);
        }

        grid
    }

    /// Would placing `ty` at `position` form a run of three with the cells already
    /// placed to the left or above?
    fn completes_run(&self, position: Position, ty: PieceType) -> bool {
        let left =
            self.get(position.offset(0, -1)) == Some(ty) && self.get(position.offset(0, -2)) == Some(ty);
        let above =
            self.get(position.offset(-1, 0)) == Some(ty) && self.get(position.offset(-2, 0)) == Some(ty);
        left || above
    }

    /// Calculate flat index from a position
    #[inline(always)]
    fn index(&self, position: Position) -> Option<usize> {
        if !self.is_valid_position(position) {
            return None;
        }
        Some(position.row as usize * self.columns + position.column as usize)
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn columns(&self) -> usize {
        self.columns
    }

    /// Check if position lies within the grid
    pub fn is_valid_position(&self, position: Position) -> bool {
        position.row >= 0
            && position.column >= 0
            && (position.row as usize) < self.rows
            && (position.column as usize) < self.columns
    }

    /// Get the type at a position.
    /// Returns None if out of bounds
    pub fn get(&self, position: Position) -> Option<PieceType> {
        self.index(position).map(|idx| self.cells[idx])
    }

    /// Set the type at a position.
    /// Returns false if out of bounds
    pub fn set(&mut self, position: Position, ty: PieceType) -> bool {
        match self.index(position) {
            Some(idx) => {
                self.cells[idx] = ty;
                true
            }
            None => false,
        }
    }

    /// Swap the types of two positions.
    /// Returns false (and changes nothing) if either is out of bounds
    pub fn swap(&mut self, a: Position, b: Position) -> bool {
        match (self.index(a), self.index(b)) {
            (Some(ia), Some(ib)) => {
                self.cells.swap(ia, ib);
                true
            }
            _ => false,
        }
    }

    /// All positions in row-major order
    pub fn positions(&self) -> impl Iterator<Item = Position> {
        let columns = self.columns;
        (0..self.rows * columns)
            .map(move |idx| Position::new((idx / columns) as i32, (idx % columns) as i32))
    }

    /// All (position, type) pairs in row-major order
    pub fn iter(&self) -> impl Iterator<Item = (Position, PieceType)> + '_ {
        self.positions().zip(self.cells.iter().copied())
    }

    /// Positions holding [`EMPTY`], row-major
    pub fn empty_positions(&self) -> Vec<Position> {
        self.iter()
            .filter(|&(_, ty)| ty == EMPTY)
            .map(|(position, _)| position)
            .collect()
    }

    /// Number of non-empty cells
    pub fn occupied_count(&self) -> usize {
        self.cells.iter().filter(|&&ty| ty != EMPTY).count()
    }

    /// Get a reference to the internal cells, row-major
    pub fn cells(&self) -> &[PieceType] {
        &self.cells
    }

    /// Convert to row vectors for testing/display
    pub fn to_rows(&self) -> Vec<Vec<PieceType>> {
        self.cells
            .chunks(self.columns.max(1))
            .take(self.rows)
            .map(<[PieceType]>::to_vec)
            .collect()
    }
}

/// Two-digit cells separated by `|`, one line per row.
impl fmt::Display for Grid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (r, row) in self.to_rows().iter().enumerate() {
            if r > 0 {
                writeln!(f)?;
            }
            for (c, ty) in row.iter().enumerate() {
                if c > 0 {
                    write!(f, "|")?;
                }
                write!(f, "{:02}", ty)?;
            }
        }
        Ok(())
    }
}

/// Draw a uniformly random type from `types`, skipping anything in `exclude`.
///
/// Returns None when no candidate remains.
pub fn random_type<R: Rng + ?Sized>(
    types: &[PieceType],
    exclude: &[PieceType],
    rng: &mut R,
) -> Option<PieceType> {
    let available = types.iter().filter(|ty| !exclude.contains(ty)).count();
    if available == 0 {
        return None;
    }
    let pick = rng.gen_range(0..available);
    types
        .iter()
        .copied()
        .filter(|ty| !exclude.contains(ty))
        .nth(pick)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_grid_index_calculation() {
        let grid = Grid::new(3, 4);
        assert_eq!(grid.index(Position::new(0, 0)), Some(0));
        assert_eq!(grid.index(Position::new(0, 3)), Some(3));
        assert_eq!(grid.index(Position::new(1, 0)), Some(4));
        assert_eq!(grid.index(Position::new(2, 3)), Some(11));
        assert_eq!(grid.index(Position::new(-1, 0)), None);
        assert_eq!(grid.index(Position::new(0, 4)), None);
        assert_eq!(grid.index(Position::new(3, 0)), None);
    }

    #[test]
    fn test_out_of_bounds_is_inert() {
        let mut grid = Grid::from_rows(&[vec![1, 2], vec![3, 4]]);
        let before = grid.clone();

        assert_eq!(grid.get(Position::new(2, 0)), None);
        assert!(!grid.set(Position::new(0, -1), 5));
        assert!(!grid.swap(Position::new(0, 0), Position::new(5, 5)));
        assert_eq!(grid, before);
    }

    #[test]
    fn test_swap_and_clone_are_independent() {
        let mut grid = Grid::from_rows(&[vec![1, 2], vec![3, 4]]);
        let scratch = grid.clone();

        assert!(grid.swap(Position::new(0, 0), Position::new(1, 1)));
        assert_eq!(grid.to_rows(), vec![vec![4, 2], vec![3, 1]]);
        assert_eq!(scratch.to_rows(), vec![vec![1, 2], vec![3, 4]]);
    }

    #[test]
    fn test_iter_is_row_major() {
        let grid = Grid::from_rows(&[vec![1, 2, 3], vec![4, 5, 6]]);
        let types: Vec<PieceType> = grid.iter().map(|(_, ty)| ty).collect();
        assert_eq!(types, vec![1, 2, 3, 4, 5, 6]);

        let (last, _) = grid.iter().last().unwrap();
        assert_eq!(last, Position::new(1, 2));
    }

    #[test]
    fn test_display_matches_debug_dump() {
        let grid = Grid::from_rows(&[vec![1, 12], vec![0, 3]]);
        assert_eq!(grid.to_string(), "01|12\n00|03");
    }

    #[test]
    fn test_random_type_respects_exclusions() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..50 {
            let ty = random_type(&[1, 2, 3], &[1, 3], &mut rng);
            assert_eq!(ty, Some(2));
        }
        assert_eq!(random_type(&[1, 2], &[1, 2], &mut rng), None);
        assert_eq!(random_type(&[], &[], &mut rng), None);
    }

    #[test]
    fn test_random_grid_uses_only_common_types() {
        let mut rng = StdRng::seed_from_u64(99);
        let common = [5, 6, 7, 8];
        let grid = Grid::random(8, 6, &common, &mut rng);

        assert_eq!(grid.rows(), 8);
        assert_eq!(grid.columns(), 6);
        assert!(grid.iter().all(|(_, ty)| common.contains(&ty)));
    }

    #[test]
    fn test_random_grid_single_type_falls_back() {
        let mut rng = StdRng::seed_from_u64(1);
        let grid = Grid::random(3, 3, &[4], &mut rng);
        assert!(grid.iter().all(|(_, ty)| ty == 4));
    }
}
