//! Grid-to-view coordinate mapping

use crate::types::{Position, ViewPoint};

/// Maps grid positions to view-space coordinates.
///
/// The engine only needs this to tell presenters where pieces should end up; it never
/// reads view coordinates back.
pub trait GridMapping: Send + Sync {
    fn to_view(&self, position: Position) -> ViewPoint;

    /// Start point for a refilled piece: above the grid, `stack_index` cells up from the
    /// top edge in its column (1 = first piece to drop into that column).
    fn drop_in_origin(&self, position: Position, stack_index: usize) -> ViewPoint;

    /// `(rows, columns)` the mapping was built for, if it is tied to one grid size
    fn dimensions(&self) -> Option<(usize, usize)> {
        None
    }
}

/// Grid centred on the view origin
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Layout {
    pub rows: usize,
    pub columns: usize,
    pub tile_size: f32,
}

impl Layout {
    pub fn new(rows: usize, columns: usize, tile_size: f32) -> Self {
        Self {
            rows,
            columns,
            tile_size,
        }
    }

    pub fn width(&self) -> f32 {
        self.columns as f32 * self.tile_size
    }

    pub fn height(&self) -> f32 {
        self.rows as f32 * self.tile_size
    }
}

impl GridMapping for Layout {
    fn to_view(&self, position: Position) -> ViewPoint {
        let offset_x = (self.columns as f32 - 1.0) * self.tile_size / 2.0;
        let offset_y = (self.rows as f32 - 1.0) * self.tile_size / 2.0;
        ViewPoint::new(
            position.column as f32 * self.tile_size - offset_x,
            position.row as f32 * self.tile_size - offset_y,
        )
    }

    fn drop_in_origin(&self, position: Position, stack_index: usize) -> ViewPoint {
        let target = self.to_view(position);
        ViewPoint::new(
            target.x,
            -self.height() * 0.5 - stack_index as f32 * self.tile_size,
        )
    }

    fn dimensions(&self) -> Option<(usize, usize)> {
        Some((self.rows, self.columns))
    }
}
