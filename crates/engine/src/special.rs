//! Special handlers - one per special type registered for the mode
//!
//! A handler does two jobs. During a round it scans the current matches for the shape it
//! cares about, pops those matches and spawns its special in their place. When a piece of
//! its type pops, it names the cells the detonation clears; [`Board::pop_pieces`] does the
//! actual clearing.

use crate::board::Board;
use crate::core::{blast_overlaps, qualifying_matches, trigger_targets, Grid, Match, TypeRegistry};
use crate::match3_log;
use crate::types::{PieceType, Position, SpecialKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpecialHandler {
    pub kind: SpecialKind,
    /// Piece type this handler spawns and reacts to
    pub piece_type: PieceType,
}

impl SpecialHandler {
    pub fn new(kind: SpecialKind, piece_type: PieceType) -> Self {
        Self { kind, piece_type }
    }

    /// Consume the matches of this handler's shape and spawn the special.
    ///
    /// Row, Column and Colour handle each qualifying match on its own, last match first:
    /// pop it, then spawn at its middle cell. Blast pops every match that touches an
    /// overlap in one go and then spawns one special per overlap cell.
    pub async fn process(&self, board: &mut Board, matches: &[Match]) -> anyhow::Result<()> {
        match self.kind {
            SpecialKind::Blast => {
                let plan = blast_overlaps(matches);
                if plan.overlaps.is_empty() {
                    return Ok(());
                }

                let positions: Vec<Position> = plan
                    .consumed
                    .iter()
                    .flat_map(|&i| matches[i].positions.iter().copied())
                    .collect();
                match3_log!(
                    "{} consumes {} match(es), spawning {}",
                    self.kind.name(),
                    plan.consumed.len(),
                    plan.overlaps.len()
                );

                board.pop_pieces(&positions, false).await?;
                for &position in &plan.overlaps {
                    board.spawn_piece(position, self.piece_type).await?;
                }
            }
            SpecialKind::Row | SpecialKind::Column | SpecialKind::Colour => {
                for index in qualifying_matches(self.kind, matches) {
                    let m = &matches[index];
                    let Some(middle) = m.middle() else {
                        continue;
                    };
                    match3_log!("{} spawns at {}", self.kind.name(), middle);

                    board.pop_pieces(&m.positions, false).await?;
                    board.spawn_piece(middle, self.piece_type).await?;
                }
            }
        }

        Ok(())
    }

    /// Cells a detonation at `position` clears on the current grid
    pub fn trigger_targets(
        &self,
        grid: &Grid,
        registry: &TypeRegistry,
        position: Position,
    ) -> Vec<Position> {
        trigger_targets(self.kind, grid, registry, position)
    }
}
