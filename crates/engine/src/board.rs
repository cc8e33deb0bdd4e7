//! Board module - the session-owned context every engine step works on
//!
//! The board owns the grid together with the pieces that mirror it for the presenter.
//! The invariant between the two: every non-empty cell has exactly one piece at that
//! position, and no piece sits on an empty cell once an operation has completed.
//!
//! All grid mutation happens synchronously before an operation awaits its acks, so an
//! interrupted operation leaves the grid exactly as far as it got.

use std::sync::Arc;

use rand::rngs::StdRng;

use crate::core::{self, is_valid_swap, Grid, GridMapping, Movement, Stats, TypeRegistry};
use crate::events::{EventBus, Match3Event, PopEvent};
use crate::match3_log;
use crate::presenter::{AckSet, Piece, PieceId, Presenter};
use crate::special::SpecialHandler;
use crate::types::{PieceType, Position, ViewPoint, EMPTY};

pub struct Board {
    grid: Grid,
    registry: TypeRegistry,
    handlers: Vec<SpecialHandler>,
    mapping: Arc<dyn GridMapping>,
    presenter: Arc<dyn Presenter>,
    pieces: Vec<Piece>,
    next_piece_id: u32,
    rng: StdRng,
    /// Round number of the cascade currently running (0 outside a cascade)
    combo: u32,
    events: EventBus,
    stats: Stats,
}

impl Board {
    /// Create a board over an existing grid and create a piece for every occupied cell.
    ///
    /// One special handler is registered per special type in the registry, in registry
    /// order.
    pub fn new(
        grid: Grid,
        registry: TypeRegistry,
        mapping: Arc<dyn GridMapping>,
        presenter: Arc<dyn Presenter>,
        rng: StdRng,
    ) -> Self {
        debug_assert!(grid
            .iter()
            .all(|(_, ty)| ty == EMPTY || registry.entry(ty).is_some()));
        debug_assert!(
            mapping
                .dimensions()
                .map_or(true, |dims| dims == (grid.rows(), grid.columns())),
            "mapping dimensions {:?} do not match a {}x{} grid",
            mapping.dimensions(),
            grid.rows(),
            grid.columns()
        );

        let handlers = registry
            .specials()
            .iter()
            .map(|&(kind, piece_type)| SpecialHandler::new(kind, piece_type))
            .collect();

        let mut board = Self {
            grid,
            registry,
            handlers,
            mapping,
            presenter,
            pieces: Vec::new(),
            next_piece_id: 0,
            rng,
            combo: 0,
            events: EventBus::new(),
            stats: Stats::default(),
        };
        board.create_all_pieces();
        board
    }

    /// Create a board with a random, match-free grid of the registry's common types
    pub fn random(
        rows: usize,
        columns: usize,
        registry: TypeRegistry,
        mapping: Arc<dyn GridMapping>,
        presenter: Arc<dyn Presenter>,
        mut rng: StdRng,
    ) -> Self {
        let grid = Grid::random(rows, columns, registry.common_types(), &mut rng);
        Self::new(grid, registry, mapping, presenter, rng)
    }

    fn create_all_pieces(&mut self) {
        let occupied: Vec<(Position, PieceType)> =
            self.grid.iter().filter(|&(_, ty)| ty != EMPTY).collect();
        for (position, ty) in occupied {
            let view = self.mapping.to_view(position);
            self.create_piece(position, ty, view);
        }
    }

    /// Throw away every piece and start over on `grid`
    pub fn reset(&mut self, grid: Grid) {
        for piece in self.pieces.drain(..) {
            self.presenter.piece_disposed(&piece);
        }
        self.grid = grid;
        self.combo = 0;
        self.stats.reset();
        self.create_all_pieces();
    }

    /// Replace the grid with a fresh random one
    pub fn reset_random(&mut self) {
        let grid = Grid::random(
            self.grid.rows(),
            self.grid.columns(),
            self.registry.common_types(),
            &mut self.rng,
        );
        self.reset(grid);
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn registry(&self) -> &TypeRegistry {
        &self.registry
    }

    pub fn handlers(&self) -> &[SpecialHandler] {
        &self.handlers
    }

    pub fn pieces(&self) -> &[Piece] {
        &self.pieces
    }

    pub fn stats(&self) -> &Stats {
        &self.stats
    }

    pub fn events_mut(&mut self) -> &mut EventBus {
        &mut self.events
    }

    pub fn combo(&self) -> u32 {
        self.combo
    }

    pub(crate) fn set_combo(&mut self, combo: u32) {
        self.combo = combo;
    }

    pub fn view_position(&self, position: Position) -> ViewPoint {
        self.mapping.to_view(position)
    }

    pub fn piece_at(&self, position: Position) -> Option<&Piece> {
        self.pieces.iter().find(|p| p.position == position)
    }

    fn piece_index(&self, position: Position) -> Option<usize> {
        self.pieces.iter().position(|p| p.position == position)
    }

    pub fn is_special(&self, position: Position) -> bool {
        self.grid
            .get(position)
            .is_some_and(|ty| self.registry.is_special(ty))
    }

    /// Publish an event and fold it into the stats tally
    pub fn emit(&mut self, event: Match3Event) {
        match &event {
            Match3Event::MatchFound { matches, combo } => {
                self.stats.register_matches(matches, *combo)
            }
            Match3Event::PiecePopped(pop) => {
                self.stats.register_pop(pop.is_special, pop.caused_by_special)
            }
            Match3Event::RoundCycleCompleted => self.stats.register_cascade(),
            _ => {}
        }
        self.events.emit(event);
    }

    fn create_piece(&mut self, position: Position, piece_type: PieceType, view: ViewPoint) -> Piece {
        let piece = Piece {
            id: PieceId(self.next_piece_id),
            piece_type,
            position,
            view,
        };
        self.next_piece_id = self.next_piece_id.wrapping_add(1);
        self.pieces.push(piece);
        self.presenter.piece_created(&piece);
        piece
    }

    fn dispose_piece(&mut self, index: usize) {
        let piece = self.pieces.swap_remove(index);
        self.presenter.piece_disposed(&piece);
    }

    /// Pop one piece; a special detonates as usual.
    pub async fn pop_piece(&mut self, position: Position) -> anyhow::Result<()> {
        self.pop_pieces(&[position], false).await
    }

    /// Remove the pieces at `positions` and resolve every detonation they cause.
    ///
    /// Works in waves. Each wave empties its cells, emits one pop event per piece and
    /// waits for all pop animations. The specials popped in that wave then compute
    /// their targets against the current grid, and those targets form the next wave,
    /// tagged as caused by a special. Positions that are out of bounds, empty, or have
    /// no piece are skipped. A special is consumed when it pops, so the chain ends once
    /// a wave pops no special.
    pub async fn pop_pieces(
        &mut self,
        positions: &[Position],
        caused_by_special: bool,
    ) -> anyhow::Result<()> {
        let mut wave: Vec<Position> = dedup_positions(positions.iter().copied());
        let mut caused_by_special = caused_by_special;
        let mut depth = 0u32;

        while !wave.is_empty() {
            let mut acks = AckSet::new();
            let mut popped = PendingDisposal::new(Arc::clone(&self.presenter));
            let mut detonations: Vec<(SpecialHandler, Position)> = Vec::new();

            for position in wave {
                let Some(ty) = self.grid.get(position).filter(|&ty| ty != EMPTY) else {
                    continue;
                };
                let Some(index) = self.piece_index(position) else {
                    continue;
                };

                self.grid.set(position, EMPTY);
                let piece = self.pieces.swap_remove(index);
                let handler = self.handler_for(ty);

                self.emit(Match3Event::PiecePopped(PopEvent {
                    piece_type: ty,
                    position,
                    combo: self.combo,
                    is_special: handler.is_some(),
                    caused_by_special,
                }));

                acks.push(self.presenter.animate_pop(&piece));
                popped.push(piece);
                if let Some(handler) = handler {
                    detonations.push((handler, position));
                }
            }

            if let Err(e) = acks.join().await {
                match3_log!(
                    "Pop wave of {} piece(s) failed, skipping {} detonation(s): {}",
                    popped.pieces.len(),
                    detonations.len(),
                    e
                );
                return Err(e);
            }
            drop(popped);

            if !detonations.is_empty() {
                depth += 1;
                match3_log!("Detonating {} special(s), chain depth {}", detonations.len(), depth);
            }

            let targets = detonations
                .iter()
                .flat_map(|(handler, position)| {
                    handler.trigger_targets(&self.grid, &self.registry, *position)
                })
                .collect::<Vec<_>>();
            wave = dedup_positions(targets);
            caused_by_special = true;
        }

        Ok(())
    }

    fn handler_for(&self, piece_type: PieceType) -> Option<SpecialHandler> {
        self.handlers
            .iter()
            .find(|h| h.piece_type == piece_type)
            .copied()
    }

    /// Put `piece_type` at `position`, replacing whatever piece was there.
    ///
    /// Spawning [`EMPTY`] just clears the cell.
    pub async fn spawn_piece(&mut self, position: Position, piece_type: PieceType) -> anyhow::Result<()> {
        if !self.grid.is_valid_position(position) {
            return Ok(());
        }
        if let Some(index) = self.piece_index(position) {
            self.dispose_piece(index);
        }

        self.grid.set(position, piece_type);
        if piece_type == EMPTY {
            return Ok(());
        }

        let view = self.mapping.to_view(position);
        let piece = self.create_piece(position, piece_type, view);
        self.presenter.animate_spawn(&piece).await
    }

    /// Compact columns and animate every piece that fell
    pub async fn apply_gravity(&mut self) -> anyhow::Result<Vec<Movement>> {
        let movements = core::apply_gravity(&mut self.grid);

        // Resolve pieces before moving any of them.
        let indices: Vec<Option<usize>> =
            movements.iter().map(|m| self.piece_index(m.from)).collect();

        let mut acks = AckSet::new();
        for (movement, index) in movements.iter().zip(indices) {
            let Some(index) = index else {
                continue;
            };
            self.pieces[index].position = movement.to;
            let target = self.mapping.to_view(movement.to);
            acks.push(self.presenter.animate_fall_to(&self.pieces[index], target));
        }
        acks.join().await?;

        Ok(movements)
    }

    /// Fill every empty cell and drop the new pieces in from above the grid.
    ///
    /// Pieces of the same column stack upward in the order refill reports them, so the
    /// bottom-most new piece starts closest to the grid.
    pub async fn refill(&mut self) -> anyhow::Result<Vec<Position>> {
        let filled = core::refill(&mut self.grid, self.registry.common_types(), &mut self.rng);
        let mut per_column = vec![0usize; self.grid.columns()];

        let mut acks = AckSet::new();
        for &position in &filled {
            let Some(ty) = self.grid.get(position).filter(|&ty| ty != EMPTY) else {
                continue;
            };
            let column = position.column as usize;
            per_column[column] += 1;

            let origin = self.mapping.drop_in_origin(position, per_column[column]);
            let target = self.mapping.to_view(position);
            let piece = self.create_piece(position, ty, origin);
            acks.push(self.presenter.animate_fall_to(&piece, target));
        }
        acks.join().await?;

        Ok(filled)
    }

    /// Try to swap two pieces.
    ///
    /// Emits the attempt, animates both pieces to each other's cell and, for an illegal
    /// swap, back again; the grid only changes for a legal swap. After a legal swap a
    /// special at `from` (or else at `to`) detonates straight away. Returns whether the
    /// swap was legal. Positions without a piece make this a no-op returning false.
    pub async fn swap_pieces(
        &mut self,
        from: Position,
        to: Position,
        free_moves: bool,
    ) -> anyhow::Result<bool> {
        let (Some(index_a), Some(index_b)) = (self.piece_index(from), self.piece_index(to)) else {
            return Ok(false);
        };

        let valid = is_valid_swap(&self.grid, &self.registry, from, to, free_moves);
        match3_log!("Swap {} -> {} (valid: {})", from, to, valid);
        self.emit(Match3Event::SwapAttempted { from, to, valid });

        let view_from = self.mapping.to_view(from);
        let view_to = self.mapping.to_view(to);

        if valid {
            self.grid.swap(from, to);
            self.pieces[index_a].position = to;
            self.pieces[index_b].position = from;
        }

        let mut acks = AckSet::new();
        acks.push(self.presenter.animate_swap_to(&self.pieces[index_a], view_to));
        acks.push(self.presenter.animate_swap_to(&self.pieces[index_b], view_from));
        acks.join().await?;

        if !valid {
            let mut acks = AckSet::new();
            acks.push(self.presenter.animate_swap_to(&self.pieces[index_a], view_from));
            acks.push(self.presenter.animate_swap_to(&self.pieces[index_b], view_to));
            acks.join().await?;
        } else if self.is_special(from) {
            self.pop_piece(from).await?;
        } else if self.is_special(to) {
            self.pop_piece(to).await?;
        }

        Ok(valid)
    }
}

/// Pieces already taken off the board whose sprites still await release.
///
/// The presenter is told on drop, so a wave cut short by a failed ack or a cancelled
/// step still releases every piece it removed.
struct PendingDisposal {
    presenter: Arc<dyn Presenter>,
    pieces: Vec<Piece>,
}

impl PendingDisposal {
    fn new(presenter: Arc<dyn Presenter>) -> Self {
        Self {
            presenter,
            pieces: Vec::new(),
        }
    }

    fn push(&mut self, piece: Piece) {
        self.pieces.push(piece);
    }
}

impl Drop for PendingDisposal {
    fn drop(&mut self) {
        for piece in &self.pieces {
            self.presenter.piece_disposed(piece);
        }
    }
}

fn dedup_positions(positions: impl IntoIterator<Item = Position>) -> Vec<Position> {
    let mut unique: Vec<Position> = Vec::new();
    for position in positions {
        if !unique.contains(&position) {
            unique.push(position);
        }
    }
    unique
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Layout;
    use crate::presenter::InstantPresenter;
    use crate::types::Mode;
    use rand::SeedableRng;

    fn board(rows: &[Vec<PieceType>]) -> Board {
        let grid = Grid::from_rows(rows);
        let layout = Layout::new(grid.rows(), grid.columns(), 10.0);
        Board::new(
            grid,
            TypeRegistry::for_mode(Mode::Normal),
            Arc::new(layout),
            Arc::new(InstantPresenter),
            StdRng::seed_from_u64(5),
        )
    }

    fn p(row: i32, column: i32) -> Position {
        Position::new(row, column)
    }

    fn assert_pieces_mirror_grid(board: &Board) {
        assert_eq!(board.pieces().len(), board.grid().occupied_count());
        for (position, ty) in board.grid().iter() {
            match board.piece_at(position) {
                Some(piece) => assert_eq!(piece.piece_type, ty),
                None => assert_eq!(ty, EMPTY),
            }
        }
    }

    #[test]
    fn new_board_creates_one_piece_per_cell() {
        let board = board(&[vec![5, 6, 0], vec![7, 8, 9]]);
        assert_eq!(board.pieces().len(), 5);
        assert_pieces_mirror_grid(&board);
        assert_eq!(board.handlers().len(), 4);
    }

    #[tokio::test]
    async fn pop_empties_cells_and_ignores_missing_pieces() {
        let mut board = board(&[vec![5, 6, 0], vec![7, 8, 9]]);
        let mut rx = board.events_mut().subscribe();

        board
            .pop_pieces(&[p(0, 0), p(0, 0), p(0, 2), p(9, 9)], false)
            .await
            .unwrap();

        assert_eq!(board.grid().get(p(0, 0)), Some(EMPTY));
        assert_pieces_mirror_grid(&board);

        let event = rx.try_recv().unwrap();
        assert!(matches!(
            event,
            Match3Event::PiecePopped(PopEvent { piece_type: 5, caused_by_special: false, .. })
        ));
        assert!(rx.try_recv().is_err());
        assert_eq!(board.stats().pops, 1);
    }

    #[tokio::test]
    async fn popping_a_special_chains_into_another() {
        // Row special (2) at (0,0); its sweep reaches the Column special (3) at (0,2),
        // which clears column 2.
        let mut board = board(&[vec![2, 5, 3], vec![6, 7, 8], vec![7, 8, 6]]);
        let mut rx = board.events_mut().subscribe();

        board.pop_piece(p(0, 0)).await.unwrap();

        let grid = board.grid();
        for column in 0..3 {
            assert_eq!(grid.get(p(0, column)), Some(EMPTY));
        }
        assert_eq!(grid.get(p(1, 2)), Some(EMPTY));
        assert_eq!(grid.get(p(2, 2)), Some(EMPTY));
        assert_eq!(grid.get(p(1, 0)), Some(6));
        assert_pieces_mirror_grid(&board);

        let mut pops = Vec::new();
        while let Ok(Match3Event::PiecePopped(pop)) = rx.try_recv() {
            pops.push(pop);
        }
        assert_eq!(pops.len(), 5);
        assert!(!pops[0].caused_by_special);
        assert!(pops[0].is_special);
        assert!(pops[1..].iter().all(|pop| pop.caused_by_special));
        assert_eq!(board.stats().specials, 2);
    }

    #[tokio::test]
    async fn spawn_replaces_existing_piece() {
        let mut board = board(&[vec![5, 6], vec![7, 8]]);

        board.spawn_piece(p(0, 1), 1).await.unwrap();
        assert_eq!(board.grid().get(p(0, 1)), Some(1));
        assert_eq!(board.piece_at(p(0, 1)).unwrap().piece_type, 1);
        assert_pieces_mirror_grid(&board);

        board.spawn_piece(p(0, 1), EMPTY).await.unwrap();
        assert!(board.piece_at(p(0, 1)).is_none());
        assert_pieces_mirror_grid(&board);

        board.spawn_piece(p(4, 4), 1).await.unwrap();
        assert_eq!(board.pieces().len(), 3);
    }

    #[tokio::test]
    async fn gravity_then_refill_restores_a_full_board() {
        let mut board = board(&[vec![5, 6, 7], vec![0, 0, 8], vec![9, 0, 5]]);

        let moved = board.apply_gravity().await.unwrap();
        assert_eq!(moved.len(), 2);
        assert_eq!(board.grid().to_rows(), vec![vec![0, 0, 7], vec![5, 0, 8], vec![9, 6, 5]]);
        assert_pieces_mirror_grid(&board);

        let filled = board.refill().await.unwrap();
        assert_eq!(filled, vec![p(1, 1), p(0, 1), p(0, 0)]);
        assert!(board.grid().empty_positions().is_empty());
        assert_pieces_mirror_grid(&board);

        // Same column: the second piece starts one tile higher.
        let lower = board.piece_at(p(1, 1)).unwrap().view;
        let upper = board.piece_at(p(0, 1)).unwrap().view;
        assert!(upper.y < lower.y);
    }

    #[tokio::test]
    async fn invalid_swap_leaves_grid_alone() {
        let mut board = board(&[vec![5, 6, 7], vec![8, 9, 5], vec![6, 7, 8]]);
        let before = board.grid().clone();
        let mut rx = board.events_mut().subscribe();

        let valid = board.swap_pieces(p(0, 0), p(0, 1), false).await.unwrap();

        assert!(!valid);
        assert_eq!(board.grid(), &before);
        assert_pieces_mirror_grid(&board);
        assert_eq!(
            rx.try_recv().unwrap(),
            Match3Event::SwapAttempted { from: p(0, 0), to: p(0, 1), valid: false }
        );
    }

    #[tokio::test]
    async fn swapping_a_special_detonates_it() {
        // Column special (3) swapped down into row 1 clears column 0.
        let mut board = board(&[vec![3, 6, 7], vec![8, 9, 5], vec![6, 7, 8]]);

        let valid = board.swap_pieces(p(0, 0), p(1, 0), false).await.unwrap();

        assert!(valid);
        for row in 0..3 {
            assert_eq!(board.grid().get(p(row, 0)), Some(EMPTY));
        }
        assert_pieces_mirror_grid(&board);
    }

    /// Counts live sprites and fails every pop animation
    #[derive(Default)]
    struct FailingPopPresenter {
        live: std::sync::atomic::AtomicIsize,
    }

    impl FailingPopPresenter {
        fn live(&self) -> isize {
            self.live.load(std::sync::atomic::Ordering::SeqCst)
        }
    }

    impl Presenter for FailingPopPresenter {
        fn piece_created(&self, _piece: &Piece) {
            self.live.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        }

        fn piece_disposed(&self, _piece: &Piece) {
            self.live.fetch_sub(1, std::sync::atomic::Ordering::SeqCst);
        }

        fn animate_swap_to(&self, _piece: &Piece, _to: ViewPoint) -> crate::presenter::Ack {
            crate::presenter::ready_ack()
        }

        fn animate_fall_to(&self, _piece: &Piece, _to: ViewPoint) -> crate::presenter::Ack {
            crate::presenter::ready_ack()
        }

        fn animate_pop(&self, _piece: &Piece) -> crate::presenter::Ack {
            Box::pin(async { Err(anyhow::anyhow!("pop animation lost")) })
        }

        fn animate_spawn(&self, _piece: &Piece) -> crate::presenter::Ack {
            crate::presenter::ready_ack()
        }
    }

    #[tokio::test]
    async fn failed_pop_ack_still_disposes_removed_pieces() {
        // Row special at (0,0): the failed wave must not go on to detonate it.
        let grid = Grid::from_rows(&[vec![2, 5, 6], vec![6, 7, 8], vec![7, 8, 6]]);
        let layout = Layout::new(3, 3, 10.0);
        let presenter = Arc::new(FailingPopPresenter::default());
        let mut board = Board::new(
            grid,
            TypeRegistry::for_mode(Mode::Normal),
            Arc::new(layout),
            presenter.clone(),
            StdRng::seed_from_u64(5),
        );

        let err = board.pop_piece(p(0, 0)).await.unwrap_err();

        assert!(err.to_string().contains("pop animation lost"));
        assert_eq!(board.grid().get(p(0, 0)), Some(EMPTY));
        assert_eq!(board.grid().get(p(0, 1)), Some(5));
        assert_pieces_mirror_grid(&board);
        assert_eq!(presenter.live(), board.pieces().len() as isize);
    }

    #[test]
    #[should_panic(expected = "do not match")]
    #[cfg(debug_assertions)]
    fn mismatched_layout_is_rejected() {
        let grid = Grid::from_rows(&[vec![5, 6], vec![7, 8]]);
        Board::new(
            grid,
            TypeRegistry::for_mode(Mode::Normal),
            Arc::new(Layout::new(3, 2, 10.0)),
            Arc::new(InstantPresenter),
            StdRng::seed_from_u64(5),
        );
    }
}
