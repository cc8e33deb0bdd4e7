//! Presenter contract - the visual acknowledgment side of every piece operation
//!
//! The engine never animates anything itself. For every swap, fall, pop and spawn it asks
//! the presenter for an [`Ack`] and waits for it before moving on. Acks dispatched in one
//! step are awaited together through an [`AckSet`].

use std::future::Future;
use std::pin::Pin;

use anyhow::anyhow;
use tokio::task::JoinSet;

use crate::types::{PieceType, Position, ViewPoint};

/// Completion of one piece animation.
pub type Ack = Pin<Box<dyn Future<Output = anyhow::Result<()>> + Send + 'static>>;

/// An ack that is already complete.
pub fn ready_ack() -> Ack {
    Box::pin(async { Ok(()) })
}

/// Stable identity of a piece for the lifetime of its sprite
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PieceId(pub u32);

/// A piece on the board as the presenter sees it
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Piece {
    pub id: PieceId,
    pub piece_type: PieceType,
    /// Current grid position
    pub position: Position,
    /// Where the piece is placed in view space when created
    pub view: ViewPoint,
}

/// Presentation collaborator
pub trait Presenter: Send + Sync {
    /// A piece entered the board at `piece.view`.
    fn piece_created(&self, _piece: &Piece) {}

    /// A piece left the board and its sprite may be released.
    fn piece_disposed(&self, _piece: &Piece) {}

    fn animate_swap_to(&self, piece: &Piece, to: ViewPoint) -> Ack;

    fn animate_fall_to(&self, piece: &Piece, to: ViewPoint) -> Ack;

    fn animate_pop(&self, piece: &Piece) -> Ack;

    fn animate_spawn(&self, piece: &Piece) -> Ack;
}

/// Acknowledges every operation immediately (headless play, tests)
#[derive(Debug, Clone, Copy, Default)]
pub struct InstantPresenter;

impl Presenter for InstantPresenter {
    fn animate_swap_to(&self, _piece: &Piece, _to: ViewPoint) -> Ack {
        ready_ack()
    }

    fn animate_fall_to(&self, _piece: &Piece, _to: ViewPoint) -> Ack {
        ready_ack()
    }

    fn animate_pop(&self, _piece: &Piece) -> Ack {
        ready_ack()
    }

    fn animate_spawn(&self, _piece: &Piece) -> Ack {
        ready_ack()
    }
}

/// Barrier over the acks of one step.
///
/// Every ack runs as its own task, so they progress together. [`AckSet::join`] waits for
/// all of them and then reports the first failure. Dropping the set aborts whatever is
/// still outstanding.
#[derive(Default)]
pub struct AckSet {
    tasks: JoinSet<anyhow::Result<()>>,
}

impl AckSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, ack: Ack) {
        self.tasks.spawn(ack);
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub async fn join(mut self) -> anyhow::Result<()> {
        let mut first_error: Option<anyhow::Error> = None;

        while let Some(joined) = self.tasks.join_next().await {
            let outcome = match joined {
                Ok(result) => result,
                Err(e) => Err(anyhow!("animation task failed: {}", e)),
            };
            if let Err(e) = outcome {
                first_error.get_or_insert(e);
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}
