//! Cascade engine - asynchronous resolution of a match-3 board
//!
//! This crate drives the rules in `match3-core` against a presenter that acknowledges
//! every piece operation. Grid mutation is always synchronous; only waiting on
//! acknowledgments is asynchronous, so the board never observes a half-applied step.
//!
//! # Module Structure
//!
//! - [`presenter`]: presenter contract, acks, and the ack barrier
//! - [`board`]: grid plus pieces, pop/spawn/gravity/refill/swap operations
//! - [`special`]: per-special shape handling and detonation targets
//! - [`scheduler`]: round steps, stop/pause control
//! - [`session`]: the facade collaborators drive
//! - [`events`]: engine events, subscriber fan-out, JSON-lines event log
//! - [`log`]: stderr diagnostics behind `MATCH3_LOG`
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use match3_engine::{core::Config, types::Position, InstantPresenter, Match3Session};
//!
//! # async fn play() -> anyhow::Result<()> {
//! let mut session = Match3Session::setup(Config::default(), Arc::new(InstantPresenter))?;
//! session.start_playing();
//! session
//!     .action_move(Position::new(3, 3), Position::new(3, 4))
//!     .await?;
//! # Ok(())
//! # }
//! ```

pub mod board;
pub mod events;
pub mod log;
pub mod presenter;
pub mod scheduler;
pub mod session;
pub mod special;

pub use match3_core as core;
pub use match3_types as types;

pub use board::Board;
pub use events::{EventBus, EventLog, Match3Event, PopEvent};
pub use presenter::{ready_ack, Ack, AckSet, InstantPresenter, Piece, PieceId, Presenter};
pub use scheduler::{CascadeControl, CascadeScheduler, CascadeState, CascadeSummary, RoundStep};
pub use session::{ActionOutcome, Match3Session, EVENT_LOG_ENV};
pub use special::SpecialHandler;
