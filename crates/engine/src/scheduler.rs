//! Cascade scheduler - runs resolution rounds until the board is stable
//!
//! A round is five steps in fixed order:
//!
//! 1. register matches (emit `MatchFound` with the round number as combo)
//! 2. let every special handler consume its shapes
//! 3. pop every match that is left
//! 4. apply gravity
//! 5. refill
//!
//! After the last step the grid is checked. With no match and no empty cell the cascade
//! is over; otherwise the next round starts.
//!
//! # Control
//!
//! [`CascadeControl`] is a cloneable handle shared with whoever needs to stop or pause a
//! running cascade. Pausing takes effect at the next step boundary. Stopping takes effect
//! at the next step boundary or while a step is waiting on acks, whichever comes first; a
//! step cut short leaves the grid exactly as far as it got.

use std::sync::Arc;

use tokio::sync::watch;

use crate::board::Board;
use crate::core::find_matches;
use crate::events::Match3Event;
use crate::match3_log;
use crate::special::SpecialHandler;
use crate::types::{Position, MAX_CASCADE_ROUNDS};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CascadeState {
    #[default]
    Idle,
    RoundRunning,
    Stopped,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
struct ControlFlags {
    state: CascadeState,
    paused: bool,
    stop_requested: bool,
}

/// Shared stop/pause handle for one scheduler
#[derive(Debug, Clone)]
pub struct CascadeControl {
    flags: Arc<watch::Sender<ControlFlags>>,
}

impl Default for CascadeControl {
    fn default() -> Self {
        Self::new()
    }
}

impl CascadeControl {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(ControlFlags::default());
        Self { flags: Arc::new(tx) }
    }

    pub fn state(&self) -> CascadeState {
        self.flags.borrow().state
    }

    pub fn is_running(&self) -> bool {
        self.state() == CascadeState::RoundRunning
    }

    pub fn is_paused(&self) -> bool {
        self.flags.borrow().paused
    }

    pub fn pause(&self) {
        self.flags.send_modify(|f| f.paused = true);
    }

    pub fn resume(&self) {
        self.flags.send_modify(|f| f.paused = false);
    }

    /// Ask the running cascade to stop. Returns false when nothing is running.
    pub fn stop(&self) -> bool {
        let mut requested = false;
        self.flags.send_modify(|f| {
            if f.state == CascadeState::RoundRunning {
                f.stop_requested = true;
                requested = true;
            }
        });
        requested
    }

    fn begin(&self) -> bool {
        let mut began = false;
        self.flags.send_modify(|f| {
            if f.state != CascadeState::RoundRunning {
                f.state = CascadeState::RoundRunning;
                f.stop_requested = false;
                began = true;
            }
        });
        began
    }

    fn finish(&self) {
        self.flags.send_modify(|f| {
            f.state = CascadeState::Stopped;
            f.stop_requested = false;
        });
    }

    fn reset(&self) {
        self.flags.send_replace(ControlFlags::default());
    }

    /// Resolves once a stop has been requested
    async fn stop_requested(&self) {
        let mut rx = self.flags.subscribe();
        let _ = rx.wait_for(|f| f.stop_requested).await;
    }

    /// Waits out a pause. Returns false when a stop was requested instead.
    async fn proceed(&self) -> bool {
        let mut rx = self.flags.subscribe();
        rx.wait_for(|f| !f.paused || f.stop_requested)
            .await
            .map(|f| !f.stop_requested)
            .unwrap_or(false)
    }
}

/// Marks the cascade stopped however the run ends, including a dropped future
struct RunGuard {
    control: CascadeControl,
}

impl Drop for RunGuard {
    fn drop(&mut self) {
        self.control.finish();
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoundStep {
    RegisterMatches,
    ProcessSpecials,
    PopMatches,
    ApplyGravity,
    Refill,
}

impl RoundStep {
    pub const ALL: [RoundStep; 5] = [
        RoundStep::RegisterMatches,
        RoundStep::ProcessSpecials,
        RoundStep::PopMatches,
        RoundStep::ApplyGravity,
        RoundStep::Refill,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RoundStep::RegisterMatches => "register_matches",
            RoundStep::ProcessSpecials => "process_specials",
            RoundStep::PopMatches => "pop_matches",
            RoundStep::ApplyGravity => "apply_gravity",
            RoundStep::Refill => "refill",
        }
    }
}

/// How a cascade run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CascadeSummary {
    /// Rounds started, including one cut short by a stop
    pub rounds: u32,
    /// Ended by a stop request rather than by reaching a stable board
    pub interrupted: bool,
    /// Ended by the round cap while the board still had matches or holes
    pub capped: bool,
}

enum RunEnd {
    Stable,
    Stopped,
    Capped,
}

#[derive(Debug)]
pub struct CascadeScheduler {
    control: CascadeControl,
    round: u32,
    max_rounds: u32,
}

impl Default for CascadeScheduler {
    fn default() -> Self {
        Self::with_control(CascadeControl::new())
    }
}

impl CascadeScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_control(control: CascadeControl) -> Self {
        Self {
            control,
            round: 0,
            max_rounds: MAX_CASCADE_ROUNDS,
        }
    }

    /// Cap the number of rounds one cascade may run
    pub fn with_max_rounds(mut self, max_rounds: u32) -> Self {
        self.max_rounds = max_rounds;
        self
    }

    pub fn control(&self) -> CascadeControl {
        self.control.clone()
    }

    pub fn state(&self) -> CascadeState {
        self.control.state()
    }

    pub fn is_running(&self) -> bool {
        self.control.is_running()
    }

    /// Round of the current or last cascade
    pub fn round(&self) -> u32 {
        self.round
    }

    pub fn reset(&mut self) {
        self.round = 0;
        self.control.reset();
    }

    /// Run rounds on `board` until it is stable or a stop is requested.
    ///
    /// Returns `None` without touching the board when play is not active or a cascade is
    /// already running. A failed ack ends the cascade with that error; the board still
    /// gets its `RoundCycleCompleted`.
    pub async fn run(
        &mut self,
        board: &mut Board,
        playable: bool,
    ) -> anyhow::Result<Option<CascadeSummary>> {
        if !playable || !self.control.begin() {
            return Ok(None);
        }
        let _guard = RunGuard {
            control: self.control.clone(),
        };

        self.round = 0;
        match3_log!("======= CASCADE START =======");
        board.emit(Match3Event::RoundCycleStarted);

        let outcome = self.run_rounds(board).await;

        board.set_combo(0);
        // Subscribers reacting to completion must already see Stopped.
        self.control.finish();
        board.emit(Match3Event::RoundCycleCompleted);

        match outcome {
            Ok(end) => {
                let interrupted = matches!(end, RunEnd::Stopped);
                let capped = matches!(end, RunEnd::Capped);
                match3_log!(
                    "======= CASCADE FINISH ======= rounds: {}, interrupted: {}, capped: {}",
                    self.round,
                    interrupted,
                    capped
                );
                match3_log!("Grid:\n{}", board.grid());
                Ok(Some(CascadeSummary {
                    rounds: self.round,
                    interrupted,
                    capped,
                }))
            }
            Err(e) => {
                match3_log!("Cascade failed in round {}: {}", self.round, e);
                Err(e)
            }
        }
    }

    async fn run_rounds(&mut self, board: &mut Board) -> anyhow::Result<RunEnd> {
        loop {
            if self.round >= self.max_rounds {
                match3_log!("Round cap {} reached, ending cascade", self.max_rounds);
                return Ok(RunEnd::Capped);
            }

            self.round += 1;
            board.set_combo(self.round);
            match3_log!("[ROUND {}] start", self.round);

            for step in RoundStep::ALL {
                if !self.control.proceed().await {
                    match3_log!("[ROUND {}] stopped before {}", self.round, step.as_str());
                    return Ok(RunEnd::Stopped);
                }

                match3_log!("[ROUND {}] {}", self.round, step.as_str());
                let control = self.control.clone();
                tokio::select! {
                    biased;
                    _ = control.stop_requested() => {
                        match3_log!("[ROUND {}] stopped during {}", self.round, step.as_str());
                        return Ok(RunEnd::Stopped);
                    }
                    result = run_step(step, board) => result?,
                }
            }

            match3_log!("[ROUND {}] finish", self.round);
            let matches = find_matches(board.grid());
            let empties = board.grid().empty_positions();
            match3_log!(
                "[ROUND {}] checkpoint: {} match(es), {} empty cell(s)",
                self.round,
                matches.len(),
                empties.len()
            );

            if matches.is_empty() && empties.is_empty() {
                return Ok(RunEnd::Stable);
            }
        }
    }
}

async fn run_step(step: RoundStep, board: &mut Board) -> anyhow::Result<()> {
    match step {
        RoundStep::RegisterMatches => {
            let matches = find_matches(board.grid());
            if !matches.is_empty() {
                let combo = board.combo();
                board.emit(Match3Event::MatchFound { matches, combo });
            }
        }
        RoundStep::ProcessSpecials => {
            let handlers: Vec<SpecialHandler> = board.handlers().to_vec();
            for handler in handlers {
                // Each handler sees what the previous one left behind.
                let matches = find_matches(board.grid());
                if matches.is_empty() {
                    break;
                }
                handler.process(board, &matches).await?;
            }
        }
        RoundStep::PopMatches => {
            let positions: Vec<Position> = find_matches(board.grid())
                .into_iter()
                .flat_map(|m| m.positions)
                .collect();
            board.pop_pieces(&positions, false).await?;
        }
        RoundStep::ApplyGravity => {
            let moved = board.apply_gravity().await?;
            match3_log!("Gravity moved {} piece(s)", moved.len());
        }
        RoundStep::Refill => {
            let filled = board.refill().await?;
            match3_log!("Refilled {} cell(s)", filled.len());
        }
    }
    Ok(())
}
