//! Session facade - the entry point collaborators drive
//!
//! A [`Match3Session`] bundles the board, the cascade scheduler and the countdown timer.
//! Player input comes in through [`Match3Session::action_move`] and
//! [`Match3Session::action_tap`]; time comes in through [`Match3Session::update`].

use std::path::PathBuf;
use std::sync::Arc;

use rand::rngs::StdRng;
use rand::SeedableRng;
use tokio::sync::mpsc;

use crate::board::Board;
use crate::core::{Config, ConfigError, Grid, GridMapping, Layout, Stats, Timer, TypeRegistry};
use crate::events::{EventLog, Match3Event};
use crate::match3_log;
use crate::presenter::Presenter;
use crate::scheduler::{CascadeControl, CascadeScheduler, CascadeState, CascadeSummary};
use crate::types::{Position, EMPTY};

/// Environment variable naming a JSON-lines file to append every event to
pub const EVENT_LOG_ENV: &str = "MATCH3_EVENT_LOG_PATH";

/// What became of a player action
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionOutcome {
    /// Not playing, a position held no piece, or a tap hit a common piece
    Ignored,
    /// The swap was illegal and animated back
    Rejected,
    /// The action went through; carries the cascade that followed, if one ran
    Accepted(Option<CascadeSummary>),
}

pub struct Match3Session {
    config: Config,
    board: Board,
    scheduler: CascadeScheduler,
    timer: Timer,
    playing: bool,
    event_log: Option<EventLog>,
}

impl Match3Session {
    /// Validate `config` and build a session over a random, match-free grid
    pub fn setup(config: Config, presenter: Arc<dyn Presenter>) -> Result<Self, ConfigError> {
        let layout = Layout::new(config.rows, config.columns, config.tile_size);
        Self::with_mapping(config, presenter, Arc::new(layout))
    }

    /// Like [`Match3Session::setup`] with a custom grid-to-view mapping
    pub fn with_mapping(
        config: Config,
        presenter: Arc<dyn Presenter>,
        mapping: Arc<dyn GridMapping>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let registry = TypeRegistry::for_mode(config.mode);
        let board = Board::random(
            config.rows,
            config.columns,
            registry,
            mapping,
            presenter,
            seeded_rng(config.seed),
        );
        Ok(Self::assemble(config, board))
    }

    /// Build a session over a prepared grid.
    ///
    /// The grid's dimensions replace the configured ones; its types must come from the
    /// mode's roster.
    pub fn from_grid(
        mut config: Config,
        presenter: Arc<dyn Presenter>,
        grid: Grid,
    ) -> Result<Self, ConfigError> {
        config.rows = grid.rows();
        config.columns = grid.columns();
        config.validate()?;

        let registry = TypeRegistry::for_mode(config.mode);
        let layout = Layout::new(config.rows, config.columns, config.tile_size);
        let board = Board::new(
            grid,
            registry,
            Arc::new(layout),
            presenter,
            seeded_rng(config.seed),
        );
        Ok(Self::assemble(config, board))
    }

    fn assemble(config: Config, board: Board) -> Self {
        match3_log!(
            "Session setup: {}x{} mode={} free_moves={} duration={}s",
            config.rows,
            config.columns,
            config.mode.as_str(),
            config.free_moves,
            config.duration
        );
        let timer = Timer::new(config.duration_ms());
        Self {
            config,
            board,
            scheduler: CascadeScheduler::new(),
            timer,
            playing: false,
            event_log: None,
        }
    }

    /// Back to a fresh random grid with zeroed stats and a full timer. Stops play.
    pub fn reset(&mut self) {
        self.control().stop();
        self.playing = false;
        self.timer.setup(self.config.duration_ms());
        self.scheduler.reset();
        self.board.reset_random();
    }

    pub fn start_playing(&mut self) {
        self.playing = true;
        self.timer.start();
    }

    pub fn stop_playing(&mut self) {
        self.playing = false;
        self.timer.stop();
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    /// Freeze the timer and hold the cascade at its next step boundary
    pub fn pause(&mut self) {
        self.timer.pause();
        self.scheduler.control().pause();
    }

    pub fn resume(&mut self) {
        self.timer.resume();
        self.scheduler.control().resume();
    }

    /// Advance the timer. Returns true on the update that runs out the clock; that update
    /// emits `TimerExpired` and ends play.
    ///
    /// A cascade already running is left alone; stop it through [`Match3Session::control`].
    pub fn update(&mut self, delta_ms: u32) -> bool {
        if !self.timer.update(delta_ms) {
            return false;
        }
        match3_log!("Time is up");
        self.playing = false;
        self.board.emit(Match3Event::TimerExpired);
        true
    }

    /// Swap two pieces and, if the swap was legal, run the cascade.
    pub async fn action_move(&mut self, from: Position, to: Position) -> anyhow::Result<ActionOutcome> {
        if !self.playing || !self.has_piece(from) || !self.has_piece(to) {
            return Ok(ActionOutcome::Ignored);
        }

        let valid = self
            .board
            .swap_pieces(from, to, self.config.free_moves)
            .await?;
        if !valid {
            return Ok(ActionOutcome::Rejected);
        }

        let summary = self.start().await?;
        Ok(ActionOutcome::Accepted(summary))
    }

    /// Detonate the special at `position` and run the cascade. Taps on common pieces are
    /// ignored.
    pub async fn action_tap(&mut self, position: Position) -> anyhow::Result<ActionOutcome> {
        if !self.playing || !self.has_piece(position) || !self.board.is_special(position) {
            return Ok(ActionOutcome::Ignored);
        }

        self.board.pop_piece(position).await?;
        let summary = self.start().await?;
        Ok(ActionOutcome::Accepted(summary))
    }

    /// Run the cascade on the current board while play is active
    pub async fn start(&mut self) -> anyhow::Result<Option<CascadeSummary>> {
        self.scheduler.run(&mut self.board, self.playing).await
    }

    fn has_piece(&self, position: Position) -> bool {
        self.board.grid().get(position).is_some_and(|ty| ty != EMPTY)
            && self.board.piece_at(position).is_some()
    }

    pub fn subscribe(&mut self) -> mpsc::UnboundedReceiver<Match3Event> {
        self.board.events_mut().subscribe()
    }

    /// Append every event from now on to `path` as JSON lines
    pub fn attach_event_log(&mut self, path: impl Into<PathBuf>) {
        let events = self.subscribe();
        let log = EventLog::spawn(path, events);
        match3_log!("Event log: {}", log.path.display());
        self.event_log = Some(log);
    }

    /// Attach an event log when [`EVENT_LOG_ENV`] is set. Returns the path in use.
    pub fn attach_event_log_from_env(&mut self) -> Option<PathBuf> {
        let path = std::env::var(EVENT_LOG_ENV).ok().filter(|p| !p.is_empty())?;
        self.attach_event_log(path);
        self.event_log.as_ref().map(|log| log.path.clone())
    }

    /// Close the event log once everything emitted so far is written
    ///
    /// Consumes the session, since the log only drains after the board's sender is gone.
    pub async fn close(self) {
        let Self { board, event_log, .. } = self;
        drop(board);
        if let Some(log) = event_log {
            log.finish().await;
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn grid(&self) -> &Grid {
        self.board.grid()
    }

    pub fn stats(&self) -> &Stats {
        self.board.stats()
    }

    pub fn timer(&self) -> &Timer {
        &self.timer
    }

    /// Handle for stopping or pausing a cascade from another task
    pub fn control(&self) -> CascadeControl {
        self.scheduler.control()
    }

    pub fn cascade_state(&self) -> CascadeState {
        self.scheduler.state()
    }
}

fn seeded_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::find_matches;
    use crate::presenter::InstantPresenter;

    fn config() -> Config {
        Config {
            seed: Some(11),
            duration: 1.0,
            ..Config::default()
        }
    }

    fn p(row: i32, column: i32) -> Position {
        Position::new(row, column)
    }

    #[test]
    fn setup_rejects_bad_config() {
        let bad = Config {
            rows: 0,
            ..config()
        };
        assert!(matches!(
            Match3Session::setup(bad, Arc::new(InstantPresenter)),
            Err(ConfigError::InvalidDimensions { .. })
        ));
    }

    #[test]
    fn setup_builds_a_full_match_free_grid() {
        let session = Match3Session::setup(config(), Arc::new(InstantPresenter)).unwrap();
        assert_eq!(session.grid().occupied_count(), 49);
        assert!(find_matches(session.grid()).is_empty());
        assert!(!session.is_playing());
    }

    #[test]
    fn same_seed_same_grid() {
        let a = Match3Session::setup(config(), Arc::new(InstantPresenter)).unwrap();
        let b = Match3Session::setup(config(), Arc::new(InstantPresenter)).unwrap();
        assert_eq!(a.grid(), b.grid());
    }

    #[tokio::test]
    async fn actions_are_ignored_until_playing() {
        let mut session = Match3Session::setup(config(), Arc::new(InstantPresenter)).unwrap();
        let before = session.grid().clone();

        let outcome = session.action_tap(p(0, 0)).await.unwrap();

        assert_eq!(outcome, ActionOutcome::Ignored);
        assert_eq!(session.grid(), &before);
    }

    #[test]
    fn timer_expiry_ends_play_once() {
        let mut session = Match3Session::setup(config(), Arc::new(InstantPresenter)).unwrap();
        let mut rx = session.subscribe();
        session.start_playing();

        assert!(!session.update(400));
        assert!(session.update(700));
        assert!(!session.update(700));
        assert!(!session.is_playing());
        assert_eq!(rx.try_recv().unwrap(), Match3Event::TimerExpired);
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn pause_freezes_the_timer() {
        let mut session = Match3Session::setup(config(), Arc::new(InstantPresenter)).unwrap();
        session.start_playing();
        session.pause();
        assert!(!session.update(5_000));
        assert!(session.control().is_paused());

        session.resume();
        assert!(session.update(1_000));
    }

    #[tokio::test]
    async fn tap_on_common_piece_is_ignored() {
        let mut session = Match3Session::setup(config(), Arc::new(InstantPresenter)).unwrap();
        session.start_playing();

        assert_eq!(session.action_tap(p(3, 3)).await.unwrap(), ActionOutcome::Ignored);
        assert_eq!(session.stats().pops, 0);
    }

    #[tokio::test]
    async fn tap_detonates_special_and_refills() {
        // Column special (3) in the middle of a match-free grid.
        let grid = Grid::from_rows(&[vec![5, 6, 7], vec![6, 3, 5], vec![7, 5, 6]]);
        let mut session = Match3Session::from_grid(config(), Arc::new(InstantPresenter), grid).unwrap();
        session.start_playing();

        let outcome = session.action_tap(p(1, 1)).await.unwrap();

        assert!(matches!(outcome, ActionOutcome::Accepted(Some(_))));
        assert!(session.grid().empty_positions().is_empty());
        assert!(find_matches(session.grid()).is_empty());
        assert!(session.stats().pops >= 1);
        assert_eq!(session.stats().cascades, 1);
    }

    #[test]
    fn reset_zeroes_stats_and_timer() {
        let mut session = Match3Session::setup(config(), Arc::new(InstantPresenter)).unwrap();
        session.start_playing();
        session.update(300);

        session.reset();

        assert!(!session.is_playing());
        assert_eq!(session.timer().time_ms(), 0);
        assert_eq!(session.stats(), &Stats::default());
        assert_eq!(session.grid().occupied_count(), 49);
    }
}
