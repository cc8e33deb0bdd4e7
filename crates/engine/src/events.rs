//! Engine events and their fan-out to subscribers
//!
//! Every subscriber gets its own unbounded channel. Closed subscribers are dropped on the
//! next emit.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::core::Match;
use crate::types::{PieceType, Position};

/// One piece removed from the grid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PopEvent {
    pub piece_type: PieceType,
    pub position: Position,
    /// Round number the pop happened in
    pub combo: u32,
    /// The popped piece was itself special
    pub is_special: bool,
    /// Removed by a special's detonation rather than by a match
    pub caused_by_special: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Match3Event {
    SwapAttempted {
        from: Position,
        to: Position,
        valid: bool,
    },
    MatchFound {
        matches: Vec<Match>,
        combo: u32,
    },
    PiecePopped(PopEvent),
    RoundCycleStarted,
    RoundCycleCompleted,
    TimerExpired,
}

#[derive(Debug, Default)]
pub struct EventBus {
    subscribers: Vec<mpsc::UnboundedSender<Match3Event>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&mut self) -> mpsc::UnboundedReceiver<Match3Event> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.subscribers.push(tx);
        rx
    }

    pub fn emit(&mut self, event: Match3Event) {
        self.subscribers.retain(|tx| tx.send(event.clone()).is_ok());
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }
}

/// Line-delimited JSON log of every event
pub struct EventLog {
    pub path: PathBuf,
    handle: JoinHandle<()>,
}

impl EventLog {
    /// Append each received event to `path` as one JSON object per line.
    ///
    /// Must be called from within a tokio runtime. The writer stops when every sender of
    /// `events` is gone or the file cannot be written.
    pub fn spawn(path: impl Into<PathBuf>, mut events: mpsc::UnboundedReceiver<Match3Event>) -> Self {
        let path = path.into();
        let file_path = path.clone();

        let handle = tokio::spawn(async move {
            use tokio::fs::OpenOptions;
            use tokio::io::AsyncWriteExt;

            let mut file = match OpenOptions::new()
                .create(true)
                .append(true)
                .open(&file_path)
                .await
            {
                Ok(f) => f,
                Err(e) => {
                    crate::match3_log!("Event log {} unavailable: {}", file_path.display(), e);
                    return;
                }
            };

            let mut buf: Vec<u8> = Vec::with_capacity(256);
            while let Some(event) = events.recv().await {
                buf.clear();
                if serde_json::to_writer(&mut buf, &event).is_err() {
                    continue;
                }
                buf.push(b'\n');
                if file.write_all(&buf).await.is_err() {
                    break;
                }
            }

            let _ = file.flush().await;
        });

        Self { path, handle }
    }

    /// Wait for the writer to drain and close the file
    pub async fn finish(self) {
        let _ = self.handle.await;
    }
}
