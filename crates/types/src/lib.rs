//! Core types module - shared data structures and constants
//!
//! This module defines the fundamental types used throughout the engine.
//! All types are plain data with no behaviour beyond parsing and formatting, so they
//! are usable in any context (core rules, cascade engine, presentation collaborators).
//!
//! # Grid Coordinates
//!
//! Positions are `(row, column)` pairs:
//!
//! - **Row**: 0 is the top row, increasing downward
//! - **Column**: 0 is the leftmost column, increasing to the right
//! - Coordinates are signed so offset patterns can step outside the grid and be discarded
//!
//! # Defaults
//!
//! | Constant | Value | Description |
//! |----------|-------|-------------|
//! | `DEFAULT_ROWS` | 7 | Grid rows |
//! | `DEFAULT_COLUMNS` | 7 | Grid columns |
//! | `DEFAULT_TILE_SIZE` | 50.0 | View-space cell size |
//! | `DEFAULT_DURATION_SECS` | 60.0 | Session time budget |
//! | `MIN_MATCH` | 3 | Minimum run length for a match |
//!
//! # Examples
//!
//! ```
//! use match3_types::{Mode, Position, SpecialKind, EMPTY};
//!
//! let mode = Mode::from_str("Normal").unwrap();
//! assert_eq!(mode, Mode::Normal);
//! assert_eq!(Mode::from_str("expert"), None);
//!
//! assert_eq!(SpecialKind::from_name("special-row"), Some(SpecialKind::Row));
//!
//! let p = Position::new(2, 3);
//! assert_eq!(p.offset(-1, 1), Position::new(1, 4));
//! assert_eq!(EMPTY, 0);
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};

/// Integer identifier of a piece type. `0` is reserved for [`EMPTY`].
pub type PieceType = u8;

/// The empty cell marker.
pub const EMPTY: PieceType = 0;

/// Minimum run length for a match.
pub const MIN_MATCH: usize = 3;

pub const DEFAULT_ROWS: usize = 7;
pub const DEFAULT_COLUMNS: usize = 7;
pub const DEFAULT_TILE_SIZE: f32 = 50.0;
pub const DEFAULT_DURATION_SECS: f32 = 60.0;

/// Upper bound on rounds in one cascade run.
///
/// Every round either clears something or finds the grid stable, so this is never reached
/// in practice.
pub const MAX_CASCADE_ROUNDS: u32 = 256;

/// A cell coordinate on the grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Position {
    pub row: i32,
    pub column: i32,
}

impl Position {
    pub const fn new(row: i32, column: i32) -> Self {
        Self { row, column }
    }

    /// Position shifted by `(dr, dc)`. The result may lie outside any grid.
    pub const fn offset(self, dr: i32, dc: i32) -> Self {
        Self {
            row: self.row + dr,
            column: self.column + dc,
        }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.row, self.column)
    }
}

/// Axis of a run of pieces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Orientation {
    /// Row-aligned: all positions share a row
    Horizontal,
    /// Column-aligned: all positions share a column
    Vertical,
}

/// View-space coordinates handed to presentation collaborators.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ViewPoint {
    pub x: f32,
    pub y: f32,
}

impl ViewPoint {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// The closed set of special pieces
///
/// - **Row**: spawned from a row-aligned run of exactly 4, clears its whole row
/// - **Column**: spawned from a column-aligned run of exactly 4, clears its whole column
/// - **Colour**: spawned from a run of 5 or more, clears the most numerous common type
/// - **Blast**: spawned where two runs overlap (L/T/+ shapes), clears a diamond around itself
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpecialKind {
    Row,
    Column,
    Colour,
    Blast,
}

impl SpecialKind {
    /// Look up a special by its roster name
    ///
    /// # Examples
    ///
    /// ```
    /// use match3_types::SpecialKind;
    ///
    /// assert_eq!(SpecialKind::from_name("special-blast"), Some(SpecialKind::Blast));
    /// assert_eq!(SpecialKind::from_name("piece-frog"), None);
    /// ```
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "special-row" => Some(SpecialKind::Row),
            "special-column" => Some(SpecialKind::Column),
            "special-colour" => Some(SpecialKind::Colour),
            "special-blast" => Some(SpecialKind::Blast),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            SpecialKind::Row => "special-row",
            SpecialKind::Column => "special-column",
            SpecialKind::Colour => "special-colour",
            SpecialKind::Blast => "special-blast",
        }
    }
}

/// Special pieces in handler registration order.
pub const SPECIAL_ROSTER: [&str; 4] = [
    "special-blast",
    "special-row",
    "special-column",
    "special-colour",
];

/// Common pieces available in easy mode.
pub const EASY_PIECES: [&str; 4] = ["piece-dragon", "piece-frog", "piece-newt", "piece-snake"];

/// Common pieces available in normal mode.
pub const NORMAL_PIECES: [&str; 5] = [
    "piece-dragon",
    "piece-frog",
    "piece-newt",
    "piece-snake",
    "piece-spider",
];

/// Game mode, selecting the active piece roster
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    Easy,
    #[default]
    Normal,
}

impl Mode {
    /// Parse mode from string (case-insensitive)
    ///
    /// # Examples
    ///
    /// ```
    /// use match3_types::Mode;
    ///
    /// assert_eq!(Mode::from_str("easy"), Some(Mode::Easy));
    /// assert_eq!(Mode::from_str("NORMAL"), Some(Mode::Normal));
    /// assert_eq!(Mode::from_str("hard"), None);
    /// ```
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "easy" => Some(Mode::Easy),
            "normal" => Some(Mode::Normal),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::Easy => "easy",
            Mode::Normal => "normal",
        }
    }

    /// Full roster for this mode: specials first, then common pieces.
    ///
    /// Type ids are assigned as roster index + 1.
    pub fn roster(&self) -> Vec<&'static str> {
        let commons: &[&'static str] = match self {
            Mode::Easy => &EASY_PIECES,
            Mode::Normal => &NORMAL_PIECES,
        };
        SPECIAL_ROSTER.iter().chain(commons).copied().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roster_lists_specials_before_commons() {
        let roster = Mode::Normal.roster();
        assert_eq!(roster.len(), 9);
        assert_eq!(&roster[..4], &SPECIAL_ROSTER);
        assert_eq!(roster[4], "piece-dragon");
        assert_eq!(Mode::Easy.roster().len(), 8);
    }

    #[test]
    fn special_names_roundtrip() {
        for name in SPECIAL_ROSTER {
            let kind = SpecialKind::from_name(name).unwrap();
            assert_eq!(kind.name(), name);
        }
    }

    #[test]
    fn position_display_matches_debug_key() {
        assert_eq!(Position::new(3, 12).to_string(), "3:12");
        assert_eq!(Position::new(0, 0).offset(-2, 1), Position::new(-2, 1));
    }
}
