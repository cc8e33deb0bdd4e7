//! Core rules module - pure, deterministic, and testable
//!
//! This crate contains every grid rule of the match-3 engine. It has **no dependencies**
//! on presentation, timing sources, or async runtimes, making it:
//!
//! - **Deterministic**: the same seed produces the same grids and refills
//! - **Testable**: every rule is a plain function over a [`Grid`]
//! - **Portable**: usable from the async cascade engine, benches, or a solver
//!
//! # Module Structure
//!
//! - [`grid`]: the typed matrix, bounds-checked access, and match-free random creation
//! - [`matches`]: horizontal/vertical run detection with optional position filter
//! - [`gravity`]: column compaction and random refill
//! - [`swap`]: swap legality against a scratch copy
//! - [`special`]: special piece shape rules and detonation targets
//! - [`registry`]: common vs special type roles for a mode
//! - [`config`]: validated session configuration
//! - [`layout`]: grid-to-view coordinate mapping
//! - [`timer`]: caller-driven countdown
//! - [`stats`]: gameplay tally
//!
//! # Example
//!
//! ```
//! use match3_core::{apply_gravity, find_matches, refill, Grid};
//! use rand::{rngs::StdRng, SeedableRng};
//!
//! let mut grid = Grid::from_rows(&[vec![1, 1, 1], vec![2, 3, 2], vec![3, 2, 3]]);
//! let matches = find_matches(&grid);
//! assert_eq!(matches.len(), 1);
//!
//! for &p in &matches[0].positions {
//!     grid.set(p, 0);
//! }
//! apply_gravity(&mut grid);
//!
//! let mut rng = StdRng::seed_from_u64(1);
//! let filled = refill(&mut grid, &[4, 5, 6], &mut rng);
//! assert_eq!(filled.len(), 3);
//! assert!(grid.empty_positions().is_empty());
//! ```

pub mod config;
pub mod gravity;
pub mod grid;
pub mod layout;
pub mod matches;
pub mod registry;
pub mod special;
pub mod stats;
pub mod swap;
pub mod timer;

pub use match3_types as types;

// Re-export commonly used types for convenience
pub use config::{Config, ConfigError};
pub use gravity::{apply_gravity, refill, Movement};
pub use grid::{random_type, Grid};
pub use layout::{GridMapping, Layout};
pub use matches::{find_matches, find_matches_with, positions_in_multiple_matches, Match};
pub use registry::{Role, TypeEntry, TypeRegistry};
pub use special::{blast_overlaps, dominant_common_type, qualifying_matches, trigger_targets, BlastPlan};
pub use stats::Stats;
pub use swap::{are_adjacent, is_valid_swap};
pub use timer::Timer;
