//! Gameplay tally
//!
//! Counts what happened during a session. Turning these counts into a score or grade is
//! left to collaborators.

use serde::{Deserialize, Serialize};

use crate::matches::Match;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stats {
    /// Matches registered at the start of a round
    pub matches: u32,
    /// Pieces removed from the grid
    pub pops: u32,
    /// Popped pieces that were themselves special
    pub specials: u32,
    /// Pops caused by a special's detonation
    pub special_pops: u32,
    /// Highest combo seen on a match
    pub best_combo: u32,
    /// Completed cascade runs
    pub cascades: u32,
}

impl Stats {
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn register_matches(&mut self, matches: &[Match], combo: u32) {
        if matches.is_empty() {
            return;
        }
        self.matches += matches.len() as u32;
        self.best_combo = self.best_combo.max(combo);
    }

    pub fn register_pop(&mut self, is_special: bool, caused_by_special: bool) {
        self.pops += 1;
        if is_special {
            self.specials += 1;
        }
        if caused_by_special {
            self.special_pops += 1;
        }
    }

    pub fn register_cascade(&mut self) {
        self.cascades += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Orientation, Position};

    #[test]
    fn test_register_counts() {
        let mut stats = Stats::default();
        let m = Match {
            orientation: Orientation::Horizontal,
            positions: vec![Position::new(0, 0), Position::new(0, 1), Position::new(0, 2)],
        };

        stats.register_matches(&[m.clone(), m], 2);
        stats.register_matches(&[], 5);
        stats.register_pop(false, false);
        stats.register_pop(true, true);

        assert_eq!(stats.matches, 2);
        assert_eq!(stats.best_combo, 2);
        assert_eq!(stats.pops, 2);
        assert_eq!(stats.specials, 1);
        assert_eq!(stats.special_pops, 1);

        stats.reset();
        assert_eq!(stats, Stats::default());
    }
}
