//! Cross-category affinity — who is drawn to whom.
//!
//! Positive scores attract, negative scores repel. Same-category pull is not
//! an affinity; the steering step handles it through cohesion.
//!
//! The reference data groups categories roughly as:
//! - passive / cognitive (FilmTV, Book, Game), repelled by physical ones
//! - physical (Gym, Sport, Hike), repelled by passive ones
//! - social / lifestyle (Event, Food, Travel), a broadly attractive hub
//!
//! Lookups are by ordered pair. The shipped table happens to be symmetric,
//! but nothing relies on that.

use std::sync::LazyLock;

use serde::{Deserialize, Serialize};

use crate::types::Category;

const N: usize = Category::COUNT;

static STANDARD: LazyLock<AffinityTable> = LazyLock::new(AffinityTable::build_standard);

/// Dense `from × to → score` matrix.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AffinityTable {
    scores: [[f32; N]; N],
}

impl AffinityTable {
    /// A table where every pair is neutral.
    #[must_use]
    pub const fn neutral() -> Self {
        Self { scores: [[0.0; N]; N] }
    }

    /// The shipped category affinities.
    #[must_use]
    pub fn standard() -> Self {
        *STANDARD
    }

    fn build_standard() -> Self {
        use Category::{Book, Event, FilmTV, Food, Game, Gym, Hike, Sport, Travel};

        const ROWS: [(Category, [(Category, f32); 8]); 9] = [
            (FilmTV, [(Book, 0.35), (Food, 0.20), (Game, 0.15), (Event, 0.15), (Travel, 0.10), (Hike, -0.20), (Sport, -0.40), (Gym, -0.55)]),
            (Book, [(FilmTV, 0.35), (Travel, 0.30), (Hike, 0.20), (Food, 0.15), (Event, 0.10), (Game, -0.10), (Sport, -0.20), (Gym, -0.25)]),
            (Game, [(FilmTV, 0.15), (Event, 0.25), (Food, 0.20), (Sport, 0.15), (Travel, 0.10), (Book, -0.10), (Hike, -0.15), (Gym, -0.20)]),
            (Hike, [(Travel, 0.45), (Sport, 0.30), (Food, 0.25), (Book, 0.20), (Gym, 0.20), (Event, 0.15), (FilmTV, -0.20), (Game, -0.15)]),
            (Gym, [(Sport, 0.55), (Hike, 0.20), (Event, 0.15), (Travel, 0.10), (Food, 0.05), (Game, -0.20), (Book, -0.30), (FilmTV, -0.55)]),
            (Event, [(Food, 0.50), (Travel, 0.35), (Sport, 0.25), (Game, 0.25), (Gym, 0.15), (FilmTV, 0.15), (Hike, 0.15), (Book, 0.10)]),
            (Food, [(Event, 0.50), (Travel, 0.30), (Hike, 0.25), (FilmTV, 0.20), (Game, 0.20), (Sport, 0.20), (Book, 0.15), (Gym, 0.05)]),
            (Travel, [(Hike, 0.45), (Event, 0.35), (Food, 0.30), (Book, 0.30), (Sport, 0.20), (FilmTV, 0.10), (Game, 0.10), (Gym, 0.10)]),
            (Sport, [(Gym, 0.55), (Hike, 0.30), (Event, 0.25), (Food, 0.20), (Travel, 0.20), (Game, 0.15), (Book, -0.20), (FilmTV, -0.40)]),
        ];

        let mut table = Self::neutral();
        for (from, row) in ROWS {
            for (to, score) in row {
                table.scores[from.index()][to.index()] = score;
            }
        }
        table
    }

    /// Copy of this table with `(a, b)` set to `score`, clamped to [-1, 1].
    /// Only the ordered pair is touched.
    #[must_use]
    pub fn with(mut self, a: Category, b: Category, score: f32) -> Self {
        let score = if score.is_finite() { score.clamp(-1.0, 1.0) } else { 0.0 };
        self.scores[a.index()][b.index()] = score;
        self
    }

    /// Affinity of `a` toward `b`; 0.0 for unlisted pairs.
    #[inline]
    #[must_use]
    pub fn get(&self, a: Category, b: Category) -> f32 {
        self.scores[a.index()][b.index()]
    }
}

impl Default for AffinityTable {
    fn default() -> Self {
        Self::standard()
    }
}

/// Affinity of `a` toward `b` in the standard table.
#[must_use]
pub fn affinity(a: Category, b: Category) -> f32 {
    STANDARD.get(a, b)
}
