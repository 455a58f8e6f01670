//! Personality derivation — turning a log entry into movement parameters.
//!
//! A personality is computed once, when the agent spawns, and never changes
//! afterwards. That includes `recency`: an agent spawned for an entry logged
//! today keeps its extra energy for the rest of the session.
//!
//! | Field              | Formula                                             | Range     |
//! |--------------------|-----------------------------------------------------|-----------|
//! | `recency`          | `max(0, 1 − age_days / 30)`                         | 0–1       |
//! | `awareness_radius` | `80 + rating × 30`                                  | 110–230   |
//! | `mass`             | `0.6 + rating × 0.3`                                | 0.9–2.1   |
//! | `max_speed`        | `max(20, base(category) + (mood − 3) × 8 + recency × 25)` | ≥ 20 |

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{Category, LogEntry};

/// Days over which recency decays from 1 to 0.
pub const RECENCY_WINDOW_DAYS: f64 = 30.0;

/// Edge length of an unscaled character sprite, in pixels.
pub const SPRITE_BASE_PX: f32 = 32.0;

/// Lowest cruising ceiling any personality can have (px/s).
pub const MIN_MAX_SPEED: f32 = 20.0;

/// Mood assumed when the entry does not record one.
pub const DEFAULT_MOOD: f32 = 3.0;

/// Behavioural profile of one character.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Personality {
    /// Category of the source entry.
    pub category: Category,
    /// Rating 1–5.
    pub rating: f32,
    /// Mood 1–5.
    pub mood: f32,
    /// `true` = introverted tendency.
    pub solo: bool,
    /// 1.0 when logged today, linearly down to 0.0 at 30 days.
    pub recency: f32,
    /// How far the character "sees" others (px).
    pub awareness_radius: f32,
    /// Baseline cruising ceiling (px/s).
    pub max_speed: f32,
    /// Heavier = more influential. 0.9–2.1.
    pub mass: f32,
    /// Timestamp of the source entry.
    pub date: DateTime<Utc>,
    /// Calendar day of the source entry, used for same-day bonding.
    pub day: NaiveDate,
}

impl Personality {
    /// Sprite scale factor: `0.35 + rating × 0.1`.
    #[must_use]
    pub fn scale(&self) -> f32 {
        scale_for_rating(self.rating)
    }

    /// On-screen width of the character in pixels.
    #[must_use]
    pub fn body_size(&self) -> f32 {
        SPRITE_BASE_PX * self.scale()
    }
}

/// Sprite scale for a (sanitised) rating.
#[must_use]
pub fn scale_for_rating(rating: f32) -> f32 {
    0.35 + rating * 0.1
}

/// Derive the personality of `entry` as seen at `now`.
///
/// Pure and total: bad ratings and moods are clamped, unknown categories
/// fall back to the neutral profile.
#[must_use]
pub fn derive(entry: &LogEntry, now: DateTime<Utc>) -> Personality {
    let rating = sanitize_rating(entry.rating);
    let mood = entry.mood.map_or(DEFAULT_MOOD, sanitize_mood);
    let solo = entry.solo.unwrap_or(true);
    let recency = recency(entry.date, now);

    let awareness_radius = 80.0 + rating * 30.0;
    let mass = 0.6 + rating * 0.3;

    let mood_mod = (mood - 3.0) * 8.0;
    let max_speed =
        (entry.category.profile().base_speed + mood_mod + recency * 25.0).max(MIN_MAX_SPEED);

    Personality {
        category: entry.category,
        rating,
        mood,
        solo,
        recency,
        awareness_radius,
        max_speed,
        mass,
        date: entry.date,
        day: entry.day(),
    }
}

/// Derive a personality against the wall clock.
#[must_use]
pub fn derive_now(entry: &LogEntry) -> Personality {
    derive(entry, Utc::now())
}

/// Linear recency: 1.0 for `date == now`, 0.0 at 30 days and beyond.
/// Future dates count as "today".
#[must_use]
pub fn recency(date: DateTime<Utc>, now: DateTime<Utc>) -> f32 {
    let age_ms = (now - date).num_milliseconds() as f64;
    let age_days = age_ms / 86_400_000.0;
    (1.0 - age_days / RECENCY_WINDOW_DAYS).clamp(0.0, 1.0) as f32
}

/// Clamp a rating into 1–5; non-finite ratings become 1.
#[must_use]
pub fn sanitize_rating(rating: f32) -> f32 {
    if rating.is_finite() { rating.clamp(1.0, 5.0) } else { 1.0 }
}

fn sanitize_mood(mood: f32) -> f32 {
    if mood.is_finite() { mood.clamp(1.0, 5.0) } else { DEFAULT_MOOD }
}
