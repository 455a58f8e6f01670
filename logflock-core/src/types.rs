//! Core type definitions for the logflock simulation.
//!
//! Log entries arrive from the host as JSON; everything here is serializable
//! with the host's camelCase field names.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::ops::{Add, AddAssign, Div, Mul, Neg, Sub};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Identity Types
// ---------------------------------------------------------------------------

/// Unique identifier of a log entry.
///
/// Reads either a UUID string or a non-negative integer id (hosts that key
/// entries by creation timestamp); integers map into the UUID space with
/// [`EntryId::from_u64`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct EntryId(pub Uuid);

/// Agents share the id of the entry that spawned them.
pub type AgentId = EntryId;

impl EntryId {
    /// Create a new random entry ID.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Stable id for an integer host key.
    #[must_use]
    pub const fn from_u64(n: u64) -> Self {
        Self(Uuid::from_u64_pair(0, n))
    }
}

impl<'de> Deserialize<'de> for EntryId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Uuid(Uuid),
            Number(u64),
        }
        Ok(match Raw::deserialize(deserializer)? {
            Raw::Uuid(id) => Self(id),
            Raw::Number(n) => Self::from_u64(n),
        })
    }
}

impl Default for EntryId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for EntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Spatial
// ---------------------------------------------------------------------------

/// A 2D vector in canvas space (pixels, y down).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vec2 {
    /// X coordinate.
    pub x: f32,
    /// Y coordinate.
    pub y: f32,
}

impl Vec2 {
    /// The zero vector.
    pub const ZERO: Self = Self { x: 0.0, y: 0.0 };

    /// Construct a vector.
    #[must_use]
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Unit vector pointing at `angle` radians.
    #[must_use]
    pub fn from_angle(angle: f32) -> Self {
        Self::new(angle.cos(), angle.sin())
    }

    /// Euclidean length.
    #[must_use]
    pub fn length(self) -> f32 {
        self.length_squared().sqrt()
    }

    /// Squared length.
    #[must_use]
    pub fn length_squared(self) -> f32 {
        self.x * self.x + self.y * self.y
    }

    /// Distance between two points.
    #[must_use]
    pub fn distance(self, other: Self) -> f32 {
        (other - self).length()
    }

    /// Unit vector in the same direction, or zero for a zero vector.
    #[must_use]
    pub fn normalized(self) -> Self {
        let len = self.length();
        if len > f32::EPSILON { self / len } else { Self::ZERO }
    }

    /// Whether both components are finite.
    #[must_use]
    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

impl Add for Vec2 {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        Self::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl AddAssign for Vec2 {
    fn add_assign(&mut self, rhs: Self) {
        self.x += rhs.x;
        self.y += rhs.y;
    }
}

impl Sub for Vec2 {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self {
        Self::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Mul<f32> for Vec2 {
    type Output = Self;
    fn mul(self, rhs: f32) -> Self {
        Self::new(self.x * rhs, self.y * rhs)
    }
}

impl Div<f32> for Vec2 {
    type Output = Self;
    fn div(self, rhs: f32) -> Self {
        Self::new(self.x / rhs, self.y / rhs)
    }
}

impl Neg for Vec2 {
    type Output = Self;
    fn neg(self) -> Self {
        Self::new(-self.x, -self.y)
    }
}

impl fmt::Display for Vec2 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.1}, {:.1})", self.x, self.y)
    }
}

/// Rectangular world the agents live in, anchored at the origin.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WorldBounds {
    /// Width in pixels.
    pub width: f32,
    /// Height in pixels.
    pub height: f32,
}

impl WorldBounds {
    /// Construct bounds; non-finite or negative sizes collapse to zero.
    #[must_use]
    pub fn new(width: f32, height: f32) -> Self {
        let sanitize = |v: f32| if v.is_finite() { v.max(0.0) } else { 0.0 };
        Self {
            width: sanitize(width),
            height: sanitize(height),
        }
    }

    /// Whether `p` lies inside the bounds (edges inclusive).
    #[must_use]
    pub fn contains(&self, p: Vec2) -> bool {
        (0.0..=self.width).contains(&p.x) && (0.0..=self.height).contains(&p.y)
    }

    /// Clamp a point into the bounds.
    #[must_use]
    pub fn clamp(&self, p: Vec2) -> Vec2 {
        Vec2::new(p.x.clamp(0.0, self.width), p.y.clamp(0.0, self.height))
    }

    /// Map a host percentage position (0–100 on each axis) into world space.
    #[must_use]
    pub fn from_percent(&self, x_pct: f32, y_pct: f32) -> Vec2 {
        let pct = |v: f32| if v.is_finite() { v.clamp(0.0, 100.0) / 100.0 } else { 0.5 };
        Vec2::new(pct(x_pct) * self.width, pct(y_pct) * self.height)
    }

    /// Centre of the world.
    #[must_use]
    pub fn center(&self) -> Vec2 {
        Vec2::new(self.width * 0.5, self.height * 0.5)
    }
}

impl Default for WorldBounds {
    fn default() -> Self {
        Self::new(960.0, 640.0)
    }
}

/// Which way a character sprite is facing. Purely visual.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Facing {
    /// Facing left (negative x velocity).
    Left,
    /// Facing right (positive x velocity).
    #[default]
    Right,
}

// ---------------------------------------------------------------------------
// Categories
// ---------------------------------------------------------------------------

/// Activity category of a log entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum Category {
    /// Films and TV shows.
    FilmTV,
    /// Books.
    Book,
    /// Video games.
    Game,
    /// Hikes.
    Hike,
    /// Gym sessions and workouts.
    Gym,
    /// Concerts, parties, festivals, exhibitions.
    Event,
    /// Meals.
    Food,
    /// Trips.
    Travel,
    /// Playing or watching sport.
    Sport,
    /// Anything the host sent that we do not recognise.
    Other,
}

impl Category {
    /// Number of categories, including [`Category::Other`].
    pub const COUNT: usize = 10;

    /// The nine known categories, in table order.
    pub const KNOWN: [Self; 9] = [
        Self::FilmTV,
        Self::Book,
        Self::Game,
        Self::Hike,
        Self::Gym,
        Self::Event,
        Self::Food,
        Self::Travel,
        Self::Sport,
    ];

    /// Dense index used by the static tables.
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Parse a host category label. Unknown labels map to [`Category::Other`].
    #[must_use]
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_ascii_lowercase().as_str() {
            "filmtv" | "film" | "tv" | "movie" => Self::FilmTV,
            "book" => Self::Book,
            "game" => Self::Game,
            "hike" => Self::Hike,
            "gym" => Self::Gym,
            "event" => Self::Event,
            "food" => Self::Food,
            "travel" => Self::Travel,
            "sport" => Self::Sport,
            _ => Self::Other,
        }
    }
}

impl<'de> Deserialize<'de> for Category {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let label = String::deserialize(deserializer)?;
        Ok(Self::from_label(&label))
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self:?}")
    }
}

// ---------------------------------------------------------------------------
// Log Entries
// ---------------------------------------------------------------------------

/// Unit attached to an entry's `duration`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DurationUnit {
    /// Hours.
    Hours,
    /// Days.
    Days,
    /// Weeks.
    Weeks,
}

/// Category-specific metadata, tagged by `type`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum CategoryMeta {
    /// Film or TV show.
    FilmTv {
        /// "Film" or "TV Show".
        format: String,
    },
    /// Book reading status.
    Book {
        /// "Finished", "In Progress" or "DNF".
        status: String,
    },
    /// Game mode.
    Game {
        /// "Single-player" or "Multiplayer".
        mode: String,
    },
    /// Sport result.
    Sport {
        /// "Won", "Lost", "Drew" or "N/A".
        result: String,
    },
    /// Food setting.
    Food {
        /// "Restaurant", "Home-cooked" or "Takeaway".
        setting: String,
    },
    /// Travel destination.
    Travel {
        /// Free-form destination.
        destination: String,
    },
    /// Event kind.
    Event {
        /// "Concert", "Party", "Festival", "Exhibition" or "Other".
        #[serde(rename = "eventType")]
        event_type: String,
    },
}

/// One record of the activity log. Read-only to the simulation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogEntry {
    /// Unique id; also the id of the spawned agent.
    pub id: EntryId,
    /// Title shown in the host UI.
    #[serde(default)]
    pub title: String,
    /// Activity category.
    pub category: Category,
    /// "How good was it?" 1.0–5.0 in 0.5 steps.
    pub rating: f32,
    /// "How did it make you feel?" 1.0–5.0; 3.0 when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mood: Option<f32>,
    /// Done alone (`true`) or with others.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub solo: Option<bool>,
    /// Raw duration, paired with `duration_unit`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<f32>,
    /// Unit for `duration`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_unit: Option<DurationUnit>,
    /// Free-form notes.
    #[serde(default)]
    pub notes: String,
    /// When the activity happened.
    #[serde(with = "entry_date")]
    pub date: DateTime<Utc>,
    /// Category-specific payload.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category_meta: Option<CategoryMeta>,
}

impl LogEntry {
    /// Minimal entry with a fresh id, used by hosts and tests.
    #[must_use]
    pub fn new(title: impl Into<String>, category: Category, rating: f32, date: DateTime<Utc>) -> Self {
        Self {
            id: EntryId::new(),
            title: title.into(),
            category,
            rating,
            mood: None,
            solo: None,
            duration: None,
            duration_unit: None,
            notes: String::new(),
            date,
            category_meta: None,
        }
    }

    /// Builder: set the mood.
    #[must_use]
    pub fn with_mood(mut self, mood: f32) -> Self {
        self.mood = Some(mood);
        self
    }

    /// Builder: set the solo flag.
    #[must_use]
    pub fn with_solo(mut self, solo: bool) -> Self {
        self.solo = Some(solo);
        self
    }

    /// Calendar day (UTC) the entry belongs to.
    #[must_use]
    pub fn day(&self) -> NaiveDate {
        self.date.date_naive()
    }

    /// Parse a single entry from host JSON.
    ///
    /// # Errors
    /// Returns `FlockError::Serialization` if the JSON does not describe an entry.
    pub fn from_json(json: &str) -> crate::error::Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

/// Entry dates are written as RFC 3339 and read from either RFC 3339, a
/// naive `YYYY-MM-DDTHH:MM:SS`, or a bare `YYYY-MM-DD` (midnight UTC).
mod entry_date {
    use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
    use serde::{Deserialize, Deserializer, Serializer, de::Error};

    pub fn serialize<S: Serializer>(date: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&date.to_rfc3339())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(deserializer)?;
        parse(&raw).ok_or_else(|| D::Error::custom(format!("unrecognised date: {raw}")))
    }

    pub(super) fn parse(raw: &str) -> Option<DateTime<Utc>> {
        let raw = raw.trim();
        if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
            return Some(dt.with_timezone(&Utc));
        }
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
            return Some(naive.and_utc());
        }
        NaiveDate::parse_from_str(raw, "%Y-%m-%d")
            .ok()
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .map(|naive| naive.and_utc())
    }
}
