//! Static per-category configuration.
//!
//! Single source of truth for everything category-driven: display label,
//! tint, sprite shape and base movement speed. Looked up once when a
//! personality is derived, never per frame.

use serde::{Deserialize, Serialize};

use crate::types::Category;

/// Sprite silhouette drawn for a category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Shape {
    /// Circle.
    Circle,
    /// Axis-aligned square.
    Square,
    /// Horizontal ellipse.
    Ellipse,
    /// Upward triangle.
    Triangle,
    /// Square rotated 45°.
    Diamond,
    /// Regular hexagon.
    Hexagon,
    /// Five-pointed star.
    Star,
    /// Regular pentagon.
    Pentagon,
    /// Rounded capsule.
    Capsule,
}

/// Everything the system knows about a category.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CategoryProfile {
    /// Human-readable label.
    pub label: &'static str,
    /// 0xRRGGBB base tint.
    pub color: u32,
    /// Sprite shape.
    pub shape: Shape,
    /// Base cruising speed in px/s before mood and recency adjustments.
    pub base_speed: f32,
}

/// Neutral grey used for unrecognised categories.
pub const NEUTRAL_COLOR: u32 = 0x00cc_cccc;

const PROFILES: [CategoryProfile; Category::COUNT] = [
    // FilmTV
    CategoryProfile { label: "Film / TV", color: 0x00a0_20f0, shape: Shape::Circle, base_speed: 45.0 },
    // Book
    CategoryProfile { label: "Book", color: 0x00c6_8642, shape: Shape::Square, base_speed: 35.0 },
    // Game
    CategoryProfile { label: "Video Game", color: 0x0000_ff00, shape: Shape::Diamond, base_speed: 75.0 },
    // Hike
    CategoryProfile { label: "Hike", color: 0x00ff_aa00, shape: Shape::Ellipse, base_speed: 80.0 },
    // Gym
    CategoryProfile { label: "Gym / Workout", color: 0x00ff_0000, shape: Shape::Hexagon, base_speed: 120.0 },
    // Event
    CategoryProfile { label: "Event", color: 0x0000_aaff, shape: Shape::Triangle, base_speed: 65.0 },
    // Food
    CategoryProfile { label: "Food", color: 0x00ff_d700, shape: Shape::Pentagon, base_speed: 55.0 },
    // Travel
    CategoryProfile { label: "Travel", color: 0x0020_b2aa, shape: Shape::Capsule, base_speed: 85.0 },
    // Sport
    CategoryProfile { label: "Sport", color: 0x00ff_6f61, shape: Shape::Star, base_speed: 110.0 },
    // Other
    CategoryProfile { label: "Other", color: NEUTRAL_COLOR, shape: Shape::Circle, base_speed: 0.0 },
];

impl Category {
    /// Static profile for this category.
    #[must_use]
    pub fn profile(self) -> &'static CategoryProfile {
        &PROFILES[self.index()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn high_energy_categories_are_fastest() {
        assert!(Category::Gym.profile().base_speed > Category::Sport.profile().base_speed);
        assert!(Category::Sport.profile().base_speed > Category::Book.profile().base_speed);
        assert!(Category::KNOWN.iter().all(|c| c.profile().base_speed >= 35.0));
    }

    #[test]
    fn other_is_neutral() {
        let p = Category::Other.profile();
        assert_eq!(p.color, NEUTRAL_COLOR);
        assert_eq!(p.base_speed, 0.0);
    }

    #[test]
    fn known_categories_have_distinct_tints() {
        let mut colors: Vec<u32> = Category::KNOWN.iter().map(|c| c.profile().color).collect();
        colors.sort_unstable();
        colors.dedup();
        assert_eq!(colors.len(), Category::KNOWN.len());
    }
}
