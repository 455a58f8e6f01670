//! Configuration for the logflock simulation.
//!
//! Maps directly to `logflock.toml`. Every section and field has a default,
//! so a partial file only overrides what it names.

use serde::{Deserialize, Serialize};

use crate::error::{FlockError, Result};
use crate::types::WorldBounds;

/// Finest grid the neighbour index accepts, in cells along the longer world axis.
pub const MAX_GRID_CELLS_PER_AXIS: f32 = 1.0e6;

/// Top-level configuration, loadable from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FlockConfig {
    /// General settings.
    #[serde(default)]
    pub general: GeneralConfig,
    /// Initial world size.
    #[serde(default)]
    pub world: WorldConfig,
    /// Steering rule constants.
    #[serde(default)]
    pub steering: SteeringConfig,
    /// Tick loop settings.
    #[serde(default)]
    pub simulation: SimulationConfig,
    /// Presentation settings.
    #[serde(default)]
    pub presentation: PresentationConfig,
}

impl FlockConfig {
    /// Load configuration from a TOML string.
    ///
    /// # Errors
    /// Returns `FlockError::Config` if the TOML is invalid or fails validation.
    pub fn from_toml(toml_str: &str) -> Result<Self> {
        let config: Self = toml::from_str(toml_str).map_err(|e| FlockError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &std::path::Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Serialize to TOML.
    ///
    /// # Errors
    /// Returns `FlockError::Serialization` if encoding fails.
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| FlockError::Serialization(e.to_string()))
    }

    /// Reject values the simulation cannot run with.
    ///
    /// # Errors
    /// Returns `FlockError::Config` naming the first offending field.
    pub fn validate(&self) -> Result<()> {
        let positive = |name: &str, v: f32| {
            if v.is_finite() && v > 0.0 {
                Ok(())
            } else {
                Err(FlockError::Config(format!("{name} must be positive, got {v}")))
            }
        };
        positive("world.width", self.world.width)?;
        positive("world.height", self.world.height)?;
        positive("simulation.max_dt", self.simulation.max_dt)?;
        positive("simulation.frame_budget_ms", self.simulation.frame_budget_ms)?;
        if self.simulation.index == IndexKind::Grid {
            positive("simulation.grid_cell_size", self.simulation.grid_cell_size)?;
            let cells = self.world.width.max(self.world.height) / self.simulation.grid_cell_size;
            if cells > MAX_GRID_CELLS_PER_AXIS {
                return Err(FlockError::Config(format!(
                    "simulation.grid_cell_size {} gives {cells} cells per axis, max {MAX_GRID_CELLS_PER_AXIS}",
                    self.simulation.grid_cell_size
                )));
            }
        }
        positive("steering.gravity_radius", self.steering.gravity_radius)?;
        if !(0.0..=1.0).contains(&self.presentation.dimmed_alpha) {
            return Err(FlockError::Config(format!(
                "presentation.dimmed_alpha must be within 0..=1, got {}",
                self.presentation.dimmed_alpha
            )));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Sub-configs
// ---------------------------------------------------------------------------

/// General system settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Log level: trace, debug, info, warn, error.
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Fixed RNG seed for reproducible runs. Random when absent.
    #[serde(default)]
    pub seed: Option<u64>,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            seed: None,
        }
    }
}

/// World size in pixels.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorldConfig {
    /// Canvas width.
    #[serde(default = "default_width")]
    pub width: f32,
    /// Canvas height.
    #[serde(default = "default_height")]
    pub height: f32,
}

impl WorldConfig {
    /// The configured bounds.
    #[must_use]
    pub fn bounds(&self) -> WorldBounds {
        WorldBounds::new(self.width, self.height)
    }
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            width: 960.0,
            height: 640.0,
        }
    }
}

/// Constants of the six steering rules and the speed envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SteeringConfig {
    /// `min_dist = factor × (size_a + size_b)`.
    #[serde(default = "default_separation_factor")]
    pub separation_factor: f32,
    /// Peak separation push at full overlap.
    #[serde(default = "default_separation_strength")]
    pub separation_strength: f32,
    /// Constant pull toward the same-category centroid.
    #[serde(default = "default_cohesion_strength")]
    pub cohesion_strength: f32,
    /// Fraction of the velocity difference blended in by alignment.
    #[serde(default = "default_alignment_blend")]
    pub alignment_blend: f32,
    /// Scale applied to cross-category affinity scores.
    #[serde(default = "default_affinity_strength")]
    pub affinity_strength: f32,
    /// Reach of rating gravity (px).
    #[serde(default = "default_gravity_radius")]
    pub gravity_radius: f32,
    /// Ratings strictly above this exert gravity.
    #[serde(default = "default_gravity_rating_threshold")]
    pub gravity_rating_threshold: f32,
    /// Multiplier on `(rating − threshold)`.
    #[serde(default = "default_gravity_rating_scale")]
    pub gravity_rating_scale: f32,
    /// Overall gravity gain.
    #[serde(default = "default_gravity_strength")]
    pub gravity_strength: f32,
    /// Same-day bond only acts beyond this distance (px).
    #[serde(default = "default_bond_distance")]
    pub bond_distance: f32,
    /// Constant same-day bond pull.
    #[serde(default = "default_bond_strength")]
    pub bond_strength: f32,
    /// Extra ceiling per unit of recency.
    #[serde(default = "default_recency_speed_boost")]
    pub recency_speed_boost: f32,
    /// Speed floor before the recency bonus.
    #[serde(default = "default_min_speed")]
    pub min_speed: f32,
}

impl Default for SteeringConfig {
    fn default() -> Self {
        Self {
            separation_factor: 0.55,
            separation_strength: 90.0,
            cohesion_strength: 14.0,
            alignment_blend: 0.05,
            affinity_strength: 28.0,
            gravity_radius: 280.0,
            gravity_rating_threshold: 3.0,
            gravity_rating_scale: 1.8,
            gravity_strength: 4.5,
            bond_distance: 110.0,
            bond_strength: 6.0,
            recency_speed_boost: 18.0,
            min_speed: 12.0,
        }
    }
}

/// Which neighbour index the tick uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IndexKind {
    /// Check every pair. Fine for a few hundred agents.
    #[default]
    BruteForce,
    /// Uniform bucket grid.
    Grid,
}

/// Tick loop settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationConfig {
    /// Largest `dt` a single tick integrates (seconds).
    #[serde(default = "default_max_dt")]
    pub max_dt: f32,
    /// Neighbour index implementation.
    #[serde(default)]
    pub index: IndexKind,
    /// Cell size for [`IndexKind::Grid`] (px).
    #[serde(default = "default_grid_cell_size")]
    pub grid_cell_size: f32,
    /// Ticks slower than this are logged (ms).
    #[serde(default = "default_frame_budget_ms")]
    pub frame_budget_ms: f32,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            max_dt: 0.25,
            index: IndexKind::BruteForce,
            grid_cell_size: 120.0,
            frame_budget_ms: 4.0,
        }
    }
}

/// Presentation settings shared with the stage crate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PresentationConfig {
    /// 0xRRGGBB tint of the highlighted agent.
    #[serde(default = "default_highlight_tint")]
    pub highlight_tint: u32,
    /// Alpha of agents excluded by the visibility filter.
    #[serde(default = "default_dimmed_alpha")]
    pub dimmed_alpha: f32,
    /// Whether filtered-out agents still respond to the pointer.
    #[serde(default)]
    pub dimmed_interactive: bool,
}

impl Default for PresentationConfig {
    fn default() -> Self {
        Self {
            highlight_tint: 0x00ff_ffff,
            dimmed_alpha: 0.12,
            dimmed_interactive: false,
        }
    }
}

// ---------------------------------------------------------------------------
// Serde default helpers
// ---------------------------------------------------------------------------

fn default_log_level() -> String { "info".to_string() }
fn default_width() -> f32 { 960.0 }
fn default_height() -> f32 { 640.0 }
fn default_separation_factor() -> f32 { 0.55 }
fn default_separation_strength() -> f32 { 90.0 }
fn default_cohesion_strength() -> f32 { 14.0 }
fn default_alignment_blend() -> f32 { 0.05 }
fn default_affinity_strength() -> f32 { 28.0 }
fn default_gravity_radius() -> f32 { 280.0 }
fn default_gravity_rating_threshold() -> f32 { 3.0 }
fn default_gravity_rating_scale() -> f32 { 1.8 }
fn default_gravity_strength() -> f32 { 4.5 }
fn default_bond_distance() -> f32 { 110.0 }
fn default_bond_strength() -> f32 { 6.0 }
fn default_recency_speed_boost() -> f32 { 18.0 }
fn default_min_speed() -> f32 { 12.0 }
fn default_max_dt() -> f32 { 0.25 }
fn default_grid_cell_size() -> f32 { 120.0 }
fn default_frame_budget_ms() -> f32 { 4.0 }
fn default_highlight_tint() -> u32 { 0x00ff_ffff }
fn default_dimmed_alpha() -> f32 { 0.12 }

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_toml_gives_defaults() {
        let config = FlockConfig::from_toml("").expect("empty config is valid");
        assert!((config.steering.separation_strength - 90.0).abs() < f32::EPSILON);
        assert_eq!(config.simulation.index, IndexKind::BruteForce);
        assert!(config.general.seed.is_none());
    }

    #[test]
    fn partial_override() {
        let config = FlockConfig::from_toml(
            r#"
            [general]
            seed = 7

            [steering]
            cohesion_strength = 20.0

            [simulation]
            index = "grid"
            "#,
        )
        .expect("valid config");
        assert_eq!(config.general.seed, Some(7));
        assert!((config.steering.cohesion_strength - 20.0).abs() < f32::EPSILON);
        assert!((config.steering.bond_strength - 6.0).abs() < f32::EPSILON);
        assert_eq!(config.simulation.index, IndexKind::Grid);
    }

    #[test]
    fn round_trip() {
        let config = FlockConfig::default();
        let text = config.to_toml().expect("serializes");
        let back = FlockConfig::from_toml(&text).expect("parses back");
        assert!((back.world.width - config.world.width).abs() < f32::EPSILON);
        assert_eq!(back.presentation.highlight_tint, config.presentation.highlight_tint);
    }

    #[test]
    fn rejects_bad_values() {
        assert!(matches!(
            FlockConfig::from_toml("[world]\nwidth = -5.0"),
            Err(FlockError::Config(_))
        ));
        assert!(matches!(
            FlockConfig::from_toml("[presentation]\ndimmed_alpha = 3.0"),
            Err(FlockError::Config(_))
        ));
        assert!(matches!(FlockConfig::from_toml("[world"), Err(FlockError::Config(_))));
    }

    #[test]
    fn rejects_grid_too_fine_for_the_world() {
        let toml = "[world]\nwidth = 1.0e12\n[simulation]\nindex = \"grid\"";
        assert!(matches!(FlockConfig::from_toml(toml), Err(FlockError::Config(_))));
        // The same world is fine without the grid.
        assert!(FlockConfig::from_toml("[world]\nwidth = 1.0e12").is_ok());
    }

    #[test]
    fn loads_from_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("logflock.toml");
        std::fs::write(&path, "[world]\nwidth = 400.0\nheight = 300.0\n").expect("write config");
        let config = FlockConfig::from_file(&path).expect("loads");
        assert_eq!(config.world.bounds(), WorldBounds::new(400.0, 300.0));
    }
}
