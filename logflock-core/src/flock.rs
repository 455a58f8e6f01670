//! `Flock` — the registry and simulation behind one handle.
//!
//! Hosts that do not need the presentation layer drive this directly:
//! spawn on new entries, `tick` every frame, read agents back through
//! [`Flock::registry`]. Spawn positions are clamped into the world, and
//! every operation feeds the counters. Ticks that integrate are timed
//! against the frame budget.

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use crate::affinity::AffinityTable;
use crate::config::FlockConfig;
use crate::error::{FlockError, Result};
use crate::metrics::{FlockCounters, TickTimings};
use crate::registry::{Agent, AgentRegistry};
use crate::simulation::{Simulation, TickStats};
use crate::types::{AgentId, LogEntry, Vec2, WorldBounds};

/// Registry, simulation and metrics for one world.
#[derive(Debug)]
pub struct Flock {
    registry: AgentRegistry,
    simulation: Simulation,
    counters: FlockCounters,
    timings: TickTimings,
}

impl Flock {
    /// Build an empty flock from config.
    #[must_use]
    pub fn new(config: &FlockConfig) -> Self {
        info!(
            width = config.world.width,
            height = config.world.height,
            seed = ?config.general.seed,
            index = ?config.simulation.index,
            "Flock created"
        );
        Self {
            registry: AgentRegistry::new(config.general.seed),
            simulation: Simulation::new(config),
            counters: FlockCounters::new(),
            timings: TickTimings::new(config.simulation.frame_budget_ms),
        }
    }

    /// Replace the affinity table before the first tick.
    #[must_use]
    pub fn with_affinity(mut self, affinity: AffinityTable) -> Self {
        self.simulation = self.simulation.with_affinity(affinity);
        self
    }

    /// Spawn an agent at a world position, recency measured against now.
    ///
    /// # Errors
    /// Returns `FlockError::DuplicateAgent` if the entry already has an agent.
    pub fn spawn(&mut self, entry: &LogEntry, position: Vec2) -> Result<AgentId> {
        self.spawn_at(entry, position, Utc::now())
    }

    /// Spawn with an explicit "now". Non-finite positions land in the
    /// centre; everything else is clamped into the world.
    ///
    /// # Errors
    /// Returns `FlockError::DuplicateAgent` if the entry already has an agent.
    pub fn spawn_at(&mut self, entry: &LogEntry, position: Vec2, now: DateTime<Utc>) -> Result<AgentId> {
        let bounds = self.simulation.bounds();
        let position = if position.is_finite() { bounds.clamp(position) } else { bounds.center() };
        match self.registry.spawn_at(entry, position, now) {
            Ok(id) => {
                FlockCounters::incr(&self.counters.agents_spawned);
                Ok(id)
            }
            Err(err) => {
                if matches!(err, FlockError::DuplicateAgent(_)) {
                    FlockCounters::incr(&self.counters.duplicate_spawns);
                }
                Err(err)
            }
        }
    }

    /// Spawn at a position given as percentages of the world size.
    ///
    /// # Errors
    /// Returns `FlockError::DuplicateAgent` if the entry already has an agent.
    pub fn spawn_percent(&mut self, entry: &LogEntry, x_pct: f32, y_pct: f32) -> Result<AgentId> {
        let position = self.simulation.bounds().from_percent(x_pct, y_pct);
        self.spawn(entry, position)
    }

    /// Remove one agent.
    ///
    /// # Errors
    /// Returns `FlockError::UnknownAgent` if no such agent is live.
    pub fn remove(&mut self, id: AgentId) -> Result<Agent> {
        let agent = self.registry.remove(id)?;
        FlockCounters::incr(&self.counters.agents_removed);
        Ok(agent)
    }

    /// Remove every agent. Returns how many were removed.
    pub fn clear_all(&mut self) -> usize {
        let removed = self.registry.clear_all();
        if removed > 0 {
            FlockCounters::incr(&self.counters.clears);
        }
        removed
    }

    /// Advance the world by `dt` seconds.
    ///
    /// A rejected `dt` is neither counted nor timed.
    pub fn tick(&mut self, dt: f32) -> TickStats {
        let stats = self.simulation.tick(&mut self.registry, dt);
        if stats.dt > 0.0 {
            FlockCounters::incr(&self.counters.ticks);
            if self.timings.observe(stats.elapsed_us) {
                warn!(
                    agents = stats.agents,
                    elapsed_us = stats.elapsed_us,
                    budget_us = self.timings.budget_us(),
                    "Tick exceeded frame budget"
                );
            }
        }
        stats
    }

    /// Change the world size and pull every agent inside it.
    pub fn resize(&mut self, width: f32, height: f32) -> WorldBounds {
        let bounds = WorldBounds::new(width, height);
        self.simulation.set_bounds(bounds);
        let (agents, _) = self.registry.agents_and_rng();
        let mut moved = 0_usize;
        for agent in agents.iter_mut() {
            if !bounds.contains(agent.position) {
                agent.position = bounds.clamp(agent.position);
                moved += 1;
            }
        }
        debug!(width = bounds.width, height = bounds.height, moved, "World resized");
        bounds
    }

    /// Current world bounds.
    #[must_use]
    pub fn bounds(&self) -> WorldBounds {
        self.simulation.bounds()
    }

    /// Live agents.
    #[must_use]
    pub fn registry(&self) -> &AgentRegistry {
        &self.registry
    }

    /// Mutable registry, for draw state and host-driven placement.
    pub fn registry_mut(&mut self) -> &mut AgentRegistry {
        &mut self.registry
    }

    /// The steering step.
    #[must_use]
    pub fn simulation(&self) -> &Simulation {
        &self.simulation
    }

    /// Event counters.
    #[must_use]
    pub fn counters(&self) -> &FlockCounters {
        &self.counters
    }

    /// Recent tick times against the frame budget.
    #[must_use]
    pub fn timings(&self) -> &TickTimings {
        &self.timings
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Category;

    fn flock() -> Flock {
        let mut config = FlockConfig::default();
        config.general.seed = Some(11);
        Flock::new(&config)
    }

    #[test]
    fn spawn_is_clamped_into_the_world() {
        let mut flock = flock();
        let e = LogEntry::new("far away", Category::Travel, 4.0, Utc::now());
        let id = flock.spawn(&e, Vec2::new(5_000.0, -30.0)).expect("spawn");
        let pos = flock.registry().find(id).expect("agent").position();
        assert_eq!(pos, Vec2::new(960.0, 0.0));

        let e = LogEntry::new("nowhere", Category::Travel, 4.0, Utc::now());
        let id = flock.spawn(&e, Vec2::new(f32::NAN, 1.0)).expect("spawn");
        assert_eq!(flock.registry().find(id).expect("agent").position(), flock.bounds().center());
    }

    #[test]
    fn percent_spawn_maps_onto_the_world() {
        let mut flock = flock();
        let e = LogEntry::new("hike", Category::Hike, 3.0, Utc::now());
        let id = flock.spawn_percent(&e, 50.0, 150.0).expect("spawn");
        assert_eq!(flock.registry().find(id).expect("agent").position(), Vec2::new(480.0, 640.0));
    }

    #[test]
    fn counters_track_operations() {
        let mut flock = flock();
        let e = LogEntry::new("gym", Category::Gym, 3.0, Utc::now());
        flock.spawn(&e, Vec2::ZERO).expect("spawn");
        assert!(flock.spawn(&e, Vec2::ZERO).is_err());
        flock.tick(0.016);
        flock.tick(0.0);
        flock.remove(e.id).expect("remove");
        assert!(flock.remove(e.id).is_err());
        assert_eq!(flock.clear_all(), 0);

        let snap = flock.counters().snapshot();
        assert_eq!(snap.agents_spawned, 1);
        assert_eq!(snap.duplicate_spawns, 1);
        assert_eq!(snap.agents_removed, 1);
        assert_eq!(snap.ticks, 1);
        assert_eq!(snap.clears, 0);
        assert_eq!(flock.timings().observed(), 1);
    }

    #[test]
    fn rejected_dt_is_not_timed() {
        let mut flock = flock();
        let e = LogEntry::new("walk", Category::Hike, 3.0, Utc::now());
        flock.spawn(&e, Vec2::new(100.0, 100.0)).expect("spawn");
        for dt in [0.0, -0.5, f32::NAN, f32::INFINITY] {
            flock.tick(dt);
        }
        assert_eq!(flock.timings().observed(), 0);
        assert_eq!(flock.counters().snapshot().ticks, 0);

        flock.tick(0.016);
        flock.tick(0.016);
        assert_eq!(flock.timings().observed(), 2);
        assert_eq!(flock.counters().snapshot().ticks, 2);
        assert_eq!(flock.timings().report().window, 2);
    }

    #[test]
    fn resize_pulls_agents_inside() {
        let mut flock = flock();
        let e = LogEntry::new("edge", Category::Book, 2.0, Utc::now());
        let id = flock.spawn(&e, Vec2::new(900.0, 600.0)).expect("spawn");
        let bounds = flock.resize(400.0, 300.0);
        let pos = flock.registry().find(id).expect("agent").position();
        assert!(bounds.contains(pos));
        assert_eq!(pos, Vec2::new(400.0, 300.0));
    }
}
