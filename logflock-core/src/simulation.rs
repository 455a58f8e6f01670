//! The per-frame steering step.
//!
//! Every tick reads a snapshot of all agents, accumulates six forces per
//! agent, then integrates all agents at once. Because forces are computed
//! from the snapshot, the result does not depend on arena order.
//!
//! ## Rules (per agent `s`, awareness radius `R`)
//!
//! | # | Rule        | Who                                  | Magnitude                                   |
//! |---|-------------|--------------------------------------|---------------------------------------------|
//! | 1 | Separation  | neighbours closer than `min_dist`    | `(min_dist − d) / min_dist × 90`, away      |
//! | 2 | Cohesion    | same-category neighbours             | `14` toward centroid if farther than width  |
//! | 3 | Alignment   | same-category neighbours             | `0.05 × (avg_v − v)`                        |
//! | 4 | Affinity    | other-category neighbours            | `a × (1 − d / R) × 28`, toward (a > 0)      |
//! | 5 | Gravity     | anyone rated > 3 within 280 px       | `(r − 3) × 1.8 × (1 − d / 280) × 4.5`       |
//! | 6 | Same-day    | same calendar day, farther than 110  | `6`, toward                                 |
//!
//! Then `v += F × dt`, clamp speed into `[floor, ceiling]`, move, bounce.

use std::collections::HashMap;
use std::f32::consts::TAU;
use std::time::Instant;

use chrono::NaiveDate;
use rand::Rng;
use rand::rngs::StdRng;
use tracing::{debug, warn};

use crate::affinity::AffinityTable;
use crate::config::{FlockConfig, SteeringConfig};
use crate::registry::{Agent, AgentRegistry};
use crate::spatial::{self, BruteForceIndex, NeighborIndex};
use crate::types::{Category, Facing, Vec2, WorldBounds};

/// What one tick did.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TickStats {
    /// Agents integrated.
    pub agents: usize,
    /// Neighbour pairs visited inside awareness radii.
    pub neighbor_pairs: usize,
    /// The `dt` actually integrated, after clamping.
    pub dt: f32,
    /// Wall time spent in the tick.
    pub elapsed_us: u64,
}

/// Frozen per-agent state read while forces are accumulated.
#[derive(Debug, Clone, Copy)]
struct Snapshot {
    position: Vec2,
    velocity: Vec2,
    category: Category,
    rating: f32,
    day: NaiveDate,
    size: f32,
    awareness_radius: f32,
}

impl Snapshot {
    fn of(agent: &Agent) -> Self {
        let p = agent.personality();
        Self {
            position: agent.position,
            velocity: agent.velocity,
            category: p.category,
            rating: p.rating,
            day: p.day,
            size: p.body_size(),
            awareness_radius: p.awareness_radius,
        }
    }
}

/// Steering parameters plus reusable per-tick buffers. Holds no agent state
/// between ticks.
pub struct Simulation {
    steering: SteeringConfig,
    affinity: AffinityTable,
    bounds: WorldBounds,
    max_dt: f32,
    index: Box<dyn NeighborIndex>,
    snapshots: Vec<Snapshot>,
    positions: Vec<Vec2>,
    forces: Vec<Vec2>,
    days: HashMap<NaiveDate, Vec<usize>>,
}

impl std::fmt::Debug for Simulation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Simulation")
            .field("steering", &self.steering)
            .field("bounds", &self.bounds)
            .field("max_dt", &self.max_dt)
            .finish_non_exhaustive()
    }
}

impl Simulation {
    /// Build a simulation from config, using the standard affinity table.
    #[must_use]
    pub fn new(config: &FlockConfig) -> Self {
        Self {
            steering: config.steering.clone(),
            affinity: AffinityTable::standard(),
            bounds: config.world.bounds(),
            max_dt: config.simulation.max_dt,
            index: spatial::build_index(&config.simulation),
            snapshots: Vec::new(),
            positions: Vec::new(),
            forces: Vec::new(),
            days: HashMap::new(),
        }
    }

    /// Replace the affinity table. Meant for setup, before the first tick.
    #[must_use]
    pub fn with_affinity(mut self, affinity: AffinityTable) -> Self {
        self.affinity = affinity;
        self
    }

    /// Replace the neighbour index.
    #[must_use]
    pub fn with_index(mut self, index: Box<dyn NeighborIndex>) -> Self {
        self.index = index;
        self
    }

    /// Current world bounds.
    #[must_use]
    pub fn bounds(&self) -> WorldBounds {
        self.bounds
    }

    /// Change the world bounds. Agents outside are pulled in on the next tick.
    pub fn set_bounds(&mut self, bounds: WorldBounds) {
        self.bounds = bounds;
    }

    /// Affinity table in use.
    #[must_use]
    pub fn affinity(&self) -> &AffinityTable {
        &self.affinity
    }

    /// Steering constants in use.
    #[must_use]
    pub fn steering(&self) -> &SteeringConfig {
        &self.steering
    }

    /// Advance every live agent by `dt` seconds.
    ///
    /// A non-finite or non-positive `dt` does nothing; a `dt` above
    /// `max_dt` is clamped.
    pub fn tick(&mut self, registry: &mut AgentRegistry, dt: f32) -> TickStats {
        let start = Instant::now();
        if !(dt.is_finite() && dt > 0.0) {
            return TickStats { agents: registry.len(), ..TickStats::default() };
        }
        let dt = dt.min(self.max_dt);

        let (agents, rng) = registry.agents_and_rng();
        if agents.is_empty() {
            return TickStats { dt, ..TickStats::default() };
        }

        self.take_snapshot(agents);
        if let Err(err) = self.index.rebuild(&self.positions) {
            warn!(error = %err, "Neighbour index rebuild failed, falling back to brute force");
            let mut fallback = BruteForceIndex::default();
            // Brute-force rebuild cannot fail.
            let _ = fallback.rebuild(&self.positions);
            self.index = Box::new(fallback);
        }

        let mut neighbor_pairs = 0;
        self.forces.clear();
        for i in 0..self.snapshots.len() {
            let (force, pairs) = self.steering_force(i);
            self.forces.push(force);
            neighbor_pairs += pairs;
        }

        for (agent, &force) in agents.iter_mut().zip(&self.forces) {
            integrate(agent, force, dt, &self.steering, self.bounds, rng);
        }

        let elapsed_us = u64::try_from(start.elapsed().as_micros()).unwrap_or(u64::MAX);
        debug!(agents = self.snapshots.len(), neighbor_pairs, elapsed_us, "Tick complete");
        TickStats {
            agents: self.snapshots.len(),
            neighbor_pairs,
            dt,
            elapsed_us,
        }
    }

    fn take_snapshot(&mut self, agents: &[Agent]) {
        self.snapshots.clear();
        self.positions.clear();
        for group in self.days.values_mut() {
            group.clear();
        }
        for (i, agent) in agents.iter().enumerate() {
            let snap = Snapshot::of(agent);
            self.positions.push(snap.position);
            self.days.entry(snap.day).or_default().push(i);
            self.snapshots.push(snap);
        }
        self.days.retain(|_, group| !group.is_empty());
    }

    /// Sum of all six rules acting on agent `i`, plus how many neighbours
    /// were inside its awareness radius.
    fn steering_force(&self, i: usize) -> (Vec2, usize) {
        let me = self.snapshots[i];
        let s = &self.steering;
        let mut force = Vec2::ZERO;

        // Neighbour rules: separation, cohesion, alignment, affinity.
        let mut pairs = 0;
        let mut same_count = 0_u32;
        let mut centroid_sum = Vec2::ZERO;
        let mut velocity_sum = Vec2::ZERO;
        self.index.neighbors_within(i, me.awareness_radius, &mut |j, dist| {
            let dist = dist.into_inner();
            let other = &self.snapshots[j];
            let delta = other.position - me.position;
            pairs += 1;

            let min_dist = s.separation_factor * (me.size + other.size);
            if dist < min_dist && min_dist > 0.0 {
                let away = if dist > f32::EPSILON { -delta / dist } else { coincident_axis(i, j) };
                force += away * ((min_dist - dist) / min_dist * s.separation_strength);
            }

            if other.category == me.category {
                same_count += 1;
                centroid_sum += other.position;
                velocity_sum += other.velocity;
            } else {
                let score = self.affinity.get(me.category, other.category);
                if score != 0.0 && dist > f32::EPSILON {
                    let falloff = 1.0 - dist / me.awareness_radius;
                    force += delta / dist * (score * falloff * s.affinity_strength);
                }
            }
        });

        if same_count > 0 {
            #[allow(clippy::cast_precision_loss)]
            let n = same_count as f32;
            let to_centroid = centroid_sum / n - me.position;
            if to_centroid.length() > me.size {
                force += to_centroid.normalized() * s.cohesion_strength;
            }
            force += (velocity_sum / n - me.velocity) * s.alignment_blend;
        }

        // Rating gravity: only highly rated agents pull, nobody pushes.
        self.index.neighbors_within(i, s.gravity_radius, &mut |j, dist| {
            let dist = dist.into_inner();
            let other = &self.snapshots[j];
            if other.rating > s.gravity_rating_threshold && dist > f32::EPSILON {
                let pull = (other.rating - s.gravity_rating_threshold)
                    * s.gravity_rating_scale
                    * (1.0 - dist / s.gravity_radius)
                    * s.gravity_strength;
                force += (other.position - me.position) / dist * pull;
            }
        });

        // Same-day bond: constant spring beyond the bond distance.
        if let Some(group) = self.days.get(&me.day) {
            for &j in group {
                if j == i {
                    continue;
                }
                let delta = self.snapshots[j].position - me.position;
                let dist = delta.length();
                if dist > s.bond_distance {
                    force += delta / dist * s.bond_strength;
                }
            }
        }

        (force, pairs)
    }
}

/// Push direction for two agents sitting on the same spot: opposite ends of
/// the x axis, decided by arena order so the pair always splits.
fn coincident_axis(i: usize, j: usize) -> Vec2 {
    if i < j { Vec2::new(-1.0, 0.0) } else { Vec2::new(1.0, 0.0) }
}

/// Apply `force` for `dt`, clamp speed, move, and bounce off the walls.
fn integrate(
    agent: &mut Agent,
    force: Vec2,
    dt: f32,
    s: &SteeringConfig,
    bounds: WorldBounds,
    rng: &mut StdRng,
) {
    let p = agent.personality();
    let ceiling = p.max_speed + p.recency * s.recency_speed_boost;
    let floor = (s.min_speed + 0.5 * p.recency * s.recency_speed_boost).min(ceiling);

    let mut v = agent.velocity + force * dt;
    if !v.is_finite() {
        v = Vec2::ZERO;
    }
    let speed = v.length();
    if speed > ceiling {
        v = v * (ceiling / speed);
    } else if speed == 0.0 {
        v = Vec2::from_angle(rng.gen_range(0.0..TAU)) * floor;
    } else if speed < floor {
        v = v * (floor / speed);
    }

    let mut pos = agent.position + v * dt;
    bounce_axis(&mut pos.x, &mut v.x, bounds.width);
    bounce_axis(&mut pos.y, &mut v.y, bounds.height);

    agent.position = pos;
    agent.velocity = v;
    if v.x < 0.0 {
        agent.facing = Facing::Left;
    } else if v.x > 0.0 {
        agent.facing = Facing::Right;
    }
}

/// Reflect a coordinate off `[0, max]`, reversing the velocity component.
fn bounce_axis(pos: &mut f32, vel: &mut f32, max: f32) {
    if !pos.is_finite() {
        *pos = max * 0.5;
    }
    if *pos < 0.0 {
        *pos = -*pos;
        *vel = vel.abs();
    } else if *pos > max {
        *pos = 2.0 * max - *pos;
        *vel = -vel.abs();
    }
    *pos = pos.clamp(0.0, max);
}
