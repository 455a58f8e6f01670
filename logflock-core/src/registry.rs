//! The agent registry — sole owner of every live character.
//!
//! Agents live in a dense arena (`Vec<Agent>`) with an id → slot map beside
//! it. Removal swap-removes, so iteration order is spawn order until the
//! first removal. Position and velocity can only be written from inside this
//! crate (the steering step) or through [`AgentRegistry::place`]; the
//! presentation layer gets `&mut VisualState` and nothing else.

use std::collections::HashMap;
use std::f32::consts::TAU;

use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{FlockError, Result};
use crate::personality::{self, Personality};
use crate::types::{AgentId, Facing, LogEntry, Vec2};

/// Ephemeral draw state. Written by the presentation layer only.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VisualState {
    /// Category tint the agent was born with.
    pub base_color: u32,
    /// Tint currently drawn (base or highlight).
    pub current_tint: u32,
    /// Sprite scale.
    pub scale: f32,
    /// Opacity, 1.0 unless dimmed by a filter.
    pub alpha: f32,
}

/// One simulated character.
#[derive(Debug, Clone)]
pub struct Agent {
    id: AgentId,
    pub(crate) position: Vec2,
    pub(crate) velocity: Vec2,
    pub(crate) facing: Facing,
    personality: Personality,
    /// Draw state owned by the presentation layer.
    pub visual: VisualState,
}

impl Agent {
    /// Agent id (same as its log entry).
    #[must_use]
    pub fn id(&self) -> AgentId {
        self.id
    }

    /// Current position in world space.
    #[must_use]
    pub fn position(&self) -> Vec2 {
        self.position
    }

    /// Current velocity (px/s).
    #[must_use]
    pub fn velocity(&self) -> Vec2 {
        self.velocity
    }

    /// Current speed (px/s).
    #[must_use]
    pub fn speed(&self) -> f32 {
        self.velocity.length()
    }

    /// Sprite facing, derived from horizontal velocity.
    #[must_use]
    pub fn facing(&self) -> Facing {
        self.facing
    }

    /// Behavioural profile fixed at spawn.
    #[must_use]
    pub fn personality(&self) -> &Personality {
        &self.personality
    }
}

/// Arena of live agents plus the RNG used for headings.
#[derive(Debug)]
pub struct AgentRegistry {
    agents: Vec<Agent>,
    slots: HashMap<AgentId, usize>,
    rng: StdRng,
}

impl AgentRegistry {
    /// Create an empty registry. A `seed` makes spawn headings and tick
    /// results reproducible.
    #[must_use]
    pub fn new(seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            agents: Vec::new(),
            slots: HashMap::new(),
            rng,
        }
    }

    /// Spawn an agent for `entry` at `position`, deriving its personality
    /// against the wall clock.
    ///
    /// # Errors
    /// Returns `FlockError::DuplicateAgent` if the entry already has an agent.
    pub fn spawn(&mut self, entry: &LogEntry, position: Vec2) -> Result<AgentId> {
        self.spawn_at(entry, position, Utc::now())
    }

    /// Spawn with an explicit "now" for recency.
    ///
    /// The agent starts at half its cruising speed in a uniformly random
    /// direction.
    ///
    /// # Errors
    /// Returns `FlockError::DuplicateAgent` if the entry already has an agent.
    pub fn spawn_at(&mut self, entry: &LogEntry, position: Vec2, now: DateTime<Utc>) -> Result<AgentId> {
        if self.slots.contains_key(&entry.id) {
            return Err(FlockError::DuplicateAgent(entry.id));
        }

        let personality = personality::derive(entry, now);
        let heading = Vec2::from_angle(self.rng.gen_range(0.0..TAU));
        let velocity = heading * (0.5 * personality.max_speed);
        let base_color = personality.category.profile().color;

        let agent = Agent {
            id: entry.id,
            position,
            velocity,
            facing: if velocity.x < 0.0 { Facing::Left } else { Facing::Right },
            visual: VisualState {
                base_color,
                current_tint: base_color,
                scale: personality.scale(),
                alpha: 1.0,
            },
            personality,
        };

        debug!(
            id = %entry.id,
            category = %agent.personality.category,
            max_speed = agent.personality.max_speed,
            position = %position,
            "Spawned agent"
        );

        self.slots.insert(entry.id, self.agents.len());
        self.agents.push(agent);
        Ok(entry.id)
    }

    /// Remove a single agent.
    ///
    /// # Errors
    /// Returns `FlockError::UnknownAgent` if no such agent is live.
    pub fn remove(&mut self, id: AgentId) -> Result<Agent> {
        let slot = self.slots.remove(&id).ok_or(FlockError::UnknownAgent(id))?;
        let removed = self.agents.swap_remove(slot);
        if let Some(moved) = self.agents.get(slot) {
            self.slots.insert(moved.id, slot);
        }
        debug!(id = %id, "Removed agent");
        Ok(removed)
    }

    /// Destroy every agent. Safe on an empty registry. Returns how many were
    /// removed.
    pub fn clear_all(&mut self) -> usize {
        let count = self.agents.len();
        self.agents.clear();
        self.slots.clear();
        if count > 0 {
            info!(count, "Cleared all agents");
        }
        count
    }

    /// Move an agent and set its velocity, e.g. when a host restores a saved
    /// layout.
    ///
    /// # Errors
    /// Returns `FlockError::UnknownAgent` if no such agent is live.
    pub fn place(&mut self, id: AgentId, position: Vec2, velocity: Vec2) -> Result<()> {
        let slot = *self.slots.get(&id).ok_or(FlockError::UnknownAgent(id))?;
        let agent = &mut self.agents[slot];
        agent.position = position;
        agent.velocity = velocity;
        if velocity.x < 0.0 {
            agent.facing = Facing::Left;
        } else if velocity.x > 0.0 {
            agent.facing = Facing::Right;
        }
        Ok(())
    }

    /// Look up a live agent.
    #[must_use]
    pub fn find(&self, id: AgentId) -> Option<&Agent> {
        self.slots.get(&id).map(|&slot| &self.agents[slot])
    }

    /// Mutable access to an agent's draw state.
    #[must_use]
    pub fn visual_mut(&mut self, id: AgentId) -> Option<&mut VisualState> {
        let slot = *self.slots.get(&id)?;
        Some(&mut self.agents[slot].visual)
    }

    /// Whether `id` has a live agent.
    #[must_use]
    pub fn contains(&self, id: AgentId) -> bool {
        self.slots.contains_key(&id)
    }

    /// Live agents in arena order.
    pub fn iter(&self) -> impl Iterator<Item = &Agent> {
        self.agents.iter()
    }

    /// Draw state of every live agent, in arena order.
    pub fn visuals_mut(&mut self) -> impl Iterator<Item = (AgentId, &mut VisualState)> {
        self.agents.iter_mut().map(|a| (a.id, &mut a.visual))
    }

    /// Number of live agents.
    #[must_use]
    pub fn len(&self) -> usize {
        self.agents.len()
    }

    /// Whether no agents are live.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }

    /// Split borrow used by the steering step.
    pub(crate) fn agents_and_rng(&mut self) -> (&mut [Agent], &mut StdRng) {
        (&mut self.agents, &mut self.rng)
    }
}

impl Default for AgentRegistry {
    fn default() -> Self {
        Self::new(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Category;

    fn entry(category: Category) -> LogEntry {
        LogEntry::new("test", category, 3.0, Utc::now())
    }

    #[test]
    fn spawn_and_find() {
        let mut registry = AgentRegistry::new(Some(1));
        let e = entry(Category::Gym);
        let id = registry.spawn(&e, Vec2::new(10.0, 20.0)).expect("spawn");
        let agent = registry.find(id).expect("agent exists");
        assert_eq!(agent.position(), Vec2::new(10.0, 20.0));
        assert!((agent.speed() - 0.5 * agent.personality().max_speed).abs() < 1e-3);
        assert_eq!(agent.visual.current_tint, Category::Gym.profile().color);
        assert!((agent.visual.alpha - 1.0).abs() < f32::EPSILON);
    }

    #[test]
    fn duplicate_spawn_is_rejected() {
        let mut registry = AgentRegistry::new(Some(1));
        let e = entry(Category::Book);
        registry.spawn(&e, Vec2::ZERO).expect("first spawn");
        assert!(matches!(
            registry.spawn(&e, Vec2::ZERO),
            Err(FlockError::DuplicateAgent(id)) if id == e.id
        ));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn remove_keeps_slots_consistent() {
        let mut registry = AgentRegistry::new(Some(2));
        let entries: Vec<LogEntry> = (0..5).map(|_| entry(Category::Food)).collect();
        for (i, e) in entries.iter().enumerate() {
            registry.spawn(e, Vec2::new(i as f32, 0.0)).expect("spawn");
        }
        registry.remove(entries[1].id).expect("remove");
        assert!(!registry.contains(entries[1].id));
        for (i, e) in entries.iter().enumerate().filter(|(i, _)| *i != 1) {
            let agent = registry.find(e.id).expect("still live");
            assert_eq!(agent.position(), Vec2::new(i as f32, 0.0));
        }
        assert!(matches!(
            registry.remove(entries[1].id),
            Err(FlockError::UnknownAgent(_))
        ));
    }

    #[test]
    fn clear_all_is_idempotent() {
        let mut registry = AgentRegistry::new(Some(3));
        for _ in 0..4 {
            registry.spawn(&entry(Category::Hike), Vec2::ZERO).expect("spawn");
        }
        assert_eq!(registry.clear_all(), 4);
        assert_eq!(registry.clear_all(), 0);
        assert!(registry.is_empty());
        assert_eq!(registry.iter().count(), 0);
    }

    #[test]
    fn seeded_headings_are_reproducible() {
        let e = entry(Category::Sport);
        let mut a = AgentRegistry::new(Some(42));
        let mut b = AgentRegistry::new(Some(42));
        a.spawn(&e, Vec2::ZERO).expect("spawn");
        b.spawn(&e, Vec2::ZERO).expect("spawn");
        assert_eq!(
            a.find(e.id).map(Agent::velocity),
            b.find(e.id).map(Agent::velocity)
        );
    }

    #[test]
    fn place_updates_facing() {
        let mut registry = AgentRegistry::new(Some(4));
        let e = entry(Category::Game);
        registry.spawn(&e, Vec2::ZERO).expect("spawn");
        registry.place(e.id, Vec2::new(5.0, 5.0), Vec2::new(-3.0, 0.0)).expect("place");
        let agent = registry.find(e.id).expect("agent");
        assert_eq!(agent.facing(), Facing::Left);
        assert_eq!(agent.position(), Vec2::new(5.0, 5.0));
    }
}
