//! The host bridge.
//!
//! `Stage` is the only surface a host application talks to. Host calls go
//! in (`on_*`), sprites come out of [`Stage::frame`], and pointer input is
//! turned into [`StageEvent`]s the host drains after each frame.
//!
//! A `Stage` is usable as soon as it is constructed; there is no separate
//! "ready" state to wait for.

use std::collections::{HashSet, VecDeque};
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, info};

use logflock_core::config::FlockConfig;
use logflock_core::error::Result;
use logflock_core::metrics::{CounterSnapshot, TimingReport};
use logflock_core::registry::AgentRegistry;
use logflock_core::simulation::TickStats;
use logflock_core::{AffinityTable, AgentId, Flock, LogEntry, Vec2, WorldBounds};

use crate::events::StageEvent;
use crate::presenter::{Presenter, Sprite};

/// A stage behind a lock, for hosts that call in from several threads.
pub type SharedStage = Arc<Mutex<Stage>>;

/// Simulation plus presentation for one canvas.
#[derive(Debug)]
pub struct Stage {
    flock: Flock,
    presenter: Presenter,
    events: VecDeque<StageEvent>,
}

impl Stage {
    /// Build an empty stage.
    #[must_use]
    pub fn new(config: &FlockConfig) -> Self {
        Self {
            flock: Flock::new(config),
            presenter: Presenter::new(&config.presentation),
            events: VecDeque::new(),
        }
    }

    /// Replace the affinity table before the first frame.
    #[must_use]
    pub fn with_affinity(mut self, affinity: AffinityTable) -> Self {
        self.flock = self.flock.with_affinity(affinity);
        self
    }

    /// Wrap in a [`SharedStage`].
    #[must_use]
    pub fn shared(self) -> SharedStage {
        Arc::new(Mutex::new(self))
    }

    // -----------------------------------------------------------------------
    // Host → stage
    // -----------------------------------------------------------------------

    /// A new entry was logged. `x_pct`/`y_pct` place it as a percentage of
    /// the canvas (clamped to 0–100).
    ///
    /// # Errors
    /// Returns `FlockError::DuplicateAgent` if the entry already has an agent.
    pub fn on_entry_added(&mut self, entry: &LogEntry, x_pct: f32, y_pct: f32) -> Result<AgentId> {
        let id = self.flock.spawn_percent(entry, x_pct, y_pct)?;
        self.presenter.apply_to_new(self.flock.registry_mut(), id);
        Ok(id)
    }

    /// An entry was deleted. Unknown ids are ignored. Returns whether an
    /// agent was removed.
    pub fn on_entry_removed(&mut self, id: AgentId) -> bool {
        match self.flock.remove(id) {
            Ok(_) => {
                if self.presenter.forget(id) {
                    self.events.push_back(StageEvent::Hover(None));
                }
                true
            }
            Err(err) => {
                debug!(error = %err, "Ignoring removal of unknown agent");
                false
            }
        }
    }

    /// The log was reset. Returns how many agents were removed.
    pub fn on_reset(&mut self) -> usize {
        let removed = self.flock.clear_all();
        if self.presenter.forget_all() {
            self.events.push_back(StageEvent::Hover(None));
        }
        info!(removed, "Stage reset");
        removed
    }

    /// Highlight one agent, or none. Unknown ids are ignored.
    pub fn on_highlight_request(&mut self, id: Option<AgentId>) {
        if let Err(err) = self.presenter.set_highlighted(self.flock.registry_mut(), id) {
            debug!(error = %err, "Ignoring highlight request");
        }
    }

    /// Dim every agent outside `visible`; `None` clears the filter.
    pub fn on_visibility_filter_changed(&mut self, visible: Option<HashSet<AgentId>>) {
        self.presenter.set_visibility_filter(self.flock.registry_mut(), visible);
    }

    /// The canvas changed size.
    pub fn on_world_resized(&mut self, width: f32, height: f32) -> WorldBounds {
        self.flock.resize(width, height)
    }

    // -----------------------------------------------------------------------
    // Frame
    // -----------------------------------------------------------------------

    /// Advance the simulation by `dt` seconds and describe the result.
    pub fn frame(&mut self, dt: f32) -> Vec<Sprite> {
        self.tick(dt);
        self.sprites()
    }

    /// Advance the simulation without rendering.
    pub fn tick(&mut self, dt: f32) -> TickStats {
        self.flock.tick(dt)
    }

    /// Sprites for the current state.
    #[must_use]
    pub fn sprites(&self) -> Vec<Sprite> {
        self.presenter.render_all(self.flock.registry())
    }

    // -----------------------------------------------------------------------
    // Pointer → host
    // -----------------------------------------------------------------------

    /// Pointer pressed at a world position. Queues a click on the topmost
    /// interactive agent there, if any.
    pub fn pointer_down(&mut self, point: Vec2) -> Option<AgentId> {
        let hit = self.presenter.pick(self.flock.registry(), point);
        if let Some(id) = hit {
            self.events.push_back(StageEvent::Click(id));
        }
        hit
    }

    /// Pointer moved to a world position. Queues a hover event only when
    /// the agent under the pointer changed.
    pub fn pointer_move(&mut self, point: Vec2) {
        let hit = self.presenter.pick(self.flock.registry(), point);
        self.hover(hit);
    }

    /// Pointer left the canvas.
    pub fn pointer_leave(&mut self) {
        self.hover(None);
    }

    fn hover(&mut self, hit: Option<AgentId>) {
        if self.presenter.update_hover(hit) {
            self.events.push_back(StageEvent::Hover(hit));
        }
    }

    /// Take every queued event, oldest first.
    pub fn drain_events(&mut self) -> Vec<StageEvent> {
        self.events.drain(..).collect()
    }

    // -----------------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------------

    /// Live agents.
    #[must_use]
    pub fn registry(&self) -> &AgentRegistry {
        self.flock.registry()
    }

    /// Underlying simulation handle.
    #[must_use]
    pub fn flock(&self) -> &Flock {
        &self.flock
    }

    /// Highlight, filter and hover state.
    #[must_use]
    pub fn presenter(&self) -> &Presenter {
        &self.presenter
    }

    /// Current canvas bounds.
    #[must_use]
    pub fn bounds(&self) -> WorldBounds {
        self.flock.bounds()
    }

    /// Counter values, e.g. for a debug overlay.
    #[must_use]
    pub fn counters(&self) -> CounterSnapshot {
        self.flock.counters().snapshot()
    }

    /// Recent tick times, e.g. for the same overlay.
    #[must_use]
    pub fn timings(&self) -> TimingReport {
        self.flock.timings().report()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use logflock_core::{Category, FlockError};

    fn stage() -> Stage {
        let mut config = FlockConfig::default();
        config.general.seed = Some(21);
        Stage::new(&config)
    }

    #[test]
    fn duplicate_entry_reported_to_caller() {
        let mut stage = stage();
        let e = LogEntry::new("a", Category::Book, 3.0, Utc::now());
        stage.on_entry_added(&e, 10.0, 10.0).expect("first add");
        assert!(matches!(
            stage.on_entry_added(&e, 10.0, 10.0),
            Err(FlockError::DuplicateAgent(_))
        ));
    }

    #[test]
    fn unknown_ids_are_absorbed() {
        let mut stage = stage();
        let stranger = AgentId::new();
        assert!(!stage.on_entry_removed(stranger));
        stage.on_highlight_request(Some(stranger));
        assert_eq!(stage.presenter().highlighted(), None);
    }

    #[test]
    fn timings_follow_integrated_frames() {
        let mut stage = stage();
        let e = LogEntry::new("a", Category::Food, 3.0, Utc::now());
        stage.on_entry_added(&e, 30.0, 30.0).expect("add");
        stage.frame(0.016);
        stage.frame(0.0);
        stage.frame(0.016);
        let timings = stage.timings();
        assert_eq!(timings.window, 2);
        assert_eq!(timings.budget_us, 4_000);
        assert!(timings.worst_us >= timings.median_us);
        assert!(timings.overlay_line().starts_with("tick p50 "));
    }

    #[test]
    fn hovered_agent_removal_emits_hover_none() {
        let mut stage = stage();
        let e = LogEntry::new("a", Category::Hike, 3.0, Utc::now());
        let id = stage.on_entry_added(&e, 50.0, 50.0).expect("add");
        let at = stage.registry().find(id).expect("agent").position();
        stage.pointer_move(at);
        assert!(stage.on_entry_removed(id));
        assert_eq!(
            stage.drain_events(),
            vec![StageEvent::Hover(Some(id)), StageEvent::Hover(None)]
        );
        assert!(stage.drain_events().is_empty());
    }
}
