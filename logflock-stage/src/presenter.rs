//! Presentation adapter — agents in, sprites out; pointer in, agent ids out.
//!
//! The presenter owns the highlight, the visibility filter and the hover
//! state, and writes the result into each agent's [`VisualState`]. It never
//! touches position or velocity.
//!
//! [`VisualState`]: logflock_core::registry::VisualState

use std::collections::HashSet;

use serde::Serialize;
use tracing::debug;

use logflock_core::config::PresentationConfig;
use logflock_core::error::{FlockError, Result};
use logflock_core::registry::{Agent, AgentRegistry};
use logflock_core::{AgentId, Facing, Shape, Vec2};

/// Draw description of one agent for one frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Sprite {
    /// Agent (and log entry) id.
    pub id: AgentId,
    /// Silhouette of the agent's category.
    pub shape: Shape,
    /// 0xRRGGBB tint: category colour, or the highlight tint.
    pub color: u32,
    /// Sprite scale (`0.35 + rating × 0.1`).
    pub scale: f32,
    /// Opacity: 1.0, or the dimmed alpha when filtered out.
    pub alpha: f32,
    /// World position.
    pub position: Vec2,
    /// Horizontal facing.
    pub facing: Facing,
    /// Category label, for tooltips.
    pub label: &'static str,
}

/// Highlight, filter and hover state.
#[derive(Debug, Clone)]
pub struct Presenter {
    highlight_tint: u32,
    dimmed_alpha: f32,
    dimmed_interactive: bool,
    highlighted: Option<AgentId>,
    visible: Option<HashSet<AgentId>>,
    hovered: Option<AgentId>,
}

impl Presenter {
    /// Create a presenter with nothing highlighted and no filter.
    #[must_use]
    pub fn new(config: &PresentationConfig) -> Self {
        Self {
            highlight_tint: config.highlight_tint,
            dimmed_alpha: config.dimmed_alpha,
            dimmed_interactive: config.dimmed_interactive,
            highlighted: None,
            visible: None,
            hovered: None,
        }
    }

    /// Describe how `agent` should be drawn.
    #[must_use]
    pub fn render(&self, agent: &Agent) -> Sprite {
        let profile = agent.personality().category.profile();
        Sprite {
            id: agent.id(),
            shape: profile.shape,
            color: agent.visual.current_tint,
            scale: agent.visual.scale,
            alpha: agent.visual.alpha,
            position: agent.position(),
            facing: agent.facing(),
            label: profile.label,
        }
    }

    /// Sprites for every live agent, in draw order.
    #[must_use]
    pub fn render_all(&self, registry: &AgentRegistry) -> Vec<Sprite> {
        registry.iter().map(|a| self.render(a)).collect()
    }

    /// Highlight `id`, or clear the highlight with `None`. The previously
    /// highlighted agent gets its category tint back.
    ///
    /// # Errors
    /// Returns `FlockError::UnknownAgent` if `id` is not live; nothing
    /// changes in that case.
    pub fn set_highlighted(&mut self, registry: &mut AgentRegistry, id: Option<AgentId>) -> Result<()> {
        if let Some(target) = id {
            if !registry.contains(target) {
                return Err(FlockError::UnknownAgent(target));
            }
        }

        if let Some(previous) = self.highlighted.take() {
            if let Some(visual) = registry.visual_mut(previous) {
                visual.current_tint = visual.base_color;
            }
        }

        if let Some(target) = id {
            if let Some(visual) = registry.visual_mut(target) {
                visual.current_tint = self.highlight_tint;
            }
            self.highlighted = Some(target);
        }
        debug!(highlighted = ?self.highlighted, "Highlight changed");
        Ok(())
    }

    /// Dim every agent not in `visible`; `None` shows everyone. Ids with no
    /// live agent are ignored.
    pub fn set_visibility_filter(&mut self, registry: &mut AgentRegistry, visible: Option<HashSet<AgentId>>) {
        self.visible = visible;
        let mut dimmed = 0_usize;
        for (id, visual) in registry.visuals_mut() {
            let alpha = self.alpha_for(id);
            if alpha < 1.0 {
                dimmed += 1;
            }
            visual.alpha = alpha;
        }
        debug!(active = self.visible.is_some(), dimmed, "Visibility filter applied");
    }

    /// Bring a freshly spawned agent in line with the current filter.
    pub fn apply_to_new(&self, registry: &mut AgentRegistry, id: AgentId) {
        let alpha = self.alpha_for(id);
        if let Some(visual) = registry.visual_mut(id) {
            visual.alpha = alpha;
        }
    }

    /// Drop any reference to an agent that no longer exists. Returns `true`
    /// if it was the hovered agent.
    pub fn forget(&mut self, id: AgentId) -> bool {
        if self.highlighted == Some(id) {
            self.highlighted = None;
        }
        if self.hovered == Some(id) {
            self.hovered = None;
            return true;
        }
        false
    }

    /// Drop highlight and hover after every agent was removed. The filter
    /// stays, so entries added later are dimmed consistently. Returns `true`
    /// if something was hovered.
    pub fn forget_all(&mut self) -> bool {
        self.highlighted = None;
        self.hovered.take().is_some()
    }

    /// Topmost interactive agent under `point`. Later agents are drawn on
    /// top, so the last hit wins.
    #[must_use]
    pub fn pick(&self, registry: &AgentRegistry, point: Vec2) -> Option<AgentId> {
        let hits: Vec<AgentId> = registry
            .iter()
            .filter(|a| self.is_interactive(a.id()))
            .filter(|a| a.position().distance(point) <= a.personality().body_size() * 0.5)
            .map(Agent::id)
            .collect();
        hits.last().copied()
    }

    /// Record the agent under the pointer. Returns `true` if the hover
    /// target changed.
    pub fn update_hover(&mut self, hit: Option<AgentId>) -> bool {
        if hit == self.hovered {
            return false;
        }
        self.hovered = hit;
        true
    }

    /// Whether pointer input reaches `id`.
    #[must_use]
    pub fn is_interactive(&self, id: AgentId) -> bool {
        self.dimmed_interactive || self.is_visible(id)
    }

    /// Whether `id` passes the current filter.
    #[must_use]
    pub fn is_visible(&self, id: AgentId) -> bool {
        self.visible.as_ref().is_none_or(|set| set.contains(&id))
    }

    /// Currently highlighted agent.
    #[must_use]
    pub fn highlighted(&self) -> Option<AgentId> {
        self.highlighted
    }

    /// Agent under the pointer.
    #[must_use]
    pub fn hovered(&self) -> Option<AgentId> {
        self.hovered
    }

    fn alpha_for(&self, id: AgentId) -> f32 {
        if self.is_visible(id) { 1.0 } else { self.dimmed_alpha }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use logflock_core::{Category, LogEntry};

    fn setup(n: usize) -> (Presenter, AgentRegistry, Vec<AgentId>) {
        let mut registry = AgentRegistry::new(Some(5));
        let ids = (0..n)
            .map(|i| {
                #[allow(clippy::cast_precision_loss)]
                let x = 100.0 * i as f32;
                let e = LogEntry::new("p", Category::Game, 3.0, Utc::now());
                registry.spawn(&e, Vec2::new(x, 50.0)).expect("spawn")
            })
            .collect();
        (Presenter::new(&PresentationConfig::default()), registry, ids)
    }

    fn tint(registry: &AgentRegistry, id: AgentId) -> u32 {
        registry.find(id).expect("agent").visual.current_tint
    }

    #[test]
    fn highlight_is_exclusive() {
        let (mut presenter, mut registry, ids) = setup(2);
        let base = Category::Game.profile().color;
        presenter.set_highlighted(&mut registry, Some(ids[0])).expect("highlight");
        presenter.set_highlighted(&mut registry, Some(ids[1])).expect("highlight");
        assert_eq!(tint(&registry, ids[0]), base);
        assert_eq!(tint(&registry, ids[1]), 0x00ff_ffff);
        assert_eq!(presenter.highlighted(), Some(ids[1]));

        presenter.set_highlighted(&mut registry, None).expect("clear");
        assert_eq!(tint(&registry, ids[1]), base);
    }

    #[test]
    fn unknown_highlight_changes_nothing() {
        let (mut presenter, mut registry, ids) = setup(1);
        presenter.set_highlighted(&mut registry, Some(ids[0])).expect("highlight");
        let stranger = AgentId::new();
        assert!(matches!(
            presenter.set_highlighted(&mut registry, Some(stranger)),
            Err(FlockError::UnknownAgent(_))
        ));
        assert_eq!(presenter.highlighted(), Some(ids[0]));
    }

    #[test]
    fn filter_dims_and_restores() {
        let (mut presenter, mut registry, ids) = setup(3);
        let visible: HashSet<AgentId> = std::iter::once(ids[1]).collect();
        presenter.set_visibility_filter(&mut registry, Some(visible));
        let alphas: Vec<f32> = registry.iter().map(|a| a.visual.alpha).collect();
        assert!((alphas[0] - 0.12).abs() < f32::EPSILON);
        assert!((alphas[1] - 1.0).abs() < f32::EPSILON);
        assert!((alphas[2] - 0.12).abs() < f32::EPSILON);

        presenter.set_visibility_filter(&mut registry, None);
        assert!(registry.iter().all(|a| (a.visual.alpha - 1.0).abs() < f32::EPSILON));
    }

    #[test]
    fn render_reflects_visual_state() {
        let (mut presenter, mut registry, ids) = setup(1);
        presenter.set_highlighted(&mut registry, Some(ids[0])).expect("highlight");
        let sprite = presenter.render(registry.find(ids[0]).expect("agent"));
        assert_eq!(sprite.shape, Shape::Diamond);
        assert_eq!(sprite.color, 0x00ff_ffff);
        assert!((sprite.scale - 0.65).abs() < 1e-6);
        assert_eq!(sprite.label, "Video Game");
    }

    #[test]
    fn pick_skips_dimmed_and_prefers_topmost() {
        let (mut presenter, mut registry, ids) = setup(2);
        // Stack the second agent on the first.
        registry.place(ids[1], Vec2::new(0.0, 50.0), Vec2::ZERO).expect("place");
        assert_eq!(presenter.pick(&registry, Vec2::new(2.0, 50.0)), Some(ids[1]));

        let visible: HashSet<AgentId> = std::iter::once(ids[0]).collect();
        presenter.set_visibility_filter(&mut registry, Some(visible));
        assert_eq!(presenter.pick(&registry, Vec2::new(2.0, 50.0)), Some(ids[0]));
        assert_eq!(presenter.pick(&registry, Vec2::new(500.0, 500.0)), None);
    }

    #[test]
    fn hover_reports_changes_only() {
        let (mut presenter, _, ids) = setup(1);
        assert!(presenter.update_hover(Some(ids[0])));
        assert_eq!(presenter.hovered(), Some(ids[0]));
        assert!(!presenter.update_hover(Some(ids[0])));
        assert!(presenter.update_hover(None));
        assert!(!presenter.update_hover(None));
    }
}
