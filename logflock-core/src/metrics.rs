//! Runtime metrics and frame-budget monitoring.
//!
//! Lock-free `AtomicU64` counters for registry churn and ticks, plus a
//! rolling window of tick times behind a `parking_lot::Mutex`. The window
//! owns the frame-budget check; `Flock::tick` logs when it trips.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;

// ---------------------------------------------------------------------------
// Counters (lock-free)
// ---------------------------------------------------------------------------

/// Atomic counters for high-frequency events.
#[derive(Debug)]
pub struct FlockCounters {
    /// Agents spawned since startup.
    pub agents_spawned: AtomicU64,
    /// Agents removed individually.
    pub agents_removed: AtomicU64,
    /// Spawns rejected because the id was already live.
    pub duplicate_spawns: AtomicU64,
    /// `clear_all` calls that removed at least one agent.
    pub clears: AtomicU64,
    /// Ticks integrated.
    pub ticks: AtomicU64,
}

impl FlockCounters {
    /// Create a new set of zeroed counters.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            agents_spawned: AtomicU64::new(0),
            agents_removed: AtomicU64::new(0),
            duplicate_spawns: AtomicU64::new(0),
            clears: AtomicU64::new(0),
            ticks: AtomicU64::new(0),
        }
    }

    /// Bump a counter by one.
    pub fn incr(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    /// Snapshot all counters for export.
    #[must_use]
    pub fn snapshot(&self) -> CounterSnapshot {
        CounterSnapshot {
            agents_spawned: self.agents_spawned.load(Ordering::Relaxed),
            agents_removed: self.agents_removed.load(Ordering::Relaxed),
            duplicate_spawns: self.duplicate_spawns.load(Ordering::Relaxed),
            clears: self.clears.load(Ordering::Relaxed),
            ticks: self.ticks.load(Ordering::Relaxed),
        }
    }
}

impl Default for FlockCounters {
    fn default() -> Self {
        Self::new()
    }
}

/// A snapshot of counter values at a point in time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CounterSnapshot {
    /// Agents spawned.
    pub agents_spawned: u64,
    /// Agents removed individually.
    pub agents_removed: u64,
    /// Rejected duplicate spawns.
    pub duplicate_spawns: u64,
    /// Non-empty clears.
    pub clears: u64,
    /// Ticks integrated.
    pub ticks: u64,
}

impl CounterSnapshot {
    /// Format as Prometheus-compatible text.
    #[must_use]
    pub fn to_prometheus(&self) -> String {
        format!(
            "# HELP logflock_agents_spawned_total Agents spawned\n\
             # TYPE logflock_agents_spawned_total counter\n\
             logflock_agents_spawned_total {}\n\
             # HELP logflock_agents_removed_total Agents removed individually\n\
             # TYPE logflock_agents_removed_total counter\n\
             logflock_agents_removed_total {}\n\
             # HELP logflock_duplicate_spawns_total Spawns rejected as duplicates\n\
             # TYPE logflock_duplicate_spawns_total counter\n\
             logflock_duplicate_spawns_total {}\n\
             # HELP logflock_clears_total Non-empty clear-all calls\n\
             # TYPE logflock_clears_total counter\n\
             logflock_clears_total {}\n\
             # HELP logflock_ticks_total Simulation ticks integrated\n\
             # TYPE logflock_ticks_total counter\n\
             logflock_ticks_total {}\n",
            self.agents_spawned, self.agents_removed, self.duplicate_spawns, self.clears, self.ticks,
        )
    }
}

// ---------------------------------------------------------------------------
// Tick timings
// ---------------------------------------------------------------------------

/// Ticks kept in the rolling window, two seconds at 60 fps.
pub const TIMING_WINDOW: usize = 120;

/// Rolling window of recent tick durations, checked against the frame budget.
///
/// Only ticks that integrated something are observed; a rejected `dt` never
/// reaches the window.
#[derive(Debug)]
pub struct TickTimings {
    budget_us: u64,
    window: Mutex<TimingWindow>,
}

#[derive(Debug, Default)]
struct TimingWindow {
    samples: VecDeque<u64>,
    observed: u64,
    over_budget: u64,
}

impl TickTimings {
    /// Window with a per-tick budget in milliseconds.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn new(budget_ms: f32) -> Self {
        let budget_us = if budget_ms.is_finite() && budget_ms > 0.0 {
            (f64::from(budget_ms) * 1000.0).round() as u64
        } else {
            u64::MAX
        };
        Self {
            budget_us,
            window: Mutex::new(TimingWindow {
                samples: VecDeque::with_capacity(TIMING_WINDOW),
                ..TimingWindow::default()
            }),
        }
    }

    /// Add one tick's wall time. Returns `true` when it blew the budget.
    pub fn observe(&self, elapsed_us: u64) -> bool {
        let over = elapsed_us > self.budget_us;
        let mut w = self.window.lock();
        if w.samples.len() == TIMING_WINDOW {
            w.samples.pop_front();
        }
        w.samples.push_back(elapsed_us);
        w.observed += 1;
        if over {
            w.over_budget += 1;
        }
        over
    }

    /// Ticks observed since creation.
    #[must_use]
    pub fn observed(&self) -> u64 {
        self.window.lock().observed
    }

    /// Per-tick budget in microseconds.
    #[must_use]
    pub fn budget_us(&self) -> u64 {
        self.budget_us
    }

    /// Summary of the current window.
    #[must_use]
    pub fn report(&self) -> TimingReport {
        let w = self.window.lock();
        let mut sorted: Vec<u64> = w.samples.iter().copied().collect();
        sorted.sort_unstable();
        TimingReport {
            window: sorted.len(),
            median_us: nearest_rank(&sorted, 50),
            p95_us: nearest_rank(&sorted, 95),
            worst_us: sorted.last().copied().unwrap_or(0),
            over_budget: w.over_budget,
            budget_us: self.budget_us,
        }
    }
}

/// Nearest-rank percentile over an ascending slice; 0 when empty.
fn nearest_rank(sorted: &[u64], pct: usize) -> u64 {
    if sorted.is_empty() {
        return 0;
    }
    let rank = (pct * sorted.len()).div_ceil(100).max(1);
    sorted[rank.min(sorted.len()) - 1]
}

/// Tick timing summary, e.g. for a debug overlay.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TimingReport {
    /// Ticks currently in the window.
    pub window: usize,
    /// Median tick time.
    pub median_us: u64,
    /// 95th percentile tick time.
    pub p95_us: u64,
    /// Slowest tick in the window.
    pub worst_us: u64,
    /// Over-budget ticks since creation.
    pub over_budget: u64,
    /// The budget the ticks were checked against.
    pub budget_us: u64,
}

impl TimingReport {
    /// One line of text: `tick p50 0.41ms p95 0.90ms max 1.20ms (120 ticks, 0 over 4.0ms)`.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn overlay_line(&self) -> String {
        let ms = |us: u64| us as f64 / 1000.0;
        format!(
            "tick p50 {:.2}ms p95 {:.2}ms max {:.2}ms ({} ticks, {} over {:.1}ms)",
            ms(self.median_us),
            ms(self.p95_us),
            ms(self.worst_us),
            self.window,
            self.over_budget,
            ms(self.budget_us),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_increment_and_snapshot() {
        let c = FlockCounters::new();
        FlockCounters::incr(&c.agents_spawned);
        FlockCounters::incr(&c.agents_spawned);
        FlockCounters::incr(&c.duplicate_spawns);
        let snap = c.snapshot();
        assert_eq!(snap.agents_spawned, 2);
        assert_eq!(snap.duplicate_spawns, 1);
        assert_eq!(snap.ticks, 0);
    }

    #[test]
    fn prometheus_format_valid() {
        let c = FlockCounters::new();
        c.ticks.fetch_add(42, Ordering::Relaxed);
        let prom = c.snapshot().to_prometheus();
        assert!(prom.contains("logflock_ticks_total 42"));
        assert!(prom.contains("# TYPE"));
        assert!(prom.contains("# HELP"));
    }

    #[test]
    fn budget_is_checked_per_tick() {
        let timings = TickTimings::new(2.0);
        assert_eq!(timings.budget_us(), 2_000);
        assert!(!timings.observe(1_500));
        assert!(timings.observe(2_001));
        assert!(!timings.observe(2_000));
        let report = timings.report();
        assert_eq!(timings.observed(), 3);
        assert_eq!(report.over_budget, 1);
        assert_eq!(report.worst_us, 2_001);
    }

    #[test]
    fn report_uses_nearest_rank() {
        let timings = TickTimings::new(4.0);
        for us in (1..=100).rev() {
            timings.observe(us * 10);
        }
        let report = timings.report();
        assert_eq!(report.window, 100);
        assert_eq!(report.median_us, 500);
        assert_eq!(report.p95_us, 950);
        assert_eq!(report.worst_us, 1_000);
        assert_eq!(
            report.overlay_line(),
            "tick p50 0.50ms p95 0.95ms max 1.00ms (100 ticks, 0 over 4.0ms)"
        );
    }

    #[test]
    fn window_keeps_only_recent_ticks() {
        let timings = TickTimings::new(1.0);
        for _ in 0..TIMING_WINDOW {
            timings.observe(9_000);
        }
        for _ in 0..TIMING_WINDOW {
            timings.observe(100);
        }
        let report = timings.report();
        assert_eq!(timings.observed(), 2 * TIMING_WINDOW as u64);
        assert_eq!(report.window, TIMING_WINDOW);
        assert_eq!(report.worst_us, 100);
        // Lifetime count survives the window sliding past.
        assert_eq!(report.over_budget, TIMING_WINDOW as u64);
    }

    #[test]
    fn empty_report_is_zeroed() {
        let report = TickTimings::new(4.0).report();
        assert_eq!(report.window, 0);
        assert_eq!(report.median_us, 0);
        assert_eq!(report.worst_us, 0);
    }

    #[test]
    fn unusable_budget_never_trips() {
        let timings = TickTimings::new(f32::NAN);
        assert!(!timings.observe(u64::MAX - 1));
    }
}
