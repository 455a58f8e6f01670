//! Property-Based Tests for logflock core.
//!
//! Uses `proptest` to check the derivation and steering invariants under
//! random entries, positions and frame times.

use chrono::{DateTime, Duration, TimeZone, Utc};
use proptest::prelude::*;

use logflock_core::config::FlockConfig;
use logflock_core::personality::{self, recency};
use logflock_core::{AffinityTable, Category, Flock, LogEntry, Vec2, affinity};

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 9, 1, 18, 0, 0).single().expect("valid timestamp")
}

// ---------------------------------------------------------------------------
// Strategy helpers
// ---------------------------------------------------------------------------

fn arb_category() -> impl Strategy<Value = Category> {
    (0..Category::COUNT).prop_map(|i| {
        Category::KNOWN.get(i).copied().unwrap_or(Category::Other)
    })
}

fn arb_entry() -> impl Strategy<Value = LogEntry> {
    (
        arb_category(),
        -2.0..8.0f32,         // rating, deliberately out of range at times
        proptest::option::of(0.0..7.0f32), // mood
        0i64..90,             // age in days
    )
        .prop_map(|(category, rating, mood, days)| {
            let mut e = LogEntry::new("prop", category, rating, now() - Duration::days(days));
            e.mood = mood;
            e
        })
}

// ---------------------------------------------------------------------------
// Property: derivation is pure
// ---------------------------------------------------------------------------

proptest! {
    #[test]
    fn derivation_is_deterministic(e in arb_entry()) {
        prop_assert_eq!(personality::derive(&e, now()), personality::derive(&e, now()));
    }

    #[test]
    fn derived_values_stay_in_range(e in arb_entry()) {
        let p = personality::derive(&e, now());
        prop_assert!((1.0..=5.0).contains(&p.rating));
        prop_assert!((0.0..=1.0).contains(&p.recency));
        prop_assert!(p.max_speed >= 20.0);
        prop_assert!((110.0..=230.0).contains(&p.awareness_radius));
    }
}

// ---------------------------------------------------------------------------
// Property: recency is bounded and decreasing with age
// ---------------------------------------------------------------------------

proptest! {
    #[test]
    fn recency_bounded_and_monotonic(a in -10.0..100.0f64, b in -10.0..100.0f64) {
        let (younger, older) = if a <= b { (a, b) } else { (b, a) };
        #[allow(clippy::cast_possible_truncation)]
        let at = |days: f64| now() - Duration::milliseconds((days * 86_400_000.0) as i64);
        let r_young = recency(at(younger), now());
        let r_old = recency(at(older), now());
        prop_assert!((0.0..=1.0).contains(&r_young));
        prop_assert!((0.0..=1.0).contains(&r_old));
        prop_assert!(r_young >= r_old);
    }
}

// ---------------------------------------------------------------------------
// Property: affinity lookups are stable
// ---------------------------------------------------------------------------

proptest! {
    #[test]
    fn affinity_is_stable_and_bounded(a in arb_category(), b in arb_category()) {
        let first = affinity(a, b);
        prop_assert!((first - affinity(a, b)).abs() < f32::EPSILON);
        prop_assert!((-1.0..=1.0).contains(&first));
        prop_assert!((AffinityTable::neutral().get(a, b)).abs() < f32::EPSILON);
    }
}

// ---------------------------------------------------------------------------
// Property: after any tick, speeds respect the envelope and positions the
// world
// ---------------------------------------------------------------------------

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn tick_respects_speed_envelope_and_bounds(
        entries in proptest::collection::vec(arb_entry(), 1..25),
        coords in proptest::collection::vec((0.0..100.0f32, 0.0..100.0f32), 25),
        dt in 0.001..0.5f32,
        seed in any::<u64>(),
    ) {
        let mut config = FlockConfig::default();
        config.general.seed = Some(seed);
        let mut flock = Flock::new(&config);
        for (e, &(x, y)) in entries.iter().zip(&coords) {
            let pos = flock.bounds().from_percent(x, y);
            flock.spawn_at(e, pos, now()).expect("unique ids spawn");
        }

        for _ in 0..3 {
            flock.tick(dt);
        }

        let bounds = flock.bounds();
        let s = flock.simulation().steering();
        for agent in flock.registry().iter() {
            let p = agent.personality();
            let ceiling = p.max_speed + p.recency * s.recency_speed_boost;
            let floor = (s.min_speed + 0.5 * p.recency * s.recency_speed_boost).min(ceiling);
            let speed = agent.speed();
            prop_assert!(speed <= ceiling + 1e-2, "speed {} above ceiling {}", speed, ceiling);
            prop_assert!(speed >= floor - 1e-2, "speed {} below floor {}", speed, floor);
            prop_assert!(bounds.contains(agent.position()));
        }
    }
}

#[test]
fn spawn_positions_outside_are_clamped() {
    let mut flock = Flock::new(&FlockConfig::default());
    let e = LogEntry::new("x", Category::Game, 3.0, now());
    let id = flock.spawn_at(&e, Vec2::new(-1.0e6, 1.0e6), now()).expect("spawn");
    assert!(flock.bounds().contains(flock.registry().find(id).expect("agent").position()));
}
