//! # logflock-stage — presentation and host bridge for logflock
//!
//! Sits between `logflock-core` and whatever draws the canvas (a web view,
//! a game engine, a terminal).
//!
//! ```text
//!  host app ──on_*──▶ Stage ──▶ Flock (registry + simulation)
//!     ▲                 │
//!     │            Presenter ──▶ Vec<Sprite> ──▶ renderer
//!     └── StageEvent ◀──┘  (click / hover)
//! ```
//!
//! ## Modules
//!
//! - `stage` — the host bridge and the shared (locked) handle
//! - `presenter` — sprites, highlight, filter dimming, hit-testing
//! - `events` — click and hover events reported to the host
//! - `filter` — the entry filter that produces the visible id set

pub mod events;
pub mod filter;
pub mod presenter;
pub mod stage;

pub use events::StageEvent;
pub use filter::EntryFilter;
pub use presenter::{Presenter, Sprite};
pub use stage::{SharedStage, Stage};
