//! Entry filter — decides which entries stay fully visible.
//!
//! All predicates are AND-ed. A default value means "no restriction".
//! An inverted date range (`from > to`) is treated as unset rather than
//! hiding everything.

use std::collections::HashSet;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use logflock_core::{AgentId, Category, LogEntry};

/// Host-side filter over log entries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EntryFilter {
    /// Case-insensitive title substring. Blank = any title.
    pub title: String,
    /// Allowed categories. Empty = any category.
    pub categories: Vec<Category>,
    /// Lowest rating shown.
    pub rating_min: f32,
    /// Highest rating shown.
    pub rating_max: f32,
    /// First calendar day shown.
    pub date_from: Option<NaiveDate>,
    /// Last calendar day shown.
    pub date_to: Option<NaiveDate>,
}

impl Default for EntryFilter {
    fn default() -> Self {
        Self {
            title: String::new(),
            categories: Vec::new(),
            rating_min: 1.0,
            rating_max: 5.0,
            date_from: None,
            date_to: None,
        }
    }
}

impl EntryFilter {
    /// Whether any predicate is set.
    #[must_use]
    pub fn is_active(&self) -> bool {
        !self.title.trim().is_empty()
            || !self.categories.is_empty()
            || (self.rating_min - 1.0).abs() > f32::EPSILON
            || (self.rating_max - 5.0).abs() > f32::EPSILON
            || self.date_from.is_some()
            || self.date_to.is_some()
    }

    /// Whether `entry` passes every predicate.
    #[must_use]
    pub fn matches(&self, entry: &LogEntry) -> bool {
        let needle = self.title.trim().to_lowercase();
        if !needle.is_empty() && !entry.title.to_lowercase().contains(&needle) {
            return false;
        }
        if !self.categories.is_empty() && !self.categories.contains(&entry.category) {
            return false;
        }
        if entry.rating < self.rating_min || entry.rating > self.rating_max {
            return false;
        }

        let range_valid = match (self.date_from, self.date_to) {
            (Some(from), Some(to)) => from <= to,
            _ => true,
        };
        if range_valid {
            let day = entry.day();
            if self.date_from.is_some_and(|from| day < from) || self.date_to.is_some_and(|to| day > to) {
                return false;
            }
        }
        true
    }

    /// Ids of the entries that pass.
    #[must_use]
    pub fn visible_ids(&self, entries: &[LogEntry]) -> HashSet<AgentId> {
        entries.iter().filter(|e| self.matches(e)).map(|e| e.id).collect()
    }

    /// What to hand to the stage: `None` when the filter is inactive, so
    /// every agent shows at full opacity.
    #[must_use]
    pub fn visibility(&self, entries: &[LogEntry]) -> Option<HashSet<AgentId>> {
        self.is_active().then(|| self.visible_ids(entries))
    }

    /// Remove only the date predicates, e.g. when jumping to a calendar day.
    pub fn clear_dates(&mut self) {
        self.date_from = None;
        self.date_to = None;
    }

    /// Reset every predicate.
    pub fn clear(&mut self) {
        *self = Self::default();
    }
}
