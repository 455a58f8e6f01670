//! Neighbour queries for the steering step.
//!
//! The tick asks one question per agent: "who is within r of agent i?".
//! Both implementations answer it identically (same set, ascending index
//! order), so swapping the index never changes simulation results.

use std::collections::HashMap;

use ordered_float::OrderedFloat;

use crate::config::{IndexKind, SimulationConfig};
use crate::error::{FlockError, Result};
use crate::types::Vec2;

/// Common behaviour exposed by neighbourhood indices.
pub trait NeighborIndex: Send {
    /// Rebuild internal structures from agent positions.
    ///
    /// # Errors
    /// Returns `FlockError::Config` if the index is misconfigured.
    fn rebuild(&mut self, positions: &[Vec2]) -> Result<()>;

    /// Visit every `j != idx` with `distance(idx, j) < radius`, in ascending
    /// `j` order, passing the distance.
    fn neighbors_within(
        &self,
        idx: usize,
        radius: f32,
        visitor: &mut dyn FnMut(usize, OrderedFloat<f32>),
    );
}

/// Build the index selected in the config.
#[must_use]
pub fn build_index(config: &SimulationConfig) -> Box<dyn NeighborIndex> {
    match config.index {
        IndexKind::BruteForce => Box::new(BruteForceIndex::default()),
        IndexKind::Grid => Box::new(UniformGridIndex::new(config.grid_cell_size)),
    }
}

/// O(n) scan per query.
#[derive(Debug, Clone, Default)]
pub struct BruteForceIndex {
    positions: Vec<Vec2>,
}

impl NeighborIndex for BruteForceIndex {
    fn rebuild(&mut self, positions: &[Vec2]) -> Result<()> {
        self.positions.clear();
        self.positions.extend_from_slice(positions);
        Ok(())
    }

    fn neighbors_within(
        &self,
        idx: usize,
        radius: f32,
        visitor: &mut dyn FnMut(usize, OrderedFloat<f32>),
    ) {
        let Some(&origin) = self.positions.get(idx) else {
            return;
        };
        for (j, &p) in self.positions.iter().enumerate() {
            if j == idx {
                continue;
            }
            let dist = origin.distance(p);
            if dist < radius {
                visitor(j, OrderedFloat(dist));
            }
        }
    }
}

/// Uniform bucket grid keyed by cell coordinates.
#[derive(Debug, Clone)]
pub struct UniformGridIndex {
    /// Edge length of each grid cell.
    pub cell_size: f32,
    positions: Vec<Vec2>,
    buckets: HashMap<(i32, i32), Vec<usize>>,
}

impl UniformGridIndex {
    /// Create a new uniform grid with the provided cell size.
    #[must_use]
    pub fn new(cell_size: f32) -> Self {
        Self {
            cell_size,
            positions: Vec::new(),
            buckets: HashMap::new(),
        }
    }

    #[allow(clippy::cast_possible_truncation)]
    fn cell_of(&self, p: Vec2) -> (i32, i32) {
        (
            (p.x / self.cell_size).floor() as i32,
            (p.y / self.cell_size).floor() as i32,
        )
    }
}

impl Default for UniformGridIndex {
    fn default() -> Self {
        Self::new(120.0)
    }
}

impl NeighborIndex for UniformGridIndex {
    fn rebuild(&mut self, positions: &[Vec2]) -> Result<()> {
        if !(self.cell_size.is_finite() && self.cell_size > 0.0) {
            return Err(FlockError::Config("grid cell_size must be positive".to_string()));
        }
        self.positions.clear();
        self.positions.extend_from_slice(positions);
        for bucket in self.buckets.values_mut() {
            bucket.clear();
        }
        for (i, &p) in positions.iter().enumerate() {
            let cell = self.cell_of(p);
            self.buckets.entry(cell).or_default().push(i);
        }
        self.buckets.retain(|_, bucket| !bucket.is_empty());
        Ok(())
    }

    #[allow(clippy::cast_possible_truncation)]
    fn neighbors_within(
        &self,
        idx: usize,
        radius: f32,
        visitor: &mut dyn FnMut(usize, OrderedFloat<f32>),
    ) {
        let Some(&origin) = self.positions.get(idx) else {
            return;
        };
        if !(radius > 0.0) {
            return;
        }
        let (cx, cy) = self.cell_of(origin);
        let reach = (radius / self.cell_size).ceil() as i32;
        let (x0, x1) = (cx.saturating_sub(reach), cx.saturating_add(reach));
        let (y0, y1) = (cy.saturating_sub(reach), cy.saturating_add(reach));

        let mut hits: Vec<(usize, f32)> = Vec::new();
        let mut scan = |bucket: &[usize]| {
            for &j in bucket {
                if j == idx {
                    continue;
                }
                let dist = origin.distance(self.positions[j]);
                if dist < radius {
                    hits.push((j, dist));
                }
            }
        };

        // Walk the occupied cells instead when the window is larger.
        let window = (i64::from(x1) - i64::from(x0) + 1).saturating_mul(i64::from(y1) - i64::from(y0) + 1);
        if window > i64::try_from(self.buckets.len()).unwrap_or(i64::MAX) {
            for (&(gx, gy), bucket) in &self.buckets {
                if (x0..=x1).contains(&gx) && (y0..=y1).contains(&gy) {
                    scan(bucket.as_slice());
                }
            }
        } else {
            for gx in x0..=x1 {
                for gy in y0..=y1 {
                    if let Some(bucket) = self.buckets.get(&(gx, gy)) {
                        scan(bucket.as_slice());
                    }
                }
            }
        }

        hits.sort_unstable_by_key(|&(j, _)| j);
        for (j, dist) in hits {
            visitor(j, OrderedFloat(dist));
        }
    }
}
