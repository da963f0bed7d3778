//! Uniform grid spatial index for "all neurons within radius r of point P"
//! queries.
//!
//! 16 dimensions makes a literal per-axis grid impractical: a cell's 3^16
//! neighborhood is unusable. Instead the grid buckets on a projection onto
//! the first [`PROJECTED_DIMS`] coordinates. Since a Euclidean distance in
//! the full 16-D space is never smaller than the distance between the same
//! two points' projections onto any subset of axes, a candidate set built
//! from the projected grid is always a superset of the true neighbors —
//! callers still apply an exact distance test to the returned candidates,
//! so this never misses a neuron, only occasionally over-returns one.

use std::collections::HashMap;

use crate::geometry::Position16;
use crate::ids::NeuronId;

const PROJECTED_DIMS: usize = 3;

type CellKey = (i64, i64, i64);

fn cell_key(pos: &Position16, cell_size: f64) -> CellKey {
    let mut coords = [0i64; PROJECTED_DIMS];
    for (i, c) in coords.iter_mut().enumerate() {
        *c = (pos.0[i] / cell_size).floor() as i64;
    }
    (coords[0], coords[1], coords[2])
}

/// Uniform grid over a projection of 16-D positions.
#[derive(Debug, Clone)]
pub struct SpatialIndex {
    cell_size: f64,
    cells: HashMap<CellKey, Vec<NeuronId>>,
    positions: HashMap<NeuronId, Position16>,
}

impl SpatialIndex {
    /// Build an empty index. `cell_size` should be on the order of typical
    /// query radii (pulse propagation speed, synaptogenesis influence
    /// radius) to keep both cell occupancy and neighbor-cell counts low.
    pub fn new(cell_size: f64) -> Self {
        Self {
            cell_size: cell_size.max(1e-6),
            cells: HashMap::new(),
            positions: HashMap::new(),
        }
    }

    /// Discard all entries and rebuild from scratch.
    pub fn rebuild<I: IntoIterator<Item = (NeuronId, Position16)>>(&mut self, entries: I) {
        self.cells.clear();
        self.positions.clear();
        for (id, pos) in entries {
            self.insert(id, pos);
        }
    }

    pub fn insert(&mut self, id: NeuronId, pos: Position16) {
        let key = cell_key(&pos, self.cell_size);
        self.cells.entry(key).or_default().push(id);
        self.positions.insert(id, pos);
    }

    pub fn remove(&mut self, id: NeuronId) {
        if let Some(pos) = self.positions.remove(&id) {
            let key = cell_key(&pos, self.cell_size);
            if let Some(bucket) = self.cells.get_mut(&key) {
                bucket.retain(|&existing| existing != id);
                if bucket.is_empty() {
                    self.cells.remove(&key);
                }
            }
        }
    }

    /// Move `id` to `new_pos`, updating its cell membership if it changed
    /// cells.
    pub fn update_position(&mut self, id: NeuronId, new_pos: Position16) {
        self.remove(id);
        self.insert(id, new_pos);
    }

    pub fn position_of(&self, id: NeuronId) -> Option<Position16> {
        self.positions.get(&id).copied()
    }

    /// All neurons whose projected cell overlaps the ball of `radius`
    /// around `origin`. A superset of the true neighbors; callers apply an
    /// exact distance test.
    pub fn query_radius(&self, origin: &Position16, radius: f64) -> Vec<NeuronId> {
        let radius = radius.max(0.0);
        let min_key = {
            let mut shifted = *origin;
            for c in shifted.0.iter_mut() {
                *c -= radius;
            }
            cell_key(&shifted, self.cell_size)
        };
        let max_key = {
            let mut shifted = *origin;
            for c in shifted.0.iter_mut() {
                *c += radius;
            }
            cell_key(&shifted, self.cell_size)
        };

        let mut out = Vec::new();
        for x in min_key.0..=max_key.0 {
            for y in min_key.1..=max_key.1 {
                for z in min_key.2..=max_key.2 {
                    if let Some(bucket) = self.cells.get(&(x, y, z)) {
                        out.extend_from_slice(bucket);
                    }
                }
            }
        }
        out
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }
}
