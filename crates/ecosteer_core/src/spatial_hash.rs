use ecosteer_data::Vec3;
use rayon::prelude::*;
use std::sync::atomic::{AtomicUsize, Ordering as AtomicOrdering};

/// Uniform grid over the horizontal (x/z) plane for neighbor queries.
///
/// Uses the "offset array" layout (like compressed sparse rows):
/// `cell_offsets[i]..cell_offsets[i + 1]` indexes into `agent_indices` for
/// every agent in cell `i`. Height is ignored, so a query returns a superset
/// of the agents within `radius`; callers filter by exact distance.
///
/// Positions outside `[0, width) x [0, depth)` are clamped into the border
/// cells rather than dropped, so agents that wander off the map are still
/// found. Non-finite positions are not indexed.
///
/// # Examples
/// ```
/// use ecosteer_core::spatial_hash::SpatialHash;
/// use ecosteer_data::Vec3;
///
/// let mut grid = SpatialHash::new(8.0, 128.0, 128.0);
/// grid.build(&[Vec3::new(10.0, 0.0, 10.0), Vec3::new(100.0, 0.0, 100.0)]);
///
/// let mut nearby = Vec::new();
/// grid.query_into(Vec3::new(12.0, 0.0, 12.0), 5.0, &mut nearby);
/// assert_eq!(nearby, vec![0]);
/// ```
#[derive(Clone, Debug, Default)]
pub struct SpatialHash {
    pub cell_size: f64,
    pub width: f64,
    pub depth: f64,
    pub cols: usize,
    pub rows: usize,
    pub cell_offsets: Vec<usize>,
    pub agent_indices: Vec<usize>,
}

impl SpatialHash {
    /// A non-positive `cell_size` falls back to 1.
    #[must_use]
    pub fn new(cell_size: f64, width: f64, depth: f64) -> Self {
        let cell_size = if cell_size > 0.0 { cell_size } else { 1.0 };
        let cols = ((width / cell_size).ceil() as usize).max(1);
        let rows = ((depth / cell_size).ceil() as usize).max(1);
        Self {
            cell_size,
            width,
            depth,
            cols,
            rows,
            cell_offsets: vec![0; cols * rows + 1],
            agent_indices: Vec::new(),
        }
    }

    #[inline]
    fn column(&self, x: f64) -> usize {
        let c = (x / self.cell_size).floor();
        if c <= 0.0 {
            0
        } else {
            (c as usize).min(self.cols - 1)
        }
    }

    #[inline]
    fn row(&self, z: f64) -> usize {
        let r = (z / self.cell_size).floor();
        if r <= 0.0 {
            0
        } else {
            (r as usize).min(self.rows - 1)
        }
    }

    /// Flat cell index for a position, or `None` if it is not finite.
    #[inline]
    #[must_use]
    pub fn cell_index(&self, position: Vec3) -> Option<usize> {
        if !position.x.is_finite() || !position.z.is_finite() {
            return None;
        }
        Some(self.row(position.z) * self.cols + self.column(position.x))
    }

    /// Rebuilds the index. Agent `i` is `positions[i]`.
    pub fn build(&mut self, positions: &[Vec3]) {
        let cell_count = self.cols * self.rows;

        let atomic_counts: Vec<AtomicUsize> =
            (0..cell_count).map(|_| AtomicUsize::new(0)).collect();
        positions.par_iter().for_each(|&p| {
            if let Some(idx) = self.cell_index(p) {
                atomic_counts[idx].fetch_add(1, AtomicOrdering::Relaxed);
            }
        });

        self.cell_offsets.resize(cell_count + 1, 0);
        let mut total = 0;
        for (i, count) in atomic_counts.into_iter().enumerate() {
            self.cell_offsets[i] = total;
            total += count.into_inner();
        }
        self.cell_offsets[cell_count] = total;

        self.agent_indices.clear();
        self.agent_indices.resize(total, 0);
        let mut cursor = self.cell_offsets[..cell_count].to_vec();
        for (agent_idx, &p) in positions.iter().enumerate() {
            if let Some(cell_idx) = self.cell_index(p) {
                self.agent_indices[cursor[cell_idx]] = agent_idx;
                cursor[cell_idx] += 1;
            }
        }
    }

    /// Calls `callback` with every agent index in cells overlapping the
    /// square of half-side `radius` around `center`.
    pub fn query_callback<F>(&self, center: Vec3, radius: f64, mut callback: F)
    where
        F: FnMut(usize),
    {
        if !center.x.is_finite() || !center.z.is_finite() || radius.is_nan() {
            return;
        }
        let radius = radius.max(0.0);
        let (min_c, max_c) = (self.column(center.x - radius), self.column(center.x + radius));
        let (min_r, max_r) = (self.row(center.z - radius), self.row(center.z + radius));

        for r in min_r..=max_r {
            for c in min_c..=max_c {
                let cell_idx = r * self.cols + c;
                let start = self.cell_offsets[cell_idx];
                let end = self.cell_offsets[cell_idx + 1];
                for &agent_idx in &self.agent_indices[start..end] {
                    callback(agent_idx);
                }
            }
        }
    }

    pub fn query_into(&self, center: Vec3, radius: f64, out: &mut Vec<usize>) {
        self.query_callback(center, radius, |idx| out.push(idx));
    }

    #[must_use]
    pub fn count_nearby(&self, center: Vec3, radius: f64) -> usize {
        let mut count = 0;
        self.query_callback(center, radius, |_| count += 1);
        count
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.agent_indices.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.agent_indices.is_empty()
    }
}
