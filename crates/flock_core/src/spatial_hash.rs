use flock_data::DVec2;
use rayon::prelude::*;
use std::sync::atomic::{AtomicUsize, Ordering as AtomicOrdering};

/// Distance function of the world.
///
/// Under a wrap boundary the world is a torus, so the shortest displacement
/// between two points may cross an edge.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Metric {
    Euclidean,
    Toroidal { width: f64, height: f64 },
}

impl Metric {
    /// Shortest displacement from `from` to `to`.
    #[inline]
    pub fn offset(&self, from: DVec2, to: DVec2) -> DVec2 {
        let d = to - from;
        match *self {
            Metric::Euclidean => d,
            Metric::Toroidal { width, height } => {
                DVec2::new(shortest_wrapped(d.x, width), shortest_wrapped(d.y, height))
            }
        }
    }

    #[inline]
    pub fn distance_squared(&self, a: DVec2, b: DVec2) -> f64 {
        self.offset(a, b).length_squared()
    }

    #[inline]
    pub fn distance(&self, a: DVec2, b: DVec2) -> f64 {
        self.offset(a, b).length()
    }
}

#[inline]
fn shortest_wrapped(delta: f64, span: f64) -> f64 {
    let d = delta.rem_euclid(span);
    if d > span * 0.5 {
        d - span
    } else {
        d
    }
}

/// Cell coordinates covered by a query along one axis.
#[derive(Debug, Clone, Copy)]
struct AxisSpan {
    start: i64,
    len: usize,
    count: usize,
    wrap: bool,
}

impl AxisSpan {
    #[inline]
    fn cell(&self, i: usize) -> usize {
        let c = self.start + i as i64;
        if self.wrap {
            c.rem_euclid(self.count as i64) as usize
        } else {
            c as usize
        }
    }
}

#[derive(Clone, Debug)]
/// Spatial indexing structure for radius queries on agent positions.
///
/// Implements a uniform grid hash using offset-indexed slot lists.
/// Enables O(1) cell lookup and radius queries whose cost depends on the
/// agents in the covered cells rather than on the whole population.
///
/// # Performance Characteristics
/// - Radius query: O(agents in covered cells)
/// - Construction: O(agent_count) with Rayon-parallel counting
/// - Memory: O(agent_count) for slot indices + O(grid_cells) for offsets
///
/// # Implementation Notes
/// - Uses the "offset array" pattern (like compressed sparse rows):
///   `cell_offsets[i]..cell_offsets[i+1]` holds every slot in cell i
/// - The grid always tiles the world exactly (`cols * cell_width == width`)
///   so wrapped cell ranges line up with the torus
/// - Positions outside the world are clamped to a border cell (or wrapped),
///   never dropped, so queries have no false negatives
/// - Queries filter candidates by exact distance; results are
///   boundary-inclusive and sorted by slot
///
/// # Examples
/// ```
/// use flock_core::spatial_hash::{Metric, SpatialHash};
/// use flock_data::DVec2;
///
/// let mut spatial = SpatialHash::new(10.0, 100.0, 100.0, Metric::Euclidean);
/// let positions = vec![DVec2::new(15.0, 15.0), DVec2::new(25.0, 25.0), DVec2::new(85.0, 85.0)];
/// spatial.build_parallel(&positions);
///
/// let mut nearby = Vec::new();
/// spatial.query_into(DVec2::new(15.0, 15.0), 20.0, &mut nearby);
/// assert_eq!(nearby, vec![0, 1]);
/// ```
pub struct SpatialHash {
    pub cell_size: f64,
    pub width: f64,
    pub height: f64,
    pub cols: usize,
    pub rows: usize,
    cell_width: f64,
    cell_height: f64,
    metric: Metric,
    pub cell_offsets: Vec<usize>,
    pub entity_indices: Vec<usize>,
    positions: Vec<DVec2>,
}

impl SpatialHash {
    /// Creates an empty spatial hash.
    ///
    /// `cell_size` is a lower bound: cells are stretched so that a whole
    /// number of them covers each axis.
    pub fn new(cell_size: f64, width: f64, height: f64, metric: Metric) -> Self {
        let mut hash = Self {
            cell_size,
            width,
            height,
            cols: 1,
            rows: 1,
            cell_width: width,
            cell_height: height,
            metric,
            cell_offsets: vec![0; 2],
            entity_indices: Vec::new(),
            positions: Vec::new(),
        };
        hash.configure(cell_size, width, height, metric);
        hash
    }

    /// Spatial hash with a small default geometry, handy in tests.
    pub fn new_empty() -> Self {
        Self::new(5.0, 100.0, 100.0, Metric::Euclidean)
    }

    /// Changes the grid geometry. Takes effect on the next build.
    pub fn configure(&mut self, cell_size: f64, width: f64, height: f64, metric: Metric) {
        let cell_size = if cell_size.is_finite() && cell_size > 0.0 {
            cell_size
        } else {
            width.max(height)
        };
        self.cell_size = cell_size;
        self.width = width;
        self.height = height;
        self.metric = metric;
        self.cols = axis_cells(width, cell_size);
        self.rows = axis_cells(height, cell_size);
        self.cell_width = width / self.cols as f64;
        self.cell_height = height / self.rows as f64;
        self.entity_indices.clear();
        self.positions.clear();
        self.cell_offsets.clear();
        self.cell_offsets.resize(self.cols * self.rows + 1, 0);
    }

    #[inline]
    pub fn metric(&self) -> Metric {
        self.metric
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Position cached for `slot` at build time.
    #[inline]
    pub fn position(&self, slot: usize) -> DVec2 {
        self.positions[slot]
    }

    #[inline]
    fn is_wrapping(&self) -> bool {
        matches!(self.metric, Metric::Toroidal { .. })
    }

    #[inline]
    fn axis_cell(&self, v: f64, cell: f64, span: f64, count: usize) -> usize {
        let v = if self.is_wrapping() { v.rem_euclid(span) } else { v };
        // Float to int casts saturate, so huge coordinates land on a border cell.
        let c = (v / cell).floor() as i64;
        c.clamp(0, count as i64 - 1) as usize
    }

    /// Computes the cell index holding a world coordinate.
    ///
    /// Non-finite coordinates return `None`. Coordinates outside the world
    /// are wrapped (toroidal metric) or clamped to the nearest border cell.
    #[inline]
    pub fn get_cell_idx(&self, pos: DVec2) -> Option<usize> {
        if !pos.is_finite() {
            return None;
        }
        let cx = self.axis_cell(pos.x, self.cell_width, self.width, self.cols);
        let cy = self.axis_cell(pos.y, self.cell_height, self.height, self.rows);
        Some(cy * self.cols + cx)
    }

    /// Rebuilds the index from positions; slot `i` refers to `positions[i]`.
    pub fn build_parallel(&mut self, positions: &[DVec2]) {
        let cell_count = self.cols * self.rows;

        let atomic_counts: Vec<AtomicUsize> =
            (0..cell_count).map(|_| AtomicUsize::new(0)).collect();
        positions.par_iter().for_each(|&p| {
            if let Some(idx) = self.get_cell_idx(p) {
                atomic_counts[idx].fetch_add(1, AtomicOrdering::Relaxed);
            }
        });
        let counts: Vec<usize> = atomic_counts.into_iter().map(|a| a.into_inner()).collect();

        self.cell_offsets.resize(cell_count + 1, 0);
        let mut total = 0;
        for (i, &count) in counts.iter().enumerate() {
            self.cell_offsets[i] = total;
            total += count;
        }
        self.cell_offsets[cell_count] = total;

        self.entity_indices.clear();
        self.entity_indices.resize(total, 0);
        let mut current_offsets = self.cell_offsets[..cell_count].to_vec();
        for (slot, &p) in positions.iter().enumerate() {
            if let Some(cell_idx) = self.get_cell_idx(p) {
                self.entity_indices[current_offsets[cell_idx]] = slot;
                current_offsets[cell_idx] += 1;
            }
        }

        self.positions.clear();
        self.positions.extend_from_slice(positions);
    }

    fn span(&self, c: f64, radius: f64, cell: f64, span: f64, count: usize) -> AxisSpan {
        let wrap = self.is_wrapping();
        let c = if wrap { c.rem_euclid(span) } else { c };
        // Widen by a hair so rounding at cell borders cannot hide a candidate.
        let reach = radius + cell * 1e-6;
        let lo = ((c - reach) / cell).floor();
        let hi = ((c + reach) / cell).floor();
        let last = count as f64 - 1.0;
        if wrap {
            if hi - lo + 1.0 >= count as f64 {
                return AxisSpan { start: 0, len: count, count, wrap };
            }
            let start = lo as i64;
            AxisSpan { start, len: (hi as i64 - start + 1) as usize, count, wrap }
        } else {
            // Out-of-world agents sit in border cells, so clamp the range the same way.
            let lo = lo.clamp(0.0, last) as i64;
            let hi = hi.clamp(0.0, last) as i64;
            AxisSpan { start: lo, len: (hi - lo + 1) as usize, count, wrap }
        }
    }

    /// Visits every slot whose distance to `center` is at most `radius`.
    ///
    /// Invalid queries (non-finite center, non-finite or negative radius)
    /// visit nothing.
    pub fn query_callback<F>(&self, center: DVec2, radius: f64, mut callback: F)
    where
        F: FnMut(usize),
    {
        if !center.is_finite() || !radius.is_finite() || radius < 0.0 || self.positions.is_empty() {
            return;
        }
        let xs = self.span(center.x, radius, self.cell_width, self.width, self.cols);
        let ys = self.span(center.y, radius, self.cell_height, self.height, self.rows);
        let radius_sq = radius * radius;

        for iy in 0..ys.len {
            let cy = ys.cell(iy);
            for ix in 0..xs.len {
                let cell_idx = cy * self.cols + xs.cell(ix);
                let start = self.cell_offsets[cell_idx];
                let end = self.cell_offsets[cell_idx + 1];
                for &slot in &self.entity_indices[start..end] {
                    if self.metric.distance_squared(center, self.positions[slot]) <= radius_sq {
                        callback(slot);
                    }
                }
            }
        }
    }

    pub fn count_nearby(&self, center: DVec2, radius: f64) -> usize {
        let mut count = 0;
        self.query_callback(center, radius, |_| count += 1);
        count
    }

    /// Collects the slots within `radius` of `center` into `result`,
    /// sorted ascending.
    #[inline]
    pub fn query_into(&self, center: DVec2, radius: f64, result: &mut Vec<usize>) {
        result.clear();
        self.query_callback(center, radius, |slot| result.push(slot));
        result.sort_unstable();
    }
}

fn axis_cells(span: f64, cell_size: f64) -> usize {
    let n = (span / cell_size).floor();
    if n.is_finite() && n >= 1.0 {
        // Keep the grid bounded even for tiny cells in huge worlds.
        (n as usize).min(1024)
    } else {
        1
    }
}
