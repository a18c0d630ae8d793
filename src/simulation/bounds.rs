//! Axis-aligned bounds of a body set
//!
//! The bounds are *not* expanded to a cube: each axis is quantized
//! independently by the Morton coder, so node boxes are cells of that
//! per-axis quantization grid.

use super::error::SimError;
use super::morton::{MAX_DEPTH, MORTON_SCALE};
use super::states::{Body3, NVec3};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub min: NVec3,
    pub max: NVec3,
}

impl Bounds {
    pub fn new(min: NVec3, max: NVec3) -> Self {
        Self { min, max }
    }

    /// Per-axis `[min, max]` over all body positions in one pass
    ///
    /// An empty slice is rejected instead of producing inverted infinite bounds.
    /// Axes where every body shares the same coordinate are fine.
    pub fn from_bodies(bodies: &[Body3]) -> Result<Self, SimError> {
        let first = bodies.first().ok_or(SimError::EmptySystem)?;

        let mut min = first.x;
        let mut max = first.x;
        for b in &bodies[1..] {
            min.x = min.x.min(b.x.x);
            min.y = min.y.min(b.x.y);
            min.z = min.z.min(b.x.z);

            max.x = max.x.max(b.x.x);
            max.y = max.y.max(b.x.y);
            max.z = max.z.max(b.x.z);
        }

        Ok(Self { min, max })
    }

    /// `(lo, hi)` for axis 0, 1 or 2
    #[inline]
    pub fn axis(&self, axis: usize) -> (f64, f64) {
        (self.min[axis], self.max[axis])
    }

    #[inline]
    pub fn center(&self) -> NVec3 {
        (self.min + self.max) * 0.5
    }

    #[inline]
    pub fn size(&self) -> NVec3 {
        self.max - self.min
    }

    /// Largest side length, the `s` of the opening criterion
    #[inline]
    pub fn longest_side(&self) -> f64 {
        let s = self.size();
        s.x.max(s.y).max(s.z)
    }

    /// Box of the quantization cell `cell` at tree depth `depth`
    ///
    /// At depth `d` a cell spans `2^(21 - d)` quantized values per axis, so
    /// cell `c` holds fractions `[c 2^(21-d), (c+1) 2^(21-d)) / (2^21 - 1)` of
    /// the axis range, clipped to `max`. A body keyed into the cell lies in
    /// this box. A plain geometric halving would not agree: a body just above
    /// the midpoint still quantizes into the lower half.
    pub fn cell(&self, cell: [u32; 3], depth: usize) -> Self {
        debug_assert!(depth <= MAX_DEPTH);
        let span = 1u64 << (MAX_DEPTH - depth);
        let full = u64::from(MORTON_SCALE);

        let mut min = self.min;
        let mut max = self.max;
        for axis in 0..3 {
            let (lo, hi) = self.axis(axis);
            let edge = |q: u64| {
                if q >= full {
                    hi
                } else {
                    lo + (hi - lo) * (q as f64 / full as f64)
                }
            };
            let c = u64::from(cell[axis]);
            min[axis] = edge(c * span);
            max[axis] = edge((c + 1) * span);
        }

        Self { min, max }
    }
}
