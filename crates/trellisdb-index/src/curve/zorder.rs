//! Z-order (Morton) space-filling curve.
//!
//! Maps an n-dimensional coordinate to a single `u64` by quantizing each
//! axis onto a `2^bits` grid and interleaving the grid-cell bits, most
//! significant first. The mapping is locality-preserving rather than
//! globally monotonic: coordinates in the same grid cell map to the same
//! derived value, and nearby cells tend to produce nearby values.
//!
//! The populator treats this as a black box — all it needs is a
//! deterministic `coordinates -> u64` function frozen per index build.

use super::CurveSettings;

/// A Z-order curve over a fixed envelope.
#[derive(Debug, Clone, PartialEq)]
pub struct ZOrderCurve {
    dimensions: usize,
    bits_per_dimension: u32,
    min: Vec<f64>,
    max: Vec<f64>,
}

impl ZOrderCurve {
    /// Build the curve described by validated settings.
    #[must_use]
    pub fn from_settings(settings: &CurveSettings) -> Self {
        Self {
            dimensions: settings.dimensions,
            bits_per_dimension: settings.bits_per_dimension,
            min: settings.min.clone(),
            max: settings.max.clone(),
        }
    }

    /// Number of dimensions the curve covers.
    #[inline]
    #[must_use]
    pub const fn dimensions(&self) -> usize {
        self.dimensions
    }

    /// Grid resolution in bits per dimension.
    #[inline]
    #[must_use]
    pub const fn bits_per_dimension(&self) -> u32 {
        self.bits_per_dimension
    }

    /// Envelope lower bound for an axis.
    #[inline]
    #[must_use]
    pub fn axis_min(&self, axis: usize) -> f64 {
        self.min[axis]
    }

    /// Envelope upper bound for an axis.
    #[inline]
    #[must_use]
    pub fn axis_max(&self, axis: usize) -> f64 {
        self.max[axis]
    }

    /// Whether a coordinate tuple lies inside the envelope.
    #[must_use]
    pub fn contains(&self, coords: &[f64]) -> bool {
        coords.len() == self.dimensions
            && coords
                .iter()
                .enumerate()
                .all(|(axis, &v)| v >= self.min[axis] && v <= self.max[axis])
    }

    /// The curve's derived value for a coordinate tuple.
    ///
    /// Returns `None` if the tuple has the wrong dimension count or lies
    /// outside the envelope.
    #[must_use]
    pub fn derived_value(&self, coords: &[f64]) -> Option<u64> {
        if !self.contains(coords) {
            return None;
        }

        let cells = 1u64 << self.bits_per_dimension;
        let mut grid = Vec::with_capacity(self.dimensions);
        for (axis, &v) in coords.iter().enumerate() {
            let span = self.max[axis] - self.min[axis];
            let normalized = (v - self.min[axis]) / span;
            // The upper envelope bound falls into the last cell
            let cell = ((normalized * cells as f64) as u64).min(cells - 1);
            grid.push(cell);
        }

        // Interleave grid bits, most significant first, axis 0 outermost
        let mut value = 0u64;
        for bit in (0..self.bits_per_dimension).rev() {
            for &cell in &grid {
                value = (value << 1) | ((cell >> bit) & 1);
            }
        }
        Some(value)
    }
}
