//! Interpolated table lookup
//!
//! Evaluates a table at engineering-unit axis positions, the way the ECU
//! does at runtime: linear along one axis, bilinear across two, clamped at
//! the table edges. Axis values are expected to be ascending.

use super::model::{Axis, Table};
use crate::error::Result;
use crate::memory::AddressSpace;

impl Table {
    /// Interpolated value at axis position `x` (and `y` for 2-axis tables)
    ///
    /// `y` is ignored by tables without a Y axis, both are ignored by
    /// single-cell tables.
    pub fn lookup(&self, space: &AddressSpace, x: f64, y: f64) -> Result<f64> {
        let data = self.data().get_all(space)?;
        let width = self.width();

        let (x0, x1, tx) = match self.x_axis() {
            Some(_) => find_surrounding_indices(x, &self.axis_values(space, Axis::X)?),
            None => (0, 0, 0.0),
        };
        let (y0, y1, ty) = match self.y_axis() {
            Some(_) => find_surrounding_indices(y, &self.axis_values(space, Axis::Y)?),
            None => (0, 0, 0.0),
        };

        let cell = |cx: usize, cy: usize| data.get(cx + cy * width).copied().unwrap_or(0.0);

        let top = cell(x0, y0) + (cell(x1, y0) - cell(x0, y0)) * tx;
        let bottom = cell(x0, y1) + (cell(x1, y1) - cell(x0, y1)) * tx;

        Ok(top + (bottom - top) * ty)
    }
}

/// Bracketing bin indices of `value` and its fraction of the way between them
///
/// Positions outside the bins clamp to the nearest edge with a zero fraction.
fn find_surrounding_indices(value: f64, bins: &[f64]) -> (usize, usize, f64) {
    let (Some(&first), Some(&last)) = (bins.first(), bins.last()) else {
        return (0, 0, 0.0);
    };
    let top = bins.len() - 1;
    if value <= first || value.is_nan() {
        return (0, 0, 0.0);
    }
    if value >= last {
        return (top, top, 0.0);
    }

    // First bin above `value`; clamped for bins that are not ascending
    let hi = bins.partition_point(|&bin| bin <= value).clamp(1, top);
    let lo = hi - 1;
    let span = bins[hi] - bins[lo];
    let ratio = if span > 0.0 {
        (value - bins[lo]) / span
    } else {
        0.0
    };
    (lo, hi, ratio)
}
