// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Turns the values an orbit visits into a column of pixels.
//!
//! Each value lands somewhere between two rows.  Rather than
//! incrementing the nearest row, the value's unit of mass is split
//! between the two rows it falls between, in proportion to how close
//! it is to each.  A slowly moving branch of the diagram then slides
//! smoothly from row to row instead of jumping.

use itertools::{Itertools, MinMaxResult};
use num::clamp;

use crate::viewport::Viewport;

/// The attractor values found for one column, in orbit order.
#[derive(Clone, Debug, PartialEq)]
pub struct ColumnResult {
    /// The job that asked for this column
    pub generation: u64,
    /// Column index
    pub column: usize,
    /// Orbit values; never contains a non-finite value
    pub samples: Vec<f64>,
}

/// Accumulated sample mass per row; row 0 is the bottom of the view.
#[derive(Clone, Debug, PartialEq)]
pub struct DensityColumn {
    /// Column index
    pub column: usize,
    /// One entry per row
    pub density: Vec<f64>,
}

/// A column ready for the display, one gray level per row; row 0 is
/// the bottom of the view.
#[derive(Clone, Debug, PartialEq)]
pub struct PixelColumn {
    /// The job that produced this column
    pub generation: u64,
    /// Column index
    pub column: usize,
    /// Gray levels, one per row
    pub intensities: Vec<u8>,
}

/// Splats every sample of a result into a density column the height
/// of the viewport.
pub fn rasterize(result: &ColumnResult, viewport: &Viewport) -> DensityColumn {
    let height = viewport.height();
    let mut density = vec![0.0_f64; height];
    for &value in &result.samples {
        let raw = viewport.value_to_row(value);
        if !raw.is_finite() {
            continue;
        }
        let row = raw.floor();
        let frac = raw - row;
        if row >= 0.0 && row < height as f64 {
            density[row as usize] += 1.0 - frac;
        }
        let above = row + 1.0;
        if above >= 0.0 && above < height as f64 {
            density[above as usize] += frac;
        }
    }
    DensityColumn {
        column: result.column,
        density,
    }
}

/// Stretches a density column so its faintest row is black and its
/// densest is white.  A column with nothing to stretch (empty, or
/// every row the same) is black throughout.
pub fn normalize(density: &DensityColumn, generation: u64) -> PixelColumn {
    let intensities = match density.density.iter().minmax() {
        MinMaxResult::MinMax(&lo, &hi) if hi > lo => density
            .density
            .iter()
            .map(|d| {
                let level = (d - lo) / (hi - lo) * 255.0;
                if level.is_finite() {
                    clamp(level, 0.0, 255.0) as u8
                } else {
                    0
                }
            })
            .collect(),
        _ => vec![0; density.density.len()],
    };
    PixelColumn {
        generation,
        column: density.column,
        intensities,
    }
}
