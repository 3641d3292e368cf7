// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The convergence sampler finds the attractor of the logistic map
//! at a given parameter.  It iterates the map long enough for the
//! transient to die away, then records the orbit.  Most parameters
//! settle onto a fixed point or a short cycle, and there's no point
//! in recording the same handful of values hundreds of times, so the
//! sampler remembers the last few values it has seen and stops the
//! moment the orbit returns to one of them.
//!
//! This is not exact period detection.  A cycle longer than the
//! window, or a chaotic orbit, runs until the target count is met
//! (or until it happens to come within tolerance of a remembered
//! value), which is exactly what the diagram wants anyway.

/// The largest convergence window the sampler supports.
pub const MAX_WINDOW: usize = 32;

/// Where every orbit starts unless told otherwise.
pub const DEFAULT_START: f64 = 0.5;

/// One step of the logistic map.
#[inline]
pub fn logistic(value: f64, param: f64) -> f64 {
    value * param * (1.0 - value)
}

/// A fixed-size ring of the most recently collected values.
struct RecentValues {
    values: [f64; MAX_WINDOW],
    capacity: usize,
    len: usize,
    cursor: usize,
}

impl RecentValues {
    fn new(capacity: usize) -> Self {
        RecentValues {
            values: [0.0; MAX_WINDOW],
            capacity,
            len: 0,
            cursor: 0,
        }
    }

    fn push(&mut self, value: f64) {
        self.values[self.cursor] = value;
        self.cursor = (self.cursor + 1) % self.capacity;
        self.len = (self.len + 1).min(self.capacity);
    }

    fn contains(&self, value: f64, tolerance: f64) -> bool {
        self.values[..self.len]
            .iter()
            .any(|seen| (seen - value).abs() < tolerance)
    }
}

/// Contains the parameters by which an orbit is sampled.  Once set,
/// this object should not be mutable; it is shared with the column
/// worker.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct ConvergenceSampler {
    burn_in: usize,
    tolerance: f64,
    window: usize,
}

impl Default for ConvergenceSampler {
    fn default() -> Self {
        ConvergenceSampler {
            burn_in: 1000,
            tolerance: 1e-8,
            window: 16,
        }
    }
}

impl ConvergenceSampler {
    /// Takes the number of iterations to throw away, the distance
    /// under which two values count as the same state, and the number
    /// of recent values to compare against.  The window is forced
    /// into `1..=MAX_WINDOW`.
    pub fn new(burn_in: usize, tolerance: f64, window: usize) -> Self {
        ConvergenceSampler {
            burn_in,
            tolerance,
            window: window.max(1).min(MAX_WINDOW),
        }
    }

    /// Iterations discarded before collection.
    pub fn burn_in(&self) -> usize {
        self.burn_in
    }

    /// The convergence tolerance.
    pub fn tolerance(&self) -> f64 {
        self.tolerance
    }

    /// The convergence window.
    pub fn window(&self) -> usize {
        self.window
    }

    /// Runs the map at `param` from `start`, and returns up to
    /// `target` values of the attractor, in orbit order.
    ///
    /// Collection stops early when a new value is within tolerance of
    /// one of the last `window` values; that repeated value is not
    /// included.  Collection also stops, returning what it has, if the
    /// orbit leaves the finite numbers.
    pub fn sample(&self, param: f64, target: usize, start: f64) -> Vec<f64> {
        let mut value = start;
        for _ in 0..self.burn_in {
            value = logistic(value, param);
            if !value.is_finite() {
                return Vec::new();
            }
        }

        let mut recent = RecentValues::new(self.window);
        let mut collected = Vec::with_capacity(target.min(4096));
        for _ in 0..target {
            value = logistic(value, param);
            if !value.is_finite() || recent.contains(value, self.tolerance) {
                break;
            }
            recent.push(value);
            collected.push(value);
        }
        collected
    }
}
