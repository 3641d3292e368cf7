// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The knobs and dials.  Every one of these has a sensible default;
//! the binary overrides them from the command line.

use std::time::Duration;

use crate::errors::BifurcateError;
use crate::sampler::MAX_WINDOW;
use crate::viewport::{PARAM_BOUNDS, SUBSAMPLE_BOUNDS, VALUE_BOUNDS};

/// How the scheduler gets its columns computed.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum ExecutionMode {
    /// Columns are sampled inline, a slice of the compute budget per
    /// frame.
    Cooperative,
    /// One background thread samples columns into a bounded queue of
    /// the given capacity; the frame loop drains it.
    Worker {
        /// Capacity of the result queue
        queue: usize,
    },
}

/// Everything a session needs to know before it starts.
#[derive(Clone, Debug)]
pub struct Config {
    /// Surface width in pixels; one column per pixel.
    pub width: usize,
    /// Surface height in pixels.
    pub height: usize,
    /// Initial parameter range.
    pub param_range: (f64, f64),
    /// Initial value range.
    pub value_range: (f64, f64),
    /// Iterations thrown away before collection begins.
    pub burn_in: usize,
    /// Two values closer than this are the same orbit state.
    pub tolerance: f64,
    /// How many recent values the sampler remembers.
    pub window: usize,
    /// Initial vertical oversampling factor.
    pub subsample: f64,
    /// Time the frame loop may spend draining worker results per frame.
    pub frame_budget: Duration,
    /// Time a cooperative tick may spend computing columns.
    pub compute_budget: Duration,
    /// Frame rate requested from the display sink.
    pub target_fps: u32,
    /// Inline or background computation.
    pub mode: ExecutionMode,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            width: 1280,
            height: 768,
            param_range: (2.0, 4.0),
            value_range: VALUE_BOUNDS,
            burn_in: 1000,
            tolerance: 1e-8,
            window: 16,
            subsample: 1.0,
            frame_budget: Duration::from_millis(33),
            compute_budget: Duration::from_millis(100),
            target_fps: 30,
            mode: ExecutionMode::Cooperative,
        }
    }
}

fn in_bounds(range: (f64, f64), bounds: (f64, f64)) -> bool {
    range.0 < range.1 && range.0 >= bounds.0 && range.1 <= bounds.1
}

impl Config {
    /// Checks every tunable; the first offender is reported.
    pub fn validate(&self) -> Result<(), BifurcateError> {
        let bad = |msg: String| Err(BifurcateError::InvalidConfig(msg));
        if self.width == 0 || self.height == 0 {
            return bad(format!("resolution {}x{} is empty", self.width, self.height));
        }
        if !in_bounds(self.param_range, PARAM_BOUNDS) {
            return bad(format!(
                "parameter range {:?} must be increasing and inside {:?}",
                self.param_range, PARAM_BOUNDS
            ));
        }
        if !in_bounds(self.value_range, VALUE_BOUNDS) {
            return bad(format!(
                "value range {:?} must be increasing and inside {:?}",
                self.value_range, VALUE_BOUNDS
            ));
        }
        if !(self.tolerance > 0.0 && self.tolerance.is_finite()) {
            return bad(format!("tolerance {} must be positive", self.tolerance));
        }
        if self.window == 0 || self.window > MAX_WINDOW {
            return bad(format!("window {} must be between 1 and {}", self.window, MAX_WINDOW));
        }
        if !(self.subsample >= SUBSAMPLE_BOUNDS.0 && self.subsample <= SUBSAMPLE_BOUNDS.1) {
            return bad(format!(
                "subsample {} must be inside {:?}",
                self.subsample, SUBSAMPLE_BOUNDS
            ));
        }
        if self.target_fps == 0 {
            return bad("target frame rate must be positive".to_string());
        }
        if let ExecutionMode::Worker { queue } = self.mode {
            if queue == 0 {
                return bad("worker queue capacity must be positive".to_string());
            }
        }
        Ok(())
    }
}
