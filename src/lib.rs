#![deny(missing_docs)]
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Bifurcation diagram renderer
//!
//! The logistic map takes a value between zero and one and a
//! parameter, and produces a new value: `x * r * (1 - x)`.  Iterate
//! it, and for small parameters the value settles onto a single
//! point.  Raise the parameter past three and the orbit splits in
//! two, then four, then eight, faster and faster, until shortly
//! before 3.57 it dissolves into chaos, interrupted here and there by
//! windows of order.  Plotting where the orbit ends up against the
//! parameter that produced it gives the bifurcation diagram.
//!
//! Every pixel column of the diagram is one parameter.  For each, we
//! iterate the map until the transient dies away, record the values
//! the orbit keeps visiting (stopping early once it starts repeating
//! itself), splat those values into a histogram the height of the
//! column, and stretch that histogram into gray levels.
//!
//! A full diagram takes a while, and a diagram is meant to be
//! explored: zoomed, panned, resampled.  So columns are computed a
//! few at a time, frame by frame, either inline or on a background
//! worker, and any change to the view cancels the computation in
//! flight and starts over.

pub mod config;
pub mod controller;
pub mod errors;
pub mod raster;
pub mod sampler;
pub mod scheduler;
pub mod session;
pub mod sink;
pub mod viewport;

pub use config::{Config, ExecutionMode};
pub use controller::{Action, Controller};
pub use errors::BifurcateError;
pub use raster::{normalize, rasterize, ColumnResult, DensityColumn, PixelColumn};
pub use sampler::ConvergenceSampler;
pub use scheduler::{Budget, ComputeJob, JobState, Scheduler, TickReport};
pub use session::{Flow, Session};
pub use sink::{DisplaySink, HeadlessSink, InputEvent, SurfaceHandle};
pub use viewport::{ColumnRequest, Pixel, PixelRect, Viewport};
