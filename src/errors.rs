// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Setup failures.  Everything that can go wrong while a diagram is
//! being computed (divergent orbits, degenerate zooms, flat columns,
//! superseded jobs) is handled where it is detected; only problems
//! building the pieces in the first place are reported as errors.

use failure::Fail;

/// The things that can stop a session from starting.
#[derive(Debug, Fail, PartialEq)]
pub enum BifurcateError {
    /// The requested ranges or resolution cannot describe a viewport.
    #[fail(display = "invalid viewport: {}", _0)]
    InvalidViewport(String),

    /// A tunable is out of range.
    #[fail(display = "invalid configuration: {}", _0)]
    InvalidConfig(String),

    /// The display sink refused to hand out a surface.
    #[fail(display = "could not create a {}x{} surface", width, height)]
    Surface {
        /// Requested width in pixels
        width: usize,
        /// Requested height in pixels
        height: usize,
    },

    /// The background column worker could not be spawned.
    #[fail(display = "could not start the column worker: {}", _0)]
    Worker(String),
}
