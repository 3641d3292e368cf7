// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Contains the Viewport struct, which describes a relationship
//! between a rectangle of pixels with an origin at 0,0 and a
//! rectangle in map space: the parameter of the logistic map runs
//! along the horizontal axis, the value of the map along the
//! vertical.
//!
//! A Viewport is a value.  Zooming or panning never changes one in
//! place; it produces a new Viewport, which is what lets a compute
//! job keep reading the old one until it is cancelled.

use num::clamp;

use crate::errors::BifurcateError;

/// The range of parameters over which the logistic map is explored.
pub const PARAM_BOUNDS: (f64, f64) = (-2.0, 4.0);

/// The range of values the diagram is allowed to show.
pub const VALUE_BOUNDS: (f64, f64) = (0.0, 1.0);

/// The narrowest span either axis may be zoomed to.
pub const QUANTUM: f64 = 1e-9;

/// Limits on the vertical oversampling factor.
pub const SUBSAMPLE_BOUNDS: (f64, f64) = (1.0 / 16.0, 64.0);

/// A position on the surface, in screen coordinates: x grows to the
/// right, y grows downward.  Signed, because a drag may wander off
/// the surface.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Pixel(pub i32, pub i32);

/// A rectangle of pixels, normalized so that the first corner is the
/// upper left and the second the lower right.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct PixelRect {
    /// Upper-left corner
    pub min: Pixel,
    /// Lower-right corner
    pub max: Pixel,
}

impl PixelRect {
    /// Builds a rectangle out of any two opposing corners.
    pub fn from_corners(a: Pixel, b: Pixel) -> Self {
        PixelRect {
            min: Pixel(a.0.min(b.0), a.1.min(b.1)),
            max: Pixel(a.0.max(b.0), a.1.max(b.1)),
        }
    }

    /// Horizontal extent in pixels.
    pub fn width(&self) -> i32 {
        self.max.0 - self.min.0
    }

    /// Vertical extent in pixels.
    pub fn height(&self) -> i32 {
        self.max.1 - self.min.1
    }
}

/// One column's worth of work: which column, and the parameter the
/// map is iterated at for it.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct ColumnRequest {
    /// Column index, 0 at the left edge
    pub column: usize,
    /// Parameter of the logistic map for this column
    pub param: f64,
}

/// The visible window on the bifurcation diagram.
#[derive(Clone, Debug, PartialEq)]
pub struct Viewport {
    param: (f64, f64),
    value: (f64, f64),
    width: usize,
    height: usize,
    subsample: f64,
}

// Clamps a range into its bounds and keeps it at least a quantum
// wide.  A narrower range is widened upward from its start, or down
// from the top bound when there is no room.  Those widened forms are
// accepted as they are, so rounding in `start + QUANTUM` cannot make
// a second pass widen again.
fn clamp_range(range: (f64, f64), bounds: (f64, f64)) -> (f64, f64) {
    let (lo, hi) = bounds;
    if !(range.0.is_finite() && range.1.is_finite()) {
        return bounds;
    }
    let start = clamp(range.0.min(range.1), lo, hi);
    let end = clamp(range.0.max(range.1), lo, hi);
    let widened = end == start + QUANTUM || (start == hi - QUANTUM && end == hi);
    if end - start >= QUANTUM || widened {
        (start, end)
    } else if start + QUANTUM <= hi {
        (start, start + QUANTUM)
    } else {
        (hi - QUANTUM, hi)
    }
}

// Moves a range by delta without changing its span, stopping at the
// bounds.
fn shift_range(range: (f64, f64), delta: f64, bounds: (f64, f64)) -> (f64, f64) {
    let span = range.1 - range.0;
    let start = clamp(range.0 + delta, bounds.0, bounds.1 - span);
    (start, start + span)
}

fn scale_range(range: (f64, f64), factor: f64) -> (f64, f64) {
    let center = (range.0 + range.1) / 2.0;
    let half = (range.1 - range.0) * factor / 2.0;
    (center - half, center + half)
}

impl Viewport {
    /// Constructor.  Takes the pixel resolution, the parameter and
    /// value ranges, and the vertical oversampling factor.  Ranges
    /// must be increasing and inside the map's domain.
    pub fn new(
        width: usize,
        height: usize,
        param: (f64, f64),
        value: (f64, f64),
        subsample: f64,
    ) -> Result<Viewport, BifurcateError> {
        if width == 0 || height == 0 {
            return Err(BifurcateError::InvalidViewport(format!(
                "resolution {}x{} is empty",
                width, height
            )));
        }

        if !(param.1 > param.0) || param.0 < PARAM_BOUNDS.0 || param.1 > PARAM_BOUNDS.1 {
            return Err(BifurcateError::InvalidViewport(format!(
                "parameter range {:?} is not an increasing range inside {:?}",
                param, PARAM_BOUNDS
            )));
        }

        if !(value.1 > value.0) || value.0 < VALUE_BOUNDS.0 || value.1 > VALUE_BOUNDS.1 {
            return Err(BifurcateError::InvalidViewport(format!(
                "value range {:?} is not an increasing range inside {:?}",
                value, VALUE_BOUNDS
            )));
        }

        if !(subsample > 0.0 && subsample.is_finite()) {
            return Err(BifurcateError::InvalidViewport(format!(
                "subsample {} is not positive",
                subsample
            )));
        }

        Ok(Viewport {
            param,
            value,
            width,
            height,
            subsample,
        }
        .clamp())
    }

    /// The parameter range, left edge to right edge.
    pub fn param_range(&self) -> (f64, f64) {
        self.param
    }

    /// The value range, bottom edge to top edge.
    pub fn value_range(&self) -> (f64, f64) {
        self.value
    }

    /// Number of pixel columns.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Number of pixel rows.
    pub fn height(&self) -> usize {
        self.height
    }

    /// The vertical oversampling factor.
    pub fn subsample(&self) -> f64 {
        self.subsample
    }

    /// How many orbit values the sampler should collect per column:
    /// proportional to the vertical resolution, never zero.
    pub fn target_count(&self) -> usize {
        ((self.height as f64) * self.subsample).ceil().max(1.0) as usize
    }

    /// Given a (possibly fractional) column, return the parameter it
    /// corresponds to.
    pub fn param_at(&self, column: f64) -> f64 {
        self.param.0 + column / (self.width as f64) * (self.param.1 - self.param.0)
    }

    /// The inverse of `param_at`.
    pub fn column_at(&self, param: f64) -> f64 {
        (param - self.param.0) / (self.param.1 - self.param.0) * (self.width as f64)
    }

    /// Given a value of the map, return the fractional row it lands
    /// on, counting from the bottom edge.  Unclamped: values outside
    /// the range produce rows outside `[0, height)`.
    pub fn value_to_row(&self, value: f64) -> f64 {
        (value - self.value.0) / (self.value.1 - self.value.0) * (self.height as f64)
    }

    /// The inverse of `value_to_row`.
    pub fn row_to_value(&self, row: f64) -> f64 {
        self.value.0 + row / (self.height as f64) * (self.value.1 - self.value.0)
    }

    /// Every column of the surface, left to right.
    pub fn requests(&self) -> impl Iterator<Item = ColumnRequest> + '_ {
        (0..self.width).map(move |column| ColumnRequest {
            column,
            param: self.param_at(column as f64),
        })
    }

    /// Clamps both ranges into the map's domain and keeps them at
    /// least `QUANTUM` wide.  Applying it twice changes nothing.
    pub fn clamp(&self) -> Viewport {
        Viewport {
            param: clamp_range(self.param, PARAM_BOUNDS),
            value: clamp_range(self.value, VALUE_BOUNDS),
            subsample: clamp(self.subsample, SUBSAMPLE_BOUNDS.0, SUBSAMPLE_BOUNDS.1),
            ..self.clone()
        }
    }

    /// Maps a rectangle in screen space back into map space and makes
    /// that the new view.  Rectangles one pixel or less across in
    /// either direction are rejected.  The rectangle is clipped to the
    /// surface first.
    pub fn zoom_box(&self, rect: PixelRect) -> Option<Viewport> {
        let (w, h) = (self.width as i32, self.height as i32);
        let rect = PixelRect {
            min: Pixel(clamp(rect.min.0, 0, w), clamp(rect.min.1, 0, h)),
            max: Pixel(clamp(rect.max.0, 0, w), clamp(rect.max.1, 0, h)),
        };
        if rect.width() <= 1 || rect.height() <= 1 {
            return None;
        }

        // Screen y grows downward; rows grow upward.
        let param = (
            self.param_at(f64::from(rect.min.0)),
            self.param_at(f64::from(rect.max.0)),
        );
        let value = (
            self.row_to_value(f64::from(h - rect.max.1)),
            self.row_to_value(f64::from(h - rect.min.1)),
        );
        Some(
            Viewport {
                param,
                value,
                ..self.clone()
            }
            .clamp(),
        )
    }

    /// Shrinks or grows both ranges around their centers.  A factor
    /// below one zooms in.  Nonsense factors leave the view alone.
    pub fn zoom_scale(&self, factor: f64) -> Viewport {
        if !(factor > 0.0 && factor.is_finite()) {
            return self.clone();
        }
        Viewport {
            param: scale_range(self.param, factor),
            value: scale_range(self.value, factor),
            ..self.clone()
        }
        .clamp()
    }

    /// Drags the view by a distance in pixels, so that whatever was
    /// under the cursor stays under it.  Spans are preserved; the
    /// view stops at the domain's edges.
    pub fn pan(&self, dx: i32, dy: i32) -> Viewport {
        let pspan = self.param.1 - self.param.0;
        let vspan = self.value.1 - self.value.0;
        let dparam = -f64::from(dx) / (self.width as f64) * pspan;
        let dvalue = f64::from(dy) / (self.height as f64) * vspan;
        Viewport {
            param: shift_range(self.param, dparam, PARAM_BOUNDS),
            value: shift_range(self.value, dvalue, VALUE_BOUNDS),
            ..self.clone()
        }
        .clamp()
    }

    /// Slides the parameter range by a fraction of its own span.
    pub fn pan_param(&self, fraction: f64) -> Viewport {
        let delta = (self.param.1 - self.param.0) * fraction;
        Viewport {
            param: shift_range(self.param, delta, PARAM_BOUNDS),
            ..self.clone()
        }
        .clamp()
    }

    /// Multiplies the vertical oversampling factor.  The binary only
    /// ever steps by powers of two.
    pub fn with_subsample(&self, multiplier: f64) -> Viewport {
        if !(multiplier > 0.0 && multiplier.is_finite()) {
            return self.clone();
        }
        Viewport {
            subsample: self.subsample * multiplier,
            ..self.clone()
        }
        .clamp()
    }

    /// The same ranges at a new resolution.
    pub fn with_resolution(&self, width: usize, height: usize) -> Option<Viewport> {
        if width == 0 || height == 0 {
            return None;
        }
        Some(Viewport {
            width,
            height,
            ..self.clone()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f64 = 1e-12;
    const ULPS: f64 = 16.0 * std::f64::EPSILON;

    fn default_view() -> Viewport {
        Viewport::new(128, 96, (2.0, 4.0), (0.0, 1.0), 1.0).unwrap()
    }

    fn close(a: (f64, f64), b: (f64, f64)) -> bool {
        (a.0 - b.0).abs() < EPSILON && (a.1 - b.1).abs() < EPSILON
    }

    #[test]
    fn viewport_fails_on_bad_shape() {
        assert!(Viewport::new(4, 4, (4.0, 2.0), (0.0, 1.0), 1.0).is_err());
        assert!(Viewport::new(4, 4, (2.0, 4.0), (1.0, 0.0), 1.0).is_err());
        assert!(Viewport::new(0, 4, (2.0, 4.0), (0.0, 1.0), 1.0).is_err());
        assert!(Viewport::new(4, 4, (2.0, 4.0), (0.0, 1.0), 0.0).is_err());
    }

    #[test]
    fn viewport_fails_outside_the_domain() {
        assert!(Viewport::new(4, 4, (-3.0, 4.0), (0.0, 1.0), 1.0).is_err());
        assert!(Viewport::new(4, 4, (2.0, 4.0), (0.0, 1.5), 1.0).is_err());
    }

    #[test]
    fn param_at_interpolates_linearly() {
        let vp = default_view();
        assert_eq!(vp.param_at(0.0), 2.0);
        assert_eq!(vp.param_at(64.0), 3.0);
        assert_eq!(vp.param_at(128.0), 4.0);
    }

    #[test]
    fn column_at_inverts_param_at() {
        let vp = default_view();
        for column in 0..vp.width() {
            let back = vp.column_at(vp.param_at(column as f64));
            assert!((back - column as f64).abs() < 1e-9);
        }
    }

    #[test]
    fn value_to_row_is_fractional_and_unclamped() {
        let vp = default_view();
        assert_eq!(vp.value_to_row(0.5), 48.0);
        assert_eq!(vp.value_to_row(0.25), 24.0);
        assert!(vp.value_to_row(-0.1) < 0.0);
        assert!(vp.value_to_row(1.1) > 96.0);
        assert!((vp.row_to_value(vp.value_to_row(0.3)) - 0.3).abs() < EPSILON);
    }

    #[test]
    fn requests_cover_every_column_in_order() {
        let vp = default_view();
        let requests: Vec<ColumnRequest> = vp.requests().collect();
        assert_eq!(requests.len(), 128);
        assert_eq!(requests[0], ColumnRequest { column: 0, param: 2.0 });
        assert!(requests.windows(2).all(|w| w[0].column + 1 == w[1].column));
    }

    #[test]
    fn zoom_box_with_full_bounds_is_a_no_op() {
        let vp = default_view();
        let full = PixelRect::from_corners(Pixel(0, 0), Pixel(128, 96));
        let zoomed = vp.zoom_box(full).unwrap();
        assert!(close(zoomed.param_range(), vp.param_range()));
        assert!(close(zoomed.value_range(), vp.value_range()));
    }

    #[test]
    fn zoom_box_maps_screen_space_to_map_space() {
        let vp = default_view();
        // Left half of the surface, top half of the screen.
        let rect = PixelRect::from_corners(Pixel(64, 48), Pixel(0, 0));
        let zoomed = vp.zoom_box(rect).unwrap();
        assert!(close(zoomed.param_range(), (2.0, 3.0)));
        assert!(close(zoomed.value_range(), (0.5, 1.0)));
    }

    #[test]
    fn zoom_box_rejects_degenerate_rectangles() {
        let vp = default_view();
        assert!(vp
            .zoom_box(PixelRect::from_corners(Pixel(10, 10), Pixel(11, 50)))
            .is_none());
        assert!(vp
            .zoom_box(PixelRect::from_corners(Pixel(10, 10), Pixel(50, 10)))
            .is_none());
        assert!(vp
            .zoom_box(PixelRect::from_corners(Pixel(200, 10), Pixel(300, 50)))
            .is_none());
    }

    #[test]
    fn zoom_scale_is_symmetric_around_the_center() {
        let vp = Viewport::new(128, 96, (2.0, 4.0), (0.2, 0.8), 1.0).unwrap();
        let zoomed = vp.zoom_scale(0.5);
        assert!(close(zoomed.param_range(), (2.5, 3.5)));
        assert!(close(zoomed.value_range(), (0.35, 0.65)));
    }

    #[test]
    fn zoom_scale_composes() {
        let vp = Viewport::new(128, 96, (2.5, 3.5), (0.2, 0.8), 1.0).unwrap();
        let twice = vp.zoom_scale(0.75).zoom_scale(0.75);
        let once = vp.zoom_scale(0.75 * 0.75);
        assert!(close(twice.param_range(), once.param_range()));
        assert!(close(twice.value_range(), once.value_range()));
    }

    #[test]
    fn zoom_scale_out_is_clamped_to_the_domain() {
        let vp = default_view().zoom_scale(10.0);
        assert_eq!(vp.param_range(), PARAM_BOUNDS);
        assert_eq!(vp.value_range(), VALUE_BOUNDS);
    }

    #[test]
    fn zoom_scale_ignores_nonsense_factors() {
        let vp = default_view();
        assert_eq!(vp.zoom_scale(0.0), vp);
        assert_eq!(vp.zoom_scale(-1.0), vp);
        assert_eq!(vp.zoom_scale(std::f64::NAN), vp);
    }

    #[test]
    fn clamp_enforces_the_minimum_span() {
        let mut vp = default_view();
        for _ in 0..200 {
            vp = vp.zoom_scale(0.5);
        }
        let (a, b) = vp.param_range();
        assert!(b - a >= QUANTUM - ULPS);
        let (a, b) = vp.value_range();
        assert!(b - a >= QUANTUM - ULPS);
    }

    #[test]
    fn zooming_below_a_quantum_widens_to_a_full_one() {
        let vp = Viewport::new(128, 96, (3.0, 3.0 + 1.2e-9), (0.5, 0.5 + 1.2e-9), 1.0).unwrap();
        let zoomed = vp.zoom_scale(0.5);
        let (a, b) = zoomed.param_range();
        assert!(b - a >= QUANTUM - ULPS);
        assert!(b - a < 1.2e-9);
        let (a, b) = zoomed.value_range();
        assert!(b - a >= QUANTUM - ULPS);
        assert_eq!(zoomed.clamp(), zoomed);
    }

    #[test]
    fn narrow_range_at_the_top_edge_widens_downward() {
        let vp = Viewport {
            param: (4.0, 4.0),
            value: (1.0 - 1e-10, 1.0),
            width: 10,
            height: 10,
            subsample: 1.0,
        }
        .clamp();
        assert_eq!(vp.param_range(), (4.0 - QUANTUM, 4.0));
        assert_eq!(vp.value_range(), (1.0 - QUANTUM, 1.0));
        assert_eq!(vp.clamp(), vp);
    }

    #[test]
    fn clamp_is_idempotent() {
        let vp = Viewport {
            param: (3.9999999999, 4.2),
            value: (1.0, 1.0),
            width: 10,
            height: 10,
            subsample: 1000.0,
        };
        let once = vp.clamp();
        assert_eq!(once.clamp(), once);
        assert_eq!(once.subsample(), SUBSAMPLE_BOUNDS.1);
        assert!(once.value_range().1 <= VALUE_BOUNDS.1);
    }

    #[test]
    fn clamp_resets_non_finite_ranges() {
        let vp = Viewport {
            param: (std::f64::NAN, 3.0),
            value: (0.0, std::f64::INFINITY),
            width: 10,
            height: 10,
            subsample: 1.0,
        };
        let clamped = vp.clamp();
        assert_eq!(clamped.param_range(), PARAM_BOUNDS);
        assert_eq!(clamped.value_range(), VALUE_BOUNDS);
    }

    #[test]
    fn pan_preserves_span_and_stops_at_edges() {
        let vp = Viewport::new(100, 100, (2.0, 3.0), (0.25, 0.75), 1.0).unwrap();
        let panned = vp.pan(-50, 0);
        assert!(close(panned.param_range(), (2.5, 3.5)));
        let panned = vp.pan(-1000, 1000);
        assert!(close(panned.param_range(), (3.0, 4.0)));
        assert!(close(panned.value_range(), (0.5, 1.0)));
    }

    #[test]
    fn pan_param_slides_by_a_fraction_of_the_span() {
        let vp = Viewport::new(100, 100, (2.0, 3.0), (0.0, 1.0), 1.0).unwrap();
        assert!(close(vp.pan_param(0.1).param_range(), (2.1, 3.1)));
        assert!(close(vp.pan_param(-0.1).param_range(), (1.9, 2.9)));
    }

    #[test]
    fn subsample_steps_and_target_count() {
        let vp = default_view();
        assert_eq!(vp.target_count(), 96);
        let up = vp.with_subsample(2.0);
        assert_eq!(up.subsample(), 2.0);
        assert_eq!(up.target_count(), 192);
        let down = vp.with_subsample(0.5).with_subsample(0.5);
        assert_eq!(down.target_count(), 24);
        let floor = (0..20).fold(vp.clone(), |v, _| v.with_subsample(0.5));
        assert_eq!(floor.subsample(), SUBSAMPLE_BOUNDS.0);
        assert_eq!(vp.with_subsample(0.0), vp);
    }

    #[test]
    fn with_resolution_keeps_ranges() {
        let vp = default_view();
        let resized = vp.with_resolution(640, 480).unwrap();
        assert_eq!(resized.param_range(), vp.param_range());
        assert_eq!(resized.width(), 640);
        assert!(vp.with_resolution(0, 480).is_none());
    }
}
