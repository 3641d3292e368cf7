// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use bifurcate::raster::{normalize, rasterize, ColumnResult, DensityColumn};
use bifurcate::sampler::{logistic, ConvergenceSampler, DEFAULT_START};
use bifurcate::viewport::{PARAM_BOUNDS, VALUE_BOUNDS};
use bifurcate::{Pixel, PixelRect, Viewport};
use proptest::prelude::*;
use rand::{Rng, SeedableRng};
use rand::rngs::StdRng;

fn viewport() -> impl Strategy<Value = Viewport> {
    (
        1usize..512,
        1usize..512,
        -2.0f64..3.9,
        0.01f64..1.0,
        0.0f64..0.9,
        0.01f64..1.0,
    )
        .prop_map(|(width, height, p0, pspan, v0, vspan)| {
            let p1 = (p0 + pspan * (PARAM_BOUNDS.1 - p0)).min(PARAM_BOUNDS.1);
            let v1 = (v0 + vspan * (VALUE_BOUNDS.1 - v0)).min(VALUE_BOUNDS.1);
            Viewport::new(width, height, (p0, p1), (v0, v1), 1.0).unwrap()
        })
}

proptest! {
    #[test]
    fn stable_parameters_settle_on_one_value(r in 1.05f64..2.95) {
        let samples = ConvergenceSampler::default().sample(r, 256, DEFAULT_START);
        prop_assert_eq!(samples.len(), 1);
        let next = logistic(samples[0], r);
        prop_assert!((next - samples[0]).abs() < 1e-8);
    }

    #[test]
    fn samples_are_always_finite(r in -2.0f64..4.0, start in 0.0f64..1.0) {
        let samples = ConvergenceSampler::default().sample(r, 128, start);
        prop_assert!(samples.len() <= 128);
        prop_assert!(samples.iter().all(|v| v.is_finite()));
    }

    #[test]
    fn param_at_and_column_at_are_inverses(vp in viewport()) {
        for column in 0..vp.width() {
            let back = vp.column_at(vp.param_at(column as f64));
            prop_assert!((back - column as f64).abs() <= 1.0);
            prop_assert_eq!(back.round() as usize, column);
        }
    }

    #[test]
    fn full_bounds_zoom_box_changes_nothing(vp in viewport()) {
        let rect = PixelRect::from_corners(
            Pixel(0, 0),
            Pixel(vp.width() as i32, vp.height() as i32),
        );
        if let Some(zoomed) = vp.zoom_box(rect) {
            let (p, q) = (vp.param_range(), zoomed.param_range());
            prop_assert!((p.0 - q.0).abs() < 1e-9 && (p.1 - q.1).abs() < 1e-9);
            let (p, q) = (vp.value_range(), zoomed.value_range());
            prop_assert!((p.0 - q.0).abs() < 1e-9 && (p.1 - q.1).abs() < 1e-9);
        } else {
            // Only a one-pixel surface is too small to drag a box on.
            prop_assert!(vp.width() <= 1 || vp.height() <= 1);
        }
    }

    #[test]
    fn clamp_is_idempotent(vp in viewport(), factor in 1e-12f64..100.0, dx in -500i32..500) {
        let moved = vp.zoom_scale(factor).pan(dx, -dx);
        let once = moved.clamp();
        prop_assert_eq!(once.clamp(), once.clone());
        let (a, b) = once.param_range();
        prop_assert!(a >= PARAM_BOUNDS.0 && b <= PARAM_BOUNDS.1 && b > a);
        let (a, b) = once.value_range();
        prop_assert!(a >= VALUE_BOUNDS.0 && b <= VALUE_BOUNDS.1 && b > a);
    }

    #[test]
    fn flat_columns_are_black(level in 0.0f64..1e6, height in 1usize..1024) {
        let column = DensityColumn { column: 0, density: vec![level; height] };
        let pixels = normalize(&column, 1);
        prop_assert_eq!(pixels.intensities, vec![0u8; height]);
    }

    #[test]
    fn splatting_conserves_mass_inside_the_view(
        samples in prop::collection::vec(0.0f64..0.98, 0..200),
    ) {
        let vp = Viewport::new(1, 50, (2.0, 4.0), (0.0, 1.0), 1.0).unwrap();
        let result = ColumnResult { generation: 1, column: 0, samples: samples.clone() };
        let density = rasterize(&result, &vp);
        let total: f64 = density.density.iter().sum();
        prop_assert!((total - samples.len() as f64).abs() < 1e-6);
    }
}

#[test]
fn zoom_scale_composes_when_nothing_is_clamped() {
    let mut rng = StdRng::seed_from_u64(0x5eed);
    for _ in 0..200 {
        let center = rng.gen_range(0.0, 2.0);
        let span = rng.gen_range(0.01, 1.0);
        let vcenter = rng.gen_range(0.4, 0.6);
        let vspan = rng.gen_range(0.01, 0.5);
        let vp = Viewport::new(
            640,
            480,
            (center - span / 2.0, center + span / 2.0),
            (vcenter - vspan / 2.0, vcenter + vspan / 2.0),
            1.0,
        )
        .unwrap();
        let twice = vp.zoom_scale(0.75).zoom_scale(0.75);
        let once = vp.zoom_scale(0.75 * 0.75);
        let (a, b) = (twice.param_range(), once.param_range());
        assert!((a.0 - b.0).abs() < 1e-12 && (a.1 - b.1).abs() < 1e-12);
        let (a, b) = (twice.value_range(), once.value_range());
        assert!((a.0 - b.0).abs() < 1e-12 && (a.1 - b.1).abs() < 1e-12);
    }
}

#[test]
fn period_two_window_cycles_between_two_values() {
    let mut rng = StdRng::seed_from_u64(2);
    let sampler = ConvergenceSampler::default();
    for _ in 0..50 {
        let r = rng.gen_range(3.1, 3.4);
        let samples = sampler.sample(r, 256, DEFAULT_START);
        assert_eq!(samples.len(), 2, "r = {}", r);
        assert!((samples[0] - samples[1]).abs() > 1e-3);
        assert!((logistic(samples[1], r) - samples[0]).abs() < 1e-8);
    }
}
