use approx::assert_abs_diff_eq;
use tellus_field::{Axis, Field};
use tellus_rescale::{RescaleConfig, enforce_bounds, rescale_two_level};

const Z_TRUTH: [f64; 4] = [1.0, -1.0, -1.0, 1.0];
const Z_REF: [f64; 4] = [1.0, 1.0, -1.0, -1.0];
const TILE_OFFSETS: [f64; 4] = [-0.003, 0.001, 0.0, 0.002];

fn lats() -> Vec<f64> {
    vec![34.0, 34.5]
}

/// time(4) x veg_class(2) x snow_band(2) x lat(2), tiles spread around
/// `mean + std * Z_TRUTH` with offsets that sum to zero per cell.
fn truth(means: [f64; 2], stds: [f64; 2]) -> Field {
    let mut v = Vec::new();
    for (t, z) in Z_TRUTH.iter().enumerate() {
        let scale = 1.0 + 0.1 * t as f64;
        for off in TILE_OFFSETS {
            for c in 0..2 {
                v.push(means[c] + stds[c] * z + off * scale);
            }
        }
    }
    Field::from_vec(
        vec![
            Axis::range("time", 4),
            Axis::range("veg_class", 2),
            Axis::range("snow_band", 2),
            Axis::float("lat", lats()),
        ],
        v,
    )
    .unwrap()
}

fn reference(means: [f64; 2], stds: [f64; 2]) -> Field {
    let mut v = Vec::new();
    for z in Z_REF {
        for c in 0..2 {
            v.push(means[c] + stds[c] * z);
        }
    }
    Field::from_vec(vec![Axis::range("time", 4), Axis::float("lat", lats())], v).unwrap()
}

fn column(f: &Field, lat_index: usize) -> Vec<f64> {
    f.index_axis("lat", lat_index).unwrap().values()
}

#[test]
fn rescaled_cells_take_reference_moments_and_keep_truth_shape() {
    let truth = truth([0.15, 0.30], [0.01, 0.06]);
    let reference = reference([0.20, 0.25], [0.02, 0.03]);
    let r = rescale_two_level(&truth, &reference, &RescaleConfig::new()).unwrap();

    let truth_cell = truth.nanmean_over(&["veg_class", "snow_band"]).unwrap();
    for (c, (m, s)) in [(0.20, 0.02), (0.25, 0.03)].into_iter().enumerate() {
        let cell = column(r.cell(), c);
        assert_abs_diff_eq!(tellus_stats::mean(&cell), m, epsilon = 1e-12);
        assert_abs_diff_eq!(tellus_stats::population_sd(&cell), s, epsilon = 1e-12);
        let rho = tellus_stats::pearson_correlation(&cell, &column(&truth_cell, c)).unwrap();
        assert_abs_diff_eq!(rho, 1.0, epsilon = 1e-12);
    }
    assert_eq!(r.zero_spread_cells(), 0);
    assert_eq!(r.missing_reference_cells(), 0);
}

#[test]
fn tile_anomalies_are_preserved() {
    let truth = truth([0.15, 0.30], [0.01, 0.06]);
    let reference = reference([0.20, 0.25], [0.02, 0.03]);
    let r = rescale_two_level(&truth, &reference, &RescaleConfig::new()).unwrap();

    let truth_cell = truth
        .nanmean_over(&["veg_class", "snow_band"])
        .unwrap()
        .broadcast_values(truth.axes())
        .unwrap();
    let rescaled_cell = r.cell().broadcast_values(truth.axes()).unwrap();
    let out = r.field().data();
    for (((o, rc), t), tc) in out
        .iter()
        .zip(rescaled_cell.iter())
        .zip(truth.data().iter())
        .zip(truth_cell.iter())
    {
        assert_abs_diff_eq!(o - rc, t - tc, epsilon = 1e-12);
    }
}

#[test]
fn already_matched_truth_is_unchanged() {
    let truth = truth([0.15, 0.30], [0.01, 0.06]);
    let reference = truth.nanmean_over(&["veg_class", "snow_band"]).unwrap();
    let r = rescale_two_level(&truth, &reference, &RescaleConfig::new()).unwrap();
    assert_eq!(r.field().axes(), truth.axes());
    for (a, b) in r.field().values().iter().zip(truth.values()) {
        assert_abs_diff_eq!(*a, b, epsilon = 1e-12);
    }
}

#[test]
fn output_keeps_truth_axis_order_for_transposed_reference() {
    let truth = truth([0.15, 0.30], [0.01, 0.06]);
    let reference = reference([0.20, 0.25], [0.02, 0.03])
        .transpose_to(&["lat", "time"])
        .unwrap();
    let r = rescale_two_level(&truth, &reference, &RescaleConfig::new()).unwrap();
    assert_eq!(r.field().names(), truth.names());
}

#[test]
fn bounds_after_rescale_hold_everywhere() {
    // Large reference spread pushes some tiles below zero and above the cap.
    let truth = truth([0.15, 0.30], [0.01, 0.06]);
    let reference = reference([0.05, 0.30], [0.2, 0.2]);
    let r = rescale_two_level(&truth, &reference, &RescaleConfig::new()).unwrap();

    let cap = Field::from_vec(vec![Axis::float("lat", lats())], vec![0.2, 0.45]).unwrap();
    let (bounded, report) = enforce_bounds(r.field(), &cap).unwrap();
    assert!(report.clipped_low > 0);
    assert!(report.clipped_high > 0);

    let caps = cap.broadcast_values(bounded.axes()).unwrap();
    for ((v, before), c) in bounded
        .values()
        .iter()
        .zip(r.field().values())
        .zip(caps.iter())
    {
        assert!(*v >= 0.0 && *v <= *c);
        if (0.0..=*c).contains(&before) {
            assert_eq!(*v, before);
        }
    }
}
