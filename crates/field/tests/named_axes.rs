use approx::assert_relative_eq;
use chrono::{NaiveDate, NaiveDateTime};
use tellus_field::{Axis, Field};

fn times(n: u32) -> Vec<NaiveDateTime> {
    (1..=n)
        .map(|d| {
            NaiveDate::from_ymd_opt(2017, 1, d)
                .unwrap()
                .and_hms_opt(0, 0, 0)
                .unwrap()
        })
        .collect()
}

/// time(4) x veg_class(2) x snow_band(2) x nlayer(3) x lat(2) x lon(1)
fn state_series() -> Field {
    let axes = vec![
        Axis::time("time", times(4)),
        Axis::range("veg_class", 2),
        Axis::range("snow_band", 2),
        Axis::range("nlayer", 3),
        Axis::float("lat", vec![34.0, 34.5]),
        Axis::float("lon", vec![-98.0]),
    ];
    let n: usize = axes.iter().map(Axis::len).product();
    let values = (0..n).map(|i| (i % 17) as f64 * 0.01 + 0.1).collect();
    Field::from_vec(axes, values).unwrap()
}

#[test]
fn subunit_collapse_is_order_independent_on_complete_data() {
    let f = state_series();
    let a = f.nanmean_over(&["veg_class", "snow_band"]).unwrap();
    let b = f.nanmean_over(&["snow_band", "veg_class"]).unwrap();
    assert_eq!(a.names(), vec!["time", "nlayer", "lat", "lon"]);
    for (x, y) in a.values().iter().zip(b.values()) {
        assert_relative_eq!(*x, y, epsilon = 1e-12);
    }
}

#[test]
fn transposed_copy_reduces_to_same_statistics() {
    let f = state_series();
    let t = f
        .transpose_to(&["lon", "lat", "nlayer", "snow_band", "veg_class", "time"])
        .unwrap();
    let direct = f.nanstd_along("time").unwrap();
    let via_t = t
        .nanstd_along("time")
        .unwrap()
        .transpose_to(&direct.names())
        .unwrap();
    assert_eq!(direct, via_t);
}

#[test]
fn cell_statistics_broadcast_back_to_tiles() {
    let f = state_series();
    let cell_mean = f
        .nanmean_over(&["veg_class", "snow_band"])
        .unwrap()
        .nanmean_along("time")
        .unwrap();
    let spread = cell_mean.broadcast_values(f.axes()).unwrap();
    assert_eq!(spread.shape(), f.shape());

    let first_tile = f
        .index_axis("veg_class", 1)
        .unwrap()
        .index_axis("snow_band", 0)
        .unwrap()
        .index_axis("time", 3)
        .unwrap();
    let expected = cell_mean.broadcast_values(first_tile.axes()).unwrap();
    assert_eq!(expected, *cell_mean.data());
}

#[test]
fn yearly_pieces_concatenate_back() {
    let f = state_series();
    let head = f.slice_times("time", times(4)[0], times(4)[1]).unwrap();
    let tail = f.slice_times("time", times(4)[2], times(4)[3]).unwrap();
    assert_eq!(Field::concat(&[head, tail], "time").unwrap(), f);
}
