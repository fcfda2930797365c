//! Reflection of negative values about zero.
//!
//! Distinct from clipping: `-0.03` becomes `0.03`, not `0.0`.

/// Replaces every negative value with its magnitude. Returns how many
/// values changed. NaN is left alone.
pub fn reflect_negative<'a>(values: impl IntoIterator<Item = &'a mut f64>) -> usize {
    let mut n = 0;
    for v in values {
        if *v < 0.0 {
            *v = -*v;
            n += 1;
        }
    }
    n
}
