//! Statistical helper functions for tellus.
//!
//! Two families live here. The plain functions (`mean`, `variance`, `sd`)
//! assume clean input. The `nan*` functions treat NaN as a missing value and
//! exclude it, returning NaN when nothing is left to reduce. Every reduction
//! sums in slice order, so identical inputs give bit-identical results.

/// Arithmetic mean of a slice. Returns 0.0 if empty.
pub fn mean(data: &[f64]) -> f64 {
    if data.is_empty() {
        return 0.0;
    }
    let sum: f64 = data.iter().sum();
    sum / data.len() as f64
}

/// Sample variance with N-1 denominator.
/// Returns 0.0 if fewer than 2 elements.
pub fn variance(data: &[f64]) -> f64 {
    let n = data.len();
    if n < 2 {
        return 0.0;
    }
    let nf = n as f64;
    let mean = data.iter().sum::<f64>() / nf;
    data.iter().map(|&x| (x - mean) * (x - mean)).sum::<f64>() / (nf - 1.0)
}

/// Sample standard deviation with N-1 denominator.
/// Returns 0.0 if fewer than 2 elements.
pub fn sd(data: &[f64]) -> f64 {
    variance(data).sqrt()
}

/// Population standard deviation (N denominator). Returns 0.0 if empty.
pub fn population_sd(data: &[f64]) -> f64 {
    if data.is_empty() {
        return 0.0;
    }
    let m = mean(data);
    (data.iter().map(|&x| (x - m) * (x - m)).sum::<f64>() / data.len() as f64).sqrt()
}

/// Number of non-NaN entries.
pub fn count_valid(data: &[f64]) -> usize {
    data.iter().filter(|v| !v.is_nan()).count()
}

/// Mean over the non-NaN entries. Returns NaN when every entry is missing.
pub fn nanmean(data: &[f64]) -> f64 {
    let mut sum = 0.0;
    let mut n = 0usize;
    for &v in data.iter().filter(|v| !v.is_nan()) {
        sum += v;
        n += 1;
    }
    if n == 0 {
        return f64::NAN;
    }
    sum / n as f64
}

/// Variance over the non-NaN entries with `N - ddof` denominator.
///
/// Returns NaN when the number of valid entries does not exceed `ddof`.
pub fn nanvar(data: &[f64], ddof: usize) -> f64 {
    let n = count_valid(data);
    if n <= ddof {
        return f64::NAN;
    }
    let m = nanmean(data);
    let ss: f64 = data
        .iter()
        .filter(|v| !v.is_nan())
        .map(|&x| (x - m) * (x - m))
        .sum();
    ss / (n - ddof) as f64
}

/// Population standard deviation over the non-NaN entries (ddof = 0).
///
/// Returns NaN when every entry is missing.
pub fn nanstd(data: &[f64]) -> f64 {
    nanvar(data, 0).sqrt()
}

/// Pearson correlation coefficient.
///
/// Filters to indices where both `x[i]` and `y[i]` are finite.
/// Returns `None` if fewer than 2 finite pairs or if the denominator is zero
/// (constant input).
pub fn pearson_correlation(x: &[f64], y: &[f64]) -> Option<f64> {
    let pairs: Vec<(f64, f64)> = x
        .iter()
        .zip(y.iter())
        .filter(|(xi, yi)| xi.is_finite() && yi.is_finite())
        .map(|(xi, yi)| (*xi, *yi))
        .collect();

    if pairs.len() < 2 {
        return None;
    }

    let n = pairs.len() as f64;
    let mx: f64 = pairs.iter().map(|(xi, _)| xi).sum::<f64>() / n;
    let my: f64 = pairs.iter().map(|(_, yi)| yi).sum::<f64>() / n;

    let mut sum_xy = 0.0;
    let mut sum_xx = 0.0;
    let mut sum_yy = 0.0;
    for &(xi, yi) in &pairs {
        let dx = xi - mx;
        let dy = yi - my;
        sum_xy += dx * dy;
        sum_xx += dx * dx;
        sum_yy += dy * dy;
    }

    let denom = (sum_xx * sum_yy).sqrt();
    if denom == 0.0 {
        return None;
    }

    Some(sum_xy / denom)
}
