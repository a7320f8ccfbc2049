//! SIMD window kernels.
//!
//! These use the `wide` crate for portable SIMD and back the latest-value
//! paths of the band indicator.

use wide::f64x4;

/// SIMD sum of a slice.
pub fn sum_simd(data: &[f64]) -> f64 {
    let chunks = data.len() / 4;
    let mut simd_sum = f64x4::splat(0.0);

    for i in 0..chunks {
        let idx = i * 4;
        let values = f64x4::new([data[idx], data[idx + 1], data[idx + 2], data[idx + 3]]);
        simd_sum += values;
    }

    let mut result = simd_sum.reduce_add();

    for &value in &data[(chunks * 4)..] {
        result += value;
    }

    result
}

/// SIMD sum of squared deviations from `mean`.
pub fn sum_sq_dev_simd(data: &[f64], mean: f64) -> f64 {
    let chunks = data.len() / 4;
    let mean_vec = f64x4::splat(mean);
    let mut simd_sum = f64x4::splat(0.0);

    for i in 0..chunks {
        let idx = i * 4;
        let values = f64x4::new([data[idx], data[idx + 1], data[idx + 2], data[idx + 3]]);
        let diff = values - mean_vec;
        simd_sum += diff * diff;
    }

    let mut result = simd_sum.reduce_add();

    for &value in &data[(chunks * 4)..] {
        let diff = value - mean;
        result += diff * diff;
    }

    result
}

/// Mean and population standard deviation of a window.
pub fn mean_std_simd(window: &[f64]) -> Option<(f64, f64)> {
    if window.is_empty() {
        return None;
    }
    let n = window.len() as f64;
    let mean = sum_simd(window) / n;
    let variance = sum_sq_dev_simd(window, mean) / n;
    Some((mean, variance.sqrt()))
}
