//! Descriptive statistics over Polars `Float64Chunked` columns.
//!
//! Nulls are skipped by every aggregation here.

use polars::prelude::*;

/// Round to exactly three decimal places.
///
/// Magnitudes too large to scale without overflow are returned as-is; they
/// carry no fractional digits at that size anyway.
pub(crate) fn round3(value: f64) -> f64 {
    let scaled = value * 1000.0;
    if !scaled.is_finite() {
        return value;
    }
    scaled.round() / 1000.0
}

/// Sample standard deviation (ddof 1), `None` below two present values.
pub(crate) fn sample_std(values: &Float64Chunked) -> Option<f64> {
    if values.len() - values.null_count() < 2 {
        return None;
    }
    values.std(1)
}

/// Linearly interpolated percentile, `None` when no value is present.
///
/// `q` is a fraction in `0.0..=1.0`.
pub(crate) fn percentile(values: &Float64Chunked, q: f64) -> Option<f64> {
    // Polars only rejects q outside 0..=1.
    values
        .quantile(q.clamp(0.0, 1.0), QuantileMethod::Linear)
        .ok()
        .flatten()
}
