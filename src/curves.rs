//! Diminishing-returns curves
//!
//! Shared normalization helpers used by every scorer. All of them map to a
//! bounded range and treat non-finite input as zero.

/// Upper bound of every score in the pipeline
pub const MAX_SCORE: f64 = 100.0;

/// Coerce NaN and infinities to zero
pub fn finite_or_zero(value: f64) -> f64 {
    if value.is_finite() {
        value
    } else {
        0.0
    }
}

/// Saturating curve approaching 100 as `x` grows.
///
/// Formula: `100 * (1 - exp(-x / k))`
/// At `x = k` the curve reaches ~63; at `x = 3k` ~95. Never exceeds 100.
pub fn saturate(x: f64, k: f64) -> f64 {
    let x = finite_or_zero(x);
    if x <= 0.0 || !(k.is_finite() && k > 0.0) {
        return 0.0;
    }
    (MAX_SCORE * (1.0 - (-x / k).exp())).clamp(0.0, MAX_SCORE)
}

/// Division that yields zero for a zero or non-finite denominator
pub fn ratio(numerator: f64, denominator: f64) -> f64 {
    let denominator = finite_or_zero(denominator);
    if denominator == 0.0 {
        return 0.0;
    }
    finite_or_zero(finite_or_zero(numerator) / denominator)
}

/// Scale a unit-interval value to 0-100
pub fn percent(unit: f64) -> f64 {
    finite_or_zero(unit).clamp(0.0, 1.0) * MAX_SCORE
}

/// Round a 0-100 value to an integer score
pub fn to_score(value: f64) -> u8 {
    finite_or_zero(value).round().clamp(0.0, MAX_SCORE) as u8
}
