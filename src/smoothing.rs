//! Temporal smoothing
//!
//! One exponential-moving-average step per handle per day. The previous value
//! is passed in explicitly; nothing here remembers anything between calls.
//!
//! With α = 0.15 the half-life is ln(0.5) / ln(0.85) ≈ 4.3 days: a sustained
//! 10-point swing in the raw score shows up as roughly 1.5 points per day.

use crate::curves::{finite_or_zero, to_score, MAX_SCORE};

/// Blend factor for the current score
pub const EMA_ALPHA: f64 = 0.15;

/// Smooth a score against the previous smoothed value.
///
/// Without a previous value the current score passes through rounded.
/// Otherwise returns `round(α·current + (1-α)·previous)` clamped to [0, 100].
///
/// Feeding the rounded output back in as `previous` stalls about three points
/// short of a steady target (0 chasing 100 stops at 97). Callers that chain
/// days should keep the unrounded [`ema_step`] value as state, as
/// [`ImpactProcessor`](crate::pipeline::ImpactProcessor) does.
pub fn apply_ema(current: f64, previous: Option<f64>) -> u8 {
    to_score(ema_step(current, previous, EMA_ALPHA))
}

/// Unrounded EMA step with an explicit blend factor.
///
/// Stores that keep this value at full precision avoid the rounding dead-band
/// that would otherwise stall convergence a few points short of the target.
pub fn ema_step(current: f64, previous: Option<f64>, alpha: f64) -> f64 {
    let current = finite_or_zero(current).clamp(0.0, MAX_SCORE);
    match previous.map(finite_or_zero) {
        None => current,
        Some(previous) => {
            let previous = previous.clamp(0.0, MAX_SCORE);
            (alpha * current + (1.0 - alpha) * previous).clamp(0.0, MAX_SCORE)
        }
    }
}

/// Days for a step change to be half absorbed
pub fn half_life_days(alpha: f64) -> f64 {
    0.5f64.ln() / (1.0 - alpha).ln()
}
