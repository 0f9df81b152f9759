//! Confidence estimation
//!
//! Confidence starts at a baseline and loses points for sparse history, thin
//! signal volume, a narrow mix of contribution types, a short observation
//! window and batched activity. The result is clamped to [floor, ceiling].

use crate::config::ConfidenceConfig;
use crate::types::{ConfidenceAssessment, ConfidencePenalty, NormalizedStats};

/// Confidence estimator
pub struct ConfidenceEstimator;

impl ConfidenceEstimator {
    /// Assess how well the stats support a reliable score
    pub fn assess(stats: &NormalizedStats, config: &ConfidenceConfig) -> ConfidenceAssessment {
        let mut penalties = Vec::new();
        let mut deducted: i32 = 0;
        let mut apply = |penalty: ConfidencePenalty, points: u8| {
            penalties.push(penalty);
            deducted += points as i32;
        };

        if stats.active_days < config.limited_history_days {
            apply(ConfidencePenalty::LimitedHistory, config.limited_history_penalty);
        } else if stats.active_days < config.moderate_history_days {
            apply(ConfidencePenalty::ModerateHistory, config.moderate_history_penalty);
        }

        if total_signals(stats) < config.min_total_signals {
            apply(ConfidencePenalty::InsufficientData, config.insufficient_data_penalty);
        }

        if signal_kinds(stats) == 1 {
            apply(ConfidencePenalty::NarrowActivityMix, config.narrow_mix_penalty);
        }

        if stats.observed_span_days < config.short_window_days {
            apply(ConfidencePenalty::ShortObservationWindow, config.short_window_penalty);
        }

        if stats.max_commits_in_10_min >= config.burst_threshold {
            apply(ConfidencePenalty::BurstyActivity, config.burst_penalty);
        }

        let confidence = (config.baseline as i32 - deducted)
            .clamp(config.floor as i32, config.ceiling as i32) as u8;

        ConfidenceAssessment {
            confidence,
            penalties,
        }
    }
}

/// Commits, merged PRs, reviews and closed issues combined
fn total_signals(stats: &NormalizedStats) -> u64 {
    stats
        .commits_total
        .saturating_add(stats.prs_merged_count)
        .saturating_add(stats.reviews_submitted_count)
        .saturating_add(stats.issues_closed_count)
}

/// Number of contribution types with any activity
fn signal_kinds(stats: &NormalizedStats) -> usize {
    [
        stats.commits_total,
        stats.prs_merged_count,
        stats.reviews_submitted_count,
        stats.issues_closed_count,
    ]
    .iter()
    .filter(|count| **count > 0)
    .count()
}
