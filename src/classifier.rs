//! Archetype classification
//!
//! An ordered list of rules, evaluated top to bottom; the first match wins:
//!
//! 1. `LowActivity` - activity index below threshold: Emerging
//! 2. `Balanced` - narrow spread and a solid mean: Balanced
//! 3. `Dominant` - highest qualifying dimension picks the archetype
//!    (Guardian only for collaborative profiles)
//! 4. `Fallback` - nothing qualifies: Emerging
//!
//! Exact ties resolve by dimension priority:
//! Building > Guarding > Consistency > Breadth.

use crate::config::ClassifierConfig;
use crate::types::{
    Archetype, ClassificationRule, Dimension, DimensionScores, NormalizedStats, ProfileType,
};

/// Everything the decision tree looks at
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClassifierInput {
    pub dimensions: DimensionScores,
    pub profile_type: ProfileType,
    pub activity_index: u64,
}

/// Archetype plus the rule that produced it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Classification {
    pub archetype: Archetype,
    pub rule: ClassificationRule,
}

/// A single step of the decision tree
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rule {
    LowActivity,
    Balanced,
    Dominant,
    Fallback,
}

/// Evaluation order of the decision tree
pub const RULES: [Rule; 4] = [Rule::LowActivity, Rule::Balanced, Rule::Dominant, Rule::Fallback];

impl Rule {
    /// Return a classification if this rule matches
    pub fn evaluate(
        &self,
        input: &ClassifierInput,
        config: &ClassifierConfig,
    ) -> Option<Classification> {
        match self {
            Rule::LowActivity => (input.activity_index < config.min_activity_index).then_some(
                Classification {
                    archetype: Archetype::Emerging,
                    rule: ClassificationRule::LowActivity,
                },
            ),
            Rule::Balanced => {
                let dims = &input.dimensions;
                (dims.spread() <= config.balanced_max_spread
                    && dims.mean() >= config.balanced_min_mean)
                    .then_some(Classification {
                        archetype: Archetype::Balanced,
                        rule: ClassificationRule::Balanced,
                    })
            }
            Rule::Dominant => dominant_dimension(input, config).map(|dimension| Classification {
                archetype: Archetype::for_dimension(dimension),
                rule: ClassificationRule::Dominant(dimension),
            }),
            Rule::Fallback => Some(Classification {
                archetype: Archetype::Emerging,
                rule: ClassificationRule::Fallback,
            }),
        }
    }
}

/// Highest-scoring dimension that clears the threshold and is eligible.
///
/// Guarding is skipped for solo profiles, letting the next qualifying
/// dimension through.
fn dominant_dimension(input: &ClassifierInput, config: &ClassifierConfig) -> Option<Dimension> {
    input
        .dimensions
        .ranked()
        .into_iter()
        .take_while(|(_, score)| *score >= config.dominant_threshold)
        .map(|(dimension, _)| dimension)
        .find(|dimension| {
            *dimension != Dimension::Guarding || input.profile_type == ProfileType::Collaborative
        })
}

/// Archetype classifier
pub struct ArchetypeClassifier;

impl ArchetypeClassifier {
    /// Run the decision tree
    pub fn classify(input: &ClassifierInput, config: &ClassifierConfig) -> Classification {
        RULES
            .iter()
            .find_map(|rule| rule.evaluate(input, config))
            .unwrap_or(Classification {
                archetype: Archetype::Emerging,
                rule: ClassificationRule::Fallback,
            })
    }

    /// Collaborative when the profile shows review activity
    pub fn profile_type(stats: &NormalizedStats, config: &ClassifierConfig) -> ProfileType {
        if config.collaborative_min_reviews > 0
            && stats.reviews_submitted_count >= config.collaborative_min_reviews
        {
            ProfileType::Collaborative
        } else {
            ProfileType::Solo
        }
    }
}
