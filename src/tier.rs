//! Tier mapping
//!
//! Fixed bands on the adjusted composite:
//! 0-39 Emerging, 40-69 Solid, 70-84 High, 85-100 Elite.

use crate::types::Tier;

pub const SOLID_MIN: u8 = 40;
pub const HIGH_MIN: u8 = 70;
pub const ELITE_MIN: u8 = 85;

impl Tier {
    /// Band an adjusted composite score
    pub fn from_score(score: u8) -> Self {
        match score {
            s if s >= ELITE_MIN => Tier::Elite,
            s if s >= HIGH_MIN => Tier::High,
            s if s >= SOLID_MIN => Tier::Solid,
            _ => Tier::Emerging,
        }
    }
}
