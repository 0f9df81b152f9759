//! Verification codes
//!
//! A short HMAC-SHA256 code lets a lookup service confirm that a displayed
//! profile was issued by this engine on a given day. The payload layout is a
//! wire contract: changing field order invalidates every issued code.
//!
//! ```text
//! handle|adjusted|confidence|tier|archetype|building|guarding|consistency|breadth|commits|prs|reviews|YYYY-MM-DD
//! ```

use crate::error::ComputeError;
use crate::types::{ImpactResult, RawActivityStats};
use chrono::NaiveDate;
use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Hex characters kept from the digest
pub const VERIFICATION_CODE_LEN: usize = 8;

/// Build the pipe-delimited payload that gets signed
pub fn verification_payload(
    stats: &RawActivityStats,
    result: &ImpactResult,
    date: NaiveDate,
) -> String {
    let dims = &result.dimensions;
    [
        result.handle.to_lowercase(),
        result.adjusted_composite.to_string(),
        result.confidence.to_string(),
        result.tier.as_str().to_string(),
        result.archetype.as_str().to_string(),
        dims.building.to_string(),
        dims.guarding.to_string(),
        dims.consistency.to_string(),
        dims.breadth.to_string(),
        stats.commits_total.to_string(),
        stats.prs_merged_count.to_string(),
        stats.reviews_submitted_count.to_string(),
        date.format("%Y-%m-%d").to_string(),
    ]
    .join("|")
}

/// Compute the 8-character verification code for a result on `date`
pub fn verification_hash(
    secret: &[u8],
    stats: &RawActivityStats,
    result: &ImpactResult,
    date: NaiveDate,
) -> Result<String, ComputeError> {
    if secret.is_empty() {
        return Err(ComputeError::InvalidSecret(
            "secret must not be empty".to_string(),
        ));
    }

    let payload = verification_payload(stats, result, date);
    let mut mac = HmacSha256::new_from_slice(secret)
        .map_err(|e| ComputeError::InvalidSecret(e.to_string()))?;
    mac.update(payload.as_bytes());

    let digest = hex::encode(mac.finalize().into_bytes());
    Ok(digest[..VERIFICATION_CODE_LEN].to_string())
}
