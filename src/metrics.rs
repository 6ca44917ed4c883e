//! Derived metrics computed from raw upstream values

use crate::data::{CommitFrequencyBucket, LanguageShare};

/// Minimum SHA length required to display an abbreviated SHA
pub const SHORT_SHA_LEN: usize = 7;

/// Number of most recent weeks kept in the commit frequency series
pub const FREQUENCY_WEEKS: usize = 12;

/// Compute language shares from `(language, bytes)` pairs.
///
/// Returns `None` when there are no languages or the byte total is zero.
/// The result is sorted descending by bytes; equal byte counts keep their
/// input order.
pub fn language_shares(entries: &[(String, u64)]) -> Option<Vec<LanguageShare>> {
    // u128 so that any number of u64 byte counts sums without overflow
    let total: u128 = entries.iter().map(|(_, bytes)| u128::from(*bytes)).sum();
    if total == 0 {
        return None;
    }

    let mut shares: Vec<LanguageShare> = entries
        .iter()
        .map(|(language, bytes)| LanguageShare {
            language: language.clone(),
            bytes: *bytes,
            percentage: round2(*bytes as f64 / total as f64 * 100.0),
        })
        .collect();

    // sort_by is stable
    shares.sort_by(|a, b| b.bytes.cmp(&a.bytes));
    Some(shares)
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// First line of a commit message
pub fn first_line(message: &str) -> &str {
    let line = message.split('\n').next().unwrap_or("");
    line.strip_suffix('\r').unwrap_or(line)
}

/// Check that a SHA can be abbreviated without silent truncation
pub fn validate_sha(sha: &str) -> Result<(), String> {
    if sha.len() < SHORT_SHA_LEN || !sha.is_ascii() {
        return Err(format!(
            "malformed commit SHA '{}': expected at least {} characters",
            sha, SHORT_SHA_LEN
        ));
    }
    Ok(())
}

/// Keep the most recent [`FREQUENCY_WEEKS`] buckets, ordered by week start
pub fn recent_weeks(mut buckets: Vec<CommitFrequencyBucket>) -> Vec<CommitFrequencyBucket> {
    buckets.sort_by_key(|b| b.week_start);
    let skip = buckets.len().saturating_sub(FREQUENCY_WEEKS);
    buckets.split_off(skip)
}
