//! API key handling.

use crate::providers::traits::PodError;

/// Environment variable holding the RunPod API key.
pub const API_KEY_ENV: &str = "RUNPOD_API_KEY";

/// Validate a raw API key, trimming surrounding whitespace.
///
/// # Errors
/// Returns [`PodError::MissingCredential`] when the key is absent or blank.
pub fn require_api_key(raw: Option<&str>) -> Result<String, PodError> {
    match raw.map(str::trim) {
        Some(key) if !key.is_empty() => Ok(key.to_string()),
        _ => Err(PodError::MissingCredential),
    }
}
