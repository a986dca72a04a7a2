//! Random slug generation for short links.

use crate::error::AppError;
use serde_json::json;

/// Number of random bytes per slug. Hex encoding doubles the length.
const SLUG_LENGTH_BYTES: usize = 4;

/// Generates a random 8-character lowercase hex slug.
///
/// Entropy comes from the OS random number generator via `getrandom`.
///
/// # Errors
///
/// Returns [`AppError::Internal`] if the system RNG is unavailable.
///
/// # Examples
///
/// ```ignore
/// let slug = generate_slug()?;
/// assert_eq!(slug.len(), 8);
/// assert!(slug.chars().all(|c| c.is_ascii_hexdigit()));
/// ```
pub fn generate_slug() -> Result<String, AppError> {
    let mut buffer = [0u8; SLUG_LENGTH_BYTES];

    getrandom::fill(&mut buffer).map_err(|e| {
        AppError::internal(
            "Failed to generate random bytes",
            json!({ "reason": e.to_string() }),
        )
    })?;

    Ok(hex::encode(buffer))
}
