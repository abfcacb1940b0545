//! Input validation helpers shared by the engine's caller-facing surface.

use crate::constants::{DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};
use crate::error::EngineError;

/// User ids: 1-128 characters, letters, digits, underscore, hyphen.
pub fn validate_user_id(user_id: &str) -> Result<(), EngineError> {
    if user_id.is_empty() {
        return Err(EngineError::validation("userId must not be empty"));
    }
    if user_id.len() > 128 {
        return Err(EngineError::validation(
            "userId must not exceed 128 characters",
        ));
    }
    if !user_id
        .chars()
        .all(|c| c.is_alphanumeric() || c == '_' || c == '-')
    {
        return Err(EngineError::validation(
            "userId may only contain letters, digits, underscore and hyphen",
        ));
    }
    Ok(())
}

pub fn validate_content_id(content_id: &str) -> Result<(), EngineError> {
    if content_id.is_empty() {
        return Err(EngineError::validation("contentId must not be empty"));
    }
    if content_id.len() > 256 {
        return Err(EngineError::validation(
            "contentId must not exceed 256 characters",
        ));
    }
    Ok(())
}

/// Normalizes pagination: page defaults to 1, limit is clamped to the
/// allowed range rather than rejected.
pub fn normalize_pagination(page: u64, limit: u64) -> (u64, u64) {
    let page = page.max(1);
    let limit = if limit == 0 {
        DEFAULT_PAGE_SIZE
    } else {
        limit.min(MAX_PAGE_SIZE)
    };
    (page, limit)
}
