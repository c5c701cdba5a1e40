//! Validation and normalization of visit input.

use epri_core::error::DomainError;

/// Page path recorded when the client omits one.
pub const DEFAULT_PAGE_PATH: &str = "/";

/// Longest accepted session id, matching the `visit_events.session_id` column.
pub const MAX_SESSION_ID_LEN: usize = 128;

/// Longest accepted page path in UTF-8 bytes. Together with a maximal session
/// id this stays under the btree row limit of the `(session_id, page_path)`
/// unique index.
pub const MAX_PAGE_PATH_BYTES: usize = 2048;

fn reject_control_chars(value: &str, field: &str) -> Result<(), DomainError> {
    if value.chars().any(char::is_control) {
        return Err(DomainError::Validation(format!(
            "{field} must not contain control characters"
        )));
    }
    Ok(())
}

/// Validates a raw session id. Surrounding whitespace is ignored.
///
/// # Errors
///
/// Returns `DomainError::Validation` if the id is absent, blank, longer than
/// [`MAX_SESSION_ID_LEN`] or contains control characters.
pub fn normalize_session_id(raw: Option<&str>) -> Result<String, DomainError> {
    let session_id = raw.map(str::trim).unwrap_or_default();
    if session_id.is_empty() {
        return Err(DomainError::Validation("Session ID is required".into()));
    }
    if session_id.chars().count() > MAX_SESSION_ID_LEN {
        return Err(DomainError::Validation(format!(
            "Session ID must be at most {MAX_SESSION_ID_LEN} characters"
        )));
    }
    reject_control_chars(session_id, "Session ID")?;
    Ok(session_id.to_owned())
}

/// Normalizes a raw page path. Absent or blank paths become
/// [`DEFAULT_PAGE_PATH`].
///
/// # Errors
///
/// Returns `DomainError::Validation` if the path is longer than
/// [`MAX_PAGE_PATH_BYTES`] or contains control characters.
pub fn normalize_page_path(raw: Option<&str>) -> Result<String, DomainError> {
    let page_path = match raw.map(str::trim) {
        Some(path) if !path.is_empty() => path,
        _ => DEFAULT_PAGE_PATH,
    };
    if page_path.len() > MAX_PAGE_PATH_BYTES {
        return Err(DomainError::Validation(format!(
            "Page path must be at most {MAX_PAGE_PATH_BYTES} bytes"
        )));
    }
    reject_control_chars(page_path, "Page path")?;
    Ok(page_path.to_owned())
}
