//! Maps an HTTP status and the decoded envelope to an outcome.

use crate::error::ApiError;

/// The one legacy free-text rule: a 502 with this text means "not found".
const NOT_FOUND_MARKER: &str = "Failed to find";

/// Classify a response.
///
/// The fixed status set is checked first; `success` only decides the
/// outcome of a 200.
pub fn classify(status: u16, success: bool, message: &str) -> Result<(), ApiError> {
    if status == 200 && success {
        return Ok(());
    }
    Err(failure(status, message))
}

/// The error for any response that is not a successful 200.
pub fn failure(status: u16, message: &str) -> ApiError {
    match status {
        200 | 400 => api_error(message),
        401 => ApiError::InvalidToken,
        403 => ApiError::NoPermission,
        404 => ApiError::EntityNotFound,
        409 => ApiError::Conflict,
        502 if message.contains(NOT_FOUND_MARKER) => ApiError::EntityNotFound,
        502 => api_error(message),
        status => ApiError::Unknown { status },
    }
}

fn api_error(message: &str) -> ApiError {
    ApiError::Api {
        message: message.to_string(),
    }
}
