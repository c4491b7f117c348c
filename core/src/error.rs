//! Error types for the AMP360 client.
//!
//! # Design
//! Local failures (`Validation`, `Construction`) never reach the network.
//! `Transport` and `Cancelled` come from dispatch, `Decode` from a response
//! body that does not match the envelope, and the remaining variants are the
//! API outcomes derived from the HTTP status and the envelope. Callers match
//! on [`ApiError::kind`] rather than on message text; only `Api` carries the
//! server's message. `BulkRejected` wraps an API outcome of the bulk path
//! together with the lists the server sent.

use serde_json::Value;
use thiserror::Error;

/// Boxed error produced by a transport implementation.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Errors returned by every client operation.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ApiError {
    /// A required argument was missing; nothing was sent.
    #[error("validation failed: {0}")]
    Validation(String),

    /// The URL or body could not be built; nothing was sent.
    #[error("failed to build request: {0}")]
    Construction(String),

    /// The transport could not complete the round-trip.
    #[error("transport error: {0}")]
    Transport(#[source] BoxError),

    /// The call context was cancelled or its deadline passed.
    #[error("request cancelled")]
    Cancelled,

    /// The response body is not a valid envelope for the expected payload.
    #[error("failed to decode response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("authentication token validation error")]
    InvalidToken,

    #[error("do not have permission")]
    NoPermission,

    #[error("entity not found")]
    EntityNotFound,

    #[error("entity with the same unique key already exists")]
    Conflict,

    /// The API rejected the request; `message` is the server's text.
    #[error("api error: {message}")]
    Api { message: String },

    #[error("unknown error (HTTP {status})")]
    Unknown { status: u16 },

    /// A bulk update failed but the server still reported which entries it
    /// applied and which it rejected. `kind()` is the kind of `error`.
    #[error("bulk update rejected: {error}")]
    BulkRejected {
        #[source]
        error: Box<ApiError>,
        updated: Value,
        failed: Value,
    },
}

/// Comparable error category, see [`ApiError::kind`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Validation,
    Construction,
    Transport,
    Cancelled,
    Decode,
    InvalidToken,
    NoPermission,
    EntityNotFound,
    Conflict,
    Api,
    Unknown,
}

impl ApiError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ApiError::Validation(_) => ErrorKind::Validation,
            ApiError::Construction(_) => ErrorKind::Construction,
            ApiError::Transport(_) => ErrorKind::Transport,
            ApiError::Cancelled => ErrorKind::Cancelled,
            ApiError::Decode(_) => ErrorKind::Decode,
            ApiError::InvalidToken => ErrorKind::InvalidToken,
            ApiError::NoPermission => ErrorKind::NoPermission,
            ApiError::EntityNotFound => ErrorKind::EntityNotFound,
            ApiError::Conflict => ErrorKind::Conflict,
            ApiError::Api { .. } => ErrorKind::Api,
            ApiError::Unknown { .. } => ErrorKind::Unknown,
            ApiError::BulkRejected { error, .. } => error.kind(),
        }
    }

    /// Server-supplied message, present only for `Api`.
    pub fn message(&self) -> Option<&str> {
        match self {
            ApiError::Api { message } => Some(message),
            ApiError::BulkRejected { error, .. } => error.message(),
            _ => None,
        }
    }

    /// `updated` and `failed` lists reported alongside a bulk failure.
    pub fn bulk_lists(&self) -> Option<(&Value, &Value)> {
        match self {
            ApiError::BulkRejected { updated, failed, .. } => Some((updated, failed)),
            _ => None,
        }
    }

    pub(crate) fn construction(err: impl std::fmt::Display) -> Self {
        ApiError::Construction(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;
    use std::fmt;

    #[derive(Debug)]
    struct Refused;

    impl fmt::Display for Refused {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "connection refused")
        }
    }

    impl Error for Refused {}

    #[test]
    fn transport_error_keeps_source() {
        let err = ApiError::Transport(Box::new(Refused));
        let source = err.source().expect("transport error should have a source");
        assert!(source.downcast_ref::<Refused>().is_some());
        assert_eq!(err.to_string(), "transport error: connection refused");
    }

    #[test]
    fn only_api_errors_carry_a_message() {
        let err = ApiError::Api {
            message: "bad request".to_string(),
        };
        assert_eq!(err.message(), Some("bad request"));
        assert_eq!(err.kind(), ErrorKind::Api);
        assert_eq!(ApiError::Conflict.message(), None);
    }

    #[test]
    fn bulk_rejection_reports_inner_kind() {
        let err = ApiError::BulkRejected {
            error: Box::new(ApiError::Api {
                message: "no params updated".to_string(),
            }),
            updated: serde_json::json!([]),
            failed: serde_json::json!(["BAD.TAG"]),
        };
        assert_eq!(err.kind(), ErrorKind::Api);
        assert_eq!(err.message(), Some("no params updated"));
        assert_eq!(err.bulk_lists().unwrap().1[0], "BAD.TAG");
        assert!(err.source().is_some());
    }

    #[test]
    fn decode_errors_convert_from_serde() {
        let serde_err = serde_json::from_str::<serde_json::Value>("not json").unwrap_err();
        let err: ApiError = serde_err.into();
        assert_eq!(err.kind(), ErrorKind::Decode);
    }
}
