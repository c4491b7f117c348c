//! The JSON envelope wrapping every AMP360 response.
//!
//! # Design
//! The payload slot is a type parameter, so the typed result is produced by
//! the same `serde_json` pass that reads `success` and `message`. Error
//! responses often omit the payload or send `null`; both decode to the
//! payload's `Default`.

use serde::de::{DeserializeOwned, Deserializer};
use serde::{Deserialize, Serialize};

use crate::error::ApiError;

/// Single-payload envelope: `{"success", "message", "data"}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Envelope<T> {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub message: String,
    #[serde(
        default,
        deserialize_with = "null_as_default",
        bound(deserialize = "T: Deserialize<'de> + Default")
    )]
    pub data: T,
}

/// Bulk-update envelope: `{"success", "message", "updated", "failed"}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BulkEnvelope<U, F> {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub message: String,
    #[serde(
        default,
        deserialize_with = "null_as_default",
        bound(deserialize = "U: Deserialize<'de> + Default")
    )]
    pub updated: U,
    #[serde(
        default,
        deserialize_with = "null_as_default",
        bound(deserialize = "F: Deserialize<'de> + Default")
    )]
    pub failed: F,
}

/// Decode a single-payload envelope.
pub fn decode<T>(body: &[u8]) -> Result<Envelope<T>, ApiError>
where
    T: DeserializeOwned + Default,
{
    Ok(serde_json::from_slice(body)?)
}

/// Decode a bulk envelope.
pub fn decode_bulk<U, F>(body: &[u8]) -> Result<BulkEnvelope<U, F>, ApiError>
where
    U: DeserializeOwned + Default,
    F: DeserializeOwned + Default,
{
    Ok(serde_json::from_slice(body)?)
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
