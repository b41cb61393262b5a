//! JSON codec helpers.
//!
//! Thin wrappers around `serde_json` for encoding and decoding bus payloads.
//! Every event on the bus is a single UTF-8 JSON object.

use serde::{Serialize, de::DeserializeOwned};

use crate::error::NetError;

/// Encode a value to JSON bytes.
///
/// # Errors
///
/// Returns [`NetError::Encode`] if serialisation fails.
pub fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>, NetError> {
    serde_json::to_vec(value).map_err(NetError::Encode)
}

/// Decode a value from JSON bytes.
///
/// # Errors
///
/// Returns [`NetError::Decode`] if the payload is not valid JSON or does not
/// have the expected shape.
pub fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, NetError> {
    serde_json::from_slice(bytes).map_err(NetError::Decode)
}
