//! Response body decoding

use crate::error::DecodeError;
use crate::models::QueryResponse;

/// Decode a query response body
///
/// # Errors
///
/// Returns `DecodeError` with the raw body attached if the bytes are not
/// valid JSON or do not match the response shape.
pub fn decode(body: &[u8]) -> Result<QueryResponse, DecodeError> {
    serde_json::from_slice(body).map_err(|source| DecodeError {
        source,
        body: String::from_utf8_lossy(body).into_owned(),
    })
}
