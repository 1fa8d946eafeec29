//! Encode/decode helpers with the protocol's failure policy.
//!
//! Decode failures are soft by contract: the caller logs and discards the
//! frame, never tears down the session. An unknown `type` for the session's
//! role surfaces as [`DecodeError::Json`] (serde's unknown-variant error).

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::constants::WS_MAX_FRAME_SIZE;

/// Why an inbound frame was rejected.
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("frame too large: {0} bytes (limit {WS_MAX_FRAME_SIZE})")]
    Oversized(usize),

    #[error("invalid message: {0}")]
    Json(#[from] serde_json::Error),
}

/// Serializes an outbound message to its wire form.
pub fn encode<T: Serialize>(msg: &T) -> Result<String, serde_json::Error> {
    serde_json::to_string(msg)
}

/// Parses an inbound frame into the union for the session's role.
pub fn decode<T: DeserializeOwned>(text: &str) -> Result<T, DecodeError> {
    if text.len() > WS_MAX_FRAME_SIZE {
        return Err(DecodeError::Oversized(text.len()));
    }
    Ok(serde_json::from_str(text)?)
}
