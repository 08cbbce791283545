//! Authorization token (the QR payload) and its wire codec.
//!
//! Wire shape: `hex(version_byte || CBOR(token))`. The version byte gates
//! schema evolution; anything else wrong with the payload is `Malformed`.

use super::error::DecodeError;
use super::request::TimeStamp;
use chrono::Utc;

/// Version byte prefixed to the CBOR body before hex encoding.
pub const TOKEN_SCHEMA_VERSION: u8 = 1;

/// A signed claim that a specific request was approved for a specific
/// amount. `used` is advisory only; the authoritative redemption state
/// lives on the [`FuelRequest`](super::request::FuelRequest).
#[derive(minicbor::Encode, minicbor::Decode, Debug, Clone, PartialEq)]
pub struct AuthorizationToken {
    #[n(0)]
    pub request_id: String,
    #[n(1)]
    pub driver_id: String,
    #[n(2)]
    pub vehicle_id: String,
    #[n(3)]
    pub approved_amount: f64, // liters
    #[n(4)]
    pub approval_timestamp: TimeStamp<Utc>,
    #[n(5)]
    pub expiry_timestamp: TimeStamp<Utc>,
    #[n(6)]
    pub used: bool,
    #[n(7)]
    #[cbor(with = "minicbor::bytes")]
    pub signature: Vec<u8>,
}

/// Deterministic, lossless serialization of a token to its QR string.
pub fn encode(token: &AuthorizationToken) -> String {
    let body = minicbor::to_vec(token).expect("CBOR encoding into a Vec cannot fail");
    let mut wire = Vec::with_capacity(body.len() + 1);
    wire.push(TOKEN_SCHEMA_VERSION);
    wire.extend_from_slice(&body);
    hex::encode(wire)
}

/// Parse a scanned payload back into a token. The input is untrusted; every
/// failure is a typed error, never a panic.
pub fn decode(payload: &str) -> Result<AuthorizationToken, DecodeError> {
    let wire = hex::decode(payload).map_err(|_| DecodeError::Malformed)?;
    let (&version, body) = wire.split_first().ok_or(DecodeError::Malformed)?;
    if version != TOKEN_SCHEMA_VERSION {
        return Err(DecodeError::UnknownSchema);
    }
    minicbor::decode(body).map_err(|_| DecodeError::Malformed)
}
