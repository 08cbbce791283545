//! Keyed signing and verification of authorization tokens.
//!
//! The signature is HMAC-SHA256 over the canonical CBOR encoding of the
//! token's load-bearing claims, so a valid tag cannot be replayed against a
//! modified amount, vehicle or request. The expiry timestamp deliberately
//! sits outside the MAC: signature and expiry rejections must stay
//! independently observable, and expiry is enforced by [`TokenSigner::verify`]
//! after the tag check.

use super::error::VerifyError;
use super::request::TimeStamp;
use super::token::AuthorizationToken;
use chrono::{Duration, Utc};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use std::fmt;
use subtle::ConstantTimeEq;

type HmacSha256 = Hmac<Sha256>;

/// Approval policy knobs. The validity window belongs to policy, not to the
/// signer; the default is on the order of days.
#[derive(Debug, Clone)]
pub struct TokenPolicy {
    pub validity: Duration,
}

impl Default for TokenPolicy {
    fn default() -> Self {
        Self {
            validity: Duration::days(3),
        }
    }
}

/// Handle over the process-wide signing secret. Constructed once at startup
/// and shared; the key is read-only afterwards and never serialized.
#[derive(Clone)]
pub struct TokenSigner {
    secret: Vec<u8>,
}

impl fmt::Debug for TokenSigner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // the secret must never reach logs or error messages
        f.write_str("TokenSigner { secret: <redacted> }")
    }
}

// Canonical MAC input. Field order is fixed by the CBOR indices, which is
// what makes the tag re-derivable byte-for-byte at verification.
#[derive(minicbor::Encode)]
struct SignedClaims<'a> {
    #[n(0)]
    request_id: &'a str,
    #[n(1)]
    driver_id: &'a str,
    #[n(2)]
    vehicle_id: &'a str,
    #[n(3)]
    approved_amount: f64,
    #[n(4)]
    approval_timestamp: &'a TimeStamp<Utc>,
}

impl TokenSigner {
    pub fn new(secret: impl Into<Vec<u8>>) -> Self {
        Self {
            secret: secret.into(),
        }
    }

    /// Deterministic tag over the five bound claims.
    pub fn sign(
        &self,
        request_id: &str,
        driver_id: &str,
        vehicle_id: &str,
        approved_amount: f64,
        approval_timestamp: &TimeStamp<Utc>,
    ) -> Vec<u8> {
        let claims = SignedClaims {
            request_id,
            driver_id,
            vehicle_id,
            approved_amount,
            approval_timestamp,
        };
        let bytes = minicbor::to_vec(&claims).expect("CBOR encoding into a Vec cannot fail");

        let mut mac = HmacSha256::new_from_slice(&self.secret)
            .expect("HMAC-SHA256 accepts keys of any length");
        mac.update(&bytes);
        mac.finalize().into_bytes().to_vec()
    }

    /// Recompute the expected tag over the token's own claimed fields,
    /// compare constant-time, then enforce expiry.
    pub fn verify(
        &self,
        token: &AuthorizationToken,
        now: &TimeStamp<Utc>,
    ) -> Result<(), VerifyError> {
        let expected = self.sign(
            &token.request_id,
            &token.driver_id,
            &token.vehicle_id,
            token.approved_amount,
            &token.approval_timestamp,
        );
        if !bool::from(expected.as_slice().ct_eq(token.signature.as_slice())) {
            return Err(VerifyError::InvalidSignature);
        }
        if now.to_datetime_utc() > token.expiry_timestamp.to_datetime_utc() {
            return Err(VerifyError::Expired);
        }
        Ok(())
    }
}
