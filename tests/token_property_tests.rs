//! Property-based tests for the token codec and signer
//!
//! This module uses the proptest crate to verify the codec and signature
//! invariants across a wide range of randomly generated tokens. The decode
//! path faces untrusted input (a scanned code may be forged), so the
//! properties here are the crate's main defense against adversarial
//! payloads: lossless round-trips, no panics on garbage, and a signature
//! that breaks the moment any bound claim is altered.

use fuel_authorization::{
    error::{DecodeError, VerifyError},
    request::TimeStamp,
    signer::TokenSigner,
    token::{self, AuthorizationToken},
};
use proptest::prelude::*;

// PROPERTY TEST STRATEGIES

/// Strategy to generate deterministic bech32-shaped identifiers
fn id_strategy(prefix: &'static str) -> impl Strategy<Value = String> {
    any::<u64>().prop_map(move |n| format!("{prefix}1{n:016x}"))
}

/// Strategy to generate positive, finite liter amounts
fn amount_strategy() -> impl Strategy<Value = f64> {
    0.001f64..100_000.0
}

/// Strategy to generate a timestamp within a broad but valid range
fn timestamp_strategy() -> impl Strategy<Value = TimeStamp<chrono::Utc>> {
    (2020u32..=2030, 1u32..=12, 1u32..=28, 0u32..24, 0u32..60).prop_map(
        |(year, month, day, hour, min)| TimeStamp::new_with(year as i32, month, day, hour, min, 0),
    )
}

/// Strategy to generate a complete (unsigned-claims) token, with an
/// arbitrary signature field
fn token_strategy() -> impl Strategy<Value = AuthorizationToken> {
    (
        id_strategy("freq"),
        id_strategy("user"),
        id_strategy("veh"),
        amount_strategy(),
        timestamp_strategy(),
        1i64..=30,
        any::<bool>(),
        prop::collection::vec(any::<u8>(), 32),
    )
        .prop_map(
            |(request_id, driver_id, vehicle_id, approved_amount, approval, days, used, signature)| {
                AuthorizationToken {
                    request_id,
                    driver_id,
                    vehicle_id,
                    approved_amount,
                    expiry_timestamp: approval.advance(chrono::Duration::days(days)),
                    approval_timestamp: approval,
                    used,
                    signature,
                }
            },
        )
}

/// Strategy to generate a token whose signature was actually computed by
/// the given key, as `issue` would produce it
fn signed_token_strategy(secret: &'static [u8]) -> impl Strategy<Value = AuthorizationToken> {
    token_strategy().prop_map(move |mut token| {
        let signer = TokenSigner::new(secret);
        token.signature = signer.sign(
            &token.request_id,
            &token.driver_id,
            &token.vehicle_id,
            token.approved_amount,
            &token.approval_timestamp,
        );
        token
    })
}

const TEST_SECRET: &[u8] = b"property-test-secret";

// PROPERTY TESTS
proptest! {
    /// Property: encode then decode is the identity for every valid token
    ///
    /// The codec must be deterministic and lossless; anything less and the
    /// payload stored on the request would not match the token handed to
    /// the dispensing station.
    #[test]
    fn prop_encode_decode_round_trips(token in token_strategy()) {
        let payload = token::encode(&token);
        let decoded = token::decode(&payload).unwrap();

        prop_assert_eq!(decoded, token);
    }

    /// Property: decoding an arbitrary string never panics
    ///
    /// Forged or corrupted scans must only ever produce a typed failure.
    #[test]
    fn prop_decode_arbitrary_string_never_panics(payload in ".*") {
        let _ = token::decode(&payload);
    }

    /// Property: decoding arbitrary hex-encoded bytes never panics, and
    /// anything that is not a current-version token is a typed failure
    #[test]
    fn prop_decode_arbitrary_bytes_never_panics(bytes in prop::collection::vec(any::<u8>(), 0..256)) {
        let _ = token::decode(&hex::encode(&bytes));
    }

    /// Property: an unknown version byte is reported as UnknownSchema
    #[test]
    fn prop_unknown_version_is_unknown_schema(
        token in token_strategy(),
        version in 2u8..,
    ) {
        let mut wire = hex::decode(token::encode(&token)).unwrap();
        wire[0] = version;

        prop_assert_eq!(
            token::decode(&hex::encode(wire)),
            Err(DecodeError::UnknownSchema)
        );
    }

    /// Property: mutating any single bound claim invalidates the signature
    ///
    /// The tag binds request id, driver, vehicle, amount and approval time,
    /// so a valid signature can never be replayed against altered claims.
    /// `selector` picks which field gets tampered with.
    #[test]
    fn prop_tampering_any_claim_fails_verification(
        token in signed_token_strategy(TEST_SECRET),
        selector in 0u8..5,
    ) {
        let signer = TokenSigner::new(TEST_SECRET);
        prop_assert_eq!(signer.verify(&token, &token.approval_timestamp), Ok(()));

        let mut tampered = token;
        match selector {
            0 => tampered.request_id.push('x'),
            1 => tampered.driver_id.push('x'),
            2 => tampered.vehicle_id.push('x'),
            3 => tampered.approved_amount += 1.0,
            _ => {
                tampered.approval_timestamp =
                    tampered.approval_timestamp.advance(chrono::Duration::seconds(1));
            }
        }

        prop_assert_eq!(
            signer.verify(&tampered, &tampered.approval_timestamp),
            Err(VerifyError::InvalidSignature)
        );
    }

    /// Property: an expired token fails as Expired even with a valid tag
    ///
    /// Expiry is enforced after the signature comparison, so a correctly
    /// signed but stale token is still rejected.
    #[test]
    fn prop_expired_token_fails_expired(
        token in signed_token_strategy(TEST_SECRET),
        late_by_ms in 1i64..=1_000_000,
    ) {
        let signer = TokenSigner::new(TEST_SECRET);
        let after_expiry = token
            .expiry_timestamp
            .advance(chrono::Duration::milliseconds(late_by_ms));

        prop_assert_eq!(
            signer.verify(&token, &after_expiry),
            Err(VerifyError::Expired)
        );
    }

    /// Property: verification succeeds anywhere inside the validity window
    #[test]
    fn prop_unexpired_signed_token_verifies(token in signed_token_strategy(TEST_SECRET)) {
        let signer = TokenSigner::new(TEST_SECRET);

        prop_assert_eq!(signer.verify(&token, &token.approval_timestamp), Ok(()));
        prop_assert_eq!(signer.verify(&token, &token.expiry_timestamp), Ok(()));
    }

    /// Property: a signature round-trips the codec byte-for-byte
    ///
    /// A token that was encoded and scanned back must verify exactly like
    /// the one that was issued.
    #[test]
    fn prop_signature_survives_the_codec(token in signed_token_strategy(TEST_SECRET)) {
        let signer = TokenSigner::new(TEST_SECRET);
        let decoded = token::decode(&token::encode(&token)).unwrap();

        prop_assert_eq!(signer.verify(&decoded, &decoded.approval_timestamp), Ok(()));
    }
}
