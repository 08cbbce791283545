//! Identifier helpers: uuid7 generation and bech32 encoding

use bech32::Bech32m;
use uuid7::uuid7;

// construct a unique id then encode using bech32
pub fn new_uuid_to_bech32(hrp: &str) -> anyhow::Result<String> {
    let hrp = bech32::Hrp::parse(hrp)?;
    let encode = bech32::encode::<Bech32m>(hrp, uuid7().as_bytes())?;
    Ok(encode)
}

/// Fresh request identifier, e.g. `freq1...`
pub fn new_request_id() -> String {
    new_uuid_to_bech32("freq").expect("static hrp is valid bech32")
}

/// Fresh principal identifier, e.g. `user1...`
pub fn new_user_id() -> String {
    new_uuid_to_bech32("user").expect("static hrp is valid bech32")
}

/// Fresh vehicle identifier, e.g. `veh1...`
pub fn new_vehicle_id() -> String {
    new_uuid_to_bech32("veh").expect("static hrp is valid bech32")
}
