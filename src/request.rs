//! Core fuel request model, draft builder and timestamp codec
use super::error::ValidationError;
use super::utils;
use chrono::{DateTime, TimeZone, Utc};
use std::fmt;

#[derive(minicbor::Encode, minicbor::Decode, Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestStatus {
    #[n(0)]
    Pending,
    #[n(1)]
    Approved,
    #[n(2)]
    Declined,
    #[n(3)]
    Dispensed,
}

impl RequestStatus {
    /// Declined and Dispensed are terminal: no further mutation is permitted.
    pub fn is_terminal(&self) -> bool {
        matches!(self, RequestStatus::Declined | RequestStatus::Dispensed)
    }
}

impl fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RequestStatus::Pending => "PENDING",
            RequestStatus::Approved => "APPROVED",
            RequestStatus::Declined => "DECLINED",
            RequestStatus::Dispensed => "DISPENSED",
        };
        f.write_str(s)
    }
}

/// An already-authenticated decision-maker, supplied by the identity
/// collaborator. Opaque to this core.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Approver {
    pub id: String,
    pub name: String,
}

impl Approver {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Clone)]
pub struct TimeStamp<T: TimeZone>(DateTime<T>);

impl TimeStamp<Utc> {
    pub fn new() -> Self {
        Self(Utc::now())
    }
    pub fn new_with(year: i32, month: u32, day: u32, hour: u32, min: u32, sec: u32) -> Self {
        Utc.with_ymd_and_hms(year, month, day, hour, min, sec)
            .unwrap()
            .into()
    }
    pub fn to_datetime_utc(&self) -> DateTime<Utc> {
        self.0
    }
    /// This timestamp shifted forward by `window`, e.g. a token's expiry.
    pub fn advance(&self, window: chrono::Duration) -> Self {
        Self(self.0 + window)
    }
}

impl Default for TimeStamp<Utc> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: TimeZone> From<DateTime<T>> for TimeStamp<T> {
    fn from(value: DateTime<T>) -> Self {
        TimeStamp(value)
    }
}

impl<C> minicbor::Encode<C> for TimeStamp<Utc> {
    fn encode<W: minicbor::encode::Write>(
        &self,
        e: &mut minicbor::Encoder<W>,
        _: &mut C,
    ) -> Result<(), minicbor::encode::Error<W::Error>> {
        if let Some(nsec) = self.0.timestamp_nanos_opt() {
            return e.i64(nsec)?.ok();
        }

        Err(minicbor::encode::Error::message(
            "failed to encode timestamp. timestamp_nanos_opt returned None",
        ))
    }
}

impl<'b, C> minicbor::Decode<'b, C> for TimeStamp<Utc> {
    fn decode(d: &mut minicbor::Decoder<'b>, _: &mut C) -> Result<Self, minicbor::decode::Error> {
        let nsecs = d.i64()?;

        Ok(TimeStamp(DateTime::from_timestamp_nanos(nsecs)))
    }
}

/// One driver's ask for a quantity of fuel. Keyed by `id` in the store and
/// mutated only through the lifecycle engine.
#[derive(minicbor::Encode, minicbor::Decode, Debug, Clone, PartialEq)]
pub struct FuelRequest {
    #[n(0)]
    pub id: String, // bech32-encoded uuid7, immutable
    #[n(1)]
    pub driver_id: String,
    #[n(2)]
    pub driver_name: String,
    #[n(3)]
    pub vehicle_id: String,
    #[n(4)]
    pub requested_amount: f64, // liters
    #[n(5)]
    pub dispensed_amount: Option<f64>, // set exactly once, at dispense
    #[n(6)]
    pub status: RequestStatus,
    #[n(7)]
    pub request_date: TimeStamp<Utc>,
    #[n(8)]
    pub approval_date: Option<TimeStamp<Utc>>,
    #[n(9)]
    pub dispensed_date: Option<TimeStamp<Utc>>,
    #[n(10)]
    pub approved_by_id: Option<String>,
    #[n(11)]
    pub approved_by_name: Option<String>,
    #[n(12)]
    pub trip_details: String,
    #[n(13)]
    pub notes: String,
    #[n(14)]
    pub token: Option<String>, // serialized authorization token, set at approval
}

// Amounts are liters; zero, negative, NaN and infinities are all degenerate.
pub(crate) fn positive_liters(value: f64) -> bool {
    value.is_finite() && value > 0.0
}

/// Chained builder for a new request; validated when submitted.
#[derive(Debug, Default)]
pub struct FuelRequestDraft {
    driver_id: Option<String>,
    driver_name: Option<String>,
    vehicle_id: Option<String>,
    requested_amount: f64,
    trip_details: String,
    notes: String,
}

impl FuelRequestDraft {
    /// Construct a new draft, the basis for a PENDING request
    pub fn new() -> Self {
        Self::default()
    }
    pub fn driver(mut self, id: &str, name: &str) -> Self {
        self.driver_id = Some(id.to_string());
        self.driver_name = Some(name.to_string());
        self
    }
    pub fn vehicle(mut self, id: &str) -> Self {
        self.vehicle_id = Some(id.to_string());
        self
    }
    pub fn requested_amount(mut self, liters: f64) -> Self {
        self.requested_amount = liters;
        self
    }
    pub fn trip_details(mut self, details: &str) -> Self {
        self.trip_details = details.to_string();
        self
    }
    pub fn notes(mut self, notes: &str) -> Self {
        self.notes = notes.to_string();
        self
    }
    /// Checks fields, then mints the PENDING record with a fresh id and
    /// `request_date = now`. No mutation happens on a rejected draft.
    pub fn submit(self, now: TimeStamp<Utc>) -> Result<FuelRequest, ValidationError> {
        let driver_id = self.driver_id.ok_or(ValidationError::MissingField("driver id"))?;
        let driver_name = self
            .driver_name
            .ok_or(ValidationError::MissingField("driver name"))?;
        let vehicle_id = self
            .vehicle_id
            .ok_or(ValidationError::MissingField("vehicle id"))?;
        if !positive_liters(self.requested_amount) {
            return Err(ValidationError::NonPositiveRequestedAmount);
        }

        Ok(FuelRequest {
            id: utils::new_request_id(),
            driver_id,
            driver_name,
            vehicle_id,
            requested_amount: self.requested_amount,
            dispensed_amount: None,
            status: RequestStatus::Pending,
            request_date: now,
            approval_date: None,
            dispensed_date: None,
            approved_by_id: None,
            approved_by_name: None,
            trip_details: self.trip_details,
            notes: self.notes,
            token: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timestamp_encoding() {
        let original = TimeStamp::new();

        let encoding = minicbor::to_vec(original.clone()).unwrap();
        let decode: TimeStamp<Utc> = minicbor::decode(&encoding).unwrap();

        assert_eq!(original, decode);
    }

    #[test]
    fn draft_rejects_zero_amount() {
        let draft = FuelRequestDraft::new()
            .driver("user1abc", "Ayo")
            .vehicle("veh1abc")
            .requested_amount(0.0);

        assert_eq!(
            draft.submit(TimeStamp::new()),
            Err(ValidationError::NonPositiveRequestedAmount)
        );
    }

    #[test]
    fn draft_rejects_missing_vehicle() {
        let draft = FuelRequestDraft::new()
            .driver("user1abc", "Ayo")
            .requested_amount(20.0);

        assert_eq!(
            draft.submit(TimeStamp::new()),
            Err(ValidationError::MissingField("vehicle id"))
        );
    }

    #[test]
    fn submitted_draft_is_pending_with_fresh_id() {
        let request = FuelRequestDraft::new()
            .driver("user1abc", "Ayo")
            .vehicle("veh1abc")
            .requested_amount(20.0)
            .trip_details("Depot run")
            .submit(TimeStamp::new())
            .unwrap();

        assert_eq!(request.status, RequestStatus::Pending);
        assert!(request.id.starts_with("freq1"));
        assert!(request.token.is_none());
        assert!(request.approval_date.is_none());
    }

    #[test]
    fn request_record_round_trips_through_cbor() {
        let request = FuelRequestDraft::new()
            .driver("user1abc", "Ayo")
            .vehicle("veh1abc")
            .requested_amount(42.5)
            .submit(TimeStamp::new())
            .unwrap();

        let encoding = minicbor::to_vec(&request).unwrap();
        let decode: FuelRequest = minicbor::decode(&encoding).unwrap();

        assert_eq!(request, decode);
    }
}
