//! Request state machine: guarded transitions over a [`FuelRequest`].
//!
//! Every transition checks its row of the transition table before touching
//! the record, so a rejected event leaves the request byte-for-byte
//! unchanged. Re-applying an already-applied transition is a hard
//! `InvalidTransition`, never a silent no-op: "someone already decided" is
//! information the caller must see, and approving twice would mint a second
//! token for the same request.

use super::error::{InvalidTransition, TransitionError, ValidationError};
use super::request::{positive_liters, Approver, FuelRequest, RequestStatus, TimeStamp};
use super::token::AuthorizationToken;
use chrono::Utc;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestEvent {
    Approve,
    Decline,
    Dispense,
}

impl fmt::Display for RequestEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RequestEvent::Approve => "approve",
            RequestEvent::Decline => "decline",
            RequestEvent::Dispense => "dispense",
        };
        f.write_str(s)
    }
}

fn require_status(
    request: &FuelRequest,
    expected: RequestStatus,
    event: RequestEvent,
) -> Result<(), InvalidTransition> {
    if request.status != expected {
        return Err(InvalidTransition {
            from: request.status,
            event,
        });
    }
    Ok(())
}

/// PENDING -> APPROVED. Stamps the decision; token issuance is the service's
/// side of the same transition.
pub fn approve(
    request: &mut FuelRequest,
    approver: &Approver,
    approved_amount: f64,
    now: TimeStamp<Utc>,
) -> Result<(), TransitionError> {
    require_status(request, RequestStatus::Pending, RequestEvent::Approve)?;
    if !positive_liters(approved_amount) {
        return Err(ValidationError::NonPositiveApprovedAmount.into());
    }

    request.status = RequestStatus::Approved;
    request.approval_date = Some(now);
    request.approved_by_id = Some(approver.id.clone());
    request.approved_by_name = Some(approver.name.clone());
    Ok(())
}

/// PENDING -> DECLINED. The reason is mandatory to keep an auditable trail.
pub fn decline(
    request: &mut FuelRequest,
    approver: &Approver,
    reason: &str,
    now: TimeStamp<Utc>,
) -> Result<(), TransitionError> {
    require_status(request, RequestStatus::Pending, RequestEvent::Decline)?;
    if reason.trim().is_empty() {
        return Err(ValidationError::EmptyDeclineReason.into());
    }

    request.status = RequestStatus::Declined;
    request.approval_date = Some(now);
    request.approved_by_id = Some(approver.id.clone());
    request.approved_by_name = Some(approver.name.clone());
    request.notes = reason.to_string();
    Ok(())
}

/// APPROVED -> DISPENSED. The token must already have passed signature and
/// expiry verification; this re-checks the binding and the *current* status,
/// because a token may be presented long after issuance against a stale view
/// of the record.
pub fn dispense(
    request: &mut FuelRequest,
    token: &AuthorizationToken,
    dispensed_amount: f64,
    now: TimeStamp<Utc>,
) -> Result<(), TransitionError> {
    require_status(request, RequestStatus::Approved, RequestEvent::Dispense)?;
    if token.request_id != request.id {
        // a verified token for some *other* request has no row in the table
        return Err(InvalidTransition {
            from: request.status,
            event: RequestEvent::Dispense,
        }
        .into());
    }
    if !positive_liters(dispensed_amount) {
        return Err(ValidationError::NonPositiveDispensedAmount.into());
    }

    request.status = RequestStatus::Dispensed;
    request.dispensed_amount = Some(dispensed_amount);
    request.dispensed_date = Some(now);
    Ok(())
}
