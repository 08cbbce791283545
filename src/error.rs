//! Error taxonomy for the fuel authorization workflow.
//!
//! Security-relevant rejections (`DecodeError`, `VerifyError` and their
//! `RedemptionError` counterparts) stay distinguishable as variants for
//! logging, but all render as "token not valid" so a user-facing message
//! never leaks which check failed.

use super::lifecycle::RequestEvent;
use super::request::RequestStatus;

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("requested amount must be a positive number of liters")]
    NonPositiveRequestedAmount,
    #[error("approved amount must be a positive number of liters")]
    NonPositiveApprovedAmount,
    #[error("dispensed amount must be a positive number of liters")]
    NonPositiveDispensedAmount,
    #[error("decline reason must not be empty")]
    EmptyDeclineReason,
    #[error("{0} is required")]
    MissingField(&'static str),
}

/// An event was applied in a state where the transition table has no row for it.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("cannot {event} a request that is {from}")]
pub struct InvalidTransition {
    pub from: RequestStatus,
    pub event: RequestEvent,
}

/// Rejection from the lifecycle engine: either the input was bad or the
/// transition is not legal in the current state. Guards run before any
/// mutation, so a rejected transition leaves the record untouched.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum TransitionError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Invalid(#[from] InvalidTransition),
}

/// Failure to decode a token payload. The decode path faces untrusted input
/// (a scanned code may be forged), so this is always a typed failure.
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeError {
    #[error("token not valid")]
    Malformed,
    #[error("token not valid")]
    UnknownSchema,
}

/// Failure to verify a decoded token.
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerifyError {
    #[error("token not valid")]
    InvalidSignature,
    #[error("token not valid")]
    Expired,
}

/// Faults from the persistence collaborator. Kept distinct from "not found":
/// an unreachable store must never collapse into an empty result.
#[derive(thiserror::Error, Debug)]
pub enum StoreError {
    #[error("request store unavailable: {0}")]
    Unavailable(#[from] sled::Error),
    #[error("stored record for {id} is corrupted: {reason}")]
    Corrupted { id: String, reason: String },
    #[error("request {0} already exists")]
    DuplicateId(String),
}

/// Errors surfaced by create/approve/decline operations.
#[derive(thiserror::Error, Debug)]
pub enum WorkflowError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Transition(#[from] InvalidTransition),
    #[error("request {0} not found")]
    NotFound(String),
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<TransitionError> for WorkflowError {
    fn from(err: TransitionError) -> Self {
        match err {
            TransitionError::Validation(e) => WorkflowError::Validation(e),
            TransitionError::Invalid(e) => WorkflowError::Transition(e),
        }
    }
}

/// Errors surfaced by the redemption path.
#[derive(thiserror::Error, Debug)]
pub enum RedemptionError {
    #[error("token not valid")]
    Malformed,
    #[error("token not valid")]
    InvalidSignature,
    #[error("token not valid")]
    Expired,
    #[error("request {0} not found")]
    NotFound(String),
    #[error("request is not approved or fuel was already dispensed")]
    AlreadyUsedOrNotApproved,
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<DecodeError> for RedemptionError {
    fn from(_: DecodeError) -> Self {
        // UnknownSchema and Malformed collapse at the redemption surface
        RedemptionError::Malformed
    }
}

impl From<VerifyError> for RedemptionError {
    fn from(err: VerifyError) -> Self {
        match err {
            VerifyError::InvalidSignature => RedemptionError::InvalidSignature,
            VerifyError::Expired => RedemptionError::Expired,
        }
    }
}

impl From<TransitionError> for RedemptionError {
    fn from(err: TransitionError) -> Self {
        match err {
            TransitionError::Validation(e) => RedemptionError::Validation(e),
            TransitionError::Invalid(_) => RedemptionError::AlreadyUsedOrNotApproved,
        }
    }
}
