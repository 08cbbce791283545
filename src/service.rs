//! Service layer API for fuel authorization workflow operations.
//!
//! `FuelService` orchestrates the store, the signer and the lifecycle
//! engine. All operations take `now` explicitly so the embedder (and the
//! tests) own the clock.

use super::error::{InvalidTransition, RedemptionError, WorkflowError};
use super::lifecycle::{self, RequestEvent};
use super::request::{Approver, FuelRequest, FuelRequestDraft, RequestStatus, TimeStamp};
use super::signer::{TokenPolicy, TokenSigner};
use super::store::{PutOutcome, RequestStore};
use super::token::{self, AuthorizationToken};
use chrono::Utc;
use tracing::{debug, info, warn};

pub struct FuelService<S: RequestStore> {
    store: S,
    signer: TokenSigner,
    policy: TokenPolicy,
}

impl<S: RequestStore> FuelService<S> {
    pub fn new(store: S, signer: TokenSigner, policy: TokenPolicy) -> Self {
        Self {
            store,
            signer,
            policy,
        }
    }

    fn load(&self, request_id: &str) -> Result<FuelRequest, WorkflowError> {
        self.store
            .get(request_id)?
            .ok_or_else(|| WorkflowError::NotFound(request_id.to_string()))
    }

    /// Conditional persist of a decided transition. A lost race means
    /// someone already decided; report the state they left behind.
    fn commit(
        &self,
        request: FuelRequest,
        expected: RequestStatus,
        event: RequestEvent,
    ) -> Result<FuelRequest, WorkflowError> {
        match self.store.put_if_status(&request, expected)? {
            PutOutcome::Applied => Ok(request),
            PutOutcome::Conflict => {
                let current = self.load(&request.id)?;
                Err(InvalidTransition {
                    from: current.status,
                    event,
                }
                .into())
            }
        }
    }

    /// Build and sign the token bound to this request. Invoked only from
    /// the approve path, which is what keeps one token per request.
    fn issue(
        &self,
        request: &FuelRequest,
        approved_amount: f64,
        now: TimeStamp<Utc>,
    ) -> (AuthorizationToken, String) {
        let signature = self.signer.sign(
            &request.id,
            &request.driver_id,
            &request.vehicle_id,
            approved_amount,
            &now,
        );
        let auth_token = AuthorizationToken {
            request_id: request.id.clone(),
            driver_id: request.driver_id.clone(),
            vehicle_id: request.vehicle_id.clone(),
            approved_amount,
            approval_timestamp: now.clone(),
            expiry_timestamp: now.advance(self.policy.validity),
            used: false,
            signature,
        };
        let payload = token::encode(&auth_token);
        (auth_token, payload)
    }

    /// Validate a draft and persist it as a new PENDING request.
    pub fn create_request(
        &self,
        draft: FuelRequestDraft,
        now: TimeStamp<Utc>,
    ) -> Result<FuelRequest, WorkflowError> {
        let request = draft.submit(now)?;
        self.store.insert_new(&request)?;
        info!(
            request_id = %request.id,
            driver_id = %request.driver_id,
            requested = request.requested_amount,
            "fuel request created"
        );
        Ok(request)
    }

    /// Approve a PENDING request: stamp the decision, issue the token bound
    /// to it, and persist both under a PENDING precondition.
    pub fn approve(
        &self,
        request_id: &str,
        approver: &Approver,
        approved_amount: f64,
        now: TimeStamp<Utc>,
    ) -> Result<(FuelRequest, AuthorizationToken), WorkflowError> {
        let mut request = self.load(request_id)?;
        lifecycle::approve(&mut request, approver, approved_amount, now.clone())?;

        let (auth_token, payload) = self.issue(&request, approved_amount, now);
        request.token = Some(payload);

        let request = self.commit(request, RequestStatus::Pending, RequestEvent::Approve)?;
        info!(
            request_id = %request.id,
            approver_id = %approver.id,
            approved = approved_amount,
            "fuel request approved, token issued"
        );
        Ok((request, auth_token))
    }

    /// Decline a PENDING request with a mandatory reason.
    pub fn decline(
        &self,
        request_id: &str,
        approver: &Approver,
        reason: &str,
        now: TimeStamp<Utc>,
    ) -> Result<FuelRequest, WorkflowError> {
        let mut request = self.load(request_id)?;
        lifecycle::decline(&mut request, approver, reason, now)?;

        let request = self.commit(request, RequestStatus::Pending, RequestEvent::Decline)?;
        info!(
            request_id = %request.id,
            approver_id = %approver.id,
            "fuel request declined"
        );
        Ok(request)
    }

    /// Redeem a scanned token payload at the dispensing station:
    /// decode, verify, load the current record, drive the dispense
    /// transition, and persist under an APPROVED precondition.
    pub fn redeem(
        &self,
        payload: &str,
        dispensed_amount: f64,
        now: TimeStamp<Utc>,
    ) -> Result<FuelRequest, RedemptionError> {
        let auth_token = match token::decode(payload) {
            Ok(t) => t,
            Err(err) => {
                debug!(?err, "token payload failed to decode");
                return Err(err.into());
            }
        };

        if let Err(err) = self.signer.verify(&auth_token, &now) {
            // InvalidSignature spikes here are the tampering signal
            warn!(request_id = %auth_token.request_id, ?err, "token rejected at redemption");
            return Err(err.into());
        }

        let mut request = self
            .store
            .get(&auth_token.request_id)?
            .ok_or_else(|| RedemptionError::NotFound(auth_token.request_id.clone()))?;

        lifecycle::dispense(&mut request, &auth_token, dispensed_amount, now)?;

        match self.store.put_if_status(&request, RequestStatus::Approved)? {
            PutOutcome::Applied => {
                info!(
                    request_id = %request.id,
                    dispensed = dispensed_amount,
                    "fuel dispensed"
                );
                Ok(request)
            }
            PutOutcome::Conflict => {
                warn!(request_id = %request.id, "concurrent redemption lost the dispense race");
                Err(RedemptionError::AlreadyUsedOrNotApproved)
            }
        }
    }

    pub fn get_request(&self, request_id: &str) -> Result<Option<FuelRequest>, WorkflowError> {
        Ok(self.store.get(request_id)?)
    }

    /// Requests awaiting an approver's decision.
    pub fn pending_requests(&self) -> Result<Vec<FuelRequest>, WorkflowError> {
        Ok(self.store.list_by_status(RequestStatus::Pending)?)
    }

    pub fn requests_by_status(
        &self,
        status: RequestStatus,
    ) -> Result<Vec<FuelRequest>, WorkflowError> {
        Ok(self.store.list_by_status(status)?)
    }

    /// A driver's request history.
    pub fn requests_for_driver(
        &self,
        driver_id: &str,
    ) -> Result<Vec<FuelRequest>, WorkflowError> {
        Ok(self.store.list_by_driver(driver_id)?)
    }
}
