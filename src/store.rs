//! Request persistence: the store adapter boundary and a sled-backed
//! implementation.
//!
//! The workflow's at-most-once guarantees hang off `put_if_status`: the
//! status precondition and the overwrite commit as a single
//! compare-and-swap on the stored record bytes, so two racing writers get
//! exactly one `Applied` and one `Conflict`, never a lost update.

use super::error::StoreError;
use super::request::{FuelRequest, RequestStatus};
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PutOutcome {
    Applied,
    Conflict,
}

pub trait RequestStore {
    fn get(&self, id: &str) -> Result<Option<FuelRequest>, StoreError>;
    /// Insert a brand-new record; fails if the id already exists, so ids are
    /// never silently overwritten.
    fn insert_new(&self, request: &FuelRequest) -> Result<(), StoreError>;
    /// Atomic conditional overwrite: commits only if the stored record still
    /// carries `expected` status.
    fn put_if_status(
        &self,
        request: &FuelRequest,
        expected: RequestStatus,
    ) -> Result<PutOutcome, StoreError>;
    fn list_by_status(&self, status: RequestStatus) -> Result<Vec<FuelRequest>, StoreError>;
    fn list_by_driver(&self, driver_id: &str) -> Result<Vec<FuelRequest>, StoreError>;
}

const REQUESTS_TREE: &str = "fuel_requests";

/// Embedded store over a named sled tree, one record per request id.
#[derive(Clone)]
pub struct SledRequestStore {
    tree: sled::Tree,
}

impl SledRequestStore {
    pub fn open(db: Arc<sled::Db>) -> Result<Self, StoreError> {
        let tree = db.open_tree(REQUESTS_TREE)?;
        Ok(Self { tree })
    }
}

fn encode_record(request: &FuelRequest) -> Vec<u8> {
    minicbor::to_vec(request).expect("CBOR encoding into a Vec cannot fail")
}

fn decode_record(id: &str, bytes: &[u8]) -> Result<FuelRequest, StoreError> {
    minicbor::decode(bytes).map_err(|e| StoreError::Corrupted {
        id: id.to_string(),
        reason: e.to_string(),
    })
}

impl RequestStore for SledRequestStore {
    fn get(&self, id: &str) -> Result<Option<FuelRequest>, StoreError> {
        match self.tree.get(id.as_bytes())? {
            Some(bytes) => decode_record(id, &bytes).map(Some),
            None => Ok(None),
        }
    }

    fn insert_new(&self, request: &FuelRequest) -> Result<(), StoreError> {
        let new = encode_record(request);
        // CAS from absent: creation is conditional too
        match self
            .tree
            .compare_and_swap(request.id.as_bytes(), None as Option<&[u8]>, Some(new))?
        {
            Ok(()) => Ok(()),
            Err(_) => Err(StoreError::DuplicateId(request.id.clone())),
        }
    }

    fn put_if_status(
        &self,
        request: &FuelRequest,
        expected: RequestStatus,
    ) -> Result<PutOutcome, StoreError> {
        let Some(current) = self.tree.get(request.id.as_bytes())? else {
            // the record vanished under us; the precondition cannot hold
            return Ok(PutOutcome::Conflict);
        };
        let stored = decode_record(&request.id, &current)?;
        if stored.status != expected {
            return Ok(PutOutcome::Conflict);
        }

        let new = encode_record(request);
        match self
            .tree
            .compare_and_swap(request.id.as_bytes(), Some(current), Some(new))?
        {
            Ok(()) => Ok(PutOutcome::Applied),
            Err(_) => Ok(PutOutcome::Conflict),
        }
    }

    fn list_by_status(&self, status: RequestStatus) -> Result<Vec<FuelRequest>, StoreError> {
        let mut out = Vec::new();
        for item in self.tree.iter() {
            let (key, value) = item?;
            let id = String::from_utf8_lossy(&key);
            let request = decode_record(&id, &value)?;
            if request.status == status {
                out.push(request);
            }
        }
        Ok(out)
    }

    fn list_by_driver(&self, driver_id: &str) -> Result<Vec<FuelRequest>, StoreError> {
        let mut out = Vec::new();
        for item in self.tree.iter() {
            let (key, value) = item?;
            let id = String::from_utf8_lossy(&key);
            let request = decode_record(&id, &value)?;
            if request.driver_id == driver_id {
                out.push(request);
            }
        }
        Ok(out)
    }
}
