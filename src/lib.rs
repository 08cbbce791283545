//! Fuel dispensing authorization workflow.
//!
//! A driver requests fuel, an approver grants or denies it, and on approval
//! a signed, time-bounded, single-use token is issued; a dispensing station
//! must redeem that token before fuel is released. See [`service::FuelService`]
//! for the orchestrating API.

pub mod error;
pub mod lifecycle;
pub mod request;
pub mod service;
pub mod signer;
pub mod store;
pub mod token;
pub mod utils;
