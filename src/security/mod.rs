//! Security module for webhook payload signing

pub mod signing;

pub use signing::{sign_payload, verify_signature, SIGNATURE_HEADER};
