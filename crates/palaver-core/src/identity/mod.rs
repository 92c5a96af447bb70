//! Identity verification abstractions.
//!
//! - `IdentityVerifier`: RPITIT trait for concrete provider verifiers
//! - `BoxIdentityVerifier`: object-safe wrapper for dynamic dispatch
//! - `VerifierRegistry`: verifiers indexed by provider

pub mod box_verifier;
pub mod registry;
pub mod verifier;
