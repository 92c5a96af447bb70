//! Login and per-request identity resolution.
//!
//! A verified identity-provider token bootstraps a server-side session; every
//! later request presents the opaque session token, which resolves to a
//! concrete `User` or fails as unauthenticated.

pub mod service;
pub mod token;
