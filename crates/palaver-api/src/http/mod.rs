//! HTTP/REST API layer for Palaver.
//!
//! Axum-based REST API with cookie or bearer session authentication,
//! `{error, code}` error bodies, and CORS support.

pub mod cookie;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod router;

#[cfg(test)]
mod tests;
