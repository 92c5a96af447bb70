//! Text-generation provider abstractions for Palaver.
//!
//! - `LlmProvider`: RPITIT trait for concrete provider implementations
//! - `BoxLlmProvider`: Object-safe wrapper for dynamic dispatch
//! - `StubProvider`: deterministic offline provider
//! - `GenerationClient`: timeout-bounded wrapper that never fails a turn

pub mod box_provider;
pub mod generation;
pub mod provider;
pub mod stub;
