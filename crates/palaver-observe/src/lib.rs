//! Observability setup for Palaver: the tracing subscriber and optional
//! OpenTelemetry export.

pub mod tracing_setup;
