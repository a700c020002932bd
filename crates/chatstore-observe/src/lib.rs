//! Observability for chatstore: tracing subscriber setup.

pub mod tracing_setup;
