//! HTTP keep-alive endpoint for external uptime probes.
//!
//! Carries no application state; it only proves the process is up.

pub mod server;

pub use server::{build_liveness_app, start_liveness};
