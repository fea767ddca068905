//! Status API and bootstrap support for the `ipobot` binary.

pub mod api;
pub mod metrics;
pub mod state;
