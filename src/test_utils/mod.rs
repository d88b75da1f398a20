//! Test-only helpers shared across crate unit tests.
//!
//! This module is only compiled for unit tests and provides certificate
//! fixtures, loopback servers and the shared log capture.

pub mod certs;
pub mod logs;
pub mod servers;
