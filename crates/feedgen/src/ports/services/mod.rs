//! Service Ports
//!
//! Abstract interfaces for external storage services.

mod artifact_store;

pub use artifact_store::*;
