//! Ports (Interfaces)
//!
//! Abstract interfaces that define how the domain layer
//! interacts with external systems (storage, HTTP, time).
//!
//! Implementations of these traits live in the server crate.

mod clock;
pub mod repositories;
pub mod services;
mod webhook;

// Re-exports
pub use clock::*;
pub use repositories::*;
pub use services::*;
pub use webhook::*;
