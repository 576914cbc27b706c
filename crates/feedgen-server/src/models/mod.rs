//! Feedgen Data Models
//!
//! Request/response DTOs for the HTTP control surface.
//! - Feed: configuration and status
//! - Generation: runs, previews and scheduler ticks
//! - Schedule: per-feed automation
//! - Webhook: subscription and delivery journal

mod feed;
mod generation;
mod schedule;
mod webhook;

pub use feed::*;
pub use generation::*;
pub use schedule::*;
pub use webhook::*;
