//! Value Objects
//!
//! Immutable objects defined by their attributes rather than identity.

mod availability;
mod channel;
mod filter_spec;
mod schedule_interval;
mod webhook_event;

pub use availability::*;
pub use channel::*;
pub use filter_spec::*;
pub use schedule_interval::*;
pub use webhook_event::*;
