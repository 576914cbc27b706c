//! Background workers
//!
//! Long-running tasks spawned at startup: the schedule ticker and the
//! webhook outbox dispatcher.

pub mod dispatcher;
pub mod scheduler;
