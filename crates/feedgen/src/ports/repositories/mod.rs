//! Repository Ports
//!
//! Abstract interfaces for data persistence operations.

mod catalog_source;
mod feed_repository;
mod schedule_repository;
mod webhook_repository;

pub use catalog_source::*;
pub use feed_repository::*;
pub use schedule_repository::*;
pub use webhook_repository::*;
