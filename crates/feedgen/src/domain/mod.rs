//! Feed domain: catalog products, feeds and their runs, schedules and
//! webhook subscriptions, plus the pure filter and encoders that turn a
//! product sequence into a platform file.

pub mod entities;
pub mod errors;
pub mod services;
pub mod value_objects;

pub use entities::*;
pub use errors::*;
pub use value_objects::*;
