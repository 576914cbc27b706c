//! Domain Services
//!
//! Pure, I/O-free logic: product filtering, platform serialization and
//! webhook payload construction.

mod events;
mod filter;
pub mod serializers;

pub use events::*;
pub use filter::*;
pub use serializers::{
    serialize, CountingWriter, FeedEncoder, FeedHeader, SerializeError, SerializeStats,
};
