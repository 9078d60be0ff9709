//! Configuration section definitions.

mod cache;
mod media;

pub use cache::CacheConfig;
pub use media::MediaConfig;
