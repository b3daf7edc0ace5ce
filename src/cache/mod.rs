//! Content-addressed audio cache.
//!
//! Layout on disk: `<root>/<voice>/<sha256>.mp3`. Entries are written once
//! and only removed by an explicit per-voice clear.

pub mod key;
pub mod store;

pub use key::{derive_key, CacheKey};
pub use store::CacheStore;
