//! Cache utilities

mod hash;

pub use hash::{compute_hash, url_cache_key};
