//! Entity store

mod cache_store;

pub use cache_store::{CacheConfig, CacheStore};
