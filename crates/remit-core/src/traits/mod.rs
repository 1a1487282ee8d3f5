//! Core traits defined in `remit-core` and implemented by other crates.

pub mod cache;

pub use cache::CacheProvider;
