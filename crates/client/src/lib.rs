//! Client code for swcache.
//!
//! This crate provides the HTTP fetch pipeline the cache controller uses as
//! its network side, shared by the server and tests.

pub mod fetch;

pub use fetch::{FetchClient, FetchConfig, FetchResponse};
