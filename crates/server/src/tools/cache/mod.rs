//! Cache inspection MCP tools.
//!
//! These read and prune the controller's store directly, outside the
//! fetch path.

pub mod get;
pub mod keys;
pub mod purge;

pub use get::{CacheGetParams, get_impl};
pub use keys::{CacheKeysParams, keys_impl};
pub use purge::{CachePurgeParams, purge_impl};
