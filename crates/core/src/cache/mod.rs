//! Cache generations and the stores that hold them.
//!
//! This module provides:
//!
//! - The `CacheStore` trait the controller is written against
//! - A SQLite store (`CacheDb`) with async access via tokio-rusqlite
//! - An in-memory store (`MemoryStore`)
//! - Request URL canonicalization and body digests

pub mod connection;
pub mod entries;
pub mod generations;
pub mod hash;
pub mod key;
pub mod memory;
pub mod migrations;
pub mod store;

pub use crate::Error;

pub use connection::CacheDb;
pub use memory::MemoryStore;
pub use store::CacheStore;
