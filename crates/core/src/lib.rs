//! Core types and shared functionality for swcache.
//!
//! This crate provides:
//! - The offline cache controller (install, activate, fetch interception)
//! - Cache stores: SQLite-backed and in-memory
//! - Unified error types
//! - Configuration structures

pub mod cache;
pub mod config;
pub mod controller;
pub mod error;
pub mod request;

pub use cache::{CacheDb, CacheStore, MemoryStore};
pub use config::{AppConfig, ConfigError};
pub use controller::{CacheController, ControllerConfig, Fetcher, Interception, LifecycleState, ResponseSource, Served};
pub use error::Error;
pub use request::{CachedResponse, Request};
