//! Orderflow Core - Shared order types library.
//!
//! This crate provides the order aggregate used across all orderflow components:
//! - `storage` - `PostgreSQL` aggregate store and Redis cache store
//! - `consumer` - Kafka ingestion pipeline
//! - `api` - HTTP read path (cache-aside lookups)
//! - `cli` - Synthetic producer and cache tooling
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no database
//! access, no network clients. This keeps it lightweight and allows it to be
//! used anywhere.
//!
//! # Modules
//!
//! - [`types`] - The order aggregate, its identifier, and payload validation

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

#[cfg(any(test, feature = "testing"))]
pub mod fixtures;

pub use types::*;
