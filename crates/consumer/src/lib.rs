//! Orderflow consumer library.
//!
//! Reads order payloads from Kafka, persists each one to `PostgreSQL`, and then
//! caches it in Redis. [`IngestHandler`] holds the per-message logic and does
//! not depend on the broker; [`KafkaConsumer`] owns the receive loop and
//! offset bookkeeping.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod consumer;
pub mod handler;

pub use consumer::{ConsumerError, KafkaConsumer};
pub use handler::{IngestError, IngestHandler, Ingested};
