//! Core types for orderflow.
//!
//! This module provides the order aggregate and type-safe wrappers around it.

pub mod id;
pub mod order;
pub mod timestamp;
pub mod validation;

pub use id::{CACHE_KEY_PREFIX, OrderUid};
pub use order::{Delivery, Item, Order, PayloadError, Payment};
pub use validation::ValidationError;
