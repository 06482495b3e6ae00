//! Business logic services.

pub mod lookup;

pub use lookup::{Lookup, LookupError, OrderLookup, StartupPreload};
