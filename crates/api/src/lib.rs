//! Orderflow API library.
//!
//! The HTTP read path for order lookups, provided as a library so the router
//! can be tested without binding a socket.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod error;
pub mod routes;
pub mod services;
pub mod state;
