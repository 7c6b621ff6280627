//! PrintQuote Core - Shared domain types.
//!
//! This crate provides the types exchanged between the PrintQuote client
//! components and the two external systems they talk to:
//! - the quoting backend (uploads, quotes, order confirmation)
//! - the identity provider (sessions and delivery-address profiles)
//!
//! # Architecture
//!
//! The core crate contains only types and traits - no I/O, no HTTP clients.
//! This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Type-safe IDs, money, emails, quotes, orders and profiles

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
