//! PrintQuote storefront library.
//!
//! Client-side logic for the 3D-print quoting storefront: uploading models
//! for a quote, confirming orders, and managing the signed-in customer's
//! session and delivery profile. Rendering is left to the host; every
//! operation here exposes plain state for it to draw.
//!
//! # Modules
//!
//! - [`quote_api`] - HTTP client for the quoting backend
//! - [`supabase`] - HTTP client for the identity provider
//! - [`services::order`] - upload, quote and confirmation state machine
//! - [`services::auth`] - session manager and sign-up validation
//! - [`services::profile`] - editable delivery profile form
//! - [`format`] - display helpers for prices, times and weights

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod error;
pub mod format;
pub mod models;
pub mod quote_api;
pub mod services;
pub mod state;
pub mod supabase;
pub mod telemetry;

pub use error::{AppError, Result};
pub use state::AppState;
