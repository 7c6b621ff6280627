//! Client-side services.
//!
//! - `auth` - session projection and account operations
//! - `order` - upload → quote → confirmation workflow
//! - `profile` - delivery-address editing

pub mod auth;
pub mod order;
pub mod profile;
