//! Core types for PrintQuote.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod email;
pub mod id;
pub mod price;
pub mod profile;
pub mod quote;
pub mod status;
pub mod technology;

pub use email::{Email, EmailError};
pub use id::*;
pub use price::{CurrencyCode, Price};
pub use profile::{AddressData, Profile, ProfileUpdate};
pub use quote::{
    CalculationDetails, ConfirmedOrder, PriceBreakdown, PricingOption, PricingOptions, Quote,
};
pub use status::OrderStatus;
pub use technology::{Technology, TechnologyParseError};
