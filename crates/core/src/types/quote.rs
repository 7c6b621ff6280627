//! Quotes and confirmed orders.
//!
//! A [`Quote`] is produced once per successful upload and never mutated. Money
//! fields travel as JSON numbers, so they use `rust_decimal::serde::float`.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::id::{OrderId, QuoteId};
use super::price::Price;
use super::technology::Technology;

/// Cost components behind a technology's price.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceBreakdown {
    #[serde(with = "rust_decimal::serde::float")]
    pub material_cost: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub labor_cost: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub setup_fee: Decimal,
    /// Always zero for FDM.
    #[serde(with = "rust_decimal::serde::float", default)]
    pub post_processing: Decimal,
}

impl PriceBreakdown {
    /// Sum of all components.
    #[must_use]
    pub fn total(&self) -> Decimal {
        self.material_cost + self.labor_cost + self.setup_fee + self.post_processing
    }
}

/// Price and estimate for printing a model with one technology.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricingOption {
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    pub print_time_h: f64,
    pub material_type: String,
    /// Descriptive technology name supplied by the backend.
    pub technology: String,
    pub details: PriceBreakdown,
}

impl PricingOption {
    /// Whether `price` matches the sum of its breakdown at penny precision.
    ///
    /// The backend owns this invariant; the client only checks it so a
    /// mismatch can be logged, never to replace the quoted price.
    #[must_use]
    pub fn is_consistent(&self) -> bool {
        self.details.total().round_dp(2) == self.price.round_dp(2)
    }

    /// The quoted price as a displayable [`Price`].
    #[must_use]
    pub const fn display_price(&self) -> Price {
        Price::gbp(self.price)
    }
}

/// One pricing option per technology.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricingOptions {
    pub fdm: PricingOption,
    pub resin: PricingOption,
}

impl PricingOptions {
    /// The option for `technology`.
    #[must_use]
    pub const fn get(&self, technology: Technology) -> &PricingOption {
        match technology {
            Technology::Fdm => &self.fdm,
            Technology::Resin => &self.resin,
        }
    }
}

/// Geometric and material facts about the uploaded model.
///
/// Display-only; the client never derives prices from these.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalculationDetails {
    pub volume_mm3: f64,
    pub volume_cm3: f64,
    pub triangle_count: u64,
    pub weight_g: f64,
    pub print_time_h: f64,
    pub material: String,
    /// Grams per cubic centimetre.
    pub material_density: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_format: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_filename: Option<String>,
}

/// A priced estimate for one uploaded model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quote {
    pub quote_id: QuoteId,
    /// Where the backend stored the uploaded file.
    pub file_url: String,
    pub pricing_options: PricingOptions,
    pub calculation_details: CalculationDetails,
}

impl Quote {
    /// Pricing for `technology`.
    #[must_use]
    pub const fn option(&self, technology: Technology) -> &PricingOption {
        self.pricing_options.get(technology)
    }
}

/// An order persisted by the backend after confirmation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfirmedOrder {
    pub order_id: OrderId,
    pub printer_type: Technology,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
}

impl ConfirmedOrder {
    /// Path of the order-tracking page for this order.
    #[must_use]
    pub fn tracking_path(&self) -> String {
        format!("/order/{}", self.order_id)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn option(price: i64, parts: [i64; 4]) -> PricingOption {
        PricingOption {
            price: Decimal::new(price, 2),
            print_time_h: 1.5,
            material_type: "PLA".to_owned(),
            technology: "FDM".to_owned(),
            details: PriceBreakdown {
                material_cost: Decimal::new(parts[0], 2),
                labor_cost: Decimal::new(parts[1], 2),
                setup_fee: Decimal::new(parts[2], 2),
                post_processing: Decimal::new(parts[3], 2),
            },
        }
    }

    #[test]
    fn test_breakdown_total_matches_price() {
        let fdm = option(1250, [375, 675, 200, 0]);
        assert_eq!(fdm.details.total(), Decimal::new(1250, 2));
        assert!(fdm.is_consistent());
    }

    #[test]
    fn test_inconsistent_breakdown_detected() {
        assert!(!option(1300, [375, 675, 200, 0]).is_consistent());
    }

    #[test]
    fn test_post_processing_defaults_to_zero() {
        let json = r#"{"material_cost": 1.2, "labor_cost": 3, "setup_fee": 2.0}"#;
        let details: PriceBreakdown = serde_json::from_str(json).unwrap();
        assert_eq!(details.post_processing, Decimal::ZERO);
        assert_eq!(details.total(), Decimal::new(62, 1));
    }

    #[test]
    fn test_money_serializes_as_number() {
        let order = ConfirmedOrder {
            order_id: OrderId::new("o-1"),
            printer_type: Technology::Fdm,
            price: Decimal::new(1250, 2),
        };
        let json = serde_json::to_value(&order).unwrap();
        assert_eq!(json["price"], serde_json::json!(12.5));
        assert_eq!(json["printer_type"], "fdm");
        assert_eq!(order.tracking_path(), "/order/o-1");
    }
}
