//! Display formatting for quotes and orders.
//!
//! All money is shown in pounds to two decimal places; these helpers never
//! compute prices, they only render what the backend sent.

use printquote_core::{CalculationDetails, Price, PricingOption, Quote, Technology};
use rust_decimal::Decimal;

/// `£12.50`.
#[must_use]
pub fn format_price(amount: Decimal) -> String {
    Price::gbp(amount).display()
}

/// `2h 15m`, or `45m` under an hour.
///
/// Minutes are rounded; 59.5 minutes or more rolls over to the next hour.
/// Negative and non-finite inputs render as `0m`.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn format_print_time(hours: f64) -> String {
    let total_minutes = if hours.is_finite() && hours > 0.0 {
        (hours * 60.0).round() as i64
    } else {
        0
    };
    let (h, m) = (total_minutes / 60, total_minutes % 60);
    if h > 0 {
        format!("{h}h {m}m")
    } else {
        format!("{m}m")
    }
}

/// `14.9g`.
#[must_use]
pub fn format_weight(grams: f64) -> String {
    format!("{grams:.1}g")
}

/// `12.35 cm³`.
#[must_use]
pub fn format_volume(cm3: f64) -> String {
    format!("{cm3:.2} cm³")
}

/// One technology's row in the quote display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PricingSummary {
    pub technology: Technology,
    pub label: &'static str,
    pub price: String,
    pub print_time: String,
    pub material_type: String,
    pub material_cost: String,
    pub labor_cost: String,
    pub setup_fee: String,
    /// Only shown when non-zero.
    pub post_processing: Option<String>,
}

impl PricingSummary {
    #[must_use]
    pub fn new(technology: Technology, option: &PricingOption) -> Self {
        let details = &option.details;
        Self {
            technology,
            label: technology.label(),
            price: format_price(option.price),
            print_time: format_print_time(option.print_time_h),
            material_type: option.material_type.clone(),
            material_cost: format_price(details.material_cost),
            labor_cost: format_price(details.labor_cost),
            setup_fee: format_price(details.setup_fee),
            post_processing: (!details.post_processing.is_zero())
                .then(|| format_price(details.post_processing)),
        }
    }
}

/// Everything the quote screen shows, pre-formatted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuoteSummary {
    pub file_name: Option<String>,
    pub volume: String,
    pub weight: String,
    pub triangle_count: u64,
    pub material: String,
    pub options: Vec<PricingSummary>,
}

impl QuoteSummary {
    #[must_use]
    pub fn new(quote: &Quote) -> Self {
        let CalculationDetails {
            volume_cm3,
            weight_g,
            triangle_count,
            material,
            original_filename,
            ..
        } = &quote.calculation_details;

        Self {
            file_name: original_filename.clone(),
            volume: format_volume(*volume_cm3),
            weight: format_weight(*weight_g),
            triangle_count: *triangle_count,
            material: material.clone(),
            options: Technology::ALL
                .into_iter()
                .map(|tech| PricingSummary::new(tech, quote.option(tech)))
                .collect(),
        }
    }

    /// The cheapest option, used to highlight a recommendation.
    #[must_use]
    pub fn cheapest(quote: &Quote) -> Technology {
        Technology::ALL
            .into_iter()
            .min_by_key(|tech| quote.option(*tech).price)
            .unwrap_or(Technology::Fdm)
    }
}
