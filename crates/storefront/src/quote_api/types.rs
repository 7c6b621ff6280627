//! Wire formats for the quoting backend and the schema boundary that turns
//! them into domain types.
//!
//! The backend is loosely typed: fields may be missing and the upload
//! response has spelled the quote ID both `quote_id` and `quoteId`. Raw
//! responses are deserialised into all-optional structs here and then
//! validated, so malformed data surfaces as [`QuoteApiError::Parse`] instead
//! of leaking empty strings into the workflow.

use printquote_core::{
    CalculationDetails, OrderId, OrderStatus, PricingOption, PricingOptions, Quote, QuoteId,
    Technology,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::QuoteApiError;

// =============================================================================
// Upload
// =============================================================================

/// Raw `POST /upload` response.
#[derive(Debug, Deserialize)]
pub struct UploadResponse {
    #[serde(default)]
    quote_id: Option<String>,
    #[serde(default, rename = "quoteId")]
    quote_id_camel: Option<String>,
    #[serde(default)]
    file_url: Option<String>,
    #[serde(default)]
    pricing_options: Option<PricingOptions>,
    #[serde(default)]
    calculation_details: Option<CalculationDetails>,
}

impl UploadResponse {
    /// Validate the response into a [`Quote`].
    ///
    /// `quote_id` wins over `quoteId` when both are present and non-empty.
    ///
    /// # Errors
    ///
    /// Returns [`QuoteApiError::Parse`] if the quote ID is missing or blank,
    /// or if pricing, calculation details or the file URL are absent.
    pub fn into_quote(self) -> Result<Quote, QuoteApiError> {
        let quote_id = [self.quote_id, self.quote_id_camel]
            .into_iter()
            .flatten()
            .find(|id| !id.trim().is_empty())
            .ok_or_else(|| QuoteApiError::Parse("upload response has no quote_id".to_string()))?;

        let pricing_options = self.pricing_options.ok_or_else(|| {
            QuoteApiError::Parse("upload response has no pricing_options".to_string())
        })?;
        let calculation_details = self.calculation_details.ok_or_else(|| {
            QuoteApiError::Parse("upload response has no calculation_details".to_string())
        })?;
        let file_url = self
            .file_url
            .ok_or_else(|| QuoteApiError::Parse("upload response has no file_url".to_string()))?;

        for technology in Technology::ALL {
            let option = pricing_options.get(technology);
            if !option.is_consistent() {
                tracing::warn!(
                    quote_id = %quote_id,
                    technology = %technology,
                    price = %option.price,
                    breakdown_total = %option.details.total(),
                    "Quoted price does not match its breakdown"
                );
            }
        }

        Ok(Quote {
            quote_id: QuoteId::new(quote_id),
            file_url,
            pricing_options,
            calculation_details,
        })
    }
}

// =============================================================================
// Confirm order
// =============================================================================

/// `POST /confirm-order` request body.
///
/// Carries the whole quote back so the backend can persist it without
/// re-analysing the model.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConfirmOrderRequest {
    pub quote_id: QuoteId,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    pub file_url: String,
    pub printer_type: Technology,
    pub pricing_info: PricingOption,
    pub calculation_details: CalculationDetails,
    #[serde(with = "rust_decimal::serde::float")]
    pub price_fdm: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub price_resin: Decimal,
    pub estimated_print_time_resin: f64,
}

impl ConfirmOrderRequest {
    /// Build the confirmation for `quote` printed with `technology`.
    #[must_use]
    pub fn new(quote: &Quote, technology: Technology) -> Self {
        let selected = quote.option(technology);
        Self {
            quote_id: quote.quote_id.clone(),
            price: selected.price,
            file_url: quote.file_url.clone(),
            printer_type: technology,
            pricing_info: selected.clone(),
            calculation_details: quote.calculation_details.clone(),
            price_fdm: quote.pricing_options.fdm.price,
            price_resin: quote.pricing_options.resin.price,
            estimated_print_time_resin: quote.pricing_options.resin.print_time_h,
        }
    }
}

/// Raw `POST /confirm-order` response.
#[derive(Debug, Deserialize)]
pub struct ConfirmOrderResponse {
    #[serde(default)]
    order_id: Option<String>,
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

impl ConfirmOrderResponse {
    /// Extract the order ID.
    ///
    /// # Errors
    ///
    /// Returns [`QuoteApiError::Parse`] if `order_id` is missing or blank.
    pub fn into_order_id(self) -> Result<OrderId, QuoteApiError> {
        if let Some(message) = &self.message {
            tracing::debug!(status = ?self.status, message = %message, "Confirm-order response");
        }
        self.order_id
            .filter(|id| !id.trim().is_empty())
            .map(OrderId::new)
            .ok_or_else(|| {
                QuoteApiError::Parse("confirm-order response has no order_id".to_string())
            })
    }
}

// =============================================================================
// Order tracking
// =============================================================================

/// A stored order as returned by `GET /order/{id}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderRecord {
    pub id: OrderId,
    #[serde(default)]
    pub file_url: Option<String>,
    #[serde(default)]
    pub weight_g: Option<f64>,
    #[serde(default)]
    pub print_time_h: Option<f64>,
    #[serde(with = "rust_decimal::serde::float")]
    pub price_gbp: Decimal,
    #[serde(default)]
    pub status: OrderStatus,
    /// Creation timestamp exactly as the backend reports it.
    #[serde(default)]
    pub created_at: Option<String>,
}

/// Pull a human-readable message out of an error body.
///
/// The backend reports failures as `{"detail": "..."}`; anything else is
/// returned verbatim.
pub(crate) fn error_detail(body: String) -> String {
    serde_json::from_str::<serde_json::Value>(&body)
        .ok()
        .and_then(|value| value.get("detail")?.as_str().map(str::to_string))
        .unwrap_or(body)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    fn option_json(price: f64, tech: &str) -> serde_json::Value {
        json!({
            "price": price,
            "print_time_h": 2.0,
            "material_type": "PLA",
            "technology": tech,
            "details": {"material_cost": price - 4.5, "labor_cost": 2.5, "setup_fee": 2.0}
        })
    }

    fn upload_json() -> serde_json::Value {
        json!({
            "quote_id": "q-123",
            "file_url": "https://files.example.com/q-123.stl",
            "pricing_options": {
                "fdm": option_json(12.5, "FDM (Fused Deposition Modeling)"),
                "resin": option_json(18.75, "Resin (SLA/DLP)")
            },
            "calculation_details": {
                "volume_mm3": 12000.0,
                "volume_cm3": 12.0,
                "triangle_count": 1024,
                "weight_g": 14.88,
                "print_time_h": 2.0,
                "material": "PLA",
                "material_density": 1.24
            }
        })
    }

    fn parse(value: serde_json::Value) -> Result<Quote, QuoteApiError> {
        serde_json::from_value::<UploadResponse>(value).unwrap().into_quote()
    }

    #[test]
    fn test_upload_response_into_quote() {
        let quote = parse(upload_json()).unwrap();
        assert_eq!(quote.quote_id.as_str(), "q-123");
        assert_eq!(quote.option(Technology::Resin).price, Decimal::new(1875, 2));
        assert_eq!(quote.calculation_details.triangle_count, 1024);
    }

    #[test]
    fn test_camel_case_quote_id_accepted() {
        let mut value = upload_json();
        value.as_object_mut().unwrap().remove("quote_id");
        value["quoteId"] = json!("q-camel");
        assert_eq!(parse(value).unwrap().quote_id.as_str(), "q-camel");
    }

    #[test]
    fn test_snake_case_quote_id_preferred() {
        let mut value = upload_json();
        value["quoteId"] = json!("q-camel");
        assert_eq!(parse(value).unwrap().quote_id.as_str(), "q-123");
    }

    #[test]
    fn test_blank_snake_case_falls_back_to_camel() {
        let mut value = upload_json();
        value["quote_id"] = json!("");
        value["quoteId"] = json!("q-camel");
        assert_eq!(parse(value).unwrap().quote_id.as_str(), "q-camel");
    }

    #[test]
    fn test_missing_quote_id_is_parse_error() {
        let mut value = upload_json();
        value.as_object_mut().unwrap().remove("quote_id");
        assert!(matches!(parse(value), Err(QuoteApiError::Parse(_))));
    }

    #[test]
    fn test_missing_pricing_is_parse_error() {
        let mut value = upload_json();
        value.as_object_mut().unwrap().remove("pricing_options");
        let err = parse(value).unwrap_err();
        assert!(err.to_string().contains("pricing_options"));
    }

    #[test]
    fn test_confirm_request_carries_selected_option() {
        let quote = parse(upload_json()).unwrap();
        let request = ConfirmOrderRequest::new(&quote, Technology::Resin);
        let body = serde_json::to_value(&request).unwrap();

        assert_eq!(body["quote_id"], "q-123");
        assert_eq!(body["printer_type"], "resin");
        assert_eq!(body["price"], json!(18.75));
        assert_eq!(body["price_fdm"], json!(12.5));
        assert_eq!(body["price_resin"], json!(18.75));
        assert_eq!(body["estimated_print_time_resin"], json!(2.0));
        assert_eq!(body["pricing_info"]["technology"], "Resin (SLA/DLP)");
    }

    #[test]
    fn test_confirm_response_requires_order_id() {
        let ok: ConfirmOrderResponse =
            serde_json::from_value(json!({"order_id": "o-9", "status": "confirmed"})).unwrap();
        assert_eq!(ok.into_order_id().unwrap().as_str(), "o-9");

        let missing: ConfirmOrderResponse =
            serde_json::from_value(json!({"status": "confirmed"})).unwrap();
        assert!(matches!(missing.into_order_id(), Err(QuoteApiError::Parse(_))));
    }

    #[test]
    fn test_order_record_tolerates_sparse_rows() {
        let record: OrderRecord =
            serde_json::from_value(json!({"id": "o-1", "price_gbp": 9.99, "status": "printing"}))
                .unwrap();
        assert_eq!(record.status, OrderStatus::Printing);
        assert!(record.file_url.is_none());
    }

    #[test]
    fn test_error_detail_extraction() {
        assert_eq!(error_detail(r#"{"detail":"Order not found"}"#.to_string()), "Order not found");
        assert_eq!(error_detail("Bad Gateway".to_string()), "Bad Gateway");
    }
}
