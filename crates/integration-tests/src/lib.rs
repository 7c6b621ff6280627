//! Integration tests for PrintQuote.
//!
//! Each test drives the public storefront API against `mockito` servers
//! standing in for the quoting backend and the identity provider, so the
//! suite runs without network access:
//!
//! ```bash
//! cargo test -p printquote-integration-tests
//! ```
//!
//! # Test Categories
//!
//! - `order_workflow` - upload, quote and order confirmation
//! - `session` - sign-up, sign-in, sign-out and their interaction with orders
//! - `profile_sync` - editing the delivery profile of a signed-in user
//!
//! This module holds the fixtures those tests share.

use mockito::{Matcher, Mock, ServerGuard};
use printquote_core::AddressData;
use printquote_storefront::config::{QuoteApiConfig, SupabaseConfig};
use printquote_storefront::quote_api::QuoteClient;
use printquote_storefront::services::auth::SignUpRequest;
use printquote_storefront::supabase::SupabaseClient;
use secrecy::SecretString;
use serde_json::{Value, json};
use url::Url;

/// Anon key the identity client sends as `apikey`.
pub const ANON_KEY: &str = "eyJhbGciOiJIUzI1NiJ9.aW50ZWdyYXRpb24tYW5vbi1rZXk.k2Pq9vTz";

/// The one user every identity fixture belongs to.
pub const USER_ID: &str = "0d3c5a8e-7b41-4f2a-9e61-3c8b2d7f1a04";

pub const USER_EMAIL: &str = "grace@example.com";

/// Far enough in the future that sessions never need refreshing.
pub const FAR_FUTURE: i64 = 4_000_000_000;

/// Where the OAuth provider returns the browser.
pub fn callback_url() -> Url {
    Url::parse("https://shop.example.com/auth/callback").expect("valid callback URL")
}

// ============================================================================
// Quoting backend
// ============================================================================

pub fn quote_client(server: &ServerGuard) -> QuoteClient {
    QuoteClient::new(&QuoteApiConfig {
        base_url: Url::parse(&server.url()).expect("mock server URL"),
    })
}

/// `/upload` response for a quote priced at £12.50 (FDM) and £34.20 (resin).
///
/// Both prices equal the sum of their breakdowns.
pub fn upload_body(quote_id: &str) -> Value {
    json!({
        "quoteId": quote_id,
        "file_url": format!("https://files.example.com/{quote_id}.stl"),
        "pricing_options": {
            "fdm": {
                "price": 12.50,
                "print_time_h": 2.25,
                "material_type": "PLA",
                "technology": "FDM (Fused Deposition Modeling)",
                "details": {
                    "material_cost": 3.75,
                    "labor_cost": 6.75,
                    "setup_fee": 2.00,
                    "post_processing": 0
                }
            },
            "resin": {
                "price": 34.20,
                "print_time_h": 3.5,
                "material_type": "Standard Resin",
                "technology": "SLA (Stereolithography)",
                "details": {
                    "material_cost": 10.20,
                    "labor_cost": 14.00,
                    "setup_fee": 5.00,
                    "post_processing": 5.00
                }
            }
        },
        "calculation_details": {
            "volume_mm3": 30_000.0,
            "volume_cm3": 30.0,
            "triangle_count": 2_048,
            "weight_g": 37.2,
            "print_time_h": 2.25,
            "material": "PLA",
            "material_density": 1.24,
            "file_format": "STL",
            "original_filename": "part.stl"
        }
    })
}

/// Mock `POST /upload` answering with [`upload_body`].
pub async fn mock_upload(server: &mut ServerGuard, quote_id: &str) -> Mock {
    server
        .mock("POST", "/upload")
        .match_header("content-type", Matcher::Regex("multipart/form-data".to_string()))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(upload_body(quote_id).to_string())
        .create_async()
        .await
}

/// Mock `POST /confirm-order` for `printer_type`, answering with `order_id`.
pub async fn mock_confirm(server: &mut ServerGuard, printer_type: &str, order_id: &str) -> Mock {
    server
        .mock("POST", "/confirm-order")
        .match_body(Matcher::PartialJson(json!({ "printer_type": printer_type })))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            json!({
                "order_id": order_id,
                "status": "confirmed",
                "message": "Order confirmed successfully"
            })
            .to_string(),
        )
        .create_async()
        .await
}

// ============================================================================
// Identity provider
// ============================================================================

pub fn supabase_client(server: &ServerGuard) -> SupabaseClient {
    SupabaseClient::new(&SupabaseConfig {
        url: Url::parse(&server.url()).expect("mock server URL"),
        anon_key: SecretString::from(ANON_KEY),
    })
    .expect("identity client")
}

pub fn session_body() -> Value {
    json!({
        "access_token": "integration-access-token",
        "token_type": "bearer",
        "expires_in": 3600,
        "expires_at": FAR_FUTURE,
        "refresh_token": "integration-refresh-token",
        "user": {
            "id": USER_ID,
            "email": USER_EMAIL,
            "user_metadata": { "full_name": "Grace Hopper" },
            "app_metadata": { "provider": "email" }
        }
    })
}

/// A stored profile row as the REST endpoint returns it.
pub fn profile_row(city: &str) -> Value {
    json!({
        "id": USER_ID,
        "email": USER_EMAIL,
        "full_name": "Grace Hopper",
        "address_line_1": "12 Harbour Street",
        "city": city,
        "postal_code": "BS1 4RN",
        "country": "UK",
        "created_at": "2026-09-01T09:00:00Z",
        "updated_at": "2026-09-01T09:00:00Z"
    })
}

/// Mock a successful password grant.
pub async fn mock_password_grant(server: &mut ServerGuard) -> Mock {
    server
        .mock("POST", "/auth/v1/token")
        .match_query(Matcher::UrlEncoded("grant_type".into(), "password".into()))
        .match_header("apikey", ANON_KEY)
        .with_status(200)
        .with_body(session_body().to_string())
        .create_async()
        .await
}

/// Mock profile reads returning the given rows.
pub async fn mock_profile_fetch(server: &mut ServerGuard, rows: Value) -> Mock {
    server
        .mock("GET", "/rest/v1/profiles")
        .match_query(Matcher::UrlEncoded("id".into(), format!("eq.{USER_ID}")))
        .with_status(200)
        .with_body(rows.to_string())
        .create_async()
        .await
}

/// A sign-up form that passes validation.
pub fn sign_up_request() -> SignUpRequest {
    SignUpRequest {
        email: USER_EMAIL.to_string(),
        password: SecretString::from("compiler1952"),
        confirm_password: SecretString::from("compiler1952"),
        full_name: "Grace Hopper".to_string(),
        address: Some(AddressData {
            address_line_1: "12 Harbour Street".to_string(),
            address_line_2: None,
            city: "Bristol".to_string(),
            postal_code: "BS1 4RN".to_string(),
            country: "UK".to_string(),
        }),
    }
}
