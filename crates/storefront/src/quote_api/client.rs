//! HTTP implementation of [`QuoteApi`].

use std::sync::Arc;

use async_trait::async_trait;
use printquote_core::{OrderId, Quote};
use reqwest::multipart::{Form, Part};
use serde::de::DeserializeOwned;
use url::Url;

use super::types::{ConfirmOrderResponse, UploadResponse, error_detail};
use super::{ConfirmOrderRequest, ModelFile, OrderRecord, QuoteApi, QuoteApiError};
use crate::config::QuoteApiConfig;

/// Client for the quoting backend.
///
/// Cheap to clone; all clones share one connection pool.
#[derive(Clone)]
pub struct QuoteClient {
    inner: Arc<QuoteClientInner>,
}

struct QuoteClientInner {
    client: reqwest::Client,
    base_url: Url,
}

impl QuoteClient {
    /// Create a new quoting backend client.
    #[must_use]
    pub fn new(config: &QuoteApiConfig) -> Self {
        Self {
            inner: Arc::new(QuoteClientInner {
                client: reqwest::Client::new(),
                base_url: config.base_url.clone(),
            }),
        }
    }

    /// The backend's base URL.
    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.inner.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.inner.base_url.as_str().trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    /// Map non-success statuses to errors, then decode the body.
    async fn read_json<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, QuoteApiError> {
        let status = response.status();

        if !status.is_success() {
            let message = error_detail(response.text().await.unwrap_or_default());
            return Err(QuoteApiError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|e| QuoteApiError::Parse(e.to_string()))
    }
}

#[async_trait]
impl QuoteApi for QuoteClient {
    #[tracing::instrument(skip(self, file), fields(file_name = %file.file_name()))]
    async fn submit(&self, file: ModelFile) -> Result<Quote, QuoteApiError> {
        file.ensure_supported()?;

        let file_name = file.file_name().to_string();
        let mime = file.mime_type();
        let part = Part::bytes(file.into_bytes())
            .file_name(file_name)
            .mime_str(mime)?;
        let form = Form::new().part("file", part);

        tracing::debug!("Uploading model for quote");

        let response = self
            .inner
            .client
            .post(self.endpoint("upload"))
            .multipart(form)
            .send()
            .await?;

        let raw: UploadResponse = Self::read_json(response).await?;
        let quote = raw.into_quote()?;

        tracing::info!(quote_id = %quote.quote_id, "Quote received");
        Ok(quote)
    }

    #[tracing::instrument(skip(self, request), fields(quote_id = %request.quote_id, technology = %request.printer_type))]
    async fn confirm_order(&self, request: &ConfirmOrderRequest) -> Result<OrderId, QuoteApiError> {
        let response = self
            .inner
            .client
            .post(self.endpoint("confirm-order"))
            .json(request)
            .send()
            .await?;

        let raw: ConfirmOrderResponse = Self::read_json(response).await?;
        let order_id = raw.into_order_id()?;

        tracing::info!(order_id = %order_id, "Order confirmed");
        Ok(order_id)
    }

    async fn get_order(&self, order_id: &OrderId) -> Result<OrderRecord, QuoteApiError> {
        let url = self.endpoint(&format!("order/{}", urlencoding::encode(order_id.as_str())));
        let response = self.inner.client.get(&url).send().await?;
        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(QuoteApiError::NotFound(order_id.to_string()));
        }
        Self::read_json(response).await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use mockito::Matcher;
    use printquote_core::{OrderStatus, Technology};
    use rust_decimal::Decimal;
    use serde_json::json;

    const UPLOAD_BODY: &str = r#"{
        "quoteId": "q-42",
        "file_url": "https://files.example.com/q-42.stl",
        "pricing_options": {
            "fdm": {"price": 7.5, "print_time_h": 1.0, "material_type": "PLA", "technology": "FDM",
                    "details": {"material_cost": 3.0, "labor_cost": 2.5, "setup_fee": 2.0}},
            "resin": {"price": 11.0, "print_time_h": 1.5, "material_type": "Standard Resin", "technology": "Resin",
                      "details": {"material_cost": 4.0, "labor_cost": 3.0, "setup_fee": 3.0, "post_processing": 1.0}}
        },
        "calculation_details": {"volume_mm3": 8000.0, "volume_cm3": 8.0, "triangle_count": 12,
                                "weight_g": 9.92, "print_time_h": 1.0, "material": "PLA", "material_density": 1.24}
    }"#;

    fn client_for(server: &mockito::ServerGuard) -> QuoteClient {
        QuoteClient::new(&QuoteApiConfig {
            base_url: Url::parse(&server.url()).unwrap(),
        })
    }

    #[tokio::test]
    async fn test_submit_posts_multipart_and_parses_quote() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/upload")
            .match_header(
                "content-type",
                Matcher::Regex("^multipart/form-data".to_string()),
            )
            .match_body(Matcher::Regex(r#"name="file"; filename="cube.STL""#.to_string()))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(UPLOAD_BODY)
            .expect(1)
            .create_async()
            .await;

        let quote = client_for(&server)
            .submit(ModelFile::new("cube.STL", b"solid cube".to_vec()))
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(quote.quote_id.as_str(), "q-42");
        assert_eq!(quote.option(Technology::Fdm).price, Decimal::new(75, 1));
    }

    #[tokio::test]
    async fn test_unsupported_file_makes_no_request() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/upload")
            .expect(0)
            .create_async()
            .await;

        let err = client_for(&server)
            .submit(ModelFile::new("drawing.dxf", vec![0; 16]))
            .await
            .unwrap_err();

        mock.assert_async().await;
        assert!(matches!(err, QuoteApiError::UnsupportedFormat { .. }));
    }

    #[tokio::test]
    async fn test_upload_failure_reports_detail() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/upload")
            .with_status(400)
            .with_body(r#"{"detail":"Unsupported file type"}"#)
            .create_async()
            .await;

        let err = client_for(&server)
            .submit(ModelFile::new("part.obj", b"v 0 0 0".to_vec()))
            .await
            .unwrap_err();

        match err {
            QuoteApiError::Api { status, message } => {
                assert_eq!(status, 400);
                assert_eq!(message, "Unsupported file type");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_upload_without_quote_id_is_parse_error() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/upload")
            .with_status(200)
            .with_body(r#"{"file_url": "x"}"#)
            .create_async()
            .await;

        let err = client_for(&server)
            .submit(ModelFile::new("part.step", vec![1]))
            .await
            .unwrap_err();
        assert!(matches!(err, QuoteApiError::Parse(_)));
    }

    #[tokio::test]
    async fn test_confirm_order_returns_order_id() {
        let mut server = mockito::Server::new_async().await;
        let quote = serde_json::from_str::<UploadResponse>(UPLOAD_BODY)
            .unwrap()
            .into_quote()
            .unwrap();
        let request = ConfirmOrderRequest::new(&quote, Technology::Fdm);

        let mock = server
            .mock("POST", "/confirm-order")
            .match_body(Matcher::PartialJson(json!({
                "quote_id": "q-42",
                "printer_type": "fdm",
                "price": 7.5
            })))
            .with_status(200)
            .with_body(r#"{"order_id":"o-7","status":"confirmed","message":"Order confirmed successfully"}"#)
            .create_async()
            .await;

        let order_id = client_for(&server).confirm_order(&request).await.unwrap();

        mock.assert_async().await;
        assert_eq!(order_id.as_str(), "o-7");
    }

    #[tokio::test]
    async fn test_confirm_order_server_error() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/confirm-order")
            .with_status(500)
            .with_body("Internal Server Error")
            .create_async()
            .await;

        let quote = serde_json::from_str::<UploadResponse>(UPLOAD_BODY)
            .unwrap()
            .into_quote()
            .unwrap();
        let err = client_for(&server)
            .confirm_order(&ConfirmOrderRequest::new(&quote, Technology::Resin))
            .await
            .unwrap_err();

        assert!(err.is_transport_failure());
    }

    #[tokio::test]
    async fn test_missing_upload_route_is_api_error() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/upload")
            .with_status(404)
            .with_body("Not Found")
            .create_async()
            .await;

        let err = client_for(&server)
            .submit(ModelFile::new("part.stl", b"solid part".to_vec()))
            .await
            .unwrap_err();

        assert!(matches!(err, QuoteApiError::Api { status: 404, .. }));
        assert!(err.is_transport_failure());
        assert_ne!(err.user_message(), "Order not found.");
    }

    #[tokio::test]
    async fn test_confirm_order_unknown_quote_is_api_error() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/confirm-order")
            .with_status(404)
            .with_body(r#"{"detail":"Quote not found"}"#)
            .create_async()
            .await;

        let quote = serde_json::from_str::<UploadResponse>(UPLOAD_BODY)
            .unwrap()
            .into_quote()
            .unwrap();
        let err = client_for(&server)
            .confirm_order(&ConfirmOrderRequest::new(&quote, Technology::Fdm))
            .await
            .unwrap_err();

        assert!(matches!(err, QuoteApiError::Api { status: 404, .. }));
        assert_eq!(err.user_message(), "Quote not found");
    }

    #[tokio::test]
    async fn test_get_order() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/order/o-7")
            .with_status(200)
            .with_body(r#"{"id":"o-7","price_gbp":7.5,"status":"shipped","weight_g":9.92}"#)
            .create_async()
            .await;
        let _mock = server
            .mock("GET", "/order/missing")
            .with_status(404)
            .with_body(r#"{"detail":"Order not found"}"#)
            .create_async()
            .await;

        let client = client_for(&server);
        let record = client.get_order(&OrderId::new("o-7")).await.unwrap();
        assert_eq!(record.status, OrderStatus::Shipped);

        let err = client.get_order(&OrderId::new("missing")).await.unwrap_err();
        assert!(matches!(err, QuoteApiError::NotFound(id) if id == "missing"));
    }

    #[test]
    fn test_endpoint_joins_base_path() {
        let client = QuoteClient::new(&QuoteApiConfig {
            base_url: Url::parse("https://api.example.com/v1/").unwrap(),
        });
        assert_eq!(client.endpoint("upload"), "https://api.example.com/v1/upload");
    }
}
