//! Quoting backend client.
//!
//! # Architecture
//!
//! - The backend owns mesh analysis, pricing and order persistence; this
//!   module only moves data across HTTP
//! - Every response passes through a schema boundary ([`types`]) that turns
//!   missing or malformed fields into [`QuoteApiError::Parse`]
//! - No retries, no chunking; a failed call leaves caller state untouched
//!
//! # Endpoints
//!
//! - `POST /upload` - multipart model upload, returns a quote
//! - `POST /confirm-order` - turns a quote plus technology into an order
//! - `GET /order/{id}` - order tracking
//!
//! # Example
//!
//! ```rust,ignore
//! use printquote_storefront::quote_api::{ModelFile, QuoteApi, QuoteClient};
//!
//! let client = QuoteClient::new(&config.quote_api);
//! let quote = client.submit(ModelFile::from_path("part.stl").await?).await?;
//! println!("FDM: {}", quote.option(Technology::Fdm).display_price());
//! ```

mod client;
pub mod types;
mod upload;

pub use client::QuoteClient;
pub use types::{ConfirmOrderRequest, OrderRecord};
pub use upload::{ModelFile, SUPPORTED_EXTENSIONS};

use async_trait::async_trait;
use printquote_core::{OrderId, Quote};
use thiserror::Error;

/// Errors that can occur when talking to the quoting backend.
#[derive(Debug, Error)]
pub enum QuoteApiError {
    /// The file's extension is not on the allow-list. No request was made.
    #[error("Unsupported file format: {file_name}")]
    UnsupportedFormat {
        /// Name of the rejected file.
        file_name: String,
    },

    /// HTTP request failed (connection, TLS, body read).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Backend returned a non-success status.
    #[error("API error: {status} - {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Error detail reported by the backend.
        message: String,
    },

    /// Order lookup found no such order.
    #[error("Order not found: {0}")]
    NotFound(String),

    /// Response body did not match the expected schema.
    #[error("Invalid response: {0}")]
    Parse(String),

    /// Reading the model file from disk failed.
    #[error("Could not read model file: {0}")]
    Io(#[from] std::io::Error),
}

impl QuoteApiError {
    /// Whether the failure happened on the wire (as opposed to local
    /// validation or a malformed response).
    #[must_use]
    pub const fn is_transport_failure(&self) -> bool {
        matches!(self, Self::Http(_) | Self::Api { .. } | Self::NotFound(_))
    }

    /// Message safe to show inline. Backend details are only passed through
    /// for client errors.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::UnsupportedFormat { .. } => {
                "Unsupported file format. Please upload an STL, OBJ or STEP file.".to_string()
            }
            Self::Io(_) => "Could not read the selected file.".to_string(),
            Self::Api { status, message } if *status < 500 && !message.is_empty() => {
                message.clone()
            }
            Self::NotFound(_) => "Order not found.".to_string(),
            Self::Http(_) | Self::Api { .. } => {
                "The quoting service is unavailable. Please try again.".to_string()
            }
            Self::Parse(_) => "Unexpected response from the quoting service.".to_string(),
        }
    }
}

/// Operations offered by the quoting backend.
///
/// [`QuoteClient`] is the HTTP implementation; the order workflow only
/// depends on this trait.
#[async_trait]
pub trait QuoteApi: Send + Sync {
    /// Upload a model and receive a quote.
    ///
    /// Unsupported extensions are rejected before any network call.
    async fn submit(&self, file: ModelFile) -> Result<Quote, QuoteApiError>;

    /// Confirm a quote with a chosen technology, returning the new order's ID.
    async fn confirm_order(&self, request: &ConfirmOrderRequest) -> Result<OrderId, QuoteApiError>;

    /// Fetch a stored order for tracking.
    async fn get_order(&self, order_id: &OrderId) -> Result<OrderRecord, QuoteApiError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = QuoteApiError::UnsupportedFormat {
            file_name: "part.3mf".to_string(),
        };
        assert_eq!(err.to_string(), "Unsupported file format: part.3mf");

        let err = QuoteApiError::Api {
            status: 500,
            message: "Upload failed".to_string(),
        };
        assert_eq!(err.to_string(), "API error: 500 - Upload failed");
    }

    #[test]
    fn test_transport_classification() {
        assert!(
            QuoteApiError::Api {
                status: 502,
                message: String::new()
            }
            .is_transport_failure()
        );
        assert!(QuoteApiError::NotFound("o-1".to_string()).is_transport_failure());
        assert!(!QuoteApiError::Parse("missing order_id".to_string()).is_transport_failure());
        assert!(
            !QuoteApiError::UnsupportedFormat {
                file_name: "a.txt".to_string()
            }
            .is_transport_failure()
        );
    }

    #[test]
    fn test_user_message_hides_server_details() {
        let server = QuoteApiError::Api {
            status: 500,
            message: "Traceback (most recent call last)".to_string(),
        };
        assert!(!server.user_message().contains("Traceback"));

        let client = QuoteApiError::Api {
            status: 400,
            message: "File is empty".to_string(),
        };
        assert_eq!(client.user_message(), "File is empty");
    }
}
