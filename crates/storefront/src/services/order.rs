//! Order workflow: upload → quote → technology choice → confirmed order.
//!
//! ```text
//! Idle ──adopt_quote──▶ QuoteReady ──begin_confirmation──▶ Confirming
//!   ▲                      ▲   ▲                               │
//!   │                      │   └──────── failure ──────────────┤
//!   └──── reset ───────────┴─ adopt_quote ◀── Confirmed ◀─ success
//! ```
//!
//! Every network-dependent transition is all-or-nothing: a failed call
//! leaves the previous state in place plus a dismissible message.
//!
//! Confirmation is split into [`OrderWorkflow::begin_confirmation`] and
//! [`OrderWorkflow::complete_confirmation`] so a host can release its lock on
//! the workflow while the request is in flight. Each ticket remembers the
//! quote generation it was issued for; completing a ticket after the quote
//! was replaced or the workflow reset is a no-op.

use printquote_core::{ConfirmedOrder, OrderId, Quote, Technology};
use thiserror::Error;

use crate::error::add_breadcrumb;
use crate::quote_api::{ConfirmOrderRequest, ModelFile, QuoteApi, QuoteApiError};

/// Rejected workflow transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum WorkflowError {
    /// No quote has been received yet.
    #[error("no quote to confirm")]
    NoQuote,

    /// A confirmation for this quote is already in flight.
    #[error("order confirmation already in progress")]
    ConfirmationInFlight,

    /// The quote has already been turned into an order.
    #[error("order already confirmed")]
    AlreadyConfirmed,
}

/// Where the workflow is.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum WorkflowState {
    #[default]
    Idle,
    QuoteReady {
        quote: Quote,
    },
    Confirming {
        quote: Quote,
        technology: Technology,
    },
    Confirmed {
        quote: Quote,
        order: ConfirmedOrder,
    },
}

impl WorkflowState {
    /// The quote this state holds, if any.
    #[must_use]
    pub const fn quote(&self) -> Option<&Quote> {
        match self {
            Self::Idle => None,
            Self::QuoteReady { quote }
            | Self::Confirming { quote, .. }
            | Self::Confirmed { quote, .. } => Some(quote),
        }
    }

    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::QuoteReady { .. } => "quote_ready",
            Self::Confirming { .. } => "confirming",
            Self::Confirmed { .. } => "confirmed",
        }
    }
}

/// Proof that a confirmation was started, carrying the request to send.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfirmationTicket {
    generation: u64,
    request: ConfirmOrderRequest,
}

impl ConfirmationTicket {
    /// Body for `POST /confirm-order`.
    #[must_use]
    pub const fn request(&self) -> &ConfirmOrderRequest {
        &self.request
    }
}

/// What [`OrderWorkflow::complete_confirmation`] did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompletionOutcome {
    /// The order was confirmed.
    Confirmed(ConfirmedOrder),
    /// The backend call failed; the quote is ready for another attempt.
    Failed,
    /// The ticket no longer matches the workflow; nothing changed.
    Stale,
}

/// Drives one user's quote from upload to confirmed order.
#[derive(Debug, Default)]
pub struct OrderWorkflow {
    state: WorkflowState,
    /// Bumped whenever the quote is replaced or discarded.
    generation: u64,
    error: Option<String>,
}

impl OrderWorkflow {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub const fn state(&self) -> &WorkflowState {
        &self.state
    }

    #[must_use]
    pub const fn quote(&self) -> Option<&Quote> {
        self.state.quote()
    }

    /// The confirmed order, once there is one.
    #[must_use]
    pub const fn order(&self) -> Option<&ConfirmedOrder> {
        match &self.state {
            WorkflowState::Confirmed { order, .. } => Some(order),
            _ => None,
        }
    }

    /// Message from the last failed transition.
    #[must_use]
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn dismiss_error(&mut self) {
        self.error = None;
    }

    /// Whether technology selection must be disabled.
    #[must_use]
    pub const fn is_busy(&self) -> bool {
        matches!(self.state, WorkflowState::Confirming { .. })
    }

    /// Make `quote` the current quote, discarding whatever came before.
    ///
    /// Allowed from every state: uploads are last-writer-wins, and an
    /// in-flight confirmation for the previous quote becomes stale.
    pub fn adopt_quote(&mut self, quote: Quote) {
        self.generation += 1;
        tracing::info!(
            quote_id = %quote.quote_id,
            previous = self.state.name(),
            "Quote ready"
        );
        add_breadcrumb(
            "order",
            "Quote received",
            Some(&[("quote_id", quote.quote_id.as_str())]),
        );
        self.state = WorkflowState::QuoteReady { quote };
        self.error = None;
    }

    /// Upload `file` and adopt the resulting quote.
    ///
    /// On failure the state is untouched and the error is also kept as a
    /// dismissible message.
    ///
    /// # Errors
    ///
    /// Returns whatever [`QuoteApi::submit`] returned.
    pub async fn upload(&mut self, api: &dyn QuoteApi, file: ModelFile) -> Result<(), QuoteApiError> {
        add_breadcrumb("order", "Uploading model", Some(&[("file_name", file.file_name())]));

        match api.submit(file).await {
            Ok(quote) => {
                self.adopt_quote(quote);
                Ok(())
            }
            Err(e) => {
                tracing::warn!(error = %e, state = self.state.name(), "Upload failed");
                self.error = Some(e.user_message());
                Err(e)
            }
        }
    }

    /// Start confirming the current quote with `technology`.
    ///
    /// # Errors
    ///
    /// - [`WorkflowError::NoQuote`] before any quote arrived
    /// - [`WorkflowError::ConfirmationInFlight`] while another confirmation runs
    /// - [`WorkflowError::AlreadyConfirmed`] once the order exists
    pub fn begin_confirmation(
        &mut self,
        technology: Technology,
    ) -> Result<ConfirmationTicket, WorkflowError> {
        let quote = match std::mem::take(&mut self.state) {
            WorkflowState::QuoteReady { quote } => quote,
            other => {
                let err = match &other {
                    WorkflowState::Idle => WorkflowError::NoQuote,
                    WorkflowState::Confirming { .. } => WorkflowError::ConfirmationInFlight,
                    WorkflowState::Confirmed { .. } | WorkflowState::QuoteReady { .. } => {
                        WorkflowError::AlreadyConfirmed
                    }
                };
                self.state = other;
                return Err(err);
            }
        };

        let request = ConfirmOrderRequest::new(&quote, technology);
        tracing::info!(quote_id = %quote.quote_id, %technology, "Confirming order");
        add_breadcrumb(
            "order",
            "Confirming order",
            Some(&[
                ("quote_id", quote.quote_id.as_str()),
                ("technology", technology.as_str()),
            ]),
        );

        self.state = WorkflowState::Confirming { quote, technology };
        self.error = None;

        Ok(ConfirmationTicket {
            generation: self.generation,
            request,
        })
    }

    /// Apply the backend's answer to a confirmation started with `ticket`.
    pub fn complete_confirmation(
        &mut self,
        ticket: ConfirmationTicket,
        result: Result<OrderId, QuoteApiError>,
    ) -> CompletionOutcome {
        if ticket.generation != self.generation || !self.is_busy() {
            tracing::debug!(
                quote_id = %ticket.request.quote_id,
                state = self.state.name(),
                "Ignoring stale confirmation"
            );
            return CompletionOutcome::Stale;
        }

        let WorkflowState::Confirming { quote, technology } = std::mem::take(&mut self.state)
        else {
            return CompletionOutcome::Stale;
        };

        match result {
            Ok(order_id) if !order_id.is_empty() => {
                let order = ConfirmedOrder {
                    order_id,
                    printer_type: technology,
                    price: ticket.request.price,
                };
                tracing::info!(order_id = %order.order_id, %technology, "Order confirmed");
                add_breadcrumb(
                    "order",
                    "Order confirmed",
                    Some(&[("order_id", order.order_id.as_str())]),
                );
                self.state = WorkflowState::Confirmed {
                    quote,
                    order: order.clone(),
                };
                CompletionOutcome::Confirmed(order)
            }
            Ok(_) => {
                tracing::warn!(quote_id = %quote.quote_id, "Confirmation returned an empty order ID");
                self.error = Some("Order confirmation failed. Please try again.".to_string());
                self.state = WorkflowState::QuoteReady { quote };
                CompletionOutcome::Failed
            }
            Err(e) => {
                tracing::warn!(quote_id = %quote.quote_id, error = %e, "Order confirmation failed");
                self.error = Some(if e.is_transport_failure() {
                    "Order confirmation failed. Please try again.".to_string()
                } else {
                    e.user_message()
                });
                self.state = WorkflowState::QuoteReady { quote };
                CompletionOutcome::Failed
            }
        }
    }

    /// Confirm the current quote with `technology` and wait for the result.
    ///
    /// # Errors
    ///
    /// Returns a [`WorkflowError`] if confirmation cannot start. Backend
    /// failures are reported as [`CompletionOutcome::Failed`].
    pub async fn select_technology(
        &mut self,
        api: &dyn QuoteApi,
        technology: Technology,
    ) -> Result<CompletionOutcome, WorkflowError> {
        let ticket = self.begin_confirmation(technology)?;
        let result = api.confirm_order(ticket.request()).await;
        Ok(self.complete_confirmation(ticket, result))
    }

    /// Discard the quote and any order, returning to `Idle`.
    pub fn reset(&mut self) {
        self.generation += 1;
        self.state = WorkflowState::Idle;
        self.error = None;
        tracing::debug!("Order workflow reset");
    }
}
