//! Fanout webhook gateway.
//!
//! Receives GitHub webhook deliveries over HTTP, asks the [`routing`]
//! dispatcher where each one belongs, and re-posts it to the matching
//! notification endpoint.
//!
//! # Endpoints
//!
//! - `POST /webhook` - classify and forward a GitHub delivery
//! - `GET /health` - returns 200 while the server is running
//!
//! ## Architectural Layer
//!
//! **Infrastructure.** HTTP parsing, signature checks, endpoint URLs and the
//! mapping of routing errors to status codes live here. The [`routing`] crate
//! sees only the event name and the raw payload.

use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use routing::Dispatcher;

pub mod endpoints;
pub mod forward;
pub mod health;
pub mod signature;
pub mod webhook;

pub use endpoints::EndpointMap;
pub use forward::{ForwardError, ForwardRequest, ForwardResponse, Forwarder, HttpForwarder};
pub use health::health_handler;
pub use webhook::{webhook_handler, WebhookError};

/// Largest payload GitHub sends (25 MiB).
pub const MAX_PAYLOAD_BYTES: usize = 25 * 1024 * 1024;

/// Shared application state, passed to handlers via axum's `State` extractor.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    dispatcher: Dispatcher,
    endpoints: EndpointMap,
    forwarder: Arc<dyn Forwarder>,
    /// When set, every delivery must carry a valid `X-Hub-Signature-256`.
    webhook_secret: Option<Vec<u8>>,
}

impl AppState {
    /// Creates the state shared by every request.
    pub fn new(
        dispatcher: Dispatcher,
        endpoints: EndpointMap,
        forwarder: Arc<dyn Forwarder>,
        webhook_secret: Option<Vec<u8>>,
    ) -> Self {
        AppState {
            inner: Arc::new(AppStateInner {
                dispatcher,
                endpoints,
                forwarder,
                webhook_secret,
            }),
        }
    }

    /// The event classifier.
    pub fn dispatcher(&self) -> &Dispatcher {
        &self.inner.dispatcher
    }

    /// Target-to-URL mapping.
    pub fn endpoints(&self) -> &EndpointMap {
        &self.inner.endpoints
    }

    /// Delivery mechanism for classified events.
    pub fn forwarder(&self) -> &dyn Forwarder {
        self.inner.forwarder.as_ref()
    }

    /// The webhook secret, if signature verification is enabled.
    pub fn webhook_secret(&self) -> Option<&[u8]> {
        self.inner.webhook_secret.as_deref()
    }
}

/// Builds the axum Router with all endpoints.
pub fn build_router(app_state: AppState) -> axum::Router {
    use axum::routing::{get, post};

    axum::Router::new()
        .route("/webhook", post(webhook_handler))
        .route("/health", get(health_handler))
        .layer(DefaultBodyLimit::max(MAX_PAYLOAD_BYTES))
        .with_state(app_state)
}

#[cfg(test)]
#[path = "router_tests.rs"]
mod router_tests;
