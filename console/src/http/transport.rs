//! Webhook transport abstraction

use async_trait::async_trait;

use crate::errors::FluxError;
use crate::models::endpoint::EndpointConfig;

/// A fully resolved call against one webhook
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WebhookRequest {
    pub method: String,
    pub url: String,
    pub body: Option<String>,
}

impl WebhookRequest {
    /// Build the request for `config`, rendering its body for `workflow_id`
    pub fn from_config(config: &EndpointConfig, workflow_id: Option<&str>) -> Self {
        Self {
            method: config.method.trim().to_uppercase(),
            url: config.url.trim().to_string(),
            body: workflow_id.and_then(|id| config.render_body(id)),
        }
    }
}

/// Raw webhook response
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WebhookResponse {
    pub status: u16,
    pub body: String,
}

impl WebhookResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// True for 2xx statuses
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Fail with [`FluxError::Http`] on non-2xx statuses
    pub fn error_for_status(self) -> Result<Self, FluxError> {
        if self.is_success() {
            Ok(self)
        } else {
            Err(FluxError::Http {
                status: self.status,
            })
        }
    }
}

/// Sends webhook requests. Non-2xx statuses are returned, not raised.
#[async_trait]
pub trait WebhookTransport: Send + Sync {
    async fn send(&self, request: WebhookRequest) -> Result<WebhookResponse, FluxError>;
}
