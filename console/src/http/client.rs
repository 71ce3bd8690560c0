//! HTTP client implementation

use std::time::Duration;

use async_trait::async_trait;
use ::http::Method;
use reqwest::{header, Client};
use tracing::{debug, error, warn};

use crate::errors::FluxError;
use crate::http::transport::{WebhookRequest, WebhookResponse, WebhookTransport};

const JSON: &str = "application/json";

/// Webhook transport over `reqwest`
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    /// Create a new HTTP transport with a per-request timeout
    pub fn new(timeout: Duration) -> Result<Self, FluxError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { client })
    }
}

fn parse_method(method: &str) -> Result<Method, FluxError> {
    Method::from_bytes(method.as_bytes())
        .map_err(|_| FluxError::Config(format!("Invalid HTTP method: {:?}", method)))
}

fn parse_url(url: &str) -> Result<url::Url, FluxError> {
    url::Url::parse(url).map_err(|e| FluxError::Config(format!("Invalid webhook URL {:?}: {}", url, e)))
}

#[async_trait]
impl WebhookTransport for HttpTransport {
    async fn send(&self, request: WebhookRequest) -> Result<WebhookResponse, FluxError> {
        let method = parse_method(&request.method)?;
        let url = parse_url(&request.url)?;
        debug!("{} {}", method, url);

        let mut builder = self
            .client
            .request(method.clone(), url.clone())
            .header(header::ACCEPT, JSON);

        if let Some(body) = request.body {
            builder = builder.header(header::CONTENT_TYPE, JSON).body(body);
        }

        let response = builder.send().await.map_err(|e| {
            error!("HTTP {} {} failed: {}", method, url, e);
            FluxError::Transport(e.to_string())
        })?;

        let status = response.status().as_u16();
        // The status is the outcome; an unreadable body is treated as empty
        let body = response.text().await.unwrap_or_else(|e| {
            warn!("Could not read response body of {} {}: {}", method, url, e);
            String::new()
        });
        if !(200..300).contains(&status) {
            error!("HTTP {} {} failed: {} - {}", method, url, status, body);
        }

        Ok(WebhookResponse { status, body })
    }
}
