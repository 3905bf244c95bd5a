//! HTTP client for the wholesaler endpoints.

use std::time::Duration;

use domain::OrderAggregate;
use serde_json::Value;

use crate::{
    Availability, OrderSubmission, ProductContent, Result, availability, content, export,
};

/// Production base URL of the wholesaler API.
pub const DEFAULT_BASE_URL: &str = "https://api.buchbutler.de";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Wholesaler access configuration, injected at construction time.
#[derive(Debug, Clone)]
pub struct WholesalerConfig {
    pub base_url: String,
    pub username: Option<String>,
    pub password: Option<String>,
    /// When set (the default), order submissions are logged and returned
    /// without any network call. Must be disabled explicitly to reach the
    /// live ORDER endpoint.
    pub sandbox: bool,
}

impl Default for WholesalerConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            username: None,
            password: None,
            sandbox: true,
        }
    }
}

/// Client for the CONTENT, MOVEMENT, RECHNUNG, and ORDER endpoints.
#[derive(Clone)]
pub struct WholesalerClient {
    http: reqwest::Client,
    config: WholesalerConfig,
}

impl WholesalerClient {
    /// Creates a new client with a fixed request timeout.
    pub fn new(config: WholesalerConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self { http, config })
    }

    /// Returns true when order submission is sandboxed.
    pub fn sandbox(&self) -> bool {
        self.config.sandbox
    }

    fn credentials(&self) -> Option<(&str, &str)> {
        match (self.config.username.as_deref(), self.config.password.as_deref()) {
            (Some(user), Some(pass)) if !user.is_empty() && !pass.is_empty() => Some((user, pass)),
            _ => None,
        }
    }

    fn endpoint_url(&self, endpoint: &str) -> String {
        format!("{}/{}/", self.config.base_url.trim_end_matches('/'), endpoint)
    }

    /// Runs one GET against an enrichment endpoint and unwraps the
    /// `response` envelope. Every expected failure mode (missing
    /// credentials, transport error, bad status, missing/empty envelope)
    /// yields `None`.
    async fn request_envelope(&self, endpoint: &str, ean: &str) -> Option<Value> {
        let Some((username, password)) = self.credentials() else {
            tracing::error!("wholesaler credentials missing");
            return None;
        };

        let url = self.endpoint_url(endpoint);
        let result = async {
            let response = self
                .http
                .get(&url)
                .query(&[("username", username), ("passwort", password), ("ean", ean)])
                .send()
                .await?
                .error_for_status()?;
            response.json::<Value>().await
        }
        .await;

        match result {
            Ok(body) => content::unwrap_envelope(&body).cloned(),
            Err(err) => {
                tracing::warn!(endpoint, ean, error = %err, "wholesaler request failed");
                None
            }
        }
    }

    /// Fetches descriptive product data for an EAN from the CONTENT
    /// endpoint. Fails closed: any upstream problem yields `None`.
    #[tracing::instrument(skip(self))]
    pub async fn fetch_content(&self, ean: &str) -> Option<ProductContent> {
        let envelope = self.request_envelope("CONTENT", ean).await?;
        content::parse_content(&envelope)
    }

    /// Fetches stock/price data for an EAN from the MOVEMENT endpoint.
    /// Fails closed like [`fetch_content`](Self::fetch_content).
    #[tracing::instrument(skip(self))]
    pub async fn fetch_availability(&self, ean: &str) -> Option<Availability> {
        let envelope = self.request_envelope("MOVEMENT", ean).await?;
        availability::parse_availability(&envelope)
    }

    /// Downloads an invoice PDF by file name, or `None` when unavailable.
    #[tracing::instrument(skip(self))]
    pub async fn fetch_invoice(&self, filename: &str) -> Option<Vec<u8>> {
        let (username, password) = self.credentials()?;
        let url = format!(
            "{}/RECHNUNG/{}",
            self.config.base_url.trim_end_matches('/'),
            filename
        );

        match self
            .http
            .get(&url)
            .basic_auth(username, Some(password))
            .send()
            .await
        {
            Ok(response) if response.status().is_success() => {
                response.bytes().await.ok().map(|b| b.to_vec())
            }
            Ok(response) => {
                tracing::warn!(filename, status = %response.status(), "invoice fetch failed");
                None
            }
            Err(err) => {
                tracing::warn!(filename, error = %err, "invoice fetch failed");
                None
            }
        }
    }

    /// Builds the ORDER payload for a stored aggregate using the configured
    /// credentials.
    pub fn build_order_payload(&self, aggregate: &OrderAggregate) -> OrderSubmission {
        export::build_payload(
            aggregate,
            self.config.username.as_deref().unwrap_or_default(),
            self.config.password.as_deref().unwrap_or_default(),
        )
    }

    /// Submits an order payload.
    ///
    /// In sandbox mode this performs no network call and returns the
    /// payload itself, so downstream bookkeeping still sees a response.
    /// Live transport failures propagate unmodified; there is no retry.
    #[tracing::instrument(skip(self, payload))]
    pub async fn submit_order(&self, payload: &OrderSubmission) -> Result<Value> {
        let value = serde_json::to_value(payload)?;
        if self.config.sandbox {
            tracing::info!(payload = %value, "sandbox mode, order not transmitted");
            return Ok(value);
        }

        let response = self
            .http
            .post(self.endpoint_url("ORDER"))
            .json(payload)
            .send()
            .await?;
        let body = response.json::<Value>().await?;
        metrics::counter!("orders_exported_total").increment(1);
        Ok(body)
    }
}
