//! Generic HTTP lookup adapter
//!
//! All shipped providers speak the same transport dialect - a GET with
//! `key`, `imei`, `service`, and `format` query parameters returning JSON -
//! and differ only in their response schema. One adapter type therefore
//! serves every provider, parameterized by a [`ProviderSchema`].

use async_trait::async_trait;
use std::time::Duration;
use tracing::{debug, trace};

use phoneid_core::Imei;

use crate::provider::{ProviderAdapter, ProviderError, ProviderResponse};
use crate::schema::{normalize, ProviderSchema};

/// A provider reachable over HTTP GET with query parameters
pub struct HttpProvider {
    schema: &'static ProviderSchema,
    base_url: String,
    api_key: String,
    service: String,
    format: String,
    client: reqwest::Client,
}

impl HttpProvider {
    /// Build an adapter for `schema` against `base_url`
    ///
    /// `api_key` may be blank; the adapter then reports itself as not
    /// configured and refuses to issue requests.
    pub fn new(
        schema: &'static ProviderSchema,
        base_url: String,
        api_key: String,
        service: Option<String>,
        format: Option<String>,
    ) -> Result<Self, ProviderError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| ProviderError::Transport(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            schema,
            base_url,
            api_key,
            service: service.unwrap_or_else(|| schema.default_service.to_string()),
            format: format.unwrap_or_else(|| schema.default_format.to_string()),
            client,
        })
    }

    /// The request URL minus the credential, for diagnostics
    fn endpoint_for_log(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl ProviderAdapter for HttpProvider {
    fn name(&self) -> &str {
        self.schema.name
    }

    fn is_configured(&self) -> bool {
        !self.api_key.trim().is_empty()
    }

    async fn query(
        &self,
        imei: &Imei,
        timeout: Duration,
    ) -> Result<ProviderResponse, ProviderError> {
        if !self.is_configured() {
            return Err(ProviderError::MissingCredential);
        }

        trace!(
            provider = self.name(),
            endpoint = self.endpoint_for_log(),
            imei = %imei,
            "Querying provider"
        );

        let request = self
            .client
            .get(&self.base_url)
            .query(&[
                ("key", self.api_key.as_str()),
                ("imei", imei.as_str()),
                ("service", self.service.as_str()),
                ("format", self.format.as_str()),
            ])
            .send();

        // The client carries its own timeout, but a provider that trickles
        // bytes forever would still hold the cascade open; the outer bound
        // covers the whole call.
        let response = match tokio::time::timeout(timeout, request).await {
            Ok(Ok(resp)) => resp,
            Ok(Err(e)) => {
                return Err(ProviderError::Transport(format!("request failed: {e}")));
            }
            Err(_) => {
                return Err(ProviderError::Transport(format!(
                    "timed out after {}ms",
                    timeout.as_millis()
                )));
            }
        };

        let status = response.status();
        if !status.is_success() {
            return Err(ProviderError::Transport(format!("HTTP {status}")));
        }

        let body = tokio::time::timeout(timeout, response.text())
            .await
            .map_err(|_| {
                ProviderError::Transport(format!(
                    "body read timed out after {}ms",
                    timeout.as_millis()
                ))
            })?
            .map_err(|e| ProviderError::Transport(format!("failed to read body: {e}")))?;

        let payload: serde_json::Value = serde_json::from_str(&body).map_err(|_| {
            // HTML error pages and auth redirects land here
            ProviderError::Malformed(format!(
                "response is not JSON ({} bytes, starts {:?})",
                body.len(),
                body.chars().take(16).collect::<String>()
            ))
        })?;

        let normalized = normalize(self.schema, payload)?;
        debug!(
            provider = self.name(),
            imei = %imei,
            model = ?normalized.model,
            "Provider answered"
        );
        Ok(normalized)
    }
}
