//! The lookup-provider seam
//!
//! Each external lookup source sits behind [`ProviderAdapter`]. An adapter
//! owns its endpoint, credential, and response normalization; the resolver
//! only sees the common [`ProviderResponse`] shape or a classified
//! [`ProviderError`].

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

use phoneid_core::{DeviceDescriptor, Imei};

/// How a provider query can fail
///
/// The split matters to the resolver only for logging; every variant means
/// "try the next provider". Transport and logical failures are still kept
/// apart because a logical failure ("unknown IMEI", "invalid key") is a
/// definitive answer from a healthy service, while a transport failure
/// says nothing about the service's data.
#[derive(Error, Debug)]
pub enum ProviderError {
    /// Timeout, connection failure, non-2xx status
    #[error("transport failure: {0}")]
    Transport(String),
    /// Payload was not the JSON shape the provider documents: HTML error
    /// pages, auth redirect bodies, or JSON carrying no identifying field
    #[error("malformed response: {0}")]
    Malformed(String),
    /// Provider answered properly and reported failure
    #[error("provider reported failure: {0}")]
    Logical(String),
    /// No usable credential configured; the provider was never contacted
    #[error("no credential configured")]
    MissingCredential,
}

/// Normalized provider payload
///
/// Fields absent from a given provider's schema stay `None` - they are
/// never defaulted, so a missing lock status cannot masquerade as an
/// unlocked device.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProviderResponse {
    pub brand: Option<String>,
    pub model: Option<String>,
    pub storage: Option<String>,
    /// Activation/find-my lock status as reported, lowercased
    pub lock_status: Option<String>,
    pub warranty: Option<String>,
    pub activation_status: Option<String>,
    /// The raw payload as received, for diagnostics
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw: Option<serde_json::Value>,
}

impl ProviderResponse {
    /// Whether the response identifies a device at all
    pub fn has_identity(&self) -> bool {
        self.brand.is_some() || self.model.is_some()
    }

    /// Build a descriptor from the normalized fields
    pub fn descriptor(&self) -> DeviceDescriptor {
        let manufacturer = self
            .brand
            .clone()
            .unwrap_or_else(|| "Unknown".to_string());
        let model = self
            .model
            .clone()
            .unwrap_or_else(|| "Unknown model".to_string());

        let mut descriptor = DeviceDescriptor::new(manufacturer, model);
        if let Some(storage) = &self.storage {
            descriptor.storage = vec![storage.clone()];
        }
        descriptor.warranty = self.warranty.clone();
        descriptor.activation_lock = self.lock_status.clone();
        descriptor
    }
}

/// One external lookup source
#[async_trait]
pub trait ProviderAdapter: Send + Sync {
    /// Adapter name; becomes the `provider:<name>` source tag
    fn name(&self) -> &str;

    /// Whether this adapter is usable (enabled and credentialed)
    fn is_configured(&self) -> bool {
        true
    }

    /// Query the provider for an identifier, bounded by `timeout`
    ///
    /// Implementations must return within the timeout: a provider that
    /// never responds must not stall the resolution cascade.
    async fn query(
        &self,
        imei: &Imei,
        timeout: Duration,
    ) -> Result<ProviderResponse, ProviderError>;
}
